mod day16;

use std::path::PathBuf;
use thiserror::Error;
use tracing::{debug, info};
use tracing_subscriber::EnvFilter;

type Day = fn(u8, &str) -> Result<String, day16::PacketError>;

#[derive(Error, Debug, PartialEq, Eq)]
#[error("no solution available for day {0}")]
struct DayNotAvailable(usize);

fn day(n: usize) -> Result<Day, DayNotAvailable> {
    match n {
        16 => Ok(day16::solve),
        _ => Err(DayNotAvailable(n))
    }
}

fn input_dir() -> PathBuf {
    std::env::var_os("AOC_INPUT_DIR").map_or_else(|| PathBuf::from("."), PathBuf::from)
}

fn init_logging() {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(std::io::stderr)
        .try_init();
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    init_logging();

    let args = std::env::args().collect::<Vec<_>>();
    let (day_arg, part_arg, fname) = match &args[..] {
        [_, day_arg] => (day_arg, None, format!("day{}.in", day_arg)),
        [_, day_arg, part_arg] => (day_arg, Some(part_arg), format!("day{}.in", day_arg)),
        [_, day_arg, test_arg, part_arg] => (day_arg, Some(part_arg), format!("day{}test{}.in", day_arg, test_arg)),
        _ => {
            eprintln!("one to three arguments expected - day number, optionally test number and 1/2 for part");
            std::process::exit(1);
        }
    };

    let solve = day(day_arg.parse()?)?;
    let parts = match part_arg {Some(part) => vec![part.parse::<u8>()?], None => vec![1, 2]};
    let path = input_dir().join(fname);
    debug!(path = %path.display(), "reading input");
    let input = std::fs::read_to_string(&path)?;

    for part in parts {
        let time = std::time::Instant::now();
        println!("{}", solve(part, &input)?);
        info!(part, seconds = time.elapsed().as_secs_f32(), "solved");
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn dispatches_known_days() {
        let solve = day(16).unwrap();
        assert_eq!(solve(1, "8A004A801A8002F478\n").unwrap(), "16");
    }

    #[test]
    fn unknown_day() {
        let err = day(3).unwrap_err();
        assert_eq!(err, DayNotAvailable(3));
        assert_eq!(err.to_string(), "no solution available for day 3");
    }
}
