//! Day 16: Packet Decoder.
//!
//! A BITS transmission is a hex string holding one outermost packet. Every packet starts with a
//! 3-bit version and a 3-bit type id. Type 4 is a literal, encoded as 5-bit groups (a continuation
//! bit then 4 payload bits); every other type is an operator whose subpackets are delimited either
//! by their total length in bits (length type 0, 15-bit field) or by their count (length type 1,
//! 11-bit field). Bits left over after the outermost packet are hex padding and never read.
//!
//! Literal values and evaluation results are bounded to `u64`; wider literals and overflowing
//! sums or products are rejected rather than wrapped.

use arrayvec::ArrayVec;
use bitvec::prelude::*;
use itertools::Itertools;
use thiserror::Error;
use tracing::{debug, trace};

pub type Result<T> = std::result::Result<T, PacketError>;

#[derive(Error, Debug, PartialEq, Eq)]
pub enum PacketError {
    #[error("'{digit}' at position {position} is not a hex digit")]
    InvalidHexDigit {digit: char, position: usize},
    #[error("cannot read {requested} bits, only {remaining} remaining")]
    Truncated {requested: usize, remaining: usize},
    #[error("unrecognised length type id {0}")]
    UnknownLengthType(u64),
    #[error("subpackets end at bit {index}, past the declared end at bit {end}")]
    LengthOvershoot {end: usize, index: usize},
    #[error("operator packet at bit {0} declares no subpackets")]
    NoSubpackets(usize),
    #[error("literal value is wider than 64 bits")]
    LiteralTooWide,
    #[error("unrecognised type id {0}")]
    UnknownTypeId(u8),
    #[error("literal packet (type id 4) has no value")]
    MissingLiteralValue,
    #[error("operator packet (type id {0}) holds a literal value")]
    UnexpectedLiteral(u8),
    #[error("type id {type_id} takes {expected} subpackets, found {found}")]
    Arity {type_id: u8, expected: &'static str, found: usize},
    #[error("value of type id {0} does not fit in 64 bits")]
    Overflow(u8),
    #[error("part {0} does not exist, expected 1 or 2")]
    UnknownPart(u8),
}

pub const LITERAL_TYPE_ID: u8 = 4;

/// The four bits of a single hex digit, most significant first.
pub fn hex_digit_bits(digit: char) -> Option<[bool; 4]> {
    let nibble = digit.to_digit(16)?;
    Some([3, 2, 1, 0].map(|shift| (nibble >> shift) & 1 == 1))
}

pub fn hex_to_bits(hex: &str) -> Result<BitVec<u8, Msb0>> {
    let mut bits = BitVec::with_capacity(4 * hex.len());
    for (position, digit) in hex.chars().enumerate() {
        let nibble = hex_digit_bits(digit).ok_or(PacketError::InvalidHexDigit {digit, position})?;
        bits.extend(nibble);
    }
    Ok(bits)
}

/// Sequential reader over a bit slice. The cursor only ever moves forward.
pub struct Bits<'a> {bits: &'a BitSlice<u8, Msb0>, index: usize}

impl<'a> Bits<'a> {
    pub fn new(bits: &'a BitSlice<u8, Msb0>) -> Self {Bits {bits, index: 0}}

    pub fn index(&self) -> usize {self.index}

    pub fn remaining(&self) -> usize {self.bits.len() - self.index}

    /// Consumes the next `n` bits (at most 64) as a big-endian unsigned number.
    pub fn read(&mut self, n: usize) -> Result<u64> {
        assert!(n <= 64, "cannot read {} bits into a u64", n);
        if n > self.remaining() {
            return Err(PacketError::Truncated {requested: n, remaining: self.remaining()});
        }
        let field = &self.bits[self.index ..][.. n];
        self.index += n;
        Ok(if n == 0 {0} else {field.load_be::<u64>()})
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum Body {Literal(u64), Operator(Vec<Packet>)}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Packet {pub version: u8, pub type_id: u8, pub body: Body}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Operator {Sum, Product, Minimum, Maximum, Literal, GreaterThan, LessThan, EqualTo}

impl TryFrom<u8> for Operator {
    type Error = PacketError;

    fn try_from(type_id: u8) -> Result<Self> {
        use Operator::*;
        Ok(match type_id {
            0 => Sum, 1 => Product, 2 => Minimum, 3 => Maximum,
            4 => Literal, 5 => GreaterThan, 6 => LessThan, 7 => EqualTo,
            _ => return Err(PacketError::UnknownTypeId(type_id))
        })
    }
}

impl Packet {
    /// Decodes the outermost packet of a hex transmission, ignoring any trailing padding.
    pub fn from_hex(hex: &str) -> Result<Packet> {
        let bits = hex_to_bits(hex)?;
        Packet::parse(&mut Bits::new(&bits))
    }

    pub fn parse(bits: &mut Bits) -> Result<Packet> {
        let start = bits.index();
        let version = bits.read(3)? as u8;
        let type_id = bits.read(3)? as u8;
        debug!(start, version, type_id, "packet header");

        let body = if type_id == LITERAL_TYPE_ID {
            Body::Literal(Self::parse_literal(bits)?)
        } else {
            Body::Operator(Self::parse_subpackets(bits, start)?)
        };
        Ok(Packet {version, type_id, body})
    }

    fn parse_literal(bits: &mut Bits) -> Result<u64> {
        let mut nibbles = ArrayVec::<u8, 16>::new();
        loop {
            let more = bits.read(1)? == 1;
            nibbles.try_push(bits.read(4)? as u8).map_err(|_| PacketError::LiteralTooWide)?;
            if !more {break}
        }
        Ok(nibbles.iter().fold(0, |value, &nibble| value << 4 | u64::from(nibble)))
    }

    fn parse_subpackets(bits: &mut Bits, start: usize) -> Result<Vec<Packet>> {
        let mut subpackets = vec![];
        match bits.read(1)? {
            0 => {
                let length = bits.read(15)? as usize;
                let end = bits.index() + length;
                while bits.index() < end {
                    subpackets.push(Packet::parse(bits)?);
                }
                if bits.index() != end {
                    return Err(PacketError::LengthOvershoot {end, index: bits.index()});
                }
            },
            1 => {
                let count = bits.read(11)?;
                for _ in 0 .. count {subpackets.push(Packet::parse(bits)?)}
            },
            length_type => return Err(PacketError::UnknownLengthType(length_type))
        }
        if subpackets.is_empty() {return Err(PacketError::NoSubpackets(start))}
        Ok(subpackets)
    }

    pub fn subpackets(&self) -> &[Packet] {
        match &self.body {Body::Operator(subpackets) => subpackets.as_slice(), Body::Literal(_) => &[]}
    }

    pub fn value(&self) -> Option<u64> {
        match self.body {Body::Literal(value) => Some(value), Body::Operator(_) => None}
    }

    pub fn version_sum(&self) -> u64 {
        u64::from(self.version) + self.subpackets().iter().map(Packet::version_sum).sum::<u64>()
    }

    /// Evaluates the expression tree, children before their parent.
    pub fn eval(&self) -> Result<u64> {
        use Operator::*;
        let type_id = self.type_id;
        let value = match (Operator::try_from(type_id)?, &self.body) {
            (Literal, _) => self.value().ok_or(PacketError::MissingLiteralValue)?,
            (_, Body::Literal(_)) => return Err(PacketError::UnexpectedLiteral(type_id)),
            (op @ (GreaterThan | LessThan | EqualTo), Body::Operator(subpackets)) => {
                let Some((left, right)) = subpackets.iter().collect_tuple() else {
                    return Err(PacketError::Arity {type_id, expected: "exactly 2", found: subpackets.len()});
                };
                let (left, right) = (left.eval()?, right.eval()?);
                u64::from(match op {GreaterThan => left > right, LessThan => left < right, _ => left == right})
            },
            (op, Body::Operator(subpackets)) => {
                if subpackets.is_empty() {
                    return Err(PacketError::Arity {type_id, expected: "at least 1", found: 0});
                }
                itertools::process_results(subpackets.iter().map(Packet::eval), |mut values| match op {
                    Sum => values.try_fold(0u64, u64::checked_add),
                    Product => values.try_fold(1u64, u64::checked_mul),
                    Minimum => values.min(),
                    Maximum => values.max(),
                    Literal | GreaterThan | LessThan | EqualTo => unreachable!()
                })?.ok_or(PacketError::Overflow(type_id))?
            }
        };
        trace!(type_id, value, "evaluated");
        Ok(value)
    }
}

pub fn solve(part: u8, input: &str) -> Result<String> {
    let packet = Packet::from_hex(input.trim())?;
    match part {
        1 => Ok(packet.version_sum().to_string()),
        2 => Ok(packet.eval()?.to_string()),
        _ => Err(PacketError::UnknownPart(part))
    }
}
