//! Bit and byte field extraction.
//!
//! Formats are slices of [`Field`] descriptors read most significant bit first,
//! the way MPEG audio lays out its headers. Running out of input is reported as
//! [`Error::Exhausted`] so callers can tell a clean end of file from bad content.

use std::io::Read;

use nom::bits::complete::take;
use nom::combinator::map;
use nom::IResult;

use crate::{Error, Result};

type BitInput<'a> = (&'a [u8], usize);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
  Unsigned(usize),
  /// Two's complement.
  Signed(usize),
  /// Opaque bits, right aligned. Used where several channel values share one field.
  Raw(usize),
  Bool,
}

impl Field {
  pub fn width(&self) -> usize {
    match *self {
      Field::Unsigned(width) | Field::Signed(width) | Field::Raw(width) => width,
      Field::Bool => 1,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Value {
  Unsigned(u32),
  Signed(i32),
  Raw(u32),
  Bool(bool),
}

impl Value {
  pub fn as_u32(&self) -> u32 {
    match *self {
      Value::Unsigned(value) | Value::Raw(value) => value,
      Value::Signed(value) => value as u32,
      Value::Bool(value) => value as u32,
    }
  }

  pub fn as_u8(&self) -> u8 {
    self.as_u32() as u8
  }

  pub fn as_bool(&self) -> bool {
    self.as_u32() != 0
  }
}

pub fn bit_width(format: &[Field]) -> usize {
  format.iter().map(Field::width).sum()
}

fn sign_extend(value: u32, width: usize) -> i32 {
  if width == 0 || width >= 32 {
    return value as i32;
  }
  if value >> (width - 1) & 1 == 1 {
    (value | (u32::MAX << width)) as i32
  } else {
    value as i32
  }
}

fn field(input: BitInput, field: Field) -> IResult<BitInput, Value> {
  match field {
    Field::Unsigned(width) => map(take::<_, u32, _, _>(width), Value::Unsigned)(input),
    Field::Signed(width) => map(take::<_, u32, _, _>(width), |v| Value::Signed(sign_extend(v, width)))(input),
    Field::Raw(width) => map(take::<_, u32, _, _>(width), Value::Raw)(input),
    Field::Bool => map(take::<_, u8, _, _>(1usize), |v| Value::Bool(v == 1))(input),
  }
}

/// Decodes `format` from `data`, starting `bit_offset` bits into the buffer.
pub fn unpack_from(format: &[Field], data: &[u8], bit_offset: usize) -> Result<Vec<Value>> {
  if format.iter().any(|f| f.width() > 32) {
    return Err(Error::InvalidArgument("bit fields are limited to 32 bits"));
  }
  if bit_offset + bit_width(format) > data.len() * 8 {
    return Err(Error::Exhausted);
  }

  let mut input: BitInput = (&data[bit_offset / 8..], bit_offset % 8);
  let mut values = Vec::with_capacity(format.len());
  for f in format {
    let (rest, value) = field(input, *f)
      .map_err(|e| Error::Parse(format!("bit field {:?}: {:?}", f, e)))?;
    values.push(value);
    input = rest;
  }
  Ok(values)
}

pub fn unpack(format: &[Field], data: &[u8]) -> Result<Vec<Value>> {
  unpack_from(format, data, 0)
}

/// Reads exactly `len` bytes.
pub fn read_bytes<R: Read>(reader: &mut R, len: usize) -> Result<Vec<u8>> {
  let mut buffer = Vec::with_capacity(len);
  reader.by_ref().take(len as u64).read_to_end(&mut buffer)?;
  if buffer.len() < len {
    return Err(Error::Exhausted);
  }
  Ok(buffer)
}

/// Reads as many whole bytes as `format` spans and decodes them.
/// Returns the raw bytes alongside the values.
pub fn read_bits<R: Read>(reader: &mut R, format: &[Field]) -> Result<(Vec<u8>, Vec<Value>)> {
  let width = bit_width(format);
  if width % 8 != 0 {
    return Err(Error::InvalidArgument("bit format must span whole bytes"));
  }
  let raw = read_bytes(reader, width / 8)?;
  let values = unpack(format, &raw)?;
  Ok((raw, values))
}

/// Reads `len` bytes and runs a byte level parser over them.
pub fn read_struct<R, O, F>(reader: &mut R, len: usize, mut parser: F) -> Result<O>
  where R: Read,
        F: FnMut(&[u8]) -> IResult<&[u8], O> {
  let buffer = read_bytes(reader, len)?;
  let (_, value) = parser(&buffer).map_err(|e| Error::Parse(format!("{:?}", e)))?;
  Ok(value)
}

/// Reads byte by byte until the accumulated bytes end with `delimiter`.
/// The delimiter is consumed but not returned.
pub fn read_until<R: Read>(reader: &mut R, delimiter: &[u8]) -> Result<Vec<u8>> {
  let mut result: Vec<u8> = Vec::new();
  let mut byte = [0u8; 1];
  while !result.ends_with(delimiter) {
    if reader.read(&mut byte)? == 0 {
      return Err(Error::Exhausted);
    }
    result.push(byte[0]);
  }
  result.truncate(result.len() - delimiter.len());
  Ok(result)
}
