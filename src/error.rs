use std::io;

use thiserror::Error;

use crate::frame::FrameHeader;

pub type Result<T> = std::result::Result<T, Error>;

#[derive(Error, Debug)]
pub enum Error {
  #[error("IO error: {0}")]
  Io(#[from] io::Error),

  /// Fewer bytes left in the input than the structure being read needs.
  #[error("Stream exhausted")]
  Exhausted,

  #[error("Out of sync at {pos}: {header:?}")]
  OutOfSync { pos: u64, header: FrameHeader },

  #[error("Found reserved value {field}={value}")]
  Reserved { field: &'static str, value: u8 },

  #[error("Parse error: {0}")]
  Parse(String),

  #[error("CRC check failed at {pos}, stored crc {stored} != calculated crc {calculated}")]
  IntegrityCheckFailed { pos: u64, stored: u16, calculated: u16 },

  #[error("File doesn't start with a valid frame: {bytes:?}")]
  MaybeNotMp3 { bytes: Vec<u8> },

  #[error("Invalid frame found in file at pos {pos}: {bytes:?}")]
  InvalidFrame { pos: u64, bytes: Vec<u8> },

  #[error("Unsupported: {0}")]
  Unsupported(String),

  #[error("Not implemented: {0}")]
  NotImplemented(&'static str),

  #[error("Invalid argument: {0}")]
  InvalidArgument(&'static str),
}

impl Error {
  /// Whether the stream driver stops after yielding this error.
  pub fn is_terminal(&self) -> bool {
    !matches!(self, Error::IntegrityCheckFailed { .. })
  }
}
