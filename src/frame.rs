use std::io::{Read, Seek};

use crate::bits::{read_bits, Field, Value};
use crate::side_info;
use crate::tables;
use crate::{Error, Result};

pub const HEADER_SIZE: usize = 4;
pub const SYNC: u16 = 0b111_1111_1111;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Version {
  Version25,
  Version2,
  Version1,
  Reserved,
}

impl From<u8> for Version {
  fn from(version: u8) -> Version {
    match version {
      0b00 => Version::Version25,
      0b10 => Version::Version2,
      0b11 => Version::Version1,
      _ => Version::Reserved,
    }
  }
}

impl From<Version> for u8 {
  fn from(version: Version) -> u8 {
    match version {
      Version::Version25 => 0b00,
      Version::Reserved => 0b01,
      Version::Version2 => 0b10,
      Version::Version1 => 0b11,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Layer {
  Layer1,
  Layer2,
  Layer3,
  Reserved,
}

impl From<u8> for Layer {
  fn from(layer: u8) -> Layer {
    match layer {
      0b01 => Layer::Layer3,
      0b10 => Layer::Layer2,
      0b11 => Layer::Layer1,
      _ => Layer::Reserved,
    }
  }
}

impl From<Layer> for u8 {
  fn from(layer: Layer) -> u8 {
    match layer {
      Layer::Reserved => 0b00,
      Layer::Layer3 => 0b01,
      Layer::Layer2 => 0b10,
      Layer::Layer1 => 0b11,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Protection {
  Crc,
  Unprotected,
}

impl From<bool> for Protection {
  fn from(bit: bool) -> Protection {
    match bit {
      false => Protection::Crc,
      true => Protection::Unprotected,
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChannelMode {
  Stereo,
  JointStereo,
  DualChannel,
  SingleChannel,
}

impl From<u8> for ChannelMode {
  fn from(mode: u8) -> ChannelMode {
    match mode & 0b11 {
      0b00 => ChannelMode::Stereo,
      0b01 => ChannelMode::JointStereo,
      0b10 => ChannelMode::DualChannel,
      _ => ChannelMode::SingleChannel,
    }
  }
}

impl From<ChannelMode> for u8 {
  fn from(mode: ChannelMode) -> u8 {
    match mode {
      ChannelMode::Stereo => 0b00,
      ChannelMode::JointStereo => 0b01,
      ChannelMode::DualChannel => 0b10,
      ChannelMode::SingleChannel => 0b11,
    }
  }
}

// AAAAAAAA AAABBCCD EEEEFFGH IIJJKLMM
const HEADER_FORMAT: [Field; 13] = [
  Field::Unsigned(11), // sync
  Field::Unsigned(2),  // version
  Field::Unsigned(2),  // layer
  Field::Bool,         // protection, unset when a crc follows
  Field::Unsigned(4),  // bitrate index
  Field::Unsigned(2),  // sampling index
  Field::Unsigned(1),  // padding
  Field::Bool,         // private
  Field::Unsigned(2),  // channel mode
  Field::Unsigned(2),  // mode extension
  Field::Bool,         // copyright
  Field::Bool,         // original
  Field::Unsigned(2),  // emphasis
];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FrameHeader {
  pub sync: u16,
  pub version: Version,
  pub layer: Layer,
  pub protection: Protection,
  pub bitrate_index: u8,
  pub sampling_index: u8,
  pub padding: u8,
  pub private: bool,
  pub mode: ChannelMode,
  pub mode_extension: u8,
  pub copyright: bool,
  pub original: bool,
  pub emphasis: u8,
}

impl FrameHeader {
  fn from_values(values: &[Value]) -> FrameHeader {
    FrameHeader {
      sync: values[0].as_u32() as u16,
      version: Version::from(values[1].as_u8()),
      layer: Layer::from(values[2].as_u8()),
      protection: Protection::from(values[3].as_bool()),
      bitrate_index: values[4].as_u8(),
      sampling_index: values[5].as_u8(),
      padding: values[6].as_u8(),
      private: values[7].as_bool(),
      mode: ChannelMode::from(values[8].as_u8()),
      mode_extension: values[9].as_u8(),
      copyright: values[10].as_bool(),
      original: values[11].as_bool(),
      emphasis: values[12].as_u8(),
    }
  }

  /// Decodes the 4 byte layout without checking the sync pattern.
  pub fn decode(raw: &[u8]) -> Result<FrameHeader> {
    let values = crate::bits::unpack(&HEADER_FORMAT, raw)?;
    Ok(FrameHeader::from_values(&values))
  }

  pub fn encode(&self) -> [u8; 4] {
    let word = (self.sync as u32 & 0x7ff) << 21
      | (u8::from(self.version) as u32) << 19
      | (u8::from(self.layer) as u32) << 17
      | ((self.protection == Protection::Unprotected) as u32) << 16
      | (self.bitrate_index as u32 & 0xf) << 12
      | (self.sampling_index as u32 & 0b11) << 10
      | (self.padding as u32 & 1) << 9
      | (self.private as u32) << 8
      | (u8::from(self.mode) as u32) << 6
      | (self.mode_extension as u32 & 0b11) << 4
      | (self.copyright as u32) << 3
      | (self.original as u32) << 2
      | (self.emphasis as u32 & 0b11);
    word.to_be_bytes()
  }

  pub fn is_synced(&self) -> bool {
    self.sync == SYNC
  }

  pub fn has_crc(&self) -> bool {
    self.protection == Protection::Crc
  }

  pub fn bitrate_kbps(&self) -> Result<u32> {
    tables::bitrate_kbps(self.version, self.layer, self.bitrate_index)
  }

  pub fn sample_rate(&self) -> Result<u32> {
    tables::sample_rate(self.version, self.sampling_index)
  }

  pub fn frame_length(&self) -> Result<u32> {
    tables::frame_length(self.version, self.layer, self.bitrate_index, self.sampling_index, self.padding)
  }

  pub fn side_info_len(&self) -> usize {
    side_info::side_info_len(self.mode)
  }
}

/// Reads the next 4 bytes as a frame header.
///
/// Fails with [`Error::OutOfSync`] carrying the start offset when the sync bits are wrong,
/// and with [`Error::Exhausted`] at the end of the input.
pub fn read_frame_header<R: Read + Seek>(reader: &mut R) -> Result<(Vec<u8>, FrameHeader)> {
  let pos = reader.stream_position()?;
  let (raw, values) = read_bits(reader, &HEADER_FORMAT)?;
  let header = FrameHeader::from_values(&values);
  if !header.is_synced() {
    return Err(Error::OutOfSync { pos, header });
  }
  Ok((raw, header))
}
