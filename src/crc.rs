use crate::frame::{FrameHeader, Layer};
use crate::{Error, Result};

// CRC-16/CMS: poly 0x8005, init 0xffff, no reflection, no final xor
const POLY: u16 = 0x8005;
const INIT: u16 = 0xffff;

const fn crc16_table() -> [u16; 256] {
  let mut table = [0u16; 256];
  let mut i = 0;
  while i < 256 {
    let mut crc = (i as u16) << 8;
    let mut bit = 0;
    while bit < 8 {
      crc = if crc & 0x8000 != 0 { (crc << 1) ^ POLY } else { crc << 1 };
      bit += 1;
    }
    table[i] = crc;
    i += 1;
  }
  table
}

static TABLE: [u16; 256] = crc16_table();

pub fn crc16_cms(data: &[u8]) -> u16 {
  data.iter().fold(INIT, |crc, &byte| {
    (crc << 8) ^ TABLE[((crc >> 8) as u8 ^ byte) as usize]
  })
}

/// Checksum over the last two header bytes followed by the side information.
pub fn frame_crc(raw_header: &[u8], raw_side_info: &[u8]) -> u16 {
  let protected = &raw_header[raw_header.len().saturating_sub(2)..];
  crc16_cms(&[protected, raw_side_info].concat())
}

/// Compares the stored checksum of the frame starting at `pos` with the computed one.
/// Only layer III side information is covered.
pub fn verify(pos: u64, header: &FrameHeader, raw_header: &[u8], stored: u16, raw_side_info: &[u8]) -> Result<()> {
  if header.layer != Layer::Layer3 {
    return Err(Error::Unsupported(format!(
      "Integrity check is only supported for layer 3 files currently, not {:?}", header.layer)));
  }
  let calculated = frame_crc(raw_header, raw_side_info);
  if stored != calculated {
    return Err(Error::IntegrityCheckFailed { pos, stored, calculated });
  }
  Ok(())
}
