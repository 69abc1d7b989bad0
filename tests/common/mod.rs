#![allow(dead_code)]

use mp3frames::crc::frame_crc;
use mp3frames::parsers::{APEV2_SIGNATURE, LYRICS3_BEGIN, LYRICS3V1_END, LYRICS3V2_END};
use mp3frames::Id3v2Header;

/// MPEG 1 layer III, 128 kbit/s, 44100 Hz, joint stereo: 417 bytes per frame.
pub const STEREO_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0x44];
/// Same as [`STEREO_HEADER`] with the protection bit cleared.
pub const PROTECTED_HEADER: [u8; 4] = [0xFF, 0xFA, 0x90, 0x44];
pub const MONO_HEADER: [u8; 4] = [0xFF, 0xFB, 0x90, 0xC4];
pub const FRAME_LENGTH: usize = 417;

fn side_info_len(header: &[u8; 4]) -> usize {
  if header[3] & 0xC0 == 0xC0 { 17 } else { 32 }
}

/// A complete frame with side information `side_info` and a payload of `fill` bytes.
pub fn frame_with(header: [u8; 4], side_info: &[u8], fill: u8) -> Vec<u8> {
  assert_eq!(side_info.len(), side_info_len(&header));
  let mut bytes = header.to_vec();
  if header[1] & 1 == 0 {
    bytes.extend(frame_crc(&header, side_info).to_be_bytes());
  }
  bytes.extend(side_info);
  bytes.resize(FRAME_LENGTH, fill);
  bytes
}

pub fn frame(header: [u8; 4]) -> Vec<u8> {
  frame_with(header, &vec![0u8; side_info_len(&header)], 0x55)
}

pub fn frames(header: [u8; 4], count: usize) -> Vec<u8> {
  (0..count).flat_map(|_| frame(header)).collect()
}

pub fn id3v2(size: u32) -> Vec<u8> {
  let mut bytes = Id3v2Header { major_version: 4, revision: 0, flags: 0, size }.encode();
  bytes.resize(10 + size as usize, 0);
  bytes
}

fn padded(text: &str, len: usize) -> Vec<u8> {
  let mut bytes = text.as_bytes().to_vec();
  bytes.resize(len, 0);
  bytes
}

/// 128 byte ID3v1 tag, version 1.1 when `track` is given.
pub fn id3v1(title: &str, artist: &str, comment: &str, track: Option<u8>) -> Vec<u8> {
  let mut bytes = b"TAG".to_vec();
  bytes.extend(padded(title, 30));
  bytes.extend(padded(artist, 30));
  bytes.extend(padded("Album", 30));
  bytes.extend(padded("2021", 4));
  let mut comment = padded(comment, 30);
  if let Some(track) = track {
    comment[28] = 0;
    comment[29] = track;
  }
  bytes.extend(comment);
  bytes.push(12);
  assert_eq!(bytes.len(), 128);
  bytes
}

/// APEv2 header followed by `size` bytes of items.
pub fn apev2(version: u32, size: u32, item_count: u32) -> Vec<u8> {
  let mut bytes = APEV2_SIGNATURE.to_vec();
  bytes.extend(version.to_le_bytes());
  bytes.extend(size.to_le_bytes());
  bytes.extend(item_count.to_le_bytes());
  bytes.extend((1u32 << 29 | 1 << 31).to_le_bytes());
  bytes.extend([0u8; 8]);
  bytes.resize(32 + size as usize, 0x20);
  bytes
}

pub fn lyrics3v1(lyrics: &str) -> Vec<u8> {
  let mut bytes = LYRICS3_BEGIN.to_vec();
  bytes.extend(lyrics.as_bytes());
  bytes.extend(LYRICS3V1_END);
  bytes
}

pub fn lyrics3v2(fields: &[(&str, &str)]) -> Vec<u8> {
  let mut bytes = LYRICS3_BEGIN.to_vec();
  for (id, value) in fields {
    bytes.extend(id.as_bytes());
    bytes.extend(format!("{:06}", value.len()).as_bytes());
    bytes.extend(value.as_bytes());
  }
  let size = bytes.len();
  bytes.extend(format!("{:06}", size).as_bytes());
  bytes.extend(LYRICS3V2_END);
  bytes
}
