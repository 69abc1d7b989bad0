mod common;

use std::io::Cursor;

use log::LevelFilter;
use mp3frames::{Mp3FrameParser, ReadOptions, Record, Result};

#[cfg(test)]
#[ctor::ctor]
fn init() {
  let _ = env_logger::builder().is_test(true).filter_level(LevelFilter::Debug).try_init();
}

const VERIFY: ReadOptions = ReadOptions { content: true, verify: true };

fn records(bytes: Vec<u8>, options: ReadOptions) -> Vec<Result<Record>> {
  Mp3FrameParser::new(Cursor::new(bytes), options).unwrap().collect()
}

fn positions(records: &[Result<Record>]) -> Vec<u64> {
  records.iter().filter_map(|r| r.as_ref().ok()).map(Record::pos).collect()
}

#[cfg(test)]
mod tests {
  use assert_matches::assert_matches;

  use mp3frames::Error;

  use super::*;
  use crate::common::*;

  #[test]
  fn test_iterator() {
    let records = records(frames(STEREO_HEADER, 26), ReadOptions::default());
    assert_eq!(26, records.len());
    assert_eq!(positions(&records)[25], 25 * FRAME_LENGTH as u64);
    for record in records {
      assert_matches!(record, Ok(Record::Frame { raw: None, .. }));
    }
  }

  #[test]
  fn test_leading_id3v2() {
    let mut bytes = id3v2(1114);
    bytes.extend(frames(STEREO_HEADER, 2));
    let records = records(bytes, ReadOptions::default());
    assert_eq!(records.len(), 3);
    assert_matches!(&records[0], Ok(Record::Id3v2 { pos: 0, header }) => {
      assert_eq!(header.size, 1114);
    });
    assert_eq!(positions(&records), vec![0, 1124, 1124 + FRAME_LENGTH as u64]);
  }

  #[test]
  fn test_content_keeps_raw_bytes() {
    let bytes = frames(MONO_HEADER, 3);
    let records = records(bytes.clone(), ReadOptions { content: true, verify: false });
    let raw: Vec<u8> = records.iter()
      .flat_map(|r| r.as_ref().unwrap().raw().unwrap().to_vec())
      .collect();
    assert_eq!(raw, bytes);
  }

  #[test]
  fn test_verified_frames() {
    let records = records(frames(PROTECTED_HEADER, 3), VERIFY);
    assert_eq!(records.len(), 3);
    for record in records {
      let record = record.unwrap();
      let frame = record.frame().unwrap();
      assert!(frame.crc.is_some());
      assert_eq!(record.raw().unwrap().len(), FRAME_LENGTH);
    }
  }

  #[test]
  fn test_integrity_failure_continues() {
    let mut bytes = frames(PROTECTED_HEADER, 3);
    bytes[FRAME_LENGTH + 8] ^= 0xFF;
    let records = records(bytes, VERIFY);
    assert_eq!(records.len(), 3);
    assert_matches!(records[0], Ok(Record::Frame { .. }));
    assert_matches!(records[1], Err(Error::IntegrityCheckFailed { pos, stored, calculated }) => {
      assert_eq!(pos, FRAME_LENGTH as u64);
      assert_ne!(stored, calculated);
    });
    assert_matches!(&records[2], Ok(record) => assert_eq!(record.pos(), 2 * FRAME_LENGTH as u64));
  }

  #[test]
  fn test_corruption_unchecked_without_verify() {
    let mut bytes = frames(PROTECTED_HEADER, 2);
    bytes[8] ^= 0xFF;
    let records = records(bytes, ReadOptions::default());
    assert!(records.iter().all(|r| r.is_ok()));
    assert_eq!(records.len(), 2);
  }

  #[test]
  fn test_invalid_frame_after_audio() {
    let mut bytes = frames(STEREO_HEADER, 2);
    bytes.extend(b"junkjunkjunk");
    let records = records(bytes, ReadOptions::default());
    assert_eq!(records.len(), 3);
    assert_matches!(&records[2], Err(Error::InvalidFrame { pos, bytes }) => {
      assert_eq!(*pos, 2 * FRAME_LENGTH as u64);
      assert_eq!(bytes, b"junkjunk");
    });
  }

  #[test]
  fn test_short_junk_after_audio() {
    let mut bytes = frames(STEREO_HEADER, 2);
    bytes.extend(b"\x00junk");
    let records = records(bytes, ReadOptions::default());
    assert_eq!(records.len(), 3);
    assert_matches!(&records[2], Err(Error::InvalidFrame { pos, bytes }) => {
      assert_eq!(*pos, 2 * FRAME_LENGTH as u64);
      assert_eq!(bytes, b"\x00junk");
    });
  }

  fn reserved_frequency_frame(corrupt: bool) -> Vec<u8> {
    // protected, sampling index 0b11
    let header = [0xFF, 0xFA, 0x9C, 0x44];
    let side_info = [0u8; 32];
    let mut crc = mp3frames::crc::frame_crc(&header, &side_info);
    if corrupt {
      crc ^= 1;
    }
    let mut bytes = header.to_vec();
    bytes.extend(crc.to_be_bytes());
    bytes.extend(side_info);
    bytes.resize(FRAME_LENGTH, 0x55);
    bytes
  }

  #[test]
  fn test_checksum_checked_before_frame_length() {
    let corrupt = records(reserved_frequency_frame(true), VERIFY);
    assert_eq!(corrupt.len(), 1);
    assert_matches!(corrupt[0], Err(Error::IntegrityCheckFailed { pos: 0, .. }));

    let intact = records(reserved_frequency_frame(false), VERIFY);
    assert_eq!(intact.len(), 1);
    assert_matches!(intact[0], Err(Error::Reserved { field: "frequency", value: 3 }));
  }

  #[test]
  fn test_maybe_not_mp3() {
    let mut garbage: [u8; 32] = rand::random();
    garbage[0] = 0;
    let records = records(garbage.to_vec(), ReadOptions::default());
    assert_eq!(records.len(), 1);
    assert_matches!(&records[0], Err(Error::MaybeNotMp3 { bytes }) => {
      assert_eq!(bytes, &garbage[..8]);
    });
  }

  #[test]
  fn test_trailing_tags() {
    let mut bytes = frames(STEREO_HEADER, 2);
    bytes.extend(apev2(2000, 40, 1));
    bytes.extend(lyrics3v2(&[("IND", "10"), ("LYR", "la la")]));
    let lyrics_end = bytes.len() as u64;
    bytes.extend(lyrics3v1("la la la"));
    let id3v1_start = bytes.len() as u64;
    bytes.extend(id3v1("Tink", "Apple", "", Some(1)));

    let records = records(bytes, ReadOptions::default());
    assert_eq!(records.len(), 6);
    assert_matches!(records[2], Ok(Record::Apev2 { pos, .. }) => assert_eq!(pos, 2 * FRAME_LENGTH as u64));
    assert_matches!(&records[3], Ok(Record::Lyrics3v2 { fields, .. }) => assert_eq!(fields["LYR"], "la la"));
    assert_matches!(&records[4], Ok(Record::Lyrics3v1 { pos, lyrics }) => {
      assert_eq!(*pos, lyrics_end);
      assert_eq!(lyrics, "la la la");
    });
    assert_matches!(&records[5], Ok(Record::Id3v1 { pos, fields }) => {
      assert_eq!(*pos, id3v1_start);
      assert_eq!(fields.track, Some(1));
    });
  }

  #[test]
  fn test_frames_after_tag() {
    let mut bytes = frame(STEREO_HEADER);
    bytes.extend(id3v1("Tink", "Apple", "", None));
    bytes.extend(frame(STEREO_HEADER));
    let records = records(bytes, ReadOptions::default());
    assert_eq!(positions(&records), vec![0, 417, 417 + 128]);
  }

  #[test]
  fn test_truncated_frame() {
    let mut bytes = frames(STEREO_HEADER, 2);
    bytes.extend(&frame(STEREO_HEADER)[..100]);

    let verified = records(bytes.clone(), VERIFY);
    assert_eq!(verified.len(), 2);
    assert!(verified.iter().all(|r| r.is_ok()));

    // without content the payload is skipped, not read
    let skipped = records(bytes, ReadOptions::default());
    assert_eq!(skipped.len(), 3);
    assert!(skipped.iter().all(|r| r.is_ok()));
  }

  #[test]
  fn test_stop_early() {
    let mut parser = Mp3FrameParser::new(Cursor::new(frames(STEREO_HEADER, 5)), ReadOptions::default()).unwrap();
    assert!(parser.next().is_some());
    let cursor = parser.into_inner();
    assert_eq!(cursor.position(), FRAME_LENGTH as u64);
  }

  #[test]
  fn test_display() {
    let records = records(frames(PROTECTED_HEADER, 1), VERIFY);
    let line = records[0].as_ref().unwrap().to_string();
    assert!(line.starts_with("0 Version1 Layer3 JointStereo"), "{}", line);
    assert!(line.contains("crc"));
  }
}
