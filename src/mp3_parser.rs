use std::fmt;
use std::io::{Read, Seek, SeekFrom};

use log::{debug, warn};

use crate::bits::read_bytes;
use crate::crc;
use crate::frame::{read_frame_header, FrameHeader};
use crate::parsers::{read_apev2, read_id3v1, read_id3v2, read_lyrics3v1, read_lyrics3v2, Apev2Header,
  Id3v1Fields, Id3v2Header, Lyrics3v2Fields, Probe};
use crate::side_info::{read_side_info, SideInformation};
use crate::{Error, Result};

const DIAGNOSTIC_BYTES: u64 = 8;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ReadOptions {
  /// Keep the raw bytes of every frame.
  pub content: bool,
  /// Check frame checksums. Requires `content`.
  pub verify: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MpegAudioFrame {
  pub pos: u64,
  pub header: FrameHeader,
  pub crc: Option<u16>,
  pub side_info: SideInformation,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Record {
  Id3v2 { pos: u64, header: Id3v2Header },
  Id3v1 { pos: u64, fields: Id3v1Fields },
  Apev2 { pos: u64, header: Apev2Header },
  Lyrics3v1 { pos: u64, lyrics: String },
  Lyrics3v2 { pos: u64, fields: Lyrics3v2Fields },
  Frame { frame: MpegAudioFrame, raw: Option<Vec<u8>> },
}

impl Record {
  pub fn pos(&self) -> u64 {
    match self {
      Record::Id3v2 { pos, .. }
      | Record::Id3v1 { pos, .. }
      | Record::Apev2 { pos, .. }
      | Record::Lyrics3v1 { pos, .. }
      | Record::Lyrics3v2 { pos, .. } => *pos,
      Record::Frame { frame, .. } => frame.pos,
    }
  }

  pub fn frame(&self) -> Option<&MpegAudioFrame> {
    match self {
      Record::Frame { frame, .. } => Some(frame),
      _ => None,
    }
  }

  pub fn raw(&self) -> Option<&[u8]> {
    match self {
      Record::Frame { raw: Some(raw), .. } => Some(raw),
      _ => None,
    }
  }
}

impl fmt::Display for Record {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Record::Id3v2 { pos, header } =>
        write!(f, "{} ID3v2.{}.{} size {}", pos, header.major_version, header.revision, header.size),
      Record::Id3v1 { pos, fields } =>
        write!(f, "{} ID3v1{} {} - {}", pos, if fields.is_v11() { ".1" } else { "" }, fields.artist, fields.title),
      Record::Apev2 { pos, header } =>
        write!(f, "{} APEv2 {} items size {}", pos, header.item_count, header.size),
      Record::Lyrics3v1 { pos, lyrics } => write!(f, "{} Lyrics3v1 {} characters", pos, lyrics.len()),
      Record::Lyrics3v2 { pos, fields } => write!(f, "{} Lyrics3v2 {} fields", pos, fields.len()),
      Record::Frame { frame, .. } => {
        let header = &frame.header;
        write!(f, "{} {:?} {:?} {:?} bitrate {} frequency {}", frame.pos, header.version, header.layer,
          header.mode, header.bitrate_index, header.sampling_index)?;
        if let Some(crc) = frame.crc {
          write!(f, " crc {:#06x}", crc)?;
        }
        Ok(())
      }
    }
  }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
  Start,
  InFrames,
  Done,
}

/// Walks an MPEG audio stream front to back, yielding tags and frames.
///
/// A leading ID3v2 tag is skipped first. When a frame header is out of sync the
/// tag decoders are tried in order APEv2, Lyrics3v2, Lyrics3v1, ID3v1. If none matches
/// the scan ends with [`Error::MaybeNotMp3`] when nothing valid was seen yet, and
/// with [`Error::InvalidFrame`] otherwise. The iterator is fused after any error
/// except [`Error::IntegrityCheckFailed`].
#[derive(Debug)]
pub struct Mp3FrameParser<R> {
  reader: R,
  options: ReadOptions,
  start: u64,
  state: State,
}

impl<R: Read + Seek> Mp3FrameParser<R> {
  pub fn new(mut reader: R, options: ReadOptions) -> Result<Self> {
    if options.verify && !options.content {
      return Err(Error::InvalidArgument("verify requires content"));
    }
    let start = reader.stream_position()?;
    Ok(Mp3FrameParser { reader, options, start, state: State::Start })
  }

  pub fn into_inner(self) -> R {
    self.reader
  }

  fn read_leading_id3v2(&mut self) -> Result<Option<Record>> {
    match read_id3v2(&mut self.reader, false) {
      Ok(Probe::Matched(header)) => Ok(Some(Record::Id3v2 { pos: self.start, header })),
      Ok(Probe::WrongSignature) => Ok(None),
      Err(Error::NotImplemented(_)) | Err(Error::Exhausted) => {
        self.reader.seek(SeekFrom::Start(self.start))?;
        Ok(None)
      }
      Err(e) => Err(e),
    }
  }

  /// `None` at the end of the stream.
  fn read_frame(&mut self) -> Result<Option<Record>> {
    let (raw_header, header) = match read_frame_header(&mut self.reader) {
      Ok(result) => result,
      Err(Error::Exhausted) => return Ok(None),
      Err(e) => return Err(e),
    };
    let pos = self.reader.stream_position()? - raw_header.len() as u64;
    let mut raw = raw_header.clone();

    let crc = if header.has_crc() {
      let bytes = read_bytes(&mut self.reader, 2)?;
      raw.extend_from_slice(&bytes);
      Some(u16::from_be_bytes([bytes[0], bytes[1]]))
    } else {
      None
    };

    let (raw_side_info, side_info) = read_side_info(&mut self.reader, &header)?;
    raw.extend_from_slice(&raw_side_info);

    if let (Some(stored), true) = (crc, self.options.verify) {
      if let Err(e) = crc::verify(pos, &header, &raw_header, stored, &raw_side_info) {
        if let Error::IntegrityCheckFailed { .. } = e {
          match header.frame_length() {
            Ok(frame_length) => { self.reader.seek(SeekFrom::Start(pos + frame_length as u64))?; }
            // no way to skip the frame, so the scan cannot continue
            Err(_) => self.state = State::Done,
          }
        }
        return Err(e);
      }
    }

    let frame_length = header.frame_length()? as u64;
    let consumed = raw.len() as u64;
    if frame_length < consumed {
      return Err(Error::Parse(format!(
        "Frame length {} at {} is shorter than its header and side information", frame_length, pos)));
    }

    let raw = if self.options.content {
      raw.extend(read_bytes(&mut self.reader, (frame_length - consumed) as usize)?);
      Some(raw)
    } else {
      self.reader.seek(SeekFrom::Start(pos + frame_length))?;
      None
    };

    let frame = MpegAudioFrame { pos, header, crc, side_info };
    Ok(Some(Record::Frame { frame, raw }))
  }

  fn read_tags(&mut self, pos: u64) -> Result<Record> {
    let reader = &mut self.reader;
    reader.seek(SeekFrom::Start(pos))?;

    if let Probe::Matched(header) = read_apev2(reader)? {
      return Ok(Record::Apev2 { pos, header });
    }
    if let Probe::Matched(fields) = read_lyrics3v2(reader)? {
      return Ok(Record::Lyrics3v2 { pos, fields });
    }
    if let Probe::Matched(lyrics) = read_lyrics3v1(reader)? {
      return Ok(Record::Lyrics3v1 { pos, lyrics });
    }
    if let Probe::Matched(fields) = read_id3v1(reader)? {
      return Ok(Record::Id3v1 { pos, fields });
    }

    let mut bytes = Vec::new();
    reader.by_ref().take(DIAGNOSTIC_BYTES).read_to_end(&mut bytes)?;
    if pos == self.start {
      Err(Error::MaybeNotMp3 { bytes })
    } else {
      Err(Error::InvalidFrame { pos, bytes })
    }
  }

  fn finish(&mut self, result: Result<Record>) -> Option<Result<Record>> {
    match result {
      Ok(record) => Some(Ok(record)),
      Err(Error::Exhausted) => {
        warn!("Truncated data at end of stream");
        self.state = State::Done;
        None
      }
      Err(e) => {
        if e.is_terminal() {
          self.state = State::Done;
        }
        Some(Err(e))
      }
    }
  }
}

impl<R: Read + Seek> Iterator for Mp3FrameParser<R> {
  type Item = Result<Record>;

  fn next(&mut self) -> Option<Self::Item> {
    loop {
      match self.state {
        State::Done => return None,
        State::Start => {
          self.state = State::InFrames;
          match self.read_leading_id3v2() {
            Ok(Some(record)) => return Some(Ok(record)),
            Ok(None) => continue,
            Err(e) => return self.finish(Err(e)),
          }
        }
        State::InFrames => {
          return match self.read_frame() {
            Ok(Some(record)) => Some(Ok(record)),
            Ok(None) => {
              self.state = State::Done;
              None
            }
            Err(Error::OutOfSync { pos, header }) => {
              debug!("Out of sync at {}: {:?}", pos, header);
              let result = self.read_tags(pos);
              self.finish(result)
            }
            Err(e) => self.finish(Err(e)),
          };
        }
      }
    }
  }
}
