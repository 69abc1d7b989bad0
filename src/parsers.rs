use std::collections::BTreeMap;
use std::io::{Read, Seek, SeekFrom};
use std::str::from_utf8;

use log::{debug, warn};
use nom::bytes::complete::take;
use nom::combinator::map;
use nom::IResult;
use nom::multi::fold_many_m_n;
use nom::number::complete::{be_u8, le_u32, le_u64};
use nom::sequence::tuple;

use crate::bits::{read_bytes, read_struct, read_until};
use crate::{Error, Result};

pub const ID3V2_SIGNATURE: &[u8] = b"ID3";
pub const ID3V1_SIGNATURE: &[u8] = b"TAG";
pub const APEV2_SIGNATURE: &[u8] = b"APETAGEX";
pub const LYRICS3_BEGIN: &[u8] = b"LYRICSBEGIN";
pub const LYRICS3V1_END: &[u8] = b"LYRICSEND";
pub const LYRICS3V2_END: &[u8] = b"LYRICS200";

pub const ID3V2_HEADER_SIZE: u64 = 10;
const ID3V1_BODY_SIZE: usize = 125;
const APEV2_BODY_SIZE: usize = 24;

const LYRICS3V2_FIELDS: [&str; 8] = ["IND", "LYR", "INF", "AUT", "EAL", "EAR", "ETT", "IMG"];

/// Outcome of trying a tag decoder at the current stream position.
#[derive(Debug, PartialEq, Eq)]
pub enum Probe<T> {
  Matched(T),
  /// The signature did not match; the stream is back where the probe started.
  WrongSignature,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id3v2Header {
  pub major_version: u8,
  pub revision: u8,
  pub flags: u8,
  pub size: u32,
}

impl Id3v2Header {
  pub fn unsynchronisation(&self) -> bool {
    self.flags & 0x80 != 0
  }

  pub fn extended_header(&self) -> bool {
    self.flags & 0x40 != 0
  }

  pub fn experimental(&self) -> bool {
    self.flags & 0x20 != 0
  }

  pub fn footer(&self) -> bool {
    self.flags & 0x10 != 0
  }

  /// Bytes following the 10 byte header, footer included.
  pub fn body_len(&self) -> u64 {
    self.size as u64 + if self.footer() { ID3V2_HEADER_SIZE } else { 0 }
  }

  pub fn encode(&self) -> Vec<u8> {
    let mut result = ID3V2_SIGNATURE.to_vec();
    result.extend([self.major_version, self.revision, self.flags]);
    result.extend(as_syncsafe(self.size));
    result
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Id3v1Fields {
  pub title: String,
  pub artist: String,
  pub album: String,
  pub year: String,
  pub comment: String,
  /// Only present in ID3v1.1 tags.
  pub track: Option<u8>,
  pub genre: u8,
}

impl Id3v1Fields {
  pub fn is_v11(&self) -> bool {
    self.track.is_some()
  }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Apev2Header {
  pub version: u32,
  pub size: u32,
  pub item_count: u32,
  pub flags: u32,
  pub reserved: u64,
}

impl Apev2Header {
  pub fn is_header(&self) -> bool {
    self.flags & (1 << 29) != 0
  }
}

pub type Lyrics3v2Fields = BTreeMap<String, String>;

pub fn as_syncsafe(total: u32) -> Vec<u8> {
  let mut result: Vec<u8> = Vec::new();
  let mut remaining = total;
  for _byte in total.to_be_bytes() {
    result.insert(0, (remaining & 0b01111111) as u8);
    remaining >>= 7;
  }
  result
}

pub fn syncsafe(input: &[u8]) -> IResult<&[u8], u32> {
  fold_many_m_n(4, 4, be_u8, || 0u32,
    |acc, byte| acc << 7 | (byte & 0b01111111) as u32)(input)
}

pub fn latin1(bytes: &[u8]) -> String {
  bytes.iter().map(|&b| b as char).collect()
}

fn trim_nul(bytes: &[u8]) -> &[u8] {
  let end = bytes.iter().rposition(|&b| b != 0).map_or(0, |i| i + 1);
  &bytes[..end]
}

fn id3v2_header(input: &[u8]) -> IResult<&[u8], Id3v2Header> {
  let (input, (major_version, revision, flags, size)) =
    tuple((be_u8, be_u8, be_u8, syncsafe))(input)?;
  Ok((input, Id3v2Header { major_version, revision, flags, size }))
}

fn id3v1_body(input: &[u8]) -> IResult<&[u8], Id3v1Fields> {
  let (input, (title, artist, album, year, comment, genre)) =
    tuple((take(30u8), take(30u8), take(30u8), take(4u8), take(30u8), be_u8))(input)?;

  let (comment, track) = if comment[29] != 0 && comment[28] == 0 {
    (trim_nul(&comment[..28]), Some(comment[29]))
  } else {
    (trim_nul(comment), None)
  };

  Ok((input, Id3v1Fields {
    title: latin1(trim_nul(title)),
    artist: latin1(trim_nul(artist)),
    album: latin1(trim_nul(album)),
    year: latin1(trim_nul(year)),
    comment: latin1(comment),
    track,
    genre,
  }))
}

fn apev2_header(input: &[u8]) -> IResult<&[u8], Apev2Header> {
  let (input, (version, size, item_count, flags, reserved)) =
    tuple((le_u32, le_u32, le_u32, le_u32, le_u64))(input)?;
  Ok((input, Apev2Header { version, size, item_count, flags, reserved }))
}

fn lyrics3v2_field_header(input: &[u8]) -> IResult<&[u8], (Vec<u8>, Vec<u8>)> {
  map(tuple((take(3u8), take(6u8))),
    |(id, size): (&[u8], &[u8])| (id.to_vec(), size.to_vec()))(input)
}

fn lyrics3v2_end(input: &[u8]) -> IResult<&[u8], bool> {
  map(tuple((take(6u8), take(9u8))),
    |(_size, signature): (&[u8], &[u8])| signature == LYRICS3V2_END)(input)
}

/// Consumes `signature` if the stream continues with it, otherwise restores the position.
/// Running out of input counts as a mismatch.
fn probe_signature<R: Read + Seek>(reader: &mut R, signature: &[u8]) -> Result<bool> {
  let pos = reader.stream_position()?;
  match read_bytes(reader, signature.len()) {
    Ok(bytes) if bytes == signature => Ok(true),
    Ok(_) | Err(Error::Exhausted) => {
      reader.seek(SeekFrom::Start(pos))?;
      Ok(false)
    }
    Err(e) => Err(e),
  }
}

/// Reads the ID3v2 header and skips the tag body. Parsing frames is not supported.
pub fn read_id3v2<R: Read + Seek>(reader: &mut R, parse: bool) -> Result<Probe<Id3v2Header>> {
  if !probe_signature(reader, ID3V2_SIGNATURE)? {
    return Ok(Probe::WrongSignature);
  }
  let header = read_struct(reader, 7, id3v2_header)?;
  debug!("ID3 {} tag size {}", header.major_version, header.size);

  if parse {
    return Err(Error::NotImplemented("ID3v2 frame parsing"));
  }
  reader.seek(SeekFrom::Current(header.body_len() as i64))?;
  Ok(Probe::Matched(header))
}

// http://id3lib.sourceforge.net/id3/id3v1.html
pub fn read_id3v1<R: Read + Seek>(reader: &mut R) -> Result<Probe<Id3v1Fields>> {
  if !probe_signature(reader, ID3V1_SIGNATURE)? {
    return Ok(Probe::WrongSignature);
  }
  let fields = read_struct(reader, ID3V1_BODY_SIZE, id3v1_body)?;
  debug!("ID3v1 {:?}", fields);
  Ok(Probe::Matched(fields))
}

pub fn read_apev2<R: Read + Seek>(reader: &mut R) -> Result<Probe<Apev2Header>> {
  if !probe_signature(reader, APEV2_SIGNATURE)? {
    return Ok(Probe::WrongSignature);
  }
  let header = read_struct(reader, APEV2_BODY_SIZE, apev2_header)?;
  if header.version != 1000 && header.version != 2000 {
    return Err(Error::Parse(format!("Unknown APE tag version {}", header.version)));
  }
  debug!("APEv2 {:?}", header);
  reader.seek(SeekFrom::Current(header.size as i64))?;
  Ok(Probe::Matched(header))
}

// https://id3.org/Lyrics3
pub fn read_lyrics3v1<R: Read + Seek>(reader: &mut R) -> Result<Probe<String>> {
  if !probe_signature(reader, LYRICS3_BEGIN)? {
    return Ok(Probe::WrongSignature);
  }
  let lyrics = latin1(&read_until(reader, LYRICS3V1_END)?);
  debug!("Lyrics3v1 {} characters", lyrics.len());
  Ok(Probe::Matched(lyrics))
}

fn lyrics3v2_fields<R: Read + Seek>(reader: &mut R) -> Result<Lyrics3v2Fields> {
  let mut fields = Lyrics3v2Fields::new();
  loop {
    if read_struct(reader, 15, lyrics3v2_end)? {
      break;
    }
    reader.seek(SeekFrom::Current(-15))?;

    let (id, size) = read_struct(reader, 9, lyrics3v2_field_header)?;
    let id = from_utf8(&id)
      .map_err(|_| Error::Parse(format!("Lyrics3v2 field id {:?}", id)))?
      .to_string();
    let size: usize = from_utf8(&size).ok()
      .and_then(|s| s.trim().parse().ok())
      .ok_or_else(|| Error::Parse(format!("Lyrics3v2 field size {:?}", size)))?;
    if !LYRICS3V2_FIELDS.contains(&id.as_str()) {
      warn!("Found undefined field: {}", id);
    }

    let information = latin1(&read_bytes(reader, size)?);
    // duplicated fields overwrite the earlier value
    fields.insert(id, information);
  }
  Ok(fields)
}

// https://id3.org/Lyrics3v2
/// A tag that starts like Lyrics3v2 but does not hold a valid field list is
/// reported as a wrong signature, so the Lyrics3v1 decoder gets its turn.
pub fn read_lyrics3v2<R: Read + Seek>(reader: &mut R) -> Result<Probe<Lyrics3v2Fields>> {
  let pos = reader.stream_position()?;
  if !probe_signature(reader, LYRICS3_BEGIN)? {
    return Ok(Probe::WrongSignature);
  }
  match lyrics3v2_fields(reader) {
    Ok(fields) => {
      debug!("Lyrics3v2 fields {:?}", fields.keys().collect::<Vec<_>>());
      Ok(Probe::Matched(fields))
    }
    Err(Error::Parse(_)) | Err(Error::Exhausted) => {
      debug!("Not a Lyrics3v2 tag at {}", pos);
      reader.seek(SeekFrom::Start(pos))?;
      Ok(Probe::WrongSignature)
    }
    Err(e) => Err(e),
  }
}
