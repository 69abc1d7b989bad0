use std::fs::File;
use std::io::{BufReader, BufWriter, Read, Seek, Write};
use std::path::Path;

use log::{debug, info};
use tempfile::NamedTempFile;

use crate::mp3_parser::{Mp3FrameParser, ReadOptions, Record};
use crate::{Error, Result};

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CopySummary {
  pub frames: usize,
  pub bytes: u64,
  /// Offset of the invalid frame the copy stopped at, if any.
  pub stopped_at: Option<u64>,
}

/// Writes the raw bytes of every checksum-verified frame of `input` to `output`.
/// Tags are dropped.
///
/// An [`Error::InvalidFrame`] ends the copy without failing it: the output then holds
/// the valid frames in front of the corrupt region and `stopped_at` says where that was.
/// Every other error is returned.
pub fn copy_mpeg_audio<R: Read + Seek, W: Write>(input: R, output: &mut W) -> Result<CopySummary> {
  let parser = Mp3FrameParser::new(input, ReadOptions { content: true, verify: true })?;
  let mut summary = CopySummary::default();

  for record in parser {
    match record {
      Ok(Record::Frame { raw: Some(raw), .. }) => {
        output.write_all(&raw)?;
        summary.frames += 1;
        summary.bytes += raw.len() as u64;
      }
      Ok(record) => debug!("Skipping {}", record),
      Err(Error::InvalidFrame { pos, bytes }) => {
        info!("Stopped at invalid frame at {}: {:?}", pos, bytes);
        summary.stopped_at = Some(pos);
        break;
      }
      Err(e) => return Err(e),
    }
  }

  output.flush()?;
  Ok(summary)
}

/// Copies the frames of `in_path` into `out_path`. The output only appears once the copy
/// succeeded.
pub fn copy_mpeg_audio_file(in_path: &Path, out_path: &Path) -> Result<CopySummary> {
  let input = BufReader::new(File::open(in_path)?);
  let dir = match out_path.parent() {
    Some(parent) if !parent.as_os_str().is_empty() => parent,
    _ => Path::new("."),
  };

  let mut tmp = NamedTempFile::new_in(dir)?;
  let summary = {
    let mut writer = BufWriter::new(tmp.as_file_mut());
    copy_mpeg_audio(input, &mut writer)?
  };
  tmp.persist(out_path).map_err(|e| e.error)?;
  debug!("Copied {} frames from {:?} to {:?}", summary.frames, in_path, out_path);
  Ok(summary)
}
