use crate::frame::{Layer, Version};
use crate::{Error, Result};

// http://www.mp3-tech.org/programmer/frame_header.html

/// Hz, indexed by version code then sampling index. Index 3 and version 0b01 are reserved.
const SAMPLE_RATES: [[Option<u32>; 4]; 4] = [
  [Some(11025), Some(12000), Some(8000), None], // MPEG 2.5
  [None, None, None, None],
  [Some(22050), Some(24000), Some(16000), None], // MPEG 2
  [Some(44100), Some(48000), Some(32000), None], // MPEG 1
];

/// kbps, indexed by bitrate index, then MPEG 1 / MPEG 2 and 2.5, then layer I, II, III.
/// Index 0 is "free format" and index 15 is forbidden.
const BITRATES: [[[u32; 3]; 2]; 16] = [
  [[0, 0, 0], [0, 0, 0]],
  [[32, 32, 32], [32, 8, 8]],
  [[64, 48, 40], [48, 16, 16]],
  [[96, 56, 48], [56, 24, 24]],
  [[128, 64, 56], [64, 32, 32]],
  [[160, 80, 64], [80, 40, 40]],
  [[192, 96, 80], [96, 48, 48]],
  [[224, 112, 96], [112, 56, 56]],
  [[256, 128, 112], [128, 64, 64]],
  [[288, 160, 128], [144, 80, 80]],
  [[320, 192, 160], [160, 96, 96]],
  [[352, 224, 192], [176, 112, 112]],
  [[384, 256, 224], [192, 128, 128]],
  [[416, 320, 256], [224, 144, 144]],
  [[448, 384, 320], [256, 160, 160]],
  [[0, 0, 0], [0, 0, 0]],
];

pub fn sample_rate(version: Version, sampling_index: u8) -> Result<u32> {
  if version == Version::Reserved {
    return Err(Error::Reserved { field: "id", value: version.into() });
  }
  SAMPLE_RATES[u8::from(version) as usize]
    .get(sampling_index as usize)
    .copied()
    .flatten()
    .ok_or(Error::Reserved { field: "frequency", value: sampling_index })
}

pub fn bitrate_kbps(version: Version, layer: Layer, bitrate_index: u8) -> Result<u32> {
  let invalid = || Error::Parse(format!(
    "Invalid values bitrate={} id={:?} layer={:?}", bitrate_index, version, layer));

  // MPEG 2.5 shares the MPEG 2 column
  let column = match version {
    Version::Version1 => 0,
    Version::Version2 | Version::Version25 => 1,
    Version::Reserved => return Err(invalid()),
  };
  let row = match layer {
    Layer::Layer1 => 0,
    Layer::Layer2 => 1,
    Layer::Layer3 => 2,
    Layer::Reserved => return Err(invalid()),
  };
  match BITRATES.get(bitrate_index as usize).map(|rates| rates[column][row]) {
    Some(kbps) if kbps > 0 => Ok(kbps),
    _ => Err(invalid()),
  }
}

/// Frame length in bytes, header included.
///
/// Layers II and III use `144 * bitrate / sample_rate + padding` for every version,
/// so MPEG 2 and 2.5 layer III lengths follow the same constant as MPEG 1.
/// Layer I counts 4 byte slots: `(12 * bitrate / sample_rate + padding) * 4`.
pub fn frame_length(version: Version, layer: Layer, bitrate_index: u8, sampling_index: u8, padding: u8) -> Result<u32> {
  let sample_rate = sample_rate(version, sampling_index)?;
  let bitrate = bitrate_kbps(version, layer, bitrate_index)? * 1000;
  let padding = padding as u32;
  match layer {
    Layer::Layer1 => Ok((12 * bitrate / sample_rate + padding) * 4),
    _ => Ok(144 * bitrate / sample_rate + padding),
  }
}
