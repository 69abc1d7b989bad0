//! Frame level reader for MPEG audio files (MP3/MP2).
//!
//! Decodes frame headers and layer III side information, verifies frame checksums
//! and recognises the tags commonly found around the audio: ID3v2, ID3v1/1.1, APEv2,
//! Lyrics3 v1 and v2.
//!
//! ```no_run
//! use std::fs::File;
//! use std::io::BufReader;
//! use mp3frames::{Mp3FrameParser, ReadOptions};
//!
//! let file = BufReader::new(File::open("song.mp3").unwrap());
//! for record in Mp3FrameParser::new(file, ReadOptions::default()).unwrap() {
//!   println!("{}", record.unwrap());
//! }
//! ```

use log::LevelFilter;

pub mod bits;
pub mod copy;
pub mod crc;
pub mod error;
pub mod frame;
pub mod mp3_parser;
pub mod parsers;
pub mod side_info;
pub mod tables;

pub use copy::{copy_mpeg_audio, copy_mpeg_audio_file, CopySummary};
pub use error::{Error, Result};
pub use frame::{ChannelMode, FrameHeader, Layer, Protection, Version};
pub use mp3_parser::{Mp3FrameParser, MpegAudioFrame, ReadOptions, Record};
pub use parsers::{Apev2Header, Id3v1Fields, Id3v2Header, Lyrics3v2Fields, Probe};
pub use side_info::{BlockLayout, Granule, SideInformation};

pub fn log_init() {
  let _ = env_logger::builder().is_test(true)
    .filter_level(LevelFilter::Debug)
    .try_init();
}
