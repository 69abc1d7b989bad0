use std::collections::VecDeque;
use std::fs::File;
use std::io::BufReader;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use log::{error, info, LevelFilter};

use mp3frames::{copy_mpeg_audio_file, Mp3FrameParser, ReadOptions, Record};

#[derive(Parser)]
#[command(version, about = "Scan MPEG audio files frame by frame")]
struct Cli {
  /// Log every decoded frame and tag
  #[arg(short, long)]
  verbose: bool,

  #[command(subcommand)]
  action: Action,
}

#[derive(Subcommand)]
enum Action {
  /// Decode and verify every frame
  Read {
    files: Vec<PathBuf>,
  },
  /// Copy the valid frames of every file next to it, dropping tags
  Copy {
    /// Added in front of the extension of the copy
    #[arg(long, default_value = ".copy")]
    copy_suffix: String,
    files: Vec<PathBuf>,
  },
}

fn read_file(path: &Path) -> mp3frames::Result<usize> {
  let file = BufReader::new(File::open(path)?);
  let parser = Mp3FrameParser::new(file, ReadOptions { content: true, verify: true })?;

  let mut first: Option<Record> = None;
  let mut last: VecDeque<Record> = VecDeque::with_capacity(2);
  let mut count = 0;
  for record in parser {
    match record {
      Ok(record) => {
        count += 1;
        if first.is_none() {
          first = Some(record);
        } else {
          if last.len() == 2 {
            last.pop_front();
          }
          last.push_back(record);
        }
      }
      Err(e) => {
        for record in first.iter().chain(last.iter()) {
          eprintln!("{}", record);
        }
        return Err(e);
      }
    }
  }
  Ok(count)
}

fn copy_target(path: &Path, suffix: &str) -> Option<PathBuf> {
  let stem = path.file_stem()?.to_string_lossy();
  let name = match path.extension() {
    Some(ext) => format!("{}{}.{}", stem, suffix, ext.to_string_lossy()),
    None => format!("{}{}", stem, suffix),
  };
  if stem.ends_with(suffix) {
    return None;
  }
  Some(path.with_file_name(name))
}

fn main() -> ExitCode {
  let cli = Cli::parse();
  let level = if cli.verbose { LevelFilter::Debug } else { LevelFilter::Info };
  env_logger::Builder::new()
    .filter_level(level)
    .parse_env("RUST_LOG")
    .init();

  let mut total = 0;
  let mut errors = 0;
  match cli.action {
    Action::Read { files } => {
      for path in files {
        total += 1;
        match read_file(&path) {
          Ok(count) => info!("{:?}: {} records", path, count),
          Err(e) => {
            error!("Enumerating frames of {:?} failed: {}", path, e);
            errors += 1;
          }
        }
      }
    }
    Action::Copy { copy_suffix, files } => {
      for path in files {
        total += 1;
        let Some(target) = copy_target(&path, &copy_suffix) else {
          info!("Skipping copy file {:?}", path);
          continue;
        };
        if target.exists() {
          info!("Skipping already copied file {:?}", path);
          continue;
        }
        match copy_mpeg_audio_file(&path, &target) {
          Ok(summary) => {
            info!("{:?}: copied {} frames, {} bytes", path, summary.frames, summary.bytes);
            if let Some(pos) = summary.stopped_at {
              info!("{:?}: stopped at invalid frame at {}", path, pos);
            }
          }
          Err(e) => {
            error!("Copying frames of {:?} failed: {}", path, e);
            errors += 1;
          }
        }
      }
    }
  }

  println!("{}/{} files failed to parse", errors, total);
  if errors > 0 { ExitCode::FAILURE } else { ExitCode::SUCCESS }
}
