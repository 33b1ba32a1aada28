// Error taxonomy for the whole crate. One variant group per class named
// in the design's error-handling section: input validation (encoder side),
// bitstream/container format validation (decoder side), I/O, and internal
// invariant violations that should never actually be reachable.

use thiserror::Error;

#[derive(Debug, Error)]
pub enum InputError {
  #[error("source images have inconsistent resolution: first was {first_w}x{first_h}, later image {index} was {w}x{h}")]
  ResolutionMismatch { first_w: usize, first_h: usize, index: usize, w: usize, h: usize },

  #[error("frame size {w}x{h} is invalid: width and height must be non-zero multiples of 16")]
  InvalidExtent { w: usize, h: usize },

  #[error("frame size {w}x{h} exceeds the 512-pixel-per-axis limit imposed by the 5-bit supertile coordinate field")]
  FrameTooLarge { w: usize, h: usize },

  #[error("no input images were given")]
  NoFrames,

  #[error("could not read image {path}: {source}")]
  UnreadableImage { path: String, #[source] source: image::ImageError },
}

#[derive(Debug, Error)]
pub enum FormatError {
  #[error("bad magic bytes: expected \"BitV\\0\\0\"")]
  BadMagic,

  #[error("truncated header")]
  TruncatedHeader,

  #[error("truncated tile table")]
  TruncatedTileTable,

  #[error("frame extent {w}x{h} in file header is invalid")]
  InvalidExtent { w: usize, h: usize },

  #[error("unexpected end of stream while decoding a command")]
  UnexpectedEof,

  #[error("cursor ({x},{y}) is out of supertile bounds ({ws}x{hs}) after {context}")]
  CursorOutOfRange { x: i32, y: i32, ws: usize, hs: usize, context: &'static str },
}

#[derive(Debug, Error)]
pub enum BitVError {
  #[error(transparent)]
  Input(#[from] InputError),

  #[error(transparent)]
  Format(#[from] FormatError),

  #[error("I/O error: {0}")]
  Io(#[from] std::io::Error),

  #[error("internal error: {0}")]
  Internal(String),
}

pub type Result<T> = std::result::Result<T, BitVError>;
