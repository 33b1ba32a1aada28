//! BitV: a lossy 1-bit-per-pixel codec for dithered monochrome image and
//! animation sequences. See `SPEC_FULL.md` at the repository root for the
//! full format and pipeline description.

pub mod bitio;
pub mod config;
pub mod container;
pub mod diff;
pub mod error;
pub mod frame;
pub mod motion;
pub mod pipeline;
pub mod player;
pub mod quantize;
pub mod tile;
pub mod tileset;

pub use config::BitVConfig;
pub use error::{BitVError, FormatError, InputError, Result};
