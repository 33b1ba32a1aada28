// Stream-global state, threaded explicitly through the pipeline instead of
// living as module-level mutable state. The encoder builds one from the
// first loaded image plus CLI flags; the decoder builds one from the file
// header.

use crate::error::InputError;

pub const SUPERTILE_SIZE: usize = 16;
pub const TILE_SIZE: usize = 4;
pub const MAX_AXIS_PIXELS: usize = 512;
pub const TILE_TABLE_LEN: usize = 256;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BitVConfig {
  pub width: usize,
  pub height: usize,
  pub framerate: u16,
  // Opt-out for the motion estimator (§4.3). Defaults to enabled; see
  // DESIGN.md for why this isn't dead code the way it is upstream.
  pub motion_search: bool,
}

impl BitVConfig {
  pub fn new(width: usize, height: usize, framerate: u16, motion_search: bool) -> Result<Self, InputError> {
    if width == 0 || height == 0 || width % SUPERTILE_SIZE != 0 || height % SUPERTILE_SIZE != 0 {
      return Err(InputError::InvalidExtent { w: width, h: height });
    }
    if width > MAX_AXIS_PIXELS || height > MAX_AXIS_PIXELS {
      return Err(InputError::FrameTooLarge { w: width, h: height });
    }
    Ok(Self { width, height, framerate, motion_search })
  }

  pub fn supertiles_wide(&self) -> usize {
    self.width / SUPERTILE_SIZE
  }

  pub fn supertiles_high(&self) -> usize {
    self.height / SUPERTILE_SIZE
  }
}
