// Diff encoder and decoder (components F and G, §4.6-§4.7). Both share
// the command vocabulary, so they live in one module: a FLIP/MOVE/STILE
// bitstream language, a cursor walk over a supertile damage set, and a
// small state machine on the read side.

use crate::bitio::{BitReader, BitWriter};
use crate::config::BitVConfig;
use crate::error::{BitVError, FormatError};
use crate::frame::BitFrame;
use crate::tile::{damage_scan, damaged_children, DamageMap};
use crate::tileset::TileTable;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Adjacency {
  PlusX,
  MinusX,
  PlusY,
  MinusY,
}

impl Adjacency {
  fn write(self, w: &mut BitWriter) {
    let (b0, b1) = match self {
      Adjacency::PlusX => (false, false),
      Adjacency::MinusX => (false, true),
      Adjacency::PlusY => (true, false),
      Adjacency::MinusY => (true, true),
    };
    w.push_bit(b0);
    w.push_bit(b1);
  }

  fn read(r: &mut BitReader) -> Result<Self, FormatError> {
    let b0 = r.read_bit()?;
    let b1 = r.read_bit()?;
    Ok(match (b0, b1) {
      (false, false) => Adjacency::PlusX,
      (false, true) => Adjacency::MinusX,
      (true, false) => Adjacency::PlusY,
      (true, true) => Adjacency::MinusY,
    })
  }

  // Offset of the neighbouring supertile this adjacency names.
  fn delta(self) -> (i32, i32) {
    match self {
      Adjacency::PlusX => (1, 0),
      Adjacency::MinusX => (-1, 0),
      Adjacency::PlusY => (0, 1),
      Adjacency::MinusY => (0, -1),
    }
  }

  fn apply(self, cursor: (i32, i32)) -> (i32, i32) {
    let (dx, dy) = self.delta();
    (cursor.0 + dx, cursor.1 + dy)
  }
}

// Where a decoded tile's 16-bit pattern came from -- relevant only to the
// inspect overlay in the player binary; the codec itself only cares about
// the resolved pattern.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChildOrigin {
  UniformWhite,
  UniformBlack,
  Dictionary(u8),
  Inline,
}

pub struct DecodedChild {
  pub tx: u8,
  pub ty: u8,
  pub pattern: u16,
  pub origin: ChildOrigin,
}

enum Command {
  Flip { dx: i8, dy: i8 },
  Move { sx: u8, sy: u8 },
  Stile { adjacency: Adjacency, children: Vec<DecodedChild> },
}

fn write_child(w: &mut BitWriter, pattern: u16, table: &TileTable) {
  if pattern == 0xFFFF {
    w.push_bit(true);
    w.push_bit(true);
  } else if pattern == 0x0000 {
    w.push_bit(true);
    w.push_bit(false);
  } else if let Some(index) = table.index_of(pattern) {
    w.push_bit(false);
    w.push_bit(true);
    w.push_uint_le(index as u64, 8);
  } else {
    w.push_bit(false);
    w.push_bit(false);
    w.push_uint_le(pattern as u64, 16);
  }
}

fn read_child(r: &mut BitReader, table: &TileTable, tx: u8, ty: u8) -> Result<DecodedChild, FormatError> {
  let b0 = r.read_bit()?;
  let b1 = r.read_bit()?;
  let (pattern, origin) = match (b0, b1) {
    (true, true) => (0xFFFF, ChildOrigin::UniformWhite),
    (true, false) => (0x0000, ChildOrigin::UniformBlack),
    (false, true) => {
      let index = r.read_uint_le(8)? as u8;
      (table.pattern_at(index), ChildOrigin::Dictionary(index))
    }
    (false, false) => {
      let pattern = r.read_uint_le(16)? as u16;
      (pattern, ChildOrigin::Inline)
    }
  };
  Ok(DecodedChild { tx, ty, pattern, origin })
}

// Reads one top-level command. Returns `Ok(None)` for a clean end of
// stream -- which, because `BitWriter::finish` only ever pads with zero
// bits, can only happen before any `1` bit has been consumed for the
// command in progress. See SPEC_FULL.md §3.
fn read_command(r: &mut BitReader, table: &TileTable) -> Result<Option<Command>, FormatError> {
  let Some(b0) = r.try_read_bit() else {
    return Ok(None);
  };
  if b0 {
    let adjacency = Adjacency::read(r)?;
    let mask = r.read_uint_le(16)? as u16;
    let mut children = Vec::with_capacity(mask.count_ones() as usize);
    for (tx, ty) in damaged_children(mask) {
      children.push(read_child(r, table, tx as u8, ty as u8)?);
    }
    return Ok(Some(Command::Stile { adjacency, children }));
  }

  let Some(b1) = r.try_read_bit() else {
    return Ok(None);
  };
  if b1 {
    let sx = r.read_uint_le(5)? as u8;
    let sy = r.read_uint_le(5)? as u8;
    Ok(Some(Command::Move { sx, sy }))
  } else {
    let dx = r.read_int_le(8)? as i8;
    let dy = r.read_int_le(8)? as i8;
    Ok(Some(Command::Flip { dx, dy }))
  }
}

// ----- Encoder (component F) -----

// Encodes the diff between `src` and `dst` (src is the all-zero frame
// for the implicit first transition, per §3 invariant 3), walking the
// damage set per §4.6's cursor-walk algorithm.
pub fn encode_diff(src: &BitFrame, dst: &BitFrame, table: &TileTable, w: &mut BitWriter) {
  let mut damaged: DamageMap = damage_scan(src, dst);
  let mut cursor: (i32, i32) = (0, 0);

  while !damaged.is_empty() {
    let key = (cursor.0 as u16, cursor.1 as u16);
    if cursor.0 < 0 || cursor.1 < 0 || !damaged.contains_key(&key) {
      // Earliest-inserted damaged supertile, i.e. first in scan order.
      let (&next_key, _) = damaged.first().expect("damaged is non-empty");
      w.push_bit(false);
      w.push_bit(true);
      w.push_uint_le(next_key.0 as u64, 5);
      w.push_uint_le(next_key.1 as u64, 5);
      cursor = (next_key.0 as i32, next_key.1 as i32);
    }

    let key = (cursor.0 as u16, cursor.1 as u16);
    let mask = damaged.shift_remove(&key).expect("cursor key present");

    let target = [Adjacency::PlusX, Adjacency::MinusX, Adjacency::PlusY, Adjacency::MinusY]
      .into_iter()
      .find(|a| {
        let (nx, ny) = a.apply(cursor);
        nx >= 0 && ny >= 0 && damaged.contains_key(&(nx as u16, ny as u16))
      })
      .unwrap_or(Adjacency::MinusY);

    w.push_bit(true);
    target.write(w);
    w.push_uint_le(mask as u64, 16);
    for (tx, ty) in damaged_children(mask) {
      let pattern = dst.tile_pattern(key.0 as usize, key.1 as usize, tx, ty);
      write_child(w, pattern, table);
    }

    cursor = target.apply(cursor);
  }
}

// ----- Decoder (component G) -----

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameEvent {
  // A frame just finished accumulating in the surface; `dx`/`dy` is the
  // motion vector that applies to the *next* frame's diff commands.
  Flip(i8, i8),
  // Clean end of stream: the last frame just finished accumulating, and
  // there is no trailing FLIP (§9 Open Question 5 / §8 scenario S1).
  End,
}

pub struct DiffDecoder {
  surface: BitFrame,
  cursor: (i32, i32),
}

impl DiffDecoder {
  pub fn new(config: &BitVConfig) -> Self {
    Self { surface: BitFrame::zeroed(config.width, config.height), cursor: (0, 0) }
  }

  pub fn surface(&self) -> &BitFrame {
    &self.surface
  }

  pub fn surface_mut(&mut self) -> &mut BitFrame {
    &mut self.surface
  }

  // Consumes commands until either a FLIP or a clean end of stream,
  // applying MOVE/STILE commands to the surface as it goes. Returns the
  // event that ended this frame.
  pub fn run_frame(
    &mut self,
    r: &mut BitReader,
    table: &TileTable,
    config: &BitVConfig,
    mut on_stile: impl FnMut(&[DecodedChild]),
  ) -> Result<FrameEvent, BitVError> {
    let ws = config.supertiles_wide() as i32;
    let hs = config.supertiles_high() as i32;

    loop {
      match read_command(r, table)? {
        None => return Ok(FrameEvent::End),
        Some(Command::Flip { dx, dy }) => {
          self.cursor = (0, 0);
          return Ok(FrameEvent::Flip(dx, dy));
        }
        Some(Command::Move { sx, sy }) => {
          let (x, y) = (sx as i32, sy as i32);
          if x >= ws || y >= hs {
            return Err(FormatError::CursorOutOfRange { x, y, ws: ws as usize, hs: hs as usize, context: "MOVE" }.into());
          }
          self.cursor = (x, y);
        }
        Some(Command::Stile { adjacency, children }) => {
          let (x, y) = self.cursor;
          if x < 0 || y < 0 || x >= ws || y >= hs {
            return Err(FormatError::CursorOutOfRange { x, y, ws: ws as usize, hs: hs as usize, context: "STILE" }.into());
          }
          for child in &children {
            self.surface.write_tile(x as usize, y as usize, child.tx as usize, child.ty as usize, child.pattern);
          }
          on_stile(&children);
          self.cursor = adjacency.apply(self.cursor);
        }
      }
    }
  }
}
