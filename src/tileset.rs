// Tile-set builder (component E, §4.5): a two-pass scan over every
// frame-to-frame diff in the sequence, producing a stable dictionary of
// up to 256 frequent non-uniform 4x4 tiles.
//
// Frequency counting uses a dense 65536-entry array rather than a hash
// map, per the design notes in spec.md §9 ("a dense 65536-entry array of
// counters is a legitimate implementation and faster than a hash map").
// First-occurrence order, needed to break frequency ties deterministically
// (§4.5 step 3, §8 property 3), is assigned while merging per-frame scan
// results in submission order, never by hash-map iteration order, so that
// building the table twice on identical input always assigns the same
// indices (§8 property 3).

use std::cmp::Reverse;

use rayon::prelude::*;

use crate::config::TILE_TABLE_LEN;
use crate::frame::{tile_is_uniform, BitFrame};
use crate::tile::damaged_children;

// Filler pattern for unused dictionary slots. Uniform tiles are never
// coded by reference to the dictionary in the first place (§4.6 always
// uses the dedicated `11`/`10` codes for them), so using one here means
// `TileTable::from_entries` automatically excludes filler slots from
// `index_of` with no special-casing.
pub const FILLER_PATTERN: u16 = 0x0000;

pub struct TileTable {
  // Always exactly TILE_TABLE_LEN entries; unused slots hold FILLER_PATTERN.
  entries: [u16; TILE_TABLE_LEN],
  // Lookup from pattern to its index, only for slots that are "real"
  // (i.e. were actually assigned during construction).
  index_of: std::collections::HashMap<u16, u8>,
}

impl TileTable {
  pub fn entries(&self) -> &[u16; TILE_TABLE_LEN] {
    &self.entries
  }

  pub fn from_entries(entries: [u16; TILE_TABLE_LEN]) -> Self {
    let mut index_of = std::collections::HashMap::new();
    for (i, &pattern) in entries.iter().enumerate() {
      if !tile_is_uniform(pattern) {
        // Only the first occurrence of a repeated filler pattern is kept
        // addressable; this only matters for FILLER_PATTERN collisions,
        // which are never referenced by a well-formed encoder anyway.
        index_of.entry(pattern).or_insert(i as u8);
      }
    }
    Self { entries, index_of }
  }

  pub fn index_of(&self, pattern: u16) -> Option<u8> {
    self.index_of.get(&pattern).copied()
  }

  pub fn pattern_at(&self, index: u8) -> u16 {
    self.entries[index as usize]
  }
}

// One (previous, current) reconstructed-frame pair to scan. `prev` is the
// all-zero frame for the implicit first transition (§3 invariant 3).
pub struct FramePair<'a> {
  pub prev: &'a BitFrame,
  pub curr: &'a BitFrame,
}

// Scans a single frame transition, returning the sequence of non-uniform
// damaged tile patterns encountered, in deterministic scan order
// (duplicates included, one per damaged tile instance).
fn scan_frame_patterns(pair: &FramePair) -> Vec<u16> {
  let damaged = crate::tile::damage_scan(pair.prev, pair.curr);
  let mut patterns = Vec::new();
  for (&(sx, sy), &mask) in damaged.iter() {
    for (tx, ty) in damaged_children(mask) {
      let pattern = pair.curr.tile_pattern(sx as usize, sy as usize, tx, ty);
      if !tile_is_uniform(pattern) {
        patterns.push(pattern);
      }
    }
  }
  patterns
}

pub fn build_tile_set(pairs: &[FramePair]) -> TileTable {
  // Parallel per-frame scan (component E's "embarrassingly parallel per
  // frame" pass); rayon's map-then-collect preserves submission order.
  let per_frame: Vec<Vec<u16>> = pairs.par_iter().map(scan_frame_patterns).collect();

  let mut counts = vec![0u32; 1 << 16].into_boxed_slice();
  let mut first_seen = vec![u32::MAX; 1 << 16].into_boxed_slice();
  let mut next_seq = 0u32;

  for frame_patterns in &per_frame {
    for &pattern in frame_patterns {
      if counts[pattern as usize] == 0 {
        first_seen[pattern as usize] = next_seq;
        next_seq += 1;
      }
      counts[pattern as usize] += 1;
    }
  }

  let mut candidates: Vec<(u16, u32, u32)> = (0..=u16::MAX)
    .filter(|&p| counts[p as usize] > 0)
    .map(|p| (p, counts[p as usize], first_seen[p as usize]))
    .collect();

  // Descending frequency, ties broken by ascending first-occurrence order.
  candidates.sort_by_key(|&(_, count, first)| (Reverse(count), first));
  candidates.truncate(TILE_TABLE_LEN);

  let mut entries = [FILLER_PATTERN; TILE_TABLE_LEN];
  for (i, &(pattern, _, _)) in candidates.iter().enumerate() {
    entries[i] = pattern;
  }

  TileTable::from_entries(entries)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frame_with_tile(pattern: u16) -> BitFrame {
    let mut f = BitFrame::zeroed(16, 16);
    f.write_tile(0, 0, 0, 0, pattern);
    f
  }

  #[test]
  fn empty_sequence_yields_all_filler() {
    let table = build_tile_set(&[]);
    assert!(table.entries().iter().all(|&p| p == FILLER_PATTERN));
  }

  #[test]
  fn uniform_tiles_never_enter_the_table() {
    let zero = BitFrame::zeroed(16, 16);
    let white = frame_with_tile(0xFFFF);
    let table = build_tile_set(&[FramePair { prev: &zero, curr: &white }]);
    assert!(table.index_of(0xFFFF).is_none());
  }

  #[test]
  fn most_frequent_non_uniform_tile_gets_index_zero() {
    let zero = BitFrame::zeroed(16, 16);
    let a = frame_with_tile(0x00FF);
    let b = frame_with_tile(0x0F0F);

    // 0x00FF appears in two transitions, 0x0F0F in one.
    let pairs = [
      FramePair { prev: &zero, curr: &a },
      FramePair { prev: &a, curr: &b },
      FramePair { prev: &b, curr: &a },
    ];
    let table = build_tile_set(&pairs);
    assert_eq!(table.index_of(0x00FF), Some(0));
  }

  #[test]
  fn stable_across_repeated_builds() {
    let zero = BitFrame::zeroed(16, 16);
    let a = frame_with_tile(0x1234);
    let b = frame_with_tile(0x5678);
    let pairs = [FramePair { prev: &zero, curr: &a }, FramePair { prev: &a, curr: &b }];

    let t1 = build_tile_set(&pairs);
    let t2 = build_tile_set(&pairs);
    assert_eq!(t1.entries(), t2.entries());
  }
}
