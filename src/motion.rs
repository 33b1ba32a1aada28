// Motion estimator (component C, §4.3): an exhaustive search over a
// coarse (dx,dy) grid for the global translation that best predicts the
// current frame from the previous one, measured by Hamming distance
// after applying the frame shifter.
//
// This is load-bearing here even though the equivalent pass in the
// original Python source was unreachable dead code gated behind a flag
// that was never set -- see SPEC_FULL.md §3 and DESIGN.md. `motion_search`
// lets a caller turn it back off and fall back to a zero vector, matching
// the original's observed behaviour exactly.

use crate::config::BitVConfig;
use crate::frame::{shift_frame, BitFrame};

const SEARCH_RANGE: i32 = 16;
const SEARCH_STEP: i32 = 2;

// Searches (dx,dy) in [-16,16) on both axes, in steps of 2, y outer and
// x inner, both ascending, with (0,0) visited as an ordinary candidate
// in its normal position in that scan rather than pre-seeded ahead of
// it. Ties keep whichever candidate the scan visits first. Returns
// (0,0) unconditionally when `config.motion_search` is disabled.
pub fn estimate_motion(prev: &BitFrame, curr: &BitFrame, config: &BitVConfig) -> (i8, i8) {
  if !config.motion_search {
    return (0, 0);
  }

  let mut best: Option<(i32, i32)> = None;
  let mut best_cost = u32::MAX;

  for dy in (-SEARCH_RANGE..SEARCH_RANGE).step_by(SEARCH_STEP as usize) {
    for dx in (-SEARCH_RANGE..SEARCH_RANGE).step_by(SEARCH_STEP as usize) {
      let cost = if dx == 0 && dy == 0 { prev.hamming_distance(curr) } else { shift_frame(prev, dx, dy).hamming_distance(curr) };
      if cost < best_cost {
        best_cost = cost;
        best = Some((dx, dy));
      }
    }
  }

  let (dx, dy) = best.unwrap_or((0, 0));
  (dx as i8, dy as i8)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn frame_from_rows(rows: &[&str]) -> BitFrame {
    let h = rows.len();
    let w = rows[0].len();
    let mut f = BitFrame::zeroed(w, h);
    for (y, row) in rows.iter().enumerate() {
      for (x, c) in row.chars().enumerate() {
        f.set(x, y, c == '1');
      }
    }
    f
  }

  #[test]
  fn disabled_search_always_returns_zero_vector() {
    let config = BitVConfig::new(16, 16, 30, false).unwrap();
    let prev = BitFrame::zeroed(16, 16);
    let mut curr = BitFrame::zeroed(16, 16);
    curr.set(0, 0, true);
    assert_eq!(estimate_motion(&prev, &curr, &config), (0, 0));
  }

  // For a frame this small, shifting by the full [-16,16) search range
  // degenerates to the identity (the vacated band covers the whole
  // frame), so every candidate ties at cost 0 on identical frames; the
  // earliest-visited candidate in the y-outer/x-inner scan wins, which
  // is (-16,-16), not (0,0) -- per §4.3's lexicographic tie-break rule.
  #[test]
  fn identical_frames_tie_break_favours_earliest_scanned_vector() {
    let config = BitVConfig::new(16, 16, 30, true).unwrap();
    let f = frame_from_rows(&["1000", "0100", "0010", "0001"]);
    assert_eq!(estimate_motion(&f, &f, &config), (-16, -16));
  }

  // A frame wider/taller than the search range, so no candidate shift
  // collapses to a whole-axis identity the way it would at the minimum
  // 16x16 size, and identical frames have a single, unambiguous winner.
  #[test]
  fn identical_frames_larger_than_search_range_yield_zero_vector() {
    let config = BitVConfig::new(48, 48, 30, true).unwrap();
    let mut f = BitFrame::zeroed(48, 48);
    f.set(20, 20, true);
    f.set(30, 10, true);
    assert_eq!(estimate_motion(&f, &f, &config), (0, 0));
  }

  #[test]
  fn finds_exact_horizontal_translation() {
    let config = BitVConfig::new(48, 48, 30, true).unwrap();
    let mut prev = BitFrame::zeroed(48, 48);
    for y in 20..24 {
      for x in 20..24 {
        prev.set(x, y, true);
      }
    }
    let shifted = shift_frame(&prev, 2, 0);
    assert_eq!(estimate_motion(&prev, &shifted, &config), (2, 0));
  }

  #[test]
  fn finds_exact_vertical_translation() {
    let config = BitVConfig::new(48, 48, 30, true).unwrap();
    let mut prev = BitFrame::zeroed(48, 48);
    for y in 20..24 {
      for x in 20..24 {
        prev.set(x, y, true);
      }
    }
    let shifted = shift_frame(&prev, 0, -2);
    assert_eq!(estimate_motion(&prev, &shifted, &config), (0, -2));
  }
}
