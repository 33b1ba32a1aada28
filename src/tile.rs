// Damage-set scan, shared by the tile-set builder (§4.5) and the diff
// encoder (§4.6): both need "which supertiles changed, and which of
// their 16 children" for a (previous, current) frame pair.

use indexmap::IndexMap;

use crate::config::SUPERTILE_SIZE;
use crate::frame::BitFrame;

// Supertile coordinate -> 16-bit child-validity mask (bit = tx + 4*ty).
// Insertion order follows the pixel scan (y outer, x inner), matching
// §4.6's "earliest-inserted" rule for the walk's MOVE fallback.
pub type DamageMap = IndexMap<(u16, u16), u16>;

pub fn damage_scan(src: &BitFrame, dst: &BitFrame) -> DamageMap {
  debug_assert_eq!(src.width(), dst.width());
  debug_assert_eq!(src.height(), dst.height());

  let mut damaged = DamageMap::new();
  let w = dst.width();
  let h = dst.height();

  for y in 0..h {
    for x in 0..w {
      if src.get(x, y) != dst.get(x, y) {
        let sx = (x / SUPERTILE_SIZE) as u16;
        let sy = (y / SUPERTILE_SIZE) as u16;
        let tx = (x % SUPERTILE_SIZE) / crate::config::TILE_SIZE;
        let ty = (y % SUPERTILE_SIZE) / crate::config::TILE_SIZE;
        let mask = damaged.entry((sx, sy)).or_insert(0u16);
        *mask |= 1 << (tx + 4 * ty);
      }
    }
  }

  damaged
}

// All (tx,ty) positions set in a child-validity mask, in scan order
// (ty outer, tx inner), matching §4.6's STILE child coding order.
pub fn damaged_children(mask: u16) -> impl Iterator<Item = (usize, usize)> {
  (0..16).filter(move |bit| mask & (1 << bit) != 0).map(|bit| (bit % 4, bit / 4))
}
