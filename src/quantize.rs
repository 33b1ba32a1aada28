// Quantizer (component B, §4.2): NTSC luminance plus an ordered four-band
// dither, turning an arbitrary raster into a BitFrame. Raster decoding
// itself is handed off to the `image` crate; this module only covers the
// luminance-to-1bpp step.

use image::{DynamicImage, GenericImageView};

use crate::error::InputError;
use crate::frame::BitFrame;

// Matches the original source's use of pygame's ITU-R 601-2 luma
// transform (`0.299R + 0.587G + 0.114B`), not the `image` crate's own
// `to_luma8` (which uses Rec. 709 coefficients and would shift the
// dither thresholds below).
fn luminance(r: u8, g: u8, b: u8) -> u8 {
  let l = 0.299 * r as f64 + 0.587 * g as f64 + 0.114 * b as f64;
  l.round().clamp(0.0, 255.0) as u8
}

// §4.2's four-band ordered dither. Bands are checked high-to-low so a
// pixel only ever matches the first (highest) band its luminance falls
// into.
fn dither(lum: u8, x: usize, y: usize) -> bool {
  if lum > 192 {
    true
  } else if lum > 128 {
    (x + y) % 2 == 0
  } else if lum > 98 {
    (x + 2 * y) % 4 == 0
  } else {
    false
  }
}

pub fn quantize(image: &DynamicImage) -> Result<BitFrame, InputError> {
  let (w, h) = image.dimensions();
  let (w, h) = (w as usize, h as usize);
  if w == 0 || h == 0 || w % crate::config::SUPERTILE_SIZE != 0 || h % crate::config::SUPERTILE_SIZE != 0 {
    return Err(InputError::InvalidExtent { w, h });
  }

  let rgb = image.to_rgb8();
  let mut frame = BitFrame::zeroed(w, h);
  for y in 0..h {
    for x in 0..w {
      let px = rgb.get_pixel(x as u32, y as u32);
      let lum = luminance(px[0], px[1], px[2]);
      frame.set(x, y, dither(lum, x, y));
    }
  }
  Ok(frame)
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  fn solid(w: u32, h: u32, rgb: [u8; 3]) -> DynamicImage {
    DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |_, _| Rgb(rgb)))
  }

  #[test]
  fn bright_solid_color_quantizes_to_all_white() {
    let img = solid(16, 16, [255, 255, 255]);
    let frame = quantize(&img).unwrap();
    for y in 0..16 {
      for x in 0..16 {
        assert!(frame.get(x, y));
      }
    }
  }

  #[test]
  fn dark_solid_color_quantizes_to_all_black() {
    let img = solid(16, 16, [0, 0, 0]);
    let frame = quantize(&img).unwrap();
    for y in 0..16 {
      for x in 0..16 {
        assert!(!frame.get(x, y));
      }
    }
  }

  #[test]
  fn midtone_band_produces_checkerboard_dither() {
    // Luminance exactly 160 falls in the (128, 192] band.
    let img = solid(16, 16, [160, 160, 160]);
    let frame = quantize(&img).unwrap();
    for y in 0..4 {
      for x in 0..4 {
        assert_eq!(frame.get(x, y), (x + y) % 2 == 0);
      }
    }
  }

  #[test]
  fn rejects_non_supertile_aligned_dimensions() {
    let img = solid(17, 16, [0, 0, 0]);
    assert!(quantize(&img).is_err());
  }

  #[test]
  fn ntsc_weighting_favours_green_over_blue() {
    // Pure green at 200 is brighter than pure blue at 200 under NTSC
    // luma weighting, so only the green swatch should dither to white.
    let green = solid(16, 16, [0, 200, 0]);
    let blue = solid(16, 16, [0, 0, 200]);
    let green_frame = quantize(&green).unwrap();
    let blue_frame = quantize(&blue).unwrap();
    assert!(green_frame.get(0, 0));
    assert!(!blue_frame.get(0, 0));
  }
}
