// Encoder orchestration: wires the per-frame passes (quantize, motion,
// frame shift) together with the tile-set builder and diff encoder, in
// the same order as the original source's top-level driver. The
// per-frame work is embarrassingly parallel and runs under rayon; the
// sequential bits (tile-set merge, diff emission) are exactly the two
// places spec.md calls out as needing a fixed submission order.

use rayon::prelude::*;

use crate::bitio::BitWriter;
use crate::config::BitVConfig;
use crate::diff::encode_diff;
use crate::error::{BitVError, InputError};
use crate::frame::{shift_frame, BitFrame};
use crate::motion::estimate_motion;
use crate::quantize::quantize;
use crate::tileset::{build_tile_set, FramePair, TileTable};

pub struct EncodedStream {
  pub config: BitVConfig,
  pub table: TileTable,
  pub payload: Vec<u8>,
  // Per-frame stats for the supplemented progress/ratio logging (§2).
  pub frame_bits: Vec<usize>,
}

// One source image, already decoded to a raster by the caller.
pub fn encode_sequence(images: &[image::DynamicImage], framerate: u16, motion_search: bool) -> Result<EncodedStream, BitVError> {
  let Some(first) = images.first() else {
    return Err(InputError::NoFrames.into());
  };
  let (first_w, first_h) = {
    use image::GenericImageView;
    first.dimensions()
  };

  for (index, image) in images.iter().enumerate().skip(1) {
    use image::GenericImageView;
    let (w, h) = image.dimensions();
    if (w, h) != (first_w, first_h) {
      return Err(InputError::ResolutionMismatch {
        first_w: first_w as usize,
        first_h: first_h as usize,
        index,
        w: w as usize,
        h: h as usize,
      }
      .into());
    }
  }

  let config = BitVConfig::new(first_w as usize, first_h as usize, framerate, motion_search)?;

  log::info!("quantizing {} frame(s) at {}x{}", images.len(), config.width, config.height);
  let quantized: Vec<BitFrame> = images.par_iter().map(|img| quantize(img)).collect::<Result<_, _>>()?;

  // Motion compensation: for frame i>0, find the vector that best predicts
  // frame i from frame i-1, then shift frame i-1 by it to get the actual
  // diff baseline. Frame 0's baseline is the all-zero frame (§3 invariant 3).
  log::info!("estimating motion vectors");
  let motion_vectors: Vec<(i8, i8)> = (1..quantized.len())
    .into_par_iter()
    .map(|i| estimate_motion(&quantized[i - 1], &quantized[i], &config))
    .collect();

  let zero = BitFrame::zeroed(config.width, config.height);
  let mut baselines: Vec<BitFrame> = Vec::with_capacity(quantized.len());
  baselines.push(zero);
  for (i, &(dx, dy)) in motion_vectors.iter().enumerate() {
    baselines.push(shift_frame(&quantized[i], dx as i32, dy as i32));
  }

  log::info!("building tile set from {} frame transition(s)", quantized.len());
  let pairs: Vec<FramePair> =
    baselines.iter().zip(quantized.iter()).map(|(prev, curr)| FramePair { prev, curr }).collect();
  let table = build_tile_set(&pairs);

  log::info!("encoding diff stream");
  let progress = indicatif::ProgressBar::new(pairs.len() as u64);
  progress.set_style(
    indicatif::ProgressStyle::with_template("{bar:40} {pos}/{len} frames ({eta})").unwrap_or_else(|_| indicatif::ProgressStyle::default_bar()),
  );

  let mut writer = BitWriter::new();
  let mut frame_bits = Vec::with_capacity(quantized.len());
  let mut bits_before = 0usize;

  for (i, pair) in pairs.iter().enumerate() {
    encode_diff(pair.prev, pair.curr, &table, &mut writer);
    progress.inc(1);
    if i > 0 {
      let (dx, dy) = motion_vectors[i - 1];
      log::debug!("frame {i}: motion vector ({dx},{dy})");
    }
    let bits_after = writer.bit_len();
    frame_bits.push(bits_after - bits_before);
    bits_before = bits_after;

    if i + 1 < pairs.len() {
      let (dx, dy) = motion_vectors[i];
      writer.push_bit(false);
      writer.push_bit(false);
      writer.push_int_le(dx as i64, 8);
      writer.push_int_le(dy as i64, 8);
      bits_before = writer.bit_len();
    }

    let pixel_count = quantized[i].width() * quantized[i].height();
    log::info!("frame {i}: {} bits, {:.3} bits/pixel", frame_bits[i], frame_bits[i] as f64 / pixel_count as f64);
  }
  progress.finish_and_clear();

  let payload = writer.finish();
  Ok(EncodedStream { config, table, payload, frame_bits })
}

#[cfg(test)]
mod tests {
  use super::*;
  use image::{Rgb, RgbImage};

  fn solid(w: u32, h: u32, v: u8) -> image::DynamicImage {
    image::DynamicImage::ImageRgb8(RgbImage::from_fn(w, h, |_, _| Rgb([v, v, v])))
  }

  #[test]
  fn single_frame_sequence_encodes_and_decodes() {
    let images = vec![solid(16, 16, 255)];
    let stream = encode_sequence(&images, 30, true).unwrap();
    assert_eq!(stream.frame_bits.len(), 1);

    let mut reader = crate::bitio::BitReader::new(&stream.payload);
    let mut decoder = crate::diff::DiffDecoder::new(&stream.config);
    let event = decoder.run_frame(&mut reader, &stream.table, &stream.config, |_| {}).unwrap();
    assert_eq!(event, crate::diff::FrameEvent::End);
    for y in 0..16 {
      for x in 0..16 {
        assert!(decoder.surface().get(x, y));
      }
    }
  }

  #[test]
  fn rejects_empty_input() {
    assert!(encode_sequence(&[], 30, true).is_err());
  }

  #[test]
  fn rejects_mismatched_resolutions() {
    let images = vec![solid(16, 16, 0), solid(32, 16, 0)];
    let err = encode_sequence(&images, 30, true).unwrap_err();
    assert!(matches!(err, BitVError::Input(InputError::ResolutionMismatch { .. })));
  }

  #[test]
  fn multi_frame_sequence_round_trips_through_container() {
    let images = vec![solid(16, 16, 0), solid(16, 16, 255), solid(16, 16, 0)];
    let stream = encode_sequence(&images, 30, true).unwrap();

    let mut bytes = Vec::new();
    crate::container::write_container(&mut bytes, &stream.config, &stream.table, &stream.payload).unwrap();
    let file = crate::container::read_container(&mut bytes.as_slice()).unwrap();

    let mut reader = crate::bitio::BitReader::new(&file.payload);
    let mut decoder = crate::diff::DiffDecoder::new(&file.config);
    let mut frames = Vec::new();
    loop {
      match decoder.run_frame(&mut reader, &file.table, &file.config, |_| {}).unwrap() {
        crate::diff::FrameEvent::End => {
          frames.push(decoder.surface().clone());
          break;
        }
        crate::diff::FrameEvent::Flip(dx, dy) => {
          frames.push(decoder.surface().clone());
          let shifted = crate::frame::shift_frame(decoder.surface(), dx as i32, dy as i32);
          *decoder.surface_mut() = shifted;
        }
      }
    }

    assert_eq!(frames.len(), 3);
    assert!(!frames[0].get(0, 0));
    assert!(frames[1].get(0, 0));
    assert!(!frames[2].get(0, 0));
  }
}
