// Playback driver (§4.7/§5). The library side stays free of any concrete
// windowing toolkit: `DisplaySurface`, `FrameClock` and `EventSource` are
// the three collaborators a binary must supply, mirroring how the
// original source's `bv_play` depended on pygame's surface, clock and
// event queue without this module ever importing pygame itself. The
// `bitvplay` binary supplies winit+pixels implementations.

use crate::bitio::BitReader;
use crate::config::BitVConfig;
use crate::diff::{DecodedChild, DiffDecoder, FrameEvent};
use crate::error::BitVError;
use crate::frame::{shift_frame, BitFrame};
use crate::tileset::TileTable;

// What the player asks of a concrete display each time a frame is ready.
pub trait DisplaySurface {
  fn present(&mut self, frame: &BitFrame);

  // Supplemented `--inspect` hook (SPEC_FULL.md §2): called once per
  // drawn STILE with the tiles it just wrote, so a binary can overlay
  // provenance (dictionary hit vs. inline vs. uniform) as it plays.
  // Default is a no-op so implementors that don't care can ignore it.
  fn note_stile(&mut self, _children: &[DecodedChild]) {}
}

// Paces playback against the stream's nominal framerate. `tick` blocks
// (or otherwise yields) until the next frame's presentation time.
pub trait FrameClock {
  fn tick(&mut self, framerate: u16);
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PlaybackEvent {
  Quit,
  TogglePause,
  StepOnce,
}

// Polls pending UI events. Playback advances automatically unless paused,
// in which case `StepOnce` advances exactly one frame -- the same pause
// gate the original source drove off spacebar/right-arrow key events.
pub trait EventSource {
  fn poll(&mut self) -> Vec<PlaybackEvent>;
}

pub struct Player<'a, D, C, E> {
  display: D,
  clock: C,
  events: E,
  table: &'a TileTable,
  config: BitVConfig,
  paused: bool,
  inspect: bool,
}

impl<'a, D: DisplaySurface, C: FrameClock, E: EventSource> Player<'a, D, C, E> {
  pub fn new(display: D, clock: C, events: E, table: &'a TileTable, config: BitVConfig, inspect: bool) -> Self {
    Self { display, clock, events, table, config, paused: false, inspect }
  }

  // Runs the whole stream to completion (or until a Quit event), driving
  // the decoder frame by frame and pacing/presenting exactly as the
  // original source did: poll events, present the completed frame, pace,
  // then (if another frame follows) apply its motion vector before the
  // next diff is parsed. See SPEC_FULL.md §3 for why this present-then-
  // shift order is followed in preference to spec.md's own prose order.
  pub fn run(&mut self, reader: &mut BitReader) -> Result<(), BitVError> {
    let mut decoder = DiffDecoder::new(&self.config);

    loop {
      let inspect = self.inspect;
      let event = decoder.run_frame(reader, self.table, &self.config, |children| {
        if inspect {
          self.display.note_stile(children);
        }
      })?;

      if self.wait_for_unpause() == Some(PlaybackEvent::Quit) {
        return Ok(());
      }

      self.display.present(decoder.surface());
      self.clock.tick(self.config.framerate);

      match event {
        FrameEvent::End => return Ok(()),
        FrameEvent::Flip(dx, dy) => {
          let shifted = shift_frame(decoder.surface(), dx as i32, dy as i32);
          *decoder.surface_mut() = shifted;
        }
      }
    }
  }

  // Blocks on incoming events until playback should advance: either the
  // stream isn't paused, or exactly one `StepOnce` was consumed. Returns
  // `Some(Quit)` if the caller should stop.
  fn wait_for_unpause(&mut self) -> Option<PlaybackEvent> {
    loop {
      for ev in self.events.poll() {
        match ev {
          PlaybackEvent::Quit => return Some(PlaybackEvent::Quit),
          PlaybackEvent::TogglePause => self.paused = !self.paused,
          PlaybackEvent::StepOnce => return None,
        }
      }
      if !self.paused {
        return None;
      }
    }
  }
}
