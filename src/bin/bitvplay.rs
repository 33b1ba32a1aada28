// Concrete winit+pixels implementations of the library's DisplaySurface,
// FrameClock and EventSource traits (§1.7), plus the bitvplay CLI itself.
// winit's usual ownership model hands control flow to `EventLoop::run`
// for the life of the program; that doesn't fit `Player::run`'s pull-based
// loop (itself grounded in the original source's synchronous pygame loop),
// so this binary drives the window with `pump_events` instead, which
// winit exposes for exactly this kind of external game-loop embedding.

use std::fs::File;
use std::path::PathBuf;
use std::time::{Duration, Instant};

use clap::Parser;
use pixels::{Pixels, SurfaceTexture};
use winit::dpi::LogicalSize;
use winit::event::{Event, WindowEvent};
use winit::event_loop::EventLoop;
use winit::keyboard::{Key, NamedKey};
use winit::platform::pump_events::{EventLoopExtPumpEvents, PumpStatus};
use winit::window::{Window, WindowBuilder};

use bitv::diff::DecodedChild;
use bitv::frame::BitFrame;
use bitv::player::{DisplaySurface, EventSource, FrameClock, Player, PlaybackEvent};

#[derive(Parser)]
#[command(name = "bitvplay")]
#[command(author, version, about = "Play back a BitV stream in a window", long_about = None)]
struct Cli {
  /// Input .bitv file path
  input: PathBuf,

  /// Overlay each drawn tile's provenance (dictionary hit, inline, or
  /// uniform) instead of plain playback. See SPEC_FULL.md §2.
  #[arg(long)]
  inspect: bool,

  /// Integer upscale factor for the display window
  #[arg(long, default_value_t = 4)]
  scale: u32,
}

struct WinitDisplay {
  pixels: Pixels,
  width: usize,
  height: usize,
  inspect: bool,
}

impl WinitDisplay {
  fn pixel_index(&self, x: usize, y: usize) -> usize {
    (y * self.width + x) * 4
  }
}

impl DisplaySurface for WinitDisplay {
  fn present(&mut self, frame: &BitFrame) {
    let buf = self.pixels.frame_mut();
    for y in 0..self.height {
      for x in 0..self.width {
        let idx = self.pixel_index(x, y);
        let v = if frame.get(x, y) { 0xFF } else { 0x00 };
        buf[idx..idx + 4].copy_from_slice(&[v, v, v, 0xFF]);
      }
    }
    let _ = self.pixels.render();
  }

  fn note_stile(&mut self, children: &[DecodedChild]) {
    if !self.inspect {
      return;
    }
    for child in children {
      log::debug!("stile tile ({},{}) origin={:?}", child.tx, child.ty, child.origin);
    }
  }
}

struct SteppedClock {
  frame_period: Duration,
  last_tick: Instant,
}

impl FrameClock for SteppedClock {
  fn tick(&mut self, framerate: u16) {
    self.frame_period = Duration::from_secs_f64(1.0 / framerate.max(1) as f64);
    let elapsed = self.last_tick.elapsed();
    if elapsed < self.frame_period {
      std::thread::sleep(self.frame_period - elapsed);
    }
    self.last_tick = Instant::now();
  }
}

struct WinitEvents<'a> {
  event_loop: &'a mut EventLoop<()>,
  window: &'a Window,
}

impl<'a> EventSource for WinitEvents<'a> {
  fn poll(&mut self) -> Vec<PlaybackEvent> {
    let mut events = Vec::new();
    let window_id = self.window.id();

    let status = self.event_loop.pump_events(Some(Duration::ZERO), |event, _elwt| {
      if let Event::WindowEvent { event, window_id: id } = &event {
        if *id != window_id {
          return;
        }
        match event {
          WindowEvent::CloseRequested => events.push(PlaybackEvent::Quit),
          WindowEvent::KeyboardInput { event, .. } if event.state.is_pressed() => match &event.logical_key {
            Key::Named(NamedKey::Space) => events.push(PlaybackEvent::TogglePause),
            Key::Named(NamedKey::ArrowRight) => events.push(PlaybackEvent::StepOnce),
            Key::Named(NamedKey::Escape) => events.push(PlaybackEvent::Quit),
            _ => {}
          },
          _ => {}
        }
      }
    });

    if matches!(status, PumpStatus::Exit(_)) {
      events.push(PlaybackEvent::Quit);
    }
    events
  }
}

fn main() -> anyhow::Result<()> {
  env_logger::init();
  let cli = Cli::parse();

  let mut file = File::open(&cli.input)?;
  let container = bitv::container::read_container(&mut file)?;

  let width = container.config.width as u32;
  let height = container.config.height as u32;

  let mut event_loop = EventLoop::new()?;
  let window = WindowBuilder::new()
    .with_title("bitvplay")
    .with_inner_size(LogicalSize::new((width * cli.scale) as f64, (height * cli.scale) as f64))
    .build(&event_loop)?;

  let surface_texture = SurfaceTexture::new(width, height, &window);
  let pixels = Pixels::new(width, height, surface_texture)?;

  let display = WinitDisplay { pixels, width: width as usize, height: height as usize, inspect: cli.inspect };
  let clock = SteppedClock { frame_period: Duration::from_secs_f64(1.0 / 30.0), last_tick: Instant::now() };
  let events = WinitEvents { event_loop: &mut event_loop, window: &window };

  let mut player = Player::new(display, clock, events, &container.table, container.config, cli.inspect);
  let mut reader = bitv::bitio::BitReader::new(&container.payload);
  player.run(&mut reader)?;

  Ok(())
}
