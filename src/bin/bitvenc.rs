use std::fs::File;
use std::path::PathBuf;

use clap::Parser;

#[derive(Parser)]
#[command(name = "bitvenc")]
#[command(author, version, about = "Encode a sequence of images into a BitV stream", long_about = None)]
struct Cli {
  /// Source images, in playback order. A single directory may be given
  /// instead, in which case its files are sorted by name and used as the
  /// frame sequence -- a convenience not present in the original tool,
  /// see SPEC_FULL.md §2.
  #[arg(required = true)]
  inputs: Vec<PathBuf>,

  /// Output .bitv file path
  #[arg(short, long)]
  output: PathBuf,

  /// Nominal playback framerate, frames per second
  #[arg(short, long, default_value_t = 30)]
  framerate: u16,

  /// Disable the motion estimator and always encode diffs against the
  /// unshifted previous frame
  #[arg(long)]
  no_motion_search: bool,
}

fn collect_inputs(inputs: &[PathBuf]) -> std::io::Result<Vec<PathBuf>> {
  if inputs.len() == 1 && inputs[0].is_dir() {
    let mut entries: Vec<PathBuf> =
      std::fs::read_dir(&inputs[0])?.filter_map(|e| e.ok()).map(|e| e.path()).filter(|p| p.is_file()).collect();
    entries.sort();
    return Ok(entries);
  }
  Ok(inputs.to_vec())
}

fn main() -> anyhow::Result<()> {
  env_logger::init();
  let cli = Cli::parse();

  let paths = collect_inputs(&cli.inputs)?;
  if paths.is_empty() {
    anyhow::bail!("no input images found");
  }

  log::info!("loading {} image(s)", paths.len());
  let images: Vec<image::DynamicImage> = paths
    .iter()
    .map(|p| image::open(p).map_err(|source| bitv::InputError::UnreadableImage { path: p.display().to_string(), source }))
    .collect::<Result<_, _>>()?;

  let stream = bitv::pipeline::encode_sequence(&images, cli.framerate, !cli.no_motion_search)?;

  let total_bits: usize = stream.frame_bits.iter().sum();
  let pixels_per_frame = stream.config.width * stream.config.height;
  log::info!(
    "{} frame(s), {:.3} bits/pixel average",
    stream.frame_bits.len(),
    total_bits as f64 / (pixels_per_frame * stream.frame_bits.len().max(1)) as f64
  );

  let mut out = File::create(&cli.output)?;
  bitv::container::write_container(&mut out, &stream.config, &stream.table, &stream.payload)?;

  Ok(())
}
