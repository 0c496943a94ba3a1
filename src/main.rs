use std::env;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use facecam::{config, overlay};
use facecam_vision::{
    crop_and_upright, map_rectangles, to_packed_image, CameraFacing, Detection, FaceDetector,
    FrameInput, ImageDimensions, ImageRect, OverlayDimensions, Pipeline, PlanarFrame, Rotation,
};
use log::info;

#[derive(Parser)]
#[command(name = "facecam")]
#[command(
    version,
    about = "Camera face overlay tools - box mapping, frame conversion and face crops"
)]
struct Cli {
    /// Config file (defaults to the installed location)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Map detector boxes from image space to overlay space
    Map {
        /// Analysis image size as reported by the camera, WIDTHxHEIGHT
        #[arg(long)]
        image: ImageDimensions,
        /// Overlay size, WIDTHxHEIGHT (defaults to config)
        #[arg(long)]
        overlay: Option<OverlayDimensions>,
        /// Camera facing (defaults to config)
        #[arg(long)]
        facing: Option<CameraFacing>,
        /// Print JSON instead of one box per line
        #[arg(long)]
        json: bool,
        /// Boxes as left,top,right,bottom
        #[arg(required = true, allow_hyphen_values = true)]
        rects: Vec<ImageRect>,
    },
    /// Convert a raw 4:2:0 frame into an image file
    Convert {
        #[command(flatten)]
        raw: RawFrameArgs,
        /// Output image, format picked from the extension
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Crop a face region out of an image and rotate it upright
    Crop {
        input: PathBuf,
        /// Region as left,top,right,bottom
        #[arg(long, allow_hyphen_values = true)]
        region: ImageRect,
        /// Clockwise rotation in degrees: 0, 90, 180 or 270
        #[arg(long, default_value = "0", value_parser = parse_rotation)]
        rotation: Rotation,
        #[arg(short, long)]
        output: PathBuf,
    },
    /// Render the preview of a raw frame with the given boxes drawn over it
    Annotate {
        #[command(flatten)]
        raw: RawFrameArgs,
        /// Clockwise rotation in degrees: 0, 90, 180 or 270
        #[arg(long, default_value = "90", value_parser = parse_rotation)]
        rotation: Rotation,
        #[arg(long)]
        overlay: Option<OverlayDimensions>,
        #[arg(long)]
        facing: Option<CameraFacing>,
        /// Boxes from the detector as left,top,right,bottom
        #[arg(allow_hyphen_values = true)]
        rects: Vec<ImageRect>,
        #[arg(short, long)]
        output: PathBuf,
        /// Also write the upright crop of the first face
        #[arg(long)]
        face_output: Option<PathBuf>,
    },
    /// Open config file in editor
    Config,
}

#[derive(clap::Args)]
struct RawFrameArgs {
    /// Raw frame file
    input: PathBuf,
    #[arg(long)]
    width: u32,
    #[arg(long)]
    height: u32,
    #[arg(long, value_enum, default_value_t = RawLayout::Nv21)]
    layout: RawLayout,
}

#[derive(Clone, Copy, ValueEnum)]
enum RawLayout {
    I420,
    Nv12,
    Nv21,
}

impl RawFrameArgs {
    fn read(&self) -> Result<Vec<u8>> {
        std::fs::read(&self.input).with_context(|| format!("reading {}", self.input.display()))
    }

    fn frame<'a>(&self, data: &'a [u8]) -> Result<PlanarFrame<'a>> {
        let frame = match self.layout {
            RawLayout::I420 => PlanarFrame::i420(self.width, self.height, data),
            RawLayout::Nv12 => PlanarFrame::nv12(self.width, self.height, data),
            RawLayout::Nv21 => PlanarFrame::nv21(self.width, self.height, data),
        };
        frame.with_context(|| format!("parsing raw frame {}", self.input.display()))
    }
}

fn parse_rotation(s: &str) -> Result<Rotation, String> {
    let degrees: i32 = s.parse().map_err(|e| format!("{e}"))?;
    Rotation::from_degrees(degrees).map_err(|e| e.to_string())
}

/// Hands the pipeline boxes produced by a detector run elsewhere.
struct RecordedDetections(Vec<ImageRect>);

impl FaceDetector for RecordedDetections {
    fn detect(&mut self, _frame: &PlanarFrame<'_>, _rotation: Rotation) -> Result<Vec<Detection>> {
        Ok(self.0.iter().copied().map(Detection::new).collect())
    }
}

fn main() -> Result<()> {
    env_logger::builder()
        .filter_level(log::LevelFilter::Info)
        .format_target(false)
        .format_timestamp(None)
        .init();

    let cli = Cli::parse();
    let cfg = config::load_config(cli.config.as_deref())?;

    match cli.command {
        Commands::Map {
            image,
            overlay,
            facing,
            json,
            rects,
        } => map(&cfg, image, overlay, facing, json, &rects),
        Commands::Convert { raw, output } => convert(&raw, &output),
        Commands::Crop {
            input,
            region,
            rotation,
            output,
        } => crop(&input, region, rotation, &output),
        Commands::Annotate {
            raw,
            rotation,
            overlay,
            facing,
            rects,
            output,
            face_output,
        } => annotate(
            &cfg,
            &raw,
            FrameSettings {
                rotation,
                overlay,
                facing,
            },
            rects,
            &output,
            face_output.as_deref(),
        ),
        Commands::Config => open_config(cli.config.as_deref()),
    }
}

fn map(
    cfg: &config::Config,
    image: ImageDimensions,
    overlay: Option<OverlayDimensions>,
    facing: Option<CameraFacing>,
    json: bool,
    rects: &[ImageRect],
) -> Result<()> {
    let overlay = overlay.unwrap_or_else(|| cfg.overlay());
    let facing = facing.unwrap_or(cfg.facing);
    let mapped = map_rectangles(rects, image, overlay, facing);

    if mapped.is_empty() {
        log::warn!("image size {}x{} has a zero side, nothing mapped", image.width, image.height);
    }
    if json {
        println!("{}", serde_json::to_string_pretty(&mapped)?);
    } else {
        for rect in &mapped {
            println!("{rect}");
        }
    }
    Ok(())
}

fn convert(raw: &RawFrameArgs, output: &Path) -> Result<()> {
    let data = raw.read()?;
    let frame = raw.frame(&data)?;
    let packed = to_packed_image(&frame).context("converting frame")?;
    packed
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(
        "✓ Wrote {}x{} image to {}",
        packed.width(),
        packed.height(),
        output.display()
    );
    Ok(())
}

fn crop(input: &Path, region: ImageRect, rotation: Rotation, output: &Path) -> Result<()> {
    let img = image::open(input)
        .with_context(|| format!("opening {}", input.display()))?
        .to_rgb8();
    let face = crop_and_upright(&img, region, rotation);
    face.save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    info!(
        "✓ Cropped {} from {}x{} to {}x{}",
        region,
        img.width(),
        img.height(),
        face.width(),
        face.height()
    );
    Ok(())
}

struct FrameSettings {
    rotation: Rotation,
    overlay: Option<OverlayDimensions>,
    facing: Option<CameraFacing>,
}

fn annotate(
    cfg: &config::Config,
    raw: &RawFrameArgs,
    settings: FrameSettings,
    rects: Vec<ImageRect>,
    output: &Path,
    face_output: Option<&Path>,
) -> Result<()> {
    let overlay = settings.overlay.unwrap_or_else(|| cfg.overlay());
    let facing = settings.facing.unwrap_or(cfg.facing);
    let data = raw.read()?;
    let frame = raw.frame(&data)?;

    let mut pipeline = Pipeline::new(RecordedDetections(rects));
    let analysis = pipeline.process(
        FrameInput {
            frame,
            rotation: settings.rotation,
            facing,
        },
        overlay,
    )?;
    info!("{} face(s) in frame", analysis.detections.len());

    let packed = match analysis.image {
        Some(image) => image,
        None => to_packed_image(&frame).context("converting frame")?,
    };
    let mut canvas = overlay::render_preview(&packed, settings.rotation, facing, overlay);
    overlay::draw_boxes(&mut canvas, &analysis.boxes, &cfg.box_style());
    canvas
        .save(output)
        .with_context(|| format!("writing {}", output.display()))?;
    info!("✓ Wrote preview to {}", output.display());

    if let Some(path) = face_output {
        match &analysis.face {
            Some(face) => {
                face.save(path)
                    .with_context(|| format!("writing {}", path.display()))?;
                info!("✓ Wrote face crop to {}", path.display());
            }
            None => log::warn!("no face in frame, {} not written", path.display()),
        }
    }
    Ok(())
}

fn open_config(path: Option<&Path>) -> Result<()> {
    if config::ensure_config(path)? {
        info!("Wrote default config");
    }
    let config_path = path.unwrap_or(&config::CONFIG_PATH).as_os_str();
    let editor = env::var("EDITOR").unwrap_or_else(|_| "vi".to_string());

    info!("Opening config file: {:?}", config_path);

    let status = std::process::Command::new(editor)
        .arg(config_path)
        .status()
        .context("Failed to open editor")?;

    if !status.success() {
        anyhow::bail!("Editor exited with non-zero status");
    }

    Ok(())
}
