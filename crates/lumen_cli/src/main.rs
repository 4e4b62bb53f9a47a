//! Render a built-in scene progressively and save it as a PNG.
//!
//! Run with: cargo run --release --bin lumen -- --scene cornell_box --output cornell.png

use std::env;
use std::path::{Path, PathBuf};
use std::time::Instant;

use anyhow::{anyhow, bail, Context, Result};
use lumen_core::{scenes, IntegratorMode, RenderSettings};
use lumen_renderer::{FrameAccumulator, Renderer, SceneBvh};

const USAGE: &str = "\
Usage: lumen [options]

  --scene <name>        closed_box | cornell_box | parallel_quads | showcase (default cornell_box)
  --settings <file>     render settings as JSON
  --output <file>       PNG to write (default render.png)
  --width <px>          override the image width
  --height <px>         override the image height
  --spp <n>             samples per pixel per batch
  --batches <n>         number of progressive batches
  --direct              direct lighting instead of full path tracing
  --save-every-batch    rewrite the PNG after each batch";

struct Args {
    scene: String,
    settings: Option<PathBuf>,
    output: PathBuf,
    width: Option<u32>,
    height: Option<u32>,
    spp: Option<u32>,
    batches: Option<u32>,
    direct: bool,
    save_every_batch: bool,
}

impl Args {
    fn parse() -> Result<Option<Self>> {
        let mut args = Self {
            scene: "cornell_box".to_string(),
            settings: None,
            output: PathBuf::from("render.png"),
            width: None,
            height: None,
            spp: None,
            batches: None,
            direct: false,
            save_every_batch: false,
        };

        let mut iter = env::args().skip(1);
        while let Some(flag) = iter.next() {
            let mut value = || iter.next().ok_or_else(|| anyhow!("{} needs a value", flag));
            match flag.as_str() {
                "--scene" => args.scene = value()?,
                "--settings" => args.settings = Some(PathBuf::from(value()?)),
                "--output" => args.output = PathBuf::from(value()?),
                "--width" => args.width = Some(parse_number(&flag, &value()?)?),
                "--height" => args.height = Some(parse_number(&flag, &value()?)?),
                "--spp" => args.spp = Some(parse_number(&flag, &value()?)?),
                "--batches" => args.batches = Some(parse_number(&flag, &value()?)?),
                "--direct" => args.direct = true,
                "--save-every-batch" => args.save_every_batch = true,
                "-h" | "--help" => return Ok(None),
                other => bail!("Unknown argument '{}'\n\n{}", other, USAGE),
            }
        }
        Ok(Some(args))
    }

    fn render_settings(&self) -> Result<RenderSettings> {
        let mut settings = match &self.settings {
            Some(path) => RenderSettings::from_json_file(path)
                .with_context(|| format!("Failed to read settings from {}", path.display()))?,
            None => RenderSettings::default(),
        };

        if let Some(width) = self.width {
            settings.width = width;
        }
        if let Some(height) = self.height {
            settings.height = height;
        }
        if let Some(spp) = self.spp {
            settings.samples_per_pixel = spp;
        }
        if let Some(batches) = self.batches {
            settings.sample_batches = batches;
        }
        if self.direct {
            settings.integrator = IntegratorMode::DirectLighting;
        }
        Ok(settings)
    }
}

fn parse_number(flag: &str, text: &str) -> Result<u32> {
    text.parse()
        .with_context(|| format!("{} expects a whole number, got '{}'", flag, text))
}

fn save_png(frame: &FrameAccumulator, path: &Path) -> Result<()> {
    let image = image::RgbaImage::from_raw(frame.width, frame.height, frame.to_rgba())
        .ok_or_else(|| anyhow!("Frame buffer does not match {}x{}", frame.width, frame.height))?;
    image
        .save(path)
        .with_context(|| format!("Failed to write {}", path.display()))
}

fn main() -> Result<()> {
    env_logger::Builder::from_default_env()
        .filter_level(log::LevelFilter::Info)
        .init();

    let Some(args) = Args::parse()? else {
        println!("{}", USAGE);
        return Ok(());
    };
    let settings = args.render_settings()?;

    let start = Instant::now();
    let scene = scenes::by_name(&args.scene)
        .ok_or_else(|| {
            anyhow!(
                "Unknown scene '{}', expected one of: {}",
                args.scene,
                scenes::SCENE_NAMES.join(", ")
            )
        })?
        .with_context(|| format!("Failed to build scene '{}'", args.scene))?;
    let bvh = SceneBvh::new(&scene);
    log::info!(
        "Scene '{}' ready in {:.2?}: {} triangles, {} emissive",
        scene.name,
        start.elapsed(),
        scene.total_triangle_count(),
        scene.lights.triangle_count()
    );

    let mut renderer = Renderer::new(&scene, &bvh, settings);
    while renderer.render_next_batch().is_some() {
        if args.save_every_batch {
            save_png(renderer.frame(), &args.output)?;
        }
    }

    save_png(renderer.frame(), &args.output)?;
    log::info!(
        "Wrote {} after {:.2?}",
        args.output.display(),
        start.elapsed()
    );
    Ok(())
}
