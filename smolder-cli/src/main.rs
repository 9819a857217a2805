//! Command line renderer for `smolder` scene files.

use std::fs;
use std::io::BufWriter;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Instant, SystemTime, UNIX_EPOCH};

use anyhow::{bail, Context as _};
use clap::Parser as _;
use imgref::{Img, ImgRef};

use smolder::material::{Material, SphericalTexture};
use smolder::math::{Aab, FreePoint};
use smolder::procgen::FbmNoise;
use smolder::{Camera, RenderContext, VoxelBuffer};

mod command_options;
mod scene_file;

use command_options::SmolderArgs;
use scene_file::{FieldKind, SceneFile};

fn main() -> Result<(), anyhow::Error> {
    let args = SmolderArgs::parse();
    install_logging(args.verbose)?;

    let text = fs::read_to_string(&args.scene)
        .with_context(|| format!("failed to read scene file {}", args.scene.display()))?;
    let scene = scene_file::parse(&text)
        .with_context(|| format!("failed to parse scene file {}", args.scene.display()))?;

    let output = output_path(&args, &scene)?;
    let seed = match args.seed.or(scene.seed) {
        Some(seed) => seed,
        None => {
            let seed = clock_seed();
            log::info!("no seed given; using {seed} from the system clock");
            seed
        }
    };

    let [width, height] = scene.resolution;
    let camera = Camera::new(
        scene.eye,
        scene.view_dir,
        scene.up,
        scene.fov_y,
        width as f64 / height as f64,
    );

    let mut ctx = build_context(&scene, &args.scene, seed)?;
    ctx.set_interpolation(args.interpolate);

    log::info!(
        "rendering {width}\u{d7}{height} image: {} field(s), {} light(s), step {}",
        ctx.primitives().len(),
        ctx.lights().len(),
        ctx.step(),
    );
    let start = Instant::now();
    let image = smolder::render::render(&ctx, &camera, width, height);
    log::info!("rendered in {:.2?}", start.elapsed());

    write_png(&output, image.as_ref())?;
    log::info!("wrote {}", output.display());
    Ok(())
}

fn install_logging(verbosity: u8) -> Result<(), anyhow::Error> {
    use log::LevelFilter;

    let level = match verbosity {
        0 => LevelFilter::Info,
        1 => LevelFilter::Debug,
        _ => LevelFilter::Trace,
    };
    simplelog::WriteLogger::init(
        level,
        simplelog::ConfigBuilder::new()
            .set_target_level(LevelFilter::Off)
            .set_location_level(LevelFilter::Off)
            .build(),
        std::io::stderr(),
    )
    .context("failed to initialize logging")
}

/// The output image path: the `-o` override, or the scene's `FILE` with its
/// extension forced to `png`.
fn output_path(args: &SmolderArgs, scene: &SceneFile) -> Result<PathBuf, anyhow::Error> {
    if let Some(output) = &args.output {
        return Ok(output.clone());
    }
    if scene.output_file.as_os_str().is_empty() {
        bail!("scene file names no output image (FILE); pass --output");
    }
    let mut output = scene.output_file.clone();
    output.set_extension("png");
    if output != scene.output_file {
        log::debug!(
            "rewriting output file {} to {}; only PNG output is supported",
            scene.output_file.display(),
            output.display(),
        );
    }
    Ok(output)
}

fn clock_seed() -> u32 {
    match SystemTime::now().duration_since(UNIX_EPOCH) {
        Ok(elapsed) => elapsed.as_secs() as u32,
        Err(_) => 0,
    }
}

/// Instantiates every density field the scene declares and assembles the
/// render context.
fn build_context(
    scene: &SceneFile,
    scene_path: &Path,
    seed: u32,
) -> Result<RenderContext, anyhow::Error> {
    let mut primitives: Vec<Box<dyn smolder::scene::Primitive>> =
        Vec::with_capacity(scene.fields.len());

    for (index, field) in scene.fields.iter().enumerate() {
        let material: Arc<dyn Material> = match &field.texture {
            Some(texture) => Arc::new(load_texture(texture, scene_path)?),
            None => Arc::new(scene.material_color),
        };
        let bounds = Aab::from_center(FreePoint::from(field.center), field.radius as f64);

        let buffer = match field.kind {
            FieldKind::Sphere => VoxelBuffer::sphere(
                scene.grid_dims,
                bounds,
                material,
                field.radius,
                field.scale,
            ),
            FieldKind::Cloud => VoxelBuffer::cloud(
                scene.grid_dims,
                bounds,
                material,
                field.radius,
                field.scale,
                &FbmNoise::new(seed, field.octaves, field.frequency, field.amplitude),
            ),
            FieldKind::Pyroclastic => VoxelBuffer::pyroclastic(
                scene.grid_dims,
                bounds,
                material,
                field.radius,
                field.scale,
                &FbmNoise::new(seed, field.octaves, field.frequency, field.amplitude),
            ),
        }
        .with_context(|| format!("field {index} is invalid"))?;

        primitives.push(Box::new(buffer));
    }

    Ok(RenderContext::new(
        scene.step,
        primitives,
        scene.lights.clone(),
        scene.background,
    )?)
}

/// Decodes a texture image, looked up relative to the scene file's directory.
fn load_texture(texture: &Path, scene_path: &Path) -> Result<SphericalTexture, anyhow::Error> {
    let path = if texture.is_relative() {
        match scene_path.parent() {
            Some(parent) => parent.join(texture),
            None => texture.to_owned(),
        }
    } else {
        texture.to_owned()
    };

    let decoded = image::open(&path)
        .with_context(|| format!("failed to read texture image {}", path.display()))?
        .into_rgb8();
    let (width, height) = decoded.dimensions();
    let texels: Vec<[u8; 3]> = decoded.pixels().map(|pixel| pixel.0).collect();
    Ok(SphericalTexture::new(Img::new(
        texels,
        width as usize,
        height as usize,
    )))
}

fn write_png(path: &Path, image: ImgRef<'_, [u8; 3]>) -> Result<(), anyhow::Error> {
    let file = fs::File::create(path)
        .with_context(|| format!("failed to create output file {}", path.display()))?;
    let mut encoder = png::Encoder::new(
        BufWriter::new(file),
        image.width() as u32,
        image.height() as u32,
    );
    encoder.set_color(png::ColorType::Rgb);
    encoder.set_depth(png::BitDepth::Eight);

    let data: Vec<u8> = image.pixels().flatten().collect();
    let mut writer = encoder
        .write_header()
        .with_context(|| format!("failed to write PNG header to {}", path.display()))?;
    writer
        .write_image_data(&data)
        .with_context(|| format!("failed to write PNG data to {}", path.display()))?;
    Ok(())
}
