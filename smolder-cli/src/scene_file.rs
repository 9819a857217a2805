//! Parsing of scene description files.
//!
//! A scene file is a header of `KEY value...` lines, a count of density
//! fields, and one record per field:
//!
//! ```text
//! STEP 0.005
//! XYZC 100 100 100
//! BRGB 0.27 0.51 0.71
//! MRGB 0.96 0.96 0.96
//! FILE cloud.png
//! RESO 640 480
//! EYEP 0 0 2
//! VDIR 0 0 -1
//! UVEC 0 1 0
//! FOVY 45
//! LPOS 2 0 0
//! LCOL 1 1 1
//!
//! 1
//!
//! sphere
//! 0.5 0.5 -0.5
//! 0.4
//! ```
//!
//! Each field record is the type (`sphere`, `cloud`, or `pyroclastic`), the
//! center, the radius, and an optional line of
//! `<scale> <octaves> <frequency> <amplitude> <texture>` extras, every one of
//! which may be omitted from the right.

use std::path::PathBuf;
use std::str::{FromStr, SplitWhitespace};

use anyhow::{bail, Context as _};

use smolder::{Light, Rgb, MAX_LIGHTS};

/// Which generator fills a density field.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub(crate) enum FieldKind {
    Sphere,
    Cloud,
    Pyroclastic,
}

/// One density field declaration from a scene file.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct FieldDecl {
    pub kind: FieldKind,
    pub center: [f64; 3],
    pub radius: f32,
    pub scale: f32,
    pub octaves: usize,
    pub frequency: f64,
    pub amplitude: f64,
    /// Image file for a spherically mapped texture material; otherwise the
    /// scene's `MRGB` solid color is used.
    pub texture: Option<PathBuf>,
}

/// Everything a scene file declares, with defaults filled in.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct SceneFile {
    pub step: f64,
    pub grid_dims: [usize; 3],
    pub background: Rgb,
    pub material_color: Rgb,
    pub output_file: PathBuf,
    pub resolution: [usize; 2],
    pub eye: [f64; 3],
    pub view_dir: [f64; 3],
    pub up: [f64; 3],
    pub fov_y: f64,
    pub seed: Option<u32>,
    pub lights: Vec<Light>,
    pub fields: Vec<FieldDecl>,
}

/// Parses scene file text.
pub(crate) fn parse(text: &str) -> anyhow::Result<SceneFile> {
    let mut step = 0.005_f64;
    let mut grid_dims = [0_usize; 3];
    let mut background = Rgb::BLACK;
    let mut material_color = Rgb::BLACK;
    let mut output_file = PathBuf::new();
    let mut resolution = [640_usize, 480];
    let mut eye = [0.0, 0.0, 2.0];
    let mut view_dir = [0.0, 0.0, -1.0];
    let mut up = [0.0, 1.0, 0.0];
    let mut fov_y = 45.0;
    let mut seed = None;
    let mut light_positions: Vec<[f64; 3]> = Vec::new();
    let mut light_colors: Vec<Rgb> = Vec::new();

    let mut lines = text.lines().map(str::trim).peekable();

    // Header: ends at the first line whose leading token is not alphabetic
    // (the field count).
    while let Some(&line) = lines.peek() {
        if line.is_empty() {
            lines.next();
            continue;
        }
        let mut words = line.split_whitespace();
        let Some(key) = words.next() else { break };
        if !key.chars().all(|c| c.is_ascii_alphabetic()) {
            break;
        }
        lines.next();

        match key {
            "STEP" => step = number(&mut words, line)?,
            "XYZC" => grid_dims = triple(&mut words, line)?,
            "BRGB" => background = color(&mut words, line)?,
            "MRGB" => material_color = color(&mut words, line)?,
            "FILE" => {
                output_file = PathBuf::from(
                    words
                        .next()
                        .with_context(|| format!("missing file name in {line:?}"))?,
                );
            }
            "RESO" => resolution = pair(&mut words, line)?,
            "EYEP" => eye = triple(&mut words, line)?,
            "VDIR" => view_dir = triple(&mut words, line)?,
            "UVEC" => up = triple(&mut words, line)?,
            "FOVY" => fov_y = number(&mut words, line)?,
            "SEED" => seed = Some(number(&mut words, line)?),
            "LPOS" => light_positions.push(triple(&mut words, line)?),
            "LCOL" => light_colors.push(color(&mut words, line)?),
            other => bail!("unrecognized scene option {other:?}"),
        }
    }

    if light_positions.len() != light_colors.len() {
        bail!(
            "scene declares {} LPOS but {} LCOL entries; they must pair up",
            light_positions.len(),
            light_colors.len(),
        );
    }
    if light_positions.len() > MAX_LIGHTS {
        bail!(
            "scene has {} lights but at most {MAX_LIGHTS} are supported",
            light_positions.len(),
        );
    }
    let lights: Vec<Light> = light_positions
        .into_iter()
        .zip(light_colors)
        .map(|(position, color)| Light::new(position, color))
        .collect();

    let count_line = lines.next().context("missing density field count")?;
    let count: usize = count_line
        .parse()
        .with_context(|| format!("bad density field count {count_line:?}"))?;

    let mut fields = Vec::with_capacity(count);
    for index in 0..count {
        fields.push(parse_field(&mut lines, index, grid_dims[0] as f32)?);
    }

    Ok(SceneFile {
        step,
        grid_dims,
        background,
        material_color,
        output_file,
        resolution,
        eye,
        view_dir,
        up,
        fov_y,
        seed,
        lights,
        fields,
    })
}

fn parse_field<'a>(
    lines: &mut std::iter::Peekable<impl Iterator<Item = &'a str>>,
    index: usize,
    default_scale: f32,
) -> anyhow::Result<FieldDecl> {
    let kind_line = next_content(lines).with_context(|| format!("field {index}: missing type"))?;
    let kind = match kind_line.split_whitespace().next() {
        Some("sphere") => FieldKind::Sphere,
        Some("cloud") => FieldKind::Cloud,
        Some("pyroclastic") => FieldKind::Pyroclastic,
        _ => bail!("field {index}: unknown type {kind_line:?}"),
    };

    let center_line =
        next_content(lines).with_context(|| format!("field {index}: missing center"))?;
    let center = triple(&mut center_line.split_whitespace(), center_line)?;

    let radius_line =
        next_content(lines).with_context(|| format!("field {index}: missing radius"))?;
    let radius = number(&mut radius_line.split_whitespace(), radius_line)?;

    let mut field = FieldDecl {
        kind,
        center,
        radius,
        scale: default_scale,
        octaves: 1,
        frequency: 1.0,
        amplitude: 1.0,
        texture: None,
    };

    // The extras line is optional; a blank (or absent) line keeps every
    // default, and extras may be truncated from the right.
    if let Some(&line) = lines.peek() {
        if !line.is_empty() {
            lines.next();
            let mut words = line.split_whitespace();
            if let Some(word) = words.next() {
                field.scale = parse_word(word, line)?;
            }
            if let Some(word) = words.next() {
                field.octaves = parse_word(word, line)?;
            }
            if let Some(word) = words.next() {
                field.frequency = parse_word(word, line)?;
            }
            if let Some(word) = words.next() {
                field.amplitude = parse_word(word, line)?;
            }
            if let Some(word) = words.next() {
                field.texture = Some(PathBuf::from(word));
            }
        }
    }

    Ok(field)
}

fn next_content<'a>(lines: &mut impl Iterator<Item = &'a str>) -> Option<&'a str> {
    lines.find(|line| !line.is_empty())
}

fn parse_word<T>(word: &str, line: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    word.parse()
        .with_context(|| format!("bad value {word:?} in {line:?}"))
}

fn number<T>(words: &mut SplitWhitespace<'_>, line: &str) -> anyhow::Result<T>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    let word = words
        .next()
        .with_context(|| format!("missing value in {line:?}"))?;
    parse_word(word, line)
}

fn pair<T>(words: &mut SplitWhitespace<'_>, line: &str) -> anyhow::Result<[T; 2]>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok([number(words, line)?, number(words, line)?])
}

fn triple<T>(words: &mut SplitWhitespace<'_>, line: &str) -> anyhow::Result<[T; 3]>
where
    T: FromStr,
    T::Err: std::error::Error + Send + Sync + 'static,
{
    Ok([number(words, line)?, number(words, line)?, number(words, line)?])
}

fn color(words: &mut SplitWhitespace<'_>, line: &str) -> anyhow::Result<Rgb> {
    let [r, g, b] = triple(words, line)?;
    Ok(Rgb::new(r, g, b))
}
