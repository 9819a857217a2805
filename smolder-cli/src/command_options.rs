//! Command line argument parsing.

use std::path::PathBuf;

use clap::Parser;

#[derive(Clone, Debug, Parser)]
#[command(
    author,
    about,
    version,
    after_help = "The scene file names the grid dimensions, camera, lights, \
        output image, and the density fields to generate."
)]
pub(crate) struct SmolderArgs {
    /// Scene description file to render.
    pub scene: PathBuf,

    /// Sample density by trilinear interpolation instead of per-voxel lookup.
    ///
    /// Smoother but slower.
    #[arg(long)]
    pub interpolate: bool,

    /// Write the image to this path instead of the one named in the scene
    /// file. The output format is always PNG.
    #[arg(long, short = 'o')]
    pub output: Option<PathBuf>,

    /// Noise seed, overriding the scene file's SEED.
    ///
    /// Without either, the seed comes from the system clock.
    #[arg(long)]
    pub seed: Option<u32>,

    /// Additional logging, up to twice.
    #[arg(long = "verbose", short = 'v', action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn parse(args: &[&str]) -> Result<SmolderArgs, clap::Error> {
        SmolderArgs::try_parse_from(std::iter::once("smolder").chain(args.iter().copied()))
    }

    #[test]
    fn scene_path_is_required() {
        assert!(parse(&[]).is_err());
        assert_eq!(parse(&["scene.txt"]).unwrap().scene, PathBuf::from("scene.txt"));
    }

    #[test]
    fn flags_parse() {
        let args = parse(&["scene.txt", "--interpolate", "-o", "out.png", "-vv"]).unwrap();
        assert!(args.interpolate);
        assert_eq!(args.output, Some(PathBuf::from("out.png")));
        assert_eq!(args.verbose, 2);
        assert_eq!(args.seed, None);
    }

    #[test]
    fn seed_override_parses() {
        assert_eq!(parse(&["scene.txt", "--seed", "17"]).unwrap().seed, Some(17));
    }
}
