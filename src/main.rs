use clap::{Parser, Subcommand};
use serde::Serialize;
use sift_module::config::load_config_or_default;
use sift_module::engine::ImageMode;
use sift_module::logging::{init_logging, new_correlation_id};
use sift_module::utils::load_image;
use sift_module::*;
use std::path::{Path, PathBuf};

#[derive(Parser)]
#[command(name = "sift")]
#[command(about = "SIFT descriptor extraction and image matching")]
#[command(version = "0.1.0")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Configuration file (TOML or JSON)
    #[arg(short, long, global = true)]
    config: Option<String>,
}

#[derive(Subcommand)]
enum Commands {
    /// Extract keypoints and descriptors from an image
    Extract {
        /// Path to the image
        #[arg(short, long)]
        image: PathBuf,

        /// Overrides the configured imageMode ("Float" or "Unsigned Char")
        #[arg(long)]
        image_mode: Option<String>,

        /// Output file for results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Detect and match keypoints between two images
    Match {
        /// Path to the first image
        #[arg(short = 'a', long)]
        image1: PathBuf,

        /// Path to the second image
        #[arg(short = 'b', long)]
        image2: PathBuf,

        /// Overrides the configured imageMode ("Float" or "Unsigned Char")
        #[arg(long)]
        image_mode: Option<String>,

        /// Output file for results
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// List the components this module provides
    Components,
}

#[derive(Serialize)]
struct ExtractionReport {
    image: PathBuf,
    timestamp: String,
    descriptor_type: String,
    keypoints: Vec<Keypoint>,
    nb_descriptors: usize,
}

#[derive(Serialize)]
struct MatchReport {
    image1: PathBuf,
    image2: PathBuf,
    timestamp: String,
    nb_keypoints1: usize,
    nb_keypoints2: usize,
    matches: Vec<DescriptorMatch>,
}

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    let mut config = load_config_or_default(cli.config.as_deref());
    config.logging = config.logging.with_verbosity(cli.verbose);
    let _guard = init_logging(&config.logging)?;
    let run_id = new_correlation_id();
    tracing::debug!(%run_id, "sift started");

    match cli.command {
        Commands::Extract { image, image_mode, output } => {
            if let Some(mode) = image_mode {
                config.extractor.image_mode = mode;
            }
            let mut extractor = SiftDescriptorsExtractor::new();
            config.configure_extractor(&mut extractor)?;
            handle_extract(&extractor, image, output)?;
        }
        Commands::Match { image1, image2, image_mode, output } => {
            if let Some(mode) = image_mode {
                config.matcher.image_mode = mode;
            }
            let mut matcher = SiftImageMatcher::new();
            config.configure_matcher(&mut matcher)?;
            handle_match(&matcher, image1, image2, output)?;
        }
        Commands::Components => handle_components()?,
    }

    Ok(())
}

fn loads_as_float(image_mode: Option<ImageMode>) -> bool {
    image_mode == Some(ImageMode::Float)
}

fn write_report<T: Serialize>(output: Option<PathBuf>, report: &T) -> anyhow::Result<()> {
    if let Some(output_path) = output {
        let json = serde_json::to_string_pretty(report)?;
        std::fs::write(&output_path, json)?;
        println!("Results saved to {}", output_path.display());
    }
    Ok(())
}

fn describe(path: &Path, image: &Image) {
    println!(
        "{}: {}x{}, {} channel(s), {}",
        path.display(),
        image.width(),
        image.height(),
        image.nb_channels(),
        image.data_type()
    );
}

fn handle_extract(extractor: &SiftDescriptorsExtractor, image_path: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let as_float = loads_as_float(extractor.engine_config().map(|c| c.image_mode));
    let image = load_image(&image_path, as_float)?;
    describe(&image_path, &image);

    let start = instant::Instant::now();
    let (keypoints, descriptors) = extractor.extract(&image)?;
    println!(
        "Extracted {} keypoints ({} descriptors of length {}) in {:.1} ms",
        keypoints.len(),
        descriptors.nb_descriptors(),
        descriptors.descriptor_length(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let report = ExtractionReport {
        image: image_path,
        timestamp: chrono::Utc::now().to_rfc3339(),
        descriptor_type: extractor.type_string().to_string(),
        nb_descriptors: descriptors.nb_descriptors(),
        keypoints,
    };
    write_report(output, &report)
}

fn handle_match(matcher: &SiftImageMatcher, image1_path: PathBuf, image2_path: PathBuf, output: Option<PathBuf>) -> anyhow::Result<()> {
    let as_float = loads_as_float(matcher.engine_config().map(|c| c.image_mode));
    let image1 = load_image(&image1_path, as_float)?;
    let image2 = load_image(&image2_path, as_float)?;
    describe(&image1_path, &image1);
    describe(&image2_path, &image2);

    let start = instant::Instant::now();
    let result = matcher.match_images(&image1, &image2)?;
    println!(
        "{} / {} keypoints, {} matches in {:.1} ms",
        result.keypoints1.len(),
        result.keypoints2.len(),
        result.matches.len(),
        start.elapsed().as_secs_f64() * 1000.0
    );

    let report = MatchReport {
        image1: image1_path,
        image2: image2_path,
        timestamp: chrono::Utc::now().to_rfc3339(),
        nb_keypoints1: result.keypoints1.len(),
        nb_keypoints2: result.keypoints2.len(),
        matches: result.matches,
    };
    write_report(output, &report)
}

fn handle_components() -> anyhow::Result<()> {
    println!("{} ({})", module::MODULE_NAME, module::MODULE_UUID);
    println!("{}", module::MODULE_DESCRIPTION);
    println!();
    for info in components() {
        println!("{} [{}] implements {}", info.name, info.uuid, info.interface);
        for property in &info.properties {
            println!("    {:<18} default {:<10} {}", property.name, property.default_value.to_string(), property.description);
        }
    }
    Ok(())
}
