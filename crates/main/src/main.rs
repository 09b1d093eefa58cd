use std::error::Error;
use std::fs;
use std::io::{self, Cursor};
use std::path::{Path, PathBuf};

use clap::{Args, Parser, Subcommand};
use image::{DynamicImage, ImageBuffer, ImageOutputFormat, Rgb, Rgba, RgbaImage};
use photo_report::assets::{DirAssetStore, MemoryAssetStore};
use photo_report::config::{CompressionOptions, DEFAULT_HEADER_ASSET, DEFAULT_WATERMARK_ASSET};
use photo_report::{MetadataField, PhotoEntry, ReportConfig, ReportSession};
use tracing_subscriber::EnvFilter;

/// Builds photographic inspection reports from the command line.
///
/// Fonts must be present under `assets/fonts` next to the binary or provided
/// via the `PHOTO_REPORT_FONTS_DIR` environment variable. Common system
/// families (Arial, DejaVu Sans, Liberation Sans) are used as a fallback.
#[derive(Parser)]
#[command(author, version, about = "Photographic report generator")]
struct Cli {
    /// Log debug output from the renderer.
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Render a report from photo files and metadata.
    Generate(GenerateArgs),

    /// Render a report from generated placeholder photos and assets.
    Sample {
        /// Number of placeholder photos.
        #[arg(long, default_value_t = 7)]
        photos: usize,

        /// Directory the report is written to.
        #[arg(long, default_value = ".")]
        output_dir: PathBuf,
    },
}

#[derive(Args)]
struct GenerateArgs {
    /// Photo file; repeat to add more. Only the first 18 are used.
    #[arg(long = "photo", required = true)]
    photos: Vec<PathBuf>,

    /// Caption for the photo at the same position; repeat per photo.
    #[arg(long = "caption")]
    captions: Vec<String>,

    #[arg(long)]
    location: Option<String>,

    #[arg(long)]
    report_number: Option<String>,

    #[arg(long)]
    date: Option<String>,

    #[arg(long)]
    involved_parties: Option<String>,

    #[arg(long)]
    requester: Option<String>,

    /// Reference or subject of the inspection.
    #[arg(long)]
    subject: Option<String>,

    /// Directory holding `assets/header.png` and `assets/watermark.png`.
    #[arg(long, default_value = ".")]
    assets_dir: PathBuf,

    /// Directory the report is written to.
    #[arg(long, default_value = ".")]
    output_dir: PathBuf,

    /// Photos wider than this many pixels are scaled down.
    #[arg(long)]
    max_width: Option<u32>,

    /// Lossy encoding quality in (0, 1].
    #[arg(long)]
    quality: Option<f32>,

    /// Watermark opacity in (0, 1].
    #[arg(long)]
    opacity: Option<f32>,
}

impl GenerateArgs {
    fn config(&self) -> ReportConfig {
        let base = ReportConfig::from_env();
        let compression = CompressionOptions {
            max_width: self.max_width.unwrap_or(base.compression.max_width),
            quality: self.quality.unwrap_or(base.compression.quality),
        };
        let opacity = self.opacity.unwrap_or(base.watermark_opacity);
        base.with_compression(compression)
            .with_watermark_opacity(opacity)
    }

    fn metadata(&self) -> [(MetadataField, &Option<String>); 6] {
        [
            (MetadataField::Location, &self.location),
            (MetadataField::ReportNumber, &self.report_number),
            (MetadataField::Date, &self.date),
            (MetadataField::InvolvedParties, &self.involved_parties),
            (MetadataField::Requester, &self.requester),
            (MetadataField::SubjectReference, &self.subject),
        ]
    }
}

fn main() {
    let cli = Cli::parse();

    let filter = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(filter)),
        )
        .with_writer(io::stderr)
        .init();

    let result = match cli.command {
        Commands::Generate(args) => run_generate(&args),
        Commands::Sample { photos, output_dir } => run_sample(photos, &output_dir),
    };

    if let Err(err) = result {
        eprintln!("Error: {}", err);
        print_error_sources(err.as_ref());
        std::process::exit(1);
    }
}

fn run_generate(args: &GenerateArgs) -> Result<(), Box<dyn Error>> {
    let mut entries = Vec::with_capacity(args.photos.len());
    for path in &args.photos {
        let bytes = fs::read(path)
            .map_err(|err| format!("Failed to read photo {}: {err}", path.display()))?;
        entries.push(PhotoEntry::new(bytes));
    }

    let mut session = ReportSession::new(args.config());
    session.select_files(entries);
    for (index, caption) in args.captions.iter().enumerate().take(session.photos().len()) {
        session.set_caption(index, caption.as_str())?;
    }
    for (field, value) in args.metadata() {
        session.set_field(field, value.clone());
    }

    fs::create_dir_all(&args.output_dir)?;
    let path = session.generate(&DirAssetStore::new(&args.assets_dir), &args.output_dir)?;
    println!("Generated {}", path.display());
    Ok(())
}

fn run_sample(photos: usize, output_dir: &Path) -> Result<(), Box<dyn Error>> {
    let assets = MemoryAssetStore::new()
        .with_file(DEFAULT_HEADER_ASSET, generate_header_band()?)
        .with_file(DEFAULT_WATERMARK_ASSET, generate_watermark()?);

    let mut session = ReportSession::new(ReportConfig::from_env());
    let entries = (0..photos)
        .map(|index| {
            let tint = (index * 29 % 200) as u8;
            generate_gradient_image(1600, 1200, [60, 92, tint], [228, 188, 152])
                .map(|bytes| PhotoEntry::new(bytes).with_caption(format!("Sample photo {}", index + 1)))
        })
        .collect::<Result<Vec<_>, _>>()?;
    session.select_files(entries);

    for (field, value) in [
        (MetadataField::Location, "Main building, level 2"),
        (MetadataField::ReportNumber, "001/2024"),
        (MetadataField::Date, "2024-05-02"),
        (MetadataField::InvolvedParties, "Owner and contractor"),
        (MetadataField::Requester, "Facilities department"),
        (MetadataField::SubjectReference, "Ceiling moisture survey"),
    ] {
        session.set_field(field, Some(value.to_owned()));
    }

    fs::create_dir_all(output_dir)?;
    let path = session.generate(&assets, output_dir)?;
    println!(
        "Generated {} with {} placeholder photos",
        path.display(),
        session.photos().len()
    );
    Ok(())
}

fn generate_header_band() -> Result<Vec<u8>, image::ImageError> {
    generate_gradient_image(760, 88, [24, 52, 96], [96, 140, 196])
}

fn generate_watermark() -> Result<Vec<u8>, image::ImageError> {
    let buffer = RgbaImage::from_fn(240, 320, |x, y| {
        let ring = ((x as i32 - 120).pow(2) + (y as i32 - 160).pow(2)) as f32;
        if ring.sqrt() < 100.0 {
            Rgba([24, 52, 96, 255])
        } else {
            Rgba([0, 0, 0, 0])
        }
    });
    encode_png(DynamicImage::ImageRgba8(buffer))
}

/// Placeholder photo: `top` fades into `bottom` under a faint 64 px checkerboard.
fn generate_gradient_image(
    width: u32,
    height: u32,
    top: [u8; 3],
    bottom: [u8; 3],
) -> Result<Vec<u8>, image::ImageError> {
    let rows = height.max(2) - 1;
    let buffer = ImageBuffer::from_fn(width, height, |x, y| {
        let band = if (x / 64 + y / 64) % 2 == 0 { 0 } else { 12 };
        Rgb([0, 1, 2].map(|channel| {
            let (from, to) = (u32::from(top[channel]), u32::from(bottom[channel]));
            let value = (from * (rows - y.min(rows)) + to * y.min(rows)) / rows;
            (value as u8).saturating_add(band)
        }))
    });
    encode_png(DynamicImage::ImageRgb8(buffer))
}

fn encode_png(image: DynamicImage) -> Result<Vec<u8>, image::ImageError> {
    let mut bytes = Vec::new();
    image.write_to(&mut Cursor::new(&mut bytes), ImageOutputFormat::Png)?;
    Ok(bytes)
}

fn print_error_sources(mut error: &(dyn Error + 'static)) {
    while let Some(source) = error.source() {
        eprintln!("  caused by: {}", source);
        error = source;
    }
}
