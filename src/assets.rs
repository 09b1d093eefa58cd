//! Static asset loading and photo preparation.
//!
//! Everything here is a pure transformation over [`image`] buffers: no function
//! mutates its input and every call is independent of the others, so photos can
//! be compressed in parallel (see the `parallel` feature) while the final
//! document still consumes them in upload order.

use std::collections::HashMap;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use image::codecs::jpeg::JpegEncoder;
use image::imageops::FilterType;
use image::{ColorType, DynamicImage, GenericImageView, Rgb, RgbImage, Rgba, RgbaImage};
use log::debug;

use crate::config::CompressionOptions;
use crate::error::ReportError;
use crate::model::PhotoEntry;

/// Source of the fixed raster assets (header band and watermark).
pub trait AssetStore {
    /// Returns the raw bytes stored at `path`.
    fn fetch(&self, path: &str) -> io::Result<Vec<u8>>;
}

/// Asset store backed by a directory on disk.
#[derive(Clone, Debug)]
pub struct DirAssetStore {
    root: PathBuf,
}

impl DirAssetStore {
    /// Resolves asset paths relative to `root`.
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    /// Returns the directory assets are resolved against.
    pub fn root(&self) -> &Path {
        &self.root
    }
}

impl AssetStore for DirAssetStore {
    fn fetch(&self, path: &str) -> io::Result<Vec<u8>> {
        fs::read(self.root.join(path))
    }
}

/// Asset store holding its files in memory.
#[derive(Clone, Debug, Default)]
pub struct MemoryAssetStore {
    files: HashMap<String, Vec<u8>>,
}

impl MemoryAssetStore {
    /// Creates an empty store.
    pub fn new() -> Self {
        Self::default()
    }

    /// Stores `bytes` under `path`, replacing any previous content.
    pub fn insert(&mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) {
        self.files.insert(path.into(), bytes.into());
    }

    /// Stores `bytes` under `path` and returns the updated store.
    pub fn with_file(mut self, path: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        self.insert(path, bytes);
        self
    }
}

impl AssetStore for MemoryAssetStore {
    fn fetch(&self, path: &str) -> io::Result<Vec<u8>> {
        self.files.get(path).cloned().ok_or_else(|| {
            io::Error::new(
                io::ErrorKind::NotFound,
                format!("no asset stored under '{path}'"),
            )
        })
    }
}

/// A photo after downscaling and lossy re-encoding.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct EncodedImage {
    /// JPEG encoded bytes.
    pub bytes: Vec<u8>,
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels.
    pub height: u32,
}

impl EncodedImage {
    /// Decodes the JPEG bytes back into a pixel buffer.
    pub fn decode(&self) -> image::ImageResult<DynamicImage> {
        image::load_from_memory(&self.bytes)
    }
}

/// Fetches and decodes one of the fixed raster assets.
pub fn load_static_image(store: &dyn AssetStore, path: &str) -> Result<DynamicImage, ReportError> {
    let bytes = store
        .fetch(path)
        .map_err(|err| ReportError::asset_load(path, err))?;
    let image = image::load_from_memory(&bytes).map_err(|err| ReportError::asset_load(path, err))?;
    debug!(
        "Loaded static asset {} ({}x{})",
        path,
        image.width(),
        image.height()
    );
    Ok(image)
}

/// Returns a copy of `image` whose alpha channel is scaled by `opacity`.
///
/// A fully opaque source ends up with a uniform alpha of `opacity`. The result
/// keeps the colour channels untouched so it can be composited later.
pub fn lighten_image(image: &DynamicImage, opacity: f32) -> Result<DynamicImage, ReportError> {
    if !(opacity > 0.0 && opacity <= 1.0) {
        return Err(ReportError::invalid_option("opacity", opacity));
    }

    let mut rgba = image.to_rgba8();
    for pixel in rgba.pixels_mut() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = (f32::from(a) * opacity).round().clamp(0.0, 255.0) as u8;
        *pixel = Rgba([r, g, b, alpha]);
    }
    Ok(DynamicImage::ImageRgba8(rgba))
}

/// Composites `image` over a white background and drops the alpha channel.
///
/// The PDF backend only embeds opaque colour data, so transparent assets are
/// flattened before they are placed on a page.
pub fn flatten_onto_white(image: &DynamicImage) -> DynamicImage {
    let rgba: RgbaImage = image.to_rgba8();
    let (width, height) = rgba.dimensions();
    let mut rgb = RgbImage::new(width, height);
    for (x, y, pixel) in rgba.enumerate_pixels() {
        let Rgba([r, g, b, a]) = *pixel;
        let alpha = f32::from(a) / 255.0;
        let blend = |channel: u8| -> u8 {
            (f32::from(channel) * alpha + 255.0 * (1.0 - alpha))
                .round()
                .clamp(0.0, 255.0) as u8
        };
        rgb.put_pixel(x, y, Rgb([blend(r), blend(g), blend(b)]));
    }
    DynamicImage::ImageRgb8(rgb)
}

/// Computes the compressed dimensions for an image of `width` x `height`.
///
/// Only images wider than `max_width` are scaled; the width then becomes exactly
/// `max_width` and the height is scaled by the same factor, truncated.
pub fn target_dimensions(width: u32, height: u32, max_width: u32) -> (u32, u32) {
    if width <= max_width {
        return (width, height);
    }
    let scaled_height = u64::from(height) * u64::from(max_width) / u64::from(width);
    (max_width, scaled_height.max(1) as u32)
}

fn quality_percent(quality: f32) -> u8 {
    (quality * 100.0).round().clamp(1.0, 100.0) as u8
}

/// Downscales `image` to at most `max_width` pixels and re-encodes it as JPEG.
///
/// `quality` is expressed in `(0, 1]`. Transparent pixels are composited over
/// white since JPEG has no alpha channel.
pub fn compress_photo(
    image: &DynamicImage,
    max_width: u32,
    quality: f32,
) -> Result<EncodedImage, ReportError> {
    CompressionOptions { max_width, quality }.validate()?;

    let (width, height) = image.dimensions();
    let (target_width, target_height) = target_dimensions(width, height, max_width);

    let flattened = flatten_onto_white(image);
    let resized = if (target_width, target_height) == (width, height) {
        flattened
    } else {
        flattened.resize_exact(target_width, target_height, FilterType::Triangle)
    };
    let rgb = resized.to_rgb8();

    let mut bytes = Vec::new();
    JpegEncoder::new_with_quality(&mut bytes, quality_percent(quality))
        .encode(rgb.as_raw(), target_width, target_height, ColorType::Rgb8)
        .map_err(|err| ReportError::image_processing(0, err))?;

    Ok(EncodedImage {
        bytes,
        width: target_width,
        height: target_height,
    })
}

fn prepare_photo(
    index: usize,
    entry: &PhotoEntry,
    options: CompressionOptions,
) -> Result<EncodedImage, ReportError> {
    let decoded = image::load_from_memory(entry.bytes())
        .map_err(|err| ReportError::image_processing(index, err))?;
    let encoded = compress_photo(&decoded, options.max_width, options.quality).map_err(
        |err| match err {
            ReportError::ImageProcessing { source, .. } => {
                ReportError::image_processing(index, source)
            }
            other => other,
        },
    )?;
    debug!(
        "Compressed photo #{} to {}x{} ({} bytes)",
        index + 1,
        encoded.width,
        encoded.height,
        encoded.bytes.len()
    );
    Ok(encoded)
}

/// Decodes and compresses every photo, returning the results in upload order.
///
/// The first failure aborts the whole batch.
#[cfg(not(feature = "parallel"))]
pub fn compress_photos(
    photos: &[PhotoEntry],
    options: CompressionOptions,
) -> Result<Vec<EncodedImage>, ReportError> {
    options.validate()?;
    photos
        .iter()
        .enumerate()
        .map(|(index, entry)| prepare_photo(index, entry, options))
        .collect()
}

/// Decodes and compresses every photo on the rayon pool, returning the results
/// in upload order.
///
/// The first failure aborts the whole batch.
#[cfg(feature = "parallel")]
pub fn compress_photos(
    photos: &[PhotoEntry],
    options: CompressionOptions,
) -> Result<Vec<EncodedImage>, ReportError> {
    use rayon::prelude::*;

    options.validate()?;
    photos
        .par_iter()
        .enumerate()
        .map(|(index, entry)| prepare_photo(index, entry, options))
        .collect()
}
