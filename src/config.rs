//! Tunable parameters for report generation.

use std::env;
use std::str::FromStr;

use log::warn;

use crate::error::ReportError;

/// Default maximum photo width, in pixels, after compression.
pub const DEFAULT_MAX_WIDTH: u32 = 900;

/// Default lossy encoding quality for compressed photos.
pub const DEFAULT_QUALITY: f32 = 0.72;

/// Default opacity applied to the watermark asset.
pub const DEFAULT_WATERMARK_OPACITY: f32 = 0.15;

/// Default location of the header band inside the asset store.
pub const DEFAULT_HEADER_ASSET: &str = "assets/header.png";

/// Default location of the watermark inside the asset store.
pub const DEFAULT_WATERMARK_ASSET: &str = "assets/watermark.png";

/// Name of the generated document.
pub const DEFAULT_OUTPUT_FILE_NAME: &str = "relatorio-fotografico.pdf";

/// Downscaling and re-encoding parameters applied to every photo.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CompressionOptions {
    /// Photos wider than this are scaled down to exactly this width.
    pub max_width: u32,
    /// Lossy encoding quality in `(0, 1]`.
    pub quality: f32,
}

impl Default for CompressionOptions {
    fn default() -> Self {
        Self {
            max_width: DEFAULT_MAX_WIDTH,
            quality: DEFAULT_QUALITY,
        }
    }
}

impl CompressionOptions {
    /// Checks that both values are usable.
    pub fn validate(&self) -> Result<(), ReportError> {
        if self.max_width == 0 {
            return Err(ReportError::invalid_option("max_width", self.max_width));
        }
        if !(self.quality > 0.0 && self.quality <= 1.0) {
            return Err(ReportError::invalid_option("quality", self.quality));
        }
        Ok(())
    }
}

/// Configuration of a report generation run.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportConfig {
    /// Photo compression parameters.
    pub compression: CompressionOptions,
    /// Opacity of the watermark in `(0, 1]`.
    pub watermark_opacity: f32,
    /// Header band location inside the asset store.
    pub header_asset: String,
    /// Watermark location inside the asset store.
    pub watermark_asset: String,
    /// File name of the generated document.
    pub output_file_name: String,
}

impl Default for ReportConfig {
    fn default() -> Self {
        Self {
            compression: CompressionOptions::default(),
            watermark_opacity: DEFAULT_WATERMARK_OPACITY,
            header_asset: DEFAULT_HEADER_ASSET.to_owned(),
            watermark_asset: DEFAULT_WATERMARK_ASSET.to_owned(),
            output_file_name: DEFAULT_OUTPUT_FILE_NAME.to_owned(),
        }
    }
}

impl ReportConfig {
    /// Returns the defaults with overrides from `PHOTO_REPORT_MAX_WIDTH`,
    /// `PHOTO_REPORT_QUALITY` and `PHOTO_REPORT_WATERMARK_OPACITY` applied.
    ///
    /// Values that fail to parse are ignored with a warning.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Some(max_width) = env_value("PHOTO_REPORT_MAX_WIDTH") {
            config.compression.max_width = max_width;
        }
        if let Some(quality) = env_value("PHOTO_REPORT_QUALITY") {
            config.compression.quality = quality;
        }
        if let Some(opacity) = env_value("PHOTO_REPORT_WATERMARK_OPACITY") {
            config.watermark_opacity = opacity;
        }
        config
    }

    /// Checks every numeric option against its accepted range.
    pub fn validate(&self) -> Result<(), ReportError> {
        self.compression.validate()?;
        if !(self.watermark_opacity > 0.0 && self.watermark_opacity <= 1.0) {
            return Err(ReportError::invalid_option(
                "watermark_opacity",
                self.watermark_opacity,
            ));
        }
        Ok(())
    }

    /// Sets the compression parameters and returns the updated configuration.
    pub fn with_compression(mut self, compression: CompressionOptions) -> Self {
        self.compression = compression;
        self
    }

    /// Sets the watermark opacity and returns the updated configuration.
    pub fn with_watermark_opacity(mut self, opacity: f32) -> Self {
        self.watermark_opacity = opacity;
        self
    }
}

fn env_value<T: FromStr>(var: &str) -> Option<T> {
    let raw = env::var(var).ok()?;
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return None;
    }
    match trimmed.parse() {
        Ok(value) => Some(value),
        Err(_) => {
            warn!("Ignoring {}={:?}: not a valid value", var, raw);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{CompressionOptions, ReportConfig};
    use crate::error::ReportError;

    #[test]
    fn defaults_are_valid() {
        let config = ReportConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.compression.max_width, 900);
        assert_eq!(config.output_file_name, "relatorio-fotografico.pdf");
    }

    #[test]
    fn out_of_range_values_are_rejected() {
        let zero_quality = ReportConfig::default().with_compression(CompressionOptions {
            max_width: 900,
            quality: 0.0,
        });
        assert!(matches!(
            zero_quality.validate(),
            Err(ReportError::InvalidOption { name: "quality", .. })
        ));

        let opaque = ReportConfig::default().with_watermark_opacity(1.5);
        assert!(matches!(
            opaque.validate(),
            Err(ReportError::InvalidOption {
                name: "watermark_opacity",
                ..
            })
        ));
    }
}
