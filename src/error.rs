//! Error type shared by asset preparation, rendering and the report session.

use std::fmt;

/// Errors that can abort the generation of a photographic report.
///
/// Every variant aborts the whole generation; no partial document is written.
#[derive(Debug)]
pub enum ReportError {
    /// A static asset (header band or watermark) could not be fetched or decoded.
    AssetLoad {
        /// Path of the asset inside the asset store.
        path: String,
        /// Underlying fetch or decode failure.
        source: Box<dyn std::error::Error + Send + Sync + 'static>,
    },
    /// A user photo could not be decoded or re-encoded.
    ImageProcessing {
        /// Position of the photo in upload order.
        index: usize,
        /// Underlying image failure.
        source: image::ImageError,
    },
    /// A configuration value is outside its accepted range.
    InvalidOption {
        /// Name of the offending option.
        name: &'static str,
        /// Rendered value that was rejected.
        value: String,
    },
    /// A caption was addressed to a photo that is not part of the current batch.
    NoSuchPhoto {
        /// Requested position.
        index: usize,
    },
    /// No usable font family could be loaded.
    FontLoad(genpdf::error::Error),
    /// The PDF backend failed while laying out or writing the document.
    Render(genpdf::error::Error),
    /// Writing the finished document failed.
    Io(std::io::Error),
    /// Post-processing the rendered PDF failed.
    #[cfg(feature = "compress")]
    Compress(lopdf::Error),
}

impl ReportError {
    pub(crate) fn asset_load(
        path: impl Into<String>,
        source: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
    ) -> Self {
        Self::AssetLoad {
            path: path.into(),
            source: source.into(),
        }
    }

    pub(crate) fn image_processing(index: usize, source: image::ImageError) -> Self {
        Self::ImageProcessing { index, source }
    }

    pub(crate) fn invalid_option(name: &'static str, value: impl fmt::Display) -> Self {
        Self::InvalidOption {
            name,
            value: value.to_string(),
        }
    }
}

impl From<std::io::Error> for ReportError {
    fn from(err: std::io::Error) -> Self {
        Self::Io(err)
    }
}

#[cfg(feature = "compress")]
impl From<lopdf::Error> for ReportError {
    fn from(err: lopdf::Error) -> Self {
        Self::Compress(err)
    }
}

impl fmt::Display for ReportError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::AssetLoad { path, .. } => write!(f, "Failed to load static asset '{path}'"),
            Self::ImageProcessing { index, .. } => {
                write!(f, "Failed to process photo #{}", index + 1)
            }
            Self::InvalidOption { name, value } => {
                write!(f, "Invalid value '{value}' for option '{name}'")
            }
            Self::NoSuchPhoto { index } => {
                write!(f, "Photo #{} is not part of the current batch", index + 1)
            }
            Self::FontLoad(err) => write!(f, "Failed to load fonts: {err}"),
            Self::Render(err) => write!(f, "Failed to render PDF: {err}"),
            Self::Io(err) => write!(f, "Failed to write report: {err}"),
            #[cfg(feature = "compress")]
            Self::Compress(err) => write!(f, "Failed to compress PDF streams: {err}"),
        }
    }
}

impl std::error::Error for ReportError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::AssetLoad { source, .. } => Some(source.as_ref()),
            Self::ImageProcessing { source, .. } => Some(source),
            Self::FontLoad(err) | Self::Render(err) => Some(err),
            Self::Io(err) => Some(err),
            #[cfg(feature = "compress")]
            Self::Compress(err) => Some(err),
            Self::InvalidOption { .. } | Self::NoSuchPhoto { .. } => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ReportError;
    use std::error::Error as _;
    use std::io;

    #[test]
    fn asset_errors_expose_their_cause() {
        let err = ReportError::asset_load(
            "assets/header.png",
            io::Error::new(io::ErrorKind::NotFound, "missing"),
        );
        assert_eq!(err.to_string(), "Failed to load static asset 'assets/header.png'");
        assert_eq!(err.source().map(|s| s.to_string()).as_deref(), Some("missing"));
    }

    #[test]
    fn photo_indices_are_reported_one_based() {
        let err = ReportError::NoSuchPhoto { index: 0 };
        assert!(err.to_string().contains("#1"));
    }
}
