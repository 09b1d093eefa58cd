//! Core entry point for the photo_report crate.
//!
//! A report is assembled from an ordered [`model::PhotoSet`], a
//! [`model::ReportMetadata`] block and two static assets (a header band and a
//! watermark). [`builder::ReportBuilder`] renders it to A4 PDF bytes, and
//! [`session::ReportSession`] wraps the whole flow in the upload/preview/generate
//! lifecycle used by front ends.

pub mod assets;
pub mod builder;
pub mod config;
pub mod elements;
pub mod error;
pub mod fonts;
pub mod layout;
pub mod model;
pub mod session;

#[cfg(feature = "compress")]
pub mod compress;

pub use builder::{RenderedReport, ReportBuilder};
pub use config::ReportConfig;
pub use error::ReportError;
pub use model::{MetadataField, PhotoEntry, PhotoSet, ReportMetadata};
pub use session::{ReportSession, SessionState};
