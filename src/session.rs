//! Upload, preview and generation lifecycle of one report.
//!
//! A [`ReportSession`] owns the photo batch and metadata between user actions.
//! Uploading moves it to [`SessionState::Previewing`]; generating runs the full
//! render and lands in [`SessionState::Done`] once the file is saved, or in
//! [`SessionState::Failed`] when anything goes wrong. A failed session keeps its
//! photos so the user can fix the cause and retry.

use std::path::{Path, PathBuf};

use log::{info, warn};

use crate::assets::AssetStore;
use crate::builder::ReportBuilder;
use crate::config::ReportConfig;
use crate::error::ReportError;
use crate::model::{MetadataField, PhotoEntry, PhotoSet, ReportMetadata, MAX_PHOTOS};

/// Lifecycle state of a [`ReportSession`].
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SessionState {
    /// No batch has been selected yet.
    AwaitingUpload,
    /// Photos are selected and can be captioned.
    Previewing,
    /// A document is being rendered.
    Generating,
    /// The last generation saved a document.
    Done,
    /// The last generation failed; the batch is kept for a retry.
    Failed,
}

/// Report state held between user actions.
#[derive(Debug)]
pub struct ReportSession {
    state: SessionState,
    photos: PhotoSet,
    metadata: ReportMetadata,
    config: ReportConfig,
    last_error: Option<String>,
}

impl Default for ReportSession {
    fn default() -> Self {
        Self::new(ReportConfig::default())
    }
}

impl ReportSession {
    /// Creates an empty session.
    pub fn new(config: ReportConfig) -> Self {
        Self {
            state: SessionState::AwaitingUpload,
            photos: PhotoSet::new(),
            metadata: ReportMetadata::new(),
            config,
            last_error: None,
        }
    }

    /// Current lifecycle state.
    pub fn state(&self) -> SessionState {
        self.state
    }

    /// Photos of the current batch.
    pub fn photos(&self) -> &PhotoSet {
        &self.photos
    }

    /// Metadata entered so far.
    pub fn metadata(&self) -> &ReportMetadata {
        &self.metadata
    }

    /// Message of the last failed generation, if the session is in [`SessionState::Failed`].
    pub fn last_error(&self) -> Option<&str> {
        self.last_error.as_deref()
    }

    /// Replaces the batch with a new selection and returns how many photos were kept.
    ///
    /// Photos past [`MAX_PHOTOS`] are dropped; the previous batch is discarded
    /// entirely, never merged.
    pub fn select_files<I>(&mut self, selection: I) -> usize
    where
        I: IntoIterator<Item = PhotoEntry>,
    {
        let mut selection = selection.into_iter().peekable();
        self.photos = PhotoSet::from_selection(selection.by_ref());
        if selection.peek().is_some() {
            warn!(
                "Only the first {} photos of the selection were kept",
                MAX_PHOTOS
            );
        }
        self.touch();
        self.photos.len()
    }

    /// Sets the caption of the photo at `index`.
    pub fn set_caption(&mut self, index: usize, caption: impl Into<String>) -> Result<(), ReportError> {
        let entry = self
            .photos
            .get_mut(index)
            .ok_or(ReportError::NoSuchPhoto { index })?;
        entry.set_caption(caption);
        self.touch();
        Ok(())
    }

    /// Sets or clears one metadata field.
    pub fn set_field(&mut self, field: MetadataField, value: impl Into<Option<String>>) {
        self.metadata.set(field, value);
        if self.state != SessionState::AwaitingUpload {
            self.touch();
        }
    }

    /// Renders the report and saves it into `output_dir`.
    ///
    /// The file is only written after the whole document rendered; on failure
    /// the session moves to [`SessionState::Failed`] and the error is returned.
    pub fn generate(
        &mut self,
        assets: &dyn AssetStore,
        output_dir: impl AsRef<Path>,
    ) -> Result<PathBuf, ReportError> {
        self.state = SessionState::Generating;
        self.last_error = None;

        let result = ReportBuilder::new()
            .with_metadata(self.metadata.clone())
            .with_photos(self.photos.clone())
            .with_config(self.config.clone())
            .render(assets)
            .and_then(|report| report.save(output_dir.as_ref()));

        match result {
            Ok(path) => {
                self.state = SessionState::Done;
                info!("Report generated at {}", path.display());
                Ok(path)
            }
            Err(err) => {
                warn!("Report generation failed: {}", err);
                self.state = SessionState::Failed;
                self.last_error = Some(err.to_string());
                Err(err)
            }
        }
    }

    /// Any edit after an upload, a failure or a finished document goes back to previewing.
    fn touch(&mut self) {
        self.state = SessionState::Previewing;
        self.last_error = None;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assets::MemoryAssetStore;

    fn photo(byte: u8) -> PhotoEntry {
        PhotoEntry::new(vec![byte])
    }

    #[test]
    fn upload_moves_to_previewing_and_caps_the_batch() {
        let mut session = ReportSession::default();
        assert_eq!(session.state(), SessionState::AwaitingUpload);

        let kept = session.select_files((0..30).map(photo));
        assert_eq!(kept, 18);
        assert_eq!(session.state(), SessionState::Previewing);
    }

    #[test]
    fn new_batches_replace_the_previous_one() {
        let mut session = ReportSession::default();
        session.select_files((0..5).map(photo));
        session.set_caption(4, "last").expect("caption");
        session.select_files((10..12).map(photo));

        assert_eq!(session.photos().len(), 2);
        assert_eq!(session.photos().entries()[0].bytes(), &[10]);
        assert!(session.photos().entries().iter().all(|e| e.caption().is_empty()));
    }

    #[test]
    fn captions_for_unknown_photos_are_rejected() {
        let mut session = ReportSession::default();
        session.select_files((0..2).map(photo));
        assert!(matches!(
            session.set_caption(2, "nope"),
            Err(ReportError::NoSuchPhoto { index: 2 })
        ));
    }

    #[test]
    fn metadata_edits_before_upload_keep_waiting() {
        let mut session = ReportSession::default();
        session.set_field(MetadataField::Location, Some("Site 1".to_owned()));
        assert_eq!(session.state(), SessionState::AwaitingUpload);
        assert_eq!(session.metadata().get(MetadataField::Location), Some("Site 1"));
    }

    #[test]
    fn missing_assets_fail_without_writing_a_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let mut session = ReportSession::default();
        session.select_files((0..3).map(photo));

        let err = session
            .generate(&MemoryAssetStore::new(), dir.path())
            .unwrap_err();
        assert!(matches!(err, ReportError::AssetLoad { .. }));
        assert_eq!(session.state(), SessionState::Failed);
        assert!(session.last_error().is_some());
        assert!(!dir.path().join("relatorio-fotografico.pdf").exists());

        // Editing after a failure returns to previewing so the user can retry.
        session.set_caption(0, "retry").expect("caption");
        assert_eq!(session.state(), SessionState::Previewing);
        assert_eq!(session.last_error(), None);
    }
}
