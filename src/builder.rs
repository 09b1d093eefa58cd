//! Report construction on top of `genpdf`.
//!
//! [`ReportBuilder`] collects the metadata, photos and configuration of a report
//! and renders them in one go. Static assets are loaded once per call and cached
//! in the page decorator, which paints the watermark, the header band and the
//! divider on every page before the body is drawn.

use std::cell::Cell;
use std::fs;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use genpdf::elements::Image;
use genpdf::error::Error;
use genpdf::style::{self, Color};
use genpdf::{PageDecorator, PaperSize, Position};
use log::{debug, info};

use crate::assets::{self, AssetStore};
use crate::config::ReportConfig;
use crate::elements::{draw_image_at, fitted_image, mm_from_f64, ReportPages};
use crate::error::ReportError;
use crate::fonts;
use crate::layout::{self, Point, REPORT_TITLE};
use crate::model::{MetadataField, PhotoSet, ReportMetadata};

const DIVIDER_GREY: u8 = 200;

/// A fully rendered report.
#[derive(Clone, Debug)]
pub struct RenderedReport {
    /// PDF bytes.
    pub bytes: Vec<u8>,
    /// Number of pages in the document.
    pub page_count: usize,
    /// File name the report should be saved under.
    pub file_name: String,
}

impl RenderedReport {
    /// Writes the document into `directory` and returns the full path.
    pub fn save(&self, directory: impl AsRef<Path>) -> Result<PathBuf, ReportError> {
        let path = directory.as_ref().join(&self.file_name);
        fs::write(&path, &self.bytes)?;
        info!("Saved {} ({} bytes)", path.display(), self.bytes.len());
        Ok(path)
    }
}

/// Builder for photographic reports.
#[derive(Clone, Debug, Default)]
pub struct ReportBuilder {
    metadata: ReportMetadata,
    photos: PhotoSet,
    config: ReportConfig,
}

impl ReportBuilder {
    /// Creates a builder with no photos, empty metadata and default configuration.
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets the metadata block printed on the first page.
    pub fn with_metadata(mut self, metadata: ReportMetadata) -> Self {
        self.metadata = metadata;
        self
    }

    /// Sets the photos, in the order they are placed.
    pub fn with_photos(mut self, photos: PhotoSet) -> Self {
        self.photos = photos;
        self
    }

    /// Sets the generation parameters.
    pub fn with_config(mut self, config: ReportConfig) -> Self {
        self.config = config;
        self
    }

    /// Document title stored in the PDF metadata.
    fn document_title(&self) -> String {
        match self.metadata.get(MetadataField::ReportNumber) {
            Some(number) => format!("{} {}", REPORT_TITLE, number),
            None => REPORT_TITLE.to_owned(),
        }
    }

    /// Renders the report into memory.
    ///
    /// Any asset, photo or font failure aborts the whole render; nothing is
    /// returned for a partially built document.
    ///
    /// Photos are embedded as decoded pixels, so the JPEG quality only affects
    /// re-encode artefacts; the PDF shrinks through downscaling and the
    /// `compress` feature.
    pub fn render(&self, assets: &dyn AssetStore) -> Result<RenderedReport, ReportError> {
        self.config.validate()?;

        let header = assets::load_static_image(assets, &self.config.header_asset)?;
        let watermark = assets::load_static_image(assets, &self.config.watermark_asset)?;
        let watermark = assets::lighten_image(&watermark, self.config.watermark_opacity)?;

        let compressed = assets::compress_photos(self.photos.entries(), self.config.compression)?;
        let decoded = compressed
            .iter()
            .enumerate()
            .map(|(index, encoded)| {
                encoded
                    .decode()
                    .map_err(|err| ReportError::image_processing(index, err))
            })
            .collect::<Result<Vec<_>, _>>()?;
        let photos = ReportPages::prepare_photos(decoded).map_err(ReportError::Render)?;

        let header_frame = layout::header_frame();
        let watermark_frame = layout::watermark_frame();
        let header = fitted_image(
            assets::flatten_onto_white(&header),
            header_frame.width,
            header_frame.height,
        )
        .map_err(ReportError::Render)?;
        let watermark = fitted_image(
            assets::flatten_onto_white(&watermark),
            watermark_frame.width,
            watermark_frame.height,
        )
        .map_err(ReportError::Render)?;

        let font_family = fonts::default_font_family().map_err(ReportError::FontLoad)?;
        let mut document = genpdf::Document::new(font_family);
        document.set_title(self.document_title());
        document.set_paper_size(PaperSize::A4);

        let pages = Rc::new(Cell::new(0));
        document.set_page_decorator(LetterheadDecorator::new(header, watermark, Rc::clone(&pages)));
        document.push(ReportPages::new(
            self.metadata.clone(),
            self.photos.captions(),
            photos,
        ));

        let mut bytes = Vec::new();
        document.render(&mut bytes).map_err(ReportError::Render)?;

        #[cfg(feature = "compress")]
        let bytes = crate::compress::compress_pdf(bytes)?;

        info!(
            "Rendered report with {} photos on {} pages ({} bytes)",
            self.photos.len(),
            pages.get(),
            bytes.len()
        );

        Ok(RenderedReport {
            bytes,
            page_count: pages.get(),
            file_name: self.config.output_file_name.clone(),
        })
    }
}

fn position(point: Point) -> Position {
    Position::new(mm_from_f64(point.x), mm_from_f64(point.y))
}

/// Paints the watermark, header band and divider on every page and hands the
/// untouched page area to the body.
struct LetterheadDecorator {
    header: Image,
    watermark: Image,
    pages: Rc<Cell<usize>>,
}

impl LetterheadDecorator {
    fn new(header: Image, watermark: Image, pages: Rc<Cell<usize>>) -> Self {
        Self {
            header,
            watermark,
            pages,
        }
    }
}

impl PageDecorator for LetterheadDecorator {
    fn decorate_page<'a>(
        &mut self,
        context: &genpdf::Context,
        area: genpdf::render::Area<'a>,
        style: style::Style,
    ) -> Result<genpdf::render::Area<'a>, Error> {
        self.pages.set(self.pages.get() + 1);
        debug!("Decorating page {}", self.pages.get());

        draw_image_at(
            &mut self.watermark,
            context,
            &area,
            layout::watermark_frame(),
            style,
        )?;
        draw_image_at(&mut self.header, context, &area, layout::header_frame(), style)?;

        let (start, end) = layout::divider_line();
        area.draw_line(
            vec![position(start), position(end)],
            style::Style::new().with_color(Color::Greyscale(DIVIDER_GREY)),
        );

        Ok(area)
    }
}
