//! `genpdf` elements that draw a paginated report.
//!
//! [`ReportPages`] is a single element spanning the whole document: on first
//! render it measures text with the document's font cache, runs the paginator,
//! and then draws one page per call, reporting `has_more` until the last page
//! has been emitted. Coordinates from [`crate::layout`] are page-absolute, so
//! the element expects the full page area (no margins).

use image::GenericImageView;

use genpdf::elements::Image;
use genpdf::error::{Error, ErrorKind};
use genpdf::fonts::FontCache;
use genpdf::style::{Style, StyledString};
use genpdf::{render, Element, Mm, Position, RenderResult, Scale, Size};
use log::{debug, warn};

use crate::layout::{
    self, Placement, Point, Rect, ReportLayout, TextMeasure, CAPTION_FONT_SIZE,
    METADATA_FONT_SIZE, PHOTO_HEIGHT_MM, PHOTO_WIDTH_MM, TITLE_FONT_SIZE,
};
use crate::model::ReportMetadata;

const DEFAULT_IMAGE_DPI: f64 = 300.0;
const MM_PER_INCH: f64 = 25.4;

pub(crate) fn mm_from_f64(value: f64) -> Mm {
    Mm::from(printpdf::Mm(value))
}

pub(crate) fn mm_to_f64(value: Mm) -> f64 {
    let mm: printpdf::Mm = value.into();
    mm.0
}

fn estimated_image_size(image: &image::DynamicImage, dpi: f64) -> Size {
    let (px_width, px_height) = image.dimensions();
    let width_mm = MM_PER_INCH * (px_width as f64) / dpi;
    let height_mm = MM_PER_INCH * (px_height as f64) / dpi;
    Size::new(mm_from_f64(width_mm), mm_from_f64(height_mm))
}

/// Converts an opaque image into a `genpdf` image stretched to `width_mm` x `height_mm`.
///
/// The image is not cropped: like the photo cells of the report, it is scaled
/// independently on both axes to fill the box.
pub fn fitted_image(
    image: image::DynamicImage,
    width_mm: f64,
    height_mm: f64,
) -> Result<Image, Error> {
    let natural = estimated_image_size(&image, DEFAULT_IMAGE_DPI);
    let natural_width = mm_to_f64(natural.width);
    let natural_height = mm_to_f64(natural.height);
    if natural_width <= f64::EPSILON || natural_height <= f64::EPSILON {
        return Err(Error::new(
            "Cannot place an image without pixels",
            ErrorKind::InvalidData,
        ));
    }

    let mut element = Image::from_dynamic_image(image)?;
    element.set_scale(Scale::new(
        width_mm / natural_width,
        height_mm / natural_height,
    ));
    Ok(element)
}

/// Renders `image` with its top-left corner at `frame.origin`, relative to `area`.
pub(crate) fn draw_image_at(
    image: &mut Image,
    context: &genpdf::Context,
    area: &render::Area<'_>,
    frame: Rect,
    style: Style,
) -> Result<(), Error> {
    let mut image_area = area.clone();
    image_area.add_offset(Position::new(
        mm_from_f64(frame.origin.x),
        mm_from_f64(frame.origin.y),
    ));
    image.render(context, image_area, style)?;
    Ok(())
}

/// [`TextMeasure`] backed by the fonts loaded into a document.
pub struct FontCacheMeasure<'a> {
    font_cache: &'a FontCache,
    style: Style,
}

impl<'a> FontCacheMeasure<'a> {
    /// Measures text in `style`, overriding only the font size per call.
    pub fn new(font_cache: &'a FontCache, style: Style) -> Self {
        Self { font_cache, style }
    }
}

impl TextMeasure for FontCacheMeasure<'_> {
    fn text_width(&self, text: &str, font_size: u8) -> f64 {
        let string = StyledString::new(text.to_owned(), self.style.with_font_size(font_size));
        mm_to_f64(string.width(self.font_cache))
    }
}

/// Prints `lines` with the first baseline at `origin`, one line height apart.
fn print_lines(
    context: &genpdf::Context,
    area: &render::Area<'_>,
    lines: &[String],
    origin: Point,
    style: Style,
) -> Result<(), Error> {
    let ascent = mm_to_f64(
        style
            .font(&context.font_cache)
            .glyph_height(style.font_size()),
    );
    let line_height = mm_to_f64(style.line_height(&context.font_cache));

    for (row, line) in lines.iter().enumerate() {
        let top = origin.y - ascent + line_height * row as f64;
        let position = Position::new(mm_from_f64(origin.x), mm_from_f64(top));
        match area.text_section(&context.font_cache, position, style) {
            Some(mut section) => section.print_str(line, style)?,
            None => warn!("Text line {:?} at y={:.1}mm falls outside the page", line, top),
        }
    }
    Ok(())
}

/// The complete report body, rendered one page per call.
pub struct ReportPages {
    metadata: ReportMetadata,
    captions: Vec<String>,
    photos: Vec<Image>,
    layout: Option<ReportLayout>,
    next_page: usize,
}

impl ReportPages {
    /// Creates the element. `photos[i]` is the prepared image for `captions[i]`.
    pub fn new(metadata: ReportMetadata, captions: Vec<String>, photos: Vec<Image>) -> Self {
        Self {
            metadata,
            captions,
            photos,
            layout: None,
            next_page: 0,
        }
    }

    /// Prepares `genpdf` images sized to the photo cells from decoded photos.
    pub fn prepare_photos<I>(photos: I) -> Result<Vec<Image>, Error>
    where
        I: IntoIterator<Item = image::DynamicImage>,
    {
        photos
            .into_iter()
            .map(|photo| fitted_image(photo, PHOTO_WIDTH_MM, PHOTO_HEIGHT_MM))
            .collect()
    }
}

impl Element for ReportPages {
    fn render(
        &mut self,
        context: &genpdf::Context,
        area: render::Area<'_>,
        style: Style,
    ) -> Result<RenderResult, Error> {
        if self.layout.is_none() {
            let measure = FontCacheMeasure::new(&context.font_cache, style);
            let computed = layout::paginate(&self.metadata, &self.captions, &measure);
            debug!(
                "Laid out {} photos on {} pages",
                self.captions.len(),
                computed.page_count()
            );
            self.layout = Some(computed);
        }
        let Some(layout) = self.layout.as_ref() else {
            return Err(Error::new("Report layout missing", ErrorKind::InvalidData));
        };
        let Some(page) = layout.pages().get(self.next_page) else {
            return Ok(RenderResult::default());
        };

        for placement in page.placements() {
            match placement {
                Placement::Metadata { lines, origin, .. } => {
                    print_lines(
                        context,
                        &area,
                        lines,
                        *origin,
                        style.with_font_size(METADATA_FONT_SIZE),
                    )?;
                }
                Placement::Title {
                    text,
                    center_x,
                    baseline,
                } => {
                    let title_style = style.with_font_size(TITLE_FONT_SIZE);
                    let width = mm_to_f64(
                        StyledString::new(text.clone(), title_style).width(&context.font_cache),
                    );
                    let origin = Point::new(center_x - width / 2.0, *baseline);
                    print_lines(context, &area, std::slice::from_ref(text), origin, title_style)?;
                }
                Placement::Photo { index, frame, .. } => {
                    let image = self.photos.get_mut(*index).ok_or_else(|| {
                        Error::new(
                            format!("No prepared image for photo #{}", index + 1),
                            ErrorKind::InvalidData,
                        )
                    })?;
                    draw_image_at(image, context, &area, *frame, style)?;
                }
                Placement::Caption { lines, origin, .. } => {
                    print_lines(
                        context,
                        &area,
                        lines,
                        *origin,
                        style.with_font_size(CAPTION_FONT_SIZE),
                    )?;
                }
            }
        }

        self.next_page += 1;
        let mut result = RenderResult::default();
        result.size = area.size();
        result.has_more = self.next_page < layout.page_count();
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::{DynamicImage, Rgb, RgbImage, Rgba, RgbaImage};

    #[test]
    fn fitted_images_accept_opaque_sources() {
        let photo = DynamicImage::ImageRgb8(RgbImage::from_pixel(300, 200, Rgb([1, 2, 3])));
        assert!(fitted_image(photo, PHOTO_WIDTH_MM, PHOTO_HEIGHT_MM).is_ok());
    }

    #[test]
    fn empty_images_are_rejected() {
        let empty = DynamicImage::ImageRgb8(RgbImage::new(0, 0));
        assert!(fitted_image(empty, 10.0, 10.0).is_err());
    }

    #[test]
    fn flattened_watermarks_can_be_embedded() {
        let watermark = DynamicImage::ImageRgba8(RgbaImage::from_pixel(4, 4, Rgba([0, 0, 0, 255])));
        let faint = crate::assets::lighten_image(&watermark, 0.15).expect("lighten");
        let flat = crate::assets::flatten_onto_white(&faint);
        assert!(fitted_image(flat, 189.0, 237.6).is_ok());
    }

    #[test]
    fn estimated_size_uses_the_default_dpi() {
        let image = DynamicImage::ImageRgb8(RgbImage::new(300, 600));
        let size = estimated_image_size(&image, DEFAULT_IMAGE_DPI);
        assert!((mm_to_f64(size.width) - 25.4).abs() < 1e-9);
        assert!((mm_to_f64(size.height) - 50.8).abs() < 1e-9);
    }
}
