//! Pagination of the report into A4 pages.
//!
//! The paginator is independent from the PDF backend: it only needs a
//! [`TextMeasure`] to word-wrap metadata lines and captions. The output is a
//! [`ReportLayout`] listing, page by page, where every piece of content goes.
//! All coordinates are millimetres with the origin at the top-left corner of
//! the page; text positions refer to the baseline of the first line.

use log::debug;

use crate::model::{MetadataField, ReportMetadata};

/// A4 page width.
pub const PAGE_WIDTH_MM: f64 = 210.0;
/// A4 page height.
pub const PAGE_HEIGHT_MM: f64 = 297.0;
/// Left edge of the content and of grid column A.
pub const MARGIN_LEFT_MM: f64 = 14.0;
/// Vertical cursor at the top of every page, just below the header band.
pub const CONTENT_TOP_MM: f64 = 34.0;
/// Once the cursor passes this line a new page is started.
pub const PAGE_BOTTOM_THRESHOLD_MM: f64 = 250.0;

/// Horizontal offset of the header band.
pub const HEADER_X_MM: f64 = 10.0;
/// Vertical offset of the header band.
pub const HEADER_Y_MM: f64 = 4.0;
/// Height of the header band.
pub const HEADER_HEIGHT_MM: f64 = 22.0;
/// Vertical position of the divider drawn under the header band.
pub const DIVIDER_Y_MM: f64 = 28.0;

/// Maximum width of a metadata line before it wraps.
pub const METADATA_WRAP_WIDTH_MM: f64 = 182.0;
/// Cursor advance per wrapped metadata line.
pub const METADATA_LINE_ADVANCE_MM: f64 = 6.0;
/// Extra cursor advance after each metadata field.
pub const METADATA_FIELD_GAP_MM: f64 = 2.0;
/// Cursor advance before the first-page title and after every title.
pub const TITLE_ADVANCE_MM: f64 = 10.0;
/// Title printed on every page.
pub const REPORT_TITLE: &str = "PHOTOGRAPHIC REPORT";

/// Distance between the left edges of grid columns A and B.
pub const COLUMN_OFFSET_MM: f64 = 95.0;
/// Width of a photo cell; captions wrap to the same width.
pub const PHOTO_WIDTH_MM: f64 = 85.0;
/// Height of a photo cell.
pub const PHOTO_HEIGHT_MM: f64 = 64.0;
/// Distance from the top of a photo to its caption baseline.
pub const CAPTION_OFFSET_MM: f64 = 68.0;
/// Cursor advance once both columns of a row are used.
pub const ROW_ADVANCE_MM: f64 = 88.0;

/// Font size of the metadata block.
pub const METADATA_FONT_SIZE: u8 = 13;
/// Font size of the title.
pub const TITLE_FONT_SIZE: u8 = 14;
/// Font size of photo captions.
pub const CAPTION_FONT_SIZE: u8 = 12;

/// Measures rendered text so the paginator can wrap it.
pub trait TextMeasure {
    /// Returns the width of `text` at `font_size` points, in millimetres.
    fn text_width(&self, text: &str, font_size: u8) -> f64;
}

/// A point on the page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Point {
    /// Horizontal offset from the left page edge.
    pub x: f64,
    /// Vertical offset from the top page edge.
    pub y: f64,
}

impl Point {
    /// Creates a point.
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }
}

/// An axis-aligned rectangle on the page.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Rect {
    /// Top-left corner.
    pub origin: Point,
    /// Horizontal extent.
    pub width: f64,
    /// Vertical extent.
    pub height: f64,
}

impl Rect {
    /// Creates a rectangle from its top-left corner and extent.
    pub fn new(x: f64, y: f64, width: f64, height: f64) -> Self {
        Self {
            origin: Point::new(x, y),
            width,
            height,
        }
    }

    /// Returns whether the two rectangles share any interior area.
    pub fn overlaps(&self, other: &Rect) -> bool {
        self.origin.x < other.origin.x + other.width
            && other.origin.x < self.origin.x + self.width
            && self.origin.y < other.origin.y + other.height
            && other.origin.y < self.origin.y + self.height
    }
}

/// Where the header band goes on every page.
pub fn header_frame() -> Rect {
    Rect::new(
        HEADER_X_MM,
        HEADER_Y_MM,
        PAGE_WIDTH_MM - 2.0 * HEADER_X_MM,
        HEADER_HEIGHT_MM,
    )
}

/// Where the watermark goes on every page.
pub fn watermark_frame() -> Rect {
    Rect::new(
        PAGE_WIDTH_MM * 0.05,
        PAGE_HEIGHT_MM * 0.10,
        PAGE_WIDTH_MM * 0.90,
        PAGE_HEIGHT_MM * 0.80,
    )
}

/// End points of the divider under the header band.
pub fn divider_line() -> (Point, Point) {
    (
        Point::new(HEADER_X_MM, DIVIDER_Y_MM),
        Point::new(PAGE_WIDTH_MM - HEADER_X_MM, DIVIDER_Y_MM),
    )
}

/// Grid column of a photo cell.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Column {
    /// Left column.
    A,
    /// Right column.
    B,
}

impl Column {
    /// Left edge of the column.
    pub fn x(self) -> f64 {
        match self {
            Column::A => MARGIN_LEFT_MM,
            Column::B => MARGIN_LEFT_MM + COLUMN_OFFSET_MM,
        }
    }
}

/// Transient layout state while pages are being filled.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct PageCursor {
    /// Column the next photo goes into.
    pub column: Column,
    /// Vertical cursor.
    pub y: f64,
    /// Zero-based index of the current page.
    pub page: usize,
}

impl PageCursor {
    fn new() -> Self {
        Self {
            column: Column::A,
            y: CONTENT_TOP_MM,
            page: 0,
        }
    }

    fn advance(&mut self, by: f64) {
        self.y += by;
    }

    /// A -> B keeps the row; B -> A moves down one row.
    fn toggle_column(&mut self) {
        match self.column {
            Column::A => self.column = Column::B,
            Column::B => {
                self.column = Column::A;
                self.y += ROW_ADVANCE_MM;
            }
        }
    }

    fn overflowed(&self) -> bool {
        self.y > PAGE_BOTTOM_THRESHOLD_MM
    }

    fn next_page(&mut self) {
        self.page += 1;
        self.column = Column::A;
        self.y = CONTENT_TOP_MM;
    }
}

/// A piece of content positioned on a page.
#[derive(Clone, Debug, PartialEq)]
pub enum Placement {
    /// One metadata field, already formatted as `Label: value` and wrapped.
    Metadata {
        /// Field the line belongs to.
        field: MetadataField,
        /// Wrapped lines.
        lines: Vec<String>,
        /// Baseline of the first line.
        origin: Point,
    },
    /// The report title, centred on `center_x`.
    Title {
        /// Text of the title.
        text: String,
        /// Horizontal centre of the title.
        center_x: f64,
        /// Baseline.
        baseline: f64,
    },
    /// A photo cell.
    Photo {
        /// Position of the photo in upload order.
        index: usize,
        /// Column the cell was placed in.
        column: Column,
        /// Area covered by the photo.
        frame: Rect,
    },
    /// The wrapped caption under a photo. Absent for empty captions.
    Caption {
        /// Position of the photo in upload order.
        index: usize,
        /// Wrapped lines.
        lines: Vec<String>,
        /// Baseline of the first line.
        origin: Point,
    },
}

/// Content of a single page. Header band, divider and watermark are implied
/// on every page and described by [`header_frame`], [`divider_line`] and
/// [`watermark_frame`].
#[derive(Clone, Debug, Default, PartialEq)]
pub struct PageLayout {
    placements: Vec<Placement>,
}

impl PageLayout {
    /// Returns every placement in drawing order.
    pub fn placements(&self) -> &[Placement] {
        &self.placements
    }

    /// Returns the photo cells on this page as `(index, column, frame)`.
    pub fn photos(&self) -> impl Iterator<Item = (usize, Column, Rect)> + '_ {
        self.placements.iter().filter_map(|placement| match placement {
            Placement::Photo {
                index,
                column,
                frame,
            } => Some((*index, *column, *frame)),
            _ => None,
        })
    }

    /// Returns the metadata lines printed on this page.
    pub fn metadata_lines(&self) -> Vec<&str> {
        self.placements
            .iter()
            .filter_map(|placement| match placement {
                Placement::Metadata { lines, .. } => Some(lines.iter().map(String::as_str)),
                _ => None,
            })
            .flatten()
            .collect()
    }

    /// Returns the baseline of the title, if the page has one.
    pub fn title_baseline(&self) -> Option<f64> {
        self.placements.iter().find_map(|placement| match placement {
            Placement::Title { baseline, .. } => Some(*baseline),
            _ => None,
        })
    }

    fn push(&mut self, placement: Placement) {
        self.placements.push(placement);
    }
}

/// The paginated report.
#[derive(Clone, Debug, PartialEq)]
pub struct ReportLayout {
    pages: Vec<PageLayout>,
}

impl ReportLayout {
    /// Returns the pages in order. There is always at least one.
    pub fn pages(&self) -> &[PageLayout] {
        &self.pages
    }

    /// Returns the number of pages.
    pub fn page_count(&self) -> usize {
        self.pages.len()
    }

    /// Returns the zero-based page a photo was placed on.
    pub fn page_of_photo(&self, index: usize) -> Option<usize> {
        self.pages
            .iter()
            .position(|page| page.photos().any(|(photo, _, _)| photo == index))
    }
}

/// Splits `text` into lines no wider than `max_width`.
///
/// Explicit newlines always break. Words are filled greedily; a word that is
/// wider than a whole line on its own is broken between characters. Empty text
/// produces no lines at all.
pub fn wrap_text(
    measure: &dyn TextMeasure,
    text: &str,
    max_width: f64,
    font_size: u8,
) -> Vec<String> {
    if text.is_empty() {
        return Vec::new();
    }

    let mut lines = Vec::new();
    for paragraph in text.split('\n') {
        let paragraph = paragraph.strip_suffix('\r').unwrap_or(paragraph);
        let mut current = String::new();

        for word in paragraph.split(' ') {
            let candidate = if current.is_empty() {
                word.to_owned()
            } else {
                format!("{current} {word}")
            };

            if measure.text_width(&candidate, font_size) <= max_width {
                current = candidate;
                continue;
            }

            if !current.is_empty() {
                lines.push(std::mem::take(&mut current));
            }

            if measure.text_width(word, font_size) <= max_width {
                current = word.to_owned();
            } else {
                let mut pieces = split_long_word(measure, word, max_width, font_size);
                current = pieces.pop().unwrap_or_default();
                lines.extend(pieces);
            }
        }

        lines.push(current);
    }
    lines
}

fn split_long_word(
    measure: &dyn TextMeasure,
    word: &str,
    max_width: f64,
    font_size: u8,
) -> Vec<String> {
    let mut pieces = Vec::new();
    let mut current = String::new();
    for ch in word.chars() {
        current.push(ch);
        if current.chars().count() > 1 && measure.text_width(&current, font_size) > max_width {
            current.pop();
            pieces.push(std::mem::take(&mut current));
            current.push(ch);
        }
    }
    pieces.push(current);
    pieces
}

fn place_title(page: &mut PageLayout, cursor: &mut PageCursor) {
    page.push(Placement::Title {
        text: REPORT_TITLE.to_owned(),
        center_x: PAGE_WIDTH_MM / 2.0,
        baseline: cursor.y,
    });
    cursor.advance(TITLE_ADVANCE_MM);
}

/// Lays out the report.
///
/// The first page carries the metadata block and the title, followed by the
/// two-column photo grid. After every placed photo the cursor is checked
/// against [`PAGE_BOTTOM_THRESHOLD_MM`], regardless of the column the photo went
/// into; on overflow the next photo starts a fresh page at column A, under a
/// repeated title. No page is opened when no photo is left to place on it.
pub fn paginate<S: AsRef<str>>(
    metadata: &ReportMetadata,
    captions: &[S],
    measure: &dyn TextMeasure,
) -> ReportLayout {
    let mut pages = vec![PageLayout::default()];
    let mut cursor = PageCursor::new();

    for (field, text) in metadata.lines() {
        let lines = wrap_text(measure, &text, METADATA_WRAP_WIDTH_MM, METADATA_FONT_SIZE);
        let advance = lines.len() as f64 * METADATA_LINE_ADVANCE_MM + METADATA_FIELD_GAP_MM;
        pages[0].push(Placement::Metadata {
            field,
            lines,
            origin: Point::new(MARGIN_LEFT_MM, cursor.y),
        });
        cursor.advance(advance);
    }

    cursor.advance(TITLE_ADVANCE_MM);
    place_title(&mut pages[0], &mut cursor);

    for (index, caption) in captions.iter().enumerate() {
        let x = cursor.column.x();
        let page = &mut pages[cursor.page];
        page.push(Placement::Photo {
            index,
            column: cursor.column,
            frame: Rect::new(x, cursor.y, PHOTO_WIDTH_MM, PHOTO_HEIGHT_MM),
        });

        let lines = wrap_text(measure, caption.as_ref(), PHOTO_WIDTH_MM, CAPTION_FONT_SIZE);
        if !lines.is_empty() {
            page.push(Placement::Caption {
                index,
                lines,
                origin: Point::new(x, cursor.y + CAPTION_OFFSET_MM),
            });
        }

        cursor.toggle_column();

        if cursor.overflowed() && index + 1 < captions.len() {
            debug!(
                "Page {} full after photo #{}; starting a new page",
                cursor.page + 1,
                index + 1
            );
            cursor.next_page();
            pages.push(PageLayout::default());
            place_title(&mut pages[cursor.page], &mut cursor);
        }
    }

    ReportLayout { pages }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Every character is 2mm wide regardless of the font size.
    struct FixedWidth;

    impl TextMeasure for FixedWidth {
        fn text_width(&self, text: &str, _font_size: u8) -> f64 {
            text.chars().count() as f64 * 2.0
        }
    }

    fn captions(count: usize) -> Vec<String> {
        (0..count).map(|i| format!("Photo {}", i + 1)).collect()
    }

    #[test]
    fn wrap_fills_lines_greedily() {
        let lines = wrap_text(&FixedWidth, "aaa bbb ccc dddd", 16.0, 12);
        assert_eq!(lines, vec!["aaa bbb", "ccc dddd"]);
    }

    #[test]
    fn wrap_breaks_long_words() {
        let lines = wrap_text(&FixedWidth, "abcdefghij xy", 8.0, 12);
        assert_eq!(lines, vec!["abcd", "efgh", "ij", "xy"]);
    }

    #[test]
    fn wrap_honours_newlines_and_empty_text() {
        assert!(wrap_text(&FixedWidth, "", 50.0, 12).is_empty());
        assert_eq!(wrap_text(&FixedWidth, "one\ntwo", 50.0, 12), vec!["one", "two"]);
    }

    #[test]
    fn three_photo_scenario_fits_one_page() {
        let metadata = ReportMetadata::new()
            .with(MetadataField::Location, "Site 1")
            .with(MetadataField::ReportNumber, "007");
        let layout = paginate(&metadata, &["A", "B", "C"], &FixedWidth);

        assert_eq!(layout.page_count(), 1);
        let page = &layout.pages()[0];
        assert_eq!(page.metadata_lines(), vec!["Location: Site 1", "Report No.: 007"]);
        // 34 + 8 + 8 + 10
        assert_eq!(page.title_baseline(), Some(60.0));

        let photos: Vec<(usize, Column, Rect)> = page.photos().collect();
        assert_eq!(
            photos,
            vec![
                (0, Column::A, Rect::new(14.0, 70.0, 85.0, 64.0)),
                (1, Column::B, Rect::new(109.0, 70.0, 85.0, 64.0)),
                (2, Column::A, Rect::new(14.0, 158.0, 85.0, 64.0)),
            ]
        );
    }

    #[test]
    fn captions_sit_below_their_photo() {
        let layout = paginate(&ReportMetadata::new(), &["first", ""], &FixedWidth);
        let captions: Vec<&Placement> = layout.pages()[0]
            .placements()
            .iter()
            .filter(|p| matches!(p, Placement::Caption { .. }))
            .collect();
        assert_eq!(
            captions,
            vec![&Placement::Caption {
                index: 0,
                lines: vec!["first".to_owned()],
                origin: Point::new(14.0, 54.0 + 68.0),
            }]
        );
    }

    #[test]
    fn zero_photos_still_produce_the_first_page() {
        let metadata = ReportMetadata::new().with(MetadataField::Date, "2024-03-01");
        let layout = paginate::<&str>(&metadata, &[], &FixedWidth);
        assert_eq!(layout.page_count(), 1);
        assert_eq!(layout.pages()[0].metadata_lines(), vec!["Date: 2024-03-01"]);
        assert!(layout.pages()[0].title_baseline().is_some());
        assert_eq!(layout.pages()[0].photos().count(), 0);
    }

    #[test]
    fn long_metadata_wraps_and_pushes_the_cursor() {
        // 120 characters with the label, wrapped into two lines of at most 182mm.
        let value = vec!["word"; 20].join(" ");
        let metadata = ReportMetadata::new().with(MetadataField::SubjectReference, value);
        let layout = paginate::<&str>(&metadata, &[], &FixedWidth);
        let page = &layout.pages()[0];
        assert_eq!(page.metadata_lines().len(), 2);
        // 34 + (2 * 6 + 2) + 10
        assert_eq!(page.title_baseline(), Some(58.0));
    }

    #[test]
    fn continuation_pages_repeat_only_the_title() {
        let metadata = ReportMetadata::new().with(MetadataField::Location, "Depot");
        let layout = paginate(&metadata, &captions(18), &FixedWidth);
        assert!(layout.page_count() > 1);
        for page in &layout.pages()[1..] {
            assert!(page.metadata_lines().is_empty());
            assert_eq!(page.title_baseline(), Some(CONTENT_TOP_MM));
            let first = page.photos().next().expect("photo on continuation page");
            assert_eq!(first.1, Column::A);
            assert_eq!(first.2.origin.y, CONTENT_TOP_MM + TITLE_ADVANCE_MM);
        }
    }

    #[test]
    fn seventh_photo_opens_page_two_without_metadata() {
        // Rows at 54, 142 and 230; the sixth photo pushes the cursor to 318.
        let layout = paginate(&ReportMetadata::new(), &captions(7), &FixedWidth);
        assert_eq!(layout.page_count(), 2);
        assert_eq!(layout.page_of_photo(5), Some(0));
        assert_eq!(layout.page_of_photo(6), Some(1));
    }

    #[test]
    fn exactly_full_page_does_not_add_an_empty_page() {
        let layout = paginate(&ReportMetadata::new(), &captions(6), &FixedWidth);
        assert_eq!(layout.page_count(), 1);
    }

    #[test]
    fn overflow_after_column_a_leaves_column_b_empty() {
        // Enough metadata to push the title below the threshold: the first photo
        // lands in column A and the second one moves straight to a new page.
        let mut metadata = ReportMetadata::new();
        for field in MetadataField::ALL {
            metadata.set(field, Some(vec!["x"; 300].join(" ")));
        }
        let layout = paginate(&metadata, &captions(2), &FixedWidth);
        assert_eq!(layout.page_count(), 2);
        let first_page: Vec<_> = layout.pages()[0].photos().collect();
        assert_eq!(first_page.len(), 1);
        assert_eq!(first_page[0].1, Column::A);
        assert_eq!(layout.pages()[1].photos().next().map(|p| p.1), Some(Column::A));
    }

    #[test]
    fn photo_cells_never_overlap_within_a_page() {
        let layout = paginate(&ReportMetadata::new(), &captions(18), &FixedWidth);
        for page in layout.pages() {
            let frames: Vec<Rect> = page.photos().map(|(_, _, frame)| frame).collect();
            for (i, a) in frames.iter().enumerate() {
                for b in &frames[i + 1..] {
                    assert!(!a.overlaps(b), "{a:?} overlaps {b:?}");
                }
                assert!(a.origin.x + a.width <= PAGE_WIDTH_MM);
            }
        }
    }
}
