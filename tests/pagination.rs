use photo_report::layout::{
    paginate, Column, ReportLayout, TextMeasure, CONTENT_TOP_MM, PAGE_BOTTOM_THRESHOLD_MM,
    ROW_ADVANCE_MM, TITLE_ADVANCE_MM,
};
use photo_report::model::{MetadataField, ReportMetadata};

/// Narrow enough that no test string wraps.
struct NarrowGlyphs;

impl TextMeasure for NarrowGlyphs {
    fn text_width(&self, text: &str, _font_size: u8) -> f64 {
        text.chars().count() as f64
    }
}

fn captions(count: usize) -> Vec<String> {
    (0..count).map(|i| format!("Cell {}", i + 1)).collect()
}

fn metadata_with(fields: usize) -> ReportMetadata {
    MetadataField::ALL
        .iter()
        .take(fields)
        .fold(ReportMetadata::new(), |metadata, &field| {
            metadata.with(field, "value")
        })
}

/// Counts pages by replaying the column toggle and row advance rule on plain numbers.
fn expected_pages(photos: usize, metadata_fields: usize) -> usize {
    let mut y = CONTENT_TOP_MM + metadata_fields as f64 * 8.0 + 2.0 * TITLE_ADVANCE_MM;
    let mut left = true;
    let mut pages = 1;
    for placed in 1..=photos {
        if left {
            left = false;
        } else {
            left = true;
            y += ROW_ADVANCE_MM;
        }
        if y > PAGE_BOTTOM_THRESHOLD_MM && placed < photos {
            pages += 1;
            y = CONTENT_TOP_MM + TITLE_ADVANCE_MM;
            left = true;
        }
    }
    pages
}

fn assert_every_photo_placed_once_in_order(layout: &ReportLayout, photos: usize) {
    let placed: Vec<usize> = layout
        .pages()
        .iter()
        .flat_map(|page| page.photos().map(|(index, _, _)| index))
        .collect();
    assert_eq!(placed, (0..photos).collect::<Vec<_>>());
}

#[test]
fn page_count_follows_the_toggle_rule() {
    for fields in 0..=MetadataField::ALL.len() {
        let metadata = metadata_with(fields);
        for photos in 0..=18 {
            let layout = paginate(&metadata, &captions(photos), &NarrowGlyphs);
            assert_eq!(
                layout.page_count(),
                expected_pages(photos, fields),
                "{photos} photos with {fields} metadata fields"
            );
            assert_every_photo_placed_once_in_order(&layout, photos);
        }
    }
}

#[test]
fn four_photos_fit_on_one_page_without_metadata() {
    let layout = paginate(&ReportMetadata::new(), &captions(4), &NarrowGlyphs);
    assert_eq!(layout.page_count(), 1);
}

#[test]
fn eighteen_photos_with_full_metadata_take_four_pages() {
    let layout = paginate(&metadata_with(6), &captions(18), &NarrowGlyphs);
    let per_page: Vec<usize> = layout.pages().iter().map(|p| p.photos().count()).collect();
    assert_eq!(per_page, vec![4, 6, 6, 2]);
}

#[test]
fn only_the_first_page_carries_metadata() {
    let layout = paginate(&metadata_with(6), &captions(18), &NarrowGlyphs);
    let (first, rest) = layout.pages().split_first().expect("at least one page");
    assert_eq!(first.metadata_lines().len(), 6);
    for page in rest {
        assert!(page.metadata_lines().is_empty());
        assert_eq!(page.title_baseline(), Some(CONTENT_TOP_MM));
    }
}

#[test]
fn every_page_starts_its_grid_in_column_a() {
    let layout = paginate(&metadata_with(3), &captions(18), &NarrowGlyphs);
    for page in layout.pages() {
        let first = page.photos().next().expect("each page holds photos");
        assert_eq!(first.1, Column::A);
    }
}

#[test]
fn metadata_lines_use_label_value_format() {
    let metadata = ReportMetadata::new()
        .with(MetadataField::SubjectReference, "Leak")
        .with(MetadataField::InvolvedParties, "Water utility")
        .with(MetadataField::ReportNumber, "12/2024");
    let layout = paginate::<String>(&metadata, &[], &NarrowGlyphs);
    assert_eq!(
        layout.pages()[0].metadata_lines(),
        vec![
            "Report No.: 12/2024",
            "Involved Parties: Water utility",
            "Reference / Subject: Leak",
        ]
    );
}
