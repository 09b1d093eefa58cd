//! Data structures describing the content of a photographic report.
//!
//! The types in this module carry plain values only (encoded image bytes and
//! text) so that front ends can fill them without touching the rendering
//! crates. Layout and rendering consume them by reference.

/// Maximum number of photos accepted from a single upload batch.
pub const MAX_PHOTOS: usize = 18;

/// One uploaded photograph together with its caption.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhotoEntry {
    bytes: Vec<u8>,
    caption: String,
}

impl PhotoEntry {
    /// Creates an entry from encoded image bytes with an empty caption.
    pub fn new(bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            bytes: bytes.into(),
            caption: String::new(),
        }
    }

    /// Returns the encoded image bytes as uploaded.
    pub fn bytes(&self) -> &[u8] {
        &self.bytes
    }

    /// Returns the caption, which may be empty.
    pub fn caption(&self) -> &str {
        &self.caption
    }

    /// Replaces the caption.
    pub fn set_caption(&mut self, caption: impl Into<String>) {
        self.caption = caption.into();
    }

    /// Sets the caption and returns the updated entry.
    pub fn with_caption(mut self, caption: impl Into<String>) -> Self {
        self.set_caption(caption);
        self
    }
}

/// Ordered photos of one upload batch, capped at [`MAX_PHOTOS`].
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PhotoSet {
    entries: Vec<PhotoEntry>,
}

impl PhotoSet {
    /// Creates an empty set.
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a set from a selection, keeping the first [`MAX_PHOTOS`] entries.
    ///
    /// Anything past the cap is dropped without an error.
    pub fn from_selection<I>(selection: I) -> Self
    where
        I: IntoIterator<Item = PhotoEntry>,
    {
        Self {
            entries: selection.into_iter().take(MAX_PHOTOS).collect(),
        }
    }

    /// Returns the number of accepted photos.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Returns whether no photo was accepted.
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Returns the photos in upload order.
    pub fn entries(&self) -> &[PhotoEntry] {
        &self.entries
    }

    /// Returns a mutable handle to the photo at `index`.
    pub fn get_mut(&mut self, index: usize) -> Option<&mut PhotoEntry> {
        self.entries.get_mut(index)
    }

    /// Returns the captions in upload order.
    pub fn captions(&self) -> Vec<String> {
        self.entries
            .iter()
            .map(|entry| entry.caption.clone())
            .collect()
    }
}

impl FromIterator<PhotoEntry> for PhotoSet {
    fn from_iter<I: IntoIterator<Item = PhotoEntry>>(iter: I) -> Self {
        Self::from_selection(iter)
    }
}

/// The named metadata fields, in the order they are printed on the first page.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MetadataField {
    /// Where the inspection took place.
    Location,
    /// Report identifier.
    ReportNumber,
    /// Inspection date, free text.
    Date,
    /// Parties involved in the inspection.
    InvolvedParties,
    /// Who requested the report.
    Requester,
    /// Reference or subject line.
    SubjectReference,
}

impl MetadataField {
    /// All fields in emission order.
    pub const ALL: [MetadataField; 6] = [
        MetadataField::Location,
        MetadataField::ReportNumber,
        MetadataField::Date,
        MetadataField::InvolvedParties,
        MetadataField::Requester,
        MetadataField::SubjectReference,
    ];

    /// Label printed in front of the value.
    pub fn label(self) -> &'static str {
        match self {
            MetadataField::Location => "Location",
            MetadataField::ReportNumber => "Report No.",
            MetadataField::Date => "Date",
            MetadataField::InvolvedParties => "Involved Parties",
            MetadataField::Requester => "Requester",
            MetadataField::SubjectReference => "Reference / Subject",
        }
    }
}

/// Free-text metadata printed above the title on the first page.
///
/// Each field is independently optional. A field holding an empty string is
/// treated exactly like an absent one.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ReportMetadata {
    location: Option<String>,
    report_number: Option<String>,
    date: Option<String>,
    involved_parties: Option<String>,
    requester: Option<String>,
    subject_reference: Option<String>,
}

impl ReportMetadata {
    /// Creates metadata with every field absent.
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns the value of `field` when it is present and non-empty.
    pub fn get(&self, field: MetadataField) -> Option<&str> {
        self.slot(field).as_deref().filter(|value| !value.is_empty())
    }

    /// Sets or clears the value of `field`.
    pub fn set(&mut self, field: MetadataField, value: impl Into<Option<String>>) {
        *self.slot_mut(field) = value.into();
    }

    /// Sets `field` and returns the updated metadata.
    pub fn with(mut self, field: MetadataField, value: impl Into<String>) -> Self {
        self.set(field, Some(value.into()));
        self
    }

    /// Formats the non-empty fields as `Label: value` lines in emission order.
    pub fn lines(&self) -> Vec<(MetadataField, String)> {
        MetadataField::ALL
            .iter()
            .filter_map(|&field| {
                self.get(field)
                    .map(|value| (field, format!("{}: {}", field.label(), value)))
            })
            .collect()
    }

    fn slot(&self, field: MetadataField) -> &Option<String> {
        match field {
            MetadataField::Location => &self.location,
            MetadataField::ReportNumber => &self.report_number,
            MetadataField::Date => &self.date,
            MetadataField::InvolvedParties => &self.involved_parties,
            MetadataField::Requester => &self.requester,
            MetadataField::SubjectReference => &self.subject_reference,
        }
    }

    fn slot_mut(&mut self, field: MetadataField) -> &mut Option<String> {
        match field {
            MetadataField::Location => &mut self.location,
            MetadataField::ReportNumber => &mut self.report_number,
            MetadataField::Date => &mut self.date,
            MetadataField::InvolvedParties => &mut self.involved_parties,
            MetadataField::Requester => &mut self.requester,
            MetadataField::SubjectReference => &mut self.subject_reference,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{MetadataField, PhotoEntry, PhotoSet, ReportMetadata, MAX_PHOTOS};

    #[test]
    fn selection_is_capped() {
        for selected in [0usize, 1, 17, 18, 19, 40] {
            let set = PhotoSet::from_selection((0..selected).map(|i| PhotoEntry::new(vec![i as u8])));
            assert_eq!(set.len(), selected.min(MAX_PHOTOS));
        }
    }

    #[test]
    fn cap_keeps_the_first_photos_in_order() {
        let set: PhotoSet = (0..25u8).map(|i| PhotoEntry::new(vec![i])).collect();
        let firsts: Vec<u8> = set.entries().iter().map(|e| e.bytes()[0]).collect();
        assert_eq!(firsts, (0..18u8).collect::<Vec<_>>());
    }

    #[test]
    fn only_filled_fields_produce_lines() {
        let metadata = ReportMetadata::new()
            .with(MetadataField::Requester, "City Hall")
            .with(MetadataField::Location, "Site 1")
            .with(MetadataField::Date, "");

        let lines: Vec<String> = metadata.lines().into_iter().map(|(_, l)| l).collect();
        assert_eq!(lines, vec!["Location: Site 1", "Requester: City Hall"]);
    }

    #[test]
    fn every_field_is_emitted_in_fixed_order() {
        let metadata = MetadataField::ALL
            .iter()
            .rev()
            .fold(ReportMetadata::new(), |m, &field| m.with(field, "x"));
        let fields: Vec<MetadataField> = metadata.lines().into_iter().map(|(f, _)| f).collect();
        assert_eq!(fields, MetadataField::ALL.to_vec());
    }

    #[test]
    fn clearing_a_field_removes_its_line() {
        let mut metadata = ReportMetadata::new().with(MetadataField::ReportNumber, "007");
        metadata.set(MetadataField::ReportNumber, None);
        assert!(metadata.lines().is_empty());
    }
}
