//! Client-side gallery view pipeline.
//!
//! Given the records fetched for a user and the gallery controls, produce
//! what should be rendered: sort by upload time, narrow by a free-text
//! query, optionally keep only duplicates, optionally partition by primary
//! tag. The pipeline is pure and synchronous; fetching and URL resolution
//! live in `services::gallery_service`.

use crate::models::image::ImageRecord;
use serde::Serialize;
use std::collections::HashMap;

/// Ordering of records by upload timestamp.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub enum SortOrder {
    /// Most recent uploads first.
    #[default]
    Newest,
    /// Oldest uploads first.
    Oldest,
}

/// The gallery controls, as toggled in the UI.
#[derive(Debug, Clone, Default)]
pub struct GalleryQuery {
    pub sort_order: SortOrder,
    /// Free-text query matched case-insensitively against filename and tags.
    pub search_query: String,
    /// Keep only records sharing a filename (+ size, when known) with
    /// another record in the filtered set.
    pub duplicates_only: bool,
    /// Partition the result by primary tag.
    pub group_by_tag: bool,
}

/// One primary-tag partition of a grouped view.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct TagGroup {
    pub tag: String,
    pub records: Vec<ImageRecord>,
}

/// What the gallery should render.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub enum GalleryView {
    Flat(Vec<ImageRecord>),
    Grouped(Vec<TagGroup>),
}

impl GalleryView {
    /// True when nothing survived the pipeline ("empty result" state).
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Number of records across the whole view.
    pub fn len(&self) -> usize {
        match self {
            GalleryView::Flat(records) => records.len(),
            GalleryView::Grouped(groups) => groups.iter().map(|g| g.records.len()).sum(),
        }
    }

    /// Records in render order, ignoring partition boundaries.
    pub fn records(&self) -> Vec<&ImageRecord> {
        match self {
            GalleryView::Flat(records) => records.iter().collect(),
            GalleryView::Grouped(groups) => {
                groups.iter().flat_map(|g| g.records.iter()).collect()
            }
        }
    }
}

/// Run the full pipeline: sort, search-filter, then either the duplicate
/// filter or tag grouping.
///
/// Duplicate filter and grouping do not compose: when both are toggled the
/// duplicate filter wins and the result stays flat. That mirrors the
/// shipped toggle behavior and is kept as an open product question rather
/// than silently changed.
pub fn build_view(records: &[ImageRecord], query: &GalleryQuery) -> GalleryView {
    let mut rows: Vec<ImageRecord> = records.to_vec();

    // Stable sort, so same-instant uploads keep their fetched order.
    rows.sort_by(|a, b| match query.sort_order {
        SortOrder::Newest => b.upload_timestamp().cmp(&a.upload_timestamp()),
        SortOrder::Oldest => a.upload_timestamp().cmp(&b.upload_timestamp()),
    });

    let needle = query.search_query.trim().to_lowercase();
    if !needle.is_empty() {
        rows.retain(|record| matches_query(record, &needle));
    }

    if query.duplicates_only {
        let mut occurrences: HashMap<String, usize> = HashMap::new();
        for record in &rows {
            *occurrences.entry(duplicate_key(record)).or_default() += 1;
        }
        rows.retain(|record| occurrences[&duplicate_key(record)] > 1);
        return GalleryView::Flat(rows);
    }

    if query.group_by_tag {
        let mut slots: HashMap<String, usize> = HashMap::new();
        let mut groups: Vec<TagGroup> = Vec::new();
        for record in rows {
            let tag = record.primary_tag().to_string();
            let slot = *slots.entry(tag.clone()).or_insert_with(|| {
                groups.push(TagGroup { tag, records: Vec::new() });
                groups.len() - 1
            });
            groups[slot].records.push(record);
        }
        return GalleryView::Grouped(groups);
    }

    GalleryView::Flat(rows)
}

/// Case-insensitive substring match against filename, primary tag, and
/// every secondary tag. `needle` must already be lowercased.
fn matches_query(record: &ImageRecord, needle: &str) -> bool {
    if record.original_filename.to_lowercase().contains(needle) {
        return true;
    }
    if record
        .tag
        .as_deref()
        .is_some_and(|tag| tag.to_lowercase().contains(needle))
    {
        return true;
    }
    record
        .tags
        .iter()
        .any(|tag| tag.to_lowercase().contains(needle))
}

/// Grouping key for duplicate detection: filename plus byte size when the
/// size is known, filename alone otherwise.
fn duplicate_key(record: &ImageRecord) -> String {
    match record.file_size {
        Some(size) => format!("{}:{}", record.original_filename, size),
        None => record.original_filename.clone(),
    }
}
