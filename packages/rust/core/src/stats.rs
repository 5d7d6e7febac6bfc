//! Summary counters over a distilled bookmark collection.

use std::path::Path;

use serde::Serialize;
use tracing::instrument;

use bookmarkprep_artifacts::read_records;
use bookmarkprep_shared::{CanonicalBookmark, MediaType, Result};

/// Counts describing a canonical collection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CollectionStats {
    pub total: usize,
    pub images: usize,
    pub videos: usize,
    pub text_only: usize,
    /// Records carrying extended note text.
    pub with_note: usize,
    pub with_video_url: usize,
    /// Records a downstream pass has already assigned a primary category.
    pub categorized: usize,
    pub earliest_bookmark: Option<String>,
    pub latest_bookmark: Option<String>,
}

/// Tally a collection in one pass.
///
/// Bookmark dates are compared as strings, which orders `YYYY-MM-DD`
/// prefixes chronologically.
pub fn collection_stats(records: &[CanonicalBookmark]) -> CollectionStats {
    let mut stats = CollectionStats {
        total: records.len(),
        ..CollectionStats::default()
    };

    for record in records {
        match record.media_type {
            MediaType::Image => stats.images += 1,
            MediaType::Video => stats.videos += 1,
            MediaType::None => stats.text_only += 1,
        }
        if !record.note_tweet_text.is_empty() {
            stats.with_note += 1;
        }
        if record.video_url.is_some() {
            stats.with_video_url += 1;
        }
        if record.primary_category.is_some() {
            stats.categorized += 1;
        }
        if let Some(date) = &record.bookmark_date {
            if stats.earliest_bookmark.as_ref().is_none_or(|d| date < d) {
                stats.earliest_bookmark = Some(date.clone());
            }
            if stats.latest_bookmark.as_ref().is_none_or(|d| date > d) {
                stats.latest_bookmark = Some(date.clone());
            }
        }
    }

    stats
}

/// Read a distilled collection from `path` and tally it.
#[instrument(skip_all, fields(path = %path.display()))]
pub fn load_stats(path: &Path) -> Result<CollectionStats> {
    let records: Vec<CanonicalBookmark> = read_records(path)?;
    Ok(collection_stats(&records))
}
