//! Field-level distillation of raw bookmark export records.
//!
//! Each [`RawBookmark`] maps to exactly one [`CanonicalBookmark`]:
//!
//! | Output field       | Source                            | When absent/null |
//! |--------------------|-----------------------------------|------------------|
//! | `tweet_url`        | `tweet_url`                       | `""`             |
//! | `author`           | `screen_name`                     | `""`             |
//! | `author_name`      | `name`                            | `""`             |
//! | `full_text`        | `full_text`                       | `""`             |
//! | `note_tweet_text`  | `note_tweet_text`                 | `""`             |
//! | `tweet_date`       | first 10 chars of `tweeted_at`    | `null`           |
//! | `bookmark_date`    | first 10 chars of `bookmark_date` | `null`           |
//! | `media_type`       | kind of first `extended_media`    | `none`           |
//! | `video_url`        | `expanded_url` of first video     | `null`           |
//! | `image_path`       | reserved                          | `null`           |
//! | `primary_category` | reserved                          | `null`           |
//! | `subtags`          | reserved                          | `[]`             |
//! | `cognitive_value`  | reserved                          | `""`             |

use std::path::Path;

use serde_json::Value;

use bookmarkprep_artifacts::{compact_len, decode_record};
use bookmarkprep_shared::{
    BookmarkPrepError, CanonicalBookmark, MediaType, RawBookmark, RawMedia, Result,
};

/// Number of leading characters kept from a timestamp (`YYYY-MM-DD`).
pub const DATE_PREFIX_LEN: usize = 10;

const KIND_PHOTO: &str = "photo";
const KIND_VIDEO: &str = "video";
const KIND_ANIMATED_GIF: &str = "animated_gif";

/// Classify a record by its first media attachment.
///
/// Returns the media type and, for videos, the attachment's expanded URL if
/// it has one.
pub fn classify_media(first: Option<&RawMedia>) -> (MediaType, Option<String>) {
    let Some(first) = first else {
        return (MediaType::None, None);
    };

    match first.kind.as_deref() {
        Some(KIND_VIDEO | KIND_ANIMATED_GIF) => (MediaType::Video, first.expanded_url.clone()),
        Some(KIND_PHOTO) => (MediaType::Image, None),
        _ => (MediaType::None, None),
    }
}

/// Keep the first [`DATE_PREFIX_LEN`] characters of a timestamp.
///
/// Purely positional: no calendar validation, and a shorter string is kept
/// whole. Absent or empty input yields `None`.
pub fn truncate_date(timestamp: Option<&str>) -> Option<String> {
    match timestamp {
        Some(ts) if !ts.is_empty() => Some(ts.chars().take(DATE_PREFIX_LEN).collect()),
        _ => None,
    }
}

/// Map one raw export record to its canonical shape.
///
/// Fails only when the first media attachment does not decode; later
/// attachments are never read.
pub fn distill_record(raw: &RawBookmark) -> serde_json::Result<CanonicalBookmark> {
    let first_media = raw.first_media()?;
    let (media_type, video_url) = classify_media(first_media.as_ref());

    Ok(CanonicalBookmark {
        tweet_url: raw.tweet_url.clone().unwrap_or_default(),
        author: raw.screen_name.clone().unwrap_or_default(),
        author_name: raw.name.clone().unwrap_or_default(),
        full_text: raw.full_text.clone().unwrap_or_default(),
        note_tweet_text: raw.note_tweet_text.clone().unwrap_or_default(),
        tweet_date: truncate_date(raw.tweeted_at.as_deref()),
        bookmark_date: truncate_date(raw.bookmark_date.as_deref()),
        media_type,
        image_path: None,
        video_url,
        primary_category: None,
        subtags: Vec::new(),
        cognitive_value: String::new(),
    })
}

/// Canonical records plus the size diagnostic for one distillation run.
#[derive(Debug, Clone)]
pub struct Distilled {
    pub records: Vec<CanonicalBookmark>,
    /// Sum of compact-JSON byte lengths of the source records.
    pub original_bytes: usize,
    /// Sum of compact-JSON byte lengths of the canonical records.
    pub distilled_bytes: usize,
}

impl Distilled {
    /// Size reduction as a percentage of the original size.
    pub fn reduction_pct(&self) -> f64 {
        reduction_pct(self.original_bytes, self.distilled_bytes)
    }
}

/// Percentage by which `after` is smaller than `before`; `0.0` when `before` is zero.
pub fn reduction_pct(before: usize, after: usize) -> f64 {
    if before == 0 {
        0.0
    } else {
        (before as f64 - after as f64) / before as f64 * 100.0
    }
}

/// Distill every record of an export read from `source`, preserving order.
///
/// Any record that is not an object, has a known field of the wrong JSON
/// type, or has an undecodable first media attachment fails the whole run.
pub fn distill_all(source: &Path, values: &[Value]) -> Result<Distilled> {
    let mut records = Vec::with_capacity(values.len());
    let mut original_bytes = 0;
    let mut distilled_bytes = 0;

    for (i, value) in values.iter().enumerate() {
        let raw: RawBookmark = decode_record(source, i, value)?;
        let canonical = distill_record(&raw).map_err(|e| {
            BookmarkPrepError::malformed(source, format!("record {i}: extended_media[0]: {e}"))
        })?;

        original_bytes += compact_len(value)?;
        distilled_bytes += compact_len(&canonical)?;
        records.push(canonical);
    }

    Ok(Distilled {
        records,
        original_bytes,
        distilled_bytes,
    })
}
