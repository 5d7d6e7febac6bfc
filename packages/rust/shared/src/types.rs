//! Core domain types for bookmark distillation.

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Serialized field names of [`CanonicalBookmark`], in output order.
pub const CANONICAL_FIELDS: [&str; 13] = [
    "tweet_url",
    "author",
    "author_name",
    "full_text",
    "note_tweet_text",
    "tweet_date",
    "bookmark_date",
    "media_type",
    "image_path",
    "video_url",
    "primary_category",
    "subtags",
    "cognitive_value",
];

// ---------------------------------------------------------------------------
// RawBookmark
// ---------------------------------------------------------------------------

/// One record of the upstream bookmark export.
///
/// Only the keys the distiller reads are declared; everything else in the
/// export is ignored. A known key holding a value of the wrong JSON type is a
/// deserialization error.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawBookmark {
    #[serde(default)]
    pub tweet_url: Option<String>,
    /// Author handle.
    #[serde(default)]
    pub screen_name: Option<String>,
    /// Author display name.
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub full_text: Option<String>,
    #[serde(default)]
    pub note_tweet_text: Option<String>,
    #[serde(default)]
    pub tweeted_at: Option<String>,
    #[serde(default)]
    pub bookmark_date: Option<String>,
    /// Media attachments, left undecoded. Only the first one is ever read,
    /// via [`RawBookmark::first_media`].
    #[serde(default)]
    pub extended_media: Option<Vec<Value>>,
}

impl RawBookmark {
    /// Decode the first media attachment. Later attachments are not inspected.
    pub fn first_media(&self) -> serde_json::Result<Option<RawMedia>> {
        self.extended_media
            .as_deref()
            .and_then(|media| media.first())
            .map(RawMedia::deserialize)
            .transpose()
    }
}

/// A media attachment descriptor inside [`RawBookmark::extended_media`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RawMedia {
    /// Media kind tag (`photo`, `video`, `animated_gif`, ...).
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default)]
    pub expanded_url: Option<String>,
}

// ---------------------------------------------------------------------------
// MediaType
// ---------------------------------------------------------------------------

/// Coarse media classification of a bookmark.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    #[default]
    None,
    Image,
    Video,
}

impl std::fmt::Display for MediaType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            MediaType::None => "none",
            MediaType::Image => "image",
            MediaType::Video => "video",
        };
        f.write_str(s)
    }
}

// ---------------------------------------------------------------------------
// CanonicalBookmark
// ---------------------------------------------------------------------------

/// The distilled, fixed-shape bookmark record.
///
/// Every field is always serialized, including `null` placeholders, so
/// consumers can rely on the full shape being present. `image_path`,
/// `primary_category`, `subtags` and `cognitive_value` are filled in by later
/// enrichment and categorization steps.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CanonicalBookmark {
    #[serde(default)]
    pub tweet_url: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub author_name: String,
    #[serde(default)]
    pub full_text: String,
    #[serde(default)]
    pub note_tweet_text: String,
    /// `YYYY-MM-DD` prefix of the tweet timestamp.
    #[serde(default)]
    pub tweet_date: Option<String>,
    /// `YYYY-MM-DD` prefix of the bookmark timestamp.
    #[serde(default)]
    pub bookmark_date: Option<String>,
    #[serde(default)]
    pub media_type: MediaType,
    #[serde(default)]
    pub image_path: Option<String>,
    #[serde(default)]
    pub video_url: Option<String>,
    #[serde(default)]
    pub primary_category: Option<String>,
    #[serde(default)]
    pub subtags: Vec<String>,
    #[serde(default)]
    pub cognitive_value: String,
}
