use chrono::{DateTime, TimeZone, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A single authored fragment in the feed.
///
/// Thoughts are created newest-first and never reordered. The `id` doubles as
/// the deep-link key (`/status/{id}`), so it is immutable for the lifetime of
/// the thought, as is `timestamp`. Everything else the owner can edit, except
/// `resonates`, which only moves through [`resonate`](crate::store::Store::resonate).
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Thought {
    pub id: Uuid,
    pub content: String,
    pub timestamp: DateTime<Utc>,
    pub category: Category,
    /// Resonate counter. Monotonically non-decreasing while the thought lives.
    pub resonates: u32,
    /// Embedded image payloads (data URLs), at most [`MAX_IMAGES`].
    #[serde(default)]
    pub images: Vec<String>,
    /// Lowercase `#word` tags derived from the content at creation time.
    #[serde(default)]
    pub tags: Vec<String>,
}

/// Upper bound on embedded images per thought.
pub const MAX_IMAGES: usize = 10;

/// The closed set of categories a thought can be filed under.
///
/// Serialized with the feed's original display labels, which is also the form
/// persisted to disk. No other value is ever stored.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub enum Category {
    #[serde(rename = "Deep thoughts")]
    DeepThoughts,
    #[serde(rename = "About HER")]
    AboutHer,
    Poetic,
    #[serde(rename = "Random Opinion")]
    RandomOpinion,
    Politics,
    Humour,
}

impl Category {
    pub const ALL: [Category; 6] = [
        Self::DeepThoughts,
        Self::AboutHer,
        Self::Poetic,
        Self::RandomOpinion,
        Self::Politics,
        Self::Humour,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::DeepThoughts => "Deep thoughts",
            Self::AboutHer => "About HER",
            Self::Poetic => "Poetic",
            Self::RandomOpinion => "Random Opinion",
            Self::Politics => "Politics",
            Self::Humour => "Humour",
        }
    }

    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "Deep thoughts" => Some(Self::DeepThoughts),
            "About HER" => Some(Self::AboutHer),
            "Poetic" => Some(Self::Poetic),
            "Random Opinion" => Some(Self::RandomOpinion),
            "Politics" => Some(Self::Politics),
            "Humour" => Some(Self::Humour),
            _ => None,
        }
    }
}

/// Input for creating a new thought.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateThoughtInput {
    pub content: String,
    pub category: Category,
    /// Embedded image payloads. Defaults to none.
    #[serde(default)]
    pub images: Vec<String>,
}

/// Input for editing a thought. Replaces the mutable fields; `id`, `timestamp`,
/// `resonates` and the derived `tags` are preserved.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UpdateThoughtInput {
    pub content: String,
    pub category: Category,
    /// New image set, or `None` to keep the current one.
    pub images: Option<Vec<String>>,
}

static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"#(\w+)").expect("valid tag pattern"));

/// Derive the lowercase tag set from `#word` occurrences in content.
///
/// Duplicates collapse to their first occurrence; insertion order is kept for
/// stable display, though nothing downstream depends on it.
pub fn extract_tags(content: &str) -> Vec<String> {
    let mut tags = Vec::new();
    for capture in TAG_RE.captures_iter(content) {
        let tag = capture[1].to_lowercase();
        if !tags.contains(&tag) {
            tags.push(tag);
        }
    }
    tags
}

/// On-disk representation of a thought, tolerant of the shapes older builds
/// persisted: a single `image` field instead of `images`, a missing `tags`
/// array, and timestamps stored as epoch milliseconds.
#[derive(Debug, Deserialize)]
pub struct StoredThought {
    id: Uuid,
    content: String,
    timestamp: StoredTimestamp,
    category: Category,
    #[serde(default)]
    resonates: u32,
    #[serde(default)]
    images: Vec<String>,
    #[serde(default)]
    image: Option<String>,
    #[serde(default)]
    tags: Vec<String>,
}

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum StoredTimestamp {
    Millis(i64),
    Rfc3339(DateTime<Utc>),
}

impl StoredThought {
    /// Normalize a persisted record into the current schema.
    pub fn into_thought(self) -> Thought {
        let timestamp = match self.timestamp {
            StoredTimestamp::Rfc3339(ts) => ts,
            StoredTimestamp::Millis(ms) => Utc
                .timestamp_millis_opt(ms)
                .single()
                .unwrap_or_else(Utc::now),
        };
        let images = if self.images.is_empty() {
            self.image.into_iter().collect()
        } else {
            self.images
        };
        Thought {
            id: self.id,
            content: self.content,
            timestamp,
            category: self.category,
            resonates: self.resonates,
            images,
            tags: self.tags,
        }
    }
}
