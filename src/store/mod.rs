//! The persistent feed store.
//!
//! One [`Store`] owns everything durable: the thought collection, the set of
//! ids this device has already resonated with, and the owner capability flag.
//! Persistence is a single key-value table with JSON-encoded values, one key
//! per concern; every mutation rewrites its key in full before returning, so
//! the serialized form never lags the in-memory collection.
//!
//! Unreadable persisted state is not an error: a key that fails to parse
//! hydrates as empty and gets logged. The feed must stay browsable even when
//! the disk hands us garbage.

mod schema;

use std::collections::HashSet;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};
use std::time::{Duration, Instant};

use chrono::Utc;
use rusqlite::{Connection, OptionalExtension};
use thiserror::Error;
use uuid::Uuid;

use crate::models::{
    extract_tags, Category, CreateThoughtInput, StoredThought, Thought, UpdateThoughtInput,
    MAX_IMAGES,
};

const THOUGHTS_KEY: &str = "thoughts";
const RESONATED_KEY: &str = "resonated_thoughts";
const OWNER_KEY: &str = "owner_auth";

/// How long a deleted thought stays restorable.
pub const UNDO_WINDOW: Duration = Duration::from_secs(5);

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Database error: {0}")]
    Database(#[from] rusqlite::Error),
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Validation(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

struct State {
    /// Newest-first. Order is part of the contract, not a display concern.
    thoughts: Vec<Thought>,
    resonated: HashSet<Uuid>,
    owner: bool,
    last_deleted: Option<(Thought, Instant)>,
}

pub struct Store {
    conn: Arc<Mutex<Connection>>,
    state: Arc<Mutex<State>>,
    admin_key: String,
    undo_window: Duration,
}

impl Store {
    pub fn open(path: PathBuf, admin_key: impl Into<String>) -> StoreResult<Self> {
        let parent = path.parent().ok_or_else(|| {
            StoreError::Validation("store path has no parent directory".to_string())
        })?;
        std::fs::create_dir_all(parent)?;
        let conn = Connection::open(&path)?;
        conn.pragma_update(None, "journal_mode", "WAL")?;
        Self::from_connection(conn, admin_key)
    }

    pub fn open_default(admin_key: impl Into<String>) -> StoreResult<Self> {
        let dirs = directories::ProjectDirs::from("", "", "reservoir").ok_or_else(|| {
            StoreError::Validation("could not determine data directory".to_string())
        })?;
        let db_path = dirs.data_dir().join("reservoir.db");
        Self::open(db_path, admin_key)
    }

    pub fn open_memory(admin_key: impl Into<String>) -> StoreResult<Self> {
        Self::from_connection(Connection::open_in_memory()?, admin_key)
    }

    fn from_connection(conn: Connection, admin_key: impl Into<String>) -> StoreResult<Self> {
        schema::run_migrations(&conn)?;
        let state = hydrate(&conn)?;
        Ok(Self {
            conn: Arc::new(Mutex::new(conn)),
            state: Arc::new(Mutex::new(state)),
            admin_key: admin_key.into(),
            undo_window: UNDO_WINDOW,
        })
    }

    /// Override how long a deleted thought stays restorable. Defaults to
    /// [`UNDO_WINDOW`].
    pub fn with_undo_window(mut self, window: Duration) -> Self {
        self.undo_window = window;
        self
    }

    // ============================================================
    // Thought operations
    // ============================================================

    /// Create a thought and prepend it to the feed.
    ///
    /// Rejects content that trims to empty and more than [`MAX_IMAGES`]
    /// images. Tags are derived from the content here, once.
    pub fn create(&self, input: CreateThoughtInput) -> StoreResult<Thought> {
        validate_content(&input.content)?;
        validate_images(&input.images)?;

        let thought = Thought {
            id: Uuid::new_v4(),
            tags: extract_tags(&input.content),
            content: input.content,
            timestamp: Utc::now(),
            category: input.category,
            resonates: 0,
            images: input.images,
        };

        let mut state = self.state.lock().expect("state lock poisoned");
        state.thoughts.insert(0, thought.clone());
        self.flush_thoughts(&state)?;
        Ok(thought)
    }

    /// Replace the mutable fields of a thought in place.
    ///
    /// `id`, `timestamp`, `resonates` and the creation-time `tags` survive the
    /// edit. Returns `None` for an unknown id.
    pub fn update(&self, id: Uuid, input: UpdateThoughtInput) -> StoreResult<Option<Thought>> {
        validate_content(&input.content)?;
        if let Some(ref images) = input.images {
            validate_images(images)?;
        }

        let mut state = self.state.lock().expect("state lock poisoned");
        let Some(thought) = state.thoughts.iter_mut().find(|t| t.id == id) else {
            return Ok(None);
        };
        thought.content = input.content;
        thought.category = input.category;
        if let Some(images) = input.images {
            thought.images = images;
        }
        let updated = thought.clone();
        self.flush_thoughts(&state)?;
        Ok(Some(updated))
    }

    /// Remove a thought. Deleting an absent id is a no-op.
    ///
    /// The id is purged from the resonated set, and the removed thought is
    /// buffered for the undo window so the owner can take the delete back.
    pub fn delete(&self, id: Uuid) -> StoreResult<bool> {
        let mut state = self.state.lock().expect("state lock poisoned");
        let Some(pos) = state.thoughts.iter().position(|t| t.id == id) else {
            return Ok(false);
        };
        let thought = state.thoughts.remove(pos);
        state.resonated.remove(&id);
        state.last_deleted = Some((thought, Instant::now()));
        self.flush_thoughts(&state)?;
        self.flush_resonated(&state)?;
        Ok(true)
    }

    /// Reinsert the most recently deleted thought, if the undo window is
    /// still open. The feed is re-sorted newest-first so the thought lands
    /// back where its timestamp puts it.
    pub fn restore_last_deleted(&self) -> StoreResult<Option<Thought>> {
        let mut state = self.state.lock().expect("state lock poisoned");
        let Some((thought, deleted_at)) = state.last_deleted.take() else {
            return Ok(None);
        };
        if deleted_at.elapsed() > self.undo_window {
            return Ok(None);
        }
        state.thoughts.push(thought.clone());
        state
            .thoughts
            .sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        self.flush_thoughts(&state)?;
        Ok(Some(thought))
    }

    /// Bump the resonate counter, at most once per device.
    ///
    /// A second call for the same id is a no-op that returns the thought
    /// unchanged. Returns `None` for an unknown id.
    pub fn resonate(&self, id: Uuid) -> StoreResult<Option<Thought>> {
        let mut state = self.state.lock().expect("state lock poisoned");
        let Some(pos) = state.thoughts.iter().position(|t| t.id == id) else {
            return Ok(None);
        };
        if state.resonated.contains(&id) {
            return Ok(Some(state.thoughts[pos].clone()));
        }
        state.thoughts[pos].resonates += 1;
        state.resonated.insert(id);
        let resonated = state.thoughts[pos].clone();
        self.flush_thoughts(&state)?;
        self.flush_resonated(&state)?;
        Ok(Some(resonated))
    }

    /// Project the feed, optionally restricted to one category. Newest-first,
    /// never mutates.
    pub fn filter(&self, category: Option<Category>) -> Vec<Thought> {
        let state = self.state.lock().expect("state lock poisoned");
        state
            .thoughts
            .iter()
            .filter(|t| category.map_or(true, |c| t.category == c))
            .cloned()
            .collect()
    }

    pub fn get(&self, id: Uuid) -> Option<Thought> {
        let state = self.state.lock().expect("state lock poisoned");
        state.thoughts.iter().find(|t| t.id == id).cloned()
    }

    /// Whether this device already resonated with the given thought.
    pub fn has_resonated(&self, id: Uuid) -> bool {
        let state = self.state.lock().expect("state lock poisoned");
        state.resonated.contains(&id)
    }

    // ============================================================
    // Access gate
    // ============================================================

    /// Check the shared secret and, on a match, persist the owner capability.
    /// A mismatch changes nothing.
    pub fn verify(&self, secret: &str) -> StoreResult<bool> {
        if secret.trim() != self.admin_key {
            return Ok(false);
        }
        let mut state = self.state.lock().expect("state lock poisoned");
        state.owner = true;
        self.flush_owner(&state)?;
        Ok(true)
    }

    pub fn is_owner(&self) -> bool {
        self.state.lock().expect("state lock poisoned").owner
    }

    pub fn clear_owner(&self) -> StoreResult<()> {
        let mut state = self.state.lock().expect("state lock poisoned");
        state.owner = false;
        self.flush_owner(&state)?;
        Ok(())
    }

    // ============================================================
    // Persistence
    // ============================================================

    fn flush_thoughts(&self, state: &State) -> StoreResult<()> {
        let value = serde_json::to_string(&state.thoughts)?;
        self.write_kv(THOUGHTS_KEY, &value)
    }

    fn flush_resonated(&self, state: &State) -> StoreResult<()> {
        let ids: Vec<&Uuid> = state.resonated.iter().collect();
        let value = serde_json::to_string(&ids)?;
        self.write_kv(RESONATED_KEY, &value)
    }

    fn flush_owner(&self, state: &State) -> StoreResult<()> {
        self.write_kv(OWNER_KEY, if state.owner { "true" } else { "false" })
    }

    fn write_kv(&self, key: &str, value: &str) -> StoreResult<()> {
        let conn = self.conn.lock().expect("database lock poisoned");
        conn.execute(
            "INSERT INTO kv (key, value, updated_at) VALUES (?, ?, ?)
             ON CONFLICT(key) DO UPDATE SET value = excluded.value, updated_at = excluded.updated_at",
            (key, value, Utc::now().to_rfc3339()),
        )?;
        Ok(())
    }
}

impl Clone for Store {
    fn clone(&self) -> Self {
        Self {
            conn: self.conn.clone(),
            state: self.state.clone(),
            admin_key: self.admin_key.clone(),
            undo_window: self.undo_window,
        }
    }
}

fn validate_content(content: &str) -> StoreResult<()> {
    if content.trim().is_empty() {
        return Err(StoreError::Validation(
            "content must not be empty".to_string(),
        ));
    }
    Ok(())
}

fn validate_images(images: &[String]) -> StoreResult<()> {
    if images.len() > MAX_IMAGES {
        return Err(StoreError::Validation(format!(
            "at most {MAX_IMAGES} images per thought"
        )));
    }
    Ok(())
}

fn hydrate(conn: &Connection) -> StoreResult<State> {
    let thoughts = match read_kv(conn, THOUGHTS_KEY)? {
        Some(raw) => match serde_json::from_str::<Vec<StoredThought>>(&raw) {
            Ok(stored) => stored.into_iter().map(StoredThought::into_thought).collect(),
            Err(e) => {
                tracing::warn!("Unreadable thought collection, starting empty: {}", e);
                Vec::new()
            }
        },
        None => Vec::new(),
    };

    let resonated = match read_kv(conn, RESONATED_KEY)? {
        Some(raw) => match serde_json::from_str::<Vec<Uuid>>(&raw) {
            Ok(ids) => ids.into_iter().collect(),
            Err(e) => {
                tracing::warn!("Unreadable resonated set, starting empty: {}", e);
                HashSet::new()
            }
        },
        None => HashSet::new(),
    };

    let owner = matches!(read_kv(conn, OWNER_KEY)?.as_deref(), Some("true"));

    Ok(State {
        thoughts,
        resonated,
        owner,
        last_deleted: None,
    })
}

fn read_kv(conn: &Connection, key: &str) -> StoreResult<Option<String>> {
    let value = conn
        .query_row("SELECT value FROM kv WHERE key = ?", [key], |row| {
            row.get(0)
        })
        .optional()?;
    Ok(value)
}
