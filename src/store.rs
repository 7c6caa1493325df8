use chrono::{DateTime, Utc};
use rusqlite::types::Type;
use rusqlite::{params, params_from_iter, Connection, OptionalExtension, Row};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::app_dirs::AppDirs;
use crate::error::{DrillError, Result};
use crate::user::{User, UserProfile};
use crate::vocabulary::{Attempt, NewAttempt, SeedWord, UserId, Word, WordFilter, WordId};

/// Keeps `IN (...)` lists well below SQLite's bound-parameter limit
const MAX_IDS_PER_QUERY: usize = 500;

/// Most category plus level tags a single word query accepts
pub const MAX_FILTER_TAGS: usize = MAX_IDS_PER_QUERY;

const SCHEMA: &str = r#"
    CREATE TABLE IF NOT EXISTS users (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        google_id TEXT NOT NULL UNIQUE,
        email TEXT NOT NULL UNIQUE,
        name TEXT,
        picture TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS vocabulary (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        czech TEXT NOT NULL,
        english TEXT NOT NULL,
        category TEXT,
        level TEXT
    );

    CREATE TABLE IF NOT EXISTS word_attempts (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        user_id INTEGER NOT NULL REFERENCES users(id),
        word_id INTEGER NOT NULL REFERENCES vocabulary(id),
        typo_count INTEGER NOT NULL DEFAULT 0 CHECK (typo_count >= 0),
        timestamp TEXT NOT NULL
    );

    CREATE TABLE IF NOT EXISTS sessions (
        token TEXT PRIMARY KEY,
        user_id INTEGER NOT NULL REFERENCES users(id),
        created_at TEXT NOT NULL,
        expires_at TEXT NOT NULL
    );

    CREATE INDEX IF NOT EXISTS idx_vocabulary_category ON vocabulary(category);
    CREATE INDEX IF NOT EXISTS idx_vocabulary_level ON vocabulary(level);
    CREATE INDEX IF NOT EXISTS idx_word_attempts_user_word ON word_attempts(user_id, word_id);
"#;

/// Read access to words and append-only access to attempts
pub trait VocabularyStore {
    /// Words matching `filter`, ordered by id
    fn query_words(&self, filter: &WordFilter) -> Result<Vec<Word>>;

    fn get_word(&self, id: WordId) -> Result<Option<Word>>;

    /// The user's attempts restricted to `word_ids`, oldest first
    fn query_attempts(&self, user_id: UserId, word_ids: &[WordId]) -> Result<Vec<Attempt>>;

    fn insert_attempt(&self, attempt: &NewAttempt) -> Result<Attempt>;
}

/// SQLite-backed store for users, words, attempts and sessions
#[derive(Debug)]
pub struct SqliteStore {
    conn: Connection,
}

impl SqliteStore {
    /// Open (or create) the database file and make sure the schema exists
    pub fn open<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();

        // Create parent directory if it doesn't exist
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent).map_err(|e| {
                rusqlite::Error::SqliteFailure(
                    rusqlite::ffi::Error::new(rusqlite::ffi::SQLITE_CANTOPEN),
                    Some(format!("Failed to create directory: {e}")),
                )
            })?;
        }

        info!("Opening database at {}", path.display());
        Self::init(Connection::open(path)?)
    }

    /// Open the database under the platform state directory
    pub fn open_default() -> Result<Self> {
        let path = AppDirs::db_path().unwrap_or_else(|| PathBuf::from("skola.db"));
        Self::open(path)
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::init(Connection::open_in_memory()?)
    }

    fn init(conn: Connection) -> Result<Self> {
        conn.pragma_update(None, "foreign_keys", true)?;
        conn.execute_batch(SCHEMA)?;
        Ok(SqliteStore { conn })
    }

    pub fn count_words(&self) -> Result<usize> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM vocabulary", [], |row| row.get(0))?;
        Ok(count as usize)
    }

    /// Insert all words in one transaction
    pub fn import_words(&mut self, words: &[SeedWord]) -> Result<usize> {
        let tx = self.conn.transaction()?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO vocabulary (czech, english, category, level) VALUES (?1, ?2, ?3, ?4)",
            )?;
            for word in words {
                stmt.execute(params![word.czech, word.english, word.category, word.level])?;
            }
        }

        tx.commit()?;
        Ok(words.len())
    }

    /// Import `words` unless the vocabulary table already has rows.
    /// Returns the number of inserted words.
    pub fn seed_if_empty(&mut self, words: &[SeedWord]) -> Result<usize> {
        let existing = self.count_words()?;
        if existing > 0 {
            info!("Database already contains {existing} vocabulary words, skipping seed");
            return Ok(0);
        }

        let inserted = self.import_words(words)?;
        info!("Seeded {inserted} vocabulary words");
        Ok(inserted)
    }

    /// Create the user on first sign-in, refresh profile fields afterwards
    pub fn upsert_user(&self, profile: &UserProfile) -> Result<User> {
        let now = Utc::now().to_rfc3339();
        let user = self.conn.query_row(
            r#"
            INSERT INTO users (google_id, email, name, picture, created_at, updated_at)
            VALUES (?1, ?2, ?3, ?4, ?5, ?5)
            ON CONFLICT(google_id) DO UPDATE SET
                email = excluded.email,
                name = excluded.name,
                picture = excluded.picture,
                updated_at = excluded.updated_at
            RETURNING id, google_id, email, name, picture, created_at, updated_at
            "#,
            params![
                profile.google_id,
                profile.email,
                profile.name,
                profile.picture,
                now
            ],
            user_from_row,
        )?;

        debug!("Upserted user {} ({})", user.id, user.email);
        Ok(user)
    }

    pub fn get_user(&self, id: UserId) -> Result<Option<User>> {
        let user = self
            .conn
            .query_row(
                r#"
                SELECT id, google_id, email, name, picture, created_at, updated_at
                FROM users WHERE id = ?1
                "#,
                [id],
                user_from_row,
            )
            .optional()?;
        Ok(user)
    }

    pub fn insert_session(
        &self,
        token: &str,
        user_id: UserId,
        expires_at: DateTime<Utc>,
    ) -> Result<()> {
        self.conn.execute(
            "INSERT INTO sessions (token, user_id, created_at, expires_at) VALUES (?1, ?2, ?3, ?4)",
            params![
                token,
                user_id,
                Utc::now().to_rfc3339(),
                expires_at.to_rfc3339()
            ],
        )?;
        Ok(())
    }

    /// Owner and expiry of a session token, if the token exists
    pub fn find_session(&self, token: &str) -> Result<Option<(UserId, DateTime<Utc>)>> {
        let session = self
            .conn
            .query_row(
                "SELECT user_id, expires_at FROM sessions WHERE token = ?1",
                [token],
                |row| Ok((row.get(0)?, parse_timestamp(row, 1)?)),
            )
            .optional()?;
        Ok(session)
    }

    /// Returns whether a session was removed
    pub fn delete_session(&self, token: &str) -> Result<bool> {
        let removed = self
            .conn
            .execute("DELETE FROM sessions WHERE token = ?1", [token])?;
        Ok(removed > 0)
    }

    /// Drop every session that expired before `now`
    pub fn purge_expired_sessions(&self, now: DateTime<Utc>) -> Result<usize> {
        let mut stmt = self.conn.prepare("SELECT token, expires_at FROM sessions")?;
        let expired: Vec<String> = stmt
            .query_map([], |row| Ok((row.get::<_, String>(0)?, parse_timestamp(row, 1)?)))?
            .filter_map(|session| match session {
                Ok((token, expires_at)) if expires_at <= now => Some(Ok(token)),
                Ok(_) => None,
                Err(e) => Some(Err(e)),
            })
            .collect::<rusqlite::Result<_>>()?;

        for token in &expired {
            self.delete_session(token)?;
        }
        Ok(expired.len())
    }
}

impl VocabularyStore for SqliteStore {
    fn query_words(&self, filter: &WordFilter) -> Result<Vec<Word>> {
        let tags = filter.categories.len() + filter.levels.len();
        if tags > MAX_FILTER_TAGS {
            return Err(DrillError::InvalidInput(format!(
                "filter has {tags} tags, at most {MAX_FILTER_TAGS} are allowed"
            )));
        }

        let mut sql = String::from("SELECT id, czech, english, category, level FROM vocabulary");
        let mut clauses = Vec::new();
        let mut values: Vec<&str> = Vec::new();

        if !filter.categories.is_empty() {
            clauses.push(format!("category IN ({})", placeholders(filter.categories.len())));
            values.extend(filter.categories.iter().map(String::as_str));
        }
        if !filter.levels.is_empty() {
            clauses.push(format!("level IN ({})", placeholders(filter.levels.len())));
            values.extend(filter.levels.iter().map(String::as_str));
        }
        if !clauses.is_empty() {
            sql.push_str(" WHERE ");
            sql.push_str(&clauses.join(" AND "));
        }
        sql.push_str(" ORDER BY id");

        let mut stmt = self.conn.prepare(&sql)?;
        let words = stmt
            .query_map(params_from_iter(values), word_from_row)?
            .collect::<rusqlite::Result<Vec<_>>>()?;

        Ok(words)
    }

    fn get_word(&self, id: WordId) -> Result<Option<Word>> {
        let word = self
            .conn
            .query_row(
                "SELECT id, czech, english, category, level FROM vocabulary WHERE id = ?1",
                [id],
                word_from_row,
            )
            .optional()?;
        Ok(word)
    }

    fn query_attempts(&self, user_id: UserId, word_ids: &[WordId]) -> Result<Vec<Attempt>> {
        let mut attempts = Vec::new();

        for chunk in word_ids.chunks(MAX_IDS_PER_QUERY) {
            let sql = format!(
                r#"
                SELECT id, user_id, word_id, typo_count, timestamp
                FROM word_attempts
                WHERE user_id = ? AND word_id IN ({})
                ORDER BY id
                "#,
                placeholders(chunk.len())
            );

            let mut stmt = self.conn.prepare(&sql)?;
            let rows = stmt.query_map(
                params_from_iter(std::iter::once(&user_id).chain(chunk.iter())),
                attempt_from_row,
            )?;
            for attempt in rows {
                attempts.push(attempt?);
            }
        }

        Ok(attempts)
    }

    fn insert_attempt(&self, attempt: &NewAttempt) -> Result<Attempt> {
        self.conn.execute(
            r#"
            INSERT INTO word_attempts (user_id, word_id, typo_count, timestamp)
            VALUES (?1, ?2, ?3, ?4)
            "#,
            params![
                attempt.user_id,
                attempt.word_id,
                attempt.mistake_count,
                attempt.created_at.to_rfc3339(),
            ],
        )?;

        Ok(Attempt {
            id: self.conn.last_insert_rowid(),
            user_id: attempt.user_id,
            word_id: attempt.word_id,
            mistake_count: attempt.mistake_count,
            created_at: attempt.created_at,
        })
    }
}

fn placeholders(count: usize) -> String {
    vec!["?"; count].join(", ")
}

fn parse_timestamp(row: &Row, idx: usize) -> rusqlite::Result<DateTime<Utc>> {
    let raw: String = row.get(idx)?;
    DateTime::parse_from_rfc3339(&raw)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|e| rusqlite::Error::FromSqlConversionFailure(idx, Type::Text, Box::new(e)))
}

fn word_from_row(row: &Row) -> rusqlite::Result<Word> {
    Ok(Word {
        id: row.get(0)?,
        czech: row.get(1)?,
        english: row.get(2)?,
        category: row.get(3)?,
        level: row.get(4)?,
    })
}

fn attempt_from_row(row: &Row) -> rusqlite::Result<Attempt> {
    Ok(Attempt {
        id: row.get(0)?,
        user_id: row.get(1)?,
        word_id: row.get(2)?,
        mistake_count: row.get(3)?,
        created_at: parse_timestamp(row, 4)?,
    })
}

fn user_from_row(row: &Row) -> rusqlite::Result<User> {
    Ok(User {
        id: row.get(0)?,
        google_id: row.get(1)?,
        email: row.get(2)?,
        name: row.get(3)?,
        picture: row.get(4)?,
        created_at: parse_timestamp(row, 5)?,
        updated_at: parse_timestamp(row, 6)?,
    })
}
