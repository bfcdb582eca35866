//! Repository layer: catalog persistence contracts and SQLite implementations.
//!
//! # Responsibility
//! - [`entity_store`]: single-entity writes, point reads and the row-mapping
//!   conventions shared by every catalog query.
//! - [`coordinator`]: compound book writes and denormalized reads, each
//!   inside its own transaction.
//!
//! # Invariants
//! - Write paths validate input before touching SQL.
//! - Every storage failure names the [`Stage`] that produced it.
//! - A primary lookup that matches no row is `NotFound`, never a storage error.
//! - Stores are built only over connections at the current schema version
//!   with foreign keys enforced.

pub mod coordinator;
pub mod entity_store;

use crate::db::migrations::latest_version;
use crate::db::DbError;
use crate::model::ValidationError;
use rusqlite::Connection;
use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RepoResult<T> = Result<T, RepoError>;

/// Entity family named in not-found errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntityKind {
    Author,
    Publisher,
    Book,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Author => "author",
            Self::Publisher => "publisher",
            Self::Book => "book",
        }
    }
}

impl Display for EntityKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Step of a catalog operation that talked to SQLite.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    CheckConnection,
    InsertAuthor,
    InsertPublisher,
    BeginTransaction,
    InsertBook,
    InsertAuthorship,
    InsertPublished,
    Commit,
    LoadAuthor,
    LoadPublisher,
    LoadBook,
    LoadBookAuthors,
    LoadAuthorBooks,
    LoadPublisherAuthors,
    LoadPublisherBooks,
    /// Closing a read transaction; write commits use [`Stage::Commit`].
    EndRead,
}

impl Stage {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::CheckConnection => "check_connection",
            Self::InsertAuthor => "insert_author",
            Self::InsertPublisher => "insert_publisher",
            Self::BeginTransaction => "begin_transaction",
            Self::InsertBook => "insert_book",
            Self::InsertAuthorship => "insert_authorship",
            Self::InsertPublished => "insert_published",
            Self::Commit => "commit",
            Self::LoadAuthor => "load_author",
            Self::LoadPublisher => "load_publisher",
            Self::LoadBook => "load_book",
            Self::LoadBookAuthors => "load_book_authors",
            Self::LoadAuthorBooks => "load_author_books",
            Self::LoadPublisherAuthors => "load_publisher_authors",
            Self::LoadPublisherBooks => "load_publisher_books",
            Self::EndRead => "end_read",
        }
    }
}

impl Display for Stage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Repository error for catalog persistence and query operations.
#[derive(Debug)]
pub enum RepoError {
    Validation(ValidationError),
    NotFound { entity: EntityKind, id: i64 },
    Storage { stage: Stage, source: DbError },
    /// Operation is part of the contract but has no write semantics yet.
    NotImplemented(&'static str),
}

impl RepoError {
    /// Failing stage for storage errors.
    pub fn stage(&self) -> Option<Stage> {
        match self {
            Self::Storage { stage, .. } => Some(*stage),
            _ => None,
        }
    }
}

impl Display for RepoError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "{err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Storage { stage, source } => write!(f, "storage failure at {stage}: {source}"),
            Self::NotImplemented(operation) => write!(f, "{operation} is not implemented"),
        }
    }
}

impl Error for RepoError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage { source, .. } => Some(source),
            Self::NotFound { .. } => None,
            Self::NotImplemented(_) => None,
        }
    }
}

impl From<ValidationError> for RepoError {
    fn from(value: ValidationError) -> Self {
        Self::Validation(value)
    }
}

/// Tags a raw SQLite result with the stage that produced it.
pub(crate) trait AtStage<T> {
    fn at(self, stage: Stage) -> RepoResult<T>;
}

impl<T> AtStage<T> for rusqlite::Result<T> {
    fn at(self, stage: Stage) -> RepoResult<T> {
        self.map_err(|err| RepoError::Storage {
            stage,
            source: DbError::Sqlite(err),
        })
    }
}

/// Rejects connections that skipped [`crate::db`] bootstrap.
///
/// Requires the current schema version and `foreign_keys=ON`, which the
/// relationship rows rely on.
pub(crate) fn ensure_catalog_connection_ready(conn: &Connection) -> RepoResult<()> {
    let not_ready = |source| RepoError::Storage {
        stage: Stage::CheckConnection,
        source,
    };

    let db_version: u32 = conn
        .pragma_query_value(None, "user_version", |row| row.get(0))
        .at(Stage::CheckConnection)?;
    let expected = latest_version();
    if db_version != expected {
        return Err(not_ready(DbError::SchemaNotCurrent {
            db_version,
            expected,
        }));
    }

    let foreign_keys: bool = conn
        .pragma_query_value(None, "foreign_keys", |row| row.get(0))
        .at(Stage::CheckConnection)?;
    if !foreign_keys {
        return Err(not_ready(DbError::ForeignKeysDisabled));
    }
    Ok(())
}
