//! Catalog use-case service.
//!
//! # Responsibility
//! - Expose the six catalog operations consumed by transport layers.
//! - Classify repository failures into [`CatalogError`] kinds with a
//!   client-safe public message.
//! - Emit one metadata-only log event per operation.
//!
//! # Invariants
//! - Store error text never reaches [`CatalogError::public_message`].
//! - Failures are returned immediately; nothing is retried.
//! - Saved entities are returned only after their write committed.

use crate::db::DbError;
use crate::model::author::Author;
use crate::model::book::Book;
use crate::model::publisher::Publisher;
use crate::model::views::{AuthorDenormalized, BookDenormalized, PublisherDenormalized};
use crate::model::{AuthorId, BookId, PublisherId, ValidationError};
use crate::repo::coordinator::RelationshipCoordinator;
use crate::repo::{EntityKind, RepoError, Stage};
use log::{error, info, warn};
use serde::ser::SerializeStruct;
use serde::{Serialize, Serializer};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::time::Instant;

pub type CatalogResult<T> = Result<T, CatalogError>;

/// Classified error returned to catalog callers.
#[derive(Debug)]
pub enum CatalogError {
    /// Input rejected before any store interaction.
    Validation(ValidationError),
    /// Primary lookup matched no row.
    NotFound { entity: EntityKind, id: i64 },
    /// Statement, row decoding or transaction control failed.
    Storage { stage: Stage, source: DbError },
    /// Operation exists in the contract but performs no write.
    NotImplemented(&'static str),
}

impl CatalogError {
    /// HTTP-style status a transport layer should answer with.
    pub fn status_code(&self) -> u16 {
        match self {
            Self::Validation(_) => 400,
            Self::NotFound { .. } => 404,
            Self::Storage { .. } => 500,
            Self::NotImplemented(_) => 501,
        }
    }

    /// Message safe to show to clients.
    pub fn public_message(&self) -> &'static str {
        match self {
            Self::Validation(_) => "invalid request",
            Self::NotFound { .. } => "resource not found",
            Self::Storage { .. } => "internal error",
            Self::NotImplemented(_) => "operation not implemented",
        }
    }

    fn code(&self) -> &'static str {
        match self {
            Self::Validation(_) => "validation_failed",
            Self::NotFound { .. } => "not_found",
            Self::Storage { .. } => "storage_failed",
            Self::NotImplemented(_) => "not_implemented",
        }
    }
}

impl Display for CatalogError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Validation(err) => write!(f, "invalid input: {err}"),
            Self::NotFound { entity, id } => write!(f, "{entity} not found: {id}"),
            Self::Storage { stage, source } => write!(f, "storage failure at {stage}: {source}"),
            Self::NotImplemented(operation) => write!(f, "{operation} is not implemented"),
        }
    }
}

impl Error for CatalogError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Validation(err) => Some(err),
            Self::Storage { source, .. } => Some(source),
            Self::NotFound { .. } | Self::NotImplemented(_) => None,
        }
    }
}

impl From<RepoError> for CatalogError {
    fn from(value: RepoError) -> Self {
        match value {
            RepoError::Validation(err) => Self::Validation(err),
            RepoError::NotFound { entity, id } => Self::NotFound { entity, id },
            RepoError::Storage { stage, source } => Self::Storage { stage, source },
            RepoError::NotImplemented(operation) => Self::NotImplemented(operation),
        }
    }
}

/// Serializes the public shape only: `{"status": u16, "message": str}`.
impl Serialize for CatalogError {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        let mut state = serializer.serialize_struct("CatalogError", 2)?;
        state.serialize_field("status", &self.status_code())?;
        state.serialize_field("message", self.public_message())?;
        state.end()
    }
}

/// Catalog service facade over a relationship coordinator.
pub struct CatalogService<C: RelationshipCoordinator> {
    coordinator: C,
}

impl<C: RelationshipCoordinator> CatalogService<C> {
    pub fn new(coordinator: C) -> Self {
        Self { coordinator }
    }

    /// Saves one author and returns it with the generated id.
    pub fn save_author(&self, mut author: Author) -> CatalogResult<Author> {
        let started_at = Instant::now();
        match self.coordinator.save_author(&mut author) {
            Ok(()) => {
                info!(
                    "event=author_save module=catalog status=ok author_id={} duration_ms={}",
                    author.id,
                    started_at.elapsed().as_millis()
                );
                Ok(author)
            }
            Err(err) => Err(failed("author_save", started_at, err)),
        }
    }

    /// Saves one publisher and returns it with the generated id.
    pub fn save_publisher(&self, mut publisher: Publisher) -> CatalogResult<Publisher> {
        let started_at = Instant::now();
        match self.coordinator.save_publisher(&mut publisher) {
            Ok(()) => {
                info!(
                    "event=publisher_save module=catalog status=ok publisher_id={} duration_ms={}",
                    publisher.id,
                    started_at.elapsed().as_millis()
                );
                Ok(publisher)
            }
            Err(err) => Err(failed("publisher_save", started_at, err)),
        }
    }

    /// Saves one book with its authorship and published rows atomically.
    ///
    /// On error nothing from this call is persisted and the returned error
    /// names the failing stage.
    pub fn save_book(&self, mut book: Book) -> CatalogResult<Book> {
        let started_at = Instant::now();
        match self.coordinator.save_book(&mut book) {
            Ok(summary) => {
                info!(
                    "event=book_save module=catalog status=ok book_id={} publisher_id={} authorship_rows={} published_rows_added={} duration_ms={}",
                    book.id,
                    book.publisher_id,
                    summary.authorship_rows,
                    summary.published_rows_added,
                    started_at.elapsed().as_millis()
                );
                Ok(book)
            }
            Err(err) => Err(failed("book_save", started_at, err)),
        }
    }

    pub fn update_author(&self, author: &Author) -> CatalogResult<()> {
        let started_at = Instant::now();
        self.coordinator
            .update_author(author)
            .map_err(|err| failed("author_update", started_at, err))
    }

    pub fn update_publisher(&self, publisher: &Publisher) -> CatalogResult<()> {
        let started_at = Instant::now();
        self.coordinator
            .update_publisher(publisher)
            .map_err(|err| failed("publisher_update", started_at, err))
    }

    pub fn update_book(&self, book: &Book) -> CatalogResult<()> {
        let started_at = Instant::now();
        self.coordinator
            .update_book(book)
            .map_err(|err| failed("book_update", started_at, err))
    }

    /// Loads a book with its publisher and authors.
    pub fn get_book_by_id(&self, id: BookId) -> CatalogResult<BookDenormalized> {
        let started_at = Instant::now();
        match self.coordinator.get_book_denormalized(id) {
            Ok(view) => {
                info!(
                    "event=book_get module=catalog status=ok book_id={} author_count={} duration_ms={}",
                    id,
                    view.authors.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(view)
            }
            Err(err) => Err(failed("book_get", started_at, err)),
        }
    }

    /// Loads an author with every book crediting them.
    pub fn get_author_by_id(&self, id: AuthorId) -> CatalogResult<AuthorDenormalized> {
        let started_at = Instant::now();
        match self.coordinator.get_author_denormalized(id) {
            Ok(view) => {
                info!(
                    "event=author_get module=catalog status=ok author_id={} book_count={} duration_ms={}",
                    id,
                    view.books.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(view)
            }
            Err(err) => Err(failed("author_get", started_at, err)),
        }
    }

    /// Loads a publisher with its authors and books.
    pub fn get_publisher_by_id(&self, id: PublisherId) -> CatalogResult<PublisherDenormalized> {
        let started_at = Instant::now();
        match self.coordinator.get_publisher_denormalized(id) {
            Ok(view) => {
                info!(
                    "event=publisher_get module=catalog status=ok publisher_id={} author_count={} book_count={} duration_ms={}",
                    id,
                    view.authors.len(),
                    view.books.len(),
                    started_at.elapsed().as_millis()
                );
                Ok(view)
            }
            Err(err) => Err(failed("publisher_get", started_at, err)),
        }
    }
}

fn failed(event: &'static str, started_at: Instant, err: RepoError) -> CatalogError {
    let err = CatalogError::from(err);
    let duration_ms = started_at.elapsed().as_millis();
    match &err {
        CatalogError::Storage { stage, source } => error!(
            "event={event} module=catalog status=error duration_ms={duration_ms} error_code={} stage={stage} error={source}",
            err.code()
        ),
        _ => warn!(
            "event={event} module=catalog status=error duration_ms={duration_ms} error_code={} error={err}",
            err.code()
        ),
    }
    err
}
