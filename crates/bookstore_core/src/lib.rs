//! Core persistence and denormalization logic for the bookstore catalog.
//!
//! Authors, publishers and books are stored in normalized SQLite tables;
//! this crate owns the transactional compound writes and the assembled read
//! views built on top of them.

pub mod config;
pub mod db;
pub mod logging;
pub mod model;
pub mod repo;
pub mod service;

pub use config::CatalogConfig;
pub use logging::{default_log_level, init_logging, logging_status, LoggingError, LoggingStatus};
pub use model::author::Author;
pub use model::book::Book;
pub use model::publisher::Publisher;
pub use model::views::{
    AuthorDenormalized, Authorship, BookDenormalized, Published, PublisherDenormalized,
};
pub use model::{AuthorId, BookId, PublisherId, SellerId, ValidationError};
pub use repo::coordinator::{
    BookWriteSummary, RelationshipCoordinator, SqliteRelationshipCoordinator,
};
pub use repo::entity_store::{EntityStore, SqliteEntityStore};
pub use repo::{EntityKind, RepoError, RepoResult, Stage};
pub use service::catalog_service::{CatalogError, CatalogResult, CatalogService};

/// Returns the core crate version.
pub fn core_version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
