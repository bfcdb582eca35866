//! Relationship coordinator: compound catalog writes and denormalized reads.
//!
//! # Responsibility
//! - Save a book together with its `authorship` and `published` rows in one
//!   atomic transaction.
//! - Assemble book, author and publisher views from normalized rows.
//! - Delegate single-entity writes to the [`EntityStore`].
//!
//! # Invariants
//! - The write transaction is a scoped handle: dropping it on any early
//!   return rolls back every row written by the call.
//! - Relationship rows are inserted sequentially, in author list order, on
//!   the one transaction handle.
//! - `published` inserts ignore pairs that already exist.
//! - Compound reads run in one read transaction, so both stages observe the
//!   same committed snapshot.
//! - A missing primary row ends the read with `NotFound` before any
//!   secondary query runs.

use super::entity_store::{
    authors_by_book, authors_by_publisher, book_from_row, books_by_author, books_by_publisher,
    load_author, load_publisher, publisher_from_row, require_found, EntityStore,
    SqliteEntityStore, BOOK_COLUMNS, PUBLISHER_COLUMNS,
};
use super::{AtStage, EntityKind, RepoError, RepoResult, Stage};
use crate::model::author::Author;
use crate::model::book::Book;
use crate::model::publisher::Publisher;
use crate::model::views::{AuthorDenormalized, BookDenormalized, PublisherDenormalized};
use crate::model::{AuthorId, BookId, PublisherId};
use rusqlite::{params, Connection, OptionalExtension, Transaction, TransactionBehavior};

/// Row counts written by one successful [`RelationshipCoordinator::save_book`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BookWriteSummary {
    /// One per author id in the book, repeats included.
    pub authorship_rows: usize,
    /// New `(author, publisher)` pairs; existing pairs are not counted.
    pub published_rows_added: usize,
}

/// Repository interface for compound catalog operations.
pub trait RelationshipCoordinator {
    fn save_author(&self, author: &mut Author) -> RepoResult<()>;
    fn update_author(&self, author: &Author) -> RepoResult<()>;
    fn save_publisher(&self, publisher: &mut Publisher) -> RepoResult<()>;
    fn update_publisher(&self, publisher: &Publisher) -> RepoResult<()>;

    /// Atomically inserts the book and its relationship rows, then assigns
    /// the generated id onto `book`.
    fn save_book(&self, book: &mut Book) -> RepoResult<BookWriteSummary>;
    /// Accepted by the contract; performs no write.
    fn update_book(&self, book: &Book) -> RepoResult<()>;

    fn get_book_denormalized(&self, id: BookId) -> RepoResult<BookDenormalized>;
    fn get_author_denormalized(&self, id: AuthorId) -> RepoResult<AuthorDenormalized>;
    fn get_publisher_denormalized(&self, id: PublisherId) -> RepoResult<PublisherDenormalized>;
}

/// SQLite-backed relationship coordinator.
pub struct SqliteRelationshipCoordinator<'conn> {
    conn: &'conn Connection,
    entities: SqliteEntityStore<'conn>,
}

impl<'conn> SqliteRelationshipCoordinator<'conn> {
    /// Creates a coordinator from a migrated connection.
    ///
    /// The connection must not be inside a transaction when compound
    /// operations run; each operation opens its own.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        Ok(Self {
            conn,
            entities: SqliteEntityStore::try_new(conn)?,
        })
    }

    /// Single-entity store sharing this coordinator's connection.
    pub fn entities(&self) -> &SqliteEntityStore<'conn> {
        &self.entities
    }

    fn begin(&self, behavior: TransactionBehavior) -> RepoResult<Transaction<'conn>> {
        Transaction::new_unchecked(self.conn, behavior).at(Stage::BeginTransaction)
    }
}

impl RelationshipCoordinator for SqliteRelationshipCoordinator<'_> {
    fn save_author(&self, author: &mut Author) -> RepoResult<()> {
        self.entities.save_author(author)
    }

    fn update_author(&self, author: &Author) -> RepoResult<()> {
        self.entities.update_author(author)
    }

    fn save_publisher(&self, publisher: &mut Publisher) -> RepoResult<()> {
        self.entities.save_publisher(publisher)
    }

    fn update_publisher(&self, publisher: &Publisher) -> RepoResult<()> {
        self.entities.update_publisher(publisher)
    }

    fn save_book(&self, book: &mut Book) -> RepoResult<BookWriteSummary> {
        book.validate()?;

        // Write lock is held from BEGIN; no read-to-write upgrade mid-call.
        let tx = self.begin(TransactionBehavior::Immediate)?;

        let book_id = insert_book_row(&tx, book).at(Stage::InsertBook)?;
        let authorship_rows =
            insert_authorships(&tx, book_id, &book.author_ids).at(Stage::InsertAuthorship)?;
        let published_rows_added =
            insert_published(&tx, &book.author_ids, book.publisher_id)
                .at(Stage::InsertPublished)?;

        tx.commit().at(Stage::Commit)?;

        book.id = book_id;
        Ok(BookWriteSummary {
            authorship_rows,
            published_rows_added,
        })
    }

    fn update_book(&self, _book: &Book) -> RepoResult<()> {
        Err(RepoError::NotImplemented("update_book"))
    }

    fn get_book_denormalized(&self, id: BookId) -> RepoResult<BookDenormalized> {
        let tx = self.begin(TransactionBehavior::Deferred)?;

        let (book, publisher) = require_found(
            load_book_with_publisher(&tx, id).at(Stage::LoadBook)?,
            EntityKind::Book,
            id,
        )?;
        let authors = authors_by_book(&tx, id).at(Stage::LoadBookAuthors)?;

        tx.commit().at(Stage::EndRead)?;
        Ok(BookDenormalized {
            book,
            authors,
            publisher,
        })
    }

    fn get_author_denormalized(&self, id: AuthorId) -> RepoResult<AuthorDenormalized> {
        let tx = self.begin(TransactionBehavior::Deferred)?;

        let author = require_found(
            load_author(&tx, id).at(Stage::LoadAuthor)?,
            EntityKind::Author,
            id,
        )?;
        let books = books_by_author(&tx, id).at(Stage::LoadAuthorBooks)?;

        tx.commit().at(Stage::EndRead)?;
        Ok(AuthorDenormalized { author, books })
    }

    fn get_publisher_denormalized(&self, id: PublisherId) -> RepoResult<PublisherDenormalized> {
        let tx = self.begin(TransactionBehavior::Deferred)?;

        let publisher = require_found(
            load_publisher(&tx, id).at(Stage::LoadPublisher)?,
            EntityKind::Publisher,
            id,
        )?;
        let authors = authors_by_publisher(&tx, id).at(Stage::LoadPublisherAuthors)?;
        let books = books_by_publisher(&tx, id).at(Stage::LoadPublisherBooks)?;

        tx.commit().at(Stage::EndRead)?;
        Ok(PublisherDenormalized {
            publisher,
            authors,
            books,
        })
    }
}

fn insert_book_row(conn: &Connection, book: &Book) -> rusqlite::Result<BookId> {
    conn.query_row(
        "INSERT INTO books (
            title,
            original_release,
            description,
            short_description,
            published,
            publisher_id,
            pages,
            seller_id
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)
        RETURNING id;",
        params![
            book.title.as_str(),
            book.original_release.as_str(),
            book.description.as_str(),
            book.short_description.as_str(),
            book.published.as_str(),
            book.publisher_id,
            book.pages,
            book.seller_id,
        ],
        |row| row.get(0),
    )
}

fn insert_authorships(
    conn: &Connection,
    book_id: BookId,
    author_ids: &[AuthorId],
) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT INTO authorship (book_id, author_id)
         VALUES (?1, ?2);",
    )?;
    let mut inserted = 0;
    for author_id in author_ids {
        inserted += stmt.execute(params![book_id, author_id])?;
    }
    Ok(inserted)
}

fn insert_published(
    conn: &Connection,
    author_ids: &[AuthorId],
    publisher_id: PublisherId,
) -> rusqlite::Result<usize> {
    let mut stmt = conn.prepare(
        "INSERT OR IGNORE INTO published (author_id, publisher_id)
         VALUES (?1, ?2);",
    )?;
    let mut inserted = 0;
    for author_id in author_ids {
        inserted += stmt.execute(params![author_id, publisher_id])?;
    }
    Ok(inserted)
}

fn load_book_with_publisher(
    conn: &Connection,
    id: BookId,
) -> rusqlite::Result<Option<(Book, Publisher)>> {
    conn.query_row(
        &format!(
            "SELECT {BOOK_COLUMNS}, {PUBLISHER_COLUMNS}
             FROM books
             INNER JOIN publishers ON publishers.id = books.publisher_id
             WHERE books.id = ?1;"
        ),
        [id],
        |row| Ok((book_from_row(row)?, publisher_from_row(row)?)),
    )
    .optional()
}
