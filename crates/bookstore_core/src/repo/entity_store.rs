//! Entity store: single-row catalog persistence.
//!
//! # Responsibility
//! - Insert authors and publishers, assigning store-generated ids.
//! - Point reads for authors, publishers and books.
//! - Secondary list reads through the `authorship` and `published`
//!   junctions.
//! - Own the column lists and row decoders that the relationship
//!   coordinator reuses inside its transactions.
//!
//! # Invariants
//! - Ids are written back only after the insert succeeded.
//! - List reads return rows in junction/row-id order, untouched.
//! - Update entry points are explicit `NotImplemented` placeholders.

use super::{
    ensure_catalog_connection_ready, AtStage, EntityKind, RepoError, RepoResult, Stage,
};
use crate::model::author::Author;
use crate::model::book::Book;
use crate::model::publisher::Publisher;
use crate::model::{AuthorId, BookId, PublisherId};
use rusqlite::types::Type;
use rusqlite::{params, Connection, OptionalExtension, Row};

pub(crate) const AUTHOR_COLUMNS: &str = "authors.id AS author_id,
    authors.first_name AS author_first_name,
    authors.last_name AS author_last_name,
    authors.biography AS author_biography,
    authors.birthday AS author_birthday,
    authors.death AS author_death";

pub(crate) const PUBLISHER_COLUMNS: &str = "publishers.id AS publisher_id,
    publishers.name AS publisher_name,
    publishers.description AS publisher_description,
    publishers.slogan AS publisher_slogan,
    publishers.founded AS publisher_founded";

// `credits` keeps the correlated subquery apart from an outer `authorship` join.
pub(crate) const BOOK_COLUMNS: &str = "books.id AS book_id,
    books.title AS book_title,
    books.original_release AS book_original_release,
    books.description AS book_description,
    books.short_description AS book_short_description,
    books.published AS book_published,
    books.publisher_id AS book_publisher_id,
    books.pages AS book_pages,
    books.seller_id AS book_seller_id,
    (
        SELECT group_concat(credits.author_id, ',' ORDER BY credits.id)
        FROM authorship credits
        WHERE credits.book_id = books.id
    ) AS book_author_ids";

/// Repository interface for single-entity catalog operations.
pub trait EntityStore {
    /// Inserts one author and assigns the generated id onto `author`.
    fn save_author(&self, author: &mut Author) -> RepoResult<()>;
    /// Accepted by the contract; performs no write.
    fn update_author(&self, author: &Author) -> RepoResult<()>;
    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>>;

    /// Inserts one publisher and assigns the generated id onto `publisher`.
    fn save_publisher(&self, publisher: &mut Publisher) -> RepoResult<()>;
    /// Accepted by the contract; performs no write.
    fn update_publisher(&self, publisher: &Publisher) -> RepoResult<()>;
    fn get_publisher(&self, id: PublisherId) -> RepoResult<Option<Publisher>>;

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>>;

    /// Books crediting the author, one entry per authorship row.
    fn list_books_by_author(&self, author_id: AuthorId) -> RepoResult<Vec<Book>>;
    /// Authors credited on the book, one entry per authorship row.
    fn list_authors_by_book(&self, book_id: BookId) -> RepoResult<Vec<Author>>;
    /// Authors with at least one book at the publisher.
    fn list_authors_by_publisher(&self, publisher_id: PublisherId) -> RepoResult<Vec<Author>>;
    /// Books owned by the publisher.
    fn list_books_by_publisher(&self, publisher_id: PublisherId) -> RepoResult<Vec<Book>>;
}

/// SQLite-backed entity store.
pub struct SqliteEntityStore<'conn> {
    conn: &'conn Connection,
}

impl<'conn> SqliteEntityStore<'conn> {
    /// Creates a store from a migrated connection.
    ///
    /// # Errors
    /// - Storage error at [`Stage::CheckConnection`] when the schema is not
    ///   current or foreign keys are off.
    pub fn try_new(conn: &'conn Connection) -> RepoResult<Self> {
        ensure_catalog_connection_ready(conn)?;
        Ok(Self { conn })
    }
}

impl EntityStore for SqliteEntityStore<'_> {
    fn save_author(&self, author: &mut Author) -> RepoResult<()> {
        author.validate()?;

        let id: AuthorId = self
            .conn
            .query_row(
                "INSERT INTO authors (
                    first_name,
                    last_name,
                    biography,
                    birthday,
                    death
                ) VALUES (?1, ?2, ?3, ?4, ?5)
                RETURNING id;",
                params![
                    author.first_name.as_str(),
                    author.last_name.as_str(),
                    author.biography.as_str(),
                    author.birthday.as_str(),
                    author.death.as_deref(),
                ],
                |row| row.get(0),
            )
            .at(Stage::InsertAuthor)?;

        author.id = id;
        Ok(())
    }

    fn update_author(&self, _author: &Author) -> RepoResult<()> {
        Err(RepoError::NotImplemented("update_author"))
    }

    fn get_author(&self, id: AuthorId) -> RepoResult<Option<Author>> {
        load_author(self.conn, id).at(Stage::LoadAuthor)
    }

    fn save_publisher(&self, publisher: &mut Publisher) -> RepoResult<()> {
        publisher.validate()?;

        let id: PublisherId = self
            .conn
            .query_row(
                "INSERT INTO publishers (
                    name,
                    description,
                    slogan,
                    founded
                ) VALUES (?1, ?2, ?3, ?4)
                RETURNING id;",
                params![
                    publisher.name.as_str(),
                    publisher.description.as_str(),
                    publisher.slogan.as_str(),
                    publisher.founded.as_str(),
                ],
                |row| row.get(0),
            )
            .at(Stage::InsertPublisher)?;

        publisher.id = id;
        Ok(())
    }

    fn update_publisher(&self, _publisher: &Publisher) -> RepoResult<()> {
        Err(RepoError::NotImplemented("update_publisher"))
    }

    fn get_publisher(&self, id: PublisherId) -> RepoResult<Option<Publisher>> {
        load_publisher(self.conn, id).at(Stage::LoadPublisher)
    }

    fn get_book(&self, id: BookId) -> RepoResult<Option<Book>> {
        load_book(self.conn, id).at(Stage::LoadBook)
    }

    fn list_books_by_author(&self, author_id: AuthorId) -> RepoResult<Vec<Book>> {
        books_by_author(self.conn, author_id).at(Stage::LoadAuthorBooks)
    }

    fn list_authors_by_book(&self, book_id: BookId) -> RepoResult<Vec<Author>> {
        authors_by_book(self.conn, book_id).at(Stage::LoadBookAuthors)
    }

    fn list_authors_by_publisher(&self, publisher_id: PublisherId) -> RepoResult<Vec<Author>> {
        authors_by_publisher(self.conn, publisher_id).at(Stage::LoadPublisherAuthors)
    }

    fn list_books_by_publisher(&self, publisher_id: PublisherId) -> RepoResult<Vec<Book>> {
        books_by_publisher(self.conn, publisher_id).at(Stage::LoadPublisherBooks)
    }
}

/// Resolves an `Option` from a point read into a `NotFound` error.
pub(crate) fn require_found<T>(value: Option<T>, entity: EntityKind, id: i64) -> RepoResult<T> {
    value.ok_or(RepoError::NotFound { entity, id })
}

pub(crate) fn load_author(conn: &Connection, id: AuthorId) -> rusqlite::Result<Option<Author>> {
    conn.query_row(
        &format!("SELECT {AUTHOR_COLUMNS} FROM authors WHERE authors.id = ?1;"),
        [id],
        author_from_row,
    )
    .optional()
}

pub(crate) fn load_publisher(
    conn: &Connection,
    id: PublisherId,
) -> rusqlite::Result<Option<Publisher>> {
    conn.query_row(
        &format!("SELECT {PUBLISHER_COLUMNS} FROM publishers WHERE publishers.id = ?1;"),
        [id],
        publisher_from_row,
    )
    .optional()
}

pub(crate) fn load_book(conn: &Connection, id: BookId) -> rusqlite::Result<Option<Book>> {
    conn.query_row(
        &format!("SELECT {BOOK_COLUMNS} FROM books WHERE books.id = ?1;"),
        [id],
        book_from_row,
    )
    .optional()
}

pub(crate) fn authors_by_book(
    conn: &Connection,
    book_id: BookId,
) -> rusqlite::Result<Vec<Author>> {
    collect_rows(
        conn,
        &format!(
            "SELECT {AUTHOR_COLUMNS}
             FROM authorship
             INNER JOIN authors ON authors.id = authorship.author_id
             WHERE authorship.book_id = ?1
             ORDER BY authorship.id ASC;"
        ),
        book_id,
        author_from_row,
    )
}

pub(crate) fn books_by_author(
    conn: &Connection,
    author_id: AuthorId,
) -> rusqlite::Result<Vec<Book>> {
    collect_rows(
        conn,
        &format!(
            "SELECT {BOOK_COLUMNS}
             FROM authorship
             INNER JOIN books ON books.id = authorship.book_id
             WHERE authorship.author_id = ?1
             ORDER BY authorship.id ASC;"
        ),
        author_id,
        book_from_row,
    )
}

pub(crate) fn authors_by_publisher(
    conn: &Connection,
    publisher_id: PublisherId,
) -> rusqlite::Result<Vec<Author>> {
    collect_rows(
        conn,
        &format!(
            "SELECT {AUTHOR_COLUMNS}
             FROM published
             INNER JOIN authors ON authors.id = published.author_id
             WHERE published.publisher_id = ?1
             ORDER BY published.rowid ASC;"
        ),
        publisher_id,
        author_from_row,
    )
}

pub(crate) fn books_by_publisher(
    conn: &Connection,
    publisher_id: PublisherId,
) -> rusqlite::Result<Vec<Book>> {
    collect_rows(
        conn,
        &format!(
            "SELECT {BOOK_COLUMNS}
             FROM books
             WHERE books.publisher_id = ?1
             ORDER BY books.id ASC;"
        ),
        publisher_id,
        book_from_row,
    )
}

fn collect_rows<T>(
    conn: &Connection,
    sql: &str,
    id: i64,
    decode: fn(&Row<'_>) -> rusqlite::Result<T>,
) -> rusqlite::Result<Vec<T>> {
    let mut stmt = conn.prepare(sql)?;
    let mut rows = stmt.query([id])?;
    let mut items = Vec::new();
    while let Some(row) = rows.next()? {
        items.push(decode(row)?);
    }
    Ok(items)
}

pub(crate) fn author_from_row(row: &Row<'_>) -> rusqlite::Result<Author> {
    Ok(Author {
        id: row.get("author_id")?,
        first_name: row.get("author_first_name")?,
        last_name: row.get("author_last_name")?,
        biography: row.get("author_biography")?,
        birthday: row.get("author_birthday")?,
        death: row.get("author_death")?,
    })
}

pub(crate) fn publisher_from_row(row: &Row<'_>) -> rusqlite::Result<Publisher> {
    Ok(Publisher {
        id: row.get("publisher_id")?,
        name: row.get("publisher_name")?,
        description: row.get("publisher_description")?,
        slogan: row.get("publisher_slogan")?,
        founded: row.get("publisher_founded")?,
    })
}

pub(crate) fn book_from_row(row: &Row<'_>) -> rusqlite::Result<Book> {
    let author_ids_text: Option<String> = row.get("book_author_ids")?;
    let author_ids = parse_author_ids(author_ids_text.as_deref()).map_err(|err| {
        let index = row.as_ref().column_index("book_author_ids").unwrap_or(0);
        rusqlite::Error::FromSqlConversionFailure(index, Type::Text, Box::new(err))
    })?;

    Ok(Book {
        id: row.get("book_id")?,
        title: row.get("book_title")?,
        original_release: row.get("book_original_release")?,
        description: row.get("book_description")?,
        short_description: row.get("book_short_description")?,
        published: row.get("book_published")?,
        publisher_id: row.get("book_publisher_id")?,
        pages: row.get("book_pages")?,
        author_ids,
        seller_id: row.get("book_seller_id")?,
    })
}

fn parse_author_ids(value: Option<&str>) -> Result<Vec<AuthorId>, std::num::ParseIntError> {
    match value {
        None | Some("") => Ok(Vec::new()),
        Some(text) => text.split(',').map(str::parse).collect(),
    }
}
