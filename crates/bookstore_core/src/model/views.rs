//! Junction rows and denormalized read views.
//!
//! # Invariants
//! - Views are built per request from committed rows and never written back.
//! - Related lists keep store-return order; nothing is re-sorted or
//!   de-duplicated while assembling.

use super::author::Author;
use super::book::Book;
use super::publisher::Publisher;
use super::{AuthorId, BookId, PublisherId};
use serde::{Deserialize, Serialize};

/// One `authorship` row: a book credited to an author.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Authorship {
    pub book_id: BookId,
    pub author_id: AuthorId,
}

/// One `published` row: an author has at least one book with a publisher.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Published {
    pub author_id: AuthorId,
    pub publisher_id: PublisherId,
}

/// A book with its publisher and credited authors.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct BookDenormalized {
    pub book: Book,
    pub authors: Vec<Author>,
    pub publisher: Publisher,
}

/// An author with every book crediting them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorDenormalized {
    pub author: Author,
    pub books: Vec<Book>,
}

/// A publisher with the authors it has published and its books.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublisherDenormalized {
    pub publisher: Publisher,
    pub authors: Vec<Author>,
    pub books: Vec<Book>,
}
