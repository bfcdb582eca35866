use bookstore_core::db::migrations::latest_version;
use bookstore_core::db::{open_db_in_memory, DbError};
use bookstore_core::{
    Author, EntityStore, Publisher, RepoError, SqliteEntityStore, SqliteRelationshipCoordinator,
    Stage, ValidationError,
};
use rusqlite::Connection;

fn philip_dick() -> Author {
    Author {
        id: 0,
        first_name: "Philip".to_string(),
        last_name: "Dick".to_string(),
        biography: "a weird biography ...".to_string(),
        birthday: "16-12-1928".to_string(),
        death: Some("1982-12-1".to_string()),
    }
}

fn penguin() -> Publisher {
    Publisher {
        id: 0,
        name: "Penguin".to_string(),
        description: "publisher with the penguin mascot".to_string(),
        slogan: "some slogan".to_string(),
        founded: "12-12-2000".to_string(),
    }
}

#[test]
fn stores_reject_connections_without_catalog_schema() {
    let conn = Connection::open_in_memory().unwrap();

    match SqliteEntityStore::try_new(&conn) {
        Err(RepoError::Storage {
            stage: Stage::CheckConnection,
            source: DbError::SchemaNotCurrent {
                db_version,
                expected,
            },
        }) => {
            assert_eq!(db_version, 0);
            assert_eq!(expected, latest_version());
        }
        Err(other) => panic!("unexpected error: {other}"),
        Ok(_) => panic!("unmigrated connection was accepted"),
    }
    assert!(SqliteRelationshipCoordinator::try_new(&conn).is_err());
}

#[test]
fn stores_reject_connections_with_foreign_keys_off() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();

    let err = SqliteRelationshipCoordinator::try_new(&conn)
        .err()
        .expect("connection without foreign keys was accepted");
    assert_eq!(err.stage(), Some(Stage::CheckConnection));
    assert!(matches!(
        err,
        RepoError::Storage {
            source: DbError::ForeignKeysDisabled,
            ..
        }
    ));

    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();
    assert!(SqliteEntityStore::try_new(&conn).is_ok());
}

#[test]
fn save_author_assigns_positive_id_and_keeps_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();

    let input = philip_dick();
    let mut author = input.clone();
    store.save_author(&mut author).unwrap();

    assert!(author.id > 0);
    assert_eq!(Author { id: 0, ..author.clone() }, input);

    let loaded = store.get_author(author.id).unwrap().unwrap();
    assert_eq!(loaded, author);
}

#[test]
fn save_author_without_death_date_reads_back_none() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();

    let mut author = Author::new("Ursula", "Le Guin");
    store.save_author(&mut author).unwrap();

    let loaded = store.get_author(author.id).unwrap().unwrap();
    assert_eq!(loaded.death, None);
    assert_eq!(loaded.first_name, "Ursula");
}

#[test]
fn consecutive_saves_get_distinct_ids() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();

    let mut first = Author::new("Jorge Luis", "Borges");
    let mut second = Author::new("Stanislaw", "Lem");
    store.save_author(&mut first).unwrap();
    store.save_author(&mut second).unwrap();

    assert!(first.id > 0);
    assert!(second.id > first.id);
}

#[test]
fn save_publisher_assigns_positive_id_and_keeps_fields() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();

    let mut publisher = penguin();
    store.save_publisher(&mut publisher).unwrap();

    assert!(publisher.id > 0);
    let loaded = store.get_publisher(publisher.id).unwrap().unwrap();
    assert_eq!(loaded, publisher);
}

#[test]
fn validation_failure_blocks_insert_and_keeps_id_unset() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();

    let mut author = Author::new("  ", "Nobody");
    let err = store.save_author(&mut author).unwrap_err();
    assert!(matches!(
        err,
        RepoError::Validation(ValidationError::BlankField("first_name"))
    ));
    assert_eq!(author.id, 0);

    let mut publisher = Publisher::new("");
    let err = store.save_publisher(&mut publisher).unwrap_err();
    assert!(matches!(err, RepoError::Validation(_)));

    let authors: i64 = conn
        .query_row("SELECT COUNT(*) FROM authors;", [], |row| row.get(0))
        .unwrap();
    assert_eq!(authors, 0);
}

#[test]
fn storage_failure_names_insert_stage() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch("DROP TABLE published; DROP TABLE authorship; DROP TABLE authors;")
        .unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();

    let mut author = philip_dick();
    let err = store.save_author(&mut author).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::InsertAuthor));
    assert_eq!(author.id, 0);
}

#[test]
fn point_reads_return_none_for_unknown_ids() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();

    assert!(store.get_author(42).unwrap().is_none());
    assert!(store.get_publisher(42).unwrap().is_none());
    assert!(store.get_book(42).unwrap().is_none());
}

#[test]
fn updates_are_explicitly_not_implemented_and_write_nothing() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();

    let mut author = philip_dick();
    store.save_author(&mut author).unwrap();
    let mut changed = author.clone();
    changed.biography = "rewritten".to_string();

    let err = store.update_author(&changed).unwrap_err();
    assert!(matches!(err, RepoError::NotImplemented("update_author")));
    assert_eq!(store.get_author(author.id).unwrap().unwrap(), author);

    let mut publisher = penguin();
    store.save_publisher(&mut publisher).unwrap();
    let err = store.update_publisher(&publisher).unwrap_err();
    assert!(matches!(err, RepoError::NotImplemented("update_publisher")));
}

#[test]
fn list_reads_follow_junction_rows() {
    let conn = open_db_in_memory().unwrap();
    let store = SqliteEntityStore::try_new(&conn).unwrap();

    let mut author = philip_dick();
    store.save_author(&mut author).unwrap();
    let mut publisher = penguin();
    store.save_publisher(&mut publisher).unwrap();

    conn.execute(
        "INSERT INTO books (title, publisher_id, pages, seller_id) VALUES ('Ubik', ?1, 202, 1);",
        [publisher.id],
    )
    .unwrap();
    let book_id = conn.last_insert_rowid();
    conn.execute(
        "INSERT INTO authorship (book_id, author_id) VALUES (?1, ?2);",
        [book_id, author.id],
    )
    .unwrap();
    conn.execute(
        "INSERT INTO published (author_id, publisher_id) VALUES (?1, ?2);",
        [author.id, publisher.id],
    )
    .unwrap();

    let books = store.list_books_by_author(author.id).unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].id, book_id);
    assert_eq!(books[0].title, "Ubik");
    assert_eq!(books[0].pages, 202);
    assert_eq!(books[0].author_ids, vec![author.id]);

    let authors = store.list_authors_by_book(book_id).unwrap();
    assert_eq!(authors, vec![author.clone()]);

    let authors = store.list_authors_by_publisher(publisher.id).unwrap();
    assert_eq!(authors, vec![author]);

    let books = store.list_books_by_publisher(publisher.id).unwrap();
    assert_eq!(books.len(), 1);
    assert_eq!(books[0].publisher_id, publisher.id);

    assert!(store.list_books_by_author(999).unwrap().is_empty());
}
