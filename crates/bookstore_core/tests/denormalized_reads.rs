use bookstore_core::db::open_db_in_memory;
use bookstore_core::{
    Author, Book, EntityKind, Publisher, RelationshipCoordinator, RepoError,
    SqliteRelationshipCoordinator, Stage,
};
use rusqlite::Connection;

struct Fixture {
    dick: Author,
    borges: Author,
    penguin: Publisher,
}

fn seed(coordinator: &SqliteRelationshipCoordinator<'_>) -> Fixture {
    let mut dick = Author {
        biography: "a weird biography ...".to_string(),
        birthday: "16-12-1928".to_string(),
        death: Some("1982-12-1".to_string()),
        ..Author::new("Philip", "Dick")
    };
    let mut borges = Author::new("Jorge Luis", "Borges");
    let mut penguin = Publisher {
        slogan: "some slogan".to_string(),
        ..Publisher::new("Penguin")
    };
    coordinator.save_author(&mut dick).unwrap();
    coordinator.save_author(&mut borges).unwrap();
    coordinator.save_publisher(&mut penguin).unwrap();
    Fixture {
        dick,
        borges,
        penguin,
    }
}

#[test]
fn get_book_assembles_book_publisher_and_authors() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = SqliteRelationshipCoordinator::try_new(&conn).unwrap();
    let fixture = seed(&coordinator);

    let mut book = Book {
        pages: 256,
        published: "20-12-2021".to_string(),
        ..Book::new(
            "Flow My Tears, the Policeman Said",
            fixture.penguin.id,
            vec![fixture.dick.id, fixture.borges.id],
            1,
        )
    };
    coordinator.save_book(&mut book).unwrap();

    let view = coordinator.get_book_denormalized(book.id).unwrap();
    assert_eq!(view.book, book);
    assert_eq!(view.publisher, fixture.penguin);
    assert_eq!(view.authors, vec![fixture.dick, fixture.borges]);
}

#[test]
fn get_book_keeps_store_order_and_repeats() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = SqliteRelationshipCoordinator::try_new(&conn).unwrap();
    let fixture = seed(&coordinator);

    let author_ids = vec![fixture.borges.id, fixture.dick.id, fixture.borges.id];
    let mut book = Book::new("Anthology", fixture.penguin.id, author_ids.clone(), 1);
    coordinator.save_book(&mut book).unwrap();

    let view = coordinator.get_book_denormalized(book.id).unwrap();
    let ids: Vec<i64> = view.authors.iter().map(|author| author.id).collect();
    assert_eq!(ids, author_ids);
    assert_eq!(view.book.author_ids, author_ids);
}

#[test]
fn get_book_unknown_id_is_not_found() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = SqliteRelationshipCoordinator::try_new(&conn).unwrap();

    let err = coordinator.get_book_denormalized(77).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::Book,
            id: 77
        }
    ));
    assert!(conn.is_autocommit());
}

#[test]
fn get_book_without_authorship_rows_returns_empty_author_list() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = SqliteRelationshipCoordinator::try_new(&conn).unwrap();
    let fixture = seed(&coordinator);

    let mut book = Book::new("Lost credits", fixture.penguin.id, vec![fixture.dick.id], 1);
    coordinator.save_book(&mut book).unwrap();
    conn.execute("DELETE FROM authorship WHERE book_id = ?1;", [book.id])
        .unwrap();

    let view = coordinator.get_book_denormalized(book.id).unwrap();
    assert!(view.authors.is_empty());
    assert!(view.book.author_ids.is_empty());
    assert_eq!(view.publisher.id, fixture.penguin.id);
}

#[test]
fn undecodable_credit_row_is_a_storage_error_not_a_partial_view() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = SqliteRelationshipCoordinator::try_new(&conn).unwrap();
    let fixture = seed(&coordinator);

    let mut book = Book::new("Ubik", fixture.penguin.id, vec![fixture.dick.id], 1);
    coordinator.save_book(&mut book).unwrap();
    conn.execute_batch("PRAGMA foreign_keys = OFF;").unwrap();
    conn.execute(
        "INSERT INTO authorship (book_id, author_id) VALUES (?1, 'broken');",
        [book.id],
    )
    .unwrap();
    conn.execute_batch("PRAGMA foreign_keys = ON;").unwrap();

    let err = coordinator.get_book_denormalized(book.id).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::LoadBook));
    assert!(conn.is_autocommit());
}

#[test]
fn undecodable_related_row_fails_the_secondary_stage() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = SqliteRelationshipCoordinator::try_new(&conn).unwrap();
    let fixture = seed(&coordinator);

    let mut ubik = Book::new("Ubik", fixture.penguin.id, vec![fixture.dick.id], 1);
    let mut valis = Book::new("VALIS", fixture.penguin.id, vec![fixture.dick.id], 1);
    coordinator.save_book(&mut ubik).unwrap();
    coordinator.save_book(&mut valis).unwrap();

    // Only the book lists decode VALIS; its author and publisher rows stay valid.
    conn.execute("UPDATE books SET title = X'FF00' WHERE id = ?1;", [valis.id])
        .unwrap();
    let err = coordinator
        .get_author_denormalized(fixture.dick.id)
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::LoadAuthorBooks));
    let err = coordinator
        .get_publisher_denormalized(fixture.penguin.id)
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::LoadPublisherBooks));
    assert!(coordinator.get_book_denormalized(ubik.id).is_ok());

    // Only the author lists decode Dick once his death date is corrupt.
    conn.execute(
        "UPDATE authors SET death = X'FF00' WHERE id = ?1;",
        [fixture.dick.id],
    )
    .unwrap();
    let err = coordinator.get_book_denormalized(ubik.id).unwrap_err();
    assert_eq!(err.stage(), Some(Stage::LoadBookAuthors));
    let err = coordinator
        .get_publisher_denormalized(fixture.penguin.id)
        .unwrap_err();
    assert_eq!(err.stage(), Some(Stage::LoadPublisherAuthors));
    assert!(conn.is_autocommit());
}

#[test]
fn get_author_lists_every_crediting_book() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = SqliteRelationshipCoordinator::try_new(&conn).unwrap();
    let fixture = seed(&coordinator);

    let mut first = Book::new("Ubik", fixture.penguin.id, vec![fixture.dick.id], 1);
    let mut second = Book::new(
        "Collab",
        fixture.penguin.id,
        vec![fixture.borges.id, fixture.dick.id],
        1,
    );
    coordinator.save_book(&mut first).unwrap();
    coordinator.save_book(&mut second).unwrap();

    let view = coordinator.get_author_denormalized(fixture.dick.id).unwrap();
    assert_eq!(view.author, fixture.dick);
    assert_eq!(view.books, vec![first, second.clone()]);

    let view = coordinator
        .get_author_denormalized(fixture.borges.id)
        .unwrap();
    assert_eq!(view.books, vec![second]);
}

#[test]
fn get_author_without_books_and_unknown_author() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = SqliteRelationshipCoordinator::try_new(&conn).unwrap();
    let fixture = seed(&coordinator);

    let view = coordinator
        .get_author_denormalized(fixture.borges.id)
        .unwrap();
    assert!(view.books.is_empty());

    let err = coordinator.get_author_denormalized(500).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::Author,
            id: 500
        }
    ));
}

#[test]
fn get_publisher_lists_published_authors_and_owned_books() {
    let conn = open_db_in_memory().unwrap();
    let coordinator = SqliteRelationshipCoordinator::try_new(&conn).unwrap();
    let fixture = seed(&coordinator);
    let mut other = Publisher::new("Minotauro");
    coordinator.save_publisher(&mut other).unwrap();

    let mut first = Book::new("Ubik", fixture.penguin.id, vec![fixture.dick.id], 1);
    let mut second = Book::new("VALIS", fixture.penguin.id, vec![fixture.dick.id], 1);
    let mut third = Book::new("Ficciones", other.id, vec![fixture.borges.id], 1);
    coordinator.save_book(&mut first).unwrap();
    coordinator.save_book(&mut second).unwrap();
    coordinator.save_book(&mut third).unwrap();

    let view = coordinator
        .get_publisher_denormalized(fixture.penguin.id)
        .unwrap();
    assert_eq!(view.publisher, fixture.penguin);
    assert_eq!(view.authors, vec![fixture.dick]);
    assert_eq!(view.books, vec![first, second]);

    let view = coordinator.get_publisher_denormalized(other.id).unwrap();
    assert_eq!(view.authors, vec![fixture.borges]);
    assert_eq!(view.books, vec![third]);

    let err = coordinator.get_publisher_denormalized(404).unwrap_err();
    assert!(matches!(
        err,
        RepoError::NotFound {
            entity: EntityKind::Publisher,
            id: 404
        }
    ));
}

#[test]
fn concrete_scenario_round_trip() {
    let conn = open_db_in_memory().unwrap();
    conn.execute_batch(
        "INSERT INTO publishers (id, name) VALUES (12, 'Penguin');
         INSERT INTO authors (id, first_name, last_name) VALUES (7, 'Philip', 'Dick');
         INSERT INTO authors (id, first_name, last_name) VALUES (9, 'Jorge Luis', 'Borges');",
    )
    .unwrap();
    let coordinator = SqliteRelationshipCoordinator::try_new(&conn).unwrap();

    let mut book = Book::new("Flow My Tears...", 12, vec![7, 9], 1);
    coordinator.save_book(&mut book).unwrap();
    assert!(book.id > 0);

    let view = coordinator.get_book_denormalized(book.id).unwrap();
    assert_eq!(view.authors.len(), 2);
    let mut ids: Vec<i64> = view.authors.iter().map(|author| author.id).collect();
    ids.sort_unstable();
    assert_eq!(ids, vec![7, 9]);
    assert_eq!(view.publisher.id, 12);
    assert_eq!(count(&conn, "published"), 2);
}

fn count(conn: &Connection, table: &str) -> i64 {
    conn.query_row(&format!("SELECT COUNT(*) FROM {table};"), [], |row| {
        row.get(0)
    })
    .unwrap()
}
