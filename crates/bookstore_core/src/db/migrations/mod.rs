//! Catalog schema migrations.
//!
//! # Responsibility
//! - List the embedded schema steps in version order.
//! - Bring a connection up to [`latest_version`] in one write transaction.
//!
//! # Invariants
//! - Versions strictly increase; `PRAGMA user_version` holds the last one applied.
//! - A database stamped with a newer version is refused, never downgraded.

use crate::db::{DbError, DbResult};
use log::info;
use rusqlite::{Connection, TransactionBehavior};

struct Migration {
    version: u32,
    name: &'static str,
    sql: &'static str,
}

const MIGRATIONS: &[Migration] = &[
    Migration {
        version: 1,
        name: "entities",
        sql: include_str!("0001_entities.sql"),
    },
    Migration {
        version: 2,
        name: "relationships",
        sql: include_str!("0002_relationships.sql"),
    },
];

/// Schema version this build writes.
pub fn latest_version() -> u32 {
    MIGRATIONS.last().map_or(0, |migration| migration.version)
}

/// Applies every migration newer than the stored schema version.
///
/// The version is re-read under the write lock, so concurrent openers of
/// one file apply each step once.
pub fn apply_migrations(conn: &mut Connection) -> DbResult<()> {
    let latest = latest_version();
    if check_version(stored_version(conn)?, latest)? {
        return Ok(());
    }

    let tx = conn.transaction_with_behavior(TransactionBehavior::Immediate)?;
    let from_version = stored_version(&tx)?;
    if check_version(from_version, latest)? {
        return Ok(());
    }

    for migration in MIGRATIONS.iter().filter(|m| m.version > from_version) {
        tx.execute_batch(migration.sql)?;
        tx.pragma_update(None, "user_version", migration.version)?;
        info!(
            "event=db_migrate_step module=db status=ok version={} name={}",
            migration.version, migration.name
        );
    }
    tx.commit()?;

    info!("event=db_migrate module=db status=ok from_version={from_version} to_version={latest}");
    Ok(())
}

/// `Ok(true)` when the schema is current, an error when it is newer.
fn check_version(stored: u32, latest: u32) -> DbResult<bool> {
    if stored > latest {
        return Err(DbError::UnsupportedSchemaVersion {
            db_version: stored,
            latest_supported: latest,
        });
    }
    Ok(stored == latest)
}

fn stored_version(conn: &Connection) -> DbResult<u32> {
    Ok(conn.pragma_query_value(None, "user_version", |row| row.get(0))?)
}

#[cfg(test)]
mod tests {
    use super::{check_version, MIGRATIONS};

    #[test]
    fn versions_strictly_increase_from_one() {
        for (index, migration) in MIGRATIONS.iter().enumerate() {
            assert_eq!(migration.version as usize, index + 1, "{}", migration.name);
        }
    }

    #[test]
    fn check_version_refuses_newer_schemas() {
        assert!(!check_version(0, 2).unwrap());
        assert!(check_version(2, 2).unwrap());
        assert!(check_version(3, 2).is_err());
    }
}
