use std::fmt;
use std::path::Path;

use rusqlite::{params, Connection};

use super::table::Document;
use super::RepositoryError;

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS documents (
    collection TEXT NOT NULL,
    id TEXT NOT NULL,
    seq INTEGER NOT NULL,
    body TEXT NOT NULL,
    PRIMARY KEY (collection, id)
)";

/// One pending change to the durable copy.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Write {
    Put {
        collection: &'static str,
        id: String,
        seq: i64,
        body: String,
    },
    Delete {
        collection: &'static str,
        id: String,
    },
}

impl Write {
    pub fn put<T: Document>(row: &T, seq: i64) -> Result<Self, RepositoryError> {
        Ok(Write::Put {
            collection: T::COLLECTION,
            id: row.key().to_string(),
            seq,
            body: row.encode()?,
        })
    }

    pub fn delete<T: Document>(id: &str) -> Self {
        Write::Delete {
            collection: T::COLLECTION,
            id: id.to_string(),
        }
    }
}

/// SQLite copy of every document. Writes land here, in one transaction per repository call,
/// before the in-memory tables change. A detached journal keeps nothing.
#[derive(Default)]
pub(super) struct Journal {
    conn: Option<Connection>,
}

impl fmt::Debug for Journal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Journal")
            .field("durable", &self.conn.is_some())
            .finish()
    }
}

impl Journal {
    pub fn open(path: &Path) -> Result<Self, RepositoryError> {
        let conn = Connection::open(path).map_err(RepositoryError::unavailable)?;
        conn.execute_batch(SCHEMA)
            .map_err(RepositoryError::unavailable)?;
        Ok(Self { conn: Some(conn) })
    }

    /// Stored rows of one collection in insertion order.
    pub fn load(&self, collection: &str) -> Result<Vec<(i64, String)>, RepositoryError> {
        let Some(conn) = &self.conn else {
            return Ok(Vec::new());
        };
        let mut statement = conn
            .prepare("SELECT seq, body FROM documents WHERE collection = ?1 ORDER BY seq")
            .map_err(RepositoryError::unavailable)?;
        let rows = statement
            .query_map([collection], |row| Ok((row.get(0)?, row.get(1)?)))
            .map_err(RepositoryError::unavailable)?;
        rows.collect::<Result<Vec<_>, _>>()
            .map_err(RepositoryError::unavailable)
    }

    /// Applies every write or none of them.
    pub fn commit(&mut self, writes: &[Write]) -> Result<(), RepositoryError> {
        let Some(conn) = self.conn.as_mut() else {
            return Ok(());
        };
        if writes.is_empty() {
            return Ok(());
        }

        let tx = conn.transaction().map_err(RepositoryError::unavailable)?;
        for write in writes {
            match write {
                Write::Put {
                    collection,
                    id,
                    seq,
                    body,
                } => tx.execute(
                    "INSERT INTO documents (collection, id, seq, body) VALUES (?1, ?2, ?3, ?4)
                     ON CONFLICT (collection, id) DO UPDATE SET body = excluded.body",
                    params![collection, id, seq, body],
                ),
                Write::Delete { collection, id } => tx.execute(
                    "DELETE FROM documents WHERE collection = ?1 AND id = ?2",
                    params![collection, id],
                ),
            }
            .map_err(RepositoryError::unavailable)?;
        }
        tx.commit().map_err(RepositoryError::unavailable)
    }
}
