//! SQLite implementation of the storage port.
//!
//! Partition creation order is the `partitions` rowid; entry order is the
//! AUTOINCREMENT `entries.seq`, so a replaced entry always moves to the end.

use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;
use tokio_rusqlite::params;
use tokio_rusqlite::rusqlite::{self, OptionalExtension};

use super::connection::CacheDb;
use super::{CacheStorage, Partition};
use crate::Error;
use crate::http::{RequestKey, Response};

/// Handle to one partition in a [`CacheDb`].
#[derive(Clone, Debug)]
pub struct SqlitePartition {
    db: CacheDb,
    name: String,
}

fn decode_headers(json: &str) -> Result<Vec<(String, String)>, Error> {
    serde_json::from_str(json).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))
}

fn encode_headers(headers: &[(String, String)]) -> Result<String, Error> {
    serde_json::to_string(headers).map_err(|e| Error::CorruptEntry(format!("headers: {e}")))
}

/// Replace the entry for `key`; the new row takes the next `seq`.
fn insert_entry(
    conn: &rusqlite::Connection, name: &str, key: &RequestKey, headers_json: &str, response: &Response,
) -> Result<(), rusqlite::Error> {
    let key_hash = key.hash();
    conn.execute("DELETE FROM entries WHERE partition = ?1 AND key_hash = ?2", params![name, key_hash])?;
    conn.execute(
        "INSERT INTO entries (
            partition, key_hash, method, url, status, status_text,
            headers_json, body, response_url, stored_at
        ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10)",
        params![
            name,
            key_hash,
            key.method,
            key.url,
            response.status,
            response.status_text,
            headers_json,
            response.body.as_ref(),
            response.url,
            chrono::Utc::now().to_rfc3339(),
        ],
    )?;
    Ok(())
}

fn ensure_partition(conn: &rusqlite::Connection, name: &str) -> Result<(), rusqlite::Error> {
    conn.execute(
        "INSERT OR IGNORE INTO partitions (name, created_at) VALUES (?1, ?2)",
        params![name, chrono::Utc::now().to_rfc3339()],
    )?;
    Ok(())
}

#[async_trait]
impl Partition for SqlitePartition {
    fn name(&self) -> &str {
        &self.name
    }

    async fn get(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let name = self.name.clone();
        let key_hash = key.hash();
        let row = self
            .db
            .conn
            .call(move |conn| -> Result<Option<(u16, String, String, Vec<u8>, Option<String>)>, Error> {
                let mut stmt = conn.prepare(
                    "SELECT status, status_text, headers_json, body, response_url
                     FROM entries WHERE partition = ?1 AND key_hash = ?2",
                )?;
                let row = stmt
                    .query_row(params![name, key_hash], |row| {
                        Ok((row.get(0)?, row.get(1)?, row.get(2)?, row.get(3)?, row.get(4)?))
                    })
                    .optional()?;
                Ok(row)
            })
            .await
            .map_err(Error::from)?;

        match row {
            Some((status, status_text, headers_json, body, url)) => Ok(Some(Response {
                status,
                status_text,
                headers: decode_headers(&headers_json)?,
                body: Bytes::from(body),
                url,
            })),
            None => Ok(None),
        }
    }

    async fn put(&self, key: RequestKey, response: Response) -> Result<(), Error> {
        self.put_all(vec![(key, response)]).await
    }

    async fn put_all(&self, entries: Vec<(RequestKey, Response)>) -> Result<(), Error> {
        let name = self.name.clone();
        let rows = entries
            .into_iter()
            .map(|(key, response)| Ok((key, encode_headers(&response.headers)?, response)))
            .collect::<Result<Vec<_>, Error>>()?;
        self.db
            .conn
            .call(move |conn| -> Result<(), Error> {
                let tx = conn.transaction()?;
                ensure_partition(&tx, &name)?;
                for (key, headers_json, response) in &rows {
                    insert_entry(&tx, &name, key, headers_json, response)?;
                }
                tx.commit()?;
                Ok(())
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, key: &RequestKey) -> Result<bool, Error> {
        let name = self.name.clone();
        let key_hash = key.hash();
        self.db
            .conn
            .call(move |conn| -> Result<bool, Error> {
                let count =
                    conn.execute("DELETE FROM entries WHERE partition = ?1 AND key_hash = ?2", params![name, key_hash])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<RequestKey>, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<Vec<RequestKey>, Error> {
                let mut stmt = conn.prepare("SELECT method, url FROM entries WHERE partition = ?1 ORDER BY seq ASC")?;
                let rows = stmt.query_map(params![name], |row| Ok(RequestKey { method: row.get(0)?, url: row.get(1)? }))?;
                Ok(rows.collect::<Result<Vec<_>, _>>()?)
            })
            .await
            .map_err(Error::from)
    }

    async fn len(&self) -> Result<usize, Error> {
        let name = self.name.clone();
        self.db
            .conn
            .call(move |conn| -> Result<usize, Error> {
                let count: i64 =
                    conn.query_row("SELECT COUNT(*) FROM entries WHERE partition = ?1", params![name], |row| row.get(0))?;
                Ok(count as usize)
            })
            .await
            .map_err(Error::from)
    }
}

#[async_trait]
impl CacheStorage for CacheDb {
    async fn open(&self, name: &str) -> Result<Arc<dyn Partition>, Error> {
        let owned = name.to_string();
        self.conn
            .call(move |conn| -> Result<(), Error> {
                ensure_partition(conn, &owned)?;
                Ok(())
            })
            .await
            .map_err(Error::from)?;
        Ok(Arc::new(SqlitePartition { db: self.clone(), name: name.to_string() }))
    }

    async fn has(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let exists: bool = conn.query_row(
                    "SELECT EXISTS(SELECT 1 FROM partitions WHERE name = ?1)",
                    params![name],
                    |row| row.get(0),
                )?;
                Ok(exists)
            })
            .await
            .map_err(Error::from)
    }

    async fn delete(&self, name: &str) -> Result<bool, Error> {
        let name = name.to_string();
        self.conn
            .call(move |conn| -> Result<bool, Error> {
                let count = conn.execute("DELETE FROM partitions WHERE name = ?1", params![name])?;
                Ok(count > 0)
            })
            .await
            .map_err(Error::from)
    }

    async fn keys(&self) -> Result<Vec<String>, Error> {
        self.conn
            .call(|conn| -> Result<Vec<String>, Error> {
                let mut stmt = conn.prepare("SELECT name FROM partitions ORDER BY rowid ASC")?;
                let rows = stmt.query_map([], |row| row.get(0))?;
                Ok(rows.collect::<Result<Vec<String>, _>>()?)
            })
            .await
            .map_err(Error::from)
    }

    async fn match_any(&self, key: &RequestKey) -> Result<Option<Response>, Error> {
        let key_hash = key.hash();
        let partition = self
            .conn
            .call(move |conn| -> Result<Option<String>, Error> {
                let name = conn
                    .query_row(
                        "SELECT p.name FROM partitions p
                         JOIN entries e ON e.partition = p.name
                         WHERE e.key_hash = ?1
                         ORDER BY p.rowid ASC LIMIT 1",
                        params![key_hash],
                        |row| row.get(0),
                    )
                    .optional()?;
                Ok(name)
            })
            .await
            .map_err(Error::from)?;

        match partition {
            Some(name) => SqlitePartition { db: self.clone(), name }.get(key).await,
            None => Ok(None),
        }
    }
}
