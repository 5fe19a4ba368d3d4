//! SQLite-backed [`EventStore`].
//!
//! A single [`std::sync::Mutex`] around the connection serializes all
//! mutating access; `rusqlite::Connection` is `!Sync` so this is the
//! simplest correct option and keeps replacement-rule transactions atomic
//! without relying on SQLite's own locking granularity.

use std::path::Path;
use std::sync::Mutex;

use rusqlite::{params, Connection, OptionalExtension};
use starling_crypto::{Hash, PeerId, Signature};
use starling_types::{classify, constants, d_tag_value, Filter, KindClass, SignedMessage, Tag};

use crate::error::{Result, StoreError};
use crate::schema::initialize_schema;
use crate::traits::{EventStore, PutOutcome};

pub struct SqliteEventStore {
    conn: Mutex<Connection>,
}

impl SqliteEventStore {
    pub fn open(path: impl AsRef<Path>) -> Result<Self> {
        let conn = Connection::open(path)?;
        initialize_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    /// In-memory store. Acceptable only as a test mode (§4.2); data does
    /// not survive process restart.
    pub fn open_in_memory() -> Result<Self> {
        let conn = Connection::open_in_memory()?;
        initialize_schema(&conn)?;
        Ok(Self { conn: Mutex::new(conn) })
    }

    fn lock(&self) -> Result<std::sync::MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|e| StoreError::LockPoisoned(e.to_string()))
    }
}

fn insert_row(tx: &rusqlite::Transaction<'_>, msg: &SignedMessage) -> Result<()> {
    let tags_json = serde_json::to_string(&msg.tags)?;
    tx.execute(
        "INSERT INTO events (id, author, created_at, kind, d_tag, tags, content, signature)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8)",
        params![
            msg.id.0.to_vec(),
            msg.author.as_bytes().to_vec(),
            msg.created_at as i64,
            msg.kind,
            d_tag_value(&msg.tags),
            tags_json,
            msg.content,
            msg.signature.0.to_vec(),
        ],
    )?;
    Ok(())
}

fn row_to_message(row: &rusqlite::Row<'_>) -> rusqlite::Result<SignedMessage> {
    let id_bytes: Vec<u8> = row.get(0)?;
    let author_bytes: Vec<u8> = row.get(1)?;
    let created_at: i64 = row.get(2)?;
    let kind: u16 = row.get(3)?;
    let tags_json: String = row.get(5)?;
    let content: String = row.get(6)?;
    let sig_bytes: Vec<u8> = row.get(7)?;

    let id: [u8; 32] = id_bytes
        .try_into()
        .map_err(|_| corrupt_err("id must be 32 bytes"))?;
    let author: [u8; 32] = author_bytes
        .try_into()
        .map_err(|_| corrupt_err("author must be 32 bytes"))?;
    let signature: [u8; 64] = sig_bytes
        .try_into()
        .map_err(|_| corrupt_err("signature must be 64 bytes"))?;
    let tags: Vec<Tag> =
        serde_json::from_str(&tags_json).map_err(|e| corrupt_err(&e.to_string()))?;

    Ok(SignedMessage {
        id: Hash(id),
        author: PeerId::from_bytes(author),
        created_at: created_at as u64,
        kind,
        tags,
        content,
        signature: Signature::from_bytes(signature),
    })
}

fn corrupt_err(msg: &str) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(
        0,
        rusqlite::types::Type::Blob,
        Box::new(StoreError::corrupt(msg.to_string())),
    )
}

/// A deletion target parsed from an `e` or `a` tag.
enum DeleteTarget {
    ById(Hash),
    ByAddress { kind: u16, author: PeerId, d_tag: String },
}

fn parse_delete_targets(msg: &SignedMessage) -> Vec<DeleteTarget> {
    let mut targets = Vec::new();
    for tag in &msg.tags {
        match tag.first().map(|s| s.as_str()) {
            Some("e") => {
                if let Some(hex) = tag.get(1) {
                    if let Some(hash) = hex_to_hash(hex) {
                        targets.push(DeleteTarget::ById(hash));
                    }
                }
            }
            Some("a") => {
                if let Some(addr) = tag.get(1) {
                    if let Some(target) = parse_address(addr) {
                        targets.push(target);
                    }
                }
            }
            _ => {}
        }
    }
    targets
}

fn hex_to_hash(s: &str) -> Option<Hash> {
    if s.len() != 64 {
        return None;
    }
    let mut bytes = [0u8; 32];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(Hash(bytes))
}

/// `kind:authorHex:dTag`, the addressable-reference convention for
/// parameterized-replaceable messages (§3 Addressable reference).
fn parse_address(addr: &str) -> Option<DeleteTarget> {
    let mut parts = addr.splitn(3, ':');
    let kind: u16 = parts.next()?.parse().ok()?;
    let author_hex = parts.next()?;
    let d_tag = parts.next().unwrap_or("").to_string();
    let author = hex_to_peer_id(author_hex)?;
    Some(DeleteTarget::ByAddress { kind, author, d_tag })
}

fn hex_to_peer_id(s: &str) -> Option<PeerId> {
    if s.len() != 64 {
        return None;
    }
    let mut bytes = [0u8; 32];
    for (i, b) in bytes.iter_mut().enumerate() {
        *b = u8::from_str_radix(&s[i * 2..i * 2 + 2], 16).ok()?;
    }
    Some(PeerId::from_bytes(bytes))
}

fn apply_deletion_tx(tx: &rusqlite::Transaction<'_>, del_msg: &SignedMessage) -> Result<usize> {
    let mut removed = 0usize;
    for target in parse_delete_targets(del_msg) {
        removed += match target {
            DeleteTarget::ById(id) => tx.execute(
                "DELETE FROM events WHERE id = ?1 AND author = ?2",
                params![id.0.to_vec(), del_msg.author.as_bytes().to_vec()],
            )?,
            DeleteTarget::ByAddress { kind, author, d_tag } => {
                if starling_valid::validate_deletion_authority(del_msg, &author).is_err() {
                    continue;
                }
                tx.execute(
                    "DELETE FROM events WHERE kind = ?1 AND author = ?2 AND d_tag = ?3",
                    params![kind, author.as_bytes().to_vec(), d_tag],
                )?
            }
        };
    }
    Ok(removed)
}

impl EventStore for SqliteEventStore {
    fn put(&self, msg: &SignedMessage) -> Result<PutOutcome> {
        let class = classify(msg.kind);
        if matches!(class, KindClass::Ephemeral) {
            return Ok(PutOutcome::Ephemeral);
        }

        let mut conn = self.lock()?;
        let tx = conn.transaction()?;

        if msg.kind == constants::KIND_DELETION {
            apply_deletion_tx(&tx, msg)?;
            tx.commit()?;
            return Ok(PutOutcome::Deleted);
        }

        match class {
            KindClass::Regular => {
                let exists: Option<i64> = tx
                    .query_row(
                        "SELECT 1 FROM events WHERE id = ?1",
                        params![msg.id.0.to_vec()],
                        |row| row.get(0),
                    )
                    .optional()?;
                if exists.is_some() {
                    return Ok(PutOutcome::IgnoredDuplicate);
                }
                insert_row(&tx, msg)?;
            }
            KindClass::Replaceable | KindClass::ParameterizedReplaceable => {
                let d_tag = d_tag_value(&msg.tags);
                let existing: Option<(i64, Vec<u8>)> = tx
                    .query_row(
                        "SELECT created_at, id FROM events WHERE author = ?1 AND kind = ?2 AND d_tag = ?3",
                        params![msg.author.as_bytes().to_vec(), msg.kind, d_tag],
                        |row| Ok((row.get(0)?, row.get(1)?)),
                    )
                    .optional()?;

                if let Some((existing_created_at, existing_id)) = existing {
                    let incoming_newer = (msg.created_at as i64) > existing_created_at
                        || ((msg.created_at as i64) == existing_created_at
                            && msg.id.0.to_vec() < existing_id);
                    if !incoming_newer {
                        return Ok(PutOutcome::IgnoredOlder);
                    }
                    tx.execute(
                        "DELETE FROM events WHERE author = ?1 AND kind = ?2 AND d_tag = ?3",
                        params![msg.author.as_bytes().to_vec(), msg.kind, d_tag],
                    )?;
                }
                insert_row(&tx, msg)?;
            }
            KindClass::Ephemeral => unreachable!("handled above"),
        }

        tx.commit()?;
        Ok(PutOutcome::Stored)
    }

    fn get(&self, id: &Hash) -> Result<Option<SignedMessage>> {
        let conn = self.lock()?;
        conn.query_row(
            "SELECT id, author, created_at, kind, d_tag, tags, content, signature
             FROM events WHERE id = ?1",
            params![id.0.to_vec()],
            row_to_message,
        )
        .optional()
        .map_err(StoreError::from)
    }

    fn query_many(&self, filters: &[Filter]) -> Result<Vec<SignedMessage>> {
        let conn = self.lock()?;
        let mut seen = std::collections::BTreeSet::new();
        let mut matched = Vec::new();

        for filter in filters {
            let mut stmt = conn.prepare(
                "SELECT id, author, created_at, kind, d_tag, tags, content, signature
                 FROM events
                 WHERE (?1 IS NULL OR created_at >= ?1)
                   AND (?2 IS NULL OR created_at <= ?2)
                 ORDER BY created_at DESC, id ASC",
            )?;
            let since = filter.since.map(|v| v as i64);
            let until = filter.until.map(|v| v as i64);
            let rows = stmt.query_map(params![since, until], row_to_message)?;

            for row in rows {
                let msg = row?;
                if !filter.matches(
                    &hex_string(msg.id.as_ref()),
                    &hex_string(msg.author.as_bytes()),
                    msg.kind,
                    msg.created_at,
                    &msg.tags,
                ) {
                    continue;
                }
                if seen.insert(msg.id.0) {
                    matched.push(msg);
                }
            }
        }

        matched.sort_by(|a, b| b.created_at.cmp(&a.created_at).then_with(|| a.id.0.cmp(&b.id.0)));

        let limit = filters.iter().filter_map(|f| f.limit).min();
        if let Some(limit) = limit {
            matched.truncate(limit);
        }

        Ok(matched)
    }

    fn apply_deletion(&self, del_msg: &SignedMessage) -> Result<usize> {
        let mut conn = self.lock()?;
        let tx = conn.transaction()?;
        let removed = apply_deletion_tx(&tx, del_msg)?;
        tx.commit()?;
        Ok(removed)
    }
}

fn hex_string(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{:02x}", b)).collect()
}
