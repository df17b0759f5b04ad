use anyhow::{Context, Result};
use r2d2::Pool;
use r2d2_sqlite::SqliteConnectionManager;
use rusqlite::types::Type;
use rusqlite::{params, OptionalExtension, Row};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

use super::schema::init_schema;
use super::{CallEdge, CodeIndex, Parameter, Symbol, SymbolKind, Visibility};
use crate::embedding::Embedding;
use crate::language::Language;

/// Type alias for connection pool
pub type ConnectionPool = Pool<SqliteConnectionManager>;

/// Bookkeeping for one indexed file
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileRecord {
    pub path: String,
    pub language: Language,
    pub content_hash: String,
    pub symbol_count: usize,
    pub indexed_at: i64,
}

impl FileRecord {
    pub fn new(path: &str, language: Language, content: &str, symbol_count: usize) -> Self {
        Self {
            path: path.to_string(),
            language,
            content_hash: content_hash(content),
            symbol_count,
            indexed_at: chrono::Utc::now().timestamp(),
        }
    }
}

/// Everything a snapshot file holds
#[derive(Debug, Clone, Default)]
pub struct Snapshot {
    pub index: CodeIndex,
    pub embeddings: Vec<Embedding>,
    pub files: Vec<FileRecord>,
    pub saved_at: Option<i64>,
}

/// Single-file persisted snapshot of an index and its embeddings
#[derive(Clone)]
pub struct SnapshotStore {
    pool: ConnectionPool,
    db_path: PathBuf,
}

impl SnapshotStore {
    /// Create or open a snapshot database
    pub fn open(db_path: impl AsRef<Path>) -> Result<Self> {
        let db_path = db_path.as_ref().to_path_buf();

        info!("Opening snapshot at: {}", db_path.display());

        if let Some(parent) = db_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
            }
        }

        let manager = SqliteConnectionManager::file(&db_path);

        let pool = Pool::builder()
            .max_size(4)
            .build(manager)
            .context("Failed to create connection pool")?;

        {
            let conn = pool.get().context("Failed to get connection")?;
            init_schema(&conn).context("Failed to initialize schema")?;
        }

        Ok(Self { pool, db_path })
    }

    pub fn path(&self) -> &Path {
        &self.db_path
    }

    /// Get a connection from the pool
    pub fn get_conn(&self) -> Result<r2d2::PooledConnection<SqliteConnectionManager>> {
        self.pool.get().context("Failed to get connection from pool")
    }

    /// Replace the stored snapshot with the given state
    pub fn save(&self, index: &CodeIndex, embeddings: &[Embedding], files: &[FileRecord]) -> Result<()> {
        let mut conn = self.get_conn()?;
        let tx = conn.transaction()?;

        tx.execute("DELETE FROM symbols", [])?;
        tx.execute("DELETE FROM call_edges", [])?;
        tx.execute("DELETE FROM embeddings", [])?;
        tx.execute("DELETE FROM files", [])?;

        {
            let mut stmt = tx.prepare(
                "INSERT INTO symbols (
                    seq, id, name, kind, file, language, start_line, end_line,
                    signature, return_type, parameters, visibility, is_static, raw_code
                ) VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11, ?12, ?13, ?14)",
            )?;
            for (seq, symbol) in index.symbols().iter().enumerate() {
                stmt.execute(params![
                    seq as i64,
                    symbol.id(),
                    symbol.name,
                    symbol.kind.as_str(),
                    symbol.file,
                    symbol.language.as_str(),
                    symbol.start_line as i64,
                    symbol.end_line as i64,
                    symbol.signature,
                    symbol.return_type,
                    serde_json::to_string(&symbol.parameters)?,
                    symbol.visibility.as_str(),
                    symbol.is_static,
                    symbol.raw_code,
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO call_edges (seq, caller, callee, file, line)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (seq, edge) in index.call_graph().iter().enumerate() {
                stmt.execute(params![seq as i64, edge.caller, edge.callee, edge.file, edge.line as i64])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO embeddings (seq, symbol_id, symbol, dimension, vector)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for (seq, embedding) in embeddings.iter().enumerate() {
                stmt.execute(params![
                    seq as i64,
                    embedding.symbol.id(),
                    serde_json::to_string(&embedding.symbol)?,
                    embedding.vector.len() as i64,
                    encode_vector(&embedding.vector),
                ])?;
            }
        }

        {
            let mut stmt = tx.prepare(
                "INSERT INTO files (path, language, content_hash, symbol_count, indexed_at)
                 VALUES (?1, ?2, ?3, ?4, ?5)",
            )?;
            for file in files {
                stmt.execute(params![
                    file.path,
                    file.language.as_str(),
                    file.content_hash,
                    file.symbol_count as i64,
                    file.indexed_at,
                ])?;
            }
        }

        tx.execute(
            "INSERT OR REPLACE INTO snapshot_meta (key, value) VALUES ('saved_at', ?1)",
            [chrono::Utc::now().timestamp().to_string()],
        )?;

        tx.commit()?;

        info!(
            "Saved snapshot: {} symbols, {} call edges, {} embeddings, {} files",
            index.symbols().len(),
            index.call_graph().len(),
            embeddings.len(),
            files.len()
        );

        Ok(())
    }

    /// Load the stored snapshot
    pub fn load(&self) -> Result<Snapshot> {
        let conn = self.get_conn()?;

        let symbols = conn
            .prepare(
                "SELECT name, kind, file, language, start_line, end_line, signature,
                        return_type, parameters, visibility, is_static, raw_code
                 FROM symbols ORDER BY seq",
            )?
            .query_map([], row_to_symbol)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let call_graph = conn
            .prepare("SELECT caller, callee, file, line FROM call_edges ORDER BY seq")?
            .query_map([], row_to_call_edge)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let embeddings = conn
            .prepare("SELECT symbol, vector FROM embeddings ORDER BY seq")?
            .query_map([], row_to_embedding)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let files = conn
            .prepare(
                "SELECT path, language, content_hash, symbol_count, indexed_at
                 FROM files ORDER BY path",
            )?
            .query_map([], row_to_file_record)?
            .collect::<std::result::Result<Vec<_>, _>>()?;

        let saved_at: Option<String> = conn
            .query_row(
                "SELECT value FROM snapshot_meta WHERE key = 'saved_at'",
                [],
                |row| row.get(0),
            )
            .optional()?;

        debug!(
            "Loaded snapshot: {} symbols, {} call edges, {} embeddings",
            symbols.len(),
            call_graph.len(),
            embeddings.len()
        );

        Ok(Snapshot {
            index: CodeIndex::from_parts(symbols, call_graph),
            embeddings,
            files,
            saved_at: saved_at.and_then(|v| v.parse().ok()),
        })
    }

    /// Stored content hash for a file, if it was indexed
    pub fn file_hash(&self, path: &str) -> Result<Option<String>> {
        let conn = self.get_conn()?;
        let hash = conn
            .query_row(
                "SELECT content_hash FROM files WHERE path = ?1",
                [path],
                |row| row.get(0),
            )
            .optional()?;
        Ok(hash)
    }

    /// Clear all data
    pub fn clear(&self) -> Result<()> {
        let conn = self.get_conn()?;
        conn.execute("DELETE FROM symbols", [])?;
        conn.execute("DELETE FROM call_edges", [])?;
        conn.execute("DELETE FROM embeddings", [])?;
        conn.execute("DELETE FROM files", [])?;
        conn.execute("DELETE FROM snapshot_meta", [])?;
        Ok(())
    }
}

/// blake3 hash of file content
pub fn content_hash(content: &str) -> String {
    blake3::hash(content.as_bytes()).to_string()
}

fn encode_vector(vector: &[f32]) -> Vec<u8> {
    vector.iter().flat_map(|v| v.to_le_bytes()).collect()
}

fn decode_vector(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_le_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

fn conversion_error(
    column: usize,
    err: impl Into<Box<dyn std::error::Error + Send + Sync + 'static>>,
) -> rusqlite::Error {
    rusqlite::Error::FromSqlConversionFailure(column, Type::Text, err.into())
}

/// Convert database row to Symbol
fn row_to_symbol(row: &Row) -> rusqlite::Result<Symbol> {
    let kind: String = row.get(1)?;
    let language: String = row.get(3)?;
    let parameters: String = row.get(8)?;
    let visibility: String = row.get(9)?;

    Ok(Symbol {
        name: row.get(0)?,
        kind: SymbolKind::from_str(&kind).map_err(|e| conversion_error(1, e))?,
        file: row.get(2)?,
        language: language.parse::<Language>().map_err(|e| conversion_error(3, e))?,
        start_line: row.get::<_, i64>(4)? as usize,
        end_line: row.get::<_, i64>(5)? as usize,
        signature: row.get(6)?,
        return_type: row.get(7)?,
        parameters: serde_json::from_str::<Vec<Parameter>>(&parameters)
            .map_err(|e| conversion_error(8, e))?,
        visibility: Visibility::from_str(&visibility).map_err(|e| conversion_error(9, e))?,
        is_static: row.get(10)?,
        raw_code: row.get(11)?,
    })
}

/// Convert database row to CallEdge
fn row_to_call_edge(row: &Row) -> rusqlite::Result<CallEdge> {
    Ok(CallEdge {
        caller: row.get(0)?,
        callee: row.get(1)?,
        file: row.get(2)?,
        line: row.get::<_, i64>(3)? as usize,
    })
}

fn row_to_embedding(row: &Row) -> rusqlite::Result<Embedding> {
    let symbol: String = row.get(0)?;
    let vector: Vec<u8> = row.get(1)?;

    Ok(Embedding {
        symbol: serde_json::from_str(&symbol).map_err(|e| conversion_error(0, e))?,
        vector: decode_vector(&vector),
    })
}

fn row_to_file_record(row: &Row) -> rusqlite::Result<FileRecord> {
    let language: String = row.get(1)?;

    Ok(FileRecord {
        path: row.get(0)?,
        language: language.parse::<Language>().map_err(|e| conversion_error(1, e))?,
        content_hash: row.get(2)?,
        symbol_count: row.get::<_, i64>(3)? as usize,
        indexed_at: row.get(4)?,
    })
}
