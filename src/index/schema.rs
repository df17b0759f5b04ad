use rusqlite::{Connection, Result};
use tracing::{debug, info};

/// SQLite schema version
pub const SCHEMA_VERSION: i32 = 1;

/// Initialize the snapshot schema
pub fn init_schema(conn: &Connection) -> Result<()> {
    debug!("Initializing snapshot schema v{}", SCHEMA_VERSION);

    conn.execute(
        "CREATE TABLE IF NOT EXISTS schema_version (
            version INTEGER PRIMARY KEY,
            applied_at TEXT NOT NULL DEFAULT CURRENT_TIMESTAMP
        )",
        [],
    )?;

    let current_version: i32 = conn
        .query_row(
            "SELECT COALESCE(MAX(version), 0) FROM schema_version",
            [],
            |row| row.get(0),
        )
        .unwrap_or(0);

    debug!("Current schema version: {}", current_version);

    if current_version < SCHEMA_VERSION {
        info!("Upgrading snapshot schema from v{} to v{}", current_version, SCHEMA_VERSION);
        apply_migrations(conn, current_version)?;
    }

    Ok(())
}

/// Apply migrations from current version to latest
fn apply_migrations(conn: &Connection, from_version: i32) -> Result<()> {
    for version in (from_version + 1)..=SCHEMA_VERSION {
        info!("Applying migration v{}", version);
        match version {
            1 => create_v1_schema(conn)?,
            _ => unreachable!("Unknown schema version: {}", version),
        }

        conn.execute("INSERT INTO schema_version (version) VALUES (?1)", [version])?;
    }

    Ok(())
}

/// Create v1 schema (initial schema)
fn create_v1_schema(conn: &Connection) -> Result<()> {
    // `seq` preserves append order; symbol ids may repeat because the
    // in-memory index is append-only.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS symbols (
            seq INTEGER PRIMARY KEY,
            id TEXT NOT NULL,
            name TEXT NOT NULL,
            kind TEXT NOT NULL,
            file TEXT NOT NULL,
            language TEXT NOT NULL,
            start_line INTEGER NOT NULL,
            end_line INTEGER NOT NULL,
            signature TEXT NOT NULL,
            return_type TEXT,
            parameters TEXT NOT NULL,
            visibility TEXT NOT NULL,
            is_static INTEGER NOT NULL,
            raw_code TEXT NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_symbols_name ON symbols(name)",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_symbols_file ON symbols(file)",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS call_edges (
            seq INTEGER PRIMARY KEY,
            caller TEXT NOT NULL,
            callee TEXT NOT NULL,
            file TEXT NOT NULL,
            line INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE INDEX IF NOT EXISTS idx_call_edges_callee ON call_edges(callee)",
        [],
    )?;

    // The owning symbol is stored whole: embeddings may belong to symbols
    // that are not part of the persisted index.
    conn.execute(
        "CREATE TABLE IF NOT EXISTS embeddings (
            seq INTEGER PRIMARY KEY,
            symbol_id TEXT NOT NULL,
            symbol TEXT NOT NULL,
            dimension INTEGER NOT NULL,
            vector BLOB NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS files (
            path TEXT PRIMARY KEY,
            language TEXT NOT NULL,
            content_hash TEXT NOT NULL,
            symbol_count INTEGER NOT NULL DEFAULT 0,
            indexed_at INTEGER NOT NULL
        )",
        [],
    )?;

    conn.execute(
        "CREATE TABLE IF NOT EXISTS snapshot_meta (
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;

    info!("v1 snapshot schema created");

    Ok(())
}

/// Drop all tables (for rebuilding)
pub fn drop_schema(conn: &Connection) -> Result<()> {
    info!("Dropping all snapshot tables");

    conn.execute("DROP TABLE IF EXISTS schema_version", [])?;
    conn.execute("DROP TABLE IF EXISTS snapshot_meta", [])?;
    conn.execute("DROP TABLE IF EXISTS files", [])?;
    conn.execute("DROP TABLE IF EXISTS embeddings", [])?;
    conn.execute("DROP TABLE IF EXISTS call_edges", [])?;
    conn.execute("DROP TABLE IF EXISTS symbols", [])?;

    Ok(())
}
