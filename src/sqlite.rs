use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;

use rusqlite::{params_from_iter, Connection, Statement};
use serde::{Deserialize, Serialize};
use tracing::info;

use crate::engine::{ObjectRow, SqlEngine, TupleRow};
use crate::error::{EngineResult, Error, Result};
use crate::registry::{PluginRegistry, SQLITE_PLUGIN};
use crate::value::Value;

const IN_MEMORY_PATH: &str = ":memory:";

/// SQLite engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqliteConfig {
    /// Path to the SQLite database file, or `:memory:`
    pub db_path: String,
    /// How long a statement waits on a locked database before failing
    #[serde(default)]
    pub busy_timeout_ms: Option<u64>,
    /// Enforce foreign key constraints on this connection
    #[serde(default)]
    pub foreign_keys: bool,
}

impl SqliteConfig {
    /// Create a new SQLite config for a database file
    pub fn new(db_path: impl Into<String>) -> Self {
        Self {
            db_path: db_path.into(),
            busy_timeout_ms: None,
            foreign_keys: false,
        }
    }

    pub fn in_memory() -> Self {
        Self::new(IN_MEMORY_PATH)
    }

    pub fn with_busy_timeout(mut self, timeout: Duration) -> Self {
        self.busy_timeout_ms = Some(u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX));
        self
    }

    pub fn with_foreign_keys(mut self, enabled: bool) -> Self {
        self.foreign_keys = enabled;
        self
    }

    fn is_in_memory(&self) -> bool {
        self.db_path == IN_MEMORY_PATH
    }
}

/// rusqlite-backed [`SqlEngine`].
///
/// One connection, guarded by a mutex; `last_insert_id` therefore always
/// refers to the most recent insert made through this engine.
pub struct SqliteEngine {
    conn: Mutex<Connection>,
}

impl SqliteEngine {
    pub fn open(config: &SqliteConfig) -> Result<Self> {
        info!(path = %config.db_path, "opening sqlite engine");
        let open_failed = |source: rusqlite::Error| Error::Open {
            path: config.db_path.clone(),
            source,
        };

        let conn = if config.is_in_memory() {
            Connection::open_in_memory()
        } else {
            Connection::open(&config.db_path)
        }
        .map_err(open_failed)?;

        if let Some(ms) = config.busy_timeout_ms {
            conn.busy_timeout(Duration::from_millis(ms)).map_err(open_failed)?;
        }
        if config.foreign_keys {
            conn.pragma_update(None, "foreign_keys", true).map_err(open_failed)?;
        }

        Ok(Self {
            conn: Mutex::new(conn),
        })
    }

    pub fn open_in_memory() -> Result<Self> {
        Self::open(&SqliteConfig::in_memory())
    }

    /// Run a multi-statement script (schema setup, pragmas). No arguments,
    /// no rows.
    pub fn execute_batch(&self, sql: &str) -> Result<()> {
        let conn = self.lock().map_err(Error::Engine)?;
        conn.execute_batch(sql).map_err(|e| Error::Engine(e.into()))
    }

    fn lock(&self) -> EngineResult<MutexGuard<'_, Connection>> {
        self.conn
            .lock()
            .map_err(|_| "sqlite connection mutex poisoned".into())
    }
}

/// Open an engine from `config` and register it under [`SQLITE_PLUGIN`].
pub fn register_plugin(registry: &mut PluginRegistry, config: &SqliteConfig) -> Result<Arc<SqliteEngine>> {
    let engine = Arc::new(SqliteEngine::open(config)?);
    registry.register(SQLITE_PLUGIN, engine.clone());
    Ok(engine)
}

fn column_names(stmt: &Statement<'_>) -> Vec<String> {
    stmt.column_names().into_iter().map(str::to_string).collect()
}

fn column_value(row: &rusqlite::Row<'_>, idx: usize) -> EngineResult<Value> {
    Ok(Value::try_from(row.get_ref(idx)?)?)
}

fn narrow(what: &str, n: i64) -> EngineResult<u32> {
    u32::try_from(n).map_err(|_| format!("{} {} does not fit in u32", what, n).into())
}

impl SqlEngine for SqliteEngine {
    fn query_objects(&self, sql: &str, args: &[Value]) -> EngineResult<Vec<ObjectRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let columns = column_names(&stmt);

        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let mut object = ObjectRow::with_capacity(columns.len());
            for (idx, column) in columns.iter().enumerate() {
                object.insert(column.clone(), column_value(row, idx)?);
            }
            result.push(object);
        }
        Ok(result)
    }

    fn query_tuples(&self, sql: &str, args: &[Value]) -> EngineResult<Vec<TupleRow>> {
        let conn = self.lock()?;
        let mut stmt = conn.prepare(sql)?;
        let count = stmt.column_count();

        let mut rows = stmt.query(params_from_iter(args.iter()))?;
        let mut result = Vec::new();
        while let Some(row) = rows.next()? {
            let tuple = (0..count)
                .map(|idx| column_value(row, idx))
                .collect::<EngineResult<TupleRow>>()?;
            result.push(tuple);
        }
        Ok(result)
    }

    fn execute(&self, sql: &str, args: &[Value]) -> EngineResult<u32> {
        let conn = self.lock()?;
        let changed = conn.execute(sql, params_from_iter(args.iter()))?;
        narrow("affected row count", i64::try_from(changed).unwrap_or(i64::MAX))
    }

    fn last_insert_id(&self) -> EngineResult<u32> {
        let conn = self.lock()?;
        narrow("last insert rowid", conn.last_insert_rowid())
    }

    fn name(&self) -> &'static str {
        "sqlite"
    }
}
