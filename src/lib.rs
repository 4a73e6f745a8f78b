//! Typed access layer over a SQL engine.
//!
//! # Intention
//!
//! - Accept a SQL statement plus positional arguments, run it against an
//!   engine, and hand back rows decoded into the caller's own types, either
//!   by column name ([`Database::query`]) or by position
//!   ([`Database::query_tuple`]).
//! - Keep the engine behind [`SqlEngine`] so it can be injected explicitly,
//!   resolved from a [`PluginRegistry`], or swapped for a substitute in tests.
//!
//! # Architectural Boundaries
//!
//! - Only marshaling of requests and responses belongs here.
//! - No query validation, schema management, pooling or transaction
//!   coordination; the engine owns all of that.
//! - Engine failures pass through untouched as [`Error::Engine`].
//!
//! ```no_run
//! use std::sync::Arc;
//! use serde::Deserialize;
//! use typed_sqlite::{params, Database, EngineBinding, FixedIdentity, Principal, SqliteEngine};
//!
//! #[derive(Deserialize)]
//! struct User { id: i64, name: String }
//!
//! # fn main() -> typed_sqlite::Result<()> {
//! let engine = SqliteEngine::open_in_memory()?;
//! engine.execute_batch("CREATE TABLE users (id INTEGER PRIMARY KEY, name TEXT)")?;
//! let db = Database::new(
//!     EngineBinding::new(Arc::new(engine)),
//!     Arc::new(FixedIdentity(Principal::from_bytes(vec![1]))),
//! );
//! db.execute("INSERT INTO users (name) VALUES (?)", params!["a"])?;
//! let _user: User = db.query_one("SELECT * FROM users WHERE id = ?", params![db.last_id()?])?;
//! # Ok(())
//! # }
//! ```

pub mod database;
pub mod engine;
pub mod error;
pub mod identity;
pub mod query;
pub mod registry;
pub mod sqlite;
pub mod value;

pub use database::Database;
pub use engine::{EngineBinding, ObjectRow, SqlEngine, TupleRow};
pub use error::{DecodeError, EngineError, EngineResult, Error, Result};
pub use identity::{FixedIdentity, IdentityProvider, Principal};
pub use registry::{PluginDescriptor, PluginRegistry, SQLITE_PLUGIN};
pub use sqlite::{register_plugin, SqliteConfig, SqliteEngine};
pub use value::Value;
