//! The client-facing database handle.

use std::fmt;
use std::sync::Arc;

use serde::de::DeserializeOwned;
use tracing::warn;

use crate::engine::EngineBinding;
use crate::error::{Error, Result};
use crate::identity::{IdentityProvider, Principal};
use crate::query;
use crate::value::Value;

/// Typed access to an engine plus the current caller's identity.
///
/// Constructed explicitly and passed where needed; clones share the same
/// binding and identity provider.
#[derive(Clone)]
pub struct Database {
    binding: EngineBinding,
    identity: Arc<dyn IdentityProvider>,
}

impl Database {
    pub fn new(binding: EngineBinding, identity: Arc<dyn IdentityProvider>) -> Self {
        Self { binding, identity }
    }

    /// Run `sql` and decode every row, by column name, into `T`.
    ///
    /// `T` is typically a `#[derive(Deserialize)]` struct whose fields are a
    /// subset of the selected columns. Rows come back in engine order.
    pub fn query<T: DeserializeOwned>(&self, sql: &str, args: &[Value]) -> Result<Vec<T>> {
        let rows = self.binding.row_query_object(sql, args)?;
        query::decode_objects(sql, rows)
    }

    /// Run `sql` and return its first row.
    ///
    /// Fails with [`Error::NotFound`] when the statement yields nothing. Any
    /// rows after the first are discarded.
    pub fn query_one<T: DeserializeOwned>(&self, sql: &str, args: &[Value]) -> Result<T> {
        let rows = self.binding.row_query_object(sql, args)?;
        match rows.into_iter().next() {
            Some(row) => query::decode_object(sql, row),
            None => {
                warn!(sql, "query_one matched no rows");
                Err(Error::NotFound {
                    sql: sql.to_string(),
                })
            }
        }
    }

    /// Run `sql` and decode every row, by column position, into `T`.
    pub fn query_tuple<T: DeserializeOwned>(&self, sql: &str, args: &[Value]) -> Result<Vec<T>> {
        let rows = self.binding.row_query_tuple(sql, args)?;
        query::decode_tuples(sql, rows)
    }

    /// Run a statement that returns no rows; yields the affected-row count.
    pub fn execute(&self, sql: &str, args: &[Value]) -> Result<u32> {
        self.binding.execute(sql, args)
    }

    /// Identifier of the most recent insert on this binding's session.
    ///
    /// For SQLite this is the rowid; with no prior insert it is 0.
    pub fn last_id(&self) -> Result<u32> {
        self.binding.last_insert_id()
    }

    /// Raw bytes of the principal invoking the current operation.
    pub fn me(&self) -> Vec<u8> {
        self.caller().into_bytes()
    }

    pub fn caller(&self) -> Principal {
        self.identity.caller()
    }
}

impl fmt::Debug for Database {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Database")
            .field("binding", &self.binding)
            .finish_non_exhaustive()
    }
}
