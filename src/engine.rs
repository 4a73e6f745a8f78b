//! Engine binding: the four primitive operations supplied by a SQL engine.
//!
//! The engine itself (parsing, execution, storage, transactions) lives behind
//! the [`SqlEngine`] trait. [`EngineBinding`] is the handle the rest of the
//! crate holds; it is established once and cloned freely.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::debug;

use crate::error::{EngineResult, Error, Result};
use crate::registry::{PluginDescriptor, PluginRegistry};
use crate::value::Value;

/// One result record keyed by column name.
pub type ObjectRow = HashMap<String, Value>;

/// One result record in column order.
pub type TupleRow = Vec<Value>;

/// Trait for SQL engines that can execute statements.
///
/// Implementations perform no validation on behalf of the caller; any failure
/// (syntax error, constraint violation, bad argument) is returned as-is.
pub trait SqlEngine: Send + Sync {
    /// Run a statement, returning rows keyed by column name.
    fn query_objects(&self, sql: &str, args: &[Value]) -> EngineResult<Vec<ObjectRow>>;

    /// Run a statement, returning rows in column order.
    fn query_tuples(&self, sql: &str, args: &[Value]) -> EngineResult<Vec<TupleRow>>;

    /// Run a statement that produces no rows; returns the affected-row count.
    fn execute(&self, sql: &str, args: &[Value]) -> EngineResult<u32>;

    /// Identifier produced by the most recent insert on this engine's session.
    fn last_insert_id(&self) -> EngineResult<u32>;

    /// Engine name for logging/debugging.
    fn name(&self) -> &'static str;
}

/// Process-scoped handle to an engine.
///
/// Read-only after construction; clones share the same engine.
#[derive(Clone)]
pub struct EngineBinding {
    engine: Arc<dyn SqlEngine>,
}

impl EngineBinding {
    /// Bind an explicitly constructed engine.
    pub fn new(engine: Arc<dyn SqlEngine>) -> Self {
        Self { engine }
    }

    /// Bind the engine registered under `descriptor`.
    ///
    /// Fails immediately if the registry cannot resolve it; a binding is never
    /// handed out in a half-resolved state.
    pub fn from_registry(registry: &PluginRegistry, descriptor: &PluginDescriptor) -> Result<Self> {
        let engine = registry.resolve(descriptor)?;
        Ok(Self::new(engine))
    }

    /// Run `sql` and return the raw rows keyed by column name.
    pub fn row_query_object(&self, sql: &str, args: &[Value]) -> Result<Vec<ObjectRow>> {
        let rows = self.engine.query_objects(sql, args).map_err(Error::Engine)?;
        debug!(engine = self.engine.name(), sql, args = args.len(), rows = rows.len(), "query");
        Ok(rows)
    }

    /// Run `sql` and return the raw rows in column order.
    pub fn row_query_tuple(&self, sql: &str, args: &[Value]) -> Result<Vec<TupleRow>> {
        let rows = self.engine.query_tuples(sql, args).map_err(Error::Engine)?;
        debug!(engine = self.engine.name(), sql, args = args.len(), rows = rows.len(), "query_tuple");
        Ok(rows)
    }

    /// Run a statement that returns no rows; yields the affected-row count.
    pub fn execute(&self, sql: &str, args: &[Value]) -> Result<u32> {
        let changed = self.engine.execute(sql, args).map_err(Error::Engine)?;
        debug!(engine = self.engine.name(), sql, args = args.len(), changed, "execute");
        Ok(changed)
    }

    /// Identifier of the most recent insert on the engine's session.
    pub fn last_insert_id(&self) -> Result<u32> {
        self.engine.last_insert_id().map_err(Error::Engine)
    }
}

impl fmt::Debug for EngineBinding {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("EngineBinding")
            .field("engine", &self.engine.name())
            .finish()
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use std::sync::Mutex;

    /// Substitute engine that serves canned rows and records every call.
    #[derive(Default)]
    pub(crate) struct MockEngine {
        pub objects: Vec<ObjectRow>,
        pub tuples: Vec<TupleRow>,
        pub changed: u32,
        pub last_id: u32,
        pub fail_with: Option<String>,
        pub calls: Mutex<Vec<(String, Vec<Value>)>>,
    }

    impl MockEngine {
        fn record(&self, sql: &str, args: &[Value]) -> EngineResult<()> {
            self.calls.lock().unwrap().push((sql.to_string(), args.to_vec()));
            match &self.fail_with {
                Some(msg) => Err(msg.clone().into()),
                None => Ok(()),
            }
        }
    }

    impl SqlEngine for MockEngine {
        fn query_objects(&self, sql: &str, args: &[Value]) -> EngineResult<Vec<ObjectRow>> {
            self.record(sql, args)?;
            Ok(self.objects.clone())
        }

        fn query_tuples(&self, sql: &str, args: &[Value]) -> EngineResult<Vec<TupleRow>> {
            self.record(sql, args)?;
            Ok(self.tuples.clone())
        }

        fn execute(&self, sql: &str, args: &[Value]) -> EngineResult<u32> {
            self.record(sql, args)?;
            Ok(self.changed)
        }

        fn last_insert_id(&self) -> EngineResult<u32> {
            Ok(self.last_id)
        }

        fn name(&self) -> &'static str {
            "mock"
        }
    }

    pub(crate) fn object_row(pairs: &[(&str, Value)]) -> ObjectRow {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.clone()))
            .collect()
    }

    #[test]
    fn test_binding_passes_args_through_in_order() {
        let engine = Arc::new(MockEngine {
            changed: 3,
            ..Default::default()
        });
        let binding = EngineBinding::new(engine.clone());

        let changed = binding
            .execute("UPDATE t SET a = ? WHERE b = ?", crate::params![1_i64, "x"])
            .unwrap();
        assert_eq!(changed, 3);

        let calls = engine.calls.lock().unwrap();
        assert_eq!(calls.len(), 1);
        assert_eq!(calls[0].0, "UPDATE t SET a = ? WHERE b = ?");
        assert_eq!(calls[0].1, vec![Value::Integer(1), Value::Text("x".into())]);
    }

    #[test]
    fn test_engine_failure_propagates_unchanged() {
        let binding = EngineBinding::new(Arc::new(MockEngine {
            fail_with: Some("near \"SELEC\": syntax error".to_string()),
            ..Default::default()
        }));

        let err = binding.row_query_object("SELEC 1", &[]).unwrap_err();
        match err {
            Error::Engine(inner) => assert_eq!(inner.to_string(), "near \"SELEC\": syntax error"),
            other => panic!("expected engine error, got {:?}", other),
        }
    }

    #[test]
    fn test_clones_share_engine() {
        let engine = Arc::new(MockEngine {
            last_id: 42,
            ..Default::default()
        });
        let binding = EngineBinding::new(engine);
        let other = binding.clone();
        assert_eq!(other.last_insert_id().unwrap(), 42);
        assert_eq!(format!("{:?}", other), "EngineBinding { engine: \"mock\" }");
    }
}
