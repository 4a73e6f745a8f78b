//! Named registration of SQL engines.
//!
//! A host registers an engine under a global object name together with the
//! native entry point that produced it. Consumers resolve by descriptor and
//! must match both names exactly.

use std::collections::HashMap;
use std::fmt;
use std::sync::Arc;

use tracing::info;

use crate::engine::SqlEngine;
use crate::error::{Error, Result};

/// The name pair a plugin is registered under.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct PluginDescriptor {
    pub global_object_name: &'static str,
    pub register_function_name: &'static str,
}

/// The SQLite plugin's registration names.
pub const SQLITE_PLUGIN: PluginDescriptor = PluginDescriptor {
    global_object_name: "SQLite",
    register_function_name: "_ic_sqlite_plugin_register",
};

struct Registration {
    register_function_name: &'static str,
    engine: Arc<dyn SqlEngine>,
}

#[derive(Default)]
pub struct PluginRegistry {
    plugins: HashMap<&'static str, Registration>,
}

impl PluginRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `engine` under `descriptor`, replacing any previous entry
    /// with the same global name.
    pub fn register(&mut self, descriptor: PluginDescriptor, engine: Arc<dyn SqlEngine>) {
        info!(
            global = descriptor.global_object_name,
            entry_point = descriptor.register_function_name,
            engine = engine.name(),
            "registering plugin"
        );
        self.plugins.insert(
            descriptor.global_object_name,
            Registration {
                register_function_name: descriptor.register_function_name,
                engine,
            },
        );
    }

    pub fn resolve(&self, descriptor: &PluginDescriptor) -> Result<Arc<dyn SqlEngine>> {
        let registration = self.plugins.get(descriptor.global_object_name).ok_or_else(|| {
            Error::PluginNotRegistered {
                global_object_name: descriptor.global_object_name.to_string(),
            }
        })?;

        if registration.register_function_name != descriptor.register_function_name {
            return Err(Error::EntryPointMismatch {
                global_object_name: descriptor.global_object_name.to_string(),
                expected: descriptor.register_function_name.to_string(),
                found: registration.register_function_name.to_string(),
            });
        }

        Ok(Arc::clone(&registration.engine))
    }

    pub fn contains(&self, global_object_name: &str) -> bool {
        self.plugins.contains_key(global_object_name)
    }
}

impl fmt::Debug for PluginRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<_> = self.plugins.keys().collect();
        names.sort();
        f.debug_struct("PluginRegistry").field("plugins", &names).finish()
    }
}
