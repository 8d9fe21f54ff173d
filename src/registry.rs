//! Init hooks.
//!
//! A wrapper's `data-init` names a callback to run on every clone made by an
//! add click. Callbacks are registered explicitly at startup under that
//! name; looking up a name nobody registered is a no-op.

use std::fmt;
use std::sync::Arc;

use dashmap::DashMap;

use crate::markup::Element;

/// What a hook learns about the freshly inserted wrapper.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InitContext<'a> {
    /// Indexed id of the new slot, e.g. `post-tags-3`.
    pub id: &'a str,
    /// Indexed name of the new slot, e.g. `Post[tags][3]`.
    pub name: &'a str,
    pub index: usize,
}

pub type InitHook = Arc<dyn Fn(&mut Element, &InitContext<'_>) + Send + Sync>;

/// Thread-safe name → callback map. Clones share the same table.
#[derive(Clone, Default)]
pub struct InitHookRegistry {
    hooks: Arc<DashMap<String, InitHook>>,
}

impl InitHookRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register `hook` under `name`, replacing any previous one.
    pub fn register<F>(&self, name: impl Into<String>, hook: F)
    where
        F: Fn(&mut Element, &InitContext<'_>) + Send + Sync + 'static,
    {
        self.hooks.insert(name.into(), Arc::new(hook));
    }

    pub fn unregister(&self, name: &str) -> bool {
        self.hooks.remove(name).is_some()
    }

    pub fn get(&self, name: &str) -> Option<InitHook> {
        self.hooks.get(name).map(|entry| Arc::clone(entry.value()))
    }

    pub fn contains(&self, name: &str) -> bool {
        self.hooks.contains_key(name)
    }

    pub fn len(&self) -> usize {
        self.hooks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.hooks.is_empty()
    }

    /// Run the hook registered as `name`. Returns whether one ran.
    pub fn invoke(&self, name: &str, wrapper: &mut Element, ctx: &InitContext<'_>) -> bool {
        // Clone out of the map so the shard lock is not held while the hook runs.
        let Some(hook) = self.get(name) else {
            tracing::trace!(hook = name, "init hook not registered, skipping");
            return false;
        };
        hook(wrapper, ctx);
        true
    }
}

impl fmt::Debug for InitHookRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut names: Vec<String> = self.hooks.iter().map(|e| e.key().clone()).collect();
        names.sort();
        f.debug_struct("InitHookRegistry").field("hooks", &names).finish()
    }
}
