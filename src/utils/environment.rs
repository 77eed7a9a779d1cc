//! Scoped symbol table
//!
//! A single stack of bindings separated by scope markers. Both the semantic
//! analyzer (name -> type, name -> signature) and IR lowering
//! (name -> temporary) keep their own instances.

use thiserror::Error;

/// An entry on the binding stack.
#[derive(Debug, Clone)]
enum Entry<K, V> {
    Marker,
    Binding(K, V),
}

/// Failure to pop a scope.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
#[error("no scope to exit")]
pub struct NoScopeError;

/// Scoped key/value store. Starts with one open (global) scope.
#[derive(Debug, Clone)]
pub struct Environment<K, V> {
    stack: Vec<Entry<K, V>>,
}

impl<K: PartialEq, V> Environment<K, V> {
    pub fn new() -> Self {
        Self {
            stack: vec![Entry::Marker],
        }
    }

    /// Enter a new scope level
    pub fn enter_scope(&mut self) {
        self.stack.push(Entry::Marker);
    }

    /// Drop every binding made since the matching `enter_scope`, restoring
    /// whatever those bindings shadowed.
    pub fn exit_scope(&mut self) -> Result<(), NoScopeError> {
        while let Some(entry) = self.stack.pop() {
            if let Entry::Marker = entry {
                return Ok(());
            }
        }
        Err(NoScopeError)
    }

    /// Bind `key` in the innermost scope
    pub fn bind(&mut self, key: K, value: V) {
        self.stack.push(Entry::Binding(key, value));
    }

    pub fn exists(&self, key: &K) -> bool {
        self.lookup(key).is_some()
    }

    /// Whether `key` is bound in the innermost scope only
    pub fn exists_in_current_scope(&self, key: &K) -> bool {
        for entry in self.stack.iter().rev() {
            match entry {
                Entry::Marker => return false,
                Entry::Binding(k, _) if k == key => return true,
                Entry::Binding(..) => {}
            }
        }
        false
    }

    /// Nearest binding of `key`, searching outward from the innermost scope
    pub fn lookup(&self, key: &K) -> Option<&V> {
        self.stack.iter().rev().find_map(|entry| match entry {
            Entry::Binding(k, v) if k == key => Some(v),
            _ => None,
        })
    }

    /// Number of currently open scopes
    pub fn depth(&self) -> usize {
        self.stack
            .iter()
            .filter(|entry| matches!(entry, Entry::Marker))
            .count()
    }
}

impl<K: PartialEq, V> Default for Environment<K, V> {
    fn default() -> Self {
        Self::new()
    }
}
