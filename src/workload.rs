//! Explicit workload registry.
//!
//! Workloads are registered by name ahead of a run; nothing is discovered
//! at runtime. Registration order is the order the runner traverses on
//! even rounds.

use std::fmt;

/// Error reported by a workload invocation.
///
/// The runner never interprets the reason; any error fails the round.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{reason}")]
pub struct WorkloadError {
    reason: String,
}

impl WorkloadError {
    pub fn new(reason: impl Into<String>) -> Self {
        Self {
            reason: reason.into(),
        }
    }

    pub fn reason(&self) -> &str {
        &self.reason
    }
}

/// One unit of work. Returns `Err` to signal failure.
pub type WorkloadFn = Box<dyn FnMut() -> Result<(), WorkloadError>>;

/// A named workload.
pub struct WorkloadEntry {
    name: String,
    func: WorkloadFn,
}

impl WorkloadEntry {
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Run one unit of work.
    pub fn call(&mut self) -> Result<(), WorkloadError> {
        (self.func)()
    }
}

impl fmt::Debug for WorkloadEntry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorkloadEntry")
            .field("name", &self.name)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum RegistryError {
    #[error("workload '{0}' is already registered")]
    Duplicate(String),
}

/// Ordered collection of named workloads.
#[derive(Debug, Default)]
pub struct WorkloadRegistry {
    entries: Vec<WorkloadEntry>,
}

impl WorkloadRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a fallible workload.
    pub fn register<F>(&mut self, name: impl Into<String>, func: F) -> Result<&mut Self, RegistryError>
    where
        F: FnMut() -> Result<(), WorkloadError> + 'static,
    {
        let name = name.into();
        if self.entries.iter().any(|e| e.name == name) {
            return Err(RegistryError::Duplicate(name));
        }

        self.entries.push(WorkloadEntry {
            name,
            func: Box::new(func),
        });
        Ok(self)
    }

    /// Register a workload that cannot fail.
    pub fn register_infallible<F>(
        &mut self,
        name: impl Into<String>,
        mut func: F,
    ) -> Result<&mut Self, RegistryError>
    where
        F: FnMut() + 'static,
    {
        self.register(name, move || {
            func();
            Ok(())
        })
    }

    /// Keep only workloads whose name matches `pattern`.
    ///
    /// See [`matches_glob`] for the pattern syntax.
    pub fn retain_matching(&mut self, pattern: &str) {
        self.entries.retain(|e| matches_glob(&e.name, pattern));
    }

    pub fn names(&self) -> Vec<&str> {
        self.entries.iter().map(|e| e.name.as_str()).collect()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn get_mut(&mut self, name: &str) -> Option<&mut WorkloadEntry> {
        self.entries.iter_mut().find(|e| e.name == name)
    }

    pub(crate) fn entries_mut(&mut self) -> &mut [WorkloadEntry] {
        &mut self.entries
    }
}

/// Case-insensitive glob match supporting `*`.
///
/// A pattern without `*` matches any name containing it.
pub fn matches_glob(text: &str, pattern: &str) -> bool {
    let pattern = pattern.to_lowercase();
    let text = text.to_lowercase();

    if !pattern.contains('*') {
        return text.contains(&pattern);
    }

    let parts: Vec<&str> = pattern.split('*').collect();
    let mut remaining = text.as_str();

    for (i, part) in parts.iter().enumerate() {
        if part.is_empty() {
            continue;
        }
        if i == 0 {
            // anchored at the start
            if !remaining.starts_with(part) {
                return false;
            }
            remaining = &remaining[part.len()..];
        } else if i == parts.len() - 1 {
            // anchored at the end
            if !remaining.ends_with(part) {
                return false;
            }
        } else if let Some(pos) = remaining.find(part) {
            remaining = &remaining[pos + part.len()..];
        } else {
            return false;
        }
    }
    true
}
