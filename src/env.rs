use crate::agent::platform::Platform;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Mutex;

/// Process environment seam.
///
/// Every read and write of environment variables goes through this trait so
/// the agent lifecycle can be tested without touching the real process
/// environment.
pub trait Env: Send + Sync {
    /// Value of `key`, or `None` when unset.
    fn var(&self, key: &str) -> Option<String>;

    /// Set `key` for this process and its children.
    fn set_var(&self, key: &str, value: &str);

    /// Home directory of the current user.
    fn home_dir(&self) -> Option<PathBuf>;
}

/// The real process environment.
pub struct ProcessEnv;

impl Env for ProcessEnv {
    fn var(&self, key: &str) -> Option<String> {
        std::env::var(key).ok()
    }

    fn set_var(&self, key: &str, value: &str) {
        std::env::set_var(key, value);
    }

    fn home_dir(&self) -> Option<PathBuf> {
        if let Some(home) = self.var(Platform::current().home_var) {
            if !home.is_empty() {
                return Some(PathBuf::from(home));
            }
        }
        dirs::home_dir()
    }
}

/// In-memory environment for tests and embedding.
#[derive(Default)]
pub struct MemoryEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MemoryEnv {
    pub fn new() -> Self {
        Self::default()
    }

    /// An environment whose home variable already points at `home`.
    pub fn with_home(home: &Path) -> Self {
        let env = Self::new();
        env.set_var(Platform::current().home_var, &home.to_string_lossy());
        env
    }
}

impl Env for MemoryEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.lock().unwrap().get(key).cloned()
    }

    fn set_var(&self, key: &str, value: &str) {
        self.vars
            .lock()
            .unwrap()
            .insert(key.to_string(), value.to_string());
    }

    fn home_dir(&self) -> Option<PathBuf> {
        self.var(Platform::current().home_var)
            .filter(|home| !home.is_empty())
            .map(PathBuf::from)
    }
}

/// Export the platform's home variable if it is missing but resolvable.
/// Later ssh invocations read it to locate `~/.ssh`.
pub fn ensure_home_var(env: &dyn Env) {
    let home_var = Platform::current().home_var;
    if env.var(home_var).is_some() {
        return;
    }
    if let Some(home) = env.home_dir() {
        env.set_var(home_var, &home.to_string_lossy());
    }
}
