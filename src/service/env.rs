//! Environment-variable injection for dependency discovery.

use std::ffi::OsString;

/// Sets a variable for the guard's lifetime and restores the previous value
/// (or removes the variable) on drop, so code under test can discover a mock
/// service's base URL without permanent environment changes.
#[derive(Debug)]
pub struct EnvVarGuard {
    name: String,
    previous: Option<OsString>,
}

impl EnvVarGuard {
    pub fn set(name: impl Into<String>, value: &str) -> Self {
        let name = name.into();
        let previous = std::env::var_os(&name);
        std::env::set_var(&name, value);
        Self { name, previous }
    }
}

impl Drop for EnvVarGuard {
    fn drop(&mut self) {
        match &self.previous {
            Some(value) => std::env::set_var(&self.name, value),
            None => std::env::remove_var(&self.name),
        }
    }
}
