//! Scoped environment overrides for configuration tests.

use std::env;
use std::ffi::OsString;
use std::sync::{Mutex, MutexGuard, OnceLock};

static ENV_MUTEX: OnceLock<Mutex<()>> = OnceLock::new();

/// Restores the overridden variables when dropped.
///
/// Holding the guard also holds a process-wide lock, so tests that touch
/// the environment run one at a time.
pub struct ScopedEnv {
    saved: Vec<(&'static str, Option<OsString>)>,
    _lock: MutexGuard<'static, ()>,
}

impl ScopedEnv {
    /// Applies `overrides`; `None` removes the variable.
    pub fn apply(overrides: &[(&'static str, Option<&str>)]) -> Self {
        let lock = ENV_MUTEX
            .get_or_init(|| Mutex::new(()))
            .lock()
            .unwrap_or_else(std::sync::PoisonError::into_inner);
        let saved = overrides
            .iter()
            .map(|&(variable, value)| {
                let previous = env::var_os(variable);
                // SAFETY: ENV_MUTEX serializes every environment mutation in tests.
                unsafe { write_var(variable, value.map(OsString::from)) };
                (variable, previous)
            })
            .collect();
        Self { saved, _lock: lock }
    }

    /// Clears every variable in `variables`.
    pub fn cleared(variables: &[&'static str]) -> Self {
        let overrides: Vec<(&'static str, Option<&str>)> =
            variables.iter().map(|&variable| (variable, None)).collect();
        Self::apply(&overrides)
    }
}

impl Drop for ScopedEnv {
    fn drop(&mut self) {
        for (variable, previous) in self.saved.drain(..) {
            // SAFETY: the guard still holds ENV_MUTEX.
            unsafe { write_var(variable, previous) };
        }
    }
}

unsafe fn write_var(variable: &str, value: Option<OsString>) {
    unsafe {
        match value {
            Some(found) => env::set_var(variable, found),
            None => env::remove_var(variable),
        }
    }
}
