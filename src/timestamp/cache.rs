//! Compile-once cache for timestamp formats.
//!
//! Owned by the host and passed by reference; there is no process-wide
//! instance. Entries are never invalidated since a site's format, locale and
//! timezone do not change while it runs.

use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};

use tracing::debug;

use super::{CompiledFormat, DateLocale, FormatError};

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct FormatKey {
    format: String,
    locale: String,
    timezone: String,
}

/// Read-mostly map from (format, locale, timezone) to its compiled form
#[derive(Debug, Default)]
pub struct FormatCache {
    entries: RwLock<HashMap<FormatKey, Arc<CompiledFormat>>>,
}

impl FormatCache {
    pub fn new() -> Self {
        Self::default()
    }

    /// Return the compiled format, compiling it on first use
    ///
    /// Concurrent first uses may both compile; the first insert wins and every
    /// caller gets that entry afterwards.
    pub fn get_or_compile(
        &self,
        format: &str,
        locale: &DateLocale,
        timezone: &str,
    ) -> Result<Arc<CompiledFormat>, FormatError> {
        let key = FormatKey {
            format: format.to_string(),
            locale: locale.fingerprint(),
            timezone: timezone.to_string(),
        };

        if let Some(hit) = self
            .entries
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(&key)
        {
            return Ok(Arc::clone(hit));
        }

        debug!(format, timezone, "Format cache miss");
        let compiled = Arc::new(CompiledFormat::compile(format, locale, timezone)?);

        let mut entries = self.entries.write().unwrap_or_else(PoisonError::into_inner);
        Ok(Arc::clone(entries.entry(key).or_insert(compiled)))
    }

    /// Number of compiled formats held
    pub fn len(&self) -> usize {
        self.entries.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
