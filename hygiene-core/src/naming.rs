//! Unique source and layer names.

use std::sync::atomic::{AtomicU64, Ordering};

/// Prefix used by [`SourceNameSequence::default`].
pub const DEFAULT_PREFIX: &str = "points";

/// Hands out `prefix0`, `prefix1`, ... in call order.
///
/// Names are reserved at call time, so two loads started back to back get
/// distinct names even if their responses arrive in the opposite order.
///
/// # Examples
///
/// ```
/// use hygiene_core::SourceNameSequence;
///
/// let names = SourceNameSequence::default();
/// assert_eq!(names.next_name(), "points0");
/// assert_eq!(names.next_name(), "points1");
/// assert_eq!(names.issued(), 2);
/// ```
#[derive(Debug)]
pub struct SourceNameSequence {
    prefix: String,
    next: AtomicU64,
}

impl SourceNameSequence {
    /// A fresh sequence starting at zero.
    #[must_use]
    pub fn new(prefix: impl Into<String>) -> Self {
        Self {
            prefix: prefix.into(),
            next: AtomicU64::new(0),
        }
    }

    /// Reserve the next name.
    #[must_use]
    pub fn next_name(&self) -> String {
        let index = self.next.fetch_add(1, Ordering::Relaxed);
        format!("{}{index}", self.prefix)
    }

    /// How many names have been handed out.
    #[must_use]
    pub fn issued(&self) -> u64 {
        self.next.load(Ordering::Relaxed)
    }
}

impl Default for SourceNameSequence {
    fn default() -> Self {
        Self::new(DEFAULT_PREFIX)
    }
}
