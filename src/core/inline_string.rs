/*!
 * Inline String
 * Small-string storage for process names and error payloads
 */

use serde::{Deserialize, Serialize};
use smartstring::alias::String as SmartString;
use std::fmt;

/// String that keeps short values (≤23 bytes) inline
///
/// Process names and most error messages fit, so cloning a record snapshot
/// or building an error rarely touches the allocator.
#[derive(Clone, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
#[repr(transparent)]
pub struct InlineString {
    inner: SmartString,
}

impl InlineString {
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    #[inline(always)]
    pub fn as_str(&self) -> &str {
        self.inner.as_str()
    }

    /// Check if string is stored inline (no heap allocation)
    #[inline]
    pub fn is_inline(&self) -> bool {
        self.inner.is_inline()
    }

    #[inline(always)]
    pub fn len(&self) -> usize {
        self.inner.len()
    }

    #[inline(always)]
    pub fn is_empty(&self) -> bool {
        self.inner.is_empty()
    }
}

impl From<&str> for InlineString {
    #[inline]
    fn from(s: &str) -> Self {
        Self {
            inner: SmartString::from(s),
        }
    }
}

impl From<String> for InlineString {
    #[inline]
    fn from(s: String) -> Self {
        Self {
            inner: SmartString::from(s),
        }
    }
}

impl From<InlineString> for String {
    #[inline]
    fn from(s: InlineString) -> Self {
        s.inner.into()
    }
}

impl AsRef<str> for InlineString {
    #[inline(always)]
    fn as_ref(&self) -> &str {
        self.as_str()
    }
}

impl std::ops::Deref for InlineString {
    type Target = str;

    #[inline(always)]
    fn deref(&self) -> &Self::Target {
        self.as_str()
    }
}

impl fmt::Display for InlineString {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_process_names_stay_inline() {
        for name in ["init", "kernel", "worker-17", "triplehuge"] {
            let s = InlineString::from(name);
            assert!(s.is_inline(), "{} should be inline", name);
            assert_eq!(s.as_str(), name);
        }
    }

    #[test]
    fn test_long_message_spills_to_heap() {
        let long = InlineString::from(
            "pid table exhausted while forking a child of the boot process",
        );
        assert!(!long.is_inline());
        assert!(long.contains("exhausted"));
    }

    #[test]
    fn test_serialization() {
        let s = InlineString::from("init");
        let json = serde_json::to_string(&s).unwrap();
        assert_eq!(json, "\"init\"");
        let back: InlineString = serde_json::from_str(&json).unwrap();
        assert_eq!(back, s);
    }
}
