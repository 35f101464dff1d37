//! CIDSystemInfo: the character collection a CMap or CIDFont targets.

use std::fmt;

/// CID system information from a `/CIDSystemInfo` dictionary.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct CidSystemInfo {
    /// Registry (e.g., "Adobe").
    pub registry: String,
    /// Ordering (e.g., "Japan1", "GB1", "CNS1", "Korea1", "Identity").
    pub ordering: String,
    /// Supplement number.
    pub supplement: i64,
}

impl CidSystemInfo {
    /// Create a system info record.
    pub fn new(registry: impl Into<String>, ordering: impl Into<String>, supplement: i64) -> Self {
        Self {
            registry: registry.into(),
            ordering: ordering.into(),
            supplement,
        }
    }

    /// The character collection name, `Registry-Ordering` (e.g., "Adobe-Japan1").
    pub fn collection(&self) -> String {
        format!("{}-{}", self.registry, self.ordering)
    }

    /// Check if this is an Adobe CJK collection.
    pub fn is_adobe_cjk(&self) -> bool {
        self.registry == "Adobe"
            && matches!(self.ordering.as_str(), "Japan1" | "GB1" | "CNS1" | "Korea1")
    }

    /// Check if this is the Adobe-Identity collection.
    pub fn is_identity(&self) -> bool {
        self.registry == "Adobe" && self.ordering == "Identity"
    }
}

impl fmt::Display for CidSystemInfo {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}-{}", self.registry, self.ordering, self.supplement)
    }
}
