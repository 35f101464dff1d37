//! Error types for CMap construction.
//!
//! Provides [`CMapError`] for load-time failures. Every variant fails the
//! whole build: a CMap is never handed out partially populated. Decode-time
//! problems (unmapped codes, bytes outside every codespace) are not errors
//! and are reported through placeholders instead.

use std::fmt;

use crate::codespace::Codespace;

/// Fatal error raised while building a CMap.
#[derive(Debug, Clone, PartialEq)]
pub enum CMapError {
    /// Grammar violation in a CMap program: wrong token type or arity in a
    /// section, incomplete group, bfrange array length mismatch, odd-length
    /// hex string.
    Malformed(String),
    /// Two codespaces of different byte lengths admit the same prefix, so the
    /// byte length of a code could not be decided.
    AmbiguousCodespace {
        /// The codespace with fewer bytes.
        shorter: Codespace,
        /// The codespace with more bytes whose truncated range overlaps `shorter`.
        longer: Codespace,
    },
    /// A predefined CMap name is not present in the registry.
    UnknownPredefined(String),
    /// A `usecmap` chain revisits a CMap name.
    CircularInheritance(String),
    /// A configured resource limit was exceeded.
    ResourceLimitExceeded {
        /// Name of the limit that was exceeded (e.g., "max_range_span").
        limit_name: String,
        /// The configured limit value.
        limit_value: usize,
        /// The actual value that exceeded the limit.
        actual_value: usize,
    },
}

impl CMapError {
    /// Shorthand for a [`CMapError::Malformed`] error.
    pub fn malformed(msg: impl Into<String>) -> Self {
        CMapError::Malformed(msg.into())
    }
}

impl fmt::Display for CMapError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CMapError::Malformed(msg) => write!(f, "malformed CMap: {msg}"),
            CMapError::AmbiguousCodespace { shorter, longer } => write!(
                f,
                "ambiguous codespace: {longer} shares a prefix with {shorter}"
            ),
            CMapError::UnknownPredefined(name) => {
                write!(f, "unknown predefined CMap: {name}")
            }
            CMapError::CircularInheritance(name) => {
                write!(f, "circular usecmap inheritance at {name}")
            }
            CMapError::ResourceLimitExceeded {
                limit_name,
                limit_value,
                actual_value,
            } => write!(
                f,
                "resource limit exceeded: {limit_name} (limit: {limit_value}, actual: {actual_value})"
            ),
        }
    }
}

impl std::error::Error for CMapError {}
