//! Value-based cache keys.

use super::validity::Validity;
use sha2::{Digest, Sha256};
use std::fmt;

/// A value-based identifier of a cacheable computation.
///
/// Equality is structural, never identity-based: two keys built from equal
/// inputs compare equal even when produced by different processor instances.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum CacheKey {
    /// A key local to one output: processor type, port name, and a local
    /// discriminator.
    Simple {
        /// Type name of the producing processor.
        processor_type: String,
        /// Output port name.
        port: String,
        /// Local discriminator distinguishing outputs of the same port.
        discriminator: String,
    },
    /// An internal key carrying an opaque digest, typically derived from
    /// content read at recompute time.
    Internal {
        /// What the digest was computed over.
        discriminator: String,
        /// Opaque digest value.
        digest: String,
    },
    /// A compound key over an ordered list of sub-keys.
    Compound {
        /// Type name of the producing processor.
        processor_type: String,
        /// Output port name.
        port: String,
        /// Ordered sub-keys.
        parts: Vec<CacheKey>,
    },
}

impl CacheKey {
    /// Build a simple key.
    pub fn simple(
        processor_type: impl Into<String>,
        port: impl Into<String>,
        discriminator: impl Into<String>,
    ) -> Self {
        CacheKey::Simple {
            processor_type: processor_type.into(),
            port: port.into(),
            discriminator: discriminator.into(),
        }
    }

    /// Build an internal key.
    pub fn internal(discriminator: impl Into<String>, digest: impl Into<String>) -> Self {
        CacheKey::Internal {
            discriminator: discriminator.into(),
            digest: digest.into(),
        }
    }

    /// Build a compound key from sub-keys that are all known to be present.
    pub fn compound_of(
        processor_type: impl Into<String>,
        port: impl Into<String>,
        parts: Vec<CacheKey>,
    ) -> Self {
        CacheKey::Compound {
            processor_type: processor_type.into(),
            port: port.into(),
            parts,
        }
    }

    /// Build a compound key, propagating taint.
    ///
    /// Returns `None` the moment any sub-key is absent: a dependent's key
    /// must reflect "cannot be verified cacheable" whenever any upstream
    /// dependency cannot itself be proven cacheable.
    pub fn compound(
        processor_type: impl Into<String>,
        port: impl Into<String>,
        parts: Vec<Option<CacheKey>>,
    ) -> Option<Self> {
        let parts = parts.into_iter().collect::<Option<Vec<_>>>()?;
        Some(Self::compound_of(processor_type, port, parts))
    }
}

impl fmt::Display for CacheKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CacheKey::Simple {
                processor_type,
                port,
                discriminator,
            } => write!(f, "{processor_type}?{port}?{discriminator}"),
            CacheKey::Internal {
                discriminator,
                digest,
            } => write!(f, "internal?{discriminator}?{digest}"),
            CacheKey::Compound {
                processor_type,
                port,
                parts,
            } => {
                write!(f, "{processor_type}?{port}?[")?;
                for (i, part) in parts.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{part}")?;
                }
                write!(f, "]")
            }
        }
    }
}

/// A cache key paired with the validity it was observed under.
///
/// Only constructible from both-present parts; a missing key or validity
/// propagates as "not cacheable".
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct KeyValidity {
    /// The structural cache key.
    pub key: CacheKey,
    /// The freshness token observed alongside the key.
    pub validity: Validity,
}

impl KeyValidity {
    /// Create a key/validity pair.
    pub fn new(key: CacheKey, validity: Validity) -> Self {
        Self { key, validity }
    }

    /// Combine optional parts, yielding `None` unless both are present.
    pub fn from_parts(key: Option<CacheKey>, validity: Option<Validity>) -> Option<Self> {
        Some(Self::new(key?, validity?))
    }
}

/// Hex-encoded SHA-256 digest of arbitrary content.
///
/// The standard way to derive an [`CacheKey::Internal`] discriminating digest
/// from data that only becomes known at recompute time.
#[must_use]
pub fn content_digest(content: &[u8]) -> String {
    let mut hasher = Sha256::new();
    hasher.update(content);
    let digest = hasher.finalize();
    let mut out = String::with_capacity(digest.len() * 2);
    for byte in digest {
        use fmt::Write;
        let _ = write!(out, "{byte:02x}");
    }
    out
}
