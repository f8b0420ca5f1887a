//! Content hashing for change detection.
//!
//! A document is re-indexed only when its content hash differs from the one
//! stored with its chunks, so the hash must be deterministic and stable across
//! runs. Collisions are not guarded against.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::hash::Hasher;
use std::sync::Arc;

/// Strategy for turning document content into a hex token.
pub trait ContentHasher: Send + Sync {
    fn hash(&self, content: &str) -> String;
}

/// 256-bit blake3 digest, hex encoded.
#[derive(Debug, Clone, Copy, Default)]
pub struct Blake3Hasher;

impl ContentHasher for Blake3Hasher {
    fn hash(&self, content: &str) -> String {
        hex::encode(blake3::hash(content.as_bytes()).as_bytes())
    }
}

/// 64-bit FNV-1a, hex encoded. Cheaper, not collision resistant.
#[derive(Debug, Clone, Copy, Default)]
pub struct FnvHasher;

impl ContentHasher for FnvHasher {
    fn hash(&self, content: &str) -> String {
        let mut hasher = fnv::FnvHasher::default();
        hasher.write(content.as_bytes());
        hex::encode(hasher.finish().to_be_bytes())
    }
}

/// Hasher selection in configuration files.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HasherKind {
    #[default]
    Blake3,
    Fnv,
}

impl HasherKind {
    pub fn build(self) -> Arc<dyn ContentHasher> {
        match self {
            HasherKind::Blake3 => Arc::new(Blake3Hasher),
            HasherKind::Fnv => Arc::new(FnvHasher),
        }
    }
}

impl fmt::Display for HasherKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            HasherKind::Blake3 => write!(f, "blake3"),
            HasherKind::Fnv => write!(f, "fnv"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_hashes_are_deterministic() {
        for kind in [HasherKind::Blake3, HasherKind::Fnv] {
            let hasher = kind.build();
            assert_eq!(hasher.hash("# Setup"), hasher.hash("# Setup"));
            assert_ne!(hasher.hash("# Setup"), hasher.hash("# Setup\n"));
        }
    }

    #[test]
    fn test_hash_format() {
        let blake = Blake3Hasher.hash("hello");
        assert_eq!(blake.len(), 64);
        assert_eq!(
            blake,
            "ea8f163db38682925e4491c5e58d4bb3506ef8c14eb78a86e908c5624a67200f"
        );

        let fnv = FnvHasher.hash("");
        assert_eq!(fnv, "cbf29ce484222325");
        assert!(fnv.chars().all(|c| c.is_ascii_hexdigit()));
    }

    #[test]
    fn test_kind_from_toml_value() {
        #[derive(Deserialize)]
        struct Wrapper {
            hasher: HasherKind,
        }
        let parsed: Wrapper = toml::from_str("hasher = \"fnv\"").unwrap();
        assert_eq!(parsed.hasher, HasherKind::Fnv);
        assert_eq!(HasherKind::default().to_string(), "blake3");
    }
}
