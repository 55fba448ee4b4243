//! Deterministic device identity

use std::fmt;

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

/// Stable external address of one physical device
///
/// A SHA-256 over the record's identity fields, rendered in the usual
/// 8-4-4-4-12 hex layout.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Guid(String);

impl Guid {
    /// Derive a GUID from identity fields, in order
    #[must_use]
    pub fn derive(parts: &[&str]) -> Self {
        let mut hasher = Sha256::new();
        for part in parts {
            hasher.update(part.as_bytes());
            hasher.update([0u8]);
        }
        let digest = hasher.finalize();

        let hex: String = digest[..16].iter().map(|b| format!("{b:02x}")).collect();
        Self(format!(
            "{}-{}-{}-{}-{}",
            &hex[0..8],
            &hex[8..12],
            &hex[12..16],
            &hex[16..20],
            &hex[20..32]
        ))
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for Guid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for Guid {
    fn from(value: &str) -> Self {
        Self(value.trim().to_ascii_lowercase())
    }
}

impl From<String> for Guid {
    fn from(value: String) -> Self {
        Self::from(value.as_str())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_derive_is_deterministic() {
        let a = Guid::derive(&["Samsung SSD 980", "S64DNF0R123456"]);
        let b = Guid::derive(&["Samsung SSD 980", "S64DNF0R123456"]);
        assert_eq!(a, b);
        assert_eq!(a.as_str().len(), 36);
        assert_eq!(a.as_str().matches('-').count(), 4);
    }

    #[test]
    fn test_field_boundaries_matter() {
        assert_ne!(Guid::derive(&["ab", "c"]), Guid::derive(&["a", "bc"]));
    }

    #[test]
    fn test_parse_normalizes_case() {
        let guid = Guid::derive(&["x"]);
        let upper = guid.as_str().to_ascii_uppercase();
        assert_eq!(Guid::from(upper.as_str()), guid);
    }
}
