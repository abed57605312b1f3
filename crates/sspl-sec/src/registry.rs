//! Security method identifiers and the libraries that implement them.

use std::{fmt, str::FromStr};

use serde::{Deserialize, Serialize};

/// Prefix shared by every backend library name.
pub const LIBRARY_FAMILY: &str = "sspl";

/// Major ABI version encoded in backend library names.
pub const LIBRARY_MAJOR_VERSION: u32 = 0;

/// A security method the process can switch to.
///
/// The set is closed: adding a method means adding a variant here and a
/// library name in [`MethodId::library_name`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MethodId {
    /// No signing. Active when the process starts.
    #[default]
    None,
    /// Public key signing.
    Pki,
}

impl MethodId {
    /// Every method, in registry order.
    pub const ALL: [Self; 2] = [Self::None, Self::Pki];

    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Pki => "pki",
        }
    }

    /// Versioned name of the shared library backing this method
    /// (`<family>_<method>.so.<major>`).
    #[must_use]
    pub const fn library_name(self) -> &'static str {
        match self {
            Self::None => "sspl_none.so.0",
            Self::Pki => "sspl_pki.so.0",
        }
    }
}

impl fmt::Display for MethodId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A method name that is not part of the registry.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown security method: {0}")]
pub struct UnknownMethod(pub String);

impl FromStr for MethodId {
    type Err = UnknownMethod;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|method| method.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| UnknownMethod(s.to_string()))
    }
}

/// Pairing of a method with its backend library.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RegistryEntry {
    pub method: MethodId,
    pub library: &'static str,
}

/// The method registry, one entry per [`MethodId`].
pub const REGISTRY: &[RegistryEntry] = &[
    RegistryEntry {
        method: MethodId::None,
        library: MethodId::None.library_name(),
    },
    RegistryEntry {
        method: MethodId::Pki,
        library: MethodId::Pki.library_name(),
    },
];

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_library_names_follow_naming_convention() {
        for method in MethodId::ALL {
            let expected = format!(
                "{LIBRARY_FAMILY}_{}.so.{LIBRARY_MAJOR_VERSION}",
                method.as_str()
            );
            assert_eq!(method.library_name(), expected);
        }
    }

    #[test]
    fn test_registry_has_one_entry_per_method() {
        assert_eq!(REGISTRY.len(), MethodId::ALL.len());
        for (entry, method) in REGISTRY.iter().zip(MethodId::ALL) {
            assert_eq!(entry.method, method);
            assert_eq!(entry.library, method.library_name());
        }
    }

    #[test]
    fn test_documented_library_names() {
        assert_eq!(MethodId::None.library_name(), "sspl_none.so.0");
        assert_eq!(MethodId::Pki.library_name(), "sspl_pki.so.0");
    }

    #[test]
    fn test_default_method_is_none() {
        assert_eq!(MethodId::default(), MethodId::None);
    }

    #[test]
    fn test_from_str_is_case_insensitive() {
        assert_eq!("pki".parse::<MethodId>(), Ok(MethodId::Pki));
        assert_eq!("PKI".parse::<MethodId>(), Ok(MethodId::Pki));
        assert_eq!(" None ".parse::<MethodId>(), Ok(MethodId::None));
    }

    #[test]
    fn test_from_str_rejects_unknown_method() {
        let err = "kerberos".parse::<MethodId>().unwrap_err();

        assert_eq!(err, UnknownMethod("kerberos".to_string()));
        assert_eq!(err.to_string(), "unknown security method: kerberos");
    }

    #[test]
    fn test_display_matches_as_str() {
        assert_eq!(MethodId::Pki.to_string(), "pki");
        assert_eq!(format!("{}", MethodId::None), "none");
    }
}
