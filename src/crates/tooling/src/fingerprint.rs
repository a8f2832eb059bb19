//! Configuration fingerprints
//!
//! A fingerprint is a name-based UUID (version 3, OID namespace) derived from
//! a set of key/value pairs. Entries are sorted by key before hashing, so the
//! result does not depend on insertion order.

use std::fmt;
use uuid::Uuid;

/// Deterministic identifier for a set of key/value pairs
///
/// # Example
///
/// ```rust
/// use tooling::Fingerprint;
///
/// let a = Fingerprint::of([("host", "db1"), ("port", "3306")]);
/// let b = Fingerprint::of([("port", "3306"), ("host", "db1")]);
/// assert_eq!(a, b);
///
/// let c = Fingerprint::of([("host", "db2"), ("port", "3306")]);
/// assert_ne!(a, c);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Fingerprint(Uuid);

impl Fingerprint {
    /// Fingerprint an iterator of key/value pairs
    pub fn of<I, K, V>(entries: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: AsRef<str>,
    {
        Self(Uuid::new_v3(&Uuid::NAMESPACE_OID, canonical_form(entries).as_bytes()))
    }

    /// Underlying UUID
    pub fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl fmt::Display for Fingerprint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.hyphenated())
    }
}

/// Name-based UUID string for a parameter set
///
/// Same parameters in any order produce the same UUID string.
pub fn name_uuid<I, K, V>(params: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    Fingerprint::of(params).to_string()
}

/// Render sorted entries as `("key", "value")` joined by `|`
///
/// Keys and values are quoted with escapes, so a value containing the
/// separator or a quote cannot spell out another entry.
pub fn canonical_form<I, K, V>(entries: I) -> String
where
    I: IntoIterator<Item = (K, V)>,
    K: AsRef<str>,
    V: AsRef<str>,
{
    let mut pairs: Vec<(K, V)> = entries.into_iter().collect();
    pairs.sort_by(|a, b| a.0.as_ref().cmp(b.0.as_ref()));

    pairs
        .iter()
        .map(|(k, v)| format!("({:?}, {:?})", k.as_ref(), v.as_ref()))
        .collect::<Vec<_>>()
        .join("|")
}
