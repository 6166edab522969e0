//! Architecture synonym normalization.
//!
//! Service definitions and devices do not always agree on platform names
//! (`x86_64` vs `amd64`). Comparisons go through [`ArchSynonyms::normalize`].

use std::collections::BTreeMap;

/// Built-in synonyms, alias to canonical name.
pub const DEFAULT_ARCH_SYNONYMS: &[(&str, &str)] = &[
    ("x86_64", "amd64"),
    ("x86-64", "amd64"),
    ("aarch64", "arm64"),
    ("armhf", "arm"),
    ("armv7l", "arm"),
    ("i386", "386"),
    ("i686", "386"),
    ("ppc64el", "ppc64le"),
];

/// Alias to canonical architecture table.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchSynonyms {
    aliases: BTreeMap<String, String>,
}

impl ArchSynonyms {
    /// A table with no aliases; every name normalizes to itself.
    #[must_use]
    pub fn empty() -> Self {
        Self {
            aliases: BTreeMap::new(),
        }
    }

    /// Built-in table extended (and overridden) by `overrides`.
    #[must_use]
    pub fn with_overrides<'a>(overrides: impl IntoIterator<Item = (&'a str, &'a str)>) -> Self {
        let mut table = Self::default();
        for (alias, canonical) in overrides {
            table.insert(alias, canonical);
        }
        table
    }

    /// Add or replace one alias. Both sides are stored lowercase.
    pub fn insert(&mut self, alias: &str, canonical: &str) {
        self.aliases
            .insert(alias.trim().to_ascii_lowercase(), canonical.trim().to_ascii_lowercase());
    }

    /// Canonical name for `arch`; unknown names come back trimmed and lowercased.
    #[must_use]
    pub fn normalize(&self, arch: &str) -> String {
        let key = arch.trim().to_ascii_lowercase();
        self.aliases.get(&key).cloned().unwrap_or(key)
    }

    /// `true` when both names normalize to the same architecture.
    #[must_use]
    pub fn same(&self, a: &str, b: &str) -> bool {
        self.normalize(a) == self.normalize(b)
    }
}

impl Default for ArchSynonyms {
    fn default() -> Self {
        let mut table = Self::empty();
        for (alias, canonical) in DEFAULT_ARCH_SYNONYMS {
            table.insert(alias, canonical);
        }
        table
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_normalize_common_aliases() {
        let s = ArchSynonyms::default();
        assert_eq!(s.normalize("x86_64"), "amd64");
        assert_eq!(s.normalize("AARCH64"), "arm64");
        assert_eq!(s.normalize("amd64"), "amd64");
        assert_eq!(s.normalize(" riscv64 "), "riscv64");
        assert!(s.same("armhf", "arm"));
        assert!(!s.same("arm", "arm64"));
    }

    #[test]
    fn overrides_replace_defaults() {
        let s = ArchSynonyms::with_overrides([("armhf", "armv7"), ("s390", "s390x")]);
        assert_eq!(s.normalize("armhf"), "armv7");
        assert_eq!(s.normalize("s390"), "s390x");
        assert_eq!(s.normalize("x86_64"), "amd64");
    }

    #[test]
    fn empty_table_is_identity() {
        assert_eq!(ArchSynonyms::empty().normalize("x86_64"), "x86_64");
    }
}
