//! Dependency override rules
//!
//! pnpm records `overrides` as `selector -> forced specifier`, where a selector
//! is `target` or `parent>...>target` and every segment is `name` or
//! `name@range`. Ranges are compared as strings, never evaluated.

use crate::error::{Error, Result};
use std::collections::BTreeMap;
use std::fmt;

/// A package name with an optional range, one segment of a selector.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PackagePattern {
    /// Package name (scoped names keep their leading `@`)
    pub name: String,
    /// Range the rule is restricted to, if any
    pub range: Option<String>,
}

impl PackagePattern {
    fn parse(selector: &str, segment: &str) -> Result<Self> {
        let segment = segment.trim();
        let search_from = usize::from(segment.starts_with('@'));
        let (name, range) = match segment[search_from..].find('@') {
            Some(idx) => {
                let at = search_from + idx;
                (&segment[..at], Some(&segment[at + 1..]))
            }
            None => (segment, None),
        };

        if name.is_empty() || name == "@" {
            return Err(Error::InvalidOverride(
                selector.to_string(),
                format!("empty package name in segment '{segment}'"),
            ));
        }
        if range.is_some_and(str::is_empty) {
            return Err(Error::InvalidOverride(
                selector.to_string(),
                format!("empty range in segment '{segment}'"),
            ));
        }

        Ok(Self {
            name: name.to_string(),
            range: range.map(str::to_string),
        })
    }

    fn matches(&self, name: &str, declared: &str) -> bool {
        self.name == name && self.range.as_deref().map_or(true, |range| range == declared)
    }
}

impl fmt::Display for PackagePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.range {
            Some(range) => write!(f, "{}@{}", self.name, range),
            None => f.write_str(&self.name),
        }
    }
}

/// One parsed `selector -> value` entry
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OverrideRule {
    /// The selector as written
    pub selector: String,
    /// Ancestors the rule is scoped under, outermost first
    pub parents: Vec<PackagePattern>,
    /// The package the rule rewrites
    pub target: PackagePattern,
    /// The forced specifier
    pub value: String,
}

impl OverrideRule {
    /// Parse a selector and its forced value.
    pub fn parse(selector: &str, value: &str) -> Result<Self> {
        let mut segments = selector
            .split('>')
            .map(|segment| PackagePattern::parse(selector, segment))
            .collect::<Result<Vec<_>>>()?;

        let target = segments
            .pop()
            .ok_or_else(|| Error::InvalidOverride(selector.to_string(), "empty selector".into()))?;

        Ok(Self {
            selector: selector.to_string(),
            parents: segments,
            target,
            value: value.to_string(),
        })
    }

    /// Whether the rule applies to a project's own (direct) dependencies.
    pub fn is_direct(&self) -> bool {
        self.parents.is_empty()
    }
}

/// The overrides recorded in a lockfile or configured for a workspace.
///
/// Equality compares the raw `selector -> value` pairs.
#[derive(Debug, Clone, Default)]
pub struct Overrides {
    raw: BTreeMap<String, String>,
    rules: Vec<OverrideRule>,
}

impl Overrides {
    /// Parse every selector of a raw overrides map.
    pub fn from_map(raw: BTreeMap<String, String>) -> Result<Self> {
        let rules = raw
            .iter()
            .map(|(selector, value)| OverrideRule::parse(selector, value))
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { raw, rules })
    }

    /// True when no overrides are recorded.
    pub fn is_empty(&self) -> bool {
        self.raw.is_empty()
    }

    /// Raw `selector -> value` pairs in selector order.
    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.raw.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }

    /// Parsed rules in selector order.
    pub fn rules(&self) -> &[OverrideRule] {
        &self.rules
    }

    /// The forced specifier for a direct dependency `name` declared as
    /// `declared`, if a rule applies.
    ///
    /// A rule whose range equals `declared` wins over a rule without a range.
    pub fn for_direct_dependency(&self, name: &str, declared: &str) -> Option<&str> {
        let mut unranged = None;
        for rule in self.rules.iter().filter(|rule| rule.is_direct()) {
            if !rule.target.matches(name, declared) {
                continue;
            }
            if rule.target.range.is_some() {
                return Some(&rule.value);
            }
            unranged.get_or_insert(rule.value.as_str());
        }
        unranged
    }
}

impl PartialEq for Overrides {
    fn eq(&self, other: &Self) -> bool {
        self.raw == other.raw
    }
}

impl Eq for Overrides {}
