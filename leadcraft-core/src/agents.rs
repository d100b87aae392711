//! Agent identifier resolution across sheets
//!
//! The same agent shows up as `ZIM_NAME_VTP` in one sheet and `ZIM_NAME2_VTP`
//! in another. [`AliasTable`] pairs those spellings, plus any configured
//! aliases, so that filters can match by exact string against the pair.
//! Names that differ in any other way (`ZIM_X3_VTP` and `ZIM_X7_VTP`) stay
//! distinct agents.

use regex::Regex;
use std::collections::{BTreeMap, BTreeSet};
use std::sync::OnceLock;

/// Fixed suffix carried by every agent identifier
pub const AGENT_SUFFIX: &str = "_VTP";

static TRAILING_DIGITS: OnceLock<Regex> = OnceLock::new();

/// Equivalent spellings of an agent name with the default suffix
///
/// Always contains the (trimmed) input itself.
pub fn agent_name_variants(name: &str) -> Vec<String> {
    variants_with_suffix(name, AGENT_SUFFIX)
}

/// Literal name, name without the trailing digits before `suffix`, and name
/// with a `2` before `suffix`
pub fn variants_with_suffix(name: &str, suffix: &str) -> Vec<String> {
    let name = name.trim();
    let mut variants = vec![name.to_string()];

    if let Some(stem) = name.strip_suffix(suffix).filter(|s| !s.is_empty()) {
        let trailing = TRAILING_DIGITS
            .get_or_init(|| Regex::new(r"^(?P<bare>.*?)(?P<digits>\d*)$").unwrap());
        if let Some(caps) = trailing.captures(stem) {
            let bare = &caps["bare"];
            if !caps["digits"].is_empty() && !bare.is_empty() {
                variants.push(format!("{bare}{suffix}"));
            }
        }

        let base = stem.strip_suffix('2').unwrap_or(stem);
        let numbered = format!("{base}2{suffix}");
        if !variants.contains(&numbered) {
            variants.push(numbered);
        }
    }

    variants
}

/// Spellings of the same agent, as observed in the sheets or configured
#[derive(Debug, Clone)]
pub struct AliasTable {
    suffix: String,
    explicit: BTreeMap<String, String>,
    observed: BTreeSet<String>,
}

impl AliasTable {
    /// Create an empty table for identifiers ending in `suffix`
    pub fn new(suffix: &str) -> Self {
        Self {
            suffix: suffix.to_string(),
            explicit: BTreeMap::new(),
            observed: BTreeSet::new(),
        }
    }

    /// Register explicit `alias -> canonical` pairs (e.g. from configuration)
    pub fn with_aliases(mut self, aliases: &BTreeMap<String, String>) -> Self {
        for (alias, target) in aliases {
            self.explicit
                .insert(alias.trim().to_string(), target.trim().to_string());
        }
        self
    }

    /// Build a table from observed names
    pub fn build<'a>(names: impl IntoIterator<Item = &'a str>, suffix: &str) -> Self {
        let mut table = Self::new(suffix);
        table.extend(names);
        table
    }

    pub fn extend<'a>(&mut self, names: impl IntoIterator<Item = &'a str>) {
        for name in names {
            self.insert(name);
        }
    }

    /// Record an observed spelling
    pub fn insert(&mut self, name: &str) {
        let name = name.trim();
        if !name.is_empty() {
            self.observed.insert(name.to_string());
        }
    }

    fn resolve<'a>(&'a self, name: &'a str) -> &'a str {
        self.explicit.get(name).map(String::as_str).unwrap_or(name)
    }

    /// Each name lists the other among its variants
    fn paired(&self, a: &str, b: &str) -> bool {
        a == b
            || (variants_with_suffix(a, &self.suffix).iter().any(|v| v == b)
                && variants_with_suffix(b, &self.suffix).iter().any(|v| v == a))
    }

    /// Name reported for the agent: the shortest observed spelling paired
    /// with `name` (after explicit aliases), or the resolved name itself
    pub fn canonical(&self, name: &str) -> String {
        let target = self.resolve(name.trim());
        self.observed
            .iter()
            .filter(|observed| self.paired(observed, target))
            .min_by(|a, b| a.len().cmp(&b.len()).then_with(|| a.cmp(b)))
            .cloned()
            .unwrap_or_else(|| target.to_string())
    }

    /// Every spelling that should match `name`, including `name` itself
    pub fn variants(&self, name: &str) -> BTreeSet<String> {
        let name = name.trim();
        let mut variants: BTreeSet<String> = variants_with_suffix(name, &self.suffix)
            .into_iter()
            .collect();
        let target = self.resolve(name);
        variants.extend(variants_with_suffix(target, &self.suffix));

        let canonical = self.canonical(name);
        let known = self
            .observed
            .iter()
            .chain(self.explicit.keys())
            .chain(self.explicit.values());
        for other in known {
            if self.canonical(other) == canonical {
                variants.insert(other.clone());
            }
        }
        variants
    }

    /// Distinct observed agents, one canonical name each, sorted
    pub fn canonical_names(&self) -> Vec<String> {
        let names: BTreeSet<String> = self
            .observed
            .iter()
            .map(|name| self.canonical(name))
            .collect();
        names.into_iter().collect()
    }
}

impl Default for AliasTable {
    fn default() -> Self {
        Self::new(AGENT_SUFFIX)
    }
}
