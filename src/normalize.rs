use std::cmp::Ordering;
use std::collections::HashMap;

use unicode_normalization::UnicodeNormalization;

use crate::models::Model;

fn is_combining_diacritic(c: char) -> bool {
    ('\u{0300}'..='\u{036f}').contains(&c)
}

/// Canonical form of a display name for identity matching: lower-cased,
/// accents stripped, whitespace collapsed and trimmed.
///
/// Lower-casing runs first so that the result is stable under a second pass
/// (some uppercase letters lower-case to a base letter plus a combining mark).
pub fn normalize_name(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped: String = lowered.nfd().filter(|c| !is_combining_diacritic(*c)).collect();
    stripped.split_whitespace().collect::<Vec<_>>().join(" ")
}

/// Case- and accent-insensitive ordering, close enough to French collation
/// for display lists. Falls back to the raw strings so the order is total.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    normalize_name(a)
        .cmp(&normalize_name(b))
        .then_with(|| a.cmp(b))
}

/// Maps a free-form model name to a known model.
pub trait EntityResolver {
    fn resolve(&self, raw_name: &str) -> Option<&Model>;
}

/// Resolves names through their normalized form. When several models share a
/// normalized name, the first one in the source collection wins.
pub struct NameIndex<'a> {
    by_name: HashMap<String, &'a Model>,
}

impl<'a> NameIndex<'a> {
    pub fn build(models: &'a [Model]) -> Self {
        let mut by_name = HashMap::new();
        for model in models {
            let key = normalize_name(&model.name);
            if key.is_empty() {
                continue;
            }
            by_name.entry(key).or_insert(model);
        }
        Self { by_name }
    }
}

impl EntityResolver for NameIndex<'_> {
    fn resolve(&self, raw_name: &str) -> Option<&Model> {
        let key = normalize_name(raw_name);
        if key.is_empty() {
            return None;
        }
        self.by_name.get(&key).copied()
    }
}
