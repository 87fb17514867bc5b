use std::collections::HashMap;

use crate::models::Model;
use crate::normalize::{compare_names, normalize_name};

/// Models that share a normalized name. Derived on every read, never stored.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelGroup {
    /// Normalized name. Unnamed models are keyed by a space followed by their
    /// id, which no normalized name can start with.
    pub key: String,
    /// Display name, using the casing of the first model seen.
    pub name: String,
    /// Member ids in first-seen order.
    pub ids: Vec<String>,
    pub primary_id: String,
}

impl ModelGroup {
    pub fn contains(&self, model_id: &str) -> bool {
        self.ids.iter().any(|id| id == model_id)
    }

    pub fn has_duplicates(&self) -> bool {
        self.ids.len() > 1
    }
}

/// Partition models by normalized name.
///
/// Models with a blank name each get a group of their own, so they can never
/// be folded into another record.
pub fn group_models(models: &[Model]) -> Vec<ModelGroup> {
    let mut groups: Vec<ModelGroup> = Vec::new();
    let mut index: HashMap<String, usize> = HashMap::new();

    for model in models {
        let normalized = normalize_name(&model.name);
        let key = if normalized.is_empty() {
            format!(" {}", model.id)
        } else {
            normalized
        };
        if let Some(&pos) = index.get(&key) {
            let group = &mut groups[pos];
            if !group.contains(&model.id) {
                group.ids.push(model.id.clone());
            }
            continue;
        }
        index.insert(key.clone(), groups.len());
        groups.push(ModelGroup {
            key,
            name: model.name.clone(),
            ids: vec![model.id.clone()],
            primary_id: model.id.clone(),
        });
    }

    groups.sort_by(|a, b| compare_names(&a.name, &b.name));
    groups
}
