use std::collections::HashSet;

use serde::{Deserialize, Serialize};

use crate::Weapon;

/// Union of the documents every weapon requires, in first-seen order.
pub fn required_documents<'a>(weapons: impl IntoIterator<Item = &'a Weapon>) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut required = Vec::new();
    for weapon in weapons {
        for document in &weapon.required_documents {
            if seen.insert(document.as_str()) {
                required.push(document.clone());
            }
        }
    }
    required
}

/// Required document types with no upload, in required order.
pub fn missing_documents<'a>(
    required: &[String],
    uploaded: impl IntoIterator<Item = &'a str>,
) -> Vec<String> {
    let uploaded: HashSet<&str> = uploaded.into_iter().collect();
    required
        .iter()
        .filter(|document| !uploaded.contains(document.as_str()))
        .cloned()
        .collect()
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChecklistEntry {
    pub document_type: String,
    pub uploaded: bool,
}

pub fn document_checklist<'a>(
    required: &[String],
    uploaded: impl IntoIterator<Item = &'a str>,
) -> Vec<ChecklistEntry> {
    let uploaded: HashSet<&str> = uploaded.into_iter().collect();
    required
        .iter()
        .map(|document| ChecklistEntry {
            document_type: document.clone(),
            uploaded: uploaded.contains(document.as_str()),
        })
        .collect()
}
