//! Class map: label to class id.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// A category as it appears in COCO-style category lists.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Category {
    pub id: u32,
    pub name: String,
}

impl Category {
    pub fn new(id: u32, name: &str) -> Self {
        Self {
            id,
            name: name.to_string(),
        }
    }
}

/// Mapping from class label to the project's class id.
///
/// Normally built from the project's ordered label list, where a label's id
/// is its index. Formats that need their own id space (COCO) derive it from
/// the label set through [`ClassMap::coco_categories`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ClassMap {
    ids: BTreeMap<String, u32>,
}

impl ClassMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from an ordered label list; ids are list indices.
    ///
    /// A label listed twice keeps the id of its last occurrence.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let ids = labels
            .into_iter()
            .enumerate()
            .map(|(i, label)| (label.into(), i as u32))
            .collect();
        Self { ids }
    }

    /// Insert or replace a label's id.
    pub fn insert(&mut self, label: impl Into<String>, id: u32) {
        self.ids.insert(label.into(), id);
    }

    /// Project class id of a label.
    pub fn get(&self, label: &str) -> Option<u32> {
        self.ids.get(label).copied()
    }

    pub fn contains(&self, label: &str) -> bool {
        self.ids.contains_key(label)
    }

    pub fn len(&self) -> usize {
        self.ids.len()
    }

    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }

    /// Labels in alphabetical order.
    pub fn labels(&self) -> impl Iterator<Item = &str> {
        self.ids.keys().map(String::as_str)
    }

    /// COCO categories: 1-based ids over the labels sorted alphabetically,
    /// independent of the project's own ids.
    pub fn coco_categories(&self) -> Vec<Category> {
        self.labels()
            .enumerate()
            .map(|(i, name)| Category::new(i as u32 + 1, name))
            .collect()
    }
}

impl<S: Into<String>> FromIterator<(S, u32)> for ClassMap {
    fn from_iter<T: IntoIterator<Item = (S, u32)>>(iter: T) -> Self {
        Self {
            ids: iter.into_iter().map(|(l, id)| (l.into(), id)).collect(),
        }
    }
}
