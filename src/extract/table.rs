use std::collections::HashMap;

use crate::model::{Dependency, DependencyKey};

/// Dependency rows in first-seen order, unique by
/// `(name, current_version, new_version)`.
#[derive(Debug, Default, Clone)]
pub struct DependencyTable {
    rows: Vec<Dependency>,
    index: HashMap<DependencyKey, usize>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Upsert {
    Inserted,
    Merged,
}

impl DependencyTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a new row, or merges into the row with the same key.
    pub fn upsert(&mut self, dependency: Dependency) -> Upsert {
        let key = dependency.key();
        match self.index.get(&key) {
            Some(&i) => {
                self.rows[i].merge(dependency);
                Upsert::Merged
            }
            None => {
                self.index.insert(key, self.rows.len());
                self.rows.push(dependency);
                Upsert::Inserted
            }
        }
    }

    pub fn extend<I: IntoIterator<Item = Dependency>>(&mut self, dependencies: I) {
        for dependency in dependencies {
            self.upsert(dependency);
        }
    }

    pub fn rows(&self) -> &[Dependency] {
        &self.rows
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    pub fn clear(&mut self) {
        self.rows.clear();
        self.index.clear();
    }
}
