//! Attachment references. Only an id and a display name are kept; file
//! contents are handled elsewhere.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Attachment {
    pub id: u32,
    pub name: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Attachments {
    items: Vec<Attachment>,
}

impl Attachments {
    /// Register a file by name and return its id (current max + 1, or 1).
    pub fn add(&mut self, name: impl Into<String>) -> u32 {
        let id = self.items.iter().map(|a| a.id).max().map_or(1, |max| max + 1);
        self.items.push(Attachment {
            id,
            name: name.into(),
        });
        id
    }

    pub fn remove(&mut self, id: u32) -> bool {
        let before = self.items.len();
        self.items.retain(|a| a.id != id);
        self.items.len() != before
    }

    pub fn ids(&self) -> Vec<u32> {
        self.items.iter().map(|a| a.id).collect()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attachment> {
        self.items.iter()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn clear(&mut self) {
        self.items.clear();
    }
}
