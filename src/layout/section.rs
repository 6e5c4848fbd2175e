use serde::{Deserialize, Serialize};

use crate::geometry::Polygon;

/// Identifier of a store section, unique within one layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SectionId(pub u32);

impl std::fmt::Display for SectionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "S{}", self.0)
    }
}

/// A named polygonal region, optionally nested under a parent section.
#[derive(Debug, Clone, PartialEq)]
pub struct Section {
    pub id: SectionId,
    pub name: String,
    pub polygon: Polygon,
    pub parent: Option<SectionId>,
}

impl Section {
    pub fn new(id: u32, name: impl Into<String>, polygon: Polygon) -> Self {
        Self {
            id: SectionId(id),
            name: name.into(),
            polygon,
            parent: None,
        }
    }

    pub fn with_parent(mut self, parent: u32) -> Self {
        self.parent = Some(SectionId(parent));
        self
    }
}
