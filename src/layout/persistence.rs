//! JSON form of a store layout.
//!
//! ```json
//! { "sections": [ { "id": 1, "name": "Electronics", "parent_id": null,
//!                   "polygon": [[0.0, 0.0], [10.0, 0.0], [10.0, 10.0]] } ] }
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{LayoutIssue, Result, TrackingError};
use crate::geometry::{Polygon, Vertex};
use crate::layout::{Section, SectionForest, SectionId};

/// One section as stored on disk.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SectionRecord {
    pub id: SectionId,
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<SectionId>,
    pub polygon: Vec<[f64; 2]>,
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct LayoutFile {
    pub sections: Vec<SectionRecord>,
}

impl From<&Section> for SectionRecord {
    fn from(section: &Section) -> Self {
        Self {
            id: section.id,
            name: section.name.clone(),
            parent_id: section.parent,
            polygon: section
                .polygon
                .vertices()
                .iter()
                .map(|v| [v.x, v.y])
                .collect(),
        }
    }
}

impl SectionForest {
    /// Builds a forest from stored records; nothing is installed unless every record is valid.
    pub fn from_records(records: Vec<SectionRecord>, max_depth: usize) -> Result<Self> {
        let mut sections = Vec::with_capacity(records.len());
        let mut issues = Vec::new();

        for record in records {
            let vertices = record.polygon.into_iter().map(Vertex::from).collect();
            match Polygon::new(vertices) {
                Some(polygon) => sections.push(Section {
                    id: record.id,
                    name: record.name,
                    polygon,
                    parent: record.parent_id,
                }),
                None => issues.push(LayoutIssue {
                    ids: vec![record.id],
                    reason: "polygon needs at least 3 finite vertices".into(),
                }),
            }
        }

        if !issues.is_empty() {
            return Err(TrackingError::invalid_layout(issues));
        }
        Self::new(sections, max_depth)
    }

    pub fn to_records(&self) -> Vec<SectionRecord> {
        self.sections().iter().map(SectionRecord::from).collect()
    }

    pub fn from_json(json: &str, max_depth: usize) -> Result<Self> {
        let file: LayoutFile = serde_json::from_str(json)?;
        Self::from_records(file.sections, max_depth)
    }

    pub fn to_json(&self) -> Result<String> {
        let file = LayoutFile {
            sections: self.to_records(),
        };
        Ok(serde_json::to_string_pretty(&file)?)
    }

    pub fn load<P: AsRef<Path>>(path: P, max_depth: usize) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_json(&contents, max_depth)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_json()?)?;
        Ok(())
    }
}
