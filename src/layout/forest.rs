//! Validated forest of store sections and hierarchical point lookup.

use std::collections::HashMap;

use crate::error::{Result, TrackingError};
use crate::geometry::{Polygon, Vertex};
use crate::layout::validate;
use crate::layout::{Section, SectionId};

/// A validated set of section trees.
///
/// Parent links are stored on each `Section`; the children index is derived
/// once at construction. Sections keep their load order, which also decides
/// which sibling wins when a point lies on a shared edge.
#[derive(Debug, Clone, Default)]
pub struct SectionForest {
    sections: Vec<Section>,
    index: HashMap<SectionId, usize>,
    children: Vec<Vec<usize>>,
    roots: Vec<usize>,
}

impl SectionForest {
    /// Validates and indexes `sections`.
    ///
    /// Rejects the whole layout with `InvalidLayout` on duplicate ids, unknown
    /// parents, cycles, chains deeper than `max_depth`, or overlapping sibling
    /// leaves.
    pub fn new(sections: Vec<Section>, max_depth: usize) -> Result<Self> {
        let issues = validate::check_references(&sections);
        if !issues.is_empty() {
            return Err(TrackingError::invalid_layout(issues));
        }
        let issues = validate::check_hierarchy(&sections, max_depth);
        if !issues.is_empty() {
            return Err(TrackingError::invalid_layout(issues));
        }
        let issues = validate::check_sibling_leaves(&sections);
        if !issues.is_empty() {
            return Err(TrackingError::invalid_layout(issues));
        }

        let index: HashMap<SectionId, usize> = sections
            .iter()
            .enumerate()
            .map(|(i, s)| (s.id, i))
            .collect();

        let mut children = vec![Vec::new(); sections.len()];
        let mut roots = Vec::new();
        for (i, section) in sections.iter().enumerate() {
            match section.parent.and_then(|p| index.get(&p)) {
                Some(&parent) => children[parent].push(i),
                None => roots.push(i),
            }
        }

        Ok(Self {
            sections,
            index,
            children,
            roots,
        })
    }

    /// Section ids containing `point`, innermost first, outermost root last.
    ///
    /// Each level is only searched below a parent that contains the point.
    /// Empty when no root contains it.
    pub fn locate(&self, point: Vertex) -> Vec<SectionId> {
        let mut chain = Vec::new();
        let mut level = &self.roots;
        while let Some(&idx) = level
            .iter()
            .find(|&&i| self.sections[i].polygon.contains(point))
        {
            chain.push(self.sections[idx].id);
            level = &self.children[idx];
        }
        chain.reverse();
        chain
    }

    pub fn get(&self, id: SectionId) -> Option<&Section> {
        self.index.get(&id).map(|&i| &self.sections[i])
    }

    pub fn name(&self, id: SectionId) -> Option<&str> {
        self.get(id).map(|s| s.name.as_str())
    }

    /// Sections in load order.
    pub fn sections(&self) -> &[Section] {
        &self.sections
    }

    pub fn roots(&self) -> impl Iterator<Item = &Section> + '_ {
        self.roots.iter().map(|&i| &self.sections[i])
    }

    pub fn children(&self, id: SectionId) -> impl Iterator<Item = &Section> + '_ {
        self.index
            .get(&id)
            .into_iter()
            .flat_map(|&i| self.children[i].iter().map(|&c| &self.sections[c]))
    }

    pub fn is_leaf(&self, id: SectionId) -> bool {
        self.index
            .get(&id)
            .is_some_and(|&i| self.children[i].is_empty())
    }

    pub fn len(&self) -> usize {
        self.sections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.sections.is_empty()
    }

    /// Single-level store layout split over a `width` x `height` frame.
    pub fn default_store(width: u32, height: u32) -> Self {
        let (w, h) = (width as f64, height as f64);
        let sections = vec![
            Section::new(1, "Entrance", Polygon::rectangle(0.0, 0.0, w / 4.0, h / 8.0)),
            Section::new(2, "Electronics", Polygon::rectangle(w / 4.0, 0.0, w / 2.0, h / 3.0)),
            Section::new(3, "Groceries", Polygon::rectangle(0.0, h / 3.0, w / 2.0, h * 2.0 / 3.0)),
            Section::new(4, "Clothing", Polygon::rectangle(w / 2.0, 0.0, w * 3.0 / 4.0, h / 2.0)),
            Section::new(5, "Pharmacy", Polygon::rectangle(w * 3.0 / 4.0, 0.0, w, h / 4.0)),
            Section::new(
                6,
                "Home & Garden",
                Polygon::rectangle(w / 2.0, h / 2.0, w, h * 3.0 / 4.0),
            ),
            Section::new(7, "Checkout", Polygon::rectangle(0.0, h * 2.0 / 3.0, w / 2.0, h)),
            Section::new(8, "Exit", Polygon::rectangle(w / 2.0, h * 3.0 / 4.0, w, h)),
        ];

        let index = sections.iter().enumerate().map(|(i, s)| (s.id, i)).collect();
        Self {
            children: vec![Vec::new(); sections.len()],
            roots: (0..sections.len()).collect(),
            sections,
            index,
        }
    }
}
