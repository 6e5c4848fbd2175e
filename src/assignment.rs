//! Maps positions to the sections that contain them.
//!
//! Stateless: border flicker is absorbed later by the visit analyzer.

use std::collections::BTreeMap;

use crate::geometry::Vertex;
use crate::layout::{SectionForest, SectionId};
use crate::tracker::TargetId;

/// Innermost section containing `point`.
pub fn assign(point: Vertex, forest: &SectionForest) -> Option<SectionId> {
    forest.locate(point).first().copied()
}

/// Every section containing `point`, innermost first.
pub fn assign_chain(point: Vertex, forest: &SectionForest) -> Vec<SectionId> {
    forest.locate(point)
}

/// Section chains for one frame's worth of target positions.
pub fn assign_frame<'a, I>(positions: I, forest: &SectionForest) -> BTreeMap<TargetId, Vec<SectionId>>
where
    I: IntoIterator<Item = (TargetId, &'a Vertex)>,
{
    positions
        .into_iter()
        .map(|(id, point)| (id, assign_chain(*point, forest)))
        .collect()
}
