//! Load-time checks for a section forest.
//!
//! Every check collects all offending sections instead of stopping at the
//! first one, so a rejected layout can be fixed in one pass.

use std::collections::{HashMap, HashSet};

use crate::error::LayoutIssue;
use crate::layout::{Section, SectionId};

fn issue(ids: Vec<SectionId>, reason: impl Into<String>) -> LayoutIssue {
    LayoutIssue {
        ids,
        reason: reason.into(),
    }
}

/// Duplicate ids, unknown parents and self-parenting.
pub(crate) fn check_references(sections: &[Section]) -> Vec<LayoutIssue> {
    let mut issues = Vec::new();
    let mut seen = HashSet::new();
    for section in sections {
        if !seen.insert(section.id) {
            issues.push(issue(vec![section.id], "duplicate section id"));
        }
    }

    for section in sections {
        match section.parent {
            Some(parent) if parent == section.id => {
                issues.push(issue(vec![section.id], "section is its own parent"));
            }
            Some(parent) if !seen.contains(&parent) => {
                issues.push(issue(
                    vec![section.id],
                    format!("unknown parent section {parent}"),
                ));
            }
            _ => {}
        }
    }
    issues
}

/// Cycles in the parent chain and chains deeper than `max_depth` levels.
///
/// Assumes `check_references` passed.
pub(crate) fn check_hierarchy(sections: &[Section], max_depth: usize) -> Vec<LayoutIssue> {
    let parents: HashMap<SectionId, Option<SectionId>> =
        sections.iter().map(|s| (s.id, s.parent)).collect();

    let mut issues = Vec::new();
    let mut reported_cycles: HashSet<SectionId> = HashSet::new();

    for section in sections {
        let mut chain = vec![section.id];
        let mut current = section.parent;
        let mut cyclic = false;

        while let Some(parent) = current {
            if chain.contains(&parent) {
                cyclic = true;
                break;
            }
            chain.push(parent);
            current = parents.get(&parent).copied().flatten();
        }

        if cyclic {
            if chain.iter().all(|id| !reported_cycles.contains(id)) {
                reported_cycles.extend(chain.iter().copied());
                issues.push(issue(chain, "parent chain forms a cycle"));
            }
        } else if chain.len() > max_depth {
            issues.push(issue(
                vec![section.id],
                format!("nesting depth {} exceeds {max_depth}", chain.len()),
            ));
        }
    }
    issues
}

/// Leaf sections sharing a parent (or all being roots) must not overlap.
pub(crate) fn check_sibling_leaves(sections: &[Section]) -> Vec<LayoutIssue> {
    let parents: HashSet<SectionId> = sections.iter().filter_map(|s| s.parent).collect();

    let mut groups: Vec<(Option<SectionId>, Vec<&Section>)> = Vec::new();
    for leaf in sections.iter().filter(|s| !parents.contains(&s.id)) {
        match groups.iter_mut().find(|(parent, _)| *parent == leaf.parent) {
            Some((_, members)) => members.push(leaf),
            None => groups.push((leaf.parent, vec![leaf])),
        }
    }

    let mut issues = Vec::new();
    for (_, leaves) in &groups {
        for (i, a) in leaves.iter().enumerate() {
            for b in &leaves[i + 1..] {
                if a.polygon.overlaps(&b.polygon) {
                    issues.push(issue(vec![a.id, b.id], "sibling leaf sections overlap"));
                }
            }
        }
    }
    issues
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::geometry::Polygon;

    fn rect(id: u32, x1: f64, y1: f64, x2: f64, y2: f64) -> Section {
        Section::new(id, format!("s{id}"), Polygon::rectangle(x1, y1, x2, y2))
    }

    #[test]
    fn test_reference_issues() {
        let sections = vec![
            rect(1, 0.0, 0.0, 10.0, 10.0),
            rect(1, 0.0, 0.0, 5.0, 5.0),
            rect(2, 0.0, 0.0, 5.0, 5.0).with_parent(9),
            rect(3, 0.0, 0.0, 5.0, 5.0).with_parent(3),
        ];
        let issues = check_references(&sections);
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn test_cycle_reported_once() {
        let sections = vec![
            rect(1, 0.0, 0.0, 10.0, 10.0).with_parent(2),
            rect(2, 0.0, 0.0, 10.0, 10.0).with_parent(1),
        ];
        let issues = check_hierarchy(&sections, 4);
        assert_eq!(issues.len(), 1);
        assert!(issues[0].ids.contains(&SectionId(1)));
        assert!(issues[0].ids.contains(&SectionId(2)));
    }

    #[test]
    fn test_depth_bound() {
        let sections = vec![
            rect(1, 0.0, 0.0, 10.0, 10.0),
            rect(2, 0.0, 0.0, 9.0, 9.0).with_parent(1),
            rect(3, 0.0, 0.0, 8.0, 8.0).with_parent(2),
        ];
        assert!(check_hierarchy(&sections, 3).is_empty());
        let issues = check_hierarchy(&sections, 2);
        assert_eq!(issues.len(), 1);
        assert_eq!(issues[0].ids, vec![SectionId(3)]);
    }

    #[test]
    fn test_overlap_only_between_sibling_leaves() {
        let sections = vec![
            rect(1, 0.0, 0.0, 20.0, 20.0),
            // children of 1 sharing an edge
            rect(2, 0.0, 0.0, 10.0, 20.0).with_parent(1),
            rect(3, 10.0, 0.0, 20.0, 20.0).with_parent(1),
            // root leaf overlapping root 1 is fine: 1 is not a leaf
            rect(4, 15.0, 15.0, 30.0, 30.0),
        ];
        assert!(check_sibling_leaves(&sections).is_empty());

        let mut overlapping = sections.clone();
        overlapping.push(rect(5, 5.0, 5.0, 12.0, 12.0).with_parent(1));
        let issues = check_sibling_leaves(&overlapping);
        assert_eq!(issues.len(), 2);
    }
}
