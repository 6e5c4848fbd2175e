//! Store layout: the section forest, its validation and its JSON codec.

mod forest;
mod persistence;
mod section;
mod validate;

pub use forest::SectionForest;
pub use persistence::{LayoutFile, SectionRecord};
pub use section::{Section, SectionId};
