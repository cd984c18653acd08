//! Errors for tree manipulation.

use chimera::ChimeraError;
use chimera::dom::ElementId;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum DomError {
    #[error("unknown element {0:?}")]
    UnknownElement(ElementId),

    #[error("child index {index} out of range for {len} children")]
    IndexOutOfRange { index: usize, len: usize },

    /// The child is the parent itself or one of its ancestors.
    #[error("cannot insert {child:?} into its own subtree at {parent:?}")]
    CycleInsert { parent: ElementId, child: ElementId },

    /// An ad-hoc selector query was refused.
    #[error(transparent)]
    Style(#[from] ChimeraError),
}
