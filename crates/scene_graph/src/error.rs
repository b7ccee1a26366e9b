use crate::{GrabStatus, ItemId};
use thiserror::Error;

/// Structural misuse of the item tree.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum SceneError {
    #[error("item {0} no longer exists")]
    StaleItem(ItemId),

    #[error("item {0} is not a group")]
    NotAGroup(ItemId),

    #[error("cannot move item {item} into group {group}: the group is inside the item")]
    WouldCycle { item: ItemId, group: ItemId },

    #[error("items {0} and {1} do not share a parent")]
    NotSiblings(ItemId, ItemId),

    #[error("item {0} cannot be stacked relative to itself")]
    SameItem(ItemId),

    #[error("the root item cannot be {0}")]
    RootItem(&'static str),

    #[error("item {0} is not of the requested kind")]
    KindMismatch(ItemId),

    #[error("pixels per unit must be positive, got {0}")]
    InvalidZoom(f64),
}

/// Why a pointer grab was not taken.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum GrabError {
    #[error("another item already holds the pointer grab")]
    AlreadyGrabbed,

    #[error("the item or the canvas is not viewable")]
    NotViewable,

    #[error("the host refused the pointer grab: {0}")]
    Refused(GrabStatus),
}
