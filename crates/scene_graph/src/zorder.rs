//! Stacking order within a group.
//!
//! Children are stored back to front, so raising moves an item towards the
//! end of its parent's list.

use crate::canvas::ItemBody;
use crate::{Canvas, ItemId, SceneError};

/// Moves `list[index]` to just after `list[after]`, or to the front when
/// `after` is `None`. `after` indexes the list before the move.
///
/// Returns whether the order changed.
fn put_item_after<T>(list: &mut Vec<T>, index: usize, after: Option<usize>) -> bool {
    if after == Some(index) {
        return false;
    }
    let target = match after {
        None => 0,
        Some(after) if after < index => after + 1,
        Some(after) => after,
    };
    if target == index {
        return false;
    }
    let item = list.remove(index);
    list.insert(target, item);
    true
}

impl Canvas {
    /// The parent of `id` and `id`'s position among its siblings.
    fn sibling_position(&self, id: ItemId) -> Result<Option<(ItemId, usize)>, SceneError> {
        let Some(parent) = self.node(id)?.parent else {
            return Ok(None);
        };
        let index = self
            .node(parent)?
            .group()
            .and_then(|group| group.children.iter().position(|&child| child == id))
            .ok_or(SceneError::StaleItem(id))?;
        Ok(Some((parent, index)))
    }

    fn restack(
        &mut self,
        id: ItemId,
        after: impl FnOnce(usize, usize) -> Option<usize>,
    ) -> Result<bool, SceneError> {
        let Some((parent, index)) = self.sibling_position(id)? else {
            return Ok(false);
        };
        let ItemBody::Group(group) = &mut self.node_mut(parent)?.body else {
            return Err(SceneError::NotAGroup(parent));
        };
        let len = group.children.len();
        let changed = put_item_after(&mut group.children, index, after(index, len));
        if changed {
            self.redraw_and_repick_if_mapped(id);
        }
        Ok(changed)
    }

    /// Raises the item `positions` steps, stopping at the top.
    pub fn raise(&mut self, id: ItemId, positions: usize) -> Result<bool, SceneError> {
        if positions == 0 {
            self.node(id)?;
            return Ok(false);
        }
        self.restack(id, |index, len| Some(index.saturating_add(positions).min(len - 1)))
    }

    /// Lowers the item `positions` steps, stopping at the bottom.
    pub fn lower(&mut self, id: ItemId, positions: usize) -> Result<bool, SceneError> {
        if positions == 0 {
            self.node(id)?;
            return Ok(false);
        }
        self.restack(id, |index, _| {
            index.checked_sub(1).and_then(|below| below.checked_sub(positions))
        })
    }

    pub fn raise_to_top(&mut self, id: ItemId) -> Result<bool, SceneError> {
        self.restack(id, |_, len| Some(len - 1))
    }

    pub fn lower_to_bottom(&mut self, id: ItemId) -> Result<bool, SceneError> {
        self.restack(id, |_, _| None)
    }

    /// Restacks `id` directly below `behind`, or at the top when `behind` is
    /// `None`. Both items must share a parent.
    pub fn send_behind(&mut self, id: ItemId, behind: Option<ItemId>) -> Result<bool, SceneError> {
        let Some(behind) = behind else {
            return self.raise_to_top(id);
        };
        if id == behind {
            return Err(SceneError::SameItem(id));
        }

        let item_pos = self.sibling_position(id)?;
        let behind_pos = self.sibling_position(behind)?;
        let (Some((parent, index)), Some((behind_parent, behind_index))) = (item_pos, behind_pos)
        else {
            return Err(SceneError::NotSiblings(id, behind));
        };
        if parent != behind_parent {
            return Err(SceneError::NotSiblings(id, behind));
        }

        if index + 1 == behind_index {
            return Ok(false);
        }
        if index < behind_index {
            self.raise(id, behind_index - 1 - index)
        } else {
            self.lower(id, index - behind_index)
        }
    }
}
