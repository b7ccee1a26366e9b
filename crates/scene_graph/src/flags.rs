use bitflags::bitflags;

bitflags! {
    /// Per-item status flags.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct ItemFlags: u8 {
        /// Resources for drawing are allocated.
        const REALIZED         = 0b0000_0001;
        /// The item takes part in drawing and picking.
        const MAPPED           = 0b0000_0010;
        /// The item should be mapped whenever its parent is.
        const VISIBLE          = 0b0000_0100;
        /// The item or a descendant asked for an update.
        const NEED_UPDATE      = 0b0000_1000;
        /// The item's position in world space changed; its whole subtree must update.
        const NEED_DEEP_UPDATE = 0b0001_0000;
    }
}

impl Default for ItemFlags {
    fn default() -> Self {
        ItemFlags::VISIBLE
    }
}

bitflags! {
    /// Flags passed down the tree during an update pass.
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct UpdateFlags: u8 {
        /// This item asked for the update.
        const REQUESTED = 0b01;
        /// An ancestor moved; recompute even without a request.
        const DEEP      = 0b10;
    }
}
