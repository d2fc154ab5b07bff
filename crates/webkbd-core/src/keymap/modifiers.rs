//! Modifier bitmap as carried in byte 0 of a boot-protocol keyboard report.

use serde::{Deserialize, Serialize};

/// Active modifier keys, one bit per key, in HID report order.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModifierFlags(pub u8);

impl ModifierFlags {
    pub const LEFT_CTRL: u8 = 1 << 0;
    pub const LEFT_SHIFT: u8 = 1 << 1;
    pub const LEFT_ALT: u8 = 1 << 2;
    pub const LEFT_META: u8 = 1 << 3;
    pub const RIGHT_CTRL: u8 = 1 << 4;
    pub const RIGHT_SHIFT: u8 = 1 << 5;
    pub const RIGHT_ALT: u8 = 1 << 6;
    pub const RIGHT_META: u8 = 1 << 7;

    /// No modifiers held.
    pub const NONE: ModifierFlags = ModifierFlags(0);

    /// Left Shift only; used for upper-case letters and shifted symbols.
    pub const SHIFT: ModifierFlags = ModifierFlags(Self::LEFT_SHIFT);

    /// Returns `true` if either Ctrl modifier is active.
    pub fn ctrl(&self) -> bool {
        self.0 & (Self::LEFT_CTRL | Self::RIGHT_CTRL) != 0
    }

    /// Returns `true` if either Shift modifier is active.
    pub fn shift(&self) -> bool {
        self.0 & (Self::LEFT_SHIFT | Self::RIGHT_SHIFT) != 0
    }

    /// Returns `true` if either Alt modifier is active.
    pub fn alt(&self) -> bool {
        self.0 & (Self::LEFT_ALT | Self::RIGHT_ALT) != 0
    }

    /// Returns `true` if either Meta (Win/Cmd/Super) modifier is active.
    pub fn meta(&self) -> bool {
        self.0 & (Self::LEFT_META | Self::RIGHT_META) != 0
    }

    /// Returns `true` when no modifier bit is set.
    pub fn is_empty(&self) -> bool {
        self.0 == 0
    }

    /// Returns the union of `self` and `other`.
    pub fn with(self, other: ModifierFlags) -> ModifierFlags {
        ModifierFlags(self.0 | other.0)
    }
}
