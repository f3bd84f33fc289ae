use std::fmt;
use std::ops::{BitAnd, BitOr};

use cmisfs_config::CapabilityToggles;

/// Capability set of a storage driver.
///
/// The driver natively supports all three capabilities; host configuration
/// can only narrow the set, never extend it.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct Capabilities(u8);

impl Capabilities {
    pub const NONE: Capabilities = Capabilities(0);
    /// Folder trees can be listed.
    pub const BROWSABLE: Capabilities = Capabilities(1);
    /// Objects can be created, changed and deleted.
    pub const WRITABLE: Capabilities = Capabilities(2);
    /// Files may be handed out to anonymous visitors.
    pub const PUBLIC: Capabilities = Capabilities(4);
    pub const ALL: Capabilities = Capabilities(1 | 2 | 4);

    pub fn contains(self, other: Capabilities) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_browsable(self) -> bool {
        self.contains(Capabilities::BROWSABLE)
    }

    pub fn is_writable(self) -> bool {
        self.contains(Capabilities::WRITABLE)
    }

    pub fn is_public(self) -> bool {
        self.contains(Capabilities::PUBLIC)
    }

    /// The capability set a host configuration grants.
    pub fn from_toggles(toggles: &CapabilityToggles) -> Self {
        let mut capabilities = Capabilities::NONE;
        if toggles.browsable {
            capabilities = capabilities | Capabilities::BROWSABLE;
        }
        if toggles.writable {
            capabilities = capabilities | Capabilities::WRITABLE;
        }
        if toggles.public {
            capabilities = capabilities | Capabilities::PUBLIC;
        }
        capabilities
    }
}

impl BitAnd for Capabilities {
    type Output = Capabilities;

    fn bitand(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 & rhs.0)
    }
}

impl BitOr for Capabilities {
    type Output = Capabilities;

    fn bitor(self, rhs: Capabilities) -> Capabilities {
        Capabilities(self.0 | rhs.0)
    }
}

impl fmt::Debug for Capabilities {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut set = f.debug_set();
        if self.is_browsable() {
            set.entry(&"browsable");
        }
        if self.is_writable() {
            set.entry(&"writable");
        }
        if self.is_public() {
            set.entry(&"public");
        }
        set.finish()
    }
}
