//! Animation Data
//!
//! Any datablock may carry an [`AnimData`] block: an action/NLA flag plus a
//! list of property drivers. The builder turns each driver into one
//! evaluation operation; the action flag by itself produces no nodes (the
//! animation system evaluates actions wholesale, outside operation
//! granularity).

/// Animation state attached to a datablock.
#[derive(Debug, Clone, Default)]
pub struct AnimData {
    /// True when an action or NLA tracks are present.
    pub animated: bool,
    /// Property drivers hosted by this block.
    pub drivers: Vec<Driver>,
}

impl AnimData {
    /// Animation data with an action but no drivers.
    pub fn action() -> Self {
        Self {
            animated: true,
            drivers: Vec::new(),
        }
    }

    /// Animation data consisting of the given drivers.
    pub fn with_drivers(drivers: Vec<Driver>) -> Self {
        Self {
            animated: false,
            drivers,
        }
    }

    /// Whether this block has anything for the builder to represent.
    pub fn has_animation(&self) -> bool {
        self.animated || !self.drivers.is_empty()
    }
}

/// A single property driver.
#[derive(Debug, Clone)]
pub struct Driver {
    /// Human-readable driver name (usually the driven property path).
    pub name: String,
    /// True for scripted-expression drivers. These are bound to an
    /// interpreter lock at evaluation time, so their operations must be
    /// serialized against other interpreter-bound work.
    pub scripted: bool,
}

impl Driver {
    /// A plain (non-scripted) driver.
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scripted: false,
        }
    }

    /// A scripted-expression driver.
    pub fn scripted(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            scripted: true,
        }
    }
}
