//! Hash collections used by render targets.
//!
//! `hashbrown` backs the maps unless the `std-hash` feature selects the
//! standard library ones.

use crate::element::Listener;

#[cfg(feature = "std-hash")]
pub mod map {
    pub use std::collections::{HashMap, HashSet};
}

#[cfg(not(feature = "std-hash"))]
pub mod map {
    pub use hashbrown::{HashMap, HashSet};
}

/// Event listeners registered on one node, keyed by event name.
pub type ListenerMap = map::HashMap<String, Listener>;
