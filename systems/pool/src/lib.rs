#![deny(
    unsafe_code,
    missing_docs,
    dead_code,
    unused_results,
    non_snake_case,
    unreachable_pub
)]

//! Object pooling for tile contents, enemies, and projectiles.
//!
//! A [`Factory`] hands out instances keyed by type and variation and takes
//! them back once they die, so steady-state play never allocates. Live
//! instances sit in a [`Roster`], a dense list whose members always know their
//! own position so removal is a constant-time swap with the tail.

mod factory;
mod roster;

pub use factory::{Factory, Origin, Recyclable};
pub use roster::{Indexed, Roster};
