//! Duel simulation modules

pub mod combat;
pub mod geometry;
pub mod input;
pub mod r#match;
pub mod snapshot;
pub mod world;

pub use geometry::Direction;
pub use r#match::Duel;
pub use world::{DuelRules, MatchPhase, SlotId};

/// A validated request from a participant
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Move(Direction),
    Attack,
}

/// Errors surfaced by the duel core
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DuelError {
    #[error("Both participant slots are taken")]
    MatchFull,

    #[error("Slot {0} has no participant")]
    VacantSlot(SlotId),
}
