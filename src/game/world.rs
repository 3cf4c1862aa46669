//! Authoritative world state - participants, projectiles and the per-tick step

use std::fmt;

use serde::Serialize;

use super::combat::{CombatSystem, Hit, Projectile};
use super::geometry::{in_bounds, step_clamped, Direction};
use super::{DuelError, Intent};

/// Number of participant slots in a duel
pub const SLOT_COUNT: usize = 2;

/// Longest display name a client may pick
pub const MAX_NAME_LEN: usize = 16;

const GLYPHS: [char; SLOT_COUNT] = ['@', '&'];

/// Duel rules fixed for the lifetime of a match
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DuelRules {
    pub arena_width: i32,
    pub arena_height: i32,
    /// Starting health
    pub max_hp: i32,
    /// Ticks between two shots of the same participant
    pub shot_cooldown: u32,
}

impl Default for DuelRules {
    fn default() -> Self {
        Self {
            arena_width: 20,
            arena_height: 10,
            max_hp: 3,
            shot_cooldown: 20,
        }
    }
}

/// One of the two fixed participant positions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SlotId(usize);

impl SlotId {
    pub const FIRST: SlotId = SlotId(0);
    pub const SECOND: SlotId = SlotId(1);

    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for SlotId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0 + 1)
    }
}

/// Match phase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchPhase {
    /// Fewer than two participants registered
    Waiting,
    /// Both slots filled, nobody defeated yet
    Running,
    /// Terminal message latched
    Finished,
}

/// Participant state (authoritative)
#[derive(Debug, Clone)]
pub struct Participant {
    pub slot: SlotId,
    pub name: String,
    pub glyph: char,
    pub x: i32,
    pub y: i32,
    pub hp: i32,
    pub facing: Direction,
    pub cooldown: u32,
}

impl Participant {
    pub fn new(slot: SlotId, name: String, glyph: char, (x, y): (i32, i32), hp: i32) -> Self {
        Self {
            slot,
            name,
            glyph,
            x,
            y,
            hp,
            facing: Direction::default(),
            cooldown: 0,
        }
    }

    pub fn is_alive(&self) -> bool {
        self.hp > 0
    }
}

/// What an intent did to the world
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IntentOutcome {
    /// Position and facing updated; `blocked` when a wall stopped the step
    Moved { blocked: bool },
    /// Projectile created, cooldown reset
    Fired,
    /// Cooldown reset but the tile ahead is outside the arena
    FiredIntoWall,
    /// Attack dropped because the cooldown is still running
    CoolingDown { remaining: u32 },
}

/// Result of a single simulation tick
#[derive(Debug, Clone, Default)]
pub struct TickReport {
    pub tick: u64,
    pub hits: Vec<Hit>,
    /// Set on the tick the terminal message was latched
    pub finished: Option<String>,
}

/// The arena and everything in it
pub struct World {
    pub(super) rules: DuelRules,
    pub(super) slots: [Option<Participant>; SLOT_COUNT],
    pub(super) projectiles: Vec<Projectile>,
    pub(super) message: Option<String>,
    pub(super) tick: u64,
}

impl World {
    pub fn new(rules: DuelRules) -> Self {
        Self {
            rules,
            slots: [None, None],
            projectiles: Vec::new(),
            message: None,
            tick: 0,
        }
    }

    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn participant(&self, slot: SlotId) -> Option<&Participant> {
        self.slots[slot.index()].as_ref()
    }

    pub fn projectiles(&self) -> &[Projectile] {
        &self.projectiles
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn registered(&self) -> usize {
        self.slots.iter().flatten().count()
    }

    /// Both slots filled
    pub fn is_ready(&self) -> bool {
        self.registered() == SLOT_COUNT
    }

    pub fn phase(&self) -> MatchPhase {
        if self.message.is_some() {
            MatchPhase::Finished
        } else if self.is_ready() {
            MatchPhase::Running
        } else {
            MatchPhase::Waiting
        }
    }

    /// Place a new participant in the first free slot
    pub fn register(&mut self, name: Option<&str>) -> Result<SlotId, DuelError> {
        let index = self
            .slots
            .iter()
            .position(Option::is_none)
            .ok_or(DuelError::MatchFull)?;
        let slot = SlotId(index);

        let name = name
            .map(str::trim)
            .filter(|n| !n.is_empty())
            .map(|n| n.chars().take(MAX_NAME_LEN).collect())
            .unwrap_or_else(|| format!("Player{}", slot));

        let spawn = (
            index as i32 * (self.rules.arena_width - 1),
            self.rules.arena_height / 2,
        );

        self.slots[index] = Some(Participant::new(
            slot,
            name,
            GLYPHS[index],
            spawn,
            self.rules.max_hp,
        ));

        Ok(slot)
    }

    /// Apply a decoded intent for `slot`
    pub fn apply_intent(&mut self, slot: SlotId, intent: Intent) -> Result<IntentOutcome, DuelError> {
        let (width, height) = (self.rules.arena_width, self.rules.arena_height);
        let shot_cooldown = self.rules.shot_cooldown;
        let participant = self.slots[slot.index()]
            .as_mut()
            .ok_or(DuelError::VacantSlot(slot))?;

        let outcome = match intent {
            Intent::Move(dir) => {
                let ((x, y), blocked) = step_clamped(participant.x, participant.y, dir, width, height);
                participant.x = x;
                participant.y = y;
                participant.facing = dir;
                IntentOutcome::Moved { blocked }
            }
            Intent::Attack => {
                if !CombatSystem::can_fire(participant.cooldown) {
                    return Ok(IntentOutcome::CoolingDown {
                        remaining: participant.cooldown,
                    });
                }

                participant.cooldown = shot_cooldown;
                let projectile =
                    Projectile::spawn(slot, participant.x, participant.y, participant.facing);

                if in_bounds(projectile.x, projectile.y, width, height) {
                    self.projectiles.push(projectile);
                    IntentOutcome::Fired
                } else {
                    IntentOutcome::FiredIntoWall
                }
            }
        };

        Ok(outcome)
    }

    /// Run one authoritative simulation step
    pub fn tick(&mut self) -> TickReport {
        self.tick += 1;

        let hits = CombatSystem::resolve_projectiles(
            &mut self.projectiles,
            &mut self.slots,
            self.rules.arena_width,
            self.rules.arena_height,
        );

        for participant in self.slots.iter_mut().flatten() {
            participant.cooldown = CombatSystem::update_cooldown(participant.cooldown);
        }

        let finished = if self.message.is_none() {
            self.message = self.terminal_message();
            self.message.clone()
        } else {
            None
        };

        TickReport {
            tick: self.tick,
            hits,
            finished,
        }
    }

    fn terminal_message(&self) -> Option<String> {
        let [Some(first), Some(second)] = &self.slots else {
            return None;
        };

        // Slot one is checked first, so a double knockout goes to slot two
        if !first.is_alive() {
            Some(format!("{} wins!", second.name))
        } else if !second.is_alive() {
            Some(format!("{} wins!", first.name))
        } else {
            None
        }
    }
}
