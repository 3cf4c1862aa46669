//! Snapshot building

use crate::ws::protocol::{PlayerSnapshot, ProjectileSnapshot, Snapshot};

use super::world::World;

impl World {
    /// Read-only projection of the arena for clients.
    ///
    /// Always a full state; clients never receive deltas.
    pub fn snapshot(&self) -> Snapshot {
        let players = self
            .slots
            .iter()
            .flatten()
            .map(|p| PlayerSnapshot {
                name: p.name.clone(),
                hp: p.hp,
                x: p.x,
                y: p.y,
                glyph: p.glyph,
            })
            .collect();

        let projectiles = self
            .projectiles
            .iter()
            .map(|p| ProjectileSnapshot {
                x: p.x,
                y: p.y,
                dir_x: p.dir_x,
                dir_y: p.dir_y,
                owner: self
                    .participant(p.owner)
                    .map(|o| o.name.clone())
                    .unwrap_or_default(),
            })
            .collect();

        Snapshot {
            arena_width: self.rules.arena_width,
            arena_height: self.rules.arena_height,
            players,
            projectiles,
            message: self.message.clone().unwrap_or_default(),
        }
    }
}
