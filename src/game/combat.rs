//! Combat system - projectiles, hit detection, cooldowns

use super::geometry::{in_bounds, Direction};
use super::world::{Participant, SlotId, SLOT_COUNT};

/// Active projectile in the arena
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Projectile {
    pub owner: SlotId,
    pub x: i32,
    pub y: i32,
    pub dir_x: i32,
    pub dir_y: i32,
}

impl Projectile {
    /// Spawn a projectile on the tile ahead of (`x`, `y`) travelling in `facing`
    pub fn spawn(owner: SlotId, x: i32, y: i32, facing: Direction) -> Self {
        let (dir_x, dir_y) = facing.vector();
        Self {
            owner,
            x: x + dir_x,
            y: y + dir_y,
            dir_x,
            dir_y,
        }
    }

    /// Move one tile along the travel direction
    pub fn advance(&mut self) {
        self.x += self.dir_x;
        self.y += self.dir_y;
    }
}

/// A projectile that struck its target this tick
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub shooter: SlotId,
    pub target: SlotId,
    pub x: i32,
    pub y: i32,
    pub remaining_hp: i32,
}

/// Combat system for cooldown gating and projectile resolution
pub struct CombatSystem;

impl CombatSystem {
    /// Check if a participant may fire
    pub fn can_fire(cooldown: u32) -> bool {
        cooldown == 0
    }

    /// One tick of cooldown recovery
    pub fn update_cooldown(cooldown: u32) -> u32 {
        cooldown.saturating_sub(1)
    }

    /// Advance every projectile, drop the ones that left the arena and
    /// resolve hits against live non-owners.
    ///
    /// A projectile scores at most one hit and is consumed by it.
    pub fn resolve_projectiles(
        projectiles: &mut Vec<Projectile>,
        slots: &mut [Option<Participant>; SLOT_COUNT],
        width: i32,
        height: i32,
    ) -> Vec<Hit> {
        let mut hits = Vec::new();
        let mut survivors = Vec::with_capacity(projectiles.len());

        for mut projectile in projectiles.drain(..) {
            projectile.advance();

            if !in_bounds(projectile.x, projectile.y, width, height) {
                continue;
            }

            let mut hit = false;
            for target in slots.iter_mut().flatten() {
                if target.slot == projectile.owner
                    || !target.is_alive()
                    || (target.x, target.y) != (projectile.x, projectile.y)
                {
                    continue;
                }

                target.hp -= 1;
                hits.push(Hit {
                    shooter: projectile.owner,
                    target: target.slot,
                    x: projectile.x,
                    y: projectile.y,
                    remaining_hp: target.hp,
                });
                hit = true;
                break;
            }

            if !hit {
                survivors.push(projectile);
            }
        }

        *projectiles = survivors;
        hits
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn duelists() -> [Option<Participant>; SLOT_COUNT] {
        [
            Some(Participant::new(SlotId::FIRST, "A".to_string(), '@', (0, 5), 3)),
            Some(Participant::new(SlotId::SECOND, "B".to_string(), '&', (19, 5), 3)),
        ]
    }

    #[test]
    fn spawn_is_one_tile_ahead() {
        let p = Projectile::spawn(SlotId::FIRST, 4, 4, Direction::Up);
        assert_eq!((p.x, p.y, p.dir_x, p.dir_y), (4, 3, 0, -1));
    }

    #[test]
    fn cooldown_floors_at_zero() {
        assert_eq!(CombatSystem::update_cooldown(2), 1);
        assert_eq!(CombatSystem::update_cooldown(0), 0);
        assert!(CombatSystem::can_fire(0));
        assert!(!CombatSystem::can_fire(1));
    }

    #[test]
    fn leaving_the_arena_discards() {
        let mut slots = duelists();
        let mut projectiles = vec![
            Projectile::spawn(SlotId::FIRST, 5, 1, Direction::Up),
            Projectile::spawn(SlotId::SECOND, 18, 5, Direction::Right),
        ];
        let hits = CombatSystem::resolve_projectiles(&mut projectiles, &mut slots, 20, 10);
        assert!(hits.is_empty());
        assert!(projectiles.is_empty());
    }

    #[test]
    fn hit_consumes_projectile_and_health() {
        let mut slots = duelists();
        let mut projectiles = vec![Projectile {
            owner: SlotId::FIRST,
            x: 18,
            y: 5,
            dir_x: 1,
            dir_y: 0,
        }];

        let hits = CombatSystem::resolve_projectiles(&mut projectiles, &mut slots, 20, 10);

        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].target, SlotId::SECOND);
        assert_eq!(hits[0].remaining_hp, 2);
        assert!(projectiles.is_empty());
        assert_eq!(slots[1].as_ref().unwrap().hp, 2);
    }

    #[test]
    fn owner_is_never_hit() {
        let mut slots = duelists();
        let mut projectiles = vec![Projectile {
            owner: SlotId::FIRST,
            x: 1,
            y: 5,
            dir_x: -1,
            dir_y: 0,
        }];

        let hits = CombatSystem::resolve_projectiles(&mut projectiles, &mut slots, 20, 10);

        assert!(hits.is_empty());
        assert_eq!(projectiles.len(), 1);
        assert_eq!((projectiles[0].x, projectiles[0].y), (0, 5));
        assert_eq!(slots[0].as_ref().unwrap().hp, 3);
    }

    #[test]
    fn defeated_target_is_passed_through() {
        let mut slots = duelists();
        slots[1].as_mut().unwrap().hp = 0;
        let mut projectiles = vec![Projectile {
            owner: SlotId::FIRST,
            x: 18,
            y: 5,
            dir_x: 1,
            dir_y: 0,
        }];

        let hits = CombatSystem::resolve_projectiles(&mut projectiles, &mut slots, 20, 10);

        assert!(hits.is_empty());
        assert_eq!(projectiles.len(), 1);
        assert_eq!(slots[1].as_ref().unwrap().hp, 0);
    }
}
