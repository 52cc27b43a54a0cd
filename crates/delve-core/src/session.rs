//! Session state and the turn resolver.
//!
//! One turn = the player's action, then every monster planning a step from
//! the same positional snapshot, then those steps resolving in spawn order
//! against a reservation set. The session owns the RNG handle; seeding it
//! makes an entire run replayable.
//!
//! Monster resolution order is part of the observable contract: earlier
//! spawns win contested cells. A slain monster is despawned and its handle
//! removed on the spot, so planning and rendering never see dead entries.

use std::collections::HashSet;

use hecs::{Entity, World};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::Serialize;

use delve_logic::combat::{self, MeleeOutcome};
use delve_logic::difficulty::Difficulty;
use delve_logic::grid::{Direction, Grid, Point};
use delve_logic::pathfinding::next_step;

use crate::components::{Monster, Position, Potion};
use crate::generation::{generate_dungeon, random_floor_cell, Dungeon, DungeonConfig};

/// Rejection-sampling budget per placed entity. Exhaustion accepts a lower
/// count instead of spinning on a crowded map.
const MAX_PLACEMENT_ATTEMPTS: u32 = 200;

/// The player-controlled adventurer.
#[derive(Debug, Clone, Copy, Serialize)]
pub struct Player {
    pub pos: Point,
    pub hp: i32,
    pub max_hp: i32,
    pub attack: i32,
    pub score: u32,
    pub turns: u32,
}

impl Player {
    fn spawn_at(pos: Point) -> Self {
        Self {
            pos,
            hp: combat::PLAYER_MAX_HP,
            max_hp: combat::PLAYER_MAX_HP,
            attack: combat::PLAYER_ATTACK,
            score: 0,
            turns: 0,
        }
    }
}

/// One noteworthy thing that happened during a turn, in order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum TurnEvent {
    /// The player walked into rock and lost the turn.
    BumpedWall,
    /// The player wounded a monster; it survived with `remaining_hp`.
    HitMonster { damage: i32, remaining_hp: i32 },
    /// The player killed a monster and claimed its cell.
    SlewMonster { score_awarded: u32 },
    /// The player drank a potion. `healed` is the gain after the max-HP cap.
    DrankPotion { roll: i32, healed: i32 },
    /// A monster hit the player.
    TookHit { damage: i32 },
}

/// Result of handing a movement intent to the resolver.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum TurnOutcome {
    /// Destination outside the map. Nothing advanced, no turn consumed.
    OutOfBounds,
    /// The turn ran to completion; events in occurrence order.
    Advanced(Vec<TurnEvent>),
}

/// The mutable aggregate for one run: map, entity store, player, RNG.
pub struct Session {
    pub grid: Grid,
    pub world: World,
    monsters: Vec<Entity>,
    potions: Vec<Entity>,
    pub player: Player,
    pub difficulty: Difficulty,
    pub high_score: u32,
    rng: StdRng,
}

impl Session {
    /// Generate a dungeon, place the player, and populate monsters and
    /// potions per the difficulty tier. Fully determined by `seed`.
    pub fn new(difficulty: Difficulty, seed: u64, high_score: u32) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        let dungeon = generate_dungeon(&DungeonConfig::default(), &mut rng);
        let mut session = Self::from_parts(dungeon, difficulty, rng, high_score);
        session.populate();
        session
    }

    /// Build a session over a prepared map with no monsters or potions.
    /// Scenario tests and the harness script the board from here.
    pub fn with_dungeon(
        dungeon: Dungeon,
        difficulty: Difficulty,
        seed: u64,
        high_score: u32,
    ) -> Self {
        Self::from_parts(dungeon, difficulty, StdRng::seed_from_u64(seed), high_score)
    }

    fn from_parts(
        dungeon: Dungeon,
        difficulty: Difficulty,
        mut rng: StdRng,
        high_score: u32,
    ) -> Self {
        // First room's center, or any floor cell on a roomless map.
        let spawn = match dungeon.rooms.first() {
            Some(first) => first.center(),
            None => random_floor_cell(&dungeon.grid, &mut rng).unwrap_or(Point::new(1, 1)),
        };
        Self {
            grid: dungeon.grid,
            world: World::new(),
            monsters: Vec::new(),
            potions: Vec::new(),
            player: Player::spawn_at(spawn),
            difficulty,
            high_score,
            rng,
        }
    }

    fn populate(&mut self) {
        let profile = self.difficulty.profile();

        let monster_target = self.rng.gen_range(profile.monsters_min..=profile.monsters_max);
        for placed in 0..monster_target {
            let cell = self.free_cell(|s, cell| {
                cell != s.player.pos && s.monster_at(cell).is_none()
            });
            match cell {
                Some(cell) => {
                    let hp = self
                        .rng
                        .gen_range(profile.monster_hp_min..=profile.monster_hp_max);
                    self.spawn_monster(cell, hp);
                }
                None => {
                    log::warn!(
                        "monster placement exhausted at {} of {}",
                        placed,
                        monster_target
                    );
                    break;
                }
            }
        }

        let potion_target = self.rng.gen_range(profile.potions_min..=profile.potions_max);
        for placed in 0..potion_target {
            let cell = self.free_cell(|s, cell| {
                cell != s.player.pos
                    && s.monster_at(cell).is_none()
                    && s.potion_at(cell).is_none()
            });
            match cell {
                Some(cell) => {
                    self.spawn_potion(cell);
                }
                None => {
                    log::warn!(
                        "potion placement exhausted at {} of {}",
                        placed,
                        potion_target
                    );
                    break;
                }
            }
        }
    }

    /// Uniform random floor cell passing `accept`, or `None` once the retry
    /// budget runs out.
    fn free_cell(&mut self, accept: impl Fn(&Session, Point) -> bool) -> Option<Point> {
        for _ in 0..MAX_PLACEMENT_ATTEMPTS {
            let cell = random_floor_cell(&self.grid, &mut self.rng)?;
            if accept(self, cell) {
                return Some(cell);
            }
        }
        None
    }

    /// Insert a monster at `cell`. Spawn order doubles as resolution order
    /// for the monster phase.
    pub fn spawn_monster(&mut self, cell: Point, hp: i32) -> Entity {
        let entity = self.world.spawn((Position(cell), Monster { hp }));
        self.monsters.push(entity);
        entity
    }

    /// Insert a potion at `cell`.
    pub fn spawn_potion(&mut self, cell: Point) -> Entity {
        let entity = self.world.spawn((Position(cell), Potion));
        self.potions.push(entity);
        entity
    }

    pub fn monster_count(&self) -> usize {
        self.monsters.len()
    }

    pub fn potion_count(&self) -> usize {
        self.potions.len()
    }

    /// Live monster cells in resolution order.
    pub fn monster_cells(&self) -> Vec<Point> {
        self.monsters
            .iter()
            .filter_map(|&e| self.position_of(e))
            .collect()
    }

    /// Live potion cells in placement order.
    pub fn potion_cells(&self) -> Vec<Point> {
        self.potions
            .iter()
            .filter_map(|&e| self.position_of(e))
            .collect()
    }

    pub fn monster_at(&self, cell: Point) -> Option<Entity> {
        self.monsters
            .iter()
            .copied()
            .find(|&e| self.position_of(e) == Some(cell))
    }

    pub fn potion_at(&self, cell: Point) -> Option<Entity> {
        self.potions
            .iter()
            .copied()
            .find(|&e| self.position_of(e) == Some(cell))
    }

    pub fn monster_hp(&self, entity: Entity) -> Option<i32> {
        self.world.get::<&Monster>(entity).ok().map(|m| m.hp)
    }

    pub fn game_over(&self) -> bool {
        self.player.hp <= 0
    }

    /// Run one full turn from a player movement intent.
    ///
    /// Out-of-bounds destinations are rejected before anything advances.
    /// Every other branch — wall bump included — consumes the turn and
    /// lets the monsters act.
    pub fn resolve_turn(&mut self, dir: Direction) -> TurnOutcome {
        let dest = self.player.pos.step(dir);
        if !self.grid.in_bounds(dest) {
            return TurnOutcome::OutOfBounds;
        }

        let mut events = Vec::new();
        self.apply_player_action(dest, &mut events);
        self.monster_phase(&mut events);
        self.player.hp = combat::settle_hp(self.player.hp);
        self.player.turns += 1;
        TurnOutcome::Advanced(events)
    }

    fn apply_player_action(&mut self, dest: Point, events: &mut Vec<TurnEvent>) {
        if !self.grid.is_floor(dest) {
            events.push(TurnEvent::BumpedWall);
            return;
        }

        if let Some(entity) = self.monster_at(dest) {
            let hp = self.monster_hp(entity).unwrap_or(0);
            match combat::strike(hp, self.player.attack) {
                MeleeOutcome::Slain => {
                    self.despawn_monster(entity);
                    self.player.score += combat::KILL_SCORE;
                    // The player advances into the vacated cell.
                    self.player.pos = dest;
                    events.push(TurnEvent::SlewMonster {
                        score_awarded: combat::KILL_SCORE,
                    });
                }
                MeleeOutcome::Wounded { remaining } => {
                    if let Ok(mut monster) = self.world.get::<&mut Monster>(entity) {
                        monster.hp = remaining;
                    }
                    events.push(TurnEvent::HitMonster {
                        damage: self.player.attack,
                        remaining_hp: remaining,
                    });
                }
            }
            // Attacking never carries the player past a live monster.
            return;
        }

        if let Some(entity) = self.potion_at(dest) {
            let roll = self
                .rng
                .gen_range(combat::POTION_HEAL_MIN..=combat::POTION_HEAL_MAX);
            let (hp, healed) = combat::quaff(self.player.hp, self.player.max_hp, roll);
            self.player.hp = hp;
            self.despawn_potion(entity);
            events.push(TurnEvent::DrankPotion { roll, healed });
        }

        self.player.pos = dest;
    }

    /// Plan all monster steps from one snapshot, then resolve them in spawn
    /// order. A monster whose planned step lands on the player attacks once
    /// and holds its ground; everyone else moves iff the destination is
    /// floor and unclaimed this turn.
    fn monster_phase(&mut self, events: &mut Vec<TurnEvent>) {
        let roster: Vec<(Entity, Point)> = self
            .monsters
            .iter()
            .filter_map(|&e| self.position_of(e).map(|p| (e, p)))
            .collect();

        let mut planned = Vec::with_capacity(roster.len());
        for (i, &(_, pos)) in roster.iter().enumerate() {
            let others: Vec<Point> = roster
                .iter()
                .enumerate()
                .filter(|&(j, _)| j != i)
                .map(|(_, &(_, p))| p)
                .collect();
            planned.push(next_step(&self.grid, pos, self.player.pos, &others));
        }

        let profile = self.difficulty.profile();
        let mut reserved: HashSet<Point> = HashSet::new();
        for (i, &(entity, current)) in roster.iter().enumerate() {
            let intended = planned[i];
            if intended == self.player.pos {
                // Attack without displacement.
                let damage = self
                    .rng
                    .gen_range(profile.monster_attack_min..=profile.monster_attack_max);
                self.player.hp -= damage;
                events.push(TurnEvent::TookHit { damage });
                reserved.insert(current);
            } else if self.grid.is_floor(intended) && !reserved.contains(&intended) {
                if let Ok(mut pos) = self.world.get::<&mut Position>(entity) {
                    pos.0 = intended;
                }
                reserved.insert(intended);
            } else {
                reserved.insert(current);
            }
        }
    }

    fn despawn_monster(&mut self, entity: Entity) {
        self.monsters.retain(|&e| e != entity);
        let _ = self.world.despawn(entity);
    }

    fn despawn_potion(&mut self, entity: Entity) {
        self.potions.retain(|&e| e != entity);
        let _ = self.world.despawn(entity);
    }

    fn position_of(&self, entity: Entity) -> Option<Point> {
        self.world.get::<&Position>(entity).ok().map(|p| p.0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use delve_logic::grid::Cell;

    /// 20×10 map with one big room, player at its center (10, 5).
    fn arena_session() -> Session {
        let mut grid = Grid::filled(20, 10, Cell::Wall);
        let room = delve_logic::grid::Rect::new(1, 1, 18, 8);
        for y in room.y..room.y + room.h {
            for x in room.x..room.x + room.w {
                grid.set(Point::new(x, y), Cell::Floor);
            }
        }
        let dungeon = Dungeon {
            grid,
            rooms: vec![room],
        };
        Session::with_dungeon(dungeon, Difficulty::Easy, 0, 0)
    }

    #[test]
    fn test_out_of_bounds_does_not_consume_turn() {
        let mut session = arena_session();
        session.player.pos = Point::new(0, 0);
        let outcome = session.resolve_turn(Direction::Left);
        assert_eq!(outcome, TurnOutcome::OutOfBounds);
        assert_eq!(session.player.turns, 0);
        assert_eq!(session.player.pos, Point::new(0, 0));
    }

    #[test]
    fn test_wall_bump_consumes_turn() {
        let mut session = arena_session();
        session.player.pos = Point::new(1, 1);
        let outcome = session.resolve_turn(Direction::Up);
        assert_eq!(
            outcome,
            TurnOutcome::Advanced(vec![TurnEvent::BumpedWall])
        );
        assert_eq!(session.player.turns, 1);
        assert_eq!(session.player.pos, Point::new(1, 1));
    }

    #[test]
    fn test_plain_move() {
        let mut session = arena_session();
        let start = session.player.pos;
        let outcome = session.resolve_turn(Direction::Right);
        assert_eq!(outcome, TurnOutcome::Advanced(vec![]));
        assert_eq!(session.player.pos, start.step(Direction::Right));
        assert_eq!(session.player.turns, 1);
    }

    #[test]
    fn test_kill_awards_score_and_advances() {
        let mut session = arena_session();
        session.player.pos = Point::new(2, 2);
        session.spawn_monster(Point::new(3, 2), 3);

        let outcome = session.resolve_turn(Direction::Right);

        assert_eq!(
            outcome,
            TurnOutcome::Advanced(vec![TurnEvent::SlewMonster { score_awarded: 10 }])
        );
        assert_eq!(session.monster_count(), 0);
        assert_eq!(session.player.score, 10);
        assert_eq!(session.player.pos, Point::new(3, 2));
        assert_eq!(session.player.turns, 1);
    }

    #[test]
    fn test_wound_leaves_player_in_place() {
        let mut session = arena_session();
        session.player.pos = Point::new(2, 2);
        let monster = session.spawn_monster(Point::new(3, 2), 8);

        let outcome = session.resolve_turn(Direction::Right);
        let TurnOutcome::Advanced(events) = outcome else {
            panic!("turn should advance");
        };

        assert_eq!(
            events[0],
            TurnEvent::HitMonster {
                damage: 4,
                remaining_hp: 4
            }
        );
        assert_eq!(session.monster_hp(monster), Some(4));
        assert_eq!(session.player.pos, Point::new(2, 2));
        assert_eq!(session.player.score, 0);

        // The adjacent survivor strikes back within the Easy tier range.
        let counter = events
            .iter()
            .find_map(|e| match e {
                TurnEvent::TookHit { damage } => Some(*damage),
                _ => None,
            })
            .expect("adjacent monster attacks");
        assert!((1..=2).contains(&counter));
        assert_eq!(session.player.hp, 20 - counter);
    }

    #[test]
    fn test_potion_heals_to_cap_and_is_removed() {
        let mut session = arena_session();
        session.player.pos = Point::new(2, 2);
        session.player.hp = session.player.max_hp - 3;
        session.spawn_potion(Point::new(3, 2));

        let outcome = session.resolve_turn(Direction::Right);
        let TurnOutcome::Advanced(events) = outcome else {
            panic!("turn should advance");
        };

        // Minimum roll is 6, so a 3-point deficit always caps out.
        assert_eq!(session.player.hp, session.player.max_hp);
        assert_eq!(session.potion_count(), 0);
        assert_eq!(session.player.pos, Point::new(3, 2));
        match events[0] {
            TurnEvent::DrankPotion { roll, healed } => {
                assert!((6..=10).contains(&roll));
                assert_eq!(healed, 3);
            }
            other => panic!("expected potion event, got {:?}", other),
        }
    }

    #[test]
    fn test_monsters_step_toward_player() {
        let mut session = arena_session();
        session.player.pos = Point::new(2, 2);
        session.spawn_monster(Point::new(10, 2), 5);

        session.resolve_turn(Direction::Down); // player to (2, 3)

        let cells = session.monster_cells();
        assert_eq!(cells.len(), 1);
        // Planned against the post-move player position, one step closer.
        assert!(cells[0].manhattan(Point::new(2, 3)) < Point::new(10, 2).manhattan(Point::new(2, 3)));
    }

    #[test]
    fn test_contested_cell_goes_to_earlier_spawn() {
        // Plus-shaped junction: both monsters' only move is the center.
        let mut grid = Grid::filled(5, 5, Cell::Wall);
        for cell in [
            Point::new(1, 2),
            Point::new(2, 2),
            Point::new(3, 2),
            Point::new(2, 1),
            Point::new(2, 3),
        ] {
            grid.set(cell, Cell::Floor);
        }
        let dungeon = Dungeon {
            grid,
            rooms: vec![],
        };
        let mut session = Session::with_dungeon(dungeon, Difficulty::Easy, 5, 0);
        session.player.pos = Point::new(1, 2);
        let first = session.spawn_monster(Point::new(2, 1), 5);
        let second = session.spawn_monster(Point::new(2, 3), 5);

        // Bump the wall so the player stays put while monsters act.
        session.resolve_turn(Direction::Left);

        assert_eq!(session.position_of(first), Some(Point::new(2, 2)));
        assert_eq!(session.position_of(second), Some(Point::new(2, 3)));
    }

    #[test]
    fn test_blocked_corridor_monster_waits() {
        // Single-file corridor: the rear monster cannot pass the front one.
        let mut grid = Grid::filled(7, 3, Cell::Wall);
        for x in 1..=5 {
            grid.set(Point::new(x, 1), Cell::Floor);
        }
        let dungeon = Dungeon {
            grid,
            rooms: vec![],
        };
        let mut session = Session::with_dungeon(dungeon, Difficulty::Easy, 5, 0);
        session.player.pos = Point::new(1, 1);
        let front = session.spawn_monster(Point::new(3, 1), 5);
        let rear = session.spawn_monster(Point::new(4, 1), 5);

        // Turn 1: the rear monster plans against the pre-move snapshot, so
        // the front one still blocks it and it holds position.
        session.resolve_turn(Direction::Left); // (0,1) is wall: bump, monsters act
        assert_eq!(session.position_of(front), Some(Point::new(2, 1)));
        assert_eq!(session.position_of(rear), Some(Point::new(4, 1)));

        // Turn 2: the front monster is adjacent and attacks in place; the
        // rear one follows into the vacated stretch.
        let outcome = session.resolve_turn(Direction::Left);
        let TurnOutcome::Advanced(events) = outcome else {
            panic!("turn should advance");
        };
        assert_eq!(session.position_of(front), Some(Point::new(2, 1)));
        assert_eq!(session.position_of(rear), Some(Point::new(3, 1)));
        let hits = events
            .iter()
            .filter(|e| matches!(e, TurnEvent::TookHit { .. }))
            .count();
        assert_eq!(hits, 1, "only the adjacent monster reaches the player");
    }

    #[test]
    fn test_adjacent_monster_attacks_once_per_turn() {
        let mut session = arena_session();
        session.player.pos = Point::new(2, 2);
        session.spawn_monster(Point::new(3, 2), 50);

        // Walk away; the monster catches up and attacks on later turns.
        let outcome = session.resolve_turn(Direction::Up);
        let TurnOutcome::Advanced(events) = outcome else {
            panic!("turn should advance");
        };
        let hits = events
            .iter()
            .filter(|e| matches!(e, TurnEvent::TookHit { .. }))
            .count();
        assert!(hits <= 1, "a monster may attack at most once per turn");
    }

    #[test]
    fn test_death_is_terminal_state() {
        let mut session = arena_session();
        session.player.pos = Point::new(2, 2);
        session.player.hp = 1;
        session.spawn_monster(Point::new(3, 2), 50);

        // Bump the monster repeatedly until its counterattacks land the kill.
        for _ in 0..10 {
            session.resolve_turn(Direction::Right);
            if session.game_over() {
                break;
            }
        }
        assert!(session.game_over());
        assert_eq!(session.player.hp, 0, "HP floors at zero");
    }

    #[test]
    fn test_generated_session_places_entities_apart() {
        for seed in 0..30 {
            for difficulty in Difficulty::ALL {
                let session = Session::new(difficulty, seed, 0);
                let profile = difficulty.profile();

                let mut cells = vec![session.player.pos];
                cells.extend(session.monster_cells());
                cells.extend(session.potion_cells());
                for cell in &cells {
                    assert!(session.grid.is_floor(*cell), "seed {}: off-floor entity", seed);
                }
                let unique: HashSet<Point> = cells.iter().copied().collect();
                assert_eq!(unique.len(), cells.len(), "seed {}: stacked entities", seed);

                assert!(session.monster_count() as u32 <= profile.monsters_max);
                assert!(session.potion_count() as u32 <= profile.potions_max);
            }
        }
    }

    #[test]
    fn test_same_seed_same_session() {
        let a = Session::new(Difficulty::Hard, 42, 0);
        let b = Session::new(Difficulty::Hard, 42, 0);
        assert_eq!(a.grid, b.grid);
        assert_eq!(a.player.pos, b.player.pos);
        assert_eq!(a.monster_cells(), b.monster_cells());
        assert_eq!(a.potion_cells(), b.potion_cells());
    }
}
