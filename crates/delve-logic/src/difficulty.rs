//! Difficulty tiers and their generation-time profiles.
//!
//! A tier is consulted twice: once at generation (monster and potion
//! counts, monster HP) and again on every monster hit, where the damage is
//! a fresh sample from the tier's attack range rather than a fixed
//! per-monster stat.

use serde::{Deserialize, Serialize};

/// Named difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Difficulty {
    Easy,
    Normal,
    Hard,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Difficulty::Easy, Difficulty::Normal, Difficulty::Hard];

    /// Map a startup menu selection (1–3) to a tier. Anything unrecognized
    /// lands on `Normal`.
    pub fn from_selection(choice: u32) -> Self {
        match choice {
            1 => Difficulty::Easy,
            3 => Difficulty::Hard,
            _ => Difficulty::Normal,
        }
    }

    pub fn name(self) -> &'static str {
        match self {
            Difficulty::Easy => "Easy",
            Difficulty::Normal => "Normal",
            Difficulty::Hard => "Hard",
        }
    }

    /// Generation knobs for this tier.
    pub fn profile(self) -> Profile {
        match self {
            Difficulty::Easy => Profile {
                monsters_min: 2,
                monsters_max: 4,
                monster_hp_min: 3,
                monster_hp_max: 5,
                monster_attack_min: 1,
                monster_attack_max: 2,
                potions_min: 5,
                potions_max: 7,
            },
            Difficulty::Normal => Profile {
                monsters_min: 3,
                monsters_max: 6,
                monster_hp_min: 4,
                monster_hp_max: 8,
                monster_attack_min: 2,
                monster_attack_max: 3,
                potions_min: 3,
                potions_max: 5,
            },
            Difficulty::Hard => Profile {
                monsters_min: 5,
                monsters_max: 8,
                monster_hp_min: 6,
                monster_hp_max: 12,
                monster_attack_min: 3,
                monster_attack_max: 5,
                potions_min: 1,
                potions_max: 3,
            },
        }
    }
}

/// Generation-time knobs for one tier. All ranges are inclusive.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Profile {
    pub monsters_min: u32,
    pub monsters_max: u32,
    pub monster_hp_min: i32,
    pub monster_hp_max: i32,
    pub monster_attack_min: i32,
    pub monster_attack_max: i32,
    pub potions_min: u32,
    pub potions_max: u32,
}
