//! ECS components for dungeon dwellers.

use delve_logic::grid::Point;
use serde::{Deserialize, Serialize};

/// Grid cell an entity currently occupies.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position(pub Point);

/// Hostile dweller that chases the player. Damage dealt is not stored here;
/// it is re-rolled from the difficulty tier's range on every hit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Monster {
    pub hp: i32,
}

/// Single-use healing potion.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Potion;
