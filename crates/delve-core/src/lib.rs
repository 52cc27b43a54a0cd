//! Delve engine — dungeon synthesis, entity placement, turn resolution, and
//! score persistence, built on the pure logic in `delve-logic`.
//!
//! The engine owns a hecs [`World`](hecs::World) for monsters and potions
//! alongside ordered entity handle lists; the [`session::Session`] aggregate
//! is the single thread of control mutated once per player input.

pub mod components;
pub mod generation;
pub mod highscore;
pub mod session;
