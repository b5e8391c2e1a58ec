//! Sokoban puzzle state machine and move-replay engine.
//!
//! Levels load from plain-text maps; a [`game::GameState`] applies moves
//! under the standard push rules; [`executor::replay`] runs a candidate move
//! sequence with cycle truncation, producing the visited-state record that
//! an external planner loop consumes.

pub mod direction;
pub mod executor;
pub mod game;
pub mod level;
pub mod logging;
