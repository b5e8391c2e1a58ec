use crate::direction::Direction;
use crate::game::GameState;
use std::fmt;
use tracing::debug;

/// Outcome of replaying one candidate move sequence.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReplayStatus {
    /// Every goal was covered at some point during the replay
    Success,
    /// The whole sequence applied but the level is not solved
    Unsolved,
    /// A token failed to parse or a move was rejected; the batch is discarded
    Invalid,
    /// The proposed sequence was empty
    Empty,
}

impl fmt::Display for ReplayStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ReplayStatus::Success => write!(f, "success"),
            ReplayStatus::Unsolved => write!(f, "unsolved"),
            ReplayStatus::Invalid => write!(f, "invalid"),
            ReplayStatus::Empty => write!(f, "empty"),
        }
    }
}

/// Result of a replay: the final status, the accepted move string (with
/// cycles collapsed), and the canonical serialization recorded after each
/// accepted move, in order, for logging and rendering.
#[derive(Debug, Clone)]
pub struct Replay {
    pub status: ReplayStatus,
    pub moves: String,
    pub visited: Vec<String>,
}

/// Replay a proposed move sequence against `state`, one letter per move.
///
/// After each accepted move the state is serialized. A serialization already
/// present in the visited list at index `idx` means the sequence walked a
/// cycle: the accepted-move string and the visited list are truncated to
/// `idx + 1` and the replay continues from there. The live `GameState` is
/// not rolled back; the repeated serialization means it already is that
/// earlier state.
///
/// An unparseable token or a rejected move invalidates the whole batch: the
/// accepted-move string resets to empty and the rest of the sequence is
/// abandoned. Visited states recorded up to that point are kept for the
/// caller's logs. Reaching a solved state ends the replay immediately.
pub fn replay(state: &mut GameState, proposed: &str) -> Replay {
    let mut moves = String::new();
    let mut visited: Vec<String> = Vec::new();

    if proposed.is_empty() {
        return Replay {
            status: ReplayStatus::Empty,
            moves,
            visited,
        };
    }

    for token in proposed.chars() {
        let Some(dir) = Direction::from_char(token) else {
            debug!(%token, "unrecognized move token, discarding batch");
            return Replay {
                status: ReplayStatus::Invalid,
                moves: String::new(),
                visited,
            };
        };

        match state.apply_move(dir) {
            Ok(()) => {
                moves.push(dir.letter());
                let snapshot = state.serialize();

                if state.is_solved() {
                    visited.push(snapshot);
                    debug!(moves = %moves, "level solved");
                    return Replay {
                        status: ReplayStatus::Success,
                        moves,
                        visited,
                    };
                }

                if let Some(idx) = visited.iter().position(|seen| *seen == snapshot) {
                    // Collapse the cycle back to its first occurrence.
                    moves.truncate(idx + 1);
                    visited.truncate(idx + 1);
                    debug!(history = idx + 1, "revisited state, truncating history");
                    continue;
                }
                visited.push(snapshot);
            }
            Err(reason) => {
                debug!(%dir, %reason, "move rejected, discarding batch");
                return Replay {
                    status: ReplayStatus::Invalid,
                    moves: String::new(),
                    visited,
                };
            }
        }
    }

    Replay {
        status: ReplayStatus::Unsolved,
        moves,
        visited,
    }
}
