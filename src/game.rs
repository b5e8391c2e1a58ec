use crate::direction::Direction;
use crate::level::{Level, MAX_BOXES, MAX_SIZE, Tile};
use arrayvec::ArrayVec;
use std::fmt;
use std::sync::Arc;

/// Why a move was not applied. These are ordinary negative results, not
/// errors: callers replay long candidate sequences and inspect the reason.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Rejection {
    /// Target cell is a wall
    Wall,
    /// Target cell is outside the grid
    OutOfBounds,
    /// Target cell holds a box whose push destination is blocked
    BoxBlocked,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Rejection::Wall => write!(f, "wall"),
            Rejection::OutOfBounds => write!(f, "bounds"),
            Rejection::BoxBlocked => write!(f, "box-blocked"),
        }
    }
}

/// Box positions keyed by coordinate: a position list for iteration plus a
/// per-cell index grid for O(1) membership. `move_box` removes the old key
/// and inserts the new one, so duplicate box coordinates cannot occur.
#[derive(Debug, Clone)]
struct Boxes {
    positions: ArrayVec<(u8, u8), MAX_BOXES>,
    // Maps grid position to box index (255 = no box at this position)
    index: [[u8; MAX_SIZE]; MAX_SIZE],
}

impl Boxes {
    fn new() -> Self {
        Boxes {
            positions: ArrayVec::new(),
            index: [[255u8; MAX_SIZE]; MAX_SIZE],
        }
    }

    fn add(&mut self, pos: (u8, u8)) {
        debug_assert!(!self.has_box_at(pos));
        self.index[pos.0 as usize][pos.1 as usize] = self.positions.len() as u8;
        self.positions.push(pos);
    }

    fn move_box(&mut self, from: (u8, u8), to: (u8, u8)) {
        let idx = self.index[from.0 as usize][from.1 as usize];
        debug_assert!(idx != 255 && !self.has_box_at(to));
        self.positions[idx as usize] = to;
        self.index[from.0 as usize][from.1 as usize] = 255;
        self.index[to.0 as usize][to.1 as usize] = idx;
    }

    fn has_box_at(&self, pos: (u8, u8)) -> bool {
        self.index[pos.0 as usize][pos.1 as usize] != 255
    }
}

/// Mutable runtime state of one play-through: the player and box positions
/// over a shared read-only [`Level`].
///
/// `Clone` produces the independent deep copy required when evaluating
/// several candidate solutions: the dynamic state is copied, the grid stays
/// shared. Each instance assumes single-writer access.
#[derive(Debug, Clone)]
pub struct GameState {
    level: Arc<Level>,
    player: (u8, u8),
    boxes: Boxes,
}

impl GameState {
    /// Create the initial state for a level.
    pub fn new(level: Arc<Level>) -> Self {
        let mut boxes = Boxes::new();
        for &pos in level.start_boxes() {
            boxes.add(pos);
        }
        let player = level.start_player();
        GameState {
            level,
            player,
            boxes,
        }
    }

    pub fn level(&self) -> &Level {
        &self.level
    }

    /// Player coordinate as `(row, col)`.
    pub fn player(&self) -> (u8, u8) {
        self.player
    }

    /// Current box coordinates. Order reflects insertion and pushes, not
    /// semantics; boxes are logically a set.
    pub fn box_positions(&self) -> &[(u8, u8)] {
        &self.boxes.positions
    }

    pub fn is_wall(&self, pos: (u8, u8)) -> bool {
        self.level.tile(pos) == Tile::Wall
    }

    pub fn is_occupied_by_box(&self, pos: (u8, u8)) -> bool {
        self.boxes.has_box_at(pos)
    }

    pub fn is_out_of_bounds(&self, row: i32, col: i32) -> bool {
        !self.level.in_bounds(row, col)
    }

    /// Wall, box, or out of bounds.
    pub fn is_blocked(&self, row: i32, col: i32) -> bool {
        if self.is_out_of_bounds(row, col) {
            return true;
        }
        let pos = (row as u8, col as u8);
        self.is_wall(pos) || self.is_occupied_by_box(pos)
    }

    /// True iff every goal coordinate is occupied by a box. A level may have
    /// more boxes than goals; the extras do not matter. Box count >= goal
    /// count is guaranteed at load and boxes are never removed, so this
    /// membership check is exactly the win condition.
    pub fn is_solved(&self) -> bool {
        self.level.goals().iter().all(|&g| self.boxes.has_box_at(g))
    }

    /// Try to move the player one cell in `dir`, pushing at most one box.
    ///
    /// Pure transition: on `Err` the state is untouched; on `Ok` either the
    /// player alone moved, or the player and the adjacent box both moved by
    /// the same unit offset. Goal cells are floor-like for occupancy, so
    /// boxes push onto and off of goals freely.
    pub fn apply_move(&mut self, dir: Direction) -> Result<(), Rejection> {
        let (dr, dc) = dir.delta();
        let target_row = self.player.0 as i32 + dr as i32;
        let target_col = self.player.1 as i32 + dc as i32;

        if self.is_out_of_bounds(target_row, target_col) {
            return Err(Rejection::OutOfBounds);
        }
        let target = (target_row as u8, target_col as u8);
        if self.is_wall(target) {
            return Err(Rejection::Wall);
        }

        if self.is_occupied_by_box(target) {
            let dest_row = target_row + dr as i32;
            let dest_col = target_col + dc as i32;
            if self.is_blocked(dest_row, dest_col) {
                return Err(Rejection::BoxBlocked);
            }
            self.boxes.move_box(target, (dest_row as u8, dest_col as u8));
        }

        self.player = target;
        Ok(())
    }

    /// Canonical text rendering of the state, used as the equality key for
    /// cycle detection: two states are the same iff their serializations are
    /// byte-equal.
    ///
    /// Overlays: walls stay `#`; a goal cell renders `+` under the player,
    /// `*` under a box, else `.`; any other cell renders `@` for the player,
    /// `$` for a box, else space. Rows are full width, joined by `\n`.
    pub fn serialize(&self) -> String {
        let mut out = String::with_capacity((self.level.width() + 1) * self.level.height());
        for row in 0..self.level.height() as u8 {
            if row > 0 {
                out.push('\n');
            }
            for col in 0..self.level.width() as u8 {
                let pos = (row, col);
                let ch = if self.is_wall(pos) {
                    '#'
                } else if self.level.is_goal(pos) {
                    if pos == self.player {
                        '+'
                    } else if self.boxes.has_box_at(pos) {
                        '*'
                    } else {
                        '.'
                    }
                } else if pos == self.player {
                    '@'
                } else if self.boxes.has_box_at(pos) {
                    '$'
                } else {
                    ' '
                };
                out.push(ch);
            }
        }
        out
    }

    /// Human-readable coordinate listing for the planner prompt, alongside
    /// the serialized map.
    pub fn describe(&self) -> String {
        let list = |positions: &[(u8, u8)]| {
            positions
                .iter()
                .map(|&(r, c)| format!("({}, {})", r, c))
                .collect::<Vec<_>>()
                .join(", ")
        };
        format!(
            "Player (@) current position: ({}, {})\n\
             Box ($) current positions: {}\n\
             Target (.) current positions: {}",
            self.player.0,
            self.player.1,
            list(self.box_positions()),
            list(self.level.goals()),
        )
    }
}

impl fmt::Display for GameState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "{}", self.serialize())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::LevelError;
    use proptest::prelude::*;

    fn state(input: &str) -> GameState {
        GameState::new(Arc::new(Level::from_text(input).unwrap()))
    }

    #[test]
    fn test_accessors() {
        let s = state(
            "#####\n\
             #@$.#\n\
             #####",
        );
        assert!(s.is_wall((0, 0)));
        assert!(!s.is_wall((1, 1)));
        assert!(s.is_occupied_by_box((1, 2)));
        assert!(!s.is_occupied_by_box((1, 3)));
        assert!(s.is_out_of_bounds(-1, 0));
        assert!(s.is_out_of_bounds(0, 5));
        assert!(!s.is_out_of_bounds(2, 4));
        assert!(s.is_blocked(0, 1)); // wall
        assert!(s.is_blocked(1, 2)); // box
        assert!(s.is_blocked(3, 0)); // out of bounds
        assert!(!s.is_blocked(1, 3)); // empty goal
    }

    #[test]
    fn test_plain_move() {
        let mut s = state(
            "#####\n\
             #@  #\n\
             # $.#\n\
             #####",
        );
        assert_eq!(s.apply_move(Direction::Right), Ok(()));
        assert_eq!(s.player(), (1, 2));
        assert_eq!(s.box_positions(), &[(2, 2)]);
    }

    #[test]
    fn test_move_into_wall_rejected() {
        let mut s = state(
            "#####\n\
             #@$.#\n\
             #####",
        );
        let before = s.serialize();
        assert_eq!(s.apply_move(Direction::Up), Err(Rejection::Wall));
        assert_eq!(s.apply_move(Direction::Left), Err(Rejection::Wall));
        // No mutation on rejection.
        assert_eq!(s.serialize(), before);
        assert_eq!(s.player(), (1, 1));
    }

    #[test]
    fn test_move_out_of_bounds_rejected() {
        // Bottom edge of the map is open; stepping off it is rejected.
        let mut s = state(
            "###\n\
             #.#\n\
             #$#\n\
             #@#",
        );
        let before = s.serialize();
        assert_eq!(s.apply_move(Direction::Down), Err(Rejection::OutOfBounds));
        assert_eq!(s.serialize(), before);
    }

    #[test]
    fn test_push_box() {
        let mut s = state(
            "######\n\
             #@$ .#\n\
             ######",
        );
        assert_eq!(s.apply_move(Direction::Right), Ok(()));
        // Player and box both moved by one unit.
        assert_eq!(s.player(), (1, 2));
        assert_eq!(s.box_positions(), &[(1, 3)]);
        assert!(!s.is_solved());

        // Second push lands the box on the goal.
        assert_eq!(s.apply_move(Direction::Right), Ok(()));
        assert_eq!(s.box_positions(), &[(1, 4)]);
        assert!(s.is_solved());
    }

    #[test]
    fn test_push_into_wall_rejected() {
        let mut s = state(
            "#####\n\
             #.$@#\n\
             #####",
        );
        // The box can move onto the goal but not past it into the wall.
        assert_eq!(s.apply_move(Direction::Left), Ok(()));
        assert!(s.is_solved());
        assert_eq!(s.apply_move(Direction::Left), Err(Rejection::BoxBlocked));
    }

    #[test]
    fn test_push_into_box_rejected() {
        let mut s = state(
            "######\n\
             #@$$.#\n\
             # .  #\n\
             ######",
        );
        let before = s.serialize();
        assert_eq!(s.apply_move(Direction::Right), Err(Rejection::BoxBlocked));
        assert_eq!(s.serialize(), before);
    }

    #[test]
    fn test_push_out_of_bounds_rejected() {
        let mut s = state(
            "###\n\
             #.#\n\
             #@#\n\
             #$#",
        );
        assert_eq!(s.apply_move(Direction::Down), Err(Rejection::BoxBlocked));
    }

    #[test]
    fn test_push_box_off_goal() {
        let mut s = state(
            "######\n\
             #@*  #\n\
             # .$ #\n\
             ######",
        );
        assert!(!s.is_solved());
        // Pushing a box off a goal onto plain floor is legal.
        assert_eq!(s.apply_move(Direction::Right), Ok(()));
        assert!(s.is_occupied_by_box((1, 3)));
        assert!(!s.is_occupied_by_box((1, 2)));
    }

    #[test]
    fn test_solved_needs_every_goal_covered() {
        // Two goals, three boxes: covering both goals wins even though one
        // box sits on plain floor.
        let mut s = state(
            "#######\n\
             #@$ . #\n\
             # $ . #\n\
             # $   #\n\
             #######",
        );
        assert!(!s.is_solved());
        s.apply_move(Direction::Right).unwrap();
        s.apply_move(Direction::Right).unwrap();
        assert!(!s.is_solved());
        s.apply_move(Direction::Left).unwrap();
        s.apply_move(Direction::Left).unwrap();
        s.apply_move(Direction::Down).unwrap();
        s.apply_move(Direction::Right).unwrap();
        s.apply_move(Direction::Right).unwrap();
        assert!(s.is_solved());
    }

    #[test]
    fn test_player_on_goal_is_cosmetic() {
        let mut s = state(
            "######\n\
             #@.* #\n\
             # $  #\n\
             ######",
        );
        assert_eq!(s.apply_move(Direction::Right), Ok(()));
        // Player standing on a goal renders '+' but does not affect the win
        // condition.
        assert_eq!(
            s.serialize(),
            "######\n\
             # +* #\n\
             # $  #\n\
             ######"
        );
        assert!(!s.is_solved());
    }

    #[test]
    fn test_serialize_overlays() {
        let s = state(
            "######\n\
             #@$..#\n\
             # *$ #\n\
             ######",
        );
        assert_eq!(
            s.serialize(),
            "######\n\
             #@$..#\n\
             # *$ #\n\
             ######"
        );
    }

    #[test]
    fn test_serialize_deterministic() {
        let s = state(
            "#####\n\
             #@$.#\n\
             #####",
        );
        assert_eq!(s.serialize(), s.serialize());
        let copy = s.clone();
        assert_eq!(copy.serialize(), s.serialize());
    }

    #[test]
    fn test_serialize_independent_of_box_order() {
        // Reach the same configuration through different move orders; the
        // internal box list orders differ but the serialization must not.
        let level = Arc::new(
            Level::from_text(
                "#######\n\
                 #     #\n\
                 #  $  #\n\
                 #  @ .#\n\
                 #  $  #\n\
                 #     #\n\
                 #######",
            )
            .unwrap(),
        );
        let mut a = GameState::new(Arc::clone(&level));
        a.apply_move(Direction::Up).unwrap();
        a.apply_move(Direction::Down).unwrap();
        a.apply_move(Direction::Down).unwrap();
        a.apply_move(Direction::Up).unwrap();

        let mut b = GameState::new(Arc::clone(&level));
        b.apply_move(Direction::Down).unwrap();
        b.apply_move(Direction::Up).unwrap();
        b.apply_move(Direction::Up).unwrap();
        b.apply_move(Direction::Down).unwrap();

        assert_eq!(a.serialize(), b.serialize());
    }

    #[test]
    fn test_clone_is_independent() {
        let mut s = state(
            "######\n\
             #@$ .#\n\
             ######",
        );
        let snapshot = s.clone();
        s.apply_move(Direction::Right).unwrap();
        assert_ne!(s.serialize(), snapshot.serialize());
        assert_eq!(snapshot.player(), (1, 1));
    }

    #[test]
    fn test_scenario_one_box_one_goal() {
        // Pushing the box toward the goal from the correct side solves the
        // room; pushing it away does not.
        let toward = "#####\n\
                      #@$.#\n\
                      #   #\n\
                      #####";
        let mut s = state(toward);
        assert_eq!(s.apply_move(Direction::Right), Ok(()));
        assert!(s.is_solved());

        let away = "#####\n\
                    # @ #\n\
                    # $.#\n\
                    #   #\n\
                    #####";
        let mut s = state(away);
        assert_eq!(s.apply_move(Direction::Down), Ok(())); // pushes box down, away from goal
        assert!(!s.is_solved());
    }

    #[test]
    fn test_describe() {
        let s = state(
            "#####\n\
             #@$.#\n\
             #####",
        );
        let text = s.describe();
        assert!(text.contains("Player (@) current position: (1, 1)"));
        assert!(text.contains("Box ($) current positions: (1, 2)"));
        assert!(text.contains("Target (.) current positions: (1, 3)"));
    }

    #[test]
    fn test_solvability_checked_at_load() {
        let result = Level::from_text(
            "#####\n\
             #@ .#\n\
             #####",
        );
        assert!(matches!(result, Err(LevelError::NotEnoughBoxes { .. })));
    }

    const PROP_LEVEL: &str = "########\n\
                              #@ $ . #\n\
                              # $# . #\n\
                              #  $ . #\n\
                              #      #\n\
                              ########";

    proptest! {
        // Any move sequence preserves the state invariants: the player is
        // never on a wall, boxes stay in bounds and never overlap, and a
        // rejected move leaves the state untouched.
        #[test]
        fn prop_moves_preserve_invariants(seq in proptest::collection::vec(0usize..4, 0..64)) {
            let mut s = state(PROP_LEVEL);
            for i in seq {
                let dir = Direction::ALL[i];
                let before = s.serialize();
                if s.apply_move(dir).is_err() {
                    prop_assert_eq!(&s.serialize(), &before);
                }
                prop_assert!(!s.is_wall(s.player()));
                let boxes = s.box_positions();
                for (j, a) in boxes.iter().enumerate() {
                    prop_assert!(!s.is_wall(*a));
                    prop_assert!(!s.is_out_of_bounds(a.0 as i32, a.1 as i32));
                    for b in &boxes[j + 1..] {
                        prop_assert_ne!(a, b);
                    }
                }
            }
        }

        // An accepted move displaces the player by exactly one unit offset.
        #[test]
        fn prop_accepted_move_is_unit_offset(seq in proptest::collection::vec(0usize..4, 0..64)) {
            let mut s = state(PROP_LEVEL);
            for i in seq {
                let dir = Direction::ALL[i];
                let (dr, dc) = dir.delta();
                let before = s.player();
                if s.apply_move(dir).is_ok() {
                    let after = s.player();
                    prop_assert_eq!(after.0 as i32 - before.0 as i32, dr as i32);
                    prop_assert_eq!(after.1 as i32 - before.1 as i32, dc as i32);
                }
            }
        }
    }
}
