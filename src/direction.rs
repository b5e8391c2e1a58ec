use std::fmt;

/// One of the four unit moves. Deltas are in `(row, col)` form.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Direction {
    Up,
    Down,
    Left,
    Right,
}

/// Error for a token that does not map to exactly one direction.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct InvalidDirection {
    token: String,
}

impl fmt::Display for InvalidDirection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "invalid direction '{}': use U/D/L/R or UP/DOWN/LEFT/RIGHT",
            self.token
        )
    }
}

impl std::error::Error for InvalidDirection {}

impl Direction {
    pub const ALL: [Direction; 4] = [
        Direction::Up,
        Direction::Down,
        Direction::Left,
        Direction::Right,
    ];

    /// Unit offset `(d_row, d_col)`.
    pub fn delta(self) -> (i8, i8) {
        match self {
            Direction::Up => (-1, 0),
            Direction::Down => (1, 0),
            Direction::Left => (0, -1),
            Direction::Right => (0, 1),
        }
    }

    pub fn letter(self) -> char {
        match self {
            Direction::Up => 'U',
            Direction::Down => 'D',
            Direction::Left => 'L',
            Direction::Right => 'R',
        }
    }

    /// Case-insensitive single-letter form (`U`/`D`/`L`/`R`).
    pub fn from_char(ch: char) -> Option<Direction> {
        match ch.to_ascii_uppercase() {
            'U' => Some(Direction::Up),
            'D' => Some(Direction::Down),
            'L' => Some(Direction::Left),
            'R' => Some(Direction::Right),
            _ => None,
        }
    }

    /// Map a single, possibly decorated token (`"**U**"`, `"<U>"`, `"up"`,
    /// `"'R'"`, ...) to a direction.
    ///
    /// Matching is by case-insensitive substring on the four letters; the
    /// token must match exactly one direction, otherwise it is rejected.
    /// This heuristic lives here, away from move application, so it can be
    /// tested and evolved on its own.
    pub fn parse_token(token: &str) -> Result<Direction, InvalidDirection> {
        let upper = token.to_uppercase();
        let mut found: Option<Direction> = None;

        for dir in Direction::ALL {
            if upper.contains(dir.letter()) {
                match found {
                    None => found = Some(dir),
                    Some(prev) if prev == dir => {}
                    Some(_) => {
                        return Err(InvalidDirection {
                            token: token.to_owned(),
                        });
                    }
                }
            }
        }

        found.ok_or_else(|| InvalidDirection {
            token: token.to_owned(),
        })
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Up => write!(f, "Up"),
            Direction::Down => write!(f, "Down"),
            Direction::Left => write!(f, "Left"),
            Direction::Right => write!(f, "Right"),
        }
    }
}

/// Extract a move string from free-form planner output.
///
/// Each line is scanned for the four direction letters (case-insensitive,
/// checked in U, D, L, R order) and every match appends one letter. This
/// tolerates bracketed, quoted, and markdown-decorated answers as well as
/// full words, since `UP`/`DOWN`/`LEFT`/`RIGHT` each contain exactly their
/// own letter.
pub fn extract_moves(text: &str) -> String {
    let mut moves = String::new();
    for line in text.lines() {
        let upper = line.to_uppercase();
        for dir in Direction::ALL {
            if upper.contains(dir.letter()) {
                moves.push(dir.letter());
            }
        }
    }
    moves
}

/// Normalize one candidate sequence to a `UDLR` move string.
///
/// A sequence that is already plain direction letters (any case, whitespace
/// allowed) passes through verbatim; the per-line extraction would collapse
/// repeats like `"RRUU"` to one letter each. Anything else is treated as
/// free-form planner text and goes through [`extract_moves`].
pub fn normalize_moves(text: &str) -> String {
    let compact: String = text
        .chars()
        .filter(|ch| !ch.is_whitespace())
        .map(|ch| ch.to_ascii_uppercase())
        .collect();
    if !compact.is_empty() && compact.chars().all(|ch| Direction::from_char(ch).is_some()) {
        return compact;
    }
    extract_moves(text)
}
