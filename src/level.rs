use std::fmt;
use std::fs;
use std::io;
use std::path::Path;

pub const MAX_SIZE: usize = 64;
pub const MAX_BOXES: usize = 32;

/// Static cell kinds. Goals are tracked separately on `Level` so that the
/// grid itself never changes as boxes move over goal cells.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tile {
    Wall,
    Floor,
}

/// Error type for level loading.
#[derive(Debug)]
pub enum LevelError {
    /// IO error when reading from file
    Io(io::Error),
    /// No wall-prefixed map lines found
    Empty,
    /// Map exceeds the fixed maximum dimensions
    TooLarge { width: usize, height: usize },
    /// Map rows are not all the same length
    RaggedRow { line: usize },
    /// Unrecognized character in the map
    InvalidGlyph { ch: char, row: usize, col: usize },
    NoPlayer,
    MultiplePlayers,
    NoGoals,
    /// Fewer boxes than goals makes the level unsolvable
    NotEnoughBoxes { boxes: usize, goals: usize },
    TooManyBoxes { max: usize },
}

impl fmt::Display for LevelError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LevelError::Io(err) => write!(f, "IO error: {}", err),
            LevelError::Empty => write!(f, "no map lines found"),
            LevelError::TooLarge { width, height } => write!(
                f,
                "map is {}x{} but the maximum size is {}x{}",
                width, height, MAX_SIZE, MAX_SIZE
            ),
            LevelError::RaggedRow { line } => {
                write!(f, "map row {} has a different length than the first row", line)
            }
            LevelError::InvalidGlyph { ch, row, col } => {
                write!(f, "invalid character '{}' at ({}, {})", ch, row, col)
            }
            LevelError::NoPlayer => write!(f, "level has no player start"),
            LevelError::MultiplePlayers => write!(f, "level has multiple player starts"),
            LevelError::NoGoals => write!(f, "level has no goal cells"),
            LevelError::NotEnoughBoxes { boxes, goals } => write!(
                f,
                "level has {} goals but only {} boxes",
                goals, boxes
            ),
            LevelError::TooManyBoxes { max } => {
                write!(f, "level has more than {} boxes", max)
            }
        }
    }
}

impl std::error::Error for LevelError {}

impl From<io::Error> for LevelError {
    fn from(err: io::Error) -> Self {
        LevelError::Io(err)
    }
}

/// An immutable Sokoban level: the static grid, the goal cells, and the
/// initial dynamic state (player and box positions). Built once by the
/// loader and shared read-only by game states.
#[derive(Debug, Clone)]
pub struct Level {
    tiles: [[Tile; MAX_SIZE]; MAX_SIZE],
    goal_mask: [[bool; MAX_SIZE]; MAX_SIZE],
    goals: Vec<(u8, u8)>,
    width: u8,
    height: u8,
    start_player: (u8, u8),
    start_boxes: Vec<(u8, u8)>,
}

impl Level {
    /// Parse a level from text.
    ///
    /// Only the contiguous prefix of lines beginning with `#` forms the map;
    /// anything after the first non-wall-prefixed line is trailing metadata
    /// and is ignored.
    ///
    /// Characters:
    /// - `#` = Wall
    /// - ` ` = Floor
    /// - `.` = Goal (target location for boxes)
    /// - `$` = Box
    /// - `@` = Player
    /// - `*` = Box on goal
    /// - `+` = Player on goal
    pub fn from_text(text: &str) -> Result<Self, LevelError> {
        let mut rows: Vec<&str> = Vec::new();
        for line in text.lines() {
            if line.starts_with('#') {
                rows.push(line);
            } else {
                break;
            }
        }

        if rows.is_empty() {
            return Err(LevelError::Empty);
        }

        let height = rows.len();
        let width = rows[0].len();
        if width > MAX_SIZE || height > MAX_SIZE {
            return Err(LevelError::TooLarge { width, height });
        }
        for (i, row) in rows.iter().enumerate() {
            if row.len() != width {
                return Err(LevelError::RaggedRow { line: i + 1 });
            }
        }

        let mut tiles = [[Tile::Floor; MAX_SIZE]; MAX_SIZE];
        let mut goal_mask = [[false; MAX_SIZE]; MAX_SIZE];
        let mut goals: Vec<(u8, u8)> = Vec::new();
        let mut boxes: Vec<(u8, u8)> = Vec::new();
        let mut player: Option<(u8, u8)> = None;

        for (r, row) in rows.iter().enumerate() {
            for (c, ch) in row.chars().enumerate() {
                let pos = (r as u8, c as u8);
                match ch {
                    '#' => tiles[r][c] = Tile::Wall,
                    ' ' => {}
                    '.' => {
                        goal_mask[r][c] = true;
                        goals.push(pos);
                    }
                    '$' => boxes.push(pos),
                    '*' => {
                        goal_mask[r][c] = true;
                        goals.push(pos);
                        boxes.push(pos);
                    }
                    '@' => {
                        if player.is_some() {
                            return Err(LevelError::MultiplePlayers);
                        }
                        player = Some(pos);
                    }
                    '+' => {
                        goal_mask[r][c] = true;
                        goals.push(pos);
                        if player.is_some() {
                            return Err(LevelError::MultiplePlayers);
                        }
                        player = Some(pos);
                    }
                    _ => {
                        return Err(LevelError::InvalidGlyph { ch, row: r, col: c });
                    }
                }
            }
        }

        let start_player = player.ok_or(LevelError::NoPlayer)?;
        if goals.is_empty() {
            return Err(LevelError::NoGoals);
        }
        if boxes.len() < goals.len() {
            return Err(LevelError::NotEnoughBoxes {
                boxes: boxes.len(),
                goals: goals.len(),
            });
        }
        if boxes.len() > MAX_BOXES {
            return Err(LevelError::TooManyBoxes { max: MAX_BOXES });
        }

        Ok(Level {
            tiles,
            goal_mask,
            goals,
            width: width as u8,
            height: height as u8,
            start_player,
            start_boxes: boxes,
        })
    }

    /// Parse a level from a text file.
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self, LevelError> {
        let contents = fs::read_to_string(path)?;
        Self::from_text(&contents)
    }

    pub fn width(&self) -> usize {
        self.width as usize
    }

    pub fn height(&self) -> usize {
        self.height as usize
    }

    pub fn tile(&self, pos: (u8, u8)) -> Tile {
        self.tiles[pos.0 as usize][pos.1 as usize]
    }

    pub fn is_goal(&self, pos: (u8, u8)) -> bool {
        self.goal_mask[pos.0 as usize][pos.1 as usize]
    }

    /// Goal coordinates in map scan order.
    pub fn goals(&self) -> &[(u8, u8)] {
        &self.goals
    }

    pub fn start_player(&self) -> (u8, u8) {
        self.start_player
    }

    pub fn start_boxes(&self) -> &[(u8, u8)] {
        &self.start_boxes
    }

    pub fn in_bounds(&self, row: i32, col: i32) -> bool {
        row >= 0 && col >= 0 && row < self.height as i32 && col < self.width as i32
    }
}
