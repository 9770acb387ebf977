//! Guard patrol over a character grid: the agent walks forward, turns right in front of an
//! obstruction and eventually either leaves the grid or ends up walking in circles.

use std::{fmt, str::FromStr};

use rayon::prelude::*;
use rustc_hash::{FxHashMap, FxHashSet};
use thiserror::Error;
use tracing::debug;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum PatrolError {
    #[error("malformed grid: {0}")]
    MalformedGrid(#[from] GridDefect),
    #[error("no agent start marker `^` in grid")]
    AgentNotFound,
    #[error("agent is boxed in by obstructions at {0}")]
    DeadlockCell(Position),
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum GridDefect {
    #[error("input is empty")]
    Empty,
    #[error("row {row} has {found} cells, expected {expected}")]
    Ragged {
        row: usize,
        expected: usize,
        found: usize,
    },
    #[error("unexpected cell {found:?} at {position}")]
    UnknownCell { position: Position, found: char },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Heading {
    Up,
    Right,
    Down,
    Left,
}

impl Heading {
    pub fn turn_right(self) -> Self {
        match self {
            Heading::Up => Heading::Right,
            Heading::Right => Heading::Down,
            Heading::Down => Heading::Left,
            Heading::Left => Heading::Up,
        }
    }

    /// (row, col) offset of one step in this heading.
    fn delta(self) -> (isize, isize) {
        match self {
            Heading::Up => (-1, 0),
            Heading::Right => (0, 1),
            Heading::Down => (1, 0),
            Heading::Left => (0, -1),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Position {
    pub row: usize,
    pub col: usize,
}

impl Position {
    pub fn new(row: usize, col: usize) -> Self {
        Self { row, col }
    }

    /// Neighbour in the given heading. `None` if that would go below row or column 0; the upper
    /// bounds are checked against the terrain.
    fn neighbour(self, heading: Heading) -> Option<Self> {
        let (drow, dcol) = heading.delta();
        Some(Self {
            row: self.row.checked_add_signed(drow)?,
            col: self.col.checked_add_signed(dcol)?,
        })
    }
}

impl fmt::Display for Position {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.col)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Cell {
    Empty,
    Obstruction,
    AgentStart,
}

impl Cell {
    const EMPTY: u8 = b'.';
    const OBSTRUCTION: u8 = b'#';
    const AGENT_START: u8 = b'^';

    fn from_byte(b: u8) -> Option<Self> {
        match b {
            Self::EMPTY => Some(Cell::Empty),
            Self::OBSTRUCTION => Some(Cell::Obstruction),
            Self::AGENT_START => Some(Cell::AgentStart),
            _ => None,
        }
    }
}

/// Agent state: where it stands and where it is facing. A state seen twice means the walk
/// repeats forever.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Agent {
    pub position: Position,
    pub heading: Heading,
}

impl Agent {
    /// The agent always starts out facing up.
    pub fn new(position: Position) -> Self {
        Self {
            position,
            heading: Heading::Up,
        }
    }
}

/// Bounds and obstruction lookup, shared by the parsed grid and by a grid with one extra
/// obstruction laid over it.
pub trait Terrain {
    /// (rows, cols)
    fn dimensions(&self) -> (usize, usize);

    /// Only meaningful for positions inside the terrain.
    fn is_obstruction(&self, position: Position) -> bool;

    fn contains(&self, position: Position) -> bool {
        let (rows, cols) = self.dimensions();
        position.row < rows && position.col < cols
    }
}

/// Row-major grid of validated cell bytes.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Grid {
    bytes: Vec<u8>,
    rows: usize,
    cols: usize,
}

impl FromStr for Grid {
    type Err = PatrolError;

    fn from_str(input: &str) -> Result<Self, Self::Err> {
        let input = input.trim_end_matches(&['\r', '\n'][..]);
        if input.is_empty() {
            return Err(GridDefect::Empty.into());
        }

        let mut bytes = Vec::with_capacity(input.len());
        let mut cols = None;
        let mut rows = 0;
        for (row, line) in input.lines().enumerate() {
            let line = line.as_bytes();
            let expected = *cols.get_or_insert(line.len());
            if line.len() != expected {
                return Err(GridDefect::Ragged {
                    row,
                    expected,
                    found: line.len(),
                }
                .into());
            }
            if let Some(col) = line.iter().position(|&b| Cell::from_byte(b).is_none()) {
                return Err(GridDefect::UnknownCell {
                    position: Position::new(row, col),
                    found: line[col] as char,
                }
                .into());
            }
            bytes.extend_from_slice(line);
            rows += 1;
        }

        Ok(Grid {
            bytes,
            rows,
            cols: cols.unwrap_or(0),
        })
    }
}

impl Grid {
    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn cell(&self, position: Position) -> Option<Cell> {
        if !self.contains(position) {
            return None;
        }
        Cell::from_byte(self.bytes[position.row * self.cols + position.col])
    }

    /// First start marker in row-major order.
    pub fn locate_agent(&self) -> Result<Position, PatrolError> {
        memchr::memchr(Cell::AGENT_START, &self.bytes)
            .map(|index| Position::new(index / self.cols, index % self.cols))
            .ok_or(PatrolError::AgentNotFound)
    }

    pub fn with_obstruction(&self, position: Position) -> Obstructed<'_> {
        Obstructed {
            base: self,
            obstruction: position,
        }
    }
}

impl Terrain for Grid {
    fn dimensions(&self) -> (usize, usize) {
        (self.rows, self.cols)
    }

    fn is_obstruction(&self, position: Position) -> bool {
        self.cell(position) == Some(Cell::Obstruction)
    }
}

/// A grid with one additional obstruction. The base grid is borrowed, never copied.
#[derive(Debug, Clone, Copy)]
pub struct Obstructed<'a> {
    base: &'a Grid,
    obstruction: Position,
}

impl Terrain for Obstructed<'_> {
    fn dimensions(&self) -> (usize, usize) {
        self.base.dimensions()
    }

    fn is_obstruction(&self, position: Position) -> bool {
        position == self.obstruction || self.base.is_obstruction(position)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Step {
    Moved(Agent),
    Escaped,
}

/// Turns right until the cell ahead is free (or off the grid), then moves into it.
pub fn step<T: Terrain + ?Sized>(terrain: &T, agent: Agent) -> Result<Step, PatrolError> {
    let mut heading = agent.heading;
    for _ in 0..4 {
        let Some(next) = agent
            .position
            .neighbour(heading)
            .filter(|&next| terrain.contains(next))
        else {
            return Ok(Step::Escaped);
        };
        if !terrain.is_obstruction(next) {
            return Ok(Step::Moved(Agent {
                position: next,
                heading,
            }));
        }
        heading = heading.turn_right();
    }
    Err(PatrolError::DeadlockCell(agent.position))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Escaped,
    Looping,
}

#[derive(Debug, Clone)]
pub struct Trace {
    pub outcome: Outcome,
    pub visited: FxHashSet<Position>,
    pub steps: usize,
}

/// Walks from `start` until the agent escapes or repeats a state. `on_move` sees every move as
/// (state before, state after).
fn patrol<T: Terrain + ?Sized>(
    terrain: &T,
    start: Agent,
    mut on_move: impl FnMut(Agent, Agent),
) -> Result<(Outcome, usize), PatrolError> {
    let mut seen = FxHashSet::default();
    seen.insert(start);
    let mut agent = start;
    let mut steps = 0;
    loop {
        match step(terrain, agent)? {
            Step::Escaped => return Ok((Outcome::Escaped, steps)),
            Step::Moved(next) => {
                on_move(agent, next);
                steps += 1;
                agent = next;
                if !seen.insert(agent) {
                    return Ok((Outcome::Looping, steps));
                }
            }
        }
    }
}

pub fn trace<T: Terrain + ?Sized>(terrain: &T, start: Agent) -> Result<Trace, PatrolError> {
    let mut visited = FxHashSet::default();
    visited.insert(start.position);
    let (outcome, steps) = patrol(terrain, start, |_, to| {
        visited.insert(to.position);
    })?;
    Ok(Trace {
        outcome,
        visited,
        steps,
    })
}

/// Number of distinct cells the agent occupies, start cell included.
pub fn distinct_cells(grid: &Grid) -> Result<usize, PatrolError> {
    let start = Agent::new(grid.locate_agent()?);
    let trace = trace(grid, start)?;
    debug!(
        outcome = ?trace.outcome,
        steps = trace.steps,
        cells = trace.visited.len(),
        "patrol finished"
    );
    Ok(trace.visited.len())
}

/// Whether a single extra obstruction at `obstruction` makes the walk from `start` loop.
pub fn causes_loop(grid: &Grid, start: Agent, obstruction: Position) -> Result<bool, PatrolError> {
    let (outcome, _) = patrol(&grid.with_obstruction(obstruction), start, |_, _| {})?;
    Ok(outcome == Outcome::Looping)
}

/// All cells where one extra obstruction traps the agent in a loop.
///
/// Only cells on the unobstructed walk can change the path. Each trial resumes from the state
/// right before the candidate was first entered, since nothing earlier on the walk touches it.
pub fn loop_obstructions(grid: &Grid) -> Result<FxHashSet<Position>, PatrolError> {
    let start = Agent::new(grid.locate_agent()?);

    let mut first_entry = FxHashMap::default();
    let (outcome, steps) = patrol(grid, start, |from, to| {
        if to.position != start.position {
            first_entry.entry(to.position).or_insert(from);
        }
    })?;
    debug!(
        ?outcome,
        steps,
        candidates = first_entry.len(),
        "unobstructed patrol finished"
    );

    let looping = first_entry
        .into_par_iter()
        .map(|(candidate, entry)| {
            causes_loop(grid, entry, candidate).map(|looping| looping.then_some(candidate))
        })
        .collect::<Result<Vec<_>, PatrolError>>()?;
    let looping: FxHashSet<_> = looping.into_iter().flatten().collect();
    debug!(count = looping.len(), "loop-inducing obstructions found");
    Ok(looping)
}

#[cfg(test)]
mod tests {
    use super::*;

    use indoc::indoc;

    const SAMPLE: &str = indoc! {"
        ....#.....
        .........#
        ..........
        ..#.......
        .......#..
        ..........
        .#..^.....
        ........#.
        #.........
        ......#...
    "};

    #[test]
    fn test_parse() -> Result<(), PatrolError> {
        let grid: Grid = SAMPLE.parse()?;
        assert_eq!((grid.rows(), grid.cols()), (10, 10));
        assert_eq!(grid.cell(Position::new(0, 4)), Some(Cell::Obstruction));
        assert_eq!(grid.cell(Position::new(6, 4)), Some(Cell::AgentStart));
        assert_eq!(grid.cell(Position::new(0, 0)), Some(Cell::Empty));
        assert_eq!(grid.cell(Position::new(0, 10)), None);
        assert_eq!(grid.locate_agent()?, Position::new(6, 4));

        let crlf: Grid = ".#\r\n^.\r\n\r\n".parse()?;
        assert_eq!((crlf.rows(), crlf.cols()), (2, 2));
        Ok(())
    }

    #[test]
    fn test_malformed() {
        assert_eq!(
            "".parse::<Grid>(),
            Err(PatrolError::MalformedGrid(GridDefect::Empty))
        );
        assert_eq!(
            "\n\n".parse::<Grid>(),
            Err(PatrolError::MalformedGrid(GridDefect::Empty))
        );
        assert_eq!(
            "..^\n..\n".parse::<Grid>(),
            Err(PatrolError::MalformedGrid(GridDefect::Ragged {
                row: 1,
                expected: 3,
                found: 2,
            }))
        );
        assert_eq!(
            "..^\n.x.\n".parse::<Grid>(),
            Err(PatrolError::MalformedGrid(GridDefect::UnknownCell {
                position: Position::new(1, 1),
                found: 'x',
            }))
        );
    }

    #[test]
    fn test_agent_not_found() -> Result<(), PatrolError> {
        let grid: Grid = "..#\n...\n".parse()?;
        assert_eq!(grid.locate_agent(), Err(PatrolError::AgentNotFound));
        assert_eq!(distinct_cells(&grid), Err(PatrolError::AgentNotFound));
        assert_eq!(loop_obstructions(&grid), Err(PatrolError::AgentNotFound));
        Ok(())
    }

    #[test]
    fn test_step_turns_through_obstructions() -> Result<(), PatrolError> {
        let grid: Grid = indoc! {"
            .#.
            .^#
            ...
        "}
        .parse()?;
        let start = Agent::new(grid.locate_agent()?);
        assert_eq!(
            step(&grid, start)?,
            Step::Moved(Agent {
                position: Position::new(2, 1),
                heading: Heading::Down,
            })
        );
        assert_eq!(
            step(&grid, Agent::new(Position::new(0, 0)))?,
            Step::Escaped
        );
        Ok(())
    }

    #[test]
    fn test_straight_walk() -> Result<(), PatrolError> {
        let grid: Grid = indoc! {"
            ...
            ...
            ...
            .^.
        "}
        .parse()?;
        assert_eq!(distinct_cells(&grid)?, 4);
        assert!(loop_obstructions(&grid)?.is_empty());
        Ok(())
    }

    #[test]
    fn test_non_square_grid() -> Result<(), PatrolError> {
        let grid: Grid = indoc! {"
            ...#.
            ...^.
        "}
        .parse()?;
        let trace = trace(&grid, Agent::new(grid.locate_agent()?))?;
        assert_eq!(trace.outcome, Outcome::Escaped);
        let expected: FxHashSet<_> = [Position::new(1, 3), Position::new(1, 4)]
            .into_iter()
            .collect();
        assert_eq!(trace.visited, expected);
        Ok(())
    }

    #[test]
    fn test_idempotent() -> Result<(), PatrolError> {
        let grid: Grid = SAMPLE.parse()?;
        assert_eq!(distinct_cells(&grid)?, distinct_cells(&grid)?);
        Ok(())
    }

    #[test]
    fn test_deadlock() -> Result<(), PatrolError> {
        let boxed: Grid = indoc! {"
            .#.
            #^#
            .#.
        "}
        .parse()?;
        assert_eq!(
            distinct_cells(&boxed),
            Err(PatrolError::DeadlockCell(Position::new(1, 1)))
        );

        // The only way out is down; blocking it during the search boxes the agent in.
        let open_below: Grid = indoc! {"
            .#.
            #^#
            ...
        "}
        .parse()?;
        assert_eq!(distinct_cells(&open_below)?, 2);
        assert_eq!(
            loop_obstructions(&open_below),
            Err(PatrolError::DeadlockCell(Position::new(1, 1)))
        );
        Ok(())
    }

    #[test]
    fn test_sample() -> Result<(), PatrolError> {
        let grid: Grid = SAMPLE.parse()?;
        assert_eq!(distinct_cells(&grid)?, 41);

        let looping = loop_obstructions(&grid)?;
        let expected: FxHashSet<_> = [(6, 3), (7, 6), (7, 7), (8, 1), (8, 3), (9, 7)]
            .into_iter()
            .map(|(row, col)| Position::new(row, col))
            .collect();
        assert_eq!(looping, expected);
        Ok(())
    }

    #[test]
    fn test_loop_candidates() -> Result<(), PatrolError> {
        let grid: Grid = SAMPLE.parse()?;
        let start = Agent::new(grid.locate_agent()?);
        let bound = grid.rows() * grid.cols() * 4;
        for candidate in loop_obstructions(&grid)? {
            assert_ne!(candidate, start.position);
            assert_ne!(grid.cell(candidate), Some(Cell::Obstruction));
            // Replaying from the very beginning agrees with the resumed trial.
            assert!(causes_loop(&grid, start, candidate)?);
            let trace = trace(&grid.with_obstruction(candidate), start)?;
            assert_eq!(trace.outcome, Outcome::Looping);
            assert!(trace.steps <= bound);
        }
        Ok(())
    }
}
