use std::hash::{Hash, Hasher};
use std::ops::Index;
use std::sync::Arc;

use arrayvec::ArrayVec;

mod fmt;
mod parse;
pub mod solve;
mod visited;

pub use visited::VisitedSet;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Direction {
    Right = 0,
    Left,
    Up,
    Down,
}

impl Direction {
    pub const ALL: [Self; 4] = [Self::Right, Self::Left, Self::Up, Self::Down];

    fn delta(self) -> (i32, i32) {
        const DELTAS: [(i32, i32); 4] = [(1, 0), (-1, 0), (0, -1), (0, 1)];
        DELTAS[self as usize]
    }

    /// The neighbor of `pos` in this direction. May be out of bounds.
    pub fn apply(self, pos: Pos) -> Pos {
        let (dx, dy) = self.delta();
        Pos::new(pos.x + dx, pos.y + dy)
    }

    pub fn back(self, pos: Pos) -> Pos {
        self.reversed().apply(pos)
    }

    pub fn reversed(self) -> Self {
        match self {
            Direction::Right => Direction::Left,
            Direction::Left => Direction::Right,
            Direction::Up => Direction::Down,
            Direction::Down => Direction::Up,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Move {
    pub from: Pos,
    pub to: Pos,
}

impl Move {
    pub fn direction(&self) -> Option<Direction> {
        let dx = (self.to.x - self.from.x).signum();
        let dy = (self.to.y - self.from.y).signum();
        Some(match (dx, dy) {
            (1, 0) => Direction::Right,
            (-1, 0) => Direction::Left,
            (0, -1) => Direction::Up,
            (0, 1) => Direction::Down,
            _ => return None,
        })
    }
}

/// Everything that happened in one round: the mover, and the box it pushed, if any.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Step {
    pub mover: Move,
    pub pushed: Option<Move>,
}

impl Step {
    pub fn moves(&self) -> ArrayVec<Move, 2> {
        let mut moves = ArrayVec::new();
        moves.push(self.mover);
        moves.extend(self.pushed);
        moves
    }
}

/// A door cell, passable only while something blocking sits on its button.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Door {
    pub door: Pos,
    pub button: Pos,
}

/// Plain description of a puzzle, as produced by the parser.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Puzzle {
    pub height: i32,
    pub width: i32,
    pub walls: Vec<Pos>,
    pub balls: Vec<Pos>,
    pub goals: Vec<Pos>,
    pub stones: Vec<Pos>,
    pub boxes: Vec<Pos>,
    pub doors: Vec<Door>,
}

impl Puzzle {
    pub fn contains(&self, pos: Pos) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq, Eq, Hash)]
enum Cell {
    #[default]
    Empty,
    Wall,
    Door(u8),
}

/// The part of a board that never changes during a search.
#[derive(Debug)]
struct Layout {
    height: i32,
    width: i32,
    grid: Box<[Cell]>,
    gates: Box<[Door]>,
    goals: Box<[Pos]>,
}

impl Index<Pos> for Layout {
    type Output = Cell;
    fn index(&self, pos: Pos) -> &Self::Output {
        let idx = pos.y as usize * self.width as usize + pos.x as usize;
        &self.grid[idx]
    }
}

impl Layout {
    fn contains(&self, pos: Pos) -> bool {
        (0..self.width).contains(&pos.x) && (0..self.height).contains(&pos.y)
    }

    fn cells(&self) -> impl Iterator<Item = (Pos, Cell)> + '_ {
        let idx_iter = std::iter::successors(Some(Pos::new(0, 0)), |&Pos { x, y }| {
            Some(if x + 1 < self.width {
                Pos::new(x + 1, y)
            } else {
                Pos::new(0, y + 1)
            })
        });
        idx_iter.zip(self.grid.iter().copied())
    }
}

/// The movable part of a board. Two boards with equal placements are the same
/// search node, whatever their history.
///
/// Every set is a sorted slice behind an `Arc`, so a transition only allocates
/// the sets it touches.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Placement {
    balls: Arc<[Pos]>,
    stones: Arc<[Pos]>,
    boxes: Arc<[Pos]>,
    /// Balls and the stones which have not moved yet.
    movables: Arc<[Pos]>,
}

impl Placement {
    pub fn balls(&self) -> &[Pos] {
        &self.balls
    }

    pub fn stones(&self) -> &[Pos] {
        &self.stones
    }

    pub fn boxes(&self) -> &[Pos] {
        &self.boxes
    }

    pub fn movables(&self) -> &[Pos] {
        &self.movables
    }

    pub fn is_occupied(&self, pos: Pos) -> bool {
        contains(&self.balls, pos) || contains(&self.stones, pos) || contains(&self.boxes, pos)
    }
}

fn contains(set: &[Pos], pos: Pos) -> bool {
    set.binary_search(&pos).is_ok()
}

fn sorted(set: &[Pos]) -> Arc<[Pos]> {
    let mut set = set.to_vec();
    set.sort_unstable();
    set.into()
}

/// Copy of `set` with `from` removed and `to` inserted, if any.
fn relocate(set: &[Pos], from: Pos, to: Option<Pos>) -> Arc<[Pos]> {
    let mut set = set.iter().copied().filter(|&pos| pos != from).collect::<Vec<_>>();
    if let Some(to) = to {
        let idx = set.binary_search(&to).unwrap_or_else(|idx| idx);
        set.insert(idx, to);
    }
    set.into()
}

#[derive(Debug)]
struct History {
    step: Step,
    len: usize,
    prev: Option<Arc<History>>,
}

/// A puzzle snapshot: the shared layout, the current placement and the steps
/// which led here.
#[derive(Debug, Clone)]
pub struct Board {
    layout: Arc<Layout>,
    placement: Placement,
    history: Option<Arc<History>>,
}

impl PartialEq for Board {
    fn eq(&self, other: &Self) -> bool {
        self.placement == other.placement
    }
}

impl Eq for Board {}

impl Hash for Board {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.placement.hash(state);
    }
}

impl Board {
    /// Build the initial board.
    ///
    /// # Panics
    /// If the puzzle is inconsistent, see [`Puzzle::validate`].
    pub fn new(puzzle: &Puzzle) -> Self {
        if let Err(err) = puzzle.validate() {
            panic!("Invalid puzzle: {err:#}");
        }

        let mut grid = vec![Cell::Empty; (puzzle.height * puzzle.width) as usize];
        let idx = |pos: Pos| pos.y as usize * puzzle.width as usize + pos.x as usize;
        for &wall in &puzzle.walls {
            grid[idx(wall)] = Cell::Wall;
        }
        for (door, id) in puzzle.doors.iter().zip(0..) {
            grid[idx(door.door)] = Cell::Door(id);
        }

        let layout = Layout {
            height: puzzle.height,
            width: puzzle.width,
            grid: grid.into(),
            gates: puzzle.doors.clone().into(),
            goals: puzzle.goals.clone().into(),
        };
        let movables = [&puzzle.balls[..], &puzzle.stones[..]].concat();
        let placement = Placement {
            balls: sorted(&puzzle.balls),
            stones: sorted(&puzzle.stones),
            boxes: sorted(&puzzle.boxes),
            movables: sorted(&movables),
        };
        Self {
            layout: Arc::new(layout),
            placement,
            history: None,
        }
    }

    pub fn height(&self) -> i32 {
        self.layout.height
    }

    pub fn width(&self) -> i32 {
        self.layout.width
    }

    pub fn placement(&self) -> &Placement {
        &self.placement
    }

    /// Whether every goal is covered by a ball. Boxes and stones don't count.
    pub fn has_won(&self) -> bool {
        self.layout
            .goals
            .iter()
            .all(|&goal| contains(&self.placement.balls, goal))
    }

    /// Number of steps taken since the initial board.
    pub fn move_count(&self) -> usize {
        self.history.as_ref().map_or(0, |h| h.len)
    }

    pub fn last_step(&self) -> Option<Step> {
        self.history.as_ref().map(|h| h.step)
    }

    pub fn steps(&self) -> Vec<Step> {
        let mut steps = std::iter::successors(self.history.as_deref(), |h| h.prev.as_deref())
            .map(|h| h.step)
            .collect::<Vec<_>>();
        steps.reverse();
        steps
    }

    /// The flattened move sequence, pushed boxes right after their pusher.
    pub fn moves(&self) -> Vec<Move> {
        self.steps().iter().flat_map(Step::moves).collect()
    }

    /// All boards reachable in one step, without deduplication.
    pub fn successors(&self) -> Vec<Board> {
        self.placement
            .movables
            .iter()
            .flat_map(|&origin| Direction::ALL.map(|dir| self.plan(origin, dir)))
            .flatten()
            .map(|step| self.apply(step))
            .collect()
    }

    /// Successors whose placement was not seen before, marking them as seen.
    pub fn step(&self, visited: &VisitedSet) -> Vec<Board> {
        self.successors()
            .into_iter()
            .filter(|board| visited.insert(board.placement.clone()))
            .collect()
    }

    /// Perform `step` if it is legal on this board.
    pub fn play(&self, step: Step) -> Option<Board> {
        if !contains(&self.placement.movables, step.mover.from) {
            return None;
        }
        let dir = step.mover.direction()?;
        let planned = self.plan(step.mover.from, dir)?;
        (planned == step).then(|| self.apply(planned))
    }

    fn is_free(&self, pos: Pos) -> bool {
        if !self.layout.contains(pos) || self.placement.is_occupied(pos) {
            return false;
        }
        match self.layout[pos] {
            Cell::Empty => true,
            Cell::Wall => false,
            Cell::Door(id) => {
                let button = self.layout.gates[id as usize].button;
                self.placement.is_occupied(button)
            }
        }
    }

    /// The last free cell before the first obstruction.
    fn slide(&self, from: Pos, dir: Direction) -> Pos {
        let mut pos = from;
        loop {
            let next = dir.apply(pos);
            if !self.is_free(next) {
                return pos;
            }
            pos = next;
        }
    }

    fn plan(&self, origin: Pos, dir: Direction) -> Option<Step> {
        let dest = self.slide(origin, dir);
        let mut step = Step {
            mover: Move { from: origin, to: dest },
            pushed: None,
        };

        // A box right after the stop is pushed along, if it can move at all.
        let next = dir.apply(dest);
        if contains(&self.placement.boxes, next) {
            let box_dest = self.slide(next, dir);
            if box_dest != next {
                step = Step {
                    mover: Move {
                        from: origin,
                        to: dir.back(box_dest),
                    },
                    pushed: Some(Move {
                        from: next,
                        to: box_dest,
                    }),
                };
            }
        }

        (step.mover.from != step.mover.to).then_some(step)
    }

    fn apply(&self, step: Step) -> Board {
        let Move { from, to } = step.mover;
        let cur = &self.placement;
        let mut placement = cur.clone();
        if contains(&cur.stones, from) {
            // Stones freeze where they stop.
            placement.stones = relocate(&cur.stones, from, Some(to));
            placement.movables = relocate(&cur.movables, from, None);
        } else {
            placement.balls = relocate(&cur.balls, from, Some(to));
            placement.movables = relocate(&cur.movables, from, Some(to));
        }
        if let Some(Move { from, to }) = step.pushed {
            placement.boxes = relocate(&cur.boxes, from, Some(to));
        }

        let history = History {
            step,
            len: self.move_count() + 1,
            prev: self.history.clone(),
        };
        Board {
            layout: Arc::clone(&self.layout),
            placement,
            history: Some(Arc::new(history)),
        }
    }
}
