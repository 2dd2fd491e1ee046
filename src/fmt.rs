use std::fmt;

use crate::parse::GATE_SYMBOLS;
use crate::{contains, Board, Cell, Direction, Move, Pos};

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({},{})", self.x, self.y)
    }
}

impl fmt::Display for Direction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Direction::Right => f.write_str("RIGHT"),
            Direction::Left => f.write_str("LEFT"),
            Direction::Up => f.write_str("UP"),
            Direction::Down => f.write_str("DOWN"),
        }
    }
}

impl fmt::Display for Move {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.direction() {
            Some(dir) => write!(f, "{} {dir} -> {}", self.from, self.to),
            None => write!(f, "{} -> {}", self.from, self.to),
        }
    }
}

/// Renders in the parser's symbols, with `.` for empty cells.
impl fmt::Display for Board {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let placement = &self.placement;
        let layout = &self.layout;
        for (pos, cell) in layout.cells() {
            if pos.x == 0 && pos.y != 0 {
                f.write_str("\n")?;
            }
            let is_goal = layout.goals.contains(&pos);
            let ch = if contains(&placement.balls, pos) {
                if is_goal {
                    '*'
                } else {
                    'b'
                }
            } else if contains(&placement.boxes, pos) {
                if is_goal {
                    'd'
                } else {
                    'o'
                }
            } else if contains(&placement.stones, pos) {
                's'
            } else if let Cell::Door(id) = cell {
                gate_symbol(id as usize).0
            } else if cell == Cell::Wall {
                'x'
            } else if is_goal {
                'g'
            } else if let Some(id) = layout.gates.iter().position(|gate| gate.button == pos) {
                gate_symbol(id).1
            } else {
                '.'
            };
            write!(f, "{ch}")?;
        }
        Ok(())
    }
}

fn gate_symbol(id: usize) -> (char, char) {
    GATE_SYMBOLS.get(id).copied().unwrap_or(('?', '?'))
}
