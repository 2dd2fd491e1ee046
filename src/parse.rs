use std::str::FromStr;

use anyhow::{bail, ensure, Context, Result};

use crate::{Door, Pos, Puzzle};

type IndexMap<K, V> = indexmap::IndexMap<K, V, fxhash::FxBuildHasher>;

/// Door and button symbols, pair by pair.
pub(crate) const GATE_SYMBOLS: [(char, char); 3] = [('1', '!'), ('2', '"'), ('3', '#')];

impl FromStr for Puzzle {
    type Err = anyhow::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let mut puzzle = Puzzle::default();
        let mut gates = IndexMap::<char, Pos>::default();

        for (line, y) in s.lines().zip(0..) {
            for (ch, x) in line.chars().zip(0..) {
                let pos = Pos::new(x, y);
                match ch {
                    ' ' | '.' => {}
                    'x' => puzzle.walls.push(pos),
                    'b' => puzzle.balls.push(pos),
                    'g' => puzzle.goals.push(pos),
                    's' => puzzle.stones.push(pos),
                    'o' => puzzle.boxes.push(pos),
                    'd' => {
                        puzzle.boxes.push(pos);
                        puzzle.goals.push(pos);
                    }
                    '*' => {
                        puzzle.balls.push(pos);
                        puzzle.goals.push(pos);
                    }
                    '1' | '2' | '3' | '!' | '"' | '#' => {
                        ensure!(gates.insert(ch, pos).is_none(), "Multiple {ch:?} cells");
                    }
                    _ => bail!("Invalid cell {ch:?} at line {}, column {}", y + 1, x + 1),
                }
                puzzle.width = puzzle.width.max(x + 1);
            }
            puzzle.height = y + 1;
        }

        for (door, button) in GATE_SYMBOLS {
            match (gates.get(&door), gates.get(&button)) {
                (Some(&door), Some(&button)) => puzzle.doors.push(Door { door, button }),
                (None, None) => {}
                (Some(_), None) => bail!("Door {door:?} has no button {button:?}"),
                (None, Some(_)) => bail!("Button {button:?} has no door {door:?}"),
            }
        }

        puzzle.validate()?;
        Ok(puzzle)
    }
}

impl Puzzle {
    /// Check that every cell is in bounds and that walls, balls, stones and
    /// boxes never share a cell.
    pub fn validate(&self) -> Result<()> {
        ensure!(
            self.height >= 0 && self.width >= 0,
            "Negative size {}x{}",
            self.width,
            self.height,
        );

        let named = [
            ("Wall", &self.walls),
            ("Ball", &self.balls),
            ("Goal", &self.goals),
            ("Stone", &self.stones),
            ("Box", &self.boxes),
        ];
        for (name, cells) in named {
            if let Some(pos) = cells.iter().find(|&&pos| !self.contains(pos)) {
                bail!("{name} at {pos} is out of bounds");
            }
        }

        let mut solid = [&self.walls, &self.balls, &self.stones, &self.boxes]
            .into_iter()
            .flatten()
            .copied()
            .collect::<Vec<_>>();
        solid.sort_unstable();
        if let Some(w) = solid.windows(2).find(|w| w[0] == w[1]) {
            bail!("Overlapping objects at {}", w[0]);
        }

        let mut door_cells = Vec::with_capacity(self.doors.len());
        for (&Door { door, button }, i) in self.doors.iter().zip(1..) {
            (|| {
                ensure!(self.contains(door), "Door at {door} is out of bounds");
                ensure!(self.contains(button), "Button at {button} is out of bounds");
                ensure!(!self.walls.contains(&door), "Door at {door} is a wall");
                ensure!(!self.walls.contains(&button), "Button at {button} is a wall");
                ensure!(!door_cells.contains(&door), "Door at {door} is shared");
                Ok(())
            })()
            .with_context(|| format!("Invalid door {i}"))?;
            door_cells.push(door);
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_symbols() {
        let puzzle = "xbgso\nd* 1!\n.2\"3#".parse::<Puzzle>().unwrap();
        assert_eq!(puzzle.width, 5);
        assert_eq!(puzzle.height, 3);
        assert_eq!(puzzle.walls, [Pos::new(0, 0)]);
        assert_eq!(puzzle.balls, [Pos::new(1, 0), Pos::new(1, 1)]);
        assert_eq!(puzzle.goals, [Pos::new(2, 0), Pos::new(0, 1), Pos::new(1, 1)]);
        assert_eq!(puzzle.stones, [Pos::new(3, 0)]);
        assert_eq!(puzzle.boxes, [Pos::new(4, 0), Pos::new(0, 1)]);
        assert_eq!(
            puzzle.doors,
            [
                Door {
                    door: Pos::new(3, 1),
                    button: Pos::new(4, 1)
                },
                Door {
                    door: Pos::new(1, 2),
                    button: Pos::new(2, 2)
                },
                Door {
                    door: Pos::new(3, 2),
                    button: Pos::new(4, 2)
                },
            ]
        );
    }

    #[test]
    fn ragged_rows() {
        let puzzle = "b\n...g\n".parse::<Puzzle>().unwrap();
        assert_eq!((puzzle.width, puzzle.height), (4, 2));
        assert!(puzzle.contains(Pos::new(3, 0)));
        assert!(!puzzle.contains(Pos::new(4, 0)));
    }

    #[test]
    fn reject_unknown_symbol() {
        let err = "xbq".parse::<Puzzle>().unwrap_err();
        assert_eq!(err.to_string(), "Invalid cell 'q' at line 1, column 3");
    }

    #[test]
    fn reject_unpaired_gates() {
        let err = "b1".parse::<Puzzle>().unwrap_err();
        assert_eq!(err.to_string(), "Door '1' has no button '!'");
        let err = "b\"".parse::<Puzzle>().unwrap_err();
        assert_eq!(err.to_string(), "Button '\"' has no door '2'");
        let err = "1!1".parse::<Puzzle>().unwrap_err();
        assert_eq!(err.to_string(), "Multiple '1' cells");
    }

    #[test]
    fn validate_hand_built() {
        let mut puzzle = Puzzle {
            height: 2,
            width: 2,
            balls: vec![Pos::new(0, 0)],
            ..Puzzle::default()
        };
        assert!(puzzle.validate().is_ok());

        puzzle.stones.push(Pos::new(0, 0));
        let err = puzzle.validate().unwrap_err();
        assert_eq!(err.to_string(), "Overlapping objects at (0,0)");
        puzzle.stones.clear();

        puzzle.boxes.push(Pos::new(2, 0));
        let err = puzzle.validate().unwrap_err();
        assert_eq!(err.to_string(), "Box at (2,0) is out of bounds");
        puzzle.boxes.clear();

        puzzle.walls.push(Pos::new(1, 1));
        puzzle.doors.push(Door {
            door: Pos::new(1, 1),
            button: Pos::new(1, 0),
        });
        let err = puzzle.validate().unwrap_err();
        assert_eq!(err.to_string(), "Invalid door 1");
        assert_eq!(format!("{err:#}"), "Invalid door 1: Door at (1,1) is a wall");
    }
}
