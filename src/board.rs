//! Board state as sent by the client.

/// Stone color on the Go board.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Color {
    Black,
    White,
}

impl Color {
    /// The color word GTP `play`/`genmove` commands expect.
    pub fn gtp_name(self) -> &'static str {
        match self {
            Color::Black => "black",
            Color::White => "white",
        }
    }

    /// Parse a client-supplied color label ("B", "W", "black", "white").
    pub fn from_label(label: &str) -> Option<Self> {
        match label.trim().to_ascii_lowercase().as_str() {
            "b" | "black" => Some(Color::Black),
            "w" | "white" => Some(Color::White),
            _ => None,
        }
    }

}

/// A position as a grid of optional stones, row-major.
#[derive(Debug, Clone)]
pub struct Board {
    cells: Vec<Vec<Option<Color>>>,
}

impl Board {
    /// Build a board from the wire grid. "B" is a black stone, "W" a white
    /// stone, any other cell content is an empty point.
    pub fn from_grid(grid: &[Vec<String>]) -> Self {
        let cells = grid
            .iter()
            .map(|row| {
                row.iter()
                    .map(|cell| match cell.as_str() {
                        "B" => Some(Color::Black),
                        "W" => Some(Color::White),
                        _ => None,
                    })
                    .collect()
            })
            .collect();
        Self { cells }
    }

    /// Iterate the stones in row-major order as (row, col, color).
    pub fn stones(&self) -> impl Iterator<Item = (usize, usize, Color)> + '_ {
        self.cells.iter().enumerate().flat_map(|(row, cells)| {
            cells
                .iter()
                .enumerate()
                .filter_map(move |(col, cell)| cell.map(|color| (row, col, color)))
        })
    }

    /// Whose turn it is, assuming Black opened and play alternated: equal
    /// stone counts mean Black is to move, otherwise White.
    pub fn side_to_move(&self) -> Color {
        let black = self.stones().filter(|&(_, _, c)| c == Color::Black).count();
        let white = self.stones().filter(|&(_, _, c)| c == Color::White).count();
        if black > white {
            Color::White
        } else {
            Color::Black
        }
    }
}
