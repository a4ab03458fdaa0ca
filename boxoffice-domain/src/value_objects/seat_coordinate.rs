// Seat coordinate value object

use std::fmt;

use serde::{Deserialize, Serialize};

/// One addressable (row, column) position inside a seated section.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct SeatCoordinate {
    #[serde(rename = "fila", alias = "row")]
    pub row: u32,
    #[serde(rename = "columna", alias = "column")]
    pub column: u32,
}

impl SeatCoordinate {
    pub fn new(row: u32, column: u32) -> Self {
        Self { row, column }
    }
}

impl fmt::Display for SeatCoordinate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.row, self.column)
    }
}
