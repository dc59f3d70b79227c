//! Shape parameters shared by every grid of an enumeration.

use super::error::{Error, Result};

/// Main characteristics of a grid: its dimensions and the highest value a
/// cell may carry. All three fit in a byte, which the stream formats rely
/// on.
#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub struct Base {
    /// Number of rows.
    pub height: u8,
    /// Number of columns.
    pub width: u8,
    /// Highest cell value.
    pub maximum: u8,
}

impl Base {
    /// Constructor. Checks the supported domain: at least one row and one
    /// column, and a maximum of at least 3.
    ///
    /// # Errors
    ///
    /// Returns [`Error::InvalidBase`] when one of the parameters is outside
    /// its domain.
    pub const fn new(height: u8, width: u8, maximum: u8) -> Result<Self> {
        if height < 1 || width < 1 || maximum < 3 {
            Err(Error::InvalidBase {
                height,
                width,
                maximum,
            })
        } else {
            Ok(Self {
                height,
                width,
                maximum,
            })
        }
    }

    /// Returns the number of cells of a grid with this base.
    #[must_use]
    pub const fn cells(&self) -> usize {
        self.height as usize * self.width as usize
    }

    /// (row, col) → index.
    #[must_use]
    pub const fn index(&self, row: usize, col: usize) -> usize {
        row * self.width as usize + col
    }

    /// index → (row, col).
    #[must_use]
    pub const fn position(&self, index: usize) -> (usize, usize) {
        (index / self.width as usize, index % self.width as usize)
    }

    /// Dual base whose height and width are swapped.
    #[must_use]
    pub const fn transposed(&self) -> Self {
        Self {
            height: self.width,
            width: self.height,
            maximum: self.maximum,
        }
    }
}
