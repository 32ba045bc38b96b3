use thiserror::Error;

use crate::volume::VolumeId;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Selection {
    All,
    /// Zero-based index into the enumerated volumes.
    One(usize),
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SelectionError {
    #[error("'{0}' is not a number")]
    NotANumber(String),
    #[error("{choice} is not between 0 and {count}")]
    OutOfRange { choice: i64, count: usize },
}

/// Parses a menu answer where `0` means every volume and `1..=count` picks one.
pub fn parse_selection(input: &str, count: usize) -> Result<Selection, SelectionError> {
    let trimmed = input.trim();
    let choice: i64 = trimmed
        .parse()
        .map_err(|_| SelectionError::NotANumber(trimmed.to_string()))?;

    if choice == 0 {
        return Ok(Selection::All);
    }
    match usize::try_from(choice) {
        Ok(n) if n <= count => Ok(Selection::One(n - 1)),
        _ => Err(SelectionError::OutOfRange { choice, count }),
    }
}

impl Selection {
    pub fn pick(&self, volumes: &[VolumeId]) -> Vec<VolumeId> {
        match self {
            Selection::All => volumes.to_vec(),
            Selection::One(index) => volumes.get(*index).cloned().into_iter().collect(),
        }
    }
}
