//! Input events and the key bindings of the histogram views.

use crate::marker::Axis;

/// A single key press, with the pointer position in data coordinates when
/// the pointer is over the plot.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InputEvent {
    pub key: char,
    pub x: Option<f64>,
    pub y: Option<f64>,
}

impl InputEvent {
    /// Key pressed with the pointer at `(x, y)`.
    #[must_use]
    pub fn at(key: char, x: f64, y: f64) -> Self {
        Self {
            key,
            x: Some(x),
            y: Some(y),
        }
    }

    /// Key pressed with the pointer outside the plot.
    #[must_use]
    pub fn outside(key: char) -> Self {
        Self {
            key,
            x: None,
            y: None,
        }
    }
}

/// Commands of a 1-D view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Command {
    PlaceRegion,
    PlaceBackground,
    FitBackground,
    PlacePeak,
    ClearAll,
    FitPeak,
}

impl Command {
    /// Maps a key to its command.
    #[must_use]
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'r' => Some(Command::PlaceRegion),
            'b' => Some(Command::PlaceBackground),
            'B' => Some(Command::FitBackground),
            'p' => Some(Command::PlacePeak),
            '-' => Some(Command::ClearAll),
            'f' => Some(Command::FitPeak),
            _ => None,
        }
    }
}

/// Commands of a 2-D view.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatrixCommand {
    /// Place a bound line for the projection onto `Axis`.
    PlaceLine(Axis),
    /// Show the projection onto `Axis`.
    ShowProjection(Axis),
}

impl MatrixCommand {
    /// Maps a key to its command.
    #[must_use]
    pub fn from_key(key: char) -> Option<Self> {
        match key {
            'x' => Some(MatrixCommand::PlaceLine(Axis::X)),
            'y' => Some(MatrixCommand::PlaceLine(Axis::Y)),
            'X' => Some(MatrixCommand::ShowProjection(Axis::X)),
            'Y' => Some(MatrixCommand::ShowProjection(Axis::Y)),
            _ => None,
        }
    }
}
