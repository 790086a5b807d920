//! Jigsaw CAPTCHA: image slicing, tile dragging, and placement verification.
//!
//! A source image is cut into a 2x2 grid. The four tiles are scattered over
//! the board and the user drags them back. The puzzle counts as solved once
//! every tile sits within the placement tolerance of the cell it was cut from.

mod drag;
pub(crate) mod puzzle;
mod render;
mod source;

pub use drag::{DragIntent, DragTracker};
pub use puzzle::{Board, PuzzleSettings, PuzzleState, Tile};
pub use render::{data_uri, encode_png, render_board};
pub use source::{FileImage, ImageSource, MemoryImage};

use thiserror::Error;

/// Errors raised while building or rendering a puzzle
#[derive(Debug, Error)]
pub enum CaptchaError {
    /// The source image could not be read or decoded. Fatal to generate/reset.
    #[error("puzzle image unavailable ({name}): {reason}")]
    ImageUnavailable { name: String, reason: String },

    /// Rendering the board to PNG failed
    #[error("failed to encode board image: {0}")]
    Encode(#[from] image::ImageError),
}
