//! Board rendering for hosts that draw the puzzle as a single image.

use base64::{Engine, engine::general_purpose::STANDARD};
use image::{ImageFormat, Rgba, RgbaImage, imageops};
use imageproc::drawing::draw_hollow_rect_mut;
use imageproc::rect::Rect;
use std::io::Cursor;

use super::{Board, CaptchaError, PuzzleState, Tile};

const BACKGROUND: Rgba<u8> = Rgba([255, 255, 255, 255]);
const TILE_BORDER: Rgba<u8> = Rgba([40, 40, 40, 255]);

/// Draw the tiles at their current positions, in draw order, on a blank board.
/// Anything past the board edge is clipped.
pub fn render_board(puzzle: &PuzzleState) -> RgbaImage {
    let board = puzzle.board();
    let mut canvas = RgbaImage::from_pixel(board.width, board.height, BACKGROUND);

    for tile in puzzle.tiles() {
        if !overlaps(tile, board) {
            continue;
        }
        let at = tile.position();

        imageops::overlay(
            &mut canvas,
            &tile.image().to_rgba8(),
            i64::from(at.x),
            i64::from(at.y),
        );
        if let Some(outline) = outline(tile) {
            draw_hollow_rect_mut(&mut canvas, outline, TILE_BORDER);
        }
    }

    canvas
}

/// Whether any part of the tile lies on the board. Computed in i64 because
/// undragged positions may sit anywhere in the i32 range.
fn overlaps(tile: &Tile, board: Board) -> bool {
    let at = tile.position();
    let (width, height) = tile.size();
    let (left, top) = (i64::from(at.x), i64::from(at.y));

    width > 0
        && height > 0
        && left < i64::from(board.width)
        && top < i64::from(board.height)
        && left + i64::from(width) > 0
        && top + i64::from(height) > 0
}

/// Tile border, if its far edges are representable as i32 coordinates
fn outline(tile: &Tile) -> Option<Rect> {
    let at = tile.position();
    let (width, height) = tile.size();
    let right = i64::from(at.x) + i64::from(width) - 1;
    let bottom = i64::from(at.y) + i64::from(height) - 1;
    i32::try_from(right).ok()?;
    i32::try_from(bottom).ok()?;
    Some(Rect::at(at.x, at.y).of_size(width, height))
}

/// PNG-encode a rendered board
pub fn encode_png(board: &RgbaImage) -> Result<Vec<u8>, CaptchaError> {
    let mut bytes = Vec::new();
    board.write_to(&mut Cursor::new(&mut bytes), ImageFormat::Png)?;
    Ok(bytes)
}

/// `data:` URI for hosts that load images by URL
pub fn data_uri(png: &[u8]) -> String {
    format!("data:image/png;base64,{}", STANDARD.encode(png))
}
