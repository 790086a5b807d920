//! Pointer tracking for tile drags.
//!
//! Hosts report raw pointer press/motion/release; the tracker resolves which
//! tile is being moved and turns motion into `DragIntent` deltas, so the
//! puzzle never sees toolkit events.

use gatekeeper_common::{Point, Quadrant};
use serde::{Deserialize, Serialize};

use super::PuzzleState;

/// Move `tile` by (`dx`, `dy`) board units
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct DragIntent {
    pub tile: Quadrant,
    pub dx: i32,
    pub dy: i32,
}

impl DragIntent {
    pub fn new(tile: Quadrant, dx: i32, dy: i32) -> Self {
        Self { tile, dx, dy }
    }

    pub fn apply(&self, puzzle: &mut PuzzleState) {
        puzzle.apply_drag(self.tile, self.dx, self.dy);
    }
}

/// Tile grabbed by the pointer and where the pointer was last seen
#[derive(Debug, Default, Clone)]
pub struct DragTracker {
    active: Option<(Quadrant, Point)>,
}

impl DragTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Grab the topmost tile under the pointer. Pressing empty board grabs nothing.
    pub fn press(&mut self, puzzle: &PuzzleState, at: Point) -> Option<Quadrant> {
        self.active = puzzle.tile_at(at).map(|tile| (tile, at));
        self.active.map(|(tile, _)| tile)
    }

    /// Delta since the previous pointer position, if a tile is held
    pub fn motion(&mut self, at: Point) -> Option<DragIntent> {
        let (tile, last) = self.active.as_mut()?;
        let intent = DragIntent::new(*tile, at.x - last.x, at.y - last.y);
        *last = at;
        Some(intent)
    }

    /// Drop the held tile
    pub fn release(&mut self) -> Option<Quadrant> {
        self.active.take().map(|(tile, _)| tile)
    }

    pub fn held(&self) -> Option<Quadrant> {
        self.active.map(|(tile, _)| tile)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::captcha::puzzle::tests::{drag_to, seeded_puzzle};

    #[test]
    fn test_press_move_release() {
        let mut puzzle = seeded_puzzle(200, 200, 1);
        drag_to(&mut puzzle, Quadrant::TopRight, Point::new(150, 150));

        let mut tracker = DragTracker::new();
        assert_eq!(tracker.press(&puzzle, Point::new(160, 170)), Some(Quadrant::TopRight));

        let first = tracker.motion(Point::new(150, 160)).unwrap();
        assert_eq!(first, DragIntent::new(Quadrant::TopRight, -10, -10));
        first.apply(&mut puzzle);

        let second = tracker.motion(Point::new(155, 140)).unwrap();
        assert_eq!((second.dx, second.dy), (5, -20));
        second.apply(&mut puzzle);

        assert_eq!(puzzle.tile(Quadrant::TopRight).position(), Point::new(145, 120));
        assert_eq!(tracker.release(), Some(Quadrant::TopRight));
        assert!(tracker.motion(Point::new(0, 0)).is_none());
    }

    #[test]
    fn test_press_on_empty_board() {
        let mut puzzle = seeded_puzzle(200, 200, 2);
        for quadrant in Quadrant::ALL {
            drag_to(&mut puzzle, quadrant, Point::new(0, 0));
        }

        let mut tracker = DragTracker::new();
        assert_eq!(tracker.press(&puzzle, Point::new(250, 250)), None);
        assert_eq!(tracker.held(), None);
        assert!(tracker.motion(Point::new(260, 260)).is_none());
    }
}
