//! Puzzle generation and placement verification.

use gatekeeper_common::constants::{BOARD_HEIGHT, BOARD_WIDTH, PLACEMENT_TOLERANCE, TILE_COUNT};
use gatekeeper_common::{Point, Quadrant};
use image::{DynamicImage, GenericImageView};
use rand::Rng;
use std::fmt;

use super::{CaptchaError, ImageSource};

/// Drawing surface the tiles are scattered over
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Board {
    pub width: u32,
    pub height: u32,
}

impl Board {
    pub fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }

    /// Largest top-left coordinate that keeps a tile of this size on the board.
    /// Tiles bigger than the board are pinned to 0 on that axis.
    pub fn placement_limit(&self, tile_width: u32, tile_height: u32) -> (u32, u32) {
        (
            self.width.saturating_sub(tile_width),
            self.height.saturating_sub(tile_height),
        )
    }
}

impl Default for Board {
    fn default() -> Self {
        Self::new(BOARD_WIDTH, BOARD_HEIGHT)
    }
}

/// Geometry and tolerance a puzzle is built with
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PuzzleSettings {
    pub board: Board,
    /// Max per-axis distance from the origin cell, inclusive
    pub tolerance: u32,
}

impl Default for PuzzleSettings {
    fn default() -> Self {
        Self {
            board: Board::default(),
            tolerance: PLACEMENT_TOLERANCE,
        }
    }
}

/// One quarter of the source image
#[derive(Clone)]
pub struct Tile {
    quadrant: Quadrant,
    /// Top-left corner of the cell this tile was cut from (source-image space)
    origin: Point,
    width: u32,
    height: u32,
    position: Point,
    image: DynamicImage,
}

impl Tile {
    pub fn quadrant(&self) -> Quadrant {
        self.quadrant
    }

    pub fn origin(&self) -> Point {
        self.origin
    }

    /// Current top-left corner on the board
    pub fn position(&self) -> Point {
        self.position
    }

    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }

    pub fn image(&self) -> &DynamicImage {
        &self.image
    }

    /// Whether a board point falls on this tile
    pub fn contains(&self, point: Point) -> bool {
        let x = i64::from(point.x) - i64::from(self.position.x);
        let y = i64::from(point.y) - i64::from(self.position.y);
        (0..i64::from(self.width)).contains(&x) && (0..i64::from(self.height)).contains(&y)
    }

    /// Within `tolerance` of the origin on both axes
    pub fn is_in_place(&self, tolerance: u32) -> bool {
        let (dx, dy) = self.position.abs_diff(self.origin);
        dx <= tolerance && dy <= tolerance
    }
}

impl fmt::Debug for Tile {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Tile")
            .field("quadrant", &self.quadrant)
            .field("origin", &self.origin)
            .field("size", &(self.width, self.height))
            .field("position", &self.position)
            .finish()
    }
}

/// A live jigsaw puzzle: four tiles plus the result of the last check
#[derive(Debug, Clone)]
pub struct PuzzleState {
    tiles: [Tile; TILE_COUNT],
    settings: PuzzleSettings,
    solved: bool,
}

impl PuzzleState {
    /// Load the source image and build a freshly shuffled puzzle.
    ///
    /// Fails only when the image cannot be loaded.
    pub fn generate(
        source: &dyn ImageSource,
        settings: PuzzleSettings,
        rng: &mut impl Rng,
    ) -> Result<Self, CaptchaError> {
        let image = source.load()?;
        let puzzle = Self::from_image(&image, settings, rng);

        tracing::debug!(
            source = %source.name(),
            width = image.width(),
            height = image.height(),
            "Generated puzzle"
        );

        Ok(puzzle)
    }

    /// Cut an already-decoded image into four tiles at random positions.
    ///
    /// Width and height are halved with integer division, so odd remainders
    /// end up in the right column and bottom row.
    pub fn from_image(
        image: &DynamicImage,
        settings: PuzzleSettings,
        rng: &mut impl Rng,
    ) -> Self {
        let (width, height) = image.dimensions();
        let half_w = width / 2;
        let half_h = height / 2;

        let tiles = Quadrant::ALL.map(|quadrant| {
            let (x, tile_w) = if quadrant.is_right() {
                (half_w, width - half_w)
            } else {
                (0, half_w)
            };
            let (y, tile_h) = if quadrant.is_bottom() {
                (half_h, height - half_h)
            } else {
                (0, half_h)
            };

            let (max_x, max_y) = settings.board.placement_limit(tile_w, tile_h);
            let position = Point::new(
                rng.random_range(0..=max_x) as i32,
                rng.random_range(0..=max_y) as i32,
            );

            Tile {
                quadrant,
                origin: Point::new(x as i32, y as i32),
                width: tile_w,
                height: tile_h,
                position,
                image: image.crop_imm(x, y, tile_w, tile_h),
            }
        });

        Self {
            tiles,
            settings,
            solved: false,
        }
    }

    /// Throw this puzzle away and cut a new one from the same source.
    pub fn reset(
        &self,
        source: &dyn ImageSource,
        rng: &mut impl Rng,
    ) -> Result<Self, CaptchaError> {
        Self::generate(source, self.settings, rng)
    }

    /// Move a tile by a pointer delta. Positions are not clamped; a tile may
    /// leave the board entirely.
    pub fn apply_drag(&mut self, tile: Quadrant, dx: i32, dy: i32) {
        let tile = &mut self.tiles[tile.index()];
        tile.position = tile.position.offset(dx, dy);

        tracing::trace!(
            tile = %tile.quadrant,
            x = tile.position.x,
            y = tile.position.y,
            "Tile dragged"
        );
    }

    /// Compare every tile against its own origin cell and record the result.
    pub fn check_solved(&mut self) -> bool {
        let tolerance = self.settings.tolerance;
        self.solved = self.tiles.iter().all(|tile| tile.is_in_place(tolerance));
        self.solved
    }

    /// Result of the last `check_solved`
    pub fn is_solved(&self) -> bool {
        self.solved
    }

    /// Topmost tile under a board point. Later tiles are drawn above earlier ones.
    pub fn tile_at(&self, point: Point) -> Option<Quadrant> {
        self.tiles
            .iter()
            .rev()
            .find(|tile| tile.contains(point))
            .map(Tile::quadrant)
    }

    pub fn tile(&self, quadrant: Quadrant) -> &Tile {
        &self.tiles[quadrant.index()]
    }

    /// Tiles in draw order
    pub fn tiles(&self) -> &[Tile; TILE_COUNT] {
        &self.tiles
    }

    pub fn settings(&self) -> PuzzleSettings {
        self.settings
    }

    pub fn board(&self) -> Board {
        self.settings.board
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::captcha::{FileImage, MemoryImage};
    use image::{Rgba, RgbaImage};
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    /// Gradient so every pixel is distinguishable by position
    pub(crate) fn gradient(width: u32, height: u32) -> DynamicImage {
        DynamicImage::ImageRgba8(RgbaImage::from_fn(width, height, |x, y| {
            Rgba([(x % 256) as u8, (y % 256) as u8, 128, 255])
        }))
    }

    pub(crate) fn seeded_puzzle(width: u32, height: u32, seed: u64) -> PuzzleState {
        let mut rng = StdRng::seed_from_u64(seed);
        PuzzleState::from_image(&gradient(width, height), PuzzleSettings::default(), &mut rng)
    }

    /// Drag a tile so its top-left corner lands on `target`
    pub(crate) fn drag_to(puzzle: &mut PuzzleState, quadrant: Quadrant, target: Point) {
        let at = puzzle.tile(quadrant).position();
        puzzle.apply_drag(quadrant, target.x - at.x, target.y - at.y);
    }

    pub(crate) fn assemble(puzzle: &mut PuzzleState) {
        for quadrant in Quadrant::ALL {
            let origin = puzzle.tile(quadrant).origin();
            drag_to(puzzle, quadrant, origin);
        }
    }

    #[test]
    fn test_origins_tile_the_image() {
        for (w, h) in [(200, 200), (201, 151), (2, 2), (3, 7), (640, 480)] {
            let puzzle = seeded_puzzle(w, h, 1);
            let mut covered = vec![0u8; (w * h) as usize];

            for tile in puzzle.tiles() {
                let (tw, th) = tile.size();
                assert_eq!(tile.image().dimensions(), (tw, th));
                for y in 0..th {
                    for x in 0..tw {
                        let px = tile.origin().x as u32 + x;
                        let py = tile.origin().y as u32 + y;
                        covered[(py * w + px) as usize] += 1;
                    }
                }
            }

            assert!(covered.iter().all(|&c| c == 1), "gap or overlap for {}x{}", w, h);
        }
    }

    #[test]
    fn test_odd_remainder_goes_bottom_right() {
        let puzzle = seeded_puzzle(201, 151, 3);
        assert_eq!(puzzle.tile(Quadrant::TopLeft).size(), (100, 75));
        assert_eq!(puzzle.tile(Quadrant::TopRight).size(), (101, 75));
        assert_eq!(puzzle.tile(Quadrant::BottomLeft).size(), (100, 76));
        assert_eq!(puzzle.tile(Quadrant::BottomRight).size(), (101, 76));
        assert_eq!(puzzle.tile(Quadrant::BottomRight).origin(), Point::new(100, 75));
    }

    #[test]
    fn test_tile_pixels_come_from_their_cell() {
        let source = gradient(200, 120);
        let puzzle = seeded_puzzle(200, 120, 9);
        let tile = puzzle.tile(Quadrant::BottomRight);
        assert_eq!(tile.image().get_pixel(0, 0), source.get_pixel(100, 60));
        assert_eq!(tile.image().get_pixel(5, 7), source.get_pixel(105, 67));
    }

    #[test]
    fn test_initial_positions_stay_on_board() {
        for seed in 0..50 {
            let puzzle = seeded_puzzle(200, 200, seed);
            for tile in puzzle.tiles() {
                let p = tile.position();
                assert!((0..=200).contains(&p.x) && (0..=200).contains(&p.y));
            }
        }
    }

    #[test]
    fn test_oversized_tiles_pinned_to_zero() {
        let puzzle = seeded_puzzle(1000, 1000, 4);
        for tile in puzzle.tiles() {
            assert_eq!(tile.position(), Point::ORIGIN);
        }
    }

    #[test]
    fn test_fresh_puzzle_unsolved() {
        for seed in 0..20 {
            let mut puzzle = seeded_puzzle(200, 200, seed);
            assert!(!puzzle.is_solved());
            assert!(!puzzle.check_solved());
        }
    }

    #[test]
    fn test_assembled_puzzle_solved() {
        let mut puzzle = seeded_puzzle(200, 200, 5);
        assemble(&mut puzzle);
        assert!(puzzle.check_solved());
        assert!(puzzle.is_solved());
    }

    #[test]
    fn test_one_misplaced_tile_fails() {
        let mut puzzle = seeded_puzzle(200, 200, 5);
        assemble(&mut puzzle);
        puzzle.apply_drag(Quadrant::BottomLeft, 0, 21);
        assert!(!puzzle.check_solved());
        assert!(!puzzle.is_solved());
    }

    #[test]
    fn test_tolerance_boundary_inclusive() {
        let mut puzzle = seeded_puzzle(200, 200, 6);
        assemble(&mut puzzle);

        puzzle.apply_drag(Quadrant::TopRight, 20, -20);
        assert!(puzzle.check_solved());

        puzzle.apply_drag(Quadrant::TopRight, 1, 0);
        assert!(!puzzle.check_solved());

        puzzle.apply_drag(Quadrant::TopRight, -1, -1);
        assert!(!puzzle.check_solved());
    }

    #[test]
    fn test_tolerance_from_settings() {
        let mut rng = StdRng::seed_from_u64(2);
        let settings = PuzzleSettings {
            tolerance: 0,
            ..PuzzleSettings::default()
        };
        let mut puzzle = PuzzleState::from_image(&gradient(100, 100), settings, &mut rng);
        assemble(&mut puzzle);
        assert!(puzzle.check_solved());
        puzzle.apply_drag(Quadrant::TopLeft, 1, 0);
        assert!(!puzzle.check_solved());
    }

    #[test]
    fn test_drag_off_board_not_clamped() {
        let mut puzzle = seeded_puzzle(200, 200, 7);
        drag_to(&mut puzzle, Quadrant::TopLeft, Point::new(0, 0));
        puzzle.apply_drag(Quadrant::TopLeft, -500, 900);
        assert_eq!(puzzle.tile(Quadrant::TopLeft).position(), Point::new(-500, 900));
    }

    #[test]
    fn test_tiles_bound_to_origin_not_slot() {
        // Swapping the two top tiles fills both slots but each tile is far from its own origin
        let mut puzzle = seeded_puzzle(200, 200, 8);
        assemble(&mut puzzle);
        drag_to(&mut puzzle, Quadrant::TopLeft, Point::new(100, 0));
        drag_to(&mut puzzle, Quadrant::TopRight, Point::new(0, 0));
        assert!(!puzzle.check_solved());
    }

    #[test]
    fn test_tile_at_prefers_topmost() {
        let mut puzzle = seeded_puzzle(200, 200, 10);
        for quadrant in Quadrant::ALL {
            drag_to(&mut puzzle, quadrant, Point::new(10, 10));
        }
        assert_eq!(puzzle.tile_at(Point::new(50, 50)), Some(Quadrant::BottomRight));
        assert_eq!(puzzle.tile_at(Point::new(5, 5)), None);

        drag_to(&mut puzzle, Quadrant::BottomRight, Point::new(200, 200));
        assert_eq!(puzzle.tile_at(Point::new(50, 50)), Some(Quadrant::BottomLeft));
        assert_eq!(puzzle.tile_at(Point::new(299, 299)), Some(Quadrant::BottomRight));
    }

    #[test]
    fn test_reset_reshuffles_and_clears_solved() {
        let source = MemoryImage::new("mem", gradient(200, 200));
        let mut rng = StdRng::seed_from_u64(11);
        let mut puzzle =
            PuzzleState::generate(&source, PuzzleSettings::default(), &mut rng).unwrap();
        assemble(&mut puzzle);
        assert!(puzzle.check_solved());

        let fresh = puzzle.reset(&source, &mut rng).unwrap();
        assert!(!fresh.is_solved());
        assert_eq!(fresh.settings(), puzzle.settings());
        assert_eq!(fresh.tile(Quadrant::TopRight).origin(), Point::new(100, 0));
    }

    #[test]
    fn test_generate_propagates_missing_image() {
        let source = FileImage::new("missing/puzzle.png");
        let mut rng = StdRng::seed_from_u64(0);
        let result = PuzzleState::generate(&source, PuzzleSettings::default(), &mut rng);
        assert!(matches!(result, Err(CaptchaError::ImageUnavailable { .. })));
    }
}
