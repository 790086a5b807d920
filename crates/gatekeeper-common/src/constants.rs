//! Shared constants for Puzzle Gate components.

/// Default configuration file path
pub const DEFAULT_CONFIG_PATH: &str = "config/gatekeeper.toml";

/// Default puzzle source image
pub const DEFAULT_IMAGE_PATH: &str = "assets/puzzle.png";

/// Puzzle board width in display units
pub const BOARD_WIDTH: u32 = 300;

/// Puzzle board height in display units
pub const BOARD_HEIGHT: u32 = 300;

/// Maximum per-axis distance between a tile and its origin cell that still
/// counts as correctly placed (inclusive)
pub const PLACEMENT_TOLERANCE: u32 = 20;

/// Failed captcha checks before the login form locks
pub const MAX_FAILED_ATTEMPTS: u32 = 3;

/// Lockout duration in seconds (10 minutes)
pub const LOCK_DURATION_SECS: u64 = 600;

/// How often the host re-checks an active lockout (seconds)
pub const LOCK_POLL_INTERVAL_SECS: u64 = 1;

/// Number of tiles a puzzle is cut into (2x2 grid)
pub const TILE_COUNT: usize = 4;
