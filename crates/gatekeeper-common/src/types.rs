//! Core types shared across Puzzle Gate components.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// A position on the puzzle board, in display units.
///
/// Signed because tiles may be dragged past the top/left board edge.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: i32,
    pub y: i32,
}

impl Point {
    pub const ORIGIN: Point = Point { x: 0, y: 0 };

    pub fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    /// Shift by a delta
    pub fn offset(self, dx: i32, dy: i32) -> Self {
        Self {
            x: self.x.saturating_add(dx),
            y: self.y.saturating_add(dy),
        }
    }

    /// Per-axis absolute distance to another point
    pub fn abs_diff(self, other: Point) -> (u32, u32) {
        (self.x.abs_diff(other.x), self.y.abs_diff(other.y))
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

/// One cell of the 2x2 puzzle grid.
///
/// Also serves as the stable tile identifier carried by drag events.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Quadrant {
    TopLeft,
    TopRight,
    BottomLeft,
    BottomRight,
}

impl Quadrant {
    /// All quadrants in cut (and draw) order
    pub const ALL: [Quadrant; 4] = [
        Quadrant::TopLeft,
        Quadrant::TopRight,
        Quadrant::BottomLeft,
        Quadrant::BottomRight,
    ];

    /// Position in `ALL`
    pub fn index(self) -> usize {
        match self {
            Self::TopLeft => 0,
            Self::TopRight => 1,
            Self::BottomLeft => 2,
            Self::BottomRight => 3,
        }
    }

    pub fn is_right(self) -> bool {
        matches!(self, Self::TopRight | Self::BottomRight)
    }

    pub fn is_bottom(self) -> bool {
        matches!(self, Self::BottomLeft | Self::BottomRight)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::TopLeft => "top-left",
            Self::TopRight => "top-right",
            Self::BottomLeft => "bottom-left",
            Self::BottomRight => "bottom-right",
        }
    }
}

impl fmt::Display for Quadrant {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Quadrant {
    type Err = String;

    /// Accepts the long names, `tl`/`tr`/`bl`/`br`, or the index `0`-`3`
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "top-left" | "tl" | "0" => Ok(Self::TopLeft),
            "top-right" | "tr" | "1" => Ok(Self::TopRight),
            "bottom-left" | "bl" | "2" => Ok(Self::BottomLeft),
            "bottom-right" | "br" | "3" => Ok(Self::BottomRight),
            other => Err(format!("unknown tile '{}'", other)),
        }
    }
}

/// User role, one per account table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Moderator,
    Organizer,
    Participant,
}

impl Role {
    /// Lookup order when authenticating: the first table with a match wins
    pub const LOOKUP_ORDER: [Role; 3] = [Role::Moderator, Role::Organizer, Role::Participant];

    /// The screen opened after a successful login
    pub fn landing_view(&self) -> LandingView {
        match self {
            Self::Organizer => LandingView::OrganizerDashboard,
            Self::Moderator | Self::Participant => LandingView::EventList,
        }
    }

    /// Moderators are greeted before the event list opens
    pub fn welcome_notice(&self) -> Option<&'static str> {
        match self {
            Self::Moderator => Some("Welcome, moderator!"),
            _ => None,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            Self::Moderator => "Moderator",
            Self::Organizer => "Organizer",
            Self::Participant => "Participant",
        };
        f.write_str(label)
    }
}

/// Screen the host opens after authentication
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LandingView {
    OrganizerDashboard,
    EventList,
}

/// Login gate state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(tag = "state", rename_all = "lowercase")]
pub enum GateStatus {
    /// Submissions and captcha checks are accepted
    #[default]
    Open,
    /// Too many failed captcha checks; everything is refused until `until`
    Locked { until: DateTime<Utc> },
}

impl GateStatus {
    pub fn is_locked(&self) -> bool {
        matches!(self, Self::Locked { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_point_offset_allows_negative() {
        let p = Point::new(5, 5).offset(-20, 3);
        assert_eq!(p, Point::new(-15, 8));
        assert_eq!(p.abs_diff(Point::ORIGIN), (15, 8));
    }

    #[test]
    fn test_quadrant_parse() {
        assert_eq!("tl".parse::<Quadrant>(), Ok(Quadrant::TopLeft));
        assert_eq!("Bottom-Right".parse::<Quadrant>(), Ok(Quadrant::BottomRight));
        assert_eq!("2".parse::<Quadrant>(), Ok(Quadrant::BottomLeft));
        assert!("middle".parse::<Quadrant>().is_err());
    }

    #[test]
    fn test_quadrant_index_matches_all() {
        for (i, q) in Quadrant::ALL.iter().enumerate() {
            assert_eq!(q.index(), i);
        }
    }

    #[test]
    fn test_landing_views() {
        assert_eq!(Role::Organizer.landing_view(), LandingView::OrganizerDashboard);
        assert_eq!(Role::Moderator.landing_view(), LandingView::EventList);
        assert_eq!(Role::Participant.landing_view(), LandingView::EventList);
        assert!(Role::Moderator.welcome_notice().is_some());
        assert!(Role::Participant.welcome_notice().is_none());
    }
}
