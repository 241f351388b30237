//! Rectangles, sides and split directions.
//!
//! All coordinates are in the tile manager's window space, with `(0, 0)`
//! at the top left.

use serde::{Deserialize, Serialize};
use std::fmt;

/// An axis-aligned rectangle. Contains `x..x + width` and `y..y + height`.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self { x, y, width, height }
    }

    pub fn right(&self) -> i32 {
        self.x + self.width
    }

    pub fn bottom(&self) -> i32 {
        self.y + self.height
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    pub fn is_empty(&self) -> bool {
        self.width <= 0 || self.height <= 0
    }
}

impl fmt::Display for Rect {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {}) {}x{}", self.x, self.y, self.width, self.height)
    }
}

/// Preferred size reported by the host for a widget.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Size {
    pub width: i32,
    pub height: i32,
}

impl Size {
    pub const fn new(width: i32, height: i32) -> Self {
        Self { width, height }
    }
}

/// Layout direction of a split: children side by side, or stacked.
///
/// Stored in layout JSON as `0` (horizontal) or `1` (vertical).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u8", try_from = "u8")]
pub enum Direction {
    Horizontal,
    Vertical,
}

impl Direction {
    /// Extent of `rect` along this direction.
    pub fn length(self, rect: Rect) -> i32 {
        match self {
            Direction::Horizontal => rect.width,
            Direction::Vertical => rect.height,
        }
    }

    /// Coordinate of `rect`'s leading edge along this direction.
    pub fn start(self, rect: Rect) -> i32 {
        match self {
            Direction::Horizontal => rect.x,
            Direction::Vertical => rect.y,
        }
    }

    /// Places a child of `len` pixels at `pos` inside `outer`, followed by a
    /// sizer of `sizer` pixels. Returns `(child, sizer)`.
    pub fn place(self, outer: Rect, pos: i32, len: i32, sizer: i32) -> (Rect, Rect) {
        match self {
            Direction::Horizontal => (
                Rect::new(outer.x + pos, outer.y, len, outer.height),
                Rect::new(outer.x + pos + len, outer.y, sizer, outer.height),
            ),
            Direction::Vertical => (
                Rect::new(outer.x, outer.y + pos, outer.width, len),
                Rect::new(outer.x, outer.y + pos + len, outer.width, sizer),
            ),
        }
    }
}

impl From<Direction> for u8 {
    fn from(direction: Direction) -> Self {
        match direction {
            Direction::Horizontal => 0,
            Direction::Vertical => 1,
        }
    }
}

impl TryFrom<u8> for Direction {
    type Error = String;

    fn try_from(value: u8) -> Result<Self, Self::Error> {
        match value {
            0 => Ok(Direction::Horizontal),
            1 => Ok(Direction::Vertical),
            other => Err(format!("unknown split direction {}", other)),
        }
    }
}

/// One of the four window edges.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Side {
    Left,
    Right,
    Top,
    Bottom,
}

impl Side {
    pub const ALL: [Side; 4] = [Side::Left, Side::Right, Side::Top, Side::Bottom];

    /// Direction of the split that puts something on this side.
    pub fn direction(self) -> Direction {
        match self {
            Side::Left | Side::Right => Direction::Horizontal,
            Side::Top | Side::Bottom => Direction::Vertical,
        }
    }

    /// Left and top insert before the target; right and bottom after it.
    pub fn is_leading(self) -> bool {
        matches!(self, Side::Left | Side::Top)
    }

    /// Integer code used by the layout JSON.
    pub fn code(self) -> u8 {
        match self {
            Side::Left => 0,
            Side::Right => 1,
            Side::Top => 2,
            Side::Bottom => 3,
        }
    }

    pub fn from_code(code: u8) -> Option<Self> {
        Side::ALL.into_iter().find(|side| side.code() == code)
    }
}

impl fmt::Display for Side {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Side::Left => "left",
            Side::Right => "right",
            Side::Top => "top",
            Side::Bottom => "bottom",
        };
        f.write_str(name)
    }
}

/// Serde helper writing a [`Side`] as its integer code.
pub(crate) mod side_code {
    use super::Side;
    use serde::{Deserialize, Deserializer, Serializer, de::Error};

    pub fn serialize<S: Serializer>(side: &Side, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.serialize_u8(side.code())
    }

    pub fn deserialize<'de, D: Deserializer<'de>>(deserializer: D) -> Result<Side, D::Error> {
        let code = u8::deserialize(deserializer)?;
        Side::from_code(code).ok_or_else(|| D::Error::custom(format!("unknown sidebar side {}", code)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rect_contains_is_half_open() {
        let r = Rect::new(10, 20, 5, 5);
        assert!(r.contains(10, 20));
        assert!(r.contains(14, 24));
        assert!(!r.contains(15, 24));
        assert!(!r.contains(14, 25));
    }

    #[test]
    fn test_place_horizontal_and_vertical() {
        let outer = Rect::new(100, 50, 400, 300);
        let (child, sizer) = Direction::Horizontal.place(outer, 20, 80, 5);
        assert_eq!(child, Rect::new(120, 50, 80, 300));
        assert_eq!(sizer, Rect::new(200, 50, 5, 300));

        let (child, sizer) = Direction::Vertical.place(outer, 20, 80, 5);
        assert_eq!(child, Rect::new(100, 70, 400, 80));
        assert_eq!(sizer, Rect::new(100, 150, 400, 5));
    }

    #[test]
    fn test_side_properties() {
        assert_eq!(Side::Top.direction(), Direction::Vertical);
        assert_eq!(Side::Right.direction(), Direction::Horizontal);
        assert!(Side::Left.is_leading());
        assert!(!Side::Bottom.is_leading());
        for side in Side::ALL {
            assert_eq!(Side::from_code(side.code()), Some(side));
        }
        assert_eq!(Side::from_code(9), None);
    }

    #[test]
    fn test_direction_serializes_as_integer() {
        assert_eq!(serde_json::to_string(&Direction::Vertical).unwrap(), "1");
        let d: Direction = serde_json::from_str("0").unwrap();
        assert_eq!(d, Direction::Horizontal);
        assert!(serde_json::from_str::<Direction>("4").is_err());
    }
}
