use serde::{Deserialize, Serialize};

/// Axis-aligned rectangle in global (virtual desktop) pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Rect {
    pub x: i32,
    pub y: i32,
    pub width: u32,
    pub height: u32,
}

impl Rect {
    pub const fn new(x: i32, y: i32, width: u32, height: u32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    /// Exclusive right edge, saturating at `i32::MAX`.
    pub fn right(&self) -> i32 {
        saturate(self.x as i64 + self.width as i64)
    }

    /// Exclusive bottom edge, saturating at `i32::MAX`.
    pub fn bottom(&self) -> i32 {
        saturate(self.y as i64 + self.height as i64)
    }

    pub fn center(&self) -> (i32, i32) {
        (
            saturate(self.x as i64 + (self.width / 2) as i64),
            saturate(self.y as i64 + (self.height / 2) as i64),
        )
    }

    pub fn contains(&self, x: i32, y: i32) -> bool {
        x >= self.x && x < self.right() && y >= self.y && y < self.bottom()
    }

    /// Whether `other` lies entirely inside `self`.
    pub fn encloses(&self, other: &Rect) -> bool {
        other.x >= self.x
            && other.y >= self.y
            && other.right() <= self.right()
            && other.bottom() <= self.bottom()
    }

    /// Grow on every side by `amount` pixels. Saturates instead of wrapping.
    pub fn outset(&self, amount: u32) -> Rect {
        let grow = amount.saturating_mul(2);
        Rect {
            x: saturate(self.x as i64 - amount as i64),
            y: saturate(self.y as i64 - amount as i64),
            width: self.width.saturating_add(grow),
            height: self.height.saturating_add(grow),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.width == 0 || self.height == 0
    }
}

/// Narrow to `i32`, pinning out-of-range values to the nearest bound.
pub fn saturate(value: i64) -> i32 {
    value.clamp(i32::MIN as i64, i32::MAX as i64) as i32
}

/// The user-selected rectangle being monitored.
///
/// Never empty: construction rejects zero width or height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "Rect", into = "Rect")]
pub struct Region(Rect);

impl Region {
    pub fn new(x: i32, y: i32, width: u32, height: u32) -> Option<Self> {
        Self::from_rect(Rect::new(x, y, width, height))
    }

    pub fn from_rect(rect: Rect) -> Option<Self> {
        if rect.is_empty() { None } else { Some(Self(rect)) }
    }

    pub fn rect(&self) -> Rect {
        self.0
    }

    pub fn x(&self) -> i32 {
        self.0.x
    }

    pub fn y(&self) -> i32 {
        self.0.y
    }

    pub fn width(&self) -> u32 {
        self.0.width
    }

    pub fn height(&self) -> u32 {
        self.0.height
    }

    pub fn center(&self) -> (i32, i32) {
        self.0.center()
    }
}

impl TryFrom<Rect> for Region {
    type Error = String;

    fn try_from(rect: Rect) -> Result<Self, Self::Error> {
        Region::from_rect(rect).ok_or_else(|| format!("empty region {}x{}", rect.width, rect.height))
    }
}

impl From<Region> for Rect {
    fn from(region: Region) -> Self {
        region.0
    }
}

/// A physical display as reported by the platform enumeration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Display {
    pub id: u32,
    pub bounds: Rect,
    pub is_primary: bool,
}

impl Display {
    pub fn new(id: u32, bounds: Rect, is_primary: bool) -> Self {
        Self {
            id,
            bounds,
            is_primary,
        }
    }
}
