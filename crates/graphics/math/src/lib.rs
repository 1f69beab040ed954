//! Small geometry primitives shared by the layout engine.
//!
//! Kept free of any CSS or DOM knowledge so it can be reused by the
//! painter and by test code without pulling in the rest of the engine.

use std::ops::{Add, AddAssign, Div, Mul, Sub, SubAssign};

/// A 2D point or displacement.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Vec2D<T> {
    pub x: T,
    pub y: T,
}

impl<T> Vec2D<T> {
    #[must_use]
    pub const fn new(x: T, y: T) -> Self {
        Self { x, y }
    }
}

impl<T: Add<Output = T>> Add for Vec2D<T> {
    type Output = Self;

    fn add(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x + rhs.x,
            y: self.y + rhs.y,
        }
    }
}

impl<T: Sub<Output = T>> Sub for Vec2D<T> {
    type Output = Self;

    fn sub(self, rhs: Self) -> Self::Output {
        Self {
            x: self.x - rhs.x,
            y: self.y - rhs.y,
        }
    }
}

impl<T: AddAssign> AddAssign for Vec2D<T> {
    fn add_assign(&mut self, rhs: Self) {
        self.x += rhs.x;
        self.y += rhs.y;
    }
}

impl<T: SubAssign> SubAssign for Vec2D<T> {
    fn sub_assign(&mut self, rhs: Self) {
        self.x -= rhs.x;
        self.y -= rhs.y;
    }
}

/// An axis-aligned rectangle, stored as its corners rather than
/// origin+size so that degenerate (negative-area) rectangles during
/// intermediate layout steps don't need special-casing.
#[derive(Clone, Copy, Debug, PartialEq, Default)]
pub struct Rectangle<T> {
    pub top_left: Vec2D<T>,
    pub bottom_right: Vec2D<T>,
}

impl<T: Copy> Rectangle<T> {
    #[must_use]
    pub const fn from_corners(top_left: Vec2D<T>, bottom_right: Vec2D<T>) -> Self {
        Self {
            top_left,
            bottom_right,
        }
    }
}

impl<T> Rectangle<T>
where
    T: Copy + Sub<Output = T>,
{
    #[must_use]
    pub fn width(&self) -> T {
        self.bottom_right.x - self.top_left.x
    }

    #[must_use]
    pub fn height(&self) -> T {
        self.bottom_right.y - self.top_left.y
    }
}

impl<T> Rectangle<T>
where
    T: Copy + Add<Output = T>,
{
    #[must_use]
    pub fn from_origin_and_size(origin: Vec2D<T>, size: Vec2D<T>) -> Self {
        Self {
            top_left: origin,
            bottom_right: origin + size,
        }
    }
}

impl<T> Rectangle<T>
where
    T: Copy + PartialOrd,
{
    /// Whether `y` falls within the rectangle's vertical span, `top_left.y..bottom_right.y`.
    #[must_use]
    pub fn contains_y(&self, y: T) -> bool {
        self.top_left.y <= y && y < self.bottom_right.y
    }

    /// Whether this rectangle and `other` overlap on the horizontal axis.
    #[must_use]
    pub fn overlaps_horizontally(&self, other: &Self) -> bool {
        self.top_left.x < other.bottom_right.x && other.top_left.x < self.bottom_right.x
    }
}

impl<T: Mul<f32, Output = T> + Copy> Vec2D<T> {
    #[must_use]
    pub fn scale(self, factor: f32) -> Self {
        Self {
            x: self.x * factor,
            y: self.y * factor,
        }
    }
}

impl<T> Div<f32> for Vec2D<T>
where
    T: Div<f32, Output = T>,
{
    type Output = Self;

    fn div(self, rhs: f32) -> Self::Output {
        Self {
            x: self.x / rhs,
            y: self.y / rhs,
        }
    }
}
