//! Screen-space primitives shared by the selection observer, the toolbar and
//! presentation adapters. Units are whatever the adapter uses (pixels for a
//! browser-like host, character cells for the terminal front end).

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Point {
    pub x: f32,
    pub y: f32,
}

impl Point {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Size {
    pub width: f32,
    pub height: f32,
}

impl Size {
    pub fn new(width: f32, height: f32) -> Self {
        Self { width, height }
    }
}

/// Axis-aligned rectangle with its origin at the top-left corner.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct Rect {
    pub origin: Point,
    pub size: Size,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            origin: Point::new(x, y),
            size: Size::new(width, height),
        }
    }

    pub fn left(&self) -> f32 {
        self.origin.x
    }

    pub fn top(&self) -> f32 {
        self.origin.y
    }

    pub fn right(&self) -> f32 {
        self.origin.x + self.size.width
    }

    pub fn bottom(&self) -> f32 {
        self.origin.y + self.size.height
    }

    pub fn top_right(&self) -> Point {
        Point::new(self.right(), self.top())
    }

    /// Half-open containment: the right and bottom edges are outside.
    pub fn contains(&self, point: Point) -> bool {
        point.x >= self.left()
            && point.x < self.right()
            && point.y >= self.top()
            && point.y < self.bottom()
    }

    /// Moves a rectangle of `size` whose origin would be `origin` so that it
    /// lies inside `self`. When `size` is larger than `self` along an axis the
    /// result is pinned to `self`'s origin on that axis.
    pub fn clamp_origin(&self, origin: Point, size: Size) -> Point {
        let max_x = (self.right() - size.width).max(self.left());
        let max_y = (self.bottom() - size.height).max(self.top());
        Point::new(
            origin.x.clamp(self.left(), max_x),
            origin.y.clamp(self.top(), max_y),
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_contains_is_half_open() {
        let rect = Rect::new(0.0, 0.0, 10.0, 5.0);
        assert!(rect.contains(Point::new(0.0, 0.0)));
        assert!(rect.contains(Point::new(9.5, 4.5)));
        assert!(!rect.contains(Point::new(10.0, 2.0)));
        assert!(!rect.contains(Point::new(2.0, 5.0)));
    }

    #[test]
    fn test_clamp_origin_keeps_box_inside() {
        let bounds = Rect::new(10.0, 10.0, 100.0, 50.0);
        let size = Size::new(30.0, 20.0);

        assert_eq!(
            bounds.clamp_origin(Point::new(95.0, 0.0), size),
            Point::new(80.0, 10.0)
        );
        assert_eq!(
            bounds.clamp_origin(Point::new(20.0, 30.0), size),
            Point::new(20.0, 30.0)
        );
    }

    #[test]
    fn test_clamp_origin_pins_oversized_box() {
        let bounds = Rect::new(0.0, 0.0, 20.0, 5.0);
        let origin = bounds.clamp_origin(Point::new(15.0, 3.0), Size::new(40.0, 10.0));
        assert_eq!(origin, Point::new(0.0, 0.0));
    }
}
