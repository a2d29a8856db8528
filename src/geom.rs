//! Geometric primitives, and the handful of formulas the sweep needs.

use crate::num::{eq_eps, gt_eps, lt_eps, CheapOrderedFloat};

/// A two-dimensional point.
///
/// Points are sorted by `y` and then by `x`, for the convenience of our sweep-line
/// algorithm (which moves in increasing `y`).
#[derive(Clone, Copy, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct Point {
    /// Horizontal component.
    ///
    /// Although it isn't important for functionality, the documentation and method naming
    /// assumes that larger values are to the right.
    pub x: f64,
    /// Vertical coordinate.
    ///
    /// Although it isn't important for functionality, the documentation and method naming
    /// assumes that larger values are down (as they are on a canvas).
    pub y: f64,
}

impl Ord for Point {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        (
            CheapOrderedFloat::from(self.y),
            CheapOrderedFloat::from(self.x),
        )
            .cmp(&(
                CheapOrderedFloat::from(other.y),
                CheapOrderedFloat::from(other.x),
            ))
    }
}

impl PartialOrd for Point {
    #[inline(always)]
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Eq for Point {}

impl std::fmt::Debug for Point {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({:?}, {:?})", self.x, self.y)
    }
}

impl Point {
    /// Create a new point.
    pub fn new(x: f64, y: f64) -> Self {
        Point { x, y }
    }

    /// The Euclidean distance between two points.
    pub fn distance(&self, other: &Point) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    /// Are these points the same, up to our fixed tolerance?
    pub fn approx_eq(&self, other: &Point) -> bool {
        eq_eps(self.x, other.x) && eq_eps(self.y, other.y)
    }

    /// Convert to a `kurbo` point.
    pub fn to_kurbo(self) -> kurbo::Point {
        kurbo::Point::new(self.x, self.y)
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

impl From<kurbo::Point> for Point {
    fn from(p: kurbo::Point) -> Self {
        Self { x: p.x, y: p.y }
    }
}

/// An axis-aligned rectangle that the diagram gets clipped to.
///
/// `yt` is the top edge and `yb` the bottom edge; since `y` grows downwards,
/// a valid box has `xl < xr` and `yt < yb`.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct BoundingBox {
    /// The left edge.
    pub xl: f64,
    /// The right edge.
    pub xr: f64,
    /// The top edge.
    pub yt: f64,
    /// The bottom edge.
    pub yb: f64,
}

impl BoundingBox {
    /// Creates a new bounding box from its four sides.
    pub fn new(xl: f64, xr: f64, yt: f64, yb: f64) -> Self {
        Self { xl, xr, yt, yb }
    }

    /// Does this box contain `p`, allowing for our fixed tolerance?
    pub fn contains(&self, p: &Point) -> bool {
        !lt_eps(p.x, self.xl)
            && !gt_eps(p.x, self.xr)
            && !lt_eps(p.y, self.yt)
            && !gt_eps(p.y, self.yb)
    }

    /// Convert to a `kurbo` rectangle.
    pub fn to_kurbo(self) -> kurbo::Rect {
        kurbo::Rect::new(self.xl, self.yt, self.xr, self.yb)
    }

    pub(crate) fn coords(&self) -> [f64; 4] {
        [self.xl, self.xr, self.yt, self.yb]
    }
}

impl From<kurbo::Rect> for BoundingBox {
    fn from(rect: kurbo::Rect) -> Self {
        let rect = rect.abs();
        Self {
            xl: rect.x0,
            xr: rect.x1,
            yt: rect.y0,
            yb: rect.y1,
        }
    }
}

/// The horizontal position where two parabolic arcs meet.
///
/// Both arcs share the directrix `y = directrix`; `right` is the focus of the
/// arc on the right of the breakpoint, and `left` is the focus of its left
/// neighbor. Of the (up to) two intersections, this returns the one where
/// `left`'s arc is on the left.
pub fn breakpoint_x(left: Point, right: Point, directrix: f64) -> f64 {
    // A focus on the directrix is a degenerate parabola: a vertical ray
    // shooting up from the focus.
    if eq_eps(right.y, directrix) {
        return right.x;
    }
    if eq_eps(left.y, directrix) {
        return left.x;
    }
    if eq_eps(left.y, right.y) {
        return (left.x + right.x) / 2.0;
    }

    let p_right = right.y - directrix;
    let p_left = left.y - directrix;
    let hl = left.x - right.x;
    let aby2 = 1.0 / p_right - 1.0 / p_left;
    let b = hl / p_left;
    let c = hl * hl / (-2.0 * p_left) - left.y + p_left / 2.0 + right.y - p_right / 2.0;
    let discriminant = b * b - 2.0 * aby2 * c;
    // Rounding can push a tangency slightly negative.
    (-b + discriminant.max(0.0).sqrt()) / aby2 + right.x
}

/// The circle through three points.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Circumcircle {
    /// The center of the circle.
    pub center: Point,
    /// The radius of the circle.
    pub radius: f64,
    /// Twice the signed area of the triangle `a, b, c`.
    ///
    /// This is negative when `a -> b -> c` turns clockwise as seen on the
    /// screen (with `y` pointing down), which is exactly when the middle arc
    /// of three consecutive arcs is going to get squeezed out. When it's zero
    /// (the points are collinear) the center and radius are meaningless.
    pub determinant: f64,
}

/// Computes the circle through `a`, `b` and `c`.
pub fn circumcircle(a: Point, b: Point, c: Point) -> Circumcircle {
    let ax = a.x - b.x;
    let ay = a.y - b.y;
    let cx = c.x - b.x;
    let cy = c.y - b.y;
    let d = 2.0 * (ax * cy - ay * cx);
    let ha = ax * ax + ay * ay;
    let hc = cx * cx + cy * cy;
    let x = (cy * ha - ay * hc) / d;
    let y = (ax * hc - cx * ha) / d;
    Circumcircle {
        center: Point::new(x + b.x, y + b.y),
        radius: x.hypot(y),
        determinant: d,
    }
}

/// The result of clipping a segment to a rectangle.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct ClippedSegment {
    /// The new start point. If it wasn't clipped, this is exactly the old one.
    pub start: Point,
    /// The new end point. If it wasn't clipped, this is exactly the old one.
    pub end: Point,
    /// Did either end move?
    pub clipped: bool,
}

/// Clips the segment from `a` to `b` to a rectangle, Liang-Barsky style.
///
/// Returns `None` if no part of the segment is inside the rectangle.
pub fn clip_segment(a: Point, b: Point, bbox: &BoundingBox) -> Option<ClippedSegment> {
    let dx = b.x - a.x;
    let dy = b.y - a.y;
    let mut t0 = 0.0f64;
    let mut t1 = 1.0f64;

    // Each boundary is a pair (p, q) such that the segment is inside the
    // boundary wherever p * t <= q.
    let boundaries = [
        (-dx, a.x - bbox.xl),
        (dx, bbox.xr - a.x),
        (-dy, a.y - bbox.yt),
        (dy, bbox.yb - a.y),
    ];
    for (p, q) in boundaries {
        if p == 0.0 {
            // Parallel to this boundary: entirely in or entirely out.
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            // Entering.
            if r > t1 {
                return None;
            }
            t0 = t0.max(r);
        } else {
            // Leaving.
            if r < t0 {
                return None;
            }
            t1 = t1.min(r);
        }
    }

    let start = if t0 > 0.0 {
        Point::new(a.x + t0 * dx, a.y + t0 * dy)
    } else {
        a
    };
    let end = if t1 < 1.0 {
        Point::new(a.x + t1 * dx, a.y + t1 * dy)
    } else {
        b
    };
    Some(ClippedSegment {
        start,
        end,
        clipped: t0 > 0.0 || t1 < 1.0,
    })
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use proptest::prelude::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    fn bbox() -> BoundingBox {
        BoundingBox::new(0.0, 400.0, 0.0, 400.0)
    }

    // The point on the parabola with this focus and directrix, at horizontal position x.
    fn parabola_y(focus: Point, directrix: f64, x: f64) -> f64 {
        let dx = x - focus.x;
        (dx * dx + focus.y * focus.y - directrix * directrix) / (2.0 * (focus.y - directrix))
    }

    #[test]
    fn breakpoint_of_level_sites_is_midpoint() {
        assert_eq!(breakpoint_x(p(0.0, 10.0), p(20.0, 10.0), 30.0), 10.0);
    }

    #[test]
    fn breakpoint_on_directrix() {
        assert_eq!(breakpoint_x(p(0.0, 10.0), p(20.0, 30.0), 30.0), 20.0);
        assert_eq!(breakpoint_x(p(0.0, 30.0), p(20.0, 10.0), 30.0), 0.0);
    }

    #[test]
    fn breakpoint_picks_the_right_root() {
        // The higher site's arc is wider, so it appears on both sides of the
        // lower site's arc. The two breakpoints are mirror images.
        let high = p(0.0, 0.0);
        let low = p(0.0, 10.0);
        let x_left = breakpoint_x(high, low, 20.0);
        let x_right = breakpoint_x(low, high, 20.0);
        assert!(x_left < 0.0);
        assert!((x_left + x_right).abs() < 1e-9);
    }

    #[test]
    fn circumcircle_of_equilateral_triangle() {
        let c = circumcircle(p(0.0, 0.0), p(5.0, 8.660254037844386), p(10.0, 0.0));
        assert!((c.center.x - 5.0).abs() < 1e-9);
        assert!((c.center.y - 2.886751345948129).abs() < 1e-9);
        assert!((c.radius - 5.773502691896258).abs() < 1e-9);
        // Seen on the screen (y down), a -> b -> c turns counter-clockwise.
        assert!(c.determinant > 0.0);

        let flipped = circumcircle(p(10.0, 0.0), p(5.0, 8.660254037844386), p(0.0, 0.0));
        assert!(flipped.determinant < 0.0);
    }

    #[test]
    fn clip_inside_is_untouched() {
        let a = p(10.0, 10.0);
        let b = p(20.0, 30.0);
        let clipped = clip_segment(a, b, &bbox()).unwrap();
        assert_eq!(clipped.start, a);
        assert_eq!(clipped.end, b);
        assert!(!clipped.clipped);
    }

    #[test]
    fn clip_crossing() {
        let clipped = clip_segment(p(-100.0, 200.0), p(500.0, 200.0), &bbox()).unwrap();
        assert!(clipped.start.approx_eq(&p(0.0, 200.0)));
        assert!(clipped.end.approx_eq(&p(400.0, 200.0)));
        assert!(clipped.clipped);
    }

    #[test]
    fn clip_outside() {
        assert!(clip_segment(p(-100.0, -10.0), p(500.0, -10.0), &bbox()).is_none());
        assert!(clip_segment(p(-100.0, 0.0), p(0.0, -100.0), &bbox()).is_none());
        assert!(clip_segment(p(500.0, 10.0), p(500.0, 20.0), &bbox()).is_none());
    }

    proptest! {
    #[test]
    fn breakpoint_is_on_both_parabolas(
        lx in -100.0f64..100.0,
        ly in -100.0f64..0.0,
        rx in -100.0f64..100.0,
        ry in -100.0f64..0.0,
        directrix in 1.0f64..100.0,
    ) {
        prop_assume!((ly - ry).abs() > 1.0);
        let left = p(lx, ly);
        let right = p(rx, ry);
        let x = breakpoint_x(left, right, directrix);
        let y_left = parabola_y(left, directrix, x);
        let y_right = parabola_y(right, directrix, x);
        prop_assert!((y_left - y_right).abs() < 1e-6 * (1.0 + y_left.abs()));
    }

    #[test]
    fn clipped_segments_are_inside(
        ax in -800.0f64..800.0,
        ay in -800.0f64..800.0,
        bx in -800.0f64..800.0,
        by in -800.0f64..800.0,
    ) {
        if let Some(clipped) = clip_segment(p(ax, ay), p(bx, by), &bbox()) {
            prop_assert!(bbox().contains(&clipped.start));
            prop_assert!(bbox().contains(&clipped.end));
        }
    }
    }
}
