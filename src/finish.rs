//! Turning the sweep's raw output into a diagram that fits in a box.
//!
//! When the sweep is done, some edges are still missing one or both ends
//! (because they run off to infinity), and others stick out of the bounding
//! box. We first extend every edge to the box and clip it, and then walk
//! around the box to fill in the gaps this leaves in the cells.

use crate::{
    diagram::{EdgeVec, RawCell, RawEdge, RawHalfEdge, SiteVec},
    geom::{clip_segment, BoundingBox, Point},
    num::{eq_eps, gt_eps, lt_eps, neq_eps},
    Error,
};

/// A cell boundary can follow at most this many sides of the bounding box
/// while closing a single gap (all four sides, plus coming back to the first).
const MAX_SIDES: usize = 5;

/// Clips all the edges to `bbox` and closes the cells along its boundary.
pub(crate) fn finish(
    sites: &SiteVec<Point>,
    edges: &mut EdgeVec<RawEdge>,
    cells: &mut SiteVec<RawCell>,
    bbox: &BoundingBox,
) -> Result<(), Error> {
    clip_edges(sites, edges, cells, bbox);
    close_cells(edges, cells, bbox)
}

/// The direction that an unbounded edge runs in, as it heads off to the boundary.
#[derive(Clone, Copy, Debug)]
enum Heading {
    Down,
    Up,
    Right,
    Left,
}

impl Heading {
    /// Is `start` before the bounding box, from the point of view of an edge
    /// going in this direction? If so, the edge really starts at the boundary.
    fn before(self, start: Point, bbox: &BoundingBox) -> bool {
        match self {
            Heading::Down => lt_eps(start.y, bbox.yt),
            Heading::Up => gt_eps(start.y, bbox.yb),
            Heading::Right => lt_eps(start.x, bbox.xl),
            Heading::Left => gt_eps(start.x, bbox.xr),
        }
    }

    /// Is `start` past the far side of the bounding box? If so, the edge misses it.
    fn past(self, start: Point, bbox: &BoundingBox) -> bool {
        match self {
            Heading::Down => !lt_eps(start.y, bbox.yb),
            Heading::Up => !gt_eps(start.y, bbox.yt),
            Heading::Right => !lt_eps(start.x, bbox.xr),
            Heading::Left => !gt_eps(start.x, bbox.xl),
        }
    }
}

/// Gives an edge both of its ends, extending it to the boundary of `bbox`.
///
/// Returns false if the edge doesn't meet the box at all.
fn connect_edge(sites: &SiteVec<Point>, edge: &mut RawEdge, bbox: &BoundingBox) -> bool {
    if edge.vb.is_some() {
        return true;
    }
    let Some(right) = edge.right else {
        return true;
    };

    // The edge lies on the perpendicular bisector of its two sites. Looking
    // along the edge, `left` is on the left; that tells us which way it goes.
    let l = sites[edge.left];
    let r = sites[right];
    let mid = Point::new((l.x + r.x) / 2.0, (l.y + r.y) / 2.0);

    let (heading, from, to) = if eq_eps(l.y, r.y) {
        // A vertical edge.
        if lt_eps(mid.x, bbox.xl) || !lt_eps(mid.x, bbox.xr) {
            return false;
        }
        if l.x > r.x {
            (
                Heading::Down,
                Point::new(mid.x, bbox.yt),
                Point::new(mid.x, bbox.yb),
            )
        } else {
            (
                Heading::Up,
                Point::new(mid.x, bbox.yb),
                Point::new(mid.x, bbox.yt),
            )
        }
    } else {
        // The edge is the line y = slope * x + intercept.
        let slope = (l.x - r.x) / (r.y - l.y);
        let intercept = mid.y - slope * mid.x;
        let at_y = |y: f64| Point::new((y - intercept) / slope, y);
        let at_x = |x: f64| Point::new(x, slope * x + intercept);

        // Steep edges get clipped against the top and bottom, shallow ones
        // against the left and right.
        if !(-1.0..=1.0).contains(&slope) {
            if l.x > r.x {
                (Heading::Down, at_y(bbox.yt), at_y(bbox.yb))
            } else {
                (Heading::Up, at_y(bbox.yb), at_y(bbox.yt))
            }
        } else if l.y < r.y {
            (Heading::Right, at_x(bbox.xl), at_x(bbox.xr))
        } else {
            (Heading::Left, at_x(bbox.xr), at_x(bbox.xl))
        }
    };

    match edge.va {
        Some(start) if heading.past(start, bbox) => return false,
        Some(start) if !heading.before(start, bbox) => {}
        _ => edge.va = Some(from),
    }
    edge.vb = Some(to);
    true
}

/// Clips an edge (which must have both ends) to `bbox`.
///
/// Returns `None` if the edge is entirely outside the box; otherwise,
/// returns whether either end moved.
fn clip_edge(edge: &mut RawEdge, bbox: &BoundingBox) -> Option<bool> {
    let (va, vb) = edge.endpoints()?;
    let clipped = clip_segment(va, vb, bbox)?;
    edge.va = Some(clipped.start);
    edge.vb = Some(clipped.end);
    Some(clipped.clipped)
}

/// Connects every edge to the bounding box and clips it, discarding the
/// ones that end up outside or that shrink to a point.
fn clip_edges(
    sites: &SiteVec<Point>,
    edges: &mut EdgeVec<RawEdge>,
    cells: &mut SiteVec<RawCell>,
    bbox: &BoundingBox,
) {
    for idx in edges.indices().rev() {
        let edge = &mut edges[idx];
        if edge.endpoints().is_none() {
            // Anything that gets extended to the boundary might need its
            // cells closed, even if it ends up getting discarded.
            mark_for_closing(cells, edge);
        }
        let mut keep = connect_edge(sites, edge, bbox);
        if keep {
            match clip_edge(edge, bbox) {
                Some(true) => mark_for_closing(cells, edge),
                Some(false) => {}
                None => keep = false,
            }
        }
        keep = keep && edge.endpoints().is_some_and(|(va, vb)| !va.approx_eq(&vb));

        if !keep {
            log::trace!("discarding {idx:?}");
            edge.discard();
        }
    }
}

fn mark_for_closing(cells: &mut SiteVec<RawCell>, edge: &RawEdge) {
    cells[edge.left].needs_closing = true;
    if let Some(right) = edge.right {
        cells[right].needs_closing = true;
    }
}

/// A side of the bounding box.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Side {
    Left,
    Bottom,
    Right,
    Top,
}

impl Side {
    /// The order in which we walk around the box.
    const ALL: [Side; 4] = [Side::Left, Side::Bottom, Side::Right, Side::Top];

    fn next(self) -> Side {
        match self {
            Side::Left => Side::Bottom,
            Side::Bottom => Side::Right,
            Side::Right => Side::Top,
            Side::Top => Side::Left,
        }
    }

    /// Can we walk along this side, starting from `p`?
    fn starts_at(self, p: Point, bbox: &BoundingBox) -> bool {
        match self {
            Side::Left => eq_eps(p.x, bbox.xl) && lt_eps(p.y, bbox.yb),
            Side::Bottom => eq_eps(p.y, bbox.yb) && lt_eps(p.x, bbox.xr),
            Side::Right => eq_eps(p.x, bbox.xr) && gt_eps(p.y, bbox.yt),
            Side::Top => eq_eps(p.y, bbox.yt) && gt_eps(p.x, bbox.xl),
        }
    }

    /// Walks along this side, heading for `target`.
    ///
    /// If `target` is on this side, we stop there. Otherwise, we go all the
    /// way to the next corner. Returns where we stopped, and whether it was
    /// at `target`.
    fn walk(self, target: Point, bbox: &BoundingBox) -> (Point, bool) {
        let reached = match self {
            Side::Left => eq_eps(target.x, bbox.xl),
            Side::Bottom => eq_eps(target.y, bbox.yb),
            Side::Right => eq_eps(target.x, bbox.xr),
            Side::Top => eq_eps(target.y, bbox.yt),
        };
        if reached {
            return (target, true);
        }
        let corner = match self {
            Side::Left => Point::new(bbox.xl, bbox.yb),
            Side::Bottom => Point::new(bbox.xr, bbox.yb),
            Side::Right => Point::new(bbox.xr, bbox.yt),
            Side::Top => Point::new(bbox.xl, bbox.yt),
        };
        (corner, false)
    }
}

/// Fills in the gaps in the cell boundaries with edges that run along the
/// bounding box.
fn close_cells(
    edges: &mut EdgeVec<RawEdge>,
    cells: &mut SiteVec<RawCell>,
    bbox: &BoundingBox,
) -> Result<(), Error> {
    for idx in cells.indices().rev() {
        let cell = &mut cells[idx];
        cell.prepare_half_edges(edges);
        if cell.half_edges.is_empty() || !cell.needs_closing {
            continue;
        }

        let mut i = 0;
        while i < cell.half_edges.len() {
            let next = (i + 1) % cell.half_edges.len();
            // unwrap: prepare_half_edges only keeps half-edges whose edges have both ends
            let end = cell.half_edges[i].end(edges).unwrap();
            let target = cell.half_edges[next].start(edges).unwrap();

            if neq_eps(end.x, target.x) || neq_eps(end.y, target.y) {
                let first_side = Side::ALL.into_iter().find(|s| s.starts_at(end, bbox));
                let Some(mut side) = first_side else {
                    log::warn!(
                        "cell {idx:?} has a gap at {end:?} that isn't on the bounding box"
                    );
                    i += 1;
                    continue;
                };

                let mut start = end;
                for walked in 0.. {
                    if walked == MAX_SIDES {
                        return Err(Error::UnclosedCell { site: idx });
                    }
                    let (stop, done) = side.walk(target, bbox);
                    let edge = edges.push(RawEdge::border(idx, start, stop));
                    i += 1;
                    cell.half_edges
                        .insert(i, RawHalfEdge::border(edge, idx, start, stop));
                    if done {
                        break;
                    }
                    start = stop;
                    side = side.next();
                }
            }
            i += 1;
        }
        cell.needs_closing = false;
    }
    Ok(())
}
