//! The sweep-line implementation.
//!
//! The main entry point is [`Sweeper`], which runs Fortune's algorithm one
//! event at a time. The sweep line moves in the direction of increasing `y`
//! (which is downwards, on the screen). Behind the sweep line, the points
//! closer to some site than to the sweep line are already settled; the
//! boundary of that region is the *beach line*, a sequence of parabolic arcs.
//!
//! Two kinds of events change the beach line. When the sweep line reaches a
//! site, a new arc appears ([`beachline`]). When three consecutive arcs'
//! sites lie on a circle whose bottom the sweep line reaches, the middle arc
//! gets squeezed out and leaves behind a Voronoi vertex ([`circle`]).

mod beachline;
mod circle;

use crate::{
    diagram::{Diagram, EdgeVec, RawCell, RawEdge, SiteIdx, SiteVec},
    finish,
    geom::{BoundingBox, Point},
    num::eq_eps,
    rbtree::{NodeId, RbTree},
    Error,
};

use beachline::Arc;
use circle::CircleEvent;

/// Something that happened during a single step of the sweep.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) enum SweepEvent {
    /// The sweep line reached a new site, which started a new arc.
    Site {
        /// The site's index.
        site: SiteIdx,
        /// The site's position.
        point: Point,
    },
    /// An arc collapsed.
    Circle {
        /// The new Voronoi vertex.
        center: Point,
        /// The bottom of the circle, which is where the sweep line was when the arc collapsed.
        bottom: f64,
        /// The site of the arc that collapsed.
        site: Point,
    },
}

/// Runs the sweep, one event at a time.
///
/// A `Sweeper` owns all of its state; separate sweeps (even on the same
/// sites) have nothing to do with one another.
#[derive(Clone, Debug)]
pub(crate) struct Sweeper {
    /// The sites we haven't reached yet, in reverse sweep order (so that the
    /// next one is at the end).
    pending: Vec<Point>,
    /// The most recently reached site, duplicates included.
    last_reached: Option<Point>,
    /// The most recently accepted site. Sites that are equal to this one (up
    /// to [`EPSILON`](crate::EPSILON)) are skipped.
    last_accepted: Option<Point>,
    sites: SiteVec<Point>,
    cells: SiteVec<RawCell>,
    edges: EdgeVec<RawEdge>,
    beachline: RbTree<Arc>,
    circles: RbTree<CircleEvent>,
    events: usize,
    sweep_line: Option<f64>,
}

impl Sweeper {
    /// Prepares to sweep over a collection of sites.
    ///
    /// The sites must all be finite. Coordinates that are within
    /// [`EPSILON`](crate::EPSILON) of one another get snapped together first;
    /// see [`snap_coordinates`].
    pub fn new(sites: impl IntoIterator<Item = Point>) -> Self {
        let mut pending: Vec<Point> = sites.into_iter().collect();
        snap_coordinates(&mut pending);
        // Descending, so that popping gives the smallest `y` (and then the smallest `x`).
        pending.sort_unstable_by(|a, b| b.cmp(a));
        Sweeper {
            sites: SiteVec::with_capacity(pending.len()),
            cells: SiteVec::with_capacity(pending.len()),
            edges: EdgeVec::with_capacity(pending.len() * 3),
            pending,
            last_reached: None,
            last_accepted: None,
            beachline: RbTree::new(),
            circles: RbTree::new(),
            events: 0,
            sweep_line: None,
        }
    }

    /// The number of events processed so far. Skipped duplicate sites don't count.
    pub fn events(&self) -> usize {
        self.events
    }

    /// The current position of the sweep line, or `None` if we haven't started.
    ///
    /// After a circle event, this is the position of the next site that we
    /// haven't reached yet (or the last site we reached, if there are no more
    /// sites). In particular, it doesn't move down to the bottom of the
    /// circle.
    pub fn sweep_line(&self) -> Option<f64> {
        self.sweep_line
    }

    /// Processes the next event, returning `None` if there are no more.
    pub fn step(&mut self) -> Option<SweepEvent> {
        loop {
            let circle = self.circles.first();
            let site_first = match (self.pending.last(), circle) {
                (None, None) => return None,
                (Some(_), None) => true,
                (None, Some(_)) => false,
                (Some(site), Some(c)) => {
                    let c = &self.circles[c];
                    site.y < c.y || (site.y == c.y && site.x < c.x)
                }
            };

            let event = match (site_first, circle) {
                (false, Some(c)) => self.circle_event(c),
                _ => {
                    // unwrap: we only choose the site if there is one
                    let point = self.pending.pop().unwrap();
                    self.last_reached = Some(point);
                    if self.last_accepted.is_some_and(|p| p.approx_eq(&point)) {
                        log::debug!("skipping duplicate site {point:?}");
                        continue;
                    }
                    self.last_accepted = Some(point);
                    self.site_event(point)
                }
            };

            self.events += 1;
            log::trace!("event {}: {event:?}", self.events - 1);

            #[cfg(feature = "slow-asserts")]
            self.check_invariants(match event {
                SweepEvent::Site { point, .. } => point.y,
                SweepEvent::Circle { bottom, .. } => bottom,
            });

            return Some(event);
        }
    }

    /// Processes all the remaining events.
    pub fn run(&mut self) {
        while self.step().is_some() {}
    }

    fn site_event(&mut self, point: Point) -> SweepEvent {
        let site = self.sites.push(point);
        self.cells.push(RawCell::new(site));
        self.add_beach_section(site);
        self.sweep_line = Some(point.y);
        SweepEvent::Site { site, point }
    }

    fn circle_event(&mut self, circle: NodeId) -> SweepEvent {
        let event = self.circles[circle];
        self.remove_beach_section(circle);
        self.sweep_line = self.pending.last().or(self.last_reached.as_ref()).map(|p| p.y);
        SweepEvent::Circle {
            center: event.center(),
            bottom: event.y,
            site: self.sites[event.site],
        }
    }

    /// The circles of all the pending circle events, in the order they'll happen.
    pub fn active_circles(&self) -> impl Iterator<Item = &CircleEvent> + '_ {
        self.circles.iter().map(|(_, c)| c)
    }

    /// The arcs of the beach line, from left to right, along with their
    /// left and right ends when the sweep line is at `directrix`.
    pub fn arcs_at(&self, directrix: f64) -> impl Iterator<Item = (SiteIdx, Point, f64, f64)> + '_ {
        self.beachline.iter().map(move |(id, arc)| {
            (
                arc.site,
                self.sites[arc.site],
                self.left_breakpoint(id, directrix),
                self.right_breakpoint(id, directrix),
            )
        })
    }

    /// Clips and closes a copy of everything we've found so far, leaving the
    /// sweep itself untouched.
    pub fn diagram_snapshot(&self, bbox: &BoundingBox) -> Result<Diagram, Error> {
        let mut edges = self.edges.clone();
        let mut cells = self.cells.clone();
        finish::finish(&self.sites, &mut edges, &mut cells, bbox)?;
        Ok(Diagram::assemble(&self.sites, &edges, &cells))
    }

    /// Clips and closes everything we've found so far.
    pub fn into_diagram(mut self, bbox: &BoundingBox) -> Result<Diagram, Error> {
        finish::finish(&self.sites, &mut self.edges, &mut self.cells, bbox)?;
        Ok(Diagram::assemble(&self.sites, &self.edges, &self.cells))
    }

    /// Checks that the beach line is sorted (when the sweep line is at
    /// `directrix`) and that the arcs and circle events point at one another.
    ///
    /// The beach line is only guaranteed to be sorted at the position of the
    /// most recent event: after a circle event, `self.sweep_line` stays above
    /// the circle's bottom and the collapsed arc is already gone.
    ///
    /// Panics if anything is wrong.
    #[cfg(feature = "slow-asserts")]
    pub fn check_invariants(&self, directrix: f64) {
        self.beachline.check_invariants();
        self.circles.check_invariants();

        for (id, arc) in self.beachline.iter() {
            if let Some(c) = arc.circle {
                assert_eq!(self.circles[c].arc, id);
            }
        }
        for (id, c) in self.circles.iter() {
            assert_eq!(self.beachline[c.arc].circle, Some(id));
        }
        let circles: Vec<_> = self.circles.iter().map(|(_, c)| (c.y, c.x)).collect();
        for w in circles.windows(2) {
            assert!(w[0] <= w[1], "circle events out of order: {w:?}");
        }

        let mut prev = f64::NEG_INFINITY;
        for (_, _, left, right) in self.arcs_at(directrix) {
            let tol = 1e-6 * (1.0 + left.abs());
            assert!(left >= prev - tol, "beach line out of order at {left}");
            assert!(right >= left - tol, "arc has negative width: {left}..{right}");
            prev = left;
        }
    }
}

/// Moves coordinates that are within [`EPSILON`](crate::EPSILON) of one
/// another onto the same value.
///
/// The sites are sorted exactly, but everything else compares coordinates
/// with a tolerance. Two sites whose `y` coordinates differ by a few ulps
/// look like they're on the same horizontal line, but they could be sorted
/// in the wrong horizontal order, and then the beach line gets confused.
///
/// Each run of nearby values snaps to its smallest member, so after snapping
/// distinct values are at least `EPSILON` apart. On exit, `points` is sorted.
fn snap_coordinates(points: &mut [Point]) {
    let mut xs: Vec<f64> = points.iter().map(|p| p.x).collect();
    xs.sort_unstable_by(f64::total_cmp);
    // Not `dedup`, which would merge 0.0 and -0.0.
    xs.dedup_by(|a, b| a.total_cmp(b).is_eq());
    let mut targets = Vec::with_capacity(xs.len());
    let mut base = None;
    for &x in &xs {
        let target = match base {
            Some(b) if eq_eps(x, b) => b,
            _ => x,
        };
        base = Some(target);
        targets.push(target);
    }
    for p in points.iter_mut() {
        // unwrap: every x is in `xs`
        let idx = xs.binary_search_by(|x| x.total_cmp(&p.x)).unwrap();
        p.x = targets[idx];
    }

    points.sort_unstable();
    let mut base = None;
    for p in points.iter_mut() {
        match base {
            Some(b) if eq_eps(p.y, b) => p.y = b,
            _ => base = Some(p.y),
        }
    }
    // Snapping `y` can reorder sites on the same line.
    points.sort_unstable();
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;

    use super::*;

    fn sweeper(points: &[(f64, f64)]) -> Sweeper {
        Sweeper::new(points.iter().map(|&p| p.into()))
    }

    #[test]
    fn sites_in_sweep_order() {
        let mut s = sweeper(&[(5.0, 1.0), (0.0, 2.0), (3.0, 1.0)]);
        assert_matches!(s.step(), Some(SweepEvent::Site { point, .. }) if point == Point::new(3.0, 1.0));
        assert_matches!(s.step(), Some(SweepEvent::Site { point, .. }) if point == Point::new(5.0, 1.0));
        assert_matches!(s.step(), Some(SweepEvent::Site { point, .. }) if point == Point::new(0.0, 2.0));
        // The last site split the arc of (3, 1), whose right copy then gets
        // squeezed between (0, 2) and (5, 1).
        assert_matches!(s.step(), Some(SweepEvent::Circle { center, site, .. }) => {
            assert!(center.distance(&Point::new(4.0, 9.0)) < 1e-9);
            assert_eq!(site, Point::new(3.0, 1.0));
        });
        assert_eq!(s.step(), None);
        assert_eq!(s.events(), 4);
    }

    #[test]
    fn duplicates_are_skipped() {
        let mut s = sweeper(&[(1.0, 1.0), (1.0, 1.0), (2.0, 2.0)]);
        s.run();
        assert_eq!(s.events(), 2);
        assert_eq!(s.sites.len(), 2);
    }

    #[test]
    fn nearly_equal_coordinates_are_snapped() {
        let y = -991.0891121406636;
        let mut points = vec![
            Point::new(363.99771694794873, y),
            Point::new(1159.1359509529536, y - 2e-13),
            Point::new(765.9101837286256, y + 2e-12),
            Point::new(346.837021684287, 100.0),
            Point::new(346.8370216842854, 200.0),
        ];
        snap_coordinates(&mut points);
        assert_eq!(points[0].y, points[1].y);
        assert_eq!(points[1].y, points[2].y);
        assert!(points[0].x < points[1].x && points[1].x < points[2].x);
        assert_eq!(points[3].x, points[4].x);
        assert_eq!(points[3].x, 346.8370216842854);

        let mut zeros = vec![Point::new(0.0, 1.0), Point::new(-0.0, 2.0)];
        snap_coordinates(&mut zeros);
        assert_eq!(zeros[0].x, zeros[1].x);

        let mut s = Sweeper::new(points);
        s.run();
        let bbox = BoundingBox::new(-400.0, 1200.0, -1000.0, 400.0);
        let diagram = s.into_diagram(&bbox).unwrap();
        assert!(diagram.cells.iter().all(|c| c.is_closed()));
    }

    #[test]
    fn nearly_duplicate_sites_are_skipped() {
        let mut s = sweeper(&[(1.0, 1.0), (1.0 + 1e-12, 1.0 - 1e-12), (2.0, 2.0)]);
        s.run();
        assert_eq!(s.sites.len(), 2);
    }

    // Circumcenter at (5505 / 28, 4030 / 28), whose circle bottoms out just
    // below the last site.
    const TRIANGLE: [(f64, f64); 3] = [(100.0, 100.0), (300.0, 120.0), (200.0, 250.0)];

    #[test]
    fn triangle_has_one_circle_event() {
        let mut s = sweeper(&TRIANGLE);
        let mut events = Vec::new();
        while let Some(ev) = s.step() {
            events.push(ev);
        }
        assert_eq!(events.len(), 4);
        let expected = Point::new(5505.0 / 28.0, 4030.0 / 28.0);
        let radius = expected.distance(&Point::new(100.0, 100.0));
        assert_matches!(events[3], SweepEvent::Circle { center, bottom, site } => {
            assert!(center.distance(&expected) < 1e-9);
            assert!((bottom - (expected.y + radius)).abs() < 1e-9);
            assert_eq!(site, Point::new(300.0, 120.0));
        });
    }

    #[test]
    fn circle_sweep_line_stays_at_last_site() {
        let mut s = sweeper(&TRIANGLE);
        s.run();
        assert_eq!(s.sweep_line(), Some(250.0));
        assert_eq!(s.beachline.len(), 4);
        assert!(s.circles.is_empty());
    }

    #[test]
    fn snapshot_leaves_sweep_alone() {
        let mut s = sweeper(&TRIANGLE);
        s.step();
        s.step();
        let before_edges = s.edges.clone();
        let before_cells = s.cells.clone();
        let bbox = BoundingBox::new(0.0, 400.0, 0.0, 400.0);
        let diagram = s.diagram_snapshot(&bbox).unwrap();
        assert_eq!(diagram.cells.len(), 2);
        assert_eq!(s.edges, before_edges);
        assert_eq!(s.cells, before_cells);
    }
}
