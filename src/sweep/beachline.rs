//! The beach line: inserting arcs at site events and squeezing them out at
//! circle events.

use std::collections::VecDeque;

use crate::{
    diagram::{EdgeIdx, RawEdge, RawHalfEdge, SiteIdx},
    geom::{breakpoint_x, circumcircle, Point},
    num::{eq_eps, EPSILON},
    rbtree::NodeId,
};

use super::Sweeper;

/// A parabolic arc of the beach line.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Arc {
    /// The focus of the parabola.
    pub site: SiteIdx,
    /// The edge traced out by this arc's left end.
    ///
    /// Every arc except the leftmost one has an edge here.
    pub edge: Option<EdgeIdx>,
    /// The circle event that will make this arc disappear, if there is one.
    pub circle: Option<NodeId>,
}

impl Arc {
    fn new(site: SiteIdx) -> Self {
        Arc {
            site,
            edge: None,
            circle: None,
        }
    }
}

impl Sweeper {
    fn site_of(&self, arc: NodeId) -> Point {
        self.sites[self.beachline[arc].site]
    }

    /// The horizontal position of an arc's left end.
    pub(super) fn left_breakpoint(&self, arc: NodeId, directrix: f64) -> f64 {
        let site = self.site_of(arc);
        if eq_eps(site.y, directrix) {
            return site.x;
        }
        match self.beachline.prev(arc) {
            Some(prev) => breakpoint_x(self.site_of(prev), site, directrix),
            None => f64::NEG_INFINITY,
        }
    }

    /// The horizontal position of an arc's right end.
    pub(super) fn right_breakpoint(&self, arc: NodeId, directrix: f64) -> f64 {
        match self.beachline.next(arc) {
            Some(next) => self.left_breakpoint(next, directrix),
            None => {
                let site = self.site_of(arc);
                if eq_eps(site.y, directrix) {
                    site.x
                } else {
                    f64::INFINITY
                }
            }
        }
    }

    /// Creates a new edge between two sites, and gives each of their cells a
    /// half-edge for it.
    pub(super) fn create_edge(
        &mut self,
        left: SiteIdx,
        right: SiteIdx,
        va: Option<Point>,
        vb: Option<Point>,
    ) -> EdgeIdx {
        let mut edge = RawEdge::new(left, right);
        if let Some(va) = va {
            edge.set_start(left, right, va);
        }
        if let Some(vb) = vb {
            edge.set_end(left, right, vb);
        }
        let idx = self.edges.push(edge);
        let (l, r) = (self.sites[left], self.sites[right]);
        self.cells[left]
            .half_edges
            .push(RawHalfEdge::bisector(idx, left, l, r));
        self.cells[right]
            .half_edges
            .push(RawHalfEdge::bisector(idx, right, r, l));
        idx
    }

    /// Finds the arcs on either side of a new site: the arc whose left end
    /// is just to the right of the site, and the arc whose right end is just
    /// to its left. These are the same arc if the site lands in the middle of
    /// one, and different arcs if it lands right on a breakpoint.
    fn find_neighbors(&self, site: Point) -> (Option<NodeId>, Option<NodeId>) {
        let directrix = site.y;
        let mut node = self.beachline.root();
        while let Some(n) = node {
            let dxl = self.left_breakpoint(n, directrix) - site.x;
            if dxl > EPSILON {
                match self.beachline.left(n) {
                    Some(left) => node = Some(left),
                    None => return (None, Some(n)),
                }
                continue;
            }

            let dxr = site.x - self.right_breakpoint(n, directrix);
            if dxr > EPSILON {
                match self.beachline.right(n) {
                    Some(right) => node = Some(right),
                    None => return (Some(n), None),
                }
                continue;
            }

            return if dxl > -EPSILON {
                (self.beachline.prev(n), Some(n))
            } else if dxr > -EPSILON {
                (Some(n), self.beachline.next(n))
            } else {
                (Some(n), Some(n))
            };
        }
        (None, None)
    }

    pub(super) fn add_beach_section(&mut self, site: SiteIdx) {
        let point = self.sites[site];
        let (l_arc, r_arc) = self.find_neighbors(point);

        match (l_arc, r_arc) {
            // The first arc.
            (None, None) => {
                self.beachline.insert_after(None, Arc::new(site));
            }
            // The site landed in the middle of an arc, which gets split in two.
            (Some(l_arc), Some(r_arc)) if l_arc == r_arc => {
                self.detach_circle_event(l_arc);
                let split = self.beachline[l_arc];
                let l_site = split.site;
                let new_arc = self.beachline.insert_after(Some(l_arc), Arc::new(site));
                let r_arc = self.beachline.insert_after(Some(new_arc), Arc::new(l_site));

                let edge = self.create_edge(l_site, site, None, None);
                self.beachline[new_arc].edge = Some(edge);
                self.beachline[r_arc].edge = Some(edge);

                self.attach_circle_event(l_arc);
                self.attach_circle_event(r_arc);
            }
            // The site is to the right of everything. This only happens when
            // all the sites so far are on the same horizontal line.
            (Some(l_arc), None) => {
                let l_site = self.beachline[l_arc].site;
                let new_arc = self.beachline.insert_after(Some(l_arc), Arc::new(site));
                let edge = self.create_edge(l_site, site, None, None);
                self.beachline[new_arc].edge = Some(edge);
            }
            // The mirror image of the case above.
            (None, Some(r_arc)) => {
                let r_site = self.beachline[r_arc].site;
                self.beachline.insert_after(None, Arc::new(site));
                let edge = self.create_edge(site, r_site, None, None);
                self.beachline[r_arc].edge = Some(edge);
            }
            // The site landed exactly on a breakpoint. The edge that the
            // breakpoint was tracing ends at a new vertex, and two new edges
            // start there.
            (Some(l_arc), Some(r_arc)) => {
                self.detach_circle_event(l_arc);
                self.detach_circle_event(r_arc);

                let l_site = self.beachline[l_arc].site;
                let r_site = self.beachline[r_arc].site;
                let vertex =
                    circumcircle(self.sites[l_site], point, self.sites[r_site]).center;

                // unwrap: `r_arc` has a neighbor on its left, so it has an edge
                let old_edge = self.beachline[r_arc].edge.unwrap();
                self.edges[old_edge].set_start(l_site, r_site, vertex);

                let new_arc = self.beachline.insert_after(Some(l_arc), Arc::new(site));
                let left_edge = self.create_edge(l_site, site, None, Some(vertex));
                let right_edge = self.create_edge(site, r_site, None, Some(vertex));
                self.beachline[new_arc].edge = Some(left_edge);
                self.beachline[r_arc].edge = Some(right_edge);

                self.attach_circle_event(l_arc);
                self.attach_circle_event(r_arc);
            }
        }
    }

    /// Does `arc` have a circle event centered at `vertex`?
    fn collapses_at(&self, arc: NodeId, vertex: Point) -> bool {
        self.beachline[arc].circle.is_some_and(|c| {
            let c = &self.circles[c];
            eq_eps(c.x, vertex.x) && eq_eps(c.y_center, vertex.y)
        })
    }

    fn detach_beach_section(&mut self, arc: NodeId) -> Arc {
        self.detach_circle_event(arc);
        self.beachline.remove(arc)
    }

    /// Handles a circle event, removing the arc that collapses (along with
    /// any neighbors that collapse at the same vertex).
    pub(super) fn remove_beach_section(&mut self, circle: NodeId) {
        let event = self.circles[circle];
        let vertex = event.center();
        let arc = event.arc;

        // unwrap: arcs only get circle events if they have neighbors on both sides
        let mut l_arc = self.beachline.prev(arc).unwrap();
        let mut r_arc = self.beachline.next(arc).unwrap();
        let mut gone = VecDeque::from([self.detach_beach_section(arc)]);

        // Several arcs can collapse at the same vertex, when there are more
        // than three co-circular sites.
        while self.collapses_at(l_arc, vertex) {
            // unwrap: l_arc has a circle event, so it has neighbors on both sides
            let prev = self.beachline.prev(l_arc).unwrap();
            gone.push_front(self.detach_beach_section(l_arc));
            l_arc = prev;
        }
        self.detach_circle_event(l_arc);

        while self.collapses_at(r_arc, vertex) {
            // unwrap: r_arc has a circle event, so it has neighbors on both sides
            let next = self.beachline.next(r_arc).unwrap();
            gone.push_back(self.detach_beach_section(r_arc));
            r_arc = next;
        }
        self.detach_circle_event(r_arc);
        log::trace!("{} arcs collapsed at {vertex:?}", gone.len());

        // Every edge between consecutive arcs in l_arc, gone..., r_arc ends here.
        let mut left_site = self.beachline[l_arc].site;
        for arc in gone {
            // unwrap: these arcs all had left neighbors
            let edge = arc.edge.unwrap();
            self.edges[edge].set_start(left_site, arc.site, vertex);
            left_site = arc.site;
        }
        let r_site = self.beachline[r_arc].site;
        // unwrap: r_arc has a left neighbor
        let r_edge = self.beachline[r_arc].edge.unwrap();
        self.edges[r_edge].set_start(left_site, r_site, vertex);

        // And a new edge starts between the surviving neighbors.
        let l_site = self.beachline[l_arc].site;
        let edge = self.create_edge(l_site, r_site, None, Some(vertex));
        self.beachline[r_arc].edge = Some(edge);

        self.attach_circle_event(l_arc);
        self.attach_circle_event(r_arc);
    }
}

#[cfg(test)]
mod tests {
    use crate::{geom::Point, sweep::Sweeper};

    fn sites_of(s: &Sweeper) -> Vec<Point> {
        s.beachline
            .iter()
            .map(|(_, arc)| s.sites[arc.site])
            .collect()
    }

    #[test]
    fn split_arc() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(1.0, 1.0);
        let mut s = Sweeper::new([a, b]);
        s.run();
        assert_eq!(sites_of(&s), vec![a, b, a]);
        assert_eq!(s.edges.len(), 1);

        let arcs: Vec<_> = s.beachline.iter().map(|(_, arc)| *arc).collect();
        assert_eq!(arcs[0].edge, None);
        assert_eq!(arcs[1].edge, arcs[2].edge);
        assert!(arcs[1].edge.is_some());
    }

    #[test]
    fn same_height() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(2.0, 0.0);
        let c = Point::new(4.0, 0.0);
        let mut s = Sweeper::new([c, a, b]);
        s.run();
        assert_eq!(sites_of(&s), vec![a, b, c]);
        assert_eq!(s.edges.len(), 2);
        for (id, _) in s.beachline.iter().skip(1) {
            let left = s.left_breakpoint(id, 1.0);
            assert!(left == 1.0 || left == 3.0);
        }
    }

    #[test]
    fn landing_on_a_breakpoint() {
        let a = Point::new(0.0, 0.0);
        let b = Point::new(2.0, 0.0);
        let c = Point::new(1.0, 1.0);
        let mut s = Sweeper::new([a, b, c]);
        s.run();

        // The new site lands right between a and b, so it creates a vertex
        // immediately instead of via a circle event.
        assert_eq!(s.events(), 3);
        assert_eq!(sites_of(&s), vec![a, c, b]);
        assert_eq!(s.edges.len(), 3);
        let vertex = Point::new(1.0, 0.0);
        for edge in s.edges.values() {
            assert!(edge.va.is_some_and(|v| v.distance(&vertex) < 1e-9)
                || edge.vb.is_some_and(|v| v.distance(&vertex) < 1e-9));
        }
    }

    #[test]
    fn breakpoints_are_ordered() {
        let mut s = Sweeper::new(
            [(3.0, 0.0), (1.0, 1.0), (4.0, 1.5), (2.0, 2.0), (0.5, 3.0)]
                .into_iter()
                .map(Point::from),
        );
        s.run();
        // Below every circle event, so the beach line is in its final shape.
        let directrix = 20.0;
        let ends: Vec<_> = s
            .beachline
            .iter()
            .map(|(id, _)| {
                (
                    s.left_breakpoint(id, directrix),
                    s.right_breakpoint(id, directrix),
                )
            })
            .collect();
        assert_eq!(ends[0].0, f64::NEG_INFINITY);
        assert_eq!(ends.last().unwrap().1, f64::INFINITY);
        for w in ends.windows(2) {
            assert!(w[0].0 <= w[0].1 + 1e-9);
            assert!((w[0].1 - w[1].0).abs() < 1e-9);
        }
    }
}
