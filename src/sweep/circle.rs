//! Circle events: the moments when an arc of the beach line shrinks to nothing.

use crate::{
    diagram::SiteIdx,
    geom::{circumcircle, Point},
    rbtree::NodeId,
};

use super::Sweeper;

/// Three sites that are this close to collinear (or that turn the wrong way)
/// don't get a circle event.
const CONVERGENCE_THRESHOLD: f64 = -2e-12;

/// A pending circle event.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct CircleEvent {
    /// The arc that will collapse.
    pub arc: NodeId,
    /// That arc's site.
    pub site: SiteIdx,
    /// The horizontal position of the circle's center.
    pub x: f64,
    /// The vertical position of the circle's bottom, which is where the
    /// event happens.
    pub y: f64,
    /// The vertical position of the circle's center.
    pub y_center: f64,
    pub radius: f64,
}

impl CircleEvent {
    /// The circle's center, which becomes a Voronoi vertex when the event happens.
    pub fn center(&self) -> Point {
        Point::new(self.x, self.y_center)
    }

    /// Does this event happen before (or at the same time as) `other`?
    fn not_after(&self, other: &CircleEvent) -> bool {
        self.y < other.y || (self.y == other.y && self.x <= other.x)
    }
}

impl Sweeper {
    /// Checks whether `arc` is going to get squeezed out by its neighbors and,
    /// if so, schedules the event.
    pub(super) fn attach_circle_event(&mut self, arc: NodeId) {
        debug_assert!(self.beachline[arc].circle.is_none());

        let (Some(l_arc), Some(r_arc)) = (self.beachline.prev(arc), self.beachline.next(arc))
        else {
            return;
        };
        let l_site = self.beachline[l_arc].site;
        let site = self.beachline[arc].site;
        let r_site = self.beachline[r_arc].site;
        if l_site == r_site {
            return;
        }

        let circle = circumcircle(self.sites[l_site], self.sites[site], self.sites[r_site]);
        // If the breakpoints are diverging, the arc will never collapse.
        if circle.determinant >= CONVERGENCE_THRESHOLD {
            return;
        }

        let event = CircleEvent {
            arc,
            site,
            x: circle.center.x,
            y: circle.center.y + circle.radius,
            y_center: circle.center.y,
            radius: circle.radius,
        };

        // Find the last event that isn't after this one.
        let mut predecessor = None;
        let mut node = self.circles.root();
        while let Some(n) = node {
            if event.not_after(&self.circles[n]) {
                node = self.circles.left(n);
            } else {
                predecessor = Some(n);
                node = self.circles.right(n);
            }
        }

        let id = self.circles.insert_after(predecessor, event);
        self.beachline[arc].circle = Some(id);
    }

    /// Cancels `arc`'s circle event, if it has one.
    pub(super) fn detach_circle_event(&mut self, arc: NodeId) {
        if let Some(circle) = self.beachline[arc].circle.take() {
            self.circles.remove(circle);
        }
    }
}
