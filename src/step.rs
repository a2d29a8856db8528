//! Watching the sweep one event at a time.

use crate::{
    diagram::{Diagram, SiteIdx},
    geom::{BoundingBox, Point},
    sweep::{SweepEvent, Sweeper},
    Error,
};

/// A circle event that's waiting to happen.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct ActiveCircle {
    /// The center of the circle, which will become a Voronoi vertex.
    pub center: Point,
    /// The radius of the circle.
    pub radius: f64,
    /// The vertical position of the bottom of the circle. The event happens
    /// when the sweep line gets here.
    pub bottom: f64,
}

/// One parabolic arc of the beach line.
#[derive(Clone, Copy, Debug, PartialEq, serde::Serialize)]
pub struct BeachArc {
    /// The site that is the focus of this arc.
    pub site: SiteIdx,
    /// The position of that site.
    pub point: Point,
    /// The horizontal position of the left end of the arc.
    ///
    /// This is negative infinity for the leftmost arc.
    pub left_breakpoint: f64,
    /// The horizontal position of the right end of the arc.
    ///
    /// This is infinity for the rightmost arc.
    pub right_breakpoint: f64,
}

/// The state of the sweep after some number of events.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct StepResult {
    /// Which step this is.
    ///
    /// Step `i` is the state right after the `i`th event (counting from zero).
    /// The final step (the one with `done` set) comes after all the events,
    /// and its number is the total number of events.
    pub step: usize,
    /// Where the sweep line is, if it has started.
    pub sweep_line: Option<f64>,
    /// All the circle events that are still waiting to happen, in the order
    /// they'll happen.
    pub circles: Vec<ActiveCircle>,
    /// The arcs of the beach line, from left to right.
    ///
    /// Their ends are computed with the directrix at `sweep_line`; this is
    /// empty if the sweep hasn't started.
    pub beachline: Vec<BeachArc>,
    /// Everything found so far, clipped and closed as though the sweep ended here.
    pub diagram: Diagram,
    /// What happened in this step, for people.
    pub description: String,
    /// True if there are no more events.
    pub done: bool,
}

impl StepResult {
    fn snapshot(
        sweeper: &Sweeper,
        event: Option<SweepEvent>,
        bbox: &BoundingBox,
    ) -> Result<StepResult, Error> {
        let diagram = sweeper.diagram_snapshot(bbox)?;
        let sweep_line = sweeper.sweep_line();
        let circles = sweeper
            .active_circles()
            .map(|c| ActiveCircle {
                center: c.center(),
                radius: c.radius,
                bottom: c.y,
            })
            .collect();
        let beachline = sweep_line
            .map(|y| {
                sweeper
                    .arcs_at(y)
                    .map(|(site, point, left_breakpoint, right_breakpoint)| BeachArc {
                        site,
                        point,
                        left_breakpoint,
                        right_breakpoint,
                    })
                    .collect()
            })
            .unwrap_or_default();

        let (step, description, done) = match event {
            Some(SweepEvent::Site { point, .. }) => (
                sweeper.events() - 1,
                format!(
                    "Processing site event at ({}, {}).\nAdded beach section for this site.",
                    point.x.round(),
                    point.y.round()
                ),
                false,
            ),
            // The event's position is where the sweep line meets the circle,
            // at the bottom.
            Some(SweepEvent::Circle { center, bottom, site }) => (
                sweeper.events() - 1,
                format!(
                    "Circle event detected at ({:.2}, {:.2}).\n\
                     Removed collapsing beach section associated with site ({:.2}, {:.2}).",
                    center.x, bottom, site.x, site.y
                ),
                false,
            ),
            None => (
                sweeper.events(),
                "Edges clipped and cells closed.".to_owned(),
                true,
            ),
        };
        let description = if done {
            format!("Final step: {description}")
        } else {
            format!("Step {step}: {description}")
        };

        Ok(StepResult {
            step,
            sweep_line,
            circles,
            beachline,
            diagram,
            description,
            done,
        })
    }
}

/// Computes the state of the sweep after event number `step` (counting from zero).
///
/// If there are fewer events than that, this returns the final state, with
/// `done` set.
pub(crate) fn compute_step(
    sites: Vec<Point>,
    bbox: &BoundingBox,
    step: usize,
) -> Result<StepResult, Error> {
    let mut sweeper = Sweeper::new(sites);
    let mut last = None;
    while sweeper.events() <= step {
        match sweeper.step() {
            Some(event) => last = Some(event),
            None => return StepResult::snapshot(&sweeper, None, bbox),
        }
    }
    StepResult::snapshot(&sweeper, last, bbox)
}

/// An iterator over all the steps of a sweep.
///
/// This yields one [`StepResult`] per event, followed by a final one with
/// `done` set. The sweep advances lazily, as you iterate.
#[derive(Clone, Debug)]
pub struct Steps {
    sweeper: Sweeper,
    bbox: BoundingBox,
    finished: bool,
}

impl Steps {
    pub(crate) fn new(sites: Vec<Point>, bbox: BoundingBox) -> Self {
        Steps {
            sweeper: Sweeper::new(sites),
            bbox,
            finished: false,
        }
    }
}

impl Iterator for Steps {
    type Item = Result<StepResult, Error>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }
        let event = self.sweeper.step();
        let result = StepResult::snapshot(&self.sweeper, event, &self.bbox);
        // If a snapshot fails, the final one would too; don't bother with it.
        self.finished = event.is_none() || result.is_err();
        Some(result)
    }
}

impl std::iter::FusedIterator for Steps {}

#[cfg(test)]
mod tests {
    use super::*;

    fn triangle() -> Vec<Point> {
        vec![
            Point::new(100.0, 100.0),
            Point::new(300.0, 120.0),
            Point::new(200.0, 250.0),
        ]
    }

    fn bbox() -> BoundingBox {
        BoundingBox::new(0.0, 400.0, 0.0, 400.0)
    }

    #[test]
    fn descriptions() {
        let steps: Vec<_> = Steps::new(triangle(), bbox())
            .collect::<Result<_, _>>()
            .unwrap();
        assert_eq!(steps.len(), 5);
        assert_eq!(
            steps[0].description,
            "Step 0: Processing site event at (100, 100).\nAdded beach section for this site."
        );
        assert!(steps[3]
            .description
            .starts_with("Step 3: Circle event detected at (196.61, 250.05).\n"));
        assert!(steps[3]
            .description
            .ends_with("associated with site (300.00, 120.00)."));
        assert_eq!(
            steps[4].description,
            "Final step: Edges clipped and cells closed."
        );
    }

    #[test]
    fn step_numbers() {
        for (i, step) in Steps::new(triangle(), bbox()).enumerate() {
            let step = step.unwrap();
            assert_eq!(step.step, i);
            assert_eq!(step.done, i == 4);
        }
    }

    #[test]
    fn circles_and_beachline() {
        let step = compute_step(triangle(), &bbox(), 2).unwrap();
        assert_eq!(step.sweep_line, Some(250.0));
        assert_eq!(step.circles.len(), 1);
        let circle = step.circles[0];
        assert!((circle.bottom - circle.center.y - circle.radius).abs() < 1e-9);
        assert!(circle.bottom > 250.0);

        assert_eq!(step.beachline.len(), 5);
        assert_eq!(step.beachline[0].left_breakpoint, f64::NEG_INFINITY);
        assert_eq!(step.beachline[4].right_breakpoint, f64::INFINITY);
        // The new site's arc has no width yet.
        let new_arc = step.beachline[2];
        assert_eq!(new_arc.point, Point::new(200.0, 250.0));
        assert_eq!(new_arc.left_breakpoint, 200.0);
        assert_eq!(new_arc.right_breakpoint, 200.0);
    }

    #[test]
    fn past_the_end() {
        let step = compute_step(triangle(), &bbox(), 100).unwrap();
        assert!(step.done);
        assert_eq!(step.step, 4);
        assert!(step.circles.is_empty());
    }

    #[test]
    fn no_sites() {
        let steps: Vec<_> = Steps::new(Vec::new(), bbox()).collect();
        assert_eq!(steps.len(), 1);
        let step = steps[0].as_ref().unwrap();
        assert!(step.done);
        assert_eq!(step.sweep_line, None);
        assert!(step.beachline.is_empty());
        assert_eq!(step.diagram, Diagram::default());
    }
}
