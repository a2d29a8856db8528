#![deny(missing_docs)]
#![doc = include_str!("../README.md")]

#[macro_use]
mod typed_vec;

#[cfg(any(test, feature = "arbitrary"))]
pub mod arbitrary;
mod diagram;
mod finish;
mod geom;
mod num;
mod step;
mod sweep;

#[cfg(feature = "generators")]
pub mod generators;

// pub so that we can use it in fuzz tests, but it's really private
#[doc(hidden)]
pub mod rbtree;

pub use diagram::{Cell, Diagram, Edge, EdgeIdx, HalfEdge, SiteIdx};
pub use geom::{BoundingBox, Point};
pub use num::EPSILON;
pub use step::{ActiveCircle, BeachArc, StepResult, Steps};

/// The inputs were faulty, or the output couldn't be put together.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Error {
    /// At least one of the inputs was infinite.
    Infinity,
    /// At least one of the inputs was not a number.
    NaN,
    /// The bounding box has no area.
    EmptyBoundingBox,
    /// We couldn't close up the cell of a site by walking around the bounding box.
    ///
    /// This means that the sweep produced an inconsistent diagram, and it
    /// shouldn't happen.
    UnclosedCell {
        /// The site whose cell was left open.
        site: SiteIdx,
    },
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Error::Infinity => write!(f, "one of the inputs was infinite"),
            Error::NaN => write!(f, "one of the inputs had a NaN"),
            Error::EmptyBoundingBox => write!(f, "the bounding box was empty"),
            Error::UnclosedCell { site } => {
                write!(f, "failed to close the cell of {site:?}")
            }
        }
    }
}

impl std::error::Error for Error {}

/// Checks the inputs, and collects the sites.
///
/// With fewer than two sites there's no diagram to speak of, so in that case
/// we return no sites at all.
fn prepare<P: Into<Point>>(
    sites: impl IntoIterator<Item = P>,
    bbox: &BoundingBox,
) -> Result<Vec<Point>, Error> {
    let sites: Vec<Point> = sites.into_iter().map(Into::into).collect();
    let coords = sites.iter().flat_map(|p| [p.x, p.y]).chain(bbox.coords());
    for c in coords {
        if c.is_nan() {
            return Err(Error::NaN);
        }
        if c.is_infinite() {
            return Err(Error::Infinity);
        }
    }
    if bbox.xl >= bbox.xr || bbox.yt >= bbox.yb {
        return Err(Error::EmptyBoundingBox);
    }

    if sites.len() < 2 {
        log::debug!("only {} sites, not computing anything", sites.len());
        return Ok(Vec::new());
    }
    Ok(sites)
}

/// Computes the Voronoi diagram of a collection of sites, clipped to a bounding box.
///
/// Sites that appear more than once (up to [`EPSILON`]) are only counted
/// once, and coordinates closer than that get snapped together, so
/// [`Diagram::sites`] might differ very slightly from the input. Sites outside
/// the bounding box are allowed, and they affect the diagram inside it.
/// With fewer than two sites, the result is an empty diagram.
pub fn compute<P: Into<Point>>(
    sites: impl IntoIterator<Item = P>,
    bbox: &BoundingBox,
) -> Result<Diagram, Error> {
    let sites = prepare(sites, bbox)?;
    let mut sweeper = sweep::Sweeper::new(sites);
    sweeper.run();
    log::debug!("sweep finished after {} events", sweeper.events());
    let diagram = sweeper.into_diagram(bbox)?;
    log::debug!(
        "diagram has {} cells, {} edges and {} vertices",
        diagram.cells.len(),
        diagram.edges.len(),
        diagram.vertices.len()
    );
    Ok(diagram)
}

/// Computes the state of the sweep right after event number `step` (counting
/// from zero), including the diagram as it would be if the sweep stopped there.
///
/// If `step` is at least the total number of events, this returns the final
/// state (with [`StepResult::done`] set), whose diagram is the same as the
/// one that [`compute`] returns.
pub fn compute_step<P: Into<Point>>(
    sites: impl IntoIterator<Item = P>,
    bbox: &BoundingBox,
    step: usize,
) -> Result<StepResult, Error> {
    let sites = prepare(sites, bbox)?;
    step::compute_step(sites, bbox, step)
}

/// Returns an iterator over every step of the sweep.
///
/// The iterator yields one result per event, and then a final one with
/// [`StepResult::done`] set. The sweep only advances as you iterate, and it
/// runs just once: step `i` of this iterator is the same as
/// `compute_step(sites, bbox, i)`.
pub fn compute_all_steps<P: Into<Point>>(
    sites: impl IntoIterator<Item = P>,
    bbox: &BoundingBox,
) -> Result<Steps, Error> {
    let sites = prepare(sites, bbox)?;
    Ok(Steps::new(sites, *bbox))
}
