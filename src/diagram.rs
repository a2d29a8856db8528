//! Voronoi diagrams: the edge and cell records that the sweep builds up, and
//! the finished, caller-facing [`Diagram`].

use std::collections::HashSet;

use kurbo::BezPath;

use crate::geom::Point;

typed_vec!(
    /// A vector indexed by [`SiteIdx`]. Cells are stored in one of these too,
    /// since every site has exactly one cell.
    SiteVec,
    /// The identity of a site.
    ///
    /// Sites are numbered in the order the sweep reaches them (increasing `y`,
    /// then increasing `x`), skipping duplicates. A site's number is also the
    /// index of its cell in [`Diagram::cells`] and of its position in
    /// [`Diagram::sites`].
    SiteIdx,
    "site"
);

typed_vec!(
    /// A vector indexed by [`EdgeIdx`].
    EdgeVec,
    /// An index into [`Diagram::edges`].
    EdgeIdx,
    "e"
);

/// An edge under construction.
///
/// The direction convention is that walking from `va` to `vb`, `left` is on
/// the left. Either end may be unknown while the sweep is running.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RawEdge {
    pub left: SiteIdx,
    /// `None` for edges running along the bounding box.
    pub right: Option<SiteIdx>,
    pub va: Option<Point>,
    pub vb: Option<Point>,
}

impl RawEdge {
    pub fn new(left: SiteIdx, right: SiteIdx) -> Self {
        Self {
            left,
            right: Some(right),
            va: None,
            vb: None,
        }
    }

    pub fn border(site: SiteIdx, va: Point, vb: Point) -> Self {
        Self {
            left: site,
            right: None,
            va: Some(va),
            vb: Some(vb),
        }
    }

    /// Fixes one end of this edge, as seen by someone with `left` on their
    /// left and `right` on their right, looking at the new vertex from the
    /// rest of the edge.
    ///
    /// Which of our ends that is depends on whether the caller's idea of left
    /// and right matches ours. If neither end is known yet, we adopt the
    /// caller's orientation.
    pub fn set_start(&mut self, left: SiteIdx, right: SiteIdx, vertex: Point) {
        if self.va.is_none() && self.vb.is_none() {
            self.va = Some(vertex);
            self.left = left;
            self.right = Some(right);
        } else if self.left == right {
            self.vb = Some(vertex);
        } else {
            self.va = Some(vertex);
        }
    }

    /// Like [`RawEdge::set_start`], but for the other end.
    pub fn set_end(&mut self, left: SiteIdx, right: SiteIdx, vertex: Point) {
        self.set_start(right, left, vertex);
    }

    pub fn endpoints(&self) -> Option<(Point, Point)> {
        self.va.zip(self.vb)
    }

    /// Drops this edge from the diagram.
    pub fn discard(&mut self) {
        self.va = None;
        self.vb = None;
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RawHalfEdge {
    pub edge: EdgeIdx,
    pub site: SiteIdx,
    pub angle: f64,
}

impl RawHalfEdge {
    /// A half-edge of the bisector between `site` (at `own`) and the site at `other`.
    pub fn bisector(edge: EdgeIdx, site: SiteIdx, own: Point, other: Point) -> Self {
        Self {
            edge,
            site,
            angle: (other.y - own.y).atan2(other.x - own.x),
        }
    }

    /// A half-edge along the bounding box, running from `va` to `vb`.
    pub fn border(edge: EdgeIdx, site: SiteIdx, va: Point, vb: Point) -> Self {
        Self {
            edge,
            site,
            angle: (vb.x - va.x).atan2(va.y - vb.y),
        }
    }

    pub fn start(&self, edges: &EdgeVec<RawEdge>) -> Option<Point> {
        let edge = &edges[self.edge];
        if edge.left == self.site {
            edge.va
        } else {
            edge.vb
        }
    }

    pub fn end(&self, edges: &EdgeVec<RawEdge>) -> Option<Point> {
        let edge = &edges[self.edge];
        if edge.left == self.site {
            edge.vb
        } else {
            edge.va
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub(crate) struct RawCell {
    pub site: SiteIdx,
    pub half_edges: Vec<RawHalfEdge>,
    /// Set when some edge of this cell got cut off by the bounding box, so
    /// that there may be gaps to fill in along the box.
    pub needs_closing: bool,
}

impl RawCell {
    pub fn new(site: SiteIdx) -> Self {
        Self {
            site,
            half_edges: Vec::new(),
            needs_closing: false,
        }
    }

    /// Forgets about half-edges whose edges were discarded, and sorts the
    /// rest by angle around the site.
    pub fn prepare_half_edges(&mut self, edges: &EdgeVec<RawEdge>) {
        self.half_edges
            .retain(|h| edges[h.edge].endpoints().is_some());
        self.half_edges.sort_by(|a, b| b.angle.total_cmp(&a.angle));
    }
}

/// An edge of a Voronoi diagram.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Edge {
    /// The site on the left, walking from `va` to `vb`.
    pub left_site: SiteIdx,
    /// The site on the right, walking from `va` to `vb`.
    ///
    /// This is `None` for edges that run along the bounding box.
    pub right_site: Option<SiteIdx>,
    /// The start of the edge.
    pub va: Point,
    /// The end of the edge.
    pub vb: Point,
}

impl Edge {
    /// Does this edge run along the bounding box (as opposed to separating two cells)?
    pub fn is_border(&self) -> bool {
        self.right_site.is_none()
    }
}

/// One edge of a cell, oriented so that the cell's boundary runs from `start`
/// to `end`.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct HalfEdge {
    /// The underlying edge.
    pub edge: EdgeIdx,
    /// The angle (as returned by `atan2`) that the half-edges of a cell are sorted by.
    ///
    /// For edges between two sites, this is the direction from the cell's
    /// site to the other site.
    pub angle: f64,
    /// Where this half-edge starts.
    pub start: Point,
    /// Where this half-edge ends, which is also where the next one starts.
    pub end: Point,
}

/// The cell of a single site.
#[derive(Clone, Debug, PartialEq, serde::Serialize)]
pub struct Cell {
    /// The site that this cell belongs to.
    pub site: SiteIdx,
    /// The boundary of this cell.
    pub half_edges: Vec<HalfEdge>,
}

impl Cell {
    /// Does the boundary of this cell join up into a closed polygon?
    pub fn is_closed(&self) -> bool {
        !self.half_edges.is_empty()
            && self
                .half_edges
                .iter()
                .zip(self.half_edges.iter().cycle().skip(1))
                .all(|(h, next)| h.end.approx_eq(&next.start))
    }

    /// The corners of this cell's polygon, in boundary order.
    pub fn polygon(&self) -> Vec<Point> {
        self.half_edges.iter().map(|h| h.start).collect()
    }

    /// This cell's boundary, as a closed path.
    pub fn to_bez_path(&self) -> BezPath {
        let mut path = BezPath::new();
        let mut points = self.half_edges.iter().map(|h| h.start.to_kurbo());
        if let Some(first) = points.next() {
            path.move_to(first);
            for p in points {
                path.line_to(p);
            }
            path.close_path();
        }
        path
    }
}

/// A Voronoi diagram, clipped to a bounding box.
///
/// This owns all of its data; nothing in here refers back to the engine that
/// computed it.
#[derive(Clone, Debug, Default, PartialEq, serde::Serialize)]
pub struct Diagram {
    /// The distinct input sites, indexed by [`SiteIdx`].
    pub sites: Vec<Point>,
    /// All the distinct endpoints of all the edges.
    pub vertices: Vec<Point>,
    /// All the edges, including the ones along the bounding box.
    pub edges: Vec<Edge>,
    /// One cell per site, indexed by [`SiteIdx`].
    pub cells: Vec<Cell>,
}

impl Diagram {
    /// Builds a diagram out of the raw records.
    ///
    /// Discarded edges (the ones without both ends) are left out, and the
    /// remaining ones are renumbered.
    pub(crate) fn assemble(
        sites: &SiteVec<Point>,
        edges: &EdgeVec<RawEdge>,
        cells: &SiteVec<RawCell>,
    ) -> Diagram {
        let mut out_edges = Vec::with_capacity(edges.len());
        let mut renumber = vec![None; edges.len()];
        for (idx, edge) in edges.iter() {
            if let Some((va, vb)) = edge.endpoints() {
                renumber[idx.0] = Some(EdgeIdx(out_edges.len()));
                out_edges.push(Edge {
                    left_site: edge.left,
                    right_site: edge.right,
                    va,
                    vb,
                });
            }
        }

        let mut seen = HashSet::new();
        let mut vertices = Vec::new();
        for p in out_edges.iter().flat_map(|e| [e.va, e.vb]) {
            if seen.insert((p.x.to_bits(), p.y.to_bits())) {
                vertices.push(p);
            }
        }

        let out_cells = cells
            .values()
            .map(|cell| Cell {
                site: cell.site,
                half_edges: cell
                    .half_edges
                    .iter()
                    .filter_map(|h| {
                        Some(HalfEdge {
                            edge: renumber[h.edge.0]?,
                            angle: h.angle,
                            start: h.start(edges)?,
                            end: h.end(edges)?,
                        })
                    })
                    .collect(),
            })
            .collect();

        Diagram {
            sites: sites.values().copied().collect(),
            vertices,
            edges: out_edges,
            cells: out_cells,
        }
    }

    /// The cell belonging to a site.
    pub fn cell(&self, site: SiteIdx) -> &Cell {
        &self.cells[site.0]
    }

    /// The edge at an index.
    pub fn edge(&self, idx: EdgeIdx) -> &Edge {
        &self.edges[idx.0]
    }

    /// Iterates over the edges that separate two cells, skipping the ones
    /// that run along the bounding box.
    pub fn bisectors(&self) -> impl Iterator<Item = &Edge> + '_ {
        self.edges.iter().filter(|e| !e.is_border())
    }

    /// Renders this diagram as an SVG document, for debugging.
    #[cfg(feature = "debug-svg")]
    pub fn to_svg(&self) -> svg::Document {
        use svg::node::element::{path::Data, Circle, Line, Path};

        let mut document = svg::Document::new();
        let mut min = (f64::INFINITY, f64::INFINITY);
        let mut max = (f64::NEG_INFINITY, f64::NEG_INFINITY);
        for p in self.vertices.iter().chain(&self.sites) {
            min = (min.0.min(p.x), min.1.min(p.y));
            max = (max.0.max(p.x), max.1.max(p.y));
        }
        if min.0.is_finite() {
            document = document.set("viewBox", (min.0, min.1, max.0 - min.0, max.1 - min.1));
        }

        for cell in &self.cells {
            let mut data = Data::new();
            for (i, p) in cell.polygon().into_iter().enumerate() {
                data = if i == 0 {
                    data.move_to((p.x, p.y))
                } else {
                    data.line_to((p.x, p.y))
                };
            }
            document = document.add(
                Path::new()
                    .set("d", data.close())
                    .set("fill", "#94D2BD")
                    .set("fill-opacity", 0.3),
            );
        }
        for edge in &self.edges {
            let color = if edge.is_border() {
                "#AE2012"
            } else {
                "#005F73"
            };
            document = document.add(
                Line::new()
                    .set("x1", edge.va.x)
                    .set("y1", edge.va.y)
                    .set("x2", edge.vb.x)
                    .set("y2", edge.vb.y)
                    .set("stroke", color)
                    .set("stroke-width", 1),
            );
        }
        for site in &self.sites {
            document = document.add(
                Circle::new()
                    .set("cx", site.x)
                    .set("cy", site.y)
                    .set("r", 2)
                    .set("fill", "black"),
            );
        }
        document
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: f64, y: f64) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn set_start_follows_orientation() {
        let (a, b) = (SiteIdx(0), SiteIdx(1));
        let mut edge = RawEdge::new(a, b);

        // The first vertex always goes to `va`, and the edge takes on the
        // caller's orientation.
        edge.set_end(a, b, p(1.0, 1.0));
        assert_eq!(edge.left, b);
        assert_eq!(edge.right, Some(a));
        assert_eq!(edge.va, Some(p(1.0, 1.0)));
        assert_eq!(edge.vb, None);

        // Now the caller's left is our right, so this is our far end.
        edge.set_start(a, b, p(2.0, 2.0));
        assert_eq!(edge.va, Some(p(1.0, 1.0)));
        assert_eq!(edge.vb, Some(p(2.0, 2.0)));
    }

    #[test]
    fn half_edge_ends() {
        let (a, b) = (SiteIdx(0), SiteIdx(1));
        let mut edges = EdgeVec::default();
        let mut edge = RawEdge::new(a, b);
        edge.set_start(a, b, p(0.0, 0.0));
        edge.set_end(a, b, p(0.0, 10.0));
        let idx = edges.push(edge);

        let ha = RawHalfEdge::bisector(idx, a, p(-1.0, 5.0), p(1.0, 5.0));
        let hb = RawHalfEdge::bisector(idx, b, p(1.0, 5.0), p(-1.0, 5.0));
        assert_eq!(ha.start(&edges), Some(p(0.0, 0.0)));
        assert_eq!(ha.end(&edges), Some(p(0.0, 10.0)));
        assert_eq!(hb.start(&edges), Some(p(0.0, 10.0)));
        assert_eq!(hb.end(&edges), Some(p(0.0, 0.0)));
        assert_eq!(ha.angle, 0.0);
    }

    #[test]
    fn assemble_skips_discarded_edges() {
        let (a, b) = (SiteIdx(0), SiteIdx(1));
        let mut sites = SiteVec::default();
        sites.push(p(-1.0, 5.0));
        sites.push(p(1.0, 5.0));

        let mut edges = EdgeVec::default();
        let mut gone = RawEdge::new(a, b);
        gone.discard();
        let gone = edges.push(gone);
        let mut kept = RawEdge::new(a, b);
        kept.set_start(a, b, p(0.0, 0.0));
        kept.set_end(a, b, p(0.0, 10.0));
        let kept = edges.push(kept);

        let mut cells = SiteVec::default();
        let mut cell = RawCell::new(a);
        cell.half_edges
            .push(RawHalfEdge::bisector(gone, a, sites[a], sites[b]));
        cell.half_edges
            .push(RawHalfEdge::bisector(kept, a, sites[a], sites[b]));
        cell.prepare_half_edges(&edges);
        cells.push(cell);
        cells.push(RawCell::new(b));

        let diagram = Diagram::assemble(&sites, &edges, &cells);
        assert_eq!(diagram.edges.len(), 1);
        assert_eq!(diagram.vertices, vec![p(0.0, 0.0), p(0.0, 10.0)]);
        assert_eq!(diagram.cells[0].half_edges.len(), 1);
        assert_eq!(diagram.cells[0].half_edges[0].edge, EdgeIdx(0));
        assert!(!diagram.cells[0].is_closed());
    }
}
