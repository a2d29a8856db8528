//! Utilities for fuzz and/or property testing using `arbitrary`.

use arbitrary::Unstructured;

use crate::{BoundingBox, Point};

/// Generate an arbitrary float in some range.
pub fn float_in_range(
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let num: u32 = u.arbitrary()?;
    let t = num as f64 / u32::MAX as f64;
    Ok((1.0 - t) * start + t * end)
}

/// Generate a float in some range, but give it a chance to be close to another float.
fn another_float_in_range(
    orig: f64,
    start: f64,
    end: f64,
    u: &mut Unstructured<'_>,
) -> Result<f64, arbitrary::Error> {
    let close: bool = u.arbitrary()?;
    if close {
        let ulps: i32 = u.int_in_range(-32..=32)?;
        let scale = 1.0f64 + ulps as f64 * f64::EPSILON;
        Ok((orig * scale).clamp(start, end))
    } else {
        float_in_range(start, end, u)
    }
}

/// Generate an arbitrary bounding box, with sides somewhere in `-size..=size`.
pub fn bbox(size: f64, u: &mut Unstructured<'_>) -> Result<BoundingBox, arbitrary::Error> {
    let x0 = float_in_range(-size, size, u)?;
    let x1 = float_in_range(-size, size, u)?;
    let y0 = float_in_range(-size, size, u)?;
    let y1 = float_in_range(-size, size, u)?;
    let (xl, xr) = (x0.min(x1), x0.max(x1) + 1.0);
    let (yt, yb) = (y0.min(y1), y0.max(y1) + 1.0);
    Ok(BoundingBox::new(xl, xr, yt, yb))
}

/// Generate an arbitrary site near `bbox`.
///
/// The site might land on the bounding box, or be a copy of (or very close
/// to) `prev`, or share a coordinate with it.
pub fn site(
    bbox: &BoundingBox,
    prev: Option<Point>,
    u: &mut Unstructured<'_>,
) -> Result<Point, arbitrary::Error> {
    let w = bbox.xr - bbox.xl;
    let h = bbox.yb - bbox.yt;
    let (xl, xr) = (bbox.xl - w / 4.0, bbox.xr + w / 4.0);
    let (yt, yb) = (bbox.yt - h / 4.0, bbox.yb + h / 4.0);

    let Some(prev) = prev else {
        return Ok(Point::new(
            float_in_range(xl, xr, u)?,
            float_in_range(yt, yb, u)?,
        ));
    };
    Ok(match u.int_in_range(0..=4)? {
        0 => prev,
        1 => Point::new(prev.x, float_in_range(yt, yb, u)?),
        2 => Point::new(float_in_range(xl, xr, u)?, prev.y),
        3 => Point::new(
            another_float_in_range(prev.x, xl, xr, u)?,
            another_float_in_range(prev.y, yt, yb, u)?,
        ),
        _ => {
            let x = *u.choose(&[xl, bbox.xl, bbox.xr, xr])?;
            Point::new(x, float_in_range(yt, yb, u)?)
        }
    })
}

/// Generate a collection of sites near `bbox`, with a bias towards
/// degenerate configurations: duplicates, shared coordinates, and sites on
/// the boundary.
pub fn sites(bbox: &BoundingBox, u: &mut Unstructured<'_>) -> Result<Vec<Point>, arbitrary::Error> {
    let mut ret = Vec::new();
    let mut prev = None;
    for _ in 0..u.int_in_range(0..=64)? {
        let p = site(bbox, prev, u)?;
        ret.push(p);
        prev = Some(p);
    }
    Ok(ret)
}

/// Generate the sites of a regular grid, possibly with some duplicates.
///
/// Grids have lots of co-circular sites.
pub fn grid(bbox: &BoundingBox, u: &mut Unstructured<'_>) -> Result<Vec<Point>, arbitrary::Error> {
    let rows = u.int_in_range(1..=8)?;
    let cols = u.int_in_range(1..=8)?;
    let dx = (bbox.xr - bbox.xl) / cols as f64;
    let dy = (bbox.yb - bbox.yt) / rows as f64;
    let mut ret = Vec::new();
    for i in 0..rows {
        for j in 0..cols {
            let p = Point::new(
                bbox.xl + (j as f64 + 0.5) * dx,
                bbox.yt + (i as f64 + 0.5) * dy,
            );
            ret.push(p);
            if u.ratio(1, 8)? {
                ret.push(p);
            }
        }
    }
    Ok(ret)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sites_stay_near_the_box() {
        arbtest::arbtest(|u| {
            let bbox = bbox(1e3, u)?;
            let sites = sites(&bbox, u)?;
            let w = bbox.xr - bbox.xl;
            let h = bbox.yb - bbox.yt;
            for p in sites {
                assert!(p.x >= bbox.xl - w / 4.0 - 1e-6 && p.x <= bbox.xr + w / 4.0 + 1e-6);
                assert!(p.y >= bbox.yt - h / 4.0 - 1e-6 && p.y <= bbox.yb + h / 4.0 + 1e-6);
            }
            Ok(())
        });
    }

    #[test]
    fn arbitrary_diagrams() {
        arbtest::arbtest(|u| {
            let bbox = bbox(1e3, u)?;
            let sites = if u.arbitrary()? {
                sites(&bbox, u)?
            } else {
                grid(&bbox, u)?
            };
            let diagram = crate::compute(sites, &bbox).unwrap();
            for edge in &diagram.edges {
                assert!(bbox.contains(&edge.va));
                assert!(bbox.contains(&edge.vb));
            }
            if diagram.sites.len() > 1 {
                for (site, cell) in diagram.sites.iter().zip(&diagram.cells) {
                    assert!(!bbox.contains(site) || cell.is_closed(), "{cell:?}");
                }
            }
            Ok(())
        });
    }
}
