//! Utilities for generating examples, benchmarks, and test cases.
//!
//! Everything here is deterministic: the "random" layouts come from a fixed
//! hash of the site's index, so benchmarks are comparable between runs.

use crate::Point;

/// Generate an `n` by `n` grid of sites, `spacing` apart, with the first one
/// at `(x0, y0)`.
///
/// Every four neighboring sites are co-circular, so this is close to the
/// worst case for degenerate circle events.
pub fn grid((x0, y0): (f64, f64), spacing: f64, n: usize) -> Vec<Point> {
    let mut ret = Vec::with_capacity(n * n);
    for i in 0..n {
        let y = y0 + i as f64 * spacing;
        for j in 0..n {
            ret.push(Point::new(x0 + j as f64 * spacing, y));
        }
    }
    ret
}

/// Generate `n` sites evenly spaced on a circle.
///
/// All of these sites are co-circular, and they share a single Voronoi
/// vertex at `center`.
pub fn ring(center: (f64, f64), radius: f64, n: usize) -> Vec<Point> {
    (0..n)
        .map(|i| {
            let theta = std::f64::consts::TAU * i as f64 / n as f64;
            Point::new(
                center.0 + radius * theta.cos(),
                center.1 + radius * theta.sin(),
            )
        })
        .collect()
}

/// Generate `n` sites scattered over the rectangle `[0, width] x [0, height]`.
///
/// The sites aren't really random, but there are no obvious patterns and
/// (with overwhelming probability) no degeneracies.
pub fn scattered(width: f64, height: f64, n: usize) -> Vec<Point> {
    (0..n as u64)
        .map(|i| {
            let h = mix(i);
            Point::new(width * unit(h), height * unit(h >> 32))
        })
        .collect()
}

/// Generate an `n` by `n` grid (as in [`grid`]) with each site nudged by up
/// to `jitter` in each direction.
///
/// With a small `jitter`, this has lots of almost-co-circular sites.
pub fn jittered_grid((x0, y0): (f64, f64), spacing: f64, jitter: f64, n: usize) -> Vec<Point> {
    grid((x0, y0), spacing, n)
        .into_iter()
        .enumerate()
        .map(|(i, p)| {
            let h = mix(i as u64);
            Point::new(
                p.x + jitter * (2.0 * unit(h) - 1.0),
                p.y + jitter * (2.0 * unit(h >> 32) - 1.0),
            )
        })
        .collect()
}

// A splitmix64 step.
fn mix(i: u64) -> u64 {
    let mut z = i.wrapping_add(1).wrapping_mul(0x9e37_79b9_7f4a_7c15);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

// The low 32 bits of `h`, scaled to `[0, 1]`.
fn unit(h: u64) -> f64 {
    (h & 0xffff_ffff) as f64 / u32::MAX as f64
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::BoundingBox;

    #[test]
    fn grid_cells_are_squares() {
        let sites = grid((50.0, 50.0), 100.0, 4);
        assert_eq!(sites.len(), 16);
        let diagram = crate::compute(sites, &BoundingBox::new(0.0, 400.0, 0.0, 400.0)).unwrap();
        assert!(diagram.cells.iter().all(|c| c.half_edges.len() == 4));
    }

    #[test]
    fn ring_has_one_center() {
        let sites = ring((200.0, 200.0), 100.0, 8);
        let diagram = crate::compute(sites, &BoundingBox::new(0.0, 400.0, 0.0, 400.0)).unwrap();
        let center = Point::new(200.0, 200.0);
        for edge in diagram.bisectors() {
            assert!(edge.va.distance(&center) < 1e-6 || edge.vb.distance(&center) < 1e-6);
        }
    }

    #[test]
    fn scattered_is_deterministic() {
        let a = scattered(10.0, 20.0, 50);
        assert_eq!(a, scattered(10.0, 20.0, 50));
        assert!(a
            .iter()
            .all(|p| (0.0..=10.0).contains(&p.x) && (0.0..=20.0).contains(&p.y)));
    }
}
