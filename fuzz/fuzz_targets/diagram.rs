#![no_main]

use arbitrary::Unstructured;

use fortune_sweep::{compute, compute_all_steps, BoundingBox, Point};
use libfuzzer_sys::fuzz_target;

fn check(sites: Vec<Point>, bbox: BoundingBox) {
    let diagram = compute(sites.iter().copied(), &bbox).unwrap();
    for edge in &diagram.edges {
        assert!(bbox.contains(&edge.va));
        assert!(bbox.contains(&edge.vb));
    }
    if diagram.sites.len() > 1 {
        for (site, cell) in diagram.sites.iter().zip(&diagram.cells) {
            assert!(!bbox.contains(site) || cell.is_closed(), "{cell:?}");
        }
    }

    let last = compute_all_steps(sites, &bbox)
        .unwrap()
        .last()
        .unwrap()
        .unwrap();
    assert!(last.done);
    assert_eq!(last.diagram, diagram);
}

fn arbitrary_diagram(mut u: Unstructured) -> Result<(), arbitrary::Error> {
    let bbox = fortune_sweep::arbitrary::bbox(1e3, &mut u)?;
    let sites = if u.arbitrary()? {
        fortune_sweep::arbitrary::sites(&bbox, &mut u)?
    } else {
        fortune_sweep::arbitrary::grid(&bbox, &mut u)?
    };
    check(sites, bbox);
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let u = Unstructured::new(data);
    let _ = arbitrary_diagram(u);
});
