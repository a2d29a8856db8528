#![no_main]

use arbitrary::{Arbitrary, Unstructured};

use fortune_sweep::rbtree::{NodeId, RbTree};
use libfuzzer_sys::fuzz_target;

#[derive(Arbitrary, Debug)]
enum Op {
    InsertAfter { idx: usize, val: i32 },
    InsertFirst { val: i32 },
    Remove { idx: usize },
}

impl Op {
    fn apply(&self, vec: &mut Vec<(NodeId, i32)>, tree: &mut RbTree<i32>) {
        match self {
            Op::InsertAfter { idx, val } if !vec.is_empty() => {
                let pos = *idx % vec.len();
                let id = tree.insert_after(Some(vec[pos].0), *val);
                vec.insert(pos + 1, (id, *val));
            }
            Op::InsertAfter { val, .. } | Op::InsertFirst { val } => {
                let id = tree.insert_after(None, *val);
                vec.insert(0, (id, *val));
            }
            Op::Remove { idx } => {
                if !vec.is_empty() {
                    let (id, val) = vec.remove(*idx % vec.len());
                    assert_eq!(tree.remove(id), val);
                }
            }
        }
    }
}

fn arbitrary_ops(mut u: Unstructured) -> Result<(), arbitrary::Error> {
    let len = u.arbitrary_len::<Op>()?;
    let mut vec = Vec::new();
    let mut tree = RbTree::new();
    for _ in 0..len {
        let op: Op = u.arbitrary()?;
        op.apply(&mut vec, &mut tree);
        tree.check_invariants();

        assert_eq!(tree.len(), vec.len());
        assert_eq!(
            tree.iter().map(|(id, x)| (id, *x)).collect::<Vec<_>>(),
            vec
        );
        if let Some(&(last, _)) = vec.last() {
            assert_eq!(tree.next(last), None);
            assert_eq!(tree.first(), Some(vec[0].0));
        }
    }
    Ok(())
}

fuzz_target!(|data: &[u8]| {
    let u = Unstructured::new(data);
    let _ = arbitrary_ops(u);
});
