//! A red-black tree whose order is decided by its callers.
//!
//! Nodes don't have keys. Instead, a caller finds a position by walking down
//! from [`RbTree::root`] using whatever comparison it likes (for the beachline,
//! breakpoint positions that move with the sweep), and then inserts a new node
//! immediately after an existing one. The tree only keeps itself balanced.
//!
//! Every node also sits in a doubly-linked list in in-order position, so
//! [`RbTree::prev`] and [`RbTree::next`] are constant-time. The links are
//! updated before any rebalancing happens, and rotations never touch them.
//!
//! Nodes live in an arena and are referred to by [`NodeId`]. Ids of removed
//! nodes get recycled, so don't hold on to an id after removing its node.

/// A handle to a node in an [`RbTree`].
#[derive(Clone, Copy, PartialEq, Eq, Hash)]
pub struct NodeId(usize);

impl std::fmt::Debug for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n_{}", self.0)
    }
}

#[derive(Clone, Debug)]
struct Node<T> {
    value: T,
    red: bool,
    parent: Option<NodeId>,
    left: Option<NodeId>,
    right: Option<NodeId>,
    prev: Option<NodeId>,
    next: Option<NodeId>,
}

/// An arena-backed red-black tree, with neighbor links.
#[derive(Clone, Debug)]
pub struct RbTree<T> {
    nodes: Vec<Option<Node<T>>>,
    free: Vec<usize>,
    root: Option<NodeId>,
    first: Option<NodeId>,
    len: usize,
}

impl<T> Default for RbTree<T> {
    fn default() -> Self {
        Self {
            nodes: Vec::new(),
            free: Vec::new(),
            root: None,
            first: None,
            len: 0,
        }
    }
}

impl<T> RbTree<T> {
    /// Creates an empty tree.
    pub fn new() -> Self {
        Self::default()
    }

    /// The number of nodes in the tree.
    pub fn len(&self) -> usize {
        self.len
    }

    /// Are we empty?
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// The root of the tree, where searches start.
    pub fn root(&self) -> Option<NodeId> {
        self.root
    }

    /// The smallest node in in-order position.
    pub fn first(&self) -> Option<NodeId> {
        self.first
    }

    /// The left child of `id`, for searching.
    pub fn left(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).left
    }

    /// The right child of `id`, for searching.
    pub fn right(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).right
    }

    /// The in-order predecessor of `id`.
    pub fn prev(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).prev
    }

    /// The in-order successor of `id`.
    pub fn next(&self, id: NodeId) -> Option<NodeId> {
        self.node(id).next
    }

    /// Iterates over ids and values, in order.
    pub fn iter(&self) -> Iter<'_, T> {
        Iter {
            tree: self,
            cur: self.first,
        }
    }

    fn node(&self, id: NodeId) -> &Node<T> {
        // unwrap: ids are only handed out for live nodes, and callers aren't
        // allowed to keep them after removal.
        self.nodes[id.0].as_ref().unwrap()
    }

    fn node_mut(&mut self, id: NodeId) -> &mut Node<T> {
        // unwrap: see `node`
        self.nodes[id.0].as_mut().unwrap()
    }

    fn is_red(&self, id: Option<NodeId>) -> bool {
        id.is_some_and(|id| self.node(id).red)
    }

    fn set_red(&mut self, id: NodeId, red: bool) {
        self.node_mut(id).red = red;
    }

    fn alloc(&mut self, value: T) -> NodeId {
        let node = Node {
            value,
            red: true,
            parent: None,
            left: None,
            right: None,
            prev: None,
            next: None,
        };
        self.len += 1;
        if let Some(idx) = self.free.pop() {
            self.nodes[idx] = Some(node);
            NodeId(idx)
        } else {
            self.nodes.push(Some(node));
            NodeId(self.nodes.len() - 1)
        }
    }

    fn leftmost(&self, mut id: NodeId) -> NodeId {
        while let Some(left) = self.node(id).left {
            id = left;
        }
        id
    }

    /// Inserts a new value immediately after `after` in the in-order sequence.
    ///
    /// If `after` is `None`, the new value becomes the first one. Returns the
    /// new node's id.
    pub fn insert_after(&mut self, after: Option<NodeId>, value: T) -> NodeId {
        let id = self.alloc(value);

        let parent = if let Some(after) = after {
            let next = self.node(after).next;
            let node = self.node_mut(id);
            node.prev = Some(after);
            node.next = next;
            if let Some(next) = next {
                self.node_mut(next).prev = Some(id);
            }
            self.node_mut(after).next = Some(id);

            // The new node goes at the leftmost position of `after`'s right subtree.
            if let Some(right) = self.node(after).right {
                let parent = self.leftmost(right);
                self.node_mut(parent).left = Some(id);
                Some(parent)
            } else {
                self.node_mut(after).right = Some(id);
                Some(after)
            }
        } else if let Some(root) = self.root {
            let first = self.leftmost(root);
            self.node_mut(id).next = Some(first);
            let first_node = self.node_mut(first);
            first_node.prev = Some(id);
            first_node.left = Some(id);
            self.first = Some(id);
            Some(first)
        } else {
            self.root = Some(id);
            self.first = Some(id);
            None
        };
        self.node_mut(id).parent = parent;

        self.insert_fixup(id);
        id
    }

    fn insert_fixup(&mut self, mut id: NodeId) {
        while let Some(mut parent) = self.node(id).parent {
            if !self.node(parent).red {
                break;
            }
            // unwrap: the root is black, so a red node has a parent
            let grandpa = self.node(parent).parent.unwrap();
            if self.node(grandpa).left == Some(parent) {
                let uncle = self.node(grandpa).right;
                if let Some(uncle) = uncle.filter(|&u| self.node(u).red) {
                    self.set_red(parent, false);
                    self.set_red(uncle, false);
                    self.set_red(grandpa, true);
                    id = grandpa;
                } else {
                    if self.node(parent).right == Some(id) {
                        self.rotate_left(parent);
                        id = parent;
                        // unwrap: we just rotated a node above `id`
                        parent = self.node(id).parent.unwrap();
                    }
                    self.set_red(parent, false);
                    self.set_red(grandpa, true);
                    self.rotate_right(grandpa);
                }
            } else {
                let uncle = self.node(grandpa).left;
                if let Some(uncle) = uncle.filter(|&u| self.node(u).red) {
                    self.set_red(parent, false);
                    self.set_red(uncle, false);
                    self.set_red(grandpa, true);
                    id = grandpa;
                } else {
                    if self.node(parent).left == Some(id) {
                        self.rotate_right(parent);
                        id = parent;
                        // unwrap: we just rotated a node above `id`
                        parent = self.node(id).parent.unwrap();
                    }
                    self.set_red(parent, false);
                    self.set_red(grandpa, true);
                    self.rotate_left(grandpa);
                }
            }
        }
        if let Some(root) = self.root {
            self.set_red(root, false);
        }
    }

    /// Removes a node from the tree, returning its value.
    pub fn remove(&mut self, id: NodeId) -> T {
        let Node {
            red,
            parent,
            left,
            right,
            prev,
            next,
            ..
        } = *self.node(id);

        if let Some(next) = next {
            self.node_mut(next).prev = prev;
        }
        if let Some(prev) = prev {
            self.node_mut(prev).next = next;
        } else {
            self.first = next;
        }

        let replacement = match (left, right) {
            (None, _) => right,
            (_, None) => left,
            (Some(_), Some(right)) => Some(self.leftmost(right)),
        };
        self.replace_child(parent, id, replacement);

        // After splicing, `hole` is the (possibly empty) position that lost a
        // node, and `hole_parent` is its parent.
        let (removed_red, hole, hole_parent) = match (left, right, replacement) {
            (Some(left), Some(right), Some(succ)) => {
                let succ_red = self.node(succ).red;
                self.set_red(succ, red);
                self.node_mut(succ).left = Some(left);
                self.node_mut(left).parent = Some(succ);
                let hole = self.node(succ).right;
                let hole_parent = if succ != right {
                    // unwrap: `succ` is deeper than `right`, so it has a parent
                    let succ_parent = self.node(succ).parent.unwrap();
                    self.node_mut(succ_parent).left = hole;
                    self.node_mut(succ).right = Some(right);
                    self.node_mut(right).parent = Some(succ);
                    succ_parent
                } else {
                    succ
                };
                self.node_mut(succ).parent = parent;
                (succ_red, hole, Some(hole_parent))
            }
            _ => (red, replacement, parent),
        };
        if let Some(hole) = hole {
            self.node_mut(hole).parent = hole_parent;
        }

        // unwrap: `node` succeeded above, so the slot is occupied
        let value = self.nodes[id.0].take().unwrap().value;
        self.free.push(id.0);
        self.len -= 1;

        if !removed_red {
            self.remove_fixup(hole, hole_parent);
        }
        value
    }

    fn remove_fixup(&mut self, mut hole: Option<NodeId>, mut parent: Option<NodeId>) {
        if let Some(h) = hole.filter(|&h| self.node(h).red) {
            self.set_red(h, false);
            return;
        }

        loop {
            if hole == self.root {
                break;
            }
            // unwrap: only the root has no parent
            let p = parent.unwrap();
            let sibling = if self.node(p).left == hole {
                // unwrap: the hole is short a black node, so its sibling
                // subtree has at least one.
                let mut sibling = self.node(p).right.unwrap();
                if self.node(sibling).red {
                    self.set_red(sibling, false);
                    self.set_red(p, true);
                    self.rotate_left(p);
                    sibling = self.node(p).right.unwrap();
                }
                let (sl, sr) = (self.node(sibling).left, self.node(sibling).right);
                if self.is_red(sl) || self.is_red(sr) {
                    if !self.is_red(sr) {
                        // unwrap: one of the children is red, and it isn't `sr`
                        self.set_red(sl.unwrap(), false);
                        self.set_red(sibling, true);
                        self.rotate_right(sibling);
                        sibling = self.node(p).right.unwrap();
                    }
                    let p_red = self.node(p).red;
                    self.set_red(sibling, p_red);
                    self.set_red(p, false);
                    // unwrap: this is the red child
                    let sr = self.node(sibling).right.unwrap();
                    self.set_red(sr, false);
                    self.rotate_left(p);
                    hole = self.root;
                    break;
                }
                sibling
            } else {
                // unwrap: as above, mirrored
                let mut sibling = self.node(p).left.unwrap();
                if self.node(sibling).red {
                    self.set_red(sibling, false);
                    self.set_red(p, true);
                    self.rotate_right(p);
                    sibling = self.node(p).left.unwrap();
                }
                let (sl, sr) = (self.node(sibling).left, self.node(sibling).right);
                if self.is_red(sl) || self.is_red(sr) {
                    if !self.is_red(sl) {
                        self.set_red(sr.unwrap(), false);
                        self.set_red(sibling, true);
                        self.rotate_left(sibling);
                        sibling = self.node(p).left.unwrap();
                    }
                    let p_red = self.node(p).red;
                    self.set_red(sibling, p_red);
                    self.set_red(p, false);
                    let sl = self.node(sibling).left.unwrap();
                    self.set_red(sl, false);
                    self.rotate_right(p);
                    hole = self.root;
                    break;
                }
                sibling
            };
            self.set_red(sibling, true);
            hole = Some(p);
            parent = self.node(p).parent;
            if self.node(p).red {
                break;
            }
        }
        if let Some(h) = hole {
            self.set_red(h, false);
        }
    }

    fn replace_child(&mut self, parent: Option<NodeId>, old: NodeId, new: Option<NodeId>) {
        match parent {
            Some(p) => {
                let p = self.node_mut(p);
                if p.left == Some(old) {
                    p.left = new;
                } else {
                    p.right = new;
                }
            }
            None => self.root = new,
        }
    }

    fn rotate_left(&mut self, p: NodeId) {
        // unwrap: we only rotate left around nodes with a right child
        let q = self.node(p).right.unwrap();
        let parent = self.node(p).parent;
        self.replace_child(parent, p, Some(q));
        self.node_mut(q).parent = parent;
        self.node_mut(p).parent = Some(q);
        let inner = self.node(q).left;
        self.node_mut(p).right = inner;
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(p);
        }
        self.node_mut(q).left = Some(p);
    }

    fn rotate_right(&mut self, p: NodeId) {
        // unwrap: we only rotate right around nodes with a left child
        let q = self.node(p).left.unwrap();
        let parent = self.node(p).parent;
        self.replace_child(parent, p, Some(q));
        self.node_mut(q).parent = parent;
        self.node_mut(p).parent = Some(q);
        let inner = self.node(q).right;
        self.node_mut(p).left = inner;
        if let Some(inner) = inner {
            self.node_mut(inner).parent = Some(p);
        }
        self.node_mut(q).right = Some(p);
    }

    /// Checks the red-black invariants and the consistency of the neighbor links.
    ///
    /// Panics if anything is wrong.
    pub fn check_invariants(&self) {
        fn black_height<T>(tree: &RbTree<T>, id: Option<NodeId>, parent: Option<NodeId>) -> usize {
            let Some(id) = id else {
                return 1;
            };
            let node = tree.node(id);
            assert_eq!(node.parent, parent, "bad parent link at {id:?}");
            if node.red {
                assert!(!tree.is_red(node.left), "red node {id:?} has a red child");
                assert!(!tree.is_red(node.right), "red node {id:?} has a red child");
            }
            let left = black_height(tree, node.left, Some(id));
            let right = black_height(tree, node.right, Some(id));
            assert_eq!(left, right, "unequal black heights below {id:?}");
            left + usize::from(!node.red)
        }

        fn in_order<T>(tree: &RbTree<T>, id: Option<NodeId>, acc: &mut Vec<NodeId>) {
            if let Some(id) = id {
                in_order(tree, tree.node(id).left, acc);
                acc.push(id);
                in_order(tree, tree.node(id).right, acc);
            }
        }

        assert!(!self.is_red(self.root), "red root");
        black_height(self, self.root, None);

        let mut by_shape = Vec::new();
        in_order(self, self.root, &mut by_shape);
        let by_links: Vec<_> = self.iter().map(|(id, _)| id).collect();
        assert_eq!(by_shape, by_links);
        assert_eq!(by_shape.len(), self.len);
        assert_eq!(self.first, by_shape.first().copied());
        for pair in by_links.windows(2) {
            assert_eq!(self.node(pair[1]).prev, Some(pair[0]));
        }
    }
}

impl<T> std::ops::Index<NodeId> for RbTree<T> {
    type Output = T;

    fn index(&self, index: NodeId) -> &T {
        &self.node(index).value
    }
}

impl<T> std::ops::IndexMut<NodeId> for RbTree<T> {
    fn index_mut(&mut self, index: NodeId) -> &mut T {
        &mut self.node_mut(index).value
    }
}

/// An in-order iterator over an [`RbTree`], following the neighbor links.
pub struct Iter<'a, T> {
    tree: &'a RbTree<T>,
    cur: Option<NodeId>,
}

impl<'a, T> Iterator for Iter<'a, T> {
    type Item = (NodeId, &'a T);

    fn next(&mut self) -> Option<Self::Item> {
        let id = self.cur?;
        let node = self.tree.node(id);
        self.cur = node.next;
        Some((id, &node.value))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(tree: &RbTree<i32>) -> Vec<i32> {
        tree.iter().map(|(_, x)| *x).collect()
    }

    #[test]
    fn insert_after() {
        let mut tree = RbTree::new();
        let a = tree.insert_after(None, 1);
        let c = tree.insert_after(Some(a), 3);
        let b = tree.insert_after(Some(a), 2);
        let z = tree.insert_after(None, 0);
        tree.check_invariants();

        assert_eq!(values(&tree), vec![0, 1, 2, 3]);
        assert_eq!(tree.first(), Some(z));
        assert_eq!(tree.next(a), Some(b));
        assert_eq!(tree.prev(c), Some(b));
        assert_eq!(tree.next(c), None);
        assert_eq!(tree.prev(z), None);
    }

    #[test]
    fn remove() {
        let mut tree = RbTree::new();
        let mut ids = Vec::new();
        let mut last = None;
        for i in 0..20 {
            last = Some(tree.insert_after(last, i));
            ids.push(last.unwrap());
            tree.check_invariants();
        }

        for &id in ids.iter().step_by(3) {
            tree.remove(id);
            tree.check_invariants();
        }
        let expected: Vec<_> = (0..20).filter(|i| i % 3 != 0).collect();
        assert_eq!(values(&tree), expected);
        assert_eq!(tree[tree.first().unwrap()], 1);

        // Removed slots get recycled.
        let id = tree.insert_after(None, -1);
        assert!(ids.contains(&id));
        tree.check_invariants();
        assert_eq!(tree.len(), expected.len() + 1);
    }

    #[test]
    fn remove_everything() {
        let mut tree = RbTree::new();
        let mut ids = Vec::new();
        for i in 0..32 {
            ids.push(tree.insert_after(None, i));
        }
        for id in ids.into_iter().rev() {
            tree.remove(id);
            tree.check_invariants();
        }
        assert!(tree.is_empty());
        assert_eq!(tree.root(), None);
        assert_eq!(tree.first(), None);
    }

    #[derive(Debug)]
    enum Op {
        Insert { after: usize, val: i32 },
        InsertFirst { val: i32 },
        Remove { idx: usize },
    }

    impl<'a> arbitrary::Arbitrary<'a> for Op {
        fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
            Ok(match u.int_in_range(0..=2)? {
                0 => Op::Insert {
                    after: u.arbitrary()?,
                    val: u.arbitrary()?,
                },
                1 => Op::InsertFirst {
                    val: u.arbitrary()?,
                },
                _ => Op::Remove {
                    idx: u.arbitrary()?,
                },
            })
        }
    }

    // Compare against a `Vec` of (id, value), which is obviously correct.
    #[test]
    fn matches_vec_model() {
        arbtest::arbtest(|u| {
            let ops: Vec<Op> = u.arbitrary()?;
            let mut tree = RbTree::new();
            let mut model: Vec<(NodeId, i32)> = Vec::new();
            for op in ops {
                match op {
                    Op::Insert { after, val } if !model.is_empty() => {
                        let pos = after % model.len();
                        let id = tree.insert_after(Some(model[pos].0), val);
                        model.insert(pos + 1, (id, val));
                    }
                    Op::Insert { val, .. } | Op::InsertFirst { val } => {
                        let id = tree.insert_after(None, val);
                        model.insert(0, (id, val));
                    }
                    Op::Remove { idx } => {
                        if !model.is_empty() {
                            let (id, val) = model.remove(idx % model.len());
                            assert_eq!(tree.remove(id), val);
                        }
                    }
                }
                tree.check_invariants();
                assert_eq!(
                    tree.iter().map(|(id, x)| (id, *x)).collect::<Vec<_>>(),
                    model
                );
            }
            Ok(())
        });
    }
}
