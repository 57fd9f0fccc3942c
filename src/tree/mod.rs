//! State tree and zipper cursor (§4.E).
//!
//! Execution forks rather than branches-and-forgets, so the history
//! of a run is a binary tree: `Trunk` nodes are single-child routers
//! (straight-line execution advanced the context one step), `Branch`
//! nodes record a fork (the two children are the taken/not-taken
//! successors of a `CondJump`), and `Leaf` nodes are frontier points
//! still awaiting a step. Rather than the recursive boxed ADT the
//! distilled design sketches, nodes live in an arena keyed by a
//! monotonic [`NodeId`]; only `Leaf` nodes carry a payload, and the
//! authoritative `Context` data for a leaf lives in the engine's
//! `Trace` map, not in the tree itself. This keeps the zipper's
//! footprint O(depth): it holds indices, never clones contexts.

pub mod export;

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u64);

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "n{}", self.0)
    }
}

#[derive(Clone, Debug)]
pub enum NodeKind {
    /// Frontier: a pending context, not yet stepped.
    Leaf,
    /// Straight-line continuation.
    Trunk { child: NodeId },
    /// A fork: `taken` is the branch where the guard held.
    Branch { taken: NodeId, not_taken: NodeId },
}

#[derive(Clone, Debug)]
pub struct Node {
    pub id: NodeId,
    pub parent: Option<NodeId>,
    pub kind: NodeKind,
}

/// Arena of every node ever created during a run. Node IDs are
/// monotonically increasing in the order nodes are inserted, which
/// for a depth-first construction (the engine's step loop) gives a
/// stable pre-order numbering (§4.E, testable property 7).
#[derive(Clone, Debug, Default)]
pub struct Tree {
    nodes: Vec<Node>,
}

impl Tree {
    pub fn new() -> Self {
        let root = Node { id: NodeId(0), parent: None, kind: NodeKind::Leaf };
        Self { nodes: vec![root] }
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn get(&self, id: NodeId) -> &Node {
        &self.nodes[id.0 as usize]
    }

    fn next_id(&self) -> NodeId {
        NodeId(self.nodes.len() as u64)
    }

    /// Turn a leaf into a `Trunk`, inserting and returning its single
    /// successor leaf.
    pub fn insert1(&mut self, at: NodeId) -> NodeId {
        assert!(matches!(self.get(at).kind, NodeKind::Leaf), "insert1 on a non-leaf");
        let child = self.next_id();
        self.nodes.push(Node { id: child, parent: Some(at), kind: NodeKind::Leaf });
        self.nodes[at.0 as usize].kind = NodeKind::Trunk { child };
        child
    }

    /// Turn a leaf into a `Branch`, inserting and returning the
    /// `(taken, not_taken)` successor leaves.
    pub fn insert2(&mut self, at: NodeId) -> (NodeId, NodeId) {
        assert!(matches!(self.get(at).kind, NodeKind::Leaf), "insert2 on a non-leaf");
        let taken = self.next_id();
        self.nodes.push(Node { id: taken, parent: Some(at), kind: NodeKind::Leaf });
        let not_taken = self.next_id();
        self.nodes.push(Node { id: not_taken, parent: Some(at), kind: NodeKind::Leaf });
        self.nodes[at.0 as usize].kind = NodeKind::Branch { taken, not_taken };
        (taken, not_taken)
    }

    /// Every still-pending frontier node, in ID order.
    pub fn leafs(&self) -> Vec<NodeId> {
        self.nodes
            .iter()
            .filter(|n| matches!(n.kind, NodeKind::Leaf))
            .map(|n| n.id)
            .collect()
    }

    /// Every node ID that currently exists, in ID (insertion) order.
    pub fn keys(&self) -> Vec<NodeId> {
        self.nodes.iter().map(|n| n.id).collect()
    }

    /// Find the path from the root down to `target`, as a sequence of
    /// `Crumb`s a zipper can replay via `travel`.
    pub fn find_loc(&self, target: NodeId) -> Option<Vec<Crumb>> {
        let mut path = Vec::new();
        let mut current = target;
        while let Some(parent) = self.get(current).parent {
            let crumb = match self.get(parent).kind {
                NodeKind::Trunk { .. } => Crumb::Down,
                NodeKind::Branch { taken, .. } if taken == current => Crumb::Left,
                NodeKind::Branch { not_taken, .. } if not_taken == current => Crumb::Right,
                _ => unreachable!("parent pointer inconsistent with child's position"),
            };
            path.push(crumb);
            current = parent;
        }
        path.reverse();
        Some(path)
    }
}

/// A single move recorded by the zipper on its way down from the
/// root, so it can retrace its steps back up (`up`) without storing
/// more than the current node and its breadcrumb trail.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Crumb {
    Down,
    Left,
    Right,
}

/// Cursor into a `Tree`. Holds only the current node and the
/// breadcrumbs back to the root — O(depth) regardless of tree size.
#[derive(Clone, Debug)]
pub struct Zipper {
    current: NodeId,
    crumbs: Vec<Crumb>,
}

impl Zipper {
    pub fn at_root(tree: &Tree) -> Self {
        Self { current: tree.root(), crumbs: Vec::new() }
    }

    pub fn current(&self) -> NodeId {
        self.current
    }

    pub fn down(&mut self, tree: &Tree, to: NodeId) {
        self.crumbs.push(Crumb::Down);
        self.current = to;
        let _ = tree;
    }

    pub fn left(&mut self, tree: &Tree, to: NodeId) {
        self.crumbs.push(Crumb::Left);
        self.current = to;
        let _ = tree;
    }

    pub fn right(&mut self, tree: &Tree, to: NodeId) {
        self.crumbs.push(Crumb::Right);
        self.current = to;
        let _ = tree;
    }

    pub fn up(&mut self, tree: &Tree) -> Option<NodeId> {
        self.crumbs.pop()?;
        self.current = tree.get(self.current).parent?;
        Some(self.current)
    }

    pub fn top(&mut self, tree: &Tree) {
        while self.up(tree).is_some() {}
    }

    /// Follow a crumb path from the current position, descending into
    /// children in order. Used to jump straight to a node found via
    /// `Tree::find_loc` without re-deriving each step by hand.
    pub fn travel(&mut self, tree: &Tree, path: &[Crumb]) {
        for crumb in path {
            let node = tree.get(self.current);
            let next = match (crumb, &node.kind) {
                (Crumb::Down, NodeKind::Trunk { child }) => *child,
                (Crumb::Left, NodeKind::Branch { taken, .. }) => *taken,
                (Crumb::Right, NodeKind::Branch { not_taken, .. }) => *not_taken,
                _ => panic!("crumb does not match node shape during travel"),
            };
            self.crumbs.push(*crumb);
            self.current = next;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert1_extends_a_leaf_into_a_trunk() {
        let mut tree = Tree::new();
        let root = tree.root();
        let child = tree.insert1(root);
        assert!(matches!(tree.get(root).kind, NodeKind::Trunk { .. }));
        assert!(matches!(tree.get(child).kind, NodeKind::Leaf));
        assert_eq!(tree.get(child).parent, Some(root));
    }

    #[test]
    fn insert2_forks_a_leaf_into_a_branch() {
        let mut tree = Tree::new();
        let root = tree.root();
        let (taken, not_taken) = tree.insert2(root);
        assert_ne!(taken, not_taken);
        assert!(matches!(tree.get(root).kind, NodeKind::Branch { .. }));
        assert_eq!(tree.leafs(), vec![taken, not_taken]);
    }

    #[test]
    fn leafs_only_reports_pending_frontier_nodes() {
        let mut tree = Tree::new();
        let root = tree.root();
        let child = tree.insert1(root);
        assert_eq!(tree.leafs(), vec![child]);
    }

    #[test]
    fn node_ids_are_assigned_in_preorder_insertion_order() {
        // Property 7.
        let mut tree = Tree::new();
        let root = tree.root();
        let (a, b) = tree.insert2(root);
        let c = tree.insert1(a);
        assert_eq!(tree.keys(), vec![NodeId(0), a, b, c]);
        assert!(a.0 < b.0 && b.0 < c.0);
    }

    #[test]
    fn zipper_round_trips_down_and_up() {
        let mut tree = Tree::new();
        let root = tree.root();
        let child = tree.insert1(root);
        let mut z = Zipper::at_root(&tree);
        z.down(&tree, child);
        assert_eq!(z.current(), child);
        assert_eq!(z.up(&tree), Some(root));
    }

    #[test]
    fn find_loc_then_travel_reaches_the_target() {
        let mut tree = Tree::new();
        let root = tree.root();
        let (_taken, not_taken) = tree.insert2(root);
        let grandchild = tree.insert1(not_taken);
        let path = tree.find_loc(grandchild).unwrap();
        assert_eq!(path, vec![Crumb::Right, Crumb::Down]);
        let mut z = Zipper::at_root(&tree);
        z.travel(&tree, &path);
        assert_eq!(z.current(), grandchild);
    }

    #[test]
    fn top_returns_the_zipper_to_the_root() {
        let mut tree = Tree::new();
        let root = tree.root();
        let (taken, _) = tree.insert2(root);
        let grandchild = tree.insert1(taken);
        let mut z = Zipper::at_root(&tree);
        z.down(&tree, taken);
        z.down(&tree, grandchild);
        z.top(&tree);
        assert_eq!(z.current(), root);
    }
}
