//! Graphviz export of a `Tree`, for the downstream UIs the persisted
//! `Trace`/`Proof` JSON (§6) is meant to feed.

use petgraph::dot::Dot;
use petgraph::graph::DiGraph;

use super::{NodeKind, Tree};

/// Render every node and edge in `tree` as a Graphviz `DiGraph`,
/// labelling branch edges with `taken`/`not-taken` so a rendered SVG
/// reads the same way the state tree does.
pub fn to_dot(tree: &Tree) -> String {
    let mut graph: DiGraph<String, &'static str> = DiGraph::new();
    let mut indices = std::collections::HashMap::new();

    for id in tree.keys() {
        let idx = graph.add_node(id.to_string());
        indices.insert(id, idx);
    }
    for id in tree.keys() {
        let from = indices[&id];
        match tree.get(id).kind {
            NodeKind::Leaf => {}
            NodeKind::Trunk { child } => {
                graph.add_edge(from, indices[&child], "");
            }
            NodeKind::Branch { taken, not_taken } => {
                graph.add_edge(from, indices[&taken], "taken");
                graph.add_edge(from, indices[&not_taken], "not-taken");
            }
        }
    }

    format!("{}", Dot::new(&graph))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn branch_renders_both_edge_labels() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.insert2(root);
        let dot = to_dot(&tree);
        assert!(dot.contains("taken"));
        assert!(dot.contains("not-taken"));
    }

    #[test]
    fn trunk_renders_an_unlabelled_edge() {
        let mut tree = Tree::new();
        let root = tree.root();
        tree.insert1(root);
        let dot = to_dot(&tree);
        assert!(dot.contains("digraph"));
    }

}
