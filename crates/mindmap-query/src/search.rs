//! Text search and breadcrumb paths

use mindmap_tree::{Node, NodeId, Tree};

/// Label shown for nodes with blank text.
pub const UNTITLED: &str = "Untitled";

/// Nodes whose text contains `query`, case-insensitively, in pre-order.
/// A blank query returns every node.
pub fn search<'a>(tree: &'a Tree, query: &str) -> Vec<&'a Node> {
    let needle = query.trim().to_lowercase();
    if needle.is_empty() {
        return tree.flatten();
    }
    tree.flatten()
        .into_iter()
        .filter(|node| node.text.to_lowercase().contains(&needle))
        .collect()
}

/// Root-to-node labels joined with `" > "`, or `None` for an unknown id.
pub fn breadcrumb(tree: &Tree, id: &NodeId) -> Option<String> {
    if !tree.contains(id) {
        return None;
    }
    let labels: Vec<&str> = tree
        .path(id)
        .into_iter()
        .map(|node| if node.is_blank() { UNTITLED } else { node.text.as_str() })
        .collect();
    Some(labels.join(" > "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn tree() -> (Tree, NodeId, NodeId) {
        let root = Node::new("Operations");
        let root_id = root.id.clone();
        let hiring = Node::new("Hiring plan");
        let hiring_id = hiring.id.clone();
        let blank = Node::new("  ");
        let blank_id = blank.id.clone();
        let tree = Tree::new(root)
            .add_child(&root_id, hiring)
            .add_child(&hiring_id, blank);
        (tree, hiring_id, blank_id)
    }

    #[test]
    fn search_is_case_insensitive() {
        let (tree, hiring_id, _) = tree();
        let hits: Vec<&NodeId> = search(&tree, "HIRING").iter().map(|n| &n.id).collect();
        assert_eq!(hits, vec![&hiring_id]);
    }

    #[test]
    fn blank_query_returns_all_nodes() {
        let (tree, _, _) = tree();
        assert_eq!(search(&tree, "   ").len(), 3);
    }

    #[test]
    fn breadcrumb_names_blank_nodes_untitled() {
        let (tree, hiring_id, blank_id) = tree();
        assert_eq!(breadcrumb(&tree, &hiring_id).unwrap(), "Operations > Hiring plan");
        assert_eq!(
            breadcrumb(&tree, &blank_id).unwrap(),
            "Operations > Hiring plan > Untitled"
        );
        assert_eq!(breadcrumb(&tree, &NodeId::from("nope")), None);
    }
}
