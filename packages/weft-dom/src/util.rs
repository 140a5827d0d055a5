use crate::document::Document;
use crate::node::Node;

/// Recursively print a subtree for debugging
pub(crate) fn walk_tree(depth: usize, node: &Node, doc: &Document) {
    let indent = "  ".repeat(depth);
    println!("{indent}#{} {}", node.id, node.node_debug_str());
    for child_id in &node.children {
        if let Some(child) = doc.get_node(*child_id) {
            walk_tree(depth + 1, child, doc);
        }
    }
}
