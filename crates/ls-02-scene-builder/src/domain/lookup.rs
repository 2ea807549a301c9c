//! Name lookup over a fetched node tree.

use shared_types::RemoteNode;

/// Depth-first pre-order walk, bounded at `max_depth` below the root.
struct PreOrder<'a> {
    stack: Vec<(&'a RemoteNode, u32)>,
    max_depth: u32,
}

impl<'a> Iterator for PreOrder<'a> {
    type Item = &'a RemoteNode;

    fn next(&mut self) -> Option<Self::Item> {
        let (node, depth) = self.stack.pop()?;
        if depth < self.max_depth {
            // Reversed so the first child is popped first.
            self.stack
                .extend(node.children.iter().rev().map(|child| (child, depth + 1)));
        }
        Some(node)
    }
}

fn pre_order(root: &RemoteNode, max_depth: u32) -> PreOrder<'_> {
    PreOrder {
        stack: vec![(root, 0)],
        max_depth,
    }
}

/// First node named exactly `name`, depth-first pre-order.
///
/// Parents are visited before their children and children in the order the
/// host returned them. Nodes deeper than `max_depth` below `root` are never
/// visited, even if the snapshot contains them.
pub fn find_by_name<'a>(root: &'a RemoteNode, name: &str, max_depth: u32) -> Option<&'a RemoteNode> {
    pre_order(root, max_depth).find(|node| node.name == name)
}

/// Every node named exactly `name`, in the order [`find_by_name`] visits them.
pub fn find_all_by_name<'a>(root: &'a RemoteNode, name: &str, max_depth: u32) -> Vec<&'a RemoteNode> {
    pre_order(root, max_depth)
        .filter(|node| node.name == name)
        .collect()
}
