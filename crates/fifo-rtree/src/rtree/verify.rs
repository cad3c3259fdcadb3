use ahash::HashSet;
use slotmap::Key;

use super::{Element, RTree, TreeNode, TreeNodeIndex};

impl<T: Element> RTree<T> {
    /// Walks the whole arena and checks every structural invariant: bound tightness,
    /// child homogeneity, fanout limits, parent links, equal leaf depth, and that the
    /// insertion-order queue holds exactly the indexed leaves in insertion order.
    ///
    /// Meant for tests and debugging; runs in linear time.
    #[doc(hidden)]
    pub fn __debug_verify_tree_state(&self) -> Result<(), String> {
        let min_child = self.params.min_child;
        let max_child = self.params.max_child;

        if self.root.is_null() {
            if self.len != 0 || !self.nodes.is_empty() {
                return Err(format!(
                    "empty tree still tracks {} elements in {} nodes",
                    self.len,
                    self.nodes.len()
                ));
            }

            if !self.head.is_null() || !self.tail.is_null() {
                return Err("empty tree with a non-empty queue".into());
            }

            return Ok(());
        }

        let root = match self.nodes.get(self.root) {
            Some(TreeNode::Inner(root)) => root,
            _ => return Err(format!("root {:?} is not an inner node", self.root)),
        };

        if !root.parent.is_null() {
            return Err(format!("root has parent {:?}", root.parent));
        }

        if root.children.is_empty() {
            return Err("root has no children".into());
        }

        if !root.leaf_child && root.children.len() < 2 {
            return Err("inner-of-inner root with a single child was not collapsed".into());
        }

        let mut leaves = HashSet::default();
        let mut inner_count = 0;
        let mut leaf_depth = None;
        let mut stack = vec![(self.root, 0usize)];

        while let Some((id, depth)) = stack.pop() {
            let Some(TreeNode::Inner(node)) = self.nodes.get(id) else {
                return Err(format!("{:?} is not an inner node", id));
            };

            inner_count += 1;

            let fanout = node.children.len();
            let fanout_ok = if id == self.root {
                (1..=max_child).contains(&fanout)
            } else {
                (min_child..=max_child).contains(&fanout)
            };

            if !fanout_ok {
                return Err(format!("{:?} has {} children", id, fanout));
            }

            if self.union_of(&node.children) != node.bound {
                return Err(format!(
                    "bound of {:?} is not tight: {:?} != {:?}",
                    id,
                    node.bound,
                    self.union_of(&node.children)
                ));
            }

            for &child in &node.children {
                let Some(child_node) = self.nodes.get(child) else {
                    return Err(format!("{:?} has dangling child {:?}", id, child));
                };

                if child_node.parent() != id {
                    return Err(format!(
                        "{:?} points to parent {:?} instead of {:?}",
                        child,
                        child_node.parent(),
                        id
                    ));
                }

                if child_node.is_leaf() != node.leaf_child {
                    return Err(format!("{:?} has mixed children", id));
                }

                if child_node.is_leaf() {
                    if !leaves.insert(child) {
                        return Err(format!("{:?} is reachable twice", child));
                    }
                } else {
                    stack.push((child, depth + 1));
                }
            }

            if node.leaf_child {
                match leaf_depth {
                    None => leaf_depth = Some(depth),
                    Some(d) if d != depth => {
                        return Err(format!("leaves at depth {} and {}", d, depth));
                    }
                    Some(_) => {}
                }
            }
        }

        if leaves.len() != self.len {
            return Err(format!(
                "{} reachable leaves, but len is {}",
                leaves.len(),
                self.len
            ));
        }

        if inner_count + leaves.len() != self.nodes.len() {
            return Err(format!(
                "{} arena slots, but only {} reachable nodes",
                self.nodes.len(),
                inner_count + leaves.len()
            ));
        }

        // Queue
        let mut queued = 0;
        let mut prev = TreeNodeIndex::null();
        let mut prev_serial = None;
        let mut cursor = self.head;

        while !cursor.is_null() {
            let Some(TreeNode::Leaf(leaf)) = self.nodes.get(cursor) else {
                return Err(format!("queue holds non-leaf {:?}", cursor));
            };

            if !leaves.contains(&cursor) {
                return Err(format!("queued {:?} is not in the tree", cursor));
            }

            if leaf.prev != prev {
                return Err(format!("broken back link at {:?}", cursor));
            }

            if prev_serial.is_some_and(|s| s >= leaf.serial) {
                return Err(format!("{:?} is out of insertion order", cursor));
            }

            queued += 1;
            if queued > self.len {
                return Err("queue is longer than the tree".into());
            }

            prev_serial = Some(leaf.serial);
            prev = cursor;
            cursor = leaf.next;
        }

        if prev != self.tail {
            return Err(format!("queue tail is {:?}, last is {:?}", self.tail, prev));
        }

        if queued != self.len {
            return Err(format!("{} queued leaves, but len is {}", queued, self.len));
        }

        Ok(())
    }
}
