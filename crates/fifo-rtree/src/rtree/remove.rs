use slotmap::Key;

use super::{Element, RTree, TreeNode, TreeNodeIndex};

use crate::primitive::AabbRect;

impl<T: Element> RTree<T> {
    /// Removes a single element by handle. Stale handles and handles of inner nodes
    /// return `None`.
    pub fn remove(&mut self, id: TreeNodeIndex) -> Option<T> {
        if !self.nodes.get(id)?.is_leaf() {
            return None;
        }

        let data = self.remove_leaf(id);
        self.collapse_root();
        Some(data)
    }

    /// Removes every element whose bound overlaps `region`, returning them in traversal
    /// order. Remaining elements keep their relative age.
    pub fn remove_region(&mut self, region: &AabbRect<T::Vector>) -> Vec<T> {
        let mut targets = Vec::new();
        self.visit_region(region, &mut |id, _| targets.push(id));

        let removed: Vec<T> = targets.into_iter().map(|id| self.remove_leaf(id)).collect();
        self.collapse_root();

        if !removed.is_empty() {
            debug_log!(count = removed.len(), len = self.len, "region removed");
        }

        removed
    }

    /// Detaches a leaf, repairs the path above it, unlinks it from the queue, and releases
    /// it. The root is left uncollapsed.
    pub(super) fn remove_leaf(&mut self, id: TreeNodeIndex) -> T {
        let parent = self.nodes[id].parent();

        self.detach_child(parent, id);
        self.condense(parent);
        self.queue_unlink(id);
        self.len -= 1;

        match self.nodes.remove(id) {
            Some(TreeNode::Leaf(leaf)) => leaf.data,
            _ => invariant_violation!("{:?} vanished during removal", id),
        }
    }

    /// Removes `child` from the child list of `parent`, preserving the order of the rest.
    fn detach_child(&mut self, parent: TreeNodeIndex, child: TreeNodeIndex) {
        let children = &mut self.inner_mut(parent).children;

        let Some(position) = children.iter().position(|&x| x == child) else {
            invariant_violation!("{:?} is missing from its parent {:?}", child, parent)
        };

        children.remove(position);
        self.nodes[child].set_parent(TreeNodeIndex::null());
    }

    /// Walks from `start` up to the root. Nodes that fell below `min_child` are cut off
    /// and later dissolved into their leaves, which are inserted again from the root;
    /// every other node on the path is retightened.
    fn condense(&mut self, start: TreeNodeIndex) {
        let mut pending = Vec::new();
        let mut node = start;

        while node != self.root {
            let inner = self.inner(node);
            let parent = inner.parent;

            if inner.children.len() < self.params.min_child {
                self.detach_child(parent, node);
                pending.push(node);
            } else {
                self.retighten(node);
            }

            node = parent;
        }

        if self.inner(self.root).children.is_empty() {
            // Nothing left below the root. The tree restarts from scratch on the next
            // insertion.
            let root = std::mem::replace(&mut self.root, TreeNodeIndex::null());
            self.nodes.remove(root);
        } else {
            self.retighten(self.root);
        }

        if pending.is_empty() {
            return;
        }

        let mut orphans = Vec::new();
        for node in pending {
            self.harvest_leaves(node, &mut orphans);
        }

        debug_log!(orphans = orphans.len(), "condensed; reinserting orphaned leaves");

        for leaf in orphans {
            self.insert_leaf(leaf, true);
        }
    }

    /// Releases every inner node of the subtree at `node`, collecting its leaves in
    /// left-to-right order. The collected leaves are left detached.
    fn harvest_leaves(&mut self, node: TreeNodeIndex, out: &mut Vec<TreeNodeIndex>) {
        let mut stack = vec![node];

        while let Some(id) = stack.pop() {
            match self.nodes.get_mut(id) {
                Some(TreeNode::Leaf(leaf)) => {
                    leaf.parent = TreeNodeIndex::null();
                    out.push(id);
                }
                Some(TreeNode::Inner(_)) => {
                    let Some(TreeNode::Inner(inner)) = self.nodes.remove(id) else {
                        unreachable!()
                    };

                    stack.extend(inner.children.into_iter().rev());
                }
                None => invariant_violation!("dangling child {:?} under {:?}", id, node),
            }
        }
    }

    /// Drops the root while it is an inner-of-inner node with a single child.
    pub(super) fn collapse_root(&mut self) {
        while let Some(TreeNode::Inner(root)) = self.nodes.get(self.root) {
            if root.leaf_child || root.children.len() != 1 {
                break;
            }

            let child = root.children[0];
            self.nodes.remove(self.root);
            self.nodes[child].set_parent(TreeNodeIndex::null());
            self.root = child;

            debug_log!(height = self.height(), "root collapsed");
        }
    }
}
