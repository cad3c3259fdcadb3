use slotmap::Key;

use super::{Element, Inserted, RTree, TreeNode, TreeNodeIndex, TreeNodeInner, TreeNodeLeaf};

use crate::error::InsertError;
use crate::primitive::{AabbRect, AxisIndex, NumberCommon, Vector};

impl<T: Element> RTree<T> {
    /// Indexes `elem`, then evicts the oldest element if the tree grew past its capacity.
    ///
    /// The payload is validated before anything is touched; a rejected element leaves the
    /// tree unchanged.
    pub fn insert(&mut self, elem: T) -> Result<Inserted<T>, InsertError> {
        elem.validate()?;

        let bound = elem.bound();
        if let Some(axis) = bound.malformed_axis() {
            return Err(InsertError::MalformedBound { axis });
        }

        let id = self.nodes.insert(TreeNode::Leaf(TreeNodeLeaf {
            data: elem,
            bound,
            parent: TreeNodeIndex::null(),
            serial: 0,
            prev: TreeNodeIndex::null(),
            next: TreeNodeIndex::null(),
        }));

        self.queue_push_back(id);
        self.len += 1;
        self.insert_leaf(id, true);

        let evicted = if self.len > self.params.capacity {
            let oldest = self.head;
            trace_log!(len = self.len, "evicting oldest element");

            let data = self.remove_leaf(oldest);
            self.collapse_root();
            Some(data)
        } else {
            None
        };

        Ok(Inserted { id, evicted })
    }

    /// Threads a detached leaf into the tree, starting at the root. The insertion-order
    /// queue is not touched.
    pub(super) fn insert_leaf(&mut self, leaf: TreeNodeIndex, first_in_level: bool) {
        if self.root.is_null() {
            let bound = *self.nodes[leaf].bound();
            let mut children = Vec::with_capacity(self.params.max_child + 1);
            children.push(leaf);

            self.root = self.nodes.insert(TreeNode::Inner(TreeNodeInner {
                bound,
                parent: TreeNodeIndex::null(),
                children,
                leaf_child: true,
            }));

            self.nodes[leaf].set_parent(self.root);
            return;
        }

        let root = self.root;
        if let Some(sibling) = self.insert_at(leaf, root, first_in_level) {
            // Root overflow always resolves by growing a new root.
            invariant_violation!("split of root {:?} escaped as {:?}", root, sibling);
        }
    }

    /// Returns the sibling created by an overflow split, which the caller must adopt.
    fn insert_at(
        &mut self,
        leaf: TreeNodeIndex,
        node: TreeNodeIndex,
        first_in_level: bool,
    ) -> Option<TreeNodeIndex> {
        let leaf_bound = *self.nodes[leaf].bound();
        let inner = self.inner_mut(node);
        inner.bound.expand_to_contain(&leaf_bound);

        if inner.leaf_child {
            inner.children.push(leaf);
            self.nodes[leaf].set_parent(node);
        } else {
            let subtree = self.choose_subtree(node, &leaf_bound);

            if let Some(sibling) = self.insert_at(leaf, subtree, first_in_level) {
                self.inner_mut(node).children.push(sibling);
                self.nodes[sibling].set_parent(node);
            }
        }

        if self.inner(node).children.len() > self.params.max_child {
            return self.overflow_treatment(node, first_in_level);
        }

        None
    }

    /// Picks the child of `node` which should receive an entry bounded by `bound`.
    pub(super) fn choose_subtree(
        &self,
        node: TreeNodeIndex,
        bound: &AabbRect<T::Vector>,
    ) -> TreeNodeIndex {
        let children = &self.inner(node).children;
        let Some(&first) = children.first() else {
            invariant_violation!("descending through childless node {:?}", node)
        };

        let enlargement = |id: TreeNodeIndex| self.nodes[id].bound().enlargement(bound);

        if !self.inner(first).leaf_child {
            // Least area enlargement; the first one wins ties.
            return children
                .iter()
                .copied()
                .min_by(|&a, &b| enlargement(a).total_cmp(&enlargement(b)))
                .unwrap_or(first);
        }

        // Right above the leaf level: minimize overlap with the siblings instead.
        let mut candidates: Vec<TreeNodeIndex> = children.clone();
        let limit = self.params.choose_subtree_candidates;

        if candidates.len() > limit {
            let mut keyed: Vec<(f64, TreeNodeIndex)> =
                candidates.iter().map(|&id| (enlargement(id), id)).collect();

            // Stable, so equally enlarging candidates keep their child order.
            keyed.sort_by(|a, b| a.0.total_cmp(&b.0));
            keyed.truncate(limit);

            candidates = keyed.into_iter().map(|(_, id)| id).collect();
        }

        let overlap = |id: TreeNodeIndex| {
            let grown = self.nodes[id].bound().union(bound);

            children
                .iter()
                .filter(|&&sibling| sibling != id)
                .map(|&sibling| grown.overlap_area(self.nodes[sibling].bound()))
                .sum::<f64>()
        };

        candidates
            .iter()
            .map(|&id| (overlap(id), id))
            .min_by(|a, b| a.0.total_cmp(&b.0))
            .map_or(first, |(_, id)| id)
    }

    /// Resolves `node` holding `max_child + 1` children. Returns a sibling for the parent
    /// to adopt, if any.
    fn overflow_treatment(
        &mut self,
        node: TreeNodeIndex,
        first_in_level: bool,
    ) -> Option<TreeNodeIndex> {
        if node != self.root && first_in_level {
            self.reinsert(node);
            return None;
        }

        let sibling = self.split(node);

        if node != self.root {
            return Some(sibling);
        }

        // Grow the tree by one level.
        let bound = self.inner(node).bound.union(&self.inner(sibling).bound);
        let mut children = Vec::with_capacity(self.params.max_child + 1);
        children.extend([node, sibling]);

        let new_root = self.nodes.insert(TreeNode::Inner(TreeNodeInner {
            bound,
            parent: TreeNodeIndex::null(),
            children,
            leaf_child: false,
        }));

        self.inner_mut(node).parent = new_root;
        self.inner_mut(sibling).parent = new_root;
        self.root = new_root;

        debug_log!(height = self.height(), "root split; tree grew");
        None
    }

    /// Forced reinsertion. Moves the children farthest from the node's center out of it,
    /// and inserts them again from the root.
    ///
    /// Reinserted entries use `first_in_level = false`; a second overflow during the same
    /// insertion therefore splits instead of reinserting again. Only leaf-holding nodes
    /// get here: an upper node overflows only by adopting a split sibling, and splits
    /// never happen while `first_in_level` is still set.
    pub(super) fn reinsert(&mut self, node: TreeNodeIndex) {
        let max_child = self.params.max_child;
        let count = self.params.reinsert_count();

        let inner = self.inner_mut(node);
        let n_items = inner.children.len();

        if n_items != max_child + 1 {
            invariant_violation!(
                "reinsertion of {:?} with {} children, expected {}",
                node,
                n_items,
                max_child + 1
            );
        }

        if !inner.leaf_child {
            invariant_violation!("reinsertion of {:?} above the leaf level", node);
        }

        let center = inner.bound;
        let mut children = std::mem::take(&mut inner.children);

        // Ascending by distance; the tail is the reinsertion set, nearest first.
        children.sort_by(|&a, &b| {
            let da = self.nodes[a].bound().distance(&center);
            let db = self.nodes[b].bound().distance(&center);
            da.total_cmp(&db)
        });

        let removed = children.split_off(n_items - count);
        self.inner_mut(node).children = children;

        for &id in &removed {
            self.nodes[id].set_parent(TreeNodeIndex::null());
        }

        self.retighten(node);
        self.retighten_ancestors(node);

        debug_log!(count, "forced reinsertion");

        for id in removed {
            self.insert_leaf(id, false);
        }
    }

    /// R*-split. Partitions the children of an overflowing `node` in two, keeping the head
    /// in `node`, and returns the new sibling holding the tail.
    ///
    /// The split axis is the one with the least total margin over all candidate
    /// distributions. On that axis, the distribution with least overlap (then least
    /// area) wins.
    pub(super) fn split(&mut self, node: TreeNodeIndex) -> TreeNodeIndex {
        let min_child = self.params.min_child;

        let inner = self.inner_mut(node);
        let leaf_child = inner.leaf_child;
        let parent = inner.parent;
        let children = std::mem::take(&mut inner.children);

        let mut entries: Vec<(TreeNodeIndex, AabbRect<T::Vector>)> = children
            .into_iter()
            .map(|id| (id, *self.nodes[id].bound()))
            .collect();

        if entries.len() < 2 * min_child {
            invariant_violation!("split of {:?} with {} children", node, entries.len());
        }

        let distributions = entries.len() - 2 * min_child + 1;
        let mut best: Option<(f64, SplitCandidate)> = None;

        for axis in 0..<T::Vector as Vector>::D {
            let mut margin = 0.;
            let mut axis_best: Option<SplitCandidate> = None;

            for edge in [SplitEdge::Lower, SplitEdge::Upper] {
                edge.sort(&mut entries, axis);

                let (prefix, suffix) = running_unions(&entries);

                for k in 0..distributions {
                    let at = min_child + k;
                    let (r1, r2) = (&prefix[at - 1], &suffix[at]);

                    margin += r1.perimeter() + r2.perimeter();

                    let candidate = SplitCandidate {
                        axis,
                        edge,
                        index: at,
                        overlap: r1.overlap_area(r2),
                        area: r1.area() + r2.area(),
                    };

                    if axis_best.as_ref().map_or(true, |x| candidate.is_better(x)) {
                        axis_best = Some(candidate);
                    }
                }
            }

            let Some(axis_best) = axis_best else {
                invariant_violation!("no split distribution on axis {}", axis)
            };

            if best.as_ref().map_or(true, |(m, _)| margin < *m) {
                best = Some((margin, axis_best));
            }
        }

        let Some((_, chosen)) = best else {
            invariant_violation!("no split axis for {:?}", node)
        };

        chosen.edge.sort(&mut entries, chosen.axis);
        let tail: Vec<TreeNodeIndex> = entries
            .split_off(chosen.index)
            .into_iter()
            .map(|x| x.0)
            .collect();
        let head: Vec<TreeNodeIndex> = entries.into_iter().map(|x| x.0).collect();

        trace_log!(
            axis = chosen.axis,
            index = chosen.index,
            overlap = chosen.overlap,
            "node split"
        );

        let head_bound = self.union_of(&head);
        let tail_bound = self.union_of(&tail);

        let inner = self.inner_mut(node);
        inner.children = head;
        inner.bound = head_bound;

        let mut sibling_children = Vec::with_capacity(self.params.max_child + 1);
        sibling_children.extend(tail.iter().copied());

        let sibling = self.nodes.insert(TreeNode::Inner(TreeNodeInner {
            bound: tail_bound,
            parent,
            children: sibling_children,
            leaf_child,
        }));

        for id in tail {
            self.nodes[id].set_parent(sibling);
        }

        sibling
    }
}

/* ----------------------------------------- Split Logic ---------------------------------------- */

/// Which end of a child's range orders it along the axis.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum SplitEdge {
    Lower,
    Upper,
}

impl SplitEdge {
    fn key<V: Vector>(self, bound: &AabbRect<V>, axis: AxisIndex) -> f64 {
        let (min, max) = bound.range(axis);

        match self {
            SplitEdge::Lower => min.to_f64(),
            SplitEdge::Upper => max.to_f64(),
        }
    }

    fn sort<K, V: Vector>(self, entries: &mut [(K, AabbRect<V>)], axis: AxisIndex) {
        entries.sort_by(|a, b| self.key(&a.1, axis).total_cmp(&self.key(&b.1, axis)));
    }
}

#[derive(Debug)]
struct SplitCandidate {
    axis: AxisIndex,
    edge: SplitEdge,
    index: usize,
    overlap: f64,
    area: f64,
}

impl SplitCandidate {
    fn is_better(&self, other: &Self) -> bool {
        self.overlap < other.overlap || (self.overlap == other.overlap && self.area < other.area)
    }
}

/// `prefix[i]` bounds `entries[..=i]`, `suffix[i]` bounds `entries[i..]`.
fn running_unions<K, V: Vector>(
    entries: &[(K, AabbRect<V>)],
) -> (Vec<AabbRect<V>>, Vec<AabbRect<V>>) {
    let mut acc = AabbRect::empty();
    let prefix: Vec<_> = entries
        .iter()
        .map(|(_, bound)| {
            acc.expand_to_contain(bound);
            acc
        })
        .collect();

    let mut acc = AabbRect::empty();
    let mut suffix: Vec<_> = entries
        .iter()
        .rev()
        .map(|(_, bound)| {
            acc.expand_to_contain(bound);
            acc
        })
        .collect();
    suffix.reverse();

    (prefix, suffix)
}
