mod insert;
mod param;
mod remove;
mod verify;

use std::mem::replace;

use enum_as_inner::EnumAsInner;
use slotmap::{Key, SlotMap};

use crate::error::{ConfigError, InsertError};
use crate::primitive::{AabbRect, Vector};

pub use param::*;

/* ---------------------------------------------------------------------------------------------- */
/*                                             R*-TREE                                            */
/* ---------------------------------------------------------------------------------------------- */

/// A payload stored in the tree.
pub trait Element {
    type Vector: Vector;

    /// Spatial extent of this element. Evaluated once, when the element is inserted.
    fn bound(&self) -> AabbRect<Self::Vector>;

    /// Rejects payloads whose bound would be meaningless.
    fn validate(&self) -> Result<(), InsertError> {
        Ok(())
    }
}

/// Balanced R*-tree with a bounded insertion-order window.
///
/// Every element lives in a leaf; every leaf sits at the same depth below the root, in a
/// node holding only leaves. Leaves are additionally threaded through an intrusive FIFO
/// queue in insertion order. Once more than [`TreeParameter::capacity`] elements are
/// present, the oldest one is evicted.
///
/// All nodes are owned by a single arena. Parent and queue links are plain generational
/// handles into it, so a handle of a removed element never resolves again.
pub struct RTree<T: Element> {
    nodes: SlotMap<TreeNodeIndex, TreeNode<T>>,
    root: TreeNodeIndex,

    // Insertion-order queue, oldest at `head`.
    head: TreeNodeIndex,
    tail: TreeNodeIndex,

    len: usize,
    serial: u64,
    params: TreeParameter,
}

#[derive(EnumAsInner)]
enum TreeNode<T: Element> {
    Inner(TreeNodeInner<T::Vector>),
    Leaf(TreeNodeLeaf<T>),
}

struct TreeNodeInner<V: Vector> {
    /// Always the exact union of the children's bounds.
    bound: AabbRect<V>,
    parent: TreeNodeIndex,
    children: Vec<TreeNodeIndex>,

    /// Whether `children` are leaves. Fixed at creation; split siblings inherit it.
    leaf_child: bool,
}

struct TreeNodeLeaf<T: Element> {
    data: T,
    bound: AabbRect<T::Vector>,
    parent: TreeNodeIndex,

    // Position in the insertion-order queue. `serial` never changes once assigned, even
    // when the leaf is moved around by reinsertion.
    serial: u64,
    prev: TreeNodeIndex,
    next: TreeNodeIndex,
}

/// Result of a successful [`RTree::insert`].
#[derive(Debug)]
pub struct Inserted<T> {
    /// Handle of the new element.
    pub id: TreeNodeIndex,

    /// The oldest element, if inserting pushed the tree over its capacity.
    pub evicted: Option<T>,
}

impl<T: Element> TreeNode<T> {
    fn bound(&self) -> &AabbRect<T::Vector> {
        match self {
            TreeNode::Inner(x) => &x.bound,
            TreeNode::Leaf(x) => &x.bound,
        }
    }

    fn parent(&self) -> TreeNodeIndex {
        match self {
            TreeNode::Inner(x) => x.parent,
            TreeNode::Leaf(x) => x.parent,
        }
    }

    fn set_parent(&mut self, parent: TreeNodeIndex) {
        match self {
            TreeNode::Inner(x) => x.parent = parent,
            TreeNode::Leaf(x) => x.parent = parent,
        }
    }
}

/* --------------------------------------- Public Tree API -------------------------------------- */

impl<T: Element> RTree<T> {
    pub fn new(params: TreeParameter) -> Result<Self, ConfigError> {
        params.validate()?;

        if <T::Vector as Vector>::D == 0 {
            return Err(ConfigError::ZeroDimension);
        }

        Ok(Self {
            nodes: SlotMap::with_key(),
            root: TreeNodeIndex::null(),
            head: TreeNodeIndex::null(),
            tail: TreeNodeIndex::null(),
            len: 0,
            serial: 0,
            params,
        })
    }

    pub fn params(&self) -> &TreeParameter {
        &self.params
    }

    /// Number of elements currently indexed.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Number of inner levels between the root and the elements. Zero when empty.
    pub fn height(&self) -> usize {
        let mut height = 0;
        let mut node = self.root;

        while let Some(TreeNode::Inner(inner)) = self.nodes.get(node) {
            height += 1;
            node = if inner.leaf_child {
                TreeNodeIndex::null()
            } else {
                inner.children[0]
            };
        }

        height
    }

    /// Drops every element and node.
    pub fn clear(&mut self) {
        self.nodes.clear();
        self.root = TreeNodeIndex::null();
        self.head = TreeNodeIndex::null();
        self.tail = TreeNodeIndex::null();
        self.len = 0;
    }

    pub fn get(&self, id: TreeNodeIndex) -> Option<&T> {
        self.nodes.get(id)?.as_leaf().map(|x| &x.data)
    }

    /// The element that will be evicted next.
    pub fn oldest(&self) -> Option<(TreeNodeIndex, &T)> {
        self.get(self.head).map(|x| (self.head, x))
    }

    pub fn newest(&self) -> Option<(TreeNodeIndex, &T)> {
        self.get(self.tail).map(|x| (self.tail, x))
    }

    /// Iterates elements in insertion order, oldest first.
    pub fn iter(&self) -> impl Iterator<Item = (TreeNodeIndex, &T)> + '_ {
        let mut cursor = self.head;

        std::iter::from_fn(move || {
            let leaf = self.nodes.get(cursor)?.as_leaf()?;
            let id = replace(&mut cursor, leaf.next);
            Some((id, &leaf.data))
        })
    }

    /// Collects every element whose bound overlaps `region`. No particular order.
    pub fn query(&self, region: &AabbRect<T::Vector>) -> Vec<&T> {
        let mut hits = Vec::new();
        self.visit_region(region, &mut |_, leaf| hits.push(&leaf.data));
        hits
    }

    pub fn query_with(
        &self,
        region: &AabbRect<T::Vector>,
        mut visit: impl FnMut(TreeNodeIndex, &T),
    ) {
        self.visit_region(region, &mut |id, leaf| visit(id, &leaf.data));
    }
}

/* ------------------------------------------ Inspection ---------------------------------------- */

impl<T: Element> RTree<T> {
    /// Root node, for inspection only. `None` when the tree is empty.
    pub fn root(&self) -> Option<TreeNodeIndex> {
        (!self.root.is_null()).then_some(self.root)
    }

    /// `None` when `id` doesn't resolve.
    pub fn is_leaf(&self, id: TreeNodeIndex) -> Option<bool> {
        self.nodes.get(id).map(|x| x.is_leaf())
    }

    pub fn children(&self, id: TreeNodeIndex) -> Option<&[TreeNodeIndex]> {
        self.nodes.get(id)?.as_inner().map(|x| &x.children[..])
    }

    pub fn bound(&self, id: TreeNodeIndex) -> Option<&AabbRect<T::Vector>> {
        self.nodes.get(id).map(|x| x.bound())
    }

    pub fn parent(&self, id: TreeNodeIndex) -> Option<TreeNodeIndex> {
        let parent = self.nodes.get(id)?.parent();
        (!parent.is_null()).then_some(parent)
    }
}

/* ---------------------------------------- Internal APIs --------------------------------------- */

impl<T: Element> RTree<T> {
    fn inner(&self, id: TreeNodeIndex) -> &TreeNodeInner<T::Vector> {
        match self.nodes.get(id) {
            Some(TreeNode::Inner(x)) => x,
            _ => invariant_violation!("{:?} is not an inner node", id),
        }
    }

    fn inner_mut(&mut self, id: TreeNodeIndex) -> &mut TreeNodeInner<T::Vector> {
        match self.nodes.get_mut(id) {
            Some(TreeNode::Inner(x)) => x,
            _ => invariant_violation!("{:?} is not an inner node", id),
        }
    }

    fn leaf_mut(&mut self, id: TreeNodeIndex) -> &mut TreeNodeLeaf<T> {
        match self.nodes.get_mut(id) {
            Some(TreeNode::Leaf(x)) => x,
            _ => invariant_violation!("{:?} is not a leaf", id),
        }
    }

    /// Appends a detached leaf at the queue tail.
    fn queue_push_back(&mut self, id: TreeNodeIndex) {
        let prev_tail = self.tail;
        let serial = self.serial;
        self.serial += 1;

        let leaf = self.leaf_mut(id);

        // Check if all links are disconnected.
        debug_assert!(leaf.prev.is_null());
        debug_assert!(leaf.next.is_null());

        leaf.serial = serial;
        leaf.prev = prev_tail;

        if prev_tail.is_null() {
            debug_assert!(self.head.is_null());
            self.head = id;
        } else {
            self.leaf_mut(prev_tail).next = id;
        }

        self.tail = id;
    }

    /// Splices a leaf out of the queue at any position, keeping the remainder in order.
    fn queue_unlink(&mut self, id: TreeNodeIndex) {
        let leaf = self.leaf_mut(id);
        let prev = replace(&mut leaf.prev, TreeNodeIndex::null());
        let next = replace(&mut leaf.next, TreeNodeIndex::null());

        if prev.is_null() {
            debug_assert!(self.head == id);
            self.head = next;
        } else {
            self.leaf_mut(prev).next = next;
        }

        if next.is_null() {
            debug_assert!(self.tail == id);
            self.tail = prev;
        } else {
            self.leaf_mut(next).prev = prev;
        }
    }

    /// Recomputes the bound of `node` from its current children.
    fn retighten(&mut self, node: TreeNodeIndex) {
        let bound = self.union_of(&self.inner(node).children);
        self.inner_mut(node).bound = bound;
    }

    fn retighten_ancestors(&mut self, node: TreeNodeIndex) {
        let mut cursor = self.inner(node).parent;

        while !cursor.is_null() {
            self.retighten(cursor);
            cursor = self.inner(cursor).parent;
        }
    }

    fn union_of(&self, ids: &[TreeNodeIndex]) -> AabbRect<T::Vector> {
        let mut bound = AabbRect::empty();
        for &id in ids {
            bound.expand_to_contain(self.nodes[id].bound());
        }
        bound
    }

    /// Top-down traversal pruning every subtree whose bound misses `region`.
    fn visit_region<'a>(
        &'a self,
        region: &AabbRect<T::Vector>,
        visit: &mut impl FnMut(TreeNodeIndex, &'a TreeNodeLeaf<T>),
    ) {
        if self.root.is_null() {
            return;
        }

        recurse(self, self.root, region, visit);

        fn recurse<'a, T: Element>(
            tree: &'a RTree<T>,
            node: TreeNodeIndex,
            region: &AabbRect<T::Vector>,
            visit: &mut impl FnMut(TreeNodeIndex, &'a TreeNodeLeaf<T>),
        ) {
            for &child in &tree.inner(node).children {
                match &tree.nodes[child] {
                    TreeNode::Leaf(leaf) => {
                        if leaf.bound.overlaps(region) {
                            visit(child, leaf);
                        }
                    }
                    TreeNode::Inner(inner) => {
                        if inner.bound.overlaps(region) {
                            recurse(tree, child, region, visit);
                        }
                    }
                }
            }
        }
    }
}

/* ------------------------------------------ Id Types ------------------------------------------ */

slotmap::new_key_type! {
    /// Handle of a tree node; either an inner node or an element leaf.
    pub struct TreeNodeIndex;
}

/* ---------------------------------------------------------------------------------------------- */
/*                                              TESTS                                             */
/* ---------------------------------------------------------------------------------------------- */


#[cfg(test)]
mod __proptest;
