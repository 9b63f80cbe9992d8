//! Immutable segment tree over `[0, N-1]`, represented as an index arena
//! rather than a pointer tree (Design Note: "Tree as arena", spec.md §9) so the
//! whole structure is cache-dense and trivially shareable across threads.
//!
//! Ported from `original_source/include/utils.h`'s `TreeNode`/`SegmentTree`
//! (spec.md §4.1).

pub const WAYS: usize = 2;

#[derive(Copy, Clone, Debug)]
pub struct NodeId(pub u32);

#[derive(Clone, Debug)]
pub struct TreeNode {
    pub lbound: u32,
    pub rbound: u32,
    pub depth: u32,
    pub children: Vec<NodeId>,
}

impl TreeNode {
    pub fn is_leaf(&self) -> bool {
        self.children.is_empty()
    }

    pub fn contains(&self, id: u32) -> bool {
        id >= self.lbound && id <= self.rbound
    }

    pub fn inside(&self, ql: u32, qr: u32) -> bool {
        self.lbound >= ql && self.rbound <= qr
    }

    fn overlap(&self, ql: u32, qr: u32) -> i64 {
        let l = self.lbound.max(ql) as i64;
        let r = self.rbound.min(qr) as i64;
        r - l + 1
    }
}

/// A static k-ary (k=2) tree over `[0, N-1]`.
pub struct SegmentTree {
    pub nodes: Vec<TreeNode>,
    pub root: NodeId,
    pub max_depth: u32,
    /// For every point id, the chain of node ids from root to the point's leaf,
    /// ordered root-first. Used by `select_edge`'s ascent (spec.md §4.6).
    leaf_paths: Vec<Vec<NodeId>>,
}

impl SegmentTree {
    /// Build a tree over `[0, n-1]`. `n` must be positive.
    pub fn build(n: u32) -> Self {
        assert!(n > 0, "segment tree requires a non-empty dataset");
        let mut nodes = Vec::new();
        let root = Self::build_node(&mut nodes, 0, n - 1, 0);
        let max_depth = nodes.iter().map(|n| n.depth).max().unwrap_or(0);

        let mut leaf_paths = vec![Vec::new(); n as usize];
        let mut tree = SegmentTree {
            nodes,
            root,
            max_depth,
            leaf_paths: Vec::new(),
        };
        for id in 0..n {
            leaf_paths[id as usize] = tree.path_to(id);
        }
        tree.leaf_paths = leaf_paths;
        tree
    }

    fn build_node(nodes: &mut Vec<TreeNode>, l: u32, r: u32, depth: u32) -> NodeId {
        let idx = nodes.len() as u32;
        nodes.push(TreeNode {
            lbound: l,
            rbound: r,
            depth,
            children: Vec::new(),
        });

        if l < r {
            let len = (r - l + 1) as usize;
            let gap = len / WAYS;
            let mut remainder = len % WAYS;
            let mut cur = l;
            let mut children = Vec::with_capacity(WAYS);
            while cur <= r {
                let mut width = gap as u32;
                if remainder > 0 {
                    width += 1;
                    remainder -= 1;
                }
                let child_r = (cur + width - 1).min(r);
                children.push(Self::build_node(nodes, cur, child_r, depth + 1));
                cur = child_r + 1;
            }
            nodes[idx as usize].children = children;
        }

        NodeId(idx)
    }

    pub fn node(&self, id: NodeId) -> &TreeNode {
        &self.nodes[id.0 as usize]
    }

    pub fn len(&self) -> u32 {
        self.node(self.root).rbound - self.node(self.root).lbound + 1
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// The minimal sequence of disjoint tree nodes whose union tiles
    /// `[ql,qr] ∩ [0,N-1]` (spec.md §4.1). Order is unspecified.
    pub fn range_filter(&self, ql: u32, qr: u32) -> Vec<NodeId> {
        let mut out = Vec::new();
        self.range_filter_rec(self.root, ql, qr, &mut out);
        out
    }

    fn range_filter_rec(&self, id: NodeId, ql: u32, qr: u32, out: &mut Vec<NodeId>) {
        let node = self.node(id);
        if node.inside(ql, qr) {
            out.push(id);
            return;
        }
        if node.lbound > qr || node.rbound < ql {
            return;
        }
        for &child in &node.children {
            self.range_filter_rec(child, ql, qr, out);
        }
    }

    /// Root-to-leaf chain of node ids for point `id`.
    fn path_to(&self, id: u32) -> Vec<NodeId> {
        let mut path = vec![self.root];
        let mut cur = self.root;
        loop {
            let node = self.node(cur);
            if node.is_leaf() {
                break;
            }
            let next = *node
                .children
                .iter()
                .find(|&&c| self.node(c).contains(id))
                .expect("id must fall in exactly one child interval");
            path.push(next);
            cur = next;
        }
        path
    }

    /// SelectEdge's starting-node rule (spec.md §4.6): descend from the root
    /// along `pid`'s path and stop at the deepest node whose overlap with
    /// `[ql,qr]` still equals its chosen child's overlap — i.e. the finest
    /// layer at which nothing was pruned relative to the parent.
    pub fn select_edge_start(&self, pid: u32, ql: u32, qr: u32) -> NodeId {
        let path = &self.leaf_paths[pid as usize];
        let mut cur = path[0];
        for &next in &path[1..] {
            let cur_node = self.node(cur);
            let next_node = self.node(next);
            if cur_node.overlap(ql, qr) == next_node.overlap(ql, qr) {
                cur = next;
            } else {
                break;
            }
        }
        cur
    }

    /// The parent of `id` along `pid`'s root-to-leaf path, i.e. the next
    /// ancestor up from `id` when ascending `select_edge`'s walk.
    pub fn ascend(&self, pid: u32, id: NodeId) -> Option<NodeId> {
        let path = &self.leaf_paths[pid as usize];
        let pos = path.iter().position(|&n| n.0 == id.0)?;
        if pos == 0 {
            None
        } else {
            Some(path[pos - 1])
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn partitions_exactly() {
        for n in [1u32, 2, 3, 7, 8, 17, 100] {
            let tree = SegmentTree::build(n);
            let mut leaves: Vec<(u32, u32)> = tree
                .nodes
                .iter()
                .filter(|node| node.is_leaf())
                .map(|node| (node.lbound, node.rbound))
                .collect();
            leaves.sort();
            assert_eq!(leaves.len(), n as usize);
            for (i, (l, r)) in leaves.iter().enumerate() {
                assert_eq!(*l, i as u32);
                assert_eq!(*r, i as u32);
            }
        }
    }

    #[test]
    fn children_partition_parent() {
        let tree = SegmentTree::build(23);
        for node in &tree.nodes {
            if node.is_leaf() {
                continue;
            }
            let mut cur = node.lbound;
            for &child in &node.children {
                let c = tree.node(child);
                assert_eq!(c.lbound, cur);
                cur = c.rbound + 1;
            }
            assert_eq!(cur, node.rbound + 1);
        }
    }

    #[test]
    fn range_filter_tiles_window() {
        let tree = SegmentTree::build(100);
        for &(ql, qr) in &[(0u32, 99u32), (5, 5), (10, 40), (0, 0), (99, 99)] {
            let nodes = tree.range_filter(ql, qr);
            let mut covered: Vec<u32> = Vec::new();
            for id in &nodes {
                let n = tree.node(*id);
                assert!(n.inside(ql, qr));
                covered.extend(n.lbound..=n.rbound);
            }
            covered.sort();
            let expect: Vec<u32> = (ql..=qr).collect();
            assert_eq!(covered, expect);
        }
    }

    #[test]
    fn single_point_tree() {
        let tree = SegmentTree::build(1);
        assert_eq!(tree.max_depth, 0);
        let nodes = tree.range_filter(0, 0);
        assert_eq!(nodes.len(), 1);
    }
}
