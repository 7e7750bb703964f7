use std::collections::VecDeque;

use crate::math::aabb_2d::Aabb2;
use crate::math::Point2;

use super::SpatialIndex;

/// What a tree node holds below its box.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TreeNodeKind {
    /// Bounds exactly one polyline segment.
    Leaf { segment: usize },
    /// Bounds the union of two child nodes.
    Branch { left: usize, right: usize },
}

/// A node of a [`BoundingTree`], stored in a flat arena.
#[derive(Debug, Clone, Copy)]
pub struct TreeNode {
    pub bounds: Aabb2,
    pub kind: TreeNodeKind,
}

/// Binary bounding-volume tree over the segments of one polyline.
///
/// Built bottom-up by folding one level at a time: nodes are paired starting
/// from the most recent segment, and an unpaired node (the oldest one) is
/// carried unchanged into the next level. The resulting shape depends only
/// on the segment count, and its depth is `ceil(log2(segments))`.
#[derive(Debug, Clone, Default)]
pub struct BoundingTree {
    nodes: Vec<TreeNode>,
    root: Option<usize>,
    segments: usize,
}

impl BoundingTree {
    /// Builds a tree from leaf boxes given in polyline order.
    #[must_use]
    pub fn from_leaf_boxes(boxes: Vec<Aabb2>) -> Self {
        let segments = boxes.len();
        let mut nodes: Vec<TreeNode> = boxes
            .into_iter()
            .enumerate()
            .map(|(segment, bounds)| TreeNode {
                bounds,
                kind: TreeNodeKind::Leaf { segment },
            })
            .collect();

        // Current level, oldest at the front.
        let mut level: VecDeque<usize> = (0..nodes.len()).collect();

        while level.len() > 1 {
            let mut next: VecDeque<usize> = VecDeque::with_capacity(level.len() / 2 + 1);

            while level.len() > 1 {
                let (Some(right), Some(left)) = (level.pop_back(), level.pop_back()) else {
                    break;
                };
                let bounds = nodes[left].bounds.union(&nodes[right].bounds);
                nodes.push(TreeNode {
                    bounds,
                    kind: TreeNodeKind::Branch { left, right },
                });
                next.push_front(nodes.len() - 1);
            }

            if let Some(carried) = level.pop_back() {
                next.push_front(carried);
            }

            level = next;
        }

        Self {
            root: level.pop_front(),
            nodes,
            segments,
        }
    }

    /// Returns the root node, `None` for a tree without segments.
    #[must_use]
    pub fn root(&self) -> Option<&TreeNode> {
        self.root.map(|i| &self.nodes[i])
    }

    /// Returns the node stored at `index` in the arena.
    #[must_use]
    pub fn node(&self, index: usize) -> Option<&TreeNode> {
        self.nodes.get(index)
    }

    /// Number of leaves (one per segment).
    #[must_use]
    pub fn leaf_count(&self) -> usize {
        self.segments
    }

    /// Longest root-to-leaf path, counted in edges.
    #[must_use]
    pub fn depth(&self) -> usize {
        let Some(root) = self.root else {
            return 0;
        };
        let mut deepest = 0;
        let mut stack = vec![(root, 0)];
        while let Some((index, depth)) = stack.pop() {
            match self.nodes[index].kind {
                TreeNodeKind::Leaf { .. } => deepest = deepest.max(depth),
                TreeNodeKind::Branch { left, right } => {
                    stack.push((left, depth + 1));
                    stack.push((right, depth + 1));
                }
            }
        }
        deepest
    }

    /// All node boxes in depth-first order, root first.
    ///
    /// Intended for debug overlays.
    #[must_use]
    pub fn boxes(&self) -> Vec<Aabb2> {
        let mut out = Vec::with_capacity(self.nodes.len());
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            out.push(node.bounds);
            if let TreeNodeKind::Branch { left, right } = node.kind {
                stack.push(right);
                stack.push(left);
            }
        }
        out
    }

    /// Checks that every branch box contains both of its children's boxes.
    #[must_use]
    pub fn check_containment(&self) -> bool {
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if let TreeNodeKind::Branch { left, right } = node.kind {
                if !node.bounds.contains(&self.nodes[left].bounds)
                    || !node.bounds.contains(&self.nodes[right].bounds)
                {
                    return false;
                }
                stack.push(left);
                stack.push(right);
            }
        }
        true
    }
}

impl SpatialIndex for BoundingTree {
    fn hit_segment_excluding(&self, a: &Point2, b: &Point2, excluded: &[usize]) -> Option<usize> {
        let mut stack: Vec<usize> = self.root.into_iter().collect();
        while let Some(index) = stack.pop() {
            let node = &self.nodes[index];
            if !node.bounds.may_intersect_segment(a, b) {
                continue;
            }
            match node.kind {
                TreeNodeKind::Leaf { segment } if !excluded.contains(&segment) => {
                    return Some(segment);
                }
                TreeNodeKind::Leaf { .. } => {}
                TreeNodeKind::Branch { left, right } => {
                    stack.push(right);
                    stack.push(left);
                }
            }
        }
        None
    }

    fn bounds(&self) -> Option<Aabb2> {
        self.root().map(|node| node.bounds)
    }

    fn segment_count(&self) -> usize {
        self.segments
    }
}
