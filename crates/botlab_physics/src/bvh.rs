//! Bounding volume hierarchy over mesh triangles
//!
//! The BVH answers "which triangles might touch this volume" without
//! checking every triangle. Nodes live in a flat vector and are walked with
//! an explicit stack, so queries never recurse.
//!
//! Building:
//! 1. Compute the bounds of all triangle centroids
//! 2. Split at the median along the widest centroid axis
//! 3. Stop at leaves of [`LEAF_SIZE`] triangles or fewer

use botlab_math::Transform3;

use crate::shapes::{Aabb, Triangle};

/// Maximum triangles stored in a leaf node
pub const LEAF_SIZE: usize = 4;

#[derive(Clone, Debug)]
enum BvhNode {
    Leaf {
        bounds: Aabb,
        /// Range into `TriangleBvh::order`
        first: usize,
        count: usize,
    },
    Internal {
        bounds: Aabb,
        left: usize,
        right: usize,
    },
}

impl BvhNode {
    fn bounds(&self) -> &Aabb {
        match self {
            BvhNode::Leaf { bounds, .. } | BvhNode::Internal { bounds, .. } => bounds,
        }
    }
}

/// A BVH built over a fixed triangle list
#[derive(Clone, Debug)]
pub struct TriangleBvh {
    triangles: Vec<Triangle>,
    /// Triangle indices, reordered so each leaf owns a contiguous range
    order: Vec<usize>,
    nodes: Vec<BvhNode>,
}

impl TriangleBvh {
    /// Build a BVH over `triangles`
    ///
    /// Degenerate (zero-area) triangles are kept; they simply never produce a
    /// useful push direction. An empty input produces a BVH with no nodes.
    pub fn build(triangles: Vec<Triangle>) -> Self {
        let mut bvh = Self {
            order: (0..triangles.len()).collect(),
            triangles,
            nodes: Vec::new(),
        };
        if !bvh.triangles.is_empty() {
            let count = bvh.order.len();
            bvh.build_node(0, count);
        }
        bvh
    }

    /// Recursively build the node covering `order[first..first + count]`
    ///
    /// Returns the index of the created node.
    fn build_node(&mut self, first: usize, count: usize) -> usize {
        let bounds = self.order[first..first + count]
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| acc.union(&self.triangles[i].bounds()));

        if count <= LEAF_SIZE {
            self.nodes.push(BvhNode::Leaf { bounds, first, count });
            return self.nodes.len() - 1;
        }

        let centroid_bounds = self.order[first..first + count]
            .iter()
            .fold(Aabb::EMPTY, |acc, &i| acc.including(self.triangles[i].centroid()));
        let axis = centroid_bounds.longest_axis();

        {
            let triangles = &self.triangles;
            self.order[first..first + count].sort_by(|&a, &b| {
                let ca = triangles[a].centroid().axis(axis);
                let cb = triangles[b].centroid().axis(axis);
                ca.total_cmp(&cb)
            });
        }

        // Reserve our slot before the children so the root stays at index 0
        let index = self.nodes.len();
        self.nodes.push(BvhNode::Leaf { bounds, first, count });

        let mid = count / 2;
        let left = self.build_node(first, mid);
        let right = self.build_node(first + mid, count - mid);
        self.nodes[index] = BvhNode::Internal { bounds, left, right };
        index
    }

    /// Number of triangles indexed
    pub fn triangle_count(&self) -> usize {
        self.triangles.len()
    }

    pub fn triangles(&self) -> &[Triangle] {
        &self.triangles
    }

    /// Bounds of the whole hierarchy, `None` when empty
    pub fn bounds(&self) -> Option<Aabb> {
        self.nodes.first().map(|n| *n.bounds())
    }

    /// Walk the hierarchy with caller-supplied tests
    ///
    /// `bounds_test` decides whether a node's box is worth descending into.
    /// `triangle_test` is called for every triangle in an accepted leaf whose
    /// own bounds also pass `bounds_test`; returning `true` stops the walk.
    ///
    /// Returns `true` if `triangle_test` requested an early stop.
    pub fn shapecast<B, T>(&self, mut bounds_test: B, mut triangle_test: T) -> bool
    where
        B: FnMut(&Aabb) -> bool,
        T: FnMut(usize, &Triangle) -> bool,
    {
        if self.nodes.is_empty() {
            return false;
        }

        let mut stack = vec![0usize];
        while let Some(node_index) = stack.pop() {
            let node = &self.nodes[node_index];
            if !bounds_test(node.bounds()) {
                continue;
            }
            match node {
                BvhNode::Leaf { first, count, .. } => {
                    for &tri_index in &self.order[*first..*first + *count] {
                        let tri = &self.triangles[tri_index];
                        if !bounds_test(&tri.bounds()) {
                            continue;
                        }
                        if triangle_test(tri_index, tri) {
                            return true;
                        }
                    }
                }
                BvhNode::Internal { left, right, .. } => {
                    stack.push(*right);
                    stack.push(*left);
                }
            }
        }
        false
    }

    /// Collect the indices of triangles whose bounds intersect `query`
    pub fn query(&self, query: &Aabb) -> Vec<usize> {
        let mut hits = Vec::new();
        self.shapecast(
            |b| b.intersects(query),
            |i, _| {
                hits.push(i);
                false
            },
        );
        hits
    }
}

/// Triangle geometry placed in the world, optionally with a spatial index
///
/// The resolver refuses meshes without an index (it reports no collision),
/// mirroring scene objects whose BVH was never generated.
#[derive(Clone, Debug)]
pub struct CollisionMesh {
    bvh: Option<TriangleBvh>,
    pub transform: Transform3,
}

impl CollisionMesh {
    /// Build the index for `triangles` (given in local space)
    pub fn new(triangles: Vec<Triangle>, transform: Transform3) -> Self {
        Self {
            bvh: Some(TriangleBvh::build(triangles)),
            transform,
        }
    }

    /// A mesh whose spatial index is missing
    pub fn without_index(transform: Transform3) -> Self {
        Self { bvh: None, transform }
    }

    pub fn bvh(&self) -> Option<&TriangleBvh> {
        self.bvh.as_ref()
    }

    pub fn has_index(&self) -> bool {
        self.bvh.is_some()
    }
}
