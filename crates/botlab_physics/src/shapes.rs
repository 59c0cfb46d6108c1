//! Collision shapes and closest-point queries
//!
//! These are lightweight primitives used for collision detection. The player
//! is a capsule (a segment swept by a radius) and the world is triangles.

use botlab_math::{Transform3, Vec3};

/// A line segment between two points
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Segment {
    pub start: Vec3,
    pub end: Vec3,
}

impl Segment {
    pub fn new(start: Vec3, end: Vec3) -> Self {
        Self { start, end }
    }

    /// Translate both endpoints
    pub fn translated(&self, delta: Vec3) -> Self {
        Self::new(self.start + delta, self.end + delta)
    }

    /// Map both endpoints from world into `transform`'s local space
    pub fn to_local(&self, transform: &Transform3) -> Self {
        Self::new(
            transform.inverse_transform_point(self.start),
            transform.inverse_transform_point(self.end),
        )
    }

    /// Closest point on the segment to `point`
    pub fn closest_point(&self, point: Vec3) -> Vec3 {
        let d = self.end - self.start;
        let len_sq = d.length_squared();
        if len_sq <= f32::EPSILON {
            return self.start;
        }
        let t = ((point - self.start).dot(d) / len_sq).clamp(0.0, 1.0);
        self.start + d * t
    }

    /// Bounding box of both endpoints grown by `radius`
    pub fn bounds(&self, radius: f32) -> Aabb {
        Aabb::from_points(self.start, self.end).expanded(radius)
    }
}

/// Capsule dimensions: a vertical segment of `segment_length` hanging below
/// the body origin, swept by `radius`
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleShape {
    pub radius: f32,
    pub segment_length: f32,
}

impl CapsuleShape {
    pub fn new(radius: f32, segment_length: f32) -> Self {
        Self { radius, segment_length }
    }

    /// World-space axis segment for a capsule whose top endpoint is `origin`
    pub fn segment_at(&self, origin: Vec3) -> Segment {
        Segment::new(origin, origin - Vec3::Y * self.segment_length)
    }

    /// Total height from the bottom of the lower cap to the top of the upper cap
    pub fn height(&self) -> f32 {
        self.segment_length + self.radius * 2.0
    }
}

impl Default for CapsuleShape {
    fn default() -> Self {
        Self::new(0.3, 1.0)
    }
}

/// A triangle with counter-clockwise winding
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Triangle {
    pub a: Vec3,
    pub b: Vec3,
    pub c: Vec3,
}

impl Triangle {
    pub fn new(a: Vec3, b: Vec3, c: Vec3) -> Self {
        Self { a, b, c }
    }

    /// Unit face normal (right-handed winding)
    pub fn normal(&self) -> Vec3 {
        (self.b - self.a).cross(self.c - self.a).normalized()
    }

    /// True if the triangle has (near) zero area
    pub fn is_degenerate(&self) -> bool {
        (self.b - self.a).cross(self.c - self.a).length_squared() <= 1e-12
    }

    pub fn bounds(&self) -> Aabb {
        Aabb::from_points(self.a, self.b).including(self.c)
    }

    pub fn centroid(&self) -> Vec3 {
        (self.a + self.b + self.c) / 3.0
    }

    /// Closest point on the triangle to `p` (Voronoi region walk)
    pub fn closest_point(&self, p: Vec3) -> Vec3 {
        let (a, b, c) = (self.a, self.b, self.c);
        let ab = b - a;
        let ac = c - a;
        let ap = p - a;
        let d1 = ab.dot(ap);
        let d2 = ac.dot(ap);
        if d1 <= 0.0 && d2 <= 0.0 {
            return a;
        }

        let bp = p - b;
        let d3 = ab.dot(bp);
        let d4 = ac.dot(bp);
        if d3 >= 0.0 && d4 <= d3 {
            return b;
        }

        let vc = d1 * d4 - d3 * d2;
        if vc <= 0.0 && d1 >= 0.0 && d3 <= 0.0 {
            let v = d1 / (d1 - d3);
            return a + ab * v;
        }

        let cp = p - c;
        let d5 = ab.dot(cp);
        let d6 = ac.dot(cp);
        if d6 >= 0.0 && d5 <= d6 {
            return c;
        }

        let vb = d5 * d2 - d1 * d6;
        if vb <= 0.0 && d2 >= 0.0 && d6 <= 0.0 {
            let w = d2 / (d2 - d6);
            return a + ac * w;
        }

        let va = d3 * d6 - d5 * d4;
        if va <= 0.0 && (d4 - d3) >= 0.0 && (d5 - d6) >= 0.0 {
            let w = (d4 - d3) / ((d4 - d3) + (d5 - d6));
            return b + (c - b) * w;
        }

        let denom = 1.0 / (va + vb + vc);
        let v = vb * denom;
        let w = vc * denom;
        a + ab * v + ac * w
    }

    /// Point where `segment` pierces the triangle, if it does
    pub fn intersect_segment(&self, segment: &Segment) -> Option<Vec3> {
        let dir = segment.end - segment.start;
        let e1 = self.b - self.a;
        let e2 = self.c - self.a;
        let h = dir.cross(e2);
        let det = e1.dot(h);
        if det.abs() < 1e-8 {
            return None;
        }
        let inv_det = 1.0 / det;
        let s = segment.start - self.a;
        let u = s.dot(h) * inv_det;
        if !(0.0..=1.0).contains(&u) {
            return None;
        }
        let q = s.cross(e1);
        let v = dir.dot(q) * inv_det;
        if v < 0.0 || u + v > 1.0 {
            return None;
        }
        let t = e2.dot(q) * inv_det;
        if (0.0..=1.0).contains(&t) {
            Some(segment.start + dir * t)
        } else {
            None
        }
    }

    /// Closest pair of points between the triangle and a segment
    pub fn closest_points_to_segment(&self, segment: &Segment) -> ClosestPoints {
        if let Some(hit) = self.intersect_segment(segment) {
            return ClosestPoints { on_triangle: hit, on_segment: hit, distance: 0.0 };
        }

        let mut best = {
            let on_triangle = self.closest_point(segment.start);
            ClosestPoints::new(on_triangle, segment.start)
        };

        let end = ClosestPoints::new(self.closest_point(segment.end), segment.end);
        if end.distance < best.distance {
            best = end;
        }

        for edge in [
            Segment::new(self.a, self.b),
            Segment::new(self.b, self.c),
            Segment::new(self.c, self.a),
        ] {
            let (on_edge, on_segment) = closest_points_between_segments(&edge, segment);
            let candidate = ClosestPoints::new(on_edge, on_segment);
            if candidate.distance < best.distance {
                best = candidate;
            }
        }

        best
    }
}

/// Result of a closest-point query between a triangle and a segment
#[derive(Clone, Copy, Debug)]
pub struct ClosestPoints {
    pub on_triangle: Vec3,
    pub on_segment: Vec3,
    pub distance: f32,
}

impl ClosestPoints {
    fn new(on_triangle: Vec3, on_segment: Vec3) -> Self {
        Self {
            on_triangle,
            on_segment,
            distance: on_triangle.distance(on_segment),
        }
    }
}

/// Closest points between two segments, returned as (on `a`, on `b`)
pub fn closest_points_between_segments(a: &Segment, b: &Segment) -> (Vec3, Vec3) {
    let d1 = a.end - a.start;
    let d2 = b.end - b.start;
    let r = a.start - b.start;
    let len1 = d1.length_squared();
    let len2 = d2.length_squared();
    let f = d2.dot(r);

    if len1 <= f32::EPSILON && len2 <= f32::EPSILON {
        return (a.start, b.start);
    }

    let (s, t) = if len1 <= f32::EPSILON {
        (0.0, (f / len2).clamp(0.0, 1.0))
    } else {
        let c = d1.dot(r);
        if len2 <= f32::EPSILON {
            ((-c / len1).clamp(0.0, 1.0), 0.0)
        } else {
            let bd = d1.dot(d2);
            let denom = len1 * len2 - bd * bd;
            let mut s = if denom != 0.0 {
                ((bd * f - c * len2) / denom).clamp(0.0, 1.0)
            } else {
                0.0
            };
            let mut t = (bd * s + f) / len2;
            if t < 0.0 {
                t = 0.0;
                s = (-c / len1).clamp(0.0, 1.0);
            } else if t > 1.0 {
                t = 1.0;
                s = ((bd - c) / len1).clamp(0.0, 1.0);
            }
            (s, t)
        }
    };

    (a.start + d1 * s, b.start + d2 * t)
}

/// An axis-aligned bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Aabb {
    /// Minimum corner (all components are minimums)
    pub min: Vec3,
    /// Maximum corner (all components are maximums)
    pub max: Vec3,
}

impl Aabb {
    /// An inverted box that any union will replace
    pub const EMPTY: Self = Self {
        min: Vec3::splat(f32::INFINITY),
        max: Vec3::splat(f32::NEG_INFINITY),
    };

    pub fn new(min: Vec3, max: Vec3) -> Self {
        Self { min, max }
    }

    /// Smallest box containing both points
    pub fn from_points(a: Vec3, b: Vec3) -> Self {
        Self::new(a.min_components(b), a.max_components(b))
    }

    pub fn including(&self, p: Vec3) -> Self {
        Self::new(self.min.min_components(p), self.max.max_components(p))
    }

    pub fn union(&self, other: &Self) -> Self {
        Self::new(self.min.min_components(other.min), self.max.max_components(other.max))
    }

    /// Grow every face outward by `amount`
    pub fn expanded(&self, amount: f32) -> Self {
        Self::new(self.min - Vec3::splat(amount), self.max + Vec3::splat(amount))
    }

    pub fn center(&self) -> Vec3 {
        (self.min + self.max) * 0.5
    }

    pub fn size(&self) -> Vec3 {
        self.max - self.min
    }

    /// Index of the longest axis (0 = x, 1 = y, 2 = z)
    pub fn longest_axis(&self) -> usize {
        let s = self.size();
        if s.x >= s.y && s.x >= s.z {
            0
        } else if s.y >= s.z {
            1
        } else {
            2
        }
    }

    /// Overlap test, touching boxes count as intersecting
    pub fn intersects(&self, other: &Self) -> bool {
        self.min.x <= other.max.x
            && self.max.x >= other.min.x
            && self.min.y <= other.max.y
            && self.max.y >= other.min.y
            && self.min.z <= other.max.z
            && self.max.z >= other.min.z
    }

    pub fn contains(&self, p: Vec3) -> bool {
        p.x >= self.min.x
            && p.x <= self.max.x
            && p.y >= self.min.y
            && p.y <= self.max.y
            && p.z >= self.min.z
            && p.z <= self.max.z
    }
}
