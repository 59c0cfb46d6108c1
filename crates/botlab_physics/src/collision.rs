//! Capsule vs triangle-mesh collision
//!
//! Resolution works per mesh: the capsule's axis segment is moved into the
//! mesh's local space, candidate triangles are pulled from the BVH, and each
//! penetrating triangle pushes the working segment out before the next one
//! is tested. The accumulated movement of the segment start, mapped back to
//! world space, is the correction for that mesh.
//!
//! Results from several meshes are combined with [`aggregate_hits`], which
//! sums them so that touching a floor and a wall in the same substep does not
//! depend on which mesh was tested first.

use botlab_math::Vec3;

use crate::bvh::CollisionMesh;
use crate::registry::ColliderKey;
use crate::shapes::Segment;

/// Corrections shorter than this are treated as floating-point noise
pub const CORRECTION_EPSILON: f32 = 1e-5;

/// Non-owning reference to the mesh that produced a contact
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum GroundRef {
    /// The scene's primary collision mesh
    Primary,
    /// A collider in the registry
    Collider(ColliderKey),
}

/// Outcome of resolving the capsule against one mesh
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CapsuleHit {
    /// World-space displacement that moves the capsule out of the mesh
    pub delta: Vec3,
    /// Unit push direction accumulated over every penetrating triangle
    pub normal: Vec3,
    /// World-space point on the mesh surface of the deepest contact
    pub point: Vec3,
    /// Largest single-triangle penetration depth
    pub depth: f32,
}

/// Resolve a capsule against one collision mesh
///
/// `segment` is the capsule axis in world space. Returns `None` when nothing
/// penetrates or when the mesh has no spatial index.
pub fn resolve_capsule(segment: &Segment, radius: f32, mesh: &CollisionMesh) -> Option<CapsuleHit> {
    let Some(bvh) = mesh.bvh() else {
        log::debug!("collision mesh has no spatial index; skipping");
        return None;
    };

    let local = segment.to_local(&mesh.transform);
    let query = local.bounds(radius);

    let mut working = local;
    let mut normal_sum = Vec3::ZERO;
    let mut deepest: Option<(f32, Vec3)> = None;

    bvh.shapecast(
        |bounds| bounds.intersects(&query),
        |_, tri| {
            let closest = tri.closest_points_to_segment(&working);
            if closest.distance >= radius {
                return false;
            }

            let depth = radius - closest.distance;
            let mut direction = (closest.on_segment - closest.on_triangle).normalized();
            if direction == Vec3::ZERO {
                // Segment touches the surface exactly: push along the face
                // normal, toward the side the capsule top is on
                let n = tri.normal();
                direction = if n.dot(working.start - tri.a) >= 0.0 { n } else { -n };
            }

            working = working.translated(direction * depth);
            normal_sum += direction;
            if deepest.map_or(true, |(d, _)| depth > d) {
                deepest = Some((depth, closest.on_triangle));
            }
            false
        },
    );

    let (depth, local_point) = deepest?;
    let corrected_start = mesh.transform.transform_point(working.start);
    Some(CapsuleHit {
        delta: corrected_start - segment.start,
        normal: mesh.transform.transform_vector(normal_sum).normalized(),
        point: mesh.transform.transform_point(local_point),
        depth,
    })
}

/// Combined result of every mesh the capsule touched in one substep
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AggregateContact {
    /// Sum of all per-mesh corrections
    pub delta: Vec3,
    /// Normalized sum of all per-mesh normals
    pub normal: Vec3,
    /// The most ground-aligned per-mesh normal (largest `y`)
    pub strongest_normal: Vec3,
    /// Owner of `strongest_normal`
    pub strongest: GroundRef,
    /// Contact point of the strongest hit
    pub point: Vec3,
    /// Number of meshes that reported a hit
    pub hit_count: usize,
}

/// Sum per-mesh hits into one correction
///
/// The sum is commutative, so the order meshes were tested in does not bias
/// the result. Returns `None` for an empty slice.
pub fn aggregate_hits(hits: &[(GroundRef, CapsuleHit)]) -> Option<AggregateContact> {
    let (first_ref, first_hit) = hits.first()?;

    let mut delta = Vec3::ZERO;
    let mut normal = Vec3::ZERO;
    let mut strongest = (*first_ref, *first_hit);
    for (owner, hit) in hits {
        delta += hit.delta;
        normal += hit.normal;
        if hit.normal.y > strongest.1.normal.y {
            strongest = (*owner, *hit);
        }
    }

    Some(AggregateContact {
        delta,
        normal: normal.normalized(),
        strongest_normal: strongest.1.normal,
        strongest: strongest.0,
        point: strongest.1.point,
        hit_count: hits.len(),
    })
}

/// Shorten a correction by [`CORRECTION_EPSILON`]
///
/// Returns `None` when nothing meaningful is left, so callers can skip the
/// position update instead of jittering.
pub fn clamp_correction(delta: Vec3) -> Option<Vec3> {
    let len = delta.length();
    let offset = len - CORRECTION_EPSILON;
    if offset <= 0.0 {
        return None;
    }
    Some(delta * (offset / len))
}
