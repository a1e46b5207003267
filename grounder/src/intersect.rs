/*!
Manual ray vs. triangle-soup intersection (Möller–Trumbore).

This is the fallback used when the ground has no collider in the query world.
There is no spatial index: every triangle is tested, so the cost is linear in
the triangle count. Feed it a coarse proxy mesh rather than render geometry.

All per-triangle work happens in mesh-local space. Only the winning hit is
transformed back to world space.
*/

use rapier3d::prelude::Ray;

use crate::{
    mesh::Mesh,
    settings::EPS,
    space::SpaceTransform,
    types::{Point3, SurfaceHit, Vec3},
};

/// Ray parameter and barycentrics of a single triangle hit.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct TriangleHit {
    /// Hit position along the ray: `origin + dir * t`.
    pub t: f32,
    pub u: f32,
    pub v: f32,
}

/// Nearest hit of a local-space ray against a mesh.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct LocalHit {
    pub t: f32,
    pub point: Point3,
    /// Unit geometric normal `normalize(e1 × e2)`; follows the triangle winding.
    pub normal: Vec3,
    /// Index of the triangle (not the index-list offset).
    pub triangle: usize,
}

/// Single Möller–Trumbore test.
///
/// Rejects rays parallel to the triangle plane (`|det| < EPS`), hits outside the
/// triangle, and hits at or behind the origin (`t <= EPS`). Degenerate
/// (zero-area) triangles always fail the determinant test.
#[inline]
pub fn intersect_triangle(ray: &Ray, v0: &Point3, v1: &Point3, v2: &Point3) -> Option<TriangleHit> {
    let e1 = v1 - v0;
    let e2 = v2 - v0;

    let p = ray.dir.cross(&e2);
    let det = e1.dot(&p);
    if det.abs() < EPS {
        return None;
    }
    let inv_det = 1.0 / det;

    let tvec = ray.origin - v0;
    let u = tvec.dot(&p) * inv_det;
    // Written as a range check so NaN is rejected too.
    if !(0.0..=1.0).contains(&u) {
        return None;
    }

    let q = tvec.cross(&e1);
    let v = ray.dir.dot(&q) * inv_det;
    if !(v >= 0.0 && u + v <= 1.0) {
        return None;
    }

    let t = e2.dot(&q) * inv_det;
    (t > EPS).then_some(TriangleHit { t, u, v })
}

/// Nearest hit of `ray` against every triangle of `mesh`, both in the mesh's
/// local space.
///
/// Returns `None` for an empty mesh or a zero-length / non-finite direction.
pub fn raycast_mesh_local(ray: &Ray, mesh: &Mesh) -> Option<LocalHit> {
    if mesh.is_empty() || !is_usable(ray) {
        return None;
    }

    let mut best: Option<(TriangleHit, usize, [Point3; 3])> = None;
    for (i, tri) in mesh.triangles().enumerate() {
        let [v0, v1, v2] = &tri;
        if let Some(hit) = intersect_triangle(ray, v0, v1, v2) {
            if best.as_ref().map_or(true, |(b, _, _)| hit.t < b.t) {
                best = Some((hit, i, tri));
            }
        }
    }

    let (hit, triangle, [v0, v1, v2]) = best?;
    let normal = (v1 - v0).cross(&(v2 - v0)).normalize();
    Some(LocalHit {
        t: hit.t,
        point: ray.point_at(hit.t),
        normal,
        triangle,
    })
}

/// Nearest hit of a world-space `ray` against `mesh` placed by `transform`.
///
/// The ray is mapped into local space, the scan runs there, and the winning
/// point/normal are mapped back. `distance` is measured in world space.
pub fn raycast_mesh<T: SpaceTransform + ?Sized>(
    ray: &Ray,
    mesh: &Mesh,
    transform: &T,
) -> Option<SurfaceHit> {
    let local_ray = Ray::new(
        transform.inverse_transform_point(&ray.origin),
        transform.inverse_transform_vector(&ray.dir),
    );
    let hit = raycast_mesh_local(&local_ray, mesh)?;

    let point = transform.transform_point(&hit.point);
    let normal = transform
        .transform_normal(&hit.normal)
        .try_normalize(0.0)
        .unwrap_or(hit.normal);

    Some(SurfaceHit {
        point,
        normal,
        distance: (point - ray.origin).norm(),
    })
}

#[inline]
fn is_usable(ray: &Ray) -> bool {
    ray.dir.norm_squared() > 0.0
        && ray.dir.iter().all(|c| c.is_finite())
        && ray.origin.iter().all(|c| c.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{Iso, Quat, Transform};

    /// Unit quad on the XZ plane at height `y`, spanning [0,1]x[0,1], facing +Y.
    fn quad_at(y: f32, base: u32) -> (Vec<Point3>, Vec<u32>) {
        let verts = vec![
            Point3::new(0.0, y, 0.0),
            Point3::new(1.0, y, 0.0),
            Point3::new(1.0, y, 1.0),
            Point3::new(0.0, y, 1.0),
        ];
        let idx = vec![base, base + 2, base + 1, base, base + 3, base + 2];
        (verts, idx)
    }

    fn quad(y: f32) -> Mesh {
        let (v, i) = quad_at(y, 0);
        Mesh::new(v, i).unwrap()
    }

    fn down(x: f32, y: f32, z: f32) -> Ray {
        Ray::new(Point3::new(x, y, z), Vec3::new(0.0, -1.0, 0.0))
    }

    #[test]
    fn downward_ray_hits_quad_under_origin() {
        let mesh = quad(0.5);
        let hit = raycast_mesh_local(&down(0.3, 3.0, 0.7), &mesh).unwrap();
        assert!((hit.point.y - 0.5).abs() < 1.0e-6);
        assert!((hit.point.x - 0.3).abs() < 1.0e-6);
        assert!((hit.point.z - 0.7).abs() < 1.0e-6);
        assert!((hit.t - 2.5).abs() < 1.0e-6);
        // Winding above faces +Y.
        assert!((hit.normal - Vec3::y()).norm() < 1.0e-6);
    }

    #[test]
    fn downward_ray_outside_quad_misses() {
        let mesh = quad(0.0);
        assert!(raycast_mesh_local(&down(1.5, 1.0, 0.5), &mesh).is_none());
        assert!(raycast_mesh_local(&down(0.5, 1.0, -0.01), &mesh).is_none());
    }

    #[test]
    fn upper_of_two_stacked_quads_wins() {
        let (mut verts, mut idx) = quad_at(0.0, 0);
        let (upper_v, upper_i) = quad_at(2.0, 4);
        verts.extend(upper_v);
        idx.extend(upper_i);
        let mesh = Mesh::new(verts, idx).unwrap();

        let hit = raycast_mesh_local(&down(0.5, 5.0, 0.5), &mesh).unwrap();
        assert!((hit.point.y - 2.0).abs() < 1.0e-6);
        assert!(hit.triangle >= 2);

        // Upper quad listed first: index order must not matter.
        let (mut verts, mut idx) = quad_at(2.0, 0);
        let (lower_v, lower_i) = quad_at(0.0, 4);
        verts.extend(lower_v);
        idx.extend(lower_i);
        let mesh = Mesh::new(verts, idx).unwrap();
        let hit = raycast_mesh_local(&down(0.5, 5.0, 0.5), &mesh).unwrap();
        assert!((hit.point.y - 2.0).abs() < 1.0e-6);
    }

    #[test]
    fn parallel_ray_never_hits() {
        let v0 = Point3::new(0.0, 0.0, 0.0);
        let v1 = Point3::new(1.0, 0.0, 0.0);
        let v2 = Point3::new(0.0, 0.0, 1.0);
        // In the plane, above it and below it, all running along +X.
        for y in [0.0, 0.25, -3.0] {
            let ray = Ray::new(Point3::new(-1.0, y, 0.2), Vec3::new(1.0, 0.0, 0.0));
            assert!(intersect_triangle(&ray, &v0, &v1, &v2).is_none());
        }
    }

    #[test]
    fn hits_at_or_behind_origin_are_rejected() {
        let mesh = quad(0.0);
        // Surface above the origin.
        assert!(raycast_mesh_local(&down(0.5, -1.0, 0.5), &mesh).is_none());
        // Origin on the surface.
        assert!(raycast_mesh_local(&down(0.5, 0.0, 0.5), &mesh).is_none());
    }

    #[test]
    fn degenerate_triangles_are_skipped() {
        let verts = vec![
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(1.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
        ];
        let mesh = Mesh::new(verts, vec![0, 1, 2, 0, 0, 0]).unwrap();
        assert!(raycast_mesh_local(&down(0.5, 1.0, 0.0), &mesh).is_none());
    }

    #[test]
    fn empty_mesh_and_zero_direction_miss() {
        let empty = Mesh::default();
        assert!(raycast_mesh_local(&down(0.5, 1.0, 0.5), &empty).is_none());

        let still = Ray::new(Point3::new(0.5, 1.0, 0.5), Vec3::zeros());
        assert!(raycast_mesh_local(&still, &quad(0.0)).is_none());
    }

    #[test]
    fn world_hit_accounts_for_mesh_pose() {
        let mesh = quad(0.0);
        let pose = Transform::from_translation(Vec3::new(10.0, 3.0, -4.0))
            .with_scale(Vec3::new(4.0, 1.0, 4.0));

        // Inside the scaled quad: x in [10, 14], z in [-4, 0].
        let ray = down(12.0, 10.0, -1.0);
        let hit = raycast_mesh(&ray, &mesh, &pose).unwrap();
        assert!((hit.point - Point3::new(12.0, 3.0, -1.0)).norm() < 1.0e-5);
        assert!((hit.distance - 7.0).abs() < 1.0e-5);
        assert!((hit.normal - Vec3::y()).norm() < 1.0e-5);

        // The unscaled footprint would end at x = 11.
        assert!(raycast_mesh(&down(13.5, 10.0, -0.5), &mesh, &pose).is_some());
        assert!(raycast_mesh(&down(14.5, 10.0, -0.5), &mesh, &pose).is_none());
    }

    #[test]
    fn world_distance_uses_world_units_for_rotated_mesh() {
        let mesh = quad(0.0);
        let iso = Iso::from_parts(
            nalgebra::Translation3::new(0.0, 1.0, 0.0),
            Quat::from_axis_angle(&Vec3::y_axis(), std::f32::consts::PI),
        );
        // Rotating 180° about Y maps the [0,1]² footprint to [-1,0]².
        let hit = raycast_mesh(&down(-0.5, 4.0, -0.5), &mesh, &iso).unwrap();
        assert!((hit.point.y - 1.0).abs() < 1.0e-5);
        assert!((hit.distance - 3.0).abs() < 1.0e-5);
        assert!(raycast_mesh(&down(0.5, 4.0, 0.5), &mesh, &iso).is_none());
    }

    #[test]
    fn zero_scale_pose_misses_instead_of_producing_nan() {
        let pose = Transform::default().with_scale(Vec3::new(0.0, 1.0, 1.0));
        assert!(raycast_mesh(&down(0.5, 1.0, 0.5), &quad(0.0), &pose).is_none());
    }

    #[test]
    fn oblique_ray_hits_world_geometry_of_tilted_non_uniformly_scaled_mesh() {
        let corners = |y: f32| {
            [
                Point3::new(-2.0, y, -2.0),
                Point3::new(2.0, y, -2.0),
                Point3::new(2.0, y, 2.0),
                Point3::new(-2.0, y, 2.0),
            ]
        };
        let vertices: Vec<Point3> = corners(0.0).into_iter().chain(corners(0.5)).collect();
        let mesh = Mesh::new(vertices, vec![0, 2, 1, 0, 3, 2, 4, 6, 5, 4, 7, 6]).unwrap();
        let pose = Transform::new(
            Vec3::new(1.0, 0.5, -1.0),
            Quat::from_axis_angle(&Vec3::z_axis(), 0.4),
        )
        .with_scale(Vec3::new(3.0, 0.5, 1.5));
        let ray = Ray::new(Point3::new(1.2, 6.0, -0.8), Vec3::new(0.25, -1.0, 0.1));

        // Same scan done directly on the world-space triangles.
        let expected_t = mesh
            .triangles()
            .filter_map(|[a, b, c]| {
                intersect_triangle(
                    &ray,
                    &pose.transform_point(&a),
                    &pose.transform_point(&b),
                    &pose.transform_point(&c),
                )
            })
            .map(|hit| hit.t)
            .fold(f32::INFINITY, f32::min);
        assert!(expected_t.is_finite());

        let hit = raycast_mesh(&ray, &mesh, &pose).unwrap();
        assert!((hit.point - ray.point_at(expected_t)).norm() < 1.0e-4);
        assert!((hit.distance - expected_t * ray.dir.norm()).abs() < 1.0e-4);

        // The upper quad is the one in front of the ray.
        let local = pose.inverse_transform_point(&hit.point);
        assert!((local.y - 0.5).abs() < 1.0e-4);
    }
}
