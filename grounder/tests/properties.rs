use grounder::{
    GrounderSettings, Grounder, Mesh, Point3, SurfaceHeightQuery, SurfaceHit, Transform, Vec3,
    advance, intersect_triangle, raycast_mesh_local, rapier3d::prelude::Ray,
};
use proptest::prelude::*;

/// Unit quad on the XZ plane at height `y`, vertices starting at `base`.
fn quad_at(y: f32, base: u32) -> (Vec<Point3>, Vec<u32>) {
    (
        vec![
            Point3::new(0.0, y, 0.0),
            Point3::new(1.0, y, 0.0),
            Point3::new(1.0, y, 1.0),
            Point3::new(0.0, y, 1.0),
        ],
        vec![base, base + 2, base + 1, base, base + 3, base + 2],
    )
}

fn down(x: f32, y: f32, z: f32) -> Ray {
    Ray::new(Point3::new(x, y, z), Vec3::new(0.0, -1.0, 0.0))
}

proptest! {
    #[test]
    fn downward_ray_lands_on_quad_inside_bounds(
        x in 0.001f32..0.999,
        z in 0.001f32..0.999,
        quad_y in -50.0f32..50.0,
        above in 0.01f32..100.0,
    ) {
        let (v, i) = quad_at(quad_y, 0);
        let mesh = Mesh::new(v, i).unwrap();
        let hit = raycast_mesh_local(&down(x, quad_y + above, z), &mesh).unwrap();
        prop_assert!((hit.point.y - quad_y).abs() < 1.0e-3);
        prop_assert!((hit.point.x - x).abs() < 1.0e-4);
        prop_assert!((hit.point.z - z).abs() < 1.0e-4);
    }

    #[test]
    fn downward_ray_outside_quad_misses(
        x in prop_oneof![-5.0f32..-0.001, 1.001f32..5.0],
        z in -5.0f32..5.0,
        above in 0.01f32..100.0,
    ) {
        let (v, i) = quad_at(0.0, 0);
        let mesh = Mesh::new(v, i).unwrap();
        prop_assert!(raycast_mesh_local(&down(x, above, z), &mesh).is_none());
        prop_assert!(raycast_mesh_local(&down(z, above, x), &mesh).is_none());
    }

    #[test]
    fn upper_of_stacked_quads_always_wins(
        x in 0.001f32..0.999,
        z in 0.001f32..0.999,
        lower in -20.0f32..20.0,
        gap in 0.01f32..10.0,
        above in 0.01f32..50.0,
        upper_first in any::<bool>(),
    ) {
        let upper = lower + gap;
        let (first_y, second_y) = if upper_first { (upper, lower) } else { (lower, upper) };
        let (mut verts, mut idx) = quad_at(first_y, 0);
        let (v2, i2) = quad_at(second_y, 4);
        verts.extend(v2);
        idx.extend(i2);
        let mesh = Mesh::new(verts, idx).unwrap();

        let hit = raycast_mesh_local(&down(x, upper + above, z), &mesh).unwrap();
        prop_assert!((hit.point.y - upper).abs() < 1.0e-3);
    }

    #[test]
    fn parallel_ray_never_hits_triangle(
        a in (-10.0f32..10.0, -10.0f32..10.0),
        b in (-10.0f32..10.0, -10.0f32..10.0),
        c in (-10.0f32..10.0, -10.0f32..10.0),
        plane_y in -10.0f32..10.0,
        origin in (-20.0f32..20.0, -20.0f32..20.0, -20.0f32..20.0),
        heading in 0.0f32..std::f32::consts::TAU,
    ) {
        let v0 = Point3::new(a.0, plane_y, a.1);
        let v1 = Point3::new(b.0, plane_y, b.1);
        let v2 = Point3::new(c.0, plane_y, c.1);
        let dir = Vec3::new(heading.cos(), 0.0, heading.sin());
        let ray = Ray::new(Point3::new(origin.0, origin.1, origin.2), dir);
        prop_assert!(intersect_triangle(&ray, &v0, &v1, &v2).is_none());
    }

    #[test]
    fn follower_gap_shrinks_every_tick_until_exactly_zero(
        start in -100.0f32..100.0,
        target in -100.0f32..100.0,
        response in 0.05f32..2.0,
        dt in 0.001f32..0.05,
    ) {
        prop_assume!((start - target).abs() > 1.0e-2);

        let (mut value, mut velocity) = (start, 0.0);
        let mut gap = (start - target).abs();
        let budget = (100.0 * response / dt).ceil() as usize + 1_000;

        for _ in 0..budget {
            (value, velocity) = advance(value, velocity, target, response, dt);
            let next = (value - target).abs();
            prop_assert!(next < gap || next == 0.0, "{} -> {}", gap, next);
            gap = next;
            if gap == 0.0 {
                break;
            }
        }
        prop_assert_eq!(value, target);
    }

    #[test]
    fn zero_response_time_snaps(
        value in -1.0e3f32..1.0e3,
        velocity in -1.0e3f32..1.0e3,
        target in -1.0e3f32..1.0e3,
        dt in 0.0f32..1.0,
    ) {
        prop_assert_eq!(advance(value, velocity, target, 0.0, dt), (target, 0.0));
    }
}

#[test]
fn accelerated_hit_preferred_over_mesh_hit() {
    let (v, i) = quad_at(0.0, 0);
    let mesh = Mesh::new(v, i).unwrap();
    let pose = Transform::default();

    let mut grounder = Grounder::new(GrounderSettings {
        smooth: false,
        manual_mesh_fallback: true,
        ..GrounderSettings::default()
    });
    let shelf = |ray: &Ray, _: f32| {
        Some(SurfaceHit {
            point: Point3::new(ray.origin.x, 0.4, ray.origin.z),
            normal: Vec3::y(),
            distance: ray.origin.y - 0.4,
        })
    };
    let query: SurfaceHeightQuery<'_> = grounder
        .query()
        .with_accelerated(&shelf)
        .with_mesh_fallback(&mesh, &pose);

    let tick = grounder.tick(&Point3::new(0.5, 1.0, 0.5), &query, 1.0 / 60.0);
    assert!((tick.y - 0.4).abs() < 1.0e-6);
}

#[test]
fn tracked_height_unchanged_when_everything_misses() {
    let (v, i) = quad_at(0.0, 0);
    let mesh = Mesh::new(v, i).unwrap();
    let pose = Transform::default();

    let mut grounder = Grounder::new(GrounderSettings {
        manual_mesh_fallback: true,
        ..GrounderSettings::default()
    });
    let nothing = |_: &Ray, _: f32| -> Option<SurfaceHit> { None };
    let query = grounder
        .query()
        .with_accelerated(&nothing)
        .with_mesh_fallback(&mesh, &pose);

    let mut y = 3.25;
    for _ in 0..10 {
        let tick = grounder.tick(&Point3::new(7.0, y, 7.0), &query, 1.0 / 60.0);
        assert!(tick.probe.is_none());
        assert_eq!(tick.y, y);
        y = tick.y;
    }
    assert_eq!(y, 3.25);
}
