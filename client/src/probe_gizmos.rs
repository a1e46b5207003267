//! Probe visualization: the probe segment of each actor and its last hit.
//!
//! `G` toggles drawing.

use bevy::{
    color::palettes::css::{LIME, ORANGE, YELLOW},
    prelude::*,
};
use grounder::GroundSource;

use crate::ground::{Grounded, to_point, to_vec3};

pub(super) fn plugin(app: &mut App) {
    app.init_resource::<ShowProbes>();
    app.add_systems(Update, (toggle_probes, draw_probes).chain());
}

const HIT_MARKER_RADIUS: f32 = 0.08;

#[derive(Resource)]
struct ShowProbes(bool);

impl Default for ShowProbes {
    fn default() -> Self {
        Self(true)
    }
}

fn toggle_probes(keys: Res<ButtonInput<KeyCode>>, mut show: ResMut<ShowProbes>) {
    if keys.just_pressed(KeyCode::KeyG) {
        show.0 = !show.0;
    }
}

fn draw_probes(
    show: Res<ShowProbes>,
    mut gizmos: Gizmos,
    actors: Query<(&Transform, &Grounded)>,
) {
    if !show.0 {
        return;
    }

    for (transform, grounded) in &actors {
        let (start, end) = grounded
            .grounder
            .probe_segment(&to_point(transform.translation));
        gizmos.line(to_vec3(&start), to_vec3(&end), YELLOW);

        let Some(hit) = grounded.grounder.last_hit() else {
            continue;
        };
        let color = match grounded.source {
            Some(GroundSource::Mesh) => ORANGE,
            _ => LIME,
        };
        gizmos.sphere(
            Isometry3d::from_translation(to_vec3(&hit.point)),
            HIT_MARKER_RADIUS,
            color,
        );
        let normal = Vec3::new(hit.normal.x, hit.normal.y, hit.normal.z);
        gizmos.line(to_vec3(&hit.point), to_vec3(&hit.point) + normal * 0.5, color);
    }
}
