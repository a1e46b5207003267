//! Actors circling the scene. They only move on X and Z; the grounder owns y.

use std::f32::consts::TAU;

use bevy::prelude::*;
use grounder::{GrounderSettings, SurfaceMask};

use crate::{ground::Grounded, world::GROUND_LAYER};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, spawn_actors);
    app.add_systems(Update, wander);
}

const ACTOR_SIZE: f32 = 0.8;
const SPAWN_HEIGHT: f32 = 4.0;

/// Circular path around `center` on the XZ plane.
#[derive(Component)]
pub struct Wander {
    pub center: Vec2,
    pub radius: f32,
    /// Meters per second along the path.
    pub speed: f32,
    pub phase: f32,
}

impl Wander {
    fn point(&self) -> Vec2 {
        self.center + self.radius * Vec2::new(self.phase.cos(), self.phase.sin())
    }
}

/// The actor the camera follows.
#[derive(Component)]
pub struct Followed;

struct ActorSpec {
    center: Vec2,
    radius: f32,
    speed: f32,
    color: Color,
    settings: GrounderSettings,
}

fn actor_specs() -> [ActorSpec; 4] {
    let base = GrounderSettings {
        offset_y: ACTOR_SIZE * 0.5,
        ground_mask: SurfaceMask(GROUND_LAYER),
        manual_mesh_fallback: true,
        ..GrounderSettings::default()
    };
    [
        // Crosses from the yard onto the terrain and back.
        ActorSpec {
            center: Vec2::new(0.0, 0.0),
            radius: 9.0,
            speed: 3.0,
            color: Color::srgb_u8(240, 200, 80),
            settings: base,
        },
        ActorSpec {
            center: Vec2::new(-8.0, 2.0),
            radius: 5.0,
            speed: 2.5,
            color: Color::srgb_u8(90, 200, 240),
            settings: GrounderSettings {
                smooth: false,
                ..base
            },
        },
        ActorSpec {
            center: Vec2::new(12.0, -3.0),
            radius: 6.0,
            speed: 4.0,
            color: Color::srgb_u8(200, 90, 220),
            settings: GrounderSettings {
                smooth_time: 0.3,
                ..base
            },
        },
        // Collider ground only: keeps its last height over the terrain.
        ActorSpec {
            center: Vec2::new(0.0, 6.0),
            radius: 7.0,
            speed: 3.5,
            color: Color::srgb_u8(230, 80, 80),
            settings: GrounderSettings {
                manual_mesh_fallback: false,
                ..base
            },
        },
    ]
}

fn spawn_actors(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let cube = meshes.add(Cuboid::new(ACTOR_SIZE, ACTOR_SIZE, ACTOR_SIZE));

    for (i, spec) in actor_specs().into_iter().enumerate() {
        let path = Wander {
            center: spec.center,
            radius: spec.radius,
            speed: spec.speed,
            phase: i as f32 * TAU / 4.0,
        };
        let start = path.point();

        let mut actor = commands.spawn((
            Mesh3d(cube.clone()),
            MeshMaterial3d(materials.add(spec.color)),
            Transform::from_xyz(start.x, SPAWN_HEIGHT, start.y),
            Grounded::new(spec.settings),
            path,
        ));
        if i == 0 {
            actor.insert(Followed);
        }
    }
}

fn wander(time: Res<Time>, mut actors: Query<(&mut Transform, &mut Wander)>) {
    let dt = time.delta_secs();
    for (mut transform, mut path) in &mut actors {
        if path.radius <= 0.0 {
            continue;
        }
        path.phase = (path.phase + path.speed * dt / path.radius) % TAU;
        let p = path.point();
        transform.translation.x = p.x;
        transform.translation.z = p.y;
    }
}
