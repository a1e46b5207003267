//! Keeps actors on the ground.
//!
//! Grounding runs in `PostUpdate` so it sees this frame's horizontal movement
//! and only ever rewrites the vertical coordinate.

use bevy::prelude::*;
use grounder::{
    GroundSource, Grounder, GrounderSettings, Mesh as GroundMesh, Point3,
    RapierQueryWorld, Transform as MeshPose,
};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(PostUpdate, ground_actors);
    app.add_systems(Update, teleport_actors);
}

/// Height a teleported actor is dropped from.
const TELEPORT_HEIGHT: f32 = 6.0;

/// Static ground geometry shared by every grounded actor.
#[derive(Resource)]
pub struct GroundWorld {
    /// Accelerated source: static colliders.
    pub colliders: RapierQueryWorld,
    /// Collider-less terrain and its pose, raycast manually when enabled.
    pub terrain: Option<(GroundMesh, MeshPose)>,
}

/// An actor whose y follows the ground beneath it.
#[derive(Component)]
pub struct Grounded {
    pub grounder: Grounder,
    /// Source of the most recent hit, `None` while airborne.
    pub source: Option<GroundSource>,
}

impl Grounded {
    pub fn new(settings: GrounderSettings) -> Self {
        Self {
            grounder: Grounder::new(settings),
            source: None,
        }
    }
}

#[inline]
pub fn to_point(v: Vec3) -> Point3 {
    Point3::new(v.x, v.y, v.z)
}

#[inline]
pub fn to_vec3(p: &Point3) -> Vec3 {
    Vec3::new(p.x, p.y, p.z)
}

fn ground_actors(
    time: Res<Time>,
    ground: Option<Res<GroundWorld>>,
    mut actors: Query<(&mut Transform, &mut Grounded)>,
) {
    let Some(ground) = ground else {
        return;
    };
    let dt = time.delta_secs();

    for (mut transform, mut grounded) in &mut actors {
        let mut query = grounded.grounder.query().with_rapier(&ground.colliders);
        if let Some((mesh, pose)) = &ground.terrain {
            query = query.with_mesh_fallback(mesh, pose);
        }

        let position = to_point(transform.translation);
        let tick = grounded.grounder.tick(&position, &query, dt);
        grounded.source = tick.probe.map(|probe| probe.source);

        if tick.y != transform.translation.y {
            transform.translation.y = tick.y;
        }
    }
}

/// `T` lifts every actor and restarts its smoothing from there.
fn teleport_actors(
    keys: Res<ButtonInput<KeyCode>>,
    mut actors: Query<(&mut Transform, &mut Grounded)>,
) {
    if !keys.just_pressed(KeyCode::KeyT) {
        return;
    }

    for (mut transform, mut grounded) in &mut actors {
        transform.translation.y = TELEPORT_HEIGHT;
        grounded.grounder.teleport(TELEPORT_HEIGHT);
        grounded.source = None;
    }
    info!("teleported actors to y={TELEPORT_HEIGHT}");
}
