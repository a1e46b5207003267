//! Demo scene: a collider yard on the west side, collider-less rolling terrain
//! on the east side.

use bevy::{
    asset::RenderAssetUsages,
    mesh::{Indices, PrimitiveTopology},
    prelude::*,
};
use grounder::{
    ColliderShapeDef, GroundError, Mesh as GroundMesh, Point3, Quat as NQuat, RapierQueryWorld,
    Transform as MeshPose, Vec3 as NVec3, WorldStaticDef,
};
use nalgebra::{UnitQuaternion, Vector3};

use crate::ground::{GroundWorld, to_vec3};

pub(super) fn plugin(app: &mut App) {
    app.add_systems(Startup, setup);
}

/// Layer of everything actors may stand on.
pub const GROUND_LAYER: u32 = 1 << 0;
/// Decorative colliders that actors walk through.
pub const PROP_LAYER: u32 = 1 << 1;

const TERRAIN_HALF_EXTENT: f32 = 15.0;
const TERRAIN_CELLS: u32 = 48;
/// Promote the terrain into the collider world instead of raycasting it as a mesh.
const BAKE_TERRAIN_COLLIDER: bool = false;

fn setup(
    mut commands: Commands,
    mut meshes: ResMut<Assets<Mesh>>,
    mut materials: ResMut<Assets<StandardMaterial>>,
) {
    let terrain = match rolling_terrain() {
        Ok(mesh) => mesh,
        Err(err) => {
            error!("terrain mesh rejected: {err}");
            return;
        }
    };
    let terrain_pose = MeshPose::from_translation(NVec3::new(TERRAIN_HALF_EXTENT, 0.0, 0.0))
        .with_scale(NVec3::new(1.0, 1.5, 1.0));

    let mut defs = yard();
    if BAKE_TERRAIN_COLLIDER {
        defs.push(WorldStaticDef::from_mesh(100, &terrain, &terrain_pose).with_layers(GROUND_LAYER));
    }

    let solid = materials.add(StandardMaterial {
        base_color: Color::linear_rgb(0.2, 0.3, 0.25),
        perceptual_roughness: 1.0,
        metallic: 0.0,
        ..default()
    });
    let prop = materials.add(Color::srgb_u8(124, 144, 255));
    let trigger = materials.add(StandardMaterial {
        base_color: Color::srgba(1.0, 0.4, 0.2, 0.25),
        alpha_mode: AlphaMode::Blend,
        ..default()
    });

    for def in &defs {
        let Some(mesh) = render_shape(&def.shape) else {
            continue;
        };
        let material = if def.sensor {
            trigger.clone()
        } else if def.layers & PROP_LAYER != 0 {
            prop.clone()
        } else {
            solid.clone()
        };
        commands.spawn((
            Mesh3d(meshes.add(mesh)),
            MeshMaterial3d(material),
            def_transform(def),
        ));
    }

    commands.spawn((
        Mesh3d(meshes.add(render_mesh(&terrain))),
        MeshMaterial3d(materials.add(StandardMaterial {
            base_color: Color::linear_rgb(0.35, 0.3, 0.2),
            perceptual_roughness: 1.0,
            ..default()
        })),
        pose_transform(&terrain_pose),
    ));

    // light
    commands.spawn((
        DirectionalLight {
            shadows_enabled: true,
            ..default()
        },
        Transform::from_xyz(4.0, 8.0, 4.0).looking_at(Vec3::ZERO, Vec3::Y),
    ));

    let colliders = match RapierQueryWorld::build(defs) {
        Ok(world) => world,
        Err(err) => {
            error!("collider world rejected: {err}");
            return;
        }
    };

    info!(
        "world ready: {} colliders, terrain {}",
        colliders.colliders.len(),
        if BAKE_TERRAIN_COLLIDER { "baked" } else { "mesh fallback" }
    );
    commands.insert_resource(GroundWorld {
        colliders,
        terrain: (!BAKE_TERRAIN_COLLIDER).then_some((terrain, terrain_pose)),
    });
}

/// Static colliders of the west yard.
fn yard() -> Vec<WorldStaticDef> {
    let level = UnitQuaternion::identity();
    vec![
        // Floor, top face at y = 0.
        WorldStaticDef::new(
            1,
            Vector3::new(-TERRAIN_HALF_EXTENT, -0.5, 0.0),
            level,
            ColliderShapeDef::Cuboid {
                half_extents: Vector3::new(TERRAIN_HALF_EXTENT, 0.5, TERRAIN_HALF_EXTENT),
            },
        ),
        // Platform, top face at y = 1.
        WorldStaticDef::new(
            2,
            Vector3::new(-8.0, 0.5, 5.0),
            level,
            ColliderShapeDef::Cuboid {
                half_extents: Vector3::new(3.0, 0.5, 3.0),
            },
        ),
        WorldStaticDef::new(
            3,
            Vector3::new(-6.0, 0.0, -6.0),
            UnitQuaternion::from_axis_angle(&Vector3::z_axis(), 0.3),
            ColliderShapeDef::Cuboid {
                half_extents: Vector3::new(4.0, 0.4, 2.0),
            },
        ),
        WorldStaticDef::new(
            4,
            Vector3::new(-12.0, 0.0, -4.0),
            level,
            ColliderShapeDef::Sphere { radius: 1.5 },
        )
        .with_layers(PROP_LAYER),
        WorldStaticDef::new(
            5,
            Vector3::new(-3.0, 1.0, 2.0),
            level,
            ColliderShapeDef::CapsuleY {
                radius: 0.5,
                half_height: 0.5,
            },
        )
        .with_layers(PROP_LAYER),
        WorldStaticDef::new(
            6,
            Vector3::new(-18.0, 1.5, -6.0),
            level,
            ColliderShapeDef::Cuboid {
                half_extents: Vector3::new(2.0, 1.5, 2.0),
            },
        )
        .as_sensor(),
    ]
}

fn rolling_terrain() -> Result<GroundMesh, GroundError> {
    heightfield(TERRAIN_HALF_EXTENT, TERRAIN_CELLS, |x, z| {
        // Flat along the west edge so it meets the yard floor.
        let blend = ((x + TERRAIN_HALF_EXTENT) / 6.0).clamp(0.0, 1.0);
        blend * (1.2 * (x * 0.35).sin() * (z * 0.3).cos() + 0.4 * (z * 0.8 + x * 0.2).sin() + 0.4)
    })
}

/// Square grid over `[-half_extent, half_extent]` on X and Z, lifted by `height(x, z)`.
///
/// Triangles wind counter-clockwise seen from +Y.
pub fn heightfield(
    half_extent: f32,
    cells: u32,
    height: impl Fn(f32, f32) -> f32,
) -> Result<GroundMesh, GroundError> {
    let cells = cells.max(1);
    let step = 2.0 * half_extent / cells as f32;
    let stride = cells + 1;

    let mut vertices = Vec::with_capacity((stride * stride) as usize);
    for row in 0..stride {
        let z = -half_extent + row as f32 * step;
        for col in 0..stride {
            let x = -half_extent + col as f32 * step;
            vertices.push(Point3::new(x, height(x, z), z));
        }
    }

    let mut indices = Vec::with_capacity((cells * cells * 6) as usize);
    for row in 0..cells {
        for col in 0..cells {
            let p00 = row * stride + col;
            let p10 = p00 + 1;
            let p01 = p00 + stride;
            let p11 = p01 + 1;
            indices.extend_from_slice(&[p00, p01, p10, p10, p01, p11]);
        }
    }

    GroundMesh::new(vertices, indices)
}

fn render_mesh(mesh: &GroundMesh) -> Mesh {
    triangle_list(
        mesh.vertices().iter().map(|v| [v.x, v.y, v.z]).collect(),
        mesh.indices().to_vec(),
    )
}

fn triangle_list(positions: Vec<[f32; 3]>, indices: Vec<u32>) -> Mesh {
    Mesh::new(PrimitiveTopology::TriangleList, RenderAssetUsages::default())
        .with_inserted_attribute(Mesh::ATTRIBUTE_POSITION, positions)
        .with_inserted_indices(Indices::U32(indices))
        .with_computed_normals()
}

/// Render mesh for a collider shape. Planes are infinite and have none.
fn render_shape(shape: &ColliderShapeDef) -> Option<Mesh> {
    match shape {
        ColliderShapeDef::Plane { .. } => None,
        ColliderShapeDef::Cuboid { half_extents } => Some(
            Cuboid::new(
                2.0 * half_extents.x,
                2.0 * half_extents.y,
                2.0 * half_extents.z,
            )
            .into(),
        ),
        ColliderShapeDef::Sphere { radius } => Some(Sphere::new(*radius).into()),
        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => Some(Capsule3d::new(*radius, 2.0 * half_height).into()),
        ColliderShapeDef::TriMesh { vertices, indices } => Some(triangle_list(
            vertices.iter().map(|v| [v.x, v.y, v.z]).collect(),
            indices.iter().flatten().copied().collect(),
        )),
    }
}

fn def_transform(def: &WorldStaticDef) -> Transform {
    let t = &def.translation;
    Transform::from_xyz(t.x, t.y, t.z).with_rotation(to_quat(&def.rotation))
}

fn pose_transform(pose: &MeshPose) -> Transform {
    Transform {
        translation: to_vec3(&Point3::from(pose.translation)),
        rotation: to_quat(&pose.rotation),
        scale: Vec3::new(pose.scale.x, pose.scale.y, pose.scale.z),
    }
}

fn to_quat(q: &NQuat) -> Quat {
    Quat::from_xyzw(q.i, q.j, q.k, q.w)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn heightfield_faces_up_and_covers_the_grid() {
        let mesh = heightfield(2.0, 4, |_, _| 0.5).unwrap();
        assert_eq!(mesh.vertices().len(), 25);
        assert_eq!(mesh.triangle_count(), 32);

        for [a, b, c] in mesh.triangles() {
            let normal = (b - a).cross(&(c - a));
            assert!(normal.y > 0.0);
        }
    }

    #[test]
    fn terrain_meets_the_yard_floor() {
        let mesh = rolling_terrain().unwrap();
        for v in mesh.vertices() {
            if v.x <= -TERRAIN_HALF_EXTENT + 1.0e-4 {
                assert!(v.y.abs() < 1.0e-6);
            }
        }
    }
}
