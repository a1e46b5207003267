//! Rapier-based query world for immutable ground geometry.
//!
//! This is the accelerated height source: static colliders live in Rapier's
//! broad-phase BVH and a ground probe is a single ray cast against it.
//!
//! Design goals
//! - Deterministic: given the same inputs (sorted by `id`), build identical in-memory sets.
//! - Query-focused: supports ray casts only; nothing is ever stepped.
//! - Immutable world: this builder assumes statics do not move after construction.
//!
//! Ground meshes without a collider can be promoted into this world with
//! [`WorldStaticDef::from_mesh`], which bakes the mesh pose into a world-space
//! trimesh collider.

// Re-export Rapier so downstream crates can use Rapier macros/types
// without needing to depend on `rapier3d` directly.
pub use rapier3d;

use rapier3d::na::{Translation3, UnitQuaternion};
use rapier3d::prelude::*;

use crate::{
    error::GroundError,
    height::HeightSource,
    mesh::Mesh,
    settings::EPS,
    space::SpaceTransform,
    types::{Point3, SurfaceHit, SurfaceMask},
};

/// Membership of a static collider when nothing else is specified (layer 0).
pub const DEFAULT_LAYERS: u32 = 1;

/// Canonical, schema-agnostic definition of an immutable world collider.
///
/// Conventions
/// - Units are meters.
/// - Rotation is a unit quaternion.
/// - `layers` are the collider's membership bits, matched against a probe's
///   [`SurfaceMask`].
#[derive(Clone, Debug)]
pub struct WorldStaticDef {
    /// Stable unique identifier used to ensure deterministic insertion order.
    pub id: u32,
    /// World-space translation.
    pub translation: Vector<f32>,
    /// World-space rotation (unit quaternion).
    pub rotation: UnitQuaternion<f32>,
    /// Collision layers this collider belongs to.
    pub layers: u32,
    /// Trigger volume: never reported as ground.
    pub sensor: bool,
    /// Collider shape parameters.
    pub shape: ColliderShapeDef,
}

impl WorldStaticDef {
    /// A solid collider on the default layer.
    pub fn new(
        id: u32,
        translation: Vector<f32>,
        rotation: UnitQuaternion<f32>,
        shape: ColliderShapeDef,
    ) -> Self {
        Self {
            id,
            translation,
            rotation,
            layers: DEFAULT_LAYERS,
            sensor: false,
            shape,
        }
    }

    pub fn with_layers(mut self, layers: u32) -> Self {
        self.layers = layers;
        self
    }

    pub fn as_sensor(mut self) -> Self {
        self.sensor = true;
        self
    }

    /// Trimesh collider for a collider-less ground mesh.
    ///
    /// Colliders are placed with isometries, so the full `transform` (scale
    /// included) is baked into world-space vertices and the def gets an identity pose.
    pub fn from_mesh<T: SpaceTransform + ?Sized>(id: u32, mesh: &Mesh, transform: &T) -> Self {
        let vertices = mesh
            .vertices()
            .iter()
            .map(|v| transform.transform_point(v))
            .collect();
        let indices = mesh.triangle_indices().collect();
        Self::new(
            id,
            Vector::zeros(),
            UnitQuaternion::identity(),
            ColliderShapeDef::TriMesh { vertices, indices },
        )
    }
}

/// Supported static collider shapes.
#[derive(Clone, Debug)]
pub enum ColliderShapeDef {
    /// Infinite plane (half-space) facing the pose's +Y.
    ///
    /// In Rapier, a plane/half-space is infinite. Any "X/Z size" a renderer
    /// shows is purely a mesh concern, not collision.
    Plane {
        /// Offset along the plane normal (meters).
        offset_along_normal: f32,
    },

    /// Oriented cuboid with given half-extents (meters).
    Cuboid { half_extents: Vector<f32> },

    /// Sphere/ball (meters).
    Sphere { radius: f32 },

    /// Y-aligned capsule (meters).
    CapsuleY { radius: f32, half_height: f32 },

    /// Triangle mesh in the pose's local frame.
    TriMesh {
        vertices: Vec<Point3>,
        indices: Vec<[u32; 3]>,
    },
}

/// In-memory Rapier structures needed for scene queries against a static world.
///
/// This stores:
/// - `RigidBodySet`/`ColliderSet` containing the static world geometry.
/// - `NarrowPhase` and `BroadPhaseBvh` used to create a borrowed `QueryPipeline`.
///
/// For immutable statics, these can be built once at startup and reused.
pub struct RapierQueryWorld {
    pub bodies: RigidBodySet,
    pub colliders: ColliderSet,
    pub broad_phase: BroadPhaseBvh,
    pub narrow_phase: NarrowPhase,
}

impl RapierQueryWorld {
    /// Build a query world from a list of static collider definitions.
    ///
    /// Determinism
    /// - The input is sorted by `id` before insertion.
    ///
    /// Fails if a trimesh def is rejected by Rapier (e.g., no triangles).
    pub fn build(mut defs: Vec<WorldStaticDef>) -> Result<Self, GroundError> {
        // Ensure deterministic insertion order.
        defs.sort_by_key(|d| d.id);

        let mut bodies = RigidBodySet::new();
        let mut colliders = ColliderSet::new();

        // Insert each static as a fixed rigid-body + attached collider.
        for def in defs {
            let iso = Isometry::from_parts(Translation3::from(def.translation), def.rotation);

            let rb = RigidBodyBuilder::fixed().pose(iso).build();
            let rb_handle = bodies.insert(rb);

            let collider = collider_from_def(&def)?;
            colliders.insert_with_parent(collider, rb_handle, &mut bodies);
        }

        // Collision-detection only (no dynamics): updates the broad-phase BVH
        // so ray casts can run.
        let mut broad_phase = BroadPhaseBvh::new();
        let mut narrow_phase = NarrowPhase::new();
        let mut collision_pipeline = CollisionPipeline::new();

        let hooks = ();
        let events = ();
        collision_pipeline.step(
            0.0,
            &mut broad_phase,
            &mut narrow_phase,
            &mut bodies,
            &mut colliders,
            &hooks,
            &events,
        );

        log::debug!("built ground query world with {} colliders", colliders.len());

        Ok(Self {
            bodies,
            colliders,
            broad_phase,
            narrow_phase,
        })
    }

    /// Create a borrowed `QueryPipeline` view suitable for scene queries.
    ///
    /// The returned pipeline borrows `self`, so it should be used within the scope
    /// of the borrow.
    pub fn query_pipeline<'a>(&'a self, filter: QueryFilter<'a>) -> QueryPipeline<'a> {
        self.broad_phase.as_query_pipeline(
            self.narrow_phase.query_dispatcher(),
            &self.bodies,
            &self.colliders,
            filter,
        )
    }

    /// Nearest solid, non-sensor hit along `ray` within `max_distance` on the
    /// layers selected by `mask`.
    ///
    /// A collider that contains the ray origin reports itself at distance zero.
    /// Such colliders are skipped and the nearest surface past them is returned,
    /// so a probe starting inside a deck or overhang still finds the floor below.
    pub fn cast_ray(&self, ray: &Ray, max_distance: f32, mask: SurfaceMask) -> Option<SurfaceHit> {
        if max_distance <= 0.0 {
            return None;
        }

        let groups = InteractionGroups::all().with_filter(Group::from_bits_truncate(mask.effective()));
        let filter = QueryFilter::default().exclude_sensors().groups(groups);
        let pipeline = self.query_pipeline(filter);

        let (_, nearest) = pipeline.cast_ray_and_get_normal(ray, max_distance, true)?;
        let hit = if nearest.time_of_impact > EPS {
            nearest
        } else {
            // Started inside something: scan every collider along the ray.
            pipeline
                .intersect_ray(*ray, max_distance, true)
                .map(|(_, _, hit)| hit)
                .filter(|hit| hit.time_of_impact > EPS)
                .min_by(|a, b| a.time_of_impact.total_cmp(&b.time_of_impact))?
        };

        Some(SurfaceHit {
            point: ray.point_at(hit.time_of_impact),
            normal: hit.normal,
            distance: hit.time_of_impact * ray.dir.norm(),
        })
    }
}

/// [`RapierQueryWorld`] as a [`HeightSource`], restricted to `mask`.
#[derive(Clone, Copy)]
pub struct RapierGround<'a> {
    pub world: &'a RapierQueryWorld,
    pub mask: SurfaceMask,
}

impl HeightSource for RapierGround<'_> {
    #[inline]
    fn cast(&self, ray: &Ray, max_distance: f32) -> Option<SurfaceHit> {
        self.world.cast_ray(ray, max_distance, self.mask)
    }
}

/// Build a Rapier collider from a `WorldStaticDef`.
///
/// The pose lives on the parent rigid-body, so the collider is created with an
/// identity local transform (planes add their offset along local +Y).
pub fn collider_from_def(def: &WorldStaticDef) -> Result<Collider, GroundError> {
    let builder = match &def.shape {
        ColliderShapeDef::Plane {
            offset_along_normal,
        } => ColliderBuilder::halfspace(Vector::y_axis())
            .translation(vector![0.0, *offset_along_normal, 0.0]),

        ColliderShapeDef::Cuboid { half_extents } => {
            ColliderBuilder::cuboid(half_extents.x, half_extents.y, half_extents.z)
        }

        ColliderShapeDef::Sphere { radius } => ColliderBuilder::ball(*radius),

        ColliderShapeDef::CapsuleY {
            radius,
            half_height,
        } => ColliderBuilder::capsule_y(*half_height, *radius),

        ColliderShapeDef::TriMesh { vertices, indices } => {
            ColliderBuilder::trimesh(vertices.clone(), indices.clone())
                .map_err(|e| GroundError::TriMesh(format!("{e:?}")))?
        }
    };

    let groups = InteractionGroups::all().with_memberships(Group::from_bits_truncate(def.layers));
    Ok(builder
        .collision_groups(groups)
        .sensor(def.sensor)
        .build())
}
