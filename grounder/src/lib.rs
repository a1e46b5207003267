/*!
Ground-height resolution for objects that should stay on the surface beneath them.

Each tick a downward probe is cast from above the object. An accelerated
collision world is asked first; when it has no ground there, an optional
brute-force raycast against a collider-less mesh is tried. The resulting height
is fed to a critically damped follower that moves the object's y toward it.

- types:        math aliases, mesh transform, hit and mask types
- mesh:         validated triangle soup
- space:        local <-> world mapping for mesh raycasts
- intersect:    Möller–Trumbore nearest-hit scan
- rapier_world: accelerated static collider world
- height:       height sources and first-hit selection
- smoothing:    critically damped scalar follower
- controller:   per-object grounder tying the above together
*/

pub mod controller;
pub mod error;
pub mod height;
pub mod intersect;
pub mod mesh;
pub mod rapier_world;
pub mod settings;
pub mod smoothing;
pub mod space;
pub mod types;

pub use controller::{GroundTick, Grounder, GrounderSettings};
pub use error::GroundError;
pub use height::{
    GroundProbe, GroundSource, HeightSource, MeshGround, ProbeSettings, SurfaceHeightQuery,
    first_hit, probe_ray,
};
pub use intersect::{LocalHit, TriangleHit, intersect_triangle, raycast_mesh, raycast_mesh_local};
pub use mesh::Mesh;
pub use rapier_world::{
    ColliderShapeDef, RapierGround, RapierQueryWorld, WorldStaticDef, collider_from_def, rapier3d,
};
pub use smoothing::{Follower, FollowerState, advance, advance_with_max_speed};
pub use space::SpaceTransform;
pub use types::{Iso, Point3, Quat, SurfaceHit, SurfaceMask, Transform, Vec3};
