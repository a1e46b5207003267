/*!
Core grounding types and math aliases shared by the other modules.

This module intentionally contains no algorithms. It defines the data types
exchanged between:
- the manual mesh intersector (`intersect`)
- the height sources and their selection policy (`height`)
- the accelerated Rapier query world (`rapier_world`)
- the per-object controller (`controller`)
*/

use nalgebra as na;

/// Common math aliases for clarity and consistency.
pub type Vec3 = na::Vector3<f32>;
pub type Point3 = na::Point3<f32>;
pub type Quat = na::UnitQuaternion<f32>;
pub type Iso = na::Isometry3<f32>;

/// A translation/rotation/scale transform placing a mesh in world space.
///
/// Scale is applied first, then rotation, then translation. Per-axis scale is
/// allowed; see [`crate::SpaceTransform`] for how rays and normals are mapped.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform {
    pub translation: Vec3,
    pub rotation: Quat,
    pub scale: Vec3,
}

impl Transform {
    #[inline]
    pub fn new(translation: Vec3, rotation: Quat) -> Self {
        Self {
            translation,
            rotation,
            scale: Vec3::new(1.0, 1.0, 1.0),
        }
    }

    #[inline]
    pub fn from_translation(translation: Vec3) -> Self {
        Self::new(translation, Quat::identity())
    }

    #[inline]
    pub fn with_scale(mut self, scale: Vec3) -> Self {
        self.scale = scale;
        self
    }

    /// The rigid part of this transform (scale dropped).
    ///
    /// Rapier colliders are placed with isometries, so scaled geometry has to be
    /// baked into the vertices before it reaches the query world.
    #[inline]
    pub fn iso(&self) -> Iso {
        Iso::from_parts(
            na::Translation3::new(self.translation.x, self.translation.y, self.translation.z),
            self.rotation,
        )
    }
}

impl Default for Transform {
    fn default() -> Self {
        Self::new(Vec3::zeros(), Quat::identity())
    }
}

/// A single ground hit in world space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SurfaceHit {
    /// World-space impact point.
    pub point: Point3,
    /// World-space unit surface normal.
    pub normal: Vec3,
    /// World-space distance from the ray origin to `point` (meters).
    pub distance: f32,
}

/// Set of collision layers a probe may land on.
///
/// Bit `i` set means "surfaces on layer `i` are eligible". An empty mask is the
/// "nothing configured" state and selects every layer.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct SurfaceMask(pub u32);

impl SurfaceMask {
    /// Every layer.
    pub const ALL: SurfaceMask = SurfaceMask(u32::MAX);

    /// Mask with only `layer` set. Layers past 31 are ignored.
    #[inline]
    pub const fn layer(layer: u8) -> Self {
        if layer < 32 {
            SurfaceMask(1 << layer)
        } else {
            SurfaceMask(0)
        }
    }

    #[inline]
    pub const fn with(self, other: SurfaceMask) -> Self {
        SurfaceMask(self.0 | other.0)
    }

    /// Bits actually used for filtering: the wildcard when nothing is configured.
    #[inline]
    pub const fn effective(self) -> u32 {
        if self.0 == 0 { u32::MAX } else { self.0 }
    }

    #[inline]
    pub const fn contains(self, layers: u32) -> bool {
        self.effective() & layers != 0
    }
}
