//! Local <-> world mapping used by the manual mesh raycast.
//!
//! The manual intersector works in mesh-local space: the world probe ray is
//! pulled into local space once, every triangle is tested there, and only the
//! winning hit is pushed back out. Anything that can place a mesh in the world
//! implements [`SpaceTransform`].
//!
//! Vectors are mapped with the full linear part of the transform (scale
//! included), so a local ray is the exact preimage of the world ray and the ray
//! parameter `t` means the same point in both spaces.

use nalgebra as na;

use crate::types::{Point3, Transform, Vec3};

pub trait SpaceTransform {
    /// Local point -> world point.
    fn transform_point(&self, p: &Point3) -> Point3;
    /// Local direction -> world direction.
    fn transform_vector(&self, v: &Vec3) -> Vec3;
    /// World point -> local point.
    fn inverse_transform_point(&self, p: &Point3) -> Point3;
    /// World direction -> local direction.
    fn inverse_transform_vector(&self, v: &Vec3) -> Vec3;

    /// Local surface normal -> world surface normal (not normalized).
    ///
    /// Rigid and uniformly scaled transforms map normals like directions.
    fn transform_normal(&self, n: &Vec3) -> Vec3 {
        self.transform_vector(n)
    }
}

impl SpaceTransform for na::Isometry3<f32> {
    #[inline]
    fn transform_point(&self, p: &Point3) -> Point3 {
        na::Isometry3::transform_point(self, p)
    }

    #[inline]
    fn transform_vector(&self, v: &Vec3) -> Vec3 {
        na::Isometry3::transform_vector(self, v)
    }

    #[inline]
    fn inverse_transform_point(&self, p: &Point3) -> Point3 {
        na::Isometry3::inverse_transform_point(self, p)
    }

    #[inline]
    fn inverse_transform_vector(&self, v: &Vec3) -> Vec3 {
        na::Isometry3::inverse_transform_vector(self, v)
    }
}

impl SpaceTransform for na::Similarity3<f32> {
    #[inline]
    fn transform_point(&self, p: &Point3) -> Point3 {
        na::Similarity3::transform_point(self, p)
    }

    #[inline]
    fn transform_vector(&self, v: &Vec3) -> Vec3 {
        na::Similarity3::transform_vector(self, v)
    }

    #[inline]
    fn inverse_transform_point(&self, p: &Point3) -> Point3 {
        na::Similarity3::inverse_transform_point(self, p)
    }

    #[inline]
    fn inverse_transform_vector(&self, v: &Vec3) -> Vec3 {
        na::Similarity3::inverse_transform_vector(self, v)
    }
}

impl SpaceTransform for na::Affine3<f32> {
    #[inline]
    fn transform_point(&self, p: &Point3) -> Point3 {
        self * p
    }

    #[inline]
    fn transform_vector(&self, v: &Vec3) -> Vec3 {
        self * v
    }

    /// A singular transform maps to NaN, which the intersector treats as a miss.
    #[inline]
    fn inverse_transform_point(&self, p: &Point3) -> Point3 {
        self.try_inverse()
            .map_or(Point3::from(Vec3::repeat(f32::NAN)), |inv| inv * p)
    }

    #[inline]
    fn inverse_transform_vector(&self, v: &Vec3) -> Vec3 {
        self.try_inverse()
            .map_or(Vec3::repeat(f32::NAN), |inv| inv * v)
    }

    /// Inverse-transpose of the linear part.
    #[inline]
    fn transform_normal(&self, n: &Vec3) -> Vec3 {
        let linear = self.matrix().fixed_view::<3, 3>(0, 0).into_owned();
        linear
            .try_inverse()
            .map_or(Vec3::repeat(f32::NAN), |inv| inv.transpose() * n)
    }
}

impl SpaceTransform for Transform {
    #[inline]
    fn transform_point(&self, p: &Point3) -> Point3 {
        Point3::from(self.translation + self.transform_vector(&p.coords))
    }

    #[inline]
    fn transform_vector(&self, v: &Vec3) -> Vec3 {
        self.rotation * v.component_mul(&self.scale)
    }

    #[inline]
    fn inverse_transform_point(&self, p: &Point3) -> Point3 {
        Point3::from(self.inverse_transform_vector(&(p.coords - self.translation)))
    }

    /// A zero scale axis yields non-finite components; the intersector treats
    /// such a ray as a miss.
    #[inline]
    fn inverse_transform_vector(&self, v: &Vec3) -> Vec3 {
        self.rotation
            .inverse_transform_vector(v)
            .component_div(&self.scale)
    }

    /// Inverse-transpose of the linear part: `R * (n / s)`.
    #[inline]
    fn transform_normal(&self, n: &Vec3) -> Vec3 {
        self.rotation * n.component_div(&self.scale)
    }
}

impl<T: SpaceTransform + ?Sized> SpaceTransform for &T {
    #[inline]
    fn transform_point(&self, p: &Point3) -> Point3 {
        (**self).transform_point(p)
    }

    #[inline]
    fn transform_vector(&self, v: &Vec3) -> Vec3 {
        (**self).transform_vector(v)
    }

    #[inline]
    fn inverse_transform_point(&self, p: &Point3) -> Point3 {
        (**self).inverse_transform_point(p)
    }

    #[inline]
    fn inverse_transform_vector(&self, v: &Vec3) -> Vec3 {
        (**self).inverse_transform_vector(v)
    }

    #[inline]
    fn transform_normal(&self, n: &Vec3) -> Vec3 {
        (**self).transform_normal(n)
    }
}
