/*!
Ground height resolution.

A probe ray is cast straight down from above the tracked position and offered
to an ordered list of [`HeightSource`]s. The first source that reports a hit
decides the ground height; later sources are not consulted.

The usual order is:
1. the accelerated collision world ([`crate::RapierGround`]), restricted to the
   configured surface mask, limited to the probe distance, sensors ignored;
2. the manual mesh raycast ([`MeshGround`]), only when the manual fallback is
   enabled and a mesh is supplied.

No source mutates anything. When every source misses the result is `None` and
the caller keeps its current height.
*/

use rapier3d::prelude::Ray;

use crate::{
    intersect::raycast_mesh,
    mesh::Mesh,
    rapier_world::{RapierGround, RapierQueryWorld},
    settings::{DEFAULT_OFFSET_Y, DEFAULT_PROBE_DISTANCE, DEFAULT_PROBE_HEIGHT},
    space::SpaceTransform,
    types::{Point3, SurfaceHit, SurfaceMask, Vec3},
};

/// One candidate provider of ground hits.
pub trait HeightSource {
    /// Nearest hit along `ray` within `max_distance`, if any.
    fn cast(&self, ray: &Ray, max_distance: f32) -> Option<SurfaceHit>;
}

impl<F> HeightSource for F
where
    F: Fn(&Ray, f32) -> Option<SurfaceHit>,
{
    #[inline]
    fn cast(&self, ray: &Ray, max_distance: f32) -> Option<SurfaceHit> {
        self(ray, max_distance)
    }
}

/// Manual raycast against a collider-less mesh placed by `transform`.
///
/// The manual path is not range limited: `max_distance` is ignored.
#[derive(Clone, Copy)]
pub struct MeshGround<'a> {
    pub mesh: &'a Mesh,
    pub transform: &'a dyn SpaceTransform,
}

impl HeightSource for MeshGround<'_> {
    #[inline]
    fn cast(&self, ray: &Ray, _max_distance: f32) -> Option<SurfaceHit> {
        raycast_mesh(ray, self.mesh, self.transform)
    }
}

/// Which kind of source produced a probe result.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GroundSource {
    Accelerated,
    Mesh,
}

/// Probe geometry and source selection, fixed at construction.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct ProbeSettings {
    /// Added to the hit height (meters).
    pub offset_y: f32,
    /// Probe start above the tracked position (meters).
    pub probe_height: f32,
    /// Max range of the accelerated cast, measured from the probe start (meters).
    pub probe_distance: f32,
    /// Eligible surfaces for the accelerated cast. Empty = all.
    pub ground_mask: SurfaceMask,
    /// Allow the manual mesh raycast when the accelerated cast misses.
    pub manual_mesh_fallback: bool,
}

impl Default for ProbeSettings {
    fn default() -> Self {
        Self {
            offset_y: DEFAULT_OFFSET_Y,
            probe_height: DEFAULT_PROBE_HEIGHT,
            probe_distance: DEFAULT_PROBE_DISTANCE,
            ground_mask: SurfaceMask::default(),
            manual_mesh_fallback: false,
        }
    }
}

/// A resolved ground height plus the hit it came from.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundProbe {
    /// `hit.point.y + offset_y`.
    pub height: f32,
    pub hit: SurfaceHit,
    pub source: GroundSource,
}

/// Downward probe starting `probe_height` above `origin`.
#[inline]
pub fn probe_ray(origin: &Point3, probe_height: f32) -> Ray {
    Ray::new(
        Point3::new(origin.x, origin.y + probe_height, origin.z),
        -Vec3::y(),
    )
}

/// Try `sources` in order and return the first hit, tagged with its key.
pub fn first_hit<'s, K, I>(sources: I, ray: &Ray, max_distance: f32) -> Option<(K, SurfaceHit)>
where
    I: IntoIterator<Item = (K, &'s dyn HeightSource)>,
{
    sources
        .into_iter()
        .find_map(|(key, source)| source.cast(ray, max_distance).map(|hit| (key, hit)))
}

/// Accelerated slot of a [`SurfaceHeightQuery`].
#[derive(Clone, Copy)]
enum Accelerated<'a> {
    Rapier(RapierGround<'a>),
    Source(&'a dyn HeightSource),
}

impl HeightSource for Accelerated<'_> {
    #[inline]
    fn cast(&self, ray: &Ray, max_distance: f32) -> Option<SurfaceHit> {
        match self {
            Accelerated::Rapier(ground) => ground.cast(ray, max_distance),
            Accelerated::Source(source) => source.cast(ray, max_distance),
        }
    }
}

/// Height query for one tick: accelerated source first, manual mesh second.
///
/// Only borrows its sources, so building one per object per tick is free.
#[derive(Clone, Copy)]
pub struct SurfaceHeightQuery<'a> {
    settings: ProbeSettings,
    accelerated: Option<Accelerated<'a>>,
    fallback: Option<MeshGround<'a>>,
}

impl<'a> SurfaceHeightQuery<'a> {
    /// A query with no sources; it resolves nothing until sources are added.
    pub fn new(settings: ProbeSettings) -> Self {
        Self {
            settings,
            accelerated: None,
            fallback: None,
        }
    }

    #[inline]
    pub fn settings(&self) -> &ProbeSettings {
        &self.settings
    }

    /// Use `world` as the accelerated source, filtered by the configured mask.
    pub fn with_rapier(mut self, world: &'a RapierQueryWorld) -> Self {
        let mask = self.settings.ground_mask;
        self.accelerated = Some(Accelerated::Rapier(RapierGround { world, mask }));
        self
    }

    /// Use any [`HeightSource`] as the accelerated source.
    pub fn with_accelerated(mut self, source: &'a dyn HeightSource) -> Self {
        self.accelerated = Some(Accelerated::Source(source));
        self
    }

    /// Register the manual mesh fallback. Ignored unless
    /// [`ProbeSettings::manual_mesh_fallback`] is set.
    pub fn with_mesh_fallback(mut self, mesh: &'a Mesh, transform: &'a dyn SpaceTransform) -> Self {
        if self.settings.manual_mesh_fallback {
            self.fallback = Some(MeshGround { mesh, transform });
        } else {
            log::trace!("manual mesh fallback disabled; mesh not registered");
        }
        self
    }

    /// Whether the manual mesh fallback is active for this query.
    #[inline]
    pub fn has_mesh_fallback(&self) -> bool {
        self.fallback.is_some()
    }

    /// Ground height under `origin` using explicit probe parameters.
    ///
    /// `None` means neither source found ground; keep the current height.
    pub fn resolve_height(
        &self,
        origin: &Point3,
        probe_height: f32,
        probe_distance: f32,
        offset: f32,
    ) -> Option<f32> {
        self.resolve_with(origin, probe_height, probe_distance, offset)
            .map(|probe| probe.height)
    }

    /// Ground probe under `origin` using the configured settings.
    pub fn resolve(&self, origin: &Point3) -> Option<GroundProbe> {
        let s = &self.settings;
        self.resolve_with(origin, s.probe_height, s.probe_distance, s.offset_y)
    }

    fn resolve_with(
        &self,
        origin: &Point3,
        probe_height: f32,
        probe_distance: f32,
        offset: f32,
    ) -> Option<GroundProbe> {
        let ray = probe_ray(origin, probe_height);

        let sources = [
            (
                GroundSource::Accelerated,
                self.accelerated.as_ref().map(|s| s as &dyn HeightSource),
            ),
            (
                GroundSource::Mesh,
                self.fallback.as_ref().map(|s| s as &dyn HeightSource),
            ),
        ];
        let found = first_hit(
            sources
                .into_iter()
                .filter_map(|(kind, source)| source.map(|s| (kind, s))),
            &ray,
            probe_distance,
        );

        match found {
            Some((source, hit)) => {
                if source == GroundSource::Mesh && self.accelerated.is_some() {
                    log::debug!(
                        "accelerated probe missed at ({:.2}, {:.2}); mesh fallback hit y={:.3}",
                        origin.x,
                        origin.z,
                        hit.point.y
                    );
                }
                log::trace!("ground probe {:?} hit y={:.3}", source, hit.point.y);
                Some(GroundProbe {
                    height: hit.point.y + offset,
                    hit,
                    source,
                })
            }
            None => {
                log::trace!("ground probe missed at ({:.2}, {:.2})", origin.x, origin.z);
                None
            }
        }
    }
}
