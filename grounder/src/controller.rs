use crate::{
    height::{GroundProbe, ProbeSettings, SurfaceHeightQuery, probe_ray},
    settings::{
        DEFAULT_OFFSET_Y, DEFAULT_PROBE_DISTANCE, DEFAULT_PROBE_HEIGHT, DEFAULT_SMOOTH_TIME,
    },
    smoothing::{FollowerState, advance},
    types::{Point3, SurfaceHit, SurfaceMask},
};

/// Per-object grounding configuration. Fixed for the controller's lifetime.
#[derive(Clone, Copy, Debug, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
#[cfg_attr(feature = "serde", serde(default))]
pub struct GrounderSettings {
    /// Vertical offset above the ground surface (meters).
    pub offset_y: f32,
    /// Probe start above the object (meters).
    pub probe_height: f32,
    /// Max range of the accelerated cast (meters).
    pub probe_distance: f32,
    /// Eligible ground layers. Empty = all.
    pub ground_mask: SurfaceMask,
    /// Smooth vertical motion instead of snapping.
    pub smooth: bool,
    /// Response time of the vertical smoothing (seconds).
    pub smooth_time: f32,
    /// Raycast a collider-less mesh when the collision world has no ground.
    pub manual_mesh_fallback: bool,
}

impl Default for GrounderSettings {
    fn default() -> Self {
        Self {
            offset_y: DEFAULT_OFFSET_Y,
            probe_height: DEFAULT_PROBE_HEIGHT,
            probe_distance: DEFAULT_PROBE_DISTANCE,
            ground_mask: SurfaceMask::default(),
            smooth: true,
            smooth_time: DEFAULT_SMOOTH_TIME,
            manual_mesh_fallback: false,
        }
    }
}

impl GrounderSettings {
    /// The probe half of these settings, for building a [`SurfaceHeightQuery`].
    pub fn probe(&self) -> ProbeSettings {
        ProbeSettings {
            offset_y: self.offset_y,
            probe_height: self.probe_height,
            probe_distance: self.probe_distance,
            ground_mask: self.ground_mask,
            manual_mesh_fallback: self.manual_mesh_fallback,
        }
    }
}

/// Outcome of one [`Grounder::tick`].
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GroundTick {
    /// Vertical coordinate to apply this tick. Equals the input y on a miss.
    pub y: f32,
    /// The probe that produced `y`, if ground was found.
    pub probe: Option<GroundProbe>,
}

impl GroundTick {
    #[inline]
    pub fn grounded(&self) -> bool {
        self.probe.is_some()
    }
}

/// Keeps one object's vertical position on the ground beneath it.
///
/// Each tick the caller passes the object's world position; the grounder probes
/// for ground and returns the new y. Without ground the y is left as is and the
/// smoothing state is not touched, so motion resumes seamlessly once ground
/// reappears.
#[derive(Clone, Debug)]
pub struct Grounder {
    settings: GrounderSettings,
    follower: FollowerState,
    last_hit: Option<SurfaceHit>,
}

impl Grounder {
    pub fn new(settings: GrounderSettings) -> Self {
        Self {
            settings,
            follower: FollowerState::default(),
            last_hit: None,
        }
    }

    #[inline]
    pub fn settings(&self) -> &GrounderSettings {
        &self.settings
    }

    #[inline]
    pub fn follower(&self) -> FollowerState {
        self.follower
    }

    /// Most recent ground hit, for diagnostics only. `None` after a miss.
    #[inline]
    pub fn last_hit(&self) -> Option<&SurfaceHit> {
        self.last_hit.as_ref()
    }

    #[inline]
    pub fn had_hit(&self) -> bool {
        self.last_hit.is_some()
    }

    /// Build a query from these settings. Attach sources before resolving.
    pub fn query<'a>(&self) -> SurfaceHeightQuery<'a> {
        SurfaceHeightQuery::new(self.settings.probe())
    }

    /// Probe under `position` and move its y toward the ground.
    pub fn tick(&mut self, position: &Point3, query: &SurfaceHeightQuery<'_>, dt: f32) -> GroundTick {
        let Some(probe) = query.resolve(position) else {
            if self.last_hit.take().is_some() {
                log::debug!("lost ground at ({:.2}, {:.2})", position.x, position.z);
            }
            return GroundTick {
                y: position.y,
                probe: None,
            };
        };

        if self.last_hit.is_none() {
            log::debug!(
                "found ground at ({:.2}, {:.2}) y={:.3} via {:?}",
                position.x,
                position.z,
                probe.hit.point.y,
                probe.source
            );
        }
        self.last_hit = Some(probe.hit);

        let y = self.move_y(position.y, probe.height, dt);
        GroundTick {
            y,
            probe: Some(probe),
        }
    }

    /// Reinitialize the smoothing state at `y`, e.g. after a teleport.
    pub fn teleport(&mut self, y: f32) {
        self.follower = FollowerState::at(y);
        self.last_hit = None;
    }

    /// Start and end of the probe under `position`, for drawing.
    pub fn probe_segment(&self, position: &Point3) -> (Point3, Point3) {
        let ray = probe_ray(position, self.settings.probe_height);
        (ray.origin, ray.point_at(self.settings.probe_distance))
    }

    fn move_y(&mut self, current_y: f32, target_y: f32, dt: f32) -> f32 {
        if !self.settings.smooth {
            self.follower = FollowerState::at(target_y);
            return target_y;
        }

        // The position may have been changed by others since the last tick; the
        // velocity is ours.
        let (y, velocity) = advance(
            current_y,
            self.follower.velocity,
            target_y,
            self.settings.smooth_time,
            dt,
        );
        self.follower = FollowerState { value: y, velocity };
        y
    }
}

impl Default for Grounder {
    fn default() -> Self {
        Self::new(GrounderSettings::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        mesh::Mesh,
        types::{Transform, Vec3},
    };
    use rapier3d::prelude::Ray;

    const DT: f32 = 1.0 / 60.0;

    fn floor(y: f32, half: f32) -> Mesh {
        Mesh::new(
            vec![
                Point3::new(-half, y, -half),
                Point3::new(half, y, -half),
                Point3::new(half, y, half),
                Point3::new(-half, y, half),
            ],
            vec![0, 2, 1, 0, 3, 2],
        )
        .unwrap()
    }

    fn miss(_: &Ray, _: f32) -> Option<SurfaceHit> {
        None
    }

    #[test]
    fn snaps_without_smoothing() {
        let mut grounder = Grounder::new(GrounderSettings {
            smooth: false,
            offset_y: 0.1,
            manual_mesh_fallback: true,
            ..GrounderSettings::default()
        });
        let mesh = floor(2.0, 5.0);
        let pose = Transform::default();
        let query = grounder.query().with_mesh_fallback(&mesh, &pose);

        let tick = grounder.tick(&Point3::new(0.0, 1.5, 0.0), &query, DT);
        assert!(tick.grounded());
        assert!((tick.y - 2.1).abs() < 1.0e-6);
        assert!(grounder.had_hit());
        assert_eq!(grounder.follower().velocity, 0.0);
    }

    #[test]
    fn smooths_toward_ground() {
        let mut grounder = Grounder::new(GrounderSettings {
            smooth_time: 0.2,
            manual_mesh_fallback: true,
            ..GrounderSettings::default()
        });
        let mesh = floor(0.0, 5.0);
        let pose = Transform::default();
        let query = grounder.query().with_mesh_fallback(&mesh, &pose);

        let mut y = 1.0;
        for _ in 0..5 {
            let tick = grounder.tick(&Point3::new(0.0, y, 0.0), &query, DT);
            assert!(tick.y < y && tick.y > 0.0);
            y = tick.y;
        }
        assert!(grounder.follower().velocity < 0.0);

        for _ in 0..600 {
            y = grounder.tick(&Point3::new(0.0, y, 0.0), &query, DT).y;
        }
        assert!(y.abs() < 1.0e-3);
    }

    #[test]
    fn miss_leaves_height_and_state_untouched() {
        let mut grounder = Grounder::new(GrounderSettings {
            manual_mesh_fallback: true,
            ..GrounderSettings::default()
        });
        let mesh = floor(0.0, 1.0);
        let pose = Transform::default();
        let query = grounder
            .query()
            .with_accelerated(&miss)
            .with_mesh_fallback(&mesh, &pose);

        grounder.tick(&Point3::new(0.0, 1.0, 0.0), &query, DT);
        let before = grounder.follower();
        assert!(grounder.had_hit());

        // Walked off the edge of the mesh.
        let tick = grounder.tick(&Point3::new(4.0, 0.7, 0.0), &query, DT);
        assert!(!tick.grounded());
        assert_eq!(tick.y, 0.7);
        assert_eq!(grounder.follower(), before);
        assert!(grounder.last_hit().is_none());
    }

    #[test]
    fn teleport_resets_follower() {
        let mut grounder = Grounder::default();
        let below = |ray: &Ray, _: f32| {
            Some(SurfaceHit {
                point: Point3::new(ray.origin.x, -1.0, ray.origin.z),
                normal: Vec3::y(),
                distance: ray.origin.y + 1.0,
            })
        };
        let query = grounder.query().with_accelerated(&below);
        grounder.tick(&Point3::new(0.0, 3.0, 0.0), &query, DT);
        assert!(grounder.follower().velocity != 0.0);

        grounder.teleport(10.0);
        assert_eq!(grounder.follower(), FollowerState::at(10.0));
        assert!(!grounder.had_hit());
    }

    #[test]
    fn probe_segment_spans_probe_distance() {
        let grounder = Grounder::new(GrounderSettings {
            probe_height: 1.0,
            probe_distance: 10.0,
            ..GrounderSettings::default()
        });
        let (start, end) = grounder.probe_segment(&Point3::new(2.0, 0.5, -1.0));
        assert_eq!(start, Point3::new(2.0, 1.5, -1.0));
        assert!((end - Point3::new(2.0, -8.5, -1.0)).norm() < 1.0e-6);
    }
}
