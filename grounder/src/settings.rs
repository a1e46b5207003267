/*!
Grounding defaults and tolerances.

These constants centralize the parameters used by the probe, the manual mesh
intersector and the vertical smoothing filter. Keeping them together makes
tuning easier and keeps the defaults of [`crate::GrounderSettings`] and
[`crate::ProbeSettings`] in one place.

Notes
- Distances are in meters, time in seconds.
- `EPS` is a practical tolerance, not machine epsilon.
*/

/// Tolerance shared by the Möller–Trumbore determinant test and the
/// "hit behind or at the origin" rejection.
pub const EPS: f32 = 1.0e-6;

/// Vertical offset added to the resolved ground height (meters).
pub const DEFAULT_OFFSET_Y: f32 = 0.0;

/// How far above the tracked position the probe ray starts (meters).
/// Large enough that a walker slightly sunk into a slope still finds the surface.
pub const DEFAULT_PROBE_HEIGHT: f32 = 2.0;

/// Maximum distance of the accelerated downward cast (meters).
pub const DEFAULT_PROBE_DISTANCE: f32 = 100.0;

/// Response time of the vertical smoothing filter (seconds).
pub const DEFAULT_SMOOTH_TIME: f32 = 0.05;

/// Lower bound applied to the filter response time once smoothing is active.
/// Below this the filter coefficients lose precision.
pub const MIN_SMOOTH_TIME: f32 = 1.0e-4;

/// Coefficients of the rational approximation of `exp(-x)` used by the filter.
pub const EXP_APPROX_C2: f32 = 0.48;
pub const EXP_APPROX_C3: f32 = 0.235;
