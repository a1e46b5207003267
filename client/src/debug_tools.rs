//! Debug/performance tooling for native dev builds.
//!
//! Compiled only behind `dev_native`. Logs frame time, entity count and how
//! many actors are grounded (and through which source) once per second.

use bevy::diagnostic::{
    Diagnostic, DiagnosticPath, Diagnostics, EntityCountDiagnosticsPlugin,
    FrameTimeDiagnosticsPlugin, LogDiagnosticsPlugin, RegisterDiagnostic,
};
use bevy::prelude::*;
use grounder::GroundSource;

use crate::ground::Grounded;

const GROUNDED: DiagnosticPath = DiagnosticPath::const_new("grounder/grounded");
const ON_MESH_FALLBACK: DiagnosticPath = DiagnosticPath::const_new("grounder/on_mesh_fallback");

pub(super) fn plugin(app: &mut App) {
    app.add_plugins((
        FrameTimeDiagnosticsPlugin::default(),
        EntityCountDiagnosticsPlugin::default(),
        LogDiagnosticsPlugin::default(),
    ));

    app.register_diagnostic(Diagnostic::new(GROUNDED))
        .register_diagnostic(Diagnostic::new(ON_MESH_FALLBACK));
    app.add_systems(Update, measure_grounding);
}

fn measure_grounding(mut diagnostics: Diagnostics, actors: Query<&Grounded>) {
    let (mut grounded, mut on_mesh) = (0usize, 0usize);
    for actor in &actors {
        match actor.source {
            Some(GroundSource::Mesh) => {
                grounded += 1;
                on_mesh += 1;
            }
            Some(GroundSource::Accelerated) => grounded += 1,
            None => {}
        }
    }

    diagnostics.add_measurement(&GROUNDED, || grounded as f64);
    diagnostics.add_measurement(&ON_MESH_FALLBACK, || on_mesh as f64);
}
