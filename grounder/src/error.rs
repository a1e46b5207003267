use thiserror::Error;

/// Errors raised while building grounding data.
///
/// The per-tick path never returns these: a probe that finds nothing is `None`,
/// not an error. Only construction of meshes and collider worlds can fail.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GroundError {
    /// The triangle index list does not describe whole triangles.
    #[error("triangle index count {len} is not a multiple of 3")]
    IndexCountNotMultipleOfThree { len: usize },
    /// A triangle references a vertex that does not exist.
    #[error("triangle index {index} out of range for {vertex_count} vertices")]
    IndexOutOfRange { index: u32, vertex_count: usize },
    /// Rapier refused to build a triangle-mesh collider.
    #[error("trimesh collider rejected: {0}")]
    TriMesh(String),
}
