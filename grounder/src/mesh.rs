//! Raw triangle soup used by the manual ground raycast.
//!
//! A [`Mesh`] is the in-memory form of an already loaded asset: local-space
//! vertex positions plus a flat triangle index list. Indices are validated once
//! at construction so the per-tick scan can index without bounds failures.

use crate::{error::GroundError, types::Point3};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Mesh {
    vertices: Vec<Point3>,
    indices: Vec<u32>,
}

impl Mesh {
    /// Build a mesh from local-space vertices and a flat triangle index list.
    ///
    /// Fails if `indices.len()` is not a multiple of 3 or if any index does not
    /// reference an existing vertex. An empty mesh is valid and never hits.
    pub fn new(vertices: Vec<Point3>, indices: Vec<u32>) -> Result<Self, GroundError> {
        if indices.len() % 3 != 0 {
            log::warn!("rejecting mesh: {} indices", indices.len());
            return Err(GroundError::IndexCountNotMultipleOfThree { len: indices.len() });
        }

        let vertex_count = vertices.len();
        if let Some(&index) = indices.iter().find(|&&i| i as usize >= vertex_count) {
            log::warn!("rejecting mesh: index {index} with {vertex_count} vertices");
            return Err(GroundError::IndexOutOfRange {
                index,
                vertex_count,
            });
        }

        Ok(Self { vertices, indices })
    }

    #[inline]
    pub fn vertices(&self) -> &[Point3] {
        &self.vertices
    }

    #[inline]
    pub fn indices(&self) -> &[u32] {
        &self.indices
    }

    #[inline]
    pub fn triangle_count(&self) -> usize {
        self.indices.len() / 3
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Index triples, one per triangle.
    pub fn triangle_indices(&self) -> impl Iterator<Item = [u32; 3]> + '_ {
        self.indices.chunks_exact(3).map(|t| [t[0], t[1], t[2]])
    }

    /// Vertex triples, one per triangle, in index order.
    pub fn triangles(&self) -> impl Iterator<Item = [Point3; 3]> + '_ {
        self.triangle_indices().map(|[a, b, c]| {
            [
                self.vertices[a as usize],
                self.vertices[b as usize],
                self.vertices[c as usize],
            ]
        })
    }
}
