//! Mesh simplification algorithms
//!
//! This crate reduces a triangle mesh to a target triangle count while
//! preserving its visual shape. Two reducers operate on the same input
//! model, an indexed triangle mesh with per-vertex positions:
//!
//! - [`simplify`]: error-driven edge collapse using quadric error metrics,
//!   with topology-aware vertex classification. High fidelity under strict
//!   error bounds.
//! - [`simplify_sloppy`]: quantizes vertices into a uniform grid, collapses
//!   each cell to a single representative vertex, and re-emits the
//!   surviving triangles. Much faster, approximate.
//!
//! Both operate on index/vertex buffers and reference vertices from the
//! original vertex buffer; [`QuadricSimplifier`] and [`GridSimplifier`]
//! wrap them for [`TriangleMesh`](polyreduce_core::TriangleMesh) inputs.

mod adjacency;
mod hash;
mod quadric;
mod topology;

pub mod collapse;
pub mod grid;
pub mod vertex;

pub use collapse::{simplify, QuadricSimplifier};
pub use grid::{simplify_sloppy, GridSimplifier};
pub use vertex::Position;

use polyreduce_core::{Error, Point3f, Result, TriangleMesh};

/// Sentinel for "no index"
pub const INVALID_INDEX: u32 = u32::MAX;

/// Simplify a mesh down to a target face count
pub trait MeshSimplifier {
    /// Reduce `mesh` to at most `target_face_count` faces where the
    /// algorithm's constraints allow; the result may stop short of the
    /// target when no further reduction is possible.
    fn simplify(&self, mesh: &TriangleMesh, target_face_count: usize) -> Result<TriangleMesh>;
}

/// Validates the shared entry preconditions of both reducers.
pub(crate) fn validate_buffers(
    destination: &[u32],
    indices: &[u32],
    vertex_count: usize,
    target_index_count: usize,
) -> Result<()> {
    if indices.len() % 3 != 0 {
        return Err(Error::InvalidIndexCount(indices.len()));
    }

    if target_index_count > indices.len() {
        return Err(Error::InvalidTarget {
            target: target_index_count,
            index_count: indices.len(),
        });
    }

    if destination.len() < indices.len() {
        return Err(Error::DestinationTooSmall {
            capacity: destination.len(),
            required: indices.len(),
        });
    }

    for &index in indices {
        if index as usize >= vertex_count {
            return Err(Error::IndexOutOfBounds {
                index,
                vertex_count,
            });
        }
    }

    Ok(())
}

/// Gathers the vertices referenced by `indices` into a compact mesh.
pub(crate) fn compact_mesh(vertices: &[Point3f], indices: &[u32]) -> TriangleMesh {
    let mut old_to_new = vec![INVALID_INDEX; vertices.len()];
    let mut new_vertices = Vec::new();
    let mut faces = Vec::with_capacity(indices.len() / 3);

    for triangle in indices.chunks_exact(3) {
        let mut face = [0u32; 3];

        for (corner, &index) in face.iter_mut().zip(triangle) {
            let slot = &mut old_to_new[index as usize];

            if *slot == INVALID_INDEX {
                *slot = new_vertices.len() as u32;
                new_vertices.push(vertices[index as usize]);
            }

            *corner = *slot;
        }

        faces.push(face);
    }

    TriangleMesh::from_vertices_and_faces(new_vertices, faces)
}
