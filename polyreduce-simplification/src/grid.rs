//! Grid-based ("sloppy") simplification
//!
//! Quantizes vertices into a uniform 3D grid, keeps the minimum-error
//! vertex of each cell as its representative, and re-emits the triangles
//! that still span three distinct cells. A short search over cell sizes
//! lands on the coarsest grid that stays under the target cell budget, so
//! the reducer always reaches its target at the cost of topology.

use crate::collapse::fill_face_quadrics;
use crate::hash::{cell_id_hash, hash_buckets, hash_lookup, CellHasher, CellSlot, TriangleHasher};
use crate::quadric::Quadric;
use crate::vertex::{rescale_positions, Position};
use crate::{compact_mesh, validate_buffers, MeshSimplifier, INVALID_INDEX};

use polyreduce_core::{Error, Result, TriangleMesh, Vector3f};
use tracing::debug;

// number of cell-size search passes; the pass after the last search pass
// re-counts exactly at the size known to undershoot the target
const GRID_SEARCH_PASSES: usize = 10;

/// Packs the quantized coordinates into a 30-bit cell id.
///
/// Positions are in the unit cube, so `cell_scale` (saturated to the 10-bit
/// coordinate range) maps each axis onto [0, 1023].
fn quantize_cell_id(v: &Vector3f, cell_scale: f32) -> u32 {
    let xi = (v.x * cell_scale + 0.5) as i32;
    let yi = (v.y * cell_scale + 0.5) as i32;
    let zi = (v.z * cell_scale + 0.5) as i32;

    ((xi << 20) | (yi << 10) | zi) as u32
}

fn cell_scale_for(cell_size: f32) -> f32 {
    let cell_scale = 1.0 / cell_size;

    if cell_scale > 1023.5 {
        1023.5
    } else if cell_scale < 0.5 {
        0.0
    } else {
        cell_scale
    }
}

/// Counts distinct cells approximately: cell ids mark slots of a
/// direct-mapped table, and colliding ids are undercounted. Cheap enough to
/// run every search pass.
fn count_cells_approx(
    count_table: &mut [u8],
    vertex_positions: &[Vector3f],
    cell_scale: f32,
) -> usize {
    count_table.fill(0);

    let mut cell_count = 0;

    for v in vertex_positions {
        let id = quantize_cell_id(v, cell_scale);
        let slot = cell_id_hash(id) as usize & (count_table.len() - 1);

        cell_count += (1 - count_table[slot]) as usize;
        count_table[slot] = 1;
    }

    cell_count
}

/// Counts distinct cells exactly and assigns each vertex its cell index.
fn fill_vertex_cells(
    table: &mut [CellSlot],
    vertex_cells: &mut [u32],
    vertex_positions: &[Vector3f],
    cell_scale: f32,
) -> usize {
    table.fill(CellSlot::EMPTY);

    let mut cell_count = 0u32;

    for (i, v) in vertex_positions.iter().enumerate() {
        let key = CellSlot {
            id: quantize_cell_id(v, cell_scale),
            cell: 0,
        };

        let slot = hash_lookup(table, &CellHasher, &key, &CellSlot::EMPTY);

        if table[slot].id == INVALID_INDEX {
            table[slot] = CellSlot {
                id: key.id,
                cell: cell_count,
            };
            cell_count += 1;
        }

        vertex_cells[i] = table[slot].cell;
    }

    cell_count as usize
}

/// Picks the member vertex with minimum quadric error as each cell's
/// representative, caching the best error seen per cell.
fn fill_cell_remap(
    cell_remap: &mut [u32],
    cell_errors: &mut [f32],
    vertex_cells: &[u32],
    cell_quadrics: &[Quadric],
    vertex_positions: &[Vector3f],
) {
    for (i, (&cell, v)) in vertex_cells.iter().zip(vertex_positions).enumerate() {
        let cell = cell as usize;
        let error = cell_quadrics[cell].error(v);

        if cell_remap[cell] == INVALID_INDEX || error < cell_errors[cell] {
            cell_remap[cell] = i as u32;
            cell_errors[cell] = error;
        }
    }
}

/// Rotates the triangle so its smallest index leads, preserving winding.
fn canonical_rotation(abc: [u32; 3]) -> [u32; 3] {
    let [a, b, c] = abc;

    if b < a && b < c {
        [b, c, a]
    } else if c < a && c < b {
        [c, a, b]
    } else {
        abc
    }
}

fn simplify_sloppy_impl<V: Position>(
    destination: &mut [u32],
    indices: &[u32],
    vertices: &[V],
    target_index_count: usize,
    filter_duplicates: bool,
) -> Result<usize> {
    validate_buffers(destination, indices, vertices.len(), target_index_count)?;

    // we expect to get ~2 triangles/vertex in the output
    let target_cell_count = target_index_count / 6;

    if target_cell_count == 0 {
        return Ok(0);
    }

    let vertex_positions = rescale_positions(vertices);

    let mut vertex_cells = vec![0u32; vertices.len()];
    let mut table = vec![CellSlot::EMPTY; hash_buckets(vertices.len())];
    let mut count_table = vec![0u8; hash_buckets(target_cell_count * 4)];

    // search for the coarsest grid that still produces at least the target
    // cell count; cell_max_size stays on the undershooting side throughout
    let mut cell_min_size = 1.0f32 / 1024.0;
    let mut cell_max_size = 1.0f32;
    let mut cell_count = 0;

    for pass in 0..=GRID_SEARCH_PASSES {
        let cell_size = if pass == GRID_SEARCH_PASSES {
            cell_max_size
        } else {
            (cell_min_size + cell_max_size) * 0.5
        };

        let cell_scale = cell_scale_for(cell_size);

        cell_count = if pass < GRID_SEARCH_PASSES {
            count_cells_approx(&mut count_table, &vertex_positions, cell_scale)
        } else {
            fill_vertex_cells(&mut table, &mut vertex_cells, &vertex_positions, cell_scale)
        };

        debug!(pass, cell_count, cell_size, "grid search pass");

        if cell_count < target_cell_count {
            cell_max_size = cell_size;
        } else {
            cell_min_size = cell_size;
        }
    }

    // build a quadric for each target cell
    let mut cell_quadrics = vec![Quadric::default(); cell_count];
    fill_face_quadrics(&mut cell_quadrics, indices, &vertex_positions, &vertex_cells);

    // for each target cell, find the vertex with the minimal error
    let mut cell_remap = vec![INVALID_INDEX; cell_count];
    let mut cell_errors = vec![0.0f32; cell_count];
    fill_cell_remap(
        &mut cell_remap,
        &mut cell_errors,
        &vertex_cells,
        &cell_quadrics,
        &vertex_positions,
    );

    // collapse triangles: re-emit every triangle that still spans three
    // distinct cells, mapped through the cell representatives; cells
    // frequently generate redundant triangles between them, which the
    // optional filter drops
    let mut write = 0;

    if filter_duplicates {
        const EMPTY_TRIANGLE: [u32; 3] = [INVALID_INDEX; 3];

        let mut tritable = vec![EMPTY_TRIANGLE; hash_buckets(indices.len() / 3)];

        for i in indices.chunks_exact(3) {
            let c0 = vertex_cells[i[0] as usize] as usize;
            let c1 = vertex_cells[i[1] as usize] as usize;
            let c2 = vertex_cells[i[2] as usize] as usize;

            if c0 != c1 && c0 != c2 && c1 != c2 {
                let abc = [cell_remap[c0], cell_remap[c1], cell_remap[c2]];
                let key = canonical_rotation(abc);

                let slot = hash_lookup(&tritable, &TriangleHasher, &key, &EMPTY_TRIANGLE);

                if tritable[slot][0] == INVALID_INDEX {
                    tritable[slot] = key;

                    destination[write..write + 3].copy_from_slice(&abc);
                    write += 3;
                }
            }
        }
    } else {
        for i in indices.chunks_exact(3) {
            let c0 = vertex_cells[i[0] as usize] as usize;
            let c1 = vertex_cells[i[1] as usize] as usize;
            let c2 = vertex_cells[i[2] as usize] as usize;

            if c0 != c1 && c0 != c2 && c1 != c2 {
                destination[write] = cell_remap[c0];
                destination[write + 1] = cell_remap[c1];
                destination[write + 2] = cell_remap[c2];
                write += 3;
            }
        }
    }

    debug!(
        cell_count,
        triangles = write / 3,
        "sloppy reduction complete"
    );

    Ok(write)
}

/// Reduces the mesh to roughly `target_index_count` indices, sacrificing
/// appearance and topology for speed.
///
/// Vertices are quantized into a uniform grid and every cell is collapsed
/// to its minimum-error member vertex, so the reducer always makes the
/// target reachable regardless of topology. The surviving indices (which
/// reference the original vertex buffer) are written as a prefix of
/// `destination`; `destination` must hold `indices.len()` entries since
/// redundant triangles between cells can make the intermediate output
/// larger than the target.
///
/// `target_error` is accepted for signature symmetry with
/// [`simplify`](crate::simplify) and is currently not consulted; the grid
/// search is driven by the target cell count alone.
pub fn simplify_sloppy<V: Position>(
    destination: &mut [u32],
    indices: &[u32],
    vertices: &[V],
    target_index_count: usize,
    target_error: f32,
) -> Result<usize> {
    let _ = target_error;

    simplify_sloppy_impl(destination, indices, vertices, target_index_count, false)
}

/// Grid-based mesh simplifier.
///
/// Wraps [`simplify_sloppy`] for [`TriangleMesh`] inputs and compacts the
/// surviving vertices into the result.
pub struct GridSimplifier {
    /// Drop exact duplicate triangles from the output. Cells frequently
    /// emit the same representative triangle several times; filtering costs
    /// a hash lookup per emitted triangle.
    pub filter_duplicates: bool,
}

impl Default for GridSimplifier {
    fn default() -> Self {
        Self {
            filter_duplicates: false,
        }
    }
}

impl GridSimplifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_filter_duplicates(filter_duplicates: bool) -> Self {
        Self { filter_duplicates }
    }
}

impl MeshSimplifier for GridSimplifier {
    fn simplify(&self, mesh: &TriangleMesh, target_face_count: usize) -> Result<TriangleMesh> {
        if mesh.is_empty() {
            return Err(Error::EmptyMesh);
        }

        let indices: Vec<u32> = mesh.faces.iter().flat_map(|f| f.iter().copied()).collect();
        let target_index_count = (target_face_count * 3).min(indices.len());

        let mut destination = vec![0u32; indices.len()];
        let written = simplify_sloppy_impl(
            &mut destination,
            &indices,
            &mesh.vertices,
            target_index_count,
            self.filter_duplicates,
        )?;

        Ok(compact_mesh(&mesh.vertices, &destination[..written]))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use polyreduce_core::Point3f;

    /// Deterministic "noisy sphere": latitude/longitude shells with a small
    /// radial perturbation derived from the vertex index.
    fn noisy_sphere(rings: usize, segments: usize) -> (Vec<[f32; 3]>, Vec<u32>) {
        let mut vertices = Vec::new();

        for ring in 0..=rings {
            let theta = std::f32::consts::PI * ring as f32 / rings as f32;

            for segment in 0..segments {
                let phi = 2.0 * std::f32::consts::PI * segment as f32 / segments as f32;

                let jitter = 1.0 + 0.03 * ((vertices.len() % 7) as f32 / 7.0 - 0.5);

                vertices.push([
                    jitter * theta.sin() * phi.cos(),
                    jitter * theta.cos(),
                    jitter * theta.sin() * phi.sin(),
                ]);
            }
        }

        let mut indices = Vec::new();

        for ring in 0..rings {
            for segment in 0..segments {
                let next = (segment + 1) % segments;

                let a = (ring * segments + segment) as u32;
                let b = (ring * segments + next) as u32;
                let c = ((ring + 1) * segments + segment) as u32;
                let d = ((ring + 1) * segments + next) as u32;

                indices.extend_from_slice(&[a, c, b]);
                indices.extend_from_slice(&[b, c, d]);
            }
        }

        (vertices, indices)
    }

    fn assert_valid_output(output: &[u32], vertex_count: usize) {
        assert_eq!(output.len() % 3, 0);
        for tri in output.chunks_exact(3) {
            assert!(tri[0] != tri[1] && tri[1] != tri[2] && tri[0] != tri[2]);
            for &v in tri {
                assert!((v as usize) < vertex_count);
            }
        }
    }

    #[test]
    fn test_quantize_cell_id_packs_components() {
        let id = quantize_cell_id(&Vector3f::new(0.0, 0.5, 1.0), 100.0);

        assert_eq!(id & 0x3ff, 100);
        assert_eq!((id >> 10) & 0x3ff, 50);
        assert_eq!(id >> 20, 0);
    }

    #[test]
    fn test_cell_scale_saturates() {
        assert_eq!(cell_scale_for(1.0 / 4096.0), 1023.5);
        assert_eq!(cell_scale_for(4.0), 0.0);
        assert_eq!(cell_scale_for(0.125), 8.0);
    }

    #[test]
    fn test_canonical_rotation_preserves_winding() {
        assert_eq!(canonical_rotation([1, 2, 3]), [1, 2, 3]);
        assert_eq!(canonical_rotation([2, 3, 1]), [1, 2, 3]);
        assert_eq!(canonical_rotation([3, 1, 2]), [1, 2, 3]);
        // the opposite winding stays distinct
        assert_eq!(canonical_rotation([3, 2, 1]), [1, 3, 2]);
    }

    #[test]
    fn test_zero_target_returns_zero() {
        let (vertices, indices) = noisy_sphere(4, 6);
        let mut destination = vec![0u32; indices.len()];

        let written = simplify_sloppy(&mut destination, &indices, &vertices, 0, 0.0).unwrap();
        assert_eq!(written, 0);

        // a target below one cell's worth of indices is also trivially zero
        let written = simplify_sloppy(&mut destination, &indices, &vertices, 5, 0.0).unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn test_degenerate_triangles_collapse_to_nothing() {
        let vertices = [[0.0f32, 0.0, 0.0], [0.0, 0.0, 0.0], [0.0, 0.0, 0.0]];
        let indices = [0, 1, 2, 0, 1, 2];
        let mut destination = vec![0u32; indices.len()];

        // all vertices land in one cell, so no triangle spans three cells
        let written = simplify_sloppy(&mut destination, &indices, &vertices, 6, 0.0).unwrap();
        assert_eq!(written, 0);
    }

    #[test]
    fn test_output_references_input_vertices() {
        let (vertices, indices) = noisy_sphere(10, 12);
        let mut destination = vec![0u32; indices.len()];

        let written =
            simplify_sloppy(&mut destination, &indices, &vertices, indices.len() / 4, 0.0)
                .unwrap();

        assert_valid_output(&destination[..written], vertices.len());
    }

    #[test]
    fn test_sphere_to_tiny_target_with_filtering() {
        // ~1000 vertices
        let (vertices, indices) = noisy_sphere(30, 32);
        let mut destination = vec![0u32; indices.len()];

        let written =
            simplify_sloppy_impl(&mut destination, &indices, &vertices, 30, true).unwrap();

        // a 30-index target asks for 5 cells, below what the coarsest grid
        // can produce on a sphere (one cell per occupied octant); the
        // search then lands on at most 8 cells and the filtered output is
        // bounded by the distinct triangles those representatives can form
        assert!(written / 3 <= 112); // 2 * C(8, 3) distinct triangles
        assert!(written < indices.len() / 10);
        assert_valid_output(&destination[..written], vertices.len());

        // every output vertex lies within the input bounding box
        for &index in &destination[..written] {
            let v = vertices[index as usize];
            for axis in 0..3 {
                assert!(v[axis] >= -1.1 && v[axis] <= 1.1);
            }
        }
    }

    #[test]
    fn test_filtering_removes_duplicates_only() {
        let (vertices, indices) = noisy_sphere(12, 14);
        let target = indices.len() / 8;

        let mut plain = vec![0u32; indices.len()];
        let mut filtered = vec![0u32; indices.len()];

        let plain_written =
            simplify_sloppy_impl(&mut plain, &indices, &vertices, target, false).unwrap();
        let filtered_written =
            simplify_sloppy_impl(&mut filtered, &indices, &vertices, target, true).unwrap();

        assert!(filtered_written <= plain_written);

        // the filtered output has no repeated triangles up to rotation
        let mut seen = std::collections::HashSet::new();
        for tri in filtered[..filtered_written].chunks_exact(3) {
            let key = canonical_rotation([tri[0], tri[1], tri[2]]);
            assert!(seen.insert(key));
        }
    }

    #[test]
    fn test_grid_simplifier_adapter() {
        let (vertices, indices) = noisy_sphere(14, 16);
        let mesh = TriangleMesh::from_vertices_and_faces(
            vertices
                .iter()
                .map(|v| Point3f::new(v[0], v[1], v[2]))
                .collect(),
            indices
                .chunks_exact(3)
                .map(|t| [t[0], t[1], t[2]])
                .collect(),
        );

        let simplifier = GridSimplifier::with_filter_duplicates(true);
        let result = simplifier.simplify(&mesh, mesh.face_count() / 10).unwrap();

        assert!(result.face_count() > 0);
        assert!(result.face_count() < mesh.face_count());

        let (min, max) = mesh.bounding_box();
        for v in &result.vertices {
            assert!(v.x >= min.x && v.x <= max.x);
            assert!(v.y >= min.y && v.y <= max.y);
            assert!(v.z >= min.z && v.z <= max.z);
        }
    }

    #[test]
    fn test_adapter_rejects_empty_mesh() {
        let simplifier = GridSimplifier::new();
        assert!(matches!(
            simplifier.simplify(&TriangleMesh::new(), 10),
            Err(Error::EmptyMesh)
        ));
    }
}
