//! Quadric edge-collapse simplification
//!
//! Reduces a mesh one pass at a time: every surviving half-edge is
//! considered as a collapse candidate, candidates are ranked globally by
//! quadric error, and the cheapest conflict-free subset is applied before
//! the index buffer is compacted. Vertex kinds gate which collapses
//! topology permits, and per-pass locks guarantee no vertex moves twice
//! between re-rankings.

use crate::adjacency::EdgeAdjacency;
use crate::quadric::Quadric;
use crate::topology::{build_position_remap, classify_vertices, VertexKind, KIND_COUNT};
use crate::vertex::{rescale_positions, Position};
use crate::{compact_mesh, validate_buffers, MeshSimplifier, INVALID_INDEX};

use polyreduce_core::{Error, Result, TriangleMesh, Vector3f};
use tracing::debug;

// manifold vertices can collapse onto anything except locked
// border/seam vertices can only be collapsed onto border/seam respectively
const CAN_COLLAPSE: [[bool; KIND_COUNT]; KIND_COUNT] = [
    [true, true, true, true],
    [false, true, false, false],
    [false, false, true, false],
    [false, false, false, false],
];

// if a vertex is manifold or seam, adjoining edges are guaranteed to have an
// opposite edge; for seam edges the opposite isn't present in the
// attribute-based topology but is present in the position-only variant
const HAS_OPPOSITE: [[bool; KIND_COUNT]; KIND_COUNT] = [
    [true, true, true, true],
    [true, false, true, false],
    [true, true, true, true],
    [true, false, true, false],
];

/// An edge collapse candidate.
///
/// `payload` holds the bidirectionality flag while candidates are picked
/// and is rewritten with the error bits once the candidate is ranked; the
/// sort reads those bits directly. Explicit `to_bits`/`from_bits` accessors
/// keep the reuse well-defined.
#[derive(Debug, Clone, Copy, Default)]
struct Collapse {
    v0: u32,
    v1: u32,
    payload: u32,
}

impl Collapse {
    fn bidirectional(&self) -> bool {
        self.payload != 0
    }

    fn error(&self) -> f32 {
        f32::from_bits(self.payload)
    }

    fn set_error(&mut self, error: f32) {
        self.payload = error.to_bits();
    }
}

/// Accumulates each triangle's plane quadric into the canonical vertex of
/// all three corners. Shared with the grid reducer, which passes its
/// vertex->cell map as `canonical`.
pub(crate) fn fill_face_quadrics(
    quadrics: &mut [Quadric],
    indices: &[u32],
    vertex_positions: &[Vector3f],
    canonical: &[u32],
) {
    for i in indices.chunks_exact(3) {
        let (i0, i1, i2) = (i[0] as usize, i[1] as usize, i[2] as usize);

        let q = Quadric::from_triangle(
            &vertex_positions[i0],
            &vertex_positions[i1],
            &vertex_positions[i2],
        );

        quadrics[canonical[i0] as usize] += q;
        quadrics[canonical[i1] as usize] += q;
        quadrics[canonical[i2] as usize] += q;
    }
}

// we try hard to maintain border edge geometry; seam edges can move more
// freely since topological restrictions already constrain their collapses
const EDGE_WEIGHT_SEAM: f32 = 1.0;
const EDGE_WEIGHT_BORDER: f32 = 10.0;

/// Adds perpendicular edge quadrics along border and seam loops so that
/// collapses pay for pulling an open edge out of line.
fn fill_edge_quadrics(
    quadrics: &mut [Quadric],
    indices: &[u32],
    vertex_positions: &[Vector3f],
    remap: &[u32],
    vertex_kind: &[VertexKind],
    loop_: &[u32],
) {
    const NEXT: [usize; 3] = [1, 2, 0];

    for i in indices.chunks_exact(3) {
        for e in 0..3 {
            let i0 = i[e] as usize;
            let i1 = i[NEXT[e]] as usize;

            let k0 = vertex_kind[i0];
            let k1 = vertex_kind[i1];

            // both endpoints must be border/seam of the same kind on the
            // same edge loop; loop_ tracks half edges so checking i0->i1
            // suffices
            if k0 != k1
                || (k0 != VertexKind::Border && k0 != VertexKind::Seam)
                || loop_[i0] != i1 as u32
            {
                continue;
            }

            let i2 = i[NEXT[NEXT[e]]] as usize;

            let edge_weight = if k0 == VertexKind::Seam {
                EDGE_WEIGHT_SEAM
            } else {
                EDGE_WEIGHT_BORDER
            };

            let q = Quadric::from_triangle_edge(
                &vertex_positions[i0],
                &vertex_positions[i1],
                &vertex_positions[i2],
                edge_weight,
            );

            quadrics[remap[i0] as usize] += q;
            quadrics[remap[i1] as usize] += q;
        }
    }
}

/// Collects the collapse candidates of the surviving index buffer.
fn pick_edge_collapses(
    collapses: &mut Vec<Collapse>,
    indices: &[u32],
    remap: &[u32],
    vertex_kind: &[VertexKind],
    loop_: &[u32],
) {
    const NEXT: [usize; 3] = [1, 2, 0];

    collapses.clear();

    for i in indices.chunks_exact(3) {
        for e in 0..3 {
            let i0 = i[e] as usize;
            let i1 = i[NEXT[e]] as usize;

            // zero-length edges (or wedges collapsed together by earlier
            // passes) are left alone; they may be holding the mesh together
            if remap[i0] == remap[i1] {
                continue;
            }

            let k0 = vertex_kind[i0] as usize;
            let k1 = vertex_kind[i1] as usize;

            // the edge has to be collapsible in at least one direction
            if !(CAN_COLLAPSE[k0][k1] | CAN_COLLAPSE[k1][k0]) {
                continue;
            }

            // manifold and seam edges occur twice (i0->i1 and i1->i0);
            // process them from the side with the smaller canonical index
            if HAS_OPPOSITE[k0][k1] && remap[i1] > remap[i0] {
                continue;
            }

            // two border/seam vertices with no loop edge between them
            // belong to different edge loops and must not be fused
            if k0 == k1
                && (vertex_kind[i0] == VertexKind::Border || vertex_kind[i0] == VertexKind::Seam)
                && loop_[i0] != i1 as u32
            {
                continue;
            }

            if CAN_COLLAPSE[k0][k1] & CAN_COLLAPSE[k1][k0] {
                // collapsible either way; ranking picks the direction
                collapses.push(Collapse {
                    v0: i0 as u32,
                    v1: i1 as u32,
                    payload: 1,
                });
            } else {
                // edge can only be collapsed in one direction
                let e0 = if CAN_COLLAPSE[k0][k1] { i0 } else { i1 };
                let e1 = if CAN_COLLAPSE[k0][k1] { i1 } else { i0 };

                collapses.push(Collapse {
                    v0: e0 as u32,
                    v1: e1 as u32,
                    payload: 0,
                });
            }
        }
    }
}

/// Scores each candidate with the quadric error of the move and keeps the
/// cheaper direction of bidirectional edges.
fn rank_edge_collapses(
    collapses: &mut [Collapse],
    vertex_positions: &[Vector3f],
    vertex_quadrics: &[Quadric],
    remap: &[u32],
) {
    for c in collapses.iter_mut() {
        let i0 = c.v0;
        let i1 = c.v1;

        // unidirectional edges evaluate the same move twice to stay branchless
        let j0 = if c.bidirectional() { i1 } else { i0 };
        let j1 = if c.bidirectional() { i0 } else { i1 };

        let qi = &vertex_quadrics[remap[i0 as usize] as usize];
        let qj = &vertex_quadrics[remap[j0 as usize] as usize];

        let ei = qi.error(&vertex_positions[i1 as usize]);
        let ej = qj.error(&vertex_positions[j1 as usize]);

        c.v0 = if ei <= ej { i0 } else { j0 };
        c.v1 = if ei <= ej { i1 } else { j1 };
        c.set_error(ei.min(ej));
    }
}

const SORT_BITS: u32 = 11;
const SORT_BINS: usize = 1 << SORT_BITS;

/// Counting sort on the top bits of the error, skipping the sign bit
/// (errors are non-negative). Stable, so equal-error collapses keep their
/// emission order.
fn sort_edge_collapses(sort_order: &mut Vec<u32>, collapses: &[Collapse]) {
    let mut histogram = [0u32; SORT_BINS];

    for c in collapses {
        let key = (c.payload << 1) >> (32 - SORT_BITS);

        histogram[key as usize] += 1;
    }

    let mut histogram_sum = 0;

    for count in histogram.iter_mut() {
        let current = *count;
        *count = histogram_sum;
        histogram_sum += current;
    }

    debug_assert_eq!(histogram_sum as usize, collapses.len());

    sort_order.clear();
    sort_order.resize(collapses.len(), 0);

    for (i, c) in collapses.iter().enumerate() {
        let key = ((c.payload << 1) >> (32 - SORT_BITS)) as usize;

        sort_order[histogram[key] as usize] = i as u32;
        histogram[key] += 1;
    }
}

/// Applies collapses in ranked order until a stop condition hits.
///
/// A vertex participates in at most one collapse per pass: both canonical
/// endpoints are locked after a collapse so errors ranked against the
/// pass-entry quadrics stay valid.
#[allow(clippy::too_many_arguments)]
fn perform_edge_collapses(
    collapse_remap: &mut [u32],
    collapse_locked: &mut [bool],
    vertex_quadrics: &mut [Quadric],
    collapses: &[Collapse],
    collapse_order: &[u32],
    remap: &[u32],
    wedge: &[u32],
    vertex_kind: &[VertexKind],
    triangle_collapse_goal: usize,
    error_limit: f32,
) -> usize {
    let mut edge_collapses = 0;
    let mut triangle_collapses = 0;

    for &order in collapse_order {
        let c = collapses[order as usize];

        if c.error() > error_limit {
            break;
        }

        if triangle_collapses >= triangle_collapse_goal {
            break;
        }

        let i0 = c.v0 as usize;
        let i1 = c.v1 as usize;

        let r0 = remap[i0] as usize;
        let r1 = remap[i1] as usize;

        // skip collapses whose endpoints already moved this pass
        if collapse_locked[r0] || collapse_locked[r1] {
            continue;
        }

        debug_assert_eq!(collapse_remap[r0] as usize, r0);
        debug_assert_eq!(collapse_remap[r1] as usize, r1);

        vertex_quadrics[r1] += vertex_quadrics[r0];

        if vertex_kind[i0] == VertexKind::Seam {
            // move the wedge pair of v0 onto the wedge pair of v1
            let s0 = wedge[i0] as usize;
            let s1 = wedge[i1] as usize;

            debug_assert!(s0 != i0 && s1 != i1);
            debug_assert!(wedge[s0] as usize == i0 && wedge[s1] as usize == i1);

            collapse_remap[i0] = i1 as u32;
            collapse_remap[s0] = s1 as u32;
        } else {
            debug_assert_eq!(wedge[i0] as usize, i0);

            collapse_remap[i0] = i1 as u32;
        }

        collapse_locked[r0] = true;
        collapse_locked[r1] = true;

        // border edges collapse 1 triangle, other edges collapse 2 or more
        triangle_collapses += if vertex_kind[i0] == VertexKind::Border {
            1
        } else {
            2
        };
        edge_collapses += 1;
    }

    edge_collapses
}

/// Rewrites the index buffer through `collapse_remap`, dropping triangles
/// that became degenerate. Returns the new index count.
fn remap_index_buffer(indices: &mut [u32], collapse_remap: &[u32]) -> usize {
    let mut write = 0;

    for i in (0..indices.len()).step_by(3) {
        let v0 = collapse_remap[indices[i] as usize];
        let v1 = collapse_remap[indices[i + 1] as usize];
        let v2 = collapse_remap[indices[i + 2] as usize];

        // we never move a vertex twice during a single pass
        debug_assert_eq!(collapse_remap[v0 as usize], v0);
        debug_assert_eq!(collapse_remap[v1 as usize], v1);
        debug_assert_eq!(collapse_remap[v2 as usize], v2);

        if v0 != v1 && v0 != v2 && v1 != v2 {
            indices[write] = v0;
            indices[write + 1] = v1;
            indices[write + 2] = v2;
            write += 3;
        }
    }

    write
}

/// Follows edge-loop partners through the collapse remap.
fn remap_edge_loops(loop_: &mut [u32], collapse_remap: &[u32]) {
    for i in 0..loop_.len() {
        if loop_[i] != INVALID_INDEX {
            let l = loop_[i];
            let r = collapse_remap[l as usize];

            // i == r means the seam edge was collapsed against the loop
            // direction; inherit the partner's partner
            loop_[i] = if i == r as usize { loop_[l as usize] } else { r };
        }
    }
}

// we limit the error in each pass to 1.5x the error of the collapse at the
// goal position; collapses locked by earlier ones would otherwise starve
// the pass of progress
const PASS_ERROR_BOUND: f32 = 1.5;

/// Reduces the mesh to `target_index_count` indices where topology and the
/// error bound allow, attempting to preserve mesh appearance.
///
/// Writes the surviving indices (which reference the original vertex
/// buffer) as a prefix of `destination` and returns the new index count.
/// The count is a multiple of 3 and never exceeds `indices.len()`, which is
/// also the capacity `destination` must provide. `target_error` caps the
/// quadric error any single collapse may introduce; the reducer stops early
/// once no candidate fits under it.
pub fn simplify<V: Position>(
    destination: &mut [u32],
    indices: &[u32],
    vertices: &[V],
    target_index_count: usize,
    target_error: f32,
) -> Result<usize> {
    validate_buffers(destination, indices, vertices.len(), target_index_count)?;

    let result = &mut destination[..indices.len()];
    result.copy_from_slice(indices);

    // build adjacency information
    let adjacency = EdgeAdjacency::new(indices, vertices.len());

    // build position remap that maps each vertex to the one with identical position
    let (remap, wedge) = build_position_remap(vertices);

    // classify vertices; vertex kind determines collapse rules, see CAN_COLLAPSE
    let (vertex_kind, mut loop_) = classify_vertices(&adjacency, &remap, &wedge);

    let vertex_positions = rescale_positions(vertices);

    let mut vertex_quadrics = vec![Quadric::default(); vertices.len()];
    fill_face_quadrics(&mut vertex_quadrics, indices, &vertex_positions, &remap);
    fill_edge_quadrics(
        &mut vertex_quadrics,
        indices,
        &vertex_positions,
        &remap,
        &vertex_kind,
        &loop_,
    );

    let unique_positions = remap
        .iter()
        .enumerate()
        .filter(|&(i, r)| i == *r as usize)
        .count();
    debug!(
        vertices = vertices.len(),
        unique_positions, "classified vertices"
    );

    let mut edge_collapses: Vec<Collapse> = Vec::with_capacity(indices.len());
    let mut collapse_order: Vec<u32> = Vec::with_capacity(indices.len());
    let mut collapse_remap = vec![0u32; vertices.len()];
    let mut collapse_locked = vec![false; vertices.len()];

    let mut result_count = indices.len();
    let mut pass_count = 0;

    while result_count > target_index_count {
        pick_edge_collapses(
            &mut edge_collapses,
            &result[..result_count],
            &remap,
            &vertex_kind,
            &loop_,
        );

        // no edges can be collapsed any more due to topology restrictions
        if edge_collapses.is_empty() {
            break;
        }

        rank_edge_collapses(&mut edge_collapses, &vertex_positions, &vertex_quadrics, &remap);

        sort_edge_collapses(&mut collapse_order, &edge_collapses);

        // most collapses remove 2 triangles; the edge goal estimates where
        // in the ranked order the pass should be able to stop
        let triangle_collapse_goal = (result_count - target_index_count) / 3;
        let edge_collapse_goal = triangle_collapse_goal / 2;

        let error_goal = if edge_collapse_goal < edge_collapses.len() {
            edge_collapses[collapse_order[edge_collapse_goal] as usize].error() * PASS_ERROR_BOUND
        } else {
            f32::MAX
        };

        let error_limit = error_goal.min(target_error);

        for (i, r) in collapse_remap.iter_mut().enumerate() {
            *r = i as u32;
        }

        collapse_locked.fill(false);

        let collapses = perform_edge_collapses(
            &mut collapse_remap,
            &mut collapse_locked,
            &mut vertex_quadrics,
            &edge_collapses,
            &collapse_order,
            &remap,
            &wedge,
            &vertex_kind,
            triangle_collapse_goal,
            error_limit,
        );

        // no edges can be collapsed any more due to hitting the error limit
        if collapses == 0 {
            break;
        }

        remap_edge_loops(&mut loop_, &collapse_remap);

        let new_count = remap_index_buffer(&mut result[..result_count], &collapse_remap);
        debug_assert!(new_count < result_count);

        pass_count += 1;
        debug!(
            pass = pass_count,
            triangles_before = result_count / 3,
            triangles_after = new_count / 3,
            collapses,
            candidates = edge_collapses.len(),
            error_limit,
            "collapse pass"
        );

        result_count = new_count;
    }

    debug!(passes = pass_count, result_count, "simplification complete");

    Ok(result_count)
}

/// Quadric edge-collapse mesh simplifier.
///
/// Wraps [`simplify`] for [`TriangleMesh`] inputs and compacts the
/// surviving vertices into the result.
pub struct QuadricSimplifier {
    /// Stop once no collapse fits under this quadric error (evaluated in
    /// unit-cube normalized coordinates)
    pub target_error: f32,
}

impl Default for QuadricSimplifier {
    fn default() -> Self {
        Self { target_error: 1e-2 }
    }
}

impl QuadricSimplifier {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_target_error(target_error: f32) -> Self {
        Self { target_error }
    }
}

impl MeshSimplifier for QuadricSimplifier {
    fn simplify(&self, mesh: &TriangleMesh, target_face_count: usize) -> Result<TriangleMesh> {
        if mesh.is_empty() {
            return Err(Error::EmptyMesh);
        }

        let indices: Vec<u32> = mesh.faces.iter().flat_map(|f| f.iter().copied()).collect();
        let target_index_count = (target_face_count * 3).min(indices.len());

        let mut destination = vec![0u32; indices.len()];
        let written = simplify(
            &mut destination,
            &indices,
            &mesh.vertices,
            target_index_count,
            self.target_error,
        )?;

        Ok(compact_mesh(&mesh.vertices, &destination[..written]))
    }
}
