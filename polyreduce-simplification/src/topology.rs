//! Position remap, wedge rings, and vertex classification
//!
//! Vertices that share a bit-identical position but differ in index are
//! attribute wedges of one logical vertex. The remap array names the
//! canonical (smallest-indexed) vertex of each position class and the wedge
//! array links each class into a cyclic ring. Classification then decides,
//! per logical vertex, how the collapse loop may move it.

use crate::adjacency::EdgeAdjacency;
use crate::hash::{hash_buckets, hash_lookup, PositionHasher};
use crate::vertex::Position;
use crate::INVALID_INDEX;

/// How a vertex is allowed to participate in collapses.
///
/// The classifier intentionally mirrors two quirks of the half-edge
/// counting it is built on: vertices with no open edges are treated as
/// manifold even when more than two triangles share an edge through them,
/// and a border vertex is recognized by a single open outgoing half-edge
/// (its incoming partner is owned by the neighboring vertex). Downstream
/// collapse rules are tuned to exactly this behavior.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum VertexKind {
    /// Interior vertex with all edges paired; can collapse onto anything
    /// except locked vertices.
    Manifold,
    /// On an open boundary; may only slide along its boundary loop.
    Border,
    /// Two-wedge attribute seam whose open half-edges pair up across the
    /// seam; may only slide along the seam.
    Seam,
    /// Cannot move.
    Locked,
}

pub(crate) const KIND_COUNT: usize = 4;

/// Groups vertices by bit-exact position.
///
/// Returns `(remap, wedge)`: `remap[v]` is the smallest-indexed vertex with
/// v's position (`remap[remap[v]] == remap[v]`), and `wedge[v]` links each
/// position class into a cyclic ring (`wedge[v] == v` for singletons).
pub(crate) fn build_position_remap<V: Position>(vertices: &[V]) -> (Vec<u32>, Vec<u32>) {
    let vertex_count = vertices.len();

    let hasher = PositionHasher { vertices };
    let mut table = vec![INVALID_INDEX; hash_buckets(vertex_count)];

    // forward remap: ascending order guarantees the canonical vertex of
    // each class is the first one seen
    let mut remap = vec![0u32; vertex_count];

    for index in 0..vertex_count as u32 {
        let slot = hash_lookup(&table, &hasher, &index, &INVALID_INDEX);

        if table[slot] == INVALID_INDEX {
            table[slot] = index;
        }

        remap[index as usize] = table[slot];
    }

    // wedge rings: splice every non-canonical vertex into its canonical
    // vertex's ring
    let mut wedge: Vec<u32> = (0..vertex_count as u32).collect();

    for i in 0..vertex_count {
        let r = remap[i] as usize;

        if r != i {
            wedge[i] = wedge[r];
            wedge[r] = i as u32;
        }
    }

    (remap, wedge)
}

/// Counts outgoing edges of `vertex` with no reverse edge; also reports the
/// destination of the last one seen.
fn count_open_edges(adjacency: &EdgeAdjacency, vertex: u32) -> (usize, u32) {
    let mut result = 0;
    let mut last = INVALID_INDEX;

    for &target in adjacency.targets(vertex) {
        if !adjacency.has_edge(target, vertex) {
            result += 1;
            last = target;
        }
    }

    (result, last)
}

/// Walks the wedge ring starting at `start`, returning the first member
/// with a directed edge to `target`.
fn find_wedge_edge(adjacency: &EdgeAdjacency, wedge: &[u32], start: u32, target: u32) -> u32 {
    let mut v = start;

    loop {
        if adjacency.has_edge(v, target) {
            return v;
        }

        v = wedge[v as usize];

        if v == start {
            return INVALID_INDEX;
        }
    }
}

/// Assigns each vertex a kind and, for border/seam vertices, the next
/// vertex along the open boundary (`loop_`, `INVALID_INDEX` elsewhere).
pub(crate) fn classify_vertices(
    adjacency: &EdgeAdjacency,
    remap: &[u32],
    wedge: &[u32],
) -> (Vec<VertexKind>, Vec<u32>) {
    let vertex_count = remap.len();

    let mut result = vec![VertexKind::Manifold; vertex_count];
    let mut loop_ = vec![INVALID_INDEX; vertex_count];

    for i in 0..vertex_count {
        if remap[i] != i as u32 {
            // canonical vertex comes first, so its kind is already decided
            debug_assert!(remap[i] < i as u32);
            result[i] = result[remap[i] as usize];
            continue;
        }

        if wedge[i] == i as u32 {
            // no attribute seam; open-edge count decides
            let (edges, v) = count_open_edges(adjacency, i as u32);

            if edges == 0 {
                result[i] = VertexKind::Manifold;
            } else if edges == 1 {
                result[i] = VertexKind::Border;
                loop_[i] = v;
            } else {
                result[i] = VertexKind::Locked;
            }
        } else if wedge[wedge[i] as usize] == i as u32 {
            // two-wedge attribute seam; Seam needs one open half-edge per
            // wedge, each continuing into the other wedge's side
            let w = wedge[i];
            let (a_count, a) = count_open_edges(adjacency, i as u32);
            let (b_count, b) = count_open_edges(adjacency, w);

            if a_count == 1 && b_count == 1 {
                let ao = find_wedge_edge(adjacency, wedge, a, w);
                let bo = find_wedge_edge(adjacency, wedge, b, i as u32);

                if ao != INVALID_INDEX && bo != INVALID_INDEX {
                    result[i] = VertexKind::Seam;

                    loop_[i] = a;
                    loop_[w as usize] = b;
                } else {
                    result[i] = VertexKind::Locked;
                }
            } else {
                result[i] = VertexKind::Locked;
            }
        } else {
            // three or more wedges; no classification available
            result[i] = VertexKind::Locked;
        }
    }

    (result, loop_)
}
