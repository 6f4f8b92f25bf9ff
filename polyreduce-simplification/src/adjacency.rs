//! Directed edge adjacency
//!
//! For each originating vertex, the packed list of destination vertices of
//! its outgoing half-edges. Each face contributes three directed edges
//! (a->b, b->c, c->a), so an edge interior to the mesh appears once in each
//! direction while an open edge appears in only one.

/// Half-edge adjacency over three parallel arrays: per-vertex counts,
/// per-vertex offsets into `data`, and the packed destination list.
pub(crate) struct EdgeAdjacency {
    counts: Vec<u32>,
    offsets: Vec<u32>,
    data: Vec<u32>,
}

impl EdgeAdjacency {
    pub fn new(indices: &[u32], vertex_count: usize) -> Self {
        let face_count = indices.len() / 3;

        let mut counts = vec![0u32; vertex_count];
        let mut offsets = vec![0u32; vertex_count];
        let mut data = vec![0u32; indices.len()];

        // fill edge counts
        for &index in indices {
            counts[index as usize] += 1;
        }

        // fill offset table
        let mut offset = 0;

        for (o, count) in offsets.iter_mut().zip(counts.iter()) {
            *o = offset;
            offset += *count;
        }

        debug_assert_eq!(offset as usize, indices.len());

        // fill edge data
        for face in 0..face_count {
            let a = indices[face * 3] as usize;
            let b = indices[face * 3 + 1] as usize;
            let c = indices[face * 3 + 2] as usize;

            data[offsets[a] as usize] = b as u32;
            data[offsets[b] as usize] = c as u32;
            data[offsets[c] as usize] = a as u32;

            offsets[a] += 1;
            offsets[b] += 1;
            offsets[c] += 1;
        }

        // fix offsets that have been disturbed by the previous pass
        for (offset, count) in offsets.iter_mut().zip(counts.iter()) {
            debug_assert!(*offset >= *count);

            *offset -= *count;
        }

        Self {
            counts,
            offsets,
            data,
        }
    }

    /// Destinations of all directed edges originating at `vertex`
    pub fn targets(&self, vertex: u32) -> &[u32] {
        let offset = self.offsets[vertex as usize] as usize;
        let count = self.counts[vertex as usize] as usize;

        &self.data[offset..offset + count]
    }

    /// Whether the directed edge a->b exists
    pub fn has_edge(&self, a: u32, b: u32) -> bool {
        self.targets(a).contains(&b)
    }
}
