//! Vertex position access and rescaling

use nalgebra::Point3;
use polyreduce_core::{PositionVertex, Vector3f};

/// Read access to a vertex position, independent of the record layout.
///
/// The reducers are generic over the vertex record; any type that can
/// produce its position as three floats works as input. Implementations are
/// provided for bare coordinate arrays, nalgebra points, and
/// [`PositionVertex`].
pub trait Position {
    fn pos(&self) -> [f32; 3];
}

impl Position for [f32; 3] {
    fn pos(&self) -> [f32; 3] {
        *self
    }
}

impl Position for Point3<f32> {
    fn pos(&self) -> [f32; 3] {
        [self.x, self.y, self.z]
    }
}

impl Position for PositionVertex {
    fn pos(&self) -> [f32; 3] {
        self.position
    }
}

/// Minimum corner and largest axis extent of the bounding box.
pub(crate) fn calc_pos_extents<V: Position>(vertices: &[V]) -> ([f32; 3], f32) {
    if vertices.is_empty() {
        return ([0.0; 3], 0.0);
    }

    let mut minv = [f32::MAX; 3];
    let mut maxv = [f32::MIN; 3];

    for vertex in vertices {
        let v = vertex.pos();

        for j in 0..3 {
            minv[j] = minv[j].min(v[j]);
            maxv[j] = maxv[j].max(v[j]);
        }
    }

    let extent = (maxv[0] - minv[0])
        .max(maxv[1] - minv[1])
        .max(maxv[2] - minv[2]);

    (minv, extent)
}

/// Normalizes positions into the unit cube for numerical conditioning.
///
/// The largest bounding-box axis maps to [0, 1]; the other axes are scaled
/// by the same factor. Zero-extent input maps every position to the origin.
pub(crate) fn rescale_positions<V: Position>(vertices: &[V]) -> Vec<Vector3f> {
    let (minv, extent) = calc_pos_extents(vertices);

    let scale = if extent == 0.0 { 0.0 } else { 1.0 / extent };

    vertices
        .iter()
        .map(|vertex| {
            let v = vertex.pos();

            Vector3f::new(
                (v[0] - minv[0]) * scale,
                (v[1] - minv[1]) * scale,
                (v[2] - minv[2]) * scale,
            )
        })
        .collect()
}

/// Normalizes `v` in place and returns the pre-normalization length.
/// A zero vector is left unchanged.
pub(crate) fn normalize(v: &mut Vector3f) -> f32 {
    let length = (v.x * v.x + v.y * v.y + v.z * v.z).sqrt();

    if length > 0.0 {
        v.x /= length;
        v.y /= length;
        v.z /= length;
    }

    length
}
