//! Quadric error metric
//!
//! A quadric is a symmetric 4x4 matrix stored as ten scalars. Accumulated
//! from the planes around a vertex, it measures the summed squared distance
//! of a candidate point to those planes, which is the error both reducers
//! rank collapses by.

use crate::vertex::normalize;
use polyreduce_core::Vector3f;
use std::ops::AddAssign;

/// Symmetric 4x4 quadric: lower triangle of the 3x3 block, the linear term,
/// and the constant term. A fresh quadric is all zero and evaluates to zero
/// everywhere.
#[derive(Debug, Clone, Copy, Default)]
pub(crate) struct Quadric {
    a00: f32,
    a10: f32,
    a11: f32,
    a20: f32,
    a21: f32,
    a22: f32,
    b0: f32,
    b1: f32,
    b2: f32,
    c: f32,
}

impl AddAssign for Quadric {
    fn add_assign(&mut self, other: Self) {
        self.a00 += other.a00;
        self.a10 += other.a10;
        self.a11 += other.a11;
        self.a20 += other.a20;
        self.a21 += other.a21;
        self.a22 += other.a22;
        self.b0 += other.b0;
        self.b1 += other.b1;
        self.b2 += other.b2;
        self.c += other.c;
    }
}

impl Quadric {
    /// Scales all ten fields
    fn scale(&mut self, s: f32) {
        self.a00 *= s;
        self.a10 *= s;
        self.a11 *= s;
        self.a20 *= s;
        self.a21 *= s;
        self.a22 *= s;
        self.b0 *= s;
        self.b1 *= s;
        self.b2 *= s;
        self.c *= s;
    }

    /// Outer product of the plane (a, b, c, d); squared distance to the
    /// plane when the normal (a, b, c) is unit length.
    pub fn from_plane(a: f32, b: f32, c: f32, d: f32) -> Self {
        Self {
            a00: a * a,
            a10: b * a,
            a11: b * b,
            a20: c * a,
            a21: c * b,
            a22: c * c,
            b0: d * a,
            b1: d * b,
            b2: d * c,
            c: d * d,
        }
    }

    /// Plane quadric of the triangle, weighted by its area so larger
    /// triangles pull collapses harder.
    pub fn from_triangle(p0: &Vector3f, p1: &Vector3f, p2: &Vector3f) -> Self {
        let p10 = Vector3f::new(p1.x - p0.x, p1.y - p0.y, p1.z - p0.z);
        let p20 = Vector3f::new(p2.x - p0.x, p2.y - p0.y, p2.z - p0.z);

        let mut normal = Vector3f::new(
            p10.y * p20.z - p10.z * p20.y,
            p10.z * p20.x - p10.x * p20.z,
            p10.x * p20.y - p10.y * p20.x,
        );
        let area = normalize(&mut normal);

        let distance = normal.x * p0.x + normal.y * p0.y + normal.z * p0.z;

        let mut q = Self::from_plane(normal.x, normal.y, normal.z, -distance);
        q.scale(area);
        q
    }

    /// Quadric of the plane that contains the edge p0->p1 and is
    /// perpendicular to the triangle's plane, scaled by squared edge length
    /// times `weight`. Penalizes moving a boundary vertex off its edge.
    pub fn from_triangle_edge(p0: &Vector3f, p1: &Vector3f, p2: &Vector3f, weight: f32) -> Self {
        let mut p10 = Vector3f::new(p1.x - p0.x, p1.y - p0.y, p1.z - p0.z);
        let length = normalize(&mut p10);

        // normal = altitude of the triangle from p2 onto the edge p0-p1
        let p20 = Vector3f::new(p2.x - p0.x, p2.y - p0.y, p2.z - p0.z);
        let p20p = p20.x * p10.x + p20.y * p10.y + p20.z * p10.z;

        let mut normal = Vector3f::new(
            p20.x - p10.x * p20p,
            p20.y - p10.y * p20p,
            p20.z - p10.z * p20p,
        );
        normalize(&mut normal);

        let distance = normal.x * p0.x + normal.y * p0.y + normal.z * p0.z;

        let mut q = Self::from_plane(normal.x, normal.y, normal.z, -distance);
        q.scale(length * length * weight);
        q
    }

    /// Evaluates |v . (A v + 2 b) + c|
    pub fn error(&self, v: &Vector3f) -> f32 {
        let mut rx = self.b0;
        let mut ry = self.b1;
        let mut rz = self.b2;

        rx += self.a10 * v.y;
        ry += self.a21 * v.z;
        rz += self.a20 * v.x;

        rx *= 2.0;
        ry *= 2.0;
        rz *= 2.0;

        rx += self.a00 * v.x;
        ry += self.a11 * v.y;
        rz += self.a22 * v.z;

        let mut r = self.c;
        r += rx * v.x;
        r += ry * v.y;
        r += rz * v.z;

        r.abs()
    }
}
