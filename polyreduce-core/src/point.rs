//! Point types and related functionality

use bytemuck::{Pod, Zeroable};
use nalgebra::{Point3, Vector3};
use serde::{Deserialize, Serialize};

/// A 3D point with floating point coordinates
pub type Point3f = Point3<f32>;

/// A 3D point with double precision coordinates
pub type Point3d = Point3<f64>;

/// A 3D vector with floating point components
pub type Vector3f = Vector3<f32>;

/// A 3D vector with double precision components
pub type Vector3d = Vector3<f64>;

/// A bare position record.
///
/// This is the minimal vertex layout the simplifiers accept; richer vertex
/// records can be passed as well, as long as their position lives in the
/// leading three floats of the record.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[repr(C)]
pub struct PositionVertex {
    pub position: [f32; 3],
}

unsafe impl Pod for PositionVertex {}
unsafe impl Zeroable for PositionVertex {}

impl PositionVertex {
    /// Create a position record from coordinates
    pub fn new(x: f32, y: f32, z: f32) -> Self {
        Self {
            position: [x, y, z],
        }
    }
}

impl Default for PositionVertex {
    fn default() -> Self {
        Self {
            position: [0.0, 0.0, 0.0],
        }
    }
}

impl From<Point3f> for PositionVertex {
    fn from(p: Point3f) -> Self {
        Self {
            position: [p.x, p.y, p.z],
        }
    }
}
