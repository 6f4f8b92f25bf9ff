//! Core data structures for polyreduce
//!
//! This crate provides the fundamental types shared by the polyreduce
//! workspace: point and vector aliases, the indexed triangle mesh
//! container, and the common error type.

pub mod error;
pub mod mesh;
pub mod point;

pub use error::*;
pub use mesh::*;
pub use point::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Matrix3, Matrix4, Point3, Vector3};

// Type aliases for easier imports
pub type Point = Point3f;
pub type Mesh = TriangleMesh;
