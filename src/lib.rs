//! # polyreduce
//!
//! Triangle mesh simplification for Rust.
//!
//! This is the umbrella crate that provides convenient access to the
//! polyreduce workspace. You can use this crate to get everything in one
//! place, or depend on the individual crates directly.
//!
//! ## Features
//!
//! - **Core**: shared mesh data structures (`TriangleMesh`, point aliases, errors)
//! - **Simplification**: the two mesh reducers
//!   - quadric edge-collapse simplification with topology-aware vertex
//!     classification (high fidelity, error-bounded)
//!   - grid-based "sloppy" simplification (much faster, approximate)
//!
//! ## Quick Start
//!
//! ```rust
//! use polyreduce::prelude::*;
//!
//! let mesh = TriangleMesh::from_vertices_and_faces(
//!     vec![
//!         Point3f::new(0.0, 0.0, 0.0),
//!         Point3f::new(1.0, 0.0, 0.0),
//!         Point3f::new(0.5, 1.0, 0.0),
//!     ],
//!     vec![[0, 1, 2]],
//! );
//!
//! let simplifier = QuadricSimplifier::new();
//! let reduced = simplifier.simplify(&mesh, 1).unwrap();
//! assert_eq!(reduced.face_count(), 1);
//! ```
//!
//! ## Feature Flags
//!
//! - `default`: enables `simplification`
//! - `simplification`: the mesh reducers

// Re-export core functionality
pub use polyreduce_core::*;

#[cfg(feature = "simplification")]
pub use polyreduce_simplification as simplification;

/// Convenient imports for common use cases
pub mod prelude {
    pub use polyreduce_core::*;

    #[cfg(feature = "simplification")]
    pub use polyreduce_simplification::*;
}
