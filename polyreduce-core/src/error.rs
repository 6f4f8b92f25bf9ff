//! Error types for polyreduce

use thiserror::Error;

/// Main error type for polyreduce operations
#[derive(Error, Debug)]
pub enum Error {
    #[error("index count {0} is not a multiple of 3")]
    InvalidIndexCount(usize),

    #[error("index {index} is out of bounds for {vertex_count} vertices")]
    IndexOutOfBounds { index: u32, vertex_count: usize },

    #[error("target index count {target} exceeds index count {index_count}")]
    InvalidTarget { target: usize, index_count: usize },

    #[error("destination holds {capacity} indices but {required} are required")]
    DestinationTooSmall { capacity: usize, required: usize },

    #[error("mesh has no faces")]
    EmptyMesh,
}

/// Result type alias for polyreduce operations
pub type Result<T> = std::result::Result<T, Error>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = Error::InvalidIndexCount(7);
        assert_eq!(format!("{err}"), "index count 7 is not a multiple of 3");

        let err = Error::IndexOutOfBounds {
            index: 9,
            vertex_count: 4,
        };
        assert!(format!("{err}").contains("9"));
        assert!(format!("{err}").contains("4"));
    }
}
