//! Error types for the frame pipeline.

use std::path::PathBuf;
use thiserror::Error;

/// Main error type for scene and GPU setup operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Scene sequences are bounded by the GPU buffer capacity
    #[error("Scene capacity exceeded: {requested} records (capacity: {capacity})")]
    CapacityExceeded { requested: usize, capacity: usize },

    /// Device refused to create a buffer, image, kernel or binding
    #[error("Failed to create GPU resource '{label}': {reason}")]
    ResourceCreation { label: String, reason: String },

    /// Device lacks a capability the pipeline depends on
    #[error("Device is missing required feature: {0}")]
    MissingFeature(String),

    /// Kernel override directory does not contain the requested source
    #[error("Kernel source not found: {0}")]
    KernelNotFound(PathBuf),

    /// Byte slice does not match a GPU record layout
    #[error("Invalid {record} layout: {reason}")]
    InvalidLayout { record: &'static str, reason: String },

    /// Material discriminant outside Emissive/Lambertian/Metal
    #[error("Unknown material kind: {0}")]
    UnknownMaterialKind(u32),

    /// I/O error
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Shorthand for [`Error::ResourceCreation`].
    pub fn creation(label: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::ResourceCreation {
            label: label.into(),
            reason: reason.into(),
        }
    }
}

/// Result type for fallible pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;
