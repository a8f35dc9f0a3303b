//! Error type shared by every stage of a heatmap render.
//!
//! All validation failures are raised before the first draw call, so a
//! caller that sees an `Err` from [`crate::HeatMapComposer::render`] can rely
//! on the surface being untouched.

use std::path::PathBuf;
use thiserror::Error;

use crate::table::Axis;

#[derive(Error, Debug)]
pub enum HeatmapError {
    /// Unknown metric or linkage method, or a linkage request kodama cannot serve
    #[error("Clustering error: {message}")]
    Clustering { message: String },

    /// A pairwise distance came out non-finite (NaN input, constant vector under
    /// correlation distance, zero vector under cosine distance)
    #[error("Degenerate input on {axis} axis: distance between '{first}' and '{second}' is not finite ({message})")]
    DegenerateInput {
        axis: Axis,
        first: String,
        second: String,
        message: String,
    },

    #[error("Invalid {axis} order: {message}")]
    InvalidOrder { axis: Axis, message: String },

    #[error("Annotation '{annotation}' has no entry for identifier '{id}'")]
    MissingIdentifier { annotation: String, id: String },

    #[error("Continuous annotation '{annotation}' holds a non-numeric value for '{id}'")]
    HeterogeneousAnnotation { annotation: String, id: String },

    #[error("Annotation '{annotation}' is not bound to the {axis} axis")]
    UnknownAnnotation { axis: Axis, annotation: String },

    #[error("Cannot derive a color range: the table holds no finite value")]
    EmptyRange,

    #[error("Invalid panel grid: {message}")]
    InvalidGrid { message: String },

    #[error("Invalid table: {message}")]
    InvalidTable { message: String },

    #[error("Invalid color '{value}'")]
    InvalidColor { value: String },

    #[error("Invalid palette: {message}")]
    InvalidPalette { message: String },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Parse error in {path:?} at line {line}: {message}")]
    Parse {
        path: PathBuf,
        line: usize,
        message: String,
    },

    #[error("Image error: {0}")]
    Image(#[from] image::ImageError),
}

pub type Result<T> = std::result::Result<T, HeatmapError>;

impl HeatmapError {
    pub fn clustering(message: impl Into<String>) -> Self {
        Self::Clustering {
            message: message.into(),
        }
    }

    pub fn invalid_order(axis: Axis, message: impl Into<String>) -> Self {
        Self::InvalidOrder {
            axis,
            message: message.into(),
        }
    }

    pub fn invalid_grid(message: impl Into<String>) -> Self {
        Self::InvalidGrid {
            message: message.into(),
        }
    }

    pub fn invalid_table(message: impl Into<String>) -> Self {
        Self::InvalidTable {
            message: message.into(),
        }
    }

    pub fn parse(path: impl Into<PathBuf>, line: usize, message: impl Into<String>) -> Self {
        Self::Parse {
            path: path.into(),
            line,
            message: message.into(),
        }
    }

    /// True for every failure of the clustering stage, degenerate input included.
    pub fn is_clustering_error(&self) -> bool {
        matches!(self, Self::Clustering { .. } | Self::DegenerateInput { .. })
    }
}
