//! Clustered heatmaps.
//!
//! A [`HeatMapComposer`] orders the rows and columns of a [`Table`] by
//! hierarchical clustering, resolves a color scale, colors annotation tracks
//! and lays every panel out on one shared grid before drawing on a
//! [`Surface`].

pub mod annotation;
pub mod cluster;
pub mod color;
pub mod composer;
pub mod config;
pub mod distance;
pub mod error;
pub mod font;
pub mod io;
pub mod layout;
pub mod paint;
pub mod surface;
pub mod table;

pub use annotation::{assign_group_colors, continuous_range, AnnotationColors, GroupColors};
pub use cluster::{compute_order, ClusterOrdering, LeafOrder, LinkageMethod, LinkageTree};
pub use color::{resolve_color_bounds, ColorBounds, Colormap, Palette, Rgb};
pub use composer::{ComposerState, HeatMapComposer, RenderReport, TrackColors};
pub use config::{AnnotationRequest, HeatmapOptions, LayoutOptions};
pub use distance::DistanceMetric;
pub use error::{HeatmapError, Result};
pub use layout::{layout_panels, GridSpec, Margins, Panel, PanelGrid, Rect};
pub use surface::{PixelCanvas, RecordingSurface, Surface, SvgCanvas, TextSpec};
pub use table::{AnnotationKind, AnnotationTable, AnnotationValue, Axis, Table};
