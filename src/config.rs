//! Composer configuration.

use rustc_hash::FxHashMap;

use crate::cluster::LinkageMethod;
use crate::color::{Colormap, Palette, Rgb};
use crate::distance::DistanceMetric;
use crate::layout::{GridSpec, Margins};

/// One annotation column to draw as a track.
#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationRequest {
    pub name: String,
    /// Fixed colors for categorical groups; unlisted groups use the palette
    pub colors: Option<FxHashMap<String, Rgb>>,
    /// Colormap of a continuous column, `GnBu_r` when unset
    pub colormap: Option<Colormap>,
}

impl AnnotationRequest {
    pub fn new(name: impl Into<String>) -> Self {
        AnnotationRequest {
            name: name.into(),
            colors: None,
            colormap: None,
        }
    }

    pub fn with_colors(mut self, colors: FxHashMap<String, Rgb>) -> Self {
        self.colors = Some(colors);
        self
    }

    pub fn with_colormap(mut self, colormap: Colormap) -> Self {
        self.colormap = Some(colormap);
        self
    }
}

/// Physical sizes in millimetres.
#[derive(Debug, Clone, PartialEq)]
pub struct LayoutOptions {
    pub heatmap_width: f64,
    pub heatmap_height: f64,
    /// Thickness of one annotation track
    pub annotation_extent: f64,
    /// Depth of a dendrogram panel
    pub dendrogram_extent: f64,
    pub legend_width: f64,
    pub horizontal_spacing: f64,
    pub vertical_spacing: f64,
    pub margins: Margins,
    /// Glyph height of tick labels and legend text
    pub font_size: f64,
    pub line_width: f64,
}

impl Default for LayoutOptions {
    fn default() -> Self {
        LayoutOptions {
            heatmap_width: 50.0,
            heatmap_height: 50.0,
            annotation_extent: 2.0,
            dendrogram_extent: 15.0,
            legend_width: 30.0,
            horizontal_spacing: 1.0,
            vertical_spacing: 1.0,
            margins: Margins::uniform(25.0),
            font_size: 2.0,
            line_width: 0.25,
        }
    }
}

impl LayoutOptions {
    /// Grid for the given set of panels
    pub fn grid_spec(
        &self,
        row_dendrogram: bool,
        row_tracks: usize,
        column_dendrogram: bool,
        column_tracks: usize,
        legend: bool,
    ) -> GridSpec {
        GridSpec {
            column_dendrogram: column_dendrogram.then_some(self.dendrogram_extent),
            column_tracks,
            column_track_extent: if column_tracks > 0 { self.annotation_extent } else { 0.0 },
            row_dendrogram: row_dendrogram.then_some(self.dendrogram_extent),
            row_tracks,
            row_track_extent: if row_tracks > 0 { self.annotation_extent } else { 0.0 },
            heatmap_width: self.heatmap_width,
            heatmap_height: self.heatmap_height,
            legend: legend.then_some(self.legend_width),
            horizontal_spacing: self.horizontal_spacing,
            vertical_spacing: self.vertical_spacing,
            margins: self.margins,
        }
    }
}

/// Everything the composer needs besides the tables.
#[derive(Debug, Clone, PartialEq)]
pub struct HeatmapOptions {
    pub metric: DistanceMetric,
    pub method: LinkageMethod,
    pub cluster_rows: bool,
    pub cluster_columns: bool,
    /// Used instead of the table order when the axis is not clustered
    pub custom_row_order: Option<Vec<String>>,
    pub custom_column_order: Option<Vec<String>>,
    pub optimal_row_ordering: bool,
    pub optimal_column_ordering: bool,
    pub vmin: Option<f64>,
    pub vmax: Option<f64>,
    pub symmetric: bool,
    pub symmetry_point: f64,
    pub colormap: Colormap,
    pub palette: Palette,
    pub row_annotations: Vec<AnnotationRequest>,
    pub column_annotations: Vec<AnnotationRequest>,
    pub show_row_labels: bool,
    pub show_column_labels: bool,
    pub plot_legend: bool,
    pub layout: LayoutOptions,
}

impl Default for HeatmapOptions {
    fn default() -> Self {
        HeatmapOptions {
            metric: DistanceMetric::Correlation,
            method: LinkageMethod::Complete,
            cluster_rows: true,
            cluster_columns: true,
            custom_row_order: None,
            custom_column_order: None,
            optimal_row_ordering: true,
            optimal_column_ordering: true,
            vmin: None,
            vmax: None,
            symmetric: false,
            symmetry_point: 0.0,
            colormap: Colormap::seismic(),
            palette: Palette::default(),
            row_annotations: Vec::new(),
            column_annotations: Vec::new(),
            show_row_labels: false,
            show_column_labels: false,
            plot_legend: true,
            layout: LayoutOptions::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::layout::layout_panels;

    #[test]
    fn defaults_give_a_valid_grid() {
        let opts = HeatmapOptions::default();
        let spec = opts.layout.grid_spec(true, 1, true, 0, opts.plot_legend);
        assert_eq!(spec.row_track_extent, 2.0);
        assert_eq!(spec.column_track_extent, 0.0);
        let grid = layout_panels(&spec).unwrap();
        assert_eq!((grid.n_rows(), grid.n_columns()), (2, 4));
        assert_eq!(opts.metric, DistanceMetric::Correlation);
        assert_eq!(opts.colormap.name(), "seismic");
    }
}
