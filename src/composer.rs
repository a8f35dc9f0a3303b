//! The heatmap composer: owns a table and its annotations, orders both axes,
//! derives colors and layout, then draws every panel on a [`Surface`].

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::annotation::{annotation_colors, AnnotationColors};
use crate::cluster::{validate_order, ClusterOrdering, LeafOrder, LinkageMethod, LinkageTree};
use crate::color::{resolve_color_bounds, ColorBounds, Colormap, Palette};
use crate::config::{AnnotationRequest, HeatmapOptions, LayoutOptions};
use crate::distance::DistanceMetric;
use crate::error::{HeatmapError, Result};
use crate::layout::{layout_panels, Panel, PanelGrid};
use crate::paint;
use crate::surface::Surface;
use crate::table::{AnnotationTable, Axis, Table, TableVersion};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ComposerState {
    Configured,
    Rendered,
}

/// Everything a cached tree depends on
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct LinkageKey {
    version: TableVersion,
    ordering: ClusterOrdering,
}

#[derive(Debug, Clone)]
struct CachedLinkage {
    key: LinkageKey,
    order: LeafOrder,
    tree: LinkageTree,
}

/// Order of one axis as resolved for a render
#[derive(Debug, Clone)]
struct ResolvedAxis {
    order: LeafOrder,
    ids: Vec<String>,
    /// Tree to draw, absent when the axis is not clustered
    tree: Option<LinkageTree>,
    /// Cache entry to commit once the render is validated
    fresh: Option<CachedLinkage>,
    from_cache: bool,
}

/// Colors of one drawn annotation track
#[derive(Debug, Clone, PartialEq)]
pub struct TrackColors {
    pub axis: Axis,
    pub name: String,
    pub colors: AnnotationColors,
}

/// What a successful render computed.
#[derive(Debug, Clone, PartialEq)]
pub struct RenderReport {
    pub row_ids: Vec<String>,
    pub column_ids: Vec<String>,
    pub bounds: ColorBounds,
    /// Column tracks first, then row tracks, each in request order
    pub tracks: Vec<TrackColors>,
    pub grid: PanelGrid,
    pub rows_from_cache: bool,
    pub columns_from_cache: bool,
}

/// Clustered heatmap composer.
///
/// Setters only record configuration and return the composer to
/// [`ComposerState::Configured`]. All work happens in [`render`], which
/// validates everything before the first draw call. Linkage trees are cached
/// per axis under a key made of the table digest and the clustering
/// parameters, so a stale tree is never reused.
///
/// [`render`]: HeatMapComposer::render
pub struct HeatMapComposer {
    table: Table,
    version: TableVersion,
    row_annotations: Option<AnnotationTable>,
    column_annotations: Option<AnnotationTable>,
    options: HeatmapOptions,
    state: ComposerState,
    linkages: FxHashMap<Axis, CachedLinkage>,
    linkage_runs: usize,
}

impl HeatMapComposer {
    pub fn new(table: Table, options: HeatmapOptions) -> Self {
        let version = table.version();
        HeatMapComposer {
            table,
            version,
            row_annotations: None,
            column_annotations: None,
            options,
            state: ComposerState::Configured,
            linkages: FxHashMap::default(),
            linkage_runs: 0,
        }
    }

    pub fn table(&self) -> &Table {
        &self.table
    }

    pub fn options(&self) -> &HeatmapOptions {
        &self.options
    }

    pub fn state(&self) -> ComposerState {
        self.state
    }

    /// Number of linkage trees actually computed so far
    pub fn linkage_computations(&self) -> usize {
        self.linkage_runs
    }

    fn configured(&mut self) -> &mut HeatmapOptions {
        self.state = ComposerState::Configured;
        &mut self.options
    }

    pub fn set_table(&mut self, table: Table) {
        self.version = table.version();
        self.table = table;
        self.state = ComposerState::Configured;
    }

    pub fn set_distance_metric(&mut self, metric: DistanceMetric) {
        self.configured().metric = metric;
    }

    pub fn set_linkage_method(&mut self, method: LinkageMethod) {
        self.configured().method = method;
    }

    pub fn set_row_clustering(&mut self, enabled: bool) {
        self.configured().cluster_rows = enabled;
    }

    pub fn set_column_clustering(&mut self, enabled: bool) {
        self.configured().cluster_columns = enabled;
    }

    /// Display order for rows while row clustering is off
    pub fn set_custom_row_order(&mut self, order: Option<Vec<String>>) {
        self.configured().custom_row_order = order;
    }

    /// Display order for columns while column clustering is off
    pub fn set_custom_column_order(&mut self, order: Option<Vec<String>>) {
        self.configured().custom_column_order = order;
    }

    pub fn set_optimal_ordering(&mut self, rows: bool, columns: bool) {
        let options = self.configured();
        options.optimal_row_ordering = rows;
        options.optimal_column_ordering = columns;
    }

    pub fn set_color_bounds(&mut self, vmin: Option<f64>, vmax: Option<f64>) {
        let options = self.configured();
        options.vmin = vmin;
        options.vmax = vmax;
    }

    pub fn set_symmetric_color_scale(&mut self, symmetric: bool, symmetry_point: f64) {
        let options = self.configured();
        options.symmetric = symmetric;
        options.symmetry_point = symmetry_point;
    }

    pub fn set_colormap(&mut self, colormap: Colormap) {
        self.configured().colormap = colormap;
    }

    /// Bind row annotations and choose which of their columns become tracks.
    pub fn set_row_annotations(&mut self, annotations: AnnotationTable, tracks: Vec<AnnotationRequest>) {
        self.row_annotations = Some(annotations);
        self.configured().row_annotations = tracks;
    }

    /// Bind column annotations and choose which of their columns become tracks.
    pub fn set_column_annotations(
        &mut self,
        annotations: AnnotationTable,
        tracks: Vec<AnnotationRequest>,
    ) {
        self.column_annotations = Some(annotations);
        self.configured().column_annotations = tracks;
    }

    pub fn set_palette(&mut self, palette: Palette) {
        self.configured().palette = palette;
    }

    pub fn set_show_labels(&mut self, rows: bool, columns: bool) {
        let options = self.configured();
        options.show_row_labels = rows;
        options.show_column_labels = columns;
    }

    pub fn set_plot_legend(&mut self, plot_legend: bool) {
        self.configured().plot_legend = plot_legend;
    }

    pub fn set_layout(&mut self, layout: LayoutOptions) {
        self.configured().layout = layout;
    }

    fn ordering(&self, axis: Axis) -> ClusterOrdering {
        let optimal = match axis {
            Axis::Rows => self.options.optimal_row_ordering,
            Axis::Columns => self.options.optimal_column_ordering,
        };
        ClusterOrdering::new(self.options.metric, self.options.method).with_optimal_ordering(optimal)
    }

    fn resolve_axis(&mut self, axis: Axis) -> Result<ResolvedAxis> {
        let (clustered, custom) = match axis {
            Axis::Rows => (self.options.cluster_rows, &self.options.custom_row_order),
            Axis::Columns => (self.options.cluster_columns, &self.options.custom_column_order),
        };
        let ids = self.table.ids(axis);

        if !clustered {
            let order = match custom {
                Some(custom) => validate_order(ids, axis, custom)?,
                None => LeafOrder::identity(ids.len()),
            };
            return Ok(ResolvedAxis {
                ids: order.ids(ids),
                order,
                tree: None,
                fresh: None,
                from_cache: false,
            });
        }

        let key = LinkageKey {
            version: self.version,
            ordering: self.ordering(axis),
        };
        if let Some(cached) = self.linkages.get(&axis).filter(|c| c.key == key) {
            debug!("Reusing cached {} linkage", axis);
            return Ok(ResolvedAxis {
                ids: cached.order.ids(ids),
                order: cached.order.clone(),
                tree: Some(cached.tree.clone()),
                fresh: None,
                from_cache: true,
            });
        }

        let (order, tree) = key.ordering.order(&self.table, axis)?;
        let resolved = ResolvedAxis {
            ids: order.ids(ids),
            order: order.clone(),
            tree: Some(tree.clone()),
            fresh: Some(CachedLinkage { key, order, tree }),
            from_cache: false,
        };
        self.linkage_runs += 1;
        Ok(resolved)
    }

    fn resolve_tracks(&self, axis: Axis, ordered_ids: &[String]) -> Result<Vec<TrackColors>> {
        let (annotations, requests) = match axis {
            Axis::Rows => (&self.row_annotations, &self.options.row_annotations),
            Axis::Columns => (&self.column_annotations, &self.options.column_annotations),
        };
        requests
            .iter()
            .map(|request| {
                let column = annotations
                    .as_ref()
                    .and_then(|a| a.column(&request.name))
                    .ok_or_else(|| HeatmapError::UnknownAnnotation {
                        axis,
                        annotation: request.name.clone(),
                    })?;
                let colors = annotation_colors(
                    ordered_ids,
                    column,
                    &self.options.palette,
                    request.colors.as_ref(),
                    request.colormap.unwrap_or_else(Colormap::gnbu_r),
                )?;
                Ok(TrackColors {
                    axis,
                    name: request.name.clone(),
                    colors,
                })
            })
            .collect()
    }

    /// Order, color, lay out and draw the figure on `surface`.
    ///
    /// Nothing is drawn and no cache entry changes unless every step before
    /// drawing succeeds.
    pub fn render(&mut self, surface: &mut dyn Surface) -> Result<RenderReport> {
        info!(
            "Rendering {} x {} heatmap",
            self.table.n_rows(),
            self.table.n_columns()
        );

        let rows = self.resolve_axis(Axis::Rows)?;
        let columns = self.resolve_axis(Axis::Columns)?;

        let bounds = resolve_color_bounds(
            &self.table,
            self.options.vmin,
            self.options.vmax,
            self.options.symmetric,
            self.options.symmetry_point,
        )?;
        debug!("Color bounds [{}, {}]", bounds.min, bounds.max);

        let mut tracks = self.resolve_tracks(Axis::Columns, &columns.ids)?;
        let column_tracks = tracks.len();
        tracks.extend(self.resolve_tracks(Axis::Rows, &rows.ids)?);
        let row_tracks = tracks.len() - column_tracks;

        let layout = &self.options.layout;
        let spec = layout.grid_spec(
            rows.tree.is_some(),
            row_tracks,
            columns.tree.is_some(),
            column_tracks,
            self.options.plot_legend,
        );
        let grid = layout_panels(&spec)?;
        debug!(
            "Panel grid {} x {}, figure {:?} mm",
            grid.n_rows(),
            grid.n_columns(),
            grid.figure_size()
        );

        // validated: commit new linkage trees before drawing
        for (axis, resolved) in [(Axis::Rows, &rows), (Axis::Columns, &columns)] {
            if let Some(fresh) = &resolved.fresh {
                self.linkages.insert(axis, fresh.clone());
            }
        }

        self.draw(surface, &grid, &rows, &columns, bounds, &tracks, column_tracks);

        self.state = ComposerState::Rendered;
        info!("Render complete");
        Ok(RenderReport {
            row_ids: rows.ids,
            column_ids: columns.ids,
            bounds,
            tracks,
            grid,
            rows_from_cache: rows.from_cache,
            columns_from_cache: columns.from_cache,
        })
    }

    #[allow(clippy::too_many_arguments)]
    fn draw(
        &self,
        surface: &mut dyn Surface,
        grid: &PanelGrid,
        rows: &ResolvedAxis,
        columns: &ResolvedAxis,
        bounds: ColorBounds,
        tracks: &[TrackColors],
        column_tracks: usize,
    ) {
        let layout = &self.options.layout;
        let (width, height) = grid.figure_size();
        surface.begin(width, height);

        if let (Some(tree), Some(rect)) = (&columns.tree, grid.rect(Panel::ColumnDendrogram)) {
            paint::paint_dendrogram(surface, rect, tree, &columns.order, Axis::Columns, layout.line_width);
        }
        for (i, track) in tracks[..column_tracks].iter().enumerate() {
            if let Some(rect) = grid.rect(Panel::ColumnAnnotation(i)) {
                paint::paint_annotation_track(surface, rect, &track.name, &track.colors, Axis::Columns, layout);
            }
        }
        if let (Some(tree), Some(rect)) = (&rows.tree, grid.rect(Panel::RowDendrogram)) {
            paint::paint_dendrogram(surface, rect, tree, &rows.order, Axis::Rows, layout.line_width);
        }
        for (i, track) in tracks[column_tracks..].iter().enumerate() {
            if let Some(rect) = grid.rect(Panel::RowAnnotation(i)) {
                paint::paint_annotation_track(surface, rect, &track.name, &track.colors, Axis::Rows, layout);
            }
        }

        if let Some(rect) = grid.rect(Panel::Heatmap) {
            paint::paint_heatmap(
                surface,
                rect,
                &self.table,
                &rows.order,
                &columns.order,
                bounds,
                &self.options.colormap,
            );
            paint::paint_tick_labels(
                surface,
                rect,
                self.options.show_row_labels.then_some(rows.ids.as_slice()),
                self.options.show_column_labels.then_some(columns.ids.as_slice()),
                layout,
            );
        }

        if let Some(rect) = grid.rect(Panel::Legend) {
            let legends: Vec<(&str, &AnnotationColors)> = tracks
                .iter()
                .map(|t| (t.name.as_str(), &t.colors))
                .collect();
            let indent = if self.options.show_row_labels {
                paint::row_label_width(layout.font_size)
            } else {
                0.0
            };
            paint::paint_legend(surface, rect, &self.options.colormap, bounds, &legends, indent, layout);
        }
    }

    /// Cut the linkage tree of a rendered axis into at most `k` flat clusters.
    ///
    /// Returns `(identifier, cluster)` pairs in display order.
    pub fn flat_clusters(&self, axis: Axis, k: usize) -> Result<Vec<(String, usize)>> {
        let key = LinkageKey {
            version: self.version,
            ordering: self.ordering(axis),
        };
        let cached = self
            .linkages
            .get(&axis)
            .filter(|c| c.key == key)
            .ok_or_else(|| {
                HeatmapError::clustering(format!(
                    "no {} linkage for the current configuration; render first",
                    axis
                ))
            })?;
        let clusters = cached.tree.flat_clusters(k);
        let ids = self.table.ids(axis);
        Ok(cached
            .order
            .indices()
            .iter()
            .map(|&i| (ids[i].clone(), clusters[i]))
            .collect())
    }
}
