//! Panel grid: places dendrograms, annotation tracks, the heatmap body and
//! the legend on one shared millimetre coordinate system.
//!
//! Every grid row and column owns one `[start, end]` interval. Panels copy
//! their edges straight from those intervals, so two panels sharing a row or
//! a column always report bit-identical boundaries.

use crate::error::{HeatmapError, Result};

/// Axis-aligned rectangle in millimetres, origin top-left, y growing downward
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x0: f64,
    pub y0: f64,
    pub x1: f64,
    pub y1: f64,
}

impl Rect {
    pub fn new(x0: f64, y0: f64, x1: f64, y1: f64) -> Self {
        Rect { x0, y0, x1, y1 }
    }

    pub fn width(&self) -> f64 {
        self.x1 - self.x0
    }

    pub fn height(&self) -> f64 {
        self.y1 - self.y0
    }

    /// Same rectangle as fractions of a `(width, height)` figure
    pub fn to_unit(&self, figure: (f64, f64)) -> Rect {
        let (w, h) = figure;
        Rect {
            x0: self.x0 / w,
            y0: self.y0 / h,
            x1: self.x1 / w,
            y1: self.y1 / h,
        }
    }

    /// Sub-rectangle for slot `i` of `n` equal slots along x
    pub fn column_slot(&self, i: usize, n: usize) -> Rect {
        let step = self.width() / n as f64;
        Rect::new(
            self.x0 + step * i as f64,
            self.y0,
            self.x0 + step * (i + 1) as f64,
            self.y1,
        )
    }

    /// Sub-rectangle for slot `i` of `n` equal slots along y
    pub fn row_slot(&self, i: usize, n: usize) -> Rect {
        let step = self.height() / n as f64;
        Rect::new(
            self.x0,
            self.y0 + step * i as f64,
            self.x1,
            self.y0 + step * (i + 1) as f64,
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Margins {
    pub left: f64,
    pub right: f64,
    pub top: f64,
    pub bottom: f64,
}

impl Margins {
    pub fn uniform(mm: f64) -> Self {
        Margins {
            left: mm,
            right: mm,
            top: mm,
            bottom: mm,
        }
    }
}

/// Which panels are present and how large they are.
///
/// `None` extents mean the panel is absent. Track extents are per track and
/// only checked when the axis has at least one track.
#[derive(Debug, Clone, PartialEq)]
pub struct GridSpec {
    /// Height of the dendrogram above the heatmap
    pub column_dendrogram: Option<f64>,
    pub column_tracks: usize,
    pub column_track_extent: f64,
    /// Width of the dendrogram left of the heatmap
    pub row_dendrogram: Option<f64>,
    pub row_tracks: usize,
    pub row_track_extent: f64,
    pub heatmap_width: f64,
    pub heatmap_height: f64,
    pub legend: Option<f64>,
    pub horizontal_spacing: f64,
    pub vertical_spacing: f64,
    pub margins: Margins,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Panel {
    ColumnDendrogram,
    ColumnAnnotation(usize),
    RowDendrogram,
    RowAnnotation(usize),
    Heatmap,
    Legend,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlacedPanel {
    pub panel: Panel,
    pub row: usize,
    pub column: usize,
    pub rect: Rect,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PanelGrid {
    rows: Vec<(f64, f64)>,
    columns: Vec<(f64, f64)>,
    panels: Vec<PlacedPanel>,
    width: f64,
    height: f64,
}

impl PanelGrid {
    pub fn n_rows(&self) -> usize {
        self.rows.len()
    }

    pub fn n_columns(&self) -> usize {
        self.columns.len()
    }

    /// `(start, end)` of every grid row, top to bottom
    pub fn row_bounds(&self) -> &[(f64, f64)] {
        &self.rows
    }

    /// `(start, end)` of every grid column, left to right
    pub fn column_bounds(&self) -> &[(f64, f64)] {
        &self.columns
    }

    pub fn panels(&self) -> &[PlacedPanel] {
        &self.panels
    }

    pub fn rect(&self, panel: Panel) -> Option<Rect> {
        self.placed(panel).map(|p| p.rect)
    }

    /// `(row, column)` cell of a panel
    pub fn cell(&self, panel: Panel) -> Option<(usize, usize)> {
        self.placed(panel).map(|p| (p.row, p.column))
    }

    /// Total figure `(width, height)` in millimetres, margins included
    pub fn figure_size(&self) -> (f64, f64) {
        (self.width, self.height)
    }

    fn placed(&self, panel: Panel) -> Option<&PlacedPanel> {
        self.panels.iter().find(|p| p.panel == panel)
    }
}

fn check_extent(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value <= 0.0 {
        return Err(HeatmapError::invalid_grid(format!(
            "{} must be a positive finite size, got {}",
            name, value
        )));
    }
    Ok(())
}

fn check_gap(name: &str, value: f64) -> Result<()> {
    if !value.is_finite() || value < 0.0 {
        return Err(HeatmapError::invalid_grid(format!(
            "{} must be finite and non-negative, got {}",
            name, value
        )));
    }
    Ok(())
}

/// A track extent must be positive with tracks and zero without them.
fn check_tracks(name: &str, tracks: usize, extent: f64) -> Result<()> {
    if tracks > 0 {
        return check_extent(name, extent);
    }
    if extent != 0.0 {
        return Err(HeatmapError::invalid_grid(format!(
            "{} is {} but no tracks are requested",
            name, extent
        )));
    }
    Ok(())
}

fn validate(spec: &GridSpec) -> Result<()> {
    if let Some(h) = spec.column_dendrogram {
        check_extent("column dendrogram height", h)?;
    }
    if let Some(w) = spec.row_dendrogram {
        check_extent("row dendrogram width", w)?;
    }
    check_tracks("column annotation extent", spec.column_tracks, spec.column_track_extent)?;
    check_tracks("row annotation extent", spec.row_tracks, spec.row_track_extent)?;
    check_extent("heatmap width", spec.heatmap_width)?;
    check_extent("heatmap height", spec.heatmap_height)?;
    if let Some(w) = spec.legend {
        check_extent("legend width", w)?;
    }
    check_gap("horizontal spacing", spec.horizontal_spacing)?;
    check_gap("vertical spacing", spec.vertical_spacing)?;
    check_gap("left margin", spec.margins.left)?;
    check_gap("right margin", spec.margins.right)?;
    check_gap("top margin", spec.margins.top)?;
    check_gap("bottom margin", spec.margins.bottom)?;
    Ok(())
}

/// Lay extents end to end from `start`, one `spacing` between neighbours.
/// Returns the intervals and the position of the last end.
fn intervals(start: f64, extents: &[f64], spacing: f64) -> (Vec<(f64, f64)>, f64) {
    let mut out = Vec::with_capacity(extents.len());
    let mut cursor = start;
    let mut end = start;
    for (i, extent) in extents.iter().enumerate() {
        if i > 0 {
            cursor = end + spacing;
        }
        end = cursor + extent;
        out.push((cursor, end));
    }
    (out, end)
}

/// Compute the panel grid for `spec`.
pub fn layout_panels(spec: &GridSpec) -> Result<PanelGrid> {
    validate(spec)?;

    let mut row_extents = Vec::new();
    let mut row_kinds = Vec::new();
    if let Some(h) = spec.column_dendrogram {
        row_extents.push(h);
        row_kinds.push(Panel::ColumnDendrogram);
    }
    for i in 0..spec.column_tracks {
        row_extents.push(spec.column_track_extent);
        row_kinds.push(Panel::ColumnAnnotation(i));
    }
    let heatmap_row = row_extents.len();
    row_extents.push(spec.heatmap_height);

    let mut column_extents = Vec::new();
    let mut column_kinds = Vec::new();
    if let Some(w) = spec.row_dendrogram {
        column_extents.push(w);
        column_kinds.push(Panel::RowDendrogram);
    }
    for i in 0..spec.row_tracks {
        column_extents.push(spec.row_track_extent);
        column_kinds.push(Panel::RowAnnotation(i));
    }
    let heatmap_column = column_extents.len();
    column_extents.push(spec.heatmap_width);
    let legend_column = spec.legend.map(|w| {
        column_extents.push(w);
        column_extents.len() - 1
    });

    let (rows, bottom) = intervals(spec.margins.top, &row_extents, spec.vertical_spacing);
    let (columns, right) =
        intervals(spec.margins.left, &column_extents, spec.horizontal_spacing);

    let cell = |r: usize, c: usize| Rect::new(columns[c].0, rows[r].0, columns[c].1, rows[r].1);
    let mut panels = Vec::with_capacity(row_kinds.len() + column_kinds.len() + 2);
    for (r, panel) in row_kinds.into_iter().enumerate() {
        panels.push(PlacedPanel {
            panel,
            row: r,
            column: heatmap_column,
            rect: cell(r, heatmap_column),
        });
    }
    for (c, panel) in column_kinds.into_iter().enumerate() {
        panels.push(PlacedPanel {
            panel,
            row: heatmap_row,
            column: c,
            rect: cell(heatmap_row, c),
        });
    }
    panels.push(PlacedPanel {
        panel: Panel::Heatmap,
        row: heatmap_row,
        column: heatmap_column,
        rect: cell(heatmap_row, heatmap_column),
    });
    if let Some(c) = legend_column {
        panels.push(PlacedPanel {
            panel: Panel::Legend,
            row: heatmap_row,
            column: c,
            rect: cell(heatmap_row, c),
        });
    }

    Ok(PanelGrid {
        width: right + spec.margins.right,
        height: bottom + spec.margins.bottom,
        rows,
        columns,
        panels,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    #[fixture]
    fn spec() -> GridSpec {
        GridSpec {
            column_dendrogram: Some(15.0),
            column_tracks: 1,
            column_track_extent: 2.0,
            row_dendrogram: Some(15.0),
            row_tracks: 2,
            row_track_extent: 2.0,
            heatmap_width: 50.0,
            heatmap_height: 40.0,
            legend: Some(30.0),
            horizontal_spacing: 1.0,
            vertical_spacing: 1.0,
            margins: Margins::uniform(25.0),
        }
    }

    #[rstest]
    fn grid_shape_follows_enabled_panels(spec: GridSpec) {
        let grid = layout_panels(&spec).unwrap();
        assert_eq!(grid.n_rows(), 3);
        assert_eq!(grid.n_columns(), 5);
        assert_eq!(grid.cell(Panel::Heatmap), Some((2, 3)));
        assert_eq!(grid.cell(Panel::Legend), Some((2, 4)));
        assert_eq!(grid.cell(Panel::RowAnnotation(1)), Some((2, 2)));
        assert_eq!(grid.cell(Panel::ColumnDendrogram), Some((0, 3)));
    }

    #[rstest]
    #[case(1.0)]
    #[case(0.0)]
    fn heatmap_follows_last_row_track_exactly(mut spec: GridSpec, #[case] spacing: f64) {
        spec.horizontal_spacing = spacing;
        let grid = layout_panels(&spec).unwrap();
        let heatmap = grid.rect(Panel::Heatmap).unwrap();
        let last_track = grid.rect(Panel::RowAnnotation(1)).unwrap();
        assert_eq!(heatmap.x0, last_track.x1 + spacing);
        if spacing == 0.0 {
            assert_eq!(heatmap.x0, last_track.x1);
        }

        let dendrogram = grid.rect(Panel::ColumnDendrogram).unwrap();
        assert_eq!(dendrogram.x0, heatmap.x0);
        assert_eq!(dendrogram.x1, heatmap.x1);

        let row_dendrogram = grid.rect(Panel::RowDendrogram).unwrap();
        assert_eq!(row_dendrogram.y0, heatmap.y0);
        assert_eq!(row_dendrogram.y1, heatmap.y1);
    }

    #[rstest]
    fn figure_size_sums_extents_spacing_and_margins(spec: GridSpec) {
        let grid = layout_panels(&spec).unwrap();
        // 15 + 2 + 2 + 50 + 30, four gaps, two margins
        assert_eq!(grid.figure_size(), (25.0 + 99.0 + 4.0 + 25.0, 25.0 + 57.0 + 2.0 + 25.0));
        let unit = grid.rect(Panel::Heatmap).unwrap().to_unit(grid.figure_size());
        assert!(unit.x0 > 0.0 && unit.x1 < 1.0);
    }

    #[rstest]
    fn bare_heatmap_is_a_single_cell(mut spec: GridSpec) {
        spec.column_dendrogram = None;
        spec.column_tracks = 0;
        spec.row_dendrogram = None;
        spec.row_tracks = 0;
        spec.legend = None;
        spec.column_track_extent = 0.0;
        spec.row_track_extent = 0.0;
        let grid = layout_panels(&spec).unwrap();
        assert_eq!((grid.n_rows(), grid.n_columns()), (1, 1));
        assert_eq!(
            grid.rect(Panel::Heatmap),
            Some(Rect::new(25.0, 25.0, 75.0, 65.0))
        );
        assert_eq!(grid.rect(Panel::Legend), None);
    }

    #[rstest]
    #[case::zero_heatmap(|s: &mut GridSpec| s.heatmap_width = 0.0)]
    #[case::nan_dendrogram(|s: &mut GridSpec| s.row_dendrogram = Some(f64::NAN))]
    #[case::zero_track(|s: &mut GridSpec| s.column_track_extent = 0.0)]
    #[case::extent_without_tracks(|s: &mut GridSpec| s.row_tracks = 0)]
    #[case::nan_extent_without_tracks(|s: &mut GridSpec| {
        s.column_tracks = 0;
        s.column_track_extent = f64::NAN;
    })]
    #[case::negative_spacing(|s: &mut GridSpec| s.vertical_spacing = -1.0)]
    #[case::infinite_margin(|s: &mut GridSpec| s.margins.left = f64::INFINITY)]
    fn invalid_sizes_are_rejected(mut spec: GridSpec, #[case] edit: fn(&mut GridSpec)) {
        edit(&mut spec);
        let err = layout_panels(&spec).unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidGrid { .. }));
    }

    #[test]
    fn slots_split_evenly() {
        let r = Rect::new(0.0, 0.0, 10.0, 4.0);
        assert_eq!(r.column_slot(1, 5), Rect::new(2.0, 0.0, 4.0, 4.0));
        assert_eq!(r.row_slot(3, 4), Rect::new(0.0, 3.0, 10.0, 4.0));
    }
}
