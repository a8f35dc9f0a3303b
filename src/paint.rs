//! Painters: turn orders, bounds and group colors into draw calls inside the
//! rectangle of one panel.
//!
//! Item `i` of a displayed axis always occupies slot `i` of its panel, counted
//! from the left for columns and from the top for rows.

use crate::annotation::AnnotationColors;
use crate::cluster::{LeafOrder, LinkageTree};
use crate::color::{ColorBounds, Colormap, Rgb};
use crate::config::LayoutOptions;
use crate::layout::Rect;
use crate::surface::{Anchor, Surface, TextSpec};
use crate::table::{Axis, Table};

/// Steps of a drawn color bar
const GRADIENT_STEPS: usize = 64;

/// Characters kept from a row label before it is cut
pub const ROW_LABEL_CHARS: usize = 12;

/// Width taken by one character of text at `size`
fn char_width(size: f64) -> f64 {
    size * 6.0 / 8.0
}

/// Horizontal room taken by row labels
pub fn row_label_width(font_size: f64) -> f64 {
    font_size / 4.0 + ROW_LABEL_CHARS as f64 * char_width(font_size)
}

/// Tick label with two decimals, keeping one decimal on whole numbers
pub fn format_tick(value: f64) -> String {
    let rounded = (value * 100.0).round() / 100.0;
    if rounded.fract() == 0.0 {
        format!("{:.1}", rounded)
    } else {
        format!("{}", rounded)
    }
}

/// Draw a dendrogram with its leaves against the heatmap.
///
/// Column dendrograms sit above the heatmap with the root at the top; row
/// dendrograms sit left of it with the root at the left edge.
pub fn paint_dendrogram(
    surface: &mut dyn Surface,
    rect: Rect,
    tree: &LinkageTree,
    order: &LeafOrder,
    axis: Axis,
    line_width: f64,
) {
    let n = tree.observations();
    if tree.is_empty() || order.len() != n {
        return;
    }

    // leaf centre along the shared axis, merge height across it
    let mut centre = vec![0.0; n + tree.merges().len()];
    for (slot, &leaf) in order.indices().iter().enumerate() {
        centre[leaf] = slot as f64 + 0.5;
    }
    for (i, merge) in tree.merges().iter().enumerate() {
        centre[n + i] = (centre[merge.left] + centre[merge.right]) / 2.0;
    }

    let top = tree.max_height();
    let point = |along: f64, height: f64| -> (f64, f64) {
        let depth = if top > 0.0 { height / top } else { 0.0 };
        match axis {
            Axis::Columns => (
                rect.x0 + rect.width() * along / n as f64,
                rect.y1 - rect.height() * depth,
            ),
            Axis::Rows => (
                rect.x1 - rect.width() * depth,
                rect.y0 + rect.height() * along / n as f64,
            ),
        }
    };

    for (i, merge) in tree.merges().iter().enumerate() {
        let node = n + i;
        let h = tree.height(node);
        let u = [
            point(centre[merge.left], tree.height(merge.left)),
            point(centre[merge.left], h),
            point(centre[merge.right], h),
            point(centre[merge.right], tree.height(merge.right)),
        ];
        surface.polyline(&u, Rgb::BLACK, line_width);
    }
}

/// Draw one annotation track and its name.
pub fn paint_annotation_track(
    surface: &mut dyn Surface,
    rect: Rect,
    name: &str,
    colors: &AnnotationColors,
    axis: Axis,
    layout: &LayoutOptions,
) {
    let cells = colors.cells();
    let n = cells.len();
    for (i, color) in cells.iter().enumerate() {
        let cell = match axis {
            Axis::Columns => rect.column_slot(i, n),
            Axis::Rows => rect.row_slot(i, n),
        };
        surface.fill_rect(cell, *color);
    }

    let label = match axis {
        Axis::Columns => TextSpec::new(
            name,
            rect.x1 + layout.horizontal_spacing,
            (rect.y0 + rect.y1) / 2.0,
            layout.font_size,
        ),
        Axis::Rows => TextSpec::new(
            name,
            (rect.x0 + rect.x1) / 2.0,
            rect.y1 + layout.vertical_spacing,
            layout.font_size,
        )
        .vertical()
        .anchor(Anchor::End),
    };
    surface.text(&label);
}

/// Draw the heatmap body in display order.
pub fn paint_heatmap(
    surface: &mut dyn Surface,
    rect: Rect,
    table: &Table,
    rows: &LeafOrder,
    columns: &LeafOrder,
    bounds: ColorBounds,
    colormap: &Colormap,
) {
    let (n_rows, n_columns) = (rows.len(), columns.len());
    for (i, &r) in rows.indices().iter().enumerate() {
        let band = rect.row_slot(i, n_rows);
        for (j, &c) in columns.indices().iter().enumerate() {
            surface.fill_rect(band.column_slot(j, n_columns), colormap.color(table.value(r, c), bounds));
        }
    }
}

/// Row labels right of the heatmap, column labels below it.
pub fn paint_tick_labels(
    surface: &mut dyn Surface,
    rect: Rect,
    row_ids: Option<&[String]>,
    column_ids: Option<&[String]>,
    layout: &LayoutOptions,
) {
    let gap = layout.font_size / 4.0;
    if let Some(ids) = row_ids {
        for (i, id) in ids.iter().enumerate() {
            let slot = rect.row_slot(i, ids.len());
            let spec = TextSpec::new(id.as_str(), rect.x1 + gap, (slot.y0 + slot.y1) / 2.0, layout.font_size)
                .max_chars(ROW_LABEL_CHARS);
            surface.text(&spec);
        }
    }
    if let Some(ids) = column_ids {
        for (j, id) in ids.iter().enumerate() {
            let slot = rect.column_slot(j, ids.len());
            let spec = TextSpec::new(id.as_str(), (slot.x0 + slot.x1) / 2.0, rect.y1 + gap, layout.font_size)
                .vertical()
                .anchor(Anchor::End);
            surface.text(&spec);
        }
    }
}

/// Horizontal color bar with its end labels below.
fn paint_color_bar(
    surface: &mut dyn Surface,
    bar: Rect,
    colormap: &Colormap,
    range: Option<ColorBounds>,
    font_size: f64,
) {
    for step in 0..GRADIENT_STEPS {
        let t = (step as f64 + 0.5) / GRADIENT_STEPS as f64;
        surface.fill_rect(bar.column_slot(step, GRADIENT_STEPS), colormap.sample(t));
    }
    if let Some(bounds) = range {
        let y = bar.y1 + font_size * 0.75;
        surface.text(&TextSpec::new(format_tick(bounds.min), bar.x0, y, font_size));
        surface.text(&TextSpec::new(format_tick(bounds.max), bar.x1, y, font_size).anchor(Anchor::End));
    }
}

/// Draw the color scale and one legend block per annotation track.
///
/// `indent` shifts the content right, e.g. past row labels.
pub fn paint_legend(
    surface: &mut dyn Surface,
    rect: Rect,
    colormap: &Colormap,
    bounds: ColorBounds,
    annotations: &[(&str, &AnnotationColors)],
    indent: f64,
    layout: &LayoutOptions,
) {
    let size = layout.font_size;
    let line = size * 1.5;
    let x = rect.x0 + indent;
    let bar_width = (rect.x1 - x).max(size * 4.0);
    let mut y = rect.y0 + size / 2.0;

    surface.text(&TextSpec::new("Values", x + bar_width / 2.0, y, size).anchor(Anchor::Middle));
    y += line;
    paint_color_bar(surface, Rect::new(x, y - size / 2.0, x + bar_width, y + size / 2.0), colormap, Some(bounds), size);
    y += line * 2.0;

    for (name, colors) in annotations {
        surface.text(&TextSpec::new(*name, x, y, size));
        y += line;
        match colors {
            AnnotationColors::Categorical(groups) => {
                let max_chars = ((bar_width - line) / char_width(size)).floor().max(1.0) as usize;
                for patch in &groups.patches {
                    let swatch = Rect::new(x, y - size / 2.0, x + size, y + size / 2.0);
                    surface.fill_rect(swatch, patch.color);
                    // outline white swatches
                    if patch.color == Rgb::WHITE {
                        let outline = [
                            (swatch.x0, swatch.y0),
                            (swatch.x1, swatch.y0),
                            (swatch.x1, swatch.y1),
                            (swatch.x0, swatch.y1),
                            (swatch.x0, swatch.y0),
                        ];
                        surface.polyline(&outline, Rgb::BLACK, layout.line_width / 2.0);
                    }
                    surface.text(&TextSpec::new(patch.label.as_str(), x + line, y, size).max_chars(max_chars));
                    y += line;
                }
            }
            AnnotationColors::Continuous(continuous) => {
                let bar = Rect::new(x, y - size / 2.0, x + bar_width, y + size / 2.0);
                paint_color_bar(surface, bar, &continuous.colormap, continuous.range, size);
                y += line * 2.0;
            }
        }
        y += line / 2.0;
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::annotation::{GroupColors, LegendPatch};
    use crate::cluster::{ClusterOrdering, LinkageMethod};
    use crate::distance::DistanceMetric;
    use crate::surface::{DrawCall, RecordingSurface};

    fn table() -> Table {
        Table::from_rows(
            ["a", "b", "c"],
            ["x", "y"],
            vec![vec![0.0, 0.0], vec![10.0, 0.0], vec![1.0, 0.0]],
        )
        .unwrap()
    }

    #[test]
    fn ticks_round_to_two_decimals() {
        assert_eq!(format_tick(-5.0), "-5.0");
        assert_eq!(format_tick(0.12345), "0.12");
        assert_eq!(format_tick(2.999), "3.0");
    }

    #[test]
    fn dendrogram_draws_one_u_per_merge_inside_its_panel() {
        let t = table();
        let (order, tree) = ClusterOrdering::new(DistanceMetric::Euclidean, LinkageMethod::Single)
            .order(&t, Axis::Rows)
            .unwrap();
        let rect = Rect::new(10.0, 20.0, 25.0, 50.0);
        let mut rec = RecordingSurface::new();
        paint_dendrogram(&mut rec, rect, &tree, &order, Axis::Rows, 0.25);

        let lines: Vec<&Vec<(f64, f64)>> = rec
            .calls
            .iter()
            .filter_map(|c| match c {
                DrawCall::Polyline { points, .. } => Some(points),
                _ => None,
            })
            .collect();
        assert_eq!(lines.len(), 2);
        for (x, y) in lines.iter().flat_map(|l| l.iter()) {
            assert!(*x >= rect.x0 && *x <= rect.x1);
            assert!(*y >= rect.y0 && *y <= rect.y1);
        }
        // the root reaches the far edge, leaves touch the heatmap side
        let root = lines[1];
        assert_eq!(root[1].0, rect.x0);
        assert_eq!(root[3].0, lines[0][1].0);
        assert!(lines[0].iter().any(|p| p.0 == rect.x1));
    }

    #[test]
    fn heatmap_cells_follow_display_order() {
        let t = table();
        let rows = crate::cluster::validate_order(t.ids(Axis::Rows), Axis::Rows, &["b".into(), "a".into(), "c".into()])
            .unwrap();
        let columns = LeafOrder::identity(2);
        let bounds = ColorBounds { min: 0.0, max: 10.0 };
        let greys: Colormap = "Greys".parse().unwrap();
        let mut rec = RecordingSurface::new();
        paint_heatmap(&mut rec, Rect::new(0.0, 0.0, 2.0, 3.0), &t, &rows, &columns, bounds, &greys);

        let rects: Vec<_> = rec.rects().collect();
        assert_eq!(rects.len(), 6);
        assert_eq!(*rects[0].0, Rect::new(0.0, 0.0, 1.0, 1.0));
        assert_eq!(*rects[0].1, Rgb::BLACK);
        assert_eq!(*rects[2].1, Rgb::WHITE);
    }

    #[test]
    fn legend_lists_scale_then_patches() {
        let groups = AnnotationColors::Categorical(GroupColors {
            groups: vec![("B".into(), Rgb(1, 2, 3))],
            patches: vec![
                LegendPatch { label: "singleton".into(), color: Rgb::WHITE },
                LegendPatch { label: "B".into(), color: Rgb(1, 2, 3) },
            ],
            cells: vec![Rgb::WHITE, Rgb(1, 2, 3), Rgb(1, 2, 3)],
        });
        let mut rec = RecordingSurface::new();
        paint_legend(
            &mut rec,
            Rect::new(0.0, 0.0, 30.0, 50.0),
            &Colormap::seismic(),
            ColorBounds { min: -5.0, max: 5.0 },
            &[("group", &groups)],
            0.0,
            &LayoutOptions::default(),
        );
        let texts: Vec<&str> = rec.texts().map(|t| t.text.as_str()).collect();
        assert_eq!(texts, vec!["Values", "-5.0", "5.0", "group", "singleton", "B"]);
    }
}
