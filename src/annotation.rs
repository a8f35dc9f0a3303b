//! Color assignment for annotation tracks.
//!
//! Categorical columns get one color per group, handed out in the order the
//! groups first appear along the displayed axis, so the legend reads in the
//! same order as the track. Continuous columns are mapped through a colormap
//! over their own value range.

use rustc_hash::FxHashMap;

use crate::color::{finite_range, ColorBounds, Colormap, Palette, Rgb, SINGLETON_COLOR};
use crate::error::{HeatmapError, Result};
use crate::table::{AnnotationColumn, AnnotationKind, AnnotationValue};

/// Legend label shared by all single-member groups
pub const SINGLETON_LABEL: &str = "singleton";

#[derive(Debug, Clone, PartialEq)]
pub struct LegendPatch {
    pub label: String,
    pub color: Rgb,
}

/// Result of grouping one categorical column along an ordered axis
#[derive(Debug, Clone, PartialEq)]
pub struct GroupColors {
    /// Group label and its color, in first-encounter order
    pub groups: Vec<(String, Rgb)>,
    /// One legend entry per distinct color; singletons collapse into one entry
    pub patches: Vec<LegendPatch>,
    /// Color of every ordered identifier
    pub cells: Vec<Rgb>,
}

impl GroupColors {
    pub fn color_of(&self, group: &str) -> Option<Rgb> {
        self.groups
            .iter()
            .find(|(label, _)| label == group)
            .map(|(_, color)| *color)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ContinuousColors {
    pub colormap: Colormap,
    /// `None` when the column holds no finite value along the axis
    pub range: Option<ColorBounds>,
    pub cells: Vec<Rgb>,
}

/// Colors of one annotation track, by kind
#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationColors {
    Categorical(GroupColors),
    Continuous(ContinuousColors),
}

impl AnnotationColors {
    pub fn cells(&self) -> &[Rgb] {
        match self {
            AnnotationColors::Categorical(g) => &g.cells,
            AnnotationColors::Continuous(c) => &c.cells,
        }
    }
}

fn lookup<'a>(column: &'a AnnotationColumn, ids: &[String]) -> Result<Vec<&'a AnnotationValue>> {
    ids.iter()
        .map(|id| {
            column.get(id).ok_or_else(|| HeatmapError::MissingIdentifier {
                annotation: column.name().to_string(),
                id: id.clone(),
            })
        })
        .collect()
}

/// Assign a color to every group of `column` along `ordered_ids`.
///
/// Groups with exactly one member get [`SINGLETON_COLOR`]. Groups listed in
/// `overrides` get their given color. Every other group takes the next
/// palette slot in first-encounter order, wrapping when the palette runs out.
pub fn assign_group_colors(
    ordered_ids: &[String],
    column: &AnnotationColumn,
    palette: &Palette,
    overrides: Option<&FxHashMap<String, Rgb>>,
) -> Result<GroupColors> {
    let labels: Vec<String> = lookup(column, ordered_ids)?
        .into_iter()
        .map(AnnotationValue::group_label)
        .collect();

    let mut sizes: FxHashMap<&str, usize> = FxHashMap::default();
    for label in &labels {
        *sizes.entry(label.as_str()).or_insert(0) += 1;
    }

    let mut assigned: FxHashMap<&str, Rgb> = FxHashMap::default();
    let mut groups = Vec::new();
    let mut patches: Vec<LegendPatch> = Vec::new();
    let mut singleton_patch = false;
    let mut slot = 0;
    let mut cells = Vec::with_capacity(labels.len());

    for label in &labels {
        if let Some(color) = assigned.get(label.as_str()) {
            cells.push(*color);
            continue;
        }

        let explicit = overrides.and_then(|o| o.get(label)).copied();
        let singleton = explicit.is_none() && sizes[label.as_str()] == 1;
        let color = match explicit {
            Some(color) => color,
            None if singleton => SINGLETON_COLOR,
            None => {
                let color = palette.get(slot);
                slot += 1;
                color
            }
        };

        if singleton {
            if !singleton_patch {
                patches.push(LegendPatch {
                    label: SINGLETON_LABEL.to_string(),
                    color,
                });
                singleton_patch = true;
            }
        } else {
            patches.push(LegendPatch {
                label: label.clone(),
                color,
            });
        }

        assigned.insert(label.as_str(), color);
        groups.push((label.clone(), color));
        cells.push(color);
    }

    Ok(GroupColors {
        groups,
        patches,
        cells,
    })
}

/// Finite value range of a continuous column along `ordered_ids`.
pub fn continuous_range(
    ordered_ids: &[String],
    column: &AnnotationColumn,
) -> Result<Option<ColorBounds>> {
    let values = lookup(column, ordered_ids)?;
    let mut numbers = Vec::with_capacity(values.len());
    for (id, value) in ordered_ids.iter().zip(values) {
        match value {
            AnnotationValue::Number(v) => numbers.push(*v),
            AnnotationValue::Missing => numbers.push(f64::NAN),
            AnnotationValue::Label(_) => {
                return Err(HeatmapError::HeterogeneousAnnotation {
                    annotation: column.name().to_string(),
                    id: id.clone(),
                })
            }
        }
    }
    Ok(finite_range(numbers).map(|(min, max)| ColorBounds { min, max }))
}

/// Colors of a whole track, dispatching on the column's bound kind.
pub fn annotation_colors(
    ordered_ids: &[String],
    column: &AnnotationColumn,
    palette: &Palette,
    overrides: Option<&FxHashMap<String, Rgb>>,
    colormap: Colormap,
) -> Result<AnnotationColors> {
    match column.kind() {
        AnnotationKind::Categorical => {
            assign_group_colors(ordered_ids, column, palette, overrides)
                .map(AnnotationColors::Categorical)
        }
        AnnotationKind::Continuous => {
            let range = continuous_range(ordered_ids, column)?;
            let cells = ordered_ids
                .iter()
                .map(|id| match (column.get(id), range) {
                    (Some(AnnotationValue::Number(v)), Some(bounds)) => colormap.color(*v, bounds),
                    _ => crate::color::MISSING_COLOR,
                })
                .collect();
            Ok(AnnotationColors::Continuous(ContinuousColors {
                colormap,
                range,
                cells,
            }))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::table::AnnotationTable;

    fn ids(raw: &[&str]) -> Vec<String> {
        raw.iter().map(|s| s.to_string()).collect()
    }

    fn column(pairs: &[(&str, &str)], kind: AnnotationKind) -> AnnotationColumn {
        let mut table = AnnotationTable::new(pairs.iter().map(|(id, _)| *id)).unwrap();
        table
            .add_column(
                "group",
                kind,
                pairs.iter().map(|(_, v)| AnnotationValue::parse(v)).collect(),
            )
            .unwrap();
        table.column("group").unwrap().clone()
    }

    fn three_colors() -> Palette {
        Palette::new(vec![Rgb(1, 0, 0), Rgb(0, 1, 0), Rgb(0, 0, 1)]).unwrap()
    }

    #[test]
    fn singletons_get_the_reserved_color() {
        let col = column(
            &[("s1", "A"), ("s2", "B"), ("s3", "B"), ("s4", "C"), ("s5", "B")],
            AnnotationKind::Categorical,
        );
        let palette = three_colors();
        let colors = assign_group_colors(&ids(&["s1", "s2", "s3", "s4", "s5"]), &col, &palette, None)
            .unwrap();
        assert_eq!(colors.color_of("A"), Some(SINGLETON_COLOR));
        assert_eq!(colors.color_of("C"), Some(SINGLETON_COLOR));
        assert_eq!(colors.color_of("B"), Some(palette.get(0)));
        assert_eq!(
            colors.patches,
            vec![
                LegendPatch { label: SINGLETON_LABEL.to_string(), color: SINGLETON_COLOR },
                LegendPatch { label: "B".to_string(), color: palette.get(0) },
            ]
        );
    }

    #[test]
    fn palette_follows_first_encounter_and_wraps() {
        let col = column(
            &[
                ("a", "z"), ("b", "z"), ("c", "y"), ("d", "y"), ("e", "x"),
                ("f", "x"), ("g", "w"), ("h", "w"),
            ],
            AnnotationKind::Categorical,
        );
        let palette = three_colors();
        let order = ids(&["g", "e", "a", "c", "h", "f", "b", "d"]);
        let colors = assign_group_colors(&order, &col, &palette, None).unwrap();
        let labels: Vec<&str> = colors.groups.iter().map(|(l, _)| l.as_str()).collect();
        assert_eq!(labels, vec!["w", "x", "z", "y"]);
        assert_eq!(colors.color_of("w"), Some(palette.get(0)));
        assert_eq!(colors.color_of("y"), Some(palette.get(0)));
        assert_eq!(colors.cells[4], palette.get(0));
    }

    #[test]
    fn singletons_do_not_consume_palette_slots() {
        let col = column(
            &[("a", "solo"), ("b", "pair"), ("c", "pair")],
            AnnotationKind::Categorical,
        );
        let colors = assign_group_colors(&ids(&["a", "b", "c"]), &col, &three_colors(), None).unwrap();
        assert_eq!(colors.color_of("pair"), Some(Rgb(1, 0, 0)));
    }

    #[test]
    fn overrides_win_and_keep_their_slot() {
        let col = column(
            &[("a", "m"), ("b", "m"), ("c", "f"), ("d", "f")],
            AnnotationKind::Categorical,
        );
        let mut overrides = FxHashMap::default();
        overrides.insert("m".to_string(), Rgb(9, 9, 9));
        let colors =
            assign_group_colors(&ids(&["a", "b", "c", "d"]), &col, &three_colors(), Some(&overrides))
                .unwrap();
        assert_eq!(colors.color_of("m"), Some(Rgb(9, 9, 9)));
        assert_eq!(colors.color_of("f"), Some(Rgb(1, 0, 0)));
    }

    #[test]
    fn missing_identifier_is_reported() {
        let col = column(&[("a", "x"), ("b", "x")], AnnotationKind::Categorical);
        let err = assign_group_colors(&ids(&["a", "ghost"]), &col, &three_colors(), None).unwrap_err();
        match err {
            HeatmapError::MissingIdentifier { annotation, id } => {
                assert_eq!(annotation, "group");
                assert_eq!(id, "ghost");
            }
            other => panic!("expected MissingIdentifier, got: {other:?}"),
        }
    }

    #[test]
    fn continuous_columns_map_through_the_colormap() {
        let col = column(&[("a", "1"), ("b", "NA"), ("c", "3")], AnnotationKind::Continuous);
        let cmap: Colormap = "Greys".parse().unwrap();
        let colors =
            annotation_colors(&ids(&["c", "b", "a"]), &col, &three_colors(), None, cmap).unwrap();
        match colors {
            AnnotationColors::Continuous(c) => {
                assert_eq!(c.range, Some(ColorBounds { min: 1.0, max: 3.0 }));
                assert_eq!(c.cells, vec![Rgb::BLACK, crate::color::MISSING_COLOR, Rgb::WHITE]);
            }
            other => panic!("expected continuous colors, got: {other:?}"),
        }
    }

    #[test]
    fn continuous_range_rejects_labels() {
        let col = column(&[("a", "1"), ("b", "tall")], AnnotationKind::Categorical);
        let err = continuous_range(&ids(&["a", "b"]), &col).unwrap_err();
        assert!(matches!(err, HeatmapError::HeterogeneousAnnotation { .. }));
    }
}
