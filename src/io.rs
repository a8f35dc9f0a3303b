//! Tab-separated input and output for the `hmap` driver.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::{Path, PathBuf};

use log::{debug, info};
use rustc_hash::FxHashMap;

use crate::color::{Colormap, Rgb};
use crate::error::{HeatmapError, Result};
use crate::table::{AnnotationKind, AnnotationTable, AnnotationValue, Axis, Table};

fn is_skipped(line: &str) -> bool {
    line.trim().is_empty() || line.starts_with('#')
}

/// Identifiers after the corner cell of the first non-comment line
fn read_header<I>(lines: &mut I, path: &Path) -> Result<Vec<String>>
where
    I: Iterator<Item = (usize, std::io::Result<String>)>,
{
    for (_, line) in lines {
        let line = line?;
        if !is_skipped(&line) {
            return Ok(line
                .trim_end_matches('\r')
                .split('\t')
                .skip(1)
                .map(|c| c.trim().to_string())
                .collect());
        }
    }
    Err(HeatmapError::parse(path, 0, "missing header line"))
}

/// Parse a numeric matrix. The header holds a corner cell and the column ids;
/// every other line a row id and one value per column. Empty cells and `NA`
/// read as NaN.
pub fn parse_table<R: BufRead>(reader: R, path: &Path) -> Result<Table> {
    let mut lines = reader.lines().enumerate();
    let column_ids = read_header(&mut lines, path)?;
    let mut row_ids = Vec::new();
    let mut values = Vec::new();

    for (i, line) in lines {
        let line = line?;
        if is_skipped(&line) {
            continue;
        }
        let mut cells = line.trim_end_matches('\r').split('\t');
        let row_id = cells.next().unwrap_or_default().trim().to_string();
        let row: Vec<&str> = cells.collect();
        if row.len() != column_ids.len() {
            return Err(HeatmapError::parse(
                path,
                i + 1,
                format!(
                    "row '{}' has {} values, expected {}",
                    row_id,
                    row.len(),
                    column_ids.len()
                ),
            ));
        }
        for cell in row {
            let value = match AnnotationValue::parse(cell) {
                AnnotationValue::Number(v) => v,
                AnnotationValue::Missing => f64::NAN,
                AnnotationValue::Label(raw) => {
                    return Err(HeatmapError::parse(
                        path,
                        i + 1,
                        format!("'{}' is not a number", raw),
                    ))
                }
            };
            values.push(value);
        }
        row_ids.push(row_id);
    }

    debug!(
        "Parsed {} rows x {} columns from {:?}",
        row_ids.len(),
        column_ids.len(),
        path
    );
    Table::new(row_ids, column_ids, values)
}

pub fn load_table(path: &Path) -> Result<Table> {
    let file = File::open(path)?;
    let table = parse_table(BufReader::new(file), path)?;
    info!(
        "Loaded {} x {} table from {:?}",
        table.n_rows(),
        table.n_columns(),
        path
    );
    Ok(table)
}

/// Parse an annotation table: an id column followed by named annotation
/// columns. Each column gets the kind given in `kinds`, or the inferred one.
pub fn parse_annotations<R: BufRead>(
    reader: R,
    path: &Path,
    kinds: &FxHashMap<String, AnnotationKind>,
) -> Result<AnnotationTable> {
    let mut lines = reader.lines().enumerate();
    let names = read_header(&mut lines, path)?;
    let mut ids = Vec::new();
    let mut columns: Vec<Vec<AnnotationValue>> = vec![Vec::new(); names.len()];

    for (i, line) in lines {
        let line = line?;
        if is_skipped(&line) {
            continue;
        }
        let mut cells = line.trim_end_matches('\r').split('\t');
        ids.push(cells.next().unwrap_or_default().trim().to_string());
        let row: Vec<&str> = cells.collect();
        if row.len() != names.len() {
            return Err(HeatmapError::parse(
                path,
                i + 1,
                format!("{} annotation values, expected {}", row.len(), names.len()),
            ));
        }
        for (column, cell) in columns.iter_mut().zip(row) {
            column.push(AnnotationValue::parse(cell));
        }
    }

    let mut table = AnnotationTable::new(ids)?;
    for (name, values) in names.into_iter().zip(columns) {
        let kind = kinds
            .get(&name)
            .copied()
            .unwrap_or_else(|| AnnotationKind::infer(&values));
        debug!("Annotation column '{}' bound as {:?}", name, kind);
        table.add_column(name, kind, values)?;
    }
    Ok(table)
}

pub fn load_annotations(
    path: &Path,
    kinds: &FxHashMap<String, AnnotationKind>,
) -> Result<AnnotationTable> {
    let file = File::open(path)?;
    let table = parse_annotations(BufReader::new(file), path, kinds)?;
    info!(
        "Loaded {} annotation columns for {} ids from {:?}",
        table.columns().len(),
        table.ids().len(),
        path
    );
    Ok(table)
}

/// One identifier per line
pub fn load_order(path: &Path) -> Result<Vec<String>> {
    let file = File::open(path)?;
    let reader = BufReader::new(file);
    let mut ids = Vec::new();

    for line in reader.lines() {
        let line = line?;
        let line = line.trim();
        if !line.is_empty() {
            ids.push(line.to_string());
        }
    }

    Ok(ids)
}

/// Per-annotation color choices read from a styles file
#[derive(Debug, Default)]
pub struct AnnotationStyles {
    pub group_colors: FxHashMap<String, FxHashMap<String, Rgb>>,
    pub colormaps: FxHashMap<String, Colormap>,
}

/// Parse annotation styles. `annotation<TAB>group<TAB>color` fixes a group
/// color, `annotation<TAB>colormap` picks the colormap of a continuous column.
pub fn parse_annotation_styles<R: BufRead>(reader: R, path: &Path) -> Result<AnnotationStyles> {
    let mut styles = AnnotationStyles::default();
    for (i, line) in reader.lines().enumerate() {
        let line = line?;
        if is_skipped(&line) {
            continue;
        }
        let parts: Vec<&str> = line.trim().split('\t').map(str::trim).collect();
        let located = |e: HeatmapError| HeatmapError::parse(path, i + 1, e.to_string());
        match parts.as_slice() {
            [annotation, group, color] => {
                let color: Rgb = color.parse().map_err(located)?;
                styles
                    .group_colors
                    .entry(annotation.to_string())
                    .or_default()
                    .insert(group.to_string(), color);
            }
            [annotation, colormap] => {
                let colormap: Colormap = colormap.parse().map_err(located)?;
                styles.colormaps.insert(annotation.to_string(), colormap);
            }
            _ => {
                return Err(HeatmapError::parse(
                    path,
                    i + 1,
                    format!("expected 2 or 3 fields, found {}", parts.len()),
                ))
            }
        }
    }
    Ok(styles)
}

pub fn load_annotation_styles(path: &Path) -> Result<AnnotationStyles> {
    let file = File::open(path)?;
    parse_annotation_styles(BufReader::new(file), path)
}

/// Side file for the flat clusters of one axis: `foo.png` becomes
/// `foo.row_clusters.tsv`.
pub fn cluster_tsv_path(output: &Path, axis: Axis) -> PathBuf {
    output.with_extension(format!("{}_clusters.tsv", axis))
}

/// Write `(identifier, cluster)` pairs, in display order.
pub fn write_cluster_tsv(path: &Path, axis: Axis, clusters: &[(String, usize)]) -> Result<()> {
    let mut content = format!("{}.name\tcluster\n", axis);
    for (id, cluster) in clusters {
        content.push_str(&format!("{}\t{}\n", id, cluster));
    }
    std::fs::write(path, content)?;
    info!("Cluster assignments saved to {:?}", path);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    fn path() -> PathBuf {
        PathBuf::from("input.tsv")
    }

    #[test]
    fn table_parses_header_rows_and_missing_values() {
        let raw = "gene\ts1\ts2\n# comment\ng1\t1.5\tNA\ng2\t-2\t3e1\n\n";
        let table = parse_table(Cursor::new(raw), &path()).unwrap();
        assert_eq!(table.ids(Axis::Columns), ["s1", "s2"]);
        assert_eq!(table.ids(Axis::Rows), ["g1", "g2"]);
        assert_eq!(table.value(0, 0), 1.5);
        assert!(table.value(0, 1).is_nan());
        assert_eq!(table.value(1, 1), 30.0);
    }

    #[test]
    fn table_errors_name_the_line() {
        let ragged = "id\ta\tb\nr1\t1\n";
        match parse_table(Cursor::new(ragged), &path()).unwrap_err() {
            HeatmapError::Parse { line, message, .. } => {
                assert_eq!(line, 2);
                assert!(message.contains("r1"));
            }
            other => panic!("expected Parse, got: {other:?}"),
        }
        let text = "id\ta\nr1\thigh\n";
        assert!(matches!(
            parse_table(Cursor::new(text), &path()).unwrap_err(),
            HeatmapError::Parse { line: 2, .. }
        ));
        assert!(parse_table(Cursor::new(""), &path()).is_err());
    }

    #[test]
    fn annotation_kinds_are_inferred_or_forced() {
        let raw = "id\tsex\tage\tbatch\na\tm\t31\t1\nb\tf\t45\t2\n";
        let mut kinds = FxHashMap::default();
        kinds.insert("batch".to_string(), AnnotationKind::Categorical);
        let table = parse_annotations(Cursor::new(raw), &path(), &kinds).unwrap();
        assert_eq!(table.column("sex").unwrap().kind(), AnnotationKind::Categorical);
        assert_eq!(table.column("age").unwrap().kind(), AnnotationKind::Continuous);
        assert_eq!(table.column("batch").unwrap().kind(), AnnotationKind::Categorical);
        assert_eq!(
            table.column("age").unwrap().get("b"),
            Some(&AnnotationValue::Number(45.0))
        );
    }

    #[test]
    fn forcing_continuous_on_labels_fails() {
        let raw = "id\tsex\na\tm\n";
        let mut kinds = FxHashMap::default();
        kinds.insert("sex".to_string(), AnnotationKind::Continuous);
        let err = parse_annotations(Cursor::new(raw), &path(), &kinds).unwrap_err();
        assert!(matches!(err, HeatmapError::HeterogeneousAnnotation { .. }));
    }

    #[test]
    fn styles_hold_group_colors_and_colormaps() {
        let raw = "sex\tm\t#0000ff\nsex\tf\t255,0,0\nage\tReds\n";
        let styles = parse_annotation_styles(Cursor::new(raw), &path()).unwrap();
        assert_eq!(styles.group_colors["sex"]["m"], Rgb(0, 0, 255));
        assert_eq!(styles.group_colors["sex"]["f"], Rgb(255, 0, 0));
        assert_eq!(styles.colormaps["age"].name(), "Reds");

        let bad = "sex\tm\tnot-a-color\n";
        assert!(matches!(
            parse_annotation_styles(Cursor::new(bad), &path()).unwrap_err(),
            HeatmapError::Parse { line: 1, .. }
        ));
    }

    #[test]
    fn cluster_side_files_sit_next_to_the_output() {
        assert_eq!(
            cluster_tsv_path(Path::new("out/fig.png"), Axis::Rows),
            PathBuf::from("out/fig.row_clusters.tsv")
        );
        assert_eq!(
            cluster_tsv_path(Path::new("fig.svg"), Axis::Columns),
            PathBuf::from("fig.column_clusters.tsv")
        );
    }
}
