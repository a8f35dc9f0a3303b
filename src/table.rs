//! In-memory data model: the numeric table and its side annotations.

use std::fmt;

use rustc_hash::{FxHashMap, FxHashSet};
use sha2::{Digest, Sha256};

use crate::error::{HeatmapError, Result};

/// Which axis of a [`Table`] an operation applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Axis {
    Rows,
    Columns,
}

impl fmt::Display for Axis {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Axis::Rows => f.write_str("row"),
            Axis::Columns => f.write_str("column"),
        }
    }
}

/// SHA-256 digest over a table's identifiers and value bits
pub type TableVersion = [u8; 32];

/// Two-dimensional numeric matrix indexed by row and column identifiers.
///
/// Values are stored row-major. Identifiers are unique within their axis;
/// their order is only the pre-clustering order.
#[derive(Debug, Clone, PartialEq)]
pub struct Table {
    row_ids: Vec<String>,
    column_ids: Vec<String>,
    values: Vec<f64>,
}

fn check_unique(axis: Axis, ids: &[String]) -> Result<()> {
    let mut seen: FxHashSet<&str> = FxHashSet::default();
    for id in ids {
        if !seen.insert(id.as_str()) {
            return Err(HeatmapError::invalid_table(format!(
                "duplicate {} identifier '{}'",
                axis, id
            )));
        }
    }
    Ok(())
}

impl Table {
    pub fn new(row_ids: Vec<String>, column_ids: Vec<String>, values: Vec<f64>) -> Result<Self> {
        if values.len() != row_ids.len() * column_ids.len() {
            return Err(HeatmapError::invalid_table(format!(
                "{} values cannot fill {} rows x {} columns",
                values.len(),
                row_ids.len(),
                column_ids.len()
            )));
        }
        check_unique(Axis::Rows, &row_ids)?;
        check_unique(Axis::Columns, &column_ids)?;
        Ok(Table {
            row_ids,
            column_ids,
            values,
        })
    }

    /// Build a table from one vector per row.
    pub fn from_rows<R, C>(row_ids: R, column_ids: C, rows: Vec<Vec<f64>>) -> Result<Self>
    where
        R: IntoIterator,
        R::Item: Into<String>,
        C: IntoIterator,
        C::Item: Into<String>,
    {
        let row_ids: Vec<String> = row_ids.into_iter().map(Into::into).collect();
        let column_ids: Vec<String> = column_ids.into_iter().map(Into::into).collect();
        if rows.len() != row_ids.len() {
            return Err(HeatmapError::invalid_table(format!(
                "{} row vectors for {} row identifiers",
                rows.len(),
                row_ids.len()
            )));
        }
        let mut values = Vec::with_capacity(row_ids.len() * column_ids.len());
        for (id, row) in row_ids.iter().zip(&rows) {
            if row.len() != column_ids.len() {
                return Err(HeatmapError::invalid_table(format!(
                    "row '{}' has {} values, expected {}",
                    id,
                    row.len(),
                    column_ids.len()
                )));
            }
            values.extend_from_slice(row);
        }
        Table::new(row_ids, column_ids, values)
    }

    pub fn n_rows(&self) -> usize {
        self.row_ids.len()
    }

    pub fn n_columns(&self) -> usize {
        self.column_ids.len()
    }

    pub fn len(&self, axis: Axis) -> usize {
        self.ids(axis).len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    pub fn ids(&self, axis: Axis) -> &[String] {
        match axis {
            Axis::Rows => &self.row_ids,
            Axis::Columns => &self.column_ids,
        }
    }

    pub fn values(&self) -> &[f64] {
        &self.values
    }

    pub fn value(&self, row: usize, column: usize) -> f64 {
        self.values[row * self.column_ids.len() + column]
    }

    pub fn row(&self, row: usize) -> &[f64] {
        let n = self.column_ids.len();
        &self.values[row * n..(row + 1) * n]
    }

    /// Vectors along `axis`: one per row for [`Axis::Rows`], one per column otherwise.
    pub fn vectors(&self, axis: Axis) -> Vec<Vec<f64>> {
        match axis {
            Axis::Rows => (0..self.n_rows()).map(|r| self.row(r).to_vec()).collect(),
            Axis::Columns => (0..self.n_columns())
                .map(|c| (0..self.n_rows()).map(|r| self.value(r, c)).collect())
                .collect(),
        }
    }

    /// Position of every identifier on `axis`
    pub fn index(&self, axis: Axis) -> FxHashMap<&str, usize> {
        self.ids(axis)
            .iter()
            .enumerate()
            .map(|(i, id)| (id.as_str(), i))
            .collect()
    }

    pub fn version(&self) -> TableVersion {
        let mut hasher = Sha256::new();
        for (tag, ids) in [(b'r', &self.row_ids), (b'c', &self.column_ids)] {
            hasher.update([tag]);
            hasher.update((ids.len() as u64).to_le_bytes());
            for id in ids {
                hasher.update((id.len() as u64).to_le_bytes());
                hasher.update(id.as_bytes());
            }
        }
        for v in &self.values {
            hasher.update(v.to_bits().to_le_bytes());
        }
        hasher.finalize().into()
    }
}

/// How an annotation column is drawn, fixed when the column is bound
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AnnotationKind {
    Categorical,
    Continuous,
}

impl AnnotationKind {
    /// Continuous when every present value is numeric, categorical otherwise.
    pub fn infer(values: &[AnnotationValue]) -> Self {
        if values
            .iter()
            .all(|v| matches!(v, AnnotationValue::Number(_) | AnnotationValue::Missing))
        {
            AnnotationKind::Continuous
        } else {
            AnnotationKind::Categorical
        }
    }
}

impl std::str::FromStr for AnnotationKind {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_ascii_lowercase().as_str() {
            "categorical" | "discrete" => Ok(AnnotationKind::Categorical),
            "continuous" | "non-categorical" | "numeric" => Ok(AnnotationKind::Continuous),
            other => Err(HeatmapError::invalid_table(format!(
                "unknown annotation kind '{}'",
                other
            ))),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum AnnotationValue {
    Label(String),
    Number(f64),
    Missing,
}

impl AnnotationValue {
    /// Parse a raw cell: empty and `NA`/`nan` are missing, numbers stay numeric.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.trim();
        if raw.is_empty() || raw.eq_ignore_ascii_case("na") || raw.eq_ignore_ascii_case("nan") {
            return AnnotationValue::Missing;
        }
        match raw.parse::<f64>() {
            Ok(v) => AnnotationValue::Number(v),
            Err(_) => AnnotationValue::Label(raw.to_string()),
        }
    }

    /// Key under which a categorical value is grouped and shown in legends
    pub fn group_label(&self) -> String {
        match self {
            AnnotationValue::Label(s) => s.clone(),
            AnnotationValue::Number(v) => format!("{}", v),
            AnnotationValue::Missing => "NA".to_string(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct AnnotationColumn {
    name: String,
    kind: AnnotationKind,
    values: FxHashMap<String, AnnotationValue>,
}

impl AnnotationColumn {
    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn kind(&self) -> AnnotationKind {
        self.kind
    }

    pub fn get(&self, id: &str) -> Option<&AnnotationValue> {
        self.values.get(id)
    }
}

/// Named annotation columns keyed by the identifiers of one table axis.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct AnnotationTable {
    ids: Vec<String>,
    columns: Vec<AnnotationColumn>,
}

impl AnnotationTable {
    pub fn new<I>(ids: I) -> Result<Self>
    where
        I: IntoIterator,
        I::Item: Into<String>,
    {
        let ids: Vec<String> = ids.into_iter().map(Into::into).collect();
        let mut seen: FxHashSet<&str> = FxHashSet::default();
        for id in &ids {
            if !seen.insert(id.as_str()) {
                return Err(HeatmapError::invalid_table(format!(
                    "duplicate annotation identifier '{}'",
                    id
                )));
            }
        }
        Ok(AnnotationTable {
            ids,
            columns: Vec::new(),
        })
    }

    /// Bind a column; `values` follow the table's identifier order.
    ///
    /// A continuous column must not contain labels.
    pub fn add_column(
        &mut self,
        name: impl Into<String>,
        kind: AnnotationKind,
        values: Vec<AnnotationValue>,
    ) -> Result<()> {
        let name = name.into();
        if self.column(&name).is_some() {
            return Err(HeatmapError::invalid_table(format!(
                "duplicate annotation column '{}'",
                name
            )));
        }
        if values.len() != self.ids.len() {
            return Err(HeatmapError::invalid_table(format!(
                "annotation column '{}' has {} values for {} identifiers",
                name,
                values.len(),
                self.ids.len()
            )));
        }
        if kind == AnnotationKind::Continuous {
            if let Some((id, _)) = self
                .ids
                .iter()
                .zip(&values)
                .find(|(_, v)| matches!(v, AnnotationValue::Label(_)))
            {
                return Err(HeatmapError::HeterogeneousAnnotation {
                    annotation: name,
                    id: id.clone(),
                });
            }
        }
        let values = self.ids.iter().cloned().zip(values).collect();
        self.columns.push(AnnotationColumn { name, kind, values });
        Ok(())
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    pub fn columns(&self) -> &[AnnotationColumn] {
        &self.columns
    }

    pub fn column(&self, name: &str) -> Option<&AnnotationColumn> {
        self.columns.iter().find(|c| c.name == name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn small() -> Table {
        Table::from_rows(
            ["r1", "r2"],
            ["a", "b", "c"],
            vec![vec![1.0, 2.0, 3.0], vec![4.0, 5.0, 6.0]],
        )
        .unwrap()
    }

    #[test]
    fn vectors_follow_axis() {
        let t = small();
        assert_eq!(t.vectors(Axis::Rows)[1], vec![4.0, 5.0, 6.0]);
        assert_eq!(t.vectors(Axis::Columns)[2], vec![3.0, 6.0]);
        assert_eq!(t.value(1, 0), 4.0);
    }

    #[test]
    fn duplicate_ids_are_rejected() {
        let err = Table::from_rows(["r", "r"], ["a"], vec![vec![1.0], vec![2.0]]).unwrap_err();
        assert!(matches!(err, HeatmapError::InvalidTable { .. }));
    }

    #[test]
    fn ragged_rows_are_rejected() {
        let err = Table::from_rows(["r1", "r2"], ["a", "b"], vec![vec![1.0, 2.0], vec![3.0]])
            .unwrap_err();
        assert!(err.to_string().contains("r2"));
    }

    #[test]
    fn version_tracks_content() {
        let a = small();
        let mut values = a.values().to_vec();
        assert_eq!(a.version(), small().version());
        values[0] = 10.0;
        let b = Table::new(
            a.ids(Axis::Rows).to_vec(),
            a.ids(Axis::Columns).to_vec(),
            values,
        )
        .unwrap();
        assert_ne!(a.version(), b.version());
    }

    #[test]
    fn continuous_column_rejects_labels() {
        let mut ann = AnnotationTable::new(["x", "y"]).unwrap();
        let err = ann
            .add_column(
                "age",
                AnnotationKind::Continuous,
                vec![AnnotationValue::Number(3.0), AnnotationValue::parse("old")],
            )
            .unwrap_err();
        match err {
            HeatmapError::HeterogeneousAnnotation { annotation, id } => {
                assert_eq!(annotation, "age");
                assert_eq!(id, "y");
            }
            other => panic!("expected HeterogeneousAnnotation, got: {other:?}"),
        }
    }

    #[test]
    fn kind_is_inferred_from_values() {
        let numeric = vec![AnnotationValue::parse("1.5"), AnnotationValue::parse("NA")];
        let mixed = vec![AnnotationValue::parse("1"), AnnotationValue::parse("male")];
        assert_eq!(AnnotationKind::infer(&numeric), AnnotationKind::Continuous);
        assert_eq!(AnnotationKind::infer(&mixed), AnnotationKind::Categorical);
        assert_eq!(AnnotationValue::parse("2").group_label(), "2");
    }
}
