//! Pairwise distances between the vectors of one table axis.
//!
//! Results use the condensed layout kodama expects: the upper triangle of
//! the distance matrix, row by row, without the diagonal.

use std::fmt;
use std::str::FromStr;

use rayon::prelude::*;

use crate::error::{HeatmapError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DistanceMetric {
    BrayCurtis,
    Canberra,
    Chebyshev,
    Cityblock,
    Correlation,
    Cosine,
    Euclidean,
    Hamming,
    Jaccard,
    SqEuclidean,
}

impl DistanceMetric {
    pub const ALL: [DistanceMetric; 10] = [
        DistanceMetric::BrayCurtis,
        DistanceMetric::Canberra,
        DistanceMetric::Chebyshev,
        DistanceMetric::Cityblock,
        DistanceMetric::Correlation,
        DistanceMetric::Cosine,
        DistanceMetric::Euclidean,
        DistanceMetric::Hamming,
        DistanceMetric::Jaccard,
        DistanceMetric::SqEuclidean,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            DistanceMetric::BrayCurtis => "braycurtis",
            DistanceMetric::Canberra => "canberra",
            DistanceMetric::Chebyshev => "chebyshev",
            DistanceMetric::Cityblock => "cityblock",
            DistanceMetric::Correlation => "correlation",
            DistanceMetric::Cosine => "cosine",
            DistanceMetric::Euclidean => "euclidean",
            DistanceMetric::Hamming => "hamming",
            DistanceMetric::Jaccard => "jaccard",
            DistanceMetric::SqEuclidean => "sqeuclidean",
        }
    }

    /// Distance between two equally long vectors. May be NaN on degenerate input.
    pub fn distance(&self, u: &[f64], v: &[f64]) -> f64 {
        let pairs = u.iter().zip(v);
        match self {
            DistanceMetric::Euclidean => pairs.map(|(a, b)| (a - b) * (a - b)).sum::<f64>().sqrt(),
            DistanceMetric::SqEuclidean => pairs.map(|(a, b)| (a - b) * (a - b)).sum(),
            DistanceMetric::Cityblock => pairs.map(|(a, b)| (a - b).abs()).sum(),
            DistanceMetric::Chebyshev => pairs.map(|(a, b)| (a - b).abs()).fold(0.0, f64::max),
            DistanceMetric::Cosine => {
                let (dot, nu, nv) = pairs.fold((0.0, 0.0, 0.0), |(d, x, y), (a, b)| {
                    (d + a * b, x + a * a, y + b * b)
                });
                1.0 - dot / (nu * nv).sqrt()
            }
            DistanceMetric::Correlation => {
                let n = u.len() as f64;
                let mu = u.iter().sum::<f64>() / n;
                let mv = v.iter().sum::<f64>() / n;
                let (dot, nu, nv) = pairs.fold((0.0, 0.0, 0.0), |(d, x, y), (a, b)| {
                    let (a, b) = (a - mu, b - mv);
                    (d + a * b, x + a * a, y + b * b)
                });
                1.0 - dot / (nu * nv).sqrt()
            }
            DistanceMetric::Canberra => pairs
                .map(|(a, b)| {
                    let denom = a.abs() + b.abs();
                    // 0/0 terms contribute nothing
                    if denom == 0.0 {
                        0.0
                    } else {
                        (a - b).abs() / denom
                    }
                })
                .sum(),
            DistanceMetric::BrayCurtis => {
                let (num, denom) = pairs.fold((0.0, 0.0), |(n, d), (a, b)| {
                    (n + (a - b).abs(), d + (a + b).abs())
                });
                num / denom
            }
            DistanceMetric::Hamming => {
                let differing = pairs.filter(|(a, b)| a != b).count();
                differing as f64 / u.len() as f64
            }
            DistanceMetric::Jaccard => {
                let (differing, nonzero) = pairs.fold((0usize, 0usize), |(d, nz), (a, b)| {
                    let either = *a != 0.0 || *b != 0.0;
                    (d + usize::from(either && a != b), nz + usize::from(either))
                });
                if nonzero == 0 {
                    0.0
                } else {
                    differing as f64 / nonzero as f64
                }
            }
        }
    }
}

impl fmt::Display for DistanceMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for DistanceMetric {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        DistanceMetric::ALL
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| HeatmapError::clustering(format!("unknown distance metric '{}'", s)))
    }
}

/// Index of the pair `(i, j)`, `i < j`, in a condensed matrix over `n` items.
pub fn condensed_index(n: usize, i: usize, j: usize) -> usize {
    debug_assert!(i < j && j < n);
    n * i - i * (i + 1) / 2 + (j - i - 1)
}

/// Condensed pairwise distance matrix over `vectors`.
pub fn condensed_distances(vectors: &[Vec<f64>], metric: DistanceMetric) -> Vec<f64> {
    let n = vectors.len();
    (0..n)
        .into_par_iter()
        .flat_map_iter(move |i| {
            (i + 1..n).map(move |j| metric.distance(&vectors[i], &vectors[j]))
        })
        .collect()
}

/// Square lookup over a condensed matrix, zero on the diagonal
pub struct DistanceMatrix {
    n: usize,
    condensed: Vec<f64>,
}

impl DistanceMatrix {
    pub fn new(n: usize, condensed: Vec<f64>) -> Self {
        debug_assert_eq!(condensed.len(), n * n.saturating_sub(1) / 2);
        DistanceMatrix { n, condensed }
    }

    pub fn len(&self) -> usize {
        self.n
    }

    pub fn is_empty(&self) -> bool {
        self.n == 0
    }

    pub fn get(&self, i: usize, j: usize) -> f64 {
        match i.cmp(&j) {
            std::cmp::Ordering::Equal => 0.0,
            std::cmp::Ordering::Less => self.condensed[condensed_index(self.n, i, j)],
            std::cmp::Ordering::Greater => self.condensed[condensed_index(self.n, j, i)],
        }
    }

    pub fn condensed(&self) -> &[f64] {
        &self.condensed
    }

    /// First pair whose distance is not finite
    pub fn first_non_finite(&self) -> Option<(usize, usize)> {
        let pos = self.condensed.iter().position(|d| !d.is_finite())?;
        // walk rows until the condensed offset falls inside row i
        let mut start = 0;
        for i in 0..self.n {
            let row_len = self.n - i - 1;
            if pos < start + row_len {
                return Some((i, i + 1 + (pos - start)));
            }
            start += row_len;
        }
        None
    }
}
