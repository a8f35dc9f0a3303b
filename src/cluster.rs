//! Hierarchical cluster ordering of one table axis.
//!
//! Distances come from [`crate::distance`], the merge tree from `kodama`.
//! The display order is the left-to-right leaf sequence of the merge tree,
//! optionally re-oriented to minimise the distance between neighbouring
//! leaves.

use std::fmt;
use std::str::FromStr;

use log::debug;
use rustc_hash::{FxHashMap, FxHashSet};

use crate::distance::{condensed_distances, DistanceMatrix, DistanceMetric};
use crate::error::{HeatmapError, Result};
use crate::table::{Axis, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum LinkageMethod {
    Single,
    Complete,
    Average,
    Weighted,
    Centroid,
    Median,
    Ward,
}

impl LinkageMethod {
    pub const ALL: [LinkageMethod; 7] = [
        LinkageMethod::Single,
        LinkageMethod::Complete,
        LinkageMethod::Average,
        LinkageMethod::Weighted,
        LinkageMethod::Centroid,
        LinkageMethod::Median,
        LinkageMethod::Ward,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            LinkageMethod::Single => "single",
            LinkageMethod::Complete => "complete",
            LinkageMethod::Average => "average",
            LinkageMethod::Weighted => "weighted",
            LinkageMethod::Centroid => "centroid",
            LinkageMethod::Median => "median",
            LinkageMethod::Ward => "ward",
        }
    }
}

impl From<LinkageMethod> for kodama::Method {
    fn from(method: LinkageMethod) -> Self {
        match method {
            LinkageMethod::Single => kodama::Method::Single,
            LinkageMethod::Complete => kodama::Method::Complete,
            LinkageMethod::Average => kodama::Method::Average,
            LinkageMethod::Weighted => kodama::Method::Weighted,
            LinkageMethod::Centroid => kodama::Method::Centroid,
            LinkageMethod::Median => kodama::Method::Median,
            LinkageMethod::Ward => kodama::Method::Ward,
        }
    }
}

impl fmt::Display for LinkageMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for LinkageMethod {
    type Err = HeatmapError;

    fn from_str(s: &str) -> Result<Self> {
        let wanted = s.trim().to_ascii_lowercase();
        LinkageMethod::ALL
            .iter()
            .copied()
            .find(|m| m.name() == wanted)
            .ok_or_else(|| HeatmapError::clustering(format!("unknown linkage method '{}'", s)))
    }
}

/// One agglomeration step. Labels below `observations` are leaves; merge `i`
/// creates cluster `observations + i`. `left` is drawn before `right`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Merge {
    pub left: usize,
    pub right: usize,
    pub height: f64,
    pub size: usize,
}

/// Binary merge tree over the items of one axis
#[derive(Debug, Clone, PartialEq)]
pub struct LinkageTree {
    observations: usize,
    merges: Vec<Merge>,
}

impl LinkageTree {
    /// Tree without merges, used for axes with fewer than two items
    pub fn empty(observations: usize) -> Self {
        LinkageTree {
            observations,
            merges: Vec::new(),
        }
    }

    fn from_kodama(dendrogram: &kodama::Dendrogram<f64>, observations: usize) -> Self {
        let merges = dendrogram
            .steps()
            .iter()
            .map(|step| Merge {
                left: step.cluster1.min(step.cluster2),
                right: step.cluster1.max(step.cluster2),
                height: step.dissimilarity,
                size: step.size,
            })
            .collect();
        LinkageTree {
            observations,
            merges,
        }
    }

    pub fn observations(&self) -> usize {
        self.observations
    }

    pub fn merges(&self) -> &[Merge] {
        &self.merges
    }

    pub fn is_empty(&self) -> bool {
        self.merges.is_empty()
    }

    pub fn root(&self) -> Option<usize> {
        if self.merges.is_empty() {
            None
        } else {
            Some(self.observations + self.merges.len() - 1)
        }
    }

    pub fn children(&self, node: usize) -> Option<(usize, usize)> {
        if node < self.observations {
            return None;
        }
        self.merges
            .get(node - self.observations)
            .map(|m| (m.left, m.right))
    }

    /// Merge height of `node`; zero for leaves
    pub fn height(&self, node: usize) -> f64 {
        if node < self.observations {
            0.0
        } else {
            self.merges[node - self.observations].height
        }
    }

    pub fn max_height(&self) -> f64 {
        self.merges.iter().map(|m| m.height).fold(0.0, f64::max)
    }

    /// Leaves in depth-first, left-before-right order
    pub fn leaf_order(&self) -> LeafOrder {
        let Some(root) = self.root() else {
            return LeafOrder((0..self.observations).collect());
        };
        let mut order = Vec::with_capacity(self.observations);
        let mut stack = vec![root];
        while let Some(node) = stack.pop() {
            match self.children(node) {
                Some((left, right)) => {
                    stack.push(right);
                    stack.push(left);
                }
                None => order.push(node),
            }
        }
        LeafOrder(order)
    }

    /// Cut the tree into at most `k` flat clusters, scipy `maxclust` style.
    ///
    /// Each merge is ranked by the largest height in its subtree, which keeps
    /// centroid and median trees with inversions consistent. The cut keeps
    /// every merge at or below the smallest threshold leaving at most `k`
    /// clusters, so tied heights can give fewer than `k`. Cluster labels are
    /// numbered by first appearance in leaf order.
    pub fn flat_clusters(&self, k: usize) -> Vec<usize> {
        let n = self.observations;
        if n == 0 {
            return Vec::new();
        }
        let k = k.clamp(1, n);

        let mut max_heights: Vec<f64> = Vec::with_capacity(self.merges.len());
        for merge in &self.merges {
            let mut height = merge.height;
            for child in [merge.left, merge.right] {
                if child >= n {
                    height = height.max(max_heights[child - n]);
                }
            }
            max_heights.push(height);
        }
        let mut sorted = max_heights.clone();
        sorted.sort_by(f64::total_cmp);
        let threshold = (n - k).checked_sub(1).and_then(|i| sorted.get(i).copied());

        let mut uf = UnionFind::new(n + self.merges.len());
        if let Some(threshold) = threshold {
            for (i, merge) in self.merges.iter().enumerate() {
                if max_heights[i] <= threshold {
                    uf.union(n + i, merge.left);
                    uf.union(n + i, merge.right);
                }
            }
        }

        let mut root_to_cluster: FxHashMap<usize, usize> = FxHashMap::default();
        let mut clusters = vec![0; n];
        for leaf in self.leaf_order().indices() {
            let root = uf.find(*leaf);
            let next = root_to_cluster.len();
            clusters[*leaf] = *root_to_cluster.entry(root).or_insert(next);
        }
        clusters
    }
}

/// Union-find over merge-tree labels
struct UnionFind {
    parent: Vec<usize>,
    rank: Vec<usize>,
}

impl UnionFind {
    fn new(n: usize) -> Self {
        UnionFind {
            parent: (0..n).collect(),
            rank: vec![0; n],
        }
    }

    fn find(&mut self, x: usize) -> usize {
        let mut root = x;
        while self.parent[root] != root {
            root = self.parent[root];
        }
        let mut cur = x;
        while self.parent[cur] != root {
            let next = self.parent[cur];
            self.parent[cur] = root;
            cur = next;
        }
        root
    }

    fn union(&mut self, x: usize, y: usize) {
        let px = self.find(x);
        let py = self.find(y);
        if px == py {
            return;
        }
        match self.rank[px].cmp(&self.rank[py]) {
            std::cmp::Ordering::Less => self.parent[px] = py,
            std::cmp::Ordering::Greater => self.parent[py] = px,
            std::cmp::Ordering::Equal => {
                self.parent[py] = px;
                self.rank[px] += 1;
            }
        }
    }
}

/// Permutation of axis positions in display order
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LeafOrder(Vec<usize>);

impl LeafOrder {
    pub fn identity(n: usize) -> Self {
        LeafOrder((0..n).collect())
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn ids(&self, ids: &[String]) -> Vec<String> {
        self.0.iter().map(|&i| ids[i].clone()).collect()
    }

    pub fn is_permutation_of(&self, n: usize) -> bool {
        if self.0.len() != n {
            return false;
        }
        let mut seen = vec![false; n];
        self.0
            .iter()
            .all(|&i| i < n && !std::mem::replace(&mut seen[i], true))
    }
}

/// Clustering parameters for one axis
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClusterOrdering {
    pub metric: DistanceMetric,
    pub method: LinkageMethod,
    pub optimal_ordering: bool,
}

impl ClusterOrdering {
    pub fn new(metric: DistanceMetric, method: LinkageMethod) -> Self {
        ClusterOrdering {
            metric,
            method,
            optimal_ordering: false,
        }
    }

    pub fn with_optimal_ordering(mut self, optimal_ordering: bool) -> Self {
        self.optimal_ordering = optimal_ordering;
        self
    }

    pub fn order(&self, table: &Table, axis: Axis) -> Result<(LeafOrder, LinkageTree)> {
        let n = table.len(axis);
        if n < 2 {
            return Ok((LeafOrder::identity(n), LinkageTree::empty(n)));
        }

        debug!(
            "Clustering {} {}s ({} distance, {} linkage)",
            n, axis, self.metric, self.method
        );
        let vectors = table.vectors(axis);
        let distances = DistanceMatrix::new(n, condensed_distances(&vectors, self.metric));
        if let Some((i, j)) = distances.first_non_finite() {
            let ids = table.ids(axis);
            return Err(HeatmapError::DegenerateInput {
                axis,
                first: ids[i].clone(),
                second: ids[j].clone(),
                message: format!("{} distance", self.metric),
            });
        }

        let mut condensed = distances.condensed().to_vec();
        let dendrogram = kodama::linkage(&mut condensed, n, self.method.into());
        let mut tree = LinkageTree::from_kodama(&dendrogram, n);
        if self.optimal_ordering {
            tree = optimal_leaf_ordering(&tree, &distances);
        }

        let order = tree.leaf_order();
        debug!("{} linkage: {} merges, max height {:.4}", axis, tree.merges().len(), tree.max_height());
        Ok((order, tree))
    }
}

/// Identifiers of `axis` in dendrogram order
pub fn compute_order(
    table: &Table,
    axis: Axis,
    metric: DistanceMetric,
    method: LinkageMethod,
) -> Result<Vec<String>> {
    let (order, _) = ClusterOrdering::new(metric, method).order(table, axis)?;
    Ok(order.ids(table.ids(axis)))
}

/// Check that `order` lists every identifier of `ids` exactly once.
pub fn validate_order(ids: &[String], axis: Axis, order: &[String]) -> Result<LeafOrder> {
    let index: FxHashMap<&str, usize> = ids
        .iter()
        .enumerate()
        .map(|(i, id)| (id.as_str(), i))
        .collect();
    let mut seen: FxHashSet<usize> = FxHashSet::default();
    let mut positions = Vec::with_capacity(order.len());
    for id in order {
        let Some(&pos) = index.get(id.as_str()) else {
            return Err(HeatmapError::invalid_order(
                axis,
                format!("unknown identifier '{}'", id),
            ));
        };
        if !seen.insert(pos) {
            return Err(HeatmapError::invalid_order(
                axis,
                format!("identifier '{}' appears more than once", id),
            ));
        }
        positions.push(pos);
    }
    if let Some(missing) = ids.iter().enumerate().find(|(i, _)| !seen.contains(i)) {
        return Err(HeatmapError::invalid_order(
            axis,
            format!("identifier '{}' is missing", missing.1),
        ));
    }
    Ok(LeafOrder(positions))
}

/// Every node of a merge tree covers a contiguous slice of its default leaf order.
struct Spans<'a> {
    leaves: &'a [usize],
    span: Vec<(usize, usize)>,
    pos: Vec<usize>,
}

impl<'a> Spans<'a> {
    fn new(tree: &LinkageTree, leaves: &'a [usize]) -> Self {
        let n = tree.observations();
        let mut span = vec![(0usize, 0usize); n + tree.merges().len()];
        let mut pos = vec![0usize; n];
        for (p, &leaf) in leaves.iter().enumerate() {
            span[leaf] = (p, p + 1);
            pos[leaf] = p;
        }
        for (i, merge) in tree.merges().iter().enumerate() {
            span[n + i] = (span[merge.left].0, span[merge.right].1);
        }
        Spans { leaves, span, pos }
    }

    fn members(&self, node: usize) -> &'a [usize] {
        let (start, end) = self.span[node];
        &self.leaves[start..end]
    }

    fn contains(&self, node: usize, leaf: usize) -> bool {
        let (start, end) = self.span[node];
        (start..end).contains(&self.pos[leaf])
    }

    /// Leaves that can sit next to the outer end `leaf` of `node`
    fn inner(&self, tree: &LinkageTree, node: usize, leaf: usize) -> &'a [usize] {
        match tree.children(node) {
            None => self.members(node),
            Some((a, b)) if self.contains(a, leaf) => self.members(b),
            Some((a, _)) => self.members(a),
        }
    }
}

/// Re-orient the children of every merge so that the summed distance between
/// adjacent leaves is minimal (Bar-Joseph et al. 2001). Topology and heights
/// are unchanged.
fn optimal_leaf_ordering(tree: &LinkageTree, dist: &DistanceMatrix) -> LinkageTree {
    let n = tree.observations();
    let Some(root) = tree.root() else {
        return tree.clone();
    };
    if n < 3 {
        return tree.clone();
    }

    let default_order = tree.leaf_order();
    let spans = Spans::new(tree, default_order.indices());
    let members = |node: usize| spans.members(node);
    let inner = |node: usize, leaf: usize| spans.inner(tree, node, leaf);
    let contains = |node: usize, leaf: usize| spans.contains(node, leaf);

    let mut cost = vec![f64::INFINITY; n * n];
    let mut arg = vec![(usize::MAX, usize::MAX); n * n];
    for leaf in 0..n {
        cost[leaf * n + leaf] = 0.0;
    }

    let mut best_to = vec![(f64::INFINITY, usize::MAX); n];
    for merge in tree.merges() {
        let (l, r) = (merge.left, merge.right);
        for &u in members(l) {
            // best inner leaf m of l for every candidate k of r
            for &k in members(r) {
                let mut best = (f64::INFINITY, usize::MAX);
                for &m in inner(l, u) {
                    let c = cost[u * n + m] + dist.get(m, k);
                    if c < best.0 {
                        best = (c, m);
                    }
                }
                best_to[k] = best;
            }
            for &w in members(r) {
                let mut best = (f64::INFINITY, usize::MAX, usize::MAX);
                for &k in inner(r, w) {
                    let (c, m) = best_to[k];
                    let c = c + cost[k * n + w];
                    if c < best.0 {
                        best = (c, m, k);
                    }
                }
                cost[u * n + w] = best.0;
                cost[w * n + u] = best.0;
                arg[u * n + w] = (best.1, best.2);
                arg[w * n + u] = (best.2, best.1);
            }
        }
    }

    let (l, r) = match tree.children(root) {
        Some(children) => children,
        None => return tree.clone(),
    };
    let mut ends = (members(l)[0], members(r)[0]);
    let mut best = f64::INFINITY;
    for &u in members(l) {
        for &w in members(r) {
            if cost[u * n + w] < best {
                best = cost[u * n + w];
                ends = (u, w);
            }
        }
    }

    let mut swapped = vec![false; tree.merges().len()];
    let mut stack = vec![(root, ends.0, ends.1)];
    while let Some((node, u, w)) = stack.pop() {
        let Some((a, b)) = tree.children(node) else {
            continue;
        };
        let (m, k) = arg[u * n + w];
        if contains(a, u) {
            stack.push((a, u, m));
            stack.push((b, k, w));
        } else {
            swapped[node - n] = true;
            stack.push((b, u, m));
            stack.push((a, k, w));
        }
    }

    let merges = tree
        .merges()
        .iter()
        .zip(&swapped)
        .map(|(merge, &swap)| {
            if swap {
                Merge {
                    left: merge.right,
                    right: merge.left,
                    ..*merge
                }
            } else {
                *merge
            }
        })
        .collect();
    LinkageTree {
        observations: n,
        merges,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::{fixture, rstest};

    fn shapes() -> Table {
        // a ~ b and c ~ d by shape; a ~ c and b ~ d by magnitude
        Table::from_rows(
            ["a", "b", "c", "d"],
            ["x", "y", "z"],
            vec![
                vec![1.0, 2.0, 3.0],
                vec![10.0, 20.0, 30.0],
                vec![3.0, 2.0, 1.0],
                vec![30.0, 20.0, 10.0],
            ],
        )
        .unwrap()
    }

    fn adjacent(order: &[String], x: &str, y: &str) -> bool {
        let px = order.iter().position(|id| id == x).unwrap();
        let py = order.iter().position(|id| id == y).unwrap();
        px.abs_diff(py) == 1
    }

    fn path_cost(order: &LeafOrder, dist: &DistanceMatrix) -> f64 {
        order
            .indices()
            .windows(2)
            .map(|w| dist.get(w[0], w[1]))
            .sum()
    }

    fn grid(n_rows: usize, n_cols: usize) -> Table {
        let rows = (0..n_rows)
            .map(|r| {
                (0..n_cols)
                    .map(|c| ((r * 7 + c * 13) % 11) as f64 + (r as f64) * 0.37 - (c as f64).sin())
                    .collect()
            })
            .collect();
        Table::from_rows(
            (0..n_rows).map(|r| format!("r{r}")),
            (0..n_cols).map(|c| format!("c{c}")),
            rows,
        )
        .unwrap()
    }

    #[rstest]
    #[case(DistanceMetric::Euclidean, LinkageMethod::Complete)]
    #[case(DistanceMetric::Cityblock, LinkageMethod::Average)]
    #[case(DistanceMetric::Correlation, LinkageMethod::Single)]
    #[case(DistanceMetric::Cosine, LinkageMethod::Weighted)]
    #[case(DistanceMetric::Euclidean, LinkageMethod::Centroid)]
    #[case(DistanceMetric::Euclidean, LinkageMethod::Ward)]
    fn order_is_a_permutation_on_both_axes(
        #[case] metric: DistanceMetric,
        #[case] method: LinkageMethod,
    ) {
        let table = grid(9, 6);
        for axis in [Axis::Rows, Axis::Columns] {
            for optimal in [false, true] {
                let (order, tree) = ClusterOrdering::new(metric, method)
                    .with_optimal_ordering(optimal)
                    .order(&table, axis)
                    .unwrap();
                assert!(order.is_permutation_of(table.len(axis)));
                assert_eq!(tree.merges().len(), table.len(axis) - 1);
            }
        }
    }

    #[test]
    fn single_item_axis_is_a_no_op() {
        let table = Table::from_rows(["only"], ["a", "b"], vec![vec![1.0, 2.0]]).unwrap();
        let (order, tree) = ClusterOrdering::new(DistanceMetric::Correlation, LinkageMethod::Complete)
            .order(&table, Axis::Rows)
            .unwrap();
        assert_eq!(order.indices(), &[0]);
        assert!(tree.is_empty());
    }

    #[test]
    fn metric_changes_order() {
        let table = shapes();
        let euclid = compute_order(&table, Axis::Rows, DistanceMetric::Euclidean, LinkageMethod::Complete)
            .unwrap();
        let corr = compute_order(&table, Axis::Rows, DistanceMetric::Correlation, LinkageMethod::Complete)
            .unwrap();
        assert!(adjacent(&euclid, "a", "c"));
        assert!(adjacent(&euclid, "b", "d"));
        assert!(adjacent(&corr, "a", "b"));
        assert!(adjacent(&corr, "c", "d"));
        assert_ne!(euclid, corr);
    }

    #[fixture]
    fn axis_aligned() -> Table {
        // a ~ c by direction, a and c far apart from b and d by magnitude
        Table::from_rows(
            ["a", "b", "c", "d"],
            ["x", "y", "z"],
            vec![
                vec![1.0, 0.0, 0.0],
                vec![0.0, 1.0, 0.0],
                vec![2.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0],
            ],
        )
        .unwrap()
    }

    #[rstest]
    fn metric_changes_order_of_axis_aligned_rows(axis_aligned: Table) {
        let euclid = compute_order(&axis_aligned, Axis::Rows, DistanceMetric::Euclidean, LinkageMethod::Complete)
            .unwrap();
        let corr = compute_order(&axis_aligned, Axis::Rows, DistanceMetric::Correlation, LinkageMethod::Complete)
            .unwrap();
        assert!(adjacent(&euclid, "a", "c"));
        assert!(adjacent(&corr, "a", "c"));
        assert_ne!(euclid, corr);
    }

    #[test]
    fn constant_row_under_correlation_is_degenerate() {
        let table = Table::from_rows(
            ["flat", "up", "down"],
            ["x", "y", "z"],
            vec![vec![2.0, 2.0, 2.0], vec![1.0, 2.0, 3.0], vec![3.0, 2.0, 1.0]],
        )
        .unwrap();
        let err = ClusterOrdering::new(DistanceMetric::Correlation, LinkageMethod::Average)
            .order(&table, Axis::Rows)
            .unwrap_err();
        assert!(err.is_clustering_error());
        match err {
            HeatmapError::DegenerateInput { axis, first, .. } => {
                assert_eq!(axis, Axis::Rows);
                assert_eq!(first, "flat");
            }
            other => panic!("expected DegenerateInput, got: {other:?}"),
        }
    }

    #[test]
    fn leaf_order_is_depth_first() {
        let tree = LinkageTree {
            observations: 4,
            merges: vec![
                Merge { left: 1, right: 3, height: 1.0, size: 2 },
                Merge { left: 0, right: 2, height: 2.0, size: 2 },
                Merge { left: 4, right: 5, height: 3.0, size: 4 },
            ],
        };
        assert_eq!(tree.leaf_order().indices(), &[1, 3, 0, 2]);
        assert_eq!(tree.flat_clusters(2), vec![1, 0, 1, 0]);
        assert_eq!(tree.flat_clusters(1), vec![0; 4]);
        assert_eq!(tree.flat_clusters(10), vec![2, 0, 3, 1]);
    }

    #[test]
    fn tied_heights_cut_together() {
        let tree = LinkageTree {
            observations: 4,
            merges: vec![
                Merge { left: 0, right: 1, height: 1.0, size: 2 },
                Merge { left: 2, right: 3, height: 1.0, size: 2 },
                Merge { left: 4, right: 5, height: 2.0, size: 4 },
            ],
        };
        assert_eq!(tree.flat_clusters(3), vec![0, 0, 1, 1]);
        assert_eq!(tree.flat_clusters(4), vec![0, 1, 2, 3]);
    }

    #[test]
    fn inversions_use_subtree_height() {
        // centroid-style tree: the second merge sits below its child
        let tree = LinkageTree {
            observations: 4,
            merges: vec![
                Merge { left: 0, right: 1, height: 2.0, size: 2 },
                Merge { left: 4, right: 2, height: 1.5, size: 3 },
                Merge { left: 5, right: 3, height: 3.0, size: 4 },
            ],
        };
        assert_eq!(tree.flat_clusters(3), vec![0, 0, 0, 1]);
        assert_eq!(tree.flat_clusters(2), vec![0, 0, 0, 1]);
        assert_eq!(tree.flat_clusters(1), vec![0; 4]);
    }

    #[test]
    fn optimal_ordering_never_costs_more() {
        let table = grid(12, 5);
        let vectors = table.vectors(Axis::Rows);
        let dist = DistanceMatrix::new(12, condensed_distances(&vectors, DistanceMetric::Euclidean));
        let plain = ClusterOrdering::new(DistanceMetric::Euclidean, LinkageMethod::Average);
        let (default_order, default_tree) = plain.order(&table, Axis::Rows).unwrap();
        let (optimal_order, optimal_tree) = plain
            .with_optimal_ordering(true)
            .order(&table, Axis::Rows)
            .unwrap();
        assert!(path_cost(&optimal_order, &dist) <= path_cost(&default_order, &dist) + 1e-9);

        // same topology, same heights
        let heights = |t: &LinkageTree| t.merges().iter().map(|m| m.height).collect::<Vec<_>>();
        assert_eq!(heights(&default_tree), heights(&optimal_tree));
    }

    #[test]
    fn optimal_ordering_joins_nearest_ends() {
        // ((0,1),(2,3)): 1 sits next to 3, 0 next to 2 is worse
        let values = vec![vec![0.0], vec![1.0], vec![10.0], vec![1.5]];
        let table = Table::from_rows(["p", "q", "r", "s"], ["v"], values).unwrap();
        let dist = DistanceMatrix::new(
            4,
            condensed_distances(&table.vectors(Axis::Rows), DistanceMetric::Euclidean),
        );
        let tree = LinkageTree {
            observations: 4,
            merges: vec![
                Merge { left: 0, right: 1, height: 1.0, size: 2 },
                Merge { left: 2, right: 3, height: 8.5, size: 2 },
                Merge { left: 4, right: 5, height: 10.0, size: 4 },
            ],
        };
        let reordered = optimal_leaf_ordering(&tree, &dist);
        assert_eq!(reordered.leaf_order().indices(), &[0, 1, 3, 2]);
    }

    #[rstest]
    #[case(&["a", "b", "c"], true)]
    #[case(&["a", "b"], false)]
    #[case(&["a", "b", "b", "c"], false)]
    #[case(&["a", "b", "x"], false)]
    fn custom_order_must_be_a_permutation(#[case] order: &[&str], #[case] ok: bool) {
        let ids: Vec<String> = ["c", "a", "b"].iter().map(|s| s.to_string()).collect();
        let order: Vec<String> = order.iter().map(|s| s.to_string()).collect();
        let result = validate_order(&ids, Axis::Columns, &order);
        match (result, ok) {
            (Ok(leaf_order), true) => assert_eq!(leaf_order.indices(), &[1, 2, 0]),
            (Err(HeatmapError::InvalidOrder { axis, .. }), false) => assert_eq!(axis, Axis::Columns),
            (other, _) => panic!("unexpected result: {other:?}"),
        }
    }

    #[test]
    fn unknown_linkage_name_is_a_clustering_error() {
        assert!("upgma".parse::<LinkageMethod>().unwrap_err().is_clustering_error());
        assert_eq!("Complete".parse::<LinkageMethod>().unwrap(), LinkageMethod::Complete);
    }
}
