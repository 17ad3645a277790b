//! Density-based clustering of line candidates (DBSCAN).
//!
//! Each candidate becomes a point `(mid_x, mid_y, angle)`. Pixels and
//! degrees share one Euclidean metric without rescaling, so `eps` mixes
//! the two units. Neighbourhood queries go through an [`rstar::RTree`].
//!
//! A point is *core* when at least `min_samples` points, itself
//! included, lie within `eps`. Clusters grow from core points in input
//! order; a non-core point within `eps` of a core point joins the first
//! cluster that reaches it; everything else is noise.

use rstar::RTree;
use rstar::primitives::GeomWithData;

use crate::types::LineCandidate;

/// Cluster assignment of one point.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Label {
    /// Member of the cluster with this index (numbered by discovery).
    Cluster(usize),
    /// Not density-reachable from any core point.
    Noise,
}

type IndexedPoint = GeomWithData<[f64; 3], usize>;

/// Clustering feature of a candidate.
#[must_use]
pub fn feature(candidate: &LineCandidate) -> [f64; 3] {
    let (mx, my) = candidate.segment().midpoint();
    [mx, my, candidate.angle()]
}

/// DBSCAN labels for `points`, one per input point.
#[must_use]
pub fn dbscan(points: &[[f64; 3]], eps: f64, min_samples: usize) -> Vec<Label> {
    let tree: RTree<IndexedPoint> = RTree::bulk_load(
        points
            .iter()
            .enumerate()
            .map(|(i, p)| GeomWithData::new(*p, i))
            .collect(),
    );
    let eps_sq = eps * eps;

    let neighbours: Vec<Vec<usize>> = points
        .iter()
        .map(|p| {
            let mut found: Vec<usize> = tree
                .locate_within_distance(*p, eps_sq)
                .map(|n| n.data)
                .collect();
            found.sort_unstable();
            found
        })
        .collect();
    let core: Vec<bool> = neighbours.iter().map(|n| n.len() >= min_samples).collect();

    let mut labels: Vec<Option<usize>> = vec![None; points.len()];
    let mut next = 0;
    let mut stack = Vec::new();
    for seed in 0..points.len() {
        if labels[seed].is_some() || !core[seed] {
            continue;
        }
        labels[seed] = Some(next);
        stack.push(seed);
        while let Some(p) = stack.pop() {
            for &q in &neighbours[p] {
                if labels[q].is_none() {
                    labels[q] = Some(next);
                    if core[q] {
                        stack.push(q);
                    }
                }
            }
        }
        next += 1;
    }

    labels
        .into_iter()
        .map(|l| l.map_or(Label::Noise, Label::Cluster))
        .collect()
}

/// Collapse clusters of near-duplicate candidates.
///
/// Every cluster is replaced by its longest member (the earliest on a
/// tie); noise candidates are kept as they are. Output lists cluster
/// representatives by cluster index, then noise in input order. Fewer
/// than two candidates are returned unchanged.
#[must_use]
pub fn merge_similar(
    candidates: Vec<LineCandidate>,
    eps: f64,
    min_samples: usize,
) -> Vec<LineCandidate> {
    if candidates.len() < 2 {
        return candidates;
    }

    let features: Vec<[f64; 3]> = candidates.iter().map(feature).collect();
    let labels = dbscan(&features, eps, min_samples);

    let cluster_count = labels
        .iter()
        .filter_map(|l| match l {
            Label::Cluster(c) => Some(c + 1),
            Label::Noise => None,
        })
        .max()
        .unwrap_or(0);

    let mut representatives: Vec<Option<LineCandidate>> = vec![None; cluster_count];
    let mut noise = Vec::new();
    for (candidate, label) in candidates.into_iter().zip(labels) {
        match label {
            Label::Cluster(c) => {
                let slot = &mut representatives[c];
                match slot {
                    Some(best) if candidate.length() <= best.length() => {}
                    _ => *slot = Some(candidate),
                }
            }
            Label::Noise => noise.push(candidate),
        }
    }

    representatives.into_iter().flatten().chain(noise).collect()
}
