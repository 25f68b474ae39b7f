// Centroid clustering over document embeddings.
//
// A compact spherical k-means: cosine similarity on unit-normalized vectors,
// farthest-first seeding, and a fixed iteration cap. There is no RNG anywhere
// in the loop, so identical inputs always produce identical assignments.
//
// Documents whose best similarity is not positive (pointing away from every
// centroid, or zero-magnitude embeddings) land in the outlier bucket rather
// than being forced into the nearest cluster.

use anyhow::Result;
use tracing::debug;

use crate::config::TopicCountPolicy;
use crate::embedding::cosine_signed;

use super::records::OUTLIER_TOPIC;

const MAX_ITERATIONS: usize = 50;

/// Hard assignments plus per-document confidence.
#[derive(Debug, Clone)]
pub struct ClusterOutcome {
    /// Topic id per document, input order; ids are contiguous from 0,
    /// ordered by descending cluster size, with -1 for outliers
    pub assignments: Vec<i32>,
    /// Similarity of each document to its centroid, 0.0..=1.0; outliers get 0.0
    pub probabilities: Vec<f64>,
}

/// Cluster embeddings into topics under the given count policy.
pub fn cluster_embeddings(
    embeddings: &[Vec<f64>],
    policy: TopicCountPolicy,
) -> Result<ClusterOutcome> {
    let n = embeddings.len();
    if n == 0 {
        anyhow::bail!("Cannot cluster an empty corpus");
    }

    let k = match policy {
        TopicCountPolicy::Fixed(k) if k > n => {
            anyhow::bail!(
                "Requested {} topics but the corpus has only {} documents",
                k,
                n
            );
        }
        TopicCountPolicy::Fixed(k) => k,
        TopicCountPolicy::Auto => auto_topic_count(n),
    };

    let points: Vec<Vec<f64>> = embeddings.iter().map(|e| normalize(e)).collect();

    let mut centroids = seed_centroids(&points, k);
    let mut assignments: Vec<usize> = vec![0; n];

    for iteration in 0..MAX_ITERATIONS {
        let next: Vec<usize> = points
            .iter()
            .map(|p| nearest_centroid(p, &centroids))
            .collect();

        let converged = next == assignments && iteration > 0;
        assignments = next;

        // Recompute each centroid as the normalized mean of its members.
        // Empty clusters keep their previous centroid.
        for (c, centroid) in centroids.iter_mut().enumerate() {
            let members: Vec<&Vec<f64>> = points
                .iter()
                .zip(&assignments)
                .filter(|(_, &a)| a == c)
                .map(|(p, _)| p)
                .collect();
            if members.is_empty() {
                continue;
            }
            let dim = centroid.len();
            let mut mean = vec![0.0_f64; dim];
            for m in &members {
                for (i, &v) in m.iter().enumerate() {
                    mean[i] += v;
                }
            }
            for v in &mut mean {
                *v /= members.len() as f64;
            }
            *centroid = normalize(&mean);
        }

        if converged {
            debug!(iterations = iteration, k = k, "Clustering converged");
            break;
        }
    }

    // Final pass: best similarity decides both the outlier cut and the
    // reported probability.
    let mut raw_ids: Vec<i32> = Vec::with_capacity(n);
    let mut probabilities: Vec<f64> = Vec::with_capacity(n);
    for p in &points {
        let c = nearest_centroid(p, &centroids);
        let sim = cosine_signed(p, &centroids[c]);
        if sim > 0.0 {
            raw_ids.push(c as i32);
            probabilities.push(sim.clamp(0.0, 1.0));
        } else {
            raw_ids.push(OUTLIER_TOPIC);
            probabilities.push(0.0);
        }
    }

    let assignments = renumber_by_size(&raw_ids, k);

    Ok(ClusterOutcome {
        assignments,
        probabilities,
    })
}

/// Topic count heuristic for the Auto policy: sqrt(n/2), at least 2 topics
/// once the corpus has more than one document.
fn auto_topic_count(n: usize) -> usize {
    if n == 1 {
        return 1;
    }
    (((n as f64) / 2.0).sqrt().round() as usize).clamp(2, n)
}

/// Unit-normalize a vector; zero vectors stay zero.
fn normalize(v: &[f64]) -> Vec<f64> {
    let mag: f64 = v.iter().map(|x| x * x).sum::<f64>().sqrt();
    if mag < f64::EPSILON {
        return v.to_vec();
    }
    v.iter().map(|x| x / mag).collect()
}

/// Farthest-first seeding: start from the first document, then repeatedly
/// pick the document least similar to every seed so far. Ties resolve to
/// the lowest index.
fn seed_centroids(points: &[Vec<f64>], k: usize) -> Vec<Vec<f64>> {
    let mut seeds: Vec<usize> = vec![0];

    while seeds.len() < k {
        let mut best_idx = None;
        let mut best_score = f64::INFINITY;
        for (i, p) in points.iter().enumerate() {
            if seeds.contains(&i) {
                continue;
            }
            let closest = seeds
                .iter()
                .map(|&s| cosine_signed(p, &points[s]))
                .fold(f64::NEG_INFINITY, f64::max);
            if closest < best_score {
                best_score = closest;
                best_idx = Some(i);
            }
        }
        match best_idx {
            Some(i) => seeds.push(i),
            // Fewer distinct points than requested clusters
            None => break,
        }
    }

    seeds.iter().map(|&i| points[i].clone()).collect()
}

/// Index of the most similar centroid; ties resolve to the lowest index.
fn nearest_centroid(point: &[f64], centroids: &[Vec<f64>]) -> usize {
    let mut best = 0;
    let mut best_sim = f64::NEG_INFINITY;
    for (i, c) in centroids.iter().enumerate() {
        let sim = cosine_signed(point, c);
        if sim > best_sim {
            best_sim = sim;
            best = i;
        }
    }
    best
}

/// Renumber cluster ids so topic 0 is the largest cluster, dropping clusters
/// that ended up empty. The outlier sentinel passes through unchanged.
fn renumber_by_size(raw_ids: &[i32], k: usize) -> Vec<i32> {
    let mut sizes = vec![0usize; k];
    for &id in raw_ids {
        if id != OUTLIER_TOPIC {
            sizes[id as usize] += 1;
        }
    }

    let mut order: Vec<usize> = (0..k).filter(|&c| sizes[c] > 0).collect();
    order.sort_by(|&a, &b| sizes[b].cmp(&sizes[a]).then(a.cmp(&b)));

    let mut mapping = vec![OUTLIER_TOPIC; k];
    for (new_id, &old_id) in order.iter().enumerate() {
        mapping[old_id] = new_id as i32;
    }

    raw_ids
        .iter()
        .map(|&id| {
            if id == OUTLIER_TOPIC {
                OUTLIER_TOPIC
            } else {
                mapping[id as usize]
            }
        })
        .collect()
}
