//! Weighted k-means clustering (Lloyd's algorithm), per SPEC_FULL.md §4.1.
//!
//! Points carry a weight (relative pixel frequency); centroid updates are
//! weighted means rather than plain averages so a color covering more of
//! the image pulls its cluster's centroid harder.

use crate::error::{PbnError, Result};
use rand::rngs::StdRng;
use rand::seq::index::sample;
use rand::SeedableRng;
use rayon::prelude::*;

/// A point in the clustering working space (RGB/HSL/LAB, all represented
/// as 3 f64 components) plus its relative frequency weight.
#[derive(Debug, Clone, Copy)]
pub struct WeightedPoint {
    pub coords: [f64; 3],
    pub weight: f64,
}

impl WeightedPoint {
    pub fn new(coords: [f64; 3], weight: f64) -> Self {
        Self { coords, weight }
    }

    fn distance_sq(&self, other: &[f64; 3]) -> f64 {
        let dx = self.coords[0] - other[0];
        let dy = self.coords[1] - other[1];
        let dz = self.coords[2] - other[2];
        dx * dx + dy * dy + dz * dz
    }
}

pub struct KMeans {
    k: usize,
    min_delta: f64,
    max_iterations: usize,
}

impl KMeans {
    pub fn new(k: usize, min_delta: f64) -> Self {
        Self {
            k,
            min_delta,
            max_iterations: 200,
        }
    }

    /// Runs Lloyd's algorithm to convergence (or `max_iterations`) and
    /// returns `(centroids, assignment)` where `assignment[i]` is the
    /// cluster index of `points[i]`.
    pub fn fit(&self, points: &[WeightedPoint], seed: u64) -> Result<(Vec<[f64; 3]>, Vec<usize>)> {
        if points.is_empty() {
            return Err(PbnError::EmptyInput);
        }
        if self.k == 0 {
            return Err(PbnError::InvalidK(self.k));
        }

        let mut rng = StdRng::seed_from_u64(seed);
        let k = self.k.min(points.len());
        let initial_indices = sample(&mut rng, points.len(), k);
        let mut centroids: Vec<[f64; 3]> = initial_indices
            .into_iter()
            .map(|i| points[i].coords)
            .collect();
        // Pad with the last centroid if k > points.len() was requested; those
        // extra clusters simply stay empty and retain this initial value.
        while centroids.len() < self.k {
            centroids.push(centroids[centroids.len() - 1]);
        }

        let mut assignment = vec![0usize; points.len()];

        for _ in 0..self.max_iterations {
            assignment
                .par_iter_mut()
                .zip(points.par_iter())
                .for_each(|(a, p)| {
                    let mut best = 0usize;
                    let mut best_dist = f64::INFINITY;
                    for (ci, c) in centroids.iter().enumerate() {
                        let d = p.distance_sq(c);
                        if d < best_dist {
                            best_dist = d;
                            best = ci;
                        }
                    }
                    *a = best;
                });

            let mut sums = vec![[0.0f64; 3]; self.k];
            let mut weights = vec![0.0f64; self.k];
            for (p, &a) in points.iter().zip(assignment.iter()) {
                sums[a][0] += p.coords[0] * p.weight;
                sums[a][1] += p.coords[1] * p.weight;
                sums[a][2] += p.coords[2] * p.weight;
                weights[a] += p.weight;
            }

            let mut total_movement = 0.0;
            let mut new_centroids = centroids.clone();
            for i in 0..self.k {
                if weights[i] > 0.0 {
                    let new_c = [
                        sums[i][0] / weights[i],
                        sums[i][1] / weights[i],
                        sums[i][2] / weights[i],
                    ];
                    let dx = new_c[0] - centroids[i][0];
                    let dy = new_c[1] - centroids[i][1];
                    let dz = new_c[2] - centroids[i][2];
                    total_movement += (dx * dx + dy * dy + dz * dz).sqrt();
                    new_centroids[i] = new_c;
                }
            }
            centroids = new_centroids;

            if total_movement <= self.min_delta {
                break;
            }
        }

        Ok((centroids, assignment))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn converges_on_two_obvious_clusters() {
        let points = vec![
            WeightedPoint::new([0.0, 0.0, 0.0], 1.0),
            WeightedPoint::new([0.0, 1.0, 0.0], 1.0),
            WeightedPoint::new([100.0, 0.0, 0.0], 1.0),
            WeightedPoint::new([100.0, 1.0, 0.0], 1.0),
        ];
        let km = KMeans::new(2, 0.001);
        let (_, assignment) = km.fit(&points, 42).unwrap();
        assert_eq!(assignment[0], assignment[1]);
        assert_eq!(assignment[2], assignment[3]);
        assert_ne!(assignment[0], assignment[2]);
    }

    #[test]
    fn empty_input_errors() {
        let km = KMeans::new(2, 0.001);
        assert!(matches!(km.fit(&[], 1), Err(PbnError::EmptyInput)));
    }

    #[test]
    fn zero_k_errors() {
        let points = vec![WeightedPoint::new([0.0, 0.0, 0.0], 1.0)];
        let km = KMeans::new(0, 0.001);
        assert!(matches!(km.fit(&points, 1), Err(PbnError::InvalidK(0))));
    }

    #[test]
    fn deterministic_given_same_seed() {
        let points: Vec<_> = (0..50)
            .map(|i| WeightedPoint::new([i as f64, (i * 3 % 7) as f64, 0.0], 1.0))
            .collect();
        let km = KMeans::new(4, 0.001);
        let (c1, a1) = km.fit(&points, 7).unwrap();
        let (c2, a2) = km.fit(&points, 7).unwrap();
        assert_eq!(a1, a2);
        assert_eq!(c1, c2);
    }
}
