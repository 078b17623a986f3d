//! Multidimensional k-means clustering.

use std::fmt;

use rand::seq::SliceRandom;
use rand::Rng;
use serde::Serialize;

use crate::error::{Error, Result};

/// Default convergence threshold on the largest centroid shift.
pub const DEFAULT_CUTOFF: f64 = 0.5;

/// A point in n-dimensional space with an optional label.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Point {
    pub coords: Vec<f64>,
    pub reference: Option<String>,
}

impl Point {
    #[must_use]
    pub fn new(coords: Vec<f64>) -> Self {
        Self {
            coords,
            reference: None,
        }
    }

    #[must_use]
    pub fn with_reference(mut self, reference: impl Into<String>) -> Self {
        self.reference = Some(reference.into());
        self
    }

    pub fn dimension(&self) -> usize {
        self.coords.len()
    }

    /// Euclidean distance to another point of the same dimension.
    pub fn distance(&self, other: &Self) -> Result<f64> {
        if self.dimension() != other.dimension() {
            return Err(Error::Clustering("incomparable points".to_string()));
        }
        Ok(self
            .coords
            .iter()
            .zip(&other.coords)
            .map(|(a, b)| (a - b).powi(2))
            .sum::<f64>()
            .sqrt())
    }
}

impl fmt::Display for Point {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let coords: Vec<String> = self.coords.iter().map(ToString::to_string).collect();
        f.write_str(&coords.join(", "))
    }
}

/// A cluster of points and its centroid.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Cluster {
    pub points: Vec<Point>,
    pub centroid: Point,
}

impl Cluster {
    /// Build a cluster; all points must share one dimension.
    pub fn new(points: Vec<Point>) -> Result<Self> {
        let centroid = centroid_of(&points)?;
        Ok(Self { points, centroid })
    }

    /// Replace the members and return how far the centroid moved.
    pub fn update(&mut self, points: Vec<Point>) -> Result<f64> {
        let centroid = centroid_of(&points)?;
        let shift = self.centroid.distance(&centroid)?;
        self.points = points;
        self.centroid = centroid;
        Ok(shift)
    }
}

#[allow(clippy::cast_precision_loss)]
fn centroid_of(points: &[Point]) -> Result<Point> {
    let Some(first) = points.first() else {
        return Err(Error::Clustering("empty cluster".to_string()));
    };
    let n = first.dimension();
    if points.iter().any(|p| p.dimension() != n) {
        return Err(Error::Clustering("multispace cluster".to_string()));
    }

    let count = points.len() as f64;
    let coords = (0..n)
        .map(|i| points.iter().map(|p| p.coords[i]).sum::<f64>() / count)
        .collect();
    Ok(Point::new(coords))
}

/// Cluster `points` into `k` groups.
///
/// Initial centroids are `k` distinct points sampled with `rng`. Iteration
/// stops once no centroid moves by `cutoff` or more. A cluster that
/// attracts no points in a round keeps its previous members.
pub fn kmeans<R: Rng + ?Sized>(
    points: &[Point],
    k: usize,
    cutoff: f64,
    rng: &mut R,
) -> Result<Vec<Cluster>> {
    if k == 0 {
        return Err(Error::Clustering("k must be positive".to_string()));
    }
    if k > points.len() {
        return Err(Error::Clustering("not enough points".to_string()));
    }

    let mut clusters = points
        .choose_multiple(rng, k)
        .map(|p| Cluster::new(vec![p.clone()]))
        .collect::<Result<Vec<_>>>()?;

    loop {
        let mut assignments: Vec<Vec<Point>> = vec![Vec::new(); clusters.len()];
        for point in points {
            let mut nearest = 0;
            let mut smallest = point.distance(&clusters[0].centroid)?;
            for (idx, cluster) in clusters.iter().enumerate().skip(1) {
                let distance = point.distance(&cluster.centroid)?;
                if distance < smallest {
                    smallest = distance;
                    nearest = idx;
                }
            }
            assignments[nearest].push(point.clone());
        }

        let mut biggest_shift = 0.0_f64;
        for (cluster, members) in clusters.iter_mut().zip(assignments) {
            if members.is_empty() {
                continue;
            }
            biggest_shift = biggest_shift.max(cluster.update(members)?);
        }

        if biggest_shift < cutoff {
            break;
        }
    }

    Ok(clusters)
}

/// Heuristic number of clusters for `n` points.
pub const fn k_from_n(n: usize) -> usize {
    match n {
        0..=30 => 3,
        31..=50 => 4,
        51..=100 => 5,
        101..=200 => 6,
        _ => 8,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn blob(cx: f64, cy: f64, label: &str) -> Vec<Point> {
        [(0.0, 0.0), (0.2, 0.1), (-0.1, 0.2), (0.1, -0.2)]
            .iter()
            .map(|(dx, dy)| Point::new(vec![cx + dx, cy + dy]).with_reference(label))
            .collect()
    }

    #[test]
    fn test_distance() {
        let a = Point::new(vec![0.0, 0.0]);
        let b = Point::new(vec![3.0, 4.0]);
        assert_eq!(a.distance(&b).unwrap(), 5.0);
    }

    #[test]
    fn test_distance_dimension_mismatch() {
        let a = Point::new(vec![0.0, 0.0]);
        let b = Point::new(vec![0.0, 0.0, 0.0]);
        assert!(a.distance(&b).is_err());
    }

    #[test]
    fn test_cluster_centroid() {
        let cluster = Cluster::new(vec![
            Point::new(vec![0.0, 0.0]),
            Point::new(vec![2.0, 4.0]),
        ])
        .unwrap();
        assert_eq!(cluster.centroid.coords, vec![1.0, 2.0]);
    }

    #[test]
    fn test_cluster_rejects_empty_and_mixed() {
        assert!(Cluster::new(vec![]).is_err());
        assert!(Cluster::new(vec![Point::new(vec![1.0]), Point::new(vec![1.0, 2.0])]).is_err());
    }

    #[test]
    fn test_cluster_update_reports_shift() {
        let mut cluster = Cluster::new(vec![Point::new(vec![0.0, 0.0])]).unwrap();
        let shift = cluster.update(vec![Point::new(vec![0.0, 3.0])]).unwrap();
        assert_eq!(shift, 3.0);
        assert_eq!(cluster.points.len(), 1);
    }

    #[test]
    fn test_kmeans_separates_blobs() {
        let mut points = blob(0.0, 0.0, "a");
        points.extend(blob(10.0, 10.0, "b"));
        points.extend(blob(-10.0, 10.0, "c"));

        let mut rng = StdRng::seed_from_u64(7);
        let clusters = kmeans(&points, 3, 0.01, &mut rng).unwrap();

        assert_eq!(clusters.len(), 3);
        assert!(clusters.iter().all(|c| !c.points.is_empty()));
        assert!(clusters.iter().all(|c| c.centroid.dimension() == 2));
    }

    #[test]
    fn test_kmeans_single_cluster_is_mean() {
        let points = blob(5.0, 5.0, "only");
        let mut rng = StdRng::seed_from_u64(1);
        let clusters = kmeans(&points, 1, DEFAULT_CUTOFF, &mut rng).unwrap();
        assert_eq!(clusters.len(), 1);
        assert_eq!(clusters[0].points.len(), 4);
        assert!((clusters[0].centroid.coords[0] - 5.05).abs() < 1e-9);
        assert!((clusters[0].centroid.coords[1] - 5.025).abs() < 1e-9);
    }

    #[test]
    fn test_kmeans_not_enough_points() {
        let points = blob(0.0, 0.0, "a");
        let mut rng = StdRng::seed_from_u64(1);
        assert!(kmeans(&points, 5, DEFAULT_CUTOFF, &mut rng).is_err());
        assert!(kmeans(&points, 0, DEFAULT_CUTOFF, &mut rng).is_err());
    }

    #[test]
    fn test_k_from_n() {
        assert_eq!(k_from_n(10), 3);
        assert_eq!(k_from_n(30), 3);
        assert_eq!(k_from_n(31), 4);
        assert_eq!(k_from_n(50), 4);
        assert_eq!(k_from_n(100), 5);
        assert_eq!(k_from_n(200), 6);
        assert_eq!(k_from_n(201), 8);
    }

    #[test]
    fn test_point_display() {
        assert_eq!(Point::new(vec![1.0, 2.5]).to_string(), "1, 2.5");
    }
}
