use serde::{Deserialize, Serialize};
use strum::{Display, EnumString};

/// How two embeddings are compared.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize, Display, EnumString)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum DistanceMetric {
    /// L2 distance.
    #[default]
    Euclidean,
    /// `1 - cos(a, b)`. A zero-magnitude vector is at distance 1 from everything.
    Cosine,
}

impl DistanceMetric {
    /// Distance between `a` and `b` under this metric.
    ///
    /// Vectors of different dimensionality are infinitely far apart, so they
    /// never fall within any tolerance.
    pub fn distance(&self, a: &Embedding, b: &Embedding) -> f64 {
        if a.len() != b.len() {
            return f64::INFINITY;
        }
        match self {
            DistanceMetric::Euclidean => a.euclidean_distance(b),
            DistanceMetric::Cosine => {
                let dot = a * b;
                let norm = a.norm() * b.norm();
                if norm == 0.0 { 1.0 } else { 1.0 - dot / norm }
            }
        }
    }
}

#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
pub struct Embedding(Vec<f32>);

impl From<Vec<f32>> for Embedding {
    fn from(value: Vec<f32>) -> Self {
        Self(value)
    }
}

impl From<Embedding> for Vec<f32> {
    fn from(value: Embedding) -> Self {
        value.0
    }
}

impl std::ops::Mul for &Embedding {
    type Output = f64;

    fn mul(self, rhs: Self) -> Self::Output {
        self.0
            .iter()
            .zip(rhs.0.iter())
            .map(|(x, y)| *x as f64 * *y as f64)
            .sum()
    }
}

impl Embedding {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn as_slice(&self) -> &[f32] {
        &self.0
    }

    pub fn norm(&self) -> f64 {
        (self * self).sqrt()
    }

    /// L2 norm of `self - other`, accumulated in `f64`.
    pub fn euclidean_distance(&self, other: &Embedding) -> f64 {
        if self.len() != other.len() {
            return f64::INFINITY;
        }
        self.0
            .iter()
            .zip(other.0.iter())
            .map(|(x, y)| {
                let d = *x as f64 - *y as f64;
                d * d
            })
            .sum::<f64>()
            .sqrt()
    }
}

#[cfg(test)]
mod tests {
    use yare::parameterized;

    use super::*;

    #[parameterized(
        same_point = { vec![1.0, 2.0], vec![1.0, 2.0], 0.0 },
        unit_axis = { vec![0.0, 0.0], vec![0.0, 1.0], 1.0 },
        pythagorean = { vec![0.0, 0.0], vec![3.0, 4.0], 5.0 },
        length_mismatch = { vec![0.0, 0.0], vec![0.0], f64::INFINITY },
    )]
    fn euclidean(a: Vec<f32>, b: Vec<f32>, expected: f64) {
        let d = DistanceMetric::Euclidean.distance(&a.into(), &b.into());
        if expected.is_infinite() {
            assert!(d.is_infinite());
        } else {
            assert!((d - expected).abs() < 1e-9, "got {d}, expected {expected}");
        }
    }

    #[test]
    fn cosine_ignores_magnitude() {
        let a: Embedding = vec![1.0, 1.0].into();
        let b: Embedding = vec![3.0, 3.0].into();
        assert!(DistanceMetric::Cosine.distance(&a, &b).abs() < 1e-9);

        let c: Embedding = vec![1.0, -1.0].into();
        assert!((DistanceMetric::Cosine.distance(&a, &c) - 1.0).abs() < 1e-9);
    }

    #[test]
    fn cosine_with_zero_vector() {
        let zero: Embedding = vec![0.0, 0.0].into();
        let a: Embedding = vec![1.0, 0.0].into();
        assert_eq!(DistanceMetric::Cosine.distance(&zero, &a), 1.0);
    }

    #[test]
    fn metric_parses_from_lowercase() {
        assert_eq!("cosine".parse::<DistanceMetric>().unwrap(), DistanceMetric::Cosine);
        assert_eq!(DistanceMetric::Euclidean.to_string(), "euclidean");
    }
}
