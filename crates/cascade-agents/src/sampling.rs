//! Random draws and squashing functions shared by the decision models.
//!
//! All randomness flows through a caller-supplied [`Rng`] so a single
//! seeded stream drives the entire run.

use std::f64::consts::TAU;

use rand::Rng;

/// Logistic function `1 / (1 + e^-x)`.
///
/// Saturates to exactly 0.0 or 1.0 for large magnitudes; never NaN for
/// finite input.
pub fn sigmoid(x: f64) -> f64 {
    1.0 / (1.0 + (-x).exp())
}

/// Draw from a normal distribution with the given mean and spread.
///
/// Uses the Box-Muller transform over two uniform draws. A negative
/// `std_dev` mirrors the distribution, which is equivalent in law.
pub fn gaussian<R: Rng + ?Sized>(rng: &mut R, mean: f64, std_dev: f64) -> f64 {
    let u1: f64 = rng.random::<f64>().max(f64::MIN_POSITIVE);
    let u2: f64 = rng.random::<f64>();
    let z = (-2.0 * u1.ln()).sqrt() * (TAU * u2).cos();
    mean + std_dev * z
}

/// Uniform draw in `[0, 1)`.
pub fn unit_draw<R: Rng + ?Sized>(rng: &mut R) -> f64 {
    rng.random::<f64>()
}

/// Uniform index in `0..len`, or `None` for an empty range.
pub fn choose_index<R: Rng + ?Sized>(rng: &mut R, len: usize) -> Option<usize> {
    if len == 0 {
        return None;
    }
    Some(rng.random_range(0..len))
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::StdRng;

    use super::*;

    #[test]
    fn sigmoid_midpoint_and_tails() {
        assert!((sigmoid(0.0) - 0.5).abs() < f64::EPSILON);
        assert!(sigmoid(40.0) > 0.999_999);
        assert!(sigmoid(-40.0) < 0.000_001);
        assert!(sigmoid(-1000.0).is_finite());
        assert!(sigmoid(1000.0).is_finite());
    }

    #[test]
    fn sigmoid_is_symmetric() {
        for x in [0.3, 1.7, 4.2] {
            assert!((sigmoid(x) + sigmoid(-x) - 1.0).abs() < 1e-12);
        }
    }

    #[test]
    fn gaussian_sample_moments() {
        let mut rng = StdRng::seed_from_u64(7);
        let n = 20_000_u32;
        let samples: Vec<f64> = (0..n).map(|_| gaussian(&mut rng, 2.0, 0.5)).collect();
        let mean = samples.iter().sum::<f64>() / f64::from(n);
        let var = samples.iter().map(|s| (s - mean).powi(2)).sum::<f64>() / f64::from(n);
        assert!((mean - 2.0).abs() < 0.02, "mean {mean}");
        assert!((var.sqrt() - 0.5).abs() < 0.02, "sd {}", var.sqrt());
    }

    #[test]
    fn gaussian_with_zero_spread_is_the_mean() {
        let mut rng = StdRng::seed_from_u64(1);
        assert!((gaussian(&mut rng, -3.0, 0.0) + 3.0).abs() < f64::EPSILON);
    }

    #[test]
    fn same_seed_same_draws() {
        let mut a = StdRng::seed_from_u64(99);
        let mut b = StdRng::seed_from_u64(99);
        for _ in 0..10 {
            assert_eq!(unit_draw(&mut a).to_bits(), unit_draw(&mut b).to_bits());
        }
    }

    #[test]
    fn choose_index_bounds() {
        let mut rng = StdRng::seed_from_u64(3);
        assert_eq!(choose_index(&mut rng, 0), None);
        assert_eq!(choose_index(&mut rng, 1), Some(0));
        for _ in 0..100 {
            let idx = choose_index(&mut rng, 5);
            assert!(idx.is_some_and(|i| i < 5));
        }
    }
}
