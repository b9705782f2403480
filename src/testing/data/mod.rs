use rand::prelude::*;

use crate::data::io::CALIFORNIA_FEATURES;
use crate::data::Dataset;

/// Generate random dense features in row-major order.
///
/// Values are uniform in `[min, max]`.
pub fn random_dense_f32(rows: usize, cols: usize, seed: u64, min: f32, max: f32) -> Vec<f32> {
    assert!(max >= min);
    let mut rng = StdRng::seed_from_u64(seed);
    let width = max - min;
    (0..rows * cols)
        .map(|_| min + rng.r#gen::<f32>() * width)
        .collect()
}

/// Linear regression data: features uniform in `[-1, 1]`, target a random
/// linear combination (weights of magnitude in `[0.5, 1.5]`) plus uniform
/// noise of amplitude `noise`.
pub fn synthetic_regression(rows: usize, cols: usize, noise: f32, seed: u64) -> Dataset {
    let features = random_dense_f32(rows, cols, seed, -1.0, 1.0);
    let mut rng = StdRng::seed_from_u64(seed.wrapping_add(1));

    let weights: Vec<f32> = (0..cols)
        .map(|_| {
            let magnitude = 0.5 + rng.r#gen::<f32>();
            if rng.r#gen::<bool>() { magnitude } else { -magnitude }
        })
        .collect();
    let bias: f32 = rng.r#gen::<f32>() - 0.5;

    let targets: Vec<f32> = features
        .chunks_exact(cols.max(1))
        .take(rows)
        .map(|row| {
            let signal: f32 = bias + row.iter().zip(&weights).map(|(x, w)| x * w).sum::<f32>();
            signal + (rng.r#gen::<f32>() * 2.0 - 1.0) * noise
        })
        .collect();

    Dataset::from_rows(features, rows, cols, targets, None).expect("shapes are consistent")
}

/// Approximately normal draw (Irwin-Hall with 12 terms).
fn standard_normal(rng: &mut StdRng) -> f32 {
    (0..12).map(|_| rng.r#gen::<f32>()).sum::<f32>() - 6.0
}

/// Housing-like data with the California housing feature layout.
///
/// Eight features named like the real dataset, with plausible ranges, and a
/// non-linear target in units of 100 000 capped at 5.00001 the way the
/// census data is.
pub fn synthetic_housing(rows: usize, seed: u64) -> Dataset {
    let mut rng = StdRng::seed_from_u64(seed);
    let mut features = Vec::with_capacity(rows * CALIFORNIA_FEATURES.len());
    let mut targets = Vec::with_capacity(rows);

    for _ in 0..rows {
        let med_inc = (0.9 + 0.45 * standard_normal(&mut rng)).exp().clamp(0.5, 15.0);
        let house_age = rng.gen_range(1..=52) as f32;
        let ave_rooms = (4.0 + 0.6 * med_inc + standard_normal(&mut rng)).max(1.0);
        let ave_bedrms = (1.0 + 0.08 * standard_normal(&mut rng)).max(0.5);
        let population = (7.0 + 0.7 * standard_normal(&mut rng)).exp().clamp(3.0, 35_000.0);
        let ave_occup = (2.9 + 0.6 * standard_normal(&mut rng)).max(0.7);
        let latitude = rng.gen_range(32.5f32..42.0);
        // Settlements follow the coast: longitude tracks latitude.
        let coast = -117.0 - (latitude - 32.5) * 0.75;
        let inland = rng.gen_range(0.0f32..4.5).powi(2) / 4.5;
        let longitude = (coast + inland).clamp(-124.35, -114.3);

        let coastal = (-inland).exp();
        let bay_area = (-((latitude - 37.7).powi(2) + (longitude + 122.3).powi(2))).exp();
        let socal = (-((latitude - 34.0).powi(2) + (longitude + 118.3).powi(2)) / 2.0).exp();
        let value = 0.4 * med_inc
            + 1.1 * coastal
            + 0.9 * bay_area
            + 0.5 * socal
            + 0.006 * house_age
            - 0.12 * (ave_occup - 3.0)
            - 0.05 * (ave_rooms - 5.0).abs()
            + 0.25 * standard_normal(&mut rng);

        features.extend([
            med_inc, house_age, ave_rooms, ave_bedrms, population, ave_occup, latitude, longitude,
        ]);
        targets.push(value.clamp(0.14999, 5.00001));
    }

    let names = CALIFORNIA_FEATURES.iter().map(|s| s.to_string()).collect();
    Dataset::from_rows(features, rows, CALIFORNIA_FEATURES.len(), targets, Some(names))
        .expect("shapes are consistent")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_synthetic_regression_shape_and_determinism() {
        let a = synthetic_regression(40, 3, 0.1, 5);
        let b = synthetic_regression(40, 3, 0.1, 5);
        assert_eq!(a.n_samples(), 40);
        assert_eq!(a.n_features(), 3);
        assert_eq!(a.target_slice(), b.target_slice());
    }

    #[test]
    fn test_synthetic_housing_layout() {
        let ds = synthetic_housing(500, 0);
        assert_eq!(ds.n_features(), 8);
        assert_eq!(ds.feature_names()[0], "MedInc");
        assert!(ds.target_slice().iter().all(|&y| (0.14..=5.01).contains(&y)));
        assert!(ds.feature(6).iter().all(|&lat| (32.5..42.0).contains(&lat)));
        assert!(ds.feature(7).iter().all(|&lon| (-124.35..=-114.3).contains(&lon)));
    }
}
