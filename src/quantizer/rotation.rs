//! Random Gaussian rotation.
//!
//! A random orthonormal rotation applied before thresholding spreads
//! variance evenly across dimensions, which improves scalar quantization
//! fidelity on correlated axes. The matrix becomes part of the trained
//! state so indexing and search rotate identically.

use rand::rngs::StdRng;
use rand::SeedableRng;
use rand_distr::{Distribution, StandardNormal};

/// Generate a `dim x dim` random rotation matrix: rows sampled from a
/// standard normal, then Gram-Schmidt orthonormalized.
pub fn generate_rotation_matrix(dim: usize, seed: Option<u64>) -> Vec<Vec<f32>> {
    let mut rng = match seed {
        Some(seed) => StdRng::seed_from_u64(seed),
        None => StdRng::from_entropy(),
    };
    let normal = StandardNormal;

    let mut matrix: Vec<Vec<f32>> = (0..dim)
        .map(|_| (0..dim).map(|_| normal.sample(&mut rng)).collect())
        .collect();

    for i in 0..dim {
        for j in 0..i {
            let dot: f32 = matrix[i]
                .iter()
                .zip(matrix[j].iter())
                .map(|(a, b)| a * b)
                .sum();
            for k in 0..dim {
                matrix[i][k] -= dot * matrix[j][k];
            }
        }
        let norm: f32 = matrix[i].iter().map(|v| v * v).sum::<f32>().sqrt();
        // A degenerate row after projection is vanishingly unlikely; fall
        // back to a basis vector to keep the matrix invertible.
        if norm <= f32::EPSILON {
            matrix[i].iter_mut().for_each(|v| *v = 0.0);
            matrix[i][i] = 1.0;
        } else {
            matrix[i].iter_mut().for_each(|v| *v /= norm);
        }
    }
    matrix
}

/// Apply a rotation matrix to a vector, producing a new rotated vector.
pub fn apply_rotation(vector: &[f32], matrix: &[Vec<f32>]) -> Vec<f32> {
    matrix
        .iter()
        .map(|row| row.iter().zip(vector.iter()).map(|(m, v)| m * v).sum())
        .collect()
}
