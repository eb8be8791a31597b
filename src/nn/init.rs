//! Parameter initialisation and the rotation composition operator.

use std::f64::consts::PI;

use candle_core::{DType, Device, Result, Tensor, Var};
use candle_nn::Init;

/// Xavier/Glorot normal initialisation: stddev = sqrt(2 / (fan_in + fan_out)).
pub fn xavier_normal(fan_in: usize, fan_out: usize) -> Init {
    Init::Randn {
        mean: 0.0,
        stdev: (2.0 / (fan_in + fan_out) as f64).sqrt(),
    }
}

/// Entity table `[num_entities, dim]` with Xavier normal rows.
pub fn entity_table(num_entities: usize, dim: usize, device: &Device) -> Result<Var> {
    let stdev = (2.0 / (num_entities + dim) as f64).sqrt();
    let table = Tensor::randn(0f32, stdev as f32, (num_entities, dim), device)?;
    Var::from_tensor(&table)
}

/// Relation table `[2 * num_relations, dim]` built from random phases.
///
/// Row `r` is `[cos φ_r, sin φ_r]` and row `r + num_relations` is
/// `[cos φ_r, -sin φ_r]`, one phase per half-dimension.
pub fn relation_table(num_relations: usize, dim: usize, device: &Device) -> Result<Var> {
    let phases = Tensor::rand(0f32, (2.0 * PI) as f32, (num_relations, dim / 2), device)?;
    Var::from_tensor(&phase_table(&phases)?)
}

/// Forward and inverse rows for the given phases `[num_relations, dim / 2]`.
pub fn phase_table(phases: &Tensor) -> Result<Tensor> {
    let cos = phases.cos()?;
    let sin = phases.sin()?;
    let forward = Tensor::cat(&[&cos, &sin], 1)?;
    let inverse = Tensor::cat(&[&cos, &sin.neg()?], 1)?;
    Tensor::cat(&[&forward, &inverse], 0)?.to_dtype(DType::F32)
}

/// Complex rotation of `x` by `r`, both `[n, dim]` with real and imaginary halves.
///
/// `[x_re * r_re - x_im * r_im, x_re * r_im + x_im * r_re]`
pub fn rotate(x: &Tensor, r: &Tensor) -> Result<Tensor> {
    let half = x.dim(1)? / 2;
    let (x_re, x_im) = (x.narrow(1, 0, half)?, x.narrow(1, half, half)?);
    let (r_re, r_im) = (r.narrow(1, 0, half)?, r.narrow(1, half, half)?);

    let re = (x_re.broadcast_mul(&r_re)? - x_im.broadcast_mul(&r_im)?)?;
    let im = (x_re.broadcast_mul(&r_im)? + x_im.broadcast_mul(&r_re)?)?;
    Tensor::cat(&[&re, &im], 1)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_inverse_rows_flip_sine() {
        let device = Device::Cpu;
        let table = relation_table(5, 8, &device).unwrap();
        let rows = table.as_tensor().to_vec2::<f32>().unwrap();

        assert_eq!(rows.len(), 10);
        for r in 0..5 {
            let (fwd, inv) = (&rows[r], &rows[r + 5]);
            for k in 0..4 {
                assert!((fwd[k] - inv[k]).abs() < 1e-6, "cos mismatch at {} {}", r, k);
                assert!((fwd[k + 4] + inv[k + 4]).abs() < 1e-6, "sin mismatch at {} {}", r, k);
                // unit modulus per component
                let modulus = fwd[k] * fwd[k] + fwd[k + 4] * fwd[k + 4];
                assert!((modulus - 1.0).abs() < 1e-5);
            }
        }
    }

    #[test]
    fn test_phase_table_known_values() {
        let device = Device::Cpu;
        let phases = Tensor::new(&[[0f32, std::f32::consts::FRAC_PI_2]], &device).unwrap();
        let rows = phase_table(&phases).unwrap().to_vec2::<f32>().unwrap();

        let expected = [[1.0, 0.0, 0.0, 1.0], [1.0, 0.0, 0.0, -1.0]];
        for (row, want) in rows.iter().zip(expected) {
            for (a, b) in row.iter().zip(want) {
                assert!((a - b).abs() < 1e-6);
            }
        }
    }

    #[test]
    fn test_rotate_by_inverse_restores() {
        let device = Device::Cpu;
        let table = relation_table(1, 6, &device).unwrap();
        let fwd = table.as_tensor().narrow(0, 0, 1).unwrap();
        let inv = table.as_tensor().narrow(0, 1, 1).unwrap();
        let x = Tensor::randn(0f32, 1.0, (4, 6), &device).unwrap();

        let back = rotate(&rotate(&x, &fwd).unwrap(), &inv).unwrap();
        let diff: f32 = (back - &x).unwrap().abs().unwrap().max_all().unwrap().to_scalar().unwrap();
        assert!(diff < 1e-5, "max diff {}", diff);
    }

    #[test]
    fn test_entity_table_shape() {
        let table = entity_table(12, 8, &Device::Cpu).unwrap();
        assert_eq!(table.as_tensor().dims(), &[12, 8]);
    }
}
