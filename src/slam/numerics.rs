//! Checked inversion of symmetric positive-definite blocks

use nalgebra::{Cholesky, DMatrix, Dyn, Matrix2};
use tracing::warn;

use crate::common::{SlamError, SlamResult};
use crate::slam::config::GraphSlamConfig;

/// Classify a spectrum and return the condition number.
///
/// Fails with `SingularBlock` when the reciprocal condition number is at or
/// below the configured tolerance; logs a warning when the condition number
/// exceeds the ill-conditioning threshold.
fn check_spectrum<'a>(
    label: &str,
    eigenvalues: impl Iterator<Item = &'a f64>,
    config: &GraphSlamConfig,
) -> SlamResult<f64> {
    let (min, max) = eigenvalues.fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &e| {
        (lo.min(e), hi.max(e))
    });
    let reciprocal_condition = if max > 0.0 { min / max } else { 0.0 };

    if !(reciprocal_condition > config.singular_tolerance) {
        return Err(SlamError::SingularBlock {
            block: label.to_string(),
            reciprocal_condition,
        });
    }

    let condition_number = 1.0 / reciprocal_condition;
    if condition_number > config.ill_conditioning_threshold {
        warn!(block = label, condition_number, "ill-conditioned information block");
    }
    Ok(condition_number)
}

/// Invert a landmark-landmark information block
pub(crate) fn invert_landmark_block(
    label: &str,
    block: &Matrix2<f64>,
    config: &GraphSlamConfig,
) -> SlamResult<Matrix2<f64>> {
    let sym = (block + block.transpose()) * 0.5;
    let eigenvalues = sym.symmetric_eigenvalues();
    check_spectrum(label, eigenvalues.iter(), config)?;

    sym.cholesky().map(|c| c.inverse()).ok_or_else(|| SlamError::SingularBlock {
        block: label.to_string(),
        reciprocal_condition: 0.0,
    })
}

/// Cholesky factorization of the reduced pose system, with its condition number
pub(crate) fn factor_pose_system(
    omega: &DMatrix<f64>,
    config: &GraphSlamConfig,
) -> SlamResult<(Cholesky<f64, Dyn>, f64)> {
    let label = "reduced pose system";
    let sym = (omega + omega.transpose()) * 0.5;
    let eigenvalues = sym.symmetric_eigenvalues();
    let condition_number = check_spectrum(label, eigenvalues.iter(), config)?;

    let chol = sym.cholesky().ok_or_else(|| SlamError::SingularBlock {
        block: label.to_string(),
        reciprocal_condition: 0.0,
    })?;
    Ok((chol, condition_number))
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    #[test]
    fn test_invert_well_conditioned_block() {
        let config = GraphSlamConfig::default();
        let block = Matrix2::new(4.0, 1.0, 1.0, 3.0);
        let inv = invert_landmark_block("lm", &block, &config).unwrap();
        assert_relative_eq!(block * inv, Matrix2::identity(), epsilon = 1e-12);
    }

    #[test]
    fn test_singular_block_is_reported() {
        let config = GraphSlamConfig::default();
        let block = Matrix2::new(1.0, 1.0, 1.0, 1.0);
        let err = invert_landmark_block("landmark 3", &block, &config).unwrap_err();
        match err {
            SlamError::SingularBlock { block, .. } => assert_eq!(block, "landmark 3"),
            other => panic!("unexpected error {:?}", other),
        }
    }

    #[test]
    fn test_zero_block_is_singular() {
        let config = GraphSlamConfig::default();
        assert!(invert_landmark_block("lm", &Matrix2::zeros(), &config).is_err());
    }

    #[test]
    fn test_pose_system_condition_number() {
        let config = GraphSlamConfig::default();
        let omega = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![1.0, 10.0, 100.0]));
        let (chol, cond) = factor_pose_system(&omega, &config).unwrap();
        assert_relative_eq!(cond, 100.0, epsilon = 1e-9);
        assert_relative_eq!(chol.inverse()[(2, 2)], 0.01, epsilon = 1e-12);
    }

    #[test]
    fn test_ill_conditioned_block_is_not_fatal() {
        let config = GraphSlamConfig::default().with_ill_conditioning_threshold(10.0);
        assert!(config.validate().is_ok());

        let block = Matrix2::new(1.0, 0.0, 0.0, 100.0);
        let inv = invert_landmark_block("lm", &block, &config).unwrap();
        assert_relative_eq!(inv, Matrix2::new(1.0, 0.0, 0.0, 0.01), epsilon = 1e-12);

        let omega = DMatrix::from_diagonal(&nalgebra::DVector::from_vec(vec![1.0, 100.0]));
        let (_, cond) = factor_pose_system(&omega, &config).unwrap();
        assert!(cond > config.ill_conditioning_threshold);
        assert_relative_eq!(cond, 100.0, epsilon = 1e-9);
    }
}
