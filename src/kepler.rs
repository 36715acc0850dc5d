use crate::constants::DPI;
use crate::tyche_errors::TycheError;
use std::f64::consts::PI;

/// Convergence threshold on the Newton correction |ΔE|.
const KEPLER_TOLERANCE: f64 = 1e-10;

/// Iteration cap for the Newton loop; exceeding it is a
/// [`TycheError::NumericalDivergence`], never silently accepted.
const KEPLER_MAX_ITER: usize = 50;

/// Returns the principal value of an angle in radians, in [0, 2π).
pub fn principal_angle(a: f64) -> f64 {
    a.rem_euclid(DPI)
}

/// Solve Kepler's equation M = E − e·sin(E) for the eccentric anomaly E.
///
/// Uses Newton–Raphson with the update `E ← E − (E − e·sinE − M)/(1 − e·cosE)`.
/// The initial guess is `E₀ = M`, switched to π for `e > 0.8` where the
/// equation is stiff near perihelion and the naive guess converges slowly.
///
/// Arguments
/// ---------
/// * `mean_anomaly`: mean anomaly M in radians (any value, reduced internally).
/// * `eccentricity`: orbital eccentricity, expected in [0, 1) for bound orbits.
///
/// Returns
/// -------
/// * The eccentric anomaly E in radians, or
///   [`TycheError::NumericalDivergence`] if the correction has not dropped
///   below 1×10⁻¹⁰ after 50 iterations.
pub fn solve_kepler(mean_anomaly: f64, eccentricity: f64) -> Result<f64, TycheError> {
    let m = principal_angle(mean_anomaly);
    let mut ecc_anomaly = if eccentricity > 0.8 { PI } else { m };
    let mut delta = f64::INFINITY;

    for _ in 0..KEPLER_MAX_ITER {
        delta = (ecc_anomaly - eccentricity * ecc_anomaly.sin() - m)
            / (1.0 - eccentricity * ecc_anomaly.cos());
        ecc_anomaly -= delta;
        if delta.abs() < KEPLER_TOLERANCE {
            return Ok(ecc_anomaly);
        }
    }

    Err(TycheError::NumericalDivergence {
        iterations: KEPLER_MAX_ITER,
        last_delta: delta,
    })
}

/// True anomaly ν from the eccentric anomaly E, via the half-angle relation
/// ν = 2·atan2(√(1+e)·sin(E/2), √(1−e)·cos(E/2)).
pub fn eccentric_to_true(ecc_anomaly: f64, eccentricity: f64) -> f64 {
    let half = ecc_anomaly / 2.0;
    2.0 * ((1.0 + eccentricity).sqrt() * half.sin()).atan2((1.0 - eccentricity).sqrt() * half.cos())
}

/// Eccentric anomaly E from the true anomaly ν (inverse of [`eccentric_to_true`]).
pub fn true_to_eccentric(true_anomaly: f64, eccentricity: f64) -> f64 {
    ((1.0 - eccentricity.powi(2)).sqrt() * true_anomaly.sin())
        .atan2(eccentricity + true_anomaly.cos())
}

/// Keplerian orbital period in days: P = 2π·√(a³/μ).
///
/// Arguments
/// ---------
/// * `semi_major_axis`: a in AU (must be > 0).
/// * `mu`: gravitational parameter in AU³·day⁻².
pub fn orbital_period_days(semi_major_axis: f64, mu: f64) -> f64 {
    DPI * (semi_major_axis.powi(3) / mu).sqrt()
}

#[cfg(test)]
mod kepler_test {
    use super::*;
    use crate::constants::GAUSS_GRAV_SQUARED;
    use approx::assert_relative_eq;

    #[test]
    fn test_principal_angle() {
        assert_eq!(principal_angle(0.0), 0.0);
        assert_relative_eq!(principal_angle(DPI + 0.25), 0.25, epsilon = 1e-14);
        assert_relative_eq!(principal_angle(-0.25), DPI - 0.25, epsilon = 1e-14);
    }

    #[test]
    fn test_solve_kepler_circular() {
        // e = 0 gives E = M exactly, in one iteration
        let m = 1.2345;
        assert_relative_eq!(solve_kepler(m, 0.0).unwrap(), m, epsilon = 1e-12);
    }

    #[test]
    fn test_solve_kepler_satisfies_equation() {
        for &e in &[0.1, 0.3, 0.6, 0.85, 0.95] {
            for &m in &[0.1, 1.0, 2.5, 4.0, 6.0] {
                let ecc_anomaly = solve_kepler(m, e).unwrap();
                let residual = ecc_anomaly - e * ecc_anomaly.sin() - m;
                assert!(
                    residual.abs() < 1e-9,
                    "residual {residual:e} for e={e}, M={m}"
                );
            }
        }
    }

    #[test]
    fn test_solve_kepler_reference_value() {
        // Reference solution cross-checked with a 200-iteration bisection
        let ecc_anomaly = solve_kepler(0.44054589020000004, 0.2835591457).unwrap();
        assert_relative_eq!(ecc_anomaly, 0.6008556081868426, epsilon = 1e-9);
    }

    #[test]
    fn test_solve_kepler_divergence() {
        // A non-finite mean anomaly can never satisfy the convergence test;
        // the solver must surface divergence instead of returning garbage
        let err = solve_kepler(f64::NAN, 0.5).unwrap_err();
        assert!(matches!(err, TycheError::NumericalDivergence { iterations: 50, .. }));
    }

    #[test]
    fn test_anomaly_round_trip() {
        for &e in &[0.0, 0.2, 0.5, 0.9] {
            for &ecc_anomaly in &[0.3, 1.5, 3.0, 5.5] {
                let nu = eccentric_to_true(ecc_anomaly, e);
                let back = principal_angle(true_to_eccentric(nu, e));
                assert_relative_eq!(back, principal_angle(ecc_anomaly), epsilon = 1e-12);
            }
        }
    }

    #[test]
    fn test_orbital_period_one_au() {
        // a = 1 AU around 1 M☉ is the Gaussian year, 2π/k days
        let period = orbital_period_days(1.0, GAUSS_GRAV_SQUARED);
        assert_relative_eq!(period, DPI / 0.01720209895, epsilon = 1e-12);
        assert!((period - 365.2568983).abs() < 1e-6);
    }
}
