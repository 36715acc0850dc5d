use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{
    ANGULAR_MOMENTUM_FLOOR, DPI, ECCENTRICITY_FLOOR, ENERGY_FLOOR, MJD, RADEG,
};
use crate::kepler::{eccentric_to_true, principal_angle, solve_kepler, true_to_eccentric};
use crate::ref_system::perifocal_to_inertial;
use crate::tyche_errors::TycheError;

/// Keplerian orbital elements
/// Units:
/// * `reference_epoch`: MJD (Modified Julian Date), optional
/// * `semi_major_axis`: AU (Astronomical Units)
/// * `eccentricity`: unitless
/// * `inclination`: radians
/// * `ascending_node_longitude`: radians
/// * `periapsis_argument`: radians
/// * `mean_anomaly`: radians
///
/// A bound orbit has `semi_major_axis > 0` and `eccentricity ∈ [0, 1)`.
/// Anything else is flagged by [`validate_bound`](KeplerianElements::validate_bound),
/// never clamped.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct KeplerianElements {
    pub reference_epoch: Option<MJD>,
    pub semi_major_axis: f64,
    pub eccentricity: f64,
    pub inclination: f64,
    pub ascending_node_longitude: f64,
    pub periapsis_argument: f64,
    pub mean_anomaly: f64,
}

impl KeplerianElements {
    /// Build elements from the raw catalog tuple form, with angles in degrees.
    ///
    /// This is the only place where degrees enter the crate; everything
    /// downstream is radians.
    pub fn from_degrees(
        semi_major_axis: f64,
        eccentricity: f64,
        inclination_deg: f64,
        ascending_node_deg: f64,
        periapsis_arg_deg: f64,
        mean_anomaly_deg: f64,
    ) -> Self {
        Self {
            reference_epoch: None,
            semi_major_axis,
            eccentricity,
            inclination: inclination_deg * RADEG,
            ascending_node_longitude: principal_angle(ascending_node_deg * RADEG),
            periapsis_argument: principal_angle(periapsis_arg_deg * RADEG),
            mean_anomaly: principal_angle(mean_anomaly_deg * RADEG),
        }
    }

    /// Attach a reference epoch (MJD).
    pub fn with_epoch(mut self, epoch: MJD) -> Self {
        self.reference_epoch = Some(epoch);
        self
    }

    /// Perihelion distance q = a(1 − e) in AU.
    pub fn perihelion_distance(&self) -> f64 {
        self.semi_major_axis * (1.0 - self.eccentricity)
    }

    /// Whether the elements describe a bound (elliptic) orbit.
    pub fn is_bound(&self) -> bool {
        self.semi_major_axis > 0.0 && (0.0..1.0).contains(&self.eccentricity)
    }

    /// Flag unbound or degenerate elements as [`TycheError::UnphysicalResult`].
    pub fn validate_bound(&self) -> Result<(), TycheError> {
        if self.is_bound() {
            Ok(())
        } else {
            Err(TycheError::UnphysicalResult(format!(
                "unbound orbit: a = {} AU, e = {}",
                self.semi_major_axis, self.eccentricity
            )))
        }
    }

    /// Convert elements to a Cartesian state vector for the gravitational
    /// parameter `mu`.
    ///
    /// Pipeline
    /// --------
    /// 1. Solve Kepler's equation for the eccentric anomaly E
    ///    ([`solve_kepler`], Newton–Raphson with convergence check).
    /// 2. True anomaly ν from E via the half-angle relation.
    /// 3. Perifocal position `(r·cosν, r·sinν, 0)` with `r = a(1 − e·cosE)`
    ///    and perifocal velocity `(√(μa)/r)·(−sinE, √(1−e²)·cosE, 0)`.
    /// 4. Rotate into the inertial frame with the 3-1-3 Euler sequence
    ///    ([`perifocal_to_inertial`]), applied identically to position and
    ///    velocity.
    ///
    /// Arguments
    /// ---------
    /// * `mu`: gravitational parameter in AU³·day⁻² (velocities come out in AU/day).
    ///
    /// Returns
    /// -------
    /// * `(position, velocity)` in AU and AU/day, or
    ///   [`TycheError::UnphysicalResult`] for unbound input elements, or
    ///   [`TycheError::NumericalDivergence`] from the Kepler solver.
    pub fn to_cartesian(&self, mu: f64) -> Result<(Vector3<f64>, Vector3<f64>), TycheError> {
        self.validate_bound()?;

        let a = self.semi_major_axis;
        let ecc = self.eccentricity;

        let ecc_anomaly = solve_kepler(self.mean_anomaly, ecc)?;
        let true_anomaly = eccentric_to_true(ecc_anomaly, ecc);

        let radius = a * (1.0 - ecc * ecc_anomaly.cos());
        let perifocal_pos = Vector3::new(
            radius * true_anomaly.cos(),
            radius * true_anomaly.sin(),
            0.0,
        );

        // Vis-viva scale factor √(μa)/r
        let v_scale = (mu * a).sqrt() / radius;
        let perifocal_vel = Vector3::new(
            -v_scale * ecc_anomaly.sin(),
            v_scale * (1.0 - ecc.powi(2)).sqrt() * ecc_anomaly.cos(),
            0.0,
        );

        let rot = perifocal_to_inertial(
            self.inclination,
            self.ascending_node_longitude,
            self.periapsis_argument,
        );

        Ok((rot * perifocal_pos, rot * perifocal_vel))
    }

    /// Recover orbital elements from a Cartesian state vector (inverse of
    /// [`to_cartesian`](KeplerianElements::to_cartesian)).
    ///
    /// Ill-defined reference directions use one consistent fallback
    /// formulation throughout:
    /// * equatorial orbit (node vector degenerate): Ω = 0, ω measured from
    ///   the inertial X axis;
    /// * circular orbit (eccentricity clamps to 0): ω = 0, the true anomaly
    ///   becomes the argument of latitude measured from the node (from the X
    ///   axis when also equatorial).
    ///
    /// Arguments
    /// ---------
    /// * `position`: AU.
    /// * `velocity`: AU/day.
    /// * `mu`: gravitational parameter in AU³·day⁻².
    ///
    /// Returns
    /// -------
    /// * Elements with `reference_epoch = None`, or
    ///   [`TycheError::DegenerateOrbit`] when the angular momentum or the
    ///   specific energy is numerically zero (orbit undefined), or
    ///   [`TycheError::UnphysicalResult`] for an unbound state (e ≥ 1 or
    ///   a ≤ 0), which is flagged rather than silently returned.
    pub fn from_cartesian(
        position: &Vector3<f64>,
        velocity: &Vector3<f64>,
        mu: f64,
    ) -> Result<Self, TycheError> {
        let radius = position.norm();
        let ang_momentum = position.cross(velocity);
        let h_norm = ang_momentum.norm();
        if h_norm < ANGULAR_MOMENTUM_FLOOR {
            return Err(TycheError::DegenerateOrbit(format!(
                "specific angular momentum {h_norm:e} below {ANGULAR_MOMENTUM_FLOOR:e}"
            )));
        }

        let v_squared = velocity.norm_squared();
        let energy = v_squared / 2.0 - mu / radius;
        if energy.abs() < ENERGY_FLOOR {
            return Err(TycheError::DegenerateOrbit(format!(
                "specific energy {energy:e} is numerically parabolic"
            )));
        }
        let semi_major_axis = -mu / (2.0 * energy);

        // Laplace-Runge-Lenz eccentricity vector
        let ecc_vector =
            ((v_squared - mu / radius) * position - position.dot(velocity) * velocity) / mu;
        let mut eccentricity = ecc_vector.norm();
        if eccentricity < ECCENTRICITY_FLOOR {
            eccentricity = 0.0;
        }

        if eccentricity >= 1.0 || semi_major_axis <= 0.0 {
            return Err(TycheError::UnphysicalResult(format!(
                "unbound state: a = {semi_major_axis} AU, e = {eccentricity}"
            )));
        }

        let inclination = (ang_momentum.z / h_norm).clamp(-1.0, 1.0).acos();

        // Node vector n = ẑ × h
        let node_vector = Vector3::new(-ang_momentum.y, ang_momentum.x, 0.0);
        let n_norm = node_vector.norm();
        let equatorial = n_norm < ANGULAR_MOMENTUM_FLOOR;

        let ascending_node_longitude = if equatorial {
            0.0
        } else {
            principal_angle(node_vector.y.atan2(node_vector.x))
        };

        let (periapsis_argument, true_anomaly) = if eccentricity == 0.0 {
            // Circular: ω ≔ 0, anomaly is the argument of latitude
            let latitude = if equatorial {
                position.y.atan2(position.x)
            } else {
                let cos_u = (node_vector.dot(position) / (n_norm * radius)).clamp(-1.0, 1.0);
                let mut u = cos_u.acos();
                if position.z < 0.0 {
                    u = DPI - u;
                }
                u
            };
            (0.0, principal_angle(latitude))
        } else {
            let periapsis_argument = if equatorial {
                principal_angle(ecc_vector.y.atan2(ecc_vector.x))
            } else {
                let cos_w =
                    (node_vector.dot(&ecc_vector) / (n_norm * eccentricity)).clamp(-1.0, 1.0);
                let mut w = cos_w.acos();
                if ecc_vector.z < 0.0 {
                    w = DPI - w;
                }
                principal_angle(w)
            };

            let cos_nu = (ecc_vector.dot(position) / (eccentricity * radius)).clamp(-1.0, 1.0);
            let mut nu = cos_nu.acos();
            if position.dot(velocity) < 0.0 {
                nu = DPI - nu;
            }
            (periapsis_argument, principal_angle(nu))
        };

        let ecc_anomaly = true_to_eccentric(true_anomaly, eccentricity);
        let mean_anomaly = principal_angle(ecc_anomaly - eccentricity * ecc_anomaly.sin());

        Ok(Self {
            reference_epoch: None,
            semi_major_axis,
            eccentricity,
            inclination,
            ascending_node_longitude,
            periapsis_argument,
            mean_anomaly,
        })
    }
}
