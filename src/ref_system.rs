use nalgebra::{Matrix3, Rotation3, Vector3};

use crate::constants::Radian;

/// Construct a right-handed 3×3 rotation matrix around one of the principal axes (X, Y, or Z).
///
/// This function builds a [`nalgebra::Matrix3`] representing an **active rotation**
/// of a 3D vector by an angle `alpha` around the chosen axis, in the direct
/// (positive/trigonometric) sense.
///
/// # Arguments
///
/// * `alpha` - Rotation angle in **radians**.
/// * `k` - Index of the axis of rotation:
///   * `0` → X-axis
///   * `1` → Y-axis
///   * `2` → Z-axis
///
/// # Returns
///
/// A 3×3 rotation matrix `R` such that the rotated vector is `x' = R · x`.
///
/// # Panics
///
/// Panics if `k > 2`, as only axes 0–2 are valid.
pub fn rotmt(alpha: Radian, k: usize) -> Matrix3<f64> {
    let axis = match k {
        0 => Vector3::x_axis(),
        1 => Vector3::y_axis(),
        2 => Vector3::z_axis(),
        _ => panic!("**** ROTMT: invalid axis index {k} (must be 0,1,2) ****"),
    };

    Rotation3::from_axis_angle(&axis, alpha).into()
}

/// Rotation matrix from the perifocal (orbital-plane) frame to the inertial frame.
///
/// Applies the standard 3-1-3 Euler sequence: rotate by the argument of
/// periapsis ω about Z, by the inclination i about X, then by the longitude of
/// the ascending node Ω about Z. The same matrix transforms both position and
/// velocity.
///
/// Arguments
/// ---------
/// * `inclination`: orbital inclination i (radians).
/// * `ascending_node`: longitude of the ascending node Ω (radians).
/// * `periapsis_argument`: argument of periapsis ω (radians).
///
/// Returns
/// -------
/// * `R = Rz(Ω) · Rx(i) · Rz(ω)`, orthonormal.
pub fn perifocal_to_inertial(
    inclination: Radian,
    ascending_node: Radian,
    periapsis_argument: Radian,
) -> Matrix3<f64> {
    let r1 = rotmt(ascending_node, 2);
    let r2 = rotmt(inclination, 0);
    let r3 = rotmt(periapsis_argument, 2);

    (r1 * r2) * r3
}
