//! # Constants and type definitions for Tyche
//!
//! This module centralizes the **physical constants**, **conversion factors**, and **common type
//! definitions** used throughout the `tyche` library.
//!
//! ## Overview
//!
//! - Gravitational constants in the crate's canonical units (AU, solar masses, days)
//! - Unit conversions (degrees ↔ radians, AU/year ↔ AU/day)
//! - Numerical floors shared by the element converter
//! - Core type aliases used across the crate
//!
//! ## Unit convention
//!
//! All positions are in AU, all masses in solar masses, and all velocities in
//! **AU per day**, everywhere inside the crate. Durations enter the public search
//! API in years and are converted once with [`DAYS_PER_YEAR`]; any AU/year
//! velocity crossing the crate boundary goes through
//! [`au_per_year_to_au_per_day`] / [`au_per_day_to_au_per_year`].

// -------------------------------------------------------------------------------------------------
// Physical constants and unit conversions
// -------------------------------------------------------------------------------------------------

/// 2π, useful for trigonometric conversions
pub const DPI: f64 = 2. * std::f64::consts::PI;

/// Gaussian gravitational constant k (used in classical orbit dynamics)
pub const GAUSS_GRAV: f64 = 0.01720209895;

/// k², the heliocentric gravitational parameter in AU³·M☉⁻¹·day⁻²
pub const GAUSS_GRAV_SQUARED: f64 = GAUSS_GRAV * GAUSS_GRAV;

/// Number of days in a Julian year
pub const DAYS_PER_YEAR: f64 = 365.25;

/// Degrees → radians
pub const RADEG: f64 = std::f64::consts::PI / 180.0;

/// Default squared softening length ε² (AU²) preventing force singularities
/// at small separations
pub const SOFTENING_SQUARED: f64 = 1e-12;

/// One Earth mass expressed in solar masses
pub const EARTH_MASS_SOLAR: f64 = 3.003489e-6;

// -------------------------------------------------------------------------------------------------
// Numerical floors
// -------------------------------------------------------------------------------------------------

/// Specific angular momentum below this magnitude is treated as degenerate
pub const ANGULAR_MOMENTUM_FLOOR: f64 = 1e-10;

/// Eccentricity below this magnitude is numerical noise and clamps to exactly 0
pub const ECCENTRICITY_FLOOR: f64 = 1e-10;

/// Specific orbital energy below this magnitude is treated as degenerate
/// (parabolic, semi-major axis undefined)
pub const ENERGY_FLOOR: f64 = 1e-12;

// -------------------------------------------------------------------------------------------------
// Type aliases
// -------------------------------------------------------------------------------------------------

/// Angle in degrees
pub type Degree = f64;
/// Angle in radians
pub type Radian = f64;
/// Modified Julian Date (days)
pub type MJD = f64;
/// Mass in solar masses
pub type SolarMass = f64;

/// Convert a velocity from AU/year to the crate's canonical AU/day.
pub fn au_per_year_to_au_per_day(v: f64) -> f64 {
    v / DAYS_PER_YEAR
}

/// Convert a velocity from the crate's canonical AU/day to AU/year.
pub fn au_per_day_to_au_per_year(v: f64) -> f64 {
    v * DAYS_PER_YEAR
}

#[cfg(test)]
mod constants_test {
    use super::*;

    #[test]
    fn test_gauss_grav_squared() {
        assert_eq!(GAUSS_GRAV_SQUARED, 2.9591220828559115e-4);
    }

    #[test]
    fn test_velocity_unit_round_trip() {
        let v = 6.283;
        assert_eq!(au_per_day_to_au_per_year(au_per_year_to_au_per_day(v)), v);
        assert_eq!(au_per_year_to_au_per_day(365.25), 1.0);
    }
}
