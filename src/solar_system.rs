//! Built-in catalog of the Sun and the four giant planets.
//!
//! The terrestrial planets are omitted: their combined mass is below 2×10⁻⁵ of
//! the giant-planet total and their short periods would force a far smaller
//! timestep for no dynamical gain in the outer Solar System. Elements are
//! J2000 heliocentric osculating values.

use nalgebra::Vector3;

use crate::constants::SolarMass;
use crate::keplerian_element::KeplerianElements;
use crate::system::Body;

/// One catalog row: a named mass with its heliocentric osculating elements.
#[derive(Debug, Clone)]
pub struct CatalogEntry {
    pub name: &'static str,
    /// Mass in solar masses
    pub mass: SolarMass,
    pub elements: KeplerianElements,
}

/// The Sun, at rest at the origin of the heliocentric frame.
pub fn sun() -> Body {
    Body::new("Sun", 1.0, Vector3::zeros(), Vector3::zeros())
}

/// J2000 osculating elements and IAU masses for Jupiter through Neptune.
///
/// Jupiter's mass is 1/1047.348644 M☉; the others are the corresponding
/// system masses (planet plus satellites), which is what perturbation work
/// on distant orbits wants.
pub fn giant_planets() -> Vec<CatalogEntry> {
    vec![
        CatalogEntry {
            name: "Jupiter",
            mass: 9.5479e-4,
            elements: KeplerianElements::from_degrees(
                5.20288700,
                0.04838624,
                1.30439695,
                100.47390909,
                274.25457074,
                19.66796068,
            ),
        },
        CatalogEntry {
            name: "Saturn",
            mass: 2.85886e-4,
            elements: KeplerianElements::from_degrees(
                9.53667594,
                0.05386179,
                2.48599187,
                113.66242448,
                338.93645383,
                317.35536592,
            ),
        },
        CatalogEntry {
            name: "Uranus",
            mass: 4.36624e-5,
            elements: KeplerianElements::from_degrees(
                19.18916464,
                0.04725744,
                0.77263783,
                74.01692503,
                96.93735127,
                142.28382821,
            ),
        },
        CatalogEntry {
            name: "Neptune",
            mass: 5.15139e-5,
            elements: KeplerianElements::from_degrees(
                30.06992276,
                0.00859048,
                1.77004347,
                131.78422574,
                273.18053653,
                259.91520804,
            ),
        },
    ]
}
