//! # Planet Nine search orchestration
//!
//! This module wires the element converter and the propagator into one search
//! run: seed a hypothetical planet among the known giants, drop the observed
//! Extreme Trans-Neptunian Objects (ETNOs) in as massless test particles,
//! integrate, and score how strongly the surviving particles cluster in
//! longitude of perihelion.
//!
//! ## Pipeline overview
//!
//! 1. **Scenario construction**
//!    [`SearchParams`] (from a published preset or the builder) fixes the
//!    candidate planet; the Sun and giant planets come from the built-in
//!    catalog; each input [`EtnoRecord`] becomes a massless test particle.
//!
//! 2. **Propagation**
//!    The system is recentered on its barycenter, a timestep is chosen from
//!    the shortest massive-body period, and the system is integrated for the
//!    requested duration with the fixed-step leapfrog.
//!
//! 3. **Effect extraction**
//!    Each particle's final heliocentric state is converted back to elements;
//!    the perihelion shift `a_f(1−e_f) − a_i(1−e_i)` and inclination change
//!    are recorded as an [`EtnoEffect`]. Particles whose final elements are
//!    unphysical (numerical breakdown, not physics) are skipped with a
//!    [`SearchWarning`].
//!
//! 4. **Scoring**
//!    The clustering score is the Rayleigh statistic R of the surviving
//!    longitudes of perihelion ϖ = Ω + ω mod 2π, with R = 1 meaning perfect
//!    alignment and R ≈ 0 a uniform spread.
//!
//! Per-object failures never abort a run; they accumulate in
//! [`SearchResult::warnings`]. System-level failures (empty system, zero
//! total mass, fewer than two surviving effects) are returned as errors.

use nalgebra::Vector3;
use serde::{Deserialize, Serialize};

use crate::constants::{Degree, DAYS_PER_YEAR, EARTH_MASS_SOLAR, GAUSS_GRAV_SQUARED};
use crate::kepler::principal_angle;
use crate::keplerian_element::KeplerianElements;
use crate::solar_system::{giant_planets, sun};
use crate::system::{Body, IntegrationWarning, System};
use crate::tyche_errors::TycheError;

/// Final semi-major axes beyond this are numerical breakdown, not dynamics.
const MAX_FINAL_SEMI_MAJOR_AXIS: f64 = 1.0e4;

/// Sanity bound on the perihelion shift of a single particle (AU).
const MAX_PERIHELION_SHIFT: f64 = 500.0;

/// Configuration of one search run: the candidate planet's orbit and mass,
/// and the integration controls.
///
/// Build one from a published preset with [`SearchParams::from_preset`] or
/// customize via [`SearchParams::builder`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchParams {
    // --- Candidate planet ---
    /// Mass in Earth masses.
    pub planet_mass_earth: f64,
    /// Semi-major axis in AU.
    pub semi_major_axis_au: f64,
    pub eccentricity: f64,
    pub inclination_deg: Degree,
    pub ascending_node_deg: Degree,
    pub periapsis_argument_deg: Degree,
    pub mean_anomaly_deg: Degree,

    // --- Integration controls ---
    /// Integration span in years.
    pub duration_years: f64,
    /// Target number of steps per orbit of the shortest-period massive body.
    pub substeps_per_orbit: f64,
    /// Lower timestep bound in days.
    pub min_step_days: f64,
    /// Upper timestep bound in days.
    pub max_step_days: f64,
}

impl SearchParams {
    /// Fluent builder initialized with the defaults of [`SearchParams::default`].
    pub fn builder() -> SearchParamsBuilder {
        SearchParamsBuilder::new()
    }

    /// Resolve a published hypothesis parameter set by name.
    ///
    /// Known presets:
    /// * `"batygin-brown-2016"`: 10 M⊕, a = 700 AU, e = 0.6, i = 30°,
    ///   Ω = 113°, ω = 150°.
    /// * `"brown-batygin-2021"`: 6.2 M⊕, a = 380 AU, e = 0.21, i = 16°,
    ///   Ω = 97°, ω = 138°.
    ///
    /// Returns [`TycheError::UnknownPreset`] for any other name.
    pub fn from_preset(name: &str) -> Result<Self, TycheError> {
        match name {
            "batygin-brown-2016" => Ok(Self {
                planet_mass_earth: 10.0,
                semi_major_axis_au: 700.0,
                eccentricity: 0.6,
                inclination_deg: 30.0,
                ascending_node_deg: 113.0,
                periapsis_argument_deg: 150.0,
                mean_anomaly_deg: 0.0,
                ..Self::default()
            }),
            "brown-batygin-2021" => Ok(Self {
                planet_mass_earth: 6.2,
                semi_major_axis_au: 380.0,
                eccentricity: 0.21,
                inclination_deg: 16.0,
                ascending_node_deg: 97.0,
                periapsis_argument_deg: 138.0,
                mean_anomaly_deg: 0.0,
                ..Self::default()
            }),
            other => Err(TycheError::UnknownPreset(other.to_string())),
        }
    }

    /// Candidate planet mass in solar masses.
    pub fn planet_mass_solar(&self) -> f64 {
        self.planet_mass_earth * EARTH_MASS_SOLAR
    }

    /// Candidate planet elements with angles converted to radians.
    pub fn candidate_elements(&self) -> KeplerianElements {
        KeplerianElements::from_degrees(
            self.semi_major_axis_au,
            self.eccentricity,
            self.inclination_deg,
            self.ascending_node_deg,
            self.periapsis_argument_deg,
            self.mean_anomaly_deg,
        )
    }
}

impl Default for SearchParams {
    fn default() -> Self {
        SearchParams {
            planet_mass_earth: 10.0,
            semi_major_axis_au: 700.0,
            eccentricity: 0.6,
            inclination_deg: 30.0,
            ascending_node_deg: 113.0,
            periapsis_argument_deg: 150.0,
            mean_anomaly_deg: 0.0,

            duration_years: 1000.0,
            // Jupiter sets the shortest period; 2000 substeps keep the
            // energy drift of a millennium run under the warning threshold
            substeps_per_orbit: 2000.0,
            min_step_days: 1.0,
            max_step_days: 1000.0,
        }
    }
}

/// Builder for [`SearchParams`], with validation.
#[derive(Debug, Clone)]
pub struct SearchParamsBuilder {
    params: SearchParams,
}

impl Default for SearchParamsBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl SearchParamsBuilder {
    pub fn new() -> Self {
        Self {
            params: SearchParams::default(),
        }
    }

    // --- Candidate planet ---
    pub fn planet_mass_earth(mut self, v: f64) -> Self {
        self.params.planet_mass_earth = v;
        self
    }
    pub fn semi_major_axis_au(mut self, v: f64) -> Self {
        self.params.semi_major_axis_au = v;
        self
    }
    pub fn eccentricity(mut self, v: f64) -> Self {
        self.params.eccentricity = v;
        self
    }
    pub fn inclination_deg(mut self, v: Degree) -> Self {
        self.params.inclination_deg = v;
        self
    }
    pub fn ascending_node_deg(mut self, v: Degree) -> Self {
        self.params.ascending_node_deg = v;
        self
    }
    pub fn periapsis_argument_deg(mut self, v: Degree) -> Self {
        self.params.periapsis_argument_deg = v;
        self
    }
    pub fn mean_anomaly_deg(mut self, v: Degree) -> Self {
        self.params.mean_anomaly_deg = v;
        self
    }

    // --- Integration controls ---
    pub fn duration_years(mut self, v: f64) -> Self {
        self.params.duration_years = v;
        self
    }
    pub fn substeps_per_orbit(mut self, v: f64) -> Self {
        self.params.substeps_per_orbit = v;
        self
    }
    pub fn min_step_days(mut self, v: f64) -> Self {
        self.params.min_step_days = v;
        self
    }
    pub fn max_step_days(mut self, v: f64) -> Self {
        self.params.max_step_days = v;
        self
    }

    /// Finalize the builder, validating physical and numerical consistency.
    ///
    /// Validation rules
    /// -----------------
    /// * `planet_mass_earth > 0` and finite.
    /// * `semi_major_axis_au > 0`, `0 ≤ eccentricity < 1` (candidate must be
    ///   on a bound orbit).
    /// * `duration_years > 0`.
    /// * `substeps_per_orbit ≥ 1`.
    /// * `0 < min_step_days ≤ max_step_days`.
    pub fn build(self) -> Result<SearchParams, TycheError> {
        let p = &self.params;

        if !(p.planet_mass_earth.is_finite() && p.planet_mass_earth > 0.0) {
            return Err(TycheError::UnphysicalResult(format!(
                "candidate mass must be positive, got {} Earth masses",
                p.planet_mass_earth
            )));
        }
        if !(p.semi_major_axis_au.is_finite() && p.semi_major_axis_au > 0.0) {
            return Err(TycheError::UnphysicalResult(format!(
                "candidate semi-major axis must be positive, got {} AU",
                p.semi_major_axis_au
            )));
        }
        if !(p.eccentricity >= 0.0 && p.eccentricity < 1.0) {
            return Err(TycheError::UnphysicalResult(format!(
                "candidate eccentricity must be in [0, 1), got {}",
                p.eccentricity
            )));
        }
        if !(p.duration_years.is_finite() && p.duration_years > 0.0) {
            return Err(TycheError::UnphysicalResult(format!(
                "duration must be positive, got {} years",
                p.duration_years
            )));
        }
        if !(p.substeps_per_orbit >= 1.0) {
            return Err(TycheError::UnphysicalResult(format!(
                "substeps per orbit must be at least 1, got {}",
                p.substeps_per_orbit
            )));
        }
        if !(p.min_step_days > 0.0 && p.min_step_days <= p.max_step_days) {
            return Err(TycheError::UnphysicalResult(format!(
                "timestep bounds must satisfy 0 < min ≤ max, got [{}, {}] days",
                p.min_step_days, p.max_step_days
            )));
        }

        Ok(self.params)
    }
}

/// One input object: a name and its osculating heliocentric elements.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtnoRecord {
    pub name: String,
    pub elements: KeplerianElements,
}

impl EtnoRecord {
    pub fn new(name: impl Into<String>, elements: KeplerianElements) -> Self {
        Self {
            name: name.into(),
            elements,
        }
    }

    /// Catalog-boundary constructor taking angles in degrees, the form raw
    /// survey rows come in.
    pub fn from_degrees(
        name: impl Into<String>,
        semi_major_axis: f64,
        eccentricity: f64,
        inclination: Degree,
        ascending_node_longitude: Degree,
        periapsis_argument: Degree,
        mean_anomaly: Degree,
    ) -> Self {
        Self::new(
            name,
            KeplerianElements::from_degrees(
                semi_major_axis,
                eccentricity,
                inclination,
                ascending_node_longitude,
                periapsis_argument,
                mean_anomaly,
            ),
        )
    }
}

/// The perturbation suffered by one test particle over the run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EtnoEffect {
    pub name: String,
    pub initial_elements: KeplerianElements,
    pub final_elements: KeplerianElements,
    /// `a_f(1−e_f) − a_i(1−e_i)` in AU.
    pub perihelion_shift_au: f64,
    /// Change of inclination in degrees.
    pub inclination_change_deg: Degree,
}

/// A recoverable anomaly accumulated during a search run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum SearchWarning {
    /// An object's elements could not be converted (either direction); the
    /// object was skipped.
    ConversionFailed { name: String, error: TycheError },
    /// Final elements outside physical bounds, indicating numerical
    /// breakdown; the object was skipped.
    UnphysicalFinalState { name: String, detail: String },
    /// The propagator reported energy drift beyond its threshold.
    EnergyDrift {
        step: usize,
        time: f64,
        relative_drift: f64,
    },
}

/// Everything one search run produced.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResult {
    pub params: SearchParams,
    /// Per-particle perturbations, in input order, skipped objects omitted.
    pub effects: Vec<EtnoEffect>,
    /// Rayleigh statistic R ∈ [0, 1] over the surviving longitudes of
    /// perihelion.
    pub clustering_score: f64,
    pub warnings: Vec<SearchWarning>,
}

/// Rayleigh statistic R = |mean unit vector| of a set of angles.
///
/// R ∈ [0, 1]: 1 for perfectly aligned angles, near 0 for a uniform spread.
/// Fewer than two angles cannot support a concentration statistic and return
/// [`TycheError::InsufficientData`].
pub fn rayleigh_statistic(angles: &[f64]) -> Result<f64, TycheError> {
    if angles.len() < 2 {
        return Err(TycheError::InsufficientData {
            got: angles.len(),
            min: 2,
        });
    }

    let n = angles.len() as f64;
    let (sum_cos, sum_sin) = angles
        .iter()
        .fold((0.0, 0.0), |(c, s), a| (c + a.cos(), s + a.sin()));
    Ok((sum_cos / n).hypot(sum_sin / n))
}

/// Assemble the simulation system for one run.
///
/// The Sun sits at the origin with the giant planets and the candidate planet
/// placed from their heliocentric elements; each ETNO becomes a massless test
/// particle appended after the massive bodies. ETNOs whose elements fail to
/// convert are skipped with a [`SearchWarning::ConversionFailed`]; the
/// returned list holds `(name, initial elements)` of the particles actually
/// present, in body order.
pub fn build_system(
    params: &SearchParams,
    etnos: &[EtnoRecord],
    warnings: &mut Vec<SearchWarning>,
) -> Result<(System, Vec<(String, KeplerianElements)>), TycheError> {
    let mut bodies = vec![sun()];

    for entry in giant_planets() {
        let (position, velocity) = entry.elements.to_cartesian(GAUSS_GRAV_SQUARED)?;
        bodies.push(Body::new(entry.name, entry.mass, position, velocity));
    }

    let candidate = params.candidate_elements();
    let (position, velocity) = candidate.to_cartesian(GAUSS_GRAV_SQUARED)?;
    bodies.push(Body::new(
        "Candidate",
        params.planet_mass_solar(),
        position,
        velocity,
    ));

    let mut included = Vec::with_capacity(etnos.len());
    for etno in etnos {
        match etno.elements.to_cartesian(GAUSS_GRAV_SQUARED) {
            Ok((position, velocity)) => {
                bodies.push(Body::test_particle(etno.name.clone(), position, velocity));
                included.push((etno.name.clone(), etno.elements.clone()));
            }
            Err(error) => warnings.push(SearchWarning::ConversionFailed {
                name: etno.name.clone(),
                error,
            }),
        }
    }

    Ok((System::new(bodies), included))
}

/// Turn one particle's final heliocentric state into an [`EtnoEffect`].
///
/// Conversion failures and finals outside the physical bounds (semi-major
/// axis beyond 10,000 AU, perihelion shift beyond 500 AU) indicate numerical
/// breakdown and come back as the [`SearchWarning`] the orchestrator records
/// for the skipped object.
fn effect_from_final_state(
    name: &str,
    initial: &KeplerianElements,
    position: &Vector3<f64>,
    velocity: &Vector3<f64>,
) -> Result<EtnoEffect, SearchWarning> {
    let final_elements = KeplerianElements::from_cartesian(position, velocity, GAUSS_GRAV_SQUARED)
        .map_err(|error| SearchWarning::ConversionFailed {
            name: name.to_string(),
            error,
        })?;

    if final_elements.semi_major_axis > MAX_FINAL_SEMI_MAJOR_AXIS {
        return Err(SearchWarning::UnphysicalFinalState {
            name: name.to_string(),
            detail: format!(
                "final semi-major axis {} AU exceeds {} AU",
                final_elements.semi_major_axis, MAX_FINAL_SEMI_MAJOR_AXIS
            ),
        });
    }

    let perihelion_shift = final_elements.perihelion_distance() - initial.perihelion_distance();
    if perihelion_shift.abs() > MAX_PERIHELION_SHIFT {
        return Err(SearchWarning::UnphysicalFinalState {
            name: name.to_string(),
            detail: format!(
                "perihelion shift {perihelion_shift} AU exceeds sanity bound {MAX_PERIHELION_SHIFT} AU"
            ),
        });
    }

    let inclination_change_deg =
        (final_elements.inclination - initial.inclination).to_degrees();

    Ok(EtnoEffect {
        name: name.to_string(),
        initial_elements: initial.clone(),
        final_elements,
        perihelion_shift_au: perihelion_shift,
        inclination_change_deg,
    })
}

/// Run one full search: build, recenter, integrate, extract effects, score.
///
/// Arguments
/// ---------
/// * `params`: candidate planet and integration controls (see
///   [`SearchParams`]).
/// * `etnos`: observed objects to perturb, as heliocentric elements.
///
/// Returns
/// -------
/// * A [`SearchResult`] with per-particle [`EtnoEffect`]s, the Rayleigh
///   clustering score, and accumulated warnings.
/// * [`TycheError::InsufficientData`] when fewer than two particles survive
///   to the scoring stage; system-level construction failures propagate
///   unchanged.
pub fn run_search(params: &SearchParams, etnos: &[EtnoRecord]) -> Result<SearchResult, TycheError> {
    let mut warnings = Vec::new();
    let (mut system, included) = build_system(params, etnos, &mut warnings)?;

    system.recenter_to_barycenter()?;
    let dt = system.choose_timestep(
        params.substeps_per_orbit,
        params.min_step_days,
        params.max_step_days,
    );

    let output = system.integrate(params.duration_years * DAYS_PER_YEAR, dt);
    for warning in output.warnings {
        let IntegrationWarning::EnergyDrift {
            step,
            time,
            relative_drift,
        } = warning;
        warnings.push(SearchWarning::EnergyDrift {
            step,
            time,
            relative_drift,
        });
    }

    // Final states are read heliocentrically so the recovered elements use
    // the same frame and µ the initial ones were built with
    let sun_body = system.bodies[0].clone();
    let first_particle = system.bodies.len() - included.len();

    let mut effects = Vec::with_capacity(included.len());
    for (offset, (name, initial)) in included.iter().enumerate() {
        let body = &system.bodies[first_particle + offset];
        let position = body.position - sun_body.position;
        let velocity = body.velocity - sun_body.velocity;

        match effect_from_final_state(name, initial, &position, &velocity) {
            Ok(effect) => effects.push(effect),
            Err(warning) => warnings.push(warning),
        }
    }

    let longitudes: Vec<f64> = effects
        .iter()
        .map(|effect| {
            principal_angle(
                effect.final_elements.ascending_node_longitude
                    + effect.final_elements.periapsis_argument,
            )
        })
        .collect();
    let clustering_score = rayleigh_statistic(&longitudes)?;

    Ok(SearchResult {
        params: params.clone(),
        effects,
        clustering_score,
        warnings,
    })
}
