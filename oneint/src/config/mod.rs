//! Configuration for integral runs
//!
//! YAML file settings with optional sections; command-line arguments take
//! precedence over the file.

mod args;

pub use args::Args;

use crate::assembly::EngineOptions;
use crate::error::{IntegralError, Result};
use crate::molecule::Molecule;
use periodic_table_on_an_enum::Element;
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};

pub const BOHR_PER_ANGSTROM: f64 = 1.0 / 0.529_177_210_903;

pub const DEFAULT_BASIS: &str = "sto-3g";

/// Main configuration structure
#[derive(Debug, Deserialize, Serialize)]
pub struct Config {
    pub geometry: Vec<AtomConfig>,
    pub basis: Option<String>,
    pub data_path: Option<String>,
    pub units: Option<Units>,
    pub engine: Option<EngineParams>,
}

/// Atomic position configuration
#[derive(Debug, Deserialize, Serialize)]
pub struct AtomConfig {
    pub element: String,
    pub coords: [f64; 3],
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Units {
    Bohr,
    Angstrom,
}

impl Units {
    pub fn to_bohr(self) -> f64 {
        match self {
            Units::Bohr => 1.0,
            Units::Angstrom => BOHR_PER_ANGSTROM,
        }
    }
}

/// Engine parameters
#[derive(Debug, Deserialize, Serialize, Clone)]
pub struct EngineParams {
    pub parallel: Option<bool>,
    pub timeout_ms: Option<u64>,
}

impl Default for EngineParams {
    fn default() -> Self {
        EngineParams {
            parallel: Some(true),
            timeout_ms: None,
        }
    }
}

impl EngineParams {
    /// Apply default values to any missing parameters
    pub fn with_defaults(mut self) -> Self {
        let defaults = Self::default();
        if self.parallel.is_none() {
            self.parallel = defaults.parallel;
        }
        if self.timeout_ms.is_none() {
            self.timeout_ms = defaults.timeout_ms;
        }
        self
    }

    /// Options for a build starting now.
    pub fn engine_options(&self) -> EngineOptions {
        EngineOptions {
            deadline: self
                .timeout_ms
                .map(|ms| Instant::now() + Duration::from_millis(ms)),
            parallel: self.parallel.unwrap_or(true),
        }
    }
}

impl Config {
    pub fn from_yaml(text: &str) -> std::result::Result<Self, serde_yml::Error> {
        serde_yml::from_str::<Config>(text).map(Config::with_defaults)
    }

    /// Apply defaults to all configuration sections
    pub fn with_defaults(mut self) -> Self {
        if self.basis.is_none() {
            self.basis = Some(DEFAULT_BASIS.to_string());
        }
        if self.units.is_none() {
            self.units = Some(Units::Bohr);
        }
        self.engine = Some(self.engine.take().unwrap_or_default().with_defaults());
        self
    }

    pub fn basis_name(&self) -> &str {
        self.basis.as_deref().unwrap_or(DEFAULT_BASIS)
    }

    pub fn units(&self) -> Units {
        self.units.unwrap_or(Units::Bohr)
    }

    pub fn engine_params(&self) -> EngineParams {
        self.engine.clone().unwrap_or_default().with_defaults()
    }

    /// Molecule of the `geometry` section, converted to bohr.
    pub fn molecule(&self) -> Result<Molecule> {
        let scale = self.units().to_bohr();
        let mut atomic_numbers = Vec::with_capacity(self.geometry.len());
        let mut positions = Vec::with_capacity(self.geometry.len());
        for atom in &self.geometry {
            let element = Element::from_symbol(&atom.element).ok_or_else(|| {
                IntegralError::InvalidGeometry(format!("invalid element symbol: {}", atom.element))
            })?;
            atomic_numbers.push(element.get_atomic_number() as u32);
            positions.push(atom.coords.map(|c| c * scale));
        }
        Molecule::new(&atomic_numbers, &positions)
    }
}
