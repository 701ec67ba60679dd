/* Contracted Cartesian Gaussian shells.

   A shell of angular momentum L holds (L+1)(L+2)/2 Cartesian functions
   x^lx y^ly z^lz exp(-alpha r^2), lx + ly + lz = L, ordered with lx
   descending and then ly descending (xx, xy, xz, yy, yz, zz for L = 2).
   Every component is normalized to unit self-overlap.
*/

use crate::error::BasisError;
use crate::gto::double_factorial_odd;
use nalgebra::Vector3;
use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

pub const SHELL_LABELS: [char; 7] = ['s', 'p', 'd', 'f', 'g', 'h', 'i'];

/// Primitive Gaussian of a shell. `coefficient` already includes the radial
/// normalization of the primitive and the contraction normalization.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub exponent: f64,
    pub coefficient: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Shell {
    pub l: usize,
    pub center: Vector3<f64>,
    pub primitives: Vec<Primitive>,
}

/// Number of Cartesian functions in a shell of angular momentum `l`.
pub fn cartesian_count(l: usize) -> usize {
    (l + 1) * (l + 2) / 2
}

/// Writes the Cartesian exponent triples of shell `l` into `out`, in the
/// canonical order.
pub fn cartesian_components_into(l: usize, out: &mut Vec<[usize; 3]>) {
    out.clear();
    for lx in (0..=l).rev() {
        for ly in (0..=(l - lx)).rev() {
            out.push([lx, ly, l - lx - ly]);
        }
    }
}

pub fn cartesian_components(l: usize) -> Vec<[usize; 3]> {
    let mut out = Vec::with_capacity(cartesian_count(l));
    cartesian_components_into(l, &mut out);
    out
}

/// Angular factor turning the radially normalized primitive into a unit
/// normalized Cartesian component: `1 / sqrt((2lx-1)!! (2ly-1)!! (2lz-1)!!)`.
pub fn component_norm(lxyz: [usize; 3]) -> f64 {
    let df: f64 = lxyz.iter().map(|&l| double_factorial_odd(l)).product();
    1.0 / df.sqrt()
}

// N^2 = (2 alpha / pi)^(3/2) (4 alpha)^l
fn radial_norm(alpha: f64, l: usize) -> f64 {
    ((2.0 * alpha / PI).powf(1.5) * (4.0 * alpha).powi(l as i32)).sqrt()
}

impl Shell {
    /// Builds a shell from raw exponents and contraction coefficients as they
    /// appear in a basis file and normalizes it.
    pub fn new(
        l: usize,
        center: Vector3<f64>,
        exponents: &[f64],
        coefficients: &[f64],
    ) -> Result<Self, BasisError> {
        if exponents.is_empty() {
            return Err(BasisError::InvalidShell(format!(
                "{}-shell without primitives",
                Self::label_of(l)
            )));
        }
        if exponents.len() != coefficients.len() {
            return Err(BasisError::InvalidShell(format!(
                "{} exponents but {} coefficients",
                exponents.len(),
                coefficients.len()
            )));
        }
        if let Some(bad) = exponents.iter().find(|a| !(a.is_finite() && **a > 0.0)) {
            return Err(BasisError::InvalidShell(format!(
                "exponent {} is not a positive finite number",
                bad
            )));
        }
        if let Some(bad) = coefficients.iter().find(|c| !c.is_finite()) {
            return Err(BasisError::InvalidShell(format!(
                "coefficient {} is not finite",
                bad
            )));
        }

        let primitives: Vec<Primitive> = exponents
            .iter()
            .zip(coefficients)
            .map(|(&exponent, &c)| Primitive {
                exponent,
                coefficient: c * radial_norm(exponent, l),
            })
            .collect();

        let mut shell = Shell {
            l,
            center,
            primitives,
        };
        shell.normalize_contraction()?;
        Ok(shell)
    }

    // The self-overlap of a contracted component with the angular factor of
    // component_norm is sum_kl c_k c_l (pi/p)^(3/2) / (2p)^l, independent of
    // which component is taken.
    fn normalize_contraction(&mut self) -> Result<(), BasisError> {
        let l = self.l as i32;
        let mut self_overlap = 0.0;
        for pk in &self.primitives {
            for pl in &self.primitives {
                let p = pk.exponent + pl.exponent;
                self_overlap +=
                    pk.coefficient * pl.coefficient * (PI / p).powf(1.5) / (2.0 * p).powi(l);
            }
        }
        if !(self_overlap.is_finite() && self_overlap > 0.0) {
            return Err(BasisError::InvalidShell(format!(
                "contraction of {}-shell has self-overlap {}",
                self.label(),
                self_overlap
            )));
        }
        let scale = 1.0 / self_overlap.sqrt();
        for prim in &mut self.primitives {
            prim.coefficient *= scale;
        }
        Ok(())
    }

    /// Copy of this shell centered at `center`.
    pub fn centered_at(&self, center: Vector3<f64>) -> Shell {
        Shell {
            l: self.l,
            center,
            primitives: self.primitives.clone(),
        }
    }

    /// Number of basis functions of the shell.
    pub fn size(&self) -> usize {
        cartesian_count(self.l)
    }

    pub fn nprim(&self) -> usize {
        self.primitives.len()
    }

    pub fn label(&self) -> char {
        Self::label_of(self.l)
    }

    fn label_of(l: usize) -> char {
        SHELL_LABELS.get(l).copied().unwrap_or('?')
    }

    /// Values of all Cartesian components at point `r`.
    pub fn evaluate(&self, r: &Vector3<f64>) -> Vec<f64> {
        let d = r - self.center;
        let r2 = d.norm_squared();
        let radial: f64 = self
            .primitives
            .iter()
            .map(|p| p.coefficient * (-p.exponent * r2).exp())
            .sum();
        cartesian_components(self.l)
            .into_iter()
            .map(|lxyz| {
                let angular = d.x.powi(lxyz[0] as i32)
                    * d.y.powi(lxyz[1] as i32)
                    * d.z.powi(lxyz[2] as i32);
                component_norm(lxyz) * angular * radial
            })
            .collect()
    }
}
