use crate::error::{IntegralError, Result};
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;

/// A nucleus: atomic number and position in bohr.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Atom {
    pub atomic_number: u32,
    pub position: Vector3<f64>,
}

impl Atom {
    pub fn charge(&self) -> f64 {
        self.atomic_number as f64
    }

    /// Element symbol, `"?"` for atomic numbers past the periodic table.
    pub fn symbol(&self) -> &'static str {
        Element::from_atomic_number(self.atomic_number as usize)
            .map(|e| e.get_symbol())
            .unwrap_or("?")
    }
}

/// Ordered list of atoms.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Molecule {
    atoms: Vec<Atom>,
}

impl Molecule {
    /// Pairs every atomic number with the position of the same index.
    pub fn new(atomic_numbers: &[u32], positions: &[[f64; 3]]) -> Result<Self> {
        if atomic_numbers.len() != positions.len() {
            return Err(IntegralError::ShapeMismatch(format!(
                "{} atomic numbers but {} positions",
                atomic_numbers.len(),
                positions.len()
            )));
        }

        let atoms = atomic_numbers
            .iter()
            .zip(positions)
            .enumerate()
            .map(|(idx, (&z, p))| {
                if z == 0 {
                    return Err(IntegralError::InvalidGeometry(format!(
                        "atom {} has atomic number 0",
                        idx
                    )));
                }
                if p.iter().any(|c| !c.is_finite()) {
                    return Err(IntegralError::InvalidGeometry(format!(
                        "atom {} has non-finite coordinates {:?}",
                        idx, p
                    )));
                }
                Ok(Atom {
                    atomic_number: z,
                    position: Vector3::new(p[0], p[1], p[2]),
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self { atoms })
    }

    /// Positions given as a flat row-major `N x 3` buffer.
    pub fn from_flat(atomic_numbers: &[u32], positions: &[f64]) -> Result<Self> {
        if positions.len() % 3 != 0 {
            return Err(IntegralError::ShapeMismatch(format!(
                "flat position buffer of length {} is not N x 3",
                positions.len()
            )));
        }
        let rows: Vec<[f64; 3]> = positions
            .chunks_exact(3)
            .map(|c| [c[0], c[1], c[2]])
            .collect();
        Self::new(atomic_numbers, &rows)
    }

    pub fn atoms(&self) -> &[Atom] {
        &self.atoms
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Copy of the molecule rigidly shifted by `shift`.
    pub fn translated(&self, shift: Vector3<f64>) -> Self {
        Self {
            atoms: self
                .atoms
                .iter()
                .map(|a| Atom {
                    atomic_number: a.atomic_number,
                    position: a.position + shift,
                })
                .collect(),
        }
    }

    /// Classical repulsion between the nuclei, `sum_{A<B} Z_A Z_B / R_AB`.
    pub fn nuclear_repulsion(&self) -> f64 {
        let mut energy = 0.0;
        for (i, a) in self.atoms.iter().enumerate() {
            for b in &self.atoms[..i] {
                let r = (a.position - b.position).norm();
                if r > 0.0 {
                    energy += a.charge() * b.charge() / r;
                }
            }
        }
        energy
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_shape_mismatch() {
        let err = Molecule::new(&[1, 1, 8], &[[0.0; 3], [1.0, 0.0, 0.0]]).unwrap_err();
        assert!(matches!(err, IntegralError::ShapeMismatch(_)));
    }

    #[test]
    fn test_flat_positions() {
        let mol = Molecule::from_flat(&[1, 1], &[0.0, 0.0, 0.0, 0.0, 0.0, 1.4]).unwrap();
        assert_eq!(mol.len(), 2);
        assert_eq!(mol.atoms()[1].position, Vector3::new(0.0, 0.0, 1.4));

        let err = Molecule::from_flat(&[1, 1], &[0.0, 0.0, 0.0, 0.0, 1.4]).unwrap_err();
        assert!(matches!(err, IntegralError::ShapeMismatch(_)));
    }

    #[test]
    fn test_rejects_bad_atoms() {
        let err = Molecule::new(&[1], &[[0.0, f64::NAN, 0.0]]).unwrap_err();
        assert!(matches!(err, IntegralError::InvalidGeometry(_)));
        let err = Molecule::new(&[0], &[[0.0; 3]]).unwrap_err();
        assert!(matches!(err, IntegralError::InvalidGeometry(_)));
    }

    #[test]
    fn test_nuclear_repulsion_h2() {
        let mol = Molecule::new(&[1, 1], &[[0.0; 3], [0.0, 0.0, 1.4]]).unwrap();
        assert!((mol.nuclear_repulsion() - 1.0 / 1.4).abs() < 1e-14);
        assert_eq!(mol.atoms()[0].symbol(), "H");
    }
}
