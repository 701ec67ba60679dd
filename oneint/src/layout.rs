use crate::error::{IntegralError, Result};
use crate::molecule::Molecule;
use basis::{BasisSet, Shell};
use tracing::debug;

/// Shells of a molecule in basis-function order.
///
/// Atom order is kept, and within an atom the order of the basis file.
/// `offsets[i]` is the index of the first function of shell `i`.
#[derive(Debug, Clone)]
pub struct ShellLayout {
    shells: Vec<Shell>,
    offsets: Vec<usize>,
    shell_to_atom: Vec<usize>,
    nbf: usize,
    max_l: usize,
    max_nprim: usize,
}

impl ShellLayout {
    pub fn build(molecule: &Molecule, basis: &BasisSet) -> Result<Self> {
        let mut shells = Vec::new();
        let mut offsets = Vec::new();
        let mut shell_to_atom = Vec::new();
        let mut nbf = 0;

        for (atom_idx, atom) in molecule.atoms().iter().enumerate() {
            let templates = basis.shells_for(atom.atomic_number).ok_or_else(|| {
                IntegralError::UnsupportedElement {
                    atomic_number: atom.atomic_number,
                    basis: basis.name.clone(),
                }
            })?;
            for template in templates {
                offsets.push(nbf);
                shell_to_atom.push(atom_idx);
                nbf += template.size();
                shells.push(template.centered_at(atom.position));
            }
        }

        let max_l = shells.iter().map(|s| s.l).max().unwrap_or(0);
        let max_nprim = shells.iter().map(Shell::nprim).max().unwrap_or(0);
        debug!(
            "shell layout: {} atoms, {} shells, {} basis functions, max l = {}, max nprim = {}",
            molecule.len(),
            shells.len(),
            nbf,
            max_l,
            max_nprim
        );

        Ok(Self {
            shells,
            offsets,
            shell_to_atom,
            nbf,
            max_l,
            max_nprim,
        })
    }

    pub fn shells(&self) -> &[Shell] {
        &self.shells
    }

    pub fn shell(&self, idx: usize) -> &Shell {
        &self.shells[idx]
    }

    pub fn offsets(&self) -> &[usize] {
        &self.offsets
    }

    pub fn offset(&self, idx: usize) -> usize {
        self.offsets[idx]
    }

    pub fn shell_to_atom(&self) -> &[usize] {
        &self.shell_to_atom
    }

    pub fn nbf(&self) -> usize {
        self.nbf
    }

    pub fn num_shells(&self) -> usize {
        self.shells.len()
    }

    pub fn max_l(&self) -> usize {
        self.max_l
    }

    pub fn max_nprim(&self) -> usize {
        self.max_nprim
    }

    /// Unique unordered shell pairs `(i, j)` with `j <= i`, row by row.
    pub fn pairs(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        (0..self.shells.len()).flat_map(|i| self.row_pairs(i))
    }

    /// The pairs of row `i`: `(i, 0)` through `(i, i)`.
    pub fn row_pairs(&self, i: usize) -> impl Iterator<Item = (usize, usize)> {
        (0..=i).map(move |j| (i, j))
    }

    pub fn num_pairs(&self) -> usize {
        let n = self.shells.len();
        n * (n + 1) / 2
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use basis::{parse_basis, BasisFormat};

    const MINI: &str = "\
BASIS \"mini\" CARTESIAN
H    S
      1.0   1.0
O    S
      5.0   1.0
O    P
      1.2   1.0
O    D
      0.8   1.0
END
";

    fn mini() -> BasisSet {
        parse_basis(MINI, BasisFormat::NWChem, "mini").unwrap()
    }

    #[test]
    fn test_offsets_follow_atoms() {
        let mol = Molecule::new(
            &[8, 1, 1],
            &[[0.0; 3], [0.0, 1.4, 1.1], [0.0, -1.4, 1.1]],
        )
        .unwrap();
        let layout = ShellLayout::build(&mol, &mini()).unwrap();
        assert_eq!(layout.num_shells(), 5);
        assert_eq!(layout.offsets(), &[0, 1, 4, 10, 11]);
        assert_eq!(layout.shell_to_atom(), &[0, 0, 0, 1, 2]);
        assert_eq!(layout.nbf(), 12);
        assert_eq!(layout.max_l(), 2);
        assert_eq!(layout.max_nprim(), 1);
        assert_eq!(layout.shell(3).center, mol.atoms()[1].position);
    }

    #[test]
    fn test_pairs_cover_lower_triangle() {
        let mol = Molecule::new(&[8, 1], &[[0.0; 3], [0.0, 0.0, 1.8]]).unwrap();
        let layout = ShellLayout::build(&mol, &mini()).unwrap();
        let pairs: Vec<_> = layout.pairs().collect();
        assert_eq!(pairs.len(), layout.num_pairs());
        assert!(pairs.iter().all(|&(i, j)| j <= i));
        assert_eq!(pairs[..3], [(0, 0), (1, 0), (1, 1)]);
        let row: Vec<_> = layout.row_pairs(3).collect();
        assert_eq!(row, [(3, 0), (3, 1), (3, 2), (3, 3)]);
    }

    #[test]
    fn test_unsupported_element() {
        let mol = Molecule::new(&[1, 26], &[[0.0; 3], [0.0, 0.0, 3.0]]).unwrap();
        let err = ShellLayout::build(&mol, &mini()).unwrap_err();
        assert!(matches!(
            err,
            IntegralError::UnsupportedElement { atomic_number: 26, .. }
        ));
    }
}
