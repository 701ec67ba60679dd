use crate::assembly::{assemble, EngineOptions, Matrices};
use crate::engine::{Operators, PointCharge};
use crate::error::Result;
use crate::layout::ShellLayout;
use crate::molecule::Molecule;
use crate::registry::BasisRegistry;
use basis::BasisSet;
use nalgebra::DMatrix;
use std::fmt;
use std::sync::Arc;
use tracing::info;

/// The three one-electron matrices of one pass over the shell pairs.
#[derive(Debug, Clone)]
pub struct OneBodyIntegrals {
    pub overlap: DMatrix<f64>,
    pub kinetic: DMatrix<f64>,
    pub nuclear: DMatrix<f64>,
}

impl OneBodyIntegrals {
    /// Core Hamiltonian `T + V`.
    pub fn core_hamiltonian(&self) -> DMatrix<f64> {
        &self.kinetic + &self.nuclear
    }
}

/// A molecule bound to a basis set, able to produce its one-electron
/// integral matrices.
///
/// The shell layout is built once on construction; every query allocates
/// fresh output matrices and leaves the context untouched, so one context
/// can serve concurrent callers.
#[derive(Debug, Clone)]
pub struct IntegralContext {
    basis_name: String,
    basis: Arc<BasisSet>,
    molecule: Molecule,
    layout: ShellLayout,
    charges: Vec<PointCharge>,
    options: EngineOptions,
}

impl IntegralContext {
    /// Context over the process-wide basis registry.
    pub fn new(atomic_numbers: &[u32], positions: &[[f64; 3]], basis_name: &str) -> Result<Self> {
        let molecule = Molecule::new(atomic_numbers, positions)?;
        Self::from_molecule(BasisRegistry::global()?, molecule, basis_name)
    }

    /// Like [`IntegralContext::new`] with positions as a flat `N x 3` buffer.
    pub fn from_flat(atomic_numbers: &[u32], positions: &[f64], basis_name: &str) -> Result<Self> {
        let molecule = Molecule::from_flat(atomic_numbers, positions)?;
        Self::from_molecule(BasisRegistry::global()?, molecule, basis_name)
    }

    pub fn with_registry(
        registry: &BasisRegistry,
        atomic_numbers: &[u32],
        positions: &[[f64; 3]],
        basis_name: &str,
    ) -> Result<Self> {
        let molecule = Molecule::new(atomic_numbers, positions)?;
        Self::from_molecule(registry, molecule, basis_name)
    }

    pub fn from_molecule(
        registry: &BasisRegistry,
        molecule: Molecule,
        basis_name: &str,
    ) -> Result<Self> {
        let basis = registry.load(basis_name)?;
        let layout = ShellLayout::build(&molecule, &basis)?;
        let charges = PointCharge::from_molecule(&molecule);
        info!(
            "integral context: {} atoms, basis {}, {} shells, {} basis functions",
            molecule.len(),
            basis.name,
            layout.num_shells(),
            layout.nbf()
        );
        Ok(Self {
            basis_name: basis_name.to_string(),
            basis,
            molecule,
            layout,
            charges,
            options: EngineOptions::default(),
        })
    }

    pub fn with_options(mut self, options: EngineOptions) -> Self {
        self.options = options;
        self
    }

    pub fn set_options(&mut self, options: EngineOptions) {
        self.options = options;
    }

    pub fn options(&self) -> &EngineOptions {
        &self.options
    }

    fn compute(&self, ops: Operators) -> Result<Matrices> {
        assemble(&self.layout, &self.charges, ops, &self.options)
    }

    fn take(&self, matrix: Option<DMatrix<f64>>) -> DMatrix<f64> {
        let n = self.layout.nbf();
        matrix.unwrap_or_else(|| DMatrix::zeros(n, n))
    }

    pub fn overlap(&self) -> Result<DMatrix<f64>> {
        let m = self.compute(Operators::OVERLAP)?;
        Ok(self.take(m.overlap))
    }

    pub fn kinetic(&self) -> Result<DMatrix<f64>> {
        let m = self.compute(Operators::KINETIC)?;
        Ok(self.take(m.kinetic))
    }

    pub fn nuclear(&self) -> Result<DMatrix<f64>> {
        let m = self.compute(Operators::NUCLEAR)?;
        Ok(self.take(m.nuclear))
    }

    /// S, T and V from a single traversal of the shell pairs.
    pub fn one_body_integrals(&self) -> Result<OneBodyIntegrals> {
        let m = self.compute(Operators::ALL)?;
        Ok(OneBodyIntegrals {
            overlap: self.take(m.overlap),
            kinetic: self.take(m.kinetic),
            nuclear: self.take(m.nuclear),
        })
    }

    /// The basis name as requested by the caller.
    pub fn basis_name(&self) -> &str {
        &self.basis_name
    }

    pub fn basis(&self) -> &Arc<BasisSet> {
        &self.basis
    }

    pub fn molecule(&self) -> &Molecule {
        &self.molecule
    }

    pub fn layout(&self) -> &ShellLayout {
        &self.layout
    }

    pub fn num_atoms(&self) -> usize {
        self.molecule.len()
    }

    pub fn num_shells(&self) -> usize {
        self.layout.num_shells()
    }

    pub fn nbf(&self) -> usize {
        self.layout.nbf()
    }

    pub fn max_nprim(&self) -> usize {
        self.layout.max_nprim()
    }

    pub fn max_l(&self) -> usize {
        self.layout.max_l()
    }

    pub fn nuclear_repulsion(&self) -> f64 {
        self.molecule.nuclear_repulsion()
    }
}

impl fmt::Display for IntegralContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "IntegralContext(")?;
        writeln!(f, "  basis_name : '{}',", self.basis_name)?;
        writeln!(f, "  num_atoms : {},", self.num_atoms())?;
        writeln!(f, "  num_shells : {},", self.num_shells())?;
        writeln!(f, "  max_nprim : {},", self.max_nprim())?;
        write!(f, "  max_l : {}\n)", self.max_l())
    }
}
