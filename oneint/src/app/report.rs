use nalgebra::DMatrix;
use oneint::{IntegralContext, Molecule, OneBodyIntegrals};
use tracing::info;

pub fn report_geometry(molecule: &Molecule) {
    info!("\nGeometry (bohr):");
    for (idx, atom) in molecule.atoms().iter().enumerate() {
        info!(
            "  Atom {:>2} {:>2}: [{:+.6}, {:+.6}, {:+.6}]",
            idx + 1,
            atom.symbol(),
            atom.position.x,
            atom.position.y,
            atom.position.z
        );
    }
}

pub fn report_summary(ctx: &IntegralContext, ints: &OneBodyIntegrals) {
    info!("\nOne-electron integrals ({} basis):", ctx.basis_name());
    report_matrix("Overlap S", &ints.overlap);
    report_matrix("Kinetic T", &ints.kinetic);
    report_matrix("Nuclear V", &ints.nuclear);
    info!(
        "  Core Hamiltonian trace: {:.10} au",
        ints.core_hamiltonian().trace()
    );
    info!("  Nuclear repulsion: {:.10} au", ctx.nuclear_repulsion());
}

fn report_matrix(label: &str, matrix: &DMatrix<f64>) {
    info!(
        "  {:<10} shape ({}, {})  trace {:+.10}",
        label,
        matrix.nrows(),
        matrix.ncols(),
        matrix.trace()
    );
}
