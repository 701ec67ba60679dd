//! End-to-end checks of the integral context against the shipped basis data
//! and reference values for H and H2 in STO-3G (Szabo & Ostlund, ch. 3).

use nalgebra::{DMatrix, Vector3};
use oneint::config::Config;
use oneint::{
    BasisRegistry, EngineOptions, IntegralContext, IntegralError, Molecule, DATA_PATH_ENV,
};
use rand::Rng;
use std::sync::Arc;
use std::time::Instant;

const ROOT: &str = env!("CARGO_MANIFEST_DIR");

const H2O_Z: [u32; 3] = [1, 1, 8];
const H2O_POS: [[f64; 3]; 3] = [[0.0, -0.757, 0.587], [0.0, 0.757, 0.587], [0.0, 0.0, 0.0]];

fn registry() -> BasisRegistry {
    BasisRegistry::new(format!("{ROOT}/../data/basis")).unwrap()
}

fn fixture_registry() -> BasisRegistry {
    BasisRegistry::new(format!("{ROOT}/tests/basis_sets")).unwrap()
}

fn assert_symmetric(m: &DMatrix<f64>, tol: f64) {
    assert!(m.is_square());
    let n = m.nrows();
    for i in 0..n {
        for j in 0..i {
            assert!(
                (m[(i, j)] - m[(j, i)]).abs() < tol,
                "asymmetry at ({i}, {j}): {} vs {}",
                m[(i, j)],
                m[(j, i)]
            );
        }
    }
}

fn max_abs_diff(a: &DMatrix<f64>, b: &DMatrix<f64>) -> f64 {
    (a - b).abs().max()
}

#[test]
fn test_h2o_matrices_symmetric_and_shaped() {
    let registry = registry();
    for basis in ["sto-3g", "6-31g", "6-31g*", "cc-pvdz"] {
        let ctx = IntegralContext::with_registry(&registry, &H2O_Z, &H2O_POS, basis).unwrap();
        let n = ctx.layout().nbf();
        let ints = ctx.one_body_integrals().unwrap();
        for m in [&ints.overlap, &ints.kinetic, &ints.nuclear] {
            assert_eq!(m.shape(), (n, n));
            assert_symmetric(m, 1e-10);
        }
    }
}

#[test]
fn test_h2o_631g_dimensions() {
    let registry = registry();
    let ctx = IntegralContext::with_registry(&registry, &H2O_Z, &H2O_POS, "6-31g").unwrap();
    assert_eq!(ctx.nbf(), 13);
    assert_eq!(ctx.num_atoms(), 3);
    assert_eq!(ctx.num_shells(), 9);
    assert_eq!(ctx.max_l(), 1);
    assert_eq!(ctx.max_nprim(), 6);
    assert_eq!(ctx.overlap().unwrap().shape(), (13, 13));

    let ctx = IntegralContext::with_registry(&registry, &H2O_Z, &H2O_POS, "6-31G*").unwrap();
    assert_eq!(ctx.nbf(), 19);
    assert_eq!(ctx.max_l(), 2);
}

#[test]
fn test_h2o_ccpvdz_general_contractions() {
    let registry = registry();
    let ctx = IntegralContext::with_registry(&registry, &H2O_Z, &H2O_POS, "cc-pVDZ").unwrap();
    // O [3s2p1d] with Cartesian d, H [2s1p]
    assert_eq!(ctx.nbf(), 15 + 2 * 5);
    assert_eq!(ctx.num_shells(), 6 + 2 * 3);
    assert_eq!(ctx.max_l(), 2);
    assert_eq!(ctx.max_nprim(), 9);

    let ints = ctx.one_body_integrals().unwrap();
    for m in [&ints.overlap, &ints.kinetic, &ints.nuclear] {
        assert_symmetric(m, 1e-10);
    }
    for i in 0..ctx.nbf() {
        assert!((ints.overlap[(i, i)] - 1.0).abs() < 1e-8, "S[{i},{i}]");
        assert!(ints.kinetic[(i, i)] > 0.0, "T[{i},{i}]");
    }
    let eigen = ints.overlap.symmetric_eigenvalues();
    assert!(eigen.min() > 0.0);
}

#[test]
fn test_combined_equals_separate() {
    let registry = registry();
    let ctx = IntegralContext::with_registry(&registry, &H2O_Z, &H2O_POS, "6-31g*").unwrap();
    let ints = ctx.one_body_integrals().unwrap();
    assert!(max_abs_diff(&ints.overlap, &ctx.overlap().unwrap()) < 1e-12);
    assert!(max_abs_diff(&ints.kinetic, &ctx.kinetic().unwrap()) < 1e-12);
    assert!(max_abs_diff(&ints.nuclear, &ctx.nuclear().unwrap()) < 1e-12);
}

#[test]
fn test_overlap_diagonal_is_one() {
    let registry = registry();
    let ctx = IntegralContext::with_registry(&registry, &H2O_Z, &H2O_POS, "6-31g*").unwrap();
    let ints = ctx.one_body_integrals().unwrap();
    for i in 0..ctx.nbf() {
        assert!((ints.overlap[(i, i)] - 1.0).abs() < 1e-10, "S[{i},{i}]");
        assert!(ints.kinetic[(i, i)] > 0.0, "T[{i},{i}]");
        assert!(ints.nuclear[(i, i)] < 0.0, "V[{i},{i}]");
    }
    for v in ints.overlap.iter() {
        assert!(v.abs() <= 1.0 + 1e-10);
    }
}

#[test]
fn test_hydrogen_atom_sto3g() {
    let registry = registry();
    let ctx = IntegralContext::with_registry(&registry, &[1], &[[0.0; 3]], "sto-3g").unwrap();
    let ints = ctx.one_body_integrals().unwrap();
    assert_eq!(ints.overlap.shape(), (1, 1));
    assert!((ints.overlap[(0, 0)] - 1.0).abs() < 1e-10);
    assert!((ints.kinetic[(0, 0)] - 0.7600).abs() < 1e-4);
    assert!((ints.nuclear[(0, 0)] + 1.2266).abs() < 1e-4);
}

#[test]
fn test_h2_sto3g_reference_values() {
    let registry = registry();
    let ctx = IntegralContext::with_registry(
        &registry,
        &[1, 1],
        &[[0.0, 0.0, 0.0], [0.0, 0.0, 1.4]],
        "sto-3g",
    )
    .unwrap();
    let ints = ctx.one_body_integrals().unwrap();
    let h = ints.core_hamiltonian();

    assert!((ints.overlap[(0, 1)] - 0.6593).abs() < 1e-4);
    assert!((ints.kinetic[(0, 0)] - 0.7600).abs() < 1e-4);
    assert!((ints.kinetic[(0, 1)] - 0.2365).abs() < 1e-4);
    assert!((h[(0, 0)] + 1.1204).abs() < 1e-4);
    assert!((h[(0, 1)] + 0.9584).abs() < 1e-4);
    assert!((h[(1, 1)] - h[(0, 0)]).abs() < 1e-12);
    assert!((ctx.nuclear_repulsion() - 1.0 / 1.4).abs() < 1e-12);
}

#[test]
fn test_flat_positions_match_rows() {
    let registry = Arc::new(registry());
    let rows = IntegralContext::with_registry(&registry, &H2O_Z, &H2O_POS, "sto-3g").unwrap();
    let flat: Vec<f64> = H2O_POS.iter().flatten().copied().collect();
    let molecule = Molecule::from_flat(&H2O_Z, &flat).unwrap();
    let flat = IntegralContext::from_molecule(&registry, molecule, "sto-3g").unwrap();
    assert_eq!(rows.overlap().unwrap(), flat.overlap().unwrap());
}

#[test]
fn test_unsupported_element() {
    let registry = registry();
    // iron is not part of the shipped STO-3G subset
    let err = IntegralContext::with_registry(&registry, &[26], &[[0.0; 3]], "sto-3g").unwrap_err();
    assert!(matches!(
        err,
        IntegralError::UnsupportedElement {
            atomic_number: 26,
            ..
        }
    ));
}

#[test]
fn test_shape_mismatch() {
    let registry = registry();
    let err = IntegralContext::with_registry(
        &registry,
        &[1, 1, 8],
        &[[0.0; 3], [0.0, 0.0, 1.0]],
        "sto-3g",
    )
    .unwrap_err();
    assert!(matches!(err, IntegralError::ShapeMismatch(_)));
}

#[test]
fn test_second_load_hits_cache() {
    let registry = registry();

    let start = Instant::now();
    let first = registry.load("6-31g").unwrap();
    let cold = start.elapsed();

    let start = Instant::now();
    let second = registry.load("6-31G").unwrap();
    let warm = start.elapsed();

    assert!(Arc::ptr_eq(&first, &second));
    assert!(warm < cold, "cached load took {warm:?}, first load {cold:?}");

    let ctx = IntegralContext::with_registry(&registry, &H2O_Z, &H2O_POS, "631g").unwrap();
    assert!(Arc::ptr_eq(ctx.basis(), &first));
}

#[test]
fn test_serial_matches_parallel() {
    let registry = registry();
    let ctx = IntegralContext::with_registry(&registry, &H2O_Z, &H2O_POS, "6-31g*").unwrap();
    let parallel = ctx.one_body_integrals().unwrap();
    let serial = ctx
        .clone()
        .with_options(EngineOptions {
            parallel: false,
            ..EngineOptions::default()
        })
        .one_body_integrals()
        .unwrap();
    assert_eq!(parallel.overlap, serial.overlap);
    assert_eq!(parallel.kinetic, serial.kinetic);
    assert_eq!(parallel.nuclear, serial.nuclear);
}

#[test]
fn test_translation_invariance() {
    let registry = registry();
    let molecule = Molecule::new(&H2O_Z, &H2O_POS).unwrap();
    let mut rng = rand::thread_rng();
    let shift = Vector3::from_fn(|_, _| rng.gen_range(-3.0..3.0));
    let shifted = molecule.translated(shift);

    let a = IntegralContext::from_molecule(&registry, molecule, "6-31g*").unwrap();
    let b = IntegralContext::from_molecule(&registry, shifted, "6-31g*").unwrap();
    let (ia, ib) = (a.one_body_integrals().unwrap(), b.one_body_integrals().unwrap());
    assert!(max_abs_diff(&ia.overlap, &ib.overlap) < 1e-10);
    assert!(max_abs_diff(&ia.kinetic, &ib.kinetic) < 1e-10);
    assert!(max_abs_diff(&ia.nuclear, &ib.nuclear) < 1e-10);
}

#[test]
fn test_far_atom_reports_numerical_instability() {
    let registry = registry();
    let ctx = IntegralContext::with_registry(
        &registry,
        &[1, 1],
        &[[0.0, 0.0, 0.0], [1e200, 0.0, 0.0]],
        "sto-3g",
    )
    .unwrap();
    assert!(ctx.overlap().is_ok());
    match ctx.nuclear() {
        Err(IntegralError::NumericalInstability {
            shell_a,
            shell_b,
            reason,
        }) => {
            assert!(shell_b <= shell_a && shell_a < 2);
            assert!(reason.contains("not finite"), "{reason}");
        }
        other => panic!("expected NumericalInstability, got {:?}", other),
    }
    assert!(matches!(
        ctx.one_body_integrals(),
        Err(IntegralError::NumericalInstability { .. })
    ));
}

#[test]
fn test_expired_deadline() {
    let registry = registry();
    let ctx = IntegralContext::with_registry(&registry, &H2O_Z, &H2O_POS, "sto-3g")
        .unwrap()
        .with_options(EngineOptions {
            deadline: Some(Instant::now()),
            parallel: false,
        });
    let err = ctx.overlap().unwrap_err();
    assert!(matches!(
        err,
        IntegralError::DeadlineExceeded { completed: 0, .. }
    ));
}

#[test]
fn test_gaussian94_fixture() {
    let fixtures = fixture_registry();
    let g94 = IntegralContext::with_registry(&fixtures, &[1], &[[0.0; 3]], "h-minimal").unwrap();
    let nw = IntegralContext::with_registry(&registry(), &[1], &[[0.0; 3]], "sto-3g").unwrap();
    assert!(max_abs_diff(&g94.kinetic().unwrap(), &nw.kinetic().unwrap()) < 1e-12);
}

#[test]
fn test_broken_basis_file() {
    let fixtures = fixture_registry();
    let err = fixtures.load("broken").unwrap_err();
    match err {
        IntegralError::BasisParse { source, .. } => {
            assert!(matches!(source, basis::BasisError::Parse { line: 4, .. }));
        }
        other => panic!("expected a parse error, got {other:?}"),
    }
    assert!(!fixtures.is_cached("broken"));
}

#[test]
fn test_missing_basis_and_directory() {
    let err = registry().load("def2-qzvppd").unwrap_err();
    assert!(matches!(err, IntegralError::BasisNotFound { .. }));

    let err = BasisRegistry::new(format!("{ROOT}/no/such/dir")).unwrap_err();
    assert!(matches!(err, IntegralError::DataPathNotFound(_)));
}

#[test]
fn test_global_registry_from_env() {
    std::env::set_var(DATA_PATH_ENV, format!("{ROOT}/../data/basis"));
    let ctx = IntegralContext::new(&[1, 1], &[[0.0; 3], [0.0, 0.0, 1.4]], "sto-3g").unwrap();
    assert_eq!(ctx.nbf(), 2);
    assert!(BasisRegistry::global().unwrap().is_cached("sto-3g"));
}

#[test]
fn test_display_layout() {
    let registry = registry();
    let ctx = IntegralContext::with_registry(&registry, &H2O_Z, &H2O_POS, "6-31g").unwrap();
    let expected = "IntegralContext(\n  basis_name : '6-31g',\n  num_atoms : 3,\n  \
                    num_shells : 9,\n  max_nprim : 6,\n  max_l : 1\n)";
    assert_eq!(ctx.to_string(), expected);
}

#[test]
fn test_config_file_geometry() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("h2.yaml");
    std::fs::write(
        &path,
        "geometry:
  - element: H
    coords: [0.0, 0.0, 0.0]
  - element: H
    coords: [0.0, 0.0, 0.7408481]
basis: STO-3G
units: angstrom
",
    )
    .unwrap();

    let config = Config::from_yaml(&std::fs::read_to_string(&path).unwrap()).unwrap();
    let molecule = config.molecule().unwrap();
    let bond = (molecule.atoms()[1].position - molecule.atoms()[0].position).norm();
    assert!((bond - 1.4).abs() < 1e-6);

    let ctx = IntegralContext::from_molecule(&registry(), molecule, config.basis_name()).unwrap();
    assert!((ctx.overlap().unwrap()[(0, 1)] - 0.6593).abs() < 1e-4);
}

#[test]
fn test_demo_configs_run() {
    for name in ["h2_sto3g.yaml", "h2o_631g.yaml"] {
        let text = std::fs::read_to_string(format!("{ROOT}/../demos/{name}")).unwrap();
        let config = Config::from_yaml(&text).unwrap();
        let molecule = config.molecule().unwrap();
        let ctx = IntegralContext::from_molecule(&registry(), molecule, config.basis_name())
            .unwrap()
            .with_options(config.engine_params().engine_options());
        let ints = ctx.one_body_integrals().unwrap();
        assert_eq!(ints.nuclear.nrows(), ctx.nbf());
    }
}
