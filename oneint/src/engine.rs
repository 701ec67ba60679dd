/* Shell-pair driver for the one-electron integrals.

   For every primitive pair the Hermite tables E^{ij}_t are filled once per
   direction and shared by all requested operators:

     S = Ex_0 Ey_0 Ez_0 (pi / p)^(3/2)
     T = Tx Sy Sz + Sx Ty Sz + Sx Sy Tz
     V = -sum_C Z_C 2 pi / p sum_{tuv} Ex_t Ey_u Ez_v R_{tuv}(p, P - C)
*/

use basis::gto::{HermiteCoulomb, HermiteE, EXPONENT_FLOOR};
use basis::helper::boys_array;
use basis::shell::{cartesian_components_into, component_norm};
use basis::{BasisError, Shell};
use itertools::iproduct;
use nalgebra::Vector3;
use std::f64::consts::PI;
use std::ops::BitOr;

use crate::molecule::Molecule;

/// Set of one-electron operators evaluated in one pass.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Operators(u8);

impl Operators {
    pub const NONE: Operators = Operators(0);
    pub const OVERLAP: Operators = Operators(1);
    pub const KINETIC: Operators = Operators(1 << 1);
    pub const NUCLEAR: Operators = Operators(1 << 2);
    pub const ALL: Operators = Operators(0b111);

    pub fn contains(self, other: Operators) -> bool {
        self.0 & other.0 == other.0
    }

    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

impl BitOr for Operators {
    type Output = Operators;

    fn bitor(self, rhs: Operators) -> Operators {
        Operators(self.0 | rhs.0)
    }
}

/// Attracting point charge of the nuclear potential.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PointCharge {
    pub charge: f64,
    pub position: Vector3<f64>,
}

impl PointCharge {
    pub fn from_molecule(molecule: &Molecule) -> Vec<PointCharge> {
        molecule
            .atoms()
            .iter()
            .map(|a| PointCharge {
                charge: a.charge(),
                position: a.position,
            })
            .collect()
    }
}

/// Gaussian product of one primitive pair: combined exponent `p`, reduced
/// exponent `mu`, product center `P` and its offsets from both shell centers.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitivePair {
    pub alpha: f64,
    pub beta: f64,
    pub p: f64,
    pub mu: f64,
    pub center: Vector3<f64>,
    pub pa: Vector3<f64>,
    pub pb: Vector3<f64>,
    pub coefficient: f64,
}

/// Primitive products of a bra and a ket shell, rebuilt in place per pair.
#[derive(Debug, Clone, Default)]
pub struct ShellPair {
    pub ab: Vector3<f64>,
    pub primitives: Vec<PrimitivePair>,
}

impl ShellPair {
    pub fn build(&mut self, a: &Shell, b: &Shell) {
        self.ab = a.center - b.center;
        self.primitives.clear();
        for pa in &a.primitives {
            for pb in &b.primitives {
                let (alpha, beta) = (pa.exponent, pb.exponent);
                let p = (alpha + beta).max(EXPONENT_FLOOR);
                let center = (a.center * alpha + b.center * beta) / p;
                self.primitives.push(PrimitivePair {
                    alpha,
                    beta,
                    p,
                    mu: alpha * beta / p,
                    center,
                    pa: center - a.center,
                    pb: center - b.center,
                    coefficient: pa.coefficient * pb.coefficient,
                });
            }
        }
    }

    /// `exp(-mu |A - B|^2)` of primitive pair `k`.
    pub fn gaussian_factor(&self, k: usize) -> f64 {
        (-self.primitives[k].mu * self.ab.norm_squared()).exp()
    }
}

/// Integral blocks of one shell pair, row-major `na x nb`. Blocks of
/// operators that were not requested are left empty.
#[derive(Debug, Clone, Default)]
pub struct PairBlocks {
    pub na: usize,
    pub nb: usize,
    pub overlap: Vec<f64>,
    pub kinetic: Vec<f64>,
    pub nuclear: Vec<f64>,
}

impl PairBlocks {
    fn reset(&mut self, na: usize, nb: usize, ops: Operators) {
        self.na = na;
        self.nb = nb;
        for (block, op) in [
            (&mut self.overlap, Operators::OVERLAP),
            (&mut self.kinetic, Operators::KINETIC),
            (&mut self.nuclear, Operators::NUCLEAR),
        ] {
            block.clear();
            if ops.contains(op) {
                block.resize(na * nb, 0.0);
            }
        }
    }

    fn check_finite(&self) -> Result<(), BasisError> {
        for (name, block) in [
            ("overlap", &self.overlap),
            ("kinetic", &self.kinetic),
            ("nuclear attraction", &self.nuclear),
        ] {
            if let Some(idx) = block.iter().position(|v| !v.is_finite()) {
                return Err(BasisError::Numerical(format!(
                    "non-finite {} element at ({}, {})",
                    name,
                    idx / self.nb,
                    idx % self.nb
                )));
            }
        }
        Ok(())
    }
}

/// Per-thread workspace. Every buffer grows to the largest pair seen and is
/// reused afterwards.
#[derive(Debug, Default)]
pub struct OneBodyEngine {
    ex: HermiteE,
    ey: HermiteE,
    ez: HermiteE,
    coulomb: HermiteCoulomb,
    pair: ShellPair,
    boys: Vec<f64>,
    comps_a: Vec<[usize; 3]>,
    comps_b: Vec<[usize; 3]>,
    norms_a: Vec<f64>,
    norms_b: Vec<f64>,
    blocks: PairBlocks,
}

impl OneBodyEngine {
    pub fn new() -> Self {
        Self::default()
    }

    /// Workspace pre-sized for shells up to angular momentum `max_l`.
    pub fn with_max_l(max_l: usize) -> Self {
        let mut engine = Self::default();
        engine.boys.resize(2 * max_l + 1, 0.0);
        engine
    }

    /// Evaluates the operators in `ops` for the shell pair `(a, b)`.
    pub fn compute(
        &mut self,
        a: &Shell,
        b: &Shell,
        ops: Operators,
        charges: &[PointCharge],
    ) -> Result<&PairBlocks, BasisError> {
        let (la, lb) = (a.l, b.l);
        cartesian_components_into(la, &mut self.comps_a);
        cartesian_components_into(lb, &mut self.comps_b);
        self.norms_a.clear();
        self.norms_a.extend(self.comps_a.iter().map(|&c| component_norm(c)));
        self.norms_b.clear();
        self.norms_b.extend(self.comps_b.iter().map(|&c| component_norm(c)));

        let (na, nb) = (self.comps_a.len(), self.comps_b.len());
        self.blocks.reset(na, nb, ops);
        if ops.is_empty() {
            return Ok(&self.blocks);
        }

        let want_s = ops.contains(Operators::OVERLAP);
        let want_t = ops.contains(Operators::KINETIC);
        let want_v = ops.contains(Operators::NUCLEAR) && !charges.is_empty();
        let lb_fill = if want_t { lb + 2 } else { lb };
        let lsum = la + lb;
        if self.boys.len() <= lsum {
            self.boys.resize(lsum + 1, 0.0);
        }

        self.pair.build(a, b);
        for (k, prim) in self.pair.primitives.iter().enumerate() {
            let (beta, p) = (prim.beta, prim.p);
            let coef = prim.coefficient;

            // the whole exp(-mu |A - B|^2) seeds the x table
            let e00 = self.pair.gaussian_factor(k);
            self.ex.fill_product(la, lb_fill, p, prim.pa.x, prim.pb.x, e00);
            self.ey.fill_product(la, lb_fill, p, prim.pa.y, prim.pb.y, 1.0);
            self.ez.fill_product(la, lb_fill, p, prim.pa.z, prim.pb.z, 1.0);

            let sqrt_pi_p = (PI / p).sqrt();
            if want_s || want_t {
                for (i, ca) in self.comps_a.iter().enumerate() {
                    for (j, cb) in self.comps_b.iter().enumerate() {
                        let scale = coef * self.norms_a[i] * self.norms_b[j];
                        let sx = self.ex.get(ca[0], cb[0], 0) * sqrt_pi_p;
                        let sy = self.ey.get(ca[1], cb[1], 0) * sqrt_pi_p;
                        let sz = self.ez.get(ca[2], cb[2], 0) * sqrt_pi_p;
                        let idx = i * nb + j;
                        if want_s {
                            self.blocks.overlap[idx] += scale * sx * sy * sz;
                        }
                        if want_t {
                            let tx = self.ex.kinetic(ca[0], cb[0], beta) * sqrt_pi_p;
                            let ty = self.ey.kinetic(ca[1], cb[1], beta) * sqrt_pi_p;
                            let tz = self.ez.kinetic(ca[2], cb[2], beta) * sqrt_pi_p;
                            self.blocks.kinetic[idx] +=
                                scale * (tx * sy * sz + sx * ty * sz + sx * sy * tz);
                        }
                    }
                }
            }

            if want_v {
                let prefactor = 2.0 * PI / p;
                for charge in charges {
                    let pc = prim.center - charge.position;
                    boys_array(lsum, p * pc.norm_squared(), &mut self.boys)?;
                    self.coulomb.fill(lsum, p, [pc.x, pc.y, pc.z], &self.boys);

                    let weight = -charge.charge * prefactor * coef;
                    for (i, ca) in self.comps_a.iter().enumerate() {
                        for (j, cb) in self.comps_b.iter().enumerate() {
                            let hermite_sum: f64 = iproduct!(
                                0..=(ca[0] + cb[0]),
                                0..=(ca[1] + cb[1]),
                                0..=(ca[2] + cb[2])
                            )
                            .map(|(t, u, v)| {
                                self.ex.get(ca[0], cb[0], t)
                                    * self.ey.get(ca[1], cb[1], u)
                                    * self.ez.get(ca[2], cb[2], v)
                                    * self.coulomb.get(t, u, v)
                            })
                            .sum();
                            self.blocks.nuclear[i * nb + j] += weight
                                * self.norms_a[i]
                                * self.norms_b[j]
                                * hermite_sum;
                        }
                    }
                }
            }
        }

        self.blocks.check_finite()?;
        Ok(&self.blocks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn s_shell(alpha: f64, center: [f64; 3]) -> Shell {
        Shell::new(0, Vector3::from(center), &[alpha], &[1.0]).unwrap()
    }

    #[test]
    fn test_operator_set() {
        let ops = Operators::OVERLAP | Operators::NUCLEAR;
        assert!(ops.contains(Operators::OVERLAP));
        assert!(!ops.contains(Operators::KINETIC));
        assert!(Operators::ALL.contains(ops));
        assert!(Operators::NONE.is_empty());
    }

    #[test]
    fn test_shell_pair_products() {
        let a = s_shell(0.8, [0.0; 3]);
        let b = s_shell(1.2, [0.0, 0.0, 1.0]);
        let mut pair = ShellPair::default();
        pair.build(&a, &b);
        assert_eq!(pair.primitives.len(), 1);
        let prim = pair.primitives[0];
        assert!((prim.p - 2.0).abs() < 1e-15);
        assert!((prim.mu - 0.48).abs() < 1e-15);
        assert!((prim.center.z - 0.6).abs() < 1e-15);
        assert!((prim.pa.z - 0.6).abs() < 1e-15);
        assert!((prim.pb.z + 0.4).abs() < 1e-15);
        assert!((pair.gaussian_factor(0) - (-0.48f64).exp()).abs() < 1e-15);

        pair.build(&a, &a);
        assert_eq!(pair.ab, Vector3::zeros());
        assert_eq!(pair.gaussian_factor(0), 1.0);
    }

    #[test]
    fn test_s_primitive_closed_forms() {
        // two normalized s primitives: S = (4ab/p^2)^(3/4) exp(-mu R^2)
        let (a, b) = (0.8, 1.3);
        let r = 1.1;
        let sa = s_shell(a, [0.0, 0.0, 0.0]);
        let sb = s_shell(b, [0.0, 0.0, r]);
        let mut engine = OneBodyEngine::new();
        let blocks = engine.compute(&sa, &sb, Operators::ALL, &[]).unwrap();

        let p = a + b;
        let mu = a * b / p;
        let s = (4.0 * a * b / (p * p)).powf(0.75) * (-mu * r * r).exp();
        let t = mu * (3.0 - 2.0 * mu * r * r) * s;
        assert!((blocks.overlap[0] - s).abs() < 1e-13);
        assert!((blocks.kinetic[0] - t).abs() < 1e-13);
        assert!(blocks.nuclear.iter().all(|&v| v == 0.0));
    }

    #[test]
    fn test_s_primitive_nuclear_attraction() {
        // one unit charge on the product center: V = -2 pi / p K (norms)
        let a = 0.6;
        let shell = s_shell(a, [0.0; 3]);
        let charge = PointCharge {
            charge: 1.0,
            position: Vector3::zeros(),
        };
        let mut engine = OneBodyEngine::new();
        let v = engine
            .compute(&shell, &shell, Operators::NUCLEAR, &[charge])
            .unwrap()
            .nuclear[0];
        // <s|1/r|s> = 2 sqrt(2a/pi) for a normalized s Gaussian
        let expected = -2.0 * (2.0 * a / PI).sqrt();
        assert!((v - expected).abs() < 1e-12);
    }

    #[test]
    fn test_p_components_orthonormal_on_one_center() {
        let shell = Shell::new(1, Vector3::zeros(), &[1.2, 0.3], &[0.4, 0.7]).unwrap();
        let mut engine = OneBodyEngine::new();
        let blocks = engine
            .compute(&shell, &shell, Operators::OVERLAP, &[])
            .unwrap();
        assert_eq!((blocks.na, blocks.nb), (3, 3));
        assert!(blocks.kinetic.is_empty());
        for i in 0..3 {
            for j in 0..3 {
                let expected = if i == j { 1.0 } else { 0.0 };
                assert!((blocks.overlap[i * 3 + j] - expected).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn test_workspace_reuse_does_not_leak_between_pairs() {
        let d = Shell::new(2, Vector3::new(0.3, -0.2, 0.5), &[0.9], &[1.0]).unwrap();
        let s1 = s_shell(0.5, [0.0; 3]);
        let s2 = s_shell(1.5, [0.0, 0.4, 0.0]);

        let mut fresh = OneBodyEngine::new();
        let expected = fresh
            .compute(&s1, &s2, Operators::ALL, &[])
            .unwrap()
            .clone();

        let mut reused = OneBodyEngine::new();
        reused.compute(&d, &d, Operators::ALL, &[]).unwrap();
        let again = reused.compute(&s1, &s2, Operators::ALL, &[]).unwrap();
        assert_eq!(again.overlap, expected.overlap);
        assert_eq!(again.kinetic, expected.kinetic);
    }
}
