/* Hermite expansion of Gaussian products, the McMurchie-Davidson machinery
   shared by the overlap, kinetic and nuclear attraction integrals.

   E^{ij}_t expands x_A^i x_B^j exp(-a x_A^2 - b x_B^2) into Hermite
   Gaussians centered at the product center P, and R^n_{tuv} carries the
   Coulomb potential of a Hermite Gaussian (Helgaker, Jorgensen, Olsen ch. 9).
*/
#![allow(non_snake_case)]

use serde::{Deserialize, Serialize};
use std::f64::consts::PI;

/// Lower bound applied to the combined exponent `p = a + b` of a primitive
/// pair before anything is divided by it.
pub const EXPONENT_FLOOR: f64 = 1.0e-12;

/// (2n-1)!! for n >= 0, with (-1)!! = 1.
pub fn double_factorial_odd(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, k| acc * (2 * k - 1) as f64)
}

fn factorial(n: usize) -> f64 {
    (1..=n).fold(1.0, |acc, x| acc * x as f64)
}

/// One-dimensional primitive Cartesian Gaussian `N (x - X)^l exp(-alpha (x - X)^2)`.
#[derive(Debug, Serialize, Deserialize, Copy, Clone)]
pub struct GTO1d {
    pub alpha: f64,
    pub l: usize,
    pub center: f64,
    pub norm: f64,
}

impl GTO1d {
    pub fn new(alpha: f64, l: usize, center: f64) -> Self {
        let norm = GTO1d::compute_norm(alpha, l);
        Self {
            alpha,
            l,
            center,
            norm,
        }
    }

    // N^2 = 2^(3l) l! alpha^l sqrt(2 alpha / pi) / (2l)!
    fn compute_norm(alpha: f64, l: usize) -> f64 {
        let numerator = 2.0_f64.powi(3 * l as i32) * factorial(l) * alpha.powi(l as i32);
        let n_squared = numerator * (2.0 * alpha / PI).sqrt() / factorial(2 * l);
        n_squared.sqrt()
    }

    pub fn evaluate(&self, x: f64) -> f64 {
        let x = x - self.center;
        self.norm * x.powi(self.l as i32) * (-self.alpha * x * x).exp()
    }

    pub fn laplacian(&self, x: f64) -> f64 {
        let x = x - self.center;
        let l = self.l as f64;
        let a = self.alpha;
        let term1 = if self.l >= 2 {
            l * (l - 1.0) * x.powi(self.l as i32 - 2)
        } else {
            0.0
        };
        let term2 = -2.0 * a * (2.0 * l + 1.0) * x.powi(self.l as i32);
        let term3 = 4.0 * a * a * x.powi(self.l as i32 + 2);
        self.norm * (term1 + term2 + term3) * (-a * x * x).exp()
    }

    /// Overlap of two normalized 1-D primitives.
    pub fn overlap(a: &GTO1d, b: &GTO1d) -> f64 {
        let mut e = HermiteE::new();
        e.fill(a.l, b.l, a.alpha, b.alpha, a.center - b.center);
        let p = (a.alpha + b.alpha).max(EXPONENT_FLOOR);
        e.get(a.l, b.l, 0) * (PI / p).sqrt() * a.norm * b.norm
    }

    /// `<a| -1/2 d^2/dx^2 |b>` of two normalized 1-D primitives.
    pub fn kinetic(a: &GTO1d, b: &GTO1d) -> f64 {
        let mut e = HermiteE::new();
        e.fill(a.l, b.l + 2, a.alpha, b.alpha, a.center - b.center);
        let p = (a.alpha + b.alpha).max(EXPONENT_FLOOR);
        e.kinetic(a.l, b.l, b.alpha) * (PI / p).sqrt() * a.norm * b.norm
    }
}

/// Table of Hermite expansion coefficients `E^{ij}_t` for one Cartesian
/// direction and one primitive pair.
///
/// The buffer is reused across fills; it only grows when a pair needs larger
/// angular momenta than any pair before it.
#[derive(Debug, Clone, Default)]
pub struct HermiteE {
    la: usize,
    lb: usize,
    tdim: usize,
    data: Vec<f64>,
}

impl HermiteE {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn index(&self, i: usize, j: usize, t: usize) -> usize {
        (i * (self.lb + 1) + j) * self.tdim + t
    }

    /// `E^{ij}_t`, zero outside `0 <= t <= i + j`.
    #[inline]
    pub fn get(&self, i: usize, j: usize, t: usize) -> f64 {
        if t > i + j {
            0.0
        } else {
            self.data[self.index(i, j, t)]
        }
    }

    #[inline]
    fn at(&self, i: usize, j: usize, t: isize) -> f64 {
        if t < 0 {
            0.0
        } else {
            self.get(i, j, t as usize)
        }
    }

    /// Fills `E^{ij}_t` for `i <= la`, `j <= lb`.
    ///
    /// `ab` is the separation `A - B` of the two centers along this
    /// direction, `a` and `b` the primitive exponents.
    pub fn fill(&mut self, la: usize, lb: usize, a: f64, b: f64, ab: f64) {
        let p = (a + b).max(EXPONENT_FLOOR);
        let mu = a * b / p;
        self.fill_product(la, lb, p, -b * ab / p, a * ab / p, (-mu * ab * ab).exp());
    }

    /// Same table from an already formed Gaussian product: exponent `p`,
    /// offsets `xpa = P - A` and `xpb = P - B`, and the seed `E^{00}_0`.
    pub fn fill_product(
        &mut self,
        la: usize,
        lb: usize,
        p: f64,
        xpa: f64,
        xpb: f64,
        e00: f64,
    ) {
        self.la = la;
        self.lb = lb;
        self.tdim = la + lb + 1;
        let needed = (la + 1) * (lb + 1) * self.tdim;
        if self.data.len() < needed {
            self.data.resize(needed, 0.0);
        }
        let one_over_2p = 0.5 / p;

        let origin = self.index(0, 0, 0);
        self.data[origin] = e00;

        for i in 0..=la {
            for j in 0..=lb {
                if i == 0 && j == 0 {
                    continue;
                }
                // climb on the bra index first, then on the ket index
                let (pi, pj, x) = if j == 0 { (i - 1, 0, xpa) } else { (i, j - 1, xpb) };
                for t in 0..=(i + j) {
                    let t_i = t as isize;
                    let value = one_over_2p * self.at(pi, pj, t_i - 1)
                        + x * self.at(pi, pj, t_i)
                        + (t + 1) as f64 * self.at(pi, pj, t_i + 1);
                    let idx = self.index(i, j, t);
                    self.data[idx] = value;
                }
            }
        }
    }

    /// Kinetic energy factor for one direction, in units of `sqrt(pi / p)`.
    ///
    /// Requires the table to have been filled up to `j + 2` on the ket side.
    #[inline]
    pub fn kinetic(&self, i: usize, j: usize, b: f64) -> f64 {
        let lower = if j >= 2 {
            (j * (j - 1)) as f64 * self.get(i, j - 2, 0)
        } else {
            0.0
        };
        let middle = -2.0 * b * (2 * j + 1) as f64 * self.get(i, j, 0);
        let upper = 4.0 * b * b * self.get(i, j + 2, 0);
        -0.5 * (lower + middle + upper)
    }
}

/// Hermite Coulomb integrals `R^n_{tuv}(p, P - C)` for one primitive pair and
/// one point charge, for all `t + u + v <= lmax`.
#[derive(Debug, Clone, Default)]
pub struct HermiteCoulomb {
    dim: usize,
    data: Vec<f64>,
}

impl HermiteCoulomb {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    fn index(&self, n: usize, t: usize, u: usize, v: usize) -> usize {
        ((n * self.dim + t) * self.dim + u) * self.dim + v
    }

    /// `R^0_{tuv}`.
    #[inline]
    pub fn get(&self, t: usize, u: usize, v: usize) -> f64 {
        self.data[self.index(0, t, u, v)]
    }

    /// `boys` must hold `F_0 .. F_lmax` evaluated at `p |P - C|^2`.
    pub fn fill(&mut self, lmax: usize, p: f64, PC: [f64; 3], boys: &[f64]) {
        self.dim = lmax + 1;
        let needed = self.dim.pow(4);
        if self.data.len() < needed {
            self.data.resize(needed, 0.0);
        }

        let mut factor = 1.0;
        for (n, f) in boys.iter().take(lmax + 1).enumerate() {
            let idx = self.index(n, 0, 0, 0);
            self.data[idx] = factor * f;
            factor *= -2.0 * p;
        }

        let [X, Y, Z] = PC;
        for n in (0..lmax).rev() {
            let order = lmax - n;
            for t in 0..=order {
                for u in 0..=(order - t) {
                    for v in 0..=(order - t - u) {
                        if t + u + v == 0 {
                            continue;
                        }
                        let value = if t > 0 {
                            let mut val = X * self.data[self.index(n + 1, t - 1, u, v)];
                            if t > 1 {
                                val += (t - 1) as f64 * self.data[self.index(n + 1, t - 2, u, v)];
                            }
                            val
                        } else if u > 0 {
                            let mut val = Y * self.data[self.index(n + 1, t, u - 1, v)];
                            if u > 1 {
                                val += (u - 1) as f64 * self.data[self.index(n + 1, t, u - 2, v)];
                            }
                            val
                        } else {
                            let mut val = Z * self.data[self.index(n + 1, t, u, v - 1)];
                            if v > 1 {
                                val += (v - 1) as f64 * self.data[self.index(n + 1, t, u, v - 2)];
                            }
                            val
                        };
                        let idx = self.index(n, t, u, v);
                        self.data[idx] = value;
                    }
                }
            }
        }
    }
}
