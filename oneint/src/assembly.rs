use crate::engine::{OneBodyEngine, Operators, PointCharge};
use crate::error::{IntegralError, Result};
use crate::layout::ShellLayout;
use itertools::izip;
use nalgebra::DMatrix;
use rayon::prelude::*;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Instant;
use tracing::debug;

/// Knobs of a matrix build.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    /// Checked between shell pairs; the build aborts once it has passed.
    pub deadline: Option<Instant>,
    /// Distribute the shell rows over the rayon pool.
    pub parallel: bool,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            deadline: None,
            parallel: true,
        }
    }
}

/// Requested matrices of one build; `None` for operators left out.
#[derive(Debug, Clone, Default)]
pub struct Matrices {
    pub overlap: Option<DMatrix<f64>>,
    pub kinetic: Option<DMatrix<f64>>,
    pub nuclear: Option<DMatrix<f64>>,
}

/// Rows of all requested matrices that belong to one shell.
struct Strip<'a> {
    shell: usize,
    overlap: Option<&'a mut [f64]>,
    kinetic: Option<&'a mut [f64]>,
    nuclear: Option<&'a mut [f64]>,
}

struct Progress {
    deadline: Option<Instant>,
    done: AtomicUsize,
    total: usize,
}

impl Progress {
    fn check(&self) -> Result<()> {
        match self.deadline {
            Some(deadline) if Instant::now() >= deadline => Err(IntegralError::DeadlineExceeded {
                completed: self.done.load(Ordering::Relaxed),
                total: self.total,
            }),
            _ => Ok(()),
        }
    }
}

fn row_strips<'a>(
    buffer: Option<&'a mut [f64]>,
    layout: &ShellLayout,
) -> Vec<Option<&'a mut [f64]>> {
    let Some(mut rest) = buffer else {
        return (0..layout.num_shells()).map(|_| None).collect();
    };
    let nbf = layout.nbf();
    let mut strips = Vec::with_capacity(layout.num_shells());
    for shell in layout.shells() {
        let (strip, tail) = std::mem::take(&mut rest).split_at_mut(shell.size() * nbf);
        strips.push(Some(strip));
        rest = tail;
    }
    strips
}

fn fill_pair(
    engine: &mut OneBodyEngine,
    layout: &ShellLayout,
    strip: &mut Strip<'_>,
    j: usize,
    ops: Operators,
    charges: &[PointCharge],
    progress: &Progress,
) -> Result<()> {
    progress.check()?;
    let i = strip.shell;
    let nbf = layout.nbf();
    let blocks = engine
        .compute(layout.shell(i), layout.shell(j), ops, charges)
        .map_err(|e| IntegralError::NumericalInstability {
            shell_a: i,
            shell_b: j,
            reason: e.to_string(),
        })?;

    let col0 = layout.offset(j);
    for (target, block) in [
        (strip.overlap.as_deref_mut(), &blocks.overlap),
        (strip.kinetic.as_deref_mut(), &blocks.kinetic),
        (strip.nuclear.as_deref_mut(), &blocks.nuclear),
    ] {
        let Some(target) = target else { continue };
        for (r, row) in block.chunks_exact(blocks.nb).enumerate() {
            let start = r * nbf + col0;
            target[start..start + blocks.nb].copy_from_slice(row);
        }
    }
    progress.done.fetch_add(1, Ordering::Relaxed);
    Ok(())
}

// Copies the lower triangle onto the upper triangle.
fn mirror_lower(buffer: &mut [f64], nbf: usize) {
    for i in 0..nbf {
        for j in 0..i {
            buffer[j * nbf + i] = buffer[i * nbf + j];
        }
    }
}

/// Builds the matrices selected by `ops` over all shell pairs of `layout`.
pub fn assemble(
    layout: &ShellLayout,
    charges: &[PointCharge],
    ops: Operators,
    options: &EngineOptions,
) -> Result<Matrices> {
    let nbf = layout.nbf();
    let start = Instant::now();
    let buffer_for = |op: Operators| ops.contains(op).then(|| vec![0.0; nbf * nbf]);
    let mut s_buf = buffer_for(Operators::OVERLAP);
    let mut t_buf = buffer_for(Operators::KINETIC);
    let mut v_buf = buffer_for(Operators::NUCLEAR);

    let progress = Progress {
        deadline: options.deadline,
        done: AtomicUsize::new(0),
        total: layout.num_pairs(),
    };

    {
        let mut strips: Vec<Strip<'_>> = izip!(
            0..layout.num_shells(),
            row_strips(s_buf.as_deref_mut(), layout),
            row_strips(t_buf.as_deref_mut(), layout),
            row_strips(v_buf.as_deref_mut(), layout)
        )
        .map(|(shell, overlap, kinetic, nuclear)| Strip {
            shell,
            overlap,
            kinetic,
            nuclear,
        })
        .collect();

        let max_l = layout.max_l();
        if options.parallel {
            strips
                .into_par_iter()
                .map_init(
                    || OneBodyEngine::with_max_l(max_l),
                    |engine, mut strip| {
                        layout.row_pairs(strip.shell).try_for_each(|(_, j)| {
                            fill_pair(engine, layout, &mut strip, j, ops, charges, &progress)
                        })
                    },
                )
                .collect::<Result<Vec<()>>>()?;
        } else {
            let mut engine = OneBodyEngine::with_max_l(max_l);
            for (i, j) in layout.pairs() {
                fill_pair(&mut engine, layout, &mut strips[i], j, ops, charges, &progress)?;
            }
        }
    }

    let finish = |buffer: Option<Vec<f64>>| {
        buffer.map(|mut b| {
            mirror_lower(&mut b, nbf);
            DMatrix::from_row_slice(nbf, nbf, &b)
        })
    };
    let matrices = Matrices {
        overlap: finish(s_buf),
        kinetic: finish(t_buf),
        nuclear: finish(v_buf),
    };

    debug!(
        "assembled {} shell pairs into {}x{} matrices in {:.3} ms ({})",
        progress.total,
        nbf,
        nbf,
        start.elapsed().as_secs_f64() * 1e3,
        if options.parallel { "parallel" } else { "serial" }
    );
    Ok(matrices)
}
