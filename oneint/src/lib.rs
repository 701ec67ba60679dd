//! One-electron integrals over contracted Cartesian Gaussian shells.
//!
//! ```no_run
//! use oneint::{BasisRegistry, IntegralContext};
//!
//! let registry = BasisRegistry::new("data/basis")?;
//! let ctx = IntegralContext::with_registry(
//!     &registry,
//!     &[8, 1, 1],
//!     &[[0.0, 0.0, 0.0], [0.0, 1.43, 1.11], [0.0, -1.43, 1.11]],
//!     "sto-3g",
//! )?;
//! let ints = ctx.one_body_integrals()?;
//! assert_eq!(ints.overlap.nrows(), ctx.nbf());
//! # Ok::<(), oneint::IntegralError>(())
//! ```

pub mod assembly;
pub mod config;
pub mod context;
pub mod engine;
pub mod error;
pub mod layout;
pub mod molecule;
pub mod registry;

pub use crate::assembly::EngineOptions;
pub use crate::context::{IntegralContext, OneBodyIntegrals};
pub use crate::engine::{OneBodyEngine, Operators, PointCharge, PrimitivePair, ShellPair};
pub use crate::error::{IntegralError, Result};
pub use crate::layout::ShellLayout;
pub use crate::molecule::{Atom, Molecule};
pub use crate::registry::{BasisRegistry, DATA_PATH_ENV};
