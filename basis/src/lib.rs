pub mod basis;
pub mod error;
pub mod gto;
pub mod helper;
pub mod parser;
pub mod shell;


pub use crate::basis::BasisSet;
pub use crate::error::BasisError;
pub use crate::parser::{parse_basis, BasisFormat};
pub use crate::shell::{Primitive, Shell};
