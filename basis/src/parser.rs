//! Basis set file parsers.
//!
//! Two text layouts are understood. NWChem, as served by the Basis Set
//! Exchange:
//!
//! ```text
//! BASIS "ao basis" PRINT
//! #BASIS SET: (4s) -> [2s]
//! H    S
//!      18.7311370              0.03349460
//!       2.8253937              0.23472695
//!       0.6401217              0.81375733
//! H    S
//!       0.1612778              1.0000000
//! END
//! ```
//!
//! and Gaussian94, where `****` terminates each element block and every
//! shell header carries its primitive count and a scale factor:
//!
//! ```text
//! H     0
//! S   3   1.00
//!       3.42525091             0.15432897
//!       0.62391373             0.53532814
//!       0.16885540             0.44463454
//! ****
//! ```
//!
//! A fused `SP` (`L` in Gaussian94) header expands into an s and a p shell
//! sharing exponents. Any other label with several coefficient columns is a
//! general contraction and yields one shell per column.

use crate::basis::BasisSet;
use crate::error::BasisError;
use crate::shell::Shell;
use nalgebra::Vector3;
use periodic_table_on_an_enum::Element;
use std::path::Path;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BasisFormat {
    NWChem,
    Gaussian94,
}

impl BasisFormat {
    pub const ALL: [BasisFormat; 2] = [BasisFormat::NWChem, BasisFormat::Gaussian94];

    pub fn extension(self) -> &'static str {
        match self {
            BasisFormat::NWChem => "nw",
            BasisFormat::Gaussian94 => "g94",
        }
    }

    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_ascii_lowercase();
        match ext.as_str() {
            "nw" | "nwchem" => Some(BasisFormat::NWChem),
            "g94" | "gbs" => Some(BasisFormat::Gaussian94),
            _ => None,
        }
    }
}

/// Parses basis set text in the given format.
pub fn parse_basis(input: &str, format: BasisFormat, name: &str) -> Result<BasisSet, BasisError> {
    let basis = match format {
        BasisFormat::NWChem => parse_nwchem(input, name)?,
        BasisFormat::Gaussian94 => parse_gaussian94(input, name)?,
    };
    if basis.is_empty() {
        return Err(BasisError::parse(0, "no shells found"));
    }
    debug!(
        "Parsed basis {} with {} elements (max l = {})",
        basis.name,
        basis.num_elements(),
        basis.max_l()
    );
    Ok(basis)
}

/// Angular momenta encoded by a shell label; `SP`/`L` yields two.
fn shell_momenta(label: &str) -> Option<Vec<usize>> {
    let upper = label.to_ascii_uppercase();
    match upper.as_str() {
        "SP" | "L" => return Some(vec![0, 1]),
        _ => {}
    }
    let mut chars = upper.chars();
    let c = chars.next()?;
    if chars.next().is_some() {
        return None;
    }
    "SPDFGHI".find(c).map(|l| vec![l])
}

fn parse_float(token: &str) -> Option<f64> {
    token.replace(|c| c == 'D' || c == 'd', "E").parse::<f64>().ok()
}

fn parse_element(token: &str) -> Option<u32> {
    let mut chars = token.trim_start_matches('-').chars();
    let first = chars.next()?;
    let symbol: String = first
        .to_uppercase()
        .chain(chars.flat_map(char::to_lowercase))
        .collect();
    Element::from_symbol(&symbol).map(|e| e.get_atomic_number() as u32)
}

/// Rows of one shell block, kept until the block is complete.
struct PendingShell {
    header_line: usize,
    atomic_number: u32,
    label: String,
    momenta: Vec<usize>,
    exponents: Vec<f64>,
    columns: Vec<Vec<f64>>,
}

impl PendingShell {
    fn new(header_line: usize, atomic_number: u32, label: &str) -> Result<Self, BasisError> {
        let momenta = shell_momenta(label).ok_or_else(|| {
            BasisError::parse(header_line, format!("unknown shell type '{}'", label))
        })?;
        Ok(Self {
            header_line,
            atomic_number,
            label: label.to_string(),
            momenta,
            exponents: Vec::new(),
            columns: Vec::new(),
        })
    }

    fn push_row(&mut self, line_no: usize, tokens: &[&str], scale: f64) -> Result<(), BasisError> {
        let values: Vec<f64> = tokens
            .iter()
            .map(|t| {
                parse_float(t)
                    .ok_or_else(|| BasisError::parse(line_no, format!("'{}' is not a number", t)))
            })
            .collect::<Result<_, _>>()?;
        if values.len() < 2 {
            return Err(BasisError::parse(
                line_no,
                "expected an exponent followed by coefficients",
            ));
        }
        let exponent = values[0] * scale * scale;
        if !(exponent.is_finite() && exponent > 0.0) {
            return Err(BasisError::parse(
                line_no,
                format!("exponent {} must be positive", values[0]),
            ));
        }
        let coefficients = &values[1..];
        if self.columns.is_empty() {
            if self.momenta.len() == 2 && coefficients.len() != 2 {
                return Err(BasisError::parse(
                    line_no,
                    format!(
                        "{} shell needs 2 coefficients per row, found {}",
                        self.label,
                        coefficients.len()
                    ),
                ));
            }
            self.columns = vec![Vec::new(); coefficients.len()];
        } else if coefficients.len() != self.columns.len() {
            return Err(BasisError::parse(
                line_no,
                format!(
                    "expected {} coefficients, found {}",
                    self.columns.len(),
                    coefficients.len()
                ),
            ));
        }
        self.exponents.push(exponent);
        for (column, &c) in self.columns.iter_mut().zip(coefficients) {
            column.push(c);
        }
        Ok(())
    }

    fn finish(self, basis: &mut BasisSet) -> Result<(), BasisError> {
        if self.exponents.is_empty() {
            return Err(BasisError::parse(
                self.header_line,
                format!("{} shell has no primitives", self.label),
            ));
        }
        let header_line = self.header_line;
        let origin = Vector3::zeros();
        let fused = self.momenta.len() == 2;
        for (k, column) in self.columns.iter().enumerate() {
            let l = if fused { self.momenta[k] } else { self.momenta[0] };
            let shell = Shell::new(l, origin, &self.exponents, column).map_err(|e| {
                BasisError::parse(header_line, e.to_string())
            })?;
            basis.push_shell(self.atomic_number, shell);
        }
        Ok(())
    }
}

fn parse_nwchem(input: &str, name: &str) -> Result<BasisSet, BasisError> {
    let mut basis = BasisSet::new(name);
    let mut pending: Option<PendingShell> = None;

    for (idx, raw) in input.lines().enumerate() {
        let line_no = idx + 1;
        let line = raw.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let keyword = tokens[0].to_ascii_uppercase();
        if keyword == "BASIS" || keyword == "END" {
            if let Some(shell) = pending.take() {
                shell.finish(&mut basis)?;
            }
            continue;
        }

        if tokens[0].chars().all(char::is_alphabetic) {
            if let Some(shell) = pending.take() {
                shell.finish(&mut basis)?;
            }
            if tokens.len() != 2 {
                return Err(BasisError::parse(
                    line_no,
                    format!("malformed shell header '{}'", line),
                ));
            }
            let z = parse_element(tokens[0]).ok_or_else(|| {
                BasisError::parse(line_no, format!("unknown element '{}'", tokens[0]))
            })?;
            pending = Some(PendingShell::new(line_no, z, tokens[1])?);
            continue;
        }

        match pending.as_mut() {
            Some(shell) => shell.push_row(line_no, &tokens, 1.0)?,
            None => {
                return Err(BasisError::parse(
                    line_no,
                    "primitive row outside of a shell block",
                ))
            }
        }
    }

    if let Some(shell) = pending.take() {
        shell.finish(&mut basis)?;
    }
    Ok(basis)
}

fn parse_gaussian94(input: &str, name: &str) -> Result<BasisSet, BasisError> {
    let mut basis = BasisSet::new(name);
    let mut lines = input
        .lines()
        .enumerate()
        .map(|(i, l)| (i + 1, l.trim()))
        .filter(|(_, l)| !l.is_empty() && !l.starts_with('!'));

    let mut element: Option<u32> = None;
    while let Some((line_no, line)) = lines.next() {
        if line.starts_with("****") {
            element = None;
            continue;
        }
        let tokens: Vec<&str> = line.split_whitespace().collect();
        let Some(z) = element else {
            let z = parse_element(tokens[0]).ok_or_else(|| {
                BasisError::parse(line_no, format!("unknown element '{}'", tokens[0]))
            })?;
            element = Some(z);
            continue;
        };

        if tokens.len() < 2 {
            return Err(BasisError::parse(
                line_no,
                format!("malformed shell header '{}'", line),
            ));
        }
        let nprim: usize = tokens[1].parse().map_err(|_| {
            BasisError::parse(line_no, format!("invalid primitive count '{}'", tokens[1]))
        })?;
        let scale = match tokens.get(2) {
            Some(t) => parse_float(t).ok_or_else(|| {
                BasisError::parse(line_no, format!("invalid scale factor '{}'", t))
            })?,
            None => 1.0,
        };

        let mut shell = PendingShell::new(line_no, z, tokens[0])?;
        for _ in 0..nprim {
            let (row_no, row) = lines.next().ok_or_else(|| {
                BasisError::parse(line_no, format!("{} shell ends early", tokens[0]))
            })?;
            let row_tokens: Vec<&str> = row.split_whitespace().collect();
            shell.push_row(row_no, &row_tokens, scale)?;
        }
        shell.finish(&mut basis)?;
    }
    Ok(basis)
}
