//! Reading and writing codes in the alist text format.
//!
//! The on-disk layout is: a header line `n m` (variables, then checks), a
//! line with the maximum column and row weights, one line of per-variable
//! weights, one line of per-check weights, then for each variable the list
//! of its check neighbors and for each check the list of its variable
//! neighbors. Indices are 1-based on disk; 0 only appears as padding in the
//! zero-padded dialect.

use crate::{code::Code, LdpcError};
use log::warn;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

/// On-disk flavor of the neighbor lists.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AlistDialect {
    /// Each node line carries exactly its own weight in entries.
    VariableWidth,
    /// Each node line is padded with zeros to the maximum weight.
    ZeroPadded,
}

fn parse_fields(line: &str, what: &str) -> Result<Vec<i64>, LdpcError> {
    line.split_whitespace()
        .map(|tok| {
            tok.parse::<i64>()
                .map_err(|_| LdpcError::Format(format!("bad {} field: {:?}", what, tok)))
        })
        .collect()
}

fn next_line(
    lines: &mut impl Iterator<Item = std::io::Result<String>>,
    what: &str,
) -> Result<String, LdpcError> {
    loop {
        match lines.next() {
            Some(line) => {
                let line = line?;
                if !line.trim().is_empty() {
                    return Ok(line);
                }
            }
            None => return Err(LdpcError::Format(format!("missing {}", what))),
        }
    }
}

/// Reads a code from an alist file.
///
/// Both dialects are accepted: the reader is line-oriented and ignores zero
/// padding. A nonzero neighbor index outside the valid range is reported and
/// skipped; a duplicate edge likewise. Structural damage (unreadable header,
/// truncated body) is a hard error.
pub fn read_alist<P: AsRef<Path>>(path: P) -> Result<Code, LdpcError> {
    let path = path.as_ref();
    let file = File::open(path)?;
    let mut lines = BufReader::new(file).lines();

    let header = parse_fields(&next_line(&mut lines, "size header")?, "size header")?;
    if header.len() != 2 || header[0] <= 0 || header[1] <= 0 {
        return Err(LdpcError::Format(format!(
            "size header must be two positive integers, got {:?}",
            header
        )));
    }
    let n = header[0] as usize;
    let m = header[1] as usize;

    // Maximum weights are implied by the weight lines that follow; the
    // header values are only needed to skip past the line.
    let max_weights = parse_fields(&next_line(&mut lines, "weight header")?, "weight header")?;
    if max_weights.len() != 2 {
        return Err(LdpcError::Format(
            "weight header must be two integers".to_string(),
        ));
    }

    let col_weights = parse_fields(&next_line(&mut lines, "column weights")?, "column weight")?;
    if col_weights.len() != n {
        return Err(LdpcError::Format(format!(
            "expected {} column weights, got {}",
            n,
            col_weights.len()
        )));
    }
    let row_weights = parse_fields(&next_line(&mut lines, "row weights")?, "row weight")?;
    if row_weights.len() != m {
        return Err(LdpcError::Format(format!(
            "expected {} row weights, got {}",
            m,
            row_weights.len()
        )));
    }

    // Per-variable neighbor lists define the edge set.
    let mut edges: Vec<(usize, usize)> = Vec::new();
    let mut seen = std::collections::HashSet::new();
    for j in 0..n {
        let fields = parse_fields(&next_line(&mut lines, "variable line")?, "variable entry")?;
        for &f in &fields {
            if f == 0 {
                continue;
            }
            if f < 1 || f > m as i64 {
                warn!(
                    "{}: check index {} out of range [1, {}] on variable {}, skipped",
                    path.display(),
                    f,
                    m,
                    j + 1
                );
                continue;
            }
            let c = (f - 1) as usize;
            if !seen.insert((c, j)) {
                warn!(
                    "{}: duplicate edge ({}, {}), skipped",
                    path.display(),
                    f,
                    j + 1
                );
                continue;
            }
            edges.push((c, j));
        }
    }

    // Per-check lists repeat the same edges; validate ranges only.
    for i in 0..m {
        let fields = parse_fields(&next_line(&mut lines, "check line")?, "check entry")?;
        for &f in &fields {
            if f != 0 && (f < 1 || f > n as i64) {
                warn!(
                    "{}: variable index {} out of range [1, {}] on check {}, skipped",
                    path.display(),
                    f,
                    n,
                    i + 1
                );
            }
        }
    }

    Code::from_edges(m, n, &edges)
}

/// Writes a code to an alist file in the requested dialect.
pub fn write_alist<P: AsRef<Path>>(
    code: &Code,
    path: P,
    dialect: AlistDialect,
) -> Result<(), LdpcError> {
    let m = code.checks();
    let n = code.variables();

    let mut var_neighbors: Vec<Vec<usize>> = vec![Vec::new(); n];
    let mut chk_neighbors: Vec<Vec<usize>> = vec![Vec::new(); m];
    for (&c, &v) in code.edge_checks().iter().zip(code.edge_vars().iter()) {
        var_neighbors[v].push(c + 1);
        chk_neighbors[c].push(v + 1);
    }

    let max_col = var_neighbors.iter().map(Vec::len).max().unwrap_or(0);
    let max_row = chk_neighbors.iter().map(Vec::len).max().unwrap_or(0);

    let file = File::create(path)?;
    let mut w = BufWriter::new(file);

    writeln!(w, "{} {}", n, m)?;
    writeln!(w, "{} {}", max_col, max_row)?;

    let weights = |lists: &[Vec<usize>]| {
        lists
            .iter()
            .map(|l| l.len().to_string())
            .collect::<Vec<_>>()
            .join(" ")
    };
    writeln!(w, "{}", weights(&var_neighbors))?;
    writeln!(w, "{}", weights(&chk_neighbors))?;

    let write_lists = |w: &mut BufWriter<File>, lists: &[Vec<usize>], width: usize| {
        for list in lists {
            let mut fields: Vec<String> = list.iter().map(|x| x.to_string()).collect();
            if dialect == AlistDialect::ZeroPadded {
                fields.resize(width, "0".to_string());
            }
            writeln!(w, "{}", fields.join(" "))?;
        }
        Ok::<(), std::io::Error>(())
    };
    write_lists(&mut w, &var_neighbors, max_col)?;
    write_lists(&mut w, &chk_neighbors, max_row)?;

    w.flush()?;
    Ok(())
}
