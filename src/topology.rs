use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::structure::{Atom, Coordinate, Topology};

/// GRO files store nanometers; all analysis runs in Angstroms.
const NM_TO_ANGSTROM: f64 = 10.0;

/// Load a topology file, choosing the parser from the file extension
/// (.gro or .pdb).
pub fn load_topology(path: &Path) -> Result<Topology, String> {
    let file = File::open(path)
        .map_err(|e| format!("Failed to open topology file {}: {}", path.display(), e))?;
    let reader = BufReader::new(file);

    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "gro" => read_gro_topology(reader),
        "pdb" => read_pdb_topology(reader),
        other => Err(format!(
            "Unsupported topology format '.{}' for {} (expected .gro or .pdb)",
            other,
            path.display()
        )),
    }
}

/// Parse a GRO structure file.
///
/// Layout: title line, atom count line, one fixed-column line per atom
/// (resid 0..5, resname 5..10, name 10..15, serial 15..20, x/y/z 20..44 in nm),
/// then a box line. Positions are converted to Angstroms.
pub fn read_gro_topology<R: BufRead>(mut reader: R) -> Result<Topology, String> {
    let mut line = String::new();
    reader
        .read_line(&mut line)
        .map_err(|e| format!("Error reading GRO title line: {}", e))?;

    line.clear();
    reader
        .read_line(&mut line)
        .map_err(|e| format!("Error reading GRO atom count: {}", e))?;
    let n_atoms: usize = line
        .trim()
        .parse()
        .map_err(|_| format!("Invalid GRO atom count '{}'", line.trim()))?;

    let mut atoms = Vec::with_capacity(n_atoms);
    for i in 0..n_atoms {
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| format!("Error reading GRO atom line: {}", e))?;
        if read == 0 {
            return Err(format!(
                "GRO file ended early: expected {} atoms, found {}",
                n_atoms, i
            ));
        }
        atoms.push(parse_gro_atom(&line, i)?);
    }

    if atoms.is_empty() {
        return Err("No atoms found in GRO file".to_string());
    }

    Ok(Topology::new(atoms))
}

fn parse_gro_atom(line: &str, index: usize) -> Result<Atom, String> {
    if line.len() < 44 {
        return Err(format!("GRO atom line too short: {}", line.trim_end()));
    }

    let resid = slice_trim(line, 0, 5)
        .parse::<i32>()
        .map_err(|_| format!("Invalid GRO residue number in line: {}", line.trim_end()))?;
    let resname = slice_trim(line, 5, 10).to_string();
    let name = slice_trim(line, 10, 15).to_string();
    let serial = slice_trim(line, 15, 20)
        .parse::<i32>()
        .unwrap_or((index + 1) as i32);

    let x = parse_coord(slice_trim(line, 20, 28), "x", line)?;
    let y = parse_coord(slice_trim(line, 28, 36), "y", line)?;
    let z = parse_coord(slice_trim(line, 36, 44), "z", line)?;

    Ok(Atom {
        serial,
        name,
        resname,
        resid,
        position: Coordinate::new(x * NM_TO_ANGSTROM, y * NM_TO_ANGSTROM, z * NM_TO_ANGSTROM),
    })
}

/// Parse a PDB structure file (first model only).
///
/// Reads ATOM and HETATM records. PDB format: columns 6-11 = serial,
/// 12-16 = atom name, 17-20 = residue name, 22-26 = residue number,
/// 30-54 = x/y/z in Angstroms.
pub fn read_pdb_topology<R: BufRead>(reader: R) -> Result<Topology, String> {
    let mut atoms = Vec::new();
    let mut saw_model = false;

    for line_result in reader.lines() {
        let line = line_result.map_err(|e| format!("Error reading line: {}", e))?;

        if line.starts_with("MODEL") {
            if saw_model {
                break;
            }
            saw_model = true;
            continue;
        }
        if line.starts_with("ENDMDL") {
            break;
        }
        if !(line.starts_with("ATOM") || line.starts_with("HETATM")) {
            continue;
        }
        if let Some(atom) = parse_pdb_atom(&line, atoms.len()) {
            atoms.push(atom);
        }
    }

    if atoms.is_empty() {
        return Err("No atoms found in PDB file".to_string());
    }

    Ok(Topology::new(atoms))
}

/// Parse a single ATOM/HETATM record. Returns None for malformed lines,
/// matching how trajectory readers skip records they cannot interpret.
pub(crate) fn parse_pdb_atom(line: &str, index: usize) -> Option<Atom> {
    if line.len() < 54 {
        return None;
    }

    // Skip alternate locations other than blank or 'A'
    let alt_loc = line.chars().nth(16).unwrap_or(' ');
    if alt_loc != ' ' && alt_loc != 'A' {
        return None;
    }

    let serial = slice_trim(line, 6, 11)
        .parse::<i32>()
        .unwrap_or((index + 1) as i32);
    let name = slice_trim(line, 12, 16).to_string();
    let resname = slice_trim(line, 17, 20).to_string();
    let resid = slice_trim(line, 22, 26).parse::<i32>().ok()?;

    let x = slice_trim(line, 30, 38).parse::<f64>().ok()?;
    let y = slice_trim(line, 38, 46).parse::<f64>().ok()?;
    let z = slice_trim(line, 46, 54).parse::<f64>().ok()?;

    Some(Atom {
        serial,
        name,
        resname,
        resid,
        position: Coordinate::new(x, y, z),
    })
}

fn slice_trim(line: &str, start: usize, end: usize) -> &str {
    let end = end.min(line.len());
    if start >= end {
        return "";
    }
    line[start..end].trim()
}

fn parse_coord(value: &str, label: &str, line: &str) -> Result<f64, String> {
    value.parse::<f64>().map_err(|_| {
        format!(
            "Invalid {} coordinate '{}' in line: {}",
            label,
            value,
            line.trim_end()
        )
    })
}
