use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use crate::structure::Coordinate;

/// GRO and XTC files store nanometers; all analysis runs in Angstroms.
const NM_TO_ANGSTROM: f64 = 10.0;

/// Atom positions for a single trajectory frame, in topology atom order
#[derive(Debug, Clone)]
pub struct Frame {
    pub index: usize,
    pub positions: Vec<Coordinate>,
}

/// Trait for reading trajectory files frame by frame
pub trait TrajectoryReader {
    /// Read frames in file order.
    ///
    /// # Arguments
    /// * `max_frames` - Maximum number of frames to read (None for all frames)
    fn read_frames(&self, max_frames: Option<usize>) -> Result<Vec<Frame>, String>;
}

/// Open a trajectory file, choosing the reader from the file extension.
pub fn open_trajectory(path: &Path) -> Result<Box<dyn TrajectoryReader>, String> {
    let ext = path
        .extension()
        .and_then(|e| e.to_str())
        .map(|e| e.to_ascii_lowercase())
        .unwrap_or_default();

    match ext.as_str() {
        "pdb" => Ok(Box::new(PdbTrajectory::new(path))),
        "gro" => Ok(Box::new(GroTrajectory::new(path))),
        #[cfg(feature = "xtc")]
        "xtc" => Ok(Box::new(XtcTrajectory::new(path))),
        #[cfg(not(feature = "xtc"))]
        "xtc" => Err(format!(
            "{} is an XTC trajectory; rebuild with the 'xtc' feature enabled",
            path.display()
        )),
        other => Err(format!(
            "Unsupported trajectory format '.{}' for {} (expected .pdb, .gro or .xtc)",
            other,
            path.display()
        )),
    }
}

/// Multi-model PDB trajectory: one MODEL/ENDMDL block per frame
pub struct PdbTrajectory {
    file_path: String,
}

impl PdbTrajectory {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_string_lossy().to_string(),
        }
    }
}

impl TrajectoryReader for PdbTrajectory {
    fn read_frames(&self, max_frames: Option<usize>) -> Result<Vec<Frame>, String> {
        let file = File::open(&self.file_path)
            .map_err(|e| format!("Failed to open PDB file {}: {}", self.file_path, e))?;
        read_pdb_frames(BufReader::new(file), max_frames)
    }
}

/// Read multi-model PDB frames from any buffered reader.
///
/// Every ATOM/HETATM record contributes a position. Files without
/// MODEL/ENDMDL markers are treated as a single frame.
pub fn read_pdb_frames<R: BufRead>(
    reader: R,
    max_frames: Option<usize>,
) -> Result<Vec<Frame>, String> {
    let mut frames: Vec<Frame> = Vec::new();
    let mut current: Vec<Coordinate> = Vec::new();
    let mut in_model = false;
    let mut model_found = false;

    for line_result in reader.lines() {
        let line = line_result.map_err(|e| format!("Error reading line: {}", e))?;

        if line.starts_with("MODEL") {
            model_found = true;
            in_model = true;
            current = Vec::new();
        } else if line.starts_with("ENDMDL") {
            if in_model {
                push_frame(&mut frames, std::mem::take(&mut current))?;
                in_model = false;
            }
            if let Some(max) = max_frames {
                if frames.len() >= max {
                    return Ok(frames);
                }
            }
        } else if line.starts_with("ATOM") || line.starts_with("HETATM") {
            if let Some(atom) = crate::topology::parse_pdb_atom(&line, current.len()) {
                current.push(atom.position);
            }
        }
    }

    // Model without trailing ENDMDL, or a file with no markers at all
    if (in_model || !model_found) && !current.is_empty() {
        push_frame(&mut frames, current)?;
    }

    if frames.is_empty() {
        return Err("No frames found in PDB trajectory".to_string());
    }

    Ok(frames)
}

fn push_frame(frames: &mut Vec<Frame>, positions: Vec<Coordinate>) -> Result<(), String> {
    if positions.is_empty() {
        return Ok(());
    }
    if let Some(first) = frames.first() {
        if positions.len() != first.positions.len() {
            return Err(format!(
                "Frame {} has {} atoms but frame 0 has {}",
                frames.len(),
                positions.len(),
                first.positions.len()
            ));
        }
    }
    frames.push(Frame {
        index: frames.len(),
        positions,
    });
    Ok(())
}

/// Concatenated GRO trajectory: title / atom count / atom lines / box,
/// repeated once per frame
pub struct GroTrajectory {
    file_path: String,
}

impl GroTrajectory {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_string_lossy().to_string(),
        }
    }
}

impl TrajectoryReader for GroTrajectory {
    fn read_frames(&self, max_frames: Option<usize>) -> Result<Vec<Frame>, String> {
        let file = File::open(&self.file_path)
            .map_err(|e| format!("Failed to open GRO file {}: {}", self.file_path, e))?;
        read_gro_frames(BufReader::new(file), max_frames)
    }
}

/// Read concatenated GRO frames from any buffered reader. Positions are
/// converted from nm to Angstroms.
pub fn read_gro_frames<R: BufRead>(
    mut reader: R,
    max_frames: Option<usize>,
) -> Result<Vec<Frame>, String> {
    let mut frames: Vec<Frame> = Vec::new();
    let mut line = String::new();

    loop {
        if let Some(max) = max_frames {
            if frames.len() >= max {
                break;
            }
        }

        // Title line; EOF here means a clean end of the trajectory
        line.clear();
        let read = reader
            .read_line(&mut line)
            .map_err(|e| format!("Error reading GRO title line: {}", e))?;
        if read == 0 || line.trim().is_empty() {
            break;
        }

        line.clear();
        reader
            .read_line(&mut line)
            .map_err(|e| format!("Error reading GRO atom count: {}", e))?;
        let n_atoms: usize = line.trim().parse().map_err(|_| {
            format!(
                "Invalid GRO atom count '{}' in frame {}",
                line.trim(),
                frames.len()
            )
        })?;

        let mut positions = Vec::with_capacity(n_atoms);
        for i in 0..n_atoms {
            line.clear();
            let read = reader
                .read_line(&mut line)
                .map_err(|e| format!("Error reading GRO atom line: {}", e))?;
            if read == 0 {
                return Err(format!(
                    "GRO frame {} ended early: expected {} atoms, found {}",
                    frames.len(),
                    n_atoms,
                    i
                ));
            }
            positions.push(parse_gro_position(&line, frames.len())?);
        }

        // Box vector line closes the frame
        line.clear();
        reader
            .read_line(&mut line)
            .map_err(|e| format!("Error reading GRO box line: {}", e))?;

        push_frame(&mut frames, positions)?;
    }

    if frames.is_empty() {
        return Err("No frames found in GRO trajectory".to_string());
    }

    Ok(frames)
}

fn parse_gro_position(line: &str, frame: usize) -> Result<Coordinate, String> {
    if line.len() < 44 {
        return Err(format!(
            "GRO atom line too short in frame {}: {}",
            frame,
            line.trim_end()
        ));
    }
    let x = parse_gro_float(&line[20..28], frame)?;
    let y = parse_gro_float(&line[28..36], frame)?;
    let z = parse_gro_float(&line[36..44], frame)?;
    Ok(Coordinate::new(
        x * NM_TO_ANGSTROM,
        y * NM_TO_ANGSTROM,
        z * NM_TO_ANGSTROM,
    ))
}

fn parse_gro_float(value: &str, frame: usize) -> Result<f64, String> {
    value
        .trim()
        .parse::<f64>()
        .map_err(|_| format!("Invalid GRO coordinate '{}' in frame {}", value.trim(), frame))
}

/// GROMACS XTC trajectory, read with the pure-Rust molly crate
#[cfg(feature = "xtc")]
pub struct XtcTrajectory {
    file_path: String,
}

#[cfg(feature = "xtc")]
impl XtcTrajectory {
    pub fn new(file_path: impl AsRef<Path>) -> Self {
        Self {
            file_path: file_path.as_ref().to_string_lossy().to_string(),
        }
    }
}

#[cfg(feature = "xtc")]
impl TrajectoryReader for XtcTrajectory {
    fn read_frames(&self, max_frames: Option<usize>) -> Result<Vec<Frame>, String> {
        use molly::XTCReader;

        let mut reader = XTCReader::open(Path::new(&self.file_path))
            .map_err(|e| format!("Failed to open XTC file {}: {}", self.file_path, e))?;
        let raw_frames = reader
            .read_all_frames()
            .map_err(|e| format!("Failed to read XTC file {}: {}", self.file_path, e))?;

        let mut frames = Vec::new();
        for raw in raw_frames.iter() {
            if let Some(max) = max_frames {
                if frames.len() >= max {
                    break;
                }
            }
            let flat: Vec<f64> = raw.positions.iter().map(|x| *x as f64).collect();
            let mut positions = Vec::with_capacity(flat.len() / 3);
            for chunk in flat.chunks_exact(3) {
                positions.push(Coordinate::new(
                    chunk[0] * NM_TO_ANGSTROM,
                    chunk[1] * NM_TO_ANGSTROM,
                    chunk[2] * NM_TO_ANGSTROM,
                ));
            }
            push_frame(&mut frames, positions)?;
        }

        if frames.is_empty() {
            return Err(format!("No frames found in XTC file {}", self.file_path));
        }

        Ok(frames)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Cursor;

    const PDB_TRAJ: &str = "\
MODEL        1
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  C1  LIG A   2       2.000   0.000   0.000  1.00  0.00           C
ENDMDL
MODEL        2
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  C1  LIG A   2      20.000   0.000   0.000  1.00  0.00           C
ENDMDL
MODEL        3
ATOM      1  CA  ALA A   1       1.000   0.000   0.000  1.00  0.00           C
ATOM      2  C1  LIG A   2      21.000   0.000   0.000  1.00  0.00           C
ENDMDL
";

    const GRO_TRAJ: &str = "\
frame 0
    2
    1ALA     CA    1   0.000   0.000   0.000
    2LIG     C1    2   0.200   0.000   0.000
   5.00000   5.00000   5.00000
frame 1
    2
    1ALA     CA    1   0.000   0.000   0.000
    2LIG     C1    2   2.000   0.000   0.000
   5.00000   5.00000   5.00000
";

    #[test]
    fn test_read_pdb_frames() {
        let frames = read_pdb_frames(Cursor::new(PDB_TRAJ), None).unwrap();
        assert_eq!(frames.len(), 3);
        assert_eq!(frames[0].positions.len(), 2);
        assert!((frames[1].positions[1].x - 20.0).abs() < 1e-9);
        assert_eq!(frames[2].index, 2);
    }

    #[test]
    fn test_read_pdb_frames_with_cap() {
        let frames = read_pdb_frames(Cursor::new(PDB_TRAJ), Some(2)).unwrap();
        assert_eq!(frames.len(), 2);
    }

    #[test]
    fn test_read_pdb_single_frame_without_markers() {
        let single = "\
ATOM      1  CA  ALA A   1       1.000   2.000   3.000  1.00  0.00           C
END
";
        let frames = read_pdb_frames(Cursor::new(single), None).unwrap();
        assert_eq!(frames.len(), 1);
        assert!((frames[0].positions[0].y - 2.0).abs() < 1e-9);
    }

    #[test]
    fn test_pdb_atom_count_mismatch_is_error() {
        let bad = "\
MODEL        1
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C
ENDMDL
MODEL        2
ATOM      1  CA  ALA A   1       0.000   0.000   0.000  1.00  0.00           C
ATOM      2  C1  LIG A   2       2.000   0.000   0.000  1.00  0.00           C
ENDMDL
";
        let err = read_pdb_frames(Cursor::new(bad), None).unwrap_err();
        assert!(err.contains("atoms"), "unexpected error: {}", err);
    }

    #[test]
    fn test_read_gro_frames() {
        let frames = read_gro_frames(Cursor::new(GRO_TRAJ), None).unwrap();
        assert_eq!(frames.len(), 2);
        // nm -> Angstrom
        assert!((frames[0].positions[1].x - 2.0).abs() < 1e-9);
        assert!((frames[1].positions[1].x - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_read_gro_frames_with_cap() {
        let frames = read_gro_frames(Cursor::new(GRO_TRAJ), Some(1)).unwrap();
        assert_eq!(frames.len(), 1);
    }

    #[test]
    fn test_empty_trajectory_is_error() {
        assert!(read_pdb_frames(Cursor::new(""), None).is_err());
        assert!(read_gro_frames(Cursor::new(""), None).is_err());
    }

    #[test]
    fn test_open_trajectory_unknown_extension() {
        assert!(open_trajectory(Path::new("traj.dcd")).is_err());
    }
}
