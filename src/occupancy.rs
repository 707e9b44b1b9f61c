use std::collections::{HashMap, HashSet};
use std::path::Path;

use indicatif::{ProgressBar, ProgressStyle};
use serde::Serialize;

use crate::structure::Topology;
use crate::trajectory::Frame;

/// A (protein residue id, ligand residue id) pair observed in contact
pub type ResiduePair = (i32, i32);

/// One row of the occupancy report
#[derive(Debug, Clone, PartialEq)]
pub struct OccupancyRow {
    pub protein_resid: i32,
    pub ligand_resid: i32,
    /// Percentage of processed frames in which the pair was in contact
    pub occupancy: f64,
}

/// Contact analysis between two atom groups at a fixed distance cutoff
pub struct ContactAnalysis {
    protein: Vec<usize>,
    ligand: Vec<usize>,
    cutoff: f64,
}

impl ContactAnalysis {
    /// # Arguments
    /// * `protein` - Topology indices of the protein atom group
    /// * `ligand` - Topology indices of the ligand atom group
    /// * `cutoff` - Contact cutoff distance in Angstroms
    pub fn new(protein: Vec<usize>, ligand: Vec<usize>, cutoff: f64) -> Result<Self, String> {
        if protein.is_empty() {
            return Err("Protein selection matched 0 atoms".to_string());
        }
        if ligand.is_empty() {
            return Err("Ligand selection matched 0 atoms".to_string());
        }
        if !(cutoff > 0.0) {
            return Err(format!("Cutoff distance must be positive, got {}", cutoff));
        }
        Ok(Self {
            protein,
            ligand,
            cutoff,
        })
    }

    /// Tally residue-pair contacts over all frames.
    ///
    /// For each frame, an atom pair closer than the cutoff marks its residue
    /// pair as in contact; a residue pair is counted at most once per frame,
    /// so no count can exceed the number of processed frames.
    pub fn analyze(&self, topology: &Topology, frames: &[Frame]) -> Result<OccupancyTable, String> {
        if frames.is_empty() {
            return Err("No frames to analyze (occupancy denominator would be zero)".to_string());
        }

        for indices in [&self.protein, &self.ligand] {
            if let Some(&bad) = indices.iter().find(|&&i| i >= topology.len()) {
                return Err(format!(
                    "Selection index {} out of range for topology with {} atoms",
                    bad,
                    topology.len()
                ));
            }
        }

        let cutoff_sq = self.cutoff * self.cutoff;
        let mut counts: HashMap<ResiduePair, usize> = HashMap::new();

        let pb = ProgressBar::new(frames.len() as u64);
        pb.set_style(
            ProgressStyle::default_bar()
                .template("{spinner:.green} [{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} frames ({percent}%) | ETA: {eta}")
                .unwrap()
                .progress_chars("#>-")
        );
        pb.set_message("Computing contact occupancy");

        for frame in frames {
            if frame.positions.len() != topology.len() {
                return Err(format!(
                    "Frame {} has {} atoms but topology has {}",
                    frame.index,
                    frame.positions.len(),
                    topology.len()
                ));
            }

            // Residue pairs seen in this frame; dedup keeps counts <= frames
            let mut seen: HashSet<ResiduePair> = HashSet::new();

            for &pi in &self.protein {
                let p_pos = frame.positions[pi];
                let p_res = topology.atoms[pi].resid;

                for &li in &self.ligand {
                    // Overlapping selections: an atom is never its own contact
                    if pi == li {
                        continue;
                    }
                    if p_pos.distance_squared_to(&frame.positions[li]) < cutoff_sq {
                        seen.insert((p_res, topology.atoms[li].resid));
                    }
                }
            }

            for pair in seen {
                *counts.entry(pair).or_insert(0) += 1;
            }

            pb.inc(1);
        }

        pb.finish_with_message("Occupancy computed");

        Ok(OccupancyTable {
            counts,
            frames: frames.len(),
        })
    }
}

/// Per-residue-pair contact counts over a fixed number of frames.
/// Built once by [`ContactAnalysis::analyze`], immutable thereafter.
#[derive(Debug, Clone)]
pub struct OccupancyTable {
    counts: HashMap<ResiduePair, usize>,
    frames: usize,
}

/// TSV record layout for the occupancy report rows
#[derive(Serialize)]
struct ReportRecord {
    pair: String,
    occupancy: String,
}

impl OccupancyTable {
    /// Number of frames processed (the occupancy denominator)
    pub fn frames(&self) -> usize {
        self.frames
    }

    /// Raw contact count for a residue pair
    pub fn count(&self, pair: ResiduePair) -> usize {
        self.counts.get(&pair).copied().unwrap_or(0)
    }

    /// Number of residue pairs observed in contact at least once
    pub fn len(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.counts.is_empty()
    }

    /// Occupancy rows sorted by occupancy descending, then pair ascending
    pub fn rows(&self) -> Vec<OccupancyRow> {
        let mut rows: Vec<OccupancyRow> = self
            .counts
            .iter()
            .map(|(&(p, l), &count)| OccupancyRow {
                protein_resid: p,
                ligand_resid: l,
                occupancy: count as f64 / self.frames as f64 * 100.0,
            })
            .collect();

        rows.sort_by(|a, b| {
            b.occupancy
                .partial_cmp(&a.occupancy)
                .unwrap_or(std::cmp::Ordering::Equal)
                .then_with(|| {
                    (a.protein_resid, a.ligand_resid).cmp(&(b.protein_resid, b.ligand_resid))
                })
        });
        rows
    }

    /// Occupancy percentages in descending order, for the histogram
    pub fn occupancies(&self) -> Vec<f64> {
        self.rows().into_iter().map(|r| r.occupancy).collect()
    }

    /// Save the occupancy report as a tab-separated file
    pub fn save_report(&self, output_path: &Path) -> Result<(), String> {
        if let Some(parent) = output_path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)
                    .map_err(|e| format!("Failed to create output directory: {}", e))?;
            }
        }

        let mut writer = csv::WriterBuilder::new()
            .delimiter(b'\t')
            .has_headers(false)
            .from_path(output_path)
            .map_err(|e| format!("Failed to create report file {}: {}", output_path.display(), e))?;

        // Header written explicitly so empty tables still produce it
        writer
            .write_record(&["Residue Pair (Protein, Ligand)", "Occupancy (%)"])
            .map_err(|e| format!("Failed to write report header: {}", e))?;

        for row in self.rows() {
            writer
                .serialize(ReportRecord {
                    pair: format!("{}, {}", row.protein_resid, row.ligand_resid),
                    occupancy: format!("{:.2}", row.occupancy),
                })
                .map_err(|e| format!("Failed to write report row: {}", e))?;
        }

        writer
            .flush()
            .map_err(|e| format!("Failed to flush report file: {}", e))?;

        Ok(())
    }
}
