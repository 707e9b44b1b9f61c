//! End-to-end test of the analysis pipeline: topology loading, atom
//! selection, trajectory reading, occupancy aggregation and report output.

use contact_occupancy_rs::{load_topology, open_trajectory, select, ContactAnalysis, Histogram};
use std::fs;
use std::path::PathBuf;

const TOPOLOGY_GRO: &str = "\
protein-ligand test system
    4
    1ALA      N    1   0.000   0.000   0.000
    1ALA     CA    2   0.100   0.000   0.000
    2LIG     C1    3   0.300   0.000   0.000
    2LIG     H1    4   0.350   0.000   0.000
   5.00000   5.00000   5.00000
";

// Frame 1: ligand C1 within 4 A of both residue-1 atoms (one contact pair).
// Frame 2: ligand moved away, no contacts.
const TRAJECTORY_PDB: &str = "\
MODEL        1
ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00  0.00           N
ATOM      2  CA  ALA A   1       1.000   0.000   0.000  1.00  0.00           C
HETATM    3  C1  LIG A   2       3.000   0.000   0.000  1.00  0.00           C
HETATM    4  H1  LIG A   2       3.500   0.000   0.000  1.00  0.00           H
ENDMDL
MODEL        2
ATOM      1  N   ALA A   1       0.000   0.000   0.000  1.00  0.00           N
ATOM      2  CA  ALA A   1       1.000   0.000   0.000  1.00  0.00           C
HETATM    3  C1  LIG A   2      20.000   0.000   0.000  1.00  0.00           C
HETATM    4  H1  LIG A   2      21.000   0.000   0.000  1.00  0.00           H
ENDMDL
";

fn setup(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "contact_occupancy_{}_{}",
        name,
        std::process::id()
    ));
    fs::create_dir_all(&dir).unwrap();
    dir
}

#[test]
fn full_pipeline_from_gro_topology_and_pdb_trajectory() {
    let dir = setup("pipeline");
    let top_path = dir.join("system.gro");
    let traj_path = dir.join("traj.pdb");
    let report_path = dir.join("occupancy.dat");
    fs::write(&top_path, TOPOLOGY_GRO).unwrap();
    fs::write(&traj_path, TRAJECTORY_PDB).unwrap();

    let topology = load_topology(&top_path).unwrap();
    assert_eq!(topology.len(), 4);

    let protein = select(&topology, "resid 1 and not (name H* or type O)").unwrap();
    let ligand = select(&topology, "resname LIG and not name H*").unwrap();
    assert_eq!(protein, vec![0, 1]);
    assert_eq!(ligand, vec![2]);

    let reader = open_trajectory(&traj_path).unwrap();
    let frames = reader.read_frames(Some(2000)).unwrap();
    assert_eq!(frames.len(), 2);

    let analysis = ContactAnalysis::new(protein, ligand, 4.0).unwrap();
    let table = analysis.analyze(&topology, &frames).unwrap();

    // One residue pair, in contact in 1 of 2 frames
    assert_eq!(table.len(), 1);
    assert_eq!(table.frames(), 2);
    assert_eq!(table.count((1, 2)), 1);

    let rows = table.rows();
    assert_eq!(rows.len(), 1);
    assert!((rows[0].occupancy - 50.0).abs() < 1e-9);

    table.save_report(&report_path).unwrap();
    let content = fs::read_to_string(&report_path).unwrap();
    let lines: Vec<&str> = content.lines().collect();
    assert_eq!(lines[0], "Residue Pair (Protein, Ligand)\tOccupancy (%)");
    assert_eq!(lines[1], "1, 2\t50.00");
    assert_eq!(lines.len(), 2);

    // Histogram over percentages: the 50% value lands in bin 10 of 20
    let hist = Histogram::from_values(&table.occupancies(), 20, 0.0, 100.0).unwrap();
    assert_eq!(hist.counts()[10], 1);
    assert_eq!(hist.total(), 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn frame_cap_limits_processed_frames() {
    let dir = setup("frame_cap");
    let traj_path = dir.join("traj.pdb");
    fs::write(&traj_path, TRAJECTORY_PDB).unwrap();

    let reader = open_trajectory(&traj_path).unwrap();
    let frames = reader.read_frames(Some(1)).unwrap();
    assert_eq!(frames.len(), 1);

    fs::remove_dir_all(&dir).ok();
}

#[test]
fn no_contacts_anywhere_gives_empty_report() {
    let dir = setup("empty");
    let top_path = dir.join("system.gro");
    let traj_path = dir.join("traj.gro");
    let report_path = dir.join("occupancy.dat");
    fs::write(&top_path, TOPOLOGY_GRO).unwrap();

    // Single GRO frame with the ligand 10 nm away from the protein
    let traj = "\
frame 0
    4
    1ALA      N    1   0.000   0.000   0.000
    1ALA     CA    2   0.100   0.000   0.000
    2LIG     C1    3  10.000   0.000   0.000
    2LIG     H1    4  10.050   0.000   0.000
   5.00000   5.00000   5.00000
";
    fs::write(&traj_path, traj).unwrap();

    let topology = load_topology(&top_path).unwrap();
    let protein = select(&topology, "resid 1").unwrap();
    let ligand = select(&topology, "resid 2").unwrap();

    let frames = open_trajectory(&traj_path)
        .unwrap()
        .read_frames(None)
        .unwrap();
    let table = ContactAnalysis::new(protein, ligand, 4.0)
        .unwrap()
        .analyze(&topology, &frames)
        .unwrap();

    assert!(table.is_empty());

    table.save_report(&report_path).unwrap();
    let content = fs::read_to_string(&report_path).unwrap();
    assert_eq!(
        content.lines().collect::<Vec<_>>(),
        vec!["Residue Pair (Protein, Ligand)\tOccupancy (%)"]
    );

    fs::remove_dir_all(&dir).ok();
}
