use clap::Parser;
use contact_occupancy_rs::{load_topology, open_trajectory, select, ContactAnalysis, Histogram};
use std::path::PathBuf;

/// Command-line tool for residue contact occupancy analysis
#[derive(Parser)]
#[command(name = "contact-occupancy")]
#[command(
    about = "Compute residue-pair contact occupancy between a protein and a ligand over an MD trajectory",
    long_about = None
)]
struct Cli {
    /// Topology file (.gro or .pdb)
    topology: PathBuf,

    /// Trajectory file (.pdb multi-model, .gro multi-frame, or .xtc with the 'xtc' feature)
    trajectory: PathBuf,

    /// Selection expression for the protein atom group
    #[arg(long, default_value = "resid 1:last and not (name H* or type O)")]
    protein_selection: String,

    /// Selection expression for the ligand atom group
    #[arg(long, default_value = "resid 1:last")]
    ligand_selection: String,

    /// Contact cutoff distance in Angstroms
    #[arg(long, default_value_t = 4.0)]
    cutoff: f64,

    /// Maximum number of frames to process
    #[arg(long, default_value_t = 2000)]
    max_frames: usize,

    /// Output report path (tab-separated)
    #[arg(short, long, default_value = "hydrophobic_occupancy.dat")]
    output: PathBuf,

    /// Number of histogram bins over 0-100%
    #[arg(long, default_value_t = 20)]
    bins: usize,

    /// Skip the on-screen occupancy histogram
    #[arg(long)]
    no_plot: bool,
}

fn main() {
    let cli = Cli::parse();

    println!("Topology: {:?}", cli.topology);
    println!("Trajectory: {:?}", cli.trajectory);
    println!("Cutoff distance: {} A", cli.cutoff);

    // Load topology
    let topology = match load_topology(&cli.topology) {
        Ok(t) => {
            println!("✅ Loaded {} atoms", t.len());
            t
        }
        Err(e) => {
            eprintln!("❌ Error loading topology: {}", e);
            std::process::exit(1);
        }
    };

    // Select the protein and ligand atom groups
    let protein = match select(&topology, &cli.protein_selection) {
        Ok(idx) => {
            println!("✅ Protein selection matched {} atoms", idx.len());
            idx
        }
        Err(e) => {
            eprintln!("❌ Error in protein selection: {}", e);
            std::process::exit(1);
        }
    };
    let ligand = match select(&topology, &cli.ligand_selection) {
        Ok(idx) => {
            println!("✅ Ligand selection matched {} atoms", idx.len());
            idx
        }
        Err(e) => {
            eprintln!("❌ Error in ligand selection: {}", e);
            std::process::exit(1);
        }
    };

    let analysis = match ContactAnalysis::new(protein, ligand, cli.cutoff) {
        Ok(a) => a,
        Err(e) => {
            eprintln!("❌ {}", e);
            std::process::exit(1);
        }
    };

    // Read trajectory frames
    let reader = match open_trajectory(&cli.trajectory) {
        Ok(r) => r,
        Err(e) => {
            eprintln!("❌ Error opening trajectory: {}", e);
            std::process::exit(1);
        }
    };
    let frames = match reader.read_frames(Some(cli.max_frames)) {
        Ok(f) => {
            println!("✅ Read {} frames", f.len());
            f
        }
        Err(e) => {
            eprintln!("❌ Error reading trajectory: {}", e);
            std::process::exit(1);
        }
    };

    // Compute the occupancy table
    let table = match analysis.analyze(&topology, &frames) {
        Ok(t) => {
            println!(
                "✅ Found {} residue pairs in contact over {} frames",
                t.len(),
                t.frames()
            );
            t
        }
        Err(e) => {
            eprintln!("❌ Error computing occupancy: {}", e);
            std::process::exit(1);
        }
    };

    if !cli.no_plot {
        match Histogram::from_values(&table.occupancies(), cli.bins, 0.0, 100.0) {
            Ok(hist) => {
                println!();
                println!("Contact occupancy distribution (%):");
                print!("{}", hist.render(50));
            }
            Err(e) => {
                eprintln!("❌ Error building histogram: {}", e);
                std::process::exit(1);
            }
        }
    }

    match table.save_report(&cli.output) {
        Ok(()) => println!("📄 Results saved to: {:?}", cli.output),
        Err(e) => {
            eprintln!("❌ Error saving report: {}", e);
            std::process::exit(1);
        }
    }
}
