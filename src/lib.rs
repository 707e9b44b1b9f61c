pub mod histogram;
pub mod occupancy;
pub mod selection;
pub mod structure;
pub mod topology;
pub mod trajectory;

// Re-export commonly used types and traits
pub use histogram::Histogram;
pub use occupancy::{ContactAnalysis, OccupancyRow, OccupancyTable, ResiduePair};
pub use selection::select;
pub use structure::{Atom, Coordinate, Topology};
pub use topology::load_topology;
pub use trajectory::{open_trajectory, Frame, GroTrajectory, PdbTrajectory, TrajectoryReader};
