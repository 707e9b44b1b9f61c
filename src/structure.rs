/// 3D coordinate vector
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Coordinate {
    pub x: f64,
    pub y: f64,
    pub z: f64,
}

impl Coordinate {
    pub fn new(x: f64, y: f64, z: f64) -> Self {
        Self { x, y, z }
    }

    /// Calculate Euclidean distance to another coordinate
    pub fn distance_to(&self, other: &Coordinate) -> f64 {
        self.distance_squared_to(other).sqrt()
    }

    /// Squared distance, for cutoff comparisons without the sqrt
    pub fn distance_squared_to(&self, other: &Coordinate) -> f64 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        let dz = self.z - other.z;
        dx * dx + dy * dy + dz * dz
    }
}

/// One atom record from a topology file
#[derive(Debug, Clone)]
pub struct Atom {
    pub serial: i32,
    pub name: String,
    pub resname: String,
    pub resid: i32,
    pub position: Coordinate,
}

impl Atom {
    /// Element-like type letter for `type` selections: the first alphabetic
    /// character of the atom name, uppercased (e.g. "OW" -> "O", "1HB" -> "H").
    pub fn type_letter(&self) -> Option<char> {
        self.name
            .chars()
            .find(|c| c.is_ascii_alphabetic())
            .map(|c| c.to_ascii_uppercase())
    }
}

/// Static atom list shared by every trajectory frame
#[derive(Debug, Clone, Default)]
pub struct Topology {
    pub atoms: Vec<Atom>,
}

impl Topology {
    pub fn new(atoms: Vec<Atom>) -> Self {
        Self { atoms }
    }

    pub fn len(&self) -> usize {
        self.atoms.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atoms.is_empty()
    }

    /// Highest residue id in the topology; resolves the `last` selection keyword
    pub fn max_resid(&self) -> i32 {
        self.atoms.iter().map(|a| a.resid).max().unwrap_or(0)
    }
}
