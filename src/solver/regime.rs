//! Flow regime tags and per-node classification.

/// Flux-splitting regime along one axis.
///
/// Positive/negative is the sign of the normal velocity `n`; super/sub
/// compares `|n|` with the wave speed `c = sqrt(g h)`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum FlowRegime {
    /// `n > c`: everything comes from the upstream (minus-side) neighbour.
    SuperPos,
    /// `0 <= n <= c`: two-sided blend, weighted toward the minus side.
    SubPos,
    /// `-c <= n < 0`: two-sided blend, weighted toward the plus side.
    SubNeg,
    /// `n < -c`: everything comes from the plus-side neighbour.
    SuperNeg,
}

impl FlowRegime {
    /// Classify a normal velocity against the local wave speed.
    #[inline]
    pub fn classify(n: f64, c: f64) -> Self {
        if n >= 0.0 {
            if n > c { Self::SuperPos } else { Self::SubPos }
        } else if n < -c {
            Self::SuperNeg
        } else {
            Self::SubNeg
        }
    }

    /// Regime forced by dry faces around a dry cell.
    ///
    /// A dry face neighbour leaves only the one-sided formula drawing from the
    /// wet side; with both faces dry nothing flows along this axis.
    #[inline]
    pub fn from_dry_faces(minus_dry: bool, plus_dry: bool) -> Option<Self> {
        match (minus_dry, plus_dry) {
            (false, false) => Some(Self::SubPos),
            (true, false) => Some(Self::SuperNeg),
            (false, true) => Some(Self::SuperPos),
            (true, true) => None,
        }
    }
}

/// Which face neighbours of a cell are dry (`h == 0`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DryFaces {
    pub left: bool,
    pub right: bool,
    pub up: bool,
    pub down: bool,
}

impl DryFaces {
    #[inline]
    pub fn from_heights(left: f64, right: f64, up: f64, down: f64) -> Self {
        Self {
            left: left == 0.0,
            right: right == 0.0,
            up: up == 0.0,
            down: down == 0.0,
        }
    }

    #[inline]
    pub fn all(&self) -> bool {
        self.left && self.right && self.up && self.down
    }

    #[inline]
    pub fn any(&self) -> bool {
        self.left || self.right || self.up || self.down
    }
}

/// What a single node does this step.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NodeClass {
    /// Dry cell surrounded by dry faces: a fixed point, output is all zero.
    Isolated,
    /// Regimes per axis; `None` means no flux along that axis.
    Flux {
        u: Option<FlowRegime>,
        v: Option<FlowRegime>,
    },
}

/// Classify one node.
///
/// Face dryness only matters when the cell itself is dry. A wet cell, or a dry
/// cell whose four faces are all wet, is classified from its own velocities.
#[inline]
pub fn classify_node(h: f64, u: f64, v: f64, c: f64, faces: DryFaces) -> NodeClass {
    if h == 0.0 && faces.any() {
        if faces.all() {
            return NodeClass::Isolated;
        }
        return NodeClass::Flux {
            u: FlowRegime::from_dry_faces(faces.left, faces.right),
            v: FlowRegime::from_dry_faces(faces.up, faces.down),
        };
    }
    NodeClass::Flux {
        u: Some(FlowRegime::classify(u, c)),
        v: Some(FlowRegime::classify(v, c)),
    }
}
