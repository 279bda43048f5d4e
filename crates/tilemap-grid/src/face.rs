use tilemap_geom::{IVec3, Vec3};

/// One of the six faces of a cell. Discriminants double as array indices
/// and as the slot order of [`crate::FaceRotations`].
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum Face {
    /// Top.
    PosY = 0,
    /// Bottom.
    NegY = 1,
    /// Right.
    PosX = 2,
    /// Left.
    NegX = 3,
    /// Front.
    PosZ = 4,
    /// Back.
    NegZ = 5,
}

impl Face {
    pub const ALL: [Face; 6] = [
        Face::PosY,
        Face::NegY,
        Face::PosX,
        Face::NegX,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Returns the `[0..6)` index of this face.
    #[inline]
    pub fn index(self) -> usize {
        self as usize
    }

    /// Converts a face index `[0..6)` back into a `Face` value.
    #[inline]
    pub fn from_index(i: usize) -> Option<Face> {
        Face::ALL.get(i).copied()
    }

    /// Returns the integer grid step taken when leaving the cell through this face.
    #[inline]
    pub fn delta(self) -> IVec3 {
        match self {
            Face::PosY => IVec3::UP,
            Face::NegY => IVec3::DOWN,
            Face::PosX => IVec3::RIGHT,
            Face::NegX => IVec3::LEFT,
            Face::PosZ => IVec3::FORWARD,
            Face::NegZ => IVec3::BACK,
        }
    }

    #[inline]
    pub fn normal(self) -> Vec3 {
        self.delta().as_vec3()
    }

    #[inline]
    pub fn opposite(self) -> Face {
        match self {
            Face::PosY => Face::NegY,
            Face::NegY => Face::PosY,
            Face::PosX => Face::NegX,
            Face::NegX => Face::PosX,
            Face::PosZ => Face::NegZ,
            Face::NegZ => Face::PosZ,
        }
    }

    /// Exact inverse of [`Face::delta`].
    #[inline]
    pub fn from_delta(d: IVec3) -> Option<Face> {
        Face::ALL.into_iter().find(|f| f.delta() == d)
    }

    /// Resolves a contact normal to the face it points out of.
    ///
    /// Components are tested against a 0.5 threshold in the order x, z, y;
    /// the first axis that passes wins, so a diagonal normal such as
    /// `(0.7, 0.7, 0)` resolves to `PosX`. A normal that passes no test
    /// (zero, or pointing mostly down) resolves to `NegY`.
    pub fn from_contact_normal(n: Vec3) -> Face {
        if n.x > 0.5 {
            Face::PosX
        } else if n.x < -0.5 {
            Face::NegX
        } else if n.z > 0.5 {
            Face::PosZ
        } else if n.z < -0.5 {
            Face::NegZ
        } else if n.y > 0.5 {
            Face::PosY
        } else {
            Face::NegY
        }
    }

    /// Resolves an integer paint normal by sign, testing x, y, z in order.
    /// The zero vector names no face.
    pub fn from_grid_normal(n: IVec3) -> Option<Face> {
        if n.x > 0 {
            Some(Face::PosX)
        } else if n.x < 0 {
            Some(Face::NegX)
        } else if n.y > 0 {
            Some(Face::PosY)
        } else if n.y < 0 {
            Some(Face::NegY)
        } else if n.z > 0 {
            Some(Face::PosZ)
        } else if n.z < 0 {
            Some(Face::NegZ)
        } else {
            None
        }
    }

    /// Face this one becomes after a quarter turn clockwise about +Y
    /// (front → right → back → left → front). Top and bottom stay put.
    #[inline]
    pub fn rotated_cw(self) -> Face {
        match self {
            Face::PosZ => Face::PosX,
            Face::PosX => Face::NegZ,
            Face::NegZ => Face::NegX,
            Face::NegX => Face::PosZ,
            f => f,
        }
    }

    #[inline]
    pub fn rotated_ccw(self) -> Face {
        match self {
            Face::PosX => Face::PosZ,
            Face::NegZ => Face::PosX,
            Face::NegX => Face::NegZ,
            Face::PosZ => Face::NegX,
            f => f,
        }
    }
}
