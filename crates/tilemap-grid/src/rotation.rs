use serde::{Deserialize, Serialize};

use crate::face::Face;

const FIELD_BITS: u32 = 4;
const FIELD_MASK: u32 = 0xf;

/// Quarter-turn rotation (0..=3) for each of the six faces, packed into one
/// integer with every field 4-bit aligned at `face.index() * 4`.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FaceRotations(u32);

impl FaceRotations {
    pub const NONE: FaceRotations = FaceRotations(0);

    /// Wraps raw packed bits. Fields are read modulo 4, so stray high bits
    /// inside a field never produce an out-of-range rotation.
    #[inline]
    pub const fn from_bits(bits: u32) -> Self {
        Self(bits)
    }

    #[inline]
    pub const fn bits(self) -> u32 {
        self.0
    }

    /// Same rotation on every face.
    pub fn uniform(quarter_turns: i32) -> Self {
        let mut out = Self::NONE;
        for f in Face::ALL {
            out.set(f, quarter_turns);
        }
        out
    }

    #[inline]
    fn shift(face: Face) -> u32 {
        face.index() as u32 * FIELD_BITS
    }

    #[inline]
    pub fn get(self, face: Face) -> u8 {
        (((self.0 >> Self::shift(face)) & FIELD_MASK) % 4) as u8
    }

    /// Stores `quarter_turns` modulo 4; negative values count counter-clockwise.
    #[inline]
    pub fn set(&mut self, face: Face, quarter_turns: i32) {
        let v = quarter_turns.rem_euclid(4) as u32;
        let shift = Self::shift(face);
        self.0 &= !(FIELD_MASK << shift);
        self.0 |= v << shift;
    }

    #[inline]
    pub fn with(mut self, face: Face, quarter_turns: i32) -> Self {
        self.set(face, quarter_turns);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fields_are_independent() {
        let mut r = FaceRotations::NONE;
        r.set(Face::PosX, 3);
        r.set(Face::NegZ, 1);
        assert_eq!(r.get(Face::PosX), 3);
        assert_eq!(r.get(Face::NegZ), 1);
        for f in [Face::PosY, Face::NegY, Face::NegX, Face::PosZ] {
            assert_eq!(r.get(f), 0);
        }
        assert_eq!(r.bits(), (3 << 8) | (1 << 20));
    }

    #[test]
    fn values_wrap_modulo_four() {
        let r = FaceRotations::NONE.with(Face::PosY, 5).with(Face::NegY, -1);
        assert_eq!(r.get(Face::PosY), 1);
        assert_eq!(r.get(Face::NegY), 3);
    }

    #[test]
    fn stray_high_bits_read_in_range() {
        let r = FaceRotations::from_bits(0xf);
        assert_eq!(r.get(Face::PosY), 3);
    }

    proptest! {
        #[test]
        fn set_then_get_is_mod_four(face_ix in 0usize..6, v in any::<i32>(), other in 0i32..4) {
            let face = Face::ALL[face_ix];
            let mut r = FaceRotations::uniform(other);
            r.set(face, v);
            prop_assert_eq!(r.get(face) as i32, v.rem_euclid(4));
            for f in Face::ALL {
                if f != face {
                    prop_assert_eq!(r.get(f) as i32, other);
                }
            }
        }
    }
}
