//! Material property references and the tables they point into.

use lumen_math::Vec3;

use crate::noise::Perlin;
use crate::table::Table;
use crate::texture::ImageTexture;

/// A tagged index into one of the property tables.
///
/// Resolving a reference to a colour happens in the renderer; this type
/// only says which table to look in.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum PropertyRef {
    Rgb(u32),
    Image(u32),
    Checker(u32),
    Noise(u32),
}

impl PropertyRef {
    pub const KIND_RGB: u32 = 0;
    pub const KIND_IMAGE: u32 = 1;
    pub const KIND_CHECKER: u32 = 2;
    pub const KIND_NOISE: u32 = 3;

    /// Decode the packed `(kind, index)` form. Unknown kinds give `None`.
    pub fn from_raw(kind: u32, index: u32) -> Option<Self> {
        match kind {
            Self::KIND_RGB => Some(Self::Rgb(index)),
            Self::KIND_IMAGE => Some(Self::Image(index)),
            Self::KIND_CHECKER => Some(Self::Checker(index)),
            Self::KIND_NOISE => Some(Self::Noise(index)),
            _ => None,
        }
    }

    pub fn to_raw(self) -> (u32, u32) {
        match self {
            Self::Rgb(i) => (Self::KIND_RGB, i),
            Self::Image(i) => (Self::KIND_IMAGE, i),
            Self::Checker(i) => (Self::KIND_CHECKER, i),
            Self::Noise(i) => (Self::KIND_NOISE, i),
        }
    }

    /// Basic kinds resolve without recursion.
    pub fn is_basic(self) -> bool {
        !matches!(self, Self::Checker(_))
    }
}

/// 3D checker pattern in object space.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct CheckerTexture {
    /// Edge length of one cell
    pub scale: f32,
    pub odd: PropertyRef,
    pub even: PropertyRef,
}

/// Marble-like turbulence pattern.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NoiseTexture {
    pub scale: f32,
}

/// All property tables of a scene.
#[derive(Clone, Debug, Default)]
pub struct PropertyTables {
    pub colours: Table<Vec3>,
    pub images: Table<ImageTexture>,
    pub checkers: Table<CheckerTexture>,
    pub noises: Table<NoiseTexture>,
    pub perlin: Perlin,
}

impl PropertyTables {
    /// Does `property` point at an existing row?
    pub fn contains(&self, property: PropertyRef) -> bool {
        match property {
            PropertyRef::Rgb(i) => self.colours.get(i).is_some(),
            PropertyRef::Image(i) => self.images.get(i).is_some(),
            PropertyRef::Checker(i) => self.checkers.get(i).is_some(),
            PropertyRef::Noise(i) => self.noises.get(i).is_some(),
        }
    }
}
