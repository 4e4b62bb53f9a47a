//! Turns property references into colours at a hit point.
//!
//! Resolution never fails: a reference to a missing row, or a nested
//! checker, resolves to black.

use lumen_core::{CheckerTexture, NoiseTexture, Perlin, PropertyRef, PropertyTables};
use lumen_math::Vec3;

use crate::geometry::HitRecord;

/// Octaves of turbulence in the marble pattern.
const TURBULENCE_DEPTH: u32 = 7;

#[derive(Clone, Copy)]
pub struct PropertyResolver<'a> {
    tables: &'a PropertyTables,
}

impl<'a> PropertyResolver<'a> {
    pub fn new(tables: &'a PropertyTables) -> Self {
        Self { tables }
    }

    /// Resolve a constant, image or noise reference.
    pub fn resolve_basic(&self, property: PropertyRef, hit: &HitRecord) -> Vec3 {
        let tables = self.tables;
        match property {
            PropertyRef::Rgb(i) => tables.colours.get(i).copied().unwrap_or(Vec3::ZERO),
            PropertyRef::Image(i) => tables
                .images
                .get(i)
                .map_or(Vec3::ZERO, |image| image.sample(hit.u, hit.v)),
            PropertyRef::Noise(i) => tables.noises.get(i).map_or(Vec3::ZERO, |noise| {
                marble(noise, &tables.perlin, hit.local_position)
            }),
            PropertyRef::Checker(_) => Vec3::ZERO,
        }
    }

    /// Resolve any reference, descending one level into checkers.
    pub fn resolve(&self, property: PropertyRef, hit: &HitRecord) -> Vec3 {
        match property {
            PropertyRef::Checker(i) => self
                .tables
                .checkers
                .get(i)
                .map_or(Vec3::ZERO, |checker| {
                    self.resolve_basic(checker_cell(checker, hit.local_position), hit)
                }),
            basic => self.resolve_basic(basic, hit),
        }
    }

    /// Resolve a packed `(kind, index)` pair; unknown kinds are black.
    pub fn resolve_raw(&self, kind: u32, index: u32, hit: &HitRecord) -> Vec3 {
        PropertyRef::from_raw(kind, index).map_or(Vec3::ZERO, |p| self.resolve(p, hit))
    }
}

/// Pick the nested reference for the lattice cell containing `p`.
fn checker_cell(checker: &CheckerTexture, p: Vec3) -> PropertyRef {
    let cell = (p / checker.scale).floor();
    let sum = cell.x as i64 + cell.y as i64 + cell.z as i64;
    if sum.rem_euclid(2) == 0 {
        checker.even
    } else {
        checker.odd
    }
}

fn marble(noise: &NoiseTexture, perlin: &Perlin, p: Vec3) -> Vec3 {
    let turbulence = perlin.turbulence(p, TURBULENCE_DEPTH);
    Vec3::splat(0.5 * (1.0 + (noise.scale * p.z + 10.0 * turbulence).sin()))
}
