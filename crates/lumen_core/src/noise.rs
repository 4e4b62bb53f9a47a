//! Perlin gradient noise with a fixed 256-entry lattice.

use lumen_math::Vec3;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

const POINT_COUNT: usize = 256;

/// Gradient lattice built once per scene.
#[derive(Clone, Debug)]
pub struct Perlin {
    gradients: Vec<Vec3>,
    perm_x: Vec<usize>,
    perm_y: Vec<usize>,
    perm_z: Vec<usize>,
}

impl Perlin {
    /// Build a lattice from a seed. Equal seeds give identical noise.
    pub fn new(seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);

        let gradients = (0..POINT_COUNT)
            .map(|_| loop {
                let v = Vec3::new(
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                    rng.gen_range(-1.0..1.0),
                );
                if v.length_squared() > 1e-6 {
                    break v.normalize();
                }
            })
            .collect();

        let permutation = |rng: &mut StdRng| {
            let mut p: Vec<usize> = (0..POINT_COUNT).collect();
            p.shuffle(rng);
            p
        };
        let perm_x = permutation(&mut rng);
        let perm_y = permutation(&mut rng);
        let perm_z = permutation(&mut rng);

        Self {
            gradients,
            perm_x,
            perm_y,
            perm_z,
        }
    }

    /// Smooth noise in roughly `[-1, 1]`.
    pub fn noise(&self, p: Vec3) -> f32 {
        let floor = p.floor();
        let frac = p - floor;
        let i = floor.x as i64;
        let j = floor.y as i64;
        let k = floor.z as i64;

        let mut c = [[[Vec3::ZERO; 2]; 2]; 2];
        for (di, plane) in c.iter_mut().enumerate() {
            for (dj, row) in plane.iter_mut().enumerate() {
                for (dk, cell) in row.iter_mut().enumerate() {
                    let index = self.perm_x[((i + di as i64) & 255) as usize]
                        ^ self.perm_y[((j + dj as i64) & 255) as usize]
                        ^ self.perm_z[((k + dk as i64) & 255) as usize];
                    *cell = self.gradients[index];
                }
            }
        }

        perlin_interp(&c, frac)
    }

    /// Sum of `depth` octaves of noise, each at double the frequency and
    /// half the weight of the previous one.
    pub fn turbulence(&self, p: Vec3, depth: u32) -> f32 {
        let mut accum = 0.0;
        let mut temp = p;
        let mut weight = 1.0;

        for _ in 0..depth {
            accum += weight * self.noise(temp);
            weight *= 0.5;
            temp *= 2.0;
        }

        accum.abs()
    }
}

impl Default for Perlin {
    fn default() -> Self {
        Self::new(0x5eed)
    }
}

fn perlin_interp(c: &[[[Vec3; 2]; 2]; 2], frac: Vec3) -> f32 {
    // Hermite smoothing
    let s = frac * frac * (Vec3::splat(3.0) - 2.0 * frac);

    let mut accum = 0.0;
    for (i, plane) in c.iter().enumerate() {
        for (j, row) in plane.iter().enumerate() {
            for (k, gradient) in row.iter().enumerate() {
                let (fi, fj, fk) = (i as f32, j as f32, k as f32);
                let weight = Vec3::new(frac.x - fi, frac.y - fj, frac.z - fk);
                accum += (fi * s.x + (1.0 - fi) * (1.0 - s.x))
                    * (fj * s.y + (1.0 - fj) * (1.0 - s.y))
                    * (fk * s.z + (1.0 - fk) * (1.0 - s.z))
                    * gradient.dot(weight);
            }
        }
    }
    accum
}
