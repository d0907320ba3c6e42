//! Species interaction matrix and its procedural archetypes
//!
//! Entry `(i, j)` is the coefficient species `i` feels toward species `j`:
//! positive attracts, negative repels. Values conventionally lie in `[-1, 1]`.

use crate::constants::clamp_species;
use rand::Rng;

/// Square, row-major interaction matrix.
#[derive(Clone, Debug, PartialEq)]
pub struct InteractionMatrix {
    size: usize,
    values: Vec<f32>,
}

impl InteractionMatrix {
    /// Zero-filled `size × size` matrix.
    pub fn zeros(size: usize) -> Self {
        Self {
            size,
            values: vec![0.0; size * size],
        }
    }

    /// Build a matrix from nested rows.
    ///
    /// Ragged input is tolerated: the result is square with side equal to the
    /// number of rows, missing cells are zero and extra cells are dropped.
    pub fn from_rows(rows: &[Vec<f32>]) -> Self {
        let size = rows.len();
        let mut matrix = Self::zeros(size);
        for (i, row) in rows.iter().enumerate() {
            for (j, &value) in row.iter().take(size).enumerate() {
                matrix.set(i, j, value);
            }
        }
        matrix
    }

    /// Build a matrix by evaluating `f(i, j)` for every cell.
    pub fn from_fn(size: usize, mut f: impl FnMut(usize, usize) -> f32) -> Self {
        let mut values = Vec::with_capacity(size * size);
        for i in 0..size {
            for j in 0..size {
                values.push(f(i, j));
            }
        }
        Self { size, values }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    pub fn get(&self, i: usize, j: usize) -> f32 {
        self.values[i * self.size + j]
    }

    pub fn set(&mut self, i: usize, j: usize, value: f32) {
        self.values[i * self.size + j] = value;
    }

    /// Row-major cell values, ready for upload.
    pub fn as_slice(&self) -> &[f32] {
        &self.values
    }

    pub fn rows(&self) -> Vec<Vec<f32>> {
        self.values
            .chunks(self.size.max(1))
            .take(self.size)
            .map(|row| row.to_vec())
            .collect()
    }

    /// Copy of this matrix with side `new_size`.
    ///
    /// The overlapping `[0, min(old, new))²` block is preserved exactly, every
    /// other cell of the result is zero.
    pub fn resized(&self, new_size: usize) -> Self {
        let keep = self.size.min(new_size);
        let mut out = Self::zeros(new_size);
        for i in 0..keep {
            for j in 0..keep {
                out.set(i, j, self.get(i, j));
            }
        }
        out
    }

    pub fn is_symmetric(&self) -> bool {
        (0..self.size).all(|i| (0..i).all(|j| self.get(i, j) == self.get(j, i)))
    }
}

/// Procedural rule for generating an interaction matrix.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum MatrixArchetype {
    /// Every cell uniform in `[-1, 1]`
    FullRandom,
    /// Upper triangle random, mirrored
    SymmetricRandom,
    /// Half the cells zero, the rest uniform in `[-0.2, 0.2]`
    SparseWeak,
    /// A third of the cells zero, the rest near ±1
    PolarizedStrong,
    /// Self and ring neighbours attract, everything else repels
    Chain,
    /// Like `Chain` with weak neighbour attraction
    WeakChain,
    /// Like `WeakChain` but non-neighbours are neutral
    NeutralChain,
    /// Each species weakly chases the next one
    Snake,
    /// Attraction decays with ring distance, far species repel
    BandedAttractRepel,
}

impl MatrixArchetype {
    pub const ALL: [MatrixArchetype; 9] = [
        MatrixArchetype::FullRandom,
        MatrixArchetype::SymmetricRandom,
        MatrixArchetype::SparseWeak,
        MatrixArchetype::PolarizedStrong,
        MatrixArchetype::Chain,
        MatrixArchetype::WeakChain,
        MatrixArchetype::NeutralChain,
        MatrixArchetype::Snake,
        MatrixArchetype::BandedAttractRepel,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MatrixArchetype::FullRandom => "full random",
            MatrixArchetype::SymmetricRandom => "symmetric random",
            MatrixArchetype::SparseWeak => "sparse weak",
            MatrixArchetype::PolarizedStrong => "polarized strong",
            MatrixArchetype::Chain => "chain",
            MatrixArchetype::WeakChain => "weak chain",
            MatrixArchetype::NeutralChain => "neutral chain",
            MatrixArchetype::Snake => "snake",
            MatrixArchetype::BandedAttractRepel => "banded attract/repel",
        }
    }

    /// Generate an `N × N` matrix, `N` clamped to the supported species range.
    pub fn generate<R: Rng>(self, species_count: usize, rng: &mut R) -> InteractionMatrix {
        let n = clamp_species(species_count);
        match self {
            MatrixArchetype::FullRandom => {
                InteractionMatrix::from_fn(n, |_, _| rng.random_range(-1.0..=1.0))
            }
            MatrixArchetype::SymmetricRandom => {
                let mut matrix = InteractionMatrix::zeros(n);
                for i in 0..n {
                    for j in i..n {
                        let value = rng.random_range(-1.0..=1.0);
                        matrix.set(i, j, value);
                        matrix.set(j, i, value);
                    }
                }
                matrix
            }
            MatrixArchetype::SparseWeak => InteractionMatrix::from_fn(n, |_, _| {
                if rng.random_bool(0.5) {
                    0.0
                } else {
                    rng.random_range(-0.2..=0.2)
                }
            }),
            MatrixArchetype::PolarizedStrong => InteractionMatrix::from_fn(n, |_, _| {
                if rng.random_bool(1.0 / 3.0) {
                    0.0
                } else if rng.random_bool(0.5) {
                    rng.random_range(0.8..=1.0)
                } else {
                    rng.random_range(-1.0..=-0.8)
                }
            }),
            MatrixArchetype::Chain => InteractionMatrix::from_fn(n, |i, j| {
                match ring_distance(i, j, n) {
                    0 | 1 => 1.0,
                    _ => -1.0,
                }
            }),
            MatrixArchetype::WeakChain => InteractionMatrix::from_fn(n, |i, j| {
                match ring_distance(i, j, n) {
                    0 => 1.0,
                    1 => 0.2,
                    _ => -1.0,
                }
            }),
            MatrixArchetype::NeutralChain => InteractionMatrix::from_fn(n, |i, j| {
                match ring_distance(i, j, n) {
                    0 => 1.0,
                    1 => 0.2,
                    _ => 0.0,
                }
            }),
            MatrixArchetype::Snake => InteractionMatrix::from_fn(n, |i, j| {
                if i == j {
                    1.0
                } else if j == (i + 1) % n {
                    0.2
                } else {
                    0.0
                }
            }),
            MatrixArchetype::BandedAttractRepel => InteractionMatrix::from_fn(n, |i, j| {
                match ring_distance(i, j, n) {
                    0 => 1.0,
                    1 => 0.5,
                    2 => 0.2,
                    _ => -0.8,
                }
            }),
        }
    }
}

/// Where a preset's matrix comes from.
///
/// Custom payloads are only checked against the species count when resolved.
#[derive(Clone, Debug, PartialEq)]
pub enum MatrixSource {
    Archetype(MatrixArchetype),
    Custom(InteractionMatrix),
}

impl MatrixSource {
    /// Produce a matrix sized for `species_count` (clamped).
    ///
    /// Custom payloads of the wrong size are cropped or zero-padded, never
    /// rejected.
    pub fn resolve<R: Rng>(&self, species_count: usize, rng: &mut R) -> InteractionMatrix {
        let n = clamp_species(species_count);
        match self {
            MatrixSource::Archetype(archetype) => archetype.generate(n, rng),
            MatrixSource::Custom(matrix) if matrix.size() == n => matrix.clone(),
            MatrixSource::Custom(matrix) => {
                log::debug!("Resizing custom matrix {0}x{0} -> {1}x{1}", matrix.size(), n);
                matrix.resized(n)
            }
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            MatrixSource::Archetype(archetype) => archetype.name(),
            MatrixSource::Custom(_) => "custom",
        }
    }
}

/// Shortest distance between two indices on a ring of `n` species.
fn ring_distance(i: usize, j: usize, n: usize) -> usize {
    let d = i.abs_diff(j) % n;
    d.min(n - d)
}
