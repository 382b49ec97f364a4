//! Planar geometry: points, Euclidean distance, and station layouts.
//!
//! Distances are in km on a flat plane; the network is small enough that
//! curvature does not matter.

use std::collections::HashSet;

use rand::Rng;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct Point {
    pub x: f64,
    pub y: f64,
}

impl Point {
    pub const fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    pub fn distance(&self, other: Point) -> f64 {
        ((self.x - other.x).powi(2) + (self.y - other.y).powi(2)).sqrt()
    }
}

impl From<(f64, f64)> for Point {
    fn from((x, y): (f64, f64)) -> Self {
        Self { x, y }
    }
}

/// How stations are placed when a scenario is built.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum StationLayout {
    /// `rows × columns` stations, `spacing_km` apart.
    Grid {
        rows: usize,
        columns: usize,
        spacing_km: f64,
    },
    /// `count` distinct integer positions in `[0, size)²`.
    SquareRandom { size: u32, count: usize },
    /// `count` distinct integer positions inside a disc of `radius` around the origin.
    CircleRandom { radius: u32, count: usize },
}

impl Default for StationLayout {
    fn default() -> Self {
        StationLayout::Grid {
            rows: 3,
            columns: 3,
            spacing_km: 2.0,
        }
    }
}

impl StationLayout {
    /// Upper bound on the number of distinct positions this layout can produce.
    pub fn capacity(&self) -> usize {
        match *self {
            StationLayout::Grid { rows, columns, .. } => rows * columns,
            StationLayout::SquareRandom { size, count } => count.min((size as usize).pow(2)),
            StationLayout::CircleRandom { radius, count } => {
                let r = radius as i64;
                let lattice = (-r..=r)
                    .flat_map(|x| (-r..=r).map(move |y| (x, y)))
                    .filter(|(x, y)| x * x + y * y <= r * r)
                    .count();
                count.min(lattice)
            }
        }
    }

    /// Generate station positions. Random layouts never repeat a position.
    pub fn positions<R: Rng>(&self, rng: &mut R) -> Vec<Point> {
        match *self {
            StationLayout::Grid {
                rows,
                columns,
                spacing_km,
            } => (0..rows)
                .flat_map(|i| {
                    (0..columns).map(move |j| Point::new(i as f64 * spacing_km, j as f64 * spacing_km))
                })
                .collect(),
            StationLayout::SquareRandom { size, .. } => {
                let size = size.max(1) as i64;
                sample_unique(rng, self.capacity(), |rng| {
                    Some((rng.gen_range(0..size), rng.gen_range(0..size)))
                })
            }
            StationLayout::CircleRandom { radius, .. } => {
                let r = radius as i64;
                sample_unique(rng, self.capacity(), |rng| {
                    let (x, y) = (rng.gen_range(-r..=r), rng.gen_range(-r..=r));
                    (x * x + y * y <= r * r).then_some((x, y))
                })
            }
        }
    }
}

fn sample_unique<R, F>(rng: &mut R, count: usize, mut draw: F) -> Vec<Point>
where
    R: Rng,
    F: FnMut(&mut R) -> Option<(i64, i64)>,
{
    let mut seen = HashSet::with_capacity(count);
    let mut positions = Vec::with_capacity(count);
    while positions.len() < count {
        let Some(candidate) = draw(rng) else {
            continue;
        };
        if seen.insert(candidate) {
            positions.push(Point::new(candidate.0 as f64, candidate.1 as f64));
        }
    }
    positions
}
