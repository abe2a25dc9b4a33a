//! Picks a spaced-out subset of dead-ends (or wall corners) and marks them as
//! safepoints.

use std::str::FromStr;

use log::{debug, info};
use rand::Rng;

use crate::error::ConfigError;
use crate::grid::{Cell, Dir, Grid, Pos};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SafepointPolicy {
    /// Floor cells with at least three wall neighbors.
    #[default]
    DeadEnd,
    /// Interior wall cells whose only two floor neighbors form an L.
    Corner,
}

impl SafepointPolicy {
    pub fn qualifies(self, grid: &Grid, pos: Pos) -> bool {
        match self {
            SafepointPolicy::DeadEnd => {
                grid.classify(pos) == Cell::Floor && grid.count_neighbors(pos, Cell::Wall) >= 3
            }
            SafepointPolicy::Corner => is_corner(grid, pos),
        }
    }
}

fn is_corner(grid: &Grid, pos: Pos) -> bool {
    let interior = pos.x > 0
        && pos.y > 0
        && (pos.x as usize) < grid.width() - 1
        && (pos.y as usize) < grid.height() - 1;
    if !interior || grid.classify(pos) != Cell::Wall {
        return false;
    }
    let open = |dir: Dir| grid.classify(pos.step(dir)) == Cell::Floor;
    let (up, down, left, right) = (open(Dir::Up), open(Dir::Down), open(Dir::Left), open(Dir::Right));
    let count = [up, down, left, right].iter().filter(|o| **o).count();
    count == 2 && (up || down) && (left || right)
}

impl FromStr for SafepointPolicy {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "dead-end" | "deadend" | "dead_end" => Ok(SafepointPolicy::DeadEnd),
            "corner" | "corners" => Ok(SafepointPolicy::Corner),
            _ => Err(ConfigError::InvalidValue {
                key: "safepoint policy".into(),
                value: s.into(),
            }),
        }
    }
}

/// How many safepoints to aim for.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SafepointTarget {
    Fixed(usize),
    /// Share of qualifying candidates, never less than one when any exist.
    Fraction(f32),
}

impl Default for SafepointTarget {
    fn default() -> Self {
        SafepointTarget::Fixed(2)
    }
}

impl SafepointTarget {
    pub fn count_for(self, candidates: usize) -> usize {
        if candidates == 0 {
            return 0;
        }
        match self {
            SafepointTarget::Fixed(n) => n.min(candidates),
            SafepointTarget::Fraction(f) => ((candidates as f32 * f).floor() as usize)
                .max(1)
                .min(candidates),
        }
    }
}

/// Accepts `"2"` for a fixed count or `"10%"` for a fraction.
impl FromStr for SafepointTarget {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let raw = s.trim();
        let invalid = || ConfigError::InvalidValue {
            key: "safepoint target".into(),
            value: s.into(),
        };
        match raw.strip_suffix('%') {
            Some(pct) => pct
                .trim()
                .parse::<f32>()
                .map(|p| SafepointTarget::Fraction(p / 100.0))
                .map_err(|_| invalid()),
            None => raw
                .parse::<usize>()
                .map(SafepointTarget::Fixed)
                .map_err(|_| invalid()),
        }
    }
}

/// Accepted safepoints in acceptance order.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct SafepointSet(Vec<Pos>);

impl SafepointSet {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn contains(&self, pos: Pos) -> bool {
        self.0.contains(&pos)
    }

    pub fn iter(&self) -> impl Iterator<Item = Pos> + '_ {
        self.0.iter().copied()
    }

    pub fn positions(&self) -> &[Pos] {
        &self.0
    }

    fn is_far_enough(&self, pos: Pos, min_spacing: f32) -> bool {
        self.0.iter().all(|p| p.distance(pos) >= min_spacing)
    }
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct SafepointPlacer {
    pub policy: SafepointPolicy,
    pub target: SafepointTarget,
    pub min_spacing: f32,
}

impl Default for SafepointPlacer {
    fn default() -> Self {
        Self {
            policy: SafepointPolicy::default(),
            target: SafepointTarget::default(),
            min_spacing: 3.0,
        }
    }
}

impl SafepointPlacer {
    /// Qualifying cells in scan order, minus `excluded`.
    pub fn candidates(&self, grid: &Grid, excluded: &[Pos]) -> Vec<Pos> {
        grid.positions()
            .filter(|p| !excluded.contains(p))
            .filter(|p| self.policy.qualifies(grid, *p))
            .collect()
    }

    /// Draws candidates at random, keeping those far enough from everything
    /// already kept. Each draw leaves the pool whether or not it was kept.
    pub fn place(&self, grid: &mut Grid, excluded: &[Pos], rng: &mut impl Rng) -> SafepointSet {
        let mut pool = self.candidates(grid, excluded);
        let candidates = pool.len();
        let wanted = self.target.count_for(candidates);
        let mut set = SafepointSet::default();

        while set.len() < wanted && !pool.is_empty() {
            let pos = pool.swap_remove(rng.gen_range(0..pool.len()));
            if set.is_far_enough(pos, self.min_spacing) {
                set.0.push(pos);
            } else {
                debug!("safepoint candidate {} rejected: too close", pos);
            }
        }

        for pos in set.iter() {
            grid.set(pos, Cell::Safepoint);
        }
        info!(
            "placed {}/{} safepoints ({:?}, {} candidates)",
            set.len(),
            wanted,
            self.policy,
            candidates
        );
        set
    }
}
