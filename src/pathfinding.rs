//! Breadth-first and A* search over a [`Grid`].
//!
//! Both searches are total: any start/goal pair, in bounds or not, produces a
//! [`Path`]. An empty path means "no route", which callers treat as "hold".

use std::cmp::Reverse;
use std::collections::{BinaryHeap, VecDeque};
use std::str::FromStr;

use crate::error::ConfigError;
use crate::grid::{Cell, Grid, Pos};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Algorithm {
    BreadthFirst,
    #[default]
    AStar,
}

impl FromStr for Algorithm {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "bfs" | "breadth-first" | "breadth_first" => Ok(Algorithm::BreadthFirst),
            "astar" | "a*" | "a-star" => Ok(Algorithm::AStar),
            _ => Err(ConfigError::InvalidValue {
                key: "algorithm".into(),
                value: s.into(),
            }),
        }
    }
}

/// Which cells a mover may not enter. Out-of-bounds cells classify as `Wall`
/// and are therefore blocked under every rule.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum Blocking {
    /// Player rule: only walls stop movement.
    #[default]
    Walls,
    /// Pursuer rule: safepoints are off limits as well.
    WallsAndSafepoints,
}

impl Blocking {
    pub fn blocks(self, cell: Cell) -> bool {
        match self {
            Blocking::Walls => cell == Cell::Wall,
            Blocking::WallsAndSafepoints => cell != Cell::Floor,
        }
    }
}

/// Ordered cells from the query start to the goal, both included.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Path(Vec<Pos>);

impl Path {
    pub fn cells(&self) -> &[Pos] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of moves, zero for both "no path" and "already there".
    pub fn steps(&self) -> usize {
        self.0.len().saturating_sub(1)
    }

    pub fn first(&self) -> Option<Pos> {
        self.0.first().copied()
    }

    pub fn last(&self) -> Option<Pos> {
        self.0.last().copied()
    }

    /// The cell after the start, if the path moves at all.
    pub fn next_step(&self) -> Option<Pos> {
        self.0.get(1).copied()
    }

    pub fn into_cells(self) -> Vec<Pos> {
        self.0
    }
}

impl From<Vec<Pos>> for Path {
    fn from(cells: Vec<Pos>) -> Self {
        Path(cells)
    }
}

/// Stateless search front-end; holds only the algorithm choice.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct PathFinder {
    pub algorithm: Algorithm,
}

impl PathFinder {
    pub fn new(algorithm: Algorithm) -> Self {
        Self { algorithm }
    }

    pub fn find_path(
        &self,
        grid: &Grid,
        start: Pos,
        goal: Pos,
        blocks: impl Fn(Cell) -> bool,
    ) -> Path {
        match self.algorithm {
            Algorithm::BreadthFirst => bfs_path(grid, start, goal, blocks),
            Algorithm::AStar => astar_path(grid, start, goal, blocks),
        }
    }
}

/// Resolves both endpoints to flat indices, or `None` when either is out of
/// bounds or blocked.
fn endpoints(
    grid: &Grid,
    start: Pos,
    goal: Pos,
    blocks: &impl Fn(Cell) -> bool,
) -> Option<(usize, usize)> {
    if blocks(grid.classify(start)) || blocks(grid.classify(goal)) {
        return None;
    }
    Some((grid.index(start)?, grid.index(goal)?))
}

pub fn bfs_path(grid: &Grid, start: Pos, goal: Pos, blocks: impl Fn(Cell) -> bool) -> Path {
    let Some((start_idx, goal_idx)) = endpoints(grid, start, goal, &blocks) else {
        return Path::default();
    };

    let mut came_from: Vec<Option<usize>> = vec![None; grid.len()];
    let mut seen = vec![false; grid.len()];
    let mut q = VecDeque::new();
    seen[start_idx] = true;
    q.push_back(start_idx);

    while let Some(idx) = q.pop_front() {
        if idx == goal_idx {
            return reconstruct(grid, &came_from, goal_idx);
        }
        for (_, next) in Grid::neighbors(grid.pos_at(idx)) {
            let Some(next_idx) = grid.index(next) else {
                continue;
            };
            if seen[next_idx] || blocks(grid.classify(next)) {
                continue;
            }
            seen[next_idx] = true;
            came_from[next_idx] = Some(idx);
            q.push_back(next_idx);
        }
    }
    Path::default()
}

/// A* with the Manhattan heuristic. Frontier ties on `g + h` resolve to the
/// entry pushed first, so results are reproducible.
pub fn astar_path(grid: &Grid, start: Pos, goal: Pos, blocks: impl Fn(Cell) -> bool) -> Path {
    let Some((start_idx, goal_idx)) = endpoints(grid, start, goal, &blocks) else {
        return Path::default();
    };

    let mut came_from: Vec<Option<usize>> = vec![None; grid.len()];
    let mut g_score = vec![u32::MAX; grid.len()];
    let mut closed = vec![false; grid.len()];
    let mut open = BinaryHeap::new();
    let mut seq: u64 = 0;

    g_score[start_idx] = 0;
    open.push(Reverse((start.manhattan(goal), seq, start_idx)));

    while let Some(Reverse((_, _, idx))) = open.pop() {
        if closed[idx] {
            continue;
        }
        if idx == goal_idx {
            return reconstruct(grid, &came_from, goal_idx);
        }
        closed[idx] = true;

        let tentative = g_score[idx] + 1;
        for (_, next) in Grid::neighbors(grid.pos_at(idx)) {
            let Some(next_idx) = grid.index(next) else {
                continue;
            };
            if closed[next_idx] || blocks(grid.classify(next)) {
                continue;
            }
            if tentative < g_score[next_idx] {
                g_score[next_idx] = tentative;
                came_from[next_idx] = Some(idx);
                seq += 1;
                open.push(Reverse((tentative + next.manhattan(goal), seq, next_idx)));
            }
        }
    }
    Path::default()
}

fn reconstruct(grid: &Grid, came_from: &[Option<usize>], goal_idx: usize) -> Path {
    let mut cells = vec![grid.pos_at(goal_idx)];
    let mut current = goal_idx;
    while let Some(prev) = came_from[current] {
        cells.push(grid.pos_at(prev));
        current = prev;
    }
    cells.reverse();
    Path(cells)
}

/// Step counts from `start` to every cell, `None` where unreachable.
pub fn distance_field(grid: &Grid, start: Pos, blocks: impl Fn(Cell) -> bool) -> Vec<Option<u32>> {
    let mut dist = vec![None; grid.len()];
    let Some(start_idx) = grid.index(start) else {
        return dist;
    };
    if blocks(grid.classify(start)) {
        return dist;
    }
    let mut q = VecDeque::new();
    dist[start_idx] = Some(0);
    q.push_back(start_idx);

    while let Some(idx) = q.pop_front() {
        let base = dist[idx].unwrap_or(0);
        for (_, next) in Grid::neighbors(grid.pos_at(idx)) {
            let Some(next_idx) = grid.index(next) else {
                continue;
            };
            if dist[next_idx].is_none() && !blocks(grid.classify(next)) {
                dist[next_idx] = Some(base + 1);
                q.push_back(next_idx);
            }
        }
    }
    dist
}
