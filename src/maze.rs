//! Depth-first backtracking carver and the finished [`Maze`] it produces.

use log::{debug, info};
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::MazeConfig;
use crate::error::Result;
use crate::grid::{Cell, Dir, Grid, Pos, WorldBounds};
use crate::safepoints::SafepointSet;

/// A carved grid plus everything collaborators need to build a level from it.
#[derive(Clone, Debug, PartialEq)]
pub struct Maze {
    grid: Grid,
    entrance: Pos,
    exit: Pos,
    safepoints: SafepointSet,
}

impl Maze {
    /// Validates `config`, carves, then places safepoints away from the
    /// entrance and exit.
    pub fn generate(config: &MazeConfig, rng: &mut impl Rng) -> Result<Maze> {
        config.validate()?;
        let mut maze = Maze::carve(config.cells_x, config.cells_y, config.tile_scale, rng);
        let excluded = [maze.entrance, maze.exit];
        maze.safepoints = config
            .safepoint_placer()
            .place(&mut maze.grid, &excluded, rng);
        info!(
            "generated {}x{} maze: {} floor cells, {} safepoints",
            maze.grid.width(),
            maze.grid.height(),
            maze.grid.count(Cell::Floor),
            maze.safepoints.len()
        );
        Ok(maze)
    }

    /// Carves a perfect maze without safepoints. Entrance sits on the bottom
    /// edge next to the start corner, exit on the top edge at the far corner.
    /// `scale` gets the same fallback as [`Grid::new`].
    pub fn carve(cells_x: usize, cells_y: usize, scale: f32, rng: &mut impl Rng) -> Maze {
        let mut grid = Grid::new(cells_x, cells_y, scale);
        carve_passages(&mut grid, rng);

        let entrance = Pos::new(1, 0);
        let exit = Pos::new(grid.width() as i32 - 2, grid.height() as i32 - 1);
        grid.set(entrance, Cell::Floor);
        grid.set(exit, Cell::Floor);
        debug!("entrance at {}, exit at {}", entrance, exit);

        Maze {
            grid,
            entrance,
            exit,
            safepoints: SafepointSet::default(),
        }
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn entrance(&self) -> Pos {
        self.entrance
    }

    pub fn exit(&self) -> Pos {
        self.exit
    }

    pub fn safepoints(&self) -> &SafepointSet {
        &self.safepoints
    }

    /// Floor cells available for spawning: excludes entrance, exit and
    /// safepoints.
    pub fn floor_pool(&self) -> Vec<Pos> {
        self.grid
            .positions_of(Cell::Floor)
            .into_iter()
            .filter(|p| *p != self.entrance && *p != self.exit)
            .collect()
    }

    pub fn world_bounds(&self) -> WorldBounds {
        self.grid.world_bounds()
    }
}

/// Resets `grid` to walls and carves a spanning tree over the odd-coordinate
/// corridor cells, starting at `(1, 1)`.
pub fn carve_passages(grid: &mut Grid, rng: &mut impl Rng) {
    grid.fill(Cell::Wall);
    let start = Pos::new(1, 1);
    if !grid.set(start, Cell::Floor) {
        return;
    }

    let mut stack = vec![start];
    while let Some(&current) = stack.last() {
        let unvisited = unvisited_neighbors(grid, current);
        match unvisited.choose(rng) {
            Some(&chosen) => {
                carve_between(grid, current, chosen);
                grid.set(chosen, Cell::Floor);
                stack.push(chosen);
            }
            None => {
                stack.pop();
            }
        }
    }
}

/// Corridor cells two steps away that are still solid and strictly inside
/// the border.
fn unvisited_neighbors(grid: &Grid, pos: Pos) -> Vec<Pos> {
    let mut result = Vec::with_capacity(4);
    for dir in Dir::ALL {
        let next = pos.step(dir).step(dir);
        let interior = next.x > 0
            && next.y > 0
            && (next.x as usize) < grid.width() - 1
            && (next.y as usize) < grid.height() - 1;
        if interior && grid.classify(next) == Cell::Wall {
            result.push(next);
        }
    }
    result
}

fn carve_between(grid: &mut Grid, a: Pos, b: Pos) {
    let wall = Pos::new((a.x + b.x) / 2, (a.y + b.y) / 2);
    grid.set(wall, Cell::Floor);
}
