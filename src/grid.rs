//! Cell storage, coordinate transforms and bounds-checked queries.
//!
//! Rows grow upward: `y == 0` is the bottom edge, matching world space where
//! a larger `y` is further up the screen.

use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Cell {
    Floor,
    Wall,
    /// Walkable for the player, blocked for pursuing agents.
    Safepoint,
}

impl Cell {
    fn glyph(self) -> char {
        match self {
            Cell::Floor => '.',
            Cell::Wall => '#',
            Cell::Safepoint => 'S',
        }
    }

    fn from_glyph(c: char) -> Cell {
        match c {
            '.' | ' ' => Cell::Floor,
            'S' | 's' => Cell::Safepoint,
            _ => Cell::Wall,
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct Pos {
    pub x: i32,
    pub y: i32,
}

impl Pos {
    pub const fn new(x: i32, y: i32) -> Self {
        Self { x, y }
    }

    pub fn step(self, dir: Dir) -> Pos {
        let (dx, dy) = dir.delta();
        Pos {
            x: self.x + dx,
            y: self.y + dy,
        }
    }

    pub fn manhattan(self, other: Pos) -> u32 {
        self.x.abs_diff(other.x) + self.y.abs_diff(other.y)
    }

    /// Euclidean distance in cell units.
    pub fn distance(self, other: Pos) -> f32 {
        let dx = (self.x - other.x) as f32;
        let dy = (self.y - other.y) as f32;
        (dx * dx + dy * dy).sqrt()
    }

    pub fn is_adjacent(self, other: Pos) -> bool {
        self.manhattan(other) == 1
    }
}

impl fmt::Display for Pos {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, {})", self.x, self.y)
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Dir {
    Up,
    Down,
    Left,
    Right,
}

impl Dir {
    /// Fixed scan order; every search and neighbor walk iterates this way.
    pub const ALL: [Dir; 4] = [Dir::Up, Dir::Down, Dir::Left, Dir::Right];

    pub fn delta(self) -> (i32, i32) {
        match self {
            Dir::Up => (0, 1),
            Dir::Down => (0, -1),
            Dir::Left => (-1, 0),
            Dir::Right => (1, 0),
        }
    }

    /// Direction of a single orthogonal step from `from` to `to`.
    pub fn towards(from: Pos, to: Pos) -> Option<Dir> {
        Dir::ALL.into_iter().find(|dir| from.step(*dir) == to)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldPoint {
    pub x: f32,
    pub y: f32,
}

impl WorldPoint {
    pub const fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn distance(self, other: WorldPoint) -> f32 {
        let dx = self.x - other.x;
        let dy = self.y - other.y;
        (dx * dx + dy * dy).sqrt()
    }

    /// Moves at most `max_step` toward `target` without overshooting it.
    pub fn move_towards(self, target: WorldPoint, max_step: f32) -> WorldPoint {
        let dist = self.distance(target);
        if dist <= max_step || dist == 0.0 {
            return target;
        }
        let t = max_step / dist;
        WorldPoint {
            x: self.x + (target.x - self.x) * t,
            y: self.y + (target.y - self.y) * t,
        }
    }
}

/// Axis-aligned world rectangle a free-moving actor is clamped into.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct WorldBounds {
    pub min: WorldPoint,
    pub max: WorldPoint,
}

#[derive(Clone, Debug, PartialEq)]
pub struct Grid {
    cells_x: usize,
    cells_y: usize,
    width: usize,
    height: usize,
    cells: Vec<Cell>,
    scale: f32,
    origin: WorldPoint,
}

impl Grid {
    /// An all-wall grid of `2*cells_x+1` by `2*cells_y+1`. A zero cell count
    /// degenerates to a single corridor cell along that axis, and a scale that
    /// is not a positive finite number falls back to `1.0`.
    pub fn new(cells_x: usize, cells_y: usize, scale: f32) -> Self {
        let scale = usable_scale(scale);
        let cells_x = cells_x.max(1);
        let cells_y = cells_y.max(1);
        let width = cells_x * 2 + 1;
        let height = cells_y * 2 + 1;
        Self {
            cells_x,
            cells_y,
            width,
            height,
            cells: vec![Cell::Wall; width * height],
            scale,
            origin: origin_for(cells_x, cells_y, scale),
        }
    }

    /// Parses the `Display` format: one string per row, top row first.
    /// `#` is wall, `.` floor, `S` safepoint. Short rows are padded with wall.
    pub fn from_rows(rows: &[&str], scale: f32) -> Self {
        let scale = usable_scale(scale);
        let height = rows.len().max(1);
        let width = rows
            .iter()
            .map(|r| r.chars().count())
            .max()
            .unwrap_or(1)
            .max(1);
        let cells_x = (width - 1) / 2;
        let cells_y = (height - 1) / 2;
        let mut cells = vec![Cell::Wall; width * height];
        for (row_idx, row) in rows.iter().enumerate() {
            let y = height - 1 - row_idx;
            for (x, c) in row.chars().enumerate() {
                cells[y * width + x] = Cell::from_glyph(c);
            }
        }
        Self {
            cells_x,
            cells_y,
            width,
            height,
            cells,
            scale,
            origin: origin_for(cells_x, cells_y, scale),
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    pub fn cells_x(&self) -> usize {
        self.cells_x
    }

    pub fn cells_y(&self) -> usize {
        self.cells_y
    }

    pub fn scale(&self) -> f32 {
        self.scale
    }

    pub fn len(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    pub fn in_bounds(&self, pos: Pos) -> bool {
        pos.x >= 0 && pos.y >= 0 && (pos.x as usize) < self.width && (pos.y as usize) < self.height
    }

    /// Flat index of an in-bounds position.
    pub fn index(&self, pos: Pos) -> Option<usize> {
        if self.in_bounds(pos) {
            Some(pos.y as usize * self.width + pos.x as usize)
        } else {
            None
        }
    }

    pub fn pos_at(&self, idx: usize) -> Pos {
        Pos::new((idx % self.width) as i32, (idx / self.width) as i32)
    }

    /// Out-of-bounds positions are always `Wall`.
    pub fn classify(&self, pos: Pos) -> Cell {
        self.index(pos).map_or(Cell::Wall, |idx| self.cells[idx])
    }

    /// Returns false (and leaves the grid untouched) for out-of-bounds writes.
    pub fn set(&mut self, pos: Pos, cell: Cell) -> bool {
        match self.index(pos) {
            Some(idx) => {
                self.cells[idx] = cell;
                true
            }
            None => false,
        }
    }

    pub fn fill(&mut self, cell: Cell) {
        self.cells.iter_mut().for_each(|c| *c = cell);
    }

    pub fn to_world(&self, pos: Pos) -> WorldPoint {
        WorldPoint {
            x: pos.x as f32 * self.scale + self.origin.x,
            y: pos.y as f32 * self.scale + self.origin.y,
        }
    }

    pub fn to_cell(&self, point: WorldPoint) -> Pos {
        Pos {
            x: ((point.x - self.origin.x) / self.scale).round() as i32,
            y: ((point.y - self.origin.y) / self.scale).round() as i32,
        }
    }

    /// Every position, bottom row first, left to right.
    pub fn positions(&self) -> impl Iterator<Item = Pos> + '_ {
        (0..self.cells.len()).map(move |idx| self.pos_at(idx))
    }

    pub fn positions_of(&self, kind: Cell) -> Vec<Pos> {
        self.positions()
            .filter(|p| self.classify(*p) == kind)
            .collect()
    }

    pub fn count(&self, kind: Cell) -> usize {
        self.cells.iter().filter(|c| **c == kind).count()
    }

    /// The four orthogonal neighbors in `Dir::ALL` order, including
    /// out-of-bounds ones (which classify as `Wall`).
    pub fn neighbors(pos: Pos) -> impl Iterator<Item = (Dir, Pos)> {
        Dir::ALL.into_iter().map(move |dir| (dir, pos.step(dir)))
    }

    pub fn count_neighbors(&self, pos: Pos, kind: Cell) -> usize {
        Self::neighbors(pos)
            .filter(|(_, n)| self.classify(*n) == kind)
            .count()
    }

    /// Inset by half a tile from the outermost cell centres.
    pub fn world_bounds(&self) -> WorldBounds {
        let half = self.scale * 0.5;
        let far = self.to_world(Pos::new(self.width as i32 - 1, self.height as i32 - 1));
        WorldBounds {
            min: WorldPoint::new(self.origin.x + half, self.origin.y + half),
            max: WorldPoint::new(far.x - half, far.y - half),
        }
    }

    pub fn clamp_world(&self, point: WorldPoint) -> WorldPoint {
        let bounds = self.world_bounds();
        WorldPoint {
            x: point.x.clamp(bounds.min.x, bounds.max.x),
            y: point.y.clamp(bounds.min.y, bounds.max.y),
        }
    }

    /// Closest in-bounds cell (Euclidean) that `blocks` does not reject; ties
    /// resolve to the first in scan order.
    pub fn nearest_open(&self, pos: Pos, blocks: impl Fn(Cell) -> bool) -> Option<Pos> {
        self.positions()
            .filter(|p| !blocks(self.classify(*p)))
            .min_by_key(|p| {
                let dx = i64::from(p.x - pos.x);
                let dy = i64::from(p.y - pos.y);
                dx * dx + dy * dy
            })
    }
}

fn usable_scale(scale: f32) -> f32 {
    if scale.is_finite() && scale > 0.0 {
        scale
    } else {
        1.0
    }
}

fn origin_for(cells_x: usize, cells_y: usize, scale: f32) -> WorldPoint {
    WorldPoint {
        x: -(cells_x as f32) * scale,
        y: -(cells_y as f32) * scale,
    }
}

impl fmt::Display for Grid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for y in (0..self.height).rev() {
            for x in 0..self.width {
                let cell = self.cells[y * self.width + x];
                write!(f, "{}", cell.glyph())?;
            }
            writeln!(f)?;
        }
        Ok(())
    }
}
