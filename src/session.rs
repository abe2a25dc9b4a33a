//! A running game: one maze, the player, its pursuers, items and timers.

use log::{info, warn};
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};

use crate::agent::{ActorId, AgentController, AgentId, AgentProfile, CaptureEvent, Tracked};
use crate::config::MazeConfig;
use crate::error::Result;
use crate::grid::{Dir, Grid, Pos, WorldPoint};
use crate::maze::Maze;
use crate::pathfinding::{Blocking, Path, PathFinder};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ItemKind {
    /// Rebuilds the whole maze around the player.
    Regenerate,
    /// Temporary immunity from capture.
    Immunity,
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Inventory {
    pub regenerate: bool,
    pub immunity: bool,
}

impl Inventory {
    pub fn has(&self, kind: ItemKind) -> bool {
        match kind {
            ItemKind::Regenerate => self.regenerate,
            ItemKind::Immunity => self.immunity,
        }
    }

    fn set(&mut self, kind: ItemKind, held: bool) {
        match kind {
            ItemKind::Regenerate => self.regenerate = held,
            ItemKind::Immunity => self.immunity = held,
        }
    }
}

#[derive(Clone, Debug, PartialEq)]
pub struct Player {
    id: ActorId,
    cell: Pos,
    position: WorldPoint,
    inventory: Inventory,
    immunity_left: f32,
}

impl Player {
    fn new(id: ActorId, grid: &Grid, cell: Pos) -> Self {
        Self {
            id,
            cell,
            position: grid.to_world(cell),
            inventory: Inventory::default(),
            immunity_left: 0.0,
        }
    }

    pub fn cell(&self) -> Pos {
        self.cell
    }

    pub fn inventory(&self) -> Inventory {
        self.inventory
    }

    pub fn immunity_left(&self) -> f32 {
        self.immunity_left
    }

    fn relocate(&mut self, grid: &Grid, cell: Pos) {
        self.cell = cell;
        self.position = grid.to_world(cell);
    }
}

impl Tracked for Player {
    fn actor_id(&self) -> ActorId {
        self.id
    }

    fn world_position(&self) -> WorldPoint {
        self.position
    }

    fn is_immune(&self) -> bool {
        self.immunity_left > 0.0
    }
}

/// What the front-end asks for on a given tick.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct Input {
    pub dir: Option<Dir>,
    pub use_item: Option<ItemKind>,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Outcome {
    Won,
    Captured,
    TimeUp,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum GameEvent {
    ItemPicked(ItemKind),
    ItemUsed(ItemKind),
    ImmunityEnded,
    Regenerated,
    Capture(CaptureEvent),
    Finished(Outcome),
}

pub struct Session {
    config: MazeConfig,
    rng: StdRng,
    maze: Maze,
    player: Player,
    agents: Vec<AgentController>,
    items: Vec<(Pos, ItemKind)>,
    elapsed: f32,
    outcome: Option<Outcome>,
}

impl Session {
    pub fn new(config: MazeConfig) -> Result<Self> {
        let mut rng = match config.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        let maze = Maze::generate(&config, &mut rng)?;
        let player = Player::new(ActorId(0), maze.grid(), maze.entrance());
        let mut session = Self {
            config,
            rng,
            maze,
            player,
            agents: Vec::new(),
            items: Vec::new(),
            elapsed: 0.0,
            outcome: None,
        };
        session.populate();
        Ok(session)
    }

    pub fn config(&self) -> &MazeConfig {
        &self.config
    }

    pub fn maze(&self) -> &Maze {
        &self.maze
    }

    pub fn player(&self) -> &Player {
        &self.player
    }

    pub fn agents(&self) -> &[AgentController] {
        &self.agents
    }

    pub fn items(&self) -> &[(Pos, ItemKind)] {
        &self.items
    }

    pub fn item_at(&self, pos: Pos) -> Option<ItemKind> {
        self.items.iter().find(|(p, _)| *p == pos).map(|(_, k)| *k)
    }

    pub fn elapsed(&self) -> f32 {
        self.elapsed
    }

    pub fn time_left(&self) -> f32 {
        (self.config.time_limit_secs - self.elapsed).max(0.0)
    }

    pub fn outcome(&self) -> Option<Outcome> {
        self.outcome
    }

    /// Builds a complete replacement maze before swapping it in, so nothing
    /// ever observes a half-built grid. The player keeps its identity and
    /// inventory and moves to the new entrance; all agents are respawned.
    pub fn regenerate(&mut self) -> Result<()> {
        let maze = Maze::generate(&self.config, &mut self.rng)?;
        self.maze = maze;
        self.player.relocate(self.maze.grid(), self.maze.entrance());
        self.populate();
        info!(
            "maze regenerated: {} agents, {} items",
            self.agents.len(),
            self.items.len()
        );
        Ok(())
    }

    fn populate(&mut self) {
        self.items = place_items(&self.maze, &mut self.rng);
        self.agents = spawn_agents(
            &self.config,
            &self.maze,
            self.player.world_position(),
            &mut self.rng,
        );
    }

    /// Shortest route for the player from its cell to the exit.
    pub fn route_to_exit(&self) -> Path {
        PathFinder::new(self.config.algorithm).find_path(
            self.maze.grid(),
            self.player.cell,
            self.maze.exit(),
            |c| Blocking::Walls.blocks(c),
        )
    }

    pub fn tick(&mut self, dt: f32, input: Input) -> Vec<GameEvent> {
        let mut events = Vec::new();
        if self.outcome.is_some() {
            return events;
        }
        self.elapsed += dt;
        // Runs before item use so a fresh shield keeps its full duration.
        self.tick_immunity(dt, &mut events);

        if let Some(kind) = input.use_item {
            self.use_item(kind, &mut events);
        }
        if let Some(dir) = input.dir {
            self.move_player(dir);
        }
        self.collect_item(&mut events);

        if self.player.cell == self.maze.exit() {
            self.finish(Outcome::Won, &mut events);
            return events;
        }

        self.update_agents(dt, &mut events);

        if self.outcome.is_none() && self.elapsed >= self.config.time_limit_secs {
            self.finish(Outcome::TimeUp, &mut events);
        }
        events
    }

    fn use_item(&mut self, kind: ItemKind, events: &mut Vec<GameEvent>) {
        if !self.player.inventory.has(kind) {
            return;
        }
        self.player.inventory.set(kind, false);
        info!("item used: {:?}", kind);
        events.push(GameEvent::ItemUsed(kind));
        match kind {
            ItemKind::Regenerate => match self.regenerate() {
                Ok(()) => events.push(GameEvent::Regenerated),
                Err(err) => warn!("regeneration failed, keeping current maze: {}", err),
            },
            ItemKind::Immunity => {
                self.player.immunity_left = self.config.immunity_secs;
            }
        }
    }

    fn move_player(&mut self, dir: Dir) {
        let next = self.player.cell.step(dir);
        if !Blocking::Walls.blocks(self.maze.grid().classify(next)) {
            self.player.relocate(self.maze.grid(), next);
        }
    }

    fn collect_item(&mut self, events: &mut Vec<GameEvent>) {
        let cell = self.player.cell;
        if let Some(idx) = self.items.iter().position(|(p, _)| *p == cell) {
            let (_, kind) = self.items.swap_remove(idx);
            self.player.inventory.set(kind, true);
            info!("item picked up: {:?}", kind);
            events.push(GameEvent::ItemPicked(kind));
        }
    }

    fn tick_immunity(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        if self.player.immunity_left > 0.0 {
            self.player.immunity_left -= dt;
            if self.player.immunity_left <= 0.0 {
                self.player.immunity_left = 0.0;
                info!("immunity expired");
                events.push(GameEvent::ImmunityEnded);
            }
        }
    }

    fn update_agents(&mut self, dt: f32, events: &mut Vec<GameEvent>) {
        let grid = self.maze.grid();
        let player: &dyn Tracked = &self.player;
        let mut captured = false;
        for agent in self.agents.iter_mut() {
            if let Some(capture) = agent.tick(grid, dt, Some(player), &mut self.rng) {
                warn!("agent {:?} caught the player", capture.agent);
                events.push(GameEvent::Capture(capture));
                captured = true;
            }
        }
        if captured {
            self.finish(Outcome::Captured, events);
        }
    }

    fn finish(&mut self, outcome: Outcome, events: &mut Vec<GameEvent>) {
        info!("game over after {:.1}s: {:?}", self.elapsed, outcome);
        self.outcome = Some(outcome);
        events.push(GameEvent::Finished(outcome));
    }
}

/// Regenerate goes on one random safepoint, Immunity on another if there is
/// a second one.
fn place_items(maze: &Maze, rng: &mut impl Rng) -> Vec<(Pos, ItemKind)> {
    let mut spots = maze.safepoints().positions().to_vec();
    spots.shuffle(rng);
    spots
        .into_iter()
        .zip([ItemKind::Regenerate, ItemKind::Immunity])
        .collect()
}

/// Pursuers first, then wanderers, on random floor cells away from the
/// player. Falls back to the whole floor pool when nothing is far enough.
fn spawn_agents(
    config: &MazeConfig,
    maze: &Maze,
    player_at: WorldPoint,
    rng: &mut impl Rng,
) -> Vec<AgentController> {
    let grid = maze.grid();
    let pool = maze.floor_pool();
    let clear: Vec<Pos> = pool
        .iter()
        .copied()
        .filter(|p| grid.to_world(*p).distance(player_at) >= config.spawn_clearance)
        .collect();
    let candidates = if clear.is_empty() { &pool } else { &clear };
    if candidates.is_empty() {
        warn!("no floor cells to spawn agents on");
        return Vec::new();
    }

    let profiles = std::iter::repeat(AgentProfile::pursuer(config))
        .take(config.pursuers)
        .chain(std::iter::repeat(AgentProfile::wanderer(config)).take(config.wanderers));

    let mut agents = Vec::new();
    for (idx, profile) in profiles.enumerate() {
        if let Some(&cell) = candidates.choose(rng) {
            agents.push(AgentController::spawn(
                AgentId(idx as u32),
                profile,
                grid,
                grid.to_world(cell),
            ));
        }
    }
    agents
}
