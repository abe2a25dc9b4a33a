//! One state machine for every pursuing or wandering agent.
//!
//! An agent always has a target cell (its own cell when holding). Each tick
//! it moves toward the target's world position at a fixed speed; once within
//! the arrival threshold it snaps onto the cell and picks the next step.

use log::debug;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::config::MazeConfig;
use crate::grid::{Grid, Pos, WorldPoint};
use crate::pathfinding::{Blocking, PathFinder};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct AgentId(pub u32);

/// Identity of an actor the core does not own, such as the player.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ActorId(pub u32);

/// What an agent follows. Implemented by whoever owns the tracked actor.
pub trait Tracked {
    fn actor_id(&self) -> ActorId;

    fn world_position(&self) -> WorldPoint;

    /// Immune targets cannot be captured.
    fn is_immune(&self) -> bool {
        false
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct CaptureEvent {
    pub agent: AgentId,
    pub target: ActorId,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Behavior {
    /// Step along a fresh shortest path to the tracked actor on every arrival.
    Pursuit,
    /// Step to a random open neighbor on every arrival.
    Wander,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentProfile {
    pub behavior: Behavior,
    pub blocking: Blocking,
    pub finder: PathFinder,
    /// World units per second.
    pub speed: f32,
    pub arrive_threshold: f32,
}

impl AgentProfile {
    pub fn pursuer(config: &MazeConfig) -> Self {
        Self {
            behavior: Behavior::Pursuit,
            blocking: Blocking::WallsAndSafepoints,
            finder: PathFinder::new(config.algorithm),
            speed: config.agent_speed,
            arrive_threshold: config.arrive_threshold,
        }
    }

    pub fn wanderer(config: &MazeConfig) -> Self {
        Self {
            behavior: Behavior::Wander,
            ..Self::pursuer(config)
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Arrived,
    Moving,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct AgentState {
    pub current: Pos,
    pub target: Pos,
    pub target_world: WorldPoint,
}

#[derive(Clone, Debug, PartialEq)]
pub struct AgentController {
    id: AgentId,
    profile: AgentProfile,
    state: AgentState,
    position: WorldPoint,
}

impl AgentController {
    /// Snaps `at` onto the nearest cell the profile may stand on. On a grid
    /// with no such cell the agent stays on the rounded cell and holds.
    pub fn spawn(id: AgentId, profile: AgentProfile, grid: &Grid, at: WorldPoint) -> Self {
        let rough = grid.to_cell(at);
        let cell = grid
            .nearest_open(rough, |c| profile.blocking.blocks(c))
            .unwrap_or(rough);
        let world = grid.to_world(cell);
        debug!("agent {:?} ({:?}) spawned at {}", id, profile.behavior, cell);
        Self {
            id,
            profile,
            state: AgentState {
                current: cell,
                target: cell,
                target_world: world,
            },
            position: world,
        }
    }

    pub fn id(&self) -> AgentId {
        self.id
    }

    pub fn profile(&self) -> &AgentProfile {
        &self.profile
    }

    pub fn state(&self) -> &AgentState {
        &self.state
    }

    pub fn current(&self) -> Pos {
        self.state.current
    }

    pub fn target(&self) -> Pos {
        self.state.target
    }

    pub fn position(&self) -> WorldPoint {
        self.position
    }

    pub fn phase(&self) -> Phase {
        if self.position.distance(self.state.target_world) < self.profile.arrive_threshold {
            Phase::Arrived
        } else {
            Phase::Moving
        }
    }

    /// Picks and stores the next target cell.
    ///
    /// Pursuit follows the second cell of a path to `goal` and holds when the
    /// path is shorter than two cells. Without a goal, or in wander mode, it
    /// picks a random open neighbor, holding when there is none.
    pub fn choose_next_step(&mut self, grid: &Grid, goal: Option<Pos>, rng: &mut impl Rng) -> Pos {
        let current = self.state.current;
        let blocking = self.profile.blocking;
        let next = match (self.profile.behavior, goal) {
            (Behavior::Pursuit, Some(goal)) => self
                .profile
                .finder
                .find_path(grid, current, goal, |c| blocking.blocks(c))
                .next_step(),
            _ => wander_step(grid, current, blocking, rng),
        }
        .unwrap_or(current);

        self.state.target = next;
        self.state.target_world = grid.to_world(next);
        next
    }

    /// Advances one simulation step of `dt` seconds and reports a capture if
    /// the agent now shares a cell with a non-immune `tracked`.
    pub fn tick(
        &mut self,
        grid: &Grid,
        dt: f32,
        tracked: Option<&dyn Tracked>,
        rng: &mut impl Rng,
    ) -> Option<CaptureEvent> {
        if self.phase() == Phase::Arrived {
            self.position = self.state.target_world;
            self.state.current = self.state.target;
            let goal = tracked.map(|t| grid.to_cell(t.world_position()));
            self.choose_next_step(grid, goal, rng);
        }
        self.position = self
            .position
            .move_towards(self.state.target_world, self.profile.speed * dt);

        tracked.and_then(|t| self.check_capture(grid, t))
    }

    pub fn check_capture(&self, grid: &Grid, tracked: &dyn Tracked) -> Option<CaptureEvent> {
        let same_cell = grid.to_cell(self.position) == grid.to_cell(tracked.world_position());
        if !same_cell || tracked.is_immune() {
            return None;
        }
        Some(CaptureEvent {
            agent: self.id,
            target: tracked.actor_id(),
        })
    }
}

fn wander_step(grid: &Grid, current: Pos, blocking: Blocking, rng: &mut impl Rng) -> Option<Pos> {
    let options: Vec<Pos> = Grid::neighbors(current)
        .map(|(_, n)| n)
        .filter(|n| !blocking.blocks(grid.classify(*n)))
        .collect();
    options.choose(rng).copied()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grid::Cell;
    use crate::pathfinding::{Algorithm, Path};
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    struct Dummy {
        at: WorldPoint,
        immune: bool,
    }

    impl Tracked for Dummy {
        fn actor_id(&self) -> ActorId {
            ActorId(7)
        }

        fn world_position(&self) -> WorldPoint {
            self.at
        }

        fn is_immune(&self) -> bool {
            self.immune
        }
    }

    fn profile(behavior: Behavior) -> AgentProfile {
        AgentProfile {
            behavior,
            blocking: Blocking::WallsAndSafepoints,
            finder: PathFinder::new(Algorithm::AStar),
            speed: 2.0,
            arrive_threshold: 0.2,
        }
    }

    fn corridor() -> Grid {
        Grid::from_rows(&["#######", "#.....#", "#######"], 1.0)
    }

    #[test]
    fn spawn_snaps_to_open_cell() {
        let grid = corridor();
        let agent = AgentController::spawn(
            AgentId(1),
            profile(Behavior::Pursuit),
            &grid,
            grid.to_world(Pos::new(3, 2)),
        );
        assert_eq!(agent.current(), Pos::new(3, 1));
        assert_eq!(agent.phase(), Phase::Arrived);
    }

    #[test]
    fn pursuit_takes_second_path_cell() {
        let grid = corridor();
        let mut rng = StdRng::seed_from_u64(0);
        let mut agent =
            AgentController::spawn(AgentId(1), profile(Behavior::Pursuit), &grid, grid.to_world(Pos::new(1, 1)));
        assert_eq!(agent.choose_next_step(&grid, Some(Pos::new(5, 1)), &mut rng), Pos::new(2, 1));
        assert_eq!(agent.choose_next_step(&grid, Some(Pos::new(1, 1)), &mut rng), Pos::new(1, 1));
    }

    #[test]
    fn pursuit_holds_when_goal_is_a_safepoint() {
        let grid = Grid::from_rows(&["#######", "#...S.#", "#######"], 1.0);
        let mut rng = StdRng::seed_from_u64(0);
        let mut agent =
            AgentController::spawn(AgentId(1), profile(Behavior::Pursuit), &grid, grid.to_world(Pos::new(1, 1)));
        assert_eq!(agent.choose_next_step(&grid, Some(Pos::new(4, 1)), &mut rng), Pos::new(1, 1));
        assert_eq!(agent.choose_next_step(&grid, Some(Pos::new(5, 1)), &mut rng), Pos::new(1, 1));
    }

    #[test]
    fn wander_never_enters_blocked_cells() {
        let grid = Grid::from_rows(&["#####", "#S..#", "#.#.#", "#####"], 1.0);
        let mut rng = StdRng::seed_from_u64(11);
        let mut agent =
            AgentController::spawn(AgentId(2), profile(Behavior::Wander), &grid, grid.to_world(Pos::new(2, 2)));
        for _ in 0..20 {
            let next = agent.choose_next_step(&grid, None, &mut rng);
            assert_eq!(grid.classify(next), Cell::Floor);
            assert!(next == Pos::new(2, 2) || next.is_adjacent(Pos::new(2, 2)));
        }
    }

    #[test]
    fn boxed_in_wanderer_holds() {
        let grid = Grid::from_rows(&["###", "#.#", "###"], 1.0);
        let mut rng = StdRng::seed_from_u64(1);
        let mut agent =
            AgentController::spawn(AgentId(3), profile(Behavior::Wander), &grid, grid.to_world(Pos::new(1, 1)));
        assert_eq!(agent.choose_next_step(&grid, None, &mut rng), Pos::new(1, 1));
    }

    #[test]
    fn ticks_walk_to_target_and_capture() {
        let grid = corridor();
        let mut rng = StdRng::seed_from_u64(0);
        let mut agent =
            AgentController::spawn(AgentId(1), profile(Behavior::Pursuit), &grid, grid.to_world(Pos::new(1, 1)));
        let target = Dummy {
            at: grid.to_world(Pos::new(4, 1)),
            immune: false,
        };

        let mut capture = None;
        for _ in 0..40 {
            capture = agent.tick(&grid, 0.1, Some(&target), &mut rng);
            if capture.is_some() {
                break;
            }
        }
        assert_eq!(
            capture,
            Some(CaptureEvent {
                agent: AgentId(1),
                target: ActorId(7)
            })
        );
    }

    #[test]
    fn immune_target_is_not_captured() {
        let grid = corridor();
        let agent =
            AgentController::spawn(AgentId(1), profile(Behavior::Pursuit), &grid, grid.to_world(Pos::new(2, 1)));
        let target = Dummy {
            at: grid.to_world(Pos::new(2, 1)),
            immune: true,
        };
        assert_eq!(agent.check_capture(&grid, &target), None);
    }

    #[test]
    fn repaths_on_every_arrival() {
        let grid = corridor();
        let mut rng = StdRng::seed_from_u64(0);
        let mut agent =
            AgentController::spawn(AgentId(1), profile(Behavior::Pursuit), &grid, grid.to_world(Pos::new(1, 1)));
        let mut target = Dummy {
            at: grid.to_world(Pos::new(5, 1)),
            immune: false,
        };
        agent.tick(&grid, 0.5, Some(&target), &mut rng);
        assert_eq!(agent.target(), Pos::new(2, 1));

        // Target jumps behind the agent; the next arrival turns it around.
        target.at = grid.to_world(Pos::new(1, 1));
        agent.tick(&grid, 0.5, Some(&target), &mut rng);
        assert_eq!(agent.current(), Pos::new(2, 1));
        assert_eq!(agent.target(), Pos::new(1, 1));
        let path: Path = agent
            .profile()
            .finder
            .find_path(&grid, agent.current(), Pos::new(1, 1), |c| c == Cell::Wall);
        assert_eq!(path.steps(), 1);
    }
}
