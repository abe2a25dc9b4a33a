use labyrinth::pathfinding::Algorithm;
use labyrinth::session::Session;
use labyrinth::{
    ActorId, AgentController, AgentId, AgentProfile, Blocking, Cell, Grid, Maze, MazeConfig, PathFinder,
    Pos, SafepointPlacer, SafepointPolicy, SafepointTarget, Tracked, WorldPoint,
};
use rand::rngs::StdRng;
use rand::SeedableRng;

struct Standing(WorldPoint);

impl Tracked for Standing {
    fn actor_id(&self) -> ActorId {
        ActorId(99)
    }

    fn world_position(&self) -> WorldPoint {
        self.0
    }
}

#[test]
fn small_maze_is_reproducible_from_seed() {
    let config = MazeConfig {
        cells_x: 3,
        cells_y: 3,
        seed: Some(42),
        ..MazeConfig::default()
    };
    let a = Maze::generate(&config, &mut StdRng::seed_from_u64(42)).unwrap();
    let b = Maze::generate(&config, &mut StdRng::seed_from_u64(42)).unwrap();
    assert_eq!(a, b);
    assert_eq!(a.grid().to_string(), b.grid().to_string());

    let grid = a.grid();
    assert_eq!((grid.width(), grid.height()), (7, 7));
    assert_eq!(a.entrance(), Pos::new(1, 0));
    assert_eq!(a.exit(), Pos::new(5, 6));
    // 9 corridor cells, 8 carved links, entrance and exit.
    assert_eq!(grid.count(Cell::Floor) + grid.count(Cell::Safepoint), 9 + 8 + 2);
}

#[test]
fn close_dead_ends_yield_one_safepoint() {
    let mut grid = Grid::from_rows(&["#####", "#...#", "#####"], 1.0);
    let placer = SafepointPlacer {
        policy: SafepointPolicy::DeadEnd,
        target: SafepointTarget::Fixed(2),
        min_spacing: 3.0,
    };
    assert_eq!(placer.candidates(&grid, &[]), vec![Pos::new(1, 1), Pos::new(3, 1)]);

    let set = placer.place(&mut grid, &[], &mut StdRng::seed_from_u64(0));
    assert_eq!(set.len(), 1);
    assert_eq!(grid.count(Cell::Safepoint), 1);
}

#[test]
fn isolated_goal_has_no_path() {
    let grid = Grid::from_rows(&["#######", "#..#..#", "#######"], 1.0);
    for algorithm in [Algorithm::BreadthFirst, Algorithm::AStar] {
        let path = PathFinder::new(algorithm).find_path(&grid, Pos::new(1, 1), Pos::new(5, 1), |c| {
            Blocking::Walls.blocks(c)
        });
        assert!(path.is_empty(), "{:?} found a path through a wall", algorithm);
    }
}

#[test]
fn pursuer_closes_in_on_a_standing_target() {
    let config = MazeConfig {
        cells_x: 5,
        cells_y: 5,
        ..MazeConfig::default()
    };
    let mut rng = StdRng::seed_from_u64(8);
    let maze = Maze::carve(config.cells_x, config.cells_y, config.tile_scale, &mut rng);
    let grid = maze.grid();
    let goal = Pos::new(9, 9);
    let target = Standing(grid.to_world(goal));
    let profile = AgentProfile::pursuer(&config);
    let mut agent = AgentController::spawn(AgentId(0), profile, grid, grid.to_world(Pos::new(1, 1)));

    let remaining = |from: Pos| {
        profile
            .finder
            .find_path(grid, from, goal, |c| profile.blocking.blocks(c))
            .steps()
    };
    let mut last_cell = agent.current();
    let mut last_len = remaining(last_cell);
    assert!(last_len > 0);

    let mut captured = false;
    for _ in 0..2_000 {
        if agent.tick(grid, 0.05, Some(&target), &mut rng).is_some() {
            captured = true;
            break;
        }
        if agent.current() != last_cell {
            let len = remaining(agent.current());
            assert!(len < last_len, "moved away: {} -> {}", last_len, len);
            last_cell = agent.current();
            last_len = len;
        }
    }
    assert!(captured);
}

#[test]
fn regeneration_keeps_the_player() {
    let config = MazeConfig {
        cells_x: 7,
        cells_y: 7,
        seed: Some(21),
        ..MazeConfig::default()
    };
    let mut session = Session::new(config.clone()).unwrap();
    let before = session.maze().clone();
    let id = session.player().actor_id();

    session.regenerate().unwrap();

    assert_ne!(session.maze(), &before);
    assert_eq!(session.player().actor_id(), id);
    assert_eq!(session.player().cell(), session.maze().entrance());
    assert_eq!(session.agents().len(), config.pursuers + config.wanderers);
    let grid = session.maze().grid();
    for agent in session.agents() {
        assert_eq!(grid.classify(agent.current()), Cell::Floor);
    }
    for (pos, _) in session.items() {
        assert!(session.maze().safepoints().contains(*pos));
    }
}
