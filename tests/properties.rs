use labyrinth::pathfinding::{astar_path, bfs_path, distance_field};
use labyrinth::{Blocking, Cell, Dir, Grid, Maze, Pos, SafepointPlacer, SafepointPolicy, SafepointTarget};
use proptest::prelude::*;
use rand::rngs::StdRng;
use rand::SeedableRng;

fn walls(cell: Cell) -> bool {
    Blocking::Walls.blocks(cell)
}

proptest! {
    #[test]
    fn world_round_trip(cells_x in 1usize..12, cells_y in 1usize..12, scale in 0.25f32..4.0, x in 0i32..25, y in 0i32..25) {
        let grid = Grid::new(cells_x, cells_y, scale);
        let pos = Pos::new(x % grid.width() as i32, y % grid.height() as i32);
        prop_assert_eq!(grid.to_cell(grid.to_world(pos)), pos);
    }

    #[test]
    fn carved_maze_is_a_spanning_tree(cells_x in 1usize..10, cells_y in 1usize..10, seed in any::<u64>()) {
        let maze = Maze::carve(cells_x, cells_y, 1.0, &mut StdRng::seed_from_u64(seed));
        let grid = maze.grid();
        let floors = grid.positions_of(Cell::Floor);

        let edges: usize = floors
            .iter()
            .map(|p| {
                [Dir::Right, Dir::Up]
                    .into_iter()
                    .filter(|d| grid.classify(p.step(*d)) == Cell::Floor)
                    .count()
            })
            .sum();
        prop_assert_eq!(edges, floors.len() - 1);

        let dist = distance_field(grid, maze.entrance(), walls);
        for p in &floors {
            prop_assert!(dist[grid.index(*p).unwrap()].is_some(), "{} unreachable", p);
        }
    }

    #[test]
    fn bfs_and_astar_agree_on_length(cells_x in 1usize..9, cells_y in 1usize..9, seed in any::<u64>(), a in any::<prop::sample::Index>(), b in any::<prop::sample::Index>()) {
        let maze = Maze::carve(cells_x, cells_y, 1.0, &mut StdRng::seed_from_u64(seed));
        let grid = maze.grid();
        let floors = grid.positions_of(Cell::Floor);
        let start = *a.get(&floors);
        let goal = *b.get(&floors);

        let bfs = bfs_path(grid, start, goal, walls);
        let astar = astar_path(grid, start, goal, walls);
        prop_assert_eq!(bfs.len(), astar.len());
        prop_assert_eq!(bfs.first(), Some(start));
        prop_assert_eq!(astar.last(), Some(goal));
        for pair in astar.cells().windows(2) {
            prop_assert!(pair[0].is_adjacent(pair[1]));
        }
    }

    #[test]
    fn safepoints_are_spaced_and_qualified(cells in 2usize..10, seed in any::<u64>(), corner in any::<bool>(), wanted in 1usize..6) {
        let mut rng = StdRng::seed_from_u64(seed);
        let maze = Maze::carve(cells, cells, 1.0, &mut rng);
        let before = maze.grid().clone();
        let mut grid = before.clone();
        let placer = SafepointPlacer {
            policy: if corner { SafepointPolicy::Corner } else { SafepointPolicy::DeadEnd },
            target: SafepointTarget::Fixed(wanted),
            min_spacing: 3.0,
        };
        let excluded = [maze.entrance(), maze.exit()];
        let set = placer.place(&mut grid, &excluded, &mut rng);

        prop_assert!(set.len() <= wanted);
        let placed = set.positions();
        for (i, p) in placed.iter().enumerate() {
            prop_assert!(placer.policy.qualifies(&before, *p));
            prop_assert!(!excluded.contains(p));
            prop_assert_eq!(grid.classify(*p), Cell::Safepoint);
            for q in &placed[i + 1..] {
                prop_assert!(p.distance(*q) >= 3.0);
            }
        }
        prop_assert_eq!(grid.count(Cell::Safepoint), set.len());
    }
}
