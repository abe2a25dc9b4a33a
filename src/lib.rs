//! Grid labyrinths: a backtracking maze carver, safepoint placement,
//! BFS/A* path finding and the pursuer/wanderer agents that hunt a player
//! through the result.

pub mod agent;
pub mod config;
pub mod error;
pub mod grid;
pub mod maze;
pub mod pathfinding;
pub mod safepoints;
pub mod session;

pub use agent::{ActorId, AgentController, AgentId, AgentProfile, Behavior, CaptureEvent, Tracked};
pub use config::MazeConfig;
pub use error::{ConfigError, Result};
pub use grid::{Cell, Dir, Grid, Pos, WorldBounds, WorldPoint};
pub use maze::Maze;
pub use pathfinding::{Algorithm, Blocking, Path, PathFinder};
pub use safepoints::{SafepointPlacer, SafepointPolicy, SafepointSet, SafepointTarget};
pub use session::{GameEvent, Input, ItemKind, Outcome, Session};
