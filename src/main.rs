mod terminal;

use std::fs::File;
use std::io::{self, Stdout};
use std::thread;
use std::time::{Duration, Instant};

use anyhow::{Context, Result};
use crossterm::cursor::{Hide, Show};
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::terminal::{self as term, EnterAlternateScreen, LeaveAlternateScreen};
use crossterm::ExecutableCommand;
use env_logger::{Env, Target};
use labyrinth::session::{GameEvent, Input, ItemKind, Session};
use labyrinth::{Dir, MazeConfig};
use log::{info, warn};

use terminal::Renderer;

const DEFAULT_TICK_MS: u64 = 70;
const DEFAULT_RENDER_FPS: u64 = 120;
const DEFAULT_HEADLESS_TICKS: u64 = 2_000;
const INPUT_HOLD_MS: u64 = 160;

struct Settings {
    tick_ms: u64,
    render_fps: u64,
    headless: bool,
    headless_ticks: u64,
}

fn main() -> Result<()> {
    let settings = read_settings();
    init_logging(settings.headless)?;
    let config = MazeConfig::from_env().context("invalid LABYRINTH_* configuration")?;
    let session = Session::new(config).context("failed to build the first maze")?;

    if settings.headless {
        return run_headless(session, &settings);
    }

    let mut stdout = io::stdout();
    term::enable_raw_mode()?;
    stdout.execute(EnterAlternateScreen)?;
    stdout.execute(Hide)?;

    let result = run(&mut stdout, session, &settings);

    stdout.execute(Show)?;
    stdout.execute(LeaveAlternateScreen)?;
    term::disable_raw_mode()?;
    result
}

fn init_logging(headless: bool) -> Result<()> {
    let mut builder = env_logger::Builder::from_env(Env::default().default_filter_or("info"));
    if headless {
        builder.target(Target::Stderr);
    } else {
        match std::env::var("LABYRINTH_LOG_FILE") {
            Ok(path) if !path.is_empty() => {
                let file = File::create(&path).with_context(|| format!("cannot open log file {path}"))?;
                builder.target(Target::Pipe(Box::new(file)));
            }
            // Anything on stderr would tear through the alternate screen.
            _ => return Ok(()),
        }
    }
    builder.init();
    Ok(())
}

/// Walks the player along the shortest route to the exit until the game ends
/// or the tick budget runs out.
fn run_headless(mut session: Session, settings: &Settings) -> Result<()> {
    let dt = settings.tick_ms as f32 / 1000.0;
    for _ in 0..settings.headless_ticks {
        let route = session.route_to_exit();
        let dir = route
            .next_step()
            .and_then(|next| Dir::towards(session.player().cell(), next));
        session.tick(dt, Input { dir, use_item: None });
        if session.outcome().is_some() {
            break;
        }
    }
    match session.outcome() {
        Some(outcome) => info!("headless run finished: {:?} after {:.1}s", outcome, session.elapsed()),
        None => warn!(
            "headless run stopped after {} ticks without an outcome",
            settings.headless_ticks
        ),
    }
    Ok(())
}

fn run(stdout: &mut Stdout, mut session: Session, settings: &Settings) -> Result<()> {
    let grid = session.maze().grid();
    let mut renderer = Renderer::new(grid.width(), grid.height());
    let mut last_tick = Instant::now();
    let mut last_seen: Option<(Dir, Instant)> = None;
    let mut pending_item: Option<ItemKind> = None;
    let tick = Duration::from_millis(settings.tick_ms);
    let frame_time = Duration::from_micros(1_000_000 / settings.render_fps.max(1));

    loop {
        let frame_start = Instant::now();
        while event::poll(Duration::from_millis(0))? {
            if let Event::Key(key) = event::read()? {
                if !matches!(key.kind, KeyEventKind::Press | KeyEventKind::Repeat) {
                    continue;
                }
                let dir = match key.code {
                    KeyCode::Char('q') => return Ok(()),
                    KeyCode::Char('1') => {
                        pending_item = Some(ItemKind::Regenerate);
                        None
                    }
                    KeyCode::Char('2') => {
                        pending_item = Some(ItemKind::Immunity);
                        None
                    }
                    KeyCode::Char('k') | KeyCode::Up => Some(Dir::Up),
                    KeyCode::Char('j') | KeyCode::Down => Some(Dir::Down),
                    KeyCode::Char('h') | KeyCode::Left => Some(Dir::Left),
                    KeyCode::Char('l') | KeyCode::Right => Some(Dir::Right),
                    _ => None,
                };
                if let Some(dir) = dir {
                    last_seen = Some((dir, Instant::now()));
                }
            }
        }

        if last_tick.elapsed() >= tick {
            let dt = last_tick.elapsed().as_secs_f32();
            last_tick = Instant::now();
            let input = Input {
                dir: held_dir(last_seen),
                use_item: pending_item.take(),
            };
            let events = session.tick(dt, input);
            if events.contains(&GameEvent::Regenerated) {
                renderer.invalidate();
            }
            renderer.render(stdout, &session)?;
            if let Some(outcome) = session.outcome() {
                renderer.render_outcome(stdout, &session, outcome)?;
                return Ok(());
            }
        } else {
            renderer.render(stdout, &session)?;
        }

        let elapsed = frame_start.elapsed();
        if elapsed < frame_time {
            thread::sleep(frame_time - elapsed);
        }
    }
}

/// The last direction pressed, while its key still counts as held.
fn held_dir(last_seen: Option<(Dir, Instant)>) -> Option<Dir> {
    last_seen
        .filter(|(_, at)| at.elapsed() <= Duration::from_millis(INPUT_HOLD_MS))
        .map(|(dir, _)| dir)
}

fn read_settings() -> Settings {
    let tick_ms = read_positive("LABYRINTH_TICK_MS").unwrap_or(DEFAULT_TICK_MS);
    let render_fps = read_positive("LABYRINTH_FPS").unwrap_or(DEFAULT_RENDER_FPS);
    let headless = std::env::var("LABYRINTH_HEADLESS")
        .map(|v| matches!(v.trim(), "1" | "true" | "yes"))
        .unwrap_or(false);
    let headless_ticks = read_positive("LABYRINTH_HEADLESS_TICKS").unwrap_or(DEFAULT_HEADLESS_TICKS);
    Settings {
        tick_ms,
        render_fps,
        headless,
        headless_ticks,
    }
}

fn read_positive(key: &str) -> Option<u64> {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse::<u64>().ok())
        .filter(|v| *v > 0)
}
