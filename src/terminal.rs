use std::io::{self, Stdout, Write};
use std::time::Duration;

use crossterm::cursor::MoveTo;
use crossterm::event::{self, Event, KeyCode, KeyEventKind};
use crossterm::style::{Color, Print, ResetColor, SetForegroundColor};
use crossterm::terminal::{self, Clear, ClearType};
use crossterm::QueueableCommand;
use labyrinth::agent::Behavior;
use labyrinth::session::{ItemKind, Outcome, Session};
use labyrinth::{Cell, Pos};
use unicode_width::UnicodeWidthStr;

const CELL_W: usize = 2;

#[derive(Clone, Copy, PartialEq)]
enum Glyph {
    Player,
    Shielded,
    Pursuer,
    Wanderer,
    Wall,
    Floor,
    Safepoint,
    Entrance,
    Exit,
    Regenerate,
    Immunity,
}

#[derive(Clone, Copy, PartialEq)]
struct Tile {
    glyph: Glyph,
    color: Color,
}

pub struct Renderer {
    last: Vec<Tile>,
    last_hud: String,
    needs_full: bool,
    origin_x: u16,
    origin_y: u16,
}

impl Renderer {
    pub fn new(width: usize, height: usize) -> Self {
        Self {
            last: vec![
                Tile {
                    glyph: Glyph::Floor,
                    color: Color::Reset,
                };
                width * height
            ],
            last_hud: String::new(),
            needs_full: true,
            origin_x: 0,
            origin_y: 1,
        }
    }

    /// Forces a full redraw, e.g. after the maze was swapped out.
    pub fn invalidate(&mut self) {
        self.needs_full = true;
    }

    pub fn render(&mut self, stdout: &mut Stdout, session: &Session) -> io::Result<()> {
        let grid = session.maze().grid();
        let (width, height) = (grid.width(), grid.height());
        if self.last.len() != width * height {
            *self = Renderer::new(width, height);
        }
        stdout.queue(MoveTo(0, 0))?;
        let (origin_x, origin_y) = match fit(terminal::size()?, width, height) {
            Layout::Fits { origin_x, origin_y } => (origin_x, origin_y),
            Layout::TooSmall { need, have } => {
                stdout.queue(Clear(ClearType::All))?;
                stdout.queue(Print(format!(
                    "Terminal too small. Need at least {}x{} (cols x rows). Current: {}x{}.",
                    need.0, need.1, have.0, have.1
                )))?;
                stdout.flush()?;
                self.needs_full = true;
                return Ok(());
            }
        };
        if (origin_x, origin_y) != (self.origin_x, self.origin_y) {
            self.origin_x = origin_x;
            self.origin_y = origin_y;
            self.needs_full = true;
        }
        if self.needs_full {
            stdout.queue(Clear(ClearType::All))?;
        }

        let hud = hud_line(session);
        if self.needs_full || hud != self.last_hud {
            stdout.queue(MoveTo(self.origin_x, self.origin_y - 1))?;
            stdout.queue(SetForegroundColor(Color::White))?;
            stdout.queue(Clear(ClearType::CurrentLine))?;
            stdout.queue(Print(&hud))?;
            stdout.queue(ResetColor)?;
            self.last_hud = hud;
        }

        // Row 0 of the screen is the top of the maze, where y is largest.
        for row in 0..height {
            let y = (height - 1 - row) as i32;
            for x in 0..width {
                let tile = tile_for(session, Pos::new(x as i32, y));
                let idx = row * width + x;
                if self.needs_full || tile != self.last[idx] {
                    self.last[idx] = tile;
                    self.draw_tile(stdout, x, row, tile)?;
                }
            }
        }
        self.needs_full = false;

        stdout.flush()?;
        Ok(())
    }

    fn draw_tile(&self, stdout: &mut Stdout, x: usize, row: usize, tile: Tile) -> io::Result<()> {
        let text = match tile.glyph {
            Glyph::Player => "😃",
            Glyph::Shielded => "😎",
            Glyph::Pursuer => "👻",
            Glyph::Wanderer => "👀",
            Glyph::Wall => "██",
            Glyph::Floor => "  ",
            Glyph::Safepoint => "░░",
            Glyph::Entrance => "<>",
            Glyph::Exit => "🚪",
            Glyph::Regenerate => "🌀",
            Glyph::Immunity => "🛡",
        };
        let x_pos = self.origin_x + (x * CELL_W) as u16;
        let y_pos = self.origin_y + row as u16;
        stdout.queue(MoveTo(x_pos, y_pos))?;
        stdout.queue(SetForegroundColor(tile.color))?;
        stdout.queue(Print(text))?;
        let w = UnicodeWidthStr::width(text);
        if w < CELL_W {
            for _ in 0..(CELL_W - w) {
                stdout.queue(Print(' '))?;
            }
        }
        stdout.queue(ResetColor)?;
        Ok(())
    }

    /// Prints the result under the maze and waits for `q`.
    pub fn render_outcome(&self, stdout: &mut Stdout, session: &Session, outcome: Outcome) -> io::Result<()> {
        let grid = session.maze().grid();
        let at = match fit(terminal::size()?, grid.width(), grid.height()) {
            Layout::Fits { origin_x, origin_y } => (origin_x, origin_y + grid.height() as u16),
            Layout::TooSmall { need, .. } => (0, need.1),
        };
        stdout.queue(MoveTo(at.0, at.1))?;
        let msg = match outcome {
            Outcome::Won => format!("YOU ESCAPED in {:.1}s (press q to quit)", session.elapsed()),
            Outcome::Captured => "CAUGHT - game over (press q to quit)".to_string(),
            Outcome::TimeUp => "TIME UP - game over (press q to quit)".to_string(),
        };
        stdout.queue(Print(msg))?;
        stdout.flush()?;
        loop {
            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && key.code == KeyCode::Char('q') {
                        return Ok(());
                    }
                }
            }
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Layout {
    /// Top-left screen cell of the maze; the HUD sits on the row above.
    Fits { origin_x: u16, origin_y: u16 },
    TooSmall { need: (u16, u16), have: (u16, u16) },
}

/// Centres a `width` by `height` maze, plus HUD and message rows, in a
/// terminal of `term` columns and rows.
fn fit(term: (u16, u16), width: usize, height: usize) -> Layout {
    let need = ((width * CELL_W) as u16, (height + 2) as u16);
    if term.0 < need.0 || term.1 < need.1 {
        return Layout::TooSmall { need, have: term };
    }
    Layout::Fits {
        origin_x: (term.0 - need.0) / 2,
        origin_y: (term.1 - need.1) / 2 + 1,
    }
}

fn hud_line(session: &Session) -> String {
    let player = session.player();
    let inventory = player.inventory();
    let held = |has: bool, label: &'static str| if has { label } else { "-" };
    format!(
        "Time: {:>4.1}  Items: [1]{} [2]{}  Shield: {:.1}  (hjkl move, q quit)",
        session.time_left(),
        held(inventory.regenerate, "regen"),
        held(inventory.immunity, "shield"),
        player.immunity_left(),
    )
}

fn tile_for(session: &Session, pos: Pos) -> Tile {
    let maze = session.maze();
    let grid = maze.grid();
    let player = session.player();
    if pos == player.cell() {
        return if player.immunity_left() > 0.0 {
            Tile {
                glyph: Glyph::Shielded,
                color: Color::Cyan,
            }
        } else {
            Tile {
                glyph: Glyph::Player,
                color: Color::Yellow,
            }
        };
    }
    if let Some(agent) = session
        .agents()
        .iter()
        .find(|a| grid.to_cell(a.position()) == pos)
    {
        let glyph = match agent.profile().behavior {
            Behavior::Pursuit => Glyph::Pursuer,
            Behavior::Wander => Glyph::Wanderer,
        };
        return Tile {
            glyph,
            color: Color::Red,
        };
    }
    if let Some(kind) = session.item_at(pos) {
        let glyph = match kind {
            ItemKind::Regenerate => Glyph::Regenerate,
            ItemKind::Immunity => Glyph::Immunity,
        };
        return Tile {
            glyph,
            color: Color::Magenta,
        };
    }
    if pos == maze.entrance() {
        return Tile {
            glyph: Glyph::Entrance,
            color: Color::DarkGrey,
        };
    }
    if pos == maze.exit() {
        return Tile {
            glyph: Glyph::Exit,
            color: Color::Green,
        };
    }
    match grid.classify(pos) {
        Cell::Wall => Tile {
            glyph: Glyph::Wall,
            color: Color::Blue,
        },
        Cell::Floor => Tile {
            glyph: Glyph::Floor,
            color: Color::Reset,
        },
        Cell::Safepoint => Tile {
            glyph: Glyph::Safepoint,
            color: Color::Green,
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn maze_is_centred_below_the_hud() {
        assert_eq!(
            fit((40, 20), 7, 7),
            Layout::Fits {
                origin_x: 13,
                origin_y: 6
            }
        );
        assert_eq!(
            fit((14, 9), 7, 7),
            Layout::Fits {
                origin_x: 0,
                origin_y: 1
            }
        );
    }

    #[test]
    fn small_terminal_reports_what_is_needed() {
        assert_eq!(
            fit((13, 30), 7, 7),
            Layout::TooSmall {
                need: (14, 9),
                have: (13, 30)
            }
        );
    }
}
