use crossterm::cursor::{Hide, Show};
use crossterm::execute;
use crossterm::terminal::{
    disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen,
};
use log::warn;
use std::io;
use tui::backend::CrosstermBackend;
use tui::layout::Rect;
use tui::style::{Color, Style};
use tui::symbols::Marker;
use tui::widgets::canvas::{Canvas, Points};
use tui::widgets::{Block, Borders};
use tui::Terminal;

/// Display is what the machine's bitmap gets drawn onto. It should abstract
/// the implementation details, so a variety of kinds of screen would work.
pub trait Display {
    /// blank the whole surface
    fn clear(&mut self) -> Result<(), io::Error>;

    /// set one cell to lit (`set`) or dark; may be buffered until `flush`
    fn draw_cell(&mut self, row: usize, col: usize, set: bool) -> Result<(), io::Error>;

    /// make pending changes visible
    fn flush(&mut self) -> Result<(), io::Error>;
}

// store useful metadata about the terminal
struct Resolution(usize, usize);

impl Resolution {
    fn pixel_count(&self) -> usize {
        self.0 * self.1
    }

    fn x_bounds(&self) -> [f64; 2] {
        [0.0, (self.0 - 1) as f64]
    }

    fn y_bounds(&self) -> [f64; 2] {
        [-1.0 * (self.1 - 1) as f64, 0.0]
    }

    /// where the cell at `row`, `col` lives in a row-major buffer
    fn index(&self, row: usize, col: usize) -> usize {
        row * self.0 + col
    }

    /// canvas coordinates of every cell in `cells` that is in state `bitplane`
    fn bitplane_from_cells<'a>(
        &self,
        cells: &'a [bool],
        bitplane: bool,
    ) -> impl std::iter::Iterator<Item = (f64, f64)> + 'a {
        let w = self.0;
        cells
            .iter()
            .enumerate()
            .filter(move |(_, set)| **set == bitplane)
            .map(move |(i, _)| {
                (
                    (i % w) as f64,        // x
                    -1.0 * (i / w) as f64, // y
                )
            })
    }
}

/// monochrome display in a terminal, rendered using TUI and crossterm. the
/// terminal is put back the way we found it when this is dropped
pub struct MonoTermDisplay {
    terminal: Terminal<CrosstermBackend<io::Stdout>>,
    resolution: Resolution,
    cells: Vec<bool>,
}

impl MonoTermDisplay {
    pub fn new(x: usize, y: usize) -> Result<MonoTermDisplay, io::Error> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        let terminal = execute!(stdout, EnterAlternateScreen, Hide)
            .and_then(|_| Terminal::new(CrosstermBackend::new(stdout)));
        let terminal = match terminal {
            Ok(t) => t,
            Err(e) => {
                let _ = restore_terminal();
                return Err(e);
            }
        };
        let resolution = Resolution(x, y);
        // from here on, Drop puts the terminal back
        let mut d = MonoTermDisplay {
            terminal,
            cells: vec![false; resolution.pixel_count()],
            resolution,
        };
        d.terminal.clear()?;
        Ok(d)
    }
}

/// back to the main screen, cursor visible, cooked mode
fn restore_terminal() -> Result<(), io::Error> {
    execute!(io::stdout(), LeaveAlternateScreen, Show)?;
    disable_raw_mode()
}

impl Display for MonoTermDisplay {
    fn clear(&mut self) -> Result<(), io::Error> {
        self.cells.iter_mut().for_each(|c| *c = false);
        Ok(())
    }

    fn draw_cell(&mut self, row: usize, col: usize, set: bool) -> Result<(), io::Error> {
        let i = self.resolution.index(row, col);
        if let Some(cell) = self.cells.get_mut(i) {
            *cell = set;
        }
        Ok(())
    }

    fn flush(&mut self) -> Result<(), io::Error> {
        let resolution = &self.resolution;
        let cells = &self.cells;

        // one terminal cell per pixel, plus the border
        self.terminal.draw(|f| {
            let size = Rect::new(0, 0, 2 + resolution.0 as u16, 2 + resolution.1 as u16)
                .intersection(f.size());

            let canvas = Canvas::default()
                .block(
                    Block::default()
                        .title("CHIP-8")
                        .borders(Borders::ALL)
                        .style(Style::default().bg(Color::Black)),
                )
                .x_bounds(resolution.x_bounds())
                .y_bounds(resolution.y_bounds())
                .marker(Marker::Block)
                .paint(|ctx| {
                    ctx.draw(&Points {
                        coords: &resolution
                            .bitplane_from_cells(cells, false)
                            .collect::<Vec<_>>(),
                        color: Color::Black,
                    });
                    ctx.draw(&Points {
                        coords: &resolution
                            .bitplane_from_cells(cells, true)
                            .collect::<Vec<_>>(),
                        color: Color::White,
                    });
                });
            f.render_widget(canvas, size);
        })?;
        Ok(())
    }
}

impl Drop for MonoTermDisplay {
    fn drop(&mut self) {
        let restored = self
            .terminal
            .show_cursor()
            .and_then(|_| restore_terminal());
        if let Err(e) = restored {
            warn!("could not restore terminal: {}", e);
        }
    }
}

/// useful for testing non-display routines; remembers what it was asked to draw
pub struct DummyDisplay {
    resolution: Resolution,
    cells: Vec<bool>,
    pub flushes: usize,
}

impl DummyDisplay {
    pub fn new(x: usize, y: usize) -> DummyDisplay {
        let resolution = Resolution(x, y);
        DummyDisplay {
            cells: vec![false; resolution.pixel_count()],
            resolution,
            flushes: 0,
        }
    }

    pub fn is_set(&self, row: usize, col: usize) -> bool {
        self.cells[self.resolution.index(row, col)]
    }

    pub fn lit_count(&self) -> usize {
        self.cells.iter().filter(|c| **c).count()
    }
}

impl Display for DummyDisplay {
    fn clear(&mut self) -> Result<(), io::Error> {
        self.cells.iter_mut().for_each(|c| *c = false);
        Ok(())
    }

    fn draw_cell(&mut self, row: usize, col: usize, set: bool) -> Result<(), io::Error> {
        let i = self.resolution.index(row, col);
        self.cells[i] = set;
        Ok(())
    }

    fn flush(&mut self) -> Result<(), io::Error> {
        self.flushes += 1;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    // Resolution tests
    #[test]
    fn test_pixel_count() {
        let r = Resolution(64, 32);
        assert_eq!(r.pixel_count(), 2048)
    }

    #[test]
    fn test_x_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.x_bounds(), [0.0, 63.0]);
    }

    #[test]
    fn test_y_bounds() {
        let r = Resolution(64, 32);
        assert_eq!(r.y_bounds(), [-31.0, 0.0]);
    }

    #[test]
    fn test_bitplanes_split_cells() {
        let r = Resolution(64, 32);
        let mut cells = vec![false; r.pixel_count()];
        cells[r.index(0, 3)] = true;
        cells[r.index(2, 63)] = true;

        let lit: Vec<_> = r.bitplane_from_cells(&cells, true).collect();
        assert_eq!(lit, vec![(3.0, 0.0), (63.0, -2.0)]);
        assert_eq!(r.bitplane_from_cells(&cells, false).count(), 2046);
    }

    // DummyDisplay tests
    #[test]
    fn test_dummy_records_cells() -> Result<(), io::Error> {
        let mut d = DummyDisplay::new(64, 32);
        d.draw_cell(31, 63, true)?;
        assert!(d.is_set(31, 63));
        assert_eq!(d.lit_count(), 1);
        d.clear()?;
        assert_eq!(d.lit_count(), 0);
        d.flush()?;
        assert_eq!(d.flushes, 1);
        Ok(())
    }

    #[test]
    #[ignore]
    // NB. needs a real tty
    fn test_term_display_round_trip() -> Result<(), io::Error> {
        let mut d = MonoTermDisplay::new(64, 32)?;
        d.draw_cell(0, 0, true)?;
        d.flush()
    }
}
