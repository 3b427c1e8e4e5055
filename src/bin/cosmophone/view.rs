//! Starfield/status view. The library hands over plain snapshots; this
//! module rasterizes them into terminal cells. All rendering decisions -
//! projection, glyph choice, color mapping - live on this side of the
//! boundary.

use ratatui::layout::{Constraint, Layout, Rect};
use ratatui::style::{Color, Style};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Paragraph};
use ratatui::Frame;

use cosmophone::analysis::BandLevels;
use cosmophone::beat::sequencer::SequencerState;
use cosmophone::scene::entity::{EntityKind, ShapeForm};
use cosmophone::scene::frame::FrameSnapshot;

pub struct Status {
    pub preset: String,
    pub bpm: f32,
    pub sequencer: SequencerState,
    pub voices: usize,
    pub entities: usize,
    pub clips: usize,
    pub levels: BandLevels,
}

pub fn draw(frame: &mut Frame, snapshot: &FrameSnapshot, status: &Status) {
    let [sky, bar] =
        Layout::vertical([Constraint::Min(4), Constraint::Length(3)]).areas(frame.area());

    frame.render_widget(starfield(snapshot, sky), sky);
    frame.render_widget(status_bar(status), bar);
}

fn shape_glyph(form: ShapeForm) -> char {
    match form {
        ShapeForm::Tetrahedron => '▲',
        ShapeForm::Cube => '■',
        ShapeForm::Octahedron => '◆',
        ShapeForm::Icosahedron => '●',
        ShapeForm::Torus => '◯',
        ShapeForm::Spiral => '@',
    }
}

fn to_color(rgb: [f32; 3], opacity: f32) -> Color {
    let scale = |v: f32| (v * opacity * 255.0).clamp(0.0, 255.0) as u8;
    Color::Rgb(scale(rgb[0]), scale(rgb[1]), scale(rgb[2]))
}

/// Project world positions onto the cell grid. A fixed dim star pattern
/// (hashed from cell coordinates, drifting with warp) sits behind the
/// entities; brighter entities overwrite it.
fn starfield(snapshot: &FrameSnapshot, area: Rect) -> Paragraph<'static> {
    let width = area.width.max(1) as usize;
    let height = area.height.max(1) as usize;
    let mut cells: Vec<Vec<Span>> = vec![vec![Span::raw(" "); width]; height];

    // Background stars
    let drift = (snapshot.params.warp * 40.0) as usize;
    for row in 0..height {
        for col in 0..width {
            let h = (col + drift)
                .wrapping_mul(31)
                .wrapping_add(row.wrapping_mul(17));
            if h % 23 == 0 && snapshot.params.starfield {
                cells[row][col] = Span::styled("·", Style::default().fg(Color::DarkGray));
            }
        }
    }

    // Entities, world space roughly [-40, 40] × [-25, 25]
    let project = |x: f32, y: f32| -> Option<(usize, usize)> {
        let col = ((x + 40.0) / 80.0 * width as f32) as isize;
        let row = ((25.0 - y) / 50.0 * height as f32) as isize;
        (col >= 0 && row >= 0 && (col as usize) < width && (row as usize) < height)
            .then_some((col as usize, row as usize))
    };

    for entity in &snapshot.entities {
        if entity.opacity <= 0.01 {
            continue;
        }
        match &entity.kind {
            EntityKind::Shape { form, color } => {
                if let Some((col, row)) = project(entity.position.x, entity.position.y) {
                    cells[row][col] = Span::styled(
                        shape_glyph(*form).to_string(),
                        Style::default().fg(to_color(*color, entity.opacity)),
                    );
                }
            }
            EntityKind::Glyph { ch, color } => {
                if let Some((col, row)) = project(entity.position.x, entity.position.y) {
                    cells[row][col] = Span::styled(
                        ch.to_string(),
                        Style::default().fg(to_color(*color, entity.opacity)),
                    );
                }
            }
            EntityKind::Text { phrase } => {
                if let Some((col, row)) = project(entity.position.x, entity.position.y) {
                    let gray = (entity.opacity * 255.0) as u8;
                    let style = Style::default().fg(Color::Rgb(gray, gray, gray));
                    for (i, ch) in phrase.chars().enumerate() {
                        if col + i >= width {
                            break;
                        }
                        cells[row][col + i] = Span::styled(ch.to_string(), style);
                    }
                }
            }
        }
    }

    let lines: Vec<Line> = cells.into_iter().map(Line::from).collect();
    Paragraph::new(lines)
}

fn meter(level: f32) -> String {
    let filled = (level.clamp(0.0, 1.0) * 8.0) as usize;
    format!("{}{}", "█".repeat(filled), "░".repeat(8 - filled))
}

fn status_bar(status: &Status) -> Paragraph<'static> {
    let beat = match status.sequencer {
        SequencerState::Stopped => "stopped".to_string(),
        SequencerState::Running { style, step, .. } => {
            format!("{} step {:>2}", style.name(), step % 16)
        }
    };

    let line = Line::from(vec![
        Span::styled(
            format!(" {} ", status.preset),
            Style::default().fg(Color::Cyan),
        ),
        Span::raw(format!(
            "│ {:>5.1} bpm {} │ {} voices │ {} entities │ {} clips │ ",
            status.bpm, beat, status.voices, status.entities, status.clips
        )),
        Span::styled(meter(status.levels.low), Style::default().fg(Color::Red)),
        Span::raw(" "),
        Span::styled(meter(status.levels.mid), Style::default().fg(Color::Yellow)),
        Span::raw(" "),
        Span::styled(meter(status.levels.high), Style::default().fg(Color::Blue)),
    ]);

    Paragraph::new(line).block(Block::default().borders(Borders::TOP).title("cosmophone"))
}
