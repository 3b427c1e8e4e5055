//! cosmophone - terminal front end for the audiovisual instrument
//!
//! Run with: cargo run
//!
//! Letters (Latin or Greek layout) play notes and spawn drifting shapes;
//! 1-4 start beat styles, 0 stops them, [ and ] nudge the tempo,
//! Tab cycles presets, Enter reshuffles the keyboard, Backspace is panic.

mod app;
mod view;

use app::App;

fn main() -> color_eyre::Result<()> {
    color_eyre::install()?;
    App::new()?.run()
}
