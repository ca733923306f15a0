// SPDX-License-Identifier: MIT
//
// lsys-tty — L-system fractals drawn as ASCII art in the terminal.
//
// This is the binary that wires the crates together:
//
//   lsys-core → grammars, rewriting, turtle, rasterizer, glyph quantizer,
//               the Session that owns all viewer state
//   lsys-term → terminal control, input parsing, diff rendering, event loop
//
// Each keypress flows through:
//
//   stdin → parser → Viewer::on_event → Intent → Session::apply
//   paint → Session::render_frame → framebuffer → diff renderer → terminal
//
// With `--print WxH` no terminal mode is touched: one frame is rendered and
// written to stdout.

mod cli;
mod viewer;

use std::fs::File;
use std::io::{self, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result};
use clap::Parser;
use tracing_subscriber::EnvFilter;

use lsys_core::{GrammarStore, Session};
use lsys_term::event_loop::EventLoop;

use crate::cli::{Args, Dimensions};
use crate::viewer::Viewer;

// ─── Logging ────────────────────────────────────────────────────────────────

/// Log to `path` when given. The terminal is in raw mode on the alternate
/// screen, so there is no stderr fallback.
fn init_logging(path: Option<&Path>) -> Result<()> {
    let Some(path) = path else {
        return Ok(());
    };

    let file = File::create(path)
        .with_context(|| format!("failed to create log file {}", path.display()))?;
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(Mutex::new(file))
        .with_ansi(false)
        .init();

    Ok(())
}

// ─── Entry point ────────────────────────────────────────────────────────────

fn print_frame(session: &Session, dims: Dimensions) -> Result<()> {
    let image = session.render_frame(dims.width, dims.height);
    let mut stdout = io::stdout().lock();
    writeln!(stdout, "{image}").context("failed to write frame")?;
    writeln!(stdout, "{}", session.status_line()).context("failed to write status line")?;
    Ok(())
}

fn main() -> Result<()> {
    let args = Args::parse();
    init_logging(args.log_file.as_deref())?;

    let settings = args.settings().context("invalid settings")?;
    let session = Session::starting_at(GrammarStore::seeded(), settings, args.fractal)
        .context("initial generation failed")?;

    tracing::info!(
        version = env!("CARGO_PKG_VERSION"),
        fractal = session.selected().name(),
        iterations = session.view().iterations,
        "starting"
    );

    if let Some(dims) = args.print {
        return print_frame(&session, dims);
    }

    let mut viewer = Viewer::new(session);
    EventLoop::new()
        .run(&mut viewer)
        .context("terminal session failed")?;

    tracing::info!("exiting");
    Ok(())
}
