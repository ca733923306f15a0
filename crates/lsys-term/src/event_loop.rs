// SPDX-License-Identifier: MIT
#![allow(unsafe_code)]
//
// Event loop: stdin bytes in, frames out.
//
// Everything runs on the main thread. Each iteration paints a frame if
// something changed, then waits on stdin with `poll(2)`:
//
//   - bytes arrive   → parse, hand events to the app, mark dirty
//   - poll times out → if the parser holds a lone ESC, flush it as Escape
//   - EOF            → leave the loop
//
// The wait is short (ESC timeout) only while the parser has pending bytes.
// Otherwise it is an idle timeout so a SIGWINCH is noticed even on systems
// where poll() is restarted after the signal.
//
// The app owns all state; the loop owns the terminal, the parser and the
// diff renderer.

use std::io;
use std::sync::atomic::{AtomicBool, Ordering};

use crate::buffer::FrameBuffer;
use crate::diff::DiffRenderer;
use crate::input::{Event, Parser};
use crate::terminal::{Size, Terminal};

// ─── SIGWINCH ────────────────────────────────────────────────────────────────

static SIGWINCH_RECEIVED: AtomicBool = AtomicBool::new(false);

/// Install a handler that only sets [`SIGWINCH_RECEIVED`].
#[cfg(unix)]
fn install_sigwinch_handler() {
    unsafe {
        let mut sa: libc::sigaction = std::mem::zeroed();
        sa.sa_sigaction = sigwinch_handler as *const () as usize;
        sa.sa_flags = libc::SA_RESTART;
        libc::sigemptyset(&raw mut sa.sa_mask);
        libc::sigaction(libc::SIGWINCH, &raw const sa, std::ptr::null_mut());
    }
}

#[cfg(unix)]
extern "C" fn sigwinch_handler(_sig: libc::c_int) {
    SIGWINCH_RECEIVED.store(true, Ordering::Relaxed);
}

#[cfg(not(unix))]
const fn install_sigwinch_handler() {}

// ─── App Trait ───────────────────────────────────────────────────────────────

/// What the app wants after an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Continue,
    Quit,
}

/// A full-screen application driven by [`EventLoop`].
///
/// Per iteration the loop calls [`on_event`](App::on_event) for each parsed
/// event, [`on_resize`](App::on_resize) after a SIGWINCH, and
/// [`paint`](App::paint) whenever either of those happened.
pub trait App {
    /// Return [`Action::Quit`] to leave the loop.
    fn on_event(&mut self, event: &Event) -> Action;

    /// The frame buffer is already resized when this runs.
    fn on_resize(&mut self, _size: Size) {}

    /// Paint everything; the buffer was cleared first.
    fn paint(&mut self, buf: &mut FrameBuffer);
}

// ─── Loop Config ─────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy)]
pub struct LoopConfig {
    /// How long a lone ESC waits for the rest of a sequence.
    pub escape_timeout_ms: i32,
    /// Upper bound on one wait for input when nothing is pending.
    pub idle_timeout_ms: i32,
}

impl Default for LoopConfig {
    fn default() -> Self {
        Self {
            escape_timeout_ms: 25,
            idle_timeout_ms: 250,
        }
    }
}

impl LoopConfig {
    const fn timeout_ms(&self, pending: bool) -> i32 {
        if pending {
            self.escape_timeout_ms
        } else {
            self.idle_timeout_ms
        }
    }
}

// ─── Stdin ───────────────────────────────────────────────────────────────────

const READ_BUF_SIZE: usize = 4096;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum ReadOutcome {
    Data(usize),
    Timeout,
    Eof,
}

/// Wait up to `timeout_ms` for stdin, then read what is there.
/// Interrupted waits count as timeouts.
#[cfg(unix)]
fn read_stdin(buf: &mut [u8], timeout_ms: i32) -> io::Result<ReadOutcome> {
    let ready = unsafe {
        let mut pfd = libc::pollfd {
            fd: libc::STDIN_FILENO,
            events: libc::POLLIN,
            revents: 0,
        };
        libc::poll(&raw mut pfd, 1, timeout_ms)
    };

    if ready < 0 {
        let err = io::Error::last_os_error();
        return if err.kind() == io::ErrorKind::Interrupted {
            Ok(ReadOutcome::Timeout)
        } else {
            Err(err)
        };
    }
    if ready == 0 {
        return Ok(ReadOutcome::Timeout);
    }

    let n = unsafe { libc::read(libc::STDIN_FILENO, buf.as_mut_ptr().cast(), buf.len()) };
    match n {
        0 => Ok(ReadOutcome::Eof),
        n if n < 0 => {
            let err = io::Error::last_os_error();
            match err.kind() {
                io::ErrorKind::Interrupted | io::ErrorKind::WouldBlock => Ok(ReadOutcome::Timeout),
                _ => Err(err),
            }
        }
        #[allow(clippy::cast_sign_loss)]
        n => Ok(ReadOutcome::Data(n as usize)),
    }
}

/// Blocking read; ESC is only resolved by the next key.
#[cfg(not(unix))]
fn read_stdin(buf: &mut [u8], _timeout_ms: i32) -> io::Result<ReadOutcome> {
    use std::io::Read;

    match io::stdin().lock().read(buf)? {
        0 => Ok(ReadOutcome::Eof),
        n => Ok(ReadOutcome::Data(n)),
    }
}

// ─── EventLoop ───────────────────────────────────────────────────────────────

/// Owns the terminal for the lifetime of [`run`](Self::run).
///
/// ```no_run
/// use lsys_term::buffer::FrameBuffer;
/// use lsys_term::cell::Attr;
/// use lsys_term::event_loop::{Action, App, EventLoop};
/// use lsys_term::input::{Event, KeyCode, KeyEvent};
///
/// struct Hello;
///
/// impl App for Hello {
///     fn on_event(&mut self, event: &Event) -> Action {
///         match event {
///             Event::Key(KeyEvent { code: KeyCode::Char('x'), .. }) => Action::Quit,
///             _ => Action::Continue,
///         }
///     }
///
///     fn paint(&mut self, buf: &mut FrameBuffer) {
///         buf.paint_text(0, 0, "press x", Attr::empty());
///     }
/// }
///
/// EventLoop::new().run(&mut Hello)?;
/// # Ok::<(), std::io::Error>(())
/// ```
pub struct EventLoop {
    terminal: Terminal,
    parser: Parser,
    renderer: DiffRenderer,
    config: LoopConfig,
}

impl EventLoop {
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(LoopConfig::default())
    }

    #[must_use]
    pub fn with_config(config: LoopConfig) -> Self {
        Self {
            terminal: Terminal::new(),
            parser: Parser::new(),
            renderer: DiffRenderer::new(),
            config,
        }
    }

    #[inline]
    #[must_use]
    pub const fn size(&self) -> Size {
        self.terminal.size()
    }

    /// Enter full-screen mode and run until the app quits or stdin closes.
    /// The terminal is restored even when the loop fails.
    ///
    /// # Errors
    ///
    /// Returns an error if terminal setup, reading stdin, or output fails.
    pub fn run(&mut self, app: &mut impl App) -> io::Result<()> {
        self.terminal.enter()?;
        install_sigwinch_handler();

        let result = self.run_inner(app);
        self.terminal.leave()?;
        result
    }

    fn run_inner(&mut self, app: &mut impl App) -> io::Result<()> {
        let size = self.terminal.refresh_size();
        app.on_resize(size);
        let mut frame = FrameBuffer::new(size.cols, size.rows);
        let mut buf = [0u8; READ_BUF_SIZE];
        let mut dirty = true;

        loop {
            if dirty {
                frame.clear();
                app.paint(&mut frame);
                self.renderer.render(&frame);
                self.renderer.flush()?;
                dirty = false;
            }

            let timeout = self.config.timeout_ms(self.parser.has_pending());
            let events = match read_stdin(&mut buf, timeout)? {
                ReadOutcome::Data(n) => self.parser.advance(&buf[..n]),
                ReadOutcome::Timeout if self.parser.has_pending() => self.parser.flush(),
                ReadOutcome::Timeout => Vec::new(),
                ReadOutcome::Eof => return Ok(()),
            };

            match deliver(app, &events) {
                Action::Quit => return Ok(()),
                Action::Continue => dirty |= !events.is_empty(),
            }

            if SIGWINCH_RECEIVED.swap(false, Ordering::Relaxed) {
                let new_size = self.terminal.refresh_size();
                frame.resize(new_size.cols, new_size.rows);
                self.renderer.force_redraw();
                app.on_resize(new_size);
                dirty = true;
            }
        }
    }
}

impl Default for EventLoop {
    fn default() -> Self {
        Self::new()
    }
}

/// Hand events to the app in order, stopping at the first Quit.
fn deliver(app: &mut impl App, events: &[Event]) -> Action {
    for event in events {
        if app.on_event(event) == Action::Quit {
            return Action::Quit;
        }
    }
    Action::Continue
}

// ─── Tests ───────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cell::Attr;
    use crate::input::{KeyCode, KeyEvent};

    struct Recorder {
        seen: Vec<Event>,
    }

    impl App for Recorder {
        fn on_event(&mut self, event: &Event) -> Action {
            self.seen.push(event.clone());
            match event {
                Event::Key(KeyEvent {
                    code: KeyCode::Char('x'),
                    ..
                }) => Action::Quit,
                _ => Action::Continue,
            }
        }

        fn paint(&mut self, buf: &mut FrameBuffer) {
            buf.paint_text(0, 0, &self.seen.len().to_string(), Attr::empty());
        }
    }

    // ── Config ──────────────────────────────────────────────────

    #[test]
    fn timeout_depends_on_pending_bytes() {
        let config = LoopConfig::default();
        assert_eq!(config.timeout_ms(true), 25);
        assert_eq!(config.timeout_ms(false), 250);
    }

    // ── Delivery ────────────────────────────────────────────────

    #[test]
    fn deliver_stops_at_quit() {
        let mut app = Recorder { seen: Vec::new() };
        let events = Parser::new().advance(b"ixo");
        assert_eq!(deliver(&mut app, &events), Action::Quit);
        assert_eq!(app.seen.len(), 2);
    }

    #[test]
    fn deliver_empty_continues() {
        let mut app = Recorder { seen: Vec::new() };
        assert_eq!(deliver(&mut app, &[]), Action::Continue);
        assert!(app.seen.is_empty());
    }

    #[test]
    fn paint_through_renderer() {
        let mut app = Recorder { seen: Vec::new() };
        deliver(&mut app, &Parser::new().advance(b"mm"));

        let mut frame = FrameBuffer::new(4, 1);
        app.paint(&mut frame);
        let mut renderer = DiffRenderer::new();
        renderer.render(&frame);
        let out = String::from_utf8(renderer.output_bytes().to_vec()).unwrap();
        assert!(out.contains('2'));
    }

    // ── Construction ────────────────────────────────────────────

    #[test]
    fn event_loop_has_size() {
        let event_loop = EventLoop::new();
        assert!(event_loop.size().area() > 0);
    }
}
