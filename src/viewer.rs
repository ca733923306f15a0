// SPDX-License-Identifier: MIT
//
// Viewer — the interactive front end.
//
// Implements lsys-term's App trait on top of an lsys-core Session. Keys are
// decoded into Intents according to the current mode and applied to the
// session; paint draws the current frame.
//
// Layout:
//
//   ┌──────────────────────────────┐
//   │ fractal canvas               │  ← h - 2 rows (minus preview in Edit)
//   ├──────────────────────────────┤
//   │ edit preview (Edit mode)     │  ← expansions + Name/Axiom/rule rows
//   ├──────────────────────────────┤
//   │ message line                 │  ← last generation error, if any
//   ├──────────────────────────────┤
//   │ status line (INVERSE)        │  ← fractal list, parameters, keys
//   └──────────────────────────────┘

use lsys_core::edit::NAME_FIELD;
use lsys_core::{Intent, Session};

use lsys_term::buffer::FrameBuffer;
use lsys_term::cell::Attr;
use lsys_term::event_loop::{Action, App};
use lsys_term::input::{Event, KeyCode, KeyEvent};

// ─── Mode ───────────────────────────────────────────────────────────────────

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    /// Single-letter commands steer the drawing.
    View,
    /// Keys edit the selected fractal's fields.
    Edit,
}

// ─── Viewer ─────────────────────────────────────────────────────────────────

pub struct Viewer {
    session: Session,
    mode: Mode,
    /// The last generation error, shown until the next successful intent.
    message: Option<String>,
}

impl Viewer {
    pub const fn new(session: Session) -> Self {
        Self {
            session,
            mode: Mode::View,
            message: None,
        }
    }

    #[cfg(test)]
    pub const fn mode(&self) -> Mode {
        self.mode
    }

    #[cfg(test)]
    pub const fn session(&self) -> &Session {
        &self.session
    }

    #[cfg(test)]
    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    fn apply(&mut self, intent: Intent) {
        match self.session.apply(intent) {
            Ok(_) => self.message = None,
            Err(err) => self.message = Some(err.to_string()),
        }
    }

    // ── Key handling ────────────────────────────────────────────────

    fn handle_view(&mut self, key: &KeyEvent) -> Action {
        let intent = match key.code {
            KeyCode::Left => Intent::TurnLeft,
            KeyCode::Right => Intent::TurnRight,
            KeyCode::Up => Intent::GrowLength,
            KeyCode::Down => Intent::ShrinkLength,
            KeyCode::Char(ch) => match ch.to_ascii_lowercase() {
                'x' => return Action::Quit,
                'm' => Intent::NextFractal,
                'n' => Intent::PrevFractal,
                'q' => Intent::RotateStartHeadingCcw,
                'e' => Intent::RotateStartHeadingCw,
                'w' => Intent::PanUp,
                'a' => Intent::PanLeft,
                's' => Intent::PanDown,
                'd' => Intent::PanRight,
                'i' => Intent::IncIterations,
                'o' => Intent::DecIterations,
                'r' => {
                    self.apply(Intent::NewFractal);
                    self.mode = Mode::Edit;
                    return Action::Continue;
                }
                _ => return Action::Continue,
            },
            _ => return Action::Continue,
        };
        self.apply(intent);
        Action::Continue
    }

    fn handle_edit(&mut self, key: &KeyEvent) -> Action {
        let intent = match key.code {
            KeyCode::Enter | KeyCode::Escape => {
                self.mode = Mode::View;
                return Action::Continue;
            }
            KeyCode::Up => Intent::MoveEditCursorUp,
            KeyCode::Down => Intent::MoveEditCursorDown,
            KeyCode::Left => Intent::EditKey,
            KeyCode::Right => Intent::EditValue,
            KeyCode::Tab => Intent::ToggleEditKeyOrValue,
            KeyCode::Home => Intent::EnterEditField(NAME_FIELD),
            KeyCode::Backspace => Intent::Backspace,
            KeyCode::Char(ch) => Intent::AppendChar(ch),
            _ => return Action::Continue,
        };
        self.apply(intent);
        Action::Continue
    }

    fn handle_paste(&mut self, text: &str) {
        if self.mode != Mode::Edit {
            return;
        }
        for ch in text.chars().filter(|ch| !ch.is_control()) {
            self.apply(Intent::AppendChar(ch));
        }
    }
}

// ─── App implementation ─────────────────────────────────────────────────────

impl App for Viewer {
    fn on_event(&mut self, event: &Event) -> Action {
        match event {
            Event::Key(key) if key.is_ctrl('c') => Action::Quit,
            Event::Key(key) => match self.mode {
                Mode::View => self.handle_view(key),
                Mode::Edit => self.handle_edit(key),
            },
            Event::Paste(text) => {
                self.handle_paste(text);
                Action::Continue
            }
        }
    }

    fn paint(&mut self, frame: &mut FrameBuffer) {
        let w = frame.width();
        let h = frame.height();
        if w == 0 || h == 0 {
            return;
        }

        let status_y = h - 1;
        frame.paint_text(0, status_y, &self.session.status_line(), Attr::INVERSE);
        frame.fill_row_attrs(status_y, Attr::INVERSE);

        let Some(message_y) = status_y.checked_sub(1) else {
            return;
        };
        if let Some(msg) = &self.message {
            frame.paint_text(0, message_y, msg, Attr::BOLD);
        }

        let preview = match self.mode {
            Mode::Edit => self.session.edit_preview(),
            Mode::View => Vec::new(),
        };
        // Expansion lines come first; drop those before the field rows.
        let preview = &preview[preview.len().saturating_sub(usize::from(message_y))..];
        let preview_len = u16::try_from(preview.len()).unwrap_or(u16::MAX);
        let canvas_h = message_y.saturating_sub(preview_len);

        for (y, line) in (canvas_h..message_y).zip(preview) {
            frame.paint_text(0, y, line, Attr::empty());
        }

        if canvas_h > 0 {
            let image = self
                .session
                .render_frame(u32::from(w), u32::from(canvas_h));
            for (y, row) in (0..canvas_h).zip(image.rows()) {
                frame.paint_text(0, y, row, Attr::empty());
            }
        }
    }
}

// ─── Tests ──────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use lsys_core::view::NEW_FRACTAL_NAME;
    use lsys_core::{GrammarStore, Settings};
    use lsys_term::input::Modifiers;
    use pretty_assertions::assert_eq;

    // ── Helpers ───────────────────────────────────────────────────────────

    fn viewer() -> Viewer {
        let settings = Settings {
            iterations: 3,
            ..Settings::default()
        };
        Viewer::new(Session::new(GrammarStore::seeded(), settings).unwrap())
    }

    fn press(ch: char) -> Event {
        Event::Key(KeyEvent::new(KeyCode::Char(ch)))
    }

    fn key(code: KeyCode) -> Event {
        Event::Key(KeyEvent::new(code))
    }

    fn ctrl(ch: char) -> Event {
        Event::Key(KeyEvent::with_modifiers(KeyCode::Char(ch), Modifiers::CTRL))
    }

    fn send(v: &mut Viewer, events: &[Event]) -> Action {
        for event in events {
            if v.on_event(event) == Action::Quit {
                return Action::Quit;
            }
        }
        Action::Continue
    }

    fn typed(text: &str) -> Vec<Event> {
        text.chars().map(press).collect()
    }

    // ── View mode ─────────────────────────────────────────────────────────

    #[test]
    fn x_quits_in_view_mode() {
        let mut v = viewer();
        assert_eq!(send(&mut v, &[press('x')]), Action::Quit);
        assert_eq!(send(&mut viewer(), &[press('X')]), Action::Quit);
    }

    #[test]
    fn ctrl_c_quits_in_any_mode() {
        let mut v = viewer();
        send(&mut v, &[press('r')]);
        assert_eq!(v.mode(), Mode::Edit);
        assert_eq!(send(&mut v, &[ctrl('c')]), Action::Quit);
    }

    #[test]
    fn m_and_n_cycle_fractals() {
        let mut v = viewer();
        send(&mut v, &[press('m')]);
        assert_eq!(v.session().view().selected, 1);
        send(&mut v, &[press('n'), press('n')]);
        assert_eq!(v.session().view().selected, 2);
    }

    #[test]
    fn arrows_turn_and_scale() {
        let mut v = viewer();
        let angle = v.session().view().angle;
        let length = v.session().view().segment_length;

        send(&mut v, &[key(KeyCode::Left), key(KeyCode::Left), key(KeyCode::Right)]);
        assert_eq!(v.session().view().angle, angle - 1);

        send(&mut v, &[key(KeyCode::Up)]);
        assert!((v.session().view().segment_length - length * 1.5).abs() < 1e-9);
        send(&mut v, &[key(KeyCode::Down)]);
        assert!((v.session().view().segment_length - length).abs() < 1e-9);
    }

    #[test]
    fn wasd_pans_and_qe_rotates() {
        let mut v = viewer();
        send(&mut v, &typed("wwadq"));
        let view = v.session().view();
        assert_eq!((view.offset_x, view.offset_y), (0, -2));
        assert_eq!(view.start_heading, -1);
    }

    #[test]
    fn i_and_o_change_iterations() {
        let mut v = viewer();
        send(&mut v, &[press('i')]);
        assert_eq!(v.session().view().iterations, 4);
        send(&mut v, &[press('o'), press('o')]);
        assert_eq!(v.session().view().iterations, 2);
    }

    #[test]
    fn unmapped_keys_are_ignored() {
        let mut v = viewer();
        let before = v.session().view().clone();
        send(&mut v, &[press('z'), key(KeyCode::Tab), key(KeyCode::Backspace)]);
        assert_eq!(v.session().view(), &before);
    }

    // ── Edit mode ─────────────────────────────────────────────────────────

    #[test]
    fn r_creates_fractal_and_enters_edit() {
        let mut v = viewer();
        send(&mut v, &[press('r')]);
        assert_eq!(v.mode(), Mode::Edit);
        assert_eq!(v.session().store().len(), 4);
        assert_eq!(v.session().selected().name(), NEW_FRACTAL_NAME);
    }

    #[test]
    fn typing_edits_name_then_enter_returns() {
        let mut v = viewer();
        send(&mut v, &[press('r')]);
        send(&mut v, &typed(" x"));
        assert_eq!(v.session().selected().name(), "New Fractal X");

        send(&mut v, &[key(KeyCode::Backspace)]);
        assert_eq!(v.session().selected().name(), "New Fractal ");

        send(&mut v, &[key(KeyCode::Enter)]);
        assert_eq!(v.mode(), Mode::View);
        assert_eq!(send(&mut v, &[press('x')]), Action::Quit);
    }

    #[test]
    fn down_moves_to_axiom() {
        let mut v = viewer();
        send(&mut v, &[press('r'), key(KeyCode::Down)]);
        send(&mut v, &[key(KeyCode::Backspace)]);
        assert_eq!(v.session().selected().axiom(), "");
        send(&mut v, &typed("f"));
        assert_eq!(v.session().selected().axiom(), "F");

        send(&mut v, &[key(KeyCode::Home), press('!')]);
        assert!(v.session().selected().name().ends_with('!'));
    }

    #[test]
    fn paste_appends_in_edit_mode_only() {
        let mut v = viewer();
        send(&mut v, &[Event::Paste("ab".into())]);
        assert_eq!(v.session().store().len(), 3);

        send(&mut v, &[press('r'), Event::Paste("ab\n".into())]);
        assert_eq!(v.session().selected().name(), "New FractalAB");
    }

    #[test]
    fn generation_error_shows_message_and_keeps_state() {
        let settings = Settings {
            iterations: 1,
            max_expansion: 200,
            ..Settings::default()
        };
        let mut v = Viewer::new(Session::new(GrammarStore::seeded(), settings).unwrap());

        send(&mut v, &typed("iiii"));
        let iterations = v.session().view().iterations;
        assert!(v.message().is_some_and(|m| m.contains("too large")));

        send(&mut v, &[press('i')]);
        assert_eq!(v.session().view().iterations, iterations);

        send(&mut v, &[press('a')]);
        assert!(v.message().is_none());
    }

    // ── Paint ─────────────────────────────────────────────────────────────

    fn painted(v: &mut Viewer, w: u16, h: u16) -> FrameBuffer {
        let mut frame = FrameBuffer::new(w, h);
        v.paint(&mut frame);
        frame
    }

    #[test]
    fn status_line_is_last_row_in_inverse() {
        let mut v = viewer();
        let frame = painted(&mut v, 200, 20);
        assert!(frame.row_text(19).starts_with("<Roślinka>  Smok"));
        assert!(frame.row(19).unwrap().iter().all(|c| c.attrs == Attr::INVERSE));
    }

    #[test]
    fn canvas_has_ink() {
        let mut v = viewer();
        let frame = painted(&mut v, 80, 24);
        let ink = (0..22)
            .map(|y| frame.row_text(y))
            .any(|row| row.chars().any(|c| c != ' '));
        assert!(ink);
    }

    #[test]
    fn edit_mode_shows_preview_above_message_line() {
        let mut v = viewer();
        send(&mut v, &[press('r')]);
        let frame = painted(&mut v, 80, 30);
        let rows: Vec<String> = (0..30).map(|y| frame.row_text(y)).collect();
        assert!(rows.iter().any(|r| r.starts_with(">Name: New Fractal")));
        assert!(rows.iter().any(|r| r.starts_with(" Axiom: X")));
        assert_eq!(rows[28].trim(), "");
    }

    #[test]
    fn short_frame_keeps_field_rows_over_expansions() {
        let mut v = viewer();
        send(&mut v, &[press('r'), key(KeyCode::Down)]);
        // Three expansion lines, Name, Axiom and two rules; four rows fit
        // above the message line.
        let frame = painted(&mut v, 80, 6);
        let rows: Vec<String> = (0..4)
            .map(|y| frame.row_text(y).trim_end().to_owned())
            .collect();
        assert_eq!(
            rows,
            [
                " Name: New Fractal",
                ">Axiom: X",
                " X -> F+[[X]-X]-F[-FX]+X)",
                " F -> FF",
            ]
        );
    }

    #[test]
    fn tiny_frames_do_not_panic() {
        let mut v = viewer();
        painted(&mut v, 0, 0);
        painted(&mut v, 5, 1);
        painted(&mut v, 5, 2);
        send(&mut v, &[press('r')]);
        painted(&mut v, 10, 3);
    }
}
