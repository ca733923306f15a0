//! Interactive editing of a [`FractalDef`].
//!
//! The editor shows one row per field: the name, the axiom, then one row per
//! rule. Rows are addressed by a flat index:
//!
//! ```text
//!  0        Name: Smok
//!  1        Axiom: F
//!  2 + i    <key> -> <value>      (rule i)
//! ```
//!
//! On a rule row the cursor is either on the key or on the value. Moving
//! down past the last rule opens a pending placeholder rule
//! ([`PLACEHOLDER_KEY`]) with the cursor on its key, so the next typed
//! character names the new rule. Moving up abandons it.
//!
//! All mutation goes through [`FractalDef`]'s methods, so every accepted edit
//! bumps the definition's revision.

use crate::grammar::{FractalDef, PLACEHOLDER_KEY};
use crate::rewrite::step;

/// Row index of the name field.
pub const NAME_FIELD: usize = 0;
/// Row index of the axiom field.
pub const AXIOM_FIELD: usize = 1;
/// Row index of the first rule.
pub const FIRST_RULE_FIELD: usize = 2;

/// Expansion rounds shown above the field rows in [`edit_preview`].
pub const PREVIEW_ROUNDS: usize = 2;

/// What the cursor is on, resolved against a definition.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Field {
    Name,
    Axiom,
    RuleKey(usize),
    RuleValue(usize),
}

/// Cursor position in the edit view.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EditCursor {
    field: usize,
    on_key: bool,
}

impl EditCursor {
    #[must_use]
    pub const fn new() -> Self {
        Self {
            field: NAME_FIELD,
            on_key: false,
        }
    }

    /// Flat row index.
    #[inline]
    #[must_use]
    pub const fn field(&self) -> usize {
        self.field
    }

    /// True when a rule row edits its key rather than its value.
    #[inline]
    #[must_use]
    pub const fn on_key(&self) -> bool {
        self.on_key
    }

    /// Back to the name row.
    pub const fn reset(&mut self) {
        *self = Self::new();
    }

    /// Resolve the cursor against `def`. `None` if the row no longer exists.
    #[must_use]
    pub fn target(&self, def: &FractalDef) -> Option<Field> {
        match self.field {
            NAME_FIELD => Some(Field::Name),
            AXIOM_FIELD => Some(Field::Axiom),
            n => {
                let rule = n - FIRST_RULE_FIELD;
                if rule >= def.rules().len() {
                    None
                } else if self.on_key {
                    Some(Field::RuleKey(rule))
                } else {
                    Some(Field::RuleValue(rule))
                }
            }
        }
    }

    // -- Navigation ---------------------------------------------------------

    /// Advance one row.
    ///
    /// Past the last rule, a placeholder rule is appended (if none is
    /// pending) and the cursor lands on its key. The cursor never moves past
    /// the pending row.
    pub fn move_down(&mut self, def: &mut FractalDef) {
        let rows = last_field(def) + 1;
        let next = self.field + 1;
        if next < rows {
            self.field = next;
        } else if def.add_placeholder_rule() {
            self.field = rows;
            self.on_key = true;
        } else {
            self.field = rows - 1;
        }
    }

    /// Retreat one row (stopping at the name) and abandon any pending
    /// placeholder rule.
    pub fn move_up(&mut self, def: &mut FractalDef) {
        self.field = self.field.saturating_sub(1);
        def.discard_placeholder_rule();
        self.field = self.field.min(last_field(def));
    }

    /// Jump to row `index`, clamped to the last row.
    pub fn enter_field(&mut self, def: &FractalDef, index: usize) {
        self.field = index.min(last_field(def));
    }

    pub const fn select_key(&mut self) {
        self.on_key = true;
    }

    pub const fn select_value(&mut self) {
        self.on_key = false;
    }

    pub const fn toggle_key_value(&mut self) {
        self.on_key = !self.on_key;
    }

    // -- Editing ------------------------------------------------------------

    /// Type one character into the field under the cursor.
    ///
    /// Only printable ASCII is accepted, and it is uppercased. On a rule key
    /// the rule is renamed to `ch` unless another rule already uses it; after
    /// a successful rename the cursor moves to the value. Returns whether
    /// anything changed.
    pub fn insert_char(&mut self, def: &mut FractalDef, ch: char) -> bool {
        if !(ch.is_ascii_graphic() || ch == ' ') {
            return false;
        }
        let ch = ch.to_ascii_uppercase();

        match self.target(def) {
            Some(Field::Name) => {
                def.push_name_char(ch);
                true
            }
            Some(Field::Axiom) => {
                def.push_axiom_char(ch);
                true
            }
            Some(Field::RuleValue(i)) => def.push_rule_char(i, ch),
            Some(Field::RuleKey(i)) => {
                if ch == PLACEHOLDER_KEY || !def.rename_rule(i, ch) {
                    tracing::trace!(key = %ch, rule = i, "rule key edit rejected");
                    return false;
                }
                self.on_key = false;
                true
            }
            None => false,
        }
    }

    /// Delete backwards in the field under the cursor.
    ///
    /// Text fields lose their last character (no-op when empty). On a rule
    /// key the key reverts to the placeholder, keeping the rule's position,
    /// unless a placeholder is already pending. Returns whether anything
    /// changed.
    pub fn backspace(&mut self, def: &mut FractalDef) -> bool {
        match self.target(def) {
            Some(Field::Name) => def.pop_name_char(),
            Some(Field::Axiom) => def.pop_axiom_char(),
            Some(Field::RuleValue(i)) => def.pop_rule_char(i),
            Some(Field::RuleKey(i)) => {
                let is_placeholder = def.rules().nth(i).is_some_and(|(k, _)| k == PLACEHOLDER_KEY);
                if is_placeholder || !def.rename_rule(i, PLACEHOLDER_KEY) {
                    tracing::trace!(rule = i, "rule key backspace rejected");
                    return false;
                }
                true
            }
            None => false,
        }
    }
}

/// Index of the bottom row for `def`.
fn last_field(def: &FractalDef) -> usize {
    AXIOM_FIELD + def.rules().len()
}

// ---------------------------------------------------------------------------
// Preview
// ---------------------------------------------------------------------------

/// Text block shown above the status line in edit mode.
///
/// The axiom and its first [`PREVIEW_ROUNDS`] expansions, then one row per
/// field. The row under the cursor is marked with `>`.
#[must_use]
pub fn edit_preview(def: &FractalDef, cursor: &EditCursor) -> Vec<String> {
    let marker = |row: usize| if cursor.field() == row { '>' } else { ' ' };

    let mut lines = Vec::with_capacity(PREVIEW_ROUNDS + 3 + def.rules().len());
    let mut current = def.axiom().to_owned();
    for _ in 0..PREVIEW_ROUNDS {
        let next = step(&current, def.rules());
        lines.push(std::mem::replace(&mut current, next));
    }
    lines.push(current);

    lines.push(format!("{}Name: {}", marker(NAME_FIELD), def.name()));
    lines.push(format!("{}Axiom: {}", marker(AXIOM_FIELD), def.axiom()));
    for (i, (key, value)) in def.rules().iter().enumerate() {
        lines.push(format!("{}{key} -> {value}", marker(FIRST_RULE_FIELD + i)));
    }
    lines
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
