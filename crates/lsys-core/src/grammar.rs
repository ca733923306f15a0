//! Fractal definitions and the in-memory grammar store.
//!
//! A [`FractalDef`] is one L-system: a name, an axiom, the turn angle it
//! looks best with, and an ordered [`RuleSet`]. Definitions are versioned:
//! every mutating method bumps [`FractalDef::revision`], and the session's
//! generation cache compares revisions instead of re-expanding on every
//! keystroke.
//!
//! Rules are an ordered association list rather than a map. The editor
//! addresses "the Nth rule", so iteration order must be stable and a rename
//! must keep the rule where it was.

use std::fmt;

/// Key of the pending rule created while navigating below the last rule in
/// edit mode. Never part of a committed rule set.
pub const PLACEHOLDER_KEY: char = ' ';

// ---------------------------------------------------------------------------
// RuleSet
// ---------------------------------------------------------------------------

/// Ordered `symbol → replacement` rules with distinct keys.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RuleSet {
    rules: Vec<(char, String)>,
}

impl RuleSet {
    /// An empty rule set.
    #[must_use]
    pub const fn new() -> Self {
        Self { rules: Vec::new() }
    }

    /// Build from pairs. A repeated key replaces the earlier value in place.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (char, S)>,
        S: Into<String>,
    {
        let mut set = Self::new();
        for (key, value) in pairs {
            set.insert(key, value);
        }
        set
    }

    /// Number of rules, including a pending placeholder.
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.rules.len()
    }

    /// True if there are no rules at all.
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Replacement for `key`, if a rule exists.
    #[must_use]
    pub fn get(&self, key: char) -> Option<&str> {
        self.rules
            .iter()
            .find(|(k, _)| *k == key)
            .map(|(_, v)| v.as_str())
    }

    /// True if a rule for `key` exists.
    #[must_use]
    pub fn contains_key(&self, key: char) -> bool {
        self.rules.iter().any(|(k, _)| *k == key)
    }

    /// Position of the rule for `key`.
    #[must_use]
    pub fn position(&self, key: char) -> Option<usize> {
        self.rules.iter().position(|(k, _)| *k == key)
    }

    /// The rule at `index` in iteration order.
    #[must_use]
    pub fn nth(&self, index: usize) -> Option<(char, &str)> {
        self.rules.get(index).map(|(k, v)| (*k, v.as_str()))
    }

    /// Rules in order, placeholder included.
    pub fn iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.rules.iter().map(|(k, v)| (*k, v.as_str()))
    }

    /// Rules in order with the placeholder skipped.
    pub fn committed_iter(&self) -> impl Iterator<Item = (char, &str)> {
        self.iter().filter(|(k, _)| *k != PLACEHOLDER_KEY)
    }

    /// Owned copy without the placeholder.
    #[must_use]
    pub fn committed(&self) -> Self {
        Self {
            rules: self
                .rules
                .iter()
                .filter(|(k, _)| *k != PLACEHOLDER_KEY)
                .cloned()
                .collect(),
        }
    }

    /// True if a placeholder rule is pending.
    #[must_use]
    pub fn has_placeholder(&self) -> bool {
        self.contains_key(PLACEHOLDER_KEY)
    }

    /// Insert or replace. Replacing keeps the rule's position; a new key is
    /// appended. Returns the previous value.
    pub fn insert(&mut self, key: char, value: impl Into<String>) -> Option<String> {
        let value = value.into();
        if let Some(slot) = self.rules.iter_mut().find(|(k, _)| *k == key) {
            return Some(std::mem::replace(&mut slot.1, value));
        }
        self.rules.push((key, value));
        None
    }

    /// Append a rule only if `key` is free. Returns whether it was added.
    pub fn try_insert(&mut self, key: char, value: impl Into<String>) -> bool {
        if self.contains_key(key) {
            return false;
        }
        self.rules.push((key, value.into()));
        true
    }

    /// Remove the rule for `key`, returning its value.
    pub fn remove(&mut self, key: char) -> Option<String> {
        let idx = self.position(key)?;
        Some(self.rules.remove(idx).1)
    }

    /// Change the key of the rule at `index`, keeping its position.
    ///
    /// Rejected (returns `false`, nothing changes) when `index` is out of
    /// range or another rule already uses `new_key`. Renaming a rule to its
    /// own key is accepted as a no-op.
    pub fn rename(&mut self, index: usize, new_key: char) -> bool {
        let Some(current) = self.rules.get(index).map(|(k, _)| *k) else {
            return false;
        };
        if current == new_key {
            return true;
        }
        if self.contains_key(new_key) {
            return false;
        }
        self.rules[index].0 = new_key;
        true
    }

    /// Mutable replacement string of the rule at `index`.
    pub fn value_mut(&mut self, index: usize) -> Option<&mut String> {
        self.rules.get_mut(index).map(|(_, v)| v)
    }
}

impl<S: Into<String>> FromIterator<(char, S)> for RuleSet {
    fn from_iter<T: IntoIterator<Item = (char, S)>>(iter: T) -> Self {
        Self::from_pairs(iter)
    }
}

impl fmt::Display for RuleSet {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (k, v)) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k} -> {v}")?;
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// FractalDef
// ---------------------------------------------------------------------------

/// One named L-system.
///
/// Fields are read through accessors and changed only through the methods
/// below, so that every change bumps the revision.
#[derive(Debug, Clone, PartialEq)]
pub struct FractalDef {
    name: String,
    axiom: String,
    initial_angle: i32,
    rules: RuleSet,
    revision: u64,
}

impl FractalDef {
    /// A new definition at revision 0.
    pub fn new(
        name: impl Into<String>,
        axiom: impl Into<String>,
        initial_angle: i32,
        rules: RuleSet,
    ) -> Self {
        Self {
            name: name.into(),
            axiom: axiom.into(),
            initial_angle,
            rules,
            revision: 0,
        }
    }

    /// A copy with a new name, committed rules, and a fresh revision.
    #[must_use]
    pub fn clone_as(&self, name: impl Into<String>) -> Self {
        Self::new(name, self.axiom.clone(), self.initial_angle, self.rules.committed())
    }

    #[inline]
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[inline]
    #[must_use]
    pub fn axiom(&self) -> &str {
        &self.axiom
    }

    /// Turn angle in degrees selected when this fractal becomes active.
    #[inline]
    #[must_use]
    pub const fn initial_angle(&self) -> i32 {
        self.initial_angle
    }

    #[inline]
    #[must_use]
    pub const fn rules(&self) -> &RuleSet {
        &self.rules
    }

    /// Bumped by every successful mutation.
    #[inline]
    #[must_use]
    pub const fn revision(&self) -> u64 {
        self.revision
    }

    const fn bump(&mut self) {
        self.revision = self.revision.wrapping_add(1);
    }

    // -- Name / axiom -------------------------------------------------------

    pub fn push_name_char(&mut self, ch: char) {
        self.name.push(ch);
        self.bump();
    }

    /// Remove the last name character. Returns `false` if already empty.
    pub fn pop_name_char(&mut self) -> bool {
        let popped = self.name.pop().is_some();
        if popped {
            self.bump();
        }
        popped
    }

    pub fn push_axiom_char(&mut self, ch: char) {
        self.axiom.push(ch);
        self.bump();
    }

    /// Remove the last axiom character. Returns `false` if already empty.
    pub fn pop_axiom_char(&mut self) -> bool {
        let popped = self.axiom.pop().is_some();
        if popped {
            self.bump();
        }
        popped
    }

    // -- Rules --------------------------------------------------------------

    /// Append the pending placeholder rule. At most one may exist.
    pub fn add_placeholder_rule(&mut self) -> bool {
        let added = self.rules.try_insert(PLACEHOLDER_KEY, String::new());
        if added {
            self.bump();
        }
        added
    }

    /// Drop the placeholder rule if there is one.
    pub fn discard_placeholder_rule(&mut self) -> bool {
        let removed = self.rules.remove(PLACEHOLDER_KEY).is_some();
        if removed {
            self.bump();
        }
        removed
    }

    /// Rename the key of rule `index`; see [`RuleSet::rename`].
    pub fn rename_rule(&mut self, index: usize, new_key: char) -> bool {
        let unchanged = self.rules.nth(index).is_some_and(|(k, _)| k == new_key);
        let renamed = self.rules.rename(index, new_key);
        if renamed && !unchanged {
            self.bump();
        }
        renamed
    }

    /// Append to the replacement of rule `index`.
    pub fn push_rule_char(&mut self, index: usize, ch: char) -> bool {
        let Some(value) = self.rules.value_mut(index) else {
            return false;
        };
        value.push(ch);
        self.bump();
        true
    }

    /// Remove the last character of rule `index`'s replacement.
    pub fn pop_rule_char(&mut self, index: usize) -> bool {
        let popped = self
            .rules
            .value_mut(index)
            .is_some_and(|value| value.pop().is_some());
        if popped {
            self.bump();
        }
        popped
    }
}

// ---------------------------------------------------------------------------
// GrammarStore
// ---------------------------------------------------------------------------

/// The session's list of fractals. Never empty; entries are never removed.
#[derive(Debug, Clone, PartialEq)]
pub struct GrammarStore {
    defs: Vec<FractalDef>,
}

impl GrammarStore {
    /// Wrap a list of definitions. Returns `None` for an empty list.
    #[must_use]
    pub fn from_defs(defs: Vec<FractalDef>) -> Option<Self> {
        if defs.is_empty() {
            None
        } else {
            Some(Self { defs })
        }
    }

    /// The built-in set: a branching plant, the Heighway dragon, and the
    /// Sierpiński arrowhead.
    #[must_use]
    pub fn seeded() -> Self {
        Self {
            defs: vec![
                FractalDef::new(
                    "Roślinka",
                    "X",
                    25,
                    RuleSet::from_pairs([('X', "F+[[X]-X]-F[-FX]+X)"), ('F', "FF")]),
                ),
                FractalDef::new(
                    "Smok",
                    "F",
                    90,
                    RuleSet::from_pairs([('F', "F+G"), ('G', "F-G")]),
                ),
                FractalDef::new(
                    "Sierpiński",
                    "A",
                    60,
                    RuleSet::from_pairs([('A', "B-A-B"), ('B', "A+B+A")]),
                ),
            ],
        }
    }

    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.defs.len()
    }

    /// Always `false`; present for API symmetry with [`len`](Self::len).
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.defs.is_empty()
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Option<&FractalDef> {
        self.defs.get(index)
    }

    pub fn get_mut(&mut self, index: usize) -> Option<&mut FractalDef> {
        self.defs.get_mut(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &FractalDef> {
        self.defs.iter()
    }

    /// Append a definition, returning its index.
    pub fn push(&mut self, def: FractalDef) -> usize {
        self.defs.push(def);
        self.defs.len() - 1
    }

    /// Index after `index`, wrapping to 0.
    #[must_use]
    pub fn next_index(&self, index: usize) -> usize {
        if index + 1 >= self.defs.len() { 0 } else { index + 1 }
    }

    /// Index before `index`, wrapping to the last entry.
    #[must_use]
    pub fn prev_index(&self, index: usize) -> usize {
        if index == 0 || index > self.defs.len() {
            self.defs.len() - 1
        } else {
            index - 1
        }
    }
}

impl Default for GrammarStore {
    fn default() -> Self {
        Self::seeded()
    }
}

impl std::ops::Index<usize> for GrammarStore {
    type Output = FractalDef;

    fn index(&self, index: usize) -> &FractalDef {
        &self.defs[index]
    }
}

impl std::ops::IndexMut<usize> for GrammarStore {
    fn index_mut(&mut self, index: usize) -> &mut FractalDef {
        &mut self.defs[index]
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
