//! L-system string rewriting.
//!
//! One generation replaces every symbol that has a rule with the rule's
//! replacement and copies every other symbol through unchanged. Generations
//! are applied `iterations` times starting from the axiom.
//!
//! Growth is exponential for most interesting grammars, so the bounded entry
//! point [`expand_bounded`] computes the exact length of the next generation
//! before building it and refuses once a cap would be exceeded. [`expand`]
//! is the unbounded form.
//!
//! The placeholder rule used during interactive editing is never applied.

use crate::error::GenerationError;
use crate::grammar::RuleSet;

/// Expand `axiom` through `iterations` generations of `rules`.
///
/// Pure and deterministic. `iterations == 0` returns the axiom.
#[must_use]
pub fn expand(axiom: &str, rules: &RuleSet, iterations: u32) -> String {
    let table = Table::new(rules);
    let mut current = axiom.to_owned();
    for _ in 0..iterations {
        current = table.apply(&current, current.len());
    }
    current
}

/// Expand like [`expand`], refusing to build a string longer than `max_len`
/// bytes.
///
/// # Errors
///
/// [`GenerationError::TooLarge`] when some generation would exceed
/// `max_len`. The check runs before the generation is built.
pub fn expand_bounded(
    axiom: &str,
    rules: &RuleSet,
    iterations: u32,
    max_len: usize,
) -> Result<String, GenerationError> {
    if axiom.len() > max_len {
        return Err(GenerationError::TooLarge {
            limit: max_len,
            needed: axiom.len(),
            reached_iteration: 0,
        });
    }

    let table = Table::new(rules);
    let mut current = axiom.to_owned();
    for done in 0..iterations {
        let needed = table.output_len(&current);
        if needed > max_len {
            return Err(GenerationError::TooLarge {
                limit: max_len,
                needed,
                reached_iteration: done,
            });
        }
        current = table.apply(&current, needed);
    }
    Ok(current)
}

/// Apply a single generation.
#[must_use]
pub fn step(input: &str, rules: &RuleSet) -> String {
    let table = Table::new(rules);
    table.apply(input, table.output_len(input))
}

// ---------------------------------------------------------------------------
// Lookup table
// ---------------------------------------------------------------------------

/// Replacement lookup with a direct-indexed fast path for ASCII symbols.
///
/// Expanded strings run to millions of symbols, so the per-symbol lookup is
/// the hot loop. Grammar symbols are almost always ASCII letters.
struct Table<'a> {
    ascii: [Option<&'a str>; 128],
    other: Vec<(char, &'a str)>,
}

impl<'a> Table<'a> {
    fn new(rules: &'a RuleSet) -> Self {
        let mut ascii = [None; 128];
        let mut other = Vec::new();
        for (key, value) in rules.committed_iter() {
            if key.is_ascii() {
                ascii[key as usize] = Some(value);
            } else {
                other.push((key, value));
            }
        }
        Self { ascii, other }
    }

    #[inline]
    fn get(&self, ch: char) -> Option<&'a str> {
        if ch.is_ascii() {
            self.ascii[ch as usize]
        } else {
            self.other.iter().find(|(k, _)| *k == ch).map(|(_, v)| *v)
        }
    }

    /// Byte length of one generation applied to `input`.
    fn output_len(&self, input: &str) -> usize {
        input
            .chars()
            .map(|ch| self.get(ch).map_or(ch.len_utf8(), str::len))
            .fold(0usize, usize::saturating_add)
    }

    fn apply(&self, input: &str, capacity: usize) -> String {
        let mut out = String::with_capacity(capacity);
        for ch in input.chars() {
            match self.get(ch) {
                Some(replacement) => out.push_str(replacement),
                None => out.push(ch),
            }
        }
        out
    }
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grammar::PLACEHOLDER_KEY;
    use pretty_assertions::assert_eq;

    fn sierpinski() -> RuleSet {
        RuleSet::from_pairs([('A', "B-A-B"), ('B', "A+B+A")])
    }

    fn dragon() -> RuleSet {
        RuleSet::from_pairs([('F', "F+G"), ('G', "F-G")])
    }

    // -- Scenarios ------------------------------------------------------------

    #[test]
    fn sierpinski_first_generations() {
        assert_eq!(expand("A", &sierpinski(), 1), "B-A-B");
        assert_eq!(expand("A", &sierpinski(), 2), "A+B+A-B-A-B-A+B+A");
    }

    #[test]
    fn zero_iterations_returns_axiom() {
        assert_eq!(expand("F+F", &dragon(), 0), "F+F");
    }

    #[test]
    fn empty_axiom_stays_empty() {
        assert_eq!(expand("", &dragon(), 8), "");
    }

    // -- Properties -----------------------------------------------------------

    #[test]
    fn expansion_is_deterministic() {
        let a = expand("F", &dragon(), 9);
        let b = expand("F", &dragon(), 9);
        assert_eq!(a, b);
    }

    #[test]
    fn expansion_composes() {
        let rules = sierpinski();
        for n in 0..4 {
            for m in 0..4 {
                let direct = expand("A", &rules, n + m);
                let staged = expand(&expand("A", &rules, n), &rules, m);
                assert_eq!(direct, staged, "n={n} m={m}");
            }
        }
    }

    #[test]
    fn symbols_without_rules_pass_through() {
        let rules = sierpinski();
        assert_eq!(step("+-[]XYZ", &rules), "+-[]XYZ");
        assert_eq!(step("xAx", &rules), "xB-A-Bx");
    }

    #[test]
    fn non_ascii_keys_are_rewritten() {
        let rules = RuleSet::from_pairs([('Ł', "ŁŁ")]);
        assert_eq!(expand("Ł", &rules, 3), "ŁŁŁŁŁŁŁŁ");
    }

    #[test]
    fn placeholder_rule_is_ignored() {
        let mut rules = sierpinski();
        rules.try_insert(PLACEHOLDER_KEY, "");
        assert_eq!(expand("A A", &rules, 1), "B-A-B B-A-B");
    }

    // -- Bounded expansion ----------------------------------------------------

    #[test]
    fn bounded_matches_unbounded_under_limit() {
        let out = expand_bounded("F", &dragon(), 6, 10_000).unwrap();
        assert_eq!(out, expand("F", &dragon(), 6));
    }

    #[test]
    fn bounded_allows_exact_limit() {
        // "A" → "B-A-B" is exactly 5 bytes.
        assert_eq!(expand_bounded("A", &sierpinski(), 1, 5).unwrap(), "B-A-B");
    }

    #[test]
    fn bounded_reports_failing_generation() {
        // Lengths: 1, 5, 17, 53 …
        let err = expand_bounded("A", &sierpinski(), 5, 20).unwrap_err();
        assert_eq!(
            err,
            GenerationError::TooLarge {
                limit: 20,
                needed: 53,
                reached_iteration: 2,
            }
        );
    }

    #[test]
    fn bounded_rejects_oversized_axiom() {
        let err = expand_bounded("AAAA", &sierpinski(), 0, 3).unwrap_err();
        assert!(matches!(
            err,
            GenerationError::TooLarge { needed: 4, reached_iteration: 0, .. }
        ));
    }
}
