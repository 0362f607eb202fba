//! Glyph cycles and the forward/backward lookup tables built from them.

use std::collections::{HashMap, HashSet};

use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

/// Why a cycle declaration was rejected.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum InvalidCycle {
    #[error("cycle must contain at least one glyph")]
    Empty,
    #[error("glyph {glyph:?} appears more than once in the same cycle")]
    Duplicate { glyph: String },
    #[error("cycle entry {entry:?} is not a single grapheme")]
    NotSingleGrapheme { entry: String },
}

/// Which neighbour in a cycle a lookup returns.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Direction {
    /// The glyph that follows.
    #[default]
    Forward,
    /// The glyph that precedes.
    Backward,
}

impl Direction {
    #[must_use]
    pub const fn from_reverse(reverse: bool) -> Self {
        if reverse {
            Self::Backward
        } else {
            Self::Forward
        }
    }
}

/// An ordered, non-empty sequence of distinct glyphs.
///
/// Each glyph maps to the one after it, and the last wraps back to the first.
/// A glyph is one extended grapheme cluster, so `"o\u{308}"` is a single entry.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Cycle(Vec<String>);

impl Cycle {
    pub fn new<I, S>(glyphs: I) -> Result<Self, InvalidCycle>
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let glyphs: Vec<String> = glyphs.into_iter().map(Into::into).collect();
        if glyphs.is_empty() {
            return Err(InvalidCycle::Empty);
        }

        let mut seen = HashSet::with_capacity(glyphs.len());
        for glyph in &glyphs {
            if glyph.graphemes(true).count() != 1 {
                return Err(InvalidCycle::NotSingleGrapheme {
                    entry: glyph.clone(),
                });
            }
            if !seen.insert(glyph.as_str()) {
                return Err(InvalidCycle::Duplicate {
                    glyph: glyph.clone(),
                });
            }
        }

        Ok(Self(glyphs))
    }

    /// Split `declaration` into grapheme clusters and validate them as a cycle.
    ///
    /// ```
    /// use glyphcycle_types::Cycle;
    ///
    /// let cycle = Cycle::parse("oω◦ₒ").unwrap();
    /// assert_eq!(cycle.glyphs(), ["o", "ω", "◦", "ₒ"]);
    /// ```
    pub fn parse(declaration: &str) -> Result<Self, InvalidCycle> {
        Self::new(declaration.graphemes(true))
    }

    #[must_use]
    pub fn glyphs(&self) -> &[String] {
        &self.0
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.0.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Pairs of `(glyph, successor)` in declaration order.
    pub fn successors(&self) -> impl Iterator<Item = (&str, &str)> {
        let n = self.0.len();
        (0..n).map(move |i| (self.0[i].as_str(), self.0[(i + 1) % n].as_str()))
    }
}

/// Immutable lookup tables for every declared cycle.
///
/// Built once at startup and shared by reference afterwards. A glyph that was
/// never declared has no entry in either direction.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CycleMap {
    forward: HashMap<String, String>,
    backward: HashMap<String, String>,
}

impl CycleMap {
    /// Build the tables from validated cycles.
    ///
    /// When a glyph is declared in more than one cycle the later declaration
    /// wins. `backward` is derived from the final `forward` table so the two
    /// always agree.
    #[must_use]
    pub fn build<I>(cycles: I) -> Self
    where
        I: IntoIterator<Item = Cycle>,
    {
        let mut forward = HashMap::new();
        let mut inserted = Vec::new();

        for cycle in cycles {
            for (glyph, successor) in cycle.successors() {
                forward.insert(glyph.to_owned(), successor.to_owned());
                inserted.push((glyph.to_owned(), successor.to_owned()));
            }
        }

        // Replay in insertion order so overlapping declarations resolve the
        // same way on every run.
        let mut backward = HashMap::with_capacity(forward.len());
        for (glyph, successor) in inserted {
            if forward.get(&glyph) == Some(&successor) {
                backward.insert(successor, glyph);
            }
        }

        Self { forward, backward }
    }

    /// Validate raw declarations (one string per cycle) and build the map.
    ///
    /// Fails on the first invalid declaration without building anything.
    pub fn try_build<I, S>(declarations: I) -> Result<Self, InvalidCycle>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let cycles = declarations
            .into_iter()
            .map(|declaration| Cycle::parse(declaration.as_ref()))
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::build(cycles))
    }

    /// The glyph after `glyph` in its cycle.
    #[must_use]
    pub fn next(&self, glyph: &str) -> Option<&str> {
        self.forward.get(glyph).map(String::as_str)
    }

    /// The glyph before `glyph` in its cycle.
    #[must_use]
    pub fn previous(&self, glyph: &str) -> Option<&str> {
        self.backward.get(glyph).map(String::as_str)
    }

    #[must_use]
    pub fn lookup(&self, glyph: &str, direction: Direction) -> Option<&str> {
        match direction {
            Direction::Forward => self.next(glyph),
            Direction::Backward => self.previous(glyph),
        }
    }

    #[must_use]
    pub fn contains(&self, glyph: &str) -> bool {
        self.forward.contains_key(glyph)
    }

    /// Number of glyphs with a forward entry.
    #[must_use]
    pub fn len(&self) -> usize {
        self.forward.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.forward.is_empty()
    }
}
