//! Cross-module properties of cycle maps and positional substitution.

use std::borrow::Cow;
use std::thread;

use glyphcycle_types::{Cycle, CycleMap, Direction, SubstituteError, substitute, substitute_str};

const DECLARATIONS: [&str; 4] = ["oω◦ₒ", "aα", "cγ", "e\u{301}èêë"];

fn default_map() -> CycleMap {
    CycleMap::try_build(DECLARATIONS).unwrap()
}

#[test]
fn forward_then_backward_substitution_restores_text() {
    let map = default_map();
    let text = "x o ω ◦ ₒ a α c γ";
    for (boundary, _) in text.char_indices().skip(1) {
        let forward = substitute_str(&map, text, boundary, Direction::Forward).unwrap();
        let restore_at = boundary + forward.len() - text.len();
        let back = substitute_str(&map, &forward, restore_at, Direction::Backward).unwrap();
        assert_eq!(back, text, "boundary {boundary}");
    }
}

#[test]
fn repeated_substitution_closes_each_cycle() {
    let map = default_map();
    for declaration in DECLARATIONS {
        let cycle = Cycle::parse(declaration).unwrap();
        let start = format!("{}!", cycle.glyphs()[0]);
        let mut current = start.clone();
        for step in 1..=cycle.len() {
            let boundary = current.len() - 1;
            current = substitute_str(&map, &current, boundary, Direction::Forward)
                .unwrap()
                .into_owned();
            if step < cycle.len() {
                assert_ne!(current, start);
            }
        }
        assert_eq!(current, start, "cycle {declaration}");
    }
}

#[test]
fn only_declared_glyphs_change() {
    let map = default_map();
    let text = "Das Island Manöver";
    for (boundary, ch) in text.char_indices() {
        let boundary = boundary + ch.len_utf8();
        for direction in [Direction::Forward, Direction::Backward] {
            let out = substitute(&map, text.as_bytes(), boundary, direction).unwrap();
            if map.contains(&ch.to_string()) {
                assert!(matches!(out, Cow::Owned(_)));
            } else {
                assert!(matches!(out, Cow::Borrowed(_)));
            }
        }
    }
}

#[test]
fn zero_boundary_always_fails() {
    let map = default_map();
    for text in ["", "x", "ω", "book"] {
        for direction in [Direction::Forward, Direction::Backward] {
            assert_eq!(
                substitute_str(&map, text, 0, direction),
                Err(SubstituteError::NoPrecedingCharacter)
            );
        }
    }
}

#[test]
fn map_is_shareable_across_threads() {
    let map = default_map();
    thread::scope(|scope| {
        for _ in 0..4 {
            scope.spawn(|| {
                let out = substitute_str(&map, "book", 2, Direction::Forward).unwrap();
                assert_eq!(out, "bωok");
            });
        }
    });
}
