//! Replacing the glyph that sits just before a byte offset.
//!
//! The offset is an editor caret: it points *after* the glyph to change.
//! Everything outside that glyph is copied through byte for byte, and the
//! caller's buffer is never modified.

use std::borrow::Cow;

use thiserror::Error;
use unicode_segmentation::UnicodeSegmentation;

use crate::cycle::{CycleMap, Direction};

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SubstituteError {
    #[error("no character before the cursor")]
    NoPrecedingCharacter,
    #[error("cursor offset {boundary} is past the end of the text ({len} bytes)")]
    BoundaryOutOfRange { boundary: usize, len: usize },
}

/// What sits just before the boundary.
#[derive(Debug, PartialEq, Eq)]
enum Target<'a> {
    /// Decoded text ending at byte offset `end`.
    Decoded { tail: &'a str, end: usize },
    /// Malformed bytes. Never mapped.
    Undecodable,
}

/// Replace the glyph immediately before `boundary` with its neighbour in
/// `direction`.
///
/// Returns the input unchanged (borrowed) when the glyph has no mapping, and
/// a new buffer when a substitution happened.
///
/// The target is the last grapheme cluster before `boundary`. If that
/// cluster has no mapping, its last `char` is tried on its own, so a
/// combining mark following a base letter can still be cycled.
///
/// A boundary that falls inside a multi-byte character is moved forward to
/// the end of that character. A boundary past the end of `text` is reported
/// as [`SubstituteError::BoundaryOutOfRange`] rather than clamped: the caller
/// described a cursor that is not in this buffer.
///
/// # Examples
///
/// ```
/// use glyphcycle_types::{CycleMap, Direction, substitute};
///
/// let map = CycleMap::try_build(["oω◦ₒ"]).unwrap();
/// let out = substitute(&map, "book".as_bytes(), 2, Direction::Forward).unwrap();
/// assert_eq!(&*out, "bωok".as_bytes());
/// ```
pub fn substitute<'a>(
    map: &CycleMap,
    text: &'a [u8],
    boundary: usize,
    direction: Direction,
) -> Result<Cow<'a, [u8]>, SubstituteError> {
    let Some(Replacement { start, end, glyph }) = resolve(map, text, boundary, direction)? else {
        return Ok(Cow::Borrowed(text));
    };

    let mut out = Vec::with_capacity(text.len() - (end - start) + glyph.len());
    out.extend_from_slice(&text[..start]);
    out.extend_from_slice(glyph.as_bytes());
    out.extend_from_slice(&text[end..]);
    Ok(Cow::Owned(out))
}

/// [`substitute`] over text already known to be valid UTF-8.
pub fn substitute_str<'a>(
    map: &CycleMap,
    text: &'a str,
    boundary: usize,
    direction: Direction,
) -> Result<Cow<'a, str>, SubstituteError> {
    let Some(Replacement { start, end, glyph }) =
        resolve(map, text.as_bytes(), boundary, direction)?
    else {
        return Ok(Cow::Borrowed(text));
    };

    // `start` and `end` come from decoded text, so both are char boundaries.
    let mut out = String::with_capacity(text.len() - (end - start) + glyph.len());
    out.push_str(&text[..start]);
    out.push_str(glyph);
    out.push_str(&text[end..]);
    Ok(Cow::Owned(out))
}

/// The bytes `start..end` of the input are to be replaced by `glyph`.
struct Replacement<'m> {
    start: usize,
    end: usize,
    glyph: &'m str,
}

fn resolve<'m>(
    map: &'m CycleMap,
    text: &[u8],
    boundary: usize,
    direction: Direction,
) -> Result<Option<Replacement<'m>>, SubstituteError> {
    let Target::Decoded { tail, end } = locate_target(text, boundary)? else {
        return Ok(None);
    };
    Ok(lookup_before(map, tail, direction).map(|(target, glyph)| Replacement {
        start: end - target.len(),
        end,
        glyph,
    }))
}

/// Look up the last grapheme cluster of `tail`, then its last `char` alone.
fn lookup_before<'t, 'm>(
    map: &'m CycleMap,
    tail: &'t str,
    direction: Direction,
) -> Option<(&'t str, &'m str)> {
    let cluster = tail.graphemes(true).next_back()?;
    if let Some(glyph) = map.lookup(cluster, direction) {
        return Some((cluster, glyph));
    }

    let (index, _) = tail.char_indices().next_back()?;
    let scalar = &tail[index..];
    if scalar.len() == cluster.len() {
        return None;
    }
    map.lookup(scalar, direction).map(|glyph| (scalar, glyph))
}

fn locate_target(text: &[u8], boundary: usize) -> Result<Target<'_>, SubstituteError> {
    if boundary == 0 {
        return Err(SubstituteError::NoPrecedingCharacter);
    }
    if boundary > text.len() {
        return Err(SubstituteError::BoundaryOutOfRange {
            boundary,
            len: text.len(),
        });
    }

    let end = char_end(text, boundary);
    let prefix = &text[..end];

    if prefix.utf8_chunks().all(|chunk| chunk.valid().is_empty()) {
        return Err(SubstituteError::NoPrecedingCharacter);
    }
    let Some(last) = prefix.utf8_chunks().last() else {
        return Err(SubstituteError::NoPrecedingCharacter);
    };
    if !last.invalid().is_empty() {
        return Ok(Target::Undecodable);
    }

    Ok(Target::Decoded {
        tail: last.valid(),
        end,
    })
}

/// Move `boundary` forward to the next character boundary if it splits a
/// valid UTF-8 sequence. Offsets inside malformed bytes are left alone.
fn char_end(text: &[u8], boundary: usize) -> usize {
    let mut offset = 0;
    for chunk in text.utf8_chunks() {
        let valid = chunk.valid();
        if boundary <= offset + valid.len() {
            let mut end = boundary - offset;
            while !valid.is_char_boundary(end) {
                end += 1;
            }
            return offset + end;
        }
        offset += valid.len() + chunk.invalid().len();
        if boundary <= offset {
            break;
        }
    }
    boundary
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cycle::Cycle;

    fn omega() -> CycleMap {
        CycleMap::try_build(["oω◦ₒ"]).unwrap()
    }

    fn alpha() -> CycleMap {
        CycleMap::try_build(["aα", "cγ"]).unwrap()
    }

    #[test]
    fn replaces_glyph_before_cursor() {
        let out = substitute_str(&omega(), "book", 2, Direction::Forward).unwrap();
        assert_eq!(out, "bωok");
    }

    #[test]
    fn multibyte_target() {
        let boundary = 'ω'.len_utf8();
        let out = substitute_str(&omega(), "ωmega", boundary, Direction::Forward).unwrap();
        assert_eq!(out, "◦mega");
    }

    #[test]
    fn unmapped_target_borrows_input() {
        let input = "test";
        match substitute_str(&alpha(), input, 4, Direction::Forward).unwrap() {
            Cow::Borrowed(s) => assert_eq!(s, input),
            Cow::Owned(_) => panic!("unmapped target should not allocate"),
        }
    }

    #[test]
    fn zero_boundary_is_an_error() {
        assert_eq!(
            substitute_str(&omega(), "x", 0, Direction::Forward),
            Err(SubstituteError::NoPrecedingCharacter)
        );
        assert_eq!(
            substitute_str(&omega(), "", 0, Direction::Backward),
            Err(SubstituteError::NoPrecedingCharacter)
        );
    }

    #[test]
    fn boundary_inside_character_moves_to_its_end() {
        let out = substitute_str(&alpha(), "αaa", 1, Direction::Backward).unwrap();
        assert_eq!(out, "aaa");
    }

    #[test]
    fn boundary_past_end_is_an_error() {
        assert_eq!(
            substitute_str(&omega(), "book", 5, Direction::Forward),
            Err(SubstituteError::BoundaryOutOfRange {
                boundary: 5,
                len: 4
            })
        );
    }

    #[test]
    fn bytes_after_boundary_untouched() {
        let out = substitute_str(&alpha(), "Touché Amoré", 4, Direction::Forward).unwrap();
        assert_eq!(out, "Touγhé Amoré");
    }

    #[test]
    fn last_glyph_of_text() {
        let out = substitute_str(&alpha(), "haha", 4, Direction::Forward).unwrap();
        assert_eq!(out, "hahα");
    }

    #[test]
    fn input_is_not_mutated() {
        let text = String::from("haha");
        let out = substitute_str(&alpha(), &text, 2, Direction::Forward).unwrap();
        assert_eq!(out, "hαha");
        assert_eq!(text, "haha");
        assert!(matches!(out, Cow::Owned(_)));
    }

    #[test]
    fn reverse_direction() {
        let out = substitute_str(&omega(), "xo", 2, Direction::Backward).unwrap();
        assert_eq!(out, "xₒ");
    }

    #[test]
    fn target_is_whole_grapheme_cluster() {
        let map = CycleMap::try_build(["o\u{308}ø"]).unwrap();
        let text = "ko\u{308}x";
        let boundary = text.len() - 1;
        let out = substitute_str(&map, text, boundary, Direction::Forward).unwrap();
        assert_eq!(out, "køx");
    }

    fn marks() -> Cycle {
        Cycle::new(["\u{301}", "\u{300}"]).unwrap()
    }

    #[test]
    fn combining_mark_cycles_on_its_own() {
        let map = CycleMap::build([marks()]);
        let out = substitute_str(&map, "e\u{301}", 3, Direction::Forward).unwrap();
        assert_eq!(out, "e\u{300}");

        let back = substitute_str(&map, "xe\u{300}y", 4, Direction::Backward).unwrap();
        assert_eq!(back, "xe\u{301}y");
    }

    #[test]
    fn whole_cluster_mapping_wins_over_its_last_char() {
        let map = CycleMap::build([Cycle::parse("e\u{301}è").unwrap(), marks()]);
        let out = substitute_str(&map, "e\u{301}", 3, Direction::Forward).unwrap();
        assert_eq!(out, "è");
    }

    #[test]
    fn unmapped_cluster_and_mark_leave_text() {
        let map = omega();
        let out = substitute_str(&map, "e\u{301}", 3, Direction::Forward).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
    }

    #[test]
    fn byte_and_str_variants_agree() {
        let map = CycleMap::build([marks(), Cycle::parse("oω◦ₒ").unwrap()]);
        for (text, boundary) in [("book", 2), ("ωmega", 2), ("e\u{301}!", 3)] {
            let bytes = substitute(&map, text.as_bytes(), boundary, Direction::Forward).unwrap();
            let string = substitute_str(&map, text, boundary, Direction::Forward).unwrap();
            assert_eq!(&*bytes, string.as_bytes(), "{text:?} at {boundary}");
        }
    }

    #[test]
    fn deterministic() {
        let map = omega();
        let first = substitute_str(&map, "book", 3, Direction::Forward).unwrap();
        let second = substitute_str(&map, "book", 3, Direction::Forward).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn malformed_prefix_has_no_preceding_character() {
        let text = [0xff, 0xfe, b'a'];
        assert_eq!(
            substitute(&alpha(), &text, 2, Direction::Forward),
            Err(SubstituteError::NoPrecedingCharacter)
        );
    }

    #[test]
    fn malformed_target_is_left_alone() {
        let text = [b'a', 0xff, b'a'];
        let out = substitute(&alpha(), &text, 2, Direction::Forward).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));
        assert_eq!(&*out, &text);
    }

    #[test]
    fn valid_glyph_after_malformed_bytes() {
        let text = [0xff, b'a', b'!'];
        let out = substitute(&alpha(), &text, 2, Direction::Forward).unwrap();
        assert_eq!(&*out, [&[0xff][..], "α!".as_bytes()].concat().as_slice());
    }

    #[test]
    fn char_end_snaps_only_inside_valid_sequences() {
        assert_eq!(char_end("αb".as_bytes(), 1), 2);
        assert_eq!(char_end("αb".as_bytes(), 2), 2);
        assert_eq!(char_end(&[b'a', 0xff, 0xfe], 2), 2);
        assert_eq!(char_end(&[b'a', 0xff, 0xfe], 3), 3);
    }
}
