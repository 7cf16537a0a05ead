use crate::span::Loc;

/// A random-access input that parsers read from.
///
/// Two adapters are provided: any token slice `[T]`, where positions are
/// token indices, and `str`, where positions are byte offsets on character
/// boundaries. Implementors must keep `locate` consistent with `next`: a
/// location derived for a position reachable from a previous location must
/// not depend on how it was derived.
pub trait Stream {
    /// The element type handed to parsers.
    type Item: Clone;

    /// Total length of the input, in the same units as positions.
    fn len(&self) -> usize;

    /// Whether the input is empty.
    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// The element starting at `pos`, with the position just past it, or
    /// `None` at the end of the input.
    fn next(&self, pos: usize) -> Option<(Self::Item, usize)>;

    /// Derive the location of `pos` from an earlier location without
    /// re-scanning from the start. `from.pos <= pos` always holds.
    fn locate(&self, from: Loc, pos: usize) -> Loc;
}

impl<T: Clone> Stream for [T] {
    type Item = T;

    fn len(&self) -> usize {
        <[T]>::len(self)
    }

    fn next(&self, pos: usize) -> Option<(T, usize)> {
        self.get(pos).map(|t| (t.clone(), pos + 1))
    }

    fn locate(&self, _from: Loc, pos: usize) -> Loc {
        // Token streams are flat: the column is the 1-based token index.
        Loc {
            pos,
            line: 1,
            col: pos + 1,
        }
    }
}

impl Stream for str {
    type Item = char;

    fn len(&self) -> usize {
        str::len(self)
    }

    fn next(&self, pos: usize) -> Option<(char, usize)> {
        self[pos..].chars().next().map(|c| (c, pos + c.len_utf8()))
    }

    fn locate(&self, from: Loc, pos: usize) -> Loc {
        debug_assert!(from.pos <= pos);
        let mut line = from.line;
        let mut col = from.col;
        for c in self[from.pos..pos].chars() {
            if c == '\n' {
                line += 1;
                col = 1;
            } else {
                col += 1;
            }
        }
        Loc { pos, line, col }
    }
}

/// A character stream that also exposes its underlying text, for parsers
/// that match multi-character patterns directly (literals, regular
/// expressions).
pub trait TextStream: Stream<Item = char> {
    /// The full input text.
    fn as_str(&self) -> &str;
}

impl TextStream for str {
    fn as_str(&self) -> &str {
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_stream_locations_are_indices() {
        let toks = [10, 20, 30];
        let stream: &[i32] = &toks;
        assert_eq!(stream.next(1), Some((20, 2)));
        assert_eq!(stream.next(3), None);
        let loc = stream.locate(Loc::start(), 2);
        assert_eq!((loc.pos, loc.line, loc.col), (2, 1, 3));
    }

    #[test]
    fn char_stream_tracks_lines_and_columns() {
        let stream = "ab\ncd";
        let loc = stream.locate(Loc::start(), 4);
        assert_eq!((loc.pos, loc.line, loc.col), (4, 2, 2));
    }

    #[test]
    fn char_stream_locations_compose() {
        let stream = "ab\ncd";
        let mid = stream.locate(Loc::start(), 2);
        assert_eq!(stream.locate(mid, 4), stream.locate(Loc::start(), 4));
    }

    #[test]
    fn char_stream_steps_over_multibyte_chars() {
        let stream = "aé!";
        let (c, next) = stream.next(1).unwrap();
        assert_eq!(c, 'é');
        assert_eq!(next, 3);
    }
}
