//! # Vector Span
//!
//! A non-owning window into caller-owned send storage. A span never copies
//! or frees the bytes it references; the borrow checker keeps the storage
//! alive for as long as any Frame-Chain holds the span.
//!
//! ## Physical Adjacency
//!
//! Two spans are physically adjacent when they window the same buffer and
//! the first ends exactly where the second begins. Adjacent spans are
//! coalesced by the merge and split primitives so that a popped chain
//! carries as few spans as possible.
//!
//! ```text
//! buf:   [..................................................]
//! a:          [start=4 ........ end=20)
//! b:                             [start=20 ..... end=35)
//! a+b:        [start=4 ...................... end=35)
//! ```

#![forbid(unsafe_code)]

use core::ops::Range;

use tinyvec::{Array, TinyVec};

/// Borrowed window `[start, end)` into a send buffer.
#[derive(Clone, Copy, Default)]
pub struct Span<'a> {
    buf: &'a [u8],
    start: usize,
    end: usize,
}

impl<'a> Span<'a> {
    /// Span covering all of `buf`.
    ///
    /// Adjacency is judged against the backing slice, so two `new` spans
    /// over neighbouring subslices of one buffer never coalesce. Build spans
    /// with [`Span::window`] over the whole buffer when merged frames should
    /// carry them as one.
    pub fn new(buf: &'a [u8]) -> Self {
        Self {
            buf,
            start: 0,
            end: buf.len(),
        }
    }

    /// Span covering `range` of `buf`.
    ///
    /// Spans built from windows of one buffer can later coalesce.
    pub fn window(buf: &'a [u8], range: Range<usize>) -> Self {
        debug_assert!(range.start <= range.end && range.end <= buf.len());
        Self {
            buf,
            start: range.start,
            end: range.end,
        }
    }

    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Position of the first byte within the backing buffer.
    pub fn position(&self) -> usize {
        self.start
    }

    /// The referenced bytes.
    pub fn as_slice(&self) -> &'a [u8] {
        &self.buf[self.start..self.end]
    }

    /// Returns true if `next` continues this span in the same buffer.
    pub fn is_adjacent(&self, next: &Span<'_>) -> bool {
        core::ptr::eq(self.buf, next.buf) && self.end == next.start
    }

    /// Grow by `n` bytes at the tail. Caller guarantees adjacency.
    pub(crate) fn extend(&mut self, n: usize) {
        debug_assert!(self.end + n <= self.buf.len());
        self.end += n;
    }

    /// Drop `n` bytes from the front.
    pub(crate) fn advance(&mut self, n: usize) {
        debug_assert!(n <= self.len());
        self.start += n;
    }

    /// Keep only the first `n` bytes.
    pub(crate) fn truncate(&mut self, n: usize) {
        debug_assert!(n <= self.len());
        self.end = self.start + n;
    }

    /// Split off the first `n` bytes; `self` keeps the remainder.
    pub(crate) fn split_to(&mut self, n: usize) -> Span<'a> {
        let mut head = *self;
        head.truncate(n);
        self.advance(n);
        head
    }
}

impl PartialEq for Span<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.as_slice() == other.as_slice()
    }
}

impl Eq for Span<'_> {}

impl core::fmt::Debug for Span<'_> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "Span({}..{})", self.start, self.end)
    }
}

/// Total payload length of `spans`.
pub fn spans_len(spans: &[Span<'_>]) -> usize {
    spans.iter().map(Span::len).sum()
}

/// Span index and in-span position of payload byte `at`.
///
/// Returns `(spans.len(), 0)` when `at` is at or past the end.
pub(crate) fn split_point(spans: &[Span<'_>], at: usize) -> (usize, usize) {
    let mut pos = 0;
    for (idx, span) in spans.iter().enumerate() {
        if at < pos + span.len() {
            return (idx, at - pos);
        }
        pos += span.len();
    }
    (spans.len(), 0)
}

/// Move up to `left` bytes from the front of `src` onto the end of `dst`
/// and return how many were moved.
///
/// A source span that physically continues the last span of `dst` extends
/// it in place. Any other span is appended, unless `dst` already holds
/// `max_count` spans, which stops the merge.
pub fn merge_spans<'a, A>(
    dst: &mut TinyVec<A>,
    src: &mut TinyVec<A>,
    left: usize,
    max_count: usize,
) -> usize
where
    A: Array<Item = Span<'a>>,
{
    let mut remaining = left;
    let mut consumed = 0;

    for b in src.iter_mut() {
        if remaining == 0 {
            break;
        }
        if b.is_empty() {
            consumed += 1;
            continue;
        }

        if let Some(a) = dst.last_mut() {
            if a.is_adjacent(b) {
                if remaining >= b.len() {
                    a.extend(b.len());
                    remaining -= b.len();
                    consumed += 1;
                    continue;
                }
                a.extend(remaining);
                b.advance(remaining);
                remaining = 0;
                break;
            }
        }

        if dst.len() >= max_count {
            break;
        }

        if remaining >= b.len() {
            dst.push(*b);
            remaining -= b.len();
            consumed += 1;
            continue;
        }
        dst.push(b.split_to(remaining));
        remaining = 0;
        break;
    }

    src.drain(..consumed);
    left - remaining
}

/// Move every byte after the first `at` bytes of `src` to the front of
/// `dst` and return how many were moved.
///
/// The last moved span coalesces with the first span of `dst` when the two
/// are physically adjacent.
pub fn split_spans<'a, A>(src: &mut TinyVec<A>, dst: &mut TinyVec<A>, at: usize) -> usize
where
    A: Array<Item = Span<'a>>,
{
    let (idx, within) = split_point(src, at);
    if idx == src.len() {
        return 0;
    }

    let mut moved: TinyVec<A> = TinyVec::default();
    let keep = if within > 0 {
        let mut tail = src[idx];
        tail.advance(within);
        src[idx].truncate(within);
        moved.push(tail);
        idx + 1
    } else {
        idx
    };
    moved.extend(src.drain(keep..));
    let n = spans_len(&moved);

    if let (Some(last), Some(first)) = (moved.last_mut(), dst.first().copied()) {
        if last.is_adjacent(&first) {
            last.extend(first.len());
            dst.remove(0);
        }
    }
    moved.extend(dst.drain(..));
    *dst = moved;
    n
}

#[cfg(test)]
mod tests {
    use super::*;

    static DATA: [u8; 64] = [0u8; 64];

    #[test]
    fn test_adjacency_requires_same_buffer() {
        let a = Span::window(&DATA, 0..10);
        let b = Span::window(&DATA, 10..20);
        let c = Span::window(&DATA, 11..20);
        assert!(a.is_adjacent(&b));
        assert!(!a.is_adjacent(&c));

        let other = [0u8; 64];
        let d = Span::window(&other, 10..20);
        assert!(!a.is_adjacent(&d));
    }

    #[test]
    fn test_subslice_spans_do_not_coalesce() {
        let a = Span::new(&DATA[0..10]);
        let b = Span::new(&DATA[10..20]);
        assert!(!a.is_adjacent(&b));

        let mut dst: Vec4<'static> = [a].into_iter().collect();
        let mut src: Vec4<'static> = [b].into_iter().collect();
        assert_eq!(merge_spans(&mut dst, &mut src, 10, 4), 10);
        assert_eq!(dst.len(), 2);
    }

    #[test]
    fn test_split_to() {
        let mut s = Span::window(&DATA, 5..25);
        let head = s.split_to(7);
        assert_eq!(head.position(), 5);
        assert_eq!(head.len(), 7);
        assert_eq!(s.position(), 12);
        assert_eq!(s.len(), 13);
        assert!(head.is_adjacent(&s));
    }

    type Vec4<'a> = TinyVec<[Span<'a>; 4]>;

    fn spans(ranges: &[(usize, usize)]) -> Vec4<'static> {
        ranges
            .iter()
            .map(|&(pos, len)| Span::window(&DATA, pos..pos + len))
            .collect()
    }

    #[test]
    fn test_merge_spans_coalesces_and_splits() {
        let mut dst = spans(&[(0, 10)]);
        let mut src = spans(&[(10, 6), (30, 8)]);

        assert_eq!(merge_spans(&mut dst, &mut src, 9, 4), 9);
        assert_eq!(dst.len(), 2);
        assert_eq!(dst[0].len(), 16);
        assert_eq!((dst[1].position(), dst[1].len()), (30, 3));
        assert_eq!(src.len(), 1);
        assert_eq!((src[0].position(), src[0].len()), (33, 5));
    }

    #[test]
    fn test_merge_spans_respects_max_count() {
        let mut dst = spans(&[(0, 2)]);
        let mut src = spans(&[(2, 2), (8, 2)]);

        assert_eq!(merge_spans(&mut dst, &mut src, 100, 1), 2);
        assert_eq!(dst.len(), 1);
        assert_eq!(src.len(), 1);
        assert_eq!(src[0].position(), 8);
    }

    #[test]
    fn test_split_spans_mid_span() {
        let mut src = spans(&[(0, 10), (20, 10)]);
        let mut dst = Vec4::default();

        assert_eq!(split_spans(&mut src, &mut dst, 4), 16);
        assert_eq!(src.len(), 1);
        assert_eq!(src[0].len(), 4);
        assert_eq!(dst.len(), 2);
        assert_eq!((dst[0].position(), dst[0].len()), (4, 6));
        assert_eq!(dst[1].position(), 20);
    }

    #[test]
    fn test_split_spans_coalesces_with_dst() {
        let mut src = spans(&[(0, 10)]);
        let mut dst = spans(&[(10, 5), (40, 1)]);

        assert_eq!(split_spans(&mut src, &mut dst, 6), 4);
        assert_eq!(dst.len(), 2);
        assert_eq!((dst[0].position(), dst[0].len()), (6, 9));
        assert_eq!(dst[1].position(), 40);
    }

    #[test]
    fn test_split_spans_past_end() {
        let mut src = spans(&[(0, 10)]);
        let mut dst = Vec4::default();
        assert_eq!(split_spans(&mut src, &mut dst, 10), 0);
        assert_eq!(src.len(), 1);
        assert!(dst.is_empty());
    }

    #[test]
    fn test_spans_len() {
        let spans = [Span::window(&DATA, 0..3), Span::new(&DATA[..0]), Span::window(&DATA, 9..13)];
        assert_eq!(spans_len(&spans), 7);
    }
}
