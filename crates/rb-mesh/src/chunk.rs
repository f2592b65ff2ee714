//! Copy-on-write chunked arrays backing [`MeshBuffer`](crate::MeshBuffer).
//!
//! An array is a list of fixed-size chunks, each behind its own `Arc`.
//! Cloning copies the chunk pointers only; a write copies just the chunks it
//! touches when they are still shared with another clone.  Publishing a
//! buffer edited from a clone of the last snapshot therefore costs the dirty
//! chunks plus one pointer per chunk.

use std::ops::Range;
use std::sync::Arc;

/// Elements per chunk.
pub const CHUNK_LEN: usize = 4096;

#[derive(Clone, Debug)]
pub struct Chunked<T> {
    chunks: Vec<Arc<Vec<T>>>,
    len: usize,
}

impl<T> Default for Chunked<T> {
    fn default() -> Self {
        Chunked { chunks: Vec::new(), len: 0 }
    }
}

impl<T: Copy> Chunked<T> {
    #[inline]
    pub fn len(&self) -> usize {
        self.len
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    pub fn get(&self, i: usize) -> Option<&T> {
        if i >= self.len {
            return None;
        }
        self.chunks[i / CHUNK_LEN].get(i % CHUNK_LEN)
    }

    /// The chunks in order; every one but the last holds [`CHUNK_LEN`]
    /// elements.
    pub fn chunks(&self) -> impl Iterator<Item = &[T]> + '_ {
        self.chunks.iter().map(|c| c.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = &T> + '_ {
        self.chunks().flatten()
    }

    /// Elements in `range`, which must lie within the array.
    pub fn range(&self, range: Range<usize>) -> impl Iterator<Item = &T> + '_ {
        let (start, end) = (range.start, range.end.min(self.len));
        let first = start / CHUNK_LEN;
        self.chunks[first..]
            .iter()
            .flat_map(|c| c.iter())
            .skip(start - first * CHUNK_LEN)
            .take(end.saturating_sub(start))
    }

    /// Extend to `len` elements with `value`.  Never shrinks.
    pub fn grow(&mut self, len: usize, value: T) {
        while self.len < len {
            if self.len % CHUNK_LEN == 0 {
                self.chunks.push(Arc::new(Vec::with_capacity(CHUNK_LEN)));
            }
            let room = CHUNK_LEN - self.len % CHUNK_LEN;
            let n = room.min(len - self.len);
            if let Some(last) = self.chunks.last_mut() {
                Arc::make_mut(last).extend(std::iter::repeat_n(value, n));
            }
            self.len += n;
        }
    }

    /// Copy `src` in starting at `start`.
    pub fn write(&mut self, start: usize, src: &[T]) {
        self.write_with(start, src, |v| v);
    }

    /// Copy `src` in starting at `start`, mapping each element.
    pub fn write_with<S: Copy>(&mut self, start: usize, src: &[S], f: impl Fn(S) -> T) {
        let mut done = 0;
        for (k, span) in self.spans(start..start + src.len()) {
            let chunk = Arc::make_mut(&mut self.chunks[k]);
            for (dst, s) in chunk[span.clone()].iter_mut().zip(&src[done..done + span.len()]) {
                *dst = f(*s);
            }
            done += span.len();
        }
    }

    /// Set every element in `range` to `value`.
    pub fn fill(&mut self, range: Range<usize>, value: T) {
        for (k, span) in self.spans(range) {
            Arc::make_mut(&mut self.chunks[k])[span].fill(value);
        }
    }

    /// `(chunk, in-chunk range)` pieces covering `range`.
    fn spans(&self, range: Range<usize>) -> Vec<(usize, Range<usize>)> {
        let end = range.end.min(self.len);
        let mut out = Vec::new();
        let mut i = range.start;
        while i < end {
            let (k, off) = (i / CHUNK_LEN, i % CHUNK_LEN);
            let n = (CHUNK_LEN - off).min(end - i);
            out.push((k, off..off + n));
            i += n;
        }
        out
    }
}

impl<T: PartialEq> PartialEq for Chunked<T> {
    fn eq(&self, other: &Self) -> bool {
        self.len == other.len
            && self.chunks.iter().zip(&other.chunks).all(|(a, b)| Arc::ptr_eq(a, b) || a == b)
    }
}
