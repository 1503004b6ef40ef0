//! Boundary-safe chunking of byte streams.
//!
//! [`ChunkSplitter`] reads a stream in fixed-size blocks and cuts it only at
//! ASCII whitespace (space, tab, newline, carriage return), so a word never
//! straddles two chunks. The bytes after the last boundary of each read are
//! carried over into the next chunk. A word longer than the target size keeps
//! the splitter reading until the next boundary, producing one oversized chunk
//! instead of a truncated word.
//!
//! Because every boundary byte is ASCII, cuts never land inside a multi-byte
//! UTF-8 sequence either.
use std::fmt;
use std::io::{self, Read};
use std::num::NonZeroUsize;
use std::path::Path;
use std::sync::Arc;

use crate::errors::{FreqError, FreqResult};

/// Default target chunk size (1 MiB)
pub const DEFAULT_CHUNK_SIZE: usize = 1024 * 1024;

/// Returns true for the bytes a chunk may be cut at
#[inline]
pub fn is_boundary(byte: u8) -> bool {
    matches!(byte, b' ' | b'\t' | b'\n' | b'\r')
}

/// A word-safe slice of file content
#[derive(Clone, PartialEq, Eq)]
pub struct Chunk {
    origin: Arc<Path>,
    data: Vec<u8>,
}

impl Chunk {
    pub fn new(origin: Arc<Path>, data: Vec<u8>) -> Self {
        Self { origin, data }
    }

    /// The file this chunk was read from
    pub fn origin(&self) -> &Path {
        &self.origin
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when the chunk holds nothing but boundary bytes
    pub fn is_blank(&self) -> bool {
        self.data.iter().all(|&b| is_boundary(b))
    }

    pub fn into_data(self) -> Vec<u8> {
        self.data
    }
}

impl fmt::Debug for Chunk {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Chunk")
            .field("origin", &self.origin)
            .field("len", &self.data.len())
            .finish()
    }
}

/// Sizing options for a [`ChunkSplitter`]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SplitOptions {
    /// Target chunk size in bytes
    pub chunk_size: NonZeroUsize,
    /// Longest word in bytes; a longer one abandons the stream with
    /// [`FreqError::TokenTooLong`]
    pub max_token_length: Option<usize>,
}

impl SplitOptions {
    pub fn new(chunk_size: NonZeroUsize) -> Self {
        Self {
            chunk_size,
            max_token_length: None,
        }
    }

    pub fn with_max_token_length(mut self, limit: Option<usize>) -> Self {
        self.max_token_length = limit;
        self
    }
}

impl Default for SplitOptions {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_CHUNK_SIZE).unwrap_or(NonZeroUsize::MIN))
    }
}

/// Lazily splits one stream into word-safe chunks.
///
/// Cuts that would produce an empty or whitespace-only chunk are skipped, so a
/// stream of pure whitespace yields nothing.
///
/// The splitter is single-use: once it returns `None` or an error it is done.
/// A read error is yielded once as `Err` and ends the sequence; whatever was
/// buffered for the stream is discarded.
pub struct ChunkSplitter<R> {
    reader: R,
    origin: Arc<Path>,
    options: SplitOptions,
    carry: Vec<u8>,
    read_buf: Vec<u8>,
    /// Length of the word still open at the end of the last read
    run: usize,
    finished: bool,
}

impl<R: Read> ChunkSplitter<R> {
    pub fn new(reader: R, origin: impl Into<Arc<Path>>, options: SplitOptions) -> Self {
        Self {
            reader,
            origin: origin.into(),
            options,
            carry: Vec::new(),
            read_buf: vec![0; options.chunk_size.get()],
            run: 0,
            finished: false,
        }
    }

    fn fill(&mut self) -> io::Result<usize> {
        loop {
            match self.reader.read(&mut self.read_buf) {
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                other => return other,
            }
        }
    }

    /// Scans the first `n` bytes of the read buffer and returns the limit if
    /// a word grew past it
    fn exceeded_token_limit(&mut self, n: usize) -> Option<usize> {
        let limit = self.options.max_token_length?;
        for &byte in &self.read_buf[..n] {
            self.run = if is_boundary(byte) { 0 } else { self.run + 1 };
            if self.run > limit {
                return Some(limit);
            }
        }
        None
    }

    fn fail(&mut self, error: FreqError) -> Option<FreqResult<Chunk>> {
        self.finished = true;
        self.carry = Vec::new();
        Some(Err(error))
    }
}

impl<R: Read> Iterator for ChunkSplitter<R> {
    type Item = FreqResult<Chunk>;

    fn next(&mut self) -> Option<Self::Item> {
        while !self.finished {
            let n = match self.fill() {
                Ok(n) => n,
                Err(e) => {
                    let error = FreqError::read(self.origin.to_path_buf(), e);
                    return self.fail(error);
                }
            };

            if n == 0 {
                self.finished = true;
                if self.carry.is_empty() {
                    return None;
                }
                let tail = std::mem::take(&mut self.carry);
                return Some(Ok(Chunk::new(self.origin.clone(), tail)));
            }

            if let Some(limit) = self.exceeded_token_limit(n) {
                let error = FreqError::token_too_long(self.origin.to_path_buf(), limit);
                return self.fail(error);
            }

            // The carry-over is the tail after the previous cut and holds no
            // boundary, so only the fresh bytes need scanning.
            let scanned = self.carry.len();
            self.carry.extend_from_slice(&self.read_buf[..n]);

            if let Some(offset) = self.carry[scanned..].iter().rposition(|&b| is_boundary(b)) {
                let cut = scanned + offset;
                let rest = self.carry.split_off(cut + 1);
                let mut head = std::mem::replace(&mut self.carry, rest);
                head.truncate(cut);
                if head.iter().any(|&b| !is_boundary(b)) {
                    return Some(Ok(Chunk::new(self.origin.clone(), head)));
                }
            }
        }
        None
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::io::Cursor;

    fn options(size: usize) -> SplitOptions {
        SplitOptions::new(NonZeroUsize::new(size).unwrap())
    }

    fn split(input: &[u8], size: usize) -> Vec<Vec<u8>> {
        ChunkSplitter::new(Cursor::new(input.to_vec()), Path::new("mem.txt"), options(size))
            .map(|chunk| chunk.unwrap().into_data())
            .collect()
    }

    fn tokens(bytes: &[u8]) -> Vec<Vec<u8>> {
        bytes
            .split(|&b| is_boundary(b))
            .filter(|t| !t.is_empty())
            .map(<[u8]>::to_vec)
            .collect()
    }

    /// Reader that hands out at most `step` bytes per call and optionally fails at the end
    struct TrickleReader {
        data: Vec<u8>,
        pos: usize,
        step: usize,
        fail_at_end: bool,
        interrupted: bool,
    }

    impl Read for TrickleReader {
        fn read(&mut self, buf: &mut [u8]) -> io::Result<usize> {
            if !self.interrupted {
                self.interrupted = true;
                return Err(io::Error::from(io::ErrorKind::Interrupted));
            }
            if self.pos >= self.data.len() {
                if self.fail_at_end {
                    return Err(io::Error::new(io::ErrorKind::Other, "device gone"));
                }
                return Ok(0);
            }
            let n = self.step.min(buf.len()).min(self.data.len() - self.pos);
            buf[..n].copy_from_slice(&self.data[self.pos..self.pos + n]);
            self.pos += n;
            Ok(n)
        }
    }

    #[test]
    fn test_cuts_at_last_whitespace() {
        let chunks = split(b"alpha beta gamma delta", 8);
        assert_eq!(
            chunks,
            vec![
                b"alpha".to_vec(),
                b"beta".to_vec(),
                b"gamma".to_vec(),
                b"delta".to_vec(),
            ]
        );
    }

    #[test]
    fn test_empty_stream_yields_nothing() {
        assert!(split(b"", 4).is_empty());
    }

    #[test]
    fn test_whitespace_only_stream() {
        assert!(split(b" \n\t \r\n  ", 3).is_empty());
        assert!(split(b"\n\n\n\n", 64).is_empty());
    }

    #[test]
    fn test_oversized_word_kept_intact() {
        let input = b"hi supercalifragilistic yo";
        let chunks = split(input, 4);
        assert_eq!(
            chunks,
            vec![
                b"hi".to_vec(),
                b"supercalifragilistic".to_vec(),
                b"yo".to_vec(),
            ]
        );
        assert_eq!(tokens(&chunks.join(&b' ')), tokens(input));
    }

    #[test]
    fn test_single_word_without_boundary() {
        let chunks = split(b"unbroken", 3);
        assert_eq!(chunks, vec![b"unbroken".to_vec()]);
    }

    #[test]
    fn test_trailing_carry_emitted_at_eof() {
        let chunks = split(b"one two three", 64);
        assert_eq!(chunks, vec![b"one two".to_vec(), b"three".to_vec()]);
    }

    #[test]
    fn test_short_reads_and_interrupts() {
        let reader = TrickleReader {
            data: b"lorem ipsum dolor sit amet".to_vec(),
            pos: 0,
            step: 3,
            fail_at_end: false,
            interrupted: false,
        };
        let chunks: Vec<_> = ChunkSplitter::new(reader, Path::new("slow.txt"), options(5))
            .map(|c| c.unwrap().into_data())
            .collect();
        assert_eq!(
            chunks,
            vec![
                b"lorem".to_vec(),
                b"ipsum".to_vec(),
                b"dolor".to_vec(),
                b"sit".to_vec(),
                b"amet".to_vec(),
            ]
        );
    }

    #[test]
    fn test_read_error_ends_sequence() {
        let reader = TrickleReader {
            data: b"first second third".to_vec(),
            pos: 0,
            step: 64,
            fail_at_end: true,
            interrupted: true,
        };
        let items: Vec<_> = ChunkSplitter::new(reader, Path::new("bad.txt"), options(64)).collect();

        assert_eq!(items.len(), 2);
        assert_eq!(items[0].as_ref().unwrap().data(), b"first second");
        match &items[1] {
            Err(FreqError::Read { path, .. }) => assert_eq!(path, Path::new("bad.txt")),
            other => panic!("expected read error, got {:?}", other),
        }
    }

    #[test]
    fn test_max_token_length_enforced() {
        let input = b"ok aaaaaaaaaaaaaaaaaaaaaaaa ok".to_vec();
        let splitter = ChunkSplitter::new(
            Cursor::new(input),
            Path::new("long.txt"),
            options(4).with_max_token_length(Some(10)),
        );
        let items: Vec<_> = splitter.collect();

        assert!(matches!(
            items.last(),
            Some(Err(FreqError::TokenTooLong { limit: 10, .. }))
        ));
        assert_eq!(items.iter().filter(|i| i.is_err()).count(), 1);
    }

    #[test]
    fn test_max_token_length_within_one_read() {
        let input = format!("ok {} ok", "a".repeat(30));
        let splitter = ChunkSplitter::new(
            Cursor::new(input.into_bytes()),
            Path::new("long.txt"),
            options(1024).with_max_token_length(Some(10)),
        );
        let items: Vec<_> = splitter.collect();

        assert_eq!(items.len(), 1);
        assert!(matches!(
            items[0],
            Err(FreqError::TokenTooLong { limit: 10, .. })
        ));
    }

    #[test]
    fn test_max_token_length_spanning_reads() {
        // A word exactly at the limit passes even when cut across reads
        let splitter = ChunkSplitter::new(
            Cursor::new(b"abcdefghij klm".to_vec()),
            Path::new("edge.txt"),
            options(4).with_max_token_length(Some(10)),
        );
        assert!(splitter.into_iter().all(|item| item.is_ok()));

        let splitter = ChunkSplitter::new(
            Cursor::new(b"ab abcdefghijk".to_vec()),
            Path::new("edge.txt"),
            options(4).with_max_token_length(Some(10)),
        );
        let items: Vec<_> = splitter.collect();
        assert!(matches!(
            items.last(),
            Some(Err(FreqError::TokenTooLong { .. }))
        ));
    }

    #[test]
    fn test_max_token_length_allows_short_tokens() {
        let splitter = ChunkSplitter::new(
            Cursor::new(b"short words only here".to_vec()),
            Path::new("fine.txt"),
            options(4).with_max_token_length(Some(8)),
        );
        assert!(splitter.into_iter().all(|item| item.is_ok()));
    }

    #[test]
    fn test_chunk_origin_and_blank() {
        let chunk = Chunk::new(Arc::from(Path::new("x.txt")), b" \n".to_vec());
        assert_eq!(chunk.origin(), Path::new("x.txt"));
        assert!(chunk.is_blank());
        assert!(!Chunk::new(Arc::from(Path::new("x.txt")), b" a".to_vec()).is_blank());
    }

    proptest! {
        #[test]
        fn prop_no_token_is_split(
            input in proptest::collection::vec(
                prop_oneof![
                    Just(b'a'), Just(b'b'), Just(b'c'),
                    Just(b' '), Just(b'\n'), Just(b'\t'), Just(b'\r'),
                ],
                0..400,
            ),
            size in 1usize..32,
        ) {
            let chunks = split(&input, size);

            // Rejoining with a boundary byte yields exactly the source tokens.
            let rejoined = chunks.join(&b' ');
            prop_assert_eq!(tokens(&rejoined), tokens(&input));

            // Every chunk's first and last tokens are whole source tokens.
            let source = tokens(&input);
            for chunk in &chunks {
                for token in tokens(chunk) {
                    prop_assert!(source.contains(&token));
                }
            }
        }

        #[test]
        fn prop_bounded_chunks_when_words_fit(
            words in proptest::collection::vec("[a-z]{1,4}", 0..100),
            size in 5usize..40,
        ) {
            let input = words.join(" ");
            for chunk in split(input.as_bytes(), size) {
                // A chunk spans at most one carried word plus one read.
                prop_assert!(chunk.len() <= size + 4);
            }
        }
    }
}
