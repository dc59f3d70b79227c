//! Container formats for streams of codes.
//!
//! The binary "format 001" stores codes as big-endian unsigned integers of
//! varying byte widths, grouped in segments:
//!
//! ```text
//! offset  size  content
//! 0       9     magic "TECTONIC" + version byte 0x01
//! 9       1     Base.height
//! 10      1     Base.width
//! 11      1     Base.maximum
//! 12      4     total code count (u32, big-endian)
//! 16      …     one or more segments
//! end     1     end-of-stream marker 0x80
//! ```
//!
//! Each segment starts with the number of (width, count) pairs it describes
//! (at most 127, the top bit distinguishes the end-of-stream marker), the
//! pairs themselves (width on one byte, count on four), then the codes of
//! each pair in order. Consecutive codes of equal width share a pair, so
//! reading restores the exact write order.
//!
//! The text "format 000" is the same stream spelled out in decimal, one
//! code per line, closed by `-1`.

use super::base::Base;
use super::error::{Error, Result};
use log::warn;
use num_bigint::BigUint;
use std::collections::VecDeque;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, ErrorKind, Read, Seek, SeekFrom, Write};
use std::path::Path;
use std::str::FromStr;

/// Common prelude of every container format.
pub const MAGIC: &[u8; 8] = b"TECTONIC";
/// Version byte of the binary format.
pub const BINARY_VERSION: u8 = 0x01;
/// Version byte of the text format.
pub const TEXT_VERSION: u8 = 0x00;
/// Marker closing a binary stream. Its top bit is what tells it apart from
/// a segment header.
pub const END_OF_STREAM: u8 = 0x80;
/// Number of codes the binary writer buffers before flushing a segment.
pub const DEFAULT_BLOCK: usize = 65536;

/// Returns the number of bytes `code` occupies on disk.
fn width_of(code: &BigUint) -> Result<u8> {
    u8::try_from(code.bits().max(1).div_ceil(8)).map_err(|_| {
        Error::ContainerCorruption("code wider than 255 bytes".to_string())
    })
}

fn read_header(source: &mut impl Read) -> Result<(Base, u32)> {
    let mut header = [0_u8; 16];
    source.read_exact(&mut header).map_err(|_| {
        Error::ContainerCorruption("truncated header".to_string())
    })?;
    if header[..8] != MAGIC[..] {
        return Err(Error::ContainerCorruption("magic mismatch".to_string()));
    }
    if header[8] != BINARY_VERSION {
        return Err(Error::ContainerCorruption(format!(
            "unsupported version {}",
            header[8]
        )));
    }
    let base = Base::new(header[9], header[10], header[11]).map_err(|_| {
        Error::ContainerCorruption(format!(
            "base ({}, {}, {}) out of domain",
            header[9], header[10], header[11]
        ))
    })?;
    let nb_codes = u32::from_be_bytes(header[12..16].try_into().unwrap());
    Ok((base, nb_codes))
}

/// Stream-like binary writer. Codes are buffered into runs of equal byte
/// width and flushed one segment at a time; the total count at offset 12 is
/// back-patched on close.
pub struct BinaryWriter<W> {
    sink: W,
    block: usize,
    written: u32,
    pending: usize,
    runs: Vec<(u8, Vec<BigUint>)>,
}

impl BinaryWriter<File> {
    /// Opens a fresh container at `path`, truncating any previous content.
    ///
    /// # Errors
    ///
    /// Forwards I/O errors.
    pub fn create(path: &Path, base: Base, block: usize) -> Result<Self> {
        Self::new(File::create(path)?, base, block)
    }

    /// Re-opens the container at `path` to append codes to it, stripping
    /// its end-of-stream marker. Falls back to [`Self::create`] when the
    /// file does not exist yet.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContainerCorruption`] when the existing file does
    /// not follow the format or was written for a different base.
    pub fn append(path: &Path, base: Base, block: usize) -> Result<Self> {
        if !path.exists() {
            return Self::create(path, base, block);
        }

        let mut file = OpenOptions::new().read(true).write(true).open(path)?;
        let (found, written) = read_header(&mut file)?;
        if found != base {
            return Err(Error::ContainerCorruption(format!(
                "base {found:?} found where {base:?} was expected"
            )));
        }

        let length = file.seek(SeekFrom::End(0))?;
        if length > 16 {
            file.seek(SeekFrom::End(-1))?;
            let mut marker = [0_u8; 1];
            file.read_exact(&mut marker)?;
            if marker[0] & END_OF_STREAM != 0 {
                file.set_len(length - 1)?;
            }
            file.seek(SeekFrom::End(0))?;
        }

        Ok(Self {
            sink: file,
            block,
            written,
            pending: 0,
            runs: Vec::new(),
        })
    }
}

impl<W: Write + Seek> BinaryWriter<W> {
    /// Prepares a new container on `sink` and writes its header. `block`
    /// is the number of codes buffered per segment; 0 buffers everything
    /// until [`Self::close`].
    ///
    /// # Errors
    ///
    /// Forwards I/O errors.
    pub fn new(mut sink: W, base: Base, block: usize) -> Result<Self> {
        sink.write_all(MAGIC)?;
        sink.write_all(&[BINARY_VERSION, base.height, base.width, base.maximum])?;
        // reserved for the total count
        sink.write_all(&[0_u8; 4])?;

        Ok(Self {
            sink,
            block,
            written: 0,
            pending: 0,
            runs: Vec::new(),
        })
    }

    /// Returns the total number of codes handed to the writer, flushed or
    /// not.
    #[must_use]
    pub fn nb_codes(&self) -> u32 {
        self.written + u32::try_from(self.pending).unwrap()
    }

    /// Buffers `code`, flushing a segment when the block is full.
    ///
    /// # Errors
    ///
    /// Forwards I/O errors.
    pub fn add(&mut self, code: &BigUint) -> Result<()> {
        let width = width_of(code)?;
        match self.runs.last_mut() {
            Some((last, codes)) if *last == width => codes.push(code.clone()),
            _ => self.runs.push((width, vec![code.clone()])),
        }
        self.pending += 1;

        if self.pending == self.block {
            self.flush_segment()?;
        }
        Ok(())
    }

    fn flush_segment(&mut self) -> Result<()> {
        let mut runs = std::mem::take(&mut self.runs);

        while !runs.is_empty() {
            let rest = runs.split_off(runs.len().min(127));

            // structure of the segment
            self.sink.write_all(&[u8::try_from(runs.len()).unwrap()])?;
            for (width, codes) in &runs {
                self.sink.write_all(&[*width])?;
                self.sink
                    .write_all(&u32::try_from(codes.len()).unwrap().to_be_bytes())?;
            }

            // content
            for (width, codes) in &runs {
                for code in codes {
                    let bytes = code.to_bytes_be();
                    let padding = *width as usize - bytes.len();
                    self.sink.write_all(&vec![0_u8; padding])?;
                    self.sink.write_all(&bytes)?;
                    self.written += 1;
                }
            }

            runs = rest;
        }

        self.pending = 0;
        Ok(())
    }

    /// Flushes the remaining codes, writes the end-of-stream marker,
    /// back-patches the total count and returns the underlying sink.
    ///
    /// # Errors
    ///
    /// Forwards I/O errors.
    pub fn close(mut self) -> Result<W> {
        if self.pending != 0 {
            self.flush_segment()?;
        }

        self.sink.write_all(&[END_OF_STREAM])?;
        self.sink.seek(SeekFrom::Start(12))?;
        self.sink.write_all(&self.written.to_be_bytes())?;
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// Lazy reader over a binary container.
pub struct BinaryReader<R> {
    source: R,
    base: Base,
    nb_codes: u32,
    queue: VecDeque<(u8, u32)>,
    finished: bool,
}

impl<R: Read> BinaryReader<R> {
    /// Checks the header of `source` and prepares the iteration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContainerCorruption`] on a foreign or truncated
    /// header.
    pub fn new(mut source: R) -> Result<Self> {
        let (base, nb_codes) = read_header(&mut source)?;
        Ok(Self {
            source,
            base,
            nb_codes,
            queue: VecDeque::new(),
            finished: false,
        })
    }

    /// Base shared by all the codes of the stream.
    #[must_use]
    pub const fn base(&self) -> Base {
        self.base
    }

    /// Total number of codes, as recorded in the header.
    #[must_use]
    pub const fn nb_codes(&self) -> u32 {
        self.nb_codes
    }

    fn load(&mut self) -> Result<()> {
        let mut byte = [0_u8; 1];
        match self.source.read_exact(&mut byte) {
            Err(error) if error.kind() == ErrorKind::UnexpectedEof => {
                warn!("stream without end marker, assuming it is complete");
                self.finished = true;
                return Ok(());
            }
            other => other?,
        }

        if byte[0] & END_OF_STREAM != 0 {
            self.finished = true;
            return Ok(());
        }

        for _ in 0..byte[0] {
            let mut pair = [0_u8; 5];
            self.source.read_exact(&mut pair).map_err(|_| {
                Error::ContainerCorruption("truncated segment structure".to_string())
            })?;
            self.queue
                .push_back((pair[0], u32::from_be_bytes(pair[1..5].try_into().unwrap())));
        }
        Ok(())
    }
}

impl<R: Read> Iterator for BinaryReader<R> {
    type Item = Result<BigUint>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if self.finished {
                return None;
            }

            match self.queue.front_mut() {
                Some((_, 0)) => {
                    self.queue.pop_front();
                }
                Some((width, count)) => {
                    let mut bytes = vec![0_u8; *width as usize];
                    if let Err(error) = self.source.read_exact(&mut bytes) {
                        self.finished = true;
                        return Some(Err(Error::ContainerCorruption(format!(
                            "truncated segment content: {error}"
                        ))));
                    }
                    *count -= 1;
                    return Some(Ok(BigUint::from_bytes_be(&bytes)));
                }
                None => {
                    if let Err(error) = self.load() {
                        self.finished = true;
                        return Some(Err(error));
                    }
                }
            }
        }
    }
}

/// Writer for the plain text format.
pub struct TextWriter<W> {
    sink: W,
    count_offset: u64,
    nb_codes: u32,
}

impl TextWriter<File> {
    /// Opens a fresh text container at `path`.
    ///
    /// # Errors
    ///
    /// Forwards I/O errors.
    pub fn create(path: &Path, base: Base) -> Result<Self> {
        Self::new(File::create(path)?, base)
    }
}

impl<W: Write + Seek> TextWriter<W> {
    /// Prepares a new text container on `sink` and writes its header.
    ///
    /// # Errors
    ///
    /// Forwards I/O errors.
    pub fn new(mut sink: W, base: Base) -> Result<Self> {
        sink.write_all(MAGIC)?;
        sink.write_all(&[TEXT_VERSION, b'\n'])?;
        writeln!(sink, "{}", base.height)?;
        writeln!(sink, "{}", base.width)?;
        writeln!(sink, "{}", base.maximum)?;

        let count_offset = sink.stream_position()?;
        // reserved for the total count
        writeln!(sink, "{:<10}", 0)?;

        Ok(Self {
            sink,
            count_offset,
            nb_codes: 0,
        })
    }

    /// Returns the number of codes written so far.
    #[must_use]
    pub const fn nb_codes(&self) -> u32 {
        self.nb_codes
    }

    /// Appends one code, in decimal.
    ///
    /// # Errors
    ///
    /// Forwards I/O errors.
    pub fn add(&mut self, code: &BigUint) -> Result<()> {
        writeln!(self.sink, "{code}")?;
        self.nb_codes += 1;
        Ok(())
    }

    /// Writes the `-1` terminator, back-patches the total count and returns
    /// the underlying sink.
    ///
    /// # Errors
    ///
    /// Forwards I/O errors.
    pub fn close(mut self) -> Result<W> {
        writeln!(self.sink, "-1")?;
        self.sink.seek(SeekFrom::Start(self.count_offset))?;
        write!(self.sink, "{:<10}", self.nb_codes)?;
        self.sink.flush()?;
        Ok(self.sink)
    }
}

/// Lazy reader over a text container.
pub struct TextReader<R> {
    source: R,
    base: Base,
    nb_codes: u32,
    finished: bool,
}

impl<R: BufRead> TextReader<R> {
    /// Checks the header of `source` and prepares the iteration.
    ///
    /// # Errors
    ///
    /// Returns [`Error::ContainerCorruption`] on a foreign or truncated
    /// header.
    pub fn new(mut source: R) -> Result<Self> {
        let mut line = String::new();

        let mut read_line = |source: &mut R, line: &mut String| -> Result<()> {
            line.clear();
            if source.read_line(line)? == 0 {
                return Err(Error::ContainerCorruption("truncated header".to_string()));
            }
            Ok(())
        };

        read_line(&mut source, &mut line)?;
        if line.as_bytes() != b"TECTONIC\x00\n" {
            return Err(Error::ContainerCorruption("magic mismatch".to_string()));
        }

        let mut dimensions = [0_u8; 3];
        for dimension in &mut dimensions {
            read_line(&mut source, &mut line)?;
            *dimension = line.trim().parse().map_err(|_| {
                Error::ContainerCorruption(format!("invalid dimension line {line:?}"))
            })?;
        }
        let base = Base::new(dimensions[0], dimensions[1], dimensions[2]).map_err(|_| {
            Error::ContainerCorruption(format!("base {dimensions:?} out of domain"))
        })?;

        read_line(&mut source, &mut line)?;
        let nb_codes = line.trim().parse().map_err(|_| {
            Error::ContainerCorruption(format!("invalid count line {line:?}"))
        })?;

        Ok(Self {
            source,
            base,
            nb_codes,
            finished: false,
        })
    }

    /// Base shared by all the codes of the stream.
    #[must_use]
    pub const fn base(&self) -> Base {
        self.base
    }

    /// Total number of codes, as recorded in the header.
    #[must_use]
    pub const fn nb_codes(&self) -> u32 {
        self.nb_codes
    }
}

impl<R: BufRead> Iterator for TextReader<R> {
    type Item = Result<BigUint>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.finished {
            return None;
        }

        let mut line = String::new();
        match self.source.read_line(&mut line) {
            Err(error) => {
                self.finished = true;
                Some(Err(error.into()))
            }
            Ok(0) => {
                warn!("stream without end marker, assuming it is complete");
                self.finished = true;
                None
            }
            Ok(_) => {
                let line = line.trim();
                if line == "-1" {
                    self.finished = true;
                    None
                } else {
                    match BigUint::from_str(line) {
                        Ok(code) => Some(Ok(code)),
                        Err(_) => {
                            self.finished = true;
                            Some(Err(Error::ContainerCorruption(format!(
                                "invalid code line {line:?}"
                            ))))
                        }
                    }
                }
            }
        }
    }
}

/// Reader over any recognised container format.
pub enum Reader {
    /// Binary "format 001".
    Binary(BinaryReader<BufReader<File>>),
    /// Text "format 000".
    Text(TextReader<BufReader<File>>),
}

impl Reader {
    /// Base shared by all the codes of the stream.
    #[must_use]
    pub const fn base(&self) -> Base {
        match self {
            Self::Binary(reader) => reader.base(),
            Self::Text(reader) => reader.base(),
        }
    }

    /// Total number of codes, as recorded in the header.
    #[must_use]
    pub const fn nb_codes(&self) -> u32 {
        match self {
            Self::Binary(reader) => reader.nb_codes(),
            Self::Text(reader) => reader.nb_codes(),
        }
    }
}

impl Iterator for Reader {
    type Item = Result<BigUint>;

    fn next(&mut self) -> Option<Self::Item> {
        match self {
            Self::Binary(reader) => reader.next(),
            Self::Text(reader) => reader.next(),
        }
    }
}

/// Opens the container at `path` with the reader its version byte calls
/// for.
///
/// # Errors
///
/// Returns [`Error::ContainerCorruption`] when the file is not a container
/// of a known version.
pub fn open(path: &Path) -> Result<Reader> {
    let mut source = BufReader::new(File::open(path)?);

    let mut prelude = [0_u8; 9];
    source.read_exact(&mut prelude).map_err(|_| {
        Error::ContainerCorruption("truncated prelude".to_string())
    })?;
    if prelude[..8] != MAGIC[..] {
        return Err(Error::ContainerCorruption("magic mismatch".to_string()));
    }
    source.seek(SeekFrom::Start(0))?;

    match prelude[8] {
        TEXT_VERSION => Ok(Reader::Text(TextReader::new(source)?)),
        BINARY_VERSION => Ok(Reader::Binary(BinaryReader::new(source)?)),
        version => Err(Error::ContainerCorruption(format!(
            "unsupported version {version}"
        ))),
    }
}

/// One segment of a binary container, as laid out on disk.
#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Segment {
    /// Offset of the segment structure within the file.
    pub offset: u64,
    /// (width, count) pairs of the segment.
    pub pairs: Vec<(u8, u32)>,
}

impl Segment {
    /// Offset of the first code of the segment.
    #[must_use]
    pub fn content(&self) -> u64 {
        self.offset + 1 + 5 * self.pairs.len() as u64
    }

    /// Offset of the first byte after the segment.
    #[must_use]
    pub fn end(&self) -> u64 {
        self.content()
            + self
                .pairs
                .iter()
                .map(|&(width, count)| u64::from(width) * u64::from(count))
                .sum::<u64>()
    }

    /// Iterates over the (offset, count) spans holding codes of the given
    /// width.
    fn spans(&self, width: u8) -> impl Iterator<Item = (u64, u32)> + '_ {
        let mut offset = self.content();
        self.pairs.iter().filter_map(move |&(w, count)| {
            let span = (offset, count);
            offset += u64::from(w) * u64::from(count);
            (w == width).then_some(span)
        })
    }
}

/// Maps the segments of the binary container at `path`.
///
/// # Errors
///
/// Returns [`Error::ContainerCorruption`] when the file is not a binary
/// container or a segment structure is truncated.
pub fn map_segments(path: &Path) -> Result<Vec<Segment>> {
    let mut source = BufReader::new(File::open(path)?);
    read_header(&mut source)?;

    let mut segments = Vec::new();
    let mut offset = 16_u64;
    loop {
        let mut byte = [0_u8; 1];
        match source.read_exact(&mut byte) {
            Err(error) if error.kind() == ErrorKind::UnexpectedEof => {
                warn!("stream without end marker, assuming it is complete");
                break;
            }
            other => other.map_err(Error::Io)?,
        }
        if byte[0] & END_OF_STREAM != 0 {
            break;
        }

        let mut pairs = Vec::with_capacity(byte[0] as usize);
        for _ in 0..byte[0] {
            let mut pair = [0_u8; 5];
            source.read_exact(&mut pair).map_err(|_| {
                Error::ContainerCorruption("truncated segment structure".to_string())
            })?;
            pairs.push((pair[0], u32::from_be_bytes(pair[1..5].try_into().unwrap())));
        }

        let segment = Segment { offset, pairs };
        offset = segment.end();
        source.seek(SeekFrom::Start(offset))?;
        segments.push(segment);
    }

    Ok(segments)
}

/// Rewrites the binary container at `input` with its counts aggregated per
/// byte width, codes grouped by increasing width. Within one width the
/// original order is preserved.
///
/// # Errors
///
/// Forwards mapping and I/O errors.
pub fn compact(input: &Path, output: &Path) -> Result<()> {
    let segments = map_segments(input)?;

    let mut totals: Vec<(u8, u32)> = Vec::new();
    for segment in &segments {
        for &(width, count) in &segment.pairs {
            match totals.binary_search_by_key(&width, |&(w, _)| w) {
                Ok(found) => totals[found].1 += count,
                Err(slot) => totals.insert(slot, (width, count)),
            }
        }
    }

    let mut source = File::open(input)?;
    let mut sink = File::create(output)?;

    // header, total count included
    let mut header = [0_u8; 16];
    source.read_exact(&mut header)?;
    sink.write_all(&header)?;

    // structure, then content width by width
    let mut remaining = &totals[..];
    while !remaining.is_empty() {
        let (chunk, rest) = remaining.split_at(remaining.len().min(127));

        sink.write_all(&[u8::try_from(chunk.len()).unwrap()])?;
        for &(width, count) in chunk {
            sink.write_all(&[width])?;
            sink.write_all(&count.to_be_bytes())?;
        }

        for &(width, _) in chunk {
            for segment in &segments {
                for (offset, count) in segment.spans(width) {
                    source.seek(SeekFrom::Start(offset))?;
                    let mut bytes = vec![0_u8; u64::from(width) as usize * count as usize];
                    source.read_exact(&mut bytes)?;
                    sink.write_all(&bytes)?;
                }
            }
        }

        remaining = rest;
    }

    sink.write_all(&[END_OF_STREAM])?;
    Ok(())
}
