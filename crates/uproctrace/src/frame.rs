use crate::error::{DecodeError, EncodeError};
use crate::event::TraceEvent;
use crate::schema;
use log::{debug, warn};
use prost::Message;
use std::collections::VecDeque;
use std::io::{self, BufReader, Read, Write};

/// Marker preceding every frame.
pub const MAGIC: [u8; 4] = *b"upt0";

/// What the reader does when a frame payload cannot be decoded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum MalformedPolicy {
    /// Yield the error and stop reading.
    #[default]
    Abort,
    /// Skip the frame and look for the next marker right after the bad frame's marker.
    Resync,
}

#[derive(Debug, Clone, Copy, Default)]
pub struct DecodeOptions {
    pub malformed: MalformedPolicy,
}

/// Lazily decodes the events of a trace.
///
/// The reader scans byte by byte for [`MAGIC`], so garbage before or between frames is skipped.
/// A frame cut short by the end of the stream ends the iteration without an error. Once `None` or
/// an error has been returned, the iterator is exhausted.
pub struct FrameReader<R: Read> {
    reader: BufReader<R>,
    options: DecodeOptions,
    /// Bytes of a skipped frame that must be scanned again before reading further.
    rescan: VecDeque<u8>,
    queued: VecDeque<TraceEvent>,
    frames_decoded: u64,
    frames_skipped: u64,
    done: bool,
}

impl<R: Read> FrameReader<R> {
    pub fn new(reader: R) -> Self {
        Self::with_options(reader, DecodeOptions::default())
    }

    pub fn with_options(reader: R, options: DecodeOptions) -> Self {
        Self {
            reader: BufReader::new(reader),
            options,
            rescan: VecDeque::new(),
            queued: VecDeque::new(),
            frames_decoded: 0,
            frames_skipped: 0,
            done: false,
        }
    }

    /// Number of frames whose payload was decoded.
    pub fn frames_decoded(&self) -> u64 {
        self.frames_decoded
    }

    /// Number of malformed frames skipped with [`MalformedPolicy::Resync`].
    pub fn frames_skipped(&self) -> u64 {
        self.frames_skipped
    }

    fn read_byte(&mut self) -> io::Result<Option<u8>> {
        if let Some(byte) = self.rescan.pop_front() {
            return Ok(Some(byte));
        }

        let mut buf = [0u8; 1];
        loop {
            match self.reader.read(&mut buf) {
                Ok(0) => return Ok(None),
                Ok(_) => return Ok(Some(buf[0])),
                Err(e) if e.kind() == io::ErrorKind::Interrupted => continue,
                Err(e) => return Err(e),
            }
        }
    }

    /// Read up to `n` bytes. Fewer bytes are returned only at the end of the stream.
    fn read_up_to(&mut self, n: usize) -> io::Result<Vec<u8>> {
        let from_rescan = n.min(self.rescan.len());
        let mut buf: Vec<u8> = self.rescan.drain(..from_rescan).collect();

        // The length comes from the trace itself, so don't trust it for the allocation.
        let remaining = (n - from_rescan) as u64;
        (&mut self.reader).take(remaining).read_to_end(&mut buf)?;
        Ok(buf)
    }

    /// Advance until the last four bytes read are the magic marker.
    /// Returns `false` if the stream ends first.
    fn sync(&mut self) -> io::Result<bool> {
        let mut window = [0u8; 4];
        let mut filled = 0;
        while let Some(byte) = self.read_byte()? {
            window.copy_within(1.., 0);
            window[3] = byte;
            filled = (filled + 1).min(window.len());
            if filled == window.len() && window == MAGIC {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Read the next complete frame, as its length field and payload.
    ///
    /// With [`MalformedPolicy::Resync`], a frame whose length runs past the end of the stream is
    /// skipped and its bytes are scanned again, as its length field may be the corrupted part.
    fn read_frame(&mut self) -> io::Result<Option<([u8; 4], Vec<u8>)>> {
        loop {
            if !self.sync()? {
                return Ok(None);
            }

            let Ok(header) = <[u8; 4]>::try_from(self.read_up_to(4)?) else {
                debug!("Trace ends within a frame header");
                return Ok(None);
            };

            let size = u32::from_be_bytes(header) as usize;
            let payload = self.read_up_to(size)?;
            if payload.len() == size {
                return Ok(Some((header, payload)));
            }

            let frame = self.frames_decoded + self.frames_skipped;
            match self.options.malformed {
                MalformedPolicy::Abort => {
                    debug!(
                        "Trace ends within a frame payload ({} of {size} bytes)",
                        payload.len()
                    );
                    return Ok(None);
                }
                MalformedPolicy::Resync => {
                    warn!(
                        "Frame #{frame} claims {size} bytes but only {} are left, rescanning them",
                        payload.len()
                    );
                    self.frames_skipped += 1;
                    self.push_back(header, payload);
                }
            }
        }
    }

    /// Queue the bytes following a frame marker to be scanned again.
    fn push_back(&mut self, header: [u8; 4], payload: Vec<u8>) {
        for byte in header.into_iter().chain(payload).rev() {
            self.rescan.push_front(byte);
        }
    }

    /// Decode the next frame into `self.queued`. Returns `false` at the end of the trace.
    fn decode_next_frame(&mut self) -> Result<bool, DecodeError> {
        let Some((header, payload)) = self.read_frame()? else {
            return Ok(false);
        };
        let frame = self.frames_decoded + self.frames_skipped;

        let decoded = schema::Event::decode(payload.as_slice())
            .map_err(|e| e.to_string())
            .and_then(TraceEvent::from_schema);

        match decoded {
            Ok(events) => {
                self.frames_decoded += 1;
                if events.is_empty() {
                    debug!("Frame #{frame} holds no known event, ignoring it");
                }
                self.queued.extend(events);
                Ok(true)
            }
            Err(reason) => match self.options.malformed {
                MalformedPolicy::Abort => Err(DecodeError::Malformed { frame, reason }),
                MalformedPolicy::Resync => {
                    warn!("Skipping malformed frame #{frame}: {reason}");
                    self.frames_skipped += 1;
                    self.push_back(header, payload);
                    Ok(true)
                }
            },
        }
    }
}

impl<R: Read> Iterator for FrameReader<R> {
    type Item = Result<TraceEvent, DecodeError>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            if let Some(event) = self.queued.pop_front() {
                return Some(Ok(event));
            }
            if self.done {
                return None;
            }

            match self.decode_next_frame() {
                Ok(true) => continue,
                Ok(false) => self.done = true,
                Err(e) => {
                    self.done = true;
                    return Some(Err(e));
                }
            }
        }
    }
}

impl<R: Read> std::iter::FusedIterator for FrameReader<R> {}

/// Writes events in the trace format, one frame per event.
pub struct FrameWriter<W: Write> {
    writer: W,
}

impl<W: Write> FrameWriter<W> {
    pub fn new(writer: W) -> Self {
        Self { writer }
    }

    pub fn write_event(&mut self, event: &TraceEvent) -> Result<(), EncodeError> {
        self.write_payload(&event.to_schema().encode_to_vec())
    }

    /// Frame an already encoded payload.
    pub fn write_payload(&mut self, payload: &[u8]) -> Result<(), EncodeError> {
        let size =
            u32::try_from(payload.len()).map_err(|_| EncodeError::PayloadTooLarge(payload.len()))?;

        self.writer.write_all(&MAGIC)?;
        self.writer.write_all(&size.to_be_bytes())?;
        self.writer.write_all(payload)?;
        Ok(())
    }

    pub fn finish(mut self) -> Result<W, EncodeError> {
        self.writer.flush()?;
        Ok(self.writer)
    }
}
