//! Decoding of uproctrace trace files and reconstruction of the traced process tree.
//!
//! A trace is an append-only sequence of frames written by the preload library of every
//! traced process:
//!
//! | Size | Field                                   |
//! |------|-----------------------------------------|
//! | 4    | Magic marker `upt0`                     |
//! | 4    | Payload length (big-endian `u32`)       |
//! | N    | Protobuf encoded [`schema::Event`]      |
//!
//! Frames are read with [`FrameReader`] and folded into a [`Processes`] forest:
//!
//! ```no_run
//! use uproctrace::Processes;
//!
//! let processes = Processes::from_path("trace.upt")?;
//! for process in processes.toplevel() {
//!     println!("{} {:?}", process.pid(), process.cmdline());
//! }
//! # Ok::<(), uproctrace::DecodeError>(())
//! ```

pub mod error;
pub mod event;
pub mod frame;
pub mod processes;
pub mod schema;
pub mod stats;

pub use error::{DecodeError, EncodeError};
pub use event::{ProcBegin, ProcEnd, Timestamp, TraceEvent};
pub use frame::{DecodeOptions, FrameReader, FrameWriter, MAGIC, MalformedPolicy};
pub use processes::{
    Anomalies, EventKind, ProcId, Process, Processes, ProcessesBuilder, Timeline, TimelineEntry,
};
pub use stats::{AttributeStats, ProcessAttribute, TraceStats};
