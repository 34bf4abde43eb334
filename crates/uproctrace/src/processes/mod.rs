use crate::error::DecodeError;
use crate::event::{ProcBegin, ProcEnd, TraceEvent};
use crate::frame::{DecodeOptions, FrameReader};
use log::debug;
use serde::Serialize;
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

mod process;
mod timeline;

pub use process::{ProcId, Process};
pub use timeline::{EventKind, Timeline, TimelineEntry};

/// Irregularities of the trace that were resolved while building the process tree.
///
/// Traces are routinely partial, so none of these are errors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Anomalies {
    /// End events for a pid without a live process.
    pub orphan_ends: u64,
    /// Processes fabricated for a parent pid that wasn't live.
    pub parent_placeholders: u64,
    /// Begin events for a pid whose live process had not ended (e.g. after `exec`).
    pub live_overwrites: u64,
    /// Parent links dropped because they would have created a cycle.
    pub rejected_links: u64,
}

/// Builds the process forest from trace events, in trace order.
///
/// The forest is consistent after every processed event, so [`ProcessesBuilder::finish`] may be
/// called at any point.
#[derive(Debug, Default)]
pub struct ProcessesBuilder {
    processes: Vec<Process>,
    /// Maps the pid of every running process to its identity
    live: HashMap<i32, ProcId>,
    toplevel: BTreeSet<ProcId>,
    timeline: Timeline,
    anomalies: Anomalies,
}

impl ProcessesBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fold an event into the process forest
    pub fn process_event(&mut self, event: TraceEvent) {
        let timestamp = event.timestamp();
        let entry = match event {
            TraceEvent::ProcBegin(begin) => TimelineEntry {
                kind: EventKind::Begin,
                proc_id: self.on_begin(begin),
            },
            TraceEvent::ProcEnd(end) => TimelineEntry {
                kind: EventKind::End,
                proc_id: self.on_end(end),
            },
        };
        self.timeline.push(timestamp, entry);
    }

    fn on_begin(&mut self, begin: ProcBegin) -> ProcId {
        let pid = begin.pid;
        let ppid = begin.ppid;

        // A placeholder created for a parent gets its begin filled in rather than a new identity.
        let proc_id = match self.live.get(&pid).copied() {
            Some(live_id) if self.processes[live_id.index()].is_placeholder() => live_id,
            previous => {
                if let Some(previous) = previous {
                    debug!("pid {pid} began again while {previous} is still running");
                    self.anomalies.live_overwrites += 1;
                }
                let proc_id = self.create(pid);
                self.live.insert(pid, proc_id);
                proc_id
            }
        };
        self.processes[proc_id.index()].set_begin(begin);

        if let Some(ppid) = ppid {
            let parent_id = match self.live.get(&ppid).copied() {
                Some(parent_id) => parent_id,
                None => {
                    let parent_id = self.create(ppid);
                    self.live.insert(ppid, parent_id);
                    self.anomalies.parent_placeholders += 1;
                    parent_id
                }
            };
            self.link(proc_id, parent_id);
        }

        proc_id
    }

    fn on_end(&mut self, end: ProcEnd) -> ProcId {
        let pid = end.pid;
        let proc_id = match self.live.remove(&pid) {
            Some(proc_id) => proc_id,
            None => {
                // Began before the trace did.
                self.anomalies.orphan_ends += 1;
                self.create(pid)
            }
        };
        self.processes[proc_id.index()].set_end(end);
        proc_id
    }

    /// Allocate a new toplevel process
    fn create(&mut self, pid: i32) -> ProcId {
        let proc_id = ProcId(self.processes.len());
        self.processes.push(Process::new(proc_id, pid));
        self.toplevel.insert(proc_id);
        proc_id
    }

    fn is_ancestor(&self, ancestor: ProcId, of: ProcId) -> bool {
        let mut current = Some(of);
        while let Some(proc_id) = current {
            if proc_id == ancestor {
                return true;
            }
            current = self.processes[proc_id.index()].parent();
        }
        false
    }

    /// Make `parent` the parent of `child`, detaching it from a previous parent.
    fn link(&mut self, child: ProcId, parent: ProcId) {
        if self.is_ancestor(child, parent) {
            debug!("Not linking {child} below {parent}: it would create a cycle");
            self.anomalies.rejected_links += 1;
            return;
        }

        if let Some(previous) = self.processes[child.index()].parent() {
            self.processes[previous.index()].remove_child(child);
        }
        self.processes[child.index()].set_parent(Some(parent));
        self.processes[parent.index()].add_child(child);
        self.toplevel.remove(&child);
    }

    /// Number of processes created so far
    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }

    pub fn finish(self) -> Processes {
        debug!(
            "Reconstructed {} processes ({} toplevel, {} still running) from {} events",
            self.processes.len(),
            self.toplevel.len(),
            self.live.len(),
            self.timeline.len()
        );
        if self.anomalies != Anomalies::default() {
            debug!("Trace anomalies: {:?}", self.anomalies);
        }

        Processes {
            processes: self.processes,
            toplevel: self.toplevel,
            timeline: self.timeline,
            anomalies: self.anomalies,
        }
    }
}

/// All processes of a trace, with their ancestry and the timeline of their events.
#[derive(Debug, Clone)]
pub struct Processes {
    processes: Vec<Process>,
    toplevel: BTreeSet<ProcId>,
    timeline: Timeline,
    anomalies: Anomalies,
}

impl Processes {
    pub fn from_events<I: IntoIterator<Item = TraceEvent>>(events: I) -> Self {
        let mut builder = ProcessesBuilder::new();
        for event in events {
            builder.process_event(event);
        }
        builder.finish()
    }

    pub fn from_reader<R: Read>(reader: R) -> Result<Self, DecodeError> {
        Self::from_reader_with_options(reader, DecodeOptions::default())
    }

    pub fn from_reader_with_options<R: Read>(
        reader: R,
        options: DecodeOptions,
    ) -> Result<Self, DecodeError> {
        let mut builder = ProcessesBuilder::new();
        for event in FrameReader::with_options(reader, options) {
            builder.process_event(event?);
        }
        Ok(builder.finish())
    }

    pub fn from_path<P: AsRef<Path>>(path: P) -> Result<Self, DecodeError> {
        Self::from_path_with_options(path, DecodeOptions::default())
    }

    pub fn from_path_with_options<P: AsRef<Path>>(
        path: P,
        options: DecodeOptions,
    ) -> Result<Self, DecodeError> {
        let file = std::fs::File::open(path.as_ref())?;
        debug!("Reading trace {}", path.as_ref().display());
        Self::from_reader_with_options(file, options)
    }

    /// Processes without a parent, in creation order.
    pub fn toplevel(&self) -> impl Iterator<Item = &Process> + '_ {
        self.toplevel.iter().map(|id| &self.processes[id.index()])
    }

    pub fn get(&self, proc_id: ProcId) -> Option<&Process> {
        self.processes.get(proc_id.index())
    }

    /// All processes, indexed by [`ProcId`].
    pub fn all(&self) -> &[Process] {
        &self.processes
    }

    /// Every process that ran with the given OS pid, in creation order.
    pub fn by_pid(&self, pid: i32) -> impl Iterator<Item = &Process> + '_ {
        self.processes.iter().filter(move |p| p.pid() == pid)
    }

    pub fn parent(&self, process: &Process) -> Option<&Process> {
        self.get(process.parent()?)
    }

    pub fn children<'a>(&'a self, process: &'a Process) -> impl Iterator<Item = &'a Process> + 'a {
        process
            .children()
            .iter()
            .map(|id| &self.processes[id.index()])
    }

    pub fn timeline(&self) -> &Timeline {
        &self.timeline
    }

    pub fn anomalies(&self) -> &Anomalies {
        &self.anomalies
    }

    pub fn len(&self) -> usize {
        self.processes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.processes.is_empty()
    }
}
