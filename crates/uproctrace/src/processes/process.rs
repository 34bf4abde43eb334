use crate::event::{ProcBegin, ProcEnd, Timestamp};
use serde::Serialize;
use std::fmt;
use std::time::Duration;

/// Identity of a process within one reconstructed trace.
///
/// Assigned densely in creation order and never reused, unlike OS pids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct ProcId(pub usize);

impl ProcId {
    pub fn index(self) -> usize {
        self.0
    }
}

impl fmt::Display for ProcId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        self.0.fmt(f)
    }
}

/// A process reconstructed from a trace.
///
/// Either record may be missing when the lifetime of the process was clipped by the trace
/// boundaries. All accessors return `None` in that case.
#[derive(Debug, Clone, Serialize)]
pub struct Process {
    proc_id: ProcId,
    pid: i32,
    begin: Option<ProcBegin>,
    end: Option<ProcEnd>,
    parent: Option<ProcId>,
    children: Vec<ProcId>,
}

impl Process {
    pub(crate) fn new(proc_id: ProcId, pid: i32) -> Self {
        Self {
            proc_id,
            pid,
            begin: None,
            end: None,
            parent: None,
            children: Vec::new(),
        }
    }

    pub(crate) fn set_begin(&mut self, begin: ProcBegin) {
        self.begin = Some(begin);
    }

    pub(crate) fn set_end(&mut self, end: ProcEnd) {
        self.end = Some(end);
    }

    pub(crate) fn set_parent(&mut self, parent: Option<ProcId>) {
        self.parent = parent;
    }

    pub(crate) fn add_child(&mut self, child: ProcId) {
        self.children.push(child);
    }

    pub(crate) fn remove_child(&mut self, child: ProcId) {
        self.children.retain(|&c| c != child);
    }

    pub fn proc_id(&self) -> ProcId {
        self.proc_id
    }

    pub fn pid(&self) -> i32 {
        self.pid
    }

    pub fn begin(&self) -> Option<&ProcBegin> {
        self.begin.as_ref()
    }

    pub fn end(&self) -> Option<&ProcEnd> {
        self.end.as_ref()
    }

    /// Parent process, to be resolved with [`super::Processes::get`].
    pub fn parent(&self) -> Option<ProcId> {
        self.parent
    }

    /// Child processes in the order they were attached.
    pub fn children(&self) -> &[ProcId] {
        &self.children
    }

    /// Created to stand in for a parent whose own events haven't been seen.
    pub fn is_placeholder(&self) -> bool {
        self.begin.is_none() && self.end.is_none()
    }

    /// Both the begin and the end of the process are part of the trace.
    pub fn is_complete(&self) -> bool {
        self.begin.is_some() && self.end.is_some()
    }

    pub fn begin_timestamp(&self) -> Option<Timestamp> {
        self.begin.as_ref().map(|b| b.timestamp)
    }

    pub fn end_timestamp(&self) -> Option<Timestamp> {
        self.end.as_ref().map(|e| e.timestamp)
    }

    /// OS parent pid, as reported by the process itself.
    pub fn ppid(&self) -> Option<i32> {
        self.begin.as_ref()?.ppid
    }

    pub fn exe(&self) -> Option<&str> {
        self.begin.as_ref()?.exe.as_deref()
    }

    pub fn cwd(&self) -> Option<&str> {
        self.begin.as_ref()?.cwd.as_deref()
    }

    pub fn cmdline(&self) -> Option<&[String]> {
        self.begin.as_ref()?.cmdline.as_deref()
    }

    pub fn environ(&self) -> Option<&[String]> {
        self.begin.as_ref()?.environ.as_deref()
    }

    pub fn cpu_time(&self) -> Option<Duration> {
        self.end.as_ref()?.cpu_time
    }

    pub fn user_time(&self) -> Option<Duration> {
        self.end.as_ref()?.user_time
    }

    pub fn sys_time(&self) -> Option<Duration> {
        self.end.as_ref()?.sys_time
    }

    /// Maximum resident set size, in KiB.
    pub fn max_rss_kb(&self) -> Option<u64> {
        self.end.as_ref()?.max_rss_kb
    }

    pub fn min_flt(&self) -> Option<u64> {
        self.end.as_ref()?.min_flt
    }

    pub fn maj_flt(&self) -> Option<u64> {
        self.end.as_ref()?.maj_flt
    }

    pub fn in_block(&self) -> Option<u64> {
        self.end.as_ref()?.in_block
    }

    pub fn ou_block(&self) -> Option<u64> {
        self.end.as_ref()?.ou_block
    }

    pub fn n_v_csw(&self) -> Option<u64> {
        self.end.as_ref()?.n_v_csw
    }

    pub fn n_iv_csw(&self) -> Option<u64> {
        self.end.as_ref()?.n_iv_csw
    }
}
