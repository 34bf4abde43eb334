use super::ProcId;
use crate::event::Timestamp;
use serde::Serialize;
use std::collections::BTreeMap;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum EventKind {
    Begin,
    End,
}

/// An event of the trace, attributed to the process it was resolved to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct TimelineEntry {
    pub kind: EventKind,
    pub proc_id: ProcId,
}

/// All events of a trace indexed by timestamp. Events sharing a timestamp keep their arrival order.
#[derive(Debug, Clone, Default)]
pub struct Timeline {
    events: BTreeMap<Timestamp, Vec<TimelineEntry>>,
    len: usize,
}

impl Timeline {
    pub(crate) fn push(&mut self, timestamp: Timestamp, entry: TimelineEntry) {
        self.events.entry(timestamp).or_default().push(entry);
        self.len += 1;
    }

    /// Events grouped by timestamp, in ascending timestamp order.
    pub fn iter(&self) -> impl Iterator<Item = (Timestamp, &[TimelineEntry])> + '_ {
        self.events.iter().map(|(ts, entries)| (*ts, entries.as_slice()))
    }

    pub fn at(&self, timestamp: Timestamp) -> &[TimelineEntry] {
        self.events.get(&timestamp).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Earliest and latest timestamps of the trace.
    pub fn span(&self) -> Option<(Timestamp, Timestamp)> {
        let first = self.events.keys().next()?;
        let last = self.events.keys().next_back()?;
        Some((*first, *last))
    }

    /// Number of events, not of distinct timestamps.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }
}
