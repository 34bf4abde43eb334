use crate::schema;
use serde::Serialize;
use std::fmt;
use std::time::Duration;

const NANOS_PER_SEC: i64 = 1_000_000_000;

/// Point in time, in seconds since the Unix epoch.
///
/// A missing nanosecond part on the wire is read as zero.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct Timestamp {
    pub sec: i64,
    pub nsec: u32,
}

impl Timestamp {
    /// Build a timestamp, carrying nanoseconds outside of `0..1e9` over to the seconds.
    pub fn new(sec: i64, nsec: i64) -> Self {
        Self {
            sec: sec.saturating_add(nsec.div_euclid(NANOS_PER_SEC)),
            nsec: nsec.rem_euclid(NANOS_PER_SEC) as u32,
        }
    }

    pub fn from_secs(sec: i64) -> Self {
        Self { sec, nsec: 0 }
    }

    pub fn as_secs_f64(&self) -> f64 {
        self.sec as f64 + self.nsec as f64 * 1e-9
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.sec < 0 && self.nsec > 0 {
            // -1 s + 5 ns is -0.999999995 s
            let nsec = NANOS_PER_SEC as u32 - self.nsec;
            write!(f, "-{}.{nsec:09}", -(self.sec + 1))
        } else {
            write!(f, "{}.{:09}", self.sec, self.nsec)
        }
    }
}

impl From<&schema::Timespec> for Timestamp {
    fn from(ts: &schema::Timespec) -> Self {
        Timestamp::new(ts.sec, ts.nsec.unwrap_or(0) as i64)
    }
}

impl From<Timestamp> for schema::Timespec {
    fn from(ts: Timestamp) -> Self {
        schema::Timespec {
            sec: ts.sec,
            nsec: Some(ts.nsec as i32),
        }
    }
}

fn duration_from_timespec(ts: &schema::Timespec) -> Result<Duration, String> {
    let nsec = ts.nsec.unwrap_or(0);
    if ts.sec < 0 || !(0..NANOS_PER_SEC as i32).contains(&nsec) {
        return Err(format!("invalid duration: {} s {} ns", ts.sec, nsec));
    }
    Ok(Duration::new(ts.sec as u64, nsec as u32))
}

fn duration_to_timespec(duration: Duration) -> schema::Timespec {
    schema::Timespec {
        sec: duration.as_secs() as i64,
        nsec: Some(duration.subsec_nanos() as i32),
    }
}

/// A process started (or exec'd) and the preload library ran its constructor.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcBegin {
    pub timestamp: Timestamp,
    pub pid: i32,
    pub ppid: Option<i32>,
    pub exe: Option<String>,
    pub cwd: Option<String>,
    pub cmdline: Option<Vec<String>>,
    pub environ: Option<Vec<String>>,
}

impl ProcBegin {
    /// A begin event carrying only identity information.
    pub fn new(timestamp: Timestamp, pid: i32, ppid: Option<i32>) -> Self {
        Self {
            timestamp,
            pid,
            ppid,
            exe: None,
            cwd: None,
            cmdline: None,
            environ: None,
        }
    }
}

/// A process exited, with its resource usage.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProcEnd {
    pub timestamp: Timestamp,
    pub pid: i32,
    pub cpu_time: Option<Duration>,
    pub user_time: Option<Duration>,
    pub sys_time: Option<Duration>,
    pub max_rss_kb: Option<u64>,
    pub min_flt: Option<u64>,
    pub maj_flt: Option<u64>,
    pub in_block: Option<u64>,
    pub ou_block: Option<u64>,
    pub n_v_csw: Option<u64>,
    pub n_iv_csw: Option<u64>,
}

impl ProcEnd {
    /// An end event without any resource usage.
    pub fn new(timestamp: Timestamp, pid: i32) -> Self {
        Self {
            timestamp,
            pid,
            cpu_time: None,
            user_time: None,
            sys_time: None,
            max_rss_kb: None,
            min_flt: None,
            maj_flt: None,
            in_block: None,
            ou_block: None,
            n_v_csw: None,
            n_iv_csw: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "type")]
pub enum TraceEvent {
    ProcBegin(ProcBegin),
    ProcEnd(ProcEnd),
}

impl TraceEvent {
    pub fn timestamp(&self) -> Timestamp {
        match self {
            TraceEvent::ProcBegin(begin) => begin.timestamp,
            TraceEvent::ProcEnd(end) => end.timestamp,
        }
    }

    pub fn pid(&self) -> i32 {
        match self {
            TraceEvent::ProcBegin(begin) => begin.pid,
            TraceEvent::ProcEnd(end) => end.pid,
        }
    }

    /// Convert a decoded payload into events.
    ///
    /// A payload may carry both a begin and an end (yielded in that order) or neither, in which
    /// case it holds an event kind this crate doesn't know about and yields nothing.
    pub fn from_schema(event: schema::Event) -> Result<Vec<TraceEvent>, String> {
        let timestamp = event
            .timestamp
            .as_ref()
            .map(Timestamp::from)
            .ok_or_else(|| "event has no timestamp".to_string())?;

        let mut events = Vec::with_capacity(1);
        if let Some(begin) = event.proc_begin {
            events.push(TraceEvent::ProcBegin(ProcBegin {
                timestamp,
                pid: begin.pid,
                ppid: begin.ppid,
                exe: begin.exe,
                cwd: begin.cwd,
                cmdline: begin.cmdline.map(|list| list.s),
                environ: begin.environ.map(|list| list.s),
            }));
        }
        if let Some(end) = event.proc_end {
            let duration = |ts: Option<schema::Timespec>| -> Result<Option<Duration>, String> {
                ts.as_ref().map(duration_from_timespec).transpose()
            };
            events.push(TraceEvent::ProcEnd(ProcEnd {
                timestamp,
                pid: end.pid,
                cpu_time: duration(end.cpu_time)?,
                user_time: duration(end.user_time)?,
                sys_time: duration(end.sys_time)?,
                max_rss_kb: end.max_rss_kb,
                min_flt: end.min_flt,
                maj_flt: end.maj_flt,
                in_block: end.in_block,
                ou_block: end.ou_block,
                n_v_csw: end.n_v_csw,
                n_iv_csw: end.n_iv_csw,
            }));
        }
        Ok(events)
    }

    pub fn to_schema(&self) -> schema::Event {
        match self {
            TraceEvent::ProcBegin(begin) => schema::Event {
                timestamp: Some(begin.timestamp.into()),
                proc_begin: Some(schema::ProcBegin {
                    pid: begin.pid,
                    ppid: begin.ppid,
                    exe: begin.exe.clone(),
                    cwd: begin.cwd.clone(),
                    cmdline: begin.cmdline.clone().map(|s| schema::Stringlist { s }),
                    environ: begin.environ.clone().map(|s| schema::Stringlist { s }),
                }),
                proc_end: None,
            },
            TraceEvent::ProcEnd(end) => schema::Event {
                timestamp: Some(end.timestamp.into()),
                proc_begin: None,
                proc_end: Some(schema::ProcEnd {
                    pid: end.pid,
                    cpu_time: end.cpu_time.map(duration_to_timespec),
                    user_time: end.user_time.map(duration_to_timespec),
                    sys_time: end.sys_time.map(duration_to_timespec),
                    max_rss_kb: end.max_rss_kb,
                    min_flt: end.min_flt,
                    maj_flt: end.maj_flt,
                    in_block: end.in_block,
                    ou_block: end.ou_block,
                    n_v_csw: end.n_v_csw,
                    n_iv_csw: end.n_iv_csw,
                }),
            },
        }
    }
}

impl From<ProcBegin> for TraceEvent {
    fn from(begin: ProcBegin) -> Self {
        TraceEvent::ProcBegin(begin)
    }
}

impl From<ProcEnd> for TraceEvent {
    fn from(end: ProcEnd) -> Self {
        TraceEvent::ProcEnd(end)
    }
}
