#![allow(dead_code, unused)]

use std::time::Duration;
use uproctrace::{FrameWriter, ProcBegin, ProcEnd, Process, Processes, Timestamp, TraceEvent};

/// Builds trace bytes the way the preload library writes them.
#[derive(Default)]
pub struct TraceBuilder {
    bytes: Vec<u8>,
    /// Byte offset right after every complete frame
    frame_ends: Vec<usize>,
}

impl TraceBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn event(mut self, event: impl Into<TraceEvent>) -> Self {
        let mut writer = FrameWriter::new(&mut self.bytes);
        writer.write_event(&event.into()).unwrap();
        self.frame_ends.push(self.bytes.len());
        self
    }

    pub fn begin(self, ts: i64, pid: i32, ppid: Option<i32>, cmdline: &[&str]) -> Self {
        let mut begin = ProcBegin::new(Timestamp::from_secs(ts), pid, ppid);
        if !cmdline.is_empty() {
            begin.cmdline = Some(cmdline.iter().map(|s| s.to_string()).collect());
        }
        self.event(begin)
    }

    pub fn end(self, ts: i64, pid: i32, cpu_time: Option<f64>) -> Self {
        let mut end = ProcEnd::new(Timestamp::from_secs(ts), pid);
        end.cpu_time = cpu_time.map(Duration::from_secs_f64);
        self.event(end)
    }

    /// Bytes that are not part of any frame, as written by a concurrent writer.
    pub fn garbage(mut self, bytes: &[u8]) -> Self {
        self.bytes.extend_from_slice(bytes);
        self
    }

    pub fn frame_ends(&self) -> &[usize] {
        &self.frame_ends
    }

    pub fn build(self) -> Vec<u8> {
        self.bytes
    }
}

/// Render the process forest, one process per line, indented by depth.
pub fn render_tree(processes: &Processes) -> String {
    fn render(processes: &Processes, process: &Process, depth: usize, lines: &mut Vec<String>) {
        let cmdline = process
            .cmdline()
            .map(|args| args.join(" "))
            .unwrap_or_else(|| "???".to_string());
        let mut line = format!(
            "{}{} pid={} {cmdline}",
            "  ".repeat(depth),
            process.proc_id(),
            process.pid()
        );
        if process.begin().is_none() {
            line.push_str(" (no begin)");
        }
        if process.end().is_none() {
            line.push_str(" (no end)");
        }
        lines.push(line);

        for child in processes.children(process) {
            render(processes, child, depth + 1, lines);
        }
    }

    let mut lines = Vec::new();
    for process in processes.toplevel() {
        render(processes, process, 0, &mut lines);
    }
    lines.join("\n")
}

/// Checks the parent/children/toplevel relations agree with each other.
pub fn assert_forest_consistent(processes: &Processes) {
    let toplevel: Vec<_> = processes.toplevel().map(|p| p.proc_id()).collect();
    for process in processes.all() {
        match process.parent() {
            Some(parent) => {
                let parent = processes.get(parent).expect("parent exists");
                assert!(parent.children().contains(&process.proc_id()));
                assert!(!toplevel.contains(&process.proc_id()));
            }
            None => assert!(toplevel.contains(&process.proc_id())),
        }
        for child in process.children() {
            assert_eq!(
                processes.get(*child).and_then(|c| c.parent()),
                Some(process.proc_id())
            );
        }
    }
}
