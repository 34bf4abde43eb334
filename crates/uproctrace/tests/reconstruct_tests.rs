mod shared;

use rstest::rstest;
use shared::{TraceBuilder, assert_forest_consistent, render_tree};
use std::io::{Cursor, Write};
use std::time::Duration;
use uproctrace::{
    DecodeError, DecodeOptions, EventKind, MalformedPolicy, ProcId, Processes, Timestamp,
};

#[test_log::test]
fn test_end_to_end() -> anyhow::Result<()> {
    let trace = TraceBuilder::new()
        .garbage(b"leftover from a crashed writer")
        .begin(100, 1, None, &["make"])
        .begin(101, 2, Some(1), &["cc", "-c", "a.c"])
        .end(102, 2, Some(0.5))
        .end(103, 1, Some(2.0))
        .build();

    let processes = Processes::from_reader(Cursor::new(trace))?;

    insta::assert_snapshot!(render_tree(&processes), @r"
    0 pid=1 make
      1 pid=2 cc -c a.c
    ");

    let root = processes.toplevel().next().unwrap();
    assert_eq!(root.cpu_time(), Some(Duration::from_secs(2)));
    assert_eq!(root.begin_timestamp(), Some(Timestamp::from_secs(100)));
    assert_eq!(root.end_timestamp(), Some(Timestamp::from_secs(103)));

    let child = processes.children(root).next().unwrap();
    assert_eq!(child.cpu_time(), Some(Duration::from_millis(500)));
    assert_eq!(child.ppid(), Some(1));
    assert_eq!(processes.parent(child).map(|p| p.proc_id()), Some(root.proc_id()));
    assert!(root.is_complete() && child.is_complete());

    assert_forest_consistent(&processes);
    Ok(())
}

#[test_log::test]
fn test_trace_starting_mid_run() -> anyhow::Result<()> {
    let trace = TraceBuilder::new()
        .end(10, 50, None)
        .begin(11, 60, Some(40), &["sh", "-c", "build"])
        .begin(12, 61, Some(60), &["gcc"])
        .end(13, 61, Some(0.25))
        .begin(14, 61, Some(60), &["ld"])
        .end(15, 61, Some(0.75))
        .end(16, 60, None)
        .build();

    let processes = Processes::from_reader(Cursor::new(trace))?;

    insta::assert_snapshot!(render_tree(&processes), @r"
    0 pid=50 ??? (no begin)
    2 pid=40 ??? (no begin) (no end)
      1 pid=60 sh -c build
        3 pid=61 gcc
        4 pid=61 ld
    ");

    let anomalies = processes.anomalies();
    assert_eq!(anomalies.orphan_ends, 1);
    assert_eq!(anomalies.parent_placeholders, 1);
    assert_eq!(anomalies.live_overwrites, 0);

    assert_forest_consistent(&processes);
    Ok(())
}

#[test]
fn test_proc_ids_are_dense_and_increasing() {
    let mut builder = TraceBuilder::new();
    for i in 0..60 {
        let pid = 100 + (i % 4) as i32;
        builder = builder.begin(2 * i, pid, Some(1), &[]).end(2 * i + 1, pid, None);
    }
    let processes = Processes::from_reader(Cursor::new(builder.build())).unwrap();

    // 60 processes plus the placeholder for pid 1
    assert_eq!(processes.len(), 61);
    for (index, process) in processes.all().iter().enumerate() {
        assert_eq!(process.proc_id(), ProcId(index));
        assert_eq!(processes.get(ProcId(index)).unwrap().pid(), process.pid());
    }
    assert_eq!(processes.by_pid(101).count(), 15);
    assert!(processes.get(ProcId(61)).is_none());

    let init = processes.toplevel().next().unwrap();
    assert_eq!(init.pid(), 1);
    assert_eq!(init.children().len(), 60);
    assert_forest_consistent(&processes);
}

#[test]
fn test_timeline_follows_arrival_order() {
    let trace = TraceBuilder::new()
        .begin(5, 1, None, &[])
        .begin(5, 2, Some(1), &[])
        .end(5, 2, None)
        .begin(4, 3, Some(1), &[])
        .build();
    let processes = Processes::from_reader(Cursor::new(trace)).unwrap();
    let timeline = processes.timeline();

    let at_five: Vec<_> = timeline
        .at(Timestamp::from_secs(5))
        .iter()
        .map(|e| (e.kind, e.proc_id.index()))
        .collect();
    assert_eq!(
        at_five,
        vec![
            (EventKind::Begin, 0),
            (EventKind::Begin, 1),
            (EventKind::End, 1)
        ]
    );
    // Inverted timestamps are indexed by time but never reordered in the tree.
    assert_eq!(timeline.iter().next().unwrap().0, Timestamp::from_secs(4));
    assert_eq!(processes.get(ProcId(2)).unwrap().pid(), 3);
}

#[test]
fn test_truncated_trace_keeps_complete_frames() {
    let builder = TraceBuilder::new()
        .begin(1, 1, None, &["init"])
        .begin(2, 2, Some(1), &["sh"])
        .end(3, 2, Some(0.1))
        .end(4, 1, Some(0.2));
    let frame_ends = builder.frame_ends().to_vec();
    let trace = builder.build();

    for cut in 0..=trace.len() {
        let processes = Processes::from_reader(Cursor::new(&trace[..cut])).unwrap();
        let complete = frame_ends.iter().filter(|&&end| end <= cut).count();
        assert_eq!(processes.timeline().len(), complete, "cut at byte {cut}");
        assert_forest_consistent(&processes);
    }
}

#[rstest]
#[case::abort(MalformedPolicy::Abort)]
#[case::resync(MalformedPolicy::Resync)]
fn test_malformed_frame(#[case] malformed: MalformedPolicy) {
    let trace = TraceBuilder::new()
        .begin(1, 1, None, &[])
        .garbage(b"upt0\x00\x00\x00\x01\xFF")
        .end(2, 1, None)
        .build();

    let result = Processes::from_reader_with_options(Cursor::new(trace), DecodeOptions { malformed });
    match malformed {
        MalformedPolicy::Abort => {
            let err = result.unwrap_err();
            assert!(matches!(err, DecodeError::Malformed { frame: 1, .. }), "{err}");
        }
        MalformedPolicy::Resync => {
            let processes = result.unwrap();
            assert_eq!(processes.len(), 1);
            assert!(processes.all()[0].is_complete());
        }
    }
}

#[test]
fn test_from_path() -> anyhow::Result<()> {
    let mut file = tempfile::NamedTempFile::new()?;
    file.write_all(
        &TraceBuilder::new()
            .begin(1, 10, None, &["bash"])
            .end(2, 10, Some(0.01))
            .build(),
    )?;

    let processes = Processes::from_path(file.path())?;
    assert_eq!(processes.len(), 1);
    assert_eq!(
        processes.all()[0].cmdline(),
        Some(&["bash".to_string()][..])
    );
    Ok(())
}

#[test]
fn test_missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = Processes::from_path(dir.path().join("missing.upt")).unwrap_err();
    assert!(matches!(err, DecodeError::Io(_)));
}

#[test_log::test]
fn test_resync_recovers_frames_after_length_past_end() {
    let trace = TraceBuilder::new()
        .begin(1, 1, None, &["make"])
        .garbage(b"upt0\x00\x00\xFF\xFF\x0F")
        .end(2, 1, Some(0.5))
        .begin(3, 2, None, &["true"])
        .build();

    let options = DecodeOptions {
        malformed: MalformedPolicy::Resync,
    };
    let processes = Processes::from_reader_with_options(Cursor::new(trace), options).unwrap();
    assert_eq!(processes.len(), 2);
    assert!(processes.all()[0].is_complete());
    assert_eq!(processes.all()[1].pid(), 2);
    assert_eq!(processes.timeline().len(), 3);
}
