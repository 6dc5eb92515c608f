/*!
 * Console Tests
 * Command parsing and text rendering of reports and the ready set
 */

use pretty_assertions::assert_eq;
use srtf_sim::console::{Command, ConsoleError, ReportView, SnapshotView};
use srtf_sim::{Process, Scheduler, SimTime};
use std::time::Duration;

#[test]
fn test_parse_every_command() {
    let cases = [
        ("start", Command::Start),
        ("stat", Command::Stat),
        ("stats", Command::Stat),
        ("processes", Command::Processes),
        ("ps", Command::Processes),
        ("clear", Command::Clear),
        ("close", Command::Close),
        ("exit", Command::Close),
        ("help", Command::Help),
        (
            "add P9 2",
            Command::Add {
                name: "P9".into(),
                burst: SimTime::from_units(2),
            },
        ),
    ];

    for (line, expected) in cases {
        assert_eq!(Command::parse(line), Ok(expected), "line: {}", line);
    }
}

#[test]
fn test_parse_rejects_bad_burst() {
    assert_eq!(
        Command::parse("add P1 soon"),
        Err(ConsoleError::InvalidBurst("soon".into()))
    );
    assert_eq!(
        Command::parse("add P1 NaN"),
        Err(ConsoleError::InvalidBurst("NaN".into()))
    );
}

#[tokio::test(start_paused = true)]
async fn test_report_view_lists_segments_and_averages() {
    let scheduler = Scheduler::default();
    scheduler
        .add(Process::new("P1", SimTime::from_units(4)))
        .unwrap();
    let task = scheduler.start().unwrap();

    tokio::time::sleep(Duration::from_secs(1)).await;
    scheduler
        .add(Process::new("P2", SimTime::from_units(2)))
        .unwrap();
    task.shutdown().await.unwrap();

    let text = ReportView(&scheduler.report().unwrap()).to_string();

    assert!(text.contains("-> Process P1"));
    assert!(text.contains("Execution Times: 0-1, 3-6"));
    assert!(text.contains("Execution Times: 1-3"));
    assert!(text.contains("Wait Time: 2s"));
    assert!(text.contains("Service Time: 6s"));
    assert!(text.contains("Average Waiting Time: 1s"));
    assert!(text.contains("Average Service Time: 4s"));
}

#[tokio::test(start_paused = true)]
async fn test_report_view_marks_waiting_process() {
    let scheduler = Scheduler::default();
    scheduler
        .add(Process::new("A", SimTime::from_units(1)))
        .unwrap();
    scheduler
        .add(Process::new("B", SimTime::from_units(4)))
        .unwrap();
    let task = scheduler.start().unwrap();

    tokio::time::sleep(Duration::from_millis(1_500)).await;
    scheduler
        .add(Process::new("C", SimTime::from_units(5)))
        .unwrap();
    tokio::time::sleep(Duration::from_secs(1)).await;

    let text = ReportView(&scheduler.report().unwrap()).to_string();
    assert!(text.contains("Execution Times: 0-1"));
    assert!(text.contains("Wait Time: 1s (not yet started)"));
    assert!(text.contains("Service Time: -"));

    task.shutdown().await.unwrap();
}

#[tokio::test(start_paused = true)]
async fn test_snapshot_view_shows_live_remaining() {
    let scheduler = Scheduler::default();
    assert_eq!(
        SnapshotView(&scheduler.snapshot()).to_string(),
        "No processes waiting"
    );

    scheduler
        .add(Process::new("P1", SimTime::from_units(4)))
        .unwrap();
    scheduler
        .add(Process::new("P2", SimTime::from_units(6)))
        .unwrap();
    let task = scheduler.start().unwrap();
    tokio::time::sleep(Duration::from_millis(1_500)).await;

    assert_eq!(
        SnapshotView(&scheduler.snapshot()).to_string(),
        "Process P1 remains 2.5s (running)\nProcess P2 remains 6s"
    );

    task.shutdown().await.unwrap();
}
