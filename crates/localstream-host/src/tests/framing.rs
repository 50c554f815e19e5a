//! Session edge cases: framing faults, size limits and stream failures.

use std::io::Cursor;

use rstest::rstest;
use serde_json::{Value, json};

use crate::session::Termination;

use super::support::{
    ClosedPipe, FailingReader, HealthEvent, Limits, SchemaRejectingStore, SharedBuffer,
    frames_of, raw_frame, run_over, run_scripted, run_with_store, split_frames,
};

fn ready() -> Value {
    json!({"status": "ready", "type": "startup"})
}

fn pong() -> Value {
    json!({"status": "success", "action": "pong"})
}

fn ping() -> Value {
    json!({"action": "ping"})
}

#[rstest]
fn closing_the_input_reports_lifecycle_events() {
    let run = run_scripted(Vec::new(), Limits::default());

    assert_eq!(run.termination, Termination::EndOfStream);
    assert_eq!(run.replies(), vec![ready()]);
    assert_eq!(
        run.events,
        vec![
            HealthEvent::SessionStarted,
            HealthEvent::StoreClosed,
            HealthEvent::SessionTerminated(Termination::EndOfStream),
        ]
    );
}

#[rstest]
#[case::invalid_utf8(vec![0xff, 0xfe, 0xfd])]
#[case::bare_array(b"[1,2,3]".to_vec())]
#[case::no_action(br#"{"sql":"SELECT 1"}"#.to_vec())]
fn malformed_frames_get_an_error_reply(#[case] payload: Vec<u8>) {
    let mut input = raw_frame(&payload);
    input.extend(frames_of(&[ping()]));

    let run = run_scripted(input, Limits::default());
    let replies = run.replies();

    assert_eq!(replies.len(), 3);
    assert_eq!(replies[1]["status"], "error");
    assert!(replies[1]["error"].is_string());
    assert_eq!(replies[2], pong());
    assert_eq!(run.termination, Termination::EndOfStream);
}

#[rstest]
fn zero_length_prefix_is_end_of_stream() {
    let mut input = 0_u32.to_le_bytes().to_vec();
    input.extend(frames_of(&[ping()]));

    let run = run_scripted(input, Limits::default());

    assert_eq!(run.termination, Termination::EndOfStream);
    assert_eq!(run.replies(), vec![ready()]);
}

#[rstest]
#[case::short_prefix(vec![7, 0])]
#[case::truncated_payload({
    let mut bytes = 100_u32.to_le_bytes().to_vec();
    bytes.extend_from_slice(br#"{"action":"#);
    bytes
})]
fn incomplete_frames_are_never_parsed(#[case] tail: Vec<u8>) {
    let mut input = frames_of(&[ping()]);
    input.extend(tail);

    let run = run_scripted(input, Limits::default());

    assert_eq!(run.termination, Termination::EndOfStream);
    assert_eq!(run.replies(), vec![ready(), pong()]);
}

#[rstest]
fn oversized_frame_is_rejected_and_skipped() {
    let limits = Limits {
        max_frame_bytes: 32,
        ..Limits::default()
    };
    let big = json!({"action": "ping", "padding": "x".repeat(64)});
    let input = frames_of(&[big, ping()]);

    let run = run_scripted(input, limits);
    let replies = run.replies();

    assert_eq!(replies.len(), 3);
    assert_eq!(replies[1]["status"], "error");
    let error = replies[1]["error"].as_str().expect("error text");
    assert!(error.contains("exceeds the 32 byte limit"), "{error}");
    assert_eq!(replies[2], pong());
}

#[rstest]
fn oversized_reply_is_replaced_by_an_error() {
    let limits = Limits {
        max_response_bytes: 128,
        ..Limits::default()
    };
    let sql = format!("SELECT '{}'", "y".repeat(512));
    let input = frames_of(&[json!({"action": "query", "sql": sql}), ping()]);

    let run = run_scripted(input, limits);
    let replies = run.replies();

    assert_eq!(replies.len(), 3);
    assert_eq!(replies[1]["status"], "error");
    let error = replies[1]["error"].as_str().expect("error text");
    assert!(error.contains("exceeds the 128 byte limit"), "{error}");
    assert!(run.frames.iter().all(|frame| frame.len() <= 128));
    assert_eq!(replies[2], pong());
}

#[rstest]
fn comment_only_query_returns_no_rows() {
    let input = frames_of(&[json!({"action": "query", "sql": "-- just a comment"})]);

    let run = run_scripted(input, Limits::default());

    assert_eq!(
        run.replies(),
        vec![ready(), json!({"status": "success", "results": []})]
    );
}

#[rstest]
fn schema_failure_sends_one_error_and_stops() {
    let run = run_with_store(
        SchemaRejectingStore,
        frames_of(&[ping()]),
        Limits::default(),
    );

    assert_eq!(run.termination, Termination::SchemaFailed);
    assert_eq!(
        run.replies(),
        vec![json!({"status": "error", "error": "store is closed"})]
    );
    assert_eq!(run.closes, 1);
    assert!(!run.events.contains(&HealthEvent::SessionStarted));
    assert!(run.events.contains(&HealthEvent::SessionTerminated(
        Termination::SchemaFailed
    )));
}

#[rstest]
fn departed_parent_ends_the_session() {
    let (termination, events, closes) = run_over(Cursor::new(frames_of(&[ping()])), ClosedPipe);

    assert_eq!(termination, Termination::WriteFailed);
    assert_eq!(termination.exit_code(), 0);
    assert_eq!(closes, 1);
    assert_eq!(
        events,
        vec![
            HealthEvent::StoreClosed,
            HealthEvent::SessionTerminated(Termination::WriteFailed),
        ]
    );
}

#[rstest]
fn input_failure_ends_the_session() {
    let output = SharedBuffer::default();
    let (termination, events, closes) = run_over(FailingReader, output.clone());

    assert_eq!(termination, Termination::ReadFailed);
    assert_eq!(termination.exit_code(), 1);
    assert_eq!(closes, 1);
    assert!(events.contains(&HealthEvent::StoreClosed));
    assert_eq!(split_frames(&output.contents()).len(), 1);
}
