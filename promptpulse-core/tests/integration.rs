//! Integration tests for the promptpulse pipeline drivers
//!
//! These drive `run_event` and `run_session` end to end in-process, with
//! the collector URL pointed at an unroutable loopback port so dispatch
//! settles fast without a server.

use std::fs::File;
use std::io::Write;
use std::time::Duration;

use promptpulse_core::config::{DIAG_LOG_FILE, IDENTITY_FILE};
use promptpulse_core::{run_event, run_session, Config, Error, PipelineOutcome};
use tempfile::TempDir;

fn test_config(state_dir: &TempDir) -> Config {
    Config {
        collector_base_url: "http://127.0.0.1:9".to_string(),
        state_dir: Some(state_dir.path().to_path_buf()),
        timeout: Duration::from_secs(2),
    }
}

fn read_diag_log(state_dir: &TempDir) -> String {
    std::fs::read_to_string(state_dir.path().join(DIAG_LOG_FILE)).unwrap_or_default()
}

fn settle(outcome: PipelineOutcome) {
    if let PipelineOutcome::Dispatched(handle) = outcome {
        handle.wait();
    }
}

// ============================================
// Per-event path
// ============================================

#[test]
fn test_slash_command_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let input = r#"{"hook_event_name":"UserPromptSubmit","session_id":"s1","prompt":"/deploy staging"}"#;

    let outcome = run_event(input.as_bytes(), &config, true).unwrap();
    assert!(matches!(outcome, PipelineOutcome::Dispatched(_)));
    settle(outcome);

    let logged = read_diag_log(&tmp);
    assert!(logged.contains("Sending metrics: "));
    assert!(logged.contains(r#""type":"slash_command""#));
    assert!(logged.contains(r#""name":"deploy""#));
    assert!(logged.contains(r#""prompt_length":15"#));
    assert!(logged.contains(r#""session_id":"s1""#));
    // Delivery settled with a logged transport failure, swallowed
    assert!(logged.contains("ERROR: failed to send ("));

    // Identity marker was created as part of storage resolution
    let identity = std::fs::read_to_string(tmp.path().join(IDENTITY_FILE)).unwrap();
    assert_eq!(identity.trim().len(), 36);
    assert!(logged.contains(&format!(r#""user_id":"{}""#, identity.trim())));
}

#[test]
fn test_skill_invocation_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let input = r#"{"hook_event_name":"PreToolUse","tool_name":"Skill","session_id":"s1","tool_input":{"skill":"reviewer"}}"#;

    let outcome = run_event(input.as_bytes(), &config, true).unwrap();
    assert!(matches!(outcome, PipelineOutcome::Dispatched(_)));
    settle(outcome);

    let logged = read_diag_log(&tmp);
    assert!(logged.contains(r#""type":"skill""#));
    assert!(logged.contains(r#""name":"reviewer""#));
    assert!(logged.contains(r#""prompt_length":0"#));
}

#[test]
fn test_non_matching_event_is_silent_success() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let input = r#"{"hook_event_name":"UserPromptSubmit","session_id":"s1","prompt":"just chatting"}"#;

    let outcome = run_event(input.as_bytes(), &config, true).unwrap();
    assert!(matches!(outcome, PipelineOutcome::Skipped));
    assert!(!tmp.path().join(DIAG_LOG_FILE).exists());
}

#[test]
fn test_empty_command_name_is_silent_success() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let input = r#"{"hook_event_name":"UserPromptSubmit","session_id":"s1","prompt":"/ deploy"}"#;

    let outcome = run_event(input.as_bytes(), &config, true).unwrap();
    assert!(matches!(outcome, PipelineOutcome::Skipped));
}

#[test]
fn test_missing_session_id_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let input = r#"{"hook_event_name":"UserPromptSubmit","prompt":"/deploy"}"#;

    let err = run_event(input.as_bytes(), &config, true).unwrap_err();
    assert!(matches!(err, Error::MissingField("session_id")));
    assert!(err.is_fatal_input());
    // Nothing was sent or logged
    assert!(!tmp.path().join(DIAG_LOG_FILE).exists());
}

#[test]
fn test_malformed_input_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);

    let err = run_event("{broken".as_bytes(), &config, true).unwrap_err();
    assert!(matches!(err, Error::MalformedInput));
    assert!(err.is_fatal_input());
}

#[test]
fn test_event_path_works_without_storage_root() {
    let config = Config {
        collector_base_url: "http://127.0.0.1:9".to_string(),
        state_dir: None,
        timeout: Duration::from_secs(2),
    };
    let input = r#"{"hook_event_name":"UserPromptSubmit","session_id":"s1","prompt":"/deploy"}"#;

    // Degrades to "no local log, no identity" and still dispatches
    let outcome = run_event(input.as_bytes(), &config, true).unwrap();
    assert!(matches!(outcome, PipelineOutcome::Dispatched(_)));
    settle(outcome);
}

// ============================================
// Session-end path
// ============================================

fn write_transcript(dir: &TempDir, lines: &[&str]) -> String {
    let path = dir.path().join("transcript.jsonl");
    let mut file = File::create(&path).unwrap();
    for line in lines {
        writeln!(file, "{}", line).unwrap();
    }
    path.to_string_lossy().to_string()
}

fn session_input(session_id: &str, transcript_path: &str) -> String {
    format!(
        r#"{{"hook_event_name":"SessionEnd","session_id":"{}","transcript_path":"{}","reason":"clear"}}"#,
        session_id, transcript_path
    )
}

#[test]
fn test_session_end_to_end() {
    let tmp = TempDir::new().unwrap();
    let transcript = write_transcript(
        &tmp,
        &[
            r#"{"type":"user","timestamp":"2026-01-02T10:00:00Z","message":{"content":"start"}}"#,
            r#"{"type":"assistant","timestamp":"2026-01-02T10:00:10Z","message":{"usage":{"input_tokens":100,"output_tokens":30},"content":[{"type":"tool_use","name":"Bash","input":{"command":"ls"}}]}}"#,
            r#"{"type":"user","timestamp":"2026-01-02T10:00:20Z","message":{"content":"more"}}"#,
            r#"{"type":"assistant","timestamp":"2026-01-02T10:00:30Z","message":{"content":[{"type":"text","text":"ok","is_error":true}]}}"#,
            r#"{"type":"user","timestamp":"2026-01-02T10:01:40Z","message":{"content":"bye"}}"#,
        ],
    );

    let config = test_config(&tmp);
    let outcome = run_session(session_input("s1", &transcript).as_bytes(), &config, true).unwrap();
    assert!(matches!(outcome, PipelineOutcome::Dispatched(_)));
    settle(outcome);

    let logged = read_diag_log(&tmp);
    assert!(logged.contains("Sending session metrics: "));
    assert!(logged.contains(r#""turn_count":3"#));
    assert!(logged.contains(r#""user_message_count":3"#));
    assert!(logged.contains(r#""assistant_message_count":2"#));
    assert!(logged.contains(r#""bash_call_count":1"#));
    assert!(logged.contains(r#""total_tool_calls":1"#));
    assert!(logged.contains(r#""had_errors":true"#));
    assert!(logged.contains(r#""session_duration":100"#));
    assert!(logged.contains(r#""exit_reason":"clear""#));
    assert!(logged.contains(r#""total_input_tokens":100"#));
    assert!(logged.contains(r#""total_output_tokens":30"#));
    // Zero counters stay off the wire
    assert!(!logged.contains("cache_creation_tokens"));
    assert!(!logged.contains("cache_read_tokens"));
}

#[test]
fn test_session_other_event_kind_is_silent_success() {
    let tmp = TempDir::new().unwrap();
    let transcript = write_transcript(&tmp, &[r#"{"type":"user"}"#]);
    let config = test_config(&tmp);

    let input = format!(
        r#"{{"hook_event_name":"UserPromptSubmit","session_id":"s1","transcript_path":"{}"}}"#,
        transcript
    );
    let outcome = run_session(input.as_bytes(), &config, true).unwrap();
    assert!(matches!(outcome, PipelineOutcome::Skipped));
    assert!(!tmp.path().join(DIAG_LOG_FILE).exists());
}

#[test]
fn test_session_missing_transcript_path_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let input = r#"{"hook_event_name":"SessionEnd","session_id":"s1"}"#;

    let err = run_session(input.as_bytes(), &config, true).unwrap_err();
    assert!(matches!(err, Error::MissingField("transcript_path")));
}

#[test]
fn test_session_missing_session_id_is_fatal() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let input = r#"{"hook_event_name":"SessionEnd","transcript_path":"/tmp/t.jsonl"}"#;

    let err = run_session(input.as_bytes(), &config, true).unwrap_err();
    assert!(matches!(err, Error::MissingField("session_id")));
}

#[test]
fn test_unreadable_transcript_degrades_to_zero_record() {
    let tmp = TempDir::new().unwrap();
    let config = test_config(&tmp);
    let missing = tmp.path().join("gone.jsonl").to_string_lossy().to_string();

    let outcome = run_session(session_input("s1", &missing).as_bytes(), &config, true).unwrap();
    assert!(matches!(outcome, PipelineOutcome::Dispatched(_)));
    settle(outcome);

    let logged = read_diag_log(&tmp);
    assert!(logged.contains("transcript not readable"));
    assert!(logged.contains(r#""turn_count":0"#));
    assert!(logged.contains(r#""session_duration":0"#));
    assert!(logged.contains(r#""had_errors":false"#));
}

#[test]
fn test_default_exit_reason_is_other() {
    let tmp = TempDir::new().unwrap();
    let transcript = write_transcript(&tmp, &[r#"{"type":"user"}"#]);
    let config = test_config(&tmp);

    let input = format!(
        r#"{{"hook_event_name":"SessionEnd","session_id":"s1","transcript_path":"{}"}}"#,
        transcript
    );
    let outcome = run_session(input.as_bytes(), &config, true).unwrap();
    settle(outcome);

    assert!(read_diag_log(&tmp).contains(r#""exit_reason":"other""#));
}
