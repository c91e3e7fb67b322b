use std::fs;
use std::sync::atomic::AtomicBool;
use std::sync::Arc;

use directive_engine::NullObserver;
use model_gateway::{BackendProfile, ChatBackend, ChatMessage, ChatRole, GatewayError, MockBackend};
use quill::chat::ChatSession;
use tempfile::tempdir;

fn scripted_backend(chunks: &[&str]) -> Arc<MockBackend> {
    Arc::new(MockBackend::instant(
        chunks.iter().map(|chunk| chunk.to_string()).collect(),
    ))
}

#[test]
fn turn_streams_filtered_prose_and_executes_directives() {
    let workspace = tempdir().expect("temp workspace");
    let backend = scripted_backend(&[
        "Writing the file now.\n\n",
        "**QUILL_CREATE_FILE: notes/hello.txt**\n",
        "```text\nhi there\n```\n\n",
        "**QUILL_RUN_COMMAND: cat notes/hello.txt**\n\n",
        "All done.\n",
    ]);

    let mut session = ChatSession::new(backend, "You are a test assistant.", workspace.path());
    let cancel = Arc::new(AtomicBool::new(false));
    let mut display = String::new();

    let report = session
        .run_turn(
            "write hello",
            cancel,
            &mut |text| display.push_str(text),
            &NullObserver,
        )
        .expect("turn should succeed");

    // The user-visible text carries the prose and none of the syntax.
    assert!(display.contains("Writing the file now."));
    assert!(display.contains("All done."));
    assert!(!display.contains("QUILL_"), "marker leaked: {display}");
    assert!(!display.contains("hi there"), "block leaked: {display}");

    assert_eq!(
        fs::read_to_string(workspace.path().join("notes/hello.txt")).expect("file written"),
        "hi there"
    );
    assert_eq!(report.outcomes.len(), 2);
    assert_eq!(report.failure_count(), 0);
    assert!(report.diagnostics.is_empty());
}

#[test]
fn history_keeps_raw_response_for_the_next_turn() {
    let workspace = tempdir().expect("temp workspace");
    let backend = scripted_backend(&[
        "Done:\n**QUILL_CREATE_FILE: a.txt**\n```text\ncontent\n```\n",
    ]);

    let mut session = ChatSession::new(backend, "prompt", workspace.path());
    let cancel = Arc::new(AtomicBool::new(false));
    session
        .run_turn("make a.txt", cancel, &mut |_| {}, &NullObserver)
        .expect("turn should succeed");

    let history = session.history();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].role, ChatRole::User);
    assert_eq!(history[1].role, ChatRole::Assistant);
    // The raw (unfiltered) response is what the model sees next turn.
    assert!(history[1].content.contains("**QUILL_CREATE_FILE: a.txt**"));
}

#[test]
fn cancelled_turn_executes_nothing_and_forgets_the_exchange() {
    let workspace = tempdir().expect("temp workspace");
    let backend = scripted_backend(&[
        "**QUILL_CREATE_FILE: never.txt**\n```text\nnever\n```\n",
    ]);

    let mut session = ChatSession::new(backend, "prompt", workspace.path());
    let cancel = Arc::new(AtomicBool::new(true));

    let report = session
        .run_turn("do it", cancel, &mut |_| {}, &NullObserver)
        .expect("cancelled turn still returns cleanly");

    assert!(report.outcomes.is_empty());
    assert!(session.history().is_empty());
    assert!(!workspace.path().join("never.txt").exists());
}

struct FailingBackend;

impl ChatBackend for FailingBackend {
    fn profile(&self) -> BackendProfile {
        BackendProfile {
            provider_id: "failing".to_string(),
            model_id: "failing".to_string(),
        }
    }

    fn supports_streaming(&self) -> bool {
        false
    }

    fn complete(&self, _messages: &[ChatMessage]) -> Result<String, GatewayError> {
        Err(GatewayError::new("transport unavailable"))
    }
}

#[test]
fn gateway_failure_fails_the_turn_without_polluting_history() {
    let workspace = tempdir().expect("temp workspace");
    let mut session = ChatSession::new(Arc::new(FailingBackend), "prompt", workspace.path());
    let cancel = Arc::new(AtomicBool::new(false));

    let error = session
        .run_turn("hello", cancel, &mut |_| {}, &NullObserver)
        .expect_err("gateway failure must fail the turn");

    assert!(error.to_string().contains("transport unavailable"));
    assert!(session.history().is_empty());
}

#[test]
fn malformed_directives_surface_as_diagnostics_not_actions() {
    let workspace = tempdir().expect("temp workspace");
    let backend = scripted_backend(&[
        "Trying something odd.\n**QUILL_CREATE_FILE: empty.py**\n```python\n\n```\n",
    ]);

    let mut session = ChatSession::new(backend, "prompt", workspace.path());
    let cancel = Arc::new(AtomicBool::new(false));

    let report = session
        .run_turn("go", cancel, &mut |_| {}, &NullObserver)
        .expect("turn should not fail on a dropped directive");

    assert!(report.outcomes.is_empty());
    assert_eq!(report.diagnostics.len(), 1);
    assert!(!workspace.path().join("empty.py").exists());
}

#[test]
fn occupied_working_directory_aborts_the_turn_before_any_action() {
    let outer = tempdir().expect("outer temp dir");
    let occupied = outer.path().join("occupied");
    fs::write(&occupied, "a file, not a directory").expect("seed blocking file");

    let backend = scripted_backend(&[
        "**QUILL_CREATE_FILE: a.txt**\n```text\nx\n```\n",
    ]);
    let mut session = ChatSession::new(backend, "prompt", &occupied);
    let cancel = Arc::new(AtomicBool::new(false));

    let error = session
        .run_turn("go", cancel, &mut |_| {}, &NullObserver)
        .expect_err("precondition failure must abort the turn");

    assert!(error.to_string().contains("turn aborted"));
}

#[test]
fn changing_the_working_directory_affects_later_turns_only() {
    let first = tempdir().expect("first workspace");
    let second = tempdir().expect("second workspace");
    let backend = scripted_backend(&[
        "**QUILL_CREATE_FILE: where.txt**\n```text\nhere\n```\n",
    ]);

    let mut session = ChatSession::new(backend, "prompt", first.path());
    let cancel = Arc::new(AtomicBool::new(false));
    session
        .run_turn("one", Arc::clone(&cancel), &mut |_| {}, &NullObserver)
        .expect("first turn");

    session.set_working_dir(second.path());
    session
        .run_turn("two", cancel, &mut |_| {}, &NullObserver)
        .expect("second turn");

    assert!(first.path().join("where.txt").exists());
    assert!(second.path().join("where.txt").exists());
}
