//! Debounce, ordering and error-state tests for field validators.
//!
//! These run on a paused Tokio clock, so every interval below is virtual.

use std::collections::VecDeque;
use std::sync::Arc;
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use tokio::time::Instant;
use tokio::time::sleep;
use training_lib::Validator;
use training_lib::checker::CheckOutcome;
use training_lib::checker::ExistenceChecker;
use training_lib::config::ValidatorConfig;
use training_lib::config::default_bindings;
use training_lib::error::CheckError;
use training_lib::error::Error;
use training_lib::form::Form;
use training_lib::view::FieldStatus;
use training_lib::view::MemoryView;

// =============================================================================
// Scripted checker
// =============================================================================

#[derive(Debug, Clone)]
struct Call {
    at: Duration,
    endpoint: String,
    params: Vec<(String, String)>,
}

type Reply = (Duration, Result<CheckOutcome, CheckError>);

/// Answers checks from a queue of (delay, result) replies, `Available` once empty.
struct ScriptedChecker {
    start: Instant,
    calls: Mutex<Vec<Call>>,
    replies: Mutex<VecDeque<Reply>>,
}

impl ScriptedChecker {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            start: Instant::now(),
            calls: Mutex::new(Vec::new()),
            replies: Mutex::new(VecDeque::new()),
        })
    }

    fn reply(&self, delay: Duration, result: Result<CheckOutcome, CheckError>) {
        self.replies.lock().unwrap().push_back((delay, result));
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }
}

#[async_trait]
impl ExistenceChecker for ScriptedChecker {
    async fn check(&self, endpoint: &str, params: &[(String, String)]) -> Result<CheckOutcome, CheckError> {
        self.calls.lock().unwrap().push(Call {
            at: self.start.elapsed(),
            endpoint: endpoint.to_string(),
            params: params.to_vec(),
        });
        let reply = self.replies.lock().unwrap().pop_front();
        match reply {
            Some((delay, result)) => {
                sleep(delay).await;
                result
            }
            None => Ok(CheckOutcome::Available),
        }
    }
}

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

fn pairs(values: &[(&str, &str)]) -> Vec<(String, String)> {
    values.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect()
}

fn username_config() -> ValidatorConfig {
    default_bindings().remove("id_username").unwrap()
}

fn password_config() -> ValidatorConfig {
    default_bindings().remove("id_password1").unwrap()
}

struct Page {
    form: Form,
    view: Arc<MemoryView>,
    checker: Arc<ScriptedChecker>,
    validator: Validator,
}

fn page() -> Page {
    let form = Form::new();
    let view = Arc::new(MemoryView::new());
    let checker = ScriptedChecker::new();
    let validator = Validator::new(checker.clone(), view.clone());
    Page {
        form,
        view,
        checker,
        validator,
    }
}

// =============================================================================
// Debounce
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_burst_sends_one_request_with_final_value() {
    let page = page();
    let _binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();

    page.form.set_value("id_username", "a");
    sleep(ms(300)).await;
    page.form.set_value("id_username", "al");
    sleep(ms(300)).await;
    page.form.set_value("id_username", "alice");

    sleep(ms(990)).await;
    assert!(page.checker.calls().is_empty(), "fired before the quiet period ended");

    sleep(ms(50)).await;
    let calls = page.checker.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].params, pairs(&[("username", "alice")]));
    assert!(calls[0].at >= ms(1600));
}

#[tokio::test(start_paused = true)]
async fn test_sources_are_read_when_the_timer_fires() {
    let page = page();
    let _binding = page.validator.attach(&page.form, "id_password1", password_config()).unwrap();

    page.form.set_value("id_email", "bob@x.com");
    page.form.set_value("id_username", "bo");
    page.form.set_value("id_password1", "hunter2");
    sleep(ms(500)).await;
    page.form.set_value("id_username", "bob");

    sleep(ms(600)).await;
    let calls = page.checker.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].endpoint, "/validators/check-password/");
    assert_eq!(
        calls[0].params,
        pairs(&[("email", "bob@x.com"), ("password", "hunter2"), ("username", "bob")])
    );
}

#[tokio::test(start_paused = true)]
async fn test_custom_interval() {
    let page = page();
    let config = username_config().with_debounce_interval(ms(200));
    let binding = page.validator.attach(&page.form, "id_username", config).unwrap();

    page.form.set_value("id_username", "alice");
    assert!(binding.has_pending());

    sleep(ms(250)).await;
    assert!(!binding.has_pending());
    assert!(binding.is_settled());
    assert_eq!(binding.requests_sent(), 1);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn test_burst_on_multi_thread_runtime_fires_for_final_value() {
    let page = page();
    let config = username_config().with_debounce_interval(ms(30));
    let binding = page.validator.attach(&page.form, "id_username", config).unwrap();

    page.form.set_value("id_username", "a");
    sleep(ms(150)).await;
    assert_eq!(page.checker.calls().len(), 1);

    for i in 0..200 {
        page.form.set_value("id_username", format!("b{}", i));
        tokio::task::yield_now().await;
    }
    sleep(ms(300)).await;

    let calls = page.checker.calls();
    assert_eq!(calls[0].params, pairs(&[("username", "a")]));
    assert_eq!(calls.last().unwrap().params, pairs(&[("username", "b199")]));
    // A stalled worker may let one mid-burst timer through.
    assert!(calls.len() <= 3, "burst sent {} checks", calls.len());
    assert!(binding.is_settled());
    assert_eq!(page.view.status("id_username"), FieldStatus::Clear);
}

// =============================================================================
// Empty input
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_clearing_removes_annotation_without_request() {
    let page = page();
    let binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
    page.checker.reply(ms(10), Ok(CheckOutcome::Taken));

    page.form.set_value("id_username", "alice");
    sleep(ms(1100)).await;
    assert!(page.view.status("id_username").is_conflict());

    page.form.set_value("id_username", "alic");
    page.form.clear("id_username");
    // Synchronous: no await between the clear and the assertions.
    assert_eq!(page.view.status("id_username"), FieldStatus::Clear);
    assert!(!binding.has_pending());

    sleep(ms(3000)).await;
    assert_eq!(page.checker.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_response_arriving_after_clear_is_ignored() {
    let page = page();
    let binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
    page.checker.reply(ms(500), Ok(CheckOutcome::Taken));

    page.form.set_value("id_username", "alice");
    sleep(ms(1100)).await;
    assert_eq!(page.checker.calls().len(), 1);
    assert!(!binding.is_settled());

    page.form.clear("id_username");
    assert!(binding.is_settled());
    sleep(ms(1000)).await;
    assert_eq!(page.view.status("id_username"), FieldStatus::Clear);
}

// =============================================================================
// Responses
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_taken_then_available() {
    let page = page();
    let _binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
    page.checker.reply(ms(0), Ok(CheckOutcome::Taken));
    page.checker.reply(ms(0), Ok(CheckOutcome::Available));

    page.form.set_value("id_username", "alice");
    sleep(ms(1100)).await;
    assert_eq!(
        page.view.status("id_username"),
        FieldStatus::Conflict {
            annotation_id: "error_exists_id_username".to_string(),
            message: "This username is already taken.".to_string(),
        }
    );

    page.form.set_value("id_username", "alice2");
    sleep(ms(1100)).await;
    assert_eq!(page.view.status("id_username"), FieldStatus::Clear);
    assert!(page.view.annotation_ids().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_repeated_conflicts_keep_one_annotation() {
    let page = page();
    let _binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
    page.checker.reply(ms(0), Ok(CheckOutcome::Taken));
    page.checker.reply(ms(0), Ok(CheckOutcome::Taken));

    page.form.set_value("id_username", "alice");
    sleep(ms(1100)).await;
    page.form.set_value("id_username", "alicia");
    sleep(ms(1100)).await;

    assert_eq!(page.checker.calls().len(), 2);
    assert_eq!(page.view.annotation_ids(), vec!["error_exists_id_username".to_string()]);
}

#[tokio::test(start_paused = true)]
async fn test_username_scenario() {
    let page = page();
    let _binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
    page.checker.reply(ms(20), Ok(CheckOutcome::Taken));

    page.form.set_value("id_username", "alice");
    sleep(ms(1050)).await;

    let calls = page.checker.calls();
    assert_eq!(calls.len(), 1);
    assert_eq!(calls[0].endpoint, "/validators/check-username/");
    assert_eq!(calls[0].params, pairs(&[("username", "alice")]));
    assert_eq!(
        page.view.conflict_message("id_username").as_deref(),
        Some("This username is already taken.")
    );
    assert_eq!(page.view.annotation_ids(), vec!["error_exists_id_username".to_string()]);

    page.form.clear("id_username");
    assert!(page.view.annotation_ids().is_empty());
    sleep(ms(2000)).await;
    assert_eq!(page.checker.calls().len(), 1);
}

#[tokio::test(start_paused = true)]
async fn test_bindings_are_independent() {
    let page = page();
    let _bindings = page.validator.attach_all(&page.form, &default_bindings()).unwrap();
    page.checker.reply(ms(0), Ok(CheckOutcome::Taken));

    page.form.set_value("id_username", "alice");
    sleep(ms(1100)).await;
    assert!(page.view.status("id_username").is_conflict());
    assert_eq!(page.view.status("id_password1"), FieldStatus::Clear);

    page.form.clear("id_password1");
    assert!(page.view.status("id_username").is_conflict());
}

// =============================================================================
// Ordering
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_newer_response_wins_over_late_older_one() {
    let page = page();
    let _binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
    // A is slow and positive, B is fast and negative.
    page.checker.reply(ms(2000), Ok(CheckOutcome::Taken));
    page.checker.reply(ms(100), Ok(CheckOutcome::Available));

    page.form.set_value("id_username", "bob");
    sleep(ms(1500)).await;
    assert_eq!(page.checker.calls().len(), 1);

    page.form.set_value("id_username", "bobby");
    sleep(ms(1200)).await;
    assert_eq!(page.checker.calls().len(), 2);
    assert_eq!(page.view.status("id_username"), FieldStatus::Clear);

    sleep(ms(1000)).await;
    assert_eq!(page.view.status("id_username"), FieldStatus::Clear);
}

// =============================================================================
// Failures
// =============================================================================

#[tokio::test(start_paused = true)]
async fn test_failed_check_is_shown_as_unavailable() {
    let page = page();
    let _binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
    page.checker.reply(ms(0), Ok(CheckOutcome::Taken));
    page.checker.reply(ms(0), Err(CheckError::http(503, "")));

    page.form.set_value("id_username", "alice");
    sleep(ms(1100)).await;
    page.form.set_value("id_username", "alicia");
    sleep(ms(1100)).await;

    assert!(matches!(page.view.status("id_username"), FieldStatus::Unavailable { .. }));
    assert!(page.view.annotation_ids().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_unknown_answer_does_not_fail_open() {
    let page = page();
    let _binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
    page.checker.reply(ms(0), Ok(CheckOutcome::Unknown));

    page.form.set_value("id_username", "alice");
    sleep(ms(1100)).await;

    assert!(matches!(page.view.status("id_username"), FieldStatus::Unavailable { .. }));
}

// =============================================================================
// Attaching
// =============================================================================

#[test]
fn test_attach_requires_runtime() {
    let page = page();
    let err = page
        .validator
        .attach(&page.form, "id_username", username_config())
        .unwrap_err();
    assert!(matches!(err, Error::NoRuntime));
}

#[tokio::test(start_paused = true)]
async fn test_attach_rejects_invalid_config() {
    let page = page();
    let err = page
        .validator
        .attach(&page.form, "id_username", ValidatorConfig::new(""))
        .unwrap_err();
    assert!(matches!(err, Error::Config(_)));
}

#[tokio::test(start_paused = true)]
async fn test_double_attach_double_checks() {
    let page = page();
    let _first = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
    let _second = page.validator.attach(&page.form, "id_username", username_config()).unwrap();

    page.form.set_value("id_username", "alice");
    sleep(ms(1100)).await;

    assert_eq!(page.form.listener_count("id_username"), 2);
    assert_eq!(page.checker.calls().len(), 2);
}

#[tokio::test(start_paused = true)]
async fn test_dropped_binding_stops_checking() {
    let page = page();
    let binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
    assert_eq!(page.form.listener_count("id_username"), 1);
    drop(binding);
    assert_eq!(page.form.listener_count("id_username"), 0);

    page.form.set_value("id_username", "alice");
    sleep(ms(1100)).await;
    assert!(page.checker.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_reattaching_does_not_accumulate_listeners() {
    let page = page();
    for _ in 0..50 {
        let binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
        drop(binding);
    }
    let _binding = page.validator.attach(&page.form, "id_username", username_config()).unwrap();
    assert_eq!(page.form.listener_count("id_username"), 1);

    page.form.set_value("id_username", "alice");
    sleep(ms(1100)).await;
    assert_eq!(page.checker.calls().len(), 1);
}
