use std::cell::RefCell;

use anyhow::{Result, anyhow};
use ratings_terminal::ratings_api::{PlayerResult, RatingsReply, RatingsService};
use ratings_terminal::state::{
    AppState, Delta, EMPTY_INPUT_NOTICE, FETCH_FAILED_NOTICE, ProviderCommand,
    UNEXPECTED_REPLY_NOTICE, apply_delta, submit_with,
};

enum Script {
    Reply(RatingsReply),
    Fail(&'static str),
}

struct ScriptedService {
    script: Script,
    calls: RefCell<Vec<Vec<String>>>,
}

impl ScriptedService {
    fn new(script: Script) -> Self {
        Self {
            script,
            calls: RefCell::new(Vec::new()),
        }
    }

    fn call_count(&self) -> usize {
        self.calls.borrow().len()
    }
}

impl RatingsService for ScriptedService {
    fn fetch_ratings(&self, names: &[String]) -> Result<RatingsReply> {
        self.calls.borrow_mut().push(names.to_vec());
        match &self.script {
            Script::Reply(reply) => Ok(reply.clone()),
            Script::Fail(msg) => Err(anyhow!(*msg)),
        }
    }
}

fn player(name: &str, rating: f64) -> PlayerResult {
    PlayerResult {
        name: name.to_string(),
        rating: Some(rating),
    }
}

fn alice_and_bob() -> RatingsReply {
    RatingsReply::Results(vec![player("Alice", 1800.0), player("Bob", 2050.0)])
}

#[test]
fn blank_lines_are_not_sent() {
    let service = ScriptedService::new(Script::Reply(alice_and_bob()));
    let mut state = AppState::new();
    state.input = "Alice\n\n   \nBob\n".to_string();

    assert!(submit_with(&mut state, &service));
    assert_eq!(service.calls.borrow()[0], vec!["Alice", "Bob"]);
}

#[test]
fn empty_input_shows_notice_without_request() {
    let service = ScriptedService::new(Script::Reply(alice_and_bob()));
    let mut state = AppState::new();
    state.input = " \n\t\n".to_string();

    assert!(!submit_with(&mut state, &service));
    assert_eq!(service.call_count(), 0);
    assert_eq!(state.notice.as_deref(), Some(EMPTY_INPUT_NOTICE));
    assert!(!state.busy);
    assert_eq!(state.latest_request, 0);
}

#[test]
fn results_render_in_order_with_emphasis_and_count() {
    let service = ScriptedService::new(Script::Reply(alice_and_bob()));
    let mut state = AppState::new();
    state.input = "Alice\nBob".to_string();

    submit_with(&mut state, &service);

    assert_eq!(state.rows.len(), 2);
    assert_eq!(state.rows[0].name, "Alice");
    assert_eq!(state.rows[0].rating, "1800");
    assert!(!state.rows[0].emphasized);
    assert_eq!(state.rows[1].name, "Bob");
    assert_eq!(state.rows[1].rating, "2050");
    assert!(state.rows[1].emphasized);
    assert_eq!(state.result_count, "2 found");
    assert!(state.results_visible);
    assert!(state.notice.is_none());
    assert!(!state.busy);
}

#[test]
fn server_error_is_surfaced_and_table_stays_hidden() {
    let service = ScriptedService::new(Script::Reply(RatingsReply::Error(
        "rate limited".to_string(),
    )));
    let mut state = AppState::new();
    state.input = "Alice".to_string();

    submit_with(&mut state, &service);

    let notice = state.notice.clone().expect("notice should be shown");
    assert!(notice.contains("rate limited"));
    assert!(state.rows.is_empty());
    assert!(!state.results_visible);
    assert!(!state.busy);
}

#[test]
fn transport_failure_shows_generic_notice_and_reenables_submit() {
    let service = ScriptedService::new(Script::Fail("connection refused"));
    let mut state = AppState::new();
    state.input = "Alice".to_string();

    submit_with(&mut state, &service);

    assert_eq!(state.notice.as_deref(), Some(FETCH_FAILED_NOTICE));
    assert!(state.submit_enabled());
    assert!(
        state
            .logs
            .iter()
            .any(|l| l.starts_with("[ERROR]") && l.contains("connection refused"))
    );
}

#[test]
fn unexpected_shape_is_treated_as_error() {
    let service = ScriptedService::new(Script::Reply(RatingsReply::Unexpected(
        "empty object".to_string(),
    )));
    let mut state = AppState::new();
    state.input = "Alice".to_string();

    submit_with(&mut state, &service);

    assert_eq!(state.notice.as_deref(), Some(UNEXPECTED_REPLY_NOTICE));
    assert!(!state.busy);
    assert!(!state.results_visible);
}

#[test]
fn resubmit_replaces_previous_rows() {
    let first = ScriptedService::new(Script::Reply(alice_and_bob()));
    let second = ScriptedService::new(Script::Reply(RatingsReply::Results(vec![player(
        "Carol", 1500.0,
    )])));
    let mut state = AppState::new();
    state.input = "Alice\nBob".to_string();
    submit_with(&mut state, &first);
    assert_eq!(state.rows.len(), 2);

    state.input = "Carol".to_string();
    submit_with(&mut state, &second);

    assert_eq!(state.rows.len(), 1);
    assert_eq!(state.rows[0].name, "Carol");
    assert_eq!(state.result_count, "1 found");
}

#[test]
fn begin_submit_enters_loading_and_clears_rows() {
    let service = ScriptedService::new(Script::Reply(alice_and_bob()));
    let mut state = AppState::new();
    state.input = "Alice\nBob".to_string();
    submit_with(&mut state, &service);

    let cmd = state.begin_submit().expect("names should produce a command");
    assert_eq!(
        cmd,
        ProviderCommand::FetchRatings {
            request_id: 2,
            names: vec!["Alice".to_string(), "Bob".to_string()],
        }
    );
    assert!(state.busy);
    assert!(!state.submit_enabled());
    assert!(state.rows.is_empty());
    assert!(!state.results_visible);
}

#[test]
fn stale_response_is_dropped_and_latest_wins() {
    let mut state = AppState::new();
    state.input = "Alice".to_string();
    state.begin_submit().expect("first command");
    state.input = "Bob".to_string();
    state.begin_submit().expect("second command");
    assert_eq!(state.latest_request, 2);

    apply_delta(
        &mut state,
        Delta::RatingsLoaded {
            request_id: 2,
            reply: RatingsReply::Results(vec![player("Bob", 2050.0)]),
        },
    );
    apply_delta(
        &mut state,
        Delta::RatingsLoaded {
            request_id: 1,
            reply: RatingsReply::Results(vec![player("Alice", 1800.0)]),
        },
    );

    assert_eq!(state.rows.len(), 1);
    assert_eq!(state.rows[0].name, "Bob");
    assert!(!state.busy);
}

#[test]
fn stale_failure_does_not_end_loading() {
    let mut state = AppState::new();
    state.input = "Alice".to_string();
    state.begin_submit().expect("first command");
    state.begin_submit().expect("second command");

    apply_delta(
        &mut state,
        Delta::RatingsFailed {
            request_id: 1,
            error: "timed out".to_string(),
        },
    );

    assert!(state.busy);
    assert!(state.notice.is_none());
}

#[test]
fn missing_rating_renders_dash_without_emphasis() {
    let mut state = AppState::new();
    state.render_results(&[PlayerResult {
        name: "Unrated".to_string(),
        rating: None,
    }]);
    assert_eq!(state.rows[0].rating, "-");
    assert!(!state.rows[0].emphasized);
    assert_eq!(state.result_count, "1 found");
}

#[test]
fn log_is_bounded() {
    let mut state = AppState::new();
    for i in 0..250 {
        state.push_log(format!("[INFO] {i}"));
    }
    assert_eq!(state.logs.len(), 200);
    assert_eq!(state.logs.front().map(String::as_str), Some("[INFO] 50"));
}

#[test]
fn submit_key_is_ignored_while_notice_is_shown() {
    let mut state = AppState::new();
    state.input = "   ".to_string();
    assert!(state.press_submit().is_none());
    assert!(state.notice_blocks_input());

    state.input = "Alice".to_string();
    assert!(state.press_submit().is_none());
    assert_eq!(state.latest_request, 0);
    assert!(!state.busy);

    state.dismiss_notice();
    assert!(!state.notice_blocks_input());
    assert!(state.press_submit().is_some());
    assert_eq!(state.latest_request, 1);
}

#[test]
fn submit_key_is_ignored_while_fetch_in_flight() {
    let mut state = AppState::new();
    state.input = "Alice".to_string();
    assert!(state.press_submit().is_some());

    assert!(state.press_submit().is_none());
    assert_eq!(state.latest_request, 1);
    assert_eq!(
        state.logs.back().map(String::as_str),
        Some("[INFO] Fetch already in progress")
    );

    apply_delta(
        &mut state,
        Delta::RatingsFailed {
            request_id: 1,
            error: "connection reset".to_string(),
        },
    );
    state.dismiss_notice();
    assert!(state.press_submit().is_some());
    assert_eq!(state.latest_request, 2);
}
