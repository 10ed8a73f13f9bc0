use std::collections::VecDeque;

use crate::names::split_names;
use crate::ratings_api::{PlayerResult, RatingsReply, RatingsService};

/// Ratings at or above this get the gold/bold treatment.
pub const HIGH_RATING_THRESHOLD: f64 = 2000.0;

pub const EMPTY_INPUT_NOTICE: &str = "Please enter at least one player name.";
pub const FETCH_FAILED_NOTICE: &str = "An error occurred while fetching ratings.";
pub const UNEXPECTED_REPLY_NOTICE: &str = "Unexpected response from the ratings service.";

const MAX_LOGS: usize = 200;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Focus {
    Names,
    Results,
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResultRow {
    pub name: String,
    pub rating: String,
    pub rating_value: Option<f64>,
    pub emphasized: bool,
}

impl ResultRow {
    pub fn from_result(result: &PlayerResult) -> Self {
        Self {
            name: result.name.clone(),
            rating: format_rating(result.rating),
            rating_value: result.rating,
            emphasized: is_high_rating(result.rating),
        }
    }
}

#[derive(Debug, Clone)]
pub struct AppState {
    pub input: String,
    pub focus: Focus,
    /// Loading state: the submit control is disabled while set.
    pub busy: bool,
    pub results_visible: bool,
    pub rows: Vec<ResultRow>,
    pub result_count: String,
    pub selected: usize,
    /// Blocking notice; input other than dismiss/quit is ignored while set.
    pub notice: Option<String>,
    pub logs: VecDeque<String>,
    pub help_overlay: bool,
    pub last_updated: Option<String>,
    pub latest_request: u64,
    pub pending_names: usize,
}

impl Default for AppState {
    fn default() -> Self {
        Self::new()
    }
}

impl AppState {
    pub fn new() -> Self {
        Self {
            input: String::new(),
            focus: Focus::Names,
            busy: false,
            results_visible: false,
            rows: Vec::new(),
            result_count: String::new(),
            selected: 0,
            notice: None,
            logs: VecDeque::new(),
            help_overlay: false,
            last_updated: None,
            latest_request: 0,
            pending_names: 0,
        }
    }

    pub fn submit_enabled(&self) -> bool {
        !self.busy
    }

    /// While a notice is up only dismiss and quit get through.
    pub fn notice_blocks_input(&self) -> bool {
        self.notice.is_some()
    }

    /// Submit as triggered from the keyboard: a no-op while a notice is shown
    /// or a fetch is in flight.
    pub fn press_submit(&mut self) -> Option<ProviderCommand> {
        if self.notice_blocks_input() {
            return None;
        }
        if !self.submit_enabled() {
            self.push_log("[INFO] Fetch already in progress");
            return None;
        }
        self.begin_submit()
    }

    /// Starts a submit cycle. Returns the command to hand to the worker, or
    /// `None` when there is nothing to send.
    pub fn begin_submit(&mut self) -> Option<ProviderCommand> {
        let names = split_names(&self.input);
        if names.is_empty() {
            self.notify(EMPTY_INPUT_NOTICE);
            return None;
        }

        if self.busy {
            self.push_log(format!(
                "[INFO] Request #{} superseded",
                self.latest_request
            ));
        }

        self.latest_request += 1;
        self.busy = true;
        self.pending_names = names.len();
        self.results_visible = false;
        self.rows.clear();
        self.selected = 0;
        self.push_log(format!(
            "[INFO] Request #{} sent ({} names)",
            self.latest_request,
            names.len()
        ));

        Some(ProviderCommand::FetchRatings {
            request_id: self.latest_request,
            names,
        })
    }

    pub fn is_current_request(&self, request_id: u64) -> bool {
        request_id == self.latest_request
    }

    pub fn end_loading(&mut self) {
        self.busy = false;
        self.pending_names = 0;
    }

    pub fn render_results(&mut self, results: &[PlayerResult]) {
        self.rows.clear();
        self.rows.extend(results.iter().map(ResultRow::from_result));
        self.selected = 0;
        self.result_count = format!("{} found", results.len());
        self.last_updated = Some(chrono::Local::now().format("%H:%M:%S").to_string());
        self.results_visible = true;
    }

    pub fn notify(&mut self, msg: impl Into<String>) {
        let msg = msg.into();
        self.push_log(format!("[INFO] Notice: {msg}"));
        self.notice = Some(msg);
    }

    pub fn dismiss_notice(&mut self) {
        self.notice = None;
    }

    pub fn push_log(&mut self, msg: impl Into<String>) {
        self.logs.push_back(msg.into());
        while self.logs.len() > MAX_LOGS {
            self.logs.pop_front();
        }
    }

    pub fn insert_char(&mut self, ch: char) {
        self.input.push(ch);
    }

    pub fn insert_newline(&mut self) {
        self.input.push('\n');
    }

    pub fn backspace(&mut self) {
        self.input.pop();
    }

    pub fn clear_input(&mut self) {
        self.input.clear();
    }

    pub fn toggle_focus(&mut self) {
        self.focus = match self.focus {
            Focus::Names => Focus::Results,
            Focus::Results => Focus::Names,
        };
    }

    pub fn select_next(&mut self) {
        if self.rows.is_empty() {
            return;
        }
        self.selected = (self.selected + 1).min(self.rows.len() - 1);
    }

    pub fn select_prev(&mut self) {
        self.selected = self.selected.saturating_sub(1);
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum ProviderCommand {
    FetchRatings { request_id: u64, names: Vec<String> },
}

#[derive(Debug, Clone, PartialEq)]
pub enum Delta {
    RatingsLoaded { request_id: u64, reply: RatingsReply },
    RatingsFailed { request_id: u64, error: String },
    Log(String),
}

pub fn apply_delta(state: &mut AppState, delta: Delta) {
    match delta {
        Delta::Log(msg) => state.push_log(msg),
        Delta::RatingsLoaded { request_id, reply } => {
            if !accept_response(state, request_id) {
                return;
            }
            match reply {
                RatingsReply::Results(results) => {
                    state.render_results(&results);
                    state.push_log(format!(
                        "[INFO] Request #{request_id}: {} found",
                        results.len()
                    ));
                }
                RatingsReply::Error(message) => {
                    state.push_log(format!("[WARN] Request #{request_id}: {message}"));
                    state.notify(format!("Error: {message}"));
                }
                RatingsReply::Unexpected(shape) => {
                    state.push_log(format!(
                        "[WARN] Request #{request_id}: unexpected response ({shape})"
                    ));
                    state.notify(UNEXPECTED_REPLY_NOTICE);
                }
            }
            state.end_loading();
        }
        Delta::RatingsFailed { request_id, error } => {
            if !accept_response(state, request_id) {
                return;
            }
            state.push_log(format!("[ERROR] Error fetching ratings: {error}"));
            state.notify(FETCH_FAILED_NOTICE);
            state.end_loading();
        }
    }
}

/// Runs one whole cycle on the calling thread. Returns whether a request was issued.
pub fn submit_with<S: RatingsService + ?Sized>(state: &mut AppState, service: &S) -> bool {
    let Some(ProviderCommand::FetchRatings { request_id, names }) = state.begin_submit() else {
        return false;
    };
    let delta = match service.fetch_ratings(&names) {
        Ok(reply) => Delta::RatingsLoaded { request_id, reply },
        Err(err) => Delta::RatingsFailed {
            request_id,
            error: format!("{err:#}"),
        },
    };
    apply_delta(state, delta);
    true
}

pub fn is_high_rating(rating: Option<f64>) -> bool {
    rating.is_some_and(|r| r >= HIGH_RATING_THRESHOLD)
}

pub fn format_rating(rating: Option<f64>) -> String {
    match rating {
        None => "-".to_string(),
        Some(r) if r.is_finite() && r.fract() == 0.0 && r.abs() < 1e15 => format!("{}", r as i64),
        Some(r) => r.to_string(),
    }
}

fn accept_response(state: &mut AppState, request_id: u64) -> bool {
    if state.is_current_request(request_id) {
        return true;
    }
    state.push_log(format!(
        "[INFO] Dropped stale response #{request_id} (latest #{})",
        state.latest_request
    ));
    false
}
