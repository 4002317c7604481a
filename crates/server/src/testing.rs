//! Test doubles shared by the server's unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use stackpager_client::{FetchOutcome, QuestionSource, StackError};
use stackpager_core::{QueryIdentity, Row};

/// A question source that replays scripted outcomes and counts calls.
#[derive(Default)]
pub struct ScriptedSource {
    outcomes: Mutex<VecDeque<Result<FetchOutcome, StackError>>>,
    pages: Mutex<Vec<u32>>,
    calls: AtomicUsize,
}

impl ScriptedSource {
    pub fn new(outcomes: Vec<Result<FetchOutcome, StackError>>) -> Self {
        Self { outcomes: Mutex::new(outcomes.into()), ..Default::default() }
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    pub fn requested_pages(&self) -> Vec<u32> {
        self.pages.lock().unwrap().clone()
    }
}

#[async_trait::async_trait]
impl QuestionSource for ScriptedSource {
    async fn fetch_page(&self, _identity: &QueryIdentity, page_number: u32) -> Result<FetchOutcome, StackError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        self.pages.lock().unwrap().push(page_number);
        self.outcomes
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| Err(StackError::Parse("no scripted outcome left".into())))
    }
}

pub fn row(title: &str) -> Row {
    Row {
        title: title.to_string(),
        tags: vec!["rust".into(), "tokio".into()],
        link: format!("https://stackoverflow.com/questions/{title}"),
    }
}

pub fn page_of(titles: &[&str], has_more: bool) -> FetchOutcome {
    FetchOutcome::Page { rows: titles.iter().map(|t| row(t)).collect(), has_more }
}
