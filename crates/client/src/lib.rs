//! Client code for stackpager.
//!
//! This crate provides the upstream Stack Exchange API client and the
//! [`QuestionSource`] seam the query orchestrator fetches through.

pub mod stackexchange;

pub use stackexchange::{
    ExhaustionInfo, FetchOutcome, PAGE_SIZE, QuestionQuery, QuestionSource, StackClient, StackConfig, StackError,
};
