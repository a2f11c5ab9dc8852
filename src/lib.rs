pub mod apis;
pub mod common;
pub mod config;
pub mod datetime;
pub mod matching;
pub mod observability;
pub mod pipeline;
pub mod storage;
