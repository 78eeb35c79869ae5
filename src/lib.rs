//! Conversation presentation cache for a SIP messaging client.

pub mod app;
pub mod cli;
pub mod domain;
pub mod engine;
pub mod infra;
#[cfg(test)]
mod test_support;
pub mod ui;
pub mod usecases;
