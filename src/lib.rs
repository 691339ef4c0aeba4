//! Polls news pages and feeds, detects new items and posts them to a chat
//! destination.

pub mod cli;
pub mod config;
pub mod document;
pub mod domain;
pub mod errors;
pub mod fetch;
pub mod services;
pub mod sinks;
pub mod strategies;

#[cfg(test)]
mod testing;
