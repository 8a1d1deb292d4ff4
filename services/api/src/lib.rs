//! services/api/src/lib.rs
//!
//! The StudyAssist web service: server-rendered pages, the chat socket and the
//! JSON API, backed by a hosted auth and data provider.

pub mod adapters;
pub mod config;
pub mod error;
pub mod web;
