//! mail-triage: productive / non-productive email classification backed by Gemini.

pub mod config;
pub mod error;
pub mod llm;
pub mod pipeline;
pub mod server;
pub mod upload;
