//! papersum - research paper summarizer backed by Google Gemini.
//!
//! Extracts text from uploaded papers, asks the model for a structured
//! summary or a literature review, and repairs whatever comes back into a
//! shape-stable JSON document.

pub mod cli;
pub mod config;
pub mod extract;
pub mod llm;
pub mod models;
pub mod repair;
pub mod server;
pub mod service;
pub mod utils;
