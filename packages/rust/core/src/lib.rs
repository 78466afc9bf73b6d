//! Core pipeline orchestration for CoSuJu.
//!
//! This crate ties together harvesting, downloading, and text extraction into
//! the end-to-end scrape (`scrape`), and owns the `data.json` and JSON-lines
//! dataset formats.

pub mod dataset;
pub mod pipeline;
