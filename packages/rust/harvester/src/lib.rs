//! Archive harvesting: HTTP fetches, anchor parsing, and link selection.
//!
//! This crate provides:
//! - [`links`]: anchor collection and the summary/judgement suffix heuristics
//! - [`Harvester`]: sequential, rate-limited page fetches and streamed downloads

pub mod client;
pub mod links;

pub use client::{DownloadOutcome, HarvestOptions, Harvester};
pub use links::{
    DecisionPage, DocumentLinks, collect_hrefs, decision_links, filename_from_url, page_title,
    parse_decision_page, resolve_link, select_documents,
};
