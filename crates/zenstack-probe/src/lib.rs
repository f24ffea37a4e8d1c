//! Probe library for the domain observability core.
//!
//! Every operation here returns an observation value, never an error:
//! a failed dial is data, classified by [`ProbeErrorKind`], and must not
//! abort the orchestrator that requested it.

pub mod http;
pub mod tls;
pub mod whois;

pub use http::HttpProber;
pub use zenstack_common::types::ProbeErrorKind;
