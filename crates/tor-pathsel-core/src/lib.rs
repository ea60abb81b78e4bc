#![cfg_attr(docsrs, feature(doc_auto_cfg, doc_cfg))]
// @@ begin lint list maintained by maint/add_warning @@
#![cfg_attr(not(ci_arti_stable), allow(renamed_and_removed_lints))]
#![cfg_attr(not(ci_arti_nightly), allow(unknown_lints))]
#![deny(missing_docs)]
#![warn(noop_method_call)]
#![deny(unreachable_pub)]
#![warn(clippy::all)]
#![deny(clippy::cast_lossless)]
#![deny(clippy::checked_conversions)]
#![warn(clippy::cognitive_complexity)]
#![deny(clippy::exhaustive_enums)]
#![deny(clippy::exhaustive_structs)]
#![deny(clippy::expl_impl_clone_on_copy)]
#![deny(clippy::implicit_clone)]
#![warn(clippy::manual_ok_or)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::needless_borrow)]
#![warn(clippy::needless_pass_by_value)]
#![warn(clippy::option_option)]
#![deny(clippy::unnecessary_wraps)]
#![deny(clippy::unwrap_used)]
//! <!-- @@ end lint list maintained by maint/add_warning @@ -->
//!
//! A deterministic simulator of Tor client path selection.
//!
//! Given a chronological sequence of consensus periods (a relay population
//! plus bandwidth-weighting parameters, valid over a bounded time window)
//! and a chronological list of client stream requests, this crate
//! reproduces the decisions a Tor client makes: which three relays compose
//! each circuit, when a circuit is built, reused, or discarded, and how
//! persistent entry guards evolve across consensuses.
//!
//! This crate does *not* parse consensus documents or server descriptors —
//! see [`relay`] and [`consensus`] for the already-typed shape it expects
//! its caller to supply, and [`driver::Simulation`] for the entry point
//! that drives a sequence of periods once that data is in hand.
//!
//! # Module map
//!
//! - [`relay`], [`policy`], [`consensus`], [`stream`]: the data model.
//! - [`predicate`]: family and /16-subnet distinctness tests (C1).
//! - [`weight`]: bandwidth-weight table application (C2).
//! - [`sample`]: weighted random selection (C3).
//! - [`filter`]: exit/middle candidate pruning (C4).
//! - [`guardmgr`]: per-client guard list lifecycle (C5).
//! - [`circuit`]: the three-hop path-selection algorithm (C6).
//! - [`client`]: per-client circuit pool and per-tick processing (C7).
//! - [`driver`]: consensus and time-step iteration (C8).

pub mod circuit;
pub mod client;
pub mod consensus;
pub mod consts;
pub mod driver;
pub mod error;
pub mod filter;
pub mod guardmgr;
pub mod policy;
pub mod predicate;
pub mod relay;
pub mod sample;
pub mod stream;
pub mod time;
pub mod weight;

pub use error::{Error, ErrorKind, HasKind, Result};
