//! `tickboot-runtime` supervises a single worker that is run exactly once per tick of an external
//! host, under a resource budget metered by that host.
//!
//! The worker is loaded in stages spread over as many ticks as the budget requires, then run once
//! every tick. Any fault, including a tick that never returns at all, makes the supervisor ask the
//! host to throw away the whole environment instead of trying to recover in place.

#![deny(bare_trait_objects)]

#[macro_use]
pub mod error;

pub mod budget;
pub mod environment;
pub mod fault;
pub mod host;
pub mod loader;
pub mod provider;
pub mod reset;
pub mod supervisor;
