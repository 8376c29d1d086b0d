//! Privilege-separated packet capture workers.
//!
//! A network address-configuration client needs raw link-layer access for
//! ARP and BOOTP/DHCP traffic, but raw capture does not belong in the
//! long-lived, network-facing main process. This crate isolates it into
//! short-lived worker processes, one per (protocol, interface, peer)
//! stream, connected to an unprivileged controller by a framed control
//! channel. The controller starts and stops workers and exchanges
//! captured/injected frames; each worker drops privileges, opens its
//! filter socket, and runs a drain-and-forward relay loop.
//!
//! The platform primitives — the raw filter socket, process spawning, the
//! readiness scheduler — are consumed through traits so the fabric can be
//! embedded, tested, and replayed without elevated privileges.

pub mod api;
pub mod capture;
pub mod codec;
pub mod controller;
pub mod domain;
pub mod error;
pub mod hardening;
pub mod registry;
pub mod sched;
pub mod sink;
pub mod spawn;
pub mod transport;
pub mod worker;

pub use controller::{dispatch, CommandOutcome, Controller};
pub use error::{Error, Result};
