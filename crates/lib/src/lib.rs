//! podup-lib: convergence engine for podup
//!
//! This crate brings the containers of a compose project into agreement with
//! its manifest:
//! - `manifest`: loading the desired services from a compose file
//! - `fingerprint` and `labels`: change detection and container identity
//! - `inventory`: one listing of the project's containers per invocation
//! - `reconcile`: the per-service decide-and-act cycle
//! - `converge`: fan-out over services plus the orphan pass
//! - `down`, `ps`, `startup`: the remaining lifecycle operations

pub mod config;
pub mod consts;
pub mod converge;
pub mod down;
pub mod fingerprint;
pub mod inventory;
pub mod labels;
pub mod manifest;
pub mod orphans;
pub mod ps;
pub mod reconcile;
pub mod report;
pub mod runtime;
pub mod startup;
pub mod util;
