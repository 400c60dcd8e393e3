//! The mirror pipeline: coordinator and worker pool
//!
//! A bounded pool of workers pulls units from the frontier; each worker runs
//! resolve -> fetch -> rewrite -> write -> record for its unit, then loops.
//! The stylesheet consolidation pass runs strictly after every worker has
//! finished.

mod coordinator;
mod worker;

pub use coordinator::{run_mirror, Coordinator, MirrorRun, MirrorSummary};
