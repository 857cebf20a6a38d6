//! Unit tests for ingest-recovery-core.
//!
//! Scenario tests for the backup replay engine and the offset retransmitter,
//! driven through scripted collaborators from [`helpers`].

pub mod helpers;
pub mod replay;
pub mod retransmit;
