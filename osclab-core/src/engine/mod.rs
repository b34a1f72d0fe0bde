//! Engine: edge detection, the policy cycle scan, and gain evaluation.
//!
//! Pipeline per run:
//! 1. Raw trigger conditions → edges (`edges`)
//! 2. Edges + prices → action mask (`policy_cycle`)
//! 3. Action mask + prices → gain report (`gains`)

pub mod config;
pub mod edges;
pub mod gains;
pub mod policy_cycle;

pub use config::{GainConfig, PolicyConfig};
pub use edges::{detect_edges, TriggerConditions, TriggerEdges};
pub use gains::{buy_and_hold_return, evaluate_gains, GainReport};
pub use policy_cycle::{
    run_policy_cycle, trace_policy_cycle, ActionKind, CloseReason, CycleAction, CycleTrace,
};
