//! OscLab Core: price series, oscillators, edge detection, the policy cycle
//! engine, and gain evaluation.
//!
//! Data flow for one run:
//! - `PriceSeries` (validated, duplicate-free, time-ordered)
//! - `Oscillator` → raw `TriggerConditions`
//! - `detect_edges` → `TriggerEdges`
//! - `run_policy_cycle` → `ActionMask`
//! - `evaluate_gains` → `GainReport`
//!
//! Every step is a pure function of its inputs. Nothing is cached or shared,
//! so independent runs can execute on any thread.

pub mod domain;
pub mod engine;
pub mod oscillators;

pub use domain::{ActionMask, Bar, InputError, Position, PriceSeries, TradeRecord};
pub use engine::{
    detect_edges, evaluate_gains, run_policy_cycle, trace_policy_cycle, CycleAction, CycleTrace,
    GainConfig, GainReport, PolicyConfig, TriggerConditions, TriggerEdges,
};
pub use oscillators::{Macd, Oscillator, Ultimate};
