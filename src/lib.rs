//! Hearthwood - village agent simulation
//!
//! Agents walk a tile grid, keep memories, plan their days with the help of
//! an optional reasoning service and reflect on each day when it ends.

pub mod core;
pub mod entity;
pub mod llm;
pub mod simulation;
pub mod spatial;
pub mod village;
