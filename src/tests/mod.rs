//! Scenario tests for the sharded map.
//!
//! These drive the map through its public API only: concurrent workloads,
//! cross-shard aggregate behavior, and a model check against `HashMap`.
