//! JSON file persistence for tasks and devices.
//!
//! Two files under a data directory, `tasks.json` and `devices.json`,
//! rewritten whole on every mutation. Reads never fail: a missing or corrupt
//! file degrades to an empty collection (logged). Concurrent writers get
//! last-writer-wins; there is no transaction layer.

pub mod store;

pub use store::JsonStore;
