// src/session/mod.rs
//
// The test-session core: a countdown timer, an answer ledger, a
// navigation cursor and a phase machine tying them together, plus the
// paper loader, the scorer, the result sink and the in-memory store
// that owns the live sessions.

pub mod cursor;
pub mod ledger;
pub mod machine;
pub mod paper;
pub mod scorer;
pub mod sink;
pub mod store;
pub mod timer;
