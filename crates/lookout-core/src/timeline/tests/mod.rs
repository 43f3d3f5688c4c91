//! Reducer-level tests.
//!
//! - Golden tests: fixed frame sequences and the timeline they must produce
//! - Property tests: randomized frame streams checked against invariants
