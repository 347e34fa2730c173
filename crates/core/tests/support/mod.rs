//! Shared test helpers for `dealroom-core` integration tests.
//!
//! Lightweight, scriptable mocks for every session port so coordinator tests
//! can focus on behaviour instead of boilerplate.

pub mod ports;
