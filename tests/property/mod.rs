//! Property-based tests

mod event_proptest;
mod pair_proptest;
