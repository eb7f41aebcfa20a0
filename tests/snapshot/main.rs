//! Snapshot workflow tests
//!
//! Capture, restore, replay, delete-all and print run end to end against the
//! in-memory directory and broker.

mod capture_replay;
mod delete_all;
mod fixtures;
mod print;
mod restore;
