//! Tracks how much time is spent coding, per project and per day.
//! An editor host feeds focus and workspace events to the tracker over stdin, recorded time is
//! kept in a small JSON store and can be summarized from the terminal.
//!

pub mod cli;
pub mod fs;
pub mod storage;
pub mod summary;
pub mod tracker;
pub mod utils;
