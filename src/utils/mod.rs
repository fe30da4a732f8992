//! Helpers outside the row model.

pub mod text_diff;
