//! ratatui widgets for the terminal host.

pub mod dialog;
pub mod status_bar;
pub mod tree;
