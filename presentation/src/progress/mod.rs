//! Live rendering of exchanges in the terminal

pub mod renderer;
