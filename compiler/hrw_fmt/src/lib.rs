//! Output assembly for the hrw4u translator.
//!
//! Code generation in both directions accumulates thousands of small
//! fragments. [`OutputAssembler`] appends them into one growable buffer so the
//! total cost stays linear in the output length.

mod assembler;

pub use assembler::{OutputAssembler, INDENT_WIDTH};
