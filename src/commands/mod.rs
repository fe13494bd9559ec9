//! Command implementations for fitcheck CLI

mod analyze;
mod measurements;
mod misc;

pub use analyze::*;
pub use measurements::*;
pub use misc::*;
