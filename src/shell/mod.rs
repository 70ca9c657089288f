//! Parallel shells: detached client processes running a script body
//! alongside the test.
mod launcher;
mod script;
pub use launcher::*;
pub use script::*;
