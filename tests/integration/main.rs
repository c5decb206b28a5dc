//! Integration test driver for `tests/integration/` submodule.
//!
//! Each `mod` below maps to a file that exercises one phase or the whole
//! session against the simulated hardware in `mock_hw`.  All tests run on
//! the host with a simulated clock; no real time passes and no device node
//! is opened.

mod charge_tests;
mod discharge_tests;
mod fire_tests;
