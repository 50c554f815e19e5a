//! Test suites for the localstream host.

mod framing;
mod support;
