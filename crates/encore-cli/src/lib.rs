//! Library surface of the encore CLI, exposed for integration tests.
pub mod train;
pub mod util;
