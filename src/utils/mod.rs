//! The `utils` module provides shared building blocks used across the
//! `rpcsub` crate: the error types returned by the transport and client
//! layers, and logging setup for the binary.

pub mod error;
pub mod logging;

#[cfg(test)]
mod tests {
    use super::logging;

    #[test]
    fn logging_init_accepts_levels() {
        // Should not panic
        logging::init("info");
        logging::init("debug");
        logging::init("warn");
        logging::init("nonsense");
    }
}
