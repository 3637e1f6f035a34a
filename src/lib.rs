#![doc(test(attr(deny(warnings))))]

//! MediAid intake walks a new patient through account creation, risk
//! factors, current medications and medical history, then submits the
//! collected draft to the MediAid API.

pub mod cli;
pub mod errors;
pub mod http;
pub mod session_store;
pub mod utils;

use std::sync::Once;

static INIT_TRACING: Once = Once::new();

/// Initializes global tracing and emits a startup info log.
pub fn init() {
    INIT_TRACING.call_once(|| {
        utils::init_tracing();
        tracing::info!("MediAid intake tracing initialized.");
    });
}

#[cfg(test)]
mod tests {
    #[test]
    fn init_does_not_panic() {
        super::init();
    }
}
