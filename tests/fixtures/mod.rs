//! Test fixtures for evac-router.
//!
//! Provides:
//! - Real Manizales locations and hazard zones around them
//! - A scripted routing provider that records requests and can hold
//!   responses until released

#![allow(dead_code)]

pub mod manizales_locations;
pub mod scripted_provider;

pub use manizales_locations::*;
pub use scripted_provider::*;

use std::future::Future;
use std::time::Duration;

/// Polls `condition` until it holds, failing the test after a few seconds.
pub async fn wait_until<F: FnMut() -> bool>(mut condition: F) {
    let polled = tokio::time::timeout(Duration::from_secs(5), async {
        while !condition() {
            tokio::time::sleep(Duration::from_millis(5)).await;
        }
    })
    .await;
    assert!(polled.is_ok(), "condition not reached in time");
}

/// Awaits `future`, failing the test after a few seconds.
pub async fn within<T>(future: impl Future<Output = T>) -> T {
    tokio::time::timeout(Duration::from_secs(5), future)
        .await
        .expect("timed out")
}
