//! Routing provider that replays scripted responses.

use std::collections::VecDeque;
use std::sync::Mutex;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use tokio::sync::Semaphore;

use evac_router::Coordinate;
use evac_router::error::ProviderError;
use evac_router::polyline::Polyline;
use evac_router::traits::{RouteRequest, RouteResponse, RoutingProvider};

/// Replays queued responses in order and records every request.
///
/// A gated provider holds each response until [`ScriptedProvider::release`]
/// is called.
#[derive(Debug, Default)]
pub struct ScriptedProvider {
    responses: Mutex<VecDeque<Result<Vec<Coordinate>, String>>>,
    requests: Mutex<Vec<RouteRequest>>,
    responded: AtomicUsize,
    gate: Option<Semaphore>,
}

impl ScriptedProvider {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_route(self, path: Vec<Coordinate>) -> Self {
        self.responses.lock().unwrap().push_back(Ok(path));
        self
    }

    pub fn with_failure(self, reason: &str) -> Self {
        self.responses.lock().unwrap().push_back(Err(reason.to_string()));
        self
    }

    pub fn gated(mut self) -> Self {
        self.gate = Some(Semaphore::new(0));
        self
    }

    /// Lets `n` held responses through.
    pub fn release(&self, n: usize) {
        if let Some(gate) = &self.gate {
            gate.add_permits(n);
        }
    }

    pub fn requests(&self) -> Vec<RouteRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn calls(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn responded(&self) -> usize {
        self.responded.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl RoutingProvider for ScriptedProvider {
    async fn route(&self, request: &RouteRequest) -> Result<RouteResponse, ProviderError> {
        self.requests.lock().unwrap().push(request.clone());
        if let Some(gate) = &self.gate {
            gate.acquire().await.expect("gate closed").forget();
        }

        let next = self.responses.lock().unwrap().pop_front();
        self.responded.fetch_add(1, Ordering::SeqCst);
        match next {
            Some(Ok(path)) => Ok(RouteResponse {
                geometry: Some(Polyline::new(path).encode(5)),
                precision: 5,
            }),
            Some(Err(reason)) => Err(ProviderError::Rejected(reason)),
            None => Err(ProviderError::Rejected("no scripted response".to_string())),
        }
    }
}
