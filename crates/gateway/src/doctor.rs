//! Connectivity report for configured providers.

use axum::{extract::State, Json};
use futures::future::join_all;
use serde::Serialize;
use std::sync::Arc;
use std::time::Instant;

use webs_core::traits::ChatBackend;

use crate::server::AppState;

#[derive(Debug, Serialize)]
pub struct DoctorReport {
    pub checks: Vec<CheckResult>,
    pub overall_status: String,
}

#[derive(Debug, Serialize)]
pub struct CheckResult {
    pub category: String,
    pub name: String,
    pub status: String, // "pass", "fail", "warn"
    pub message: Option<String>,
    pub latency_ms: Option<u64>,
}

impl CheckResult {
    fn pass(category: &str, name: &str, latency: Option<u64>) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            status: "pass".to_string(),
            message: None,
            latency_ms: latency,
        }
    }

    fn fail(category: &str, name: &str, message: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            status: "fail".to_string(),
            message: Some(message),
            latency_ms: None,
        }
    }

    fn warn(category: &str, name: &str, message: String) -> Self {
        Self {
            category: category.to_string(),
            name: name.to_string(),
            status: "warn".to_string(),
            message: Some(message),
            latency_ms: None,
        }
    }
}

async fn check_provider(provider: Arc<dyn ChatBackend>) -> CheckResult {
    let start = Instant::now();
    match provider.health_check().await {
        Ok(()) => {
            let latency = start.elapsed().as_millis() as u64;
            CheckResult::pass("Provider", provider.name(), Some(latency))
        }
        Err(e) => CheckResult::fail("Provider", provider.name(), e.to_string()),
    }
}

/// Check every provider concurrently and summarize.
pub async fn run_checks(state: &AppState) -> DoctorReport {
    let providers = state.orchestrator.providers().providers().to_vec();

    let mut checks = Vec::new();
    if providers.is_empty() {
        checks.push(CheckResult::warn(
            "Provider",
            "Configuration",
            "No providers configured".to_string(),
        ));
    } else {
        checks.extend(join_all(providers.into_iter().map(check_provider)).await);
    }

    let sessions = state.orchestrator.sessions().len();
    checks.push(CheckResult {
        message: Some(format!("{} live sessions", sessions)),
        ..CheckResult::pass("Storage", "Session Store", None)
    });

    let overall_status = if checks.iter().all(|c| c.status == "pass") {
        "healthy".to_string()
    } else {
        "degraded".to_string()
    };

    DoctorReport {
        checks,
        overall_status,
    }
}

pub async fn check_all(State(state): State<Arc<AppState>>) -> Json<DoctorReport> {
    let report = run_checks(&state).await;
    tracing::info!(overall_status = %report.overall_status, checks = report.checks.len(), "Doctor checks complete");
    Json(report)
}
