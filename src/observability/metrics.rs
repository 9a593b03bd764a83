//! Metrics collection.
//!
//! # Metrics
//! - `router_navigations_total` (counter): navigations by mode and outcome
//!   (`committed`, `pending`, `noop`)
//! - `router_stale_completions_total` (counter): discarded load completions
//! - `router_history_publishes_total` (counter): browser writes by mode
//! - `router_scopes_mounted_total` / `router_scopes_torn_down_total` (counters)
//!
//! # Design Decisions
//! - Recorded through the `metrics` facade; no exporter is installed here
//! - Labels are static strings

use ::metrics::counter;

pub fn record_navigation(mode: &'static str, outcome: &'static str) {
    counter!("router_navigations_total", "mode" => mode, "outcome" => outcome).increment(1);
}

pub fn record_stale_completion(mode: &'static str) {
    counter!("router_stale_completions_total", "mode" => mode).increment(1);
}

pub fn record_history_publish(mode: &'static str) {
    counter!("router_history_publishes_total", "mode" => mode).increment(1);
}

pub fn record_scope_mounted(mode: &'static str) {
    counter!("router_scopes_mounted_total", "mode" => mode).increment(1);
}

pub fn record_scope_torn_down(mode: &'static str) {
    counter!("router_scopes_torn_down_total", "mode" => mode).increment(1);
}
