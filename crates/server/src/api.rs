//! HTTP handlers for the task and device CRUD surface, completion and
//! postpone operations, and the Home Assistant action callback.

use std::sync::Arc;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use chrono::{DateTime, Days, FixedOffset};
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::info;

use chores_core::{ChoresError, Device, Frequency, Task};

use crate::state::AppState;

#[derive(Debug, Serialize)]
pub struct ErrorResponse {
    pub error: String,
}

pub type ApiError = (StatusCode, Json<ErrorResponse>);

fn not_found(what: impl Into<String>) -> ApiError {
    (
        StatusCode::NOT_FOUND,
        Json(ErrorResponse { error: what.into() }),
    )
}

fn bad_request(what: impl Into<String>) -> ApiError {
    (
        StatusCode::BAD_REQUEST,
        Json(ErrorResponse { error: what.into() }),
    )
}

fn internal(err: ChoresError) -> ApiError {
    (
        StatusCode::INTERNAL_SERVER_ERROR,
        Json(ErrorResponse {
            error: err.to_string(),
        }),
    )
}

// ── Service metadata ──────────────────────────────────────────────

pub async fn root(State(state): State<Arc<AppState>>) -> Json<serde_json::Value> {
    Json(json!({
        "service": "chores",
        "version": env!("CARGO_PKG_VERSION"),
        "config": state.config.redacted_summary(),
    }))
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub version: &'static str,
    pub uptime_secs: u64,
    pub ha_connected: bool,
}

pub async fn health(State(state): State<Arc<AppState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        version: env!("CARGO_PKG_VERSION"),
        uptime_secs: state.started_at.elapsed().as_secs(),
        ha_connected: state.notifier.check_connection().await,
    })
}

// ── Tasks ─────────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct TaskCreateRequest {
    pub name: String,
    pub frequency: Frequency,
    #[serde(default)]
    pub assigned_to: Vec<String>,
}

#[derive(Debug, Deserialize)]
pub struct TaskUpdateRequest {
    pub name: Option<String>,
    pub frequency: Option<Frequency>,
    pub assigned_to: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
pub struct TaskPostponeRequest {
    pub next_due: DateTime<FixedOffset>,
}

pub async fn tasks_list(State(state): State<Arc<AppState>>) -> Json<Vec<Task>> {
    Json(state.store.tasks())
}

/// Create a task. `last_done` starts at the current instant, so the first
/// reminder lands one full recurrence interval from creation.
pub async fn tasks_create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<TaskCreateRequest>,
) -> Result<(StatusCode, Json<Task>), ApiError> {
    if req.name.trim().is_empty() {
        return Err(bad_request("task name must not be empty"));
    }

    let now = state.policy.now().fixed_offset();
    let next_due = state
        .policy
        .compute_next_due(req.frequency, now)
        .map_err(internal)?;

    let task = Task {
        id: Task::new_id(),
        name: req.name,
        frequency: req.frequency,
        last_done: now,
        next_due,
        assigned_to: req.assigned_to,
    };
    state.store.save_task(&task).map_err(internal)?;

    info!(task_id = %task.id, name = %task.name, frequency = %task.frequency, "Task created");
    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn tasks_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    state
        .store
        .task(&id)
        .map(Json)
        .ok_or_else(|| not_found(format!("task {id} not found")))
}

/// Partial update. Changing the frequency recomputes `next_due` from the
/// unchanged `last_done`.
pub async fn tasks_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TaskUpdateRequest>,
) -> Result<Json<Task>, ApiError> {
    let mut task = state
        .store
        .task(&id)
        .ok_or_else(|| not_found(format!("task {id} not found")))?;

    if let Some(name) = req.name {
        if name.trim().is_empty() {
            return Err(bad_request("task name must not be empty"));
        }
        task.name = name;
    }
    if let Some(assigned_to) = req.assigned_to {
        task.assigned_to = assigned_to;
    }
    if let Some(frequency) = req.frequency {
        if frequency != task.frequency {
            task.frequency = frequency;
            task.next_due = state
                .policy
                .compute_next_due(frequency, task.last_done)
                .map_err(internal)?;
        }
    }

    state.store.save_task(&task).map_err(internal)?;
    Ok(Json(task))
}

pub async fn tasks_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.task(&id).is_none() {
        return Err(not_found(format!("task {id} not found")));
    }
    state.store.delete_task(&id).map_err(internal)?;
    info!(task_id = %id, "Task deleted");
    Ok(StatusCode::NO_CONTENT)
}

fn mark_done(state: &AppState, id: &str) -> Result<Task, ApiError> {
    let mut task = state
        .store
        .task(id)
        .ok_or_else(|| not_found(format!("task {id} not found")))?;

    let now = state.policy.now().fixed_offset();
    task.last_done = now;
    task.next_due = state
        .policy
        .compute_next_due(task.frequency, now)
        .map_err(internal)?;
    state.store.save_task(&task).map_err(internal)?;

    info!(task_id = %task.id, next_due = %task.next_due, "Task completed");
    Ok(task)
}

pub async fn tasks_done(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Task>, ApiError> {
    mark_done(&state, &id).map(Json)
}

/// Push `next_due` to a caller-chosen instant without touching `last_done`.
pub async fn tasks_postpone(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<TaskPostponeRequest>,
) -> Result<Json<Task>, ApiError> {
    let mut task = state
        .store
        .task(&id)
        .ok_or_else(|| not_found(format!("task {id} not found")))?;

    task.next_due = req.next_due;
    state.store.save_task(&task).map_err(internal)?;

    info!(task_id = %task.id, next_due = %task.next_due, "Task postponed");
    Ok(Json(task))
}

// ── Devices ───────────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct DeviceCreateRequest {
    pub id: String,
    pub notify_service: String,
}

#[derive(Debug, Deserialize)]
pub struct DeviceUpdateRequest {
    pub notify_service: String,
}

pub async fn devices_list(State(state): State<Arc<AppState>>) -> Json<Vec<Device>> {
    Json(state.store.devices())
}

pub async fn devices_get(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<Json<Device>, ApiError> {
    state
        .store
        .device(&id)
        .map(Json)
        .ok_or_else(|| not_found(format!("device {id} not found")))
}

pub async fn devices_create(
    State(state): State<Arc<AppState>>,
    Json(req): Json<DeviceCreateRequest>,
) -> Result<(StatusCode, Json<Device>), ApiError> {
    if req.id.trim().is_empty() {
        return Err(bad_request("device id must not be empty"));
    }
    if state.store.device(&req.id).is_some() {
        return Err(bad_request(format!("device {} already exists", req.id)));
    }

    let device = Device {
        id: req.id,
        notify_service: req.notify_service,
    };
    state.store.save_device(&device).map_err(internal)?;

    info!(device_id = %device.id, service = %device.notify_service, "Device registered");
    Ok((StatusCode::CREATED, Json(device)))
}

pub async fn devices_update(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
    Json(req): Json<DeviceUpdateRequest>,
) -> Result<Json<Device>, ApiError> {
    let mut device = state
        .store
        .device(&id)
        .ok_or_else(|| not_found(format!("device {id} not found")))?;

    device.notify_service = req.notify_service;
    state.store.save_device(&device).map_err(internal)?;
    Ok(Json(device))
}

pub async fn devices_delete(
    State(state): State<Arc<AppState>>,
    Path(id): Path<String>,
) -> Result<StatusCode, ApiError> {
    if state.store.device(&id).is_none() {
        return Err(not_found(format!("device {id} not found")));
    }
    state.store.delete_device(&id).map_err(internal)?;
    info!(device_id = %id, "Device removed");
    Ok(StatusCode::NO_CONTENT)
}

// ── Home Assistant action callback ────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct ActionRequest {
    pub action: String,
}

/// Webhook for notification action buttons. `TASK_DONE_<id>` completes the
/// task; `TASK_POSTPONE_<id>` defers it to tomorrow's canonical time.
pub async fn ha_action(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ActionRequest>,
) -> Result<Json<Task>, ApiError> {
    if let Some(id) = req.action.strip_prefix("TASK_DONE_") {
        return mark_done(&state, id).map(Json);
    }

    if let Some(id) = req.action.strip_prefix("TASK_POSTPONE_") {
        let mut task = state
            .store
            .task(id)
            .ok_or_else(|| not_found(format!("task {id} not found")))?;

        let tomorrow = state
            .policy
            .now()
            .date_naive()
            .checked_add_days(Days::new(1))
            .ok_or_else(|| internal(ChoresError::DateOutOfRange("tomorrow".to_string())))?;
        task.next_due = state
            .policy
            .notification_time(tomorrow)
            .map_err(internal)?
            .fixed_offset();
        state.store.save_task(&task).map_err(internal)?;

        info!(task_id = %task.id, next_due = %task.next_due, "Task postponed via action");
        return Ok(Json(task));
    }

    Err(bad_request(format!("unknown action: {}", req.action)))
}
