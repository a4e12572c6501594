//! End-to-end tests for the full plugschedd stack.
//!
//! Each test spins up the complete application (in-memory `SQLite`, virtual
//! plugs, stub oracles, real engine and services, real axum router) and
//! exercises the HTTP layer via `tower::ServiceExt::oneshot`; no TCP port is
//! bound.

use std::sync::Arc;
use std::time::Duration;

use axum::body::Body;
use axum::http::{Request, StatusCode};
use chrono::{NaiveDate, NaiveDateTime};
use http_body_util::BodyExt;
use plugsched_adapter_http_axum::AppState;
use plugsched_adapter_storage_sqlite_sqlx::{Config, SqliteScheduleStore};
use plugsched_adapter_virtual::{VirtualPlug, VirtualPlugs};
use plugsched_app::actuator::{DeviceActuator, RetryPolicy};
use plugsched_app::ports::{Clock, OccupancyOracle, SolarTimeOracle};
use plugsched_app::resolver::{ResolverConfig, TimeOverrideResolver};
use plugsched_app::schedule_engine::{EngineConfig, ScheduleEngine};
use plugsched_app::services::device_service::DeviceService;
use plugsched_app::services::schedule_service::ScheduleService;
use plugsched_domain::error::PlugSchedError;
use plugsched_domain::time::TimeOfDay;
use serde_json::{Value, json};
use tower::ServiceExt;

struct StubSolar;

impl SolarTimeOracle for StubSolar {
    async fn sunrise(&self) -> Result<TimeOfDay, PlugSchedError> {
        Ok("07:58:00".parse()?)
    }

    async fn sunset(&self) -> Result<TimeOfDay, PlugSchedError> {
        Ok("19:45:12".parse()?)
    }
}

struct StubOccupancy(Option<bool>);

impl OccupancyOracle for StubOccupancy {
    async fn expected_home_today(&self) -> Result<Option<bool>, PlugSchedError> {
        Ok(self.0)
    }
}

struct FixedClock(NaiveDateTime);

impl Clock for FixedClock {
    fn now(&self) -> NaiveDateTime {
        self.0
    }
}

type Engine = ScheduleEngine<SqliteScheduleStore, VirtualPlugs, StubSolar, StubOccupancy, FixedClock>;

struct Daemon {
    app: axum::Router,
    plugs: VirtualPlugs,
    engine: Engine,
}

fn at(hour: u32, minute: u32, second: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 12, 20)
        .unwrap()
        .and_hms_opt(hour, minute, second)
        .unwrap()
}

/// Build a fully-wired daemon backed by an in-memory `SQLite` database.
async fn daemon(now: NaiveDateTime, expected_home: Option<bool>) -> Daemon {
    let db = Config {
        database_url: "sqlite::memory:".to_string(),
    }
    .build()
    .await
    .expect("in-memory database should initialise");
    let store = db.schedule_store();

    let plugs = VirtualPlugs::new([
        VirtualPlug::new("8006AAAA", "10.0.0.10", "Tree"),
        VirtualPlug::new("8006BBBB", "10.0.0.11", "Nightlight"),
    ]);
    let actuator = Arc::new(DeviceActuator::new(
        plugs.clone(),
        RetryPolicy::new(2, Duration::from_millis(50)),
        Duration::from_millis(200),
    ));
    let resolver = TimeOverrideResolver::new(
        StubSolar,
        StubOccupancy(expected_home),
        ResolverConfig {
            gated_rooms: vec!["kids".to_string()],
            ..ResolverConfig::default()
        },
    );
    let engine = ScheduleEngine::new(
        store.clone(),
        resolver,
        Arc::clone(&actuator),
        FixedClock(now),
        EngineConfig::default(),
    );

    let state = AppState::new(
        ScheduleService::new(store.clone(), engine.clone()),
        DeviceService::new(actuator, store),
        engine.clone(),
    );
    Daemon {
        app: plugsched_adapter_http_axum::build(state),
        plugs,
        engine,
    }
}

async fn send(app: &axum::Router, method: &str, uri: &str, body: Option<Value>) -> (StatusCode, Value) {
    let builder = Request::builder().method(method).uri(uri);
    let request = match body {
        Some(body) => builder
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = response.into_body().collect().await.unwrap().to_bytes();
    (status, serde_json::from_slice(&bytes).unwrap_or(Value::Null))
}

// ---------------------------------------------------------------------------
// Health check
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_return_ok_when_health_check_called() {
    let daemon = daemon(at(12, 0, 0), Some(true)).await;
    let resp = daemon
        .app
        .oneshot(
            Request::builder()
                .uri("/health")
                .body(Body::empty())
                .unwrap(),
        )
        .await
        .unwrap();

    assert_eq!(resp.status(), StatusCode::OK);
}

// ---------------------------------------------------------------------------
// Schedules and triggers
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_arm_sunset_clamped_schedule_at_resolved_time() {
    let daemon = daemon(at(12, 0, 0), Some(true)).await;

    let (status, body) = send(
        &daemon.app,
        "POST",
        "/api/schedules",
        Some(json!({
            "name": "Tree on",
            "device_ref": "address:10.0.0.10",
            "hour": 18,
            "minute": 0,
            "override_policy": "sunset_clamp"
        })),
    )
    .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["rebuild"]["armed"], 1);

    let (_, triggers) = send(&daemon.app, "GET", "/api/triggers", None).await;
    assert_eq!(triggers["status"]["phase"], "idle");
    assert_eq!(triggers["status"]["next_rebuild_at"], "2024-12-21T03:05:00");
    assert_eq!(triggers["triggers"][0]["fire_at"], "19:15");
    assert_eq!(triggers["triggers"][0]["due_at"], "2024-12-20T19:15:00");
}

#[tokio::test]
async fn should_suppress_gated_schedule_when_nobody_is_home() {
    let daemon = daemon(at(12, 0, 0), Some(false)).await;
    send(
        &daemon.app,
        "POST",
        "/api/devices",
        Some(json!({"device_ref": "address:10.0.0.11", "name": "Nightlight", "room": "Kids"})),
    )
    .await;

    let (_, body) = send(
        &daemon.app,
        "POST",
        "/api/schedules",
        Some(json!({
            "name": "Nightlight on",
            "device_ref": "address:10.0.0.11",
            "hour": 19,
            "minute": 0
        })),
    )
    .await;

    assert_eq!(body["rebuild"]["suppressed"], 1);
    assert_eq!(body["rebuild"]["armed"], 0);
    let (_, triggers) = send(&daemon.app, "GET", "/api/triggers", None).await;
    assert_eq!(triggers["triggers"], json!([]));
}

#[tokio::test]
async fn should_disarm_trigger_when_schedule_is_deactivated() {
    let daemon = daemon(at(12, 0, 0), Some(true)).await;
    let (_, created) = send(
        &daemon.app,
        "POST",
        "/api/schedules",
        Some(json!({"name": "Tree off", "device_ref": "address:10.0.0.10", "hour": 23, "minute": 0, "desired_power": false})),
    )
    .await;
    let uri = format!("/api/schedules/{}", created["saved"]["id"].as_str().unwrap());

    let (status, body) = send(&daemon.app, "PUT", &uri, Some(json!({"active": false}))).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["rebuild"]["armed"], 0);
    assert!(daemon.engine.snapshot().is_empty());
}

#[tokio::test]
async fn should_switch_plug_when_trigger_fires() {
    let daemon = daemon(at(18, 29, 59), Some(true)).await;
    send(
        &daemon.app,
        "POST",
        "/api/schedules",
        Some(json!({"name": "Tree on", "device_ref": "id:8006AAAA", "hour": 18, "minute": 30})),
    )
    .await;

    let mut switched = false;
    for _ in 0..40 {
        if daemon.plugs.power("10.0.0.10").await == Some(true) {
            switched = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(100)).await;
    }

    assert!(switched, "plug should have been switched on");
    assert!(daemon.engine.snapshot().is_empty());
}

#[tokio::test]
async fn should_refuse_rebuild_after_shutdown() {
    let daemon = daemon(at(12, 0, 0), Some(true)).await;
    daemon.engine.shutdown();

    let (status, _) = send(&daemon.app, "POST", "/api/schedules/rebuild", None).await;

    assert_eq!(status, StatusCode::SERVICE_UNAVAILABLE);
    let (_, triggers) = send(&daemon.app, "GET", "/api/triggers", None).await;
    assert_eq!(triggers["status"]["phase"], "stopped");
}

// ---------------------------------------------------------------------------
// Devices
// ---------------------------------------------------------------------------

#[tokio::test]
async fn should_discover_virtual_plugs() {
    let daemon = daemon(at(12, 0, 0), None).await;

    let (status, body) = send(&daemon.app, "GET", "/api/devices/discover", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body.as_array().unwrap().len(), 2);
}

#[tokio::test]
async fn should_switch_plug_by_hand_and_report_unreachable_plug() {
    let daemon = daemon(at(12, 0, 0), None).await;

    let (status, _) = send(
        &daemon.app,
        "PUT",
        "/api/devices/power",
        Some(json!({"device": "address:10.0.0.11", "power": true})),
    )
    .await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    assert_eq!(daemon.plugs.power("10.0.0.11").await, Some(true));

    daemon.plugs.set_reachable("10.0.0.11", false).await;
    let (status, _) = send(
        &daemon.app,
        "PUT",
        "/api/devices/power",
        Some(json!({"device": "address:10.0.0.11", "power": false})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_GATEWAY);
}
