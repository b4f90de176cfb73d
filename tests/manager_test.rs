use std::sync::Arc;

use coulomb::config::Config;
use coulomb::error::CoulombError;
use coulomb::manager::ChargingSessionManager;
use coulomb::registry::{
    MemoryPortRegistry, MemoryVehicleRegistry, Port, PortRegistry, Vehicle, VehicleRegistry,
};
use coulomb::session::{SessionStatus, StartSessionRequest, StopMode};
use coulomb::store::MemorySessionStore;

struct Env {
    manager: ChargingSessionManager,
    vehicles: Arc<MemoryVehicleRegistry>,
}

async fn env() -> Env {
    let vehicles = Arc::new(MemoryVehicleRegistry::new());
    vehicles
        .insert(Vehicle {
            id: 1,
            user_id: "alice".to_string(),
            license_plate: "EV-0001".to_string(),
            brand: "Generic".to_string(),
            battery_capacity_kwh: 50.0,
            current_battery_capacity_kwh: 10.0,
            max_charge_rate_kw: 22.0,
            battery_condition: 1.0,
        })
        .await;
    vehicles
        .insert(Vehicle {
            id: 2,
            user_id: "bob".to_string(),
            license_plate: "EV-0002".to_string(),
            brand: "Generic".to_string(),
            battery_capacity_kwh: 80.0,
            current_battery_capacity_kwh: 30.0,
            max_charge_rate_kw: 11.0,
            battery_condition: 0.95,
        })
        .await;

    let ports = Arc::new(MemoryPortRegistry::new());
    for id in [10, 11] {
        ports
            .insert(Port {
                id,
                station_id: 100,
                max_power_kw: 22.0,
                status: "AVAILABLE".to_string(),
            })
            .await;
    }

    let manager = ChargingSessionManager::new(
        &Config::default(),
        Arc::new(MemorySessionStore::new()),
        Arc::clone(&vehicles) as Arc<dyn VehicleRegistry>,
        ports as Arc<dyn PortRegistry>,
    );

    Env { manager, vehicles }
}

fn request(vehicle_id: i64, port_id: i64, duration_minutes: u32) -> StartSessionRequest {
    StartSessionRequest {
        vehicle_id,
        port_id,
        duration_minutes,
    }
}

#[tokio::test]
async fn start_rejects_bad_durations() {
    let env = env().await;

    let err = env
        .manager
        .start_session("alice", request(1, 10, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, CoulombError::InvalidArgument { .. }));

    let err = env
        .manager
        .start_session("alice", request(1, 10, 100_000))
        .await
        .unwrap_err();
    assert!(matches!(err, CoulombError::InvalidArgument { .. }));
}

#[tokio::test]
async fn start_requires_owned_vehicle_and_existing_port() {
    let env = env().await;

    // Unknown vehicle
    let err = env
        .manager
        .start_session("alice", request(99, 10, 60))
        .await
        .unwrap_err();
    assert!(matches!(err, CoulombError::NotFound { .. }));

    // Bob's vehicle reads as missing for alice
    let err = env
        .manager
        .start_session("alice", request(2, 10, 60))
        .await
        .unwrap_err();
    assert!(matches!(err, CoulombError::NotFound { .. }));

    // Unknown port
    let err = env
        .manager
        .start_session("alice", request(1, 99, 60))
        .await
        .unwrap_err();
    assert!(matches!(err, CoulombError::NotFound { .. }));
}

#[tokio::test]
async fn vehicle_can_only_have_one_session_in_progress() {
    let env = env().await;

    let session = env
        .manager
        .start_session("alice", request(1, 10, 60))
        .await
        .unwrap();
    assert_eq!(session.status, SessionStatus::InProgress);
    assert!(session.end_time.is_none());

    let err = env
        .manager
        .start_session("alice", request(1, 11, 60))
        .await
        .unwrap_err();
    assert!(matches!(err, CoulombError::Conflict { .. }));

    // After closure the vehicle is free again
    env.manager
        .stop_session("alice", session.id, StopMode::Elapsed)
        .await
        .unwrap();
    assert!(
        env.manager
            .start_session("alice", request(1, 11, 60))
            .await
            .is_ok()
    );
}

#[tokio::test]
async fn stop_with_observed_level_bills_the_gain() {
    let env = env().await;
    env.vehicles.set_current_capacity(1, 30.0).await.unwrap();

    let session = env
        .manager
        .start_session("alice", request(1, 10, 60))
        .await
        .unwrap();

    let closed = env
        .manager
        .stop_session("alice", session.id, StopMode::ObservedLevel(35.0))
        .await
        .unwrap();

    assert_eq!(closed.status, SessionStatus::Completed);
    assert!(closed.end_time.is_some());
    assert!((closed.energy_delivered_kwh - 5.0).abs() < 1e-9);
    // 5 kWh at the default 0.20/kWh tariff
    assert!((closed.total_cost - 1.0).abs() < 1e-9);

    let vehicle = env.vehicles.get(1).await.unwrap();
    assert!((vehicle.current_battery_capacity_kwh - 35.0).abs() < 1e-9);
}

#[tokio::test]
async fn closed_and_foreign_sessions_read_as_missing() {
    let env = env().await;

    let session = env
        .manager
        .start_session("alice", request(1, 10, 60))
        .await
        .unwrap();

    let err = env
        .manager
        .stop_session("bob", session.id, StopMode::Elapsed)
        .await
        .unwrap_err();
    assert!(matches!(err, CoulombError::NotFound { .. }));

    env.manager
        .stop_session("alice", session.id, StopMode::Elapsed)
        .await
        .unwrap();

    let err = env
        .manager
        .stop_session("alice", session.id, StopMode::Elapsed)
        .await
        .unwrap_err();
    assert!(matches!(err, CoulombError::NotFound { .. }));

    let err = env.manager.get_session("bob", session.id).await.unwrap_err();
    assert!(matches!(err, CoulombError::NotFound { .. }));
    assert!(env.manager.get_session("alice", session.id).await.is_ok());
}

#[tokio::test]
async fn rejected_observed_level_leaves_the_session_running() {
    let env = env().await;

    let session = env
        .manager
        .start_session("alice", request(1, 10, 60))
        .await
        .unwrap();

    let err = env
        .manager
        .stop_session("alice", session.id, StopMode::ObservedLevel(60.0))
        .await
        .unwrap_err();
    assert!(matches!(err, CoulombError::InvalidArgument { .. }));

    let current = env.manager.get_session("alice", session.id).await.unwrap();
    assert_eq!(current.status, SessionStatus::InProgress);

    // The session can still be stopped normally
    let closed = env
        .manager
        .stop_session("alice", session.id, StopMode::ObservedLevel(35.0))
        .await
        .unwrap();
    assert_eq!(closed.status, SessionStatus::Completed);
}

#[tokio::test(start_paused = true)]
async fn timeout_force_closes_after_requested_duration() {
    let env = env().await;

    let session = env
        .manager
        .start_session("alice", request(1, 10, 1))
        .await
        .unwrap();

    // Let the one-minute timeout fire on virtual time
    tokio::time::sleep(std::time::Duration::from_secs(90)).await;

    let closed = env.manager.get_session("alice", session.id).await.unwrap();
    assert_eq!(closed.status, SessionStatus::Completed);
    assert_eq!(closed.end_time, Some(session.start_time + chrono::Duration::minutes(1)));

    // One minute at 22 kW effective rate
    let expected = 22.0 / 60.0;
    assert!((closed.energy_delivered_kwh - expected).abs() < 1e-6);

    let vehicle = env.vehicles.get(1).await.unwrap();
    assert!((vehicle.current_battery_capacity_kwh - (10.0 + expected)).abs() < 1e-6);
}

#[tokio::test(start_paused = true)]
async fn stale_timeout_does_not_reopen_a_stopped_session() {
    let env = env().await;
    env.vehicles.set_current_capacity(1, 30.0).await.unwrap();

    let session = env
        .manager
        .start_session("alice", request(1, 10, 1))
        .await
        .unwrap();

    let closed = env
        .manager
        .stop_session("alice", session.id, StopMode::ObservedLevel(35.0))
        .await
        .unwrap();
    assert!((closed.energy_delivered_kwh - 5.0).abs() < 1e-9);

    // Outlive the original timeout; the closure result must not change
    tokio::time::sleep(std::time::Duration::from_secs(120)).await;

    let after = env.manager.get_session("alice", session.id).await.unwrap();
    assert_eq!(after.end_time, closed.end_time);
    assert!((after.energy_delivered_kwh - 5.0).abs() < 1e-9);
    assert!((after.total_cost - closed.total_cost).abs() < 1e-9);

    let vehicle = env.vehicles.get(1).await.unwrap();
    assert!((vehicle.current_battery_capacity_kwh - 35.0).abs() < 1e-9);
}

#[tokio::test]
async fn port_queries_reflect_active_sessions() {
    let env = env().await;

    assert!(!env.manager.port_has_active_session(10).await.unwrap());

    let alice_session = env
        .manager
        .start_session("alice", request(1, 10, 60))
        .await
        .unwrap();
    let bob_session = env
        .manager
        .start_session("bob", request(2, 10, 60))
        .await
        .unwrap();

    let active = env.manager.list_active_sessions_for_port(10).await.unwrap();
    assert_eq!(active.len(), 2);
    assert!(env.manager.port_has_active_session(10).await.unwrap());
    assert!(!env.manager.port_has_active_session(11).await.unwrap());

    env.manager
        .stop_session("alice", alice_session.id, StopMode::Elapsed)
        .await
        .unwrap();
    env.manager
        .stop_session("bob", bob_session.id, StopMode::Elapsed)
        .await
        .unwrap();

    assert!(!env.manager.port_has_active_session(10).await.unwrap());
}

#[tokio::test]
async fn user_history_keeps_completed_sessions_in_order() {
    let env = env().await;

    let first = env
        .manager
        .start_session("alice", request(1, 10, 60))
        .await
        .unwrap();
    env.manager
        .stop_session("alice", first.id, StopMode::Elapsed)
        .await
        .unwrap();

    let second = env
        .manager
        .start_session("alice", request(1, 11, 60))
        .await
        .unwrap();

    let history = env.manager.list_sessions_for_user("alice").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].id, first.id);
    assert_eq!(history[1].id, second.id);
    assert!(history[0].start_time <= history[1].start_time);

    assert!(env.manager.list_sessions_for_user("bob").await.unwrap().is_empty());
}
