use chrono::{Duration, Utc};
use coulomb::error::CoulombError;
use coulomb::session::{ChargingSession, SessionClosure, SessionStatus};
use coulomb::store::{CasOutcome, MemorySessionStore, SessionStore};

fn session(user: &str, vehicle_id: i64, port_id: i64) -> ChargingSession {
    ChargingSession::new(user, vehicle_id, port_id, Utc::now())
}

fn closure(session: &ChargingSession, energy: f64, cost: f64) -> SessionClosure {
    SessionClosure {
        end_time: session.start_time + Duration::hours(1),
        energy_delivered_kwh: energy,
        total_cost: cost,
    }
}

#[tokio::test]
async fn create_enforces_one_active_session_per_vehicle() {
    let store = MemorySessionStore::new();
    let first = store.create(session("alice", 1, 10)).await.unwrap();

    // Same vehicle, any port: rejected while the first is in progress
    let err = store.create(session("alice", 1, 11)).await.unwrap_err();
    assert!(matches!(err, CoulombError::Conflict { .. }));

    // A different vehicle is unaffected
    assert!(store.create(session("bob", 2, 10)).await.is_ok());

    // Completing the first frees the vehicle
    store
        .complete_if_in_progress(first.id, closure(&first, 1.0, 0.2))
        .await
        .unwrap();
    assert!(store.create(session("alice", 1, 11)).await.is_ok());
}

#[tokio::test]
async fn closure_write_is_compare_and_swap() {
    let store = MemorySessionStore::new();
    let created = store.create(session("alice", 1, 10)).await.unwrap();

    let outcome = store
        .complete_if_in_progress(created.id, closure(&created, 22.0, 4.4))
        .await
        .unwrap();
    let winner = match outcome {
        CasOutcome::Committed(s) => s,
        CasOutcome::Lost(_) => panic!("first closure must commit"),
    };
    assert_eq!(winner.status, SessionStatus::Completed);
    assert!((winner.energy_delivered_kwh - 22.0).abs() < 1e-9);
    assert!((winner.total_cost - 4.4).abs() < 1e-9);

    // A competing write loses and observes the winner's record unchanged
    let outcome = store
        .complete_if_in_progress(created.id, closure(&created, 99.0, 99.0))
        .await
        .unwrap();
    match outcome {
        CasOutcome::Lost(current) => {
            assert_eq!(current.end_time, winner.end_time);
            assert!((current.energy_delivered_kwh - 22.0).abs() < 1e-9);
        }
        CasOutcome::Committed(_) => panic!("second closure must lose"),
    }
}

#[tokio::test]
async fn queries_cover_users_vehicles_and_ports() {
    let store = MemorySessionStore::new();
    let alice = store.create(session("alice", 1, 10)).await.unwrap();
    let bob = store.create(session("bob", 2, 10)).await.unwrap();

    let mine = store.list_for_user("alice").await.unwrap();
    assert_eq!(mine.len(), 1);
    assert_eq!(mine[0].id, alice.id);

    let active = store.find_active_for_vehicle(2).await.unwrap();
    assert_eq!(active.map(|s| s.id), Some(bob.id));
    assert!(store.find_active_for_vehicle(99).await.unwrap().is_none());

    assert_eq!(store.list_active_for_port(10).await.unwrap().len(), 2);
    assert!(store.list_active_for_port(11).await.unwrap().is_empty());

    // Completed sessions drop out of the active views but stay in history
    store
        .complete_if_in_progress(alice.id, closure(&alice, 1.0, 0.2))
        .await
        .unwrap();
    assert!(store.find_active_for_vehicle(1).await.unwrap().is_none());
    assert_eq!(store.list_active_for_port(10).await.unwrap().len(), 1);
    assert_eq!(store.list_for_user("alice").await.unwrap().len(), 1);
}

#[tokio::test]
async fn missing_sessions_read_as_not_found() {
    let store = MemorySessionStore::new();
    let ghost = session("alice", 1, 10);

    let err = store.get(ghost.id).await.unwrap_err();
    assert!(matches!(err, CoulombError::NotFound { .. }));

    let err = store
        .complete_if_in_progress(ghost.id, closure(&ghost, 1.0, 0.2))
        .await
        .unwrap_err();
    assert!(matches!(err, CoulombError::NotFound { .. }));
}
