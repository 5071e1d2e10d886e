//! Integration tests for the Redis seat coordinator.
//!
//! These tests require a running Redis instance:
//! `docker run -d -p 6379:6379 redis:7-alpine`
//! Run with: `cargo test --test redis_coordinator -- --ignored`

#![allow(clippy::unwrap_used)]

use chrono::Duration;

use boxoffice_booking::providers::{AcquireOutcome, SeatCoordinator};
use boxoffice_booking::stores::RedisSeatCoordinator;
use boxoffice_booking::{Hold, HoldId, HoldStatus, SeatId, ShowId, UserId};

const REDIS_URL: &str = "redis://127.0.0.1:6379";

fn seats(ids: &[&str]) -> Vec<SeatId> {
    ids.iter().map(|s| SeatId::parse(s).unwrap()).collect()
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn acquire_release_lifecycle() {
    let coordinator = RedisSeatCoordinator::new(REDIS_URL).await.unwrap();
    let show_id = ShowId::new();
    let user = UserId::new("user-1".into());
    let hold_id = HoldId::new();
    let seat_ids = seats(&["A1", "A2", "A3"]);

    let outcome = coordinator
        .acquire_seats(show_id, &user, hold_id, &seat_ids, Duration::seconds(60))
        .await
        .unwrap();
    assert!(matches!(outcome, AcquireOutcome::Acquired { .. }));

    let locked = coordinator.locked_seats(show_id).await.unwrap();
    assert_eq!(locked, seat_ids);

    let released = coordinator
        .release_seats(show_id, &user, &seat_ids)
        .await
        .unwrap();
    assert_eq!(released, seat_ids);

    let locked = coordinator.locked_seats(show_id).await.unwrap();
    assert!(locked.is_empty());
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn conflicting_owner_is_rejected_atomically() {
    let coordinator = RedisSeatCoordinator::new(REDIS_URL).await.unwrap();
    let show_id = ShowId::new();
    let user1 = UserId::new("user-1".into());
    let user2 = UserId::new("user-2".into());

    coordinator
        .acquire_seats(
            show_id,
            &user1,
            HoldId::new(),
            &seats(&["B2"]),
            Duration::seconds(60),
        )
        .await
        .unwrap();

    // Overlapping request: rejected on the contended seat, and the free
    // seats are NOT locked (no partial state).
    let outcome = coordinator
        .acquire_seats(
            show_id,
            &user2,
            HoldId::new(),
            &seats(&["B1", "B2", "B3"]),
            Duration::seconds(60),
        )
        .await
        .unwrap();
    assert_eq!(
        outcome,
        AcquireOutcome::Conflict {
            seat: SeatId::parse("B2").unwrap()
        }
    );

    let locked = coordinator.locked_seats(show_id).await.unwrap();
    assert_eq!(locked, seats(&["B2"]));
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn concurrent_contenders_exactly_one_wins() {
    let coordinator = RedisSeatCoordinator::new(REDIS_URL).await.unwrap();
    let show_id = ShowId::new();
    let user1 = UserId::new("user-1".into());
    let user2 = UserId::new("user-2".into());
    let seat_ids = seats(&["C1", "C2", "C3"]);

    let (first, second) = tokio::join!(
        coordinator.acquire_seats(
            show_id,
            &user1,
            HoldId::new(),
            &seat_ids,
            Duration::seconds(60)
        ),
        coordinator.acquire_seats(
            show_id,
            &user2,
            HoldId::new(),
            &seat_ids,
            Duration::seconds(60)
        ),
    );

    let acquired = |outcome: &AcquireOutcome| matches!(outcome, AcquireOutcome::Acquired { .. });
    let first = first.unwrap();
    let second = second.unwrap();
    assert!(
        acquired(&first) ^ acquired(&second),
        "exactly one contender must win: {first:?} / {second:?}"
    );

    let locked = coordinator.locked_seats(show_id).await.unwrap();
    assert_eq!(locked, seat_ids);
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn release_skips_locks_owned_by_others() {
    let coordinator = RedisSeatCoordinator::new(REDIS_URL).await.unwrap();
    let show_id = ShowId::new();
    let user1 = UserId::new("user-1".into());
    let user2 = UserId::new("user-2".into());

    coordinator
        .acquire_seats(
            show_id,
            &user1,
            HoldId::new(),
            &seats(&["D1"]),
            Duration::seconds(60),
        )
        .await
        .unwrap();
    coordinator
        .acquire_seats(
            show_id,
            &user2,
            HoldId::new(),
            &seats(&["D2"]),
            Duration::seconds(60),
        )
        .await
        .unwrap();

    // user2 asks to release both; only their own lock goes.
    let released = coordinator
        .release_seats(show_id, &user2, &seats(&["D1", "D2"]))
        .await
        .unwrap();
    assert_eq!(released, seats(&["D2"]));

    let locked = coordinator.locked_seats(show_id).await.unwrap();
    assert_eq!(locked, seats(&["D1"]));
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn reacquire_refreshes_ttl() {
    let coordinator = RedisSeatCoordinator::new(REDIS_URL).await.unwrap();
    let show_id = ShowId::new();
    let user = UserId::new("user-1".into());
    let hold_id = HoldId::new();
    let seat_ids = seats(&["E5"]);

    coordinator
        .acquire_seats(show_id, &user, hold_id, &seat_ids, Duration::seconds(2))
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_secs(1)).await;

    // Same owner: idempotent refresh back to the full TTL.
    let outcome = coordinator
        .acquire_seats(show_id, &user, hold_id, &seat_ids, Duration::seconds(60))
        .await
        .unwrap();
    assert!(matches!(outcome, AcquireOutcome::Acquired { .. }));

    tokio::time::sleep(std::time::Duration::from_millis(1500)).await;
    let locked = coordinator.locked_seats(show_id).await.unwrap();
    assert_eq!(locked, seat_ids, "refreshed lock must outlive the old TTL");
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn locks_lapse_at_ttl() {
    let coordinator = RedisSeatCoordinator::new(REDIS_URL).await.unwrap();
    let show_id = ShowId::new();
    let user = UserId::new("user-1".into());

    coordinator
        .acquire_seats(
            show_id,
            &user,
            HoldId::new(),
            &seats(&["F1"]),
            Duration::seconds(1),
        )
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(1200)).await;

    let locked = coordinator.locked_seats(show_id).await.unwrap();
    assert!(locked.is_empty(), "expired lock still listed: {locked:?}");
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn hold_records_round_trip_and_expire() {
    let coordinator = RedisSeatCoordinator::new(REDIS_URL).await.unwrap();
    let now = chrono::Utc::now();
    let hold = Hold {
        hold_id: HoldId::new(),
        show_id: ShowId::new(),
        user_id: UserId::new("user-1".into()),
        seat_ids: seats(&["G1", "G2"]),
        status: HoldStatus::Held,
        created_at: now,
        expires_at: now + Duration::seconds(60),
    };

    coordinator.put_hold(&hold, Duration::seconds(60)).await.unwrap();
    let fetched = coordinator.get_hold(hold.hold_id).await.unwrap().unwrap();
    assert_eq!(fetched, hold);

    coordinator.delete_hold(hold.hold_id).await.unwrap();
    assert!(coordinator.get_hold(hold.hold_id).await.unwrap().is_none());

    // Missing and expired are indistinguishable.
    assert!(coordinator.get_hold(HoldId::new()).await.unwrap().is_none());
}

#[tokio::test]
#[ignore] // Requires Redis running
async fn seatmap_cache_round_trip_and_invalidation() {
    let coordinator = RedisSeatCoordinator::new(REDIS_URL).await.unwrap();
    let seatmap = boxoffice_booking::Seatmap {
        show_id: ShowId::new(),
        movie_title: "Heat".into(),
        theatre_name: "Downtown 6".into(),
        start_time: chrono::Utc::now(),
        price: 150.0,
        layout: vec![],
        unavailable_seat_ids: seats(&["A5"]),
        held_seat_ids: seats(&["A1"]),
    };

    coordinator
        .cache_seatmap(&seatmap, Duration::seconds(10))
        .await
        .unwrap();
    let cached = coordinator
        .cached_seatmap(seatmap.show_id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(cached, seatmap);

    coordinator.invalidate_seatmap(seatmap.show_id).await.unwrap();
    assert!(
        coordinator
            .cached_seatmap(seatmap.show_id)
            .await
            .unwrap()
            .is_none()
    );
}
