//! End-to-end lifecycle tests for the reservation core, run against the
//! in-memory mocks at memory speed.

#![allow(clippy::unwrap_used, clippy::panic)]

use chrono::{Duration, Utc};
use uuid::Uuid;

use boxoffice_booking::mocks::{MockBookingRepository, MockEventPublisher, MockSeatCoordinator};
use boxoffice_booking::providers::{AcquireOutcome, SeatCoordinator};
use boxoffice_booking::{
    AvailabilityProjector, BookingConfig, BookingError, CreateHoldRequest, CreateOrderRequest,
    Customer, HoldStatus, OrderStatus, ReservationCore, SeatId, Show, ShowId, ShowStatus,
    TheatreProfile, UserId,
};

type Core = ReservationCore<MockSeatCoordinator, MockBookingRepository, MockEventPublisher>;
type Projector = AvailabilityProjector<MockSeatCoordinator, MockBookingRepository>;

struct Fixture {
    core: Core,
    projector: Projector,
    coordinator: MockSeatCoordinator,
    repository: MockBookingRepository,
    events: MockEventPublisher,
    show: Show,
}

fn sample_show() -> Show {
    Show {
        show_id: ShowId::new(),
        movie_title: "Heat".into(),
        theatre_id: Uuid::new_v4(),
        theatre_name: "Downtown 6".into(),
        start_time: Utc::now() + Duration::hours(2),
        price: 150.0,
        status: ShowStatus::Scheduled,
    }
}

fn fixture_with(config: BookingConfig, show: Show) -> Fixture {
    let coordinator = MockSeatCoordinator::new();
    let repository = MockBookingRepository::new();
    let events = MockEventPublisher::new();
    repository.insert_show(show.clone()).unwrap();

    Fixture {
        core: ReservationCore::new(
            coordinator.clone(),
            repository.clone(),
            events.clone(),
            config.clone(),
        ),
        projector: AvailabilityProjector::new(coordinator.clone(), repository.clone(), config),
        coordinator,
        repository,
        events,
        show,
    }
}

fn fixture() -> Fixture {
    fixture_with(BookingConfig::default(), sample_show())
}

fn seats(ids: &[&str]) -> Vec<SeatId> {
    ids.iter().map(|s| SeatId::parse(s).unwrap()).collect()
}

fn hold_request(show_id: ShowId, ids: &[&str]) -> CreateHoldRequest {
    CreateHoldRequest {
        show_id,
        seat_ids: seats(ids),
        quantity: ids.len(),
    }
}

fn customer() -> Customer {
    Customer {
        name: "Test User".into(),
        email: "user@example.com".into(),
        phone: "9876543210".into(),
    }
}

#[tokio::test]
async fn happy_path_hold_order_confirm() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    let hold = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["A1", "A2"]))
        .await
        .unwrap();
    assert_eq!(hold.status, HoldStatus::Held);
    assert_eq!(hold.expires_at - hold.created_at, Duration::seconds(300));
    for seat in &hold.seat_ids {
        assert_eq!(
            fx.coordinator
                .lock_owner(fx.show.show_id, seat)
                .unwrap()
                .as_ref(),
            Some(&user)
        );
    }

    let details = fx
        .core
        .create_order(
            &user,
            CreateOrderRequest {
                hold_id: hold.hold_id,
                customer: customer(),
            },
        )
        .await
        .unwrap();
    assert_eq!(details.order.status, OrderStatus::PaymentPending);
    assert!((details.order.amount - 300.0).abs() < f64::EPSILON);
    // The hold is consumed, but the seats stay locked through payment.
    assert!(matches!(
        fx.core.get_hold(&user, hold.hold_id).await,
        Err(BookingError::HoldNotFound)
    ));
    assert_eq!(fx.coordinator.lock_count().unwrap(), 2);

    let confirmed = fx
        .core
        .confirm_payment(&user, details.order.order_id)
        .await
        .unwrap();
    assert_eq!(confirmed.order.status, OrderStatus::Confirmed);
    let ticket = confirmed.order.ticket_code.unwrap();
    assert_eq!(ticket, details.order.order_id.ticket_code());
    assert!(ticket.starts_with("BMS"));

    // Confirmation supersedes the locks.
    assert_eq!(fx.coordinator.lock_count().unwrap(), 0);

    let seatmap = fx.projector.get_seatmap(fx.show.show_id).await.unwrap();
    for seat in seats(&["A1", "A2"]) {
        assert!(seatmap.unavailable_seat_ids.contains(&seat));
        assert!(!seatmap.held_seat_ids.contains(&seat));
    }

    assert_eq!(
        fx.events.event_types().unwrap(),
        ["hold.created", "order.created", "order.confirmed"]
    );
}

#[tokio::test]
async fn contention_exactly_one_winner_no_partial_locks() {
    let fx = fixture();
    let user1 = UserId::new("user-1".into());
    let user2 = UserId::new("user-2".into());

    let (first, second) = tokio::join!(
        fx.core
            .create_hold(&user1, hold_request(fx.show.show_id, &["A1", "A2", "A3"])),
        fx.core
            .create_hold(&user2, hold_request(fx.show.show_id, &["A1", "A2", "A3"])),
    );

    assert!(
        first.is_ok() ^ second.is_ok(),
        "exactly one contender must win: {first:?} / {second:?}"
    );
    let first_is_ok = first.is_ok();
    let loser = if first_is_ok { second } else { first };
    match loser {
        Err(BookingError::SeatTaken { seat }) => {
            assert!(["A1", "A2", "A3"].contains(&seat.as_str()));
        }
        other => panic!("loser should see a seat conflict, got {other:?}"),
    }

    // No partial locks: all three seats belong to the winner.
    assert_eq!(fx.coordinator.lock_count().unwrap(), 3);

    // The loser can immediately retry with disjoint seats.
    let retry_user = if first_is_ok { user2 } else { user1 };
    fx.core
        .create_hold(&retry_user, hold_request(fx.show.show_id, &["B1", "B2", "B3"]))
        .await
        .unwrap();
}

#[tokio::test]
async fn permanently_unavailable_seats_are_rejected_without_locks() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    let err = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["A4", "A5"]))
        .await
        .unwrap_err();
    match err {
        BookingError::SeatsUnavailable { seats } => assert_eq!(seats, ["A5"]),
        other => panic!("expected SeatsUnavailable, got {other:?}"),
    }
    assert_eq!(fx.coordinator.lock_count().unwrap(), 0);
    assert!(fx.events.published().unwrap().is_empty());
}

#[tokio::test]
async fn seats_outside_the_auditorium_are_rejected() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    // The default profile is rows A-J of 10 seats.
    let err = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["K1"]))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::SeatsUnavailable { .. }));
}

#[tokio::test]
async fn lock_expiry_frees_seats_for_other_users() {
    let fx = fixture();
    let user1 = UserId::new("user-1".into());
    let user2 = UserId::new("user-2".into());

    fx.core
        .create_hold(&user1, hold_request(fx.show.show_id, &["D1"]))
        .await
        .unwrap();

    fx.coordinator.expire_locks(fx.show.show_id).unwrap();

    let seatmap = fx.projector.get_seatmap(fx.show.show_id).await.unwrap();
    assert!(!seatmap.held_seat_ids.contains(&SeatId::parse("D1").unwrap()));

    fx.core
        .create_hold(&user2, hold_request(fx.show.show_id, &["D1"]))
        .await
        .unwrap();
}

#[tokio::test]
async fn ownership_is_enforced_on_release() {
    let fx = fixture();
    let user1 = UserId::new("user-1".into());
    let user2 = UserId::new("user-2".into());

    let hold = fx
        .core
        .create_hold(&user1, hold_request(fx.show.show_id, &["E1"]))
        .await
        .unwrap();

    let err = fx.core.release_hold(&user2, hold.hold_id).await.unwrap_err();
    assert_eq!(err, BookingError::Forbidden);

    // The lock is untouched and the owner can still convert the hold.
    assert_eq!(
        fx.coordinator
            .lock_owner(fx.show.show_id, &SeatId::parse("E1").unwrap())
            .unwrap()
            .as_ref(),
        Some(&user1)
    );
    let details = fx
        .core
        .create_order(
            &user1,
            CreateOrderRequest {
                hold_id: hold.hold_id,
                customer: customer(),
            },
        )
        .await
        .unwrap();
    fx.core
        .confirm_payment(&user1, details.order.order_id)
        .await
        .unwrap();
}

#[tokio::test]
async fn started_show_rejects_holds_regardless_of_availability() {
    let show = Show {
        start_time: Utc::now() - Duration::seconds(1),
        ..sample_show()
    };
    let fx = fixture_with(BookingConfig::default(), show);
    let user = UserId::new("user-1".into());

    let err = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["A1"]))
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::ShowStarted);
    assert_eq!(fx.coordinator.lock_count().unwrap(), 0);
}

#[tokio::test]
async fn release_is_rejected_on_an_already_released_hold() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    let hold = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["F1", "F2"]))
        .await
        .unwrap();

    let released = fx.core.release_hold(&user, hold.hold_id).await.unwrap();
    assert_eq!(released.hold.status, HoldStatus::Released);
    assert_eq!(released.released_seats, seats(&["F1", "F2"]));
    assert_eq!(fx.coordinator.lock_count().unwrap(), 0);

    // Idempotency law: the second release changes nothing.
    let err = fx.core.release_hold(&user, hold.hold_id).await.unwrap_err();
    assert_eq!(err, BookingError::HoldAlreadyReleased);
    let view = fx.core.get_hold(&user, hold.hold_id).await.unwrap();
    assert_eq!(view.status, HoldStatus::Released);
}

#[tokio::test]
async fn reacquire_by_the_same_owner_refreshes_instead_of_conflicting() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    let hold = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["G1", "G2"]))
        .await
        .unwrap();

    let outcome = fx
        .coordinator
        .acquire_seats(
            fx.show.show_id,
            &user,
            hold.hold_id,
            &hold.seat_ids,
            Duration::seconds(300),
        )
        .await
        .unwrap();
    assert!(matches!(outcome, AcquireOutcome::Acquired { .. }));
    assert_eq!(fx.coordinator.lock_count().unwrap(), 2);
}

#[tokio::test]
async fn validation_failures_are_pure() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    // Quantity mismatch.
    let err = fx
        .core
        .create_hold(
            &user,
            CreateHoldRequest {
                show_id: fx.show.show_id,
                seat_ids: seats(&["A1", "A2"]),
                quantity: 1,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    // Duplicate seats.
    let err = fx
        .core
        .create_hold(
            &user,
            CreateHoldRequest {
                show_id: fx.show.show_id,
                seat_ids: seats(&["A1", "A1"]),
                quantity: 2,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    // Over the per-booking ceiling.
    let too_many: Vec<String> = (1..=11).map(|n| format!("A{n}")).collect();
    let refs: Vec<&str> = too_many.iter().map(String::as_str).collect();
    let err = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &refs))
        .await
        .unwrap_err();
    assert!(matches!(err, BookingError::Validation(_)));

    // State before equals state after.
    assert_eq!(fx.coordinator.lock_count().unwrap(), 0);
    assert_eq!(fx.repository.order_count().unwrap(), 0);
    assert!(fx.events.published().unwrap().is_empty());
}

#[tokio::test]
async fn hold_store_failure_releases_the_locks() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    fx.coordinator.fail_next_put_hold();
    let err = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["H1", "H2"]))
        .await
        .unwrap_err();
    assert!(err.is_transient());

    // Compensation released the just-acquired locks.
    assert_eq!(fx.coordinator.lock_count().unwrap(), 0);
    assert!(fx.events.published().unwrap().is_empty());
}

#[tokio::test]
async fn order_insert_failure_restores_the_hold() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    let hold = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["C1", "C2"]))
        .await
        .unwrap();

    fx.repository.fail_next_create_order();
    let err = fx
        .core
        .create_order(
            &user,
            CreateOrderRequest {
                hold_id: hold.hold_id,
                customer: customer(),
            },
        )
        .await
        .unwrap_err();
    assert!(err.is_transient());

    // The hold survives and the locks were never touched, so a retry works.
    let view = fx.core.get_hold(&user, hold.hold_id).await.unwrap();
    assert_eq!(view.status, HoldStatus::Held);
    assert_eq!(fx.coordinator.lock_count().unwrap(), 2);

    let details = fx
        .core
        .create_order(
            &user,
            CreateOrderRequest {
                hold_id: hold.hold_id,
                customer: customer(),
            },
        )
        .await
        .unwrap();
    assert_eq!(details.order.status, OrderStatus::PaymentPending);
}

#[tokio::test]
async fn expired_hold_is_projected_on_read_and_rejected_on_writes() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    let hold = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["B5"]))
        .await
        .unwrap();
    fx.coordinator
        .backdate_hold(hold.hold_id, Duration::seconds(400))
        .unwrap();

    // Read-only projection: the record still says HELD underneath.
    let view = fx.core.get_hold(&user, hold.hold_id).await.unwrap();
    assert_eq!(view.status, HoldStatus::Expired);

    // Write paths reject and announce the lapse.
    let err = fx.core.release_hold(&user, hold.hold_id).await.unwrap_err();
    assert_eq!(err, BookingError::HoldExpired);
    let err = fx
        .core
        .create_order(
            &user,
            CreateOrderRequest {
                hold_id: hold.hold_id,
                customer: customer(),
            },
        )
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::HoldExpired);

    let types = fx.events.event_types().unwrap();
    assert_eq!(types[0], "hold.created");
    assert!(types[1..].iter().all(|t| *t == "hold.expired"));
}

#[tokio::test]
async fn confirm_is_exactly_once() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    let hold = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["D3"]))
        .await
        .unwrap();
    let details = fx
        .core
        .create_order(
            &user,
            CreateOrderRequest {
                hold_id: hold.hold_id,
                customer: customer(),
            },
        )
        .await
        .unwrap();

    fx.core
        .confirm_payment(&user, details.order.order_id)
        .await
        .unwrap();

    let err = fx
        .core
        .confirm_payment(&user, details.order.order_id)
        .await
        .unwrap_err();
    assert_eq!(
        err,
        BookingError::OrderNotPending {
            status: OrderStatus::Confirmed
        }
    );
}

#[tokio::test]
async fn expired_order_cannot_be_confirmed() {
    let config = BookingConfig::default().with_order_ttl(Duration::zero());
    let fx = fixture_with(config, sample_show());
    let user = UserId::new("user-1".into());

    let hold = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["D4"]))
        .await
        .unwrap();
    let details = fx
        .core
        .create_order(
            &user,
            CreateOrderRequest {
                hold_id: hold.hold_id,
                customer: customer(),
            },
        )
        .await
        .unwrap();

    tokio::time::sleep(std::time::Duration::from_millis(10)).await;

    let err = fx
        .core
        .confirm_payment(&user, details.order.order_id)
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::OrderExpired);

    // The read view agrees.
    let view = fx.core.get_order(&user, details.order.order_id).await.unwrap();
    assert_eq!(view.order.status, OrderStatus::Expired);
}

#[tokio::test]
async fn booked_seats_conflict_for_everyone_else() {
    let fx = fixture();
    let user1 = UserId::new("user-1".into());
    let user2 = UserId::new("user-2".into());

    let hold = fx
        .core
        .create_hold(&user1, hold_request(fx.show.show_id, &["J1", "J2"]))
        .await
        .unwrap();
    let details = fx
        .core
        .create_order(
            &user1,
            CreateOrderRequest {
                hold_id: hold.hold_id,
                customer: customer(),
            },
        )
        .await
        .unwrap();
    fx.core
        .confirm_payment(&user1, details.order.order_id)
        .await
        .unwrap();

    let err = fx
        .core
        .create_hold(&user2, hold_request(fx.show.show_id, &["J2", "J3"]))
        .await
        .unwrap_err();
    match err {
        BookingError::SeatsAlreadyBooked { seats } => assert_eq!(seats, ["J2"]),
        other => panic!("expected SeatsAlreadyBooked, got {other:?}"),
    }
}

#[tokio::test]
async fn event_publication_failure_never_fails_the_request() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    fx.events.fail_next_publish();
    let hold = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["B1"]))
        .await
        .unwrap();
    assert_eq!(hold.status, HoldStatus::Held);
    assert!(fx.events.published().unwrap().is_empty());
}

#[tokio::test]
async fn last_confirmation_emits_show_sold_out() {
    let show = sample_show();
    let config = BookingConfig::default()
        .with_theatre_profile(show.theatre_id, TheatreProfile::new(1, 2));
    let fx = fixture_with(config, show);
    let user = UserId::new("user-1".into());

    let hold = fx
        .core
        .create_hold(&user, hold_request(fx.show.show_id, &["A1", "A2"]))
        .await
        .unwrap();
    let details = fx
        .core
        .create_order(
            &user,
            CreateOrderRequest {
                hold_id: hold.hold_id,
                customer: customer(),
            },
        )
        .await
        .unwrap();
    fx.core
        .confirm_payment(&user, details.order.order_id)
        .await
        .unwrap();

    let types = fx.events.event_types().unwrap();
    assert_eq!(
        types,
        ["hold.created", "order.created", "order.confirmed", "show.sold_out"]
    );
}

#[tokio::test]
async fn seatmap_is_cached_until_invalidated() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    let first = fx.projector.get_seatmap(fx.show.show_id).await.unwrap();
    assert!(first.held_seat_ids.is_empty());
    assert_eq!(first.layout.len(), 100);

    // Cached: a direct lock does not show up until something invalidates.
    fx.coordinator
        .acquire_seats(
            fx.show.show_id,
            &user,
            boxoffice_booking::HoldId::new(),
            &seats(&["C5"]),
            Duration::seconds(300),
        )
        .await
        .unwrap();
    let cached = fx.projector.get_seatmap(fx.show.show_id).await.unwrap();
    assert!(cached.held_seat_ids.is_empty());

    // A core transition invalidates and the next read recomposes.
    fx.core
        .create_hold(&user, hold_request(fx.show.show_id, &["C6"]))
        .await
        .unwrap();
    let fresh = fx.projector.get_seatmap(fx.show.show_id).await.unwrap();
    assert!(fresh.held_seat_ids.contains(&SeatId::parse("C5").unwrap()));
    assert!(fresh.held_seat_ids.contains(&SeatId::parse("C6").unwrap()));
}

#[tokio::test]
async fn unknown_show_and_unknown_hold_are_not_found() {
    let fx = fixture();
    let user = UserId::new("user-1".into());

    let err = fx
        .core
        .create_hold(&user, hold_request(ShowId::new(), &["A1"]))
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::ShowNotFound);

    let err = fx
        .core
        .get_hold(&user, boxoffice_booking::HoldId::new())
        .await
        .unwrap_err();
    assert_eq!(err, BookingError::HoldNotFound);
}
