//! End-to-end booking flow tests: reducer, runtime, and in-memory backend
//! working together.

#![allow(clippy::expect_used, clippy::panic)]

use std::sync::Arc;
use std::time::Duration;

use chrono::{TimeZone, Utc};
use matchday::auth::{Session, UserRole};
use matchday::booking::{
    BookingAction, BookingEnvironment, BookingPhase, BookingReducer, BookingState,
};
use matchday::data::{DataStore, InMemoryStore};
use matchday::payments::MockMpesaGateway;
use matchday::pricing::SeatMultipliers;
use matchday::seatmap::StadiumLayout;
use matchday::types::{Match, MatchDraft, MatchId, Money, TicketStatus};
use matchday_core::environment::SystemClock;
use matchday_runtime::Store;

const WAIT: Duration = Duration::from_secs(5);

type BookingStore = Store<BookingState, BookingAction, BookingEnvironment, BookingReducer>;

/// Rows A and B standard, C VIP. Base price 1,000 puts a standard seat at
/// 1,000 and a VIP seat at 1,500.
fn layout() -> StadiumLayout {
    StadiumLayout::new(3, 4, [], [3]).expect("valid layout")
}

fn session(role: UserRole) -> Session {
    Session {
        user_id: matchday::types::UserId::new(),
        email: "fan@example.com".into(),
        role,
        access_token: "token".into(),
    }
}

async fn seeded_store() -> (Arc<InMemoryStore>, Match) {
    let data = Arc::new(InMemoryStore::new());
    let fixture = data
        .create_match(MatchDraft {
            home_team: "Gor Mahia".into(),
            away_team: "AFC Leopards".into(),
            match_date: Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).single().expect("valid date"),
            venue: "Kasarani".into(),
            ticket_price: Money::from_shillings(1_000),
            total_seats: 12,
        })
        .await
        .expect("seed fixture");
    (data, fixture)
}

fn booking_store(data: &Arc<InMemoryStore>, session: Option<Session>) -> BookingStore {
    let mut env = BookingEnvironment::new(
        Arc::clone(data) as Arc<dyn DataStore>,
        Arc::new(MockMpesaGateway::new()),
        Arc::new(SystemClock),
        layout(),
        SeatMultipliers::default(),
    );
    if let Some(session) = session {
        env = env.with_session(session);
    }
    Store::new(BookingState::default(), BookingReducer, env)
}

async fn load_match(store: &BookingStore, match_id: MatchId) {
    store
        .send_and_wait_for(
            BookingAction::LoadMatch { match_id },
            |a| matches!(a, BookingAction::MatchLoaded { .. } | BookingAction::LoadFailed { .. }),
            WAIT,
        )
        .await
        .expect("match load");
}

async fn select_seats(store: &BookingStore, seats: &[&str]) {
    for seat in seats {
        store
            .send(BookingAction::ToggleSeat {
                number: (*seat).into(),
            })
            .await
            .expect("toggle");
    }
}

#[tokio::test]
async fn happy_path_issues_tickets_and_decrements_availability() {
    let (data, fixture) = seeded_store().await;
    let store = booking_store(&data, Some(session(UserRole::Fan)));

    load_match(&store, fixture.id).await;
    select_seats(&store, &["A1", "C1"]).await;
    store
        .send(BookingAction::ProceedToPayment)
        .await
        .expect("proceed");

    let outcome = store
        .send_and_wait_for(
            BookingAction::SubmitPayment {
                phone_input: "0712345678".into(),
            },
            |a| {
                matches!(
                    a,
                    BookingAction::TicketsIssued { .. } | BookingAction::BookingFailed { .. }
                )
            },
            WAIT,
        )
        .await
        .expect("submission outcome");

    let BookingAction::TicketsIssued { tickets, total } = outcome else {
        panic!("expected TicketsIssued, got {outcome:?}");
    };
    assert_eq!(total, Money::from_shillings(2_500));
    assert_eq!(tickets.len(), 2);
    // Seat-map order: A1 at base price, C1 at the VIP multiplier.
    assert_eq!(tickets[0].seat_number.as_str(), "A1");
    assert_eq!(tickets[0].price, Money::from_shillings(1_000));
    assert_eq!(tickets[1].seat_number.as_str(), "C1");
    assert_eq!(tickets[1].price, Money::from_shillings(1_500));
    assert_eq!(tickets[0].phone_number.to_string(), "+254712345678");

    store
        .state(|s| {
            assert_eq!(s.phase, BookingPhase::Confirmed);
            assert!(s.selected.is_empty());
            assert!(s.confirmation.is_some());
        })
        .await;

    let stored = data.get_match(fixture.id).await.expect("fixture");
    assert_eq!(stored.available_seats, 10);
    let stored_tickets = data
        .list_tickets_for_match(fixture.id)
        .await
        .expect("tickets");
    assert_eq!(stored_tickets.len(), 2);
    assert!(stored_tickets.iter().all(|t| t.status == TicketStatus::Active));
}

#[tokio::test]
async fn partial_write_failure_cancels_the_prefix_and_keeps_availability() {
    let (data, fixture) = seeded_store().await;
    let store = booking_store(&data, Some(session(UserRole::Fan)));

    load_match(&store, fixture.id).await;
    select_seats(&store, &["A1", "A2", "A3"]).await;
    store
        .send(BookingAction::ProceedToPayment)
        .await
        .expect("proceed");

    data.fail_create_ticket_after(1);

    let outcome = store
        .send_and_wait_for(
            BookingAction::SubmitPayment {
                phone_input: "254712345678".into(),
            },
            |a| {
                matches!(
                    a,
                    BookingAction::TicketsIssued { .. } | BookingAction::BookingFailed { .. }
                )
            },
            WAIT,
        )
        .await
        .expect("submission outcome");

    let BookingAction::BookingFailed {
        tickets_written, ..
    } = outcome
    else {
        panic!("expected BookingFailed, got {outcome:?}");
    };
    assert_eq!(tickets_written, 1);

    // The written prefix was cancelled, never deleted, and the decrement
    // was never issued.
    let stored_tickets = data
        .list_tickets_for_match(fixture.id)
        .await
        .expect("tickets");
    assert_eq!(stored_tickets.len(), 1);
    assert_eq!(stored_tickets[0].status, TicketStatus::Cancelled);
    let stored = data.get_match(fixture.id).await.expect("fixture");
    assert_eq!(stored.available_seats, 12);

    store
        .state(|s| {
            assert_eq!(s.phase, BookingPhase::EnteringPayment);
            assert!(s.error.is_some());
        })
        .await;
}

#[tokio::test]
async fn contested_seat_fails_the_second_booking_cleanly() {
    let (data, fixture) = seeded_store().await;
    let first = booking_store(&data, Some(session(UserRole::Fan)));
    let second = booking_store(&data, Some(session(UserRole::Fan)));

    for store in [&first, &second] {
        load_match(store, fixture.id).await;
        select_seats(store, &["B2"]).await;
        store
            .send(BookingAction::ProceedToPayment)
            .await
            .expect("proceed");
    }

    let submit = |store: &BookingStore| {
        let store = store.clone();
        async move {
            store
                .send_and_wait_for(
                    BookingAction::SubmitPayment {
                        phone_input: "0712345678".into(),
                    },
                    |a| {
                        matches!(
                            a,
                            BookingAction::TicketsIssued { .. }
                                | BookingAction::BookingFailed { .. }
                        )
                    },
                    WAIT,
                )
                .await
                .expect("submission outcome")
        }
    };

    let won = submit(&first).await;
    let lost = submit(&second).await;

    assert!(matches!(won, BookingAction::TicketsIssued { .. }));
    let BookingAction::BookingFailed {
        tickets_written, ..
    } = lost
    else {
        panic!("expected BookingFailed, got {lost:?}");
    };
    assert_eq!(tickets_written, 0);

    // Exactly one active ticket holds the seat; availability reflects one
    // sale.
    let stored_tickets = data
        .list_tickets_for_match(fixture.id)
        .await
        .expect("tickets");
    let active: Vec<_> = stored_tickets
        .iter()
        .filter(|t| t.status == TicketStatus::Active)
        .collect();
    assert_eq!(active.len(), 1);
    assert_eq!(active[0].seat_number.as_str(), "B2");
    let stored = data.get_match(fixture.id).await.expect("fixture");
    assert_eq!(stored.available_seats, 11);
}

#[tokio::test]
async fn anonymous_sessions_cannot_reach_payment() {
    let (data, fixture) = seeded_store().await;
    let store = booking_store(&data, None);

    load_match(&store, fixture.id).await;
    select_seats(&store, &["A1"]).await;
    store
        .send(BookingAction::ProceedToPayment)
        .await
        .expect("proceed");

    store
        .state(|s| {
            assert_eq!(s.phase, BookingPhase::SelectingSeats);
            assert!(s.error.is_some());
        })
        .await;
    assert_eq!(data.ticket_count().await, 0);
}

#[tokio::test]
async fn reloading_marks_sold_seats_unavailable_for_the_next_customer() {
    let (data, fixture) = seeded_store().await;
    let store = booking_store(&data, Some(session(UserRole::Fan)));

    load_match(&store, fixture.id).await;
    select_seats(&store, &["A4"]).await;
    store
        .send(BookingAction::ProceedToPayment)
        .await
        .expect("proceed");
    store
        .send_and_wait_for(
            BookingAction::SubmitPayment {
                phone_input: "0712345678".into(),
            },
            |a| matches!(a, BookingAction::TicketsIssued { .. }),
            WAIT,
        )
        .await
        .expect("submission outcome");

    let next = booking_store(&data, Some(session(UserRole::Fan)));
    load_match(&next, fixture.id).await;
    next.state(|s| {
        let a4 = s
            .seats
            .iter()
            .find(|seat| seat.number.as_str() == "A4")
            .expect("A4 in map");
        assert!(!a4.available);
    })
    .await;
}

#[tokio::test]
async fn unknown_match_reports_a_load_error() {
    let (data, _) = seeded_store().await;
    let store = booking_store(&data, Some(session(UserRole::Fan)));

    let outcome = store
        .send_and_wait_for(
            BookingAction::LoadMatch {
                match_id: MatchId::new(),
            },
            |a| matches!(a, BookingAction::MatchLoaded { .. } | BookingAction::LoadFailed { .. }),
            WAIT,
        )
        .await
        .expect("load outcome");
    assert!(matches!(outcome, BookingAction::LoadFailed { .. }));
    store
        .state(|s| assert!(s.error.is_some()))
        .await;
}
