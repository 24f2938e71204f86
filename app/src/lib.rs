//! # Matchday
//!
//! Football match ticketing for Kenyan venues: browse fixtures, pick seats
//! on a generated map, pay by M-Pesa prompt, and manage it all from a
//! back-office panel.
//!
//! The crate is organised around a few hard boundaries:
//!
//! - [`data::DataStore`]: persistence, backed by a hosted Supabase-style
//!   backend over HTTP in production and [`data::InMemoryStore`] in tests
//! - [`auth::AuthProvider`]: identity and sessions
//! - [`payments::MpesaGateway`]: payment prompt initiation
//!
//! The booking flow itself is a reducer ([`booking::BookingReducer`]) run
//! by the `matchday-runtime` store: user input and completed side effects
//! arrive as actions, I/O leaves as effects. Seat maps ([`seatmap`]),
//! prices ([`pricing`]), and phone numbers ([`phone`]) are pure modules the
//! reducer composes.
//!
//! ## Booking a seat
//!
//! ```ignore
//! use std::sync::Arc;
//! use matchday::booking::{BookingAction, BookingEnvironment, BookingReducer, BookingState};
//! use matchday_runtime::Store;
//!
//! let env = BookingEnvironment::new(data, payments, clock, layout, multipliers)
//!     .with_session(session);
//! let store = Store::new(BookingState::default(), BookingReducer, env);
//! store.send(BookingAction::LoadMatch { match_id }).await?;
//! ```

pub mod admin;
pub mod auth;
pub mod booking;
pub mod config;
pub mod data;
pub mod format;
pub mod payments;
pub mod phone;
pub mod pricing;
pub mod realtime;
pub mod seatmap;
pub mod types;

pub use phone::PhoneNumber;
pub use types::{Match, MatchId, Money, Seat, SeatNumber, SeatType, Ticket, TicketId, UserId};
