//! Folding realtime change events into local row lists.
//!
//! The hosted backend streams row-level changes per table. The transport is
//! external; what lives here is the fold: given a local `Vec` of rows and
//! one [`ChangeEvent`], produce the updated list. The fold is keyed on
//! primary-key identity via [`Identified`] and is idempotent: replaying an
//! insert or applying an update for a row that never arrived cannot corrupt
//! the list.

use crate::types::{Match, MatchId, Ticket, TicketId};

/// A row type with a primary-key identity.
pub trait Identified {
    /// The primary-key type.
    type Id: PartialEq + Clone + std::fmt::Debug;

    /// This row's primary key.
    fn identity(&self) -> Self::Id;
}

impl Identified for Match {
    type Id = MatchId;

    fn identity(&self) -> MatchId {
        self.id
    }
}

impl Identified for Ticket {
    type Id = TicketId;

    fn identity(&self) -> TicketId {
        self.id
    }
}

/// One row-level change delivered by a table subscription.
#[derive(Clone, Debug)]
pub enum ChangeEvent<T: Identified> {
    /// A row was inserted.
    Insert(T),
    /// A row was updated; the full new row is delivered.
    Update(T),
    /// A row was deleted.
    Delete {
        /// Primary key of the deleted row.
        id: T::Id,
    },
}

/// Fold one change into a local row list.
///
/// - `Insert` appends, or replaces an existing row with the same identity
///   (a replayed insert is treated as the freshest copy)
/// - `Update` replaces the matching row and is a no-op when the row was
///   never loaded
/// - `Delete` removes the matching row if present
pub fn apply_change<T: Identified>(rows: &mut Vec<T>, event: ChangeEvent<T>) {
    match event {
        ChangeEvent::Insert(row) => {
            let id = row.identity();
            if let Some(existing) = rows.iter_mut().find(|r| r.identity() == id) {
                *existing = row;
            } else {
                rows.push(row);
            }
        },
        ChangeEvent::Update(row) => {
            let id = row.identity();
            if let Some(existing) = rows.iter_mut().find(|r| r.identity() == id) {
                *existing = row;
            }
        },
        ChangeEvent::Delete { id } => {
            rows.retain(|r| r.identity() != id);
        },
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::types::Money;
    use chrono::{TimeZone, Utc};

    #[derive(Clone, Debug, PartialEq)]
    struct Row {
        id: u32,
        value: &'static str,
    }

    impl Identified for Row {
        type Id = u32;

        fn identity(&self) -> u32 {
            self.id
        }
    }

    #[test]
    fn insert_appends_new_rows() {
        let mut rows = vec![Row { id: 1, value: "a" }];
        apply_change(&mut rows, ChangeEvent::Insert(Row { id: 2, value: "b" }));
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[1].value, "b");
    }

    #[test]
    fn replayed_insert_replaces_instead_of_duplicating() {
        let mut rows = vec![Row { id: 1, value: "old" }];
        apply_change(&mut rows, ChangeEvent::Insert(Row { id: 1, value: "new" }));
        assert_eq!(rows, vec![Row { id: 1, value: "new" }]);
    }

    #[test]
    fn update_replaces_matching_row_only() {
        let mut rows = vec![Row { id: 1, value: "a" }, Row { id: 2, value: "b" }];
        apply_change(&mut rows, ChangeEvent::Update(Row { id: 2, value: "b2" }));
        assert_eq!(rows[0].value, "a");
        assert_eq!(rows[1].value, "b2");
    }

    #[test]
    fn update_for_unknown_row_is_a_no_op() {
        let mut rows = vec![Row { id: 1, value: "a" }];
        apply_change(&mut rows, ChangeEvent::Update(Row { id: 9, value: "x" }));
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn delete_removes_matching_row() {
        let mut rows = vec![Row { id: 1, value: "a" }, Row { id: 2, value: "b" }];
        apply_change(&mut rows, ChangeEvent::Delete { id: 1 });
        assert_eq!(rows, vec![Row { id: 2, value: "b" }]);
        apply_change(&mut rows, ChangeEvent::Delete { id: 7 });
        assert_eq!(rows.len(), 1);
    }

    #[test]
    fn domain_rows_fold_by_their_ids() {
        let fixture = Match {
            id: MatchId::new(),
            home_team: "Gor Mahia".into(),
            away_team: "Tusker".into(),
            match_date: Utc.with_ymd_and_hms(2025, 6, 1, 15, 0, 0).single().unwrap(),
            venue: "Kasarani".into(),
            ticket_price: Money::from_shillings(1_000),
            total_seats: 200,
            available_seats: 200,
        };
        let mut matches = Vec::new();
        apply_change(&mut matches, ChangeEvent::Insert(fixture.clone()));

        let mut sold_one = fixture.clone();
        sold_one.available_seats = 199;
        apply_change(&mut matches, ChangeEvent::Update(sold_one));
        assert_eq!(matches[0].available_seats, 199);

        apply_change(&mut matches, ChangeEvent::Delete { id: fixture.id });
        assert!(matches.is_empty());
    }
}
