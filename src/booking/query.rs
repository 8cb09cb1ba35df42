// Typed booking list filters, shared by every record store backend

use chrono::NaiveDate;
use std::cmp::Ordering;

use super::types::{Booking, HistorySort, WorkStatus};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum StatusFilter {
    #[default]
    Any,
    /// Only `COMPLETED` bookings
    Completed,
    /// Everything that is not yet `COMPLETED`
    Open,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BookingOrder {
    CreatedNewestFirst,
    EndedNewestFirst,
    EndedOldestFirst,
    CustomerName,
}

impl From<HistorySort> for BookingOrder {
    fn from(sort: HistorySort) -> Self {
        match sort {
            HistorySort::Recent => BookingOrder::EndedNewestFirst,
            HistorySort::Date => BookingOrder::EndedOldestFirst,
            HistorySort::Name => BookingOrder::CustomerName,
        }
    }
}

/// Filter over the `bookings` table scoped to one staff member
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BookingQuery {
    pub staff_email: String,
    pub status: StatusFilter,
    pub viewed: Option<bool>,
    /// Restrict to bookings whose work ended on this (UTC) day
    pub ended_on: Option<NaiveDate>,
    pub order: Option<BookingOrder>,
}

impl BookingQuery {
    /// Jobs assigned to the staff member that are not completed yet
    pub fn assigned(staff_email: &str) -> Self {
        Self {
            staff_email: staff_email.to_string(),
            status: StatusFilter::Open,
            ..Default::default()
        }
    }

    /// Jobs the staff member has not opened yet, newest first
    pub fn unviewed(staff_email: &str) -> Self {
        Self {
            staff_email: staff_email.to_string(),
            viewed: Some(false),
            order: Some(BookingOrder::CreatedNewestFirst),
            ..Default::default()
        }
    }

    /// Completion history
    pub fn completed(staff_email: &str, sort: HistorySort, ended_on: Option<NaiveDate>) -> Self {
        Self {
            staff_email: staff_email.to_string(),
            status: StatusFilter::Completed,
            ended_on,
            order: Some(sort.into()),
            ..Default::default()
        }
    }

    /// Same filter without ordering, for count requests
    pub fn unordered(&self) -> Self {
        Self {
            order: None,
            ..self.clone()
        }
    }

    pub fn matches(&self, booking: &Booking) -> bool {
        if booking.assigned_staff_email.as_deref() != Some(self.staff_email.as_str()) {
            return false;
        }
        let status_ok = match self.status {
            StatusFilter::Any => true,
            StatusFilter::Completed => booking.work_status == WorkStatus::Completed,
            StatusFilter::Open => booking.work_status != WorkStatus::Completed,
        };
        if !status_ok {
            return false;
        }
        if let Some(viewed) = self.viewed {
            if booking.is_viewed != viewed {
                return false;
            }
        }
        if let Some(day) = self.ended_on {
            match booking.work_ended_at {
                Some(ended) if ended.date_naive() == day => {}
                _ => return false,
            }
        }
        true
    }

    /// Order two bookings the way the backend would for this query
    pub fn compare(&self, a: &Booking, b: &Booking) -> Ordering {
        match self.order {
            None => Ordering::Equal,
            Some(BookingOrder::CreatedNewestFirst) => b.created_at.cmp(&a.created_at),
            Some(BookingOrder::EndedNewestFirst) => b.work_ended_at.cmp(&a.work_ended_at),
            Some(BookingOrder::EndedOldestFirst) => a.work_ended_at.cmp(&b.work_ended_at),
            Some(BookingOrder::CustomerName) => a.customer_name.cmp(&b.customer_name),
        }
    }

    /// Apply this query to an in-memory table
    pub fn select(&self, rows: &[Booking]) -> Vec<Booking> {
        let mut selected: Vec<Booking> = rows.iter().filter(|b| self.matches(b)).cloned().collect();
        selected.sort_by(|a, b| self.compare(a, b));
        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::{TimeZone, Utc};

    fn booking(id: &str, email: &str, status: WorkStatus) -> Booking {
        let mut b = Booking::new(id, "1", "2");
        b.assigned_staff_email = Some(email.to_string());
        b.work_status = status;
        b
    }

    #[test]
    fn test_assigned_excludes_completed_and_other_staff() {
        let rows = vec![
            booking("a", "me@x.com", WorkStatus::Pending),
            booking("b", "me@x.com", WorkStatus::Completed),
            booking("c", "other@x.com", WorkStatus::Pending),
            booking("d", "me@x.com", WorkStatus::InProgress),
        ];

        let ids: Vec<_> = BookingQuery::assigned("me@x.com")
            .select(&rows)
            .into_iter()
            .map(|b| b.id.0)
            .collect();
        assert_eq!(ids, vec!["a", "d"]);
    }

    #[test]
    fn test_history_sorting_and_day_filter() {
        let mut early = booking("early", "me@x.com", WorkStatus::Completed);
        early.customer_name = Some("Zoya".into());
        early.work_ended_at = Some(Utc.with_ymd_and_hms(2025, 5, 1, 9, 0, 0).unwrap());
        let mut late = booking("late", "me@x.com", WorkStatus::Completed);
        late.customer_name = Some("Anil".into());
        late.work_ended_at = Some(Utc.with_ymd_and_hms(2025, 5, 2, 18, 0, 0).unwrap());
        let rows = vec![early, late];

        let recent = BookingQuery::completed("me@x.com", HistorySort::Recent, None).select(&rows);
        assert_eq!(recent[0].id.as_str(), "late");

        let oldest = BookingQuery::completed("me@x.com", HistorySort::Date, None).select(&rows);
        assert_eq!(oldest[0].id.as_str(), "early");

        let by_name = BookingQuery::completed("me@x.com", HistorySort::Name, None).select(&rows);
        assert_eq!(by_name[0].id.as_str(), "late");

        let day = NaiveDate::from_ymd_opt(2025, 5, 1).unwrap();
        let on_day = BookingQuery::completed("me@x.com", HistorySort::Recent, Some(day)).select(&rows);
        assert_eq!(on_day.len(), 1);
        assert_eq!(on_day[0].id.as_str(), "early");
    }

    #[test]
    fn test_unviewed_filter() {
        let mut seen = booking("seen", "me@x.com", WorkStatus::Pending);
        seen.is_viewed = true;
        let fresh = booking("fresh", "me@x.com", WorkStatus::Pending);

        let rows = BookingQuery::unviewed("me@x.com").select(&[seen, fresh]);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0].id.as_str(), "fresh");
    }
}
