// Booking records and the queries staff run against them

pub mod query;
pub mod types;

pub use query::{BookingOrder, BookingQuery, StatusFilter};
pub use types::{
    day_bounds, format_duration, parse_timestamp, BadgeCounts, Booking, BookingId, BookingUpdate,
    HistorySort, Stage, StaffIdentity, StaffProfile, WorkStatus,
};
