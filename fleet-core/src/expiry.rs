use crate::booking::{Booking, BookingStatus};
use chrono::{DateTime, Duration, Utc};

/// Payment-timeout policy: a Pending booking whose grace period has fully
/// elapsed is eligible for expiry. The boundary is inclusive. Pure, no I/O;
/// the caller supplies `now` so the sweep and the tests share one clock
/// convention.
pub fn is_expired(booking: &Booking, now: DateTime<Utc>, grace_period: Duration) -> bool {
    booking.status == BookingStatus::Pending && now - booking.created_at >= grace_period
}
