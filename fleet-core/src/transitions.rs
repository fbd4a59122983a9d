use crate::booking::{BookingStatus, PaymentStatus};
use std::fmt;

/// What caused a status transition to be attempted.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Trigger {
    Cancel,
    ConfirmPayment,
    Expire,
    BeginRental,
    Complete,
}

impl fmt::Display for Trigger {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Trigger::Cancel => "CANCEL",
            Trigger::ConfirmPayment => "CONFIRM_PAYMENT",
            Trigger::Expire => "EXPIRE",
            Trigger::BeginRental => "BEGIN_RENTAL",
            Trigger::Complete => "COMPLETE",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("invalid state transition: {from} does not accept {trigger}")]
pub struct InvalidTransition {
    pub from: BookingStatus,
    pub trigger: Trigger,
}

/// The single source of truth for legal booking transitions. Pure, no I/O.
/// Any (status, trigger) pair not listed here is rejected, which makes
/// repeated cancel/expire calls on a terminal booking idempotent no-ops.
pub fn attempt_transition(
    current: BookingStatus,
    trigger: Trigger,
) -> Result<BookingStatus, InvalidTransition> {
    use BookingStatus::*;
    use Trigger::*;

    match (current, trigger) {
        (Pending, Cancel) | (Confirmed, Cancel) => Ok(Cancelled),
        (Pending, ConfirmPayment) => Ok(Confirmed),
        (Pending, Expire) => Ok(Expired),
        (Confirmed, BeginRental) => Ok(Active),
        (Active, Complete) => Ok(Completed),
        (from, trigger) => Err(InvalidTransition { from, trigger }),
    }
}

/// Payment-status change accompanying a transition. `None` means unchanged.
/// Cancelling a paid booking refunds it; confirming payment marks it paid.
pub fn payment_after(trigger: Trigger, current: PaymentStatus) -> Option<PaymentStatus> {
    match (trigger, current) {
        (Trigger::ConfirmPayment, _) => Some(PaymentStatus::Paid),
        (Trigger::Cancel, PaymentStatus::Paid) => Some(PaymentStatus::Refunded),
        _ => None,
    }
}

/// The reachable (status, payment) combinations.
pub fn is_legal_pair(status: BookingStatus, payment: PaymentStatus) -> bool {
    use BookingStatus::*;
    use PaymentStatus::*;

    match status {
        Pending => payment == Unpaid,
        Confirmed | Active | Completed => payment == Paid,
        Cancelled => matches!(payment, Unpaid | Refunded),
        Expired => payment == Unpaid,
    }
}
