//! Payment-amount validation (§4.4 write gate, §4.9, §7 `InsufficientPayment`).

use starling_pricing::PriceQuote;

use crate::error::{ValidationError, ValidationResult};

/// `amount` must meet or exceed `quote.amount`. The one check shared by the
/// relay's write gate (a bare `EVENT` is never pre-paid, so this always
/// fails for non-zero quotes there) and the payment handler (which applies
/// it to the amount actually carried by the inbound packet).
pub fn validate_payment(amount: u64, quote: PriceQuote) -> ValidationResult<()> {
    if amount < quote.amount {
        return Err(ValidationError::InsufficientPayment { required: quote.amount });
    }
    Ok(())
}
