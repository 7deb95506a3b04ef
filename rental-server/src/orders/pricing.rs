//! Order pricing

use rust_decimal::prelude::ToPrimitive;
use rust_decimal::{Decimal, RoundingStrategy};
use shared::error::{AppError, ErrorCode};
use shared::models::Bike;

use crate::gateway::CheckoutItem;

/// Largest amount a `NUMERIC(12,2)` money column holds
pub const MAX_AMOUNT: Decimal = Decimal::from_parts(3_567_587_327, 232, 0, false, 2);

fn out_of_range() -> AppError {
    AppError::with_message(
        ErrorCode::ValueOutOfRange,
        format!("Order total exceeds {MAX_AMOUNT}"),
    )
}

/// Σ price_per_hour × hours over the claimed bikes
pub fn total_price(bikes: &[Bike], hours: i32) -> Result<Decimal, AppError> {
    let hours = Decimal::from(hours);
    let total = bikes.iter().try_fold(Decimal::ZERO, |acc, bike| {
        bike.price_per_hour
            .checked_mul(hours)
            .and_then(|line| acc.checked_add(line))
            .ok_or_else(out_of_range)
    })?;
    if total > MAX_AMOUNT {
        return Err(out_of_range());
    }
    Ok(total)
}

/// One checkout line per bike; unit price rounded half away from zero
pub fn checkout_items(bikes: &[Bike], hours: i32) -> Result<Vec<CheckoutItem>, AppError> {
    bikes
        .iter()
        .map(|bike| {
            let price = bike
                .price_per_hour
                .round_dp_with_strategy(0, RoundingStrategy::MidpointAwayFromZero)
                .to_i64()
                .ok_or_else(|| {
                    AppError::new(ErrorCode::ValueOutOfRange)
                        .with_detail("bike_id", bike.id.clone())
                })?;
            Ok(CheckoutItem {
                id: bike.id.clone(),
                name: bike.name.clone(),
                price,
                quantity: hours,
                category: bike.category_name.clone(),
            })
        })
        .collect()
}

/// Gross amount as the gateway checks it: Σ item price × quantity.
/// This is what the customer is charged.
pub fn gross_amount(items: &[CheckoutItem]) -> Result<i64, AppError> {
    let gross = items.iter().try_fold(0i64, |acc, item| {
        item.price
            .checked_mul(i64::from(item.quantity))
            .and_then(|line| acc.checked_add(line))
            .ok_or_else(out_of_range)
    })?;
    if Decimal::from(gross) > MAX_AMOUNT {
        return Err(out_of_range());
    }
    Ok(gross)
}
