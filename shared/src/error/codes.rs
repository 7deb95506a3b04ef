//! Unified error codes for the rental backend
//!
//! Error codes are organized by category:
//! - 0xxx: General errors
//! - 1xxx: User errors
//! - 4xxx: Order / rental errors
//! - 5xxx: Payment and gateway errors
//! - 6xxx: Bike errors
//! - 9xxx: System errors

use serde::{Deserialize, Serialize};
use std::fmt;

/// Unified error code enum
///
/// All error codes are represented as u16 values so clients can switch on
/// them without parsing messages.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "u16", try_from = "u16")]
#[repr(u16)]
pub enum ErrorCode {
    // ==================== 0xxx: General ====================
    /// Operation completed successfully
    Success = 0,
    /// Validation failed
    ValidationFailed = 2,
    /// Resource already exists
    AlreadyExists = 4,
    /// Value out of range
    ValueOutOfRange = 8,

    // ==================== 1xxx: User ====================
    /// Customer not found
    UserNotFound = 1001,

    // ==================== 4xxx: Order ====================
    /// Order not found
    OrderNotFound = 4001,
    /// Order has no bikes
    OrderEmpty = 4002,
    /// Same bike requested twice in one order
    OrderDuplicateBike = 4003,
    /// Rental history not found for order
    HistoryNotFound = 4004,
    /// Rental is not in a state that allows the operation
    RentalStatusConflict = 4005,

    // ==================== 5xxx: Payment ====================
    /// Payment record not found
    PaymentNotFound = 5001,
    /// Payment gateway rejected the request or answered garbage
    GatewayError = 5002,
    /// Payment gateway unreachable or timed out
    GatewayUnavailable = 5003,

    // ==================== 6xxx: Bike ====================
    /// Bike not found
    BikeNotFound = 6001,
    /// Bike is already reserved
    BikeUnavailable = 6002,

    // ==================== 9xxx: System ====================
    /// Internal server error
    InternalError = 9001,
}

impl ErrorCode {
    /// Get the numeric code value
    #[inline]
    pub const fn code(&self) -> u16 {
        *self as u16
    }

    /// Get the developer-facing English message for this error code
    pub const fn message(&self) -> &'static str {
        match self {
            // General
            ErrorCode::Success => "Operation completed successfully",
            ErrorCode::ValidationFailed => "Validation failed",
            ErrorCode::AlreadyExists => "Resource already exists",
            ErrorCode::ValueOutOfRange => "Value is out of range",

            // User
            ErrorCode::UserNotFound => "Customer not found",

            // Order
            ErrorCode::OrderNotFound => "Order not found",
            ErrorCode::OrderEmpty => "Order must contain at least one bike",
            ErrorCode::OrderDuplicateBike => "Bike requested more than once",
            ErrorCode::HistoryNotFound => "Rental history not found",
            ErrorCode::RentalStatusConflict => "Rental status does not allow this operation",

            // Payment
            ErrorCode::PaymentNotFound => "Payment not found",
            ErrorCode::GatewayError => "Payment gateway error",
            ErrorCode::GatewayUnavailable => "Payment gateway unavailable",

            // Bike
            ErrorCode::BikeNotFound => "Bike not found",
            ErrorCode::BikeUnavailable => "Bike unavailable",

            // System
            ErrorCode::InternalError => "Internal server error",
        }
    }
}

impl From<ErrorCode> for u16 {
    #[inline]
    fn from(code: ErrorCode) -> Self {
        code.code()
    }
}

/// Error when converting from an invalid u16 to ErrorCode
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct InvalidErrorCode(pub u16);

impl fmt::Display for InvalidErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "invalid error code: {}", self.0)
    }
}

impl std::error::Error for InvalidErrorCode {}

impl TryFrom<u16> for ErrorCode {
    type Error = InvalidErrorCode;

    fn try_from(value: u16) -> Result<Self, Self::Error> {
        match value {
            // General
            0 => Ok(ErrorCode::Success),
            2 => Ok(ErrorCode::ValidationFailed),
            4 => Ok(ErrorCode::AlreadyExists),
            8 => Ok(ErrorCode::ValueOutOfRange),

            // User
            1001 => Ok(ErrorCode::UserNotFound),

            // Order
            4001 => Ok(ErrorCode::OrderNotFound),
            4002 => Ok(ErrorCode::OrderEmpty),
            4003 => Ok(ErrorCode::OrderDuplicateBike),
            4004 => Ok(ErrorCode::HistoryNotFound),
            4005 => Ok(ErrorCode::RentalStatusConflict),

            // Payment
            5001 => Ok(ErrorCode::PaymentNotFound),
            5002 => Ok(ErrorCode::GatewayError),
            5003 => Ok(ErrorCode::GatewayUnavailable),

            // Bike
            6001 => Ok(ErrorCode::BikeNotFound),
            6002 => Ok(ErrorCode::BikeUnavailable),

            // System
            9001 => Ok(ErrorCode::InternalError),

            _ => Err(InvalidErrorCode(value)),
        }
    }
}

impl fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.code())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_code_values() {
        assert_eq!(ErrorCode::Success.code(), 0);
        assert_eq!(ErrorCode::ValidationFailed.code(), 2);
        assert_eq!(ErrorCode::AlreadyExists.code(), 4);
        assert_eq!(ErrorCode::ValueOutOfRange.code(), 8);

        assert_eq!(ErrorCode::UserNotFound.code(), 1001);

        assert_eq!(ErrorCode::OrderNotFound.code(), 4001);
        assert_eq!(ErrorCode::OrderEmpty.code(), 4002);
        assert_eq!(ErrorCode::OrderDuplicateBike.code(), 4003);
        assert_eq!(ErrorCode::HistoryNotFound.code(), 4004);
        assert_eq!(ErrorCode::RentalStatusConflict.code(), 4005);

        assert_eq!(ErrorCode::PaymentNotFound.code(), 5001);
        assert_eq!(ErrorCode::GatewayError.code(), 5002);
        assert_eq!(ErrorCode::GatewayUnavailable.code(), 5003);

        assert_eq!(ErrorCode::BikeNotFound.code(), 6001);
        assert_eq!(ErrorCode::BikeUnavailable.code(), 6002);

        assert_eq!(ErrorCode::InternalError.code(), 9001);
    }

    #[test]
    fn test_try_from_valid() {
        assert_eq!(ErrorCode::try_from(0), Ok(ErrorCode::Success));
        assert_eq!(ErrorCode::try_from(1001), Ok(ErrorCode::UserNotFound));
        assert_eq!(ErrorCode::try_from(4005), Ok(ErrorCode::RentalStatusConflict));
        assert_eq!(ErrorCode::try_from(5003), Ok(ErrorCode::GatewayUnavailable));
        assert_eq!(ErrorCode::try_from(6002), Ok(ErrorCode::BikeUnavailable));
    }

    #[test]
    fn test_try_from_invalid() {
        assert_eq!(ErrorCode::try_from(999), Err(InvalidErrorCode(999)));
        assert_eq!(ErrorCode::try_from(10000), Err(InvalidErrorCode(10000)));
        assert_eq!(ErrorCode::try_from(7001), Err(InvalidErrorCode(7001)));
        assert_eq!(ErrorCode::try_from(1), Err(InvalidErrorCode(1)));
    }

    #[test]
    fn test_serialize() {
        let json = serde_json::to_string(&ErrorCode::BikeUnavailable).unwrap();
        assert_eq!(json, "6002");

        let code: ErrorCode = serde_json::from_str("4001").unwrap();
        assert_eq!(code, ErrorCode::OrderNotFound);

        let result: Result<ErrorCode, _> = serde_json::from_str("999");
        assert!(result.is_err());
    }

    #[test]
    fn test_display() {
        assert_eq!(format!("{}", ErrorCode::Success), "0");
        assert_eq!(format!("{}", ErrorCode::OrderNotFound), "4001");
        assert_eq!(
            format!("{}", InvalidErrorCode(999)),
            "invalid error code: 999"
        );
    }

    #[test]
    fn test_message() {
        assert_eq!(ErrorCode::BikeUnavailable.message(), "Bike unavailable");
        assert_eq!(ErrorCode::OrderNotFound.message(), "Order not found");
        assert_eq!(ErrorCode::InternalError.message(), "Internal server error");
    }
}
