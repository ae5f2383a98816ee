use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::models::{Payment, PaymentMethod, PaymentStatus, Reservation};

/// Importes monetarios no pueden ser negativos
pub fn validate_non_negative(amount: &Decimal) -> Result<(), ValidationError> {
    if amount.is_sign_negative() {
        return Err(ValidationError::new("non_negative"));
    }
    Ok(())
}

fn default_currency() -> String {
    "USD".to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreatePaymentRequest {
    pub reservation_id: Uuid,
    pub payment_method: PaymentMethod,

    #[validate(custom = "validate_non_negative")]
    pub amount: Decimal,

    #[serde(default = "default_currency")]
    #[validate(length(min = 3, max = 3))]
    pub currency: String,

    pub status: PaymentStatus,
    pub transaction_id: Option<String>,
    pub details: Option<serde_json::Value>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct UpdatePaymentStatusRequest {
    pub status: PaymentStatus,
    pub details: Option<serde_json::Value>,
}

// Pago junto con su reserva ya actualizada
#[derive(Debug, Serialize)]
pub struct PaymentResponse {
    #[serde(flatten)]
    pub payment: Payment,
    pub reservation: Reservation,
}
