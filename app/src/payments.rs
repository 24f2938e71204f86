//! M-Pesa payment boundary.
//!
//! A booking submission triggers one STK push: the customer's phone shows a
//! payment prompt for the booking total. Only initiation is modelled here;
//! settlement confirmation arrives out of band and is reconciled by the
//! back office, so nothing in the booking flow waits on it.

use async_trait::async_trait;
use thiserror::Error;

use crate::phone::PhoneNumber;
use crate::types::Money;

/// Errors from payment initiation.
#[derive(Debug, Error)]
pub enum PaymentError {
    /// The gateway refused to start the prompt.
    #[error("payment prompt failed: {0}")]
    PromptFailed(String),

    /// The request never completed.
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),
}

/// An STK push accepted by the gateway.
#[derive(Clone, Debug, PartialEq)]
pub struct PaymentPrompt {
    /// Gateway reference for the prompt.
    pub checkout_id: String,
    /// Number the prompt was sent to.
    pub phone: PhoneNumber,
    /// Amount requested.
    pub amount: Money,
}

/// The payment gateway boundary.
#[async_trait]
pub trait MpesaGateway: Send + Sync {
    /// Ask the gateway to show a payment prompt on the customer's phone.
    async fn initiate_stk_push(
        &self,
        phone: &PhoneNumber,
        amount: Money,
    ) -> Result<PaymentPrompt, PaymentError>;
}

/// Gateway stand-in that accepts every prompt after a short delay.
#[derive(Clone, Debug, Default)]
pub struct MockMpesaGateway;

impl MockMpesaGateway {
    /// Create the stand-in gateway.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

#[async_trait]
impl MpesaGateway for MockMpesaGateway {
    async fn initiate_stk_push(
        &self,
        phone: &PhoneNumber,
        amount: Money,
    ) -> Result<PaymentPrompt, PaymentError> {
        tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        let prompt = PaymentPrompt {
            checkout_id: format!("ws_CO_{}", uuid::Uuid::new_v4().simple()),
            phone: phone.clone(),
            amount,
        };
        tracing::info!(
            checkout_id = %prompt.checkout_id,
            phone = %prompt.phone,
            amount = %prompt.amount,
            "payment prompt initiated"
        );
        Ok(prompt)
    }
}
