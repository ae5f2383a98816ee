//! Cliente HTTP tipado de la API del marketplace
//!
//! Consume el listado a partir de un `FilterState` y envía reservas y pagos.
//! Un envío en curso bloquea el siguiente: un segundo intento se rechaza, no
//! se encola.

pub mod delivery;
pub mod filter_state;

use reqwest::{Client, RequestBuilder, StatusCode};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use serde_json::Value;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::Duration;
use thiserror::Error;

use crate::dto::payment_dto::CreatePaymentRequest;
use crate::dto::reservation_dto::CreateReservationRequest;
use crate::services::pagination::PageMeta;

pub use delivery::{CheckoutBlock, DeliverySession, DistanceLatch, DistanceOutcome, LocationProvider};
pub use filter_state::{FilterState, Filters, PageItem};

#[derive(Debug, Error)]
pub enum ClientError {
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("API error ({status}): {message}")]
    Api { status: StatusCode, message: String },

    #[error("A submission is already in progress")]
    SubmissionInFlight,

    #[error("{0}")]
    Checkout(#[from] CheckoutBlock),
}

/// Página del listado tal como la devuelve `GET /api/posts`
#[derive(Debug, Clone, Deserialize)]
pub struct ListingPage {
    pub success: bool,
    pub data: Vec<Value>,
    #[serde(flatten)]
    pub meta: PageMeta,
}

/// Cuerpo `{ success, message?, data? }`
#[derive(Debug, Clone, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub message: Option<String>,
    pub data: Option<T>,
}

/// Marca de envío en curso; se libera al soltarse
#[derive(Debug)]
pub struct SubmissionGuard {
    flag: Arc<AtomicBool>,
}

impl SubmissionGuard {
    pub fn acquire(flag: &Arc<AtomicBool>) -> Option<Self> {
        flag.compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| Self { flag: Arc::clone(flag) })
    }
}

impl Drop for SubmissionGuard {
    fn drop(&mut self) {
        self.flag.store(false, Ordering::Release);
    }
}

pub struct RentalApiClient {
    client: Client,
    base_url: String,
    token: Option<String>,
    submitting: Arc<AtomicBool>,
}

impl RentalApiClient {
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            token: None,
            submitting: Arc::new(AtomicBool::new(false)),
        })
    }

    pub fn with_token(mut self, token: impl Into<String>) -> Self {
        self.token = Some(token.into());
        self
    }

    pub fn is_submitting(&self) -> bool {
        self.submitting.load(Ordering::Acquire)
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    fn authorized(&self, request: RequestBuilder) -> RequestBuilder {
        match &self.token {
            Some(token) => request.bearer_auth(token),
            None => request,
        }
    }

    pub async fn fetch_listings(&self, state: &FilterState) -> Result<ListingPage, ClientError> {
        let request = self
            .client
            .get(self.url("/api/posts"))
            .query(&state.to_query_pairs());

        read_json(request.send().await?).await
    }

    pub async fn create_reservation(
        &self,
        request: &CreateReservationRequest,
    ) -> Result<Envelope<Value>, ClientError> {
        let _guard = SubmissionGuard::acquire(&self.submitting).ok_or(ClientError::SubmissionInFlight)?;

        let response = self
            .authorized(self.client.post(self.url("/api/reservations")))
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }

    /// Valida la sesión de entrega y envía la reserva resultante
    pub async fn reserve(
        &self,
        session: &DeliverySession,
        agency_id: uuid::Uuid,
        vehicle_id: uuid::Uuid,
    ) -> Result<Envelope<Value>, ClientError> {
        let request = session.reservation_request(agency_id, vehicle_id)?;
        self.create_reservation(&request).await
    }

    pub async fn create_payment(
        &self,
        request: &CreatePaymentRequest,
    ) -> Result<Envelope<Value>, ClientError> {
        let _guard = SubmissionGuard::acquire(&self.submitting).ok_or(ClientError::SubmissionInFlight)?;

        let response = self
            .authorized(self.client.post(self.url("/api/payments")))
            .json(request)
            .send()
            .await?;
        read_json(response).await
    }
}

async fn read_json<T: DeserializeOwned>(response: reqwest::Response) -> Result<T, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response.json().await?);
    }

    let body: Value = response.json().await.unwrap_or(Value::Null);
    let message = body
        .get("message")
        .and_then(Value::as_str)
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP error! status: {}", status));

    tracing::warn!(%status, %message, "❌ Petición rechazada");
    Err(ClientError::Api { status, message })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn guard_refuses_concurrent_submission() {
        let flag = Arc::new(AtomicBool::new(false));

        let first = SubmissionGuard::acquire(&flag);
        assert!(first.is_some());
        assert!(SubmissionGuard::acquire(&flag).is_none());

        drop(first);
        assert!(SubmissionGuard::acquire(&flag).is_some());
    }

    #[tokio::test]
    async fn second_submission_is_refused_while_in_flight() {
        let client = RentalApiClient::new("http://localhost:1").unwrap();
        let _held = SubmissionGuard::acquire(&client.submitting).unwrap();
        assert!(client.is_submitting());

        let mut session =
            DeliverySession::new(None, rust_decimal::Decimal::from(10), rust_decimal::Decimal::ONE);
        let pickup = chrono::Utc::now();
        session.set_dates(Some(pickup), Some(pickup + chrono::Duration::days(1)));
        let request = session.reservation_request(uuid::Uuid::nil(), uuid::Uuid::nil()).unwrap();

        let result = client.create_reservation(&request).await;
        assert!(matches!(result, Err(ClientError::SubmissionInFlight)));
    }

    #[test]
    fn listing_page_reads_flattened_meta() {
        let page: ListingPage = serde_json::from_value(serde_json::json!({
            "success": true,
            "data": [{"id": 1}],
            "total": 13,
            "per_page": 12,
            "current_page": 2,
            "last_page": 2,
            "from": 13,
            "to": 13
        }))
        .unwrap();

        assert_eq!(page.meta.last_page, 2);
        assert_eq!(page.meta.from, Some(13));
        assert_eq!(page.data.len(), 1);
    }
}
