use chalet_booking::{
    api::router::create_router,
    background::run_pending_jobs,
    config::Config,
    domain::{models::identity::Claims, ports::EmailService},
    error::AppError,
    infra::factory::bootstrap_state_with_email,
    state::AppState,
};
use async_trait::async_trait;
use axum::{
    body::Body,
    http::{header, Request, StatusCode},
    Router,
};
use chrono::{Duration, NaiveDate, Utc};
use jsonwebtoken::{encode, Algorithm, EncodingKey, Header};
use serde_json::{json, Value};
use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc, Mutex,
};
use tower::ServiceExt;
use uuid::Uuid;

pub const TEST_ISSUER: &str = "https://auth.test.local";
pub const TEST_AUDIENCE: &str = "chalet-frontend";
pub const WEBHOOK_SECRET: &str = "test-webhook-secret";

#[derive(Debug, Clone)]
pub struct SentEmail {
    pub recipient: String,
    pub subject: String,
    pub html_body: String,
}

#[derive(Default)]
pub struct MockEmailService {
    pub sent: Mutex<Vec<SentEmail>>,
    pub failing: AtomicBool,
}

#[async_trait]
impl EmailService for MockEmailService {
    async fn send(&self, recipient: &str, subject: &str, html_body: &str) -> Result<(), AppError> {
        if self.failing.load(Ordering::SeqCst) {
            return Err(AppError::InternalWithMsg("Mail relay unavailable".into()));
        }
        self.sent.lock().unwrap().push(SentEmail {
            recipient: recipient.to_string(),
            subject: subject.to_string(),
            html_body: html_body.to_string(),
        });
        Ok(())
    }
}

#[allow(dead_code)]
pub struct TestApp {
    pub router: Router,
    pub db_filename: String,
    pub state: Arc<AppState>,
    pub email: Arc<MockEmailService>,
}

#[allow(dead_code)]
impl TestApp {
    pub async fn new() -> Self {
        let db_filename = format!("test_{}.db", Uuid::new_v4());
        let db_url = format!("sqlite://{}?mode=rwc", db_filename);

        let config = Config {
            database_url: db_url,
            port: 0,
            mail_service_url: "http://localhost".to_string(),
            mail_service_token: "token".to_string(),
            frontend_url: "http://localhost:5173".to_string(),
            jwt_public_key: include_str!("../tests/keys/test_public.pem").to_string(),
            auth_issuer: TEST_ISSUER.to_string(),
            auth_audience: TEST_AUDIENCE.to_string(),
            payment_webhook_secret: WEBHOOK_SECRET.to_string(),
            zad_window_days: 2,
        };

        let email = Arc::new(MockEmailService::default());
        let state = Arc::new(bootstrap_state_with_email(&config, email.clone()).await);
        let router = create_router(state.clone());

        Self { router, db_filename, state, email }
    }

    /// Signs an access token the way the identity provider would.
    pub fn token(&self, user_id: &str, role: &str) -> String {
        self.token_with_csrf(user_id, role, None)
    }

    pub fn token_with_csrf(&self, user_id: &str, role: &str, csrf: Option<&str>) -> String {
        let now = Utc::now().timestamp() as usize;
        let claims = Claims {
            iss: TEST_ISSUER.to_string(),
            sub: user_id.to_string(),
            aud: TEST_AUDIENCE.to_string(),
            exp: now + 3600,
            iat: now,
            jti: Uuid::new_v4().to_string(),
            role: role.to_string(),
            csrf_token: csrf.map(str::to_string),
        };
        let key = EncodingKey::from_ed_pem(include_bytes!("../tests/keys/test_private.pem")).unwrap();
        encode(&Header::new(Algorithm::EdDSA), &claims, &key).unwrap()
    }

    pub async fn send(&self, request: Request<Body>) -> (StatusCode, Value) {
        let response = self.router.clone().oneshot(request).await.unwrap();
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        let body = if bytes.is_empty() { Value::Null } else { serde_json::from_slice(&bytes).unwrap() };
        (status, body)
    }

    /// JSON request with an optional Bearer token.
    pub async fn call(&self, method: &str, uri: &str, token: Option<&str>, body: Option<Value>) -> (StatusCode, Value) {
        let mut builder = Request::builder().method(method).uri(uri);
        if let Some(token) = token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
        }
        let request = match body {
            Some(body) => builder
                .header(header::CONTENT_TYPE, "application/json")
                .body(Body::from(body.to_string()))
                .unwrap(),
            None => builder.body(Body::empty()).unwrap(),
        };
        self.send(request).await
    }

    pub async fn create_chalet(&self, host_token: &str, price_cents: i64, cleaning_fee_cents: i64) -> String {
        let (status, body) = self.call("POST", "/api/v1/chalets", Some(host_token), Some(json!({
            "name": "Pine Lodge",
            "price_per_night_cents": price_cents,
            "cleaning_fee_cents": cleaning_fee_cents,
            "max_guests": 6
        }))).await;
        assert_eq!(status, StatusCode::CREATED, "chalet creation failed: {}", body);
        body["id"].as_str().unwrap().to_string()
    }

    pub async fn book(
        &self,
        chalet_id: &str,
        token: Option<&str>,
        start: NaiveDate,
        end: NaiveDate,
        extra: Value,
    ) -> (StatusCode, Value) {
        let mut payload = json!({
            "start_date": start,
            "end_date": end,
            "guest_name": "Lina Haddad",
            "guest_email": "lina@example.com",
            "guest_phone": "+966500000000",
            "guest_count": 2
        });
        if let (Some(obj), Some(extra)) = (payload.as_object_mut(), extra.as_object()) {
            for (k, v) in extra {
                obj.insert(k.clone(), v.clone());
            }
        }
        self.call("POST", &format!("/api/v1/chalets/{}/bookings", chalet_id), token, Some(payload)).await
    }

    /// Payment gateway callback carrying `secret` in the shared-secret header.
    pub async fn webhook(&self, secret: &str, booking_id: &str, outcome: &str) -> (StatusCode, Value) {
        let request = Request::builder()
            .method("POST")
            .uri("/api/v1/payments/webhook")
            .header(header::CONTENT_TYPE, "application/json")
            .header("X-Payment-Secret", secret)
            .body(Body::from(json!({"booking_id": booking_id, "outcome": outcome}).to_string()))
            .unwrap();
        self.send(request).await
    }

    /// Online checkout followed by a successful payment. Returns the booking as created.
    pub async fn book_paid(&self, chalet_id: &str, token: Option<&str>, start: NaiveDate, end: NaiveDate) -> Value {
        let (status, booking) = self.book(chalet_id, token, start, end, json!({})).await;
        assert_eq!(status, StatusCode::CREATED, "booking failed: {}", booking);
        let (status, paid) = self.webhook(WEBHOOK_SECRET, booking["id"].as_str().unwrap(), "SUCCEEDED").await;
        assert_eq!(status, StatusCode::OK, "payment failed: {}", paid);
        assert_eq!(paid["status"], "CONFIRMED");
        booking
    }

    pub async fn create_discount(&self, admin_token: &str, payload: Value) -> Value {
        let (status, body) = self.call("POST", "/api/v1/admin/discounts", Some(admin_token), Some(payload)).await;
        assert_eq!(status, StatusCode::CREATED, "discount creation failed: {}", body);
        body
    }

    pub async fn drain_jobs(&self) -> usize {
        run_pending_jobs(&self.state).await.unwrap()
    }

    pub fn sent_emails(&self) -> Vec<SentEmail> {
        self.email.sent.lock().unwrap().clone()
    }
}

impl Drop for TestApp {
    fn drop(&mut self) {
        let _ = std::fs::remove_file(&self.db_filename);
        let _ = std::fs::remove_file(format!("{}-wal", self.db_filename));
        let _ = std::fs::remove_file(format!("{}-shm", self.db_filename));
    }
}

#[allow(dead_code)]
pub fn days_from_today(days: i64) -> NaiveDate {
    Utc::now().date_naive() + Duration::days(days)
}

#[allow(dead_code)]
pub fn date(y: i32, m: u32, d: u32) -> NaiveDate {
    NaiveDate::from_ymd_opt(y, m, d).unwrap()
}
