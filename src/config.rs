use std::env;

#[derive(Clone)]
pub struct Config {
    pub database_url: String,
    pub port: u16,
    pub mail_service_url: String,
    pub mail_service_token: String,
    pub frontend_url: String,
    pub jwt_public_key: String, // Identity provider's Ed25519 public key (PEM)
    pub auth_issuer: String,
    pub auth_audience: String,
    pub payment_webhook_secret: String,
    pub zad_window_days: u32,
}

impl Config {
    pub fn from_env() -> Self {
        Self {
            database_url: env::var("DATABASE_URL").expect("DATABASE_URL must be set"),
            port: env::var("PORT").unwrap_or_else(|_| "3000".to_string()).parse().expect("PORT must be a number"),
            mail_service_url: env::var("MAIL_SERVICE_URL").unwrap_or_else(|_| "http://localhost:8000/api/v1/send".to_string()),
            mail_service_token: env::var("MAIL_SERVICE_TOKEN").unwrap_or_else(|_| "test-token-1".to_string()),
            frontend_url: env::var("FRONTEND_URL").unwrap_or_else(|_| "http://localhost:5173".to_string()),
            jwt_public_key: env::var("JWT_PUBLIC_KEY").expect("JWT_PUBLIC_KEY must be set (Ed25519 Public Key)"),
            auth_issuer: env::var("AUTH_ISSUER").unwrap_or_else(|_| "https://auth.chalets.local".to_string()),
            auth_audience: env::var("AUTH_AUDIENCE").unwrap_or_else(|_| "chalet-frontend".to_string()),
            payment_webhook_secret: env::var("PAYMENT_WEBHOOK_SECRET").expect("PAYMENT_WEBHOOK_SECRET must be set"),
            zad_window_days: parse_zad_window(&env::var("ZAD_WINDOW_DAYS").unwrap_or_else(|_| "2".to_string()))
                .expect("ZAD_WINDOW_DAYS must be a whole number of days between 0 and 365"),
        }
    }
}

pub const MAX_ZAD_WINDOW_DAYS: u32 = 365;

fn parse_zad_window(raw: &str) -> Option<u32> {
    raw.trim().parse::<u32>().ok().filter(|days| *days <= MAX_ZAD_WINDOW_DAYS)
}
