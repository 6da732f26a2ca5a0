mod common;

use axum::http::StatusCode;
use chalet_booking::{
    domain::{
        models::booking::{Booking, BookingFlow, NewBookingParams, Quote},
        ports::BookingExtras,
    },
    error::{AppError, CouponRejection},
};
use chrono::{Duration, Utc};
use common::{days_from_today, TestApp};
use serde_json::{json, Value};
use std::sync::Arc;
use tokio::task::JoinSet;

async fn validate(app: &TestApp, code: &str, subtotal_cents: i64) -> Value {
    let (status, body) = app.call(
        "POST",
        "/api/v1/coupons/validate",
        None,
        Some(json!({"code": code, "subtotal_cents": subtotal_cents})),
    ).await;
    assert_eq!(status, StatusCode::OK);
    body
}

fn summer10() -> Value {
    json!({
        "code": "summer10",
        "kind": "PERCENTAGE",
        "value": 10,
        "max_uses": 5,
        "min_booking_amount_cents": 5_000
    })
}

#[tokio::test]
async fn test_summer10_properties() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", "ADMIN");
    let created = app.create_discount(&admin, summer10()).await;
    assert_eq!(created["code"], "SUMMER10");
    assert_eq!(created["usage_count"], 0);

    let ok = validate(&app, "Summer10", 10_000).await;
    assert_eq!(ok["valid"], true);
    assert_eq!(ok["discount_amount_cents"], 1_000);

    let below_min = validate(&app, "SUMMER10", 4_000).await;
    assert_eq!(below_min["valid"], false);
    assert_eq!(below_min["reason"], "COUPON_MIN_SPEND_NOT_MET");
    assert!(below_min["message"].as_str().unwrap().contains("Minimum"));

    let unknown = validate(&app, "WINTER99", 10_000).await;
    assert_eq!(unknown["valid"], false);
    assert_eq!(unknown["message"], "Invalid or expired coupon code");

    let empty = validate(&app, "   ", 10_000).await;
    assert_eq!(empty["valid"], false);
    assert_eq!(empty["message"], "Coupon code is required");
}

#[tokio::test]
async fn test_discount_is_clipped_to_subtotal() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", "ADMIN");
    app.create_discount(&admin, json!({"code": "BIGFIXED", "kind": "FIXED", "value": 90_000})).await;

    let check = validate(&app, "BIGFIXED", 500).await;
    assert_eq!(check["valid"], true);
    assert_eq!(check["discount_amount_cents"], 500);

    // Percentages above 100 are refused at creation time.
    let (status, _) = app.call(
        "POST",
        "/api/v1/admin/discounts",
        Some(&admin),
        Some(json!({"code": "DOUBLE", "kind": "PERCENTAGE", "value": 200})),
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_expired_and_inactive_coupons() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", "ADMIN");
    app.create_discount(&admin, json!({
        "code": "OLD",
        "kind": "PERCENTAGE",
        "value": 10,
        "valid_until": Utc::now() - Duration::days(1)
    })).await;
    let expired = validate(&app, "OLD", 10_000).await;
    assert_eq!(expired["reason"], "COUPON_EXPIRED");
    assert_eq!(expired["message"], "Coupon has expired");

    let paused = app.create_discount(&admin, json!({"code": "PAUSED", "kind": "FIXED", "value": 1_000})).await;
    let uri = format!("/api/v1/admin/discounts/{}/active", paused["id"].as_str().unwrap());
    let (status, body) = app.call("PUT", &uri, Some(&admin), Some(json!({"is_active": false}))).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["is_active"], false);
    let (status, _) = app.call("PUT", &uri, Some(&admin), Some(json!({"is_active": false}))).await;
    assert_eq!(status, StatusCode::OK);

    assert_eq!(validate(&app, "PAUSED", 10_000).await["valid"], false);
}

#[tokio::test]
async fn test_booking_redeems_coupon_once() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", "ADMIN");
    let host = app.token("host-1", "HOST");
    let chalet = app.create_chalet(&host, 5_000, 1_500).await;
    app.create_discount(&admin, json!({"code": "ONCE", "kind": "PERCENTAGE", "value": 10, "max_uses": 1})).await;

    let (status, body) = app.book(&chalet, None, days_from_today(5), days_from_today(7), json!({"coupon_code": "once"})).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["coupon_code"], "ONCE");
    assert_eq!(body["subtotal_cents"], 10_000);
    assert_eq!(body["discount_cents"], 1_000);
    assert_eq!(body["total_price_cents"], 10_500);

    let limited = validate(&app, "ONCE", 10_000).await;
    assert_eq!(limited["valid"], false);
    assert!(limited["message"].as_str().unwrap().contains("limit"));

    let (status, body) = app.book(&chalet, None, days_from_today(10), days_from_today(12), json!({"coupon_code": "ONCE"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "COUPON_LIMIT_REACHED");
}

#[tokio::test]
async fn test_invalid_coupon_aborts_booking_without_writes() {
    let app = TestApp::new().await;
    let host = app.token("host-1", "HOST");
    let traveler = app.token("traveler-1", "TRAVELER");
    let chalet = app.create_chalet(&host, 5_000, 0).await;

    let (status, body) = app.book(&chalet, Some(&traveler), days_from_today(5), days_from_today(7), json!({"coupon_code": "NOPE"})).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["code"], "COUPON_INVALID");

    let (_, body) = app.call("GET", &format!("/api/v1/chalets/{}/availability", chalet), None, None).await;
    assert!(body["booked"].as_array().unwrap().is_empty());

    let (status, _) = app.call("GET", "/api/v1/rewards/card", Some(&traveler), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_concurrent_redemptions_never_exceed_max_uses() {
    let app = Arc::new(TestApp::new().await);
    let admin = app.token("admin-1", "ADMIN");
    let host = app.token("host-1", "HOST");
    let chalet = app.create_chalet(&host, 5_000, 0).await;
    app.create_discount(&admin, json!({"code": "RUSH", "kind": "FIXED", "value": 1_000, "max_uses": 2})).await;

    let mut set = JoinSet::new();
    for i in 0..6i64 {
        let app = app.clone();
        let chalet = chalet.clone();
        set.spawn(async move {
            let start = days_from_today(10 + i * 3);
            app.book(&chalet, None, start, start + Duration::days(2), json!({"coupon_code": "RUSH"})).await
        });
    }

    let mut redeemed = 0;
    while let Some(res) = set.join_next().await {
        let (status, body) = res.unwrap();
        match status {
            StatusCode::CREATED => redeemed += 1,
            StatusCode::UNPROCESSABLE_ENTITY => assert_eq!(body["code"], "COUPON_LIMIT_REACHED"),
            other => panic!("unexpected status {}: {}", other, body),
        }
    }
    assert_eq!(redeemed, 2);

    let (_, list) = app.call("GET", "/api/v1/admin/discounts", Some(&admin), None).await;
    let rush = list.as_array().unwrap().iter().find(|d| d["code"] == "RUSH").unwrap();
    assert_eq!(rush["usage_count"], 2);
}

#[tokio::test]
async fn test_discount_admin_requires_admin_role() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", "ADMIN");
    let host = app.token("host-1", "HOST");

    let (status, _) = app.call("GET", "/api/v1/admin/discounts", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    let (status, body) = app.call("GET", "/api/v1/admin/discounts", Some(&host), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["code"], "FORBIDDEN");

    let created = app.create_discount(&admin, json!({"code": "dup", "kind": "FIXED", "value": 500})).await;
    let (status, body) = app.call(
        "POST",
        "/api/v1/admin/discounts",
        Some(&admin),
        Some(json!({"code": " DUP ", "kind": "FIXED", "value": 700})),
    ).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");

    let uri = format!("/api/v1/admin/discounts/{}", created["id"].as_str().unwrap());
    let (status, body) = app.call("GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["code"], "DUP");
    assert_eq!(body["kind"], "FIXED");

    let (status, _) = app.call("DELETE", &uri, Some(&host), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    let (status, _) = app.call("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);
    let (status, _) = app.call("DELETE", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = app.call("GET", &uri, Some(&admin), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    let (_, list) = app.call("GET", "/api/v1/admin/discounts", Some(&admin), None).await;
    assert!(list.as_array().unwrap().is_empty());
}

#[tokio::test]
async fn test_coupon_that_lapses_before_commit_is_not_redeemed() {
    let app = TestApp::new().await;
    let admin = app.token("admin-1", "ADMIN");
    let host = app.token("host-1", "HOST");
    let chalet = app.create_chalet(&host, 5_000, 0).await;
    let lapsed = app.create_discount(&admin, json!({
        "code": "LAPSED",
        "kind": "FIXED",
        "value": 1_000,
        "valid_until": Utc::now() - Duration::minutes(1)
    })).await;
    let discount_id = lapsed["id"].as_str().unwrap().to_string();

    // The quote was validated while the coupon was still live.
    let booking = Booking::new(NewBookingParams {
        chalet_id: chalet.clone(),
        traveler_id: None,
        guest_name: "Lina Haddad".into(),
        guest_email: "lina@example.com".into(),
        guest_phone: "+966500000000".into(),
        start_date: days_from_today(5),
        end_date: days_from_today(7),
        guest_count: 2,
        quote: Quote::new(2, 5_000, 0).with_discount(1_000),
        coupon_code: Some("LAPSED".into()),
        notes: None,
        flow: BookingFlow::Online,
    });
    let extras = BookingExtras { redeem_discount_id: Some(discount_id.clone()), group: None };

    let err = app.state.booking_repo.create_atomic(&booking, &extras).await.unwrap_err();
    assert!(matches!(err, AppError::Coupon { reason: CouponRejection::CouponLimitReached, .. }));

    let (_, body) = app.call("GET", &format!("/api/v1/chalets/{}/availability", chalet), None, None).await;
    assert!(body["booked"].as_array().unwrap().is_empty());
    let (_, discount) = app.call("GET", &format!("/api/v1/admin/discounts/{}", discount_id), Some(&admin), None).await;
    assert_eq!(discount["usage_count"], 0);
}
