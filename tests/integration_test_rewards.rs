mod common;

use axum::http::StatusCode;
use common::{days_from_today, TestApp};
use serde_json::{json, Value};

/// Books and pays a stay for `traveler` and returns (booking_id, group_id).
async fn stay(app: &TestApp, chalet: &str, traveler: &str, from: i64, to: i64) -> (String, String) {
    let body = app.book_paid(chalet, Some(traveler), days_from_today(from), days_from_today(to)).await;
    (
        body["id"].as_str().unwrap().to_string(),
        body["group_id"].as_str().unwrap().to_string(),
    )
}

async fn review(app: &TestApp, chalet: &str, token: &str, rating: i32, group_id: Option<&str>) -> (StatusCode, Value) {
    app.call(
        "POST",
        &format!("/api/v1/chalets/{}/reviews", chalet),
        Some(token),
        Some(json!({"rating": rating, "comment": "Lovely fireplace", "group_id": group_id})),
    ).await
}

async fn group_card(app: &TestApp, token: &str, group_id: &str) -> Value {
    let (status, body) = app.call("GET", &format!("/api/v1/groups/{}/reward-card", group_id), Some(token), None).await;
    assert_eq!(status, StatusCode::OK, "{}", body);
    body
}

#[tokio::test]
async fn test_guest_checkout_gets_no_group() {
    let app = TestApp::new().await;
    let host = app.token("host-1", "HOST");
    let chalet = app.create_chalet(&host, 10_000, 0).await;

    let (status, body) = app.book(&chalet, None, days_from_today(3), days_from_today(5), json!({})).await;
    assert_eq!(status, StatusCode::CREATED);
    assert!(body["group_id"].is_null());
    assert!(body["traveler_id"].is_null());
}

#[tokio::test]
async fn test_phase_follows_the_stay() {
    let app = TestApp::new().await;
    let host = app.token("host-1", "HOST");
    let admin = app.token("admin-1", "ADMIN");
    let chalet = app.create_chalet(&host, 10_000, 0).await;
    app.create_discount(&admin, json!({"code": "ZAD5", "discount_type": "ZAD", "kind": "PERCENTAGE", "value": 5})).await;
    app.create_discount(&admin, json!({"code": "KAIF15", "discount_type": "KAIF", "kind": "PERCENTAGE", "value": 15})).await;

    let waiting = app.token("t-waiting", "TRAVELER");
    let (_, g_waiting) = stay(&app, &chalet, &waiting, 20, 23).await;
    let card = group_card(&app, &waiting, &g_waiting).await;
    assert_eq!(card["phase"], "WAITING");
    assert!(card["zad_offers"].as_array().unwrap().is_empty());

    let zad = app.token("t-zad", "TRAVELER");
    let (_, g_zad) = stay(&app, &chalet, &zad, 1, 4).await;
    let card = group_card(&app, &zad, &g_zad).await;
    assert_eq!(card["phase"], "ZAD");
    assert_eq!(card["zad_unlocked"], true);
    assert_eq!(card["zad_offers"][0]["code"], "ZAD5");

    let chilling = app.token("t-chilling", "TRAVELER");
    let (_, g_chilling) = stay(&app, &chalet, &chilling, -1, 1).await;
    let card = group_card(&app, &chilling, &g_chilling).await;
    assert_eq!(card["phase"], "CHILLING");
    assert_eq!(card["kaif_unlocked"], false);
    assert!(card["kaif_offers"].as_array().unwrap().is_empty());

    let passed = app.token("t-passed", "TRAVELER");
    let (_, g_passed) = stay(&app, &chalet, &passed, -6, -3).await;
    let card = group_card(&app, &passed, &g_passed).await;
    assert_eq!(card["phase"], "PASSED");
    assert_eq!(card["rate_prompt"], true);
    assert_eq!(card["zad_unlocked"], true);
    assert_eq!(card["kaif_unlocked"], false);
}

#[tokio::test]
async fn test_review_unlocks_kaif_for_exactly_that_membership() {
    let app = TestApp::new().await;
    let host = app.token("host-1", "HOST");
    let admin = app.token("admin-1", "ADMIN");
    let chalet = app.create_chalet(&host, 10_000, 0).await;
    app.create_discount(&admin, json!({"code": "KAIF15", "discount_type": "KAIF", "kind": "PERCENTAGE", "value": 15})).await;

    let alice = app.token("alice", "TRAVELER");
    let bob = app.token("bob", "TRAVELER");
    let (_, g_alice) = stay(&app, &chalet, &alice, -10, -8).await;
    let (_, g_bob) = stay(&app, &chalet, &bob, -6, -4).await;

    let (status, body) = review(&app, &chalet, &alice, 5, Some(&g_alice)).await;
    assert_eq!(status, StatusCode::CREATED, "{}", body);
    assert_eq!(body["review"]["group_id"], g_alice.as_str());

    let card = group_card(&app, &alice, &g_alice).await;
    assert_eq!(card["has_rated"], true);
    assert_eq!(card["can_use_kaif"], true);
    assert_eq!(card["kaif_unlocked"], true);
    assert_eq!(card["rate_prompt"], false);
    assert_eq!(card["kaif_offers"][0]["code"], "KAIF15");

    let card = group_card(&app, &bob, &g_bob).await;
    assert_eq!(card["has_rated"], false);
    assert_eq!(card["can_use_kaif"], false);

    // One review per stay.
    let (status, body) = review(&app, &chalet, &alice, 4, Some(&g_alice)).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["code"], "CONFLICT");
}

#[tokio::test]
async fn test_chalet_rating_is_recomputed() {
    let app = TestApp::new().await;
    let host = app.token("host-1", "HOST");
    let chalet = app.create_chalet(&host, 10_000, 0).await;

    let travelers = [("r1", 5, -30), ("r2", 4, -20), ("r3", 5, -10)];
    let mut last = Value::Null;
    for (user, rating, from) in travelers {
        let token = app.token(user, "TRAVELER");
        let (_, group) = stay(&app, &chalet, &token, from, from + 2).await;
        let (status, body) = review(&app, &chalet, &token, rating, Some(&group)).await;
        assert_eq!(status, StatusCode::CREATED, "{}", body);
        last = body;
    }

    assert_eq!(last["chalet_rating"]["rating"], 4.67);
    assert_eq!(last["chalet_rating"]["review_count"], 3);

    let (_, chalet_body) = app.call("GET", &format!("/api/v1/chalets/{}", chalet), None, None).await;
    assert_eq!(chalet_body["rating"], 4.67);
    assert_eq!(chalet_body["review_count"], 3);

    let (_, reviews) = app.call("GET", &format!("/api/v1/chalets/{}/reviews", chalet), None, None).await;
    assert_eq!(reviews.as_array().unwrap().len(), 3);
}

#[tokio::test]
async fn test_review_validation() {
    let app = TestApp::new().await;
    let host = app.token("host-1", "HOST");
    let chalet = app.create_chalet(&host, 10_000, 0).await;
    let other_chalet = app.create_chalet(&host, 10_000, 0).await;

    let traveler = app.token("traveler-1", "TRAVELER");
    let (_, past_group) = stay(&app, &chalet, &traveler, -5, -2).await;
    let (_, future_group) = stay(&app, &chalet, &traveler, 10, 12).await;

    let (status, _) = review(&app, &chalet, &traveler, 6, Some(&past_group)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    let (status, _) = review(&app, &chalet, &traveler, 0, Some(&past_group)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = app.call(
        "POST",
        &format!("/api/v1/chalets/{}/reviews", chalet),
        Some(&traveler),
        Some(json!({"rating": 4, "comment": "x".repeat(2001), "group_id": past_group})),
    ).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Stay has not ended yet.
    let (status, _) = review(&app, &chalet, &traveler, 4, Some(&future_group)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Group belongs to another chalet.
    let (status, _) = review(&app, &other_chalet, &traveler, 4, Some(&past_group)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let outsider = app.token("traveler-2", "TRAVELER");
    let (status, _) = review(&app, &chalet, &outsider, 4, Some(&past_group)).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = review(&app, &chalet, &traveler, 4, Some("no-such-group")).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = review(&app, "no-such-chalet", &traveler, 4, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_ungrouped_review_is_limited_to_one() {
    let app = TestApp::new().await;
    let host = app.token("host-1", "HOST");
    let chalet = app.create_chalet(&host, 10_000, 0).await;
    let traveler = app.token("traveler-1", "TRAVELER");

    let (status, _) = review(&app, &chalet, &traveler, 3, None).await;
    assert_eq!(status, StatusCode::CREATED);
    let (status, _) = review(&app, &chalet, &traveler, 5, None).await;
    assert_eq!(status, StatusCode::CONFLICT);
}

#[tokio::test]
async fn test_unrated_past_stay_locks_upcoming_card() {
    let app = TestApp::new().await;
    let host = app.token("host-1", "HOST");
    let chalet = app.create_chalet(&host, 10_000, 0).await;
    let traveler = app.token("traveler-1", "TRAVELER");

    let (_, past_group) = stay(&app, &chalet, &traveler, -9, -7).await;
    let (_, next_group) = stay(&app, &chalet, &traveler, 1, 3).await;

    let (status, card) = app.call("GET", "/api/v1/rewards/card", Some(&traveler), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(card["group_id"], next_group.as_str());
    assert_eq!(card["phase"], "LOCKED");
    assert_eq!(card["zad_unlocked"], false);

    let (status, _) = review(&app, &chalet, &traveler, 5, Some(&past_group)).await;
    assert_eq!(status, StatusCode::CREATED);

    let (_, card) = app.call("GET", "/api/v1/rewards/card", Some(&traveler), None).await;
    assert_eq!(card["phase"], "ZAD");
}

#[tokio::test]
async fn test_group_card_access() {
    let app = TestApp::new().await;
    let host = app.token("host-1", "HOST");
    let chalet = app.create_chalet(&host, 10_000, 0).await;
    let owner = app.token("traveler-1", "TRAVELER");
    let (_, group) = stay(&app, &chalet, &owner, 5, 7).await;

    let stranger = app.token("traveler-2", "TRAVELER");
    let (status, _) = app.call("GET", &format!("/api/v1/groups/{}/reward-card", group), Some(&stranger), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, _) = app.call("GET", "/api/v1/groups/missing/reward-card", Some(&owner), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);

    let (status, _) = app.call("GET", "/api/v1/rewards/card", Some(&stranger), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}
