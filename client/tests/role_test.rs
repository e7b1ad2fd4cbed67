mod common;

use assert_matches::assert_matches;
use jsonwebtoken::{encode, EncodingKey, Header};

use assetdesk_client::{
    auth::{extract_bearer_token, is_admin, require_admin, Claims, Role},
    coordinator::{NoticeLevel, SubmissionState},
    draft::DraftField,
    error::{AppError, ReferenceKind},
    models::request::RequestStatus,
};
use common::MockState;

#[test]
fn admin_gate_is_an_exact_match() {
    assert!(!is_admin(&common::claims_with_role("Employee")));
    assert!(is_admin(&common::claims_with_role("Admin")));
    assert!(!is_admin(&common::claims_with_role("admin")));
    assert!(!is_admin(&common::claims_with_role("")));

    let err = require_admin(&common::claims_with_role("admin"), "review").unwrap_err();
    assert_matches!(err, AppError::AuthorizationDisplay(_));
}

#[test]
fn unknown_roles_are_employees() {
    assert_eq!(Role::from_claim("Admin"), Role::Admin);
    assert_eq!(Role::from_claim("Auditor"), Role::Employee);
    assert_eq!(Role::from_claim("ADMIN"), Role::Employee);
    assert!(!Role::Employee.can_review_requests());
    assert!(Role::Admin.is_admin());
}

#[test]
fn require_admin_reports_the_hidden_action() {
    let err = require_admin(&common::claims_with_role("Employee"), "bulk update").unwrap_err();
    assert_matches!(err, AppError::AuthorizationDisplay(action) if action == "bulk update");
    assert!(require_admin(&common::claims_with_role("Admin"), "bulk update").is_ok());
}

#[test]
fn signed_token_decodes_with_matching_secret_only() {
    let token = common::token("Admin", "u1");

    let claims = Claims::decode(&token, Some(common::JWT_SECRET)).unwrap();
    assert_eq!(claims.role, "Admin");
    assert_eq!(claims.user_id(), Some("u1"));

    let wrong = "another-secret-that-is-also-32-chars-long";
    assert_matches!(Claims::decode(&token, Some(wrong)), Err(AppError::Unauthorized));
}

#[test]
fn token_without_secret_is_read_unverified() {
    let token = common::token("Employee", "u7");
    let claims = Claims::decode(&format!("Bearer {}", token), None).unwrap();
    assert_eq!(claims.role(), Role::Employee);
    assert_eq!(claims.sub, "u7");
}

#[test]
fn expired_or_malformed_tokens_are_rejected() {
    let now = time::OffsetDateTime::now_utc();
    let expired = Claims {
        sub: "u1".into(),
        role: "Admin".into(),
        name: None,
        exp: Some((now - time::Duration::hours(1)).unix_timestamp()),
        iat: Some((now - time::Duration::hours(2)).unix_timestamp()),
    };
    let token = encode(
        &Header::default(),
        &expired,
        &EncodingKey::from_secret(common::JWT_SECRET.as_bytes()),
    )
    .unwrap();

    assert_matches!(Claims::decode(&token, None), Err(AppError::Unauthorized));
    assert_matches!(Claims::decode("not-a-token", None), Err(AppError::Unauthorized));
    assert_matches!(Claims::decode("Bearer ", None), Err(AppError::Unauthorized));
}

#[test]
fn dotnet_role_claim_and_numeric_subject_are_understood() {
    let payload = serde_json::json!({
        "sub": 42,
        "http://schemas.microsoft.com/ws/2008/06/identity/claims/role": "Admin",
        "unique_name": "alice",
    });
    let token = encode(
        &Header::default(),
        &payload,
        &EncodingKey::from_secret(common::JWT_SECRET.as_bytes()),
    )
    .unwrap();

    let claims = Claims::decode(&token, Some(common::JWT_SECRET)).unwrap();
    assert!(is_admin(&claims));
    assert_eq!(claims.user_id(), Some("42"));
    assert_eq!(claims.name.as_deref(), Some("alice"));
}

#[test]
fn bearer_prefix_is_optional() {
    assert_eq!(extract_bearer_token("Bearer abc.def.ghi"), Some("abc.def.ghi"));
    assert_eq!(extract_bearer_token("  abc.def.ghi "), Some("abc.def.ghi"));
    assert_eq!(extract_bearer_token("   "), None);
}

#[tokio::test]
async fn employee_cannot_review_and_nothing_is_sent() {
    let (addr, backend) = common::setup_mock_backend(MockState::seeded()).await;
    let mut coordinator = common::coordinator(addr, "Employee").await;
    assert!(!coordinator.is_admin());

    let err = coordinator.review(1, RequestStatus::Approved).await.unwrap_err();
    assert_matches!(err, AppError::AuthorizationDisplay(_));

    let err = coordinator
        .bulk_review(&[1, 2], RequestStatus::Rejected)
        .await
        .unwrap_err();
    assert_matches!(err, AppError::AuthorizationDisplay(_));

    let calls = common::calls(&backend);
    assert_eq!(calls.update, 0);
    assert_eq!(calls.list, 1);
}

#[tokio::test]
async fn admin_review_updates_status_and_keeps_the_open_draft() {
    let (addr, backend) = common::setup_mock_backend(MockState::seeded()).await;
    let mut coordinator = common::coordinator(addr, "Admin").await;

    coordinator.start_new_draft();
    coordinator.set_field(DraftField::Reason, "half-written").unwrap();

    let outcome = coordinator.review(1, RequestStatus::Approved).await.unwrap();
    assert!(outcome.list_synced);

    let payload = backend.lock().unwrap().last_payload.clone().unwrap();
    assert_eq!(payload["requestStatus"], 1);

    let row = coordinator
        .enriched()
        .into_iter()
        .find(|r| r.request_id == Some(1))
        .unwrap();
    assert_eq!(row.status, RequestStatus::Approved);

    assert!(coordinator.draft().is_new());
    assert_eq!(coordinator.draft().reason(), "half-written");
}

#[tokio::test]
async fn bulk_review_applies_one_status_and_reloads_once() {
    let (addr, backend) = common::setup_mock_backend(MockState::seeded()).await;
    let mut coordinator = common::coordinator(addr, "Admin").await;

    let outcome = coordinator
        .bulk_review(&[1, 2, 99], RequestStatus::Rejected)
        .await
        .unwrap();

    assert_eq!(outcome.updated, vec![1, 2]);
    assert_eq!(outcome.failed.len(), 1);
    assert_eq!(outcome.failed[0].0, 99);
    assert!(outcome.list_synced);

    let calls = common::calls(&backend);
    assert_eq!(calls.update, 2);
    assert_eq!(calls.list, 2, "initial load plus one reload");

    assert!(coordinator
        .requests()
        .iter()
        .all(|r| r.status == RequestStatus::Rejected));

    // One notice per attempted id, including the one that failed.
    let notices = coordinator.notices();
    assert_eq!(notices.len(), 3);
    assert_eq!(notices[0].level, NoticeLevel::Error);
    assert_eq!(
        notices.iter().filter(|n| n.level == NoticeLevel::Success).count(),
        2
    );
}

#[tokio::test]
async fn reviewing_a_missing_request_names_the_request() {
    let (addr, _backend) = common::setup_mock_backend(MockState::seeded()).await;
    let mut coordinator = common::coordinator(addr, "Admin").await;

    let err = coordinator.review(404, RequestStatus::Approved).await.unwrap_err();
    assert_matches!(err, AppError::ReferenceNotFound { kind: ReferenceKind::Request });

    assert_eq!(coordinator.state(), SubmissionState::Failed);
    assert_eq!(coordinator.notices().len(), 1);
    assert_eq!(coordinator.notices()[0].level, NoticeLevel::Error);
    assert!(coordinator.notices()[0].message.contains("Request not found!"));
}
