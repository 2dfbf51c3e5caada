/// HTTP integration tests
///
/// Drive the full router (auth gate, extractors, error mapping) over the
/// in-memory store.

mod common;

use axum::http::{Method, StatusCode};
use chrono::{DateTime, Duration, Utc};
use common::{body_id, insert_student, token_for, TestContext};
use drivingschool_shared::auth::jwt::{create_token, Claims};
use drivingschool_shared::store::Store;
use serde_json::json;
use uuid::Uuid;

fn parse_time(value: &serde_json::Value) -> DateTime<Utc> {
    value.as_str().unwrap().parse().unwrap()
}

#[tokio::test]
async fn test_health_is_public() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send_anonymous(Method::GET, "/health", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["status"], "healthy");
    assert_eq!(body["database"], "connected");
}

#[tokio::test]
async fn test_security_headers_on_every_response() {
    let ctx = TestContext::new().await;

    let response = ctx.raw(Method::GET, "/health", None, None).await;

    assert_eq!(response.headers().get("x-content-type-options").unwrap(), "nosniff");
    assert_eq!(response.headers().get("x-frame-options").unwrap(), "DENY");
    assert!(response.headers().get("strict-transport-security").is_none());
}

#[tokio::test]
async fn test_register_and_login() {
    let ctx = TestContext::new().await;
    let registration = json!({
        "name": "Pedro Costa",
        "email": "Pedro@Example.com",
        "password": "correct horse",
    });

    let (status, body) = ctx
        .send_anonymous(Method::POST, "/students/register", Some(registration.clone()))
        .await;
    assert_eq!(status, StatusCode::CREATED, "{body}");
    assert_eq!(body["token_type"], "Bearer");
    assert_eq!(body["expires_in"], 24 * 3600);
    assert_eq!(body["student"]["email"], "pedro@example.com");
    assert_eq!(body["student"]["approved"], false);
    assert!(body["student"].get("password_hash").is_none());

    // The issued token opens protected routes
    let token = body["access_token"].as_str().unwrap().to_string();
    let response = ctx
        .raw(Method::GET, "/students/me", Some(&format!("Bearer {}", token)), None)
        .await;
    assert_eq!(response.status(), StatusCode::OK);

    let (status, _) = ctx
        .send_anonymous(Method::POST, "/students/register", Some(registration))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);

    let (status, body) = ctx
        .send_anonymous(
            Method::POST,
            "/students/login",
            Some(json!({ "email": "pedro@example.com", "password": "correct horse" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["access_token"].as_str().is_some());

    let (status, body) = ctx
        .send_anonymous(
            Method::POST,
            "/students/login",
            Some(json!({ "email": "pedro@example.com", "password": "wrong password" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");
}

#[tokio::test]
async fn test_register_validation_lists_fields() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send_anonymous(
            Method::POST,
            "/students/register",
            Some(json!({ "name": "", "email": "not-an-email", "password": "short" })),
        )
        .await;

    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["error"], "validation_error");
    let fields: Vec<&str> = body["details"]
        .as_array()
        .unwrap()
        .iter()
        .map(|d| d["field"].as_str().unwrap())
        .collect();
    assert_eq!(fields, vec!["email", "name", "password"]);
}

#[tokio::test]
async fn test_malformed_json_is_bad_request() {
    let ctx = TestContext::new().await;
    let tutor_id = ctx.create_tutor("Carlos").await;

    // scheduledAt is not a timestamp
    let (status, body) = ctx.schedule(tutor_id, "tomorrow", "theoretical").await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_protected_routes_require_valid_token() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send_anonymous(Method::GET, "/tutors", None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["error"], "unauthorized");

    let response = ctx.raw(Method::GET, "/tutors", Some("Bearer not.a.jwt"), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let response = ctx.raw(Method::GET, "/tutors", Some(&ctx.token), None).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let wrong_key = create_token(
        &Claims::new(ctx.student.id, Duration::hours(1)),
        "some-other-secret-that-is-32-bytes-long",
    )
    .unwrap();
    let response = ctx
        .raw(Method::GET, "/tutors", Some(&format!("Bearer {}", wrong_key)), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let (status, _) = ctx.send(Method::GET, "/tutors", None).await;
    assert_eq!(status, StatusCode::OK);
}

#[tokio::test]
async fn test_expired_token_is_rejected() {
    let ctx = TestContext::new().await;
    let expired = create_token(
        &Claims::new(ctx.student.id, Duration::hours(-2)),
        common::TEST_SECRET,
    )
    .unwrap();

    let (status, body) = {
        let response = ctx
            .raw(Method::GET, "/students/me", Some(&format!("Bearer {}", expired)), None)
            .await;
        let status = response.status();
        let bytes = axum::body::to_bytes(response.into_body(), usize::MAX).await.unwrap();
        (status, serde_json::from_slice::<serde_json::Value>(&bytes).unwrap())
    };

    assert_eq!(status, StatusCode::UNAUTHORIZED);
    assert_eq!(body["message"], "Token expired");
}

#[tokio::test]
async fn test_token_for_deleted_student_is_rejected() {
    let ctx = TestContext::new().await;
    let other = insert_student(&ctx.school, "Short Lived").await;
    let other_token = token_for(other.id);

    let (status, _) = ctx
        .send(Method::DELETE, &format!("/students/{}", other.id), None)
        .await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let response = ctx
        .raw(Method::GET, "/students/me", Some(&format!("Bearer {}", other_token)), None)
        .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_me_returns_authenticated_student() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send(Method::GET, "/students/me", None).await;

    assert_eq!(status, StatusCode::OK);
    assert_eq!(body_id(&body), ctx.student.id);
    assert!(body.get("password_hash").is_none());
}

#[tokio::test]
async fn test_slot_conflict_returns_suggestions() {
    let ctx = TestContext::new().await;
    let tutor_id = ctx.create_tutor("Carlos").await;

    let (status, lesson) = ctx
        .schedule(tutor_id, "2030-05-10T10:00:00Z", "theoretical")
        .await;
    assert_eq!(status, StatusCode::CREATED, "{lesson}");
    assert_eq!(lesson["status"], "scheduled");
    assert_eq!(lesson["kind"], "theoretical");

    // 11:00 is also taken, so suggestions skip it
    let (status, _) = ctx
        .schedule(tutor_id, "2030-05-10T11:00:00Z", "theoretical")
        .await;
    assert_eq!(status, StatusCode::CREATED);

    let other = insert_student(&ctx.school, "Second Student").await;
    let (status, body) = ctx
        .send(
            Method::POST,
            &format!("/students/{}/schedule-lesson", other.id),
            Some(json!({ "tutor_id": tutor_id, "scheduled_at": "2030-05-10T10:00:00Z" })),
        )
        .await;

    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "slot_conflict");
    let suggestions: Vec<DateTime<Utc>> = body["suggestions"]
        .as_array()
        .unwrap()
        .iter()
        .map(parse_time)
        .collect();
    let requested: DateTime<Utc> = "2030-05-10T10:00:00Z".parse().unwrap();
    assert_eq!(
        suggestions,
        vec![
            requested + Duration::hours(2),
            requested + Duration::hours(3),
            requested + Duration::hours(4),
        ]
    );
}

#[tokio::test]
async fn test_other_tutor_is_not_a_conflict() {
    let ctx = TestContext::new().await;
    let carlos = ctx.create_tutor("Carlos").await;
    let beatriz = ctx.create_tutor("Beatriz").await;

    let (status, _) = ctx.schedule(carlos, "2030-05-10T10:00:00Z", "theoretical").await;
    assert_eq!(status, StatusCode::CREATED);

    let (status, _) = ctx.schedule(beatriz, "2030-05-10T10:00:00Z", "theoretical").await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_practical_lesson_requires_approval() {
    let ctx = TestContext::new().await;
    let tutor_id = ctx.create_tutor("Carlos").await;

    let (status, body) = ctx
        .schedule(tutor_id, "2030-05-10T10:00:00Z", "practical")
        .await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let (_, lessons) = ctx
        .send(Method::GET, &format!("/students/{}/lessons", ctx.student.id), None)
        .await;
    assert!(lessons.as_array().unwrap().is_empty());

    ctx.store().set_student_approved(ctx.student.id).await.unwrap();

    let (status, _) = ctx
        .schedule(tutor_id, "2030-05-10T10:00:00Z", "practical")
        .await;
    assert_eq!(status, StatusCode::CREATED);
}

#[tokio::test]
async fn test_twentieth_completion_approves_and_unlocks_certificate() {
    let ctx = TestContext::new().await;
    let tutor_id = ctx.create_tutor("Carlos").await;
    let certificate_uri = format!("/students/{}/request-certificate", ctx.student.id);

    let (status, body) = ctx.send(Method::POST, &certificate_uri, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
    assert_eq!(body["error"], "forbidden");

    let start: DateTime<Utc> = "2030-06-01T08:00:00Z".parse().unwrap();
    for n in 0..20 {
        let at = (start + Duration::hours(n)).to_rfc3339();
        let (status, lesson) = ctx.schedule(tutor_id, &at, "theoretical").await;
        assert_eq!(status, StatusCode::CREATED);

        let (status, outcome) = ctx
            .send(
                Method::POST,
                &format!("/tutors/lessons/{}/validate", body_id(&lesson)),
                Some(json!({ "status": "Completed" })),
            )
            .await;
        assert_eq!(status, StatusCode::OK, "{outcome}");
        assert_eq!(outcome["lesson"]["status"], "completed");
        assert_eq!(outcome["completed_lessons"], n + 1);
        assert_eq!(outcome["student_approved"], n == 19);
    }

    let (status, certificate) = ctx.send(Method::POST, &certificate_uri, None).await;
    assert_eq!(status, StatusCode::OK);
    assert!(certificate["id"].as_str().unwrap().starts_with("CERT-"));
    assert_eq!(certificate["student_id"], ctx.student.id.to_string());
    assert_eq!(certificate["completed_lessons"], 20);

    let (_, again) = ctx.send(Method::POST, &certificate_uri, None).await;
    assert_ne!(again["id"], certificate["id"]);
}

#[tokio::test]
async fn test_validate_rejects_closed_lesson_and_unknown_status() {
    let ctx = TestContext::new().await;
    let tutor_id = ctx.create_tutor("Carlos").await;
    let (_, lesson) = ctx
        .schedule(tutor_id, "2030-05-10T10:00:00Z", "theoretical")
        .await;
    let uri = format!("/tutors/lessons/{}/validate", body_id(&lesson));

    let (status, body) = ctx
        .send(Method::POST, &uri, Some(json!({ "status": "finished" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = ctx
        .send(Method::POST, &uri, Some(json!({ "status": "completed" })))
        .await;
    assert_eq!(status, StatusCode::OK);

    let (status, _) = ctx
        .send(Method::POST, &uri, Some(json!({ "status": "cancelled" })))
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx
        .send(
            Method::POST,
            &format!("/tutors/lessons/{}/validate", Uuid::new_v4()),
            Some(json!({ "status": "completed" })),
        )
        .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tutor_delete_blocked_by_lessons() {
    let ctx = TestContext::new().await;
    let busy = ctx.create_tutor("Carlos").await;
    let idle = ctx.create_tutor("Beatriz").await;
    ctx.schedule(busy, "2030-05-10T10:00:00Z", "theoretical").await;

    let (status, body) = ctx.send(Method::DELETE, &format!("/tutors/{}", busy), None).await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, _) = ctx.send(Method::DELETE, &format!("/tutors/{}", idle), None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.send(Method::GET, &format!("/tutors/{}", idle), None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_tutor_update() {
    let ctx = TestContext::new().await;
    let tutor_id = ctx.create_tutor("Carlos").await;

    let (status, body) = ctx
        .send(
            Method::PUT,
            &format!("/tutors/{}", tutor_id),
            Some(json!({ "specialty": "Motorcycles", "email": "carlos@example.com" })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Carlos");
    assert_eq!(body["specialty"], "Motorcycles");
    assert_eq!(body["email"], "carlos@example.com");

    let (status, body) = ctx
        .send(Method::PUT, &format!("/tutors/{}", tutor_id), Some(json!({ "email": null })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["email"].is_null());
}

#[tokio::test]
async fn test_available_slots_and_tutor_availability() {
    let ctx = TestContext::new().await;
    let tutor_id = ctx.create_tutor("Carlos").await;
    ctx.schedule(tutor_id, "2030-05-10T10:00:00Z", "theoretical").await;

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/lessons/available-slots?tutorId={}&date=2030-05-10", tutor_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let slots: Vec<DateTime<Utc>> = body["slots"].as_array().unwrap().iter().map(parse_time).collect();
    assert_eq!(slots.len(), 9);
    assert_eq!(slots[0], "2030-05-10T08:00:00Z".parse::<DateTime<Utc>>().unwrap());
    assert!(!slots.contains(&"2030-05-10T10:00:00Z".parse().unwrap()));

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/tutors/{}/availability?date=2030-05-10", tutor_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    let busy = body["busy"].as_array().unwrap();
    assert_eq!(busy.len(), 1);
    assert_eq!(parse_time(&busy[0]["end"]) - parse_time(&busy[0]["start"]), Duration::hours(1));

    let (status, _) = ctx
        .send(
            Method::GET,
            &format!("/tutors/{}/availability?date=10-05-2030", tutor_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_list_students_paginates() {
    let ctx = TestContext::new().await;
    for n in 0..11 {
        insert_student(&ctx.school, &format!("Aluno {:02}", n)).await;
    }

    let (status, body) = ctx.send(Method::GET, "/students?page=3&limit=5", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 12);
    assert_eq!(body["total_pages"], 3);
    assert_eq!(body["current_page"], 3);
    assert_eq!(body["students"].as_array().unwrap().len(), 2);

    let (status, body) = ctx.send(Method::GET, "/students?name=aluno%200", None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["total"], 10);

    let (status, body) = ctx.send(Method::GET, "/students?limit=0", None).await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "limit");
}

#[tokio::test]
async fn test_student_update_and_delete() {
    let ctx = TestContext::new().await;
    let other = insert_student(&ctx.school, "Ana").await;
    let uri = format!("/students/{}", other.id);

    let (status, body) = ctx
        .send(
            Method::PUT,
            &uri,
            Some(json!({ "name": "Ana Paula", "phone": "+55 11 99999-0000", "approved": true })),
        )
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["name"], "Ana Paula");
    assert_eq!(body["phone"], "+55 11 99999-0000");
    assert_eq!(body["approved"], false);

    let (status, _) = ctx.send(Method::DELETE, &uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, body) = ctx.send(Method::GET, &uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
    assert_eq!(body["error"], "not_found");
}

#[tokio::test]
async fn test_lesson_crud_and_filters() {
    let ctx = TestContext::new().await;
    let tutor_id = ctx.create_tutor("Carlos").await;

    let (status, first) = ctx
        .send(
            Method::POST,
            "/lessons",
            Some(json!({
                "studentId": ctx.student.id,
                "tutorId": tutor_id,
                "scheduledAt": "2030-05-10T10:00:00Z",
                "kind": "theoretical",
            })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    let (_, second) = ctx
        .schedule(tutor_id, "2030-05-10T11:00:00Z", "theoretical")
        .await;
    let first_uri = format!("/lessons/{}", body_id(&first));

    // Moving onto a taken slot
    let (status, body) = ctx
        .send(Method::PUT, &first_uri, Some(json!({ "scheduledAt": "2030-05-10T11:00:00Z" })))
        .await;
    assert_eq!(status, StatusCode::CONFLICT);
    assert_eq!(body["error"], "conflict");

    let (status, body) = ctx
        .send(Method::PUT, &first_uri, Some(json!({ "scheduled_at": "2030-05-10T15:00:00Z" })))
        .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(parse_time(&body["scheduled_at"]), "2030-05-10T15:00:00Z".parse::<DateTime<Utc>>().unwrap());

    ctx.send(
        Method::POST,
        &format!("/tutors/lessons/{}/validate", body_id(&second)),
        Some(json!({ "status": "cancelled" })),
    )
    .await;

    let (status, body) = ctx
        .send(Method::GET, &format!("/lessons?tutorId={}&status=scheduled", tutor_id), None)
        .await;
    assert_eq!(status, StatusCode::OK);
    let lessons = body.as_array().unwrap();
    assert_eq!(lessons.len(), 1);
    assert_eq!(body_id(&lessons[0]), body_id(&first));

    let (status, _) = ctx.send(Method::GET, "/lessons?status=postponed", None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    // Closed lessons cannot be edited
    let (status, _) = ctx
        .send(
            Method::PUT,
            &format!("/lessons/{}", body_id(&second)),
            Some(json!({ "kind": "theoretical" })),
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, _) = ctx.send(Method::DELETE, &first_uri, None).await;
    assert_eq!(status, StatusCode::NO_CONTENT);

    let (status, _) = ctx.send(Method::GET, &first_uri, None).await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn test_malformed_lesson_id_is_bad_request() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx.send(Method::GET, "/lessons/not-a-uuid", None).await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_page_beyond_offset_range_is_bad_request() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send(Method::GET, "/students?page=9223372036854775807&limit=10", None)
        .await;

    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");
}

#[tokio::test]
async fn test_last_representable_date_is_bad_request() {
    let ctx = TestContext::new().await;
    let tutor_id = ctx.create_tutor("Carlos").await;

    let (status, body) = ctx
        .send(
            Method::GET,
            &format!("/tutors/{}/availability?date=%2B262142-12-31", tutor_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["error"], "bad_request");

    let (status, _) = ctx
        .send(
            Method::GET,
            &format!("/lessons/available-slots?tutorId={}&date=%2B262142-12-31", tutor_id),
            None,
        )
        .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_blank_names_fail_validation() {
    let ctx = TestContext::new().await;

    let (status, body) = ctx
        .send_anonymous(
            Method::POST,
            "/students/register",
            Some(json!({ "name": "   ", "email": "blank@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "name");

    let (status, body) = ctx
        .send(
            Method::POST,
            "/tutors",
            Some(json!({ "name": "Carlos", "specialty": " \t " })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);
    assert_eq!(body["details"][0]["field"], "specialty");

    let tutor_id = ctx.create_tutor("Carlos").await;
    let (status, _) = ctx
        .send(Method::PUT, &format!("/tutors/{}", tutor_id), Some(json!({ "name": "  " })))
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, _) = ctx
        .send(
            Method::PUT,
            &format!("/students/{}", ctx.student.id),
            Some(json!({ "name": "  " })),
        )
        .await;
    assert_eq!(status, StatusCode::UNPROCESSABLE_ENTITY);

    let (status, body) = ctx
        .send_anonymous(
            Method::POST,
            "/students/register",
            Some(json!({ "name": "  Ana Souza ", "email": "ana@example.com", "password": "password123" })),
        )
        .await;
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(body["student"]["name"], "Ana Souza");
}
