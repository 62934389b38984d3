use std::sync::{
    atomic::{AtomicBool, Ordering},
    Arc,
};

use assessment_dashboard::{
    config::Config,
    database::{JsonStore, KeyValueStore, MemoryStore},
    dto::{
        assessment_dto::CreateAssessmentPayload,
        auth_dto::{CreateStudentPayload, InitAdminPayload},
        grading_dto::{GradeReport, GradingRequest, QuestionGrade},
    },
    error::{Error, Result},
    middleware::auth::issue_token,
    models::{assessment::Assessment, user::User},
    routes::create_router,
    services::{
        ai_service::GeminiClient,
        grading_service::Grader,
        media_service::{MediaHost, UploadedMedia},
        speech_service::SpeechService,
    },
    AppState,
};
use async_trait::async_trait;
use axum::{
    body::{to_bytes, Body},
    http::{Request, StatusCode},
    Router,
};
use bytes::Bytes;
use mockall::mock;
use serde_json::{json, Value as JsonValue};
use tower::ServiceExt;

mock! {
    pub Media {}

    #[async_trait]
    impl MediaHost for Media {
        async fn upload_audio(
            &self,
            folder: &str,
            public_id: &str,
            data: Bytes,
            content_type: &str,
            format: &str,
        ) -> Result<UploadedMedia>;

        async fn destroy(&self, public_id: &str) -> Result<()>;
    }
}

mock! {
    pub Grading {}

    #[async_trait]
    impl Grader for Grading {
        fn is_configured(&self) -> bool;

        async fn grade(&self, request: &GradingRequest) -> Result<GradeReport>;
    }
}

const SECRET: &str = "test_secret_key";

/// Memory backend whose writes start failing once `reject_writes` is set.
#[derive(Default)]
struct FlakyStore {
    inner: MemoryStore,
    reject_writes: AtomicBool,
}

#[async_trait]
impl KeyValueStore for FlakyStore {
    fn backend_tag(&self) -> &'static str {
        "flaky"
    }

    async fn get(&self, key: &str) -> Result<Option<String>> {
        self.inner.get(key).await
    }

    async fn set(&self, key: &str, value: String) -> Result<()> {
        if self.reject_writes.load(Ordering::SeqCst) {
            return Err(Error::Storage("write refused".to_string()));
        }
        self.inner.set(key, value).await
    }

    async fn ping(&self) -> Result<()> {
        Ok(())
    }
}

struct Harness {
    app: Router,
    state: AppState,
    admin_token: String,
    student: User,
    student_token: String,
}

fn test_config() -> Config {
    Config {
        server_address: "127.0.0.1:0".to_string(),
        redis_url: "redis://unused".to_string(),
        jwt_secret: SECRET.to_string(),
        jwt_ttl_hours: 1,
        log_json: false,
        upload_limit_mb: 5,
        gemini_api_key: None,
        gemini_model: "gemini-2.0-flash".to_string(),
        cloudinary: None,
        azure_speech: None,
    }
}

async fn harness(media: MockMedia, grader: MockGrading) -> Harness {
    harness_on(Arc::new(MemoryStore::default()), media, grader).await
}

async fn harness_on(
    backend: Arc<dyn KeyValueStore>,
    media: MockMedia,
    grader: MockGrading,
) -> Harness {
    let store = JsonStore::new(backend);
    let client = reqwest::Client::new();
    let state = AppState::with_backends(
        test_config(),
        store,
        Arc::new(media),
        Arc::new(grader),
        GeminiClient::new(None, "gemini-2.0-flash".to_string(), client.clone()),
        SpeechService::new(None, client),
    );

    let admin = state
        .user_service
        .init_admin(InitAdminPayload {
            email: "head@ward.org".to_string(),
            password: "admin-pass".to_string(),
            name: "Head Nurse".to_string(),
        })
        .await
        .expect("seed admin");
    let student = add_student(&state, "Nok", "nok@ward.org").await;

    Harness {
        app: create_router(state.clone()),
        admin_token: issue_token(&admin, SECRET, 1).expect("admin token"),
        student_token: issue_token(&student, SECRET, 1).expect("student token"),
        state,
        student,
    }
}

async fn add_student(state: &AppState, name: &str, email: &str) -> User {
    state
        .user_service
        .create_student(CreateStudentPayload {
            name: name.to_string(),
            email: email.to_string(),
            student_id: None,
            password: "student-pass".to_string(),
            role: None,
        })
        .await
        .expect("seed student")
}

async fn seed_assessment(state: &AppState, body: JsonValue) -> Assessment {
    let payload: CreateAssessmentPayload = serde_json::from_value(body).expect("payload");
    state
        .assessment_service
        .create(payload)
        .await
        .expect("seed assessment")
}

fn two_videos() -> JsonValue {
    json!([
        {"publicId": "v0", "url": "https://cdn/v0.mp4", "question": "Why wash hands?",
         "correctAnswer": "Prevent infection"},
        {"publicId": "v1", "url": "https://cdn/v1.mp4", "question": "When to glove?"}
    ])
}

async fn call(
    app: &Router,
    method: &str,
    uri: &str,
    token: Option<&str>,
    body: Option<JsonValue>,
) -> (StatusCode, JsonValue) {
    let mut builder = Request::builder().method(method).uri(uri);
    if let Some(token) = token {
        builder = builder.header("Authorization", format!("Bearer {}", token));
    }
    let request = match body {
        Some(body) => builder
            .header("Content-Type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap(),
        None => builder.body(Body::empty()).unwrap(),
    };
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    let json = if bytes.is_empty() {
        JsonValue::Null
    } else {
        serde_json::from_slice(&bytes).unwrap()
    };
    (status, json)
}

async fn send_voice(app: &Router, uri: &str, token: &str, transcript: &str) -> (StatusCode, JsonValue) {
    let boundary = "XBOUNDARYX";
    let multipart = format!(
        "--{b}\r\nContent-Disposition: form-data; name=\"audio\"; filename=\"answer.webm\"\r\n\
         Content-Type: audio/webm\r\n\r\nfake-audio-bytes\r\n\
         --{b}\r\nContent-Disposition: form-data; name=\"transcript\"\r\n\r\n{t}\r\n\
         --{b}--\r\n",
        b = boundary,
        t = transcript
    );
    let request = Request::builder()
        .method("POST")
        .uri(uri)
        .header("Authorization", format!("Bearer {}", token))
        .header(
            "Content-Type",
            format!("multipart/form-data; boundary={}", boundary),
        )
        .body(Body::from(multipart))
        .unwrap();
    let response = app.clone().oneshot(request).await.unwrap();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    (status, serde_json::from_slice(&bytes).unwrap())
}

fn recording_media(uploads: usize) -> MockMedia {
    let mut media = MockMedia::new();
    media
        .expect_upload_audio()
        .times(uploads)
        .returning(|folder, public_id, _data, _content_type, format| {
            Ok(UploadedMedia {
                url: format!("https://media/{}/{}.{}", folder, public_id, format),
                public_id: format!("{}/{}", folder, public_id),
                format: format.to_string(),
            })
        });
    media
}

fn idle_media() -> MockMedia {
    MockMedia::new()
}

fn idle_grader() -> MockGrading {
    let mut grader = MockGrading::new();
    grader.expect_is_configured().return_const(true);
    grader
}

#[tokio::test]
async fn two_video_session_walkthrough() {
    let h = harness(recording_media(1), idle_grader()).await;
    let a = seed_assessment(&h.state, json!({"name": "Hand hygiene", "videos": two_videos()})).await;
    let token = Some(h.student_token.as_str());
    let session = format!("/api/assessments/{}/session", a.id);
    let messages = format!("/api/assessments/{}/messages", a.id);

    let (status, body) = call(&h.app, "GET", &session, token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"]["currentVideoIndex"], 0);
    assert_eq!(body["progress"]["videoProgress"], 1);

    let (_, log) = call(&h.app, "GET", &messages, token, None).await;
    assert_eq!(log["messages"].as_array().unwrap().len(), 2);

    // Reopening writes nothing new.
    call(&h.app, "GET", &session, token, None).await;
    let (_, log) = call(&h.app, "GET", &messages, token, None).await;
    assert_eq!(log["messages"].as_array().unwrap().len(), 2);

    let advance = format!("/api/assessments/{}/advance", a.id);
    let (status, _) = call(&h.app, "POST", &advance, token, None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let events = format!("/api/assessments/{}/events", a.id);
    let (status, _) = call(
        &h.app,
        "POST",
        &events,
        token,
        Some(json!({"type": "text", "text": "To stop germs"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&h.app, "POST", &advance, token, None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"]["currentVideoIndex"], 1);
    assert_eq!(body["progress"]["hasAnsweredCurrentVideo"], false);
    assert_eq!(body["progress"]["allDone"], false);

    let voice = format!("/api/assessments/{}/voice", a.id);
    let (status, body) = send_voice(&h.app, &voice, &h.student_token, "answer2").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcript"], "answer2");

    let (status, body) = call(&h.app, "POST", &advance, token, None).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
    assert_eq!(body["success"], false);

    let (_, body) = call(&h.app, "GET", &session, token, None).await;
    assert_eq!(body["progress"]["allDone"], true);
    let groups = body["groups"].as_array().unwrap();
    assert_eq!(groups.len(), 2);
    assert_eq!(groups[0]["answers"][0]["text"], "To stop germs");
    assert_eq!(groups[1]["answers"][0]["type"], "voice");
    assert_eq!(groups[1]["answers"][0]["transcript"], "answer2");
    assert_eq!(body["progress"]["videoProgress"], 2);

    let (_, status_body) = call(&h.app, "GET", "/api/assessments/status", token, None).await;
    assert_eq!(status_body["answered"][&a.id], 2);
    assert_eq!(status_body["videoProgress"][&a.id], 2);
    assert_eq!(status_body["totalVideos"][&a.id], 2);
}

#[tokio::test]
async fn session_opens_even_when_markers_cannot_be_saved() {
    let backend = Arc::new(FlakyStore::default());
    let h = harness_on(backend.clone(), idle_media(), idle_grader()).await;
    let a = seed_assessment(&h.state, json!({"name": "Read only", "videos": two_videos()})).await;
    backend.reject_writes.store(true, Ordering::SeqCst);

    let session = format!("/api/assessments/{}/session", a.id);
    let (status, body) = call(&h.app, "GET", &session, Some(&h.student_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["progress"]["currentVideoIndex"], 0);
    assert_eq!(body["progress"]["videoProgress"], 1);
    assert_eq!(body["progress"]["allDone"], false);

    let messages = format!("/api/assessments/{}/messages", a.id);
    let (_, log) = call(&h.app, "GET", &messages, Some(&h.student_token), None).await;
    assert!(log["messages"].as_array().unwrap().is_empty());
}

#[tokio::test]
async fn expired_unfinished_assessment_lands_in_expired_bucket() {
    let h = harness(idle_media(), idle_grader()).await;
    let past = seed_assessment(
        &h.state,
        json!({"name": "Closed", "videos": two_videos(), "deadline": "2020-01-01T00:00:00Z"}),
    )
    .await;
    seed_assessment(&h.state, json!({"name": "Open", "deadline": "2999-01-01"})).await;

    let (status, body) = call(&h.app, "GET", "/api/home", Some(&h.student_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["expired"].as_array().unwrap().len(), 1);
    assert_eq!(body["expired"][0]["assessment"]["id"], past.id.as_str());
    assert_eq!(body["upcoming"].as_array().unwrap().len(), 1);
    assert_eq!(body["completedCount"], 0);

    let advance = format!("/api/assessments/{}/advance", past.id);
    let (status, _) = call(&h.app, "POST", &advance, Some(&h.student_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);
}

#[tokio::test]
async fn logs_outlive_their_assessment() {
    let h = harness(idle_media(), idle_grader()).await;
    let a = seed_assessment(&h.state, json!({"name": "Short lived"})).await;
    let events = format!("/api/assessments/{}/events", a.id);
    let messages = format!("/api/assessments/{}/messages", a.id);

    call(
        &h.app,
        "POST",
        &events,
        Some(&h.student_token),
        Some(json!({"type": "text", "text": "answer"})),
    )
    .await;

    let (status, _) = call(
        &h.app,
        "DELETE",
        &format!("/api/assessments/{}", a.id),
        Some(&h.admin_token),
        None,
    )
    .await;
    assert_eq!(status, StatusCode::OK);

    let (status, body) = call(&h.app, "GET", &messages, Some(&h.student_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["messages"].as_array().unwrap().len(), 1);

    let (status, _) = call(
        &h.app,
        "POST",
        &events,
        Some(&h.student_token),
        Some(json!({"type": "text", "text": "late"})),
    )
    .await;
    assert_eq!(status, StatusCode::NOT_FOUND);
}

#[tokio::test]
async fn grading_failure_is_isolated_per_student() {
    let mut grader = MockGrading::new();
    grader.expect_is_configured().return_const(true);
    grader.expect_grade().returning(|request: &GradingRequest| {
        if request.items[0].answer.contains("quota") {
            return Err(Error::Upstream("Gemini API Error 429".to_string()));
        }
        Ok(GradeReport {
            grades: vec![QuestionGrade {
                id: 1,
                score: 2.0,
                feedback: "Correct".to_string(),
            }],
            total_score: None,
        })
    });

    let h = harness(idle_media(), grader).await;
    let other = add_student(&h.state, "Pim", "pim@ward.org").await;
    let a = seed_assessment(
        &h.state,
        json!({"name": "Graded", "videos": two_videos(), "fullMarks": 4}),
    )
    .await;

    let events = format!("/api/assessments/{}/events", a.id);
    call(
        &h.app,
        "POST",
        &events,
        Some(&h.student_token),
        Some(json!({"type": "text", "text": "prevent infection"})),
    )
    .await;
    let other_token = issue_token(&other, SECRET, 1).unwrap();
    call(
        &h.app,
        "POST",
        &events,
        Some(&other_token),
        Some(json!({"type": "text", "text": "over quota"})),
    )
    .await;

    let grade = format!("/api/assessments/{}/grade", a.id);
    let (status, _) = call(&h.app, "POST", &grade, Some(&h.student_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&h.app, "POST", &grade, Some(&h.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    let results = body["results"].as_array().unwrap();
    assert_eq!(results.len(), 2);
    let ok = results.iter().find(|r| r["username"] == "nok").unwrap();
    assert_eq!(ok["totalScore"], 2.0);
    let failed = results.iter().find(|r| r["username"] == "pim").unwrap();
    assert!(failed["error"].as_str().unwrap().contains("429"));

    let sheet = h.state.marks_service.sheet(&a.id).await.unwrap();
    assert_eq!(sheet.get("nok"), Some(&Some(2.0)));
    assert!(!sheet.contains_key("pim"));

    let board = format!("/api/assessments/{}/responses", a.id);
    let (_, body) = call(&h.app, "GET", &board, Some(&h.student_token), None).await;
    let rows = body["students"].as_array().unwrap();
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0]["username"], h.student.username().as_str());
}

#[tokio::test]
async fn unconfigured_grader_is_refused() {
    let mut grader = MockGrading::new();
    grader.expect_is_configured().return_const(false);
    grader.expect_grade().never();
    let h = harness(idle_media(), grader).await;
    let a = seed_assessment(&h.state, json!({"name": "No AI"})).await;

    let grade = format!("/api/assessments/{}/grade", a.id);
    let (status, body) = call(&h.app, "POST", &grade, Some(&h.admin_token), None).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"], "Gemini API not configured");
}

#[tokio::test]
async fn competency_save_recomputes_gap() {
    let h = harness(idle_media(), idle_grader()).await;
    let uri = "/api/competency/nok";
    let body = json!({
        "personnelType": "Level 2",
        "competencies": [
            {"type": "Core", "name": "Safety", "standard": 1, "self": 2,
             "leader": 2, "final": 4, "gap": 0}
        ]
    });

    let (status, _) = call(&h.app, "POST", uri, Some(&h.student_token), Some(body.clone())).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, saved) = call(&h.app, "POST", uri, Some(&h.admin_token), Some(body)).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(saved["data"]["competencies"][0]["gap"], 3);
    assert_eq!(saved["summary"]["criticalCount"], 1);

    let out_of_scale = json!({"competencies": [
        {"type": "Core", "name": "Safety", "standard": 1, "self": 7, "leader": 2, "final": 4}
    ]});
    let (status, _) = call(&h.app, "POST", uri, Some(&h.admin_token), Some(out_of_scale)).await;
    assert_eq!(status, StatusCode::BAD_REQUEST);

    let (status, own) = call(&h.app, "GET", uri, Some(&h.student_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(own["data"]["personnelType"], "Level 2");

    let (status, _) = call(&h.app, "GET", "/api/competency/pim", Some(&h.student_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, updated) = call(
        &h.app,
        "PATCH",
        "/api/competency/nok/scores",
        Some(&h.admin_token),
        Some(json!({"index": 0, "field": "final", "value": 1})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(updated["competency"]["gap"], 0);
    assert_eq!(updated["gapLabel"], "Met");

    let (status, _) = call(
        &h.app,
        "PATCH",
        "/api/competency/nok/scores",
        Some(&h.admin_token),
        Some(json!({"index": 0, "field": "final", "value": 9})),
    )
    .await;
    assert_eq!(status, StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn protected_routes_check_token_and_role() {
    let h = harness(idle_media(), idle_grader()).await;

    let (status, _) = call(&h.app, "GET", "/api/assessments", None, None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&h.app, "GET", "/api/assessments", Some("not-a-token"), None).await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);

    let (status, _) = call(&h.app, "GET", "/admin/users", Some(&h.student_token), None).await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(&h.app, "GET", "/admin/users", Some(&h.admin_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["users"].as_array().unwrap().len(), 2);

    let (status, _) = call(
        &h.app,
        "POST",
        "/api/assessments",
        Some(&h.student_token),
        Some(json!({"name": "Sneaky"})),
    )
    .await;
    assert_eq!(status, StatusCode::FORBIDDEN);

    let (status, body) = call(
        &h.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "nok@ward.org", "password": "student-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::OK);
    assert!(body["token"].as_str().is_some());

    let (status, _) = call(
        &h.app,
        "POST",
        "/auth/login",
        None,
        Some(json!({"email": "nok@ward.org", "password": "wrong-pass"})),
    )
    .await;
    assert_eq!(status, StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn voice_answer_then_retest_removes_recording() {
    let mut media = recording_media(1);
    media
        .expect_destroy()
        .times(1)
        .withf(|public_id: &str| public_id.starts_with("assessment_recordings/"))
        .returning(|_| Ok(()));

    let h = harness(media, idle_grader()).await;
    let a = seed_assessment(&h.state, json!({"name": "Spoken"})).await;

    let voice = format!("/api/assessments/{}/voice", a.id);
    let (status, body) = send_voice(&h.app, &voice, &h.student_token, "wash for twenty seconds").await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(body["transcript"], "wash for twenty seconds");

    let messages = format!("/api/assessments/{}/messages", a.id);
    let (_, log) = call(&h.app, "GET", &messages, Some(&h.student_token), None).await;
    assert_eq!(log["messages"][0]["type"], "voice");
    assert_eq!(log["messages"][0]["format"], "webm");

    let (status, cleared) = call(&h.app, "DELETE", &messages, Some(&h.student_token), None).await;
    assert_eq!(status, StatusCode::OK);
    assert_eq!(cleared["deleted"], 1);

    let (_, log) = call(&h.app, "GET", &messages, Some(&h.student_token), None).await;
    assert!(log["messages"].as_array().unwrap().is_empty());
}
