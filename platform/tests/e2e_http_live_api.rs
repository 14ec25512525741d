use std::{
    collections::HashMap,
    sync::{
        atomic::{AtomicUsize, Ordering},
        Arc, Mutex,
    },
    time::Duration,
};

use axum::{
    extract::{Query, State},
    http::{header, HeaderMap},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Form, Json, Router,
};
use platform::{
    api::{ClientConfig, Endpoints, HttpLiveApi, LiveApi},
    error::ApiError,
    session::{Cookies, QrPoll, Session, CSRF_COOKIE, USER_ID_COOKIE},
};
use serde_json::{json, Value};
use tokio::net::TcpListener;

/// Requests seen by the stub platform.
#[derive(Clone, Default)]
struct Recorder {
    room_posts: Arc<AtomicUsize>,
    forms: Arc<Mutex<Vec<HashMap<String, String>>>>,
    cookie_headers: Arc<Mutex<Vec<String>>>,
}

async fn qr_generate() -> Json<Value> {
    Json(json!({
        "code": 0,
        "message": "0",
        "data": { "url": "https://passport.example.com/h5-app/passport/login/scan?qrcode_key=k1", "qrcode_key": "k1" }
    }))
}

async fn qr_poll(Query(params): Query<HashMap<String, String>>) -> impl IntoResponse {
    let code = match params.get("qrcode_key").map(String::as_str) {
        Some("confirmed") => 0,
        Some("scanned") => 86090,
        Some("expired") => 86038,
        _ => 86101,
    };
    let cookies = if code == 0 {
        vec![
            (header::SET_COOKIE, "DedeUserID=1024; Path=/; Domain=example.com"),
            (header::SET_COOKIE, "SESSDATA=s3ss%2C1; Path=/; HttpOnly"),
            (header::SET_COOKIE, "bili_jct=csrf-1; Path=/"),
        ]
    } else {
        vec![]
    };

    (
        AppendHeaders(cookies),
        Json(json!({ "code": 0, "message": "0", "data": { "code": code, "message": "" } })),
    )
}

async fn room_id_by_uid(Query(params): Query<HashMap<String, String>>) -> Json<Value> {
    match params.get("uid").map(String::as_str) {
        Some("1024") => Json(json!({ "code": 0, "msg": "ok", "message": "ok", "data": { "room_id": 5440 } })),
        _ => Json(json!({ "code": 0, "msg": "ok", "message": "ok", "data": { "room_id": 0 } })),
    }
}

async fn area_list(State(recorder): State<Recorder>, headers: HeaderMap) -> Json<Value> {
    if let Some(cookie) = headers.get(header::COOKIE).and_then(|v| v.to_str().ok()) {
        recorder.cookie_headers.lock().unwrap().push(cookie.to_string());
    }

    Json(json!({
        "code": 0,
        "msg": "success",
        "message": "success",
        "data": [
            { "id": 2, "name": "网游", "list": [
                { "id": "86", "parent_id": "2", "name": "英雄联盟", "pinyin": "yingxionglianmeng" },
                { "id": "89", "parent_id": "2", "name": "CS:GO", "pinyin": "csgo" }
            ]}
        ]
    }))
}

async fn start_live(
    State(recorder): State<Recorder>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    recorder.room_posts.fetch_add(1, Ordering::SeqCst);
    let stale = form.get("csrf").map(String::as_str) == Some("stale");
    recorder.forms.lock().unwrap().push(form);

    if stale {
        return Json(json!({ "code": 60024, "msg": "主播身份校验失败", "message": "主播身份校验失败", "data": [] }));
    }

    Json(json!({
        "code": 0,
        "msg": "",
        "message": "",
        "data": { "change": 1, "status": "LIVE", "rtmp": { "addr": "rtmp://push.example.com/live-bvc/", "code": "?streamname=live_1&key=k" } }
    }))
}

async fn room_ok(
    State(recorder): State<Recorder>,
    Form(form): Form<HashMap<String, String>>,
) -> Json<Value> {
    recorder.room_posts.fetch_add(1, Ordering::SeqCst);
    recorder.forms.lock().unwrap().push(form);

    Json(json!({ "code": 0, "msg": "ok", "message": "ok", "data": [] }))
}

/// Serves a fake platform on an ephemeral port and returns a client aimed at it.
async fn start_platform() -> (HttpLiveApi, Recorder) {
    let recorder = Recorder::default();
    let app = Router::new()
        .route("/x/passport-login/web/qrcode/generate", get(qr_generate))
        .route("/x/passport-login/web/qrcode/poll", get(qr_poll))
        .route("/room/v2/Room/room_id_by_uid", get(room_id_by_uid))
        .route("/room/v1/Area/getList", get(area_list))
        .route("/room/v1/Room/startLive", post(start_live))
        .route("/room/v1/Room/stopLive", post(room_ok))
        .route("/room/v1/Room/update", post(room_ok))
        .with_state(recorder.clone());

    let listener = TcpListener::bind("127.0.0.1:0")
        .await
        .expect("could not bind to an ephemeral port");
    let base = format!("http://{}", listener.local_addr().unwrap());
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });

    let api = HttpLiveApi::new(ClientConfig {
        endpoints: Endpoints {
            passport: base.clone(),
            live: base,
        },
        request_timeout: Duration::from_secs(5),
    })
    .unwrap();

    (api, recorder)
}

fn session(csrf: &str) -> Session {
    let cookies: Cookies = [(USER_ID_COOKIE, "1024"), ("SESSDATA", "s3ss"), (CSRF_COOKIE, csrf)]
        .into_iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();

    Session::new(cookies, 5440, csrf)
}

#[tokio::test]
async fn qr_login_flow_captures_cookies() {
    let (api, _) = start_platform().await;

    let challenge = api.issue_qr_challenge().await.unwrap();
    assert_eq!(challenge.qr_key, "k1");
    assert!(challenge.url.contains("qrcode_key=k1"));

    assert_eq!(api.poll_qr_status("k1").await.unwrap(), QrPoll::Pending);
    assert_eq!(api.poll_qr_status("scanned").await.unwrap(), QrPoll::Scanned);
    assert_eq!(api.poll_qr_status("expired").await.unwrap(), QrPoll::Expired);

    let QrPoll::Confirmed(cookies) = api.poll_qr_status("confirmed").await.unwrap() else {
        panic!("expected a confirmed login");
    };
    assert_eq!(cookies.get(USER_ID_COOKIE).map(String::as_str), Some("1024"));
    assert_eq!(cookies.get("SESSDATA").map(String::as_str), Some("s3ss%2C1"));
    assert_eq!(cookies.get(CSRF_COOKIE).map(String::as_str), Some("csrf-1"));

    assert_eq!(api.resolve_room_identity(&cookies).await.unwrap(), 5440);
}

#[tokio::test]
async fn room_lookup_misses_are_not_found() {
    let (api, _) = start_platform().await;

    let stranger: Cookies = [(USER_ID_COOKIE.to_string(), "7".to_string())].into();
    assert!(matches!(
        api.resolve_room_identity(&stranger).await,
        Err(ApiError::NotFound(_))
    ));

    assert!(matches!(
        api.resolve_room_identity(&Cookies::new()).await,
        Err(ApiError::NotFound(_))
    ));
}

#[tokio::test]
async fn categories_are_fetched_with_the_session_cookies() {
    let (api, recorder) = start_platform().await;

    let themes = api.fetch_categories(&session("csrf-1")).await.unwrap();

    assert_eq!(themes.len(), 1);
    assert_eq!(themes[0].list[1].name, "CS:GO");
    assert_eq!(themes[0].list[1].id, 89);
    assert_eq!(
        recorder.cookie_headers.lock().unwrap().as_slice(),
        ["DedeUserID=1024; SESSDATA=s3ss; bili_jct=csrf-1"]
    );
}

#[tokio::test]
async fn broadcast_start_and_stop() {
    let (api, recorder) = start_platform().await;
    let session = session("csrf-1");

    let endpoint = api.start_broadcast(&session, 86).await.unwrap();
    assert_eq!(endpoint.server_address, "rtmp://push.example.com/live-bvc/");
    assert_eq!(endpoint.stream_key, "?streamname=live_1&key=k");

    api.stop_broadcast(&session).await.unwrap();

    let forms = recorder.forms.lock().unwrap();
    let start = &forms[0];
    assert_eq!(start["room_id"], "5440");
    assert_eq!(start["area_v2"], "86");
    assert_eq!(start["platform"], "android_link");
    assert_eq!(start["csrf"], "csrf-1");
    assert_eq!(start["csrf_token"], "csrf-1");
    assert!(!forms[1].contains_key("area_v2"));
}

#[tokio::test]
async fn stale_credentials_are_reported_as_credential_errors() {
    let (api, _) = start_platform().await;

    let err = api.start_broadcast(&session("stale"), 86).await.unwrap_err();

    assert!(err.is_credential(), "unexpected error: {err}");
}

#[tokio::test]
async fn long_titles_are_refused_without_a_request() {
    let (api, recorder) = start_platform().await;
    let session = session("csrf-1");

    let err = api
        .update_title(&session, "a title that is far too long for the room")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
    assert_eq!(recorder.room_posts.load(Ordering::SeqCst), 0);

    api.update_title(&session, "深夜杂谈").await.unwrap();
    assert_eq!(recorder.room_posts.load(Ordering::SeqCst), 1);
    assert_eq!(recorder.forms.lock().unwrap()[0]["title"], "深夜杂谈");
}

#[tokio::test]
async fn unreachable_platform_is_a_network_error() {
    // grab a free port and release it so nothing listens there
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let base = format!("http://{}", listener.local_addr().unwrap());
    drop(listener);

    let api = HttpLiveApi::new(ClientConfig {
        endpoints: Endpoints {
            passport: base.clone(),
            live: base,
        },
        request_timeout: Duration::from_secs(2),
    })
    .unwrap();

    assert!(matches!(
        api.issue_qr_challenge().await,
        Err(ApiError::Network(_))
    ));
}
