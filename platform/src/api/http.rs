use std::time::Duration;

use async_trait::async_trait;
use reqwest::{
    header::{self, HeaderMap, HeaderName, HeaderValue},
    Client, Response,
};
use tracing::{debug, info};

use super::{
    envelope::{Envelope, QrGenerateData, QrPollData, RoomIdData, StartLiveData},
    validate_title, LiveApi, StreamEndpoint,
};
use crate::{
    catalog::Theme,
    error::ApiError,
    session::{Cookies, QrChallenge, QrPoll, Session, USER_ID_COOKIE},
};

pub const PASSPORT_BASE: &str = "https://passport.bilibili.com";
pub const LIVE_BASE: &str = "https://api.live.bilibili.com";
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

const USER_AGENT: &str = "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/96.0.4664.110 Safari/537.36";
/// Broadcast client the room operations claim to come from.
const PLATFORM: &str = "android_link";

/// Base URLs of the two platform hosts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoints {
    pub passport: String,
    pub live: String,
}

impl Default for Endpoints {
    fn default() -> Self {
        Endpoints {
            passport: PASSPORT_BASE.into(),
            live: LIVE_BASE.into(),
        }
    }
}

impl Endpoints {
    fn passport_url(&self, path: &str) -> String {
        format!("{}/{}", self.passport.trim_end_matches('/'), path)
    }

    fn live_url(&self, path: &str) -> String {
        format!("{}/{}", self.live.trim_end_matches('/'), path)
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub endpoints: Endpoints,
    /// Upper bound for a whole request, connect included
    pub request_timeout: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        ClientConfig {
            endpoints: Endpoints::default(),
            request_timeout: DEFAULT_REQUEST_TIMEOUT,
        }
    }
}

/// [LiveApi] over the platform's web endpoints.
#[derive(Debug, Clone)]
pub struct HttpLiveApi {
    http: Client,
    endpoints: Endpoints,
}

impl HttpLiveApi {
    pub fn new(config: ClientConfig) -> Result<Self, ApiError> {
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .default_headers(browser_headers())
            .timeout(config.request_timeout)
            .build()
            .map_err(|err| ApiError::Network(err.to_string()))?;

        Ok(HttpLiveApi {
            http,
            endpoints: config.endpoints,
        })
    }

    /// Posts a room operation form signed with the session's csrf token.
    async fn post_room(
        &self,
        path: &str,
        session: &Session,
        fields: Vec<(&'static str, String)>,
    ) -> Result<Envelope, ApiError> {
        let mut form = vec![
            ("room_id", session.room_id.to_string()),
            ("platform", PLATFORM.to_string()),
        ];
        form.extend(fields);
        form.push(("csrf_token", session.csrf.clone()));
        form.push(("csrf", session.csrf.clone()));

        let response = self
            .http
            .post(self.endpoints.live_url(path))
            .header(header::COOKIE, session.cookie_header())
            .form(&form)
            .send()
            .await?;

        read_envelope(response).await
    }
}

fn browser_headers() -> HeaderMap {
    let mut headers = HeaderMap::new();

    headers.insert(
        header::ACCEPT,
        HeaderValue::from_static("application/json, text/plain, */*"),
    );
    headers.insert(
        header::ACCEPT_LANGUAGE,
        HeaderValue::from_static("zh-CN,zh;q=0.9,en;q=0.8,en-GB;q=0.7,en-US;q=0.6"),
    );
    headers.insert(
        header::ORIGIN,
        HeaderValue::from_static("https://link.bilibili.com"),
    );
    headers.insert(
        header::REFERER,
        HeaderValue::from_static("https://link.bilibili.com/p/center/index"),
    );
    for (name, value) in [
        (
            "sec-ch-ua",
            r#""Microsoft Edge";v="129", "Not=A?Brand";v="8", "Chromium";v="129""#,
        ),
        ("sec-ch-ua-mobile", "?0"),
        ("sec-ch-ua-platform", r#""Linux""#),
        ("sec-fetch-dest", "empty"),
        ("sec-fetch-mode", "cors"),
        ("sec-fetch-site", "same-site"),
    ] {
        headers.insert(
            HeaderName::from_static(name),
            HeaderValue::from_static(value),
        );
    }

    headers
}

async fn read_envelope(response: Response) -> Result<Envelope, ApiError> {
    let status = response.status();
    if !status.is_success() {
        return Err(ApiError::Protocol(format!("unexpected HTTP status {status}")));
    }

    Ok(response.json::<Envelope>().await?)
}

#[async_trait]
impl LiveApi for HttpLiveApi {
    async fn issue_qr_challenge(&self) -> Result<QrChallenge, ApiError> {
        let response = self
            .http
            .get(
                self.endpoints
                    .passport_url("x/passport-login/web/qrcode/generate"),
            )
            .send()
            .await?;
        let data: QrGenerateData = read_envelope(response).await?.into_data()?;

        debug!(qr_key = %data.qrcode_key, "qr challenge issued");
        Ok(QrChallenge {
            qr_key: data.qrcode_key,
            url: data.url,
        })
    }

    async fn poll_qr_status(&self, qr_key: &str) -> Result<QrPoll, ApiError> {
        let response = self
            .http
            .get(self.endpoints.passport_url("x/passport-login/web/qrcode/poll"))
            .query(&[("qrcode_key", qr_key)])
            .send()
            .await?;

        // the session cookies only travel in the Set-Cookie headers
        let cookies: Cookies = response
            .cookies()
            .map(|cookie| (cookie.name().to_string(), cookie.value().to_string()))
            .collect();
        let data: QrPollData = read_envelope(response).await?.into_data()?;

        debug!(code = data.code, "qr status polled");
        Ok(QrPoll::from_code(data.code, cookies))
    }

    async fn resolve_room_identity(&self, cookies: &Cookies) -> Result<u64, ApiError> {
        let uid = cookies
            .get(USER_ID_COOKIE)
            .ok_or_else(|| ApiError::NotFound(format!("no {USER_ID_COOKIE} cookie")))?;

        let response = self
            .http
            .get(self.endpoints.live_url("room/v2/Room/room_id_by_uid"))
            .query(&[("uid", uid.as_str())])
            .send()
            .await?;
        let envelope = read_envelope(response).await?;

        if envelope.code == 0 && envelope.data.is_null() {
            return Err(ApiError::NotFound(format!("user {uid} has no live room")));
        }

        match envelope.into_data::<RoomIdData>()?.room_id {
            0 => Err(ApiError::NotFound(format!("user {uid} has no live room"))),
            room_id => Ok(room_id),
        }
    }

    async fn fetch_categories(&self, session: &Session) -> Result<Vec<Theme>, ApiError> {
        let response = self
            .http
            .get(self.endpoints.live_url("room/v1/Area/getList"))
            .query(&[("show_pinyin", "1")])
            .header(header::COOKIE, session.cookie_header())
            .send()
            .await?;

        read_envelope(response).await?.into_data()
    }

    async fn start_broadcast(
        &self,
        session: &Session,
        category_id: u32,
    ) -> Result<StreamEndpoint, ApiError> {
        let envelope = self
            .post_room(
                "room/v1/Room/startLive",
                session,
                vec![
                    ("area_v2", category_id.to_string()),
                    ("backup_stream", "0".to_string()),
                ],
            )
            .await?;

        let rtmp = envelope
            .into_data::<StartLiveData>()?
            .rtmp
            .ok_or_else(|| ApiError::Protocol("start response has no rtmp section".into()))?;

        info!(room_id = session.room_id, category_id, "broadcast started");
        Ok(StreamEndpoint {
            server_address: rtmp.addr,
            stream_key: rtmp.code,
        })
    }

    async fn stop_broadcast(&self, session: &Session) -> Result<(), ApiError> {
        self.post_room("room/v1/Room/stopLive", session, vec![])
            .await?
            .into_unit()?;

        info!(room_id = session.room_id, "broadcast stopped");
        Ok(())
    }

    async fn update_title(&self, session: &Session, title: &str) -> Result<(), ApiError> {
        validate_title(title)?;

        self.post_room(
            "room/v1/Room/update",
            session,
            vec![("title", title.to_string())],
        )
        .await?
        .into_unit()?;

        info!(room_id = session.room_id, title, "title updated");
        Ok(())
    }
}
