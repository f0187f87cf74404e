use std::sync::Arc;

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::post;
use axum::{Json, Router};
use geoguessr_slack_processor::{
    dispatch, Config, DelayedResponder, GeoGuessrBot, GeoGuessrClient, SlackCommand,
    SlackResponder, SlashCommandHandler,
};
use tracing::{info, warn};

mod slack;

type Error = Box<dyn std::error::Error + Send + Sync>;

struct AppState<H> {
    handler: Arc<H>,
    responder: Arc<dyn DelayedResponder>,
    signing_secret: Option<String>,
}

impl<H> Clone for AppState<H> {
    fn clone(&self) -> Self {
        Self {
            handler: self.handler.clone(),
            responder: self.responder.clone(),
            signing_secret: self.signing_secret.clone(),
        }
    }
}

fn router<H: SlashCommandHandler + 'static>(state: AppState<H>) -> Router {
    Router::new()
        .route("/slack", post(slash_command::<H>))
        .with_state(state)
}

fn plain(status: StatusCode, text: &'static str) -> Response {
    (status, [("Content-Type", "text/plain")], text).into_response()
}

async fn slash_command<H: SlashCommandHandler + 'static>(
    State(state): State<AppState<H>>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let body_string = match String::from_utf8(body.to_vec()) {
        Ok(body) => body,
        Err(_) => return plain(StatusCode::BAD_REQUEST, "Bad Request"),
    };

    if let Some(signing_secret) = &state.signing_secret {
        let slack_signature = headers
            .get("X-Slack-Signature")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");
        let slack_timestamp = headers
            .get("X-Slack-Request-Timestamp")
            .and_then(|v| v.to_str().ok())
            .unwrap_or("");

        let verified = match slack::unix_now() {
            Ok(now) => slack::verify_slack_signature(
                signing_secret,
                &body_string,
                slack_timestamp,
                slack_signature,
                now,
            )
            .unwrap_or(false),
            Err(_) => false,
        };
        if !verified {
            warn!("rejected request with invalid Slack signature");
            return plain(StatusCode::UNAUTHORIZED, "Unauthorized");
        }
    }

    let command: SlackCommand = match serde_urlencoded::from_str(&body_string) {
        Ok(command) => command,
        Err(e) => {
            warn!(error = %e, "failed to decode slash command form");
            return plain(StatusCode::BAD_REQUEST, "Bad Request");
        }
    };

    info!(user = %command.user_name, command = %command.command, "received slash command");

    let response = dispatch(state.handler.clone(), state.responder.clone(), command).into_response();
    (StatusCode::OK, Json(response)).into_response()
}

#[tokio::main]
async fn main() -> Result<(), Error> {
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
        .with_target(false)
        .without_time()
        .init();

    let config = Config::from_env()?;
    if config.geoguessr_cookie.is_none() {
        warn!("GEOGUESSR_COOKIE is not set; every command will be answered with a configuration error");
    }
    if config.slack_signing_secret.is_none() {
        warn!("SLACK_SIGNING_SECRET is not set; request signatures will not be checked");
    }

    let state = AppState {
        handler: Arc::new(GeoGuessrBot::new(GeoGuessrClient::new(&config))),
        responder: Arc::new(SlackResponder::new()),
        signing_secret: config.slack_signing_secret.clone(),
    };

    let addr = format!("{}:{}", config.bind_address, config.port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    info!(addr = %addr, "Listening for slash commands");

    axum::serve(listener, router(state)).await?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use axum::body::Body;
    use axum::http::Request;
    use geoguessr_slack_processor::{BotError, ChallengeApi, ChallengeRequest, SlackResponse};
    use serde_json::Value;
    use tower::ServiceExt;

    use super::*;

    const SECRET: &str = "test-signing-secret";

    #[derive(Default)]
    struct FakeApi {
        credentials: bool,
        requests: Arc<Mutex<Vec<ChallengeRequest>>>,
    }

    #[async_trait]
    impl ChallengeApi for FakeApi {
        fn has_credentials(&self) -> bool {
            self.credentials
        }

        async fn create_challenge(&self, request: &ChallengeRequest) -> Result<String, BotError> {
            self.requests.lock().unwrap().push(request.clone());
            Ok("https://www.geoguessr.com/challenge/T0K3N".to_string())
        }
    }

    #[derive(Default)]
    struct NullResponder;

    #[async_trait]
    impl DelayedResponder for NullResponder {
        async fn send(&self, _: &str, _: &SlackResponse) -> Result<(), BotError> {
            Ok(())
        }
    }

    fn state_with_requests(
        credentials: bool,
        signing_secret: Option<&str>,
        requests: Arc<Mutex<Vec<ChallengeRequest>>>,
    ) -> AppState<GeoGuessrBot<FakeApi>> {
        AppState {
            handler: Arc::new(GeoGuessrBot::new(FakeApi {
                credentials,
                requests,
            })),
            responder: Arc::new(NullResponder),
            signing_secret: signing_secret.map(str::to_string),
        }
    }

    fn state(credentials: bool, signing_secret: Option<&str>) -> AppState<GeoGuessrBot<FakeApi>> {
        state_with_requests(credentials, signing_secret, Arc::default())
    }

    fn form(text: &str) -> String {
        serde_urlencoded::to_string([
            ("command", "/geoguessr"),
            ("text", text),
            ("user_name", "ada"),
            ("response_url", "https://hooks.slack.com/commands/T1/1/abc"),
        ])
        .unwrap()
    }

    fn request(body: String) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri("/slack")
            .header("Content-Type", "application/x-www-form-urlencoded")
            .body(Body::from(body))
            .unwrap()
    }

    async fn send(app: Router, request: Request<Body>) -> (StatusCode, Vec<u8>) {
        let response = app.oneshot(request).await.unwrap();
        let status = response.status();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (status, body.to_vec())
    }

    #[tokio::test]
    async fn valid_command_is_acknowledged() {
        let (status, body) = send(router(state(true, None)), request(form("abc123 90"))).await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["response_type"], "in_channel");
        assert_eq!(json["text"], "Generating GeoGuessr challenge... ⏳");
    }

    #[tokio::test]
    async fn bad_parameters_are_answered_inline() {
        let requests: Arc<Mutex<Vec<ChallengeRequest>>> = Arc::default();
        let app_state = state_with_requests(true, None, Arc::clone(&requests));

        let (status, body) = send(router(app_state), request(form("abc123 ninety"))).await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["response_type"], "ephemeral");
        assert!(json["text"].as_str().unwrap().contains("\"ninety\""));
        assert!(requests.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn missing_cookie_is_reported() {
        let (status, body) = send(router(state(false, None)), request(form("abc123"))).await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert!(json["text"].as_str().unwrap().contains("not configured"));
    }

    #[tokio::test]
    async fn unsigned_request_is_rejected_when_secret_is_set() {
        let (status, _) = send(router(state(true, Some(SECRET))), request(form("abc123"))).await;

        assert_eq!(status, StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signed_request_is_accepted() {
        let body = form("abc123");
        let timestamp = slack::unix_now().unwrap().to_string();
        let signature = slack::compute_signature(SECRET, &body, &timestamp).unwrap();
        let mut request = request(body);
        request
            .headers_mut()
            .insert("x-slack-request-timestamp", timestamp.parse().unwrap());
        request
            .headers_mut()
            .insert("x-slack-signature", signature.parse().unwrap());

        let (status, body) = send(router(state(true, Some(SECRET))), request).await;

        assert_eq!(status, StatusCode::OK);
        let json: Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(json["response_type"], "in_channel");
    }

    #[tokio::test]
    async fn non_utf8_body_is_rejected() {
        let request = Request::builder()
            .method("POST")
            .uri("/slack")
            .body(Body::from(vec![0xff, 0xfe]))
            .unwrap();

        let (status, _) = send(router(state(true, None)), request).await;

        assert_eq!(status, StatusCode::BAD_REQUEST);
    }
}
