use api_types::{
    AccountId,
    account::Account,
    auth::{Credentials, Me, TokenResponse},
    error::ErrorBody,
    operation::{OperationNew, OperationReceipt, StatementRow},
};
use reqwest::{Method, StatusCode, Url};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    error::{AppError, Result},
    session::Session,
};

#[derive(Debug, thiserror::Error)]
pub enum ClientError {
    /// No response was obtained.
    #[error("server unreachable: {0}")]
    Transport(#[source] reqwest::Error),
    /// Non-2xx response; `message` is the best human readable text found.
    #[error("{message}")]
    Status { status: StatusCode, message: String },
    /// 2xx response whose body is not the expected JSON.
    #[error("invalid response: {0}")]
    Decode(String),
    #[error("invalid url: {0}")]
    InvalidUrl(String),
}

impl ClientError {
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            Self::Status { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_unauthorized(&self) -> bool {
        matches!(
            self.status(),
            Some(StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN)
        )
    }
}

/// Authenticated request gateway.
///
/// Every call reads the session token once, when the request is built, and
/// sends it as a bearer credential if present.
#[derive(Debug, Clone)]
pub struct Client {
    base_url: Url,
    http: reqwest::Client,
    session: Session,
}

impl Client {
    pub fn new(base_url: &str, session: Session) -> Result<Self> {
        let base_url = Url::parse(base_url)
            .map_err(|err| AppError::InvalidConfig(format!("invalid base_url: {err}")))?;
        let http = reqwest::Client::builder().build()?;
        Ok(Self {
            base_url,
            http,
            session,
        })
    }

    pub fn session(&self) -> &Session {
        &self.session
    }

    pub async fn login(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<TokenResponse, ClientError> {
        self.send(Method::POST, "auth/login", Some(credentials))
            .await
    }

    pub async fn register(
        &self,
        credentials: &Credentials,
    ) -> std::result::Result<serde_json::Value, ClientError> {
        self.send(Method::POST, "auth/register", Some(credentials))
            .await
    }

    pub async fn me(&self) -> std::result::Result<Me, ClientError> {
        self.send(Method::GET, "me", None::<&()>).await
    }

    pub async fn accounts(&self) -> std::result::Result<Vec<Account>, ClientError> {
        self.send(Method::GET, "accounts", None::<&()>).await
    }

    pub async fn account_create(&self) -> std::result::Result<Account, ClientError> {
        self.send(Method::POST, "accounts", None::<&()>).await
    }

    pub async fn operation_submit(
        &self,
        account_id: AccountId,
        payload: &OperationNew,
    ) -> std::result::Result<OperationReceipt, ClientError> {
        self.send(
            Method::POST,
            &format!("accounts/{account_id}/transactions"),
            Some(payload),
        )
        .await
    }

    pub async fn statement(
        &self,
        account_id: AccountId,
    ) -> std::result::Result<Vec<StatementRow>, ClientError> {
        self.send(
            Method::GET,
            &format!("accounts/{account_id}/statement"),
            None::<&()>,
        )
        .await
    }

    async fn send<B, T>(
        &self,
        method: Method,
        path: &str,
        body: Option<&B>,
    ) -> std::result::Result<T, ClientError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let endpoint = self
            .base_url
            .join(path)
            .map_err(|err| ClientError::InvalidUrl(format!("{path}: {err}")))?;

        let token = self.session.get();
        tracing::debug!(%method, path, authenticated = token.is_some(), "request");

        let mut req = self.http.request(method, endpoint);
        if let Some(token) = token.as_deref() {
            req = req.bearer_auth(token);
        }
        if let Some(body) = body {
            req = req.json(body);
        }

        let res = req.send().await.map_err(ClientError::Transport)?;
        let status = res.status();
        let text = res.text().await.map_err(ClientError::Transport)?;

        if !status.is_success() {
            let message = error_message(status, &text);
            tracing::debug!(path, %status, %message, "request failed");
            return Err(ClientError::Status { status, message });
        }

        // Endpoints with an unspecified success body may answer with nothing.
        let body = if text.trim().is_empty() {
            "null"
        } else {
            text.as_str()
        };
        serde_json::from_str(body).map_err(|err| ClientError::Decode(err.to_string()))
    }
}

/// Extracts the message of a failed response.
///
/// Order: structured `detail`, raw body text, status reason phrase, status
/// code. Never empty.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Some(message) = serde_json::from_str::<ErrorBody>(body)
        .ok()
        .and_then(|parsed| parsed.message())
    {
        return message;
    }
    let raw = body.trim();
    if !raw.is_empty() {
        return raw.to_string();
    }

    status
        .canonical_reason()
        .map(str::to_string)
        .unwrap_or_else(|| format!("HTTP {}", status.as_u16()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn detail_string_wins() {
        let message = error_message(StatusCode::BAD_REQUEST, r#"{"detail":"Saldo insuficiente"}"#);
        assert_eq!(message, "Saldo insuficiente");
    }

    #[test]
    fn raw_text_when_not_structured() {
        let message = error_message(StatusCode::BAD_GATEWAY, "  upstream down \n");
        assert_eq!(message, "upstream down");
    }

    #[test]
    fn status_phrase_when_body_is_empty() {
        assert_eq!(error_message(StatusCode::NOT_FOUND, ""), "Not Found");
    }

    #[test]
    fn raw_text_when_detail_is_blank() {
        assert_eq!(
            error_message(StatusCode::UNAUTHORIZED, r#"{"detail":""}"#),
            r#"{"detail":""}"#
        );
        assert_eq!(error_message(StatusCode::UNAUTHORIZED, "  \n"), "Unauthorized");
    }

    #[test]
    fn numeric_status_as_last_resort() {
        let status = StatusCode::from_u16(599).unwrap();
        assert_eq!(error_message(status, ""), "HTTP 599");
    }

    #[test]
    fn unauthorized_and_forbidden_are_auth_failures() {
        let err = ClientError::Status {
            status: StatusCode::UNAUTHORIZED,
            message: "invalid token".to_string(),
        };
        assert!(err.is_unauthorized());
        assert_eq!(err.to_string(), "invalid token");

        let err = ClientError::Status {
            status: StatusCode::BAD_REQUEST,
            message: "bad".to_string(),
        };
        assert!(!err.is_unauthorized());
    }

    #[test]
    fn invalid_base_url_is_a_config_error() {
        let err = Client::new("not a url", Session::in_memory()).unwrap_err();
        assert!(matches!(err, AppError::InvalidConfig(_)));
    }
}
