//! Google OAuth2 identity provider client.
//!
//! The code exchange goes through `oauth2`'s `BasicClient`; the profile is
//! read from the userinfo endpoint. Both share one `reqwest::Client`.

use async_trait::async_trait;
use chrono::Utc;
use mesika_sso_platform_access::{
    IdentityProvider, OAuthConfig, ProviderError, ProviderProfile, ProviderToken,
};
use oauth2::{
    AuthUrl, AuthorizationCode, ClientId, ClientSecret, CsrfToken, EndpointNotSet, EndpointSet,
    RedirectUrl, Scope, TokenResponse, TokenUrl, basic::BasicClient,
};
use serde::Deserialize;

/// Longest slice of an error body kept in error details.
const MAX_ERROR_BODY_CHARS: usize = 256;

type ConfiguredClient =
    BasicClient<EndpointSet, EndpointNotSet, EndpointNotSet, EndpointNotSet, EndpointSet>;

/// Userinfo payload. Accepts both the v2 (`id`, `verified_email`) and the
/// OpenID Connect (`sub`, `email_verified`) field names, alone or together.
#[derive(Debug, Deserialize)]
struct GoogleUserInfo {
    #[serde(default)]
    sub: Option<String>,
    #[serde(default)]
    id: Option<String>,
    email: String,
    #[serde(default)]
    email_verified: Option<bool>,
    #[serde(default)]
    verified_email: Option<bool>,
    #[serde(default)]
    name: String,
    #[serde(default)]
    hd: Option<String>,
}

impl TryFrom<GoogleUserInfo> for ProviderProfile {
    type Error = String;

    fn try_from(info: GoogleUserInfo) -> Result<Self, Self::Error> {
        let subject_id = info
            .sub
            .or(info.id)
            .ok_or_else(|| "profile has neither 'sub' nor 'id'".to_string())?;
        Ok(Self {
            subject_id,
            email: info.email,
            email_verified: info.email_verified.or(info.verified_email).unwrap_or(false),
            display_name: info.name,
            hosted_domain: info.hd,
        })
    }
}

/// Google implementation of [`IdentityProvider`].
#[derive(Clone)]
pub struct GoogleClient {
    oauth: ConfiguredClient,
    http: reqwest::Client,
    userinfo_url: reqwest::Url,
    scopes: Vec<Scope>,
}

impl GoogleClient {
    /// Creates a client from configuration.
    ///
    /// # Errors
    ///
    /// Returns an error if an endpoint URL is invalid or the HTTP client
    /// cannot be built.
    pub fn new(config: &OAuthConfig) -> Result<Self, ProviderError> {
        let auth_url = AuthUrl::new(config.auth_url().to_string())
            .map_err(|e| ProviderError::Configuration(format!("invalid auth URL: {e}")))?;
        let token_url = TokenUrl::new(config.token_url().to_string())
            .map_err(|e| ProviderError::Configuration(format!("invalid token URL: {e}")))?;
        let redirect_url = RedirectUrl::new(config.redirect_url().to_string())
            .map_err(|e| ProviderError::Configuration(format!("invalid redirect URL: {e}")))?;
        let userinfo_url = reqwest::Url::parse(config.userinfo_url())
            .map_err(|e| ProviderError::Configuration(format!("invalid userinfo URL: {e}")))?;

        let http = reqwest::Client::builder()
            .use_rustls_tls()
            .min_tls_version(reqwest::tls::Version::TLS_1_2)
            .timeout(config.request_timeout())
            // Provider endpoints are never followed through redirects.
            .redirect(reqwest::redirect::Policy::none())
            .build()
            .map_err(|e| ProviderError::Configuration(format!("HTTP client error: {e}")))?;

        let oauth = BasicClient::new(ClientId::new(config.client_id().to_string()))
            .set_client_secret(ClientSecret::new(config.client_secret().to_string()))
            .set_auth_uri(auth_url)
            .set_token_uri(token_url)
            .set_redirect_uri(redirect_url);

        let scopes = config
            .scopes()
            .into_iter()
            .map(|scope| Scope::new(scope.to_string()))
            .collect();

        Ok(Self {
            oauth,
            http,
            userinfo_url,
            scopes,
        })
    }
}

#[async_trait]
impl IdentityProvider for GoogleClient {
    fn authorization_url(&self, state: &str) -> String {
        let state = state.to_string();
        let (url, _) = self
            .oauth
            .authorize_url(move || CsrfToken::new(state))
            .add_scopes(self.scopes.iter().cloned())
            .url();
        url.to_string()
    }

    async fn exchange_code(&self, code: &str) -> Result<ProviderToken, ProviderError> {
        let response = self
            .oauth
            .exchange_code(AuthorizationCode::new(code.to_string()))
            .request_async(&self.http)
            .await
            .map_err(|e| ProviderError::TokenExchange(e.to_string()))?;

        let now = Utc::now();
        let expiry = response
            .expires_in()
            .and_then(|lifetime| chrono::Duration::from_std(lifetime).ok())
            .map(|lifetime| now + lifetime);
        let scope = response
            .scopes()
            .map(|scopes| scopes.iter().map(|scope| (**scope).clone()).collect())
            .unwrap_or_default();

        Ok(ProviderToken::new(
            response.access_token().secret().clone(),
            expiry,
            scope,
        ))
    }

    async fn fetch_profile(&self, token: &ProviderToken) -> Result<ProviderProfile, ProviderError> {
        let response = self
            .http
            .get(self.userinfo_url.clone())
            .bearer_auth(token.access_token())
            .send()
            .await
            .map_err(|e| ProviderError::Network(e.to_string()))?;

        let status = response.status();
        // Read the whole body so the connection can go back to the pool.
        let body = response
            .bytes()
            .await
            .map_err(|e| ProviderError::Network(format!("failed to read profile body: {e}")))?;

        if !status.is_success() {
            let text = String::from_utf8_lossy(&body);
            return Err(ProviderError::InvalidResponse {
                status: Some(status.as_u16()),
                details: truncate(&text, MAX_ERROR_BODY_CHARS),
            });
        }

        let info: GoogleUserInfo =
            serde_json::from_slice(&body).map_err(|e| ProviderError::InvalidResponse {
                status: Some(status.as_u16()),
                details: format!("undecodable profile: {e}"),
            })?;

        ProviderProfile::try_from(info).map_err(|details| ProviderError::InvalidResponse {
            status: Some(status.as_u16()),
            details,
        })
    }
}

fn truncate(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((end, _)) => format!("{}...", &text[..end]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use wiremock::matchers::{body_string_contains, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    async fn client_for(server: &MockServer) -> GoogleClient {
        let config = OAuthConfig::new(
            "client-id".to_string(),
            "client-secret".to_string(),
            "http://localhost:8080/api/auth/callback".to_string(),
        )
        .with_endpoints(
            format!("{}/auth", server.uri()),
            format!("{}/token", server.uri()),
            format!("{}/userinfo", server.uri()),
        );
        GoogleClient::new(&config).expect("client should build")
    }

    fn token() -> ProviderToken {
        ProviderToken::new("ya29.token".to_string(), None, Vec::new())
    }

    #[tokio::test]
    async fn authorization_url_carries_state_and_scopes() {
        let server = MockServer::start().await;
        let client = client_for(&server).await;

        let url = reqwest::Url::parse(&client.authorization_url("abc")).expect("valid URL");
        let params: std::collections::HashMap<_, _> = url.query_pairs().into_owned().collect();

        assert_eq!(url.path(), "/auth");
        assert_eq!(params.get("state").map(String::as_str), Some("abc"));
        assert_eq!(params.get("client_id").map(String::as_str), Some("client-id"));
        assert_eq!(params.get("response_type").map(String::as_str), Some("code"));
        assert!(
            params
                .get("scope")
                .is_some_and(|s| s.contains("userinfo.email"))
        );
    }

    #[tokio::test]
    async fn exchange_code_success() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .and(body_string_contains("code=validcode"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "access_token": "ya29.token",
                "token_type": "Bearer",
                "expires_in": 3599,
                "scope": "email profile"
            })))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let token = client.exchange_code("validcode").await.expect("exchange");

        assert_eq!(token.access_token(), "ya29.token");
        assert!(token.is_valid_at(Utc::now()));
        assert_eq!(token.scope(), ["email".to_string(), "profile".to_string()]);
    }

    #[tokio::test]
    async fn token_endpoint_500_is_exchange_failure() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/token"))
            .respond_with(ResponseTemplate::new(500).set_body_string("internal error"))
            .expect(1)
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.exchange_code("validcode").await.unwrap_err();

        assert!(matches!(err, ProviderError::TokenExchange(_)));
    }

    #[tokio::test]
    async fn fetch_profile_success() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .and(header("authorization", "Bearer ya29.token"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "1234567890",
                "email": "a@mesika.org",
                "verified_email": true,
                "name": "Alice",
                "hd": "mesika.org"
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let profile = client.fetch_profile(&token()).await.expect("profile");

        assert_eq!(
            profile,
            ProviderProfile {
                subject_id: "1234567890".to_string(),
                email: "a@mesika.org".to_string(),
                email_verified: true,
                display_name: "Alice".to_string(),
                hosted_domain: Some("mesika.org".to_string()),
            }
        );
    }

    #[tokio::test]
    async fn fetch_profile_accepts_openid_field_names() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "sub": "42",
                "email": "b@mesika.org",
                "email_verified": true
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let profile = client.fetch_profile(&token()).await.expect("profile");

        assert_eq!(profile.subject_id, "42");
        assert!(profile.email_verified);
        assert_eq!(profile.display_name, "");
        assert!(profile.hosted_domain.is_none());
    }

    #[tokio::test]
    async fn fetch_profile_accepts_both_field_styles_together() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "id": "1",
                "sub": "1",
                "email": "a@mesika.org",
                "verified_email": true,
                "email_verified": true
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let profile = client.fetch_profile(&token()).await.expect("profile");

        assert_eq!(profile.subject_id, "1");
        assert_eq!(profile.email, "a@mesika.org");
        assert!(profile.email_verified);
    }

    #[tokio::test]
    async fn fetch_profile_without_subject_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "email": "a@mesika.org",
                "verified_email": true
            })))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_profile(&token()).await.unwrap_err();

        assert!(matches!(
            err,
            ProviderError::InvalidResponse {
                status: Some(200),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn fetch_profile_non_2xx_is_invalid_response() {
        let server = MockServer::start().await;
        let long_body = "x".repeat(1000);
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(401).set_body_string(long_body))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_profile(&token()).await.unwrap_err();

        match err {
            ProviderError::InvalidResponse { status, details } => {
                assert_eq!(status, Some(401));
                assert!(details.len() <= MAX_ERROR_BODY_CHARS + 3);
            }
            other => panic!("expected InvalidResponse, got {other:?}"),
        }
    }

    #[tokio::test]
    async fn fetch_profile_undecodable_body_is_invalid_response() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/userinfo"))
            .respond_with(ResponseTemplate::new(200).set_body_string("<html>not json</html>"))
            .mount(&server)
            .await;

        let client = client_for(&server).await;
        let err = client.fetch_profile(&token()).await.unwrap_err();

        assert!(matches!(
            err,
            ProviderError::InvalidResponse {
                status: Some(200),
                ..
            }
        ));
    }

    #[tokio::test]
    async fn unreachable_provider_is_network_failure() {
        // Nothing listens on port 1.
        let config = OAuthConfig::new(
            "client-id".to_string(),
            "client-secret".to_string(),
            "http://localhost:8080/api/auth/callback".to_string(),
        )
        .with_endpoints(
            "http://127.0.0.1:1/auth",
            "http://127.0.0.1:1/token",
            "http://127.0.0.1:1/userinfo",
        );
        let client = GoogleClient::new(&config).expect("client should build");

        let err = client.fetch_profile(&token()).await.unwrap_err();
        assert!(matches!(err, ProviderError::Network(_)));
    }

    #[test]
    fn invalid_endpoint_is_configuration_error() {
        let config = OAuthConfig::new(
            "c".to_string(),
            "s".to_string(),
            "not a url".to_string(),
        );
        assert!(matches!(
            GoogleClient::new(&config),
            Err(ProviderError::Configuration(_))
        ));
    }

    #[test]
    fn truncate_respects_char_boundaries() {
        assert_eq!(truncate("héllo", 2), "hé...");
        assert_eq!(truncate("short", 10), "short");
    }
}
