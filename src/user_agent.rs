use http::Extensions;
use reqwest::{
    Request, Response,
    header::{HeaderValue, InvalidHeaderValue, USER_AGENT},
};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware, Middleware, Next};
use tracing::trace;

/// Middleware that overwrites the `User-Agent` header of every request.
///
/// An empty value is sent as an empty header, so no default user agent from
/// the client or the engine takes its place.
#[derive(Debug, Clone)]
pub struct UserAgent {
    value: HeaderValue,
}

impl UserAgent {
    /// Validates `value` as a header value.
    ///
    /// # Errors
    ///
    /// Returns an error if `value` contains bytes that are not allowed in a
    /// header value, such as control characters.
    pub fn new(value: &str) -> Result<Self, InvalidHeaderValue> {
        Ok(Self {
            value: HeaderValue::from_str(value)?,
        })
    }

    /// Builds the middleware from a compile-time constant.
    ///
    /// # Panics
    ///
    /// Panics if `value` is not a valid header value.
    #[must_use]
    pub fn from_static(value: &'static str) -> Self {
        Self {
            value: HeaderValue::from_static(value),
        }
    }
}

#[async_trait::async_trait]
impl Middleware for UserAgent {
    async fn handle(
        &self,
        mut req: Request,
        extensions: &mut Extensions,
        next: Next<'_>,
    ) -> reqwest_middleware::Result<Response> {
        trace!(user_agent = ?self.value, url = %req.url(), "setting User-Agent");
        req.headers_mut().insert(USER_AGENT, self.value.clone());
        next.run(req, extensions).await
    }
}

/// Wraps `client` so every request it sends carries `User-Agent: value`.
///
/// The new middleware runs after any already attached, so when this is called
/// more than once the most recent value is the one sent. Clones of the input
/// handle are left untouched.
///
/// # Errors
///
/// Returns an error if `value` is not a valid header value.
pub fn attach_user_agent(
    client: ClientWithMiddleware,
    value: &str,
) -> Result<ClientWithMiddleware, InvalidHeaderValue> {
    let user_agent = UserAgent::new(value)?;
    Ok(ClientBuilder::from_client(client).with(user_agent).build())
}

#[cfg(test)]
mod tests {
    use assert_matches::assert_matches;
    use wiremock::{Mock, MockServer, ResponseTemplate, matchers::method};

    use super::*;
    use crate::client::{pooled_client, transient_client};

    async fn received_user_agent(client: &ClientWithMiddleware) -> Option<String> {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .expect(1)
            .mount(&mock_server)
            .await;

        client.get(mock_server.uri()).send().await.unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        requests[0]
            .headers
            .get(USER_AGENT)
            .map(|v| v.to_str().unwrap().to_string())
    }

    #[test]
    fn test_new_rejects_invalid_header_value() {
        assert!(UserAgent::new("bad\nvalue").is_err());
        assert_matches!(attach_user_agent(transient_client().unwrap(), "a\rb"), Err(_));
    }

    #[test]
    fn test_new_accepts_empty_value() {
        assert!(UserAgent::new("").is_ok());
    }

    #[tokio::test]
    async fn test_sets_user_agent() {
        let client = attach_user_agent(transient_client().unwrap(), "foo/1").unwrap();

        assert_eq!(received_user_agent(&client).await.as_deref(), Some("foo/1"));
    }

    #[tokio::test]
    async fn test_empty_user_agent_sends_no_value() {
        let client = attach_user_agent(pooled_client().unwrap(), "").unwrap();

        assert_eq!(received_user_agent(&client).await.as_deref(), Some(""));
    }

    #[tokio::test]
    async fn test_last_attached_wins() {
        let client = attach_user_agent(transient_client().unwrap(), "A").unwrap();
        let client = attach_user_agent(client, "B").unwrap();

        assert_eq!(received_user_agent(&client).await.as_deref(), Some("B"));
    }

    #[tokio::test]
    async fn test_overrides_caller_supplied_header() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&mock_server)
            .await;

        let client = attach_user_agent(transient_client().unwrap(), "foo/1").unwrap();
        client
            .get(mock_server.uri())
            .header(USER_AGENT, "caller/9")
            .send()
            .await
            .unwrap();

        let requests = mock_server.received_requests().await.unwrap();
        assert_eq!(requests[0].headers.get(USER_AGENT).unwrap(), "foo/1");
    }

    #[tokio::test]
    async fn test_original_handle_is_not_decorated() {
        let base = transient_client().unwrap();
        let decorated = attach_user_agent(base.clone(), "foo/1").unwrap();

        assert_eq!(received_user_agent(&decorated).await.as_deref(), Some("foo/1"));
        assert_eq!(received_user_agent(&base).await, None);
    }

    #[tokio::test]
    async fn test_static_user_agent_as_middleware() {
        let client = ClientBuilder::new(reqwest::Client::new())
            .with(UserAgent::from_static("static/2"))
            .build();

        assert_eq!(
            received_user_agent(&client).await.as_deref(),
            Some("static/2")
        );
    }
}
