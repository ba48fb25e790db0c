//! Shared plumbing of the service clients.
//!
//! # Design
//! `ServiceClient` holds the resolved `Target` and a `Transport` and carries
//! no mutable state between calls. Service clients build `HttpRequest`
//! values through it, execute them with `send`, and parse the successful
//! responses themselves. Failed responses are turned into errors by the
//! service's `ErrorTaxonomy` inside `send`, so a parse step only ever sees
//! 2xx responses.

use std::sync::Arc;

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::config::{ClientOptions, Settings};
use crate::error::{ApiError, Result};
use crate::http::{HttpMethod, HttpRequest, HttpResponse, ReqwestTransport, RequestBody, Transport};
use crate::multipart::Form;
use crate::target::{Api, Target};
use crate::taxonomy::{map_error_response, ErrorTaxonomy};

/// Synchronous client bound to one API of one deployment.
#[derive(Clone)]
pub struct ServiceClient {
    target: Target,
    transport: Arc<dyn Transport>,
}

impl std::fmt::Debug for ServiceClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ServiceClient")
            .field("target", &self.target)
            .finish_non_exhaustive()
    }
}

impl ServiceClient {
    /// Resolves the target and creates a `reqwest` transport using its
    /// timeout.
    pub fn new(api: Api, options: &ClientOptions, settings: &Settings) -> Result<Self> {
        let target = Target::resolve(api, options, settings)?;
        let transport = Arc::new(ReqwestTransport::new(target.timeout())?);
        Ok(Self { target, transport })
    }

    /// Resolves the target and uses the given transport.
    pub fn with_transport(
        api: Api,
        options: &ClientOptions,
        settings: &Settings,
        transport: Arc<dyn Transport>,
    ) -> Result<Self> {
        let target = Target::resolve(api, options, settings)?;
        Ok(Self { target, transport })
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn build_get(&self, path: &str) -> HttpRequest {
        HttpRequest {
            method: HttpMethod::Get,
            url: self.target.url(path),
            headers: self.target.headers().to_vec(),
            body: None,
        }
    }

    pub fn build_json<T: Serialize + ?Sized>(&self, path: &str, body: &T) -> Result<HttpRequest> {
        let body = serde_json::to_vec(body).map_err(|e| ApiError::Serialization(e.to_string()))?;
        let mut request = self.build_post(path, RequestBody::Json(body));
        request
            .headers
            .push(("content-type".to_string(), "application/json".to_string()));
        Ok(request)
    }

    pub fn build_multipart(&self, path: &str, form: Form) -> HttpRequest {
        self.build_post(path, RequestBody::Multipart(form))
    }

    fn build_post(&self, path: &str, body: RequestBody) -> HttpRequest {
        let headers = self.target.headers().to_vec();
        HttpRequest {
            method: HttpMethod::Post,
            url: self.target.url(path),
            headers,
            body: Some(body),
        }
    }

    /// Executes `request` once. Non-2xx responses are classified with
    /// `taxonomy` and returned as errors.
    pub fn send(&self, request: HttpRequest, taxonomy: &dyn ErrorTaxonomy) -> Result<HttpResponse> {
        let response = self.transport.execute(request)?;
        if !response.is_success() {
            return Err(map_error_response(&response, taxonomy));
        }
        Ok(response)
    }
}

/// Deserializes a successful response body.
pub fn parse_json<T: DeserializeOwned>(response: &HttpResponse) -> Result<T> {
    serde_json::from_str(&response.body).map_err(|e| ApiError::Deserialization(e.to_string()))
}


#[cfg(test)]
mod tests {
    use super::testing::RecordingTransport;
    use super::*;
    use crate::taxonomy::NoTaxonomy;

    fn client(transport: Arc<RecordingTransport>) -> ServiceClient {
        let options = ClientOptions::new()
            .url("http://localhost:3000/")
            .api_key("k")
            .header("x-extra", "1");
        ServiceClient::with_transport(Api::Daspeak, &options, &Settings::default(), transport)
            .unwrap()
    }

    #[test]
    fn build_get_produces_correct_request() {
        let req = client(Arc::default()).build_get("alive");
        assert_eq!(req.method, HttpMethod::Get);
        assert_eq!(req.url, "http://localhost:3000/daspeak/v1/alive");
        assert_eq!(req.header("apikey"), Some("k"));
        assert_eq!(req.header("x-extra"), Some("1"));
        assert!(req.body.is_none());
    }

    #[test]
    fn build_json_sets_content_type() {
        let body = serde_json::json!({"calibration": "telephone-channel"});
        let req = client(Arc::default())
            .build_json("similarity/credential2credential", &body)
            .unwrap();
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), Some("application/json"));
        let sent: serde_json::Value = serde_json::from_slice(req.json_body().unwrap()).unwrap();
        assert_eq!(sent, body);
    }

    #[test]
    fn build_multipart_leaves_content_type_to_transport() {
        let form = Form::new().text("channel", 1);
        let req = client(Arc::default()).build_multipart("models/h/credential/wav", form.clone());
        assert_eq!(req.method, HttpMethod::Post);
        assert_eq!(req.header("content-type"), None);
        assert_eq!(req.header("apikey"), Some("k"));
        assert_eq!(req.form(), Some(&form));
    }

    #[test]
    fn send_maps_failures_through_the_taxonomy() {
        let transport = RecordingTransport::replying(500, "oops");
        let err = client(transport.clone())
            .send(client(Arc::default()).build_get("models"), &NoTaxonomy)
            .unwrap_err();
        assert!(matches!(err, ApiError::Server { status: 500, .. }));
        assert_eq!(transport.calls(), 1);
    }

    #[test]
    fn send_returns_successful_responses() {
        let transport = RecordingTransport::replying(200, r#"{"version":"1"}"#);
        let c = client(transport);
        let response = c.send(c.build_get("models"), &NoTaxonomy).unwrap();
        let value: serde_json::Value = parse_json(&response).unwrap();
        assert_eq!(value["version"], "1");
    }

    #[test]
    fn parse_json_bad_body() {
        let response = HttpResponse {
            status: 200,
            headers: Vec::new(),
            body: "not json".to_string(),
        };
        let err = parse_json::<serde_json::Value>(&response).unwrap_err();
        assert!(matches!(err, ApiError::Deserialization(_)));
    }
}
