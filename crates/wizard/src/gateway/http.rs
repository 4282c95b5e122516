use std::sync::Arc;

use async_trait::async_trait;
use domain::payloads::{Attachment, AttachmentFile, Foot, ScanFile, ScanRecord};
use domain::prescriptions::PrescriptionSummary;
use domain::records::{InvoiceSummary, Order, Patient};
use domain::{SaveMethod, StepId};
use reqwest::cookie::{CookieStore, Jar};
use reqwest::multipart::{Form, Part};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode, Url};
use serde::de::DeserializeOwned;
use serde_json::{json, Value};
use tracing::{debug, warn};

use super::{step_resource, Gateway};
use crate::config::ClientConfig;
use crate::error::{Result, WizardError};

pub const CSRF_COOKIE: &str = "csrftoken";
pub const CSRF_HEADER: &str = "X-CSRFToken";

/// reqwest-backed gateway. The cookie jar holds the session and the
/// anti-forgery cookie between calls.
pub struct HttpGateway {
    client: Client,
    jar: Arc<Jar>,
    config: ClientConfig,
}

impl HttpGateway {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let jar = Arc::new(Jar::default());
        let client = Client::builder()
            .cookie_provider(jar.clone())
            .build()
            .map_err(WizardError::network)?;

        Ok(Self {
            client,
            jar,
            config,
        })
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    /// The cookie-carrying client. Clones share the jar.
    pub fn client(&self) -> &Client {
        &self.client
    }

    fn csrf_token(&self) -> Option<String> {
        let url = Url::parse(&self.config.base_url).ok()?;
        let cookies = self.jar.cookies(&url)?;
        cookies
            .to_str()
            .ok()?
            .split(';')
            .map(str::trim)
            .find_map(|pair| pair.strip_prefix("csrftoken="))
            .map(str::to_string)
    }

    /// Token from the jar, priming it with a GET when absent.
    async fn ensure_csrf(&self) -> Result<String> {
        if let Some(token) = self.csrf_token() {
            return Ok(token);
        }

        debug!("priming {} cookie", CSRF_COOKIE);
        let response = self
            .client
            .get(self.config.api_url("csrf"))
            .send()
            .await
            .map_err(WizardError::network)?;
        check(response).await?;

        self.csrf_token().ok_or_else(|| WizardError::Transport {
            status: StatusCode::FORBIDDEN.as_u16(),
            message: "CSRF cookie not set".to_string(),
        })
    }

    async fn mutation(&self, method: Method, resource: &str) -> Result<RequestBuilder> {
        let token = self.ensure_csrf().await?;
        Ok(self
            .client
            .request(method, self.config.api_url(resource))
            .header(CSRF_HEADER, token))
    }

    async fn get_json<T: DeserializeOwned>(
        &self,
        resource: &str,
        query: &[(&str, &str)],
    ) -> Result<T> {
        let response = self
            .client
            .get(self.config.api_url(resource))
            .query(query)
            .send()
            .await
            .map_err(WizardError::network)?;
        decode(check(response).await?).await
    }

    async fn get_optional<T: DeserializeOwned>(&self, resource: &str) -> Result<Option<T>> {
        match self.get_json(resource, &[]).await {
            Ok(value) => Ok(Some(value)),
            Err(err) if err.is_not_found() => Ok(None),
            Err(err) => Err(err),
        }
    }

    async fn send_json<T: DeserializeOwned>(
        &self,
        method: Method,
        resource: &str,
        body: &Value,
    ) -> Result<T> {
        let response = self
            .mutation(method, resource)
            .await?
            .json(body)
            .send()
            .await
            .map_err(WizardError::network)?;
        decode(check(response).await?).await
    }

    /// No content type is set; reqwest writes the multipart boundary.
    async fn send_multipart<T: DeserializeOwned>(&self, resource: &str, form: Form) -> Result<T> {
        let response = self
            .mutation(Method::POST, resource)
            .await?
            .multipart(form)
            .send()
            .await
            .map_err(WizardError::network)?;
        decode(check(response).await?).await
    }
}

fn file_part(file_name: &str, content_type: &str, bytes: &[u8]) -> Result<Part> {
    let part = Part::bytes(bytes.to_vec()).file_name(file_name.to_string());
    if content_type.is_empty() {
        return Ok(part);
    }
    part.mime_str(content_type)
        .map_err(|e| WizardError::Validation(format!("{file_name}: {e}")))
}

/// Pass 2xx responses through; anything else becomes a transport error.
pub(crate) async fn check(response: Response) -> Result<Response> {
    if response.status().is_success() {
        return Ok(response);
    }

    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    warn!(status = %status, body = %body, "portal HTTP error");

    Err(WizardError::Transport {
        status: status.as_u16(),
        message: error_message(status, &body),
    })
}

async fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let bytes = response.bytes().await.map_err(WizardError::network)?;
    if bytes.is_empty() {
        return Ok(serde_json::from_value(Value::Null)?);
    }
    Ok(serde_json::from_slice(&bytes)?)
}

/// Prefer a `{ "message" }` body, then the other common shapes, then the raw
/// text, then the status reason.
pub fn error_message(status: StatusCode, body: &str) -> String {
    if let Ok(json) = serde_json::from_str::<Value>(body) {
        for key in ["message", "error", "detail"] {
            if let Some(msg) = json.get(key).and_then(Value::as_str) {
                return msg.to_string();
            }
        }
    }

    let trimmed = body.trim();
    if !trimmed.is_empty() && trimmed.len() <= 200 && !trimmed.starts_with('<') {
        return trimmed.to_string();
    }

    status
        .canonical_reason()
        .unwrap_or("Request failed")
        .to_string()
}

#[async_trait]
impl Gateway for HttpGateway {
    async fn fetch_step(&self, prescription_id: &str, step: StepId) -> Result<Option<Value>> {
        self.get_optional(&step_resource(prescription_id, step)).await
    }

    async fn save_step(
        &self,
        prescription_id: &str,
        step: StepId,
        payload: &Value,
    ) -> Result<Value> {
        let method = match step.save_method() {
            SaveMethod::Post => Method::POST,
            SaveMethod::Put => Method::PUT,
        };
        self.send_json(method, &step_resource(prescription_id, step), payload)
            .await
    }

    async fn create_prescription(&self, patient_id: &str) -> Result<PrescriptionSummary> {
        self.send_json(
            Method::POST,
            "prescriptions",
            &json!({ "patient_id": patient_id }),
        )
        .await
    }

    async fn fetch_prescription(&self, prescription_id: &str) -> Result<Option<Value>> {
        self.get_optional(&format!("prescriptions/{prescription_id}"))
            .await
    }

    async fn update_prescription(&self, prescription_id: &str, payload: &Value) -> Result<Value> {
        self.send_json(
            Method::PUT,
            &format!("prescriptions/{prescription_id}"),
            payload,
        )
        .await
    }

    async fn submit_prescription(&self, prescription_id: &str) -> Result<PrescriptionSummary> {
        self.send_json(
            Method::POST,
            "prescriptions/submit",
            &json!({ "prescription_id": prescription_id }),
        )
        .await
    }

    async fn upload_scans(
        &self,
        prescription_id: &str,
        files: &[(Foot, ScanFile)],
    ) -> Result<Vec<ScanRecord>> {
        let mut form = Form::new().text("prescription_id", prescription_id.to_string());
        for (foot, file) in files {
            form = form.part(
                foot.form_field(),
                file_part(&file.file_name, &file.content_type, &file.bytes)?,
            );
        }
        self.send_multipart(&format!("prescriptions/{prescription_id}/scans"), form)
            .await
    }

    async fn list_scans(&self, prescription_id: &str) -> Result<Vec<ScanRecord>> {
        Ok(self
            .get_optional(&format!("prescriptions/{prescription_id}/scans"))
            .await?
            .unwrap_or_default())
    }

    async fn upload_attachment(
        &self,
        prescription_id: &str,
        file: &AttachmentFile,
    ) -> Result<Attachment> {
        let form = Form::new().part(
            "file",
            file_part(&file.file_name, &file.content_type, &file.bytes)?,
        );
        self.send_multipart(
            &format!("prescriptions/{prescription_id}/attachments"),
            form,
        )
        .await
    }

    async fn search_patients(&self, query: &str) -> Result<Vec<Patient>> {
        self.get_json("patients", &[("q", query)]).await
    }

    async fn create_patient(&self, input: &Value) -> Result<Patient> {
        self.send_json(Method::POST, "patients", input).await
    }

    async fn list_prescriptions(&self, status: Option<&str>) -> Result<Vec<PrescriptionSummary>> {
        match status {
            Some(status) => self.get_json("prescriptions", &[("status", status)]).await,
            None => self.get_json("prescriptions", &[]).await,
        }
    }

    async fn list_orders(&self) -> Result<Vec<Order>> {
        self.get_json("orders", &[]).await
    }

    async fn list_invoices(&self) -> Result<Vec<InvoiceSummary>> {
        self.get_json("invoices", &[]).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_body_is_preferred() {
        assert_eq!(
            error_message(StatusCode::BAD_REQUEST, r#"{"message":"Patient is required"}"#),
            "Patient is required"
        );
        assert_eq!(
            error_message(StatusCode::NOT_FOUND, r#"{"detail":"Not found."}"#),
            "Not found."
        );
    }

    #[test]
    fn html_and_empty_bodies_fall_back_to_the_status() {
        assert_eq!(
            error_message(StatusCode::INTERNAL_SERVER_ERROR, "<html>boom</html>"),
            "Internal Server Error"
        );
        assert_eq!(error_message(StatusCode::FORBIDDEN, ""), "Forbidden");
        assert_eq!(error_message(StatusCode::CONFLICT, "already submitted"), "already submitted");
    }

    #[test]
    fn csrf_token_is_read_from_the_jar() {
        let gateway = HttpGateway::new(ClientConfig::new("http://portal.test", "p")).unwrap();
        assert_eq!(gateway.csrf_token(), None);

        let url = Url::parse("http://portal.test").unwrap();
        gateway
            .jar
            .add_cookie_str("csrftoken=abc123; Path=/", &url);
        gateway.jar.add_cookie_str("sessionid=s1; Path=/", &url);
        assert_eq!(gateway.csrf_token().as_deref(), Some("abc123"));
    }
}
