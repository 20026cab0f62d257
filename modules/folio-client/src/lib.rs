//! HTTP client for the folio service.
//!
//! Requests carry form-encoded bodies and a bearer token; listings come back
//! as JSON arrays of strings.

use folio_types::{CreateFolioForm, NoteForm, ServiceStatus};
use reqwest::Method;

pub struct AppendedClient {
    base_url: String,
    token: String,
    client: reqwest::Client,
}

impl AppendedClient {
    pub fn new(token: &str, base_url: &str) -> Self {
        Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            token: token.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub fn default_local(token: &str) -> Self {
        Self::new(token, "http://127.0.0.1:8081")
    }

    pub async fn create_folio(&self, name: &str) -> Result<(), String> {
        let form = CreateFolioForm {
            name: name.to_string(),
        };
        self.send(Method::POST, "/folios", Some(&form)).await?;
        Ok(())
    }

    /// Names of every folio.
    pub async fn get_folios(&self) -> Result<Vec<String>, String> {
        self.get_json("/folios").await
    }

    /// Display lines of every note in the folio, done ones included.
    pub async fn get_notes(&self, folio: &str) -> Result<Vec<String>, String> {
        self.get_json(&folio_path(folio)).await
    }

    pub async fn add_note(&self, folio: &str, note: &str) -> Result<(), String> {
        let form = NoteForm {
            note: note.to_string(),
        };
        self.send(Method::POST, &folio_path(folio), Some(&form))
            .await?;
        Ok(())
    }

    /// Overwrites the text of the note at the 0-based `index`.
    pub async fn edit_note(&self, folio: &str, index: usize, note: &str) -> Result<(), String> {
        let form = NoteForm {
            note: note.to_string(),
        };
        let path = format!("{}/{}", folio_path(folio), index);
        self.send(Method::PUT, &path, Some(&form)).await?;
        Ok(())
    }

    /// Toggles done on the note at the 0-based `index`.
    pub async fn toggle_done(&self, folio: &str, index: usize) -> Result<(), String> {
        let path = format!("{}/{}/done", folio_path(folio), index);
        self.send::<()>(Method::GET, &path, None).await?;
        Ok(())
    }

    pub async fn delete_folio(&self, folio: &str) -> Result<(), String> {
        self.send::<()>(Method::DELETE, &folio_path(folio), None)
            .await?;
        Ok(())
    }

    pub async fn get_status(&self) -> Result<ServiceStatus, String> {
        self.get_json("/status").await
    }

    async fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, String> {
        self.send::<()>(Method::GET, path, None)
            .await?
            .json::<T>()
            .await
            .map_err(|e| format!("Invalid response from folio service: {}", e))
    }

    /// Sends a request; any status above 201 is an error.
    async fn send<F: serde::Serialize>(
        &self,
        method: Method,
        path: &str,
        form: Option<&F>,
    ) -> Result<reqwest::Response, String> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self
            .client
            .request(method, &url)
            .bearer_auth(&self.token);
        if let Some(form) = form {
            req = req.form(form);
        }

        let resp = req
            .send()
            .await
            .map_err(|e| format!("Folio service unavailable: {}", e))?;

        let status = resp.status();
        if status.as_u16() > 201 {
            let reason = status.canonical_reason().unwrap_or("Request failed").to_string();
            let body = resp.text().await.unwrap_or_default();
            return Err(if body.trim().is_empty() {
                reason
            } else {
                format!("{}: {}", reason, body.trim())
            });
        }
        Ok(resp)
    }
}

fn folio_path(folio: &str) -> String {
    format!("/folios/{}", urlencoding::encode(folio))
}
