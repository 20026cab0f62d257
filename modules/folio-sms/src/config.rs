use std::env;

#[derive(Clone, Debug)]
pub struct Config {
    pub port: u16,
    pub appended_url: String,
    pub appended_token: String,
    pub account_sid: String,
    pub auth_token: String,
    pub twilio_number: String,
    pub client_number: String,
    /// Public URL Twilio posts to. Signatures are only checked when set.
    pub webhook_url: Option<String>,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.trim().is_empty())
                .ok_or_else(|| format!("{} must be set", key))
        };

        let port = match lookup("SMS_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("SMS_PORT must be a valid port number, got {:?}", raw))?,
            None => 8080,
        };

        Ok(Self {
            port,
            appended_url: lookup("APPENDED_URL")
                .unwrap_or_else(|| "http://127.0.0.1:8081".to_string()),
            appended_token: required("APPENDED_TOKEN")?,
            account_sid: required("TWILIO_ACCOUNT_SID")?,
            auth_token: required("TWILIO_AUTH_TOKEN")?,
            twilio_number: required("TWILIO_NUMBER")?,
            client_number: required("SMS_CLIENT_NUMBER")?,
            webhook_url: lookup("SMS_WEBHOOK_URL").filter(|v| !v.trim().is_empty()),
        })
    }
}
