//! Twilio messaging: outbound SMS and inbound webhook signatures.

use base64::{Engine, engine::general_purpose::STANDARD as BASE64};
use hmac::{Hmac, Mac};
use sha1::Sha1;

type HmacSha1 = Hmac<Sha1>;

const API_BASE: &str = "https://api.twilio.com/2010-04-01";

pub struct TwilioClient {
    account_sid: String,
    auth_token: String,
    from_number: String,
    client: reqwest::Client,
}

impl TwilioClient {
    pub fn new(account_sid: &str, auth_token: &str, from_number: &str) -> Self {
        Self {
            account_sid: account_sid.to_string(),
            auth_token: auth_token.to_string(),
            from_number: from_number.to_string(),
            client: reqwest::Client::new(),
        }
    }

    pub async fn send_sms(&self, to: &str, body: &str) -> Result<(), String> {
        let url = format!("{}/Accounts/{}/Messages.json", API_BASE, self.account_sid);
        let params = [("To", to), ("From", self.from_number.as_str()), ("Body", body)];

        let resp = self
            .client
            .post(&url)
            .basic_auth(&self.account_sid, Some(&self.auth_token))
            .form(&params)
            .send()
            .await
            .map_err(|e| format!("Twilio unavailable: {}", e))?;

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(format!("Twilio rejected message ({}): {}", status, text));
        }
        Ok(())
    }
}

/// `X-Twilio-Signature` for a request to `url` carrying form `params`:
/// base64 HMAC-SHA1, keyed by the auth token, over the URL followed by every
/// parameter name and value sorted by name.
pub fn expected_signature(auth_token: &str, url: &str, params: &[(String, String)]) -> String {
    let mut sorted: Vec<&(String, String)> = params.iter().collect();
    sorted.sort();

    let mut data = url.to_string();
    for (key, value) in sorted {
        data.push_str(key);
        data.push_str(value);
    }

    let mut mac =
        HmacSha1::new_from_slice(auth_token.as_bytes()).expect("HMAC can take key of any size");
    mac.update(data.as_bytes());
    BASE64.encode(mac.finalize().into_bytes())
}

pub fn verify_signature(
    auth_token: &str,
    url: &str,
    params: &[(String, String)],
    signature: &str,
) -> bool {
    let expected = expected_signature(auth_token, url, params);
    expected.len() == signature.len()
        && expected
            .bytes()
            .zip(signature.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}
