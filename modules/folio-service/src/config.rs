use std::env;
use std::path::PathBuf;

#[derive(Clone, Debug)]
pub struct Config {
    pub auth_token: String,
    pub bind_addr: String,
    pub port: u16,
    pub data_dir: PathBuf,
}

impl Config {
    pub fn from_env() -> Result<Self, String> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self, String> {
        let auth_token = lookup("APPENDED_AUTH_TOKEN")
            .filter(|t| !t.trim().is_empty())
            .ok_or("APPENDED_AUTH_TOKEN must be set to a non-empty value")?;

        let port = match lookup("APPENDED_PORT") {
            Some(raw) => raw
                .parse()
                .map_err(|_| format!("APPENDED_PORT must be a valid port number, got {:?}", raw))?,
            None => 8081,
        };

        Ok(Self {
            auth_token,
            bind_addr: lookup("APPENDED_BIND_ADDR").unwrap_or_else(|| "127.0.0.1".to_string()),
            port,
            data_dir: lookup("APPENDED_DATA_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|| PathBuf::from("./data")),
        })
    }
}
