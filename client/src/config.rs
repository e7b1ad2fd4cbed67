use anyhow::Context;

const DEFAULT_API_URL: &str = "https://localhost:7287/api/";

#[derive(Clone)]
pub struct Config {
    pub api_url: String,
    pub user_directory_url: String,
    pub token: String,
    pub jwt_secret: Option<String>,
    pub timeout_secs: u64,
    pub accept_invalid_certs: bool,
}

impl std::fmt::Debug for Config {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Config")
            .field("api_url", &self.api_url)
            .field("user_directory_url", &self.user_directory_url)
            .field("token", &"***")
            .field("jwt_secret", &self.jwt_secret.as_ref().map(|_| "***"))
            .field("timeout_secs", &self.timeout_secs)
            .field("accept_invalid_certs", &self.accept_invalid_certs)
            .finish()
    }
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        let mut api_url =
            std::env::var("ASSETDESK_API_URL").unwrap_or_else(|_| DEFAULT_API_URL.into());
        if !api_url.ends_with('/') {
            api_url.push('/');
        }

        let token = std::env::var("ASSETDESK_TOKEN").context("ASSETDESK_TOKEN must be set")?;
        let token = crate::auth::extract_bearer_token(&token)
            .context("ASSETDESK_TOKEN is empty")?
            .to_string();

        let jwt_secret = match std::env::var("ASSETDESK_JWT_SECRET") {
            Ok(secret) if secret.len() < 32 => {
                anyhow::bail!("ASSETDESK_JWT_SECRET must be at least 32 characters")
            }
            Ok(secret) => Some(secret),
            Err(_) => None,
        };

        Ok(Self {
            user_directory_url: std::env::var("ASSETDESK_USER_DIRECTORY_URL")
                .unwrap_or_else(|_| format!("{}Users", api_url)),
            api_url,
            token,
            jwt_secret,
            timeout_secs: std::env::var("ASSETDESK_TIMEOUT_SECS")
                .unwrap_or_else(|_| "30".into())
                .parse()
                .context("ASSETDESK_TIMEOUT_SECS must be a number")?,
            accept_invalid_certs: std::env::var("ASSETDESK_ACCEPT_INVALID_CERTS")
                .unwrap_or_else(|_| "false".into())
                .parse()
                .context("ASSETDESK_ACCEPT_INVALID_CERTS must be true or false")?,
        })
    }
}
