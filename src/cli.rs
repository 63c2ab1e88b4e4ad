use std::net::SocketAddr;

use clap::{Args, Parser};
use logomark::background::{DEFAULT_REMOVE_BG_ACCOUNT_URL, DEFAULT_REMOVE_BG_URL, RemoveBgClient};
use logomark::config::{BrandColor, DEFAULT_BRAND_COLOR, ProcessingMode};
use logomark::http::{ApiKeyReport, MAX_BODY_BYTES};
use logomark::vectorizer::remote::{AuthScheme, DEFAULT_VECTORIZER_URL, VectorizerAiClient, VectorizerAuth};

/// Command line interface definition. Every option also reads from the environment.
#[derive(Parser, Debug)]
#[command(author, version, about)]
pub struct Cli {
    /// Address the HTTP server listens on
    #[arg(long, env = "LOGOMARK_BIND", default_value = "0.0.0.0:3000")]
    pub bind: SocketAddr,
    /// Mode used when a request does not name one
    #[arg(long = "default-mode", env = "LOGOMARK_DEFAULT_MODE", default_value = "enhanced")]
    pub default_mode: ProcessingMode,
    /// Colour forced onto every fill and stroke (#RRGGBB)
    #[arg(long = "brand-color", env = "LOGOMARK_BRAND_COLOR", default_value_t = DEFAULT_BRAND_COLOR)]
    pub brand_color: BrandColor,
    /// Largest accepted request body, in bytes
    #[arg(long = "max-body-bytes", env = "LOGOMARK_MAX_BODY_BYTES", default_value_t = MAX_BODY_BYTES)]
    pub max_body_bytes: usize,
    #[command(flatten)]
    pub remove_bg: RemoveBgArgs,
    #[command(flatten)]
    pub vectorizer: VectorizerArgs,
}

// Field names double as clap ids, so each group prefixes its own.
#[derive(Args, Debug)]
pub struct RemoveBgArgs {
    /// remove.bg API key
    #[arg(long = "removebg-api-key", env = "REMOVEBG_API_KEY", hide_env_values = true)]
    pub removebg_api_key: Option<String>,
    /// Background removal endpoint
    #[arg(long = "removebg-url", env = "LOGOMARK_REMOVEBG_URL", default_value = DEFAULT_REMOVE_BG_URL)]
    pub removebg_url: String,
    /// Account endpoint used by the status check
    #[arg(
        long = "removebg-account-url",
        env = "LOGOMARK_REMOVEBG_ACCOUNT_URL",
        default_value = DEFAULT_REMOVE_BG_ACCOUNT_URL
    )]
    pub removebg_account_url: String,
}

impl RemoveBgArgs {
    pub fn client(&self) -> RemoveBgClient {
        RemoveBgClient::new(self.removebg_api_key.clone())
            .with_endpoint(&self.removebg_url)
            .with_account_endpoint(&self.removebg_account_url)
    }
}

#[derive(Args, Debug)]
pub struct VectorizerArgs {
    /// vectorizer.ai API key (bearer scheme)
    #[arg(long = "vectorizer-api-key", env = "VECTORIZER_API_KEY", hide_env_values = true)]
    pub vectorizer_api_key: Option<String>,
    /// vectorizer.ai API id (basic scheme)
    #[arg(long = "vectorizer-api-id", env = "VECTORIZER_API_ID", hide_env_values = true)]
    pub vectorizer_api_id: Option<String>,
    /// vectorizer.ai API secret (basic scheme)
    #[arg(long = "vectorizer-api-secret", env = "VECTORIZER_API_SECRET", hide_env_values = true)]
    pub vectorizer_api_secret: Option<String>,
    /// Credential scheme: bearer or basic
    #[arg(long = "vectorizer-auth", env = "VECTORIZER_AUTH", default_value_t = AuthScheme::Bearer)]
    pub vectorizer_auth: AuthScheme,
    /// Vectorization endpoint
    #[arg(long = "vectorizer-url", env = "LOGOMARK_VECTORIZER_URL", default_value = DEFAULT_VECTORIZER_URL)]
    pub vectorizer_url: String,
}

impl VectorizerArgs {
    pub fn client(&self) -> VectorizerAiClient {
        let auth = VectorizerAuth::resolve(
            self.vectorizer_auth,
            self.vectorizer_api_key.clone(),
            self.vectorizer_api_id.clone(),
            self.vectorizer_api_secret.clone(),
        );
        VectorizerAiClient::new(self.vectorizer_auth, auth).with_endpoint(&self.vectorizer_url)
    }

    /// The value that identifies the active scheme's credential.
    ///
    /// Bearer reports the API key. Basic reports the API id, and only when the secret is present too.
    pub fn active_credential(&self) -> Option<&str> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.trim().is_empty())
        }
        match self.vectorizer_auth {
            AuthScheme::Bearer => present(&self.vectorizer_api_key),
            AuthScheme::Basic => present(&self.vectorizer_api_secret).and(present(&self.vectorizer_api_id)),
        }
    }
}

impl Cli {
    pub fn key_report(&self) -> ApiKeyReport {
        ApiKeyReport::new(
            self.remove_bg.removebg_api_key.as_deref(),
            self.vectorizer.active_credential(),
        )
    }
}
