pub mod domain;
pub mod storage;
pub mod time;

pub mod config {
    use serde::Serialize;
    use std::path::PathBuf;

    const DEFAULT_REPORTS_DIR: &str = "analysis_reports";
    const DEFAULT_LLM_PROVIDER: &str = "google";
    const DEFAULT_DEEP_THINK_MODEL: &str = "gemini-2.0-flash";
    const DEFAULT_QUICK_THINK_MODEL: &str = "gemini-1.5-flash";
    const DEFAULT_BACKEND_URL: &str = "https://api.openai.com/v1";

    const KEY_PREVIEW_CHARS: usize = 12;

    #[derive(Debug, Clone)]
    pub struct Settings {
        pub reports_dir: PathBuf,
        pub llm_provider: String,
        pub deep_think_model: String,
        pub quick_think_model: String,
        pub backend_url: String,
        pub google_api_key: Option<String>,
        pub finnhub_api_key: Option<String>,
        pub dashscope_api_key: Option<String>,
        pub openai_api_key: Option<String>,
        pub sentry_dsn: Option<String>,
    }

    /// Presence of one API key, safe to show in a dashboard.
    #[derive(Debug, Clone, PartialEq, Eq, Serialize)]
    pub struct ApiKeyStatus {
        pub name: &'static str,
        pub label: &'static str,
        pub required: bool,
        pub configured: bool,
        pub preview: Option<String>,
    }

    impl Settings {
        pub fn from_env() -> anyhow::Result<Self> {
            Self::from_lookup(|key| std::env::var(key).ok())
        }

        pub fn from_lookup<F>(lookup: F) -> anyhow::Result<Self>
        where
            F: Fn(&str) -> Option<String>,
        {
            let get = |key: &str| {
                lookup(key)
                    .map(|v| v.trim().to_string())
                    .filter(|v| !v.is_empty())
            };
            let or_default = |key: &str, default: &str| get(key).unwrap_or_else(|| default.to_string());

            Ok(Self {
                reports_dir: PathBuf::from(or_default("REPORTS_DIR", DEFAULT_REPORTS_DIR)),
                llm_provider: or_default("LLM_PROVIDER", DEFAULT_LLM_PROVIDER),
                deep_think_model: or_default("DEEP_THINK_MODEL", DEFAULT_DEEP_THINK_MODEL),
                quick_think_model: or_default("QUICK_THINK_MODEL", DEFAULT_QUICK_THINK_MODEL),
                backend_url: or_default("LLM_BACKEND_URL", DEFAULT_BACKEND_URL),
                google_api_key: get("GOOGLE_API_KEY"),
                finnhub_api_key: get("FINNHUB_API_KEY"),
                dashscope_api_key: get("DASHSCOPE_API_KEY"),
                openai_api_key: get("OPENAI_API_KEY"),
                sentry_dsn: get("SENTRY_DSN"),
            })
        }

        /// The model recorded as `llm_model` in analysis results.
        pub fn llm_model(&self) -> &str {
            &self.deep_think_model
        }

        pub fn api_key_statuses(&self) -> Vec<ApiKeyStatus> {
            vec![
                key_status("GOOGLE_API_KEY", "Google AI", true, &self.google_api_key),
                key_status("FINNHUB_API_KEY", "Financial data", true, &self.finnhub_api_key),
                key_status("DASHSCOPE_API_KEY", "DashScope", false, &self.dashscope_api_key),
                key_status("OPENAI_API_KEY", "OpenAI", false, &self.openai_api_key),
            ]
        }
    }

    fn key_status(
        name: &'static str,
        label: &'static str,
        required: bool,
        value: &Option<String>,
    ) -> ApiKeyStatus {
        ApiKeyStatus {
            name,
            label,
            required,
            configured: value.is_some(),
            preview: value.as_deref().map(mask_key),
        }
    }

    /// First few characters of a secret followed by `...`.
    pub fn mask_key(key: &str) -> String {
        let head: String = key.chars().take(KEY_PREVIEW_CHARS).collect();
        format!("{head}...")
    }

}
