use crate::ai::{EdgeFunctionClient, TextGenerator, DEFAULT_FUNCTION};
use clap::Parser;
use std::path::PathBuf;
use tracing::{info, warn};

/// Command-line arguments for maestrod
#[derive(Parser, Debug, Clone)]
#[command(name = "maestrod")]
#[command(about = "Gradebook sidecar speaking JSON lines on stdin/stdout")]
#[command(version)]
pub struct Args {
    /// Workspace directory to open at startup
    #[arg(long, env = "MAESTRO_WORKSPACE")]
    pub workspace: Option<PathBuf>,

    /// Base URL of the text generation backend
    #[arg(long, env = "MAESTRO_AI_URL")]
    pub ai_url: Option<String>,

    /// Key sent with every AI request
    #[arg(long, env = "MAESTRO_AI_KEY", hide_env_values = true)]
    pub ai_key: Option<String>,

    /// Name of the backend function that generates text
    #[arg(long, default_value = DEFAULT_FUNCTION, env = "MAESTRO_AI_FUNCTION")]
    pub ai_function: String,
}

impl Args {
    /// `None` means local-only mode: AI methods answer `ai_unavailable`.
    pub fn ai_client(&self) -> Option<Box<dyn TextGenerator>> {
        let url = self.ai_url.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let key = self.ai_key.as_deref().map(str::trim).filter(|s| !s.is_empty());
        let (Some(url), Some(key)) = (url, key) else {
            info!("AI backend not configured; running local-only");
            return None;
        };
        match EdgeFunctionClient::new(url, key, &self.ai_function) {
            Ok(client) => {
                info!(endpoint = %client.endpoint(), "AI backend configured");
                Some(Box::new(client))
            }
            Err(e) => {
                warn!(error = %format!("{e:#}"), "AI backend unusable; running local-only");
                None
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_local_only() {
        let args = Args::try_parse_from(["maestrod", "--ai-url", "https://x.example"])
            .expect("args");
        assert_eq!(args.ai_function, "generate-ai-content");
        if std::env::var_os("MAESTRO_AI_KEY").is_none() {
            assert!(args.ai_client().is_none());
        }
    }

    #[test]
    fn url_and_key_enable_the_client() {
        let args = Args::try_parse_from([
            "maestrod",
            "--workspace",
            "/tmp/maestro-ws",
            "--ai-url",
            "https://x.example",
            "--ai-key",
            "secret",
            "--ai-function",
            "draft",
        ])
        .expect("args");
        assert_eq!(args.workspace, Some(PathBuf::from("/tmp/maestro-ws")));
        assert!(args.ai_client().is_some());
    }
}
