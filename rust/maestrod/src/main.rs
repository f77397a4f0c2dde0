mod ai;
mod backup;
mod calc;
mod config;
mod db;
mod error;
mod ipc;
mod model;
mod repo;
mod seed;

use clap::Parser;
use serde_json::json;
use std::io::{self, BufRead, Write};
use tracing::{error, info, warn};
use tracing_subscriber::layer::SubscriberExt;
use tracing_subscriber::util::SubscriberInitExt;
use tracing_subscriber::EnvFilter;

const LOG_ENV: &str = "MAESTRO_LOG";

fn init_tracing() {
    // stdout carries the protocol; logs go to stderr.
    tracing_subscriber::registry()
        .with(EnvFilter::try_from_env(LOG_ENV).unwrap_or_else(|_| "maestrod=info".into()))
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(io::stderr)
                .with_target(false),
        )
        .init();
}

fn main() {
    init_tracing();
    let args = config::Args::parse();
    info!(version = env!("CARGO_PKG_VERSION"), "maestrod starting");

    let mut state = ipc::AppState {
        workspace: None,
        repo: None,
        ai: args.ai_client(),
    };

    if let Some(path) = args.workspace.as_ref() {
        let req = ipc::Request {
            id: "startup".to_string(),
            method: "workspace.select".to_string(),
            params: json!({ "path": path.to_string_lossy() }),
        };
        let resp = ipc::handle_request(&mut state, req);
        if resp.get("ok").and_then(|v| v.as_bool()) != Some(true) {
            warn!(workspace = %path.display(), response = %resp, "startup workspace not opened");
        }
    }

    let stdin = io::stdin();
    let mut stdout = io::stdout();

    for line in stdin.lock().lines() {
        let line = match line {
            Ok(v) => v,
            Err(e) => {
                error!(error = %e, "stdin read failed");
                break;
            }
        };
        if line.trim().is_empty() {
            continue;
        }

        let req: ipc::Request = match serde_json::from_str(&line) {
            Ok(v) => v,
            Err(e) => {
                // No id to echo back.
                let reply = json!({
                    "ok": false,
                    "error": { "code": "bad_json", "message": e.to_string() }
                });
                let _ = writeln!(stdout, "{}", reply);
                let _ = stdout.flush();
                continue;
            }
        };

        let resp = ipc::handle_request(&mut state, req);
        let _ = writeln!(
            stdout,
            "{}",
            serde_json::to_string(&resp).unwrap_or_else(|_| "{\"ok\":false}".to_string())
        );
        let _ = stdout.flush();
    }

    info!("stdin closed; exiting");
}
