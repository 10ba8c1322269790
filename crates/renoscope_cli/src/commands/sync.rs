//! Sync command implementation.

use super::open_store;
use renoscope_sync_engine::{
    HttpClient, HttpRequest, HttpResponse, MediaAdapter, Method, PropertyAdapter, RestClient,
    ScopeItemAdapter, SyncAllOptions, SyncBatchResult, SyncEngine, SyncOptions, SyncProgress,
};
use reqwest::blocking::Client;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Arguments of the sync command.
#[derive(Debug, Clone)]
pub struct SyncArgs {
    /// Server base URL.
    pub server: String,
    /// Bearer token.
    pub token: Option<String>,
    /// Models to sync, in order; all when empty.
    pub models: Vec<String>,
    /// Skip the push phase.
    pub pull_only: bool,
    /// Skip the pull phase.
    pub push_only: bool,
    /// Request timeout.
    pub timeout_secs: u64,
}

/// Blocking HTTP client backed by reqwest.
pub struct ReqwestClient {
    client: Client,
}

impl ReqwestClient {
    /// Creates a client with the given request timeout.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }
}

impl HttpClient for ReqwestClient {
    fn execute(&self, request: &HttpRequest) -> Result<HttpResponse, String> {
        let method = match request.method {
            Method::Get => reqwest::Method::GET,
            Method::Post => reqwest::Method::POST,
            Method::Put => reqwest::Method::PUT,
            Method::Delete => reqwest::Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = &request.body {
            builder = builder.body(body.clone());
        }

        let response = builder.send().map_err(|e| e.to_string())?;
        let status = response.status().as_u16();
        let body = response.bytes().map_err(|e| e.to_string())?.to_vec();
        Ok(HttpResponse { status, body })
    }
}

/// Runs the sync command.
pub fn run(path: &Path, args: &SyncArgs, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let store = Arc::new(open_store(path)?);

    let mut client = RestClient::new(
        args.server.as_str(),
        ReqwestClient::new(Duration::from_secs(args.timeout_secs))?,
    );
    if let Some(token) = &args.token {
        client = client.with_token(token.as_str());
    }

    let engine = SyncEngine::new(client);
    engine.register_adapter(PropertyAdapter::new(Arc::clone(&store)));
    engine.register_adapter(ScopeItemAdapter::new(Arc::clone(&store)));
    engine.register_adapter(MediaAdapter::new(Arc::clone(&store)));

    let batches = engine.sync_all(options(args))?;
    store.flush()?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&batches)?);
        }
        _ => {
            print_text_output(&batches);
        }
    }

    let failed = batches.iter().filter(|b| !b.success).count();
    if failed > 0 {
        return Err(format!("{failed} model(s) had failures").into());
    }
    Ok(())
}

fn options(args: &SyncArgs) -> SyncAllOptions {
    let sync = SyncOptions {
        pull_only: args.pull_only,
        push_only: args.push_only,
    };
    let mut options = SyncAllOptions::new()
        .with_sync_options(sync)
        .on_progress(|progress: &SyncProgress| {
            tracing::info!(
                model = %progress.entity_name,
                completed = progress.completed,
                total = progress.total,
                "model finished"
            );
        });
    if !args.models.is_empty() {
        options = options.with_models(args.models.iter().cloned());
    }
    options
}

fn print_text_output(batches: &[SyncBatchResult]) {
    println!("Sync Results");
    println!("============");
    println!();
    for batch in batches {
        let marker = if batch.success { "ok" } else { "FAILED" };
        println!("[{marker:>6}] {} ({} ms)", batch.summary(), batch.duration_ms);
        for result in batch.results.iter().filter(|r| !r.success) {
            let local = result
                .local_id
                .map_or_else(|| "-".to_string(), |id| id.to_string());
            println!(
                "         {} {} local={} remote={}: {}",
                result.direction,
                result.operation,
                local,
                result.remote_id.as_deref().unwrap_or("-"),
                result.error.as_deref().unwrap_or("unknown error")
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args() -> SyncArgs {
        SyncArgs {
            server: "https://api.example.com".into(),
            token: None,
            models: Vec::new(),
            pull_only: false,
            push_only: false,
            timeout_secs: 30,
        }
    }

    #[test]
    fn options_default_to_every_model() {
        let options = options(&args());
        assert!(options.models.is_none());
        assert!(options.on_progress.is_some());
        assert!(!options.sync.pull_only && !options.sync.push_only);
    }

    #[test]
    fn options_keep_requested_order() {
        let options = options(&SyncArgs {
            models: vec!["media".into(), "properties".into()],
            pull_only: true,
            ..args()
        });
        assert_eq!(
            options.models,
            Some(vec!["media".to_string(), "properties".to_string()])
        );
        assert!(options.sync.pull_only);
    }
}
