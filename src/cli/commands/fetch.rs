//! Fetch command - route one request through the worker

use crate::cli::args::FetchArgs;
use crate::cli::factory;
use crate::config::Config;
use crate::error::{SwCacheError, SwCacheResult};
use crate::net::{CacheMode, Method, Request, Response};
use crate::router::FetchDisposition;
use crate::worker::WorkerHooks;
use console::style;
use std::io::Write;
use tracing::debug;

/// Execute the fetch command
///
/// The summary line goes to stderr so the body can be piped from stdout.
pub async fn execute(args: FetchArgs, config: &Config) -> SwCacheResult<()> {
    let url = config.resolve(&args.target)?;
    let request = if args.navigate {
        Request::navigate(&url)
    } else {
        Request::get(&url)
    }
    .with_method(Method::parse(&args.method));

    let worker = factory::resume_worker(config).await?;
    let (response, source) = match worker.on_fetch(request.clone()).await? {
        FetchDisposition::PassThrough => {
            debug!("{} {} not intercepted, sending directly", request.method, url);
            let network = factory::create_network(config);
            let response = network.fetch(&request, CacheMode::Default).await?;
            (Some(response), "pass-through".to_string())
        }
        FetchDisposition::Respond(mut routed) => {
            // Keep the process alive until the cache write lands
            routed.settle().await;
            (routed.response, routed.source.to_string())
        }
    };

    let Some(response) = response else {
        eprintln!("{} {} {}", style("---").dim(), style(&source).yellow(), url);
        return Err(SwCacheError::network(url, "offline and not cached"));
    };

    print_summary(&response, &source);
    write_body(&response, &args).await
}

fn print_summary(response: &Response, source: &str) {
    let status = if response.is_ok() {
        style(response.status.to_string()).green()
    } else {
        style(response.status.to_string()).red()
    };
    eprintln!(
        "{} {} {} ({} bytes)",
        status,
        style(source).cyan(),
        response.url,
        response.body.len()
    );
}

async fn write_body(response: &Response, args: &FetchArgs) -> SwCacheResult<()> {
    match &args.output {
        Some(path) => tokio::fs::write(path, &response.body)
            .await
            .map_err(|e| SwCacheError::io(format!("writing {}", path.display()), e)),
        None => {
            let mut stdout = std::io::stdout().lock();
            stdout
                .write_all(&response.body)
                .and_then(|()| stdout.flush())
                .map_err(|e| SwCacheError::io("writing response body", e))
        }
    }
}
