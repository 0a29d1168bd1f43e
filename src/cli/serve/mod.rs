//! Metadata HTTP server.
//!
//! Request handling is synchronous tiny_http over a small thread pool;
//! only the dynamic-source query suspends, driven by a tokio runtime the
//! serve command owns. The two indexes are built once before the accept
//! loop starts and shared read-only across all request threads.

mod response;

use crate::{
    config::ServiceConfig,
    core::{is_shutdown, register_server},
    log,
    metadata::index::StaticIndex,
    metadata::resolver::{Resolution, Resolver},
    routes::RouteRegistry,
    source::{DynamicSource, GatewayClient},
};
use anyhow::{Context, Result};
use std::{net::SocketAddr, sync::Arc};
use tiny_http::{Request, Server};

/// Maximum number of port binding attempts.
const MAX_PORT_RETRIES: u16 = 10;

/// Load the indexes, bind the server, and run the request loop (blocking).
pub fn run(config: &ServiceConfig) -> Result<()> {
    let routes = Arc::new(
        RouteRegistry::load(&config.metadata.routes)
            .context("failed to load route registry")?,
    );
    let index = Arc::new(
        StaticIndex::load(&config.metadata.base_dir)
            .context("failed to load static metadata index")?,
    );
    log!(
        "serve";
        "{} route(s), {} static record(s)",
        routes.len(),
        index.record_count()
    );
    if config.dynamic.gateways.is_empty() {
        log!("serve"; "no dynamic gateways configured, serving static tier only");
    }

    let source = GatewayClient::new(&config.dynamic)?;
    let resolver = Arc::new(Resolver::new(routes, index, source));

    let (server, addr) = bind_with_retry(config.serve.interface, config.serve.port)?;
    let server = Arc::new(server);
    register_server(Arc::clone(&server));
    log!("serve"; "http://{}", addr);

    // The runtime only drives gateway round trips; request threads block on
    // their own resolution via the handle
    let runtime = tokio::runtime::Builder::new_multi_thread()
        .worker_threads(2)
        .enable_all()
        .build()
        .context("failed to create tokio runtime")?;
    let handle = runtime.handle().clone();

    // Thread pool so one slow gateway call doesn't block other requests
    let pool = rayon::ThreadPoolBuilder::new()
        .num_threads(4)
        .build()
        .context("failed to create thread pool")?;

    for request in server.incoming_requests() {
        let resolver = Arc::clone(&resolver);
        let handle = handle.clone();
        pool.spawn(move || {
            if let Err(e) = handle_request(request, &resolver, &handle) {
                log!("serve"; "request error: {e}");
            }
        });
    }

    // incoming_requests() only returns after unblock() from the Ctrl+C handler
    log!("serve"; "shutting down");
    Ok(())
}

/// Bind to the specified interface and port, with automatic port retry.
fn bind_with_retry(interface: std::net::IpAddr, base_port: u16) -> Result<(Server, SocketAddr)> {
    for offset in 0..MAX_PORT_RETRIES {
        let port = base_port.saturating_add(offset);
        let addr = SocketAddr::new(interface, port);

        match Server::http(addr) {
            Ok(server) => {
                if offset > 0 {
                    log!("serve"; "port {} in use, using {} instead", base_port, port);
                }
                return Ok((server, addr));
            }
            Err(_) if offset + 1 < MAX_PORT_RETRIES => continue,
            Err(e) => {
                return Err(anyhow::anyhow!(
                    "Failed to bind after {} attempts (ports {}-{}): {}",
                    MAX_PORT_RETRIES,
                    base_port,
                    port,
                    e
                ));
            }
        }
    }
    unreachable!()
}

/// Handle a single HTTP request
fn handle_request<S: DynamicSource>(
    request: Request,
    resolver: &Resolver<S>,
    handle: &tokio::runtime::Handle,
) -> Result<()> {
    if is_shutdown() {
        return response::respond_unavailable(request);
    }

    let url = request.url().to_string();
    let path = url.split('?').next().unwrap_or(&url);

    if path == "/health" {
        return response::respond_health(request);
    }

    let Some(metadata_path) = path.strip_prefix("/metadata/") else {
        return response::respond_not_found(request);
    };
    let metadata_path = metadata_path.to_string();

    let source_tag = header_value(&request, "x-bc-source");

    match handle.block_on(resolver.resolve(source_tag.as_deref(), &metadata_path)) {
        Resolution::Found(record) => response::respond_json(request, &record),
        Resolution::NotFound => response::respond_not_found(request),
        Resolution::BadRequest(message) => response::respond_bad_request(request, message),
    }
}

/// Extract a header value from the request, case-insensitively.
fn header_value(request: &Request, name: &str) -> Option<String> {
    request
        .headers()
        .iter()
        .find(|h| h.field.as_str().as_str().eq_ignore_ascii_case(name))
        .map(|h| h.value.to_string())
}
