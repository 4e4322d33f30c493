use once_cell::sync::Lazy;
use std::sync::Arc;
use std::time::Instant;
use tokio::runtime::{Handle, Runtime};

use super::{Artwork, ArtworkRef};
use crate::config::ServiceConfig;
use crate::error::ArtworkError;
use crate::platform::AssetSource;
use crate::utils::logger::{log_event, LogEvent, NetworkDetails, NetworkStatus};

/// Worker used when the caller is not inside a tokio runtime
static FETCH_RUNTIME: Lazy<Option<Runtime>> = Lazy::new(|| {
    match tokio::runtime::Builder::new_multi_thread()
        .worker_threads(1)
        .thread_name("artwork-fetch")
        .enable_all()
        .build()
    {
        Ok(runtime) => Some(runtime),
        Err(e) => {
            log::error!("Failed to start artwork worker runtime: {}", e);
            None
        }
    }
});

fn worker_handle() -> Option<Handle> {
    Handle::try_current()
        .ok()
        .or_else(|| FETCH_RUNTIME.as_ref().map(|rt| rt.handle().clone()))
}

/// Resolves [`ArtworkRef`]s into renderable [`Artwork`].
///
/// Bundled references resolve on the caller's thread. Remote references are
/// fetched and decoded on a tokio worker, one request per call with no retry.
pub struct CoverArtLoader {
    assets: Arc<dyn AssetSource>,
    /// Shared by every remote fetch; `None` if it could not be built
    client: Option<reqwest::Client>,
}

impl CoverArtLoader {
    pub fn new(assets: Arc<dyn AssetSource>, config: &ServiceConfig) -> Self {
        let client = match build_client(config) {
            Ok(client) => Some(client),
            Err(e) => {
                log::error!("Failed to create HTTP client for cover art: {}", e);
                None
            }
        };
        Self { assets, client }
    }

    /// Resolve a local reference synchronously.
    ///
    /// Remote references are rejected with [`ArtworkError::RequiresAsync`].
    pub fn resolve(&self, artwork: &ArtworkRef) -> Result<Artwork, ArtworkError> {
        match artwork {
            ArtworkRef::Bundled(id) => Ok(Artwork::Resource(*id)),
            ArtworkRef::BundledPath(path) => {
                let bytes = self.assets.open(path).map_err(|source| ArtworkError::Asset {
                    path: path.clone(),
                    source,
                })?;
                decode(&bytes)
            }
            ArtworkRef::Remote(_) => Err(ArtworkError::RequiresAsync),
        }
    }

    /// Resolve any reference and hand the result to `on_ready` exactly once.
    ///
    /// Remote fetches run on a worker and `on_ready` runs there too. Local
    /// references complete inline. Every failure is reported as `None`.
    pub fn resolve_async<F>(&self, artwork: ArtworkRef, on_ready: F)
    where
        F: FnOnce(Option<Artwork>) + Send + 'static,
    {
        let url = match artwork {
            ArtworkRef::Remote(url) => url,
            local => {
                let resolved = self
                    .resolve(&local)
                    .map_err(|e| log::warn!("Cover art {:?} unavailable: {}", local, e))
                    .ok();
                on_ready(resolved);
                return;
            }
        };

        let Some(handle) = worker_handle() else {
            log::warn!("Cover art {} skipped: {}", url, ArtworkError::NoRuntime);
            on_ready(None);
            return;
        };

        let Some(client) = self.client.clone() else {
            log::warn!("Cover art {} skipped: {}", url, ArtworkError::ClientUnavailable);
            on_ready(None);
            return;
        };

        handle.spawn(async move {
            match fetch_remote(&client, &url).await {
                Ok(artwork) => on_ready(Some(artwork)),
                Err(e) => {
                    log::warn!("Cover art {} unavailable: {}", url, e);
                    on_ready(None);
                }
            }
        });
    }
}

fn build_client(config: &ServiceConfig) -> Result<reqwest::Client, reqwest::Error> {
    let mut builder = reqwest::Client::builder()
        .timeout(config.fetch_timeout())
        .user_agent(config.user_agent.as_str());
    if !config.use_system_proxy {
        builder = builder.no_proxy();
    }
    builder.build()
}

async fn fetch_remote(client: &reqwest::Client, url: &str) -> Result<Artwork, ArtworkError> {
    let start = Instant::now();

    let outcome = async {
        let response = client.get(url).send().await?.error_for_status()?;
        let status = response.status().as_u16();
        let body = response.bytes().await?;
        Ok::<_, reqwest::Error>((status, body))
    }
    .await;

    let duration_ms = start.elapsed().as_millis() as u64;
    let (status, body) = match outcome {
        Ok(ok) => ok,
        Err(e) => {
            log_event(LogEvent::Network {
                operation: "artwork_fetch".to_string(),
                status: if e.is_timeout() {
                    NetworkStatus::Timeout
                } else {
                    NetworkStatus::Failed {
                        error: e.to_string(),
                    }
                },
                duration_ms,
                details: Some(NetworkDetails {
                    endpoint: url.to_string(),
                    status_code: e.status().map(|s| s.as_u16()),
                    bytes: None,
                }),
            });
            return Err(e.into());
        }
    };

    log_event(LogEvent::Network {
        operation: "artwork_fetch".to_string(),
        status: NetworkStatus::Success,
        duration_ms,
        details: Some(NetworkDetails {
            endpoint: url.to_string(),
            status_code: Some(status),
            bytes: Some(body.len()),
        }),
    });

    decode(&body)
}

fn decode(bytes: &[u8]) -> Result<Artwork, ArtworkError> {
    let image = image::load_from_memory(bytes)?;
    Ok(Artwork::Bitmap(Arc::new(image)))
}
