use std::time::Duration;
use std::time::Instant;
use zenstack_common::types::HttpObservation;

/// HTTP liveness prober around a shared `reqwest::Client`.
///
/// One instance is built at startup and reused across all probes so
/// connection pools survive between sweeps; each request still carries
/// its own deadline.
#[derive(Clone)]
pub struct HttpProber {
    client: reqwest::Client,
}

impl HttpProber {
    pub fn new() -> Self {
        Self {
            client: reqwest::Client::new(),
        }
    }

    /// Probe `https://domain` first, then `http://domain` on failure.
    ///
    /// Live means some attempt returned a status in [200, 400) after
    /// redirects. `status_code` is 0 when both attempts failed, and the
    /// response time covers the wall clock from the first attempt.
    pub async fn probe(&self, domain: &str, timeout: Duration) -> HttpObservation {
        let start = Instant::now();

        for url in [format!("https://{domain}"), format!("http://{domain}")] {
            match self.client.get(&url).timeout(timeout).send().await {
                Ok(resp) => {
                    let status_code = resp.status().as_u16() as i32;
                    let response_time_ms = start.elapsed().as_millis() as i32;
                    return HttpObservation {
                        domain: domain.to_string(),
                        is_live: (200..400).contains(&status_code),
                        status_code,
                        response_time_ms,
                    };
                }
                Err(e) => {
                    tracing::debug!(domain, url = %url, error = %e, "HTTP probe attempt failed");
                }
            }
        }

        HttpObservation {
            domain: domain.to_string(),
            is_live: false,
            status_code: 0,
            response_time_ms: start.elapsed().as_millis() as i32,
        }
    }
}

impl Default for HttpProber {
    fn default() -> Self {
        Self::new()
    }
}
