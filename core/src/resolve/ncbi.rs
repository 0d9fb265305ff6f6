//! Fetching refSNP records from the NCBI Variation Services.

use std::{
    io, thread,
    time::{Duration, Instant},
};

use reqwest::{blocking::Client, StatusCode};

use super::{refsnp, Fetch, Resolution};

/// The refSNP endpoint of the NCBI Variation Services.
pub const DEFAULT_URL: &str = "https://api.ncbi.nlm.nih.gov/variation/v0/refsnp";

/// The default minimum delay between requests.
pub const DEFAULT_DELAY: Duration = Duration::from_millis(350);

const TIMEOUT: Duration = Duration::from_secs(20);

/// A client for the NCBI Variation Services refSNP endpoint.
///
/// Requests are rate limited: consecutive requests are spaced by at least the configured delay.
/// An identifier unknown to dbSNP (HTTP 404) is not an error, but fetches as `None`.
#[derive(Debug)]
pub struct VariationServices {
    client: Client,
    url: String,
    delay: Duration,
    last_request: Option<Instant>,
}

impl VariationServices {
    /// Creates a new client for the default endpoint.
    pub fn new() -> io::Result<Self> {
        let client = Client::builder()
            .timeout(TIMEOUT)
            .user_agent(concat!(env!("CARGO_PKG_NAME"), "/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(other)?;

        Ok(Self::with_client(client))
    }

    /// Creates a new client for the default endpoint, sending requests with the provided client.
    pub fn with_client(client: Client) -> Self {
        Self {
            client,
            url: String::from(DEFAULT_URL),
            delay: DEFAULT_DELAY,
            last_request: None,
        }
    }

    /// Sets the minimum delay between requests.
    pub fn set_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }

    /// Sets the endpoint URL, which the rsID number is appended to.
    pub fn set_url<S>(mut self, url: S) -> Self
    where
        S: Into<String>,
    {
        self.url = url.into();
        self
    }

    fn wait(&self) {
        if let Some(remaining) = self
            .last_request
            .and_then(|last| self.delay.checked_sub(last.elapsed()))
        {
            thread::sleep(remaining);
        }
    }
}

impl Fetch for VariationServices {
    fn fetch(&mut self, identifier: &str) -> io::Result<Option<Resolution>> {
        let number = identifier.strip_prefix("rs").unwrap_or(identifier);
        let url = format!("{}/{number}", self.url.trim_end_matches('/'));

        self.wait();
        log::trace!("Requesting '{url}'.");
        let response = self.client.get(&url).send();
        self.last_request = Some(Instant::now());

        let response = response.map_err(other)?;

        match response.status() {
            StatusCode::NOT_FOUND => {
                log::debug!("Identifier '{identifier}' not found in dbSNP.");
                Ok(None)
            }
            status if status.is_success() => {
                let s = response.text().map_err(other)?;

                refsnp::parse(identifier, &s)
                    .map(Some)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))
            }
            status => Err(other(format!("request for '{identifier}' failed with HTTP {status}"))),
        }
    }
}

fn other<E>(e: E) -> io::Error
where
    E: Into<Box<dyn std::error::Error + Send + Sync>>,
{
    io::Error::new(io::ErrorKind::Other, e)
}

#[cfg(test)]
mod tests {
    use super::*;

    use std::{
        io::{Read as _, Write as _},
        net::TcpListener,
    };

    const RECORD: &str = r#"{"refsnp_id": "7412", "primary_snapshot_data": {"placements_with_allele": [
        {"seq_id": "NC_000019.10", "is_ptlp": true, "alleles": [
            {"allele": {"spdi": {"position": 44908821, "deleted_sequence": "C", "inserted_sequence": "C"}}},
            {"allele": {"spdi": {"position": 44908821, "deleted_sequence": "C", "inserted_sequence": "T"}}}
        ]}
    ]}}"#;

    fn client(url: String, delay: Duration) -> Result<VariationServices, reqwest::Error> {
        let client = Client::builder().no_proxy().build()?;

        Ok(VariationServices::with_client(client)
            .set_url(url)
            .set_delay(delay))
    }

    // Serves one canned response per expected request, keyed by the requested path.
    fn serve(requests: usize) -> io::Result<String> {
        let listener = TcpListener::bind("127.0.0.1:0")?;
        let url = format!("http://{}/refsnp", listener.local_addr()?);

        thread::spawn(move || {
            for stream in listener.incoming().take(requests) {
                let Ok(mut stream) = stream else { break };

                let mut request = Vec::new();
                let mut buf = [0; 1024];
                while !request.windows(4).any(|w| w == b"\r\n\r\n") {
                    match stream.read(&mut buf) {
                        Ok(0) | Err(_) => break,
                        Ok(n) => request.extend_from_slice(&buf[..n]),
                    }
                }

                let request = String::from_utf8_lossy(&request);
                let (status, body) = if request.starts_with("GET /refsnp/7412 ") {
                    ("200 OK", RECORD)
                } else if request.starts_with("GET /refsnp/500 ") {
                    ("500 Internal Server Error", "")
                } else {
                    ("404 Not Found", r#"{"error": "not found"}"#)
                };

                let _ = write!(
                    stream,
                    "HTTP/1.1 {status}\r\nContent-Type: application/json\r\n\
                    Content-Length: {}\r\nConnection: close\r\n\r\n{body}",
                    body.len()
                );
            }
        });

        Ok(url)
    }

    #[test]
    fn test_fetch_found() -> Result<(), Box<dyn std::error::Error>> {
        let mut client = client(serve(1)?, Duration::ZERO)?;

        let resolution = client.fetch("rs7412")?;

        assert_eq!(
            resolution.as_ref().and_then(Resolution::locus),
            Some(crate::Locus::new("chr19", 44908822))
        );
        assert_eq!(resolution.and_then(|r| r.reference).as_deref(), Some("C"));

        Ok(())
    }

    #[test]
    fn test_fetch_not_found_is_none() -> Result<(), Box<dyn std::error::Error>> {
        let mut client = client(serve(1)?, Duration::ZERO)?;

        assert_eq!(client.fetch("rs999999999")?, None);

        Ok(())
    }

    #[test]
    fn test_fetch_server_error() -> Result<(), Box<dyn std::error::Error>> {
        let mut client = client(serve(1)?, Duration::ZERO)?;

        assert!(client.fetch("rs500").is_err());

        Ok(())
    }

    #[test]
    fn test_fetch_waits_between_requests() -> Result<(), Box<dyn std::error::Error>> {
        let delay = Duration::from_millis(200);
        let mut client = client(serve(2)?, delay)?;

        let start = Instant::now();
        client.fetch("rs1")?;
        let first = start.elapsed();
        client.fetch("rs2")?;

        assert!(start.elapsed() >= first + delay);

        Ok(())
    }
}
