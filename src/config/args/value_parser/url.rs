use url::Url;

const INVALID_ENDPOINT_SCHEME: &str = "Endpoint URL scheme must be https:// or http://";

/// Clap value parser for `--endpoint-url` (e.g. a LocalStack endpoint).
pub fn check_endpoint_url(endpoint_url: &str) -> Result<String, String> {
    let parsed = Url::parse(endpoint_url).map_err(|e| e.to_string())?;

    match parsed.scheme() {
        "https" | "http" => Ok(endpoint_url.to_string()),
        _ => Err(INVALID_ENDPOINT_SCHEME.to_string()),
    }
}
