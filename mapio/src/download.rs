use anyhow::{Context, Result};

use maputil::prettyprint_usize;

/// Downloads bytes from a URL. If `post_body` is present, the request is a POST with that body;
/// otherwise it's a GET. This must be called with a tokio runtime somewhere. There are no retries;
/// any transport or HTTP status failure is returned.
pub async fn download_bytes<I: AsRef<str>>(url: I, post_body: Option<String>) -> Result<Vec<u8>> {
    let url = url.as_ref();
    info!("Downloading {}", url);
    let client = reqwest::Client::new();
    let req = if let Some(body) = post_body {
        client.post(url).body(body)
    } else {
        client.get(url)
    };
    let mut resp = req
        .send()
        .await
        .with_context(|| format!("connecting to {}", url))?;
    resp.error_for_status_ref()
        .with_context(|| format!("downloading {}", url))?;

    let total_size = resp.content_length().map(|x| x as usize);
    let mut bytes = Vec::new();
    while let Some(chunk) = resp
        .chunk()
        .await
        .with_context(|| format!("reading response from {}", url))?
    {
        bytes.extend_from_slice(&chunk);
        if let Some(n) = total_size {
            debug!(
                "{:.2}% ({} / {} bytes)",
                (bytes.len() as f64) / (n as f64) * 100.0,
                prettyprint_usize(bytes.len()),
                prettyprint_usize(n)
            );
        }
    }
    info!("Got {} bytes from {}", prettyprint_usize(bytes.len()), url);
    Ok(bytes)
}
