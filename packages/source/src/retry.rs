//! HTTP retry helper for transient upstream errors.
//!
//! Provider clients call [`send_json`] instead of
//! `reqwest::RequestBuilder::send()` directly so that every request gets
//! automatic retry with exponential backoff for timeouts, connection
//! resets, HTTP 429, and HTTP 5xx.
//!
//! ```ignore
//! let body = retry::send_json(|| client.get(&url).query(&params)).await?;
//! ```

use std::time::Duration;

use crate::SourceError;

/// Maximum retry attempts for transient HTTP errors.
///
/// With exponential backoff (2s, 4s, 8s) the total wait before giving up
/// is 14 seconds per logical request.
const MAX_RETRIES: u32 = 3;

/// Maximum full re-fetch attempts when a response body arrives but
/// cannot be decoded as JSON (truncated or garbled response).
const MAX_BODY_RETRIES: u32 = 2;

/// Maximum length of the body preview included in error logs.
const BODY_PREVIEW_LEN: usize = 300;

/// Sends an HTTP request and parses the response body as JSON.
///
/// The `build_request` closure is called on each attempt to construct a
/// fresh [`reqwest::RequestBuilder`], since builders are consumed by
/// `.send()`.
///
/// Retries connection errors, timeouts, HTTP 429, and HTTP 5xx up to
/// [`MAX_RETRIES`] times with exponential backoff. If the body arrives
/// but fails to parse, the whole request is re-fetched up to
/// [`MAX_BODY_RETRIES`] times. HTTP 4xx other than 429 is permanent and
/// never retried.
///
/// # Errors
///
/// Returns [`SourceError`] if the request fails after all retries, the
/// server returns a non-retryable status, or the body cannot be parsed
/// as JSON after all body-decode retries.
#[allow(clippy::future_not_send)]
pub async fn send_json<F>(build_request: F) -> Result<serde_json::Value, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    for body_attempt in 0..=MAX_BODY_RETRIES {
        let response = send_inner(&build_request, MAX_RETRIES).await?;

        let url = response.url().to_string();
        let status = response.status();

        match response.text().await {
            Ok(text) => match serde_json::from_str(&text) {
                Ok(value) => return Ok(value),
                Err(json_err) => {
                    let preview = body_preview(&text);
                    if body_attempt < MAX_BODY_RETRIES {
                        let delay = Duration::from_secs(1u64 << (body_attempt + 1));
                        log::warn!(
                            "JSON parse failed (body retry {}/{MAX_BODY_RETRIES}), \
                             re-fetching in {delay:?}: url={url} status={status} \
                             error={json_err} preview={preview}",
                            body_attempt + 1,
                        );
                        tokio::time::sleep(delay).await;
                        continue;
                    }
                    log::error!(
                        "JSON parse failed after {MAX_BODY_RETRIES} retries, giving up: \
                         url={url} status={status} error={json_err} preview={preview}",
                    );
                    return Err(SourceError::Upstream {
                        message: format!(
                            "JSON parse failed: {json_err} (status={status}, \
                             received {} bytes)",
                            text.len()
                        ),
                    });
                }
            },
            Err(e) => {
                if body_attempt < MAX_BODY_RETRIES {
                    let delay = Duration::from_secs(1u64 << (body_attempt + 1));
                    log::warn!(
                        "Body read failed (body retry {}/{MAX_BODY_RETRIES}), \
                         re-fetching in {delay:?}: url={url} status={status} error={e}",
                        body_attempt + 1,
                    );
                    tokio::time::sleep(delay).await;
                    continue;
                }
                log::error!(
                    "Body read failed after {MAX_BODY_RETRIES} retries, giving up: \
                     url={url} status={status} error={e}",
                );
                return Err(SourceError::Http(e));
            }
        }
    }

    unreachable!("send_json body-decode retry loop exited without returning")
}

/// Core retry loop for [`send_json`].
///
/// Returns the successful [`reqwest::Response`] (status 2xx or 3xx).
#[allow(clippy::future_not_send)]
async fn send_inner<F>(
    build_request: &F,
    max_retries: u32,
) -> Result<reqwest::Response, SourceError>
where
    F: Fn() -> reqwest::RequestBuilder,
{
    let mut last_error: Option<SourceError> = None;

    for attempt in 0..=max_retries {
        if attempt > 0 {
            let delay = Duration::from_secs(1u64 << attempt);
            log::warn!("  retry {attempt}/{max_retries} in {delay:?}...");
            tokio::time::sleep(delay).await;
        }

        match build_request().send().await {
            Err(e) => {
                if is_transient(&e) && attempt < max_retries {
                    log::warn!("  transient error: {e}");
                    last_error = Some(SourceError::Http(e));
                    continue;
                }
                return Err(SourceError::Http(e));
            }
            Ok(response) => {
                let status = response.status();

                // 429 and 5xx are retryable; other 4xx is permanent.
                if status == reqwest::StatusCode::TOO_MANY_REQUESTS
                    || status.is_server_error()
                {
                    if attempt < max_retries {
                        log::warn!("  HTTP {status}");
                        last_error = Some(SourceError::Upstream {
                            message: format!("HTTP {status}"),
                        });
                        continue;
                    }
                    return Err(SourceError::Upstream {
                        message: format!("HTTP {status} after {max_retries} retries"),
                    });
                }

                if status.is_client_error() {
                    return Err(SourceError::Upstream {
                        message: format!("HTTP {status}"),
                    });
                }

                return Ok(response);
            }
        }
    }

    Err(last_error.unwrap_or_else(|| SourceError::Upstream {
        message: "request failed after all retries".to_string(),
    }))
}

/// Returns `true` if the error is likely transient and worth retrying.
fn is_transient(e: &reqwest::Error) -> bool {
    e.is_timeout() || e.is_connect() || e.is_body() || e.is_decode() || e.is_request()
}

/// Truncates an unparseable body to at most [`BODY_PREVIEW_LEN`] bytes
/// for logging, backing off to a char boundary so multi-byte text (an
/// upstream HTML error page, say) never splits mid-character.
fn body_preview(text: &str) -> String {
    if text.len() <= BODY_PREVIEW_LEN {
        return text.to_string();
    }
    let mut cut = BODY_PREVIEW_LEN;
    while !text.is_char_boundary(cut) {
        cut -= 1;
    }
    format!("{}...", &text[..cut])
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn short_bodies_preview_unchanged() {
        assert_eq!(body_preview("{\"truncated\":"), "{\"truncated\":");
    }

    #[test]
    fn long_ascii_bodies_are_cut_at_the_limit() {
        let body = "x".repeat(BODY_PREVIEW_LEN + 40);
        let preview = body_preview(&body);
        assert_eq!(preview.len(), BODY_PREVIEW_LEN + 3);
        assert!(preview.ends_with("..."));
    }

    #[test]
    fn multibyte_char_straddling_the_limit_is_not_split() {
        // A 314-byte body whose 'é' occupies bytes 299..301, putting
        // the cut point inside the character.
        let mut body = "x".repeat(BODY_PREVIEW_LEN - 1);
        body.push('é');
        body.push_str(&"y".repeat(13));
        assert_eq!(body.len(), 314);

        let preview = body_preview(&body);
        assert_eq!(preview, format!("{}...", "x".repeat(BODY_PREVIEW_LEN - 1)));
    }

    #[test]
    fn boundary_exactly_at_the_limit_keeps_the_char() {
        let mut body = "x".repeat(BODY_PREVIEW_LEN - 2);
        body.push('é');
        body.push_str(&"y".repeat(10));

        let preview = body_preview(&body);
        assert!(preview.ends_with("é..."));
        assert_eq!(preview.len(), BODY_PREVIEW_LEN + 3);
    }
}
