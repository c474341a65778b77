use crate::errors::GatewayError;
use crate::transport::RawResponse;
use hyper::body::Bytes;

/// Upper bound on how much of a failed upstream body is kept for diagnostics
const SNIPPET_MAX_CHARS: usize = 256;

/// Passes the body of a 200 response through unchanged; anything else becomes
/// [`GatewayError::UpstreamStatus`] and must not be parsed.
pub fn validate_status(response: RawResponse) -> Result<Bytes, GatewayError> {
    if response.status == 200 {
        return Ok(response.body);
    }

    Err(GatewayError::UpstreamStatus {
        code: response.status,
        snippet: snippet(&response.body),
    })
}

fn snippet(body: &[u8]) -> String {
    let text = String::from_utf8_lossy(body);
    let mut chars = text.chars();
    let mut snippet: String = chars.by_ref().take(SNIPPET_MAX_CHARS).collect();
    if chars.next().is_some() {
        snippet.push('…');
    }
    snippet
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(status: u16, body: &str) -> RawResponse {
        RawResponse {
            status,
            body: Bytes::from(body.to_string()),
        }
    }

    #[test]
    fn test_ok_passes_body_through() {
        let body = validate_status(response(200, r#"{"items":[]}"#)).unwrap();
        assert_eq!(body.as_ref(), br#"{"items":[]}"#);
    }

    #[test]
    fn test_non_200_short_circuits() {
        let err = validate_status(response(404, "page not found")).unwrap_err();
        assert_eq!(
            err,
            GatewayError::UpstreamStatus {
                code: 404,
                snippet: "page not found".into(),
            }
        );

        // Other 2xx codes are not the expected shape either
        assert!(validate_status(response(204, "")).is_err());
    }

    #[test]
    fn test_snippet_is_truncated() {
        let long = "é".repeat(SNIPPET_MAX_CHARS + 10);
        let GatewayError::UpstreamStatus { snippet, .. } =
            validate_status(response(500, &long)).unwrap_err()
        else {
            panic!("expected upstream status error");
        };

        assert_eq!(snippet.chars().count(), SNIPPET_MAX_CHARS + 1);
        assert!(snippet.ends_with('…'));
    }
}
