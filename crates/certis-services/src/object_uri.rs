//! Object URI grammar: `provider ":" bucket ":" key`.
//!
//! Bucket and key segments that could contain `:` are escaped with a stable
//! percent scheme, applied symmetrically by format and parse.

use certis_core::{AppError, ProviderType};

const PARTS_EXPECTED: usize = 3;

/// Render the URI for an object location.
pub fn format_object_uri(provider: ProviderType, bucket: &str, key: &str) -> String {
    format!("{}:{}:{}", provider, escape(bucket), escape(key))
}

/// Parse a URI back into `(provider, bucket, key)`.
///
/// Exactly three colon-separated fields are required; anything else is a
/// malformed request.
pub fn parse_object_uri(uri: &str) -> Result<(ProviderType, String, String), AppError> {
    let parts: Vec<&str> = uri.splitn(PARTS_EXPECTED, ':').collect();
    if parts.len() != PARTS_EXPECTED {
        return Err(AppError::BadRequest(format!("malformed object URI: {uri}")));
    }

    let provider = parts[0]
        .parse::<ProviderType>()
        .map_err(|e| AppError::BadRequest(e.to_string()))?;

    Ok((provider, unescape(parts[1]), unescape(parts[2])))
}

fn escape(segment: &str) -> String {
    segment.replace('%', "%25").replace(':', "%3A")
}

fn unescape(segment: &str) -> String {
    segment.replace("%3A", ":").replace("%25", "%")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_round_trip_plain_segments() {
        let uri = format_object_uri(ProviderType::Database, "default", "01JGXFILE0000000000000000");
        assert_eq!(uri, "database:default:01JGXFILE0000000000000000");

        let (provider, bucket, key) = parse_object_uri(&uri).unwrap();
        assert_eq!(provider, ProviderType::Database);
        assert_eq!(bucket, "default");
        assert_eq!(key, "01JGXFILE0000000000000000");
    }

    #[test]
    fn test_round_trip_with_colons_in_key() {
        let uri = format_object_uri(ProviderType::S3, "alpha", "reports/2026:Q1.pdf");
        let (_, bucket, key) = parse_object_uri(&uri).unwrap();
        assert_eq!(bucket, "alpha");
        assert_eq!(key, "reports/2026:Q1.pdf");
    }

    #[test]
    fn test_rejects_wrong_shape() {
        assert!(parse_object_uri("s3:onlybucket").is_err());
        assert!(parse_object_uri("").is_err());
        assert!(parse_object_uri("martian:bucket:key").is_err());
    }
}
