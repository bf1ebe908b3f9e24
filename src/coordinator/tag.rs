use sha2::{Digest, Sha256};

/// Number of digest bytes kept; rendered as 32 hex characters.
const TAG_BYTES: usize = 16;

/// Per-cluster request tag embedded in every stats and mutation URL.
///
/// Deterministic and not secret: it only lets the coordinator match the
/// request to the cluster it was addressed to.
pub fn request_tag(cluster: &str) -> String {
    let digest = Sha256::digest(format!("Codis-XAuth-[{}]", cluster).as_bytes());
    digest[..TAG_BYTES].iter().map(|b| format!("{:02x}", b)).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_tags() {
        assert_eq!(request_tag("foo"), "4c3a25b851e2ae708e6242dbbe32f9cd");
        assert_eq!(request_tag("demo"), "c32db19baf104a834a2d07a99c55a19a");
        assert_eq!(request_tag("codis-demo"), "95b62887719520f17e312eaa76d28f2b");
    }

    #[test]
    fn test_tag_shape() {
        let tag = request_tag("");
        assert_eq!(tag.len(), 32);
        assert!(tag.bytes().all(|b| b.is_ascii_hexdigit() && !b.is_ascii_uppercase()));
        assert_ne!(request_tag("a"), request_tag("b"));
    }
}
