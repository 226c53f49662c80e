use anyhow::{bail, Context, Result};
use base64::{engine::general_purpose, Engine as _};

pub const EMBEDDED_PAYLOAD: &str = include_str!(concat!(env!("OUT_DIR"), "/app_payload.b64"));

/// Decodes the base64 payload text into zip archive bytes.
pub fn decode(encoded: &str) -> Result<Vec<u8>> {
    let trimmed = encoded.trim();
    if trimmed.is_empty() {
        bail!("embedded payload is empty");
    }
    general_purpose::STANDARD
        .decode(trimmed)
        .context("decode embedded payload")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn decode_rejects_empty() {
        let err = decode("  \n").unwrap_err();
        assert!(err.to_string().contains("embedded payload is empty"));
    }

    #[test]
    fn decode_rejects_invalid_base64() {
        let err = decode("not*base64!").unwrap_err();
        assert!(err.to_string().contains("decode embedded payload"));
    }

    #[test]
    fn embedded_payload_is_a_zip() {
        let bytes = decode(EMBEDDED_PAYLOAD).unwrap();
        let zip = zip::ZipArchive::new(std::io::Cursor::new(bytes)).unwrap();
        assert!(zip.len() > 0);
    }
}
