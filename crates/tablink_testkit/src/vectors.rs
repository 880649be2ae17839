//! Cross-language text codec vectors for TabLink.
//!
//! Bindings on the managed side replay these to check that both ends of the
//! boundary agree on UTF-16 and UTF-8 forms.

use serde::{Deserialize, Serialize};

/// A codec vector that can be shared across languages.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CodecVector {
    /// Unique identifier for this vector.
    pub id: String,
    /// Human-readable description.
    pub description: String,
    /// UTF-16 units, four hex digits per unit.
    pub utf16_hex: String,
    /// Expected UTF-8 bytes (hex-encoded).
    pub utf8_hex: String,
    /// Expected error name (if decoding should fail).
    pub expected_error: Option<String>,
}

impl CodecVector {
    fn ok(id: &str, description: &str, text: &str) -> Self {
        let units: Vec<u16> = text.encode_utf16().collect();
        Self {
            id: id.into(),
            description: description.into(),
            utf16_hex: units_to_hex(&units),
            utf8_hex: hex_encode(text.as_bytes()),
            expected_error: None,
        }
    }

    fn invalid(id: &str, description: &str, units: &[u16]) -> Self {
        Self {
            id: id.into(),
            description: description.into(),
            utf16_hex: units_to_hex(units),
            utf8_hex: String::new(),
            expected_error: Some("InvalidEncoding".into()),
        }
    }

    /// Returns the UTF-16 input.
    pub fn utf16(&self) -> Vec<u16> {
        hex_to_units(&self.utf16_hex)
    }

    /// Returns the expected UTF-8 bytes.
    pub fn utf8(&self) -> Vec<u8> {
        hex_decode(&self.utf8_hex)
    }
}

/// Text codec vectors.
pub fn codec_vectors() -> Vec<CodecVector> {
    let long_ascii = "0123456789".repeat(5);
    let long_mixed = "añ€😀".repeat(13);
    vec![
        CodecVector::ok("empty", "Empty string", ""),
        CodecVector::ok("ascii_hello", "Plain ASCII", "Hello, World!"),
        CodecVector::ok("latin1", "Two-byte UTF-8", "naïve café"),
        CodecVector::ok("bmp_cjk", "Three-byte UTF-8", "日本語"),
        CodecVector::ok("astral_emoji", "Surrogate pair", "😀"),
        CodecVector::ok("mixed_short", "All widths below the threshold", "a€😀ñ"),
        CodecVector::ok(
            "threshold_48",
            "Exactly 48 units, preallocated path",
            &"x".repeat(48),
        ),
        CodecVector::ok("threshold_50", "50 units, exact-count path", &long_ascii),
        CodecVector::ok("long_mixed", "Mixed widths above the threshold", &long_mixed),
        CodecVector::invalid("lone_high", "Unpaired high surrogate", &[0x0041, 0xd83d]),
        CodecVector::invalid("lone_low", "Unpaired low surrogate", &[0xde00, 0x0041]),
        CodecVector::invalid(
            "swapped_pair",
            "Low surrogate before high surrogate",
            &[0xde00, 0xd83d],
        ),
    ]
}

/// Generates all vectors as JSON.
pub fn all_vectors_json() -> String {
    #[derive(Serialize)]
    struct AllVectors {
        codec: Vec<CodecVector>,
    }

    let vectors = AllVectors {
        codec: codec_vectors(),
    };
    serde_json::to_string_pretty(&vectors).expect("Failed to serialize vectors")
}

/// Encodes bytes as lowercase hex.
pub fn hex_encode(bytes: &[u8]) -> String {
    bytes.iter().map(|b| format!("{b:02x}")).collect()
}

/// Decodes lowercase or uppercase hex; panics on malformed input.
pub fn hex_decode(hex: &str) -> Vec<u8> {
    (0..hex.len())
        .step_by(2)
        .map(|i| u8::from_str_radix(&hex[i..i + 2], 16).expect("Invalid hex"))
        .collect()
}

fn units_to_hex(units: &[u16]) -> String {
    units.iter().map(|u| format!("{u:04x}")).collect()
}

fn hex_to_units(hex: &str) -> Vec<u16> {
    (0..hex.len())
        .step_by(4)
        .map(|i| u16::from_str_radix(&hex[i..i + 4], 16).expect("Invalid hex"))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_codec_vectors_are_consistent() {
        for vector in codec_vectors() {
            let decoded = String::from_utf16(&vector.utf16());
            match &vector.expected_error {
                None => assert_eq!(
                    decoded.unwrap().into_bytes(),
                    vector.utf8(),
                    "Vector {} failed: {}",
                    vector.id,
                    vector.description
                ),
                Some(_) => assert!(decoded.is_err(), "Vector {} should fail", vector.id),
            }
        }
    }

    #[test]
    fn test_threshold_vectors_straddle_48() {
        let vectors = codec_vectors();
        let len = |id: &str| {
            vectors
                .iter()
                .find(|v| v.id == id)
                .map(|v| v.utf16().len())
                .unwrap()
        };
        assert_eq!(len("threshold_48"), 48);
        assert_eq!(len("threshold_50"), 50);
        assert!(len("long_mixed") > 48);
    }

    #[test]
    fn test_all_vectors_json() {
        let json = all_vectors_json();
        assert!(json.contains("codec"));
        let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert_eq!(
            parsed["codec"].as_array().unwrap().len(),
            codec_vectors().len()
        );
    }
}
