use chardetng::EncodingDetector;
use encoding_rs::Encoding;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DecodedText {
    pub text: String,
    pub encoding: String,
}

#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("failed to decode bytes with {encoding}: {message}")]
    DecodeFailure { encoding: String, message: String },
}

/// Decodes a response body to UTF-8: BOM, then the Content-Type charset, then
/// chardetng detection.
pub fn decode_body(bytes: &[u8], content_type: Option<&str>) -> Result<DecodedText, DecodeError> {
    if let Some((encoding, _)) = Encoding::for_bom(bytes) {
        return decode_with(bytes, encoding);
    }

    if let Some(label) = content_type.and_then(charset) {
        if let Some(encoding) = Encoding::for_label(label.as_bytes()) {
            return decode_with(bytes, encoding);
        }
    }

    let mut detector = EncodingDetector::new();
    detector.feed(bytes, true);
    decode_with(bytes, detector.guess(None, true))
}

fn charset(content_type: &str) -> Option<String> {
    content_type.split(';').find_map(|part| {
        let (key, value) = part.split_once('=')?;
        key.trim()
            .eq_ignore_ascii_case("charset")
            .then(|| value.trim_matches([' ', '"', '\''].as_ref()).to_string())
    })
}

fn decode_with(bytes: &[u8], encoding: &'static Encoding) -> Result<DecodedText, DecodeError> {
    let (text, _, had_errors) = encoding.decode(bytes);
    if had_errors {
        return Err(DecodeError::DecodeFailure {
            encoding: encoding.name().to_string(),
            message: "malformed byte sequence".into(),
        });
    }
    Ok(DecodedText {
        text: text.into_owned(),
        encoding: encoding.name().to_string(),
    })
}
