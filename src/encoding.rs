use encoding_rs::Encoding;

use crate::error::EditorError;

pub const DEFAULT_ENCODING: &str = "utf-8";

fn resolve(name: &str, path: &str) -> Result<&'static Encoding, EditorError> {
    Encoding::for_label(name.as_bytes()).ok_or_else(|| EditorError::EncodingError {
        path: path.to_string(),
        offset: 0,
        message: format!("unknown character encoding '{name}'"),
    })
}

/// Decodes `bytes` under the named encoding. Fails with the byte offset of
/// the first malformed sequence rather than silently substituting.
pub fn decode(bytes: &[u8], encoding_name: &str, path: &str) -> Result<String, EditorError> {
    let encoding = resolve(encoding_name, path)?;
    let mut decoder = encoding.new_decoder();
    let mut output = String::with_capacity(bytes.len());
    let (result, consumed, replaced) =
        decoder.decode_to_string(bytes, &mut output, true);
    let _ = result;

    if replaced {
        let offset = first_decode_failure_offset(bytes, encoding);
        return Err(EditorError::EncodingError {
            path: path.to_string(),
            offset,
            message: format!("invalid byte sequence for encoding '{encoding_name}'"),
        });
    }
    let _ = consumed;

    Ok(output)
}

/// Encodes `text` under the named encoding.
pub fn encode(text: &str, encoding_name: &str, path: &str) -> Result<Vec<u8>, EditorError> {
    let encoding = resolve(encoding_name, path)?;
    let mut encoder = encoding.new_encoder();
    let mut output = Vec::with_capacity(text.len());
    let mut temp = [0u8; 4096];
    let mut remaining = text;

    loop {
        let (result, consumed, written, _had_errors) =
            encoder.encode_from_utf8(remaining, &mut temp, true);
        output.extend_from_slice(&temp[..written]);
        remaining = &remaining[consumed..];
        if matches!(result, encoding_rs::CoderResult::InputEmpty) {
            break;
        }
    }

    Ok(output)
}

fn first_decode_failure_offset(bytes: &[u8], encoding: &'static Encoding) -> usize {
    for end in 1..=bytes.len() {
        let mut decoder = encoding.new_decoder();
        let mut probe = String::with_capacity(end);
        let (_, _, replaced) = decoder.decode_to_string(&bytes[..end], &mut probe, true);
        if replaced {
            return end - 1;
        }
    }
    0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips_utf8() {
        let text = "hëllo\n世界\n";
        let bytes = encode(text, DEFAULT_ENCODING, "/a.txt").unwrap();
        let decoded = decode(&bytes, DEFAULT_ENCODING, "/a.txt").unwrap();
        assert_eq!(decoded, text);
    }

    #[test]
    fn rejects_unknown_encoding_name() {
        let error = decode(b"abc", "not-a-real-encoding", "/a.txt").unwrap_err();
        assert!(matches!(error, EditorError::EncodingError { .. }));
    }

    #[test]
    fn reports_offset_for_invalid_utf8() {
        let bytes = [b'a', b'b', 0xff, 0xfe, b'c'];
        let error = decode(&bytes, "utf-8", "/a.txt").unwrap_err();
        match error {
            EditorError::EncodingError { offset, .. } => assert_eq!(offset, 2),
            other => panic!("expected EncodingError, got {other:?}"),
        }
    }
}
