//! Key-value wire format used by the gateway for replies and acknowledgements:
//! one `Key=Value` pair per line, lines separated by CRLF.

use url::form_urlencoded;

use crate::domain::Fields;
use crate::ports::GatewayError;

pub const LINE_SEPARATOR: &str = "\r\n";

/// Decodes a reply body. Bare LF line endings are tolerated and a value may
/// itself contain `=`.
pub fn decode_lines(body: &str) -> Result<Fields, GatewayError> {
    let mut fields = Fields::new();
    for line in body.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }
        let (key, value) = line
            .split_once('=')
            .ok_or_else(|| GatewayError::Malformed(format!("line without '=': {:?}", line)))?;
        fields.insert(key.trim(), value);
    }

    Ok(fields)
}

/// Encodes fields as CRLF-separated `Key=Value` lines.
pub fn encode_lines(fields: &Fields) -> Result<String, GatewayError> {
    let mut lines = Vec::with_capacity(fields.len());
    for (key, value) in fields.iter() {
        if key.is_empty() || key.contains('=') {
            return Err(GatewayError::Encoding(format!("invalid key {:?}", key)));
        }
        if has_line_break(key) || has_line_break(value) {
            return Err(GatewayError::Encoding(format!(
                "line break in field {:?}",
                key
            )));
        }
        lines.push(format!("{}={}", key, value));
    }

    Ok(lines.join(LINE_SEPARATOR))
}

/// Decodes an `application/x-www-form-urlencoded` body.
pub fn decode_form(body: &[u8]) -> Fields {
    form_urlencoded::parse(body)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect()
}

/// Encodes fields as `application/x-www-form-urlencoded`.
pub fn encode_form(fields: &Fields) -> String {
    let mut serializer = form_urlencoded::Serializer::new(String::new());
    for (key, value) in fields.iter() {
        serializer.append_pair(key, value);
    }
    serializer.finish()
}

fn has_line_break(value: &str) -> bool {
    value.contains('\r') || value.contains('\n')
}
