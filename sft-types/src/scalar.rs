//! Coercion of scalar response bodies.
//!
//! Scalar calls answer with a bare JSON literal that may or may not be
//! quoted (`true`, `"true"`, `12`, `"12,13"`). These helpers normalise the
//! body and coerce it to the expected type.

use crate::error::WireError;

/// Strip surrounding whitespace and every double quote from a body.
pub fn unquote(body: &str) -> String {
    body.trim().replace('"', "")
}

/// Coerce a body to a boolean (`true`/`false`, case-insensitive).
pub fn parse_bool(body: &str) -> Result<bool, WireError> {
    let value = unquote(body);
    if value.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if value.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(WireError::InvalidScalar {
            expected: "boolean",
            value: body.to_string(),
        })
    }
}

/// Coerce a body to a signed 64-bit integer.
pub fn parse_i64(body: &str) -> Result<i64, WireError> {
    unquote(body)
        .trim()
        .parse()
        .map_err(|_| WireError::InvalidScalar {
            expected: "64-bit integer",
            value: body.to_string(),
        })
}

/// Coerce a body to a comma-separated list of 64-bit integers.
///
/// An empty body yields an empty list.
pub fn parse_i64_list(body: &str) -> Result<Vec<i64>, WireError> {
    let value = unquote(body);
    if value.trim().is_empty() {
        return Ok(Vec::new());
    }
    value
        .split(',')
        .map(|token| {
            token
                .trim()
                .parse()
                .map_err(|_| WireError::InvalidScalar {
                    expected: "comma-separated 64-bit integer list",
                    value: body.to_string(),
                })
        })
        .collect()
}
