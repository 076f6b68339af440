//! Parses the compact rate-vector notation used by CSDF schema documents:
//! `"[e1, e2, ...]"` where each entry is either a bare integer `n` or a
//! repeated run `n*k` (meaning `n` repeated `k` times).
//!
//! Grounded on `sdfpy/core.py::SDFGraph.__validate_vector`, which accepts
//! this notation via a regular expression; this parser is a direct
//! character scan rather than a port of that regex. This is construction
//! glue only — no file is read here, per the Non-goal on file loaders.

use crate::error::SdfError;

/// Parses a rate-vector literal into its expanded `Vec<i64>` form.
///
/// # Examples
/// - `"[1, 2, 3]"` -> `[1, 2, 3]`
/// - `"[0*3, 5]"` -> `[0, 0, 0, 5]`
pub fn parse(context: &str, text: &str) -> Result<Vec<i64>, SdfError> {
    let trimmed = text.trim();
    let inner = trimmed
        .strip_prefix('[')
        .and_then(|s| s.strip_suffix(']'))
        .ok_or_else(|| SdfError::Parse {
            context: context.to_string(),
            message: format!("rate vector must be bracketed: {text:?}"),
        })?;

    let inner = inner.trim();
    if inner.is_empty() {
        return Err(SdfError::Parse {
            context: context.to_string(),
            message: "rate vector must have at least one entry".to_string(),
        });
    }

    let mut out = Vec::new();
    for entry in inner.split(',') {
        let entry = entry.trim();
        if entry.is_empty() {
            return Err(SdfError::Parse {
                context: context.to_string(),
                message: format!("empty entry in rate vector: {text:?}"),
            });
        }
        match entry.split_once('*') {
            Some((value, repeat)) => {
                let value = parse_int(context, value)?;
                let repeat = parse_int(context, repeat)?;
                if repeat <= 0 {
                    return Err(SdfError::Parse {
                        context: context.to_string(),
                        message: format!("repeat count must be positive: {entry:?}"),
                    });
                }
                out.extend(std::iter::repeat(value).take(repeat as usize));
            }
            None => out.push(parse_int(context, entry)?),
        }
    }

    Ok(out)
}

fn parse_int(context: &str, text: &str) -> Result<i64, SdfError> {
    text.trim().parse::<i64>().map_err(|_| SdfError::Parse {
        context: context.to_string(),
        message: format!("not an integer: {text:?}"),
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_bare_integers() {
        assert_eq!(parse("prates", "[1, 2, 3]").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn parses_repeated_runs() {
        assert_eq!(parse("prates", "[0*3, 5]").unwrap(), vec![0, 0, 0, 5]);
    }

    #[test]
    fn parses_mixed_whitespace() {
        assert_eq!(parse("crates", "[ 2*2 ,7 ]").unwrap(), vec![2, 2, 7]);
    }

    #[test]
    fn rejects_missing_brackets() {
        assert!(parse("prates", "1, 2, 3").is_err());
    }

    #[test]
    fn rejects_empty_vector() {
        assert!(parse("prates", "[]").is_err());
    }

    #[test]
    fn rejects_non_positive_repeat() {
        assert!(parse("prates", "[1*0]").is_err());
    }
}
