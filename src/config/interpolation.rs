// Copyright 2026 The Chatrelay Project
// SPDX-License-Identifier: Apache-2.0

use super::error::ConfigError;

/// Expand `${NAME}` and `${NAME:-fallback}` references using `lookup`.
///
/// `$$` produces a literal `$`. An unterminated `${` is kept verbatim.
/// A reference without a fallback to an unset variable is an error.
pub(crate) fn resolve_with(
    input: &str,
    lookup: impl Fn(&str) -> Option<String>,
) -> Result<String, ConfigError> {
    let mut out = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(pos) = rest.find('$') {
        out.push_str(&rest[..pos]);
        let after = &rest[pos + 1..];

        if let Some(tail) = after.strip_prefix('$') {
            out.push('$');
            rest = tail;
            continue;
        }

        let Some(body) = after.strip_prefix('{') else {
            out.push('$');
            rest = after;
            continue;
        };
        let Some(close) = body.find('}') else {
            out.push_str(&rest[pos..]);
            rest = "";
            break;
        };

        let reference = &body[..close];
        let (name, fallback) = match reference.split_once(":-") {
            Some((name, fallback)) => (name, Some(fallback)),
            None => (reference, None),
        };
        if name.is_empty() {
            out.push_str("${");
            out.push_str(reference);
            out.push('}');
        } else {
            match (lookup(name), fallback) {
                (Some(value), _) => out.push_str(&value),
                (None, Some(fallback)) => out.push_str(fallback),
                (None, None) => {
                    return Err(ConfigError::UndefinedVariable {
                        name: name.to_string(),
                    })
                }
            }
        }
        rest = &body[close + 1..];
    }

    out.push_str(rest);
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lookup(name: &str) -> Option<String> {
        match name {
            "KEY" => Some("sk-123".to_string()),
            "HOST" => Some("openrouter.ai".to_string()),
            _ => None,
        }
    }

    #[test]
    fn plain_text_unchanged() {
        assert_eq!(resolve_with("no vars here", lookup).unwrap(), "no vars here");
    }

    #[test]
    fn substitutes_known_variables() {
        assert_eq!(
            resolve_with("https://${HOST}/api?k=${KEY}", lookup).unwrap(),
            "https://openrouter.ai/api?k=sk-123"
        );
    }

    #[test]
    fn unset_variable_is_error() {
        let err = resolve_with("${MISSING}", lookup).unwrap_err();
        assert!(matches!(err, ConfigError::UndefinedVariable { ref name } if name == "MISSING"));
    }

    #[test]
    fn fallback_used_when_unset() {
        assert_eq!(resolve_with("${MISSING:-dflt}", lookup).unwrap(), "dflt");
        assert_eq!(resolve_with("${KEY:-dflt}", lookup).unwrap(), "sk-123");
        assert_eq!(resolve_with("${MISSING:-}", lookup).unwrap(), "");
    }

    #[test]
    fn dollar_escapes_and_literals() {
        assert_eq!(resolve_with("cost $$5", lookup).unwrap(), "cost $5");
        assert_eq!(resolve_with("a $ b", lookup).unwrap(), "a $ b");
        assert_eq!(resolve_with("tail ${KEY", lookup).unwrap(), "tail ${KEY");
        assert_eq!(resolve_with("${}", lookup).unwrap(), "${}");
    }
}
