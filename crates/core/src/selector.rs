//! Target-description to candidate-selector resolution.
//!
//! Pure and deterministic: the same description always yields the same
//! ordered list, so retried commands behave identically. The order is a
//! policy decision - most specific first, ending with an id-based guess so
//! the list is never empty for a non-empty description.

/// Escapes a string for use inside a double-quoted CSS attribute value.
pub fn escape_attr_value(value: &str) -> String {
    value.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Lowercased identifier form of a description: whitespace runs become `-`,
/// characters outside `[a-z0-9_-]` are dropped.
fn slug(description: &str) -> String {
    let mut out = String::with_capacity(description.len());
    let mut pending_dash = false;
    for ch in description.trim().chars() {
        if ch.is_whitespace() {
            pending_dash = !out.is_empty();
            continue;
        }
        let ch = ch.to_ascii_lowercase();
        if ch.is_ascii_alphanumeric() || ch == '_' || ch == '-' {
            if pending_dash {
                out.push('-');
                pending_dash = false;
            }
            out.push(ch);
        }
    }
    out
}

/// Produces the ordered candidate selector list for a target description.
///
/// Ordering, most specific first:
/// 1. exact id match
/// 2. `name` substring (case-insensitive)
/// 3. `input[type=...]` when the description is a single bare token
/// 4. `aria-label` substring (case-insensitive)
/// 5. `placeholder` substring (case-insensitive)
/// 6. `text=` free-text content match, resolved in-page against clickable
///    roles only
/// 7. id substring guess (last resort)
pub fn candidate_selectors(description: &str) -> Vec<String> {
    let text = description.trim();
    if text.is_empty() {
        return Vec::new();
    }

    let slug = slug(text);
    let escaped = escape_attr_value(text);
    let mut out = Vec::with_capacity(7);

    if !slug.is_empty() {
        out.push(format!("#{slug}"));
    }
    out.push(format!("[name*=\"{escaped}\" i]"));
    if !slug.is_empty() && slug.chars().all(|c| c.is_ascii_alphanumeric()) {
        out.push(format!("input[type={slug}]"));
    }
    out.push(format!("[aria-label*=\"{escaped}\" i]"));
    out.push(format!("[placeholder*=\"{escaped}\" i]"));
    out.push(format!("text={text}"));
    if !slug.is_empty() {
        out.push(format!("[id*=\"{slug}\" i]"));
    }

    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_token_ordering() {
        assert_eq!(
            candidate_selectors("email"),
            vec![
                "#email",
                "[name*=\"email\" i]",
                "input[type=email]",
                "[aria-label*=\"email\" i]",
                "[placeholder*=\"email\" i]",
                "text=email",
                "[id*=\"email\" i]",
            ]
        );
    }

    #[test]
    fn multi_word_ordering_skips_type_candidate() {
        assert_eq!(
            candidate_selectors("submit button"),
            vec![
                "#submit-button",
                "[name*=\"submit button\" i]",
                "[aria-label*=\"submit button\" i]",
                "[placeholder*=\"submit button\" i]",
                "text=submit button",
                "[id*=\"submit-button\" i]",
            ]
        );
    }

    #[test]
    fn deterministic_across_calls() {
        assert_eq!(
            candidate_selectors("submit button"),
            candidate_selectors("submit button")
        );
    }

    #[test]
    fn quotes_are_escaped_in_attribute_candidates() {
        let candidates = candidate_selectors("say \"hi\"");
        assert!(candidates.contains(&"[name*=\"say \\\"hi\\\"\" i]".to_string()));
    }

    #[test]
    fn non_empty_description_always_yields_candidates() {
        for description in ["email", "Sign In", "登录", "?!"] {
            assert!(
                !candidate_selectors(description).is_empty(),
                "no candidates for {description:?}"
            );
        }
    }

    #[test]
    fn empty_description_yields_nothing() {
        assert!(candidate_selectors("  ").is_empty());
    }
}
