//! Placeholder substitution for call scripts and email templates.
//!
//! Templates declare their variable list up front; rendering validates every
//! `{{name}}` placeholder against that list and against the supplied values,
//! so a typo in a template or a missing prospect field fails loudly instead
//! of leaking `{{companyName}}` into an outbound email.

use std::collections::HashMap;
use std::sync::OnceLock;

use regex::Regex;
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TemplateError {
    #[error("placeholder '{{{{{name}}}}}' is not declared by this template")]
    Undeclared { name: String },

    #[error("no value supplied for placeholder '{{{{{name}}}}}'")]
    MissingValue { name: String },
}

fn placeholder_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"\{\{\s*([A-Za-z_][A-Za-z0-9_]*)\s*\}\}").expect("valid regex"))
}

/// Lists the distinct placeholder names appearing in `body`, in order of
/// first appearance.
#[must_use]
pub fn scan_placeholders(body: &str) -> Vec<String> {
    let mut seen = Vec::new();
    for caps in placeholder_regex().captures_iter(body) {
        let name = &caps[1];
        if !seen.iter().any(|s| s == name) {
            seen.push(name.to_owned());
        }
    }
    seen
}

/// Renders `body`, substituting every `{{name}}` placeholder from `values`.
///
/// # Errors
///
/// - [`TemplateError::Undeclared`] if the body references a placeholder not
///   present in `declared`.
/// - [`TemplateError::MissingValue`] if a declared placeholder has no value.
pub fn render_template(
    body: &str,
    declared: &[String],
    values: &HashMap<String, String>,
) -> Result<String, TemplateError> {
    for name in scan_placeholders(body) {
        if !declared.iter().any(|d| d == &name) {
            return Err(TemplateError::Undeclared { name });
        }
        if !values.contains_key(&name) {
            return Err(TemplateError::MissingValue { name });
        }
    }

    let rendered = placeholder_regex().replace_all(body, |caps: &regex::Captures<'_>| {
        // Both maps were checked above; a miss here is unreachable.
        values.get(&caps[1]).cloned().unwrap_or_default()
    });
    Ok(rendered.into_owned())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn values(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| ((*k).to_owned(), (*v).to_owned()))
            .collect()
    }

    fn declared(names: &[&str]) -> Vec<String> {
        names.iter().map(|n| (*n).to_owned()).collect()
    }

    #[test]
    fn renders_declared_placeholders() {
        let body = "Hi {{contact_name}}, greetings from {{company_name}}!";
        let out = render_template(
            body,
            &declared(&["contact_name", "company_name"]),
            &values(&[("contact_name", "Ada"), ("company_name", "Fastship")]),
        )
        .unwrap();
        assert_eq!(out, "Hi Ada, greetings from Fastship!");
    }

    #[test]
    fn tolerates_whitespace_inside_braces() {
        let out = render_template(
            "{{ name }}",
            &declared(&["name"]),
            &values(&[("name", "x")]),
        )
        .unwrap();
        assert_eq!(out, "x");
    }

    #[test]
    fn repeated_placeholder_is_substituted_everywhere() {
        let out = render_template(
            "{{name}} and {{name}}",
            &declared(&["name"]),
            &values(&[("name", "twice")]),
        )
        .unwrap();
        assert_eq!(out, "twice and twice");
    }

    #[test]
    fn undeclared_placeholder_is_rejected() {
        let err = render_template("{{surprise}}", &declared(&["name"]), &values(&[])).unwrap_err();
        assert_eq!(
            err,
            TemplateError::Undeclared {
                name: "surprise".to_owned()
            }
        );
    }

    #[test]
    fn missing_value_is_rejected() {
        let err =
            render_template("{{name}}", &declared(&["name"]), &values(&[])).unwrap_err();
        assert_eq!(
            err,
            TemplateError::MissingValue {
                name: "name".to_owned()
            }
        );
    }

    #[test]
    fn body_without_placeholders_passes_through() {
        let out = render_template("plain text", &[], &HashMap::new()).unwrap();
        assert_eq!(out, "plain text");
    }

    #[test]
    fn scan_lists_distinct_names_in_order() {
        let names = scan_placeholders("{{b}} {{a}} {{b}}");
        assert_eq!(names, vec!["b".to_owned(), "a".to_owned()]);
    }
}
