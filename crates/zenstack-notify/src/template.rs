use std::collections::HashMap;

/// Literal `{{key}}` substitution.
///
/// Whitespace around the key inside the braces is ignored; keys missing
/// from `data` stay in the output verbatim, braces included. This is
/// intentionally not a template language.
pub fn render(template: &str, data: &HashMap<String, String>) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        match after.find("}}") {
            Some(end) => {
                let key = after[..end].trim();
                match data.get(key) {
                    Some(value) => out.push_str(value),
                    // Unknown key: keep the original placeholder.
                    None => out.push_str(&rest[start..start + 2 + end + 2]),
                }
                rest = &after[end + 2..];
            }
            None => {
                // Unterminated braces pass through untouched.
                out.push_str(&rest[start..]);
                rest = "";
            }
        }
    }
    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn data(pairs: &[(&str, &str)]) -> HashMap<String, String> {
        pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect()
    }

    #[test]
    fn test_basic_substitution() {
        let d = data(&[("domain", "example.com"), ("days", "5")]);
        assert_eq!(
            render("{{domain}} expires in {{days}} days", &d),
            "example.com expires in 5 days"
        );
    }

    #[test]
    fn test_whitespace_around_key_is_ignored() {
        let d = data(&[("domain", "example.com")]);
        assert_eq!(render("host: {{ domain }}", &d), "host: example.com");
        assert_eq!(render("host: {{  domain}}", &d), "host: example.com");
    }

    #[test]
    fn test_unknown_key_is_preserved() {
        let d = data(&[("domain", "example.com")]);
        assert_eq!(
            render("{{domain}} / {{missing}}", &d),
            "example.com / {{missing}}"
        );
    }

    #[test]
    fn test_unterminated_braces_pass_through() {
        let d = data(&[("domain", "example.com")]);
        assert_eq!(render("{{domain}} and {{oops", &d), "example.com and {{oops");
    }

    #[test]
    fn test_site_down_template_renders_status_code() {
        let d = data(&[("domain", "x.example.com"), ("status", "0")]);
        assert_eq!(
            render("🚨 告警：站点 {{domain}} 无法访问！状态码：{{status}}", &d),
            "🚨 告警：站点 x.example.com 无法访问！状态码：0"
        );
    }

    #[test]
    fn test_render_is_idempotent_when_keys_resolve() {
        let d = data(&[("domain", "example.com"), ("days", "3")]);
        let t = "{{domain}}: {{days}} days left";
        let once = render(t, &d);
        assert_eq!(render(&once, &d), once);
    }

    #[test]
    fn test_empty_template() {
        assert_eq!(render("", &data(&[])), "");
    }
}
