/// HTML-escape a string for text nodes and attribute values
///
/// Escapes: & < > " '
pub fn html_escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#x27;"),
            _ => out.push(c),
        }
    }
    out
}

/// Make serialized JSON safe to place inside a `<script>` element.
///
/// `<`, `>` and `&` only occur inside JSON strings, where the unicode
/// escapes are equivalent.
pub fn script_safe_json(json: &str) -> String {
    json.replace('<', "\\u003c")
        .replace('>', "\\u003e")
        .replace('&', "\\u0026")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_html_escape_basic_characters() {
        assert_eq!(html_escape("&"), "&amp;");
        assert_eq!(html_escape("<"), "&lt;");
        assert_eq!(html_escape(">"), "&gt;");
        assert_eq!(html_escape("\""), "&quot;");
        assert_eq!(html_escape("'"), "&#x27;");
    }

    #[test]
    fn test_html_escape_xss_attempts() {
        assert_eq!(
            html_escape("<script>alert('xss')</script>"),
            "&lt;script&gt;alert(&#x27;xss&#x27;)&lt;/script&gt;"
        );
        assert_eq!(
            html_escape("\" onload=\"alert(1)"),
            "&quot; onload=&quot;alert(1)"
        );
    }

    #[test]
    fn test_html_escape_unicode() {
        assert_eq!(html_escape("كتاب لكل موظف"), "كتاب لكل موظف");
        assert_eq!(html_escape(""), "");
    }

    #[test]
    fn test_script_safe_json() {
        let json = serde_json::to_string(&serde_json::json!({
            "content": "</script><b>x & y</b>"
        }))
        .unwrap();
        let safe = script_safe_json(&json);

        assert!(!safe.contains('<'));
        assert!(!safe.contains('>'));
        assert!(!safe.contains('&'));

        let back: serde_json::Value = serde_json::from_str(&safe).unwrap();
        assert_eq!(back["content"], "</script><b>x & y</b>");
    }
}
