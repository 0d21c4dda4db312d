/// Escape text for use in element content and quoted attribute values.
pub fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}

/// Standalone HTML document with inline styles.
pub fn document(title: &str, style: &str, body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n<style>\n{}\n</style>\n</head>\n<body>\n{}\n</body>\n</html>\n",
        escape(title),
        style.trim(),
        body.trim_end()
    )
}

/// `<ul>` of escaped items, or `None` when there is nothing to list.
pub fn bullet_list(items: &[String], class: &str) -> Option<String> {
    if items.is_empty() {
        return None;
    }
    let mut out = format!("<ul class=\"{}\">", escape(class));
    for item in items {
        out.push_str("<li>");
        out.push_str(&escape(item));
        out.push_str("</li>");
    }
    out.push_str("</ul>");
    Some(out)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_markup_characters() {
        assert_eq!(escape("<b>\"A&B\"</b>"), "&lt;b&gt;&quot;A&amp;B&quot;&lt;/b&gt;");
    }

    #[test]
    fn empty_list_renders_nothing() {
        assert_eq!(bullet_list(&[], "x"), None);
        assert_eq!(
            bullet_list(&["a<".to_string()], "x").unwrap(),
            "<ul class=\"x\"><li>a&lt;</li></ul>"
        );
    }
}
