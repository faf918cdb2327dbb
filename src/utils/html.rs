use axum::{
    http::StatusCode,
    response::{Html, IntoResponse, Response},
};

pub fn escape(value: &str) -> String {
    let mut escaped = String::with_capacity(value.len());
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}

pub fn layout(title: &str, flash: &[String], body: &str) -> String {
    let mut notices = String::new();
    if !flash.is_empty() {
        notices.push_str("<ul class=\"flash\">");
        for message in flash {
            notices.push_str(&format!("<li>{}</li>", escape(message)));
        }
        notices.push_str("</ul>");
    }

    format!(
        "<!DOCTYPE html>\n<html>\n<head><meta charset=\"utf-8\"><title>{}</title></head>\n<body>\n{}{}\n</body>\n</html>",
        escape(title),
        notices,
        body
    )
}

pub fn error_page(status: StatusCode, message: &str) -> Response {
    let title = status.canonical_reason().unwrap_or("Error");
    let body = format!("<h1>{}</h1><p>{}</p>", escape(title), escape(message));
    (status, Html(layout(title, &[], &body))).into_response()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn escapes_html_metacharacters() {
        assert_eq!(
            escape("<script>alert(\"x & y\")</script>"),
            "&lt;script&gt;alert(&quot;x &amp; y&quot;)&lt;/script&gt;"
        );
        assert_eq!(escape("it's"), "it&#39;s");
    }

    #[test]
    fn layout_renders_flash_notices() {
        let page = layout("Home", &[String::from("Menu Item: Cleats was added")], "<p>hi</p>");
        assert!(page.contains("<li>Menu Item: Cleats was added</li>"));
        assert!(page.contains("<title>Home</title>"));
    }

    #[test]
    fn layout_omits_flash_list_when_empty() {
        let page = layout("Home", &[], "<p>hi</p>");
        assert!(!page.contains("class=\"flash\""));
    }
}
