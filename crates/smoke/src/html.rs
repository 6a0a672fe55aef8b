//! Just enough HTML inspection to check a rendered page: its title and
//! whether it has a visible body.
//!
//! Tag and attribute names are matched ASCII case-insensitively. Offsets
//! into the lowercased copy are valid in the original because ASCII
//! lowercasing preserves byte length.

/// Visibility of the document `<body>`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BodyVisibility {
    Visible,
    Missing,
    /// Hidden by an attribute or inline style.
    Hidden(String),
    /// Present but without content.
    Empty,
}

/// Returns the text of the first `<title>` element, whitespace collapsed
/// and common entities decoded.
pub fn document_title(html: &str) -> Option<String> {
    let lower = html.to_ascii_lowercase();
    let (_, content_start) = find_open_tag(&lower, "title")?;
    let content_end = lower[content_start..].find("</title")? + content_start;
    Some(normalize_text(&html[content_start..content_end]))
}

/// Inspects the `<body>` element.
pub fn body_visibility(html: &str) -> BodyVisibility {
    let lower = html.to_ascii_lowercase();
    let Some((tag_start, content_start)) = find_open_tag(&lower, "body") else {
        return BodyVisibility::Missing;
    };

    let tag = &lower[tag_start..content_start];
    for (name, value) in attributes(tag) {
        if name == "hidden" {
            return BodyVisibility::Hidden("hidden attribute".to_string());
        }
        if name == "style" {
            let style: String = value
                .unwrap_or_default()
                .chars()
                .filter(|c| !c.is_whitespace())
                .collect();
            for rule in ["display:none", "visibility:hidden"] {
                if style.contains(rule) {
                    return BodyVisibility::Hidden(format!("style {rule}"));
                }
            }
        }
    }

    let content_end = lower[content_start..]
        .find("</body")
        .map_or(lower.len(), |i| i + content_start);
    if html[content_start..content_end].trim().is_empty() {
        BodyVisibility::Empty
    } else {
        BodyVisibility::Visible
    }
}

/// Finds the first `<name ...>` element and returns the offsets of `<` and
/// of the byte after `>`.
///
/// Comments and the bodies of `<script>` and `<style>` are skipped, so markup
/// inside them never matches. An unterminated comment or raw-text element
/// hides the rest of the document.
fn find_open_tag(lower: &str, name: &str) -> Option<(usize, usize)> {
    let mut from = 0;
    while let Some(found) = lower[from..].find('<') {
        let start = from + found;
        if lower[start..].starts_with("<!--") {
            let body = start + "<!--".len();
            from = body + lower[body..].find("-->")? + "-->".len();
            continue;
        }
        let Some(tag) = open_tag_name(lower, start) else {
            from = start + 1;
            continue;
        };
        let after = start + 1 + tag.len();
        let end = after + tag_end(&lower[after..])?;
        if tag == name {
            return Some((start, end));
        }
        if matches!(tag, "script" | "style") {
            let close = format!("</{tag}");
            from = end + lower[end..].find(&close)?;
            continue;
        }
        from = end;
    }
    None
}

/// Name of the opening tag starting at `start`, if the `<` opens one.
fn open_tag_name(lower: &str, start: usize) -> Option<&str> {
    let rest = &lower[start + 1..];
    let len = rest
        .bytes()
        .take_while(|b| b.is_ascii_alphanumeric())
        .count();
    match rest.as_bytes().get(len) {
        _ if len == 0 => None,
        Some(b'>' | b'/') => Some(&rest[..len]),
        Some(b) if b.is_ascii_whitespace() => Some(&rest[..len]),
        _ => None,
    }
}

/// Offset just past the `>` closing a tag, skipping quoted values.
fn tag_end(rest: &str) -> Option<usize> {
    let mut quote = None;
    for (i, c) in rest.char_indices() {
        match (quote, c) {
            (Some(q), c) if c == q => quote = None,
            (Some(_), _) => {}
            (None, '"' | '\'') => quote = Some(c),
            (None, '>') => return Some(i + 1),
            (None, _) => {}
        }
    }
    None
}

/// Parses `name[=value]` pairs out of an opening tag such as `<body class="x" hidden>`.
fn attributes(tag: &str) -> Vec<(String, Option<String>)> {
    let inner = tag
        .trim_start_matches('<')
        .trim_end_matches('>')
        .trim_end_matches('/');
    let mut chars = inner.chars().peekable();

    // tag name
    while chars.next_if(|c| !c.is_whitespace()).is_some() {}

    let mut attrs = Vec::new();
    loop {
        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let mut name = String::new();
        while let Some(c) = chars.next_if(|c| !c.is_whitespace() && *c != '=') {
            name.push(c);
        }
        if name.is_empty() {
            if chars.next().is_none() {
                break;
            }
            continue;
        }

        while chars.next_if(|c| c.is_whitespace()).is_some() {}
        let value = if chars.next_if_eq(&'=').is_some() {
            while chars.next_if(|c| c.is_whitespace()).is_some() {}
            let mut value = String::new();
            match chars.next_if(|c| *c == '"' || *c == '\'') {
                Some(quote) => {
                    for c in chars.by_ref() {
                        if c == quote {
                            break;
                        }
                        value.push(c);
                    }
                }
                None => {
                    while let Some(c) = chars.next_if(|c| !c.is_whitespace()) {
                        value.push(c);
                    }
                }
            }
            Some(value)
        } else {
            None
        };
        attrs.push((name, value));
    }
    attrs
}

fn normalize_text(raw: &str) -> String {
    raw.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .replace("&lt;", "<")
        .replace("&gt;", ">")
        .replace("&quot;", "\"")
        .replace("&#39;", "'")
        .replace("&amp;", "&")
}
