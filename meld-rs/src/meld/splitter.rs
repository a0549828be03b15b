//! Subject/body splitting of raw template sources
//!
//! The first line of a template is its subject. A single blank line after the
//! subject is treated as a separator and dropped, so the body does not start
//! with an empty line.

/// Split a template source into `(subject, body)`
pub fn split_source(source: &str) -> (String, String) {
    let Some((subject, rest)) = source.split_once('\n') else {
        return (trim_cr(source).to_string(), String::new());
    };

    let body = rest
        .strip_prefix("\r\n")
        .or_else(|| rest.strip_prefix('\n'))
        .unwrap_or(rest);

    (trim_cr(subject).to_string(), body.to_string())
}

fn trim_cr(line: &str) -> &str {
    line.strip_suffix('\r').unwrap_or(line)
}
