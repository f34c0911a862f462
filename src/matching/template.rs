//! `{param}` path template substitution.

/// Replace every `{name}` placeholder in `template` with the matching
/// observed path parameter.
///
/// Returns the name of the first placeholder with no observed value; the
/// caller treats that as a mismatch, not an error. An unterminated `{` is
/// kept literally.
pub(crate) fn substitute(
    template: &str,
    params: &[(String, String)],
) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;
    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let Some(len) = rest[start + 1..].find('}') else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };
        let name = &rest[start + 1..start + 1 + len];
        match params.iter().find(|(key, _)| key == name) {
            Some((_, value)) => out.push_str(value),
            None => return Err(name.to_string()),
        }
        rest = &rest[start + 1 + len + 1..];
    }
    out.push_str(rest);
    Ok(out)
}
