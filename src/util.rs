//! Small utility helpers used across modules.

/// Very small and safe string templating.
/// Replaces `{key}` tokens in the template with the provided values in a single
/// left-to-right pass, so substituted values are never expanded again.
/// Unknown `{...}` tokens and stray braces are copied through unchanged.
pub fn fill_template(tpl: &str, pairs: &[(&str, &str)]) -> String {
  let mut out = String::with_capacity(tpl.len());
  let mut rest = tpl;
  while let Some(open) = rest.find('{') {
    out.push_str(&rest[..open]);
    let after = &rest[open + 1..];
    let replaced = after.find('}').and_then(|close| {
      let key = &after[..close];
      pairs
        .iter()
        .find(|(k, _)| *k == key)
        .map(|(_, v)| (*v, close))
    });
    match replaced {
      Some((value, close)) => {
        out.push_str(value);
        rest = &after[close + 1..];
      }
      None => {
        out.push('{');
        rest = after;
      }
    }
  }
  out.push_str(rest);
  out
}

/// Log-safe truncation for large strings (char-boundary aware).
/// Avoids spamming logs with huge model payloads.
pub fn trunc_for_log(s: &str, max_chars: usize) -> String {
  match s.char_indices().nth(max_chars) {
    None => s.to_string(),
    Some((cut, _)) => format!("{}… ({} bytes total)", &s[..cut], s.len()),
  }
}
