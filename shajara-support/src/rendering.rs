//! Text rendering utilities for human-friendly diagnostics.

/// Renders an ancestry chain, nearest first.
///
/// # Examples
/// ```
/// use shajara_support::rendering::render_chain;
///
/// let chain = vec!["Container#3", "Container#2", "Container#1"];
/// assert_eq!(render_chain(&chain), "Container#3 → Container#2 → Container#1");
/// ```
pub fn render_chain(chain: &[impl AsRef<str>]) -> String {
    let mut out = String::new();
    for (i, link) in chain.iter().enumerate() {
        if i > 0 {
            out.push_str(" → ");
        }
        out.push_str(link.as_ref());
    }
    out
}

/// Strips module paths from a fully qualified type name.
///
/// ```
/// use shajara_support::rendering::shorten_type_name;
///
/// assert_eq!(shorten_type_name("app::widgets::Toolbar"), "Toolbar");
/// assert_eq!(
///     shorten_type_name("alloc::sync::Arc<dyn app::services::Clock>"),
///     "Arc<dyn Clock>"
/// );
/// ```
pub fn shorten_type_name(full_name: &str) -> String {
    let mut out = String::with_capacity(full_name.len());
    let mut segment_start = 0;

    for (idx, ch) in full_name.char_indices() {
        if matches!(ch, '<' | '>' | ',' | ' ' | '(' | ')' | '[' | ']' | ';' | '&') {
            out.push_str(last_path_segment(&full_name[segment_start..idx]));
            out.push(ch);
            segment_start = idx + ch.len_utf8();
        }
    }
    out.push_str(last_path_segment(&full_name[segment_start..]));
    out
}

fn last_path_segment(path: &str) -> &str {
    path.rsplit("::").next().unwrap_or(path)
}

/// Picks up to `max` entries of `available` that look like `requested`.
///
/// Matching is case-insensitive on shortened names: containment scores
/// highest, then a shared prefix of at least three characters.
pub fn suggest_similar(requested: &str, available: &[String], max: usize) -> Vec<String> {
    let wanted = shorten_type_name(requested).to_lowercase();
    if wanted.is_empty() {
        return Vec::new();
    }

    let mut scored: Vec<(usize, &String)> = available
        .iter()
        .filter_map(|candidate| {
            let short = shorten_type_name(candidate).to_lowercase();
            if short == wanted {
                return None;
            }
            if short.contains(&wanted) || wanted.contains(&short) {
                return Some((100, candidate));
            }
            let prefix = short
                .chars()
                .zip(wanted.chars())
                .take_while(|(a, b)| a == b)
                .count();
            (prefix >= 3).then_some((prefix * 10, candidate))
        })
        .collect();

    scored.sort_by(|a, b| b.0.cmp(&a.0).then_with(|| a.1.cmp(b.1)));
    scored.dedup_by(|a, b| a.1 == b.1);
    scored.into_iter().take(max).map(|(_, name)| name.clone()).collect()
}
