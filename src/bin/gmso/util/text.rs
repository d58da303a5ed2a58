/// Greedy word wrap; never splits a word longer than `width`.
pub fn wrap(text: &str, width: usize) -> Vec<String> {
    let mut lines = Vec::new();
    let mut current = String::new();

    for word in text.split_whitespace() {
        if current.is_empty() {
            current = word.to_string();
        } else if current.chars().count() + 1 + word.chars().count() <= width {
            current.push(' ');
            current.push_str(word);
        } else {
            lines.push(std::mem::take(&mut current));
            current = word.to_string();
        }
    }

    if !current.is_empty() {
        lines.push(current);
    }

    if lines.is_empty() {
        lines.push(String::new());
    }

    lines
}

/// Shortens `s` to at most `max_len` characters, marking the cut with `…`.
pub fn truncate(s: &str, max_len: usize) -> String {
    match max_len {
        0 => return String::new(),
        1 if s.chars().nth(1).is_some() => return "…".to_string(),
        _ => {}
    }

    if s.chars().nth(max_len).is_none() {
        return s.to_string();
    }

    let cut = s
        .char_indices()
        .nth(max_len - 1)
        .map_or(s.len(), |(idx, _)| idx);
    format!("{}…", &s[..cut])
}
