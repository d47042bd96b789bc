/// Make `candidate` distinct from every name in `existing`.
///
/// While the name collides, a trailing run of digits is incremented
/// ("Trip 2" → "Trip 3"); any other trailing word gets " 2" appended
/// ("Trip" → "Trip 2"). Only the last whitespace-separated token is looked
/// at, so "2 Trips" becomes "2 Trips 2".
pub fn unique_playlist_name<S: AsRef<str>>(candidate: &str, existing: &[S]) -> String {
    let taken = |name: &str| existing.iter().any(|e| e.as_ref() == name);
    let mut name = candidate.to_string();
    while taken(&name) {
        name = next_name(&name);
    }
    name
}

fn next_name(name: &str) -> String {
    let split = name
        .char_indices()
        .rev()
        .find(|(_, c)| c.is_whitespace())
        .map_or(0, |(i, c)| i + c.len_utf8());
    let (prefix, last) = name.split_at(split);
    let numeric = !last.is_empty() && last.bytes().all(|b| b.is_ascii_digit());
    match last.parse::<u64>() {
        Ok(n) if numeric && n < u64::MAX => format!("{prefix}{}", n + 1),
        _ => format!("{name} 2"),
    }
}
