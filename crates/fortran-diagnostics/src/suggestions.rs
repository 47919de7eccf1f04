// SPDX-License-Identifier: (MIT OR Apache-2.0)
//! Did-you-mean suggestions for misspelled names.

/// Find the closest match for `name` among `candidates`, ignoring case.
pub fn closest<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<&'a str> {
    let name = name.to_ascii_lowercase();
    let max_distance = match name.len() {
        0..=2 => 1,
        3..=5 => 2,
        _ => 3,
    };

    let mut best: Option<(&str, usize)> = None;
    for candidate in candidates {
        if name.len().abs_diff(candidate.len()) > max_distance {
            continue;
        }
        let dist = strsim::levenshtein(&name, &candidate.to_ascii_lowercase());
        if dist == 0 || dist > max_distance {
            continue;
        }
        if best.map_or(true, |(_, d)| dist < d) {
            best = Some((candidate, dist));
        }
    }
    best.map(|(closest, _)| closest)
}

/// Returns `Some("did you mean `closest`?")` if a close match is found.
pub fn did_you_mean<'a>(name: &str, candidates: impl IntoIterator<Item = &'a str>) -> Option<String> {
    closest(name, candidates).map(|closest| format!("did you mean `{}`?", closest))
}
