// ==============================================================================
// "Did You Mean?" Suggestions
// ==============================================================================
//
// Edit-distance helpers shared by the schema reader (misspelled type names)
// and the record transformer (enum symbols that are one typo away).

/// Compute the Levenshtein edit distance between two strings.
///
/// Two-row dynamic programming; inputs are short identifiers.
pub(crate) fn levenshtein(a: &str, b: &str) -> usize {
    let b_chars: Vec<char> = b.chars().collect();
    if a.is_empty() {
        return b_chars.len();
    }
    if b_chars.is_empty() {
        return a.chars().count();
    }

    let mut prev_row: Vec<usize> = (0..=b_chars.len()).collect();
    let mut curr_row = vec![0; b_chars.len() + 1];

    for (i, ca) in a.chars().enumerate() {
        curr_row[0] = i + 1;
        for (j, cb) in b_chars.iter().enumerate() {
            let cost = usize::from(ca != *cb);
            curr_row[j + 1] = (prev_row[j] + cost) // substitution
                .min(prev_row[j + 1] + 1) // deletion
                .min(curr_row[j] + 1); // insertion
        }
        std::mem::swap(&mut prev_row, &mut curr_row);
    }
    prev_row[b_chars.len()]
}

/// Maximum edit distance for a suggestion to be considered "close enough."
///
/// Short names (length <= 4) tolerate one edit, longer names two.
pub(crate) fn max_edit_distance(name_len: usize) -> usize {
    if name_len <= 4 { 1 } else { 2 }
}

/// Pick the closest candidate within [`max_edit_distance`], preferring the
/// earliest candidate on ties. A case-insensitive exact match always wins.
pub(crate) fn closest_match<'a>(
    input: &str,
    candidates: impl IntoIterator<Item = &'a str>,
) -> Option<&'a str> {
    let limit = max_edit_distance(input.chars().count());
    let mut best: Option<(&'a str, usize)> = None;
    for candidate in candidates {
        if candidate.eq_ignore_ascii_case(input) {
            return Some(candidate);
        }
        let distance = levenshtein(input, candidate);
        if distance <= limit && best.is_none_or(|(_, d)| distance < d) {
            best = Some((candidate, distance));
        }
    }
    best.map(|(candidate, _)| candidate)
}
