//! Name normalization between Python constants and Swift enum cases
//!
//! Python enum members are written in SCREAMING_SNAKE_CASE while Swift cases
//! use lowerCamelCase. Both sides are reduced to the same word list so a case
//! can be matched regardless of which convention it was written in.

/// Split an identifier into its words.
///
/// Names containing `_` are split on underscores; anything else is split on
/// case transitions (`respCode` -> `resp`, `Code`), keeping acronyms together
/// (`HTTPServer` -> `HTTP`, `Server`) and digits attached to the word before.
pub fn split_words(name: &str) -> Vec<String> {
    if name.contains('_') {
        return name
            .split('_')
            .filter(|w| !w.is_empty())
            .map(String::from)
            .collect();
    }

    let chars: Vec<char> = name.chars().collect();
    let mut words = Vec::new();
    let mut current = String::new();

    for (i, &c) in chars.iter().enumerate() {
        if i > 0 && c.is_uppercase() && !current.is_empty() {
            let prev = chars[i - 1];
            let next_is_lower = chars.get(i + 1).is_some_and(|n| n.is_lowercase());
            let boundary = prev.is_lowercase()
                || prev.is_ascii_digit()
                || (prev.is_uppercase() && next_is_lower);
            if boundary {
                words.push(std::mem::take(&mut current));
            }
        }
        current.push(c);
    }

    if !current.is_empty() {
        words.push(current);
    }
    words
}

/// Convert a constant name to lowerCamelCase.
///
/// `RESP_CODE_OK` becomes `respCodeOk`. Already camel-cased input maps to
/// itself, so normalizing twice is the same as normalizing once.
pub fn normalize_constant_name(name: &str) -> String {
    let words = split_words(name);
    if words.is_empty() {
        return name.to_string();
    }

    let mut out = String::with_capacity(name.len());
    for (i, word) in words.iter().enumerate() {
        if i == 0 {
            out.push_str(&word.to_lowercase());
        } else {
            out.push_str(&capitalize(word));
        }
    }
    out
}

/// Comparison key shared by both languages: lower-cased words, concatenated.
pub fn match_key(name: &str) -> String {
    split_words(name)
        .iter()
        .map(|w| w.to_lowercase())
        .collect::<String>()
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(char::to_lowercase)).collect(),
        None => String::new(),
    }
}
