/// Words masked out of chirp bodies, compared case-insensitively.
const PROFANE_WORDS: [&str; 3] = ["kerfuffle", "sharbert", "fornax"];

const MASK: &str = "****";

/// Replace every space-separated word that is exactly a profane word
/// (ignoring case) with `****`. Punctuated or longer words are left alone.
pub fn clean_body(body: &str) -> String {
    body.split(' ')
        .map(|word| {
            if PROFANE_WORDS.contains(&word.to_lowercase().as_str()) {
                MASK
            } else {
                word
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
