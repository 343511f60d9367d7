/// Recognized phrases and their fixed answers. Keys are already canonical.
pub const PHRASES: &[(&str, &str)] = &[
    ("да", "в кране черная вода!"),
    ("нет", "с-маркетинга ответ!"),
    ("не знаю", "а кто знает?!"),
];

/// Trim surrounding whitespace and lowercase, so "  Не Знаю\n" matches "не знаю".
pub fn canonicalize(text: &str) -> String {
    text.trim().to_lowercase()
}

/// Look up the answer for a message text. Missing text counts as empty,
/// and anything that is not an exact phrase gets no answer.
pub fn reply_for(text: Option<&str>) -> Option<&'static str> {
    let key = canonicalize(text.unwrap_or_default());
    PHRASES
        .iter()
        .find(|(phrase, _)| *phrase == key)
        .map(|(_, reply)| *reply)
}
