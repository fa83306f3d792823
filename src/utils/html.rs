use ammonia;

/// Clean HTML content using the ammonia library.
///
/// Question prompts and options arrive from the curation UI as rich text.
/// This employs a whitelist-based sanitization strategy: it preserves safe tags
/// (like <b>, <p>) while stripping dangerous tags (like <script>, <iframe>)
/// and malicious attributes (like onclick), so stored questions can be rendered
/// verbatim by the test portal without Stored XSS risk.
pub fn clean_html(input: &str) -> String {
    ammonia::clean(input)
}
