//! Masking of sensitive values before logging
//!
//! Phone numbers double as session identities, so they show up in most log
//! lines of this crate. Nothing identifying should be logged verbatim.

/// Masks identities, tokens and URLs for log output
pub struct Sanitizer;

impl Sanitizer {
    /// Masks a phone number, keeping the country prefix and last two digits
    ///
    /// # Examples
    ///
    /// ```
    /// use tbank_session::security::Sanitizer;
    ///
    /// assert_eq!(Sanitizer::mask_phone("+79991234567"), "+7********67");
    /// assert_eq!(Sanitizer::mask_phone("1234"), "****");
    /// ```
    pub fn mask_phone(phone: &str) -> String {
        let chars: Vec<char> = phone.chars().collect();
        if chars.len() <= 4 {
            return "****".to_string();
        }

        let head = if chars[0] == '+' { 2 } else { 1 };
        let tail = 2;
        let mut masked: String = chars[..head].iter().collect();
        masked.extend(std::iter::repeat('*').take(chars.len() - head - tail));
        masked.extend(&chars[chars.len() - tail..]);
        masked
    }

    /// Masks a token, showing only its last 4 characters
    ///
    /// # Examples
    ///
    /// ```
    /// use tbank_session::security::Sanitizer;
    ///
    /// assert_eq!(Sanitizer::sanitize_token("a1b2c3d4e5f6.m1"), "***6.m1");
    /// assert_eq!(Sanitizer::sanitize_token("abc"), "****");
    /// ```
    pub fn sanitize_token(token: &str) -> String {
        let count = token.chars().count();
        if count > 4 {
            let tail: String = token.chars().skip(count - 4).collect();
            format!("***{}", tail)
        } else {
            "****".to_string()
        }
    }

    /// Drops query string and fragment from a URL
    ///
    /// Session identifiers travel in query parameters, so URLs are logged
    /// without them.
    ///
    /// # Examples
    ///
    /// ```
    /// use tbank_session::security::Sanitizer;
    ///
    /// assert_eq!(
    ///     Sanitizer::sanitize_url("https://www.tbank.ru/api/common/v1/session?sessionid=abc"),
    ///     "https://www.tbank.ru/api/common/v1/session"
    /// );
    /// ```
    pub fn sanitize_url(url: &str) -> String {
        url.split(&['?', '#'][..]).next().unwrap_or(url).to_string()
    }
}
