use crate::core::directives::Family;

/// Maps a `User-Agent` string to a browser family. Unknown agents are [`Family::Other`].
pub fn classify(user_agent: &str) -> Family {
    if user_agent.contains("OPR/") || user_agent.contains("Opera") {
        Family::Opera
    } else if user_agent.contains("Edg/") || user_agent.contains("Edge/") {
        Family::Other
    } else if user_agent.contains("Firefox/") && !user_agent.contains("Seamonkey/") {
        Family::Firefox
    } else if user_agent.contains("Chrome/") || user_agent.contains("CriOS/") {
        Family::Chrome
    } else if user_agent.contains("Safari/") || user_agent.contains("FxiOS/") {
        Family::Safari
    } else {
        Family::Other
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use test_case::test_case;

    #[test_case("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36", Family::Chrome; "chrome")]
    #[test_case("Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36 OPR/106.0.0.0", Family::Opera; "opera")]
    #[test_case("Mozilla/5.0 (X11; Linux x86_64; rv:121.0) Gecko/20100101 Firefox/121.0", Family::Firefox; "firefox")]
    #[test_case("Mozilla/5.0 (Macintosh; Intel Mac OS X 14_2) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/17.2 Safari/605.1.15", Family::Safari; "safari")]
    #[test_case("curl/8.4.0", Family::Other; "curl")]
    #[test_case("", Family::Other; "empty")]
    fn classifies(user_agent: &str, expected: Family) {
        assert_eq!(classify(user_agent), expected);
    }
}
