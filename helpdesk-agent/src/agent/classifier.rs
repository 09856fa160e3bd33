use helpdesk_common::model::model::IssueType;

const HARDWARE_KEYWORDS: &[&str] = &[
    "device", "computer", "laptop", "desktop", "slow", "broken",
    "screen", "keyboard", "mouse", "printer", "hardware", "wifi",
    "network", "internet", "connection", "battery", "power", "crash",
    "frozen", "blue screen", "bsod", "restart", "boot", "monitor",
    "display", "black screen", "webcam", "camera", "microphone", "audio",
    "sound", "speaker", "usb", "drive", "disk", "storage",
];

const PASSWORD_KEYWORDS: &[&str] = &[
    "password", "login", "forgot", "reset", "locked", "account",
    "access", "credentials", "can't log in", "authentication",
    "username", "locked out", "security", "signin", "sign in",
    "log in", "cannot access", "password expired", "change password",
    "identity", "verification", "two-factor", "2fa", "mfa",
];

const SOFTWARE_KEYWORDS: &[&str] = &[
    "software", "application", "app", "program", "install",
    "update", "upgrade", "microsoft", "office", "excel", "word",
    "outlook", "email", "browser", "chrome", "edge", "firefox",
    "safari", "teams", "slack", "zoom", "license", "activation",
    "windows", "macos", "os", "operating system", "error message",
];

const BARE_GREETINGS: &[&str] = &["hi", "hello", "hey", "hi there", "hello there", "greetings"];

const GREETING_WORDS: &[&str] = &["hello", "hi", "hey", "greetings"];

const PASSWORD_WEIGHT: f32 = 1.2;

/// Lower-cased alphanumeric words of `message`, apostrophes kept.
pub fn words(message: &str) -> Vec<String> {
    message.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || c == '\''))
        .filter(|w| !w.is_empty())
        .map(String::from)
        .collect()
}

pub fn contains_any_word(message: &str, candidates: &[&str]) -> bool {
    words(message).iter().any(|w| candidates.contains(&w.as_str()))
}

/// The whole message is nothing but a salutation.
pub fn is_bare_greeting(message: &str) -> bool {
    let normalized = message.trim().to_lowercase();
    BARE_GREETINGS.contains(&normalized.as_str())
}

/// The message opens or contains a salutation, matched on whole words.
pub fn is_greeting(message: &str) -> bool {
    let words = words(message);
    if words.iter().any(|w| GREETING_WORDS.contains(&w.as_str())) {
        return true;
    }
    words.windows(2).any(|pair| {
        pair[0] == "good" && matches!(pair[1].as_str(), "morning" | "afternoon" | "evening")
    })
}

fn count_hits(message: &str, keywords: &[&str]) -> usize {
    keywords.iter().filter(|k| message.contains(*k)).count()
}

/// Keyword classifier. Short or purely social messages stay `General`.
pub fn classify_issue(message: &str) -> IssueType {
    if message.trim().chars().count() < 10 || is_bare_greeting(message) {
        return IssueType::General;
    }

    let message = message.to_lowercase();
    let hardware = count_hits(&message, HARDWARE_KEYWORDS) as f32;
    let password = count_hits(&message, PASSWORD_KEYWORDS) as f32 * PASSWORD_WEIGHT;
    let software = count_hits(&message, SOFTWARE_KEYWORDS) as f32;

    if password > hardware && password > software {
        IssueType::Password
    } else if software > hardware && software > password {
        IssueType::Software
    } else if hardware > 0.0 {
        IssueType::Hardware
    } else {
        IssueType::General
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_and_greeting_messages_are_general() {
        assert_eq!(classify_issue("printer"), IssueType::General);
        assert_eq!(classify_issue("Hello there"), IssueType::General);
        assert_eq!(classify_issue("I have a question about lunch"), IssueType::General);
    }

    #[test]
    fn test_password_wins_with_weighting() {
        assert_eq!(classify_issue("I forgot my password and my account is locked"), IssueType::Password);
        // One hit each: the password weight breaks the tie.
        assert_eq!(classify_issue("keyboard and login trouble"), IssueType::Password);
    }

    #[test]
    fn test_software_and_hardware() {
        assert_eq!(classify_issue("Excel keeps asking me to update the license"), IssueType::Software);
        assert_eq!(classify_issue("my laptop screen is flickering"), IssueType::Hardware);
        // Tie between hardware and software falls to hardware.
        assert_eq!(classify_issue("printer install help"), IssueType::Hardware);
    }

    #[test]
    fn test_greeting_detection_is_word_based() {
        assert!(is_greeting("Hi, my printer is broken"));
        assert!(is_greeting("good morning team"));
        assert!(!is_greeting("this is a high priority"));
        assert!(!is_greeting("they said goodbye"));
        assert!(!is_greeting("good work"));
    }

    #[test]
    fn test_contains_any_word() {
        assert!(contains_any_word("ok, bye!", &["bye", "end"]));
        assert!(!contains_any_word("my backend is down", &["end"]));
    }
}
