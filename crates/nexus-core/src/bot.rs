//! Canned answers for the automated chat participant.
//!
//! Rules are checked in order against the lowercased input and the first
//! hit wins. Single-word keywords must match a whole word ("hi" does not
//! fire on "this"); phrases match anywhere.

const GREETING: &[&str] = &["hello", "hi", "hey", "greetings", "xin chào", "chào"];
const IDENTITY: &[&str] = &["who are you", "what are you", "your name"];
const WEATHER: &[&str] = &["weather", "forecast", "temperature", "thời tiết"];
const HELP: &[&str] = &["help", "support", "assist", "giúp"];

pub const GREETING_REPLY: &str = "Hello! I'm Natch. How can I help you today?";
pub const IDENTITY_REPLY: &str =
    "I'm Natch, the automated assistant of this community. I answer simple questions.";
pub const WEATHER_REPLY: &str =
    "I can't check live weather data, so please consult a local forecast service.";
pub const HELP_REPLY: &str =
    "You can ask me who I am, say hello, or message an admin for account issues.";
pub const GENERIC_REPLY: &str = "Thanks for your message! I've noted it.";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Intent {
    Greeting,
    Identity,
    Weather,
    Help,
    Other,
}

impl Intent {
    pub fn reply(self) -> &'static str {
        match self {
            Intent::Greeting => GREETING_REPLY,
            Intent::Identity => IDENTITY_REPLY,
            Intent::Weather => WEATHER_REPLY,
            Intent::Help => HELP_REPLY,
            Intent::Other => GENERIC_REPLY,
        }
    }
}

pub fn classify(input: &str) -> Intent {
    let text = input.to_lowercase();
    let words: Vec<&str> = text
        .split(|c: char| !c.is_alphanumeric())
        .filter(|w| !w.is_empty())
        .collect();

    let hit = |keywords: &[&str]| {
        keywords.iter().any(|k| {
            if k.contains(' ') {
                text.contains(k)
            } else {
                words.contains(k)
            }
        })
    };

    if hit(GREETING) {
        Intent::Greeting
    } else if hit(IDENTITY) {
        Intent::Identity
    } else if hit(WEATHER) {
        Intent::Weather
    } else if hit(HELP) {
        Intent::Help
    } else {
        Intent::Other
    }
}

/// Reply body for an incoming message.
pub fn reply_to(input: &str) -> &'static str {
    classify(input).reply()
}
