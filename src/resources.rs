//! Static page copy: mood lifters, reminder, disclaimer and canned replies

use serde::Serialize;

pub const APP_TITLE: &str = "SunriseSpirit";

pub const TAGLINE: &str = "Share how you're feeling, and let our AI friend lift your spirits";

pub const MOOD_LIFTERS: &[&str] = &[
    "Take three deep breaths",
    "Listen to your favorite upbeat song",
    "Step outside for 5 minutes",
    "Text a friend who makes you smile",
    "Watch a funny video",
];

pub const REMINDER: &str = "Your feelings are valid, but they aren't permanent. \
Small positive actions can create momentum toward feeling better.";

pub const DISCLAIMER: &[&str] = &[
    "This application is designed to provide emotional support, not to replace professional mental health care.",
    "If you're experiencing severe or persistent emotional distress, please reach out to a mental health professional.",
];

/// Reply used when no model client could be initialised
pub const UNAVAILABLE_REPLY: &str =
    "I'm having trouble connecting to my AI brain right now. Please try again later.";

/// Reply used when a completion fails
pub const GENERATION_FAILED_REPLY: &str =
    "I'm having trouble generating a helpful response right now. Please try again.";

/// The resources block rendered under the chat
#[derive(Debug, Clone, Serialize)]
pub struct MoodResources {
    pub title: &'static str,
    pub tagline: &'static str,
    pub mood_lifters: &'static [&'static str],
    pub reminder: &'static str,
    pub disclaimer: &'static [&'static str],
}

pub fn mood_resources() -> MoodResources {
    MoodResources {
        title: APP_TITLE,
        tagline: TAGLINE,
        mood_lifters: MOOD_LIFTERS,
        reminder: REMINDER,
        disclaimer: DISCLAIMER,
    }
}
