//! Offline message generation from canned templates.

use std::ops::RangeInclusive;
use std::time::Duration;

use rand::seq::IndexedRandom;
use rand::Rng;

use crate::types::{Category, GenerationOptions, MessageLength};

const EMOJI_PLACEHOLDER: &str = "{emoji}";

pub const WEATHER_PHRASES: [&str; 5] = [
    " Hope the weather is as perfect as you are!",
    " May the sunshine warm your heart today!",
    " Whatever the weather, you brighten my day!",
    " Rain or shine, you make everything beautiful!",
    " The forecast says lovely, just like you!",
];

pub fn templates(category: Category, length: MessageLength) -> &'static [&'static str; 5] {
    match (category, length) {
        (Category::Sweet, MessageLength::Short) => &[
            "Good morning sunshine! {emoji}",
            "Rise and shine beautiful! {emoji}",
            "Hope your day sparkles! {emoji}",
            "Morning sweetie! {emoji}",
            "Have a lovely day! {emoji}",
        ],
        (Category::Sweet, MessageLength::Medium) => &[
            "Good morning! Hope your day is filled with happiness {emoji}",
            "Rise and shine! Wishing you a wonderful day ahead {emoji}",
            "Morning sunshine! May today bring you lots of joy {emoji}",
            "Good morning beautiful! Hope your day is as sweet as you {emoji}",
            "Wake up and smile! Today is going to be amazing {emoji}",
        ],
        (Category::Sweet, MessageLength::Long) => &[
            "Good morning my dear! I hope you wake up feeling refreshed and ready to take on this beautiful day {emoji}",
            "Rise and shine sunshine! May your morning be bright and your day be filled with wonderful moments {emoji}",
            "Good morning! I'm sending you positive vibes and warm wishes for a day full of happiness and success {emoji}",
            "Wake up beautiful! The world is brighter with you in it, and I hope today brings you everything you deserve {emoji}",
            "Morning sweetie! I hope your coffee is strong, your day is productive, and your heart is full of joy {emoji}",
        ],
        (Category::Romantic, MessageLength::Short) => &[
            "Good morning my love! {emoji}",
            "Morning gorgeous! {emoji}",
            "You're my sunshine! {emoji}",
            "Love you more today! {emoji}",
            "My heart beats for you! {emoji}",
        ],
        (Category::Romantic, MessageLength::Medium) => &[
            "Good morning my love! You make every day brighter {emoji}",
            "Morning beautiful! Can't wait to see your smile today {emoji}",
            "Rise and shine my heart! You're my everything {emoji}",
            "Good morning gorgeous! Thinking of you always {emoji}",
            "Wake up my darling! You're the reason I smile {emoji}",
        ],
        (Category::Romantic, MessageLength::Long) => &[
            "Good morning my love! Every sunrise reminds me how blessed I am to have you in my life {emoji}",
            "Rise and shine beautiful! You're the first thing on my mind every morning and the last before I sleep {emoji}",
            "Good morning my heart! Distance means nothing when you mean everything, thinking of you always {emoji}",
            "Morning my darling! Your love gives me strength for each new day, and I cherish every moment with you {emoji}",
            "Wake up gorgeous! You're not just my love, you're my best friend, my inspiration, and my whole world {emoji}",
        ],
        (Category::Poetic, MessageLength::Short) => &[
            "Dawn whispers your name {emoji}",
            "Morning paints the sky golden {emoji}",
            "Sunrise brings new dreams {emoji}",
            "Light dances through windows {emoji}",
            "Nature awakens with beauty {emoji}",
        ],
        (Category::Poetic, MessageLength::Medium) => &[
            "As morning light kisses the earth, my thoughts drift to you {emoji}",
            "The sun rises like hope in my heart, thinking of you {emoji}",
            "Dawn breaks with whispered promises of a beautiful day {emoji}",
            "Morning dew sparkles like diamonds, reflecting your grace {emoji}",
            "The world awakens to symphony of birds singing your name {emoji}",
        ],
        (Category::Poetic, MessageLength::Long) => &[
            "As dawn breaks and paints the sky in shades of gold and pink, my heart whispers your name softly {emoji}",
            "The morning sun rises like a gentle symphony, filling the world with light as you fill my days with joy {emoji}",
            "In the quiet moments before the world awakens, I find peace knowing you're somewhere under this same beautiful sky {emoji}",
            "Like flowers that bloom with morning's first light, my love for you grows stronger with each passing day {emoji}",
            "The gentle breeze carries my thoughts to you as birds sing their morning songs and the world comes alive {emoji}",
        ],
    }
}

pub fn emojis(category: Category) -> &'static [&'static str; 5] {
    match category {
        Category::Sweet => &["☀️💕", "🌅✨", "💖🌸", "😊🌺", "🌻💫"],
        Category::Romantic => &["💖🌹", "❤️🌅", "💕✨", "😍💝", "🥰💖"],
        Category::Poetic => &["🌄💫", "🌅🕊️", "✨🌸", "🌺🦋", "🌻🌙"],
    }
}

/// Assembles one message. Never fails.
pub fn compose<R: Rng + ?Sized>(options: &GenerationOptions, rng: &mut R) -> String {
    let candidates = templates(options.category, options.message_length);
    let template = candidates.choose(&mut *rng).copied().unwrap_or(candidates[0]);

    let mut message = if options.include_emojis {
        let emoji = emojis(options.category)
            .choose(&mut *rng)
            .copied()
            .unwrap_or_default();
        template.replace(EMOJI_PLACEHOLDER, emoji)
    } else {
        template.replace(&format!(" {}", EMOJI_PLACEHOLDER), "")
    };

    if options.include_weather {
        if let Some(phrase) = WEATHER_PHRASES.choose(&mut *rng) {
            message.push_str(phrase);
        }
    }

    message
}

/// Local generator with an optional simulated latency, drawn per call
/// from `delay_ms`. The wait is a tokio sleep so other requests keep flowing.
#[derive(Debug, Clone, Default)]
pub struct TemplateGenerator {
    delay_ms: Option<RangeInclusive<u64>>,
}

impl TemplateGenerator {
    pub fn new(delay_ms: Option<RangeInclusive<u64>>) -> Self {
        Self { delay_ms }
    }

    pub fn instant() -> Self {
        Self::default()
    }

    pub async fn generate(&self, options: &GenerationOptions) -> String {
        // ThreadRng is !Send; keep it out of scope across the await.
        let (message, delay) = {
            let mut rng = rand::rng();
            let delay = self
                .delay_ms
                .clone()
                .filter(|range| !range.is_empty())
                .map(|range| Duration::from_millis(rng.random_range(range)));
            (compose(options, &mut rng), delay)
        };

        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }
        message
    }
}
