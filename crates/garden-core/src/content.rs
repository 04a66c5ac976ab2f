//! Content selection: intention, rotating tips, completion messages.

use crate::catalog::{FlowerCatalog, GENERIC_TIPS};

/// Length of one tip rotation block.
pub const TIP_BLOCK_SECS: u64 = 5 * 60;

/// Celebratory messages, rotated once per completed session.
pub const COMPLETION_MESSAGES: &[&str] = &[
    "Your flower is in full bloom. Well done!",
    "Another bloom for the meadow. Beautiful focus!",
    "You stayed with it. The garden grows because of you.",
    "Session complete. Take a breath and enjoy the view.",
    "A new flower joins the collective meadow. Thank you!",
];

pub const EARLY_END_MESSAGE: &str =
    "Session ended early. No flower was planted this time, and that is fine.";

/// Picks the text shown alongside a running session.
#[derive(Debug, Clone)]
pub struct ContentSelector<'a> {
    catalog: &'a FlowerCatalog,
}

impl<'a> ContentSelector<'a> {
    pub fn new(catalog: &'a FlowerCatalog) -> Self {
        Self { catalog }
    }

    pub fn intention_for(&self, flower_code: &str) -> Option<&'a str> {
        self.catalog
            .get(flower_code)
            .map(|f| f.intention_text.as_str())
    }

    /// Tip for the 5-minute block containing `elapsed_secs`, wrapping around
    /// the flower's tip list.
    pub fn tip_for(&self, flower_code: &str, elapsed_secs: u64) -> &'a str {
        let block = (elapsed_secs / TIP_BLOCK_SECS) as usize;
        match self.catalog.get(flower_code) {
            Some(flower) if !flower.tips.is_empty() => {
                flower.tips[block % flower.tips.len()].as_str()
            }
            _ => GENERIC_TIPS[block % GENERIC_TIPS.len()],
        }
    }
}

pub fn completion_message(counter: u64) -> &'static str {
    COMPLETION_MESSAGES[(counter % COMPLETION_MESSAGES.len() as u64) as usize]
}

pub fn early_end_message() -> &'static str {
    EARLY_END_MESSAGE
}
