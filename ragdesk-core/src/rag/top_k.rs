use crate::lock;
use crate::preferences::{Preferences, MAX_TOP_K, MIN_TOP_K};
use std::sync::RwLock;

/// Parses a top-K input and clamps it to `1..=10`.
///
/// Decimal input is truncated toward zero. Blank or non-numeric input yields
/// `default`.
///
/// ```
/// use ragdesk_core::rag::clamp_top_k;
///
/// assert_eq!(clamp_top_k("4", 3), 4);
/// assert_eq!(clamp_top_k("25", 3), 10);
/// assert_eq!(clamp_top_k("0", 3), 1);
/// assert_eq!(clamp_top_k("many", 3), 3);
/// ```
pub fn clamp_top_k(raw: &str, default: usize) -> usize {
    let raw = raw.trim();
    let parsed = raw
        .parse::<i64>()
        .ok()
        .or_else(|| {
            raw.parse::<f64>()
                .ok()
                .filter(|v| v.is_finite())
                .map(|v| v.trunc() as i64)
        });

    match parsed {
        Some(v) => v.clamp(MIN_TOP_K as i64, MAX_TOP_K as i64) as usize,
        None => default.clamp(MIN_TOP_K, MAX_TOP_K),
    }
}

/// The top-K input control.
///
/// Holds the raw text the user typed. Resolving it clamps the value, writes the
/// clamped number back into the input and persists it.
#[derive(Debug)]
pub struct TopKControl {
    prefs: Preferences,
    default: usize,
    input: RwLock<String>,
}

impl TopKControl {
    /// Initialises the input from the stored preference, else `default`.
    pub fn new(prefs: Preferences, default: usize) -> Self {
        let default = default.clamp(MIN_TOP_K, MAX_TOP_K);
        let initial = prefs.top_k().unwrap_or(default);
        Self {
            prefs,
            default,
            input: RwLock::new(initial.to_string()),
        }
    }

    /// Current raw input text.
    pub fn input(&self) -> String {
        lock::read(&self.input).clone()
    }

    /// Records a user edit and persists its clamped value.
    pub fn set_input(&self, raw: &str) -> usize {
        *lock::write(&self.input) = raw.to_string();
        self.resolve()
    }

    /// Clamps the current input, writes it back, persists it and returns it.
    pub fn resolve(&self) -> usize {
        let mut input = lock::write(&self.input);
        let value = clamp_top_k(&input, self.default);
        *input = value.to_string();
        drop(input);

        self.prefs.set_top_k(value);
        value
    }
}
