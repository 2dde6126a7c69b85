use super::types::RetrievalItem;
use crate::lock;
use std::sync::RwLock;

/// Similarity as a percentage with at most one decimal, e.g. `"95.7%"`.
///
/// The score is clamped to [-1, 1] first. Returns `None` for a missing or
/// non-finite score.
///
/// ```
/// use ragdesk_core::rag::format_score;
///
/// assert_eq!(format_score(Some(0.957)).as_deref(), Some("95.7%"));
/// assert_eq!(format_score(Some(-2.0)).as_deref(), Some("-100%"));
/// assert_eq!(format_score(Some(f64::NAN)), None);
/// ```
pub fn format_score(score: Option<f64>) -> Option<String> {
    let score = score.filter(|s| s.is_finite())?;
    let clamped = score.clamp(-1.0, 1.0);
    // Round half up, then normalise -0 to 0
    let percent = (clamped * 1000.0 + 0.5).floor() / 10.0 + 0.0;
    Some(format!("{percent}%"))
}

/// One rendered passage.
#[derive(Debug, Clone, PartialEq)]
pub struct Excerpt {
    /// "Excerpt N", 1-indexed
    pub label: String,
    pub similarity: Option<String>,
    pub text: String,
}

/// What the retrieval-results region currently shows.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct RetrievalView {
    /// When `false` the region is hidden entirely
    pub visible: bool,
    pub excerpts: Vec<Excerpt>,
}

/// Shows the passages the server used to ground the latest answer.
///
/// Every render replaces the previous state wholesale.
#[derive(Debug, Default)]
pub struct RetrievalDisplay {
    view: RwLock<RetrievalView>,
}

impl RetrievalDisplay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Renders `items` in server order. Absent or empty input hides the region.
    pub fn render(&self, items: Option<&[RetrievalItem]>) {
        let view = match items {
            Some(items) if !items.is_empty() => RetrievalView {
                visible: true,
                excerpts: items
                    .iter()
                    .enumerate()
                    .map(|(idx, item)| Excerpt {
                        label: format!("Excerpt {}", idx + 1),
                        similarity: format_score(item.score),
                        text: item.text.clone().unwrap_or_default(),
                    })
                    .collect(),
            },
            _ => RetrievalView::default(),
        };

        *lock::write(&self.view) = view;
    }

    /// Hides the region.
    pub fn clear(&self) {
        self.render(None);
    }

    pub fn view(&self) -> RetrievalView {
        lock::read(&self.view).clone()
    }

    pub fn is_visible(&self) -> bool {
        lock::read(&self.view).visible
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_format_score() {
        assert_eq!(format_score(Some(0.957)).as_deref(), Some("95.7%"));
        assert_eq!(format_score(Some(1.0)).as_deref(), Some("100%"));
        assert_eq!(format_score(Some(3.5)).as_deref(), Some("100%"));
        assert_eq!(format_score(Some(-2.0)).as_deref(), Some("-100%"));
        assert_eq!(format_score(Some(0.0)).as_deref(), Some("0%"));
        assert_eq!(format_score(Some(-0.00001)).as_deref(), Some("0%"));
        assert_eq!(format_score(Some(0.12345)).as_deref(), Some("12.3%"));
        assert_eq!(format_score(Some(f64::INFINITY)), None);
        assert_eq!(format_score(Some(f64::NAN)), None);
        assert_eq!(format_score(None), None);
    }

    #[test]
    fn test_empty_and_absent_hide_region() {
        let display = RetrievalDisplay::new();
        display.render(Some(&[RetrievalItem::new("x", 0.5)]));
        assert!(display.is_visible());

        display.render(Some(&[]));
        assert!(!display.is_visible());
        assert!(display.view().excerpts.is_empty());

        display.render(Some(&[RetrievalItem::new("x", 0.5)]));
        display.render(None);
        assert!(!display.is_visible());
    }

    #[test]
    fn test_item_without_score_has_no_percentage() {
        let display = RetrievalDisplay::new();
        let item = RetrievalItem {
            text: Some("a".to_string()),
            ..Default::default()
        };
        display.render(Some(&[item]));

        let view = display.view();
        assert!(view.visible);
        assert_eq!(
            view.excerpts,
            vec![Excerpt {
                label: "Excerpt 1".to_string(),
                similarity: None,
                text: "a".to_string(),
            }]
        );
    }

    #[test]
    fn test_render_keeps_server_order_and_replaces_state() {
        let display = RetrievalDisplay::new();
        display.render(Some(&[
            RetrievalItem::new("first", 0.2),
            RetrievalItem::new("second", 0.9),
            RetrievalItem::default(),
        ]));

        let view = display.view();
        let texts: Vec<_> = view.excerpts.iter().map(|e| e.text.as_str()).collect();
        assert_eq!(texts, vec!["first", "second", ""]);
        assert_eq!(view.excerpts[2].label, "Excerpt 3");

        display.render(Some(&[RetrievalItem::new("only", 0.1)]));
        assert_eq!(display.view().excerpts.len(), 1);
    }
}
