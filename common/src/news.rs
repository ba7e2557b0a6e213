use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// News item as delivered by the external news provider
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewsItem {
    pub title: String,
    pub summary: String,
    pub source: String,
    pub published_at: DateTime<Utc>,
    pub url: String,
}

impl NewsItem {
    /// Title and summary joined, the text every scorer reads.
    pub fn text(&self) -> String {
        if self.summary.is_empty() {
            self.title.clone()
        } else {
            format!("{}. {}", self.title, self.summary)
        }
    }

    /// Age in hours relative to `as_of`. Future-dated items count as fresh.
    pub fn age_hours(&self, as_of: DateTime<Utc>) -> f64 {
        let seconds = (as_of - self.published_at).num_seconds().max(0);
        seconds as f64 / 3600.0
    }
}

/// News item with its per-run ranking attributes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RankedNewsItem {
    pub item: NewsItem,
    pub relevance_score: f64,  // 0.0 to 1.0
    pub sentiment_weight: f64, // 0.0 to 1.0
    pub processing_order: usize,
}

impl RankedNewsItem {
    /// Ranking key: relevance x sentiment weight
    pub fn priority(&self) -> f64 {
        self.relevance_score * self.sentiment_weight
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    fn item(hours_ago: i64, now: DateTime<Utc>) -> NewsItem {
        NewsItem {
            title: "ACME beats estimates".to_string(),
            summary: String::new(),
            source: "Reuters".to_string(),
            published_at: now - Duration::hours(hours_ago),
            url: "https://example.com/acme".to_string(),
        }
    }

    #[test]
    fn test_age_hours() {
        let now = Utc::now();
        assert!((item(6, now).age_hours(now) - 6.0).abs() < 1e-9);
        assert_eq!(item(-3, now).age_hours(now), 0.0);
    }

    #[test]
    fn test_text_without_summary() {
        let now = Utc::now();
        assert_eq!(item(1, now).text(), "ACME beats estimates");
    }
}
