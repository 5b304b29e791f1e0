//! Pure mapping from the latest health summary to what the metrics row shows.

use crate::models::HealthSummary;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MetricKind {
    HeartRate,
    Steps,
    Sleep,
    ActiveMinutes,
}

impl MetricKind {
    pub fn label(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "Heart Rate",
            MetricKind::Steps => "Steps Today",
            MetricKind::Sleep => "Sleep Duration",
            MetricKind::ActiveMinutes => "Active Minutes",
        }
    }

    pub fn icon(&self) -> &'static str {
        match self {
            MetricKind::HeartRate => "💓",
            MetricKind::Steps => "👟",
            MetricKind::Sleep => "😴",
            MetricKind::ActiveMinutes => "🔥",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MetricCard {
    pub kind: MetricKind,
    pub value: String,
}

impl MetricCard {
    fn new(kind: MetricKind, value: String) -> Self {
        Self { kind, value }
    }

    pub fn label(&self) -> &'static str {
        self.kind.label()
    }

    pub fn icon(&self) -> &'static str {
        self.kind.icon()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MetricsView {
    /// Skeleton placeholders, one per card
    Loading,
    /// No summary to show
    Unavailable,
    Cards([MetricCard; 4]),
}

pub const UNAVAILABLE_MESSAGE: &str = "Unable to load health data";

pub fn metrics_view(summary: Option<&HealthSummary>, loading: bool) -> MetricsView {
    if loading {
        return MetricsView::Loading;
    }

    let Some(summary) = summary else {
        return MetricsView::Unavailable;
    };

    MetricsView::Cards([
        MetricCard::new(MetricKind::HeartRate, format!("{} bpm", summary.heart_rate)),
        MetricCard::new(MetricKind::Steps, group_thousands(summary.steps)),
        MetricCard::new(MetricKind::Sleep, summary.sleep.clone()),
        MetricCard::new(MetricKind::ActiveMinutes, format!("{}min", summary.active_minutes)),
    ])
}

/// 8543 -> "8,543"
fn group_thousands(n: u32) -> String {
    let digits = n.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, c) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(c);
    }
    out
}
