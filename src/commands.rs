//! One-shot commands: query the backend once and report.

use colored::*;

use crate::api::{ApiClient, ApiResult};
use crate::chat::FALLBACK_REPLY;
use crate::metrics::{metrics_view, MetricsView, UNAVAILABLE_MESSAGE};

/// Lines to print and whether the command succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Report {
    pub lines: Vec<String>,
    pub ok: bool,
}

impl Report {
    fn new(title: &str) -> Self {
        Self {
            lines: vec![String::new(), title.bold().blue().to_string(), "=".repeat(30).dimmed().to_string()],
            ok: false,
        }
    }

    fn line(&mut self, line: impl Into<String>) {
        self.lines.push(line.into());
    }

    pub fn print(&self) {
        for line in &self.lines {
            println!("{line}");
        }
    }
}

pub async fn status(client: &ApiClient) -> Report {
    let mut report = Report::new("🏥 PHIA API Status");

    match client.get_status().await {
        ApiResult::Data(status) if status.is_running() => {
            report.line(format!("{} {}", "●".green(), "Connected".bold()));
            report.line(format!("  agent:     {}", status.phia_agent));
            report.line(format!("  timestamp: {}", status.timestamp.dimmed()));
            report.ok = true;
        }
        ApiResult::Data(status) => {
            report.line(format!("{} {} (status: {})", "●".red(), "Disconnected".bold(), status.status));
        }
        ApiResult::Error(e) => {
            report.line(format!("{} {}", "●".red(), "Disconnected".bold()));
            report.line(format!("{}: {}", "Error reaching backend".red(), e));
            report.line(format!("Backend: {}", client.base_url().bold()));
        }
    }
    report
}

pub async fn summary(client: &ApiClient) -> Report {
    let mut report = Report::new("📊 Health Dashboard");

    let result = client.get_health_summary().await;
    match metrics_view(result.data(), false) {
        MetricsView::Cards(cards) => {
            for card in &cards {
                report.line(format!("{}  {:<16} {}", card.icon(), card.label(), card.value.bold()));
            }
            report.ok = true;
        }
        MetricsView::Unavailable | MetricsView::Loading => {
            report.line(UNAVAILABLE_MESSAGE.red().to_string());
            if let Some(e) = result.error() {
                report.line(e.dimmed().to_string());
            }
        }
    }
    report
}

/// Send one question. A failed request still prints the fallback reply.
pub async fn ask(client: &ApiClient, question: &str) -> Report {
    let question = question.trim();
    if question.is_empty() {
        return Report {
            lines: vec!["Nothing to ask.".yellow().to_string()],
            ok: false,
        };
    }

    let mut report = Report {
        lines: vec!["🤖 Asking PHIA...".to_string(), String::new()],
        ok: false,
    };
    report.line("PHIA:".bold().green().to_string());

    match client.send_chat_message(question).await {
        ApiResult::Data(reply) => {
            report.line(reply.response);
            report.ok = true;
        }
        ApiResult::Error(e) => {
            report.line(FALLBACK_REPLY);
            report.line(String::new());
            report.line(format!("{}: {}", "Error".red(), e.dimmed()));
        }
    }
    report
}
