//! Natural-language summaries and "mood" descriptors for trade statistics.

use common::llm::{ChatClient, ChatMessage, ChatRequest, LlmError};
use serde::{Deserialize, Serialize};
use std::future::Future;
use tracing::{info, warn};

use crate::trade_data::TradeData;

const SUMMARY_SYSTEM_PROMPT: &str =
    "You are an expert cryptocurrency trading analyst. Provide clear, actionable insights.";
const MOOD_SYSTEM_PROMPT: &str =
    "You are a mood analyzer. Return ONLY valid JSON. No additional text.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum InsightKind {
    Summary,
    Mood,
}

impl InsightKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Summary => "summary",
            Self::Mood => "mood",
        }
    }

    fn temperature(self) -> f32 {
        match self {
            Self::Summary => 0.7,
            Self::Mood => 0.3,
        }
    }

    fn max_tokens(self) -> u32 {
        match self {
            Self::Summary => 300,
            Self::Mood => 150,
        }
    }
}

/// Keys the model leaves out take their value from [`Mood::fallback`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Mood {
    pub theme_name: String,
    pub emoji: String,
    pub color_theme: String,
    pub description: String,
    pub sound_effect: String,
}

impl Mood {
    /// Shown when the model's answer is not a valid mood object.
    pub fn fallback() -> Self {
        Self {
            theme_name: "Analysis Complete".to_string(),
            emoji: "📊".to_string(),
            color_theme: "blue".to_string(),
            description: "Trading data analyzed".to_string(),
            sound_effect: "neutral".to_string(),
        }
    }
}

impl Default for Mood {
    fn default() -> Self {
        Self::fallback()
    }
}

pub fn parse_mood(content: &str) -> Result<Mood, serde_json::Error> {
    serde_json::from_str(content.trim())
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(untagged)]
pub enum InsightContent {
    Text(String),
    Mood(Mood),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct InsightResponse {
    pub content: InsightContent,
}

/// `1234567.891` → `"1,234,567.891"`. At most three fraction digits, trailing zeros dropped.
pub fn format_thousands(value: f64) -> String {
    let rounded = format!("{:.3}", value.abs());
    let (int_part, frac_part) = rounded.split_once('.').unwrap_or((rounded.as_str(), ""));
    let frac = frac_part.trim_end_matches('0');

    let mut grouped = String::with_capacity(int_part.len() + int_part.len() / 3);
    for (i, ch) in int_part.chars().enumerate() {
        if i > 0 && (int_part.len() - i) % 3 == 0 {
            grouped.push(',');
        }
        grouped.push(ch);
    }

    let sign = if value < 0.0 && (int_part != "0" || !frac.is_empty()) {
        "-"
    } else {
        ""
    };
    if frac.is_empty() {
        format!("{sign}{grouped}")
    } else {
        format!("{sign}{grouped}.{frac}")
    }
}

pub fn summary_prompt(data: &TradeData) -> String {
    format!(
        "Analyze this trading data and provide a 4-5 sentence natural language summary:\n\
         - Total trades: {}\n\
         - Volume: ${}\n\
         - Net gain/loss: {}%\n\
         - Best performing token: {}\n\
         - Worst performing token: {}\n\
         - Trading behavior: {}\n\n\
         Provide insights about their trading performance, patterns, and suggestions.",
        data.total_trades,
        format_thousands(data.volume_usd),
        data.net_gain_loss_percent,
        data.best_token,
        data.worst_token,
        data.trading_behavior,
    )
}

pub fn mood_prompt(data: &TradeData) -> String {
    format!(
        "Based on this trading performance data, return ONLY a JSON object with mood/theme information:\n\
         - Net gain/loss: {}%\n\
         - Total trades: {}\n\
         - Volume: ${}\n\n\
         Return JSON format:\n\
         {{\n  \
           \"theme_name\": \"string\",\n  \
           \"emoji\": \"single emoji\",\n  \
           \"color_theme\": \"green|red|blue|purple|orange|gray\",\n  \
           \"description\": \"short description\",\n  \
           \"sound_effect\": \"celebration|sad_violin|neutral|excitement|warning\"\n\
         }}",
        data.net_gain_loss_percent,
        data.total_trades,
        format_thousands(data.volume_usd),
    )
}

pub fn insight_request(kind: InsightKind, data: &TradeData, model: &str) -> ChatRequest {
    let (system, user) = match kind {
        InsightKind::Summary => (SUMMARY_SYSTEM_PROMPT, summary_prompt(data)),
        InsightKind::Mood => (MOOD_SYSTEM_PROMPT, mood_prompt(data)),
    };
    ChatRequest::new(model, vec![ChatMessage::system(system), ChatMessage::user(user)])
        .with_temperature(kind.temperature())
        .with_max_tokens(kind.max_tokens())
}

pub trait TextGenerator {
    fn model(&self) -> &str;

    fn generate(
        &self,
        request: &ChatRequest,
    ) -> impl Future<Output = Result<String, LlmError>> + Send;
}

impl TextGenerator for ChatClient {
    fn model(&self) -> &str {
        ChatClient::model(self)
    }

    async fn generate(&self, request: &ChatRequest) -> Result<String, LlmError> {
        self.complete(request).await
    }
}

/// Ask the generator for one insight. Transport and status errors are
/// returned; an unparseable mood becomes [`Mood::fallback`].
pub async fn generate_insight<G: TextGenerator + Sync>(
    generator: &G,
    kind: InsightKind,
    data: &TradeData,
) -> Result<InsightContent, LlmError> {
    info!(kind = kind.as_str(), "requesting trade insight");
    let request = insight_request(kind, data, generator.model());
    let content = match generator.generate(&request).await {
        Ok(c) => c,
        Err(e) => {
            metrics::counter!("portfolio_llm_requests_total", "kind" => kind.as_str(), "status" => "error").increment(1);
            return Err(e);
        }
    };
    metrics::counter!("portfolio_llm_requests_total", "kind" => kind.as_str(), "status" => "ok").increment(1);

    Ok(match kind {
        InsightKind::Summary => InsightContent::Text(content),
        InsightKind::Mood => match parse_mood(&content) {
            Ok(mood) => InsightContent::Mood(mood),
            Err(e) => {
                warn!(error = %e, "failed to parse mood JSON, using fallback mood");
                metrics::counter!("portfolio_mood_fallbacks_total").increment(1);
                InsightContent::Mood(Mood::fallback())
            }
        },
    })
}
