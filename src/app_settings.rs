use std::fmt;

use serde::{Deserialize, Serialize};

/// Persisted application settings. There is only ever one record, with id `1`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct AppSettings {
    pub id: Option<u32>,
    pub chat: ChatSettings,
}

impl AppSettings {
    pub fn with_defaults() -> Self {
        Self {
            id: Some(1),
            chat: ChatSettings::default(),
        }
    }
}

/// Everything the chat container needs to issue a request.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
pub struct ChatSettings {
    pub endpoint: EndpointSettings,
    pub general: GeneralSettings,
    pub safety: SafetySettings,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct EndpointSettings {
    pub api_base: String,
    pub api_path: String,
    #[serde(default)]
    pub protocol: StreamProtocol,
}

impl Default for EndpointSettings {
    fn default() -> Self {
        Self {
            api_base: "http://localhost:3000".to_string(),
            api_path: "/api/gemini-pro".to_string(),
            protocol: StreamProtocol::Text,
        }
    }
}

/// Wire format of the streamed reply body.
#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum StreamProtocol {
    /// Raw UTF-8 text chunks.
    #[default]
    Text,
    /// Newline separated `<code>:<json>` parts.
    Data,
}

impl StreamProtocol {
    pub const ALL: [StreamProtocol; 2] = [StreamProtocol::Text, StreamProtocol::Data];

    pub fn label(&self) -> &'static str {
        match self {
            StreamProtocol::Text => "text",
            StreamProtocol::Data => "data",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|p| p.label() == s)
    }
}

/// Generation parameters forwarded verbatim as `general_settings`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct GeneralSettings {
    pub temperature: f32,
    pub max_output_tokens: u32,
    pub top_p: f32,
    pub top_k: u32,
}

impl Default for GeneralSettings {
    fn default() -> Self {
        Self {
            temperature: 0.9,
            max_output_tokens: 2048,
            top_p: 1.0,
            top_k: 1,
        }
    }
}

impl GeneralSettings {
    pub const MAX_OUTPUT_TOKENS: u32 = 8192;

    /// Clamps every parameter into the range the endpoint accepts.
    pub fn normalized(&self) -> Self {
        let unit = |v: f32| if v.is_nan() { 0.0 } else { v.clamp(0.0, 1.0) };
        Self {
            temperature: unit(self.temperature),
            max_output_tokens: self.max_output_tokens.clamp(1, Self::MAX_OUTPUT_TOKENS),
            top_p: unit(self.top_p),
            top_k: self.top_k.max(1),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum HarmBlockThreshold {
    BlockNone,
    BlockOnlyHigh,
    #[default]
    BlockMediumAndAbove,
    BlockLowAndAbove,
}

impl HarmBlockThreshold {
    pub const ALL: [HarmBlockThreshold; 4] = [
        HarmBlockThreshold::BlockNone,
        HarmBlockThreshold::BlockOnlyHigh,
        HarmBlockThreshold::BlockMediumAndAbove,
        HarmBlockThreshold::BlockLowAndAbove,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HarmBlockThreshold::BlockNone => "Block none",
            HarmBlockThreshold::BlockOnlyHigh => "Block few",
            HarmBlockThreshold::BlockMediumAndAbove => "Block some",
            HarmBlockThreshold::BlockLowAndAbove => "Block most",
        }
    }

    pub fn from_label(label: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|t| t.label() == label)
    }
}

impl fmt::Display for HarmBlockThreshold {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Per-category block thresholds forwarded verbatim as `safety_settings`.
#[derive(Debug, Serialize, Deserialize, Clone, PartialEq, Default)]
#[serde(rename_all = "camelCase")]
pub struct SafetySettings {
    pub harassment: HarmBlockThreshold,
    pub hate_speech: HarmBlockThreshold,
    pub sexually_explicit: HarmBlockThreshold,
    pub dangerous_content: HarmBlockThreshold,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HarmCategory {
    Harassment,
    HateSpeech,
    SexuallyExplicit,
    DangerousContent,
}

impl HarmCategory {
    pub const ALL: [HarmCategory; 4] = [
        HarmCategory::Harassment,
        HarmCategory::HateSpeech,
        HarmCategory::SexuallyExplicit,
        HarmCategory::DangerousContent,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            HarmCategory::Harassment => "Harassment",
            HarmCategory::HateSpeech => "Hate speech",
            HarmCategory::SexuallyExplicit => "Sexually explicit",
            HarmCategory::DangerousContent => "Dangerous content",
        }
    }
}

impl SafetySettings {
    pub fn get(&self, category: HarmCategory) -> HarmBlockThreshold {
        match category {
            HarmCategory::Harassment => self.harassment,
            HarmCategory::HateSpeech => self.hate_speech,
            HarmCategory::SexuallyExplicit => self.sexually_explicit,
            HarmCategory::DangerousContent => self.dangerous_content,
        }
    }

    pub fn with(&self, category: HarmCategory, threshold: HarmBlockThreshold) -> Self {
        let mut s = self.clone();
        match category {
            HarmCategory::Harassment => s.harassment = threshold,
            HarmCategory::HateSpeech => s.hate_speech = threshold,
            HarmCategory::SexuallyExplicit => s.sexually_explicit = threshold,
            HarmCategory::DangerousContent => s.dangerous_content = threshold,
        }
        s
    }
}

#[cfg(test)]
mod tests {
    use serde_json::json;

    use super::*;

    #[test]
    fn general_settings_serialize_in_camel_case() {
        let v = serde_json::to_value(GeneralSettings::default()).unwrap();
        assert_eq!(
            v,
            json!({"temperature": 0.9f32, "maxOutputTokens": 2048, "topP": 1.0, "topK": 1})
        );
    }

    #[test]
    fn safety_thresholds_use_api_names() {
        let s = SafetySettings::default().with(HarmCategory::HateSpeech, HarmBlockThreshold::BlockNone);
        let v = serde_json::to_value(&s).unwrap();
        assert_eq!(v["hateSpeech"], "BLOCK_NONE");
        assert_eq!(v["harassment"], "BLOCK_MEDIUM_AND_ABOVE");
        assert_eq!(s.get(HarmCategory::HateSpeech), HarmBlockThreshold::BlockNone);
    }

    #[test]
    fn normalized_clamps_out_of_range_values() {
        let g = GeneralSettings {
            temperature: 3.5,
            max_output_tokens: 0,
            top_p: -1.0,
            top_k: 0,
        }
        .normalized();
        assert_eq!(g.temperature, 1.0);
        assert_eq!(g.max_output_tokens, 1);
        assert_eq!(g.top_p, 0.0);
        assert_eq!(g.top_k, 1);

        let big = GeneralSettings {
            max_output_tokens: 100_000,
            ..Default::default()
        };
        assert_eq!(big.normalized().max_output_tokens, GeneralSettings::MAX_OUTPUT_TOKENS);
    }

    #[test]
    fn threshold_labels_round_trip_through_select_options() {
        for t in HarmBlockThreshold::ALL {
            assert_eq!(HarmBlockThreshold::from_label(t.label()), Some(t));
        }
        assert_eq!(HarmBlockThreshold::from_label("nope"), None);
    }

    #[test]
    fn endpoint_protocol_defaults_when_missing() {
        let e: EndpointSettings =
            serde_json::from_value(json!({"api_base": "http://x", "api_path": "/p"})).unwrap();
        assert_eq!(e.protocol, StreamProtocol::Text);
        assert_eq!(StreamProtocol::parse("data"), Some(StreamProtocol::Data));
    }
}
