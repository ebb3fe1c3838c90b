//! Fixed daily readings per zodiac sign.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

const READINGS: &[(&str, &str)] = &[
    ("aries", "Bold moves pay off today. Start the thing you have been putting off."),
    ("taurus", "Slow and steady wins. A small comfort goes a long way this evening."),
    ("gemini", "Two good ideas compete for your attention. Write both down."),
    ("cancer", "Home is where your energy recharges. Call someone you miss."),
    ("leo", "Your warmth draws people in. Share the spotlight and it grows."),
    ("virgo", "Details matter today. A tidy desk leads to a tidy mind."),
    ("libra", "Balance returns after a hectic stretch. Say yes to a fair offer."),
    ("scorpio", "Trust your instincts in a tricky conversation. Depth beats speed."),
    ("sagittarius", "Adventure calls, even if it is only a new route home."),
    ("capricorn", "Patient effort is noticed. Keep climbing, the view is close."),
    ("aquarius", "An unusual idea finds an audience. Let it out."),
    ("pisces", "Creativity flows freely. Music helps you find the words."),
];

/// Returns a fixed reading for a zodiac sign.
///
/// # Parameters
///
/// - `sign` (required): Zodiac sign, case-insensitive.
pub struct Horoscope;

impl Horoscope {
    pub fn new() -> Self {
        Self
    }

    /// Known sign names, lowercase.
    pub fn signs() -> impl Iterator<Item = &'static str> {
        READINGS.iter().map(|(sign, _)| *sign)
    }
}

impl Default for Horoscope {
    fn default() -> Self {
        Self::new()
    }
}

fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars).collect(),
        None => String::new(),
    }
}

#[async_trait]
impl Tool for Horoscope {
    fn name(&self) -> &str {
        "get_horoscope"
    }

    fn description(&self) -> &str {
        "Returns today's horoscope reading for a zodiac sign."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "sign": {
                    "type": "string",
                    "description": "Zodiac sign, e.g. Aries",
                    "enum": Self::signs().collect::<Vec<_>>()
                }
            },
            "required": ["sign"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let sign = args.get_string("sign")?.trim().to_lowercase();

        let reading = READINGS
            .iter()
            .find(|(name, _)| *name == sign)
            .map(|(_, reading)| *reading)
            .ok_or_else(|| ToolError::invalid("sign", format!("unknown zodiac sign '{}'", sign)))?;

        Ok(ToolOutput::success(format!(
            "{}: {}",
            capitalize(&sign),
            reading
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn sign(value: &str) -> ToolArgs {
        let mut params = HashMap::new();
        params.insert("sign".to_string(), json!(value));
        ToolArgs::new(params)
    }

    #[tokio::test]
    async fn test_every_sign_has_a_reading() {
        let tool = Horoscope::new();
        assert_eq!(Horoscope::signs().count(), 12);
        for s in Horoscope::signs() {
            let result = tool.execute(sign(s)).await.unwrap();
            assert!(result.success);
        }
    }

    #[tokio::test]
    async fn test_sign_is_case_insensitive() {
        let result = Horoscope::new().execute(sign("  TAURUS ")).await.unwrap();
        assert!(result.content.starts_with("Taurus: "));
    }

    #[tokio::test]
    async fn test_unknown_sign() {
        let err = Horoscope::new().execute(sign("ophiuchus")).await.unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameter { .. }));
    }
}
