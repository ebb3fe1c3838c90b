//! Expected-loss calculator.

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::debug;

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Computes expected loss as `loss * probability`.
///
/// # Parameters
///
/// - `loss` (required): Size of the loss if it happens. Any finite number.
/// - `probability` (required): Chance of the loss, between 0 and 1.
///
/// # Examples
///
/// ```json
/// {"loss": 100, "probability": 0.2}
/// ```
pub struct RiskCalculator;

impl RiskCalculator {
    pub fn new() -> Self {
        Self
    }
}

impl Default for RiskCalculator {
    fn default() -> Self {
        Self::new()
    }
}

fn format_number(value: f64) -> String {
    if value.fract() == 0.0 && value.abs() < 1e15 {
        format!("{:.0}", value)
    } else {
        format!("{}", value)
    }
}

#[async_trait]
impl Tool for RiskCalculator {
    fn name(&self) -> &str {
        "risk_calculator"
    }

    fn description(&self) -> &str {
        "Calculates expected loss from a potential loss amount and the probability \
         (0 to 1) that it occurs."
    }

    fn parameters(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "loss": {
                    "type": "number",
                    "description": "Loss amount if the event happens"
                },
                "probability": {
                    "type": "number",
                    "description": "Probability of the event, between 0 and 1"
                }
            },
            "required": ["loss", "probability"]
        })
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        let loss = args.get_f64("loss")?;
        let probability = args.get_f64("probability")?;

        if !loss.is_finite() {
            return Err(ToolError::invalid("loss", "must be a finite number"));
        }
        if !probability.is_finite() || !(0.0..=1.0).contains(&probability) {
            return Err(ToolError::invalid("probability", "must be between 0 and 1"));
        }

        let expected = loss * probability;
        debug!("Expected loss for {} at {}: {}", loss, probability, expected);

        Ok(ToolOutput::success(format!(
            "Expected loss is {}",
            format_number(expected)
        )))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn make_args(loss: Value, probability: Value) -> ToolArgs {
        let mut params = HashMap::new();
        params.insert("loss".to_string(), loss);
        params.insert("probability".to_string(), probability);
        ToolArgs::new(params)
    }

    #[tokio::test]
    async fn test_expected_loss() {
        let calc = RiskCalculator::new();

        let result = calc.execute(make_args(json!(100), json!(0.2))).await.unwrap();
        assert!(result.success);
        assert_eq!(result.content, "Expected loss is 20");

        let result = calc.execute(make_args(json!(50), json!(0.5))).await.unwrap();
        assert_eq!(result.content, "Expected loss is 25");

        let result = calc.execute(make_args(json!(10), json!(0.25))).await.unwrap();
        assert_eq!(result.content, "Expected loss is 2.5");
    }

    #[tokio::test]
    async fn test_probability_bounds() {
        let calc = RiskCalculator::new();

        assert!(calc.execute(make_args(json!(100), json!(0))).await.is_ok());
        assert!(calc.execute(make_args(json!(100), json!(1))).await.is_ok());

        let err = calc
            .execute(make_args(json!(100), json!(1.5)))
            .await
            .unwrap_err();
        assert!(matches!(err, ToolError::InvalidParameter { ref name, .. } if name == "probability"));

        assert!(calc.execute(make_args(json!(100), json!(-0.1))).await.is_err());
    }

    #[tokio::test]
    async fn test_missing_parameter() {
        let calc = RiskCalculator::new();
        let mut params = HashMap::new();
        params.insert("loss".to_string(), json!(100));

        let err = calc.execute(ToolArgs::new(params)).await.unwrap_err();
        assert!(matches!(err, ToolError::MissingParameter(ref p) if p == "probability"));
    }

    #[tokio::test]
    async fn test_string_numbers_accepted() {
        let calc = RiskCalculator::new();
        let result = calc
            .execute(make_args(json!("100"), json!("0.2")))
            .await
            .unwrap();
        assert_eq!(result.content, "Expected loss is 20");
    }
}
