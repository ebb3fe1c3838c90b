//! Cat and dog facts from a fixed list.

use async_trait::async_trait;
use serde_json::{json, Value};

use crate::error::ToolError;
use crate::tool::{Tool, ToolArgs, ToolOutput};

/// Most facts returned by one call.
pub const MAX_FACTS: u64 = 5;

const CAT_FACTS: &[&str] = &[
    "Cats sleep for around 13 to 16 hours a day.",
    "A group of cats is called a clowder.",
    "Cats have five toes on their front paws but only four on the back.",
    "A cat's purr vibrates at a frequency between 25 and 150 hertz.",
    "Cats can rotate their ears 180 degrees.",
    "Adult cats rarely meow at each other; they mostly meow at people.",
];

const DOG_FACTS: &[&str] = &[
    "A dog's sense of smell is tens of thousands of times stronger than a human's.",
    "Dogs have about 1,700 taste buds, compared with about 9,000 in humans.",
    "The Basenji is known as the barkless dog; it yodels instead.",
    "A dog's nose print is unique, much like a human fingerprint.",
    "Greyhounds can reach speeds of around 45 miles per hour.",
    "Puppies are born deaf and start hearing at about three weeks old.",
];

fn count_parameters(animal: &str) -> Value {
    json!({
        "type": "object",
        "properties": {
            "count": {
                "type": "integer",
                "description": format!("Number of {} facts to return (1-{})", animal, MAX_FACTS),
                "default": 1
            }
        }
    })
}

fn take_facts(facts: &[&str], args: &ToolArgs) -> Result<ToolOutput, ToolError> {
    let count = args.get_u64_or("count", 1)?.clamp(1, MAX_FACTS) as usize;
    let selected: Vec<&str> = facts.iter().copied().take(count).collect();
    Ok(ToolOutput::success(selected.join("\n")))
}

/// Returns one or more cat facts.
pub struct CatFacts;

impl CatFacts {
    pub fn new() -> Self {
        Self
    }
}

impl Default for CatFacts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for CatFacts {
    fn name(&self) -> &str {
        "get_cat_facts"
    }

    fn description(&self) -> &str {
        "Returns interesting facts about cats."
    }

    fn parameters(&self) -> Value {
        count_parameters("cat")
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        take_facts(CAT_FACTS, &args)
    }
}

/// Returns one or more dog facts.
pub struct DogFacts;

impl DogFacts {
    pub fn new() -> Self {
        Self
    }
}

impl Default for DogFacts {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Tool for DogFacts {
    fn name(&self) -> &str {
        "get_dog_facts"
    }

    fn description(&self) -> &str {
        "Returns interesting facts about dogs."
    }

    fn parameters(&self) -> Value {
        count_parameters("dog")
    }

    async fn execute(&self, args: ToolArgs) -> Result<ToolOutput, ToolError> {
        take_facts(DOG_FACTS, &args)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn count(n: Value) -> ToolArgs {
        let mut params = HashMap::new();
        params.insert("count".to_string(), n);
        ToolArgs::new(params)
    }

    #[tokio::test]
    async fn test_default_is_one_fact() {
        let result = CatFacts::new().execute(ToolArgs::default()).await.unwrap();
        assert!(result.success);
        assert_eq!(result.content.lines().count(), 1);
    }

    #[tokio::test]
    async fn test_count_is_clamped() {
        let dogs = DogFacts::new();
        assert_eq!(dogs.execute(count(json!(3))).await.unwrap().content.lines().count(), 3);
        assert_eq!(dogs.execute(count(json!(0))).await.unwrap().content.lines().count(), 1);
        assert_eq!(
            dogs.execute(count(json!(99))).await.unwrap().content.lines().count(),
            MAX_FACTS as usize
        );
    }

    #[tokio::test]
    async fn test_bad_count() {
        assert!(CatFacts::new().execute(count(json!("lots"))).await.is_err());
    }
}
