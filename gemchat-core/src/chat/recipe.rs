use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

/// Appended as the final user turn of every recipe request.
pub const RECIPE_PROMPT: &str = "Please provide a recipe based on the conversation history.";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Recipe {
    pub recipe_name: String,
    #[serde(default)]
    pub ingredients: Vec<String>,
    #[serde(default)]
    pub instructions: Vec<String>,
}

impl Recipe {
    /// Structured-output schema sent with recipe requests.
    pub fn response_schema() -> Value {
        json!({
            "type": "OBJECT",
            "properties": {
                "recipeName": { "type": "STRING" },
                "ingredients": { "type": "ARRAY", "items": { "type": "STRING" } },
                "instructions": { "type": "ARRAY", "items": { "type": "STRING" } }
            },
            "propertyOrdering": ["recipeName", "ingredients", "instructions"]
        })
    }

    pub fn from_json(text: &str) -> Result<Self> {
        let recipe: Recipe =
            serde_json::from_str(text.trim()).context("Reply was not a valid recipe")?;
        Ok(recipe)
    }

    pub fn to_json(&self) -> String {
        serde_json::to_string(self).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parses_structured_reply() {
        let recipe = Recipe::from_json(
            r#"{"recipeName":"Pancakes","ingredients":["flour","milk"],"instructions":["mix","fry"]}"#,
        )
        .unwrap();

        assert_eq!(recipe.recipe_name, "Pancakes");
        assert_eq!(recipe.ingredients, vec!["flour", "milk"]);
        assert_eq!(recipe.instructions, vec!["mix", "fry"]);
    }

    #[test]
    fn test_missing_lists_default_to_empty() {
        let recipe = Recipe::from_json(r#" {"recipeName":"Toast"} "#).unwrap();
        assert!(recipe.ingredients.is_empty());
        assert!(recipe.instructions.is_empty());
    }

    #[test]
    fn test_rejects_non_recipe_text() {
        assert!(Recipe::from_json("Here is a lovely recipe!").is_err());
        assert!(Recipe::from_json(r#"{"ingredients":[]}"#).is_err());
    }

    #[test]
    fn test_json_uses_wire_field_names() {
        let recipe = Recipe {
            recipe_name: "Soup".to_string(),
            ingredients: vec![],
            instructions: vec!["boil".to_string()],
        };
        let value: Value = serde_json::from_str(&recipe.to_json()).unwrap();
        assert_eq!(value["recipeName"], "Soup");
        assert_eq!(Recipe::from_json(&recipe.to_json()).unwrap(), recipe);
    }

    #[test]
    fn test_schema_orders_properties() {
        let schema = Recipe::response_schema();
        assert_eq!(schema["type"], "OBJECT");
        assert_eq!(
            schema["propertyOrdering"],
            json!(["recipeName", "ingredients", "instructions"])
        );
        assert_eq!(schema["properties"]["ingredients"]["items"]["type"], "STRING");
    }
}
