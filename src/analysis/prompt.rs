pub const DEFAULT_PROMPT: &str = "You are a nutrition assistant. From this photo, estimate what the food is and give an approximate nutrition breakdown.\n\
\n\
First write a short markdown report with: (1) what the dish looks like, (2) the assumed portion size, \
(3) estimated calories (kcal), protein, carbs and fats (g), and (4) a short note about uncertainty.\n\
\n\
Then append exactly one fenced code block tagged json containing a single object with these keys:\n\
```json\n\
{\n\
  \"dish_name\": \"string\",\n\
  \"portion_size_g\": 0,\n\
  \"calories_kcal\": 0,\n\
  \"protein_g\": 0,\n\
  \"carbs_g\": 0,\n\
  \"fats_g\": 0,\n\
  \"ingredients\": [\"string\"]\n\
}\n\
```\n\
Use plain numbers without units inside the JSON.";

/// Returns the trimmed user prompt, or the default one when it is blank.
pub fn resolve_prompt(prompt: Option<&str>) -> &str {
    match prompt.map(str::trim) {
        Some(p) if !p.is_empty() => p,
        _ => DEFAULT_PROMPT,
    }
}
