//! System prompts and token budgets for every backend call the pipeline makes.

pub const ITEM_SYSTEM: &str = "You are a virtual tabletop assistant creating structured JSON for a single, consistent DnD 5e item. \
Do not include an explicit item name field; instead, output the item description beginning with '<b>Item Name:</b> ' followed by the item name and a '<br>' tag, then the detailed lore. \
The JSON must include a non-empty 'description' field (which starts with this marker) along with the fields 'itemType', 'rarity', 'weight', 'price', and 'requiresAttunement'. \
If it's a weapon, include 'weaponProperties' and a 'damage' field with the damage dice (e.g., '1d8', '2d6'), a 'damageType', and any bonus modifiers as 'damageModifier'; \
if it's armor, include 'armorType' and 'ac'. \
Decide if 'magical' is true or false. \
Output valid JSON with double-quoted property names and no extra text.";
pub const ITEM_MAX_TOKENS: u32 = 700;

pub const NAME_SYSTEM: &str = "You are an expert in fantasy RPGs. Generate a short item name in plain text. \
Do not include the word 'dragon' unless explicitly requested. No JSON.";
pub const NAME_MAX_TOKENS: u32 = 20;

pub const REFINE_NAME_SYSTEM: &str = "You are an expert in fantasy RPGs. You are given an item's current name and its finished description. \
Reply with a better fitting name for the item, in plain text, that matches the description. \
Keep the kind of item the current name states. No quotes, no JSON, no commentary.";

pub const FIX_JSON_SYSTEM: &str = "You are a helpful assistant. The user provided invalid JSON. \
Remove any disclaimers, partial lines, or text outside of the JSON object. \
If there is text before or after the JSON braces, remove it. \
Fix it so it's strictly valid JSON with double-quoted property names. No extra commentary.";
pub const FIX_JSON_MAX_TOKENS: u32 = 900;

pub const TABLE_SYSTEM: &str = "You are a virtual tabletop assistant creating strictly valid JSON for a DnD 5e roll table. \
Output valid JSON with double-quoted property names and no extra commentary or text outside the JSON. \
No disclaimers, no line breaks before or after the JSON object. \
The JSON must include the following fields: 'name', 'formula', 'description', 'tableType', and 'entries'. \
For tables of type 'items', each entry must be an object with 'text', 'minRange', 'maxRange', 'weight', and 'documentCollection' set to 'Item'. \
For generic roll tables, include additional details from the prompt (e.g., city, biome, or theme details) to create tailored, descriptive entries. \
Ensure that the output contains exactly 20 entries. \
Output only the JSON object with no extra commentary.";
pub const TABLE_MAX_TOKENS: u32 = 900;

pub const AUGMENT_MAX_TOKENS: u32 = 250;

/// Ask the backend to rewrite a record that disagrees with the requested kind of item.
pub fn mismatch_system(expected: &str, found: &str) -> String {
    format!(
        "You are a virtual tabletop assistant. The item name or prompt indicates it is a {expected}, \
         but the JSON indicates it is a {found}. Fix the JSON so that the item is consistent as a \
         {expected}. Output only valid JSON."
    )
}

pub fn augment_system(count: usize) -> String {
    format!(
        "You are an expert in fantasy RPGs. Write exactly {count} distinct magical properties for \
         the item below, each a single sentence on its own line. When a property grants a numeric \
         bonus, phrase it as '+N to <ability score, AC, attack rolls, damage rolls or saving throws>' \
         with N between 1 and 3. No numbering, no bullets, no extra commentary."
    )
}

pub fn augment_user(name: &str, description: &str) -> String {
    format!("Item: {}\nDescription: {}", name, description)
}

pub fn refine_name_user(current: &str, description: &str) -> String {
    format!("Current name: {}\nDescription: {}", current, description)
}
