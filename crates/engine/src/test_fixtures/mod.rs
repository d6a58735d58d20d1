//! Shared test doubles and canned model output.

pub mod image_mocks;
pub mod llm_mocks;

/// Raw completions as the text backend tends to return them.
pub mod completions {
    /// A well-formed item with the embedded name marker.
    pub const FROSTBRAND_ITEM: &str = r#"{
        "description": "<b>Item Name:</b> Frostbrand<br>A blade of ice.",
        "itemType": "sword",
        "rarity": "very rare",
        "weight": 3,
        "price": 5000,
        "requiresAttunement": true,
        "weaponProperties": ["versatile", "finesse"],
        "damage": "1d8",
        "damageModifier": "+2",
        "damageType": "cold",
        "magical": true
    }"#;

    /// A plain, mundane sword that does not self-report a type.
    pub const IRON_SWORD_ITEM: &str = r#"{
        "description": "<b>Item Name:</b> Iron Blade<br>A simple iron blade, well balanced.",
        "rarity": "common",
        "weight": 3,
        "price": 15,
        "requiresAttunement": false,
        "damage": "1d6",
        "magical": false
    }"#;

    /// Text around the object and a trailing comma.
    pub const CHATTY_ITEM: &str = "Sure! Here is your item:\n{\"rarity\": \"rare\",}\nEnjoy!";
}
