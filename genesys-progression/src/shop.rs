//! Coin-priced shop items and their effects.
use serde::{Deserialize, Serialize};

/// What a purchased item does to the buyer's progression.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum ItemEffect {
    /// Instant XP, routed through the level curve like any other grant.
    XpBoost { xp: u64 },
    /// Covers one missed day of streak decay.
    StreakShield,
    /// No mechanical effect; unique cosmetics are recorded as owned.
    Cosmetic,
}

/// A single item available in the shop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopItem {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub desc: String,
    /// Price in coins.
    pub price: u64,
    /// Whether this item can only be purchased once
    #[serde(default)]
    pub unique: bool,
    pub effect: ItemEffect,
}

impl ShopItem {
    #[must_use]
    pub fn new(id: impl Into<String>, name: impl Into<String>, price: u64, effect: ItemEffect) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            desc: String::new(),
            price,
            unique: false,
            effect,
        }
    }

    #[must_use]
    pub fn unique(mut self) -> Self {
        self.unique = true;
        self
    }

    #[must_use]
    pub fn with_desc(mut self, desc: impl Into<String>) -> Self {
        self.desc = desc.into();
        self
    }

    #[must_use]
    pub const fn can_afford(&self, coins: u64) -> bool {
        coins >= self.price
    }
}

/// Items offered to the user. Content is supplied by the caller.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShopCatalog {
    pub items: Vec<ShopItem>,
}

impl ShopCatalog {
    #[must_use]
    pub const fn new(items: Vec<ShopItem>) -> Self {
        Self { items }
    }

    /// Parse a catalog from JSON.
    ///
    /// # Errors
    ///
    /// Returns an error if the JSON is malformed or an item is missing a field.
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[must_use]
    pub fn find_item(&self, item_id: &str) -> Option<&ShopItem> {
        self.items.iter().find(|item| item.id == item_id)
    }

    /// Items the buyer can currently pay for.
    pub fn affordable(&self, coins: u64) -> impl Iterator<Item = &ShopItem> {
        self.items.iter().filter(move |item| item.can_afford(coins))
    }
}
