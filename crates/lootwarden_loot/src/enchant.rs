//! # Enchantment Resolution
//!
//! The effective level of a modifier enchantment is the higher of the tool's
//! built-in level and whatever an optional third-party enchantment provider
//! reports. Provider failures count as level 0; they never fail a drop.

use std::collections::HashMap;
use std::sync::Arc;

use lootwarden_shared::catalog::normalize_id;

use crate::error::ProviderError;

/// Provider-reported levels above this are treated as malformed.
pub const MAX_PROVIDER_LEVEL: u32 = 255;

/// Enchantments the engine cares about.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum EnchantmentKind {
    /// Raises block drop chance and amount.
    Fortune,
    /// Raises mob drop chance and amount.
    Looting,
    /// Mining speed.
    Efficiency,
    /// Durability.
    Unbreaking,
    /// Flag: blocks drop themselves.
    SilkTouch,
    /// Flag: repair from experience.
    Mending,
}

impl EnchantmentKind {
    /// Canonical key (`silk_touch`).
    #[must_use]
    pub const fn key(self) -> &'static str {
        match self {
            Self::Fortune => "fortune",
            Self::Looting => "looting",
            Self::Efficiency => "efficiency",
            Self::Unbreaking => "unbreaking",
            Self::SilkTouch => "silk_touch",
            Self::Mending => "mending",
        }
    }

    /// Looks up a kind from any spelling of its key.
    #[must_use]
    pub fn from_key(raw: &str) -> Option<Self> {
        let key = normalize_id(raw);
        [
            Self::Fortune,
            Self::Looting,
            Self::Efficiency,
            Self::Unbreaking,
            Self::SilkTouch,
            Self::Mending,
        ]
        .into_iter()
        .find(|kind| kind.key() == key || kind.key().replace('_', "") == key)
    }

    /// Names the provider may know this enchantment by.
    #[must_use]
    pub fn provider_aliases(self) -> Vec<String> {
        let key = self.key();
        let mut spaced = String::with_capacity(key.len());
        let mut upper_next = true;
        for c in key.chars() {
            if c == '_' {
                spaced.push(' ');
                upper_next = true;
            } else if upper_next {
                spaced.push(c.to_ascii_uppercase());
                upper_next = false;
            } else {
                spaced.push(c);
            }
        }
        let mut aliases = vec![
            key.to_string(),
            key.to_ascii_uppercase(),
            spaced.clone(),
            spaced.replace(' ', ""),
        ];
        aliases.dedup();
        aliases
    }
}

/// The tool used for a break or kill, as seen by the core.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ToolItem {
    /// Material of the tool (`diamond_pickaxe`).
    pub material: String,
    /// Built-in enchantments keyed by canonical key.
    enchantments: HashMap<String, u32>,
}

impl ToolItem {
    /// Creates an unenchanted tool.
    #[must_use]
    pub fn new(material: impl AsRef<str>) -> Self {
        Self {
            material: normalize_id(material.as_ref()),
            enchantments: HashMap::new(),
        }
    }

    /// Adds a built-in enchantment. Keys are normalized.
    #[must_use]
    pub fn with_enchantment(mut self, key: &str, level: u32) -> Self {
        self.enchantments.insert(normalize_id(key), level);
        self
    }

    /// Built-in level of `kind` (0 if absent).
    #[must_use]
    pub fn builtin_level(&self, kind: EnchantmentKind) -> u32 {
        self.enchantments.get(kind.key()).copied().unwrap_or(0)
    }
}

/// Third-party enchantment plugin (implemented by the host adapter).
pub trait EnchantmentProvider: Send + Sync {
    /// Level of the named enchantment on the tool.
    fn enchantment_level(&self, tool: &ToolItem, name: &str) -> Result<u32, ProviderError>;
}

/// Resolves effective enchantment levels.
#[derive(Clone, Default)]
pub struct EnchantmentResolver {
    provider: Option<Arc<dyn EnchantmentProvider>>,
}

impl std::fmt::Debug for EnchantmentResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnchantmentResolver")
            .field("provider", &self.provider.is_some())
            .finish()
    }
}

impl EnchantmentResolver {
    /// Creates a resolver with an optional provider.
    #[must_use]
    pub fn new(provider: Option<Arc<dyn EnchantmentProvider>>) -> Self {
        Self { provider }
    }

    /// Creates a resolver that only reads built-in enchantments.
    #[must_use]
    pub fn builtin_only() -> Self {
        Self { provider: None }
    }

    /// Returns true if a provider is installed.
    #[must_use]
    pub fn has_provider(&self) -> bool {
        self.provider.is_some()
    }

    /// Effective level: `max(builtin, provider)`. No tool means level 0.
    #[must_use]
    pub fn resolve_level(&self, tool: Option<&ToolItem>, kind: EnchantmentKind) -> u32 {
        let Some(tool) = tool else {
            return 0;
        };
        tool.builtin_level(kind).max(self.provider_level(tool, kind))
    }

    /// Returns true if the effective level of a flag enchantment is positive.
    #[must_use]
    pub fn has_flag(&self, tool: Option<&ToolItem>, kind: EnchantmentKind) -> bool {
        self.resolve_level(tool, kind) > 0
    }

    fn provider_level(&self, tool: &ToolItem, kind: EnchantmentKind) -> u32 {
        let Some(provider) = &self.provider else {
            return 0;
        };
        let mut best = 0;
        for alias in kind.provider_aliases() {
            match provider.enchantment_level(tool, &alias) {
                Ok(level) if level > MAX_PROVIDER_LEVEL => {
                    tracing::debug!(%alias, level, "Ignoring out-of-range provider level");
                }
                Ok(level) => best = best.max(level),
                Err(error) => {
                    tracing::debug!(%alias, %error, "Enchantment provider lookup failed");
                }
            }
        }
        best
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct FixedProvider(u32);

    impl EnchantmentProvider for FixedProvider {
        fn enchantment_level(&self, _tool: &ToolItem, name: &str) -> Result<u32, ProviderError> {
            if name == "Fortune" {
                Ok(self.0)
            } else {
                Ok(0)
            }
        }
    }

    struct FailingProvider;

    impl EnchantmentProvider for FailingProvider {
        fn enchantment_level(&self, _tool: &ToolItem, _name: &str) -> Result<u32, ProviderError> {
            Err(ProviderError("class not found".into()))
        }
    }

    #[test]
    fn test_builtin_only_matches_tool() {
        let resolver = EnchantmentResolver::builtin_only();
        for level in 0..=10 {
            let tool = ToolItem::new("diamond_pickaxe").with_enchantment("minecraft:fortune", level);
            assert_eq!(resolver.resolve_level(Some(&tool), EnchantmentKind::Fortune), level);
        }
    }

    #[test]
    fn test_provider_can_raise_level() {
        let resolver = EnchantmentResolver::new(Some(Arc::new(FixedProvider(5))));
        let tool = ToolItem::new("diamond_pickaxe").with_enchantment("fortune", 3);
        assert_eq!(resolver.resolve_level(Some(&tool), EnchantmentKind::Fortune), 5);
    }

    #[test]
    fn test_provider_cannot_lower_level() {
        let resolver = EnchantmentResolver::new(Some(Arc::new(FixedProvider(1))));
        let tool = ToolItem::new("diamond_pickaxe").with_enchantment("fortune", 3);
        assert_eq!(resolver.resolve_level(Some(&tool), EnchantmentKind::Fortune), 3);
    }

    #[test]
    fn test_provider_failure_counts_as_zero() {
        let resolver = EnchantmentResolver::new(Some(Arc::new(FailingProvider)));
        let tool = ToolItem::new("iron_sword").with_enchantment("looting", 2);
        assert_eq!(resolver.resolve_level(Some(&tool), EnchantmentKind::Looting), 2);
        assert!(!resolver.has_flag(Some(&tool), EnchantmentKind::SilkTouch));
    }

    #[test]
    fn test_malformed_provider_level_ignored() {
        let resolver = EnchantmentResolver::new(Some(Arc::new(FixedProvider(10_000))));
        let tool = ToolItem::new("diamond_pickaxe");
        assert_eq!(resolver.resolve_level(Some(&tool), EnchantmentKind::Fortune), 0);
    }

    #[test]
    fn test_no_tool_is_level_zero() {
        let resolver = EnchantmentResolver::new(Some(Arc::new(FixedProvider(5))));
        assert_eq!(resolver.resolve_level(None, EnchantmentKind::Fortune), 0);
    }

    #[test]
    fn test_silk_touch_aliases() {
        let aliases = EnchantmentKind::SilkTouch.provider_aliases();
        assert!(aliases.contains(&"silk_touch".to_string()));
        assert!(aliases.contains(&"Silk Touch".to_string()));
        assert!(aliases.contains(&"SilkTouch".to_string()));
        assert_eq!(EnchantmentKind::from_key("SILK_TOUCH"), Some(EnchantmentKind::SilkTouch));
    }
}
