//! Collaborators decided once at startup.
//!
//! The host adapter builds one [`PluginContext`] and hands it to
//! [`crate::Lootwarden::enable`]. Optional plugins (economy, third-party
//! enchantments) are detected by the adapter and either set here or left out;
//! nothing looks them up again afterwards.

use std::sync::Arc;

use lootwarden_loot::{EnchantmentProvider, EnchantmentResolver};
use lootwarden_mobs::{AbilityHost, RaidHost};
use lootwarden_quest::{QuestNotifier, SilentNotifier};
use lootwarden_shared::{Clock, EconomyProvider, ItemCatalog, SystemClock};

/// Everything the plugin needs from its host.
#[derive(Clone)]
pub struct PluginContext {
    /// Custom-item catalog.
    pub catalog: Arc<dyn ItemCatalog>,
    /// Economy plugin, if installed.
    pub economy: Option<Arc<dyn EconomyProvider>>,
    /// Enchantment level lookup.
    pub enchantments: EnchantmentResolver,
    /// Wall clock.
    pub clock: Arc<dyn Clock>,
    /// World access for raids.
    pub raid_host: Arc<dyn RaidHost>,
    /// Performs mob abilities.
    pub ability_host: Arc<dyn AbilityHost>,
    /// Quest broadcasts.
    pub notifier: Arc<dyn QuestNotifier>,
}

impl std::fmt::Debug for PluginContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PluginContext")
            .field("economy", &self.economy.is_some())
            .field("enchantment_provider", &self.enchantments.has_provider())
            .finish_non_exhaustive()
    }
}

impl PluginContext {
    /// Creates a context with the system clock, no economy, no third-party
    /// enchantments and silent quest broadcasts.
    #[must_use]
    pub fn new(
        catalog: Arc<dyn ItemCatalog>,
        raid_host: Arc<dyn RaidHost>,
        ability_host: Arc<dyn AbilityHost>,
    ) -> Self {
        Self {
            catalog,
            economy: None,
            enchantments: EnchantmentResolver::builtin_only(),
            clock: Arc::new(SystemClock),
            raid_host,
            ability_host,
            notifier: Arc::new(SilentNotifier),
        }
    }

    /// Installs the economy plugin.
    #[must_use]
    pub fn with_economy(mut self, economy: Arc<dyn EconomyProvider>) -> Self {
        self.economy = Some(economy);
        self
    }

    /// Installs the third-party enchantment plugin.
    #[must_use]
    pub fn with_enchantment_provider(mut self, provider: Arc<dyn EnchantmentProvider>) -> Self {
        self.enchantments = EnchantmentResolver::new(Some(provider));
        self
    }

    /// Replaces the clock.
    #[must_use]
    pub fn with_clock(mut self, clock: Arc<dyn Clock>) -> Self {
        self.clock = clock;
        self
    }

    /// Replaces the quest notifier.
    #[must_use]
    pub fn with_notifier(mut self, notifier: Arc<dyn QuestNotifier>) -> Self {
        self.notifier = notifier;
        self
    }

    /// The economy as a plain reference.
    #[must_use]
    pub fn economy(&self) -> Option<&dyn EconomyProvider> {
        self.economy.as_deref()
    }
}
