use std::sync::Arc;

use stockdash_auth::{Credentials, Session, SessionManager};
use stockdash_core::DomainResult;
use stockdash_display::{
    DisplayModeResolver, FilePreferenceStore, PreferenceStore, SystemSignalSource,
};
use stockdash_inventory::{InventoryStore, InventorySummary, sample_items};

use crate::config::AppConfig;

/// Everything a presentation layer drives.
///
/// Inventory access requires a session; the display mode does not, since the
/// login screen has its own mode toggle.
#[derive(Debug)]
pub struct Dashboard {
    sessions: SessionManager,
    inventory: InventoryStore,
    display: DisplayModeResolver,
}

impl Dashboard {
    /// Assemble from parts. `display` is used as given (initialize it first).
    pub fn new(inventory: InventoryStore, display: DisplayModeResolver) -> Self {
        Self {
            sessions: SessionManager::new(),
            inventory,
            display,
        }
    }

    /// File-backed preference, optional sample catalogue, resolver initialized.
    pub fn from_config(config: &AppConfig, source: Arc<dyn SystemSignalSource>) -> Self {
        let store: Arc<dyn PreferenceStore> = Arc::new(FilePreferenceStore::new(&config.prefs_path));
        Self::with_store(config, store, source)
    }

    pub fn with_store(
        config: &AppConfig,
        store: Arc<dyn PreferenceStore>,
        source: Arc<dyn SystemSignalSource>,
    ) -> Self {
        let inventory = if config.seed_sample_items {
            InventoryStore::with_items(sample_items())
        } else {
            InventoryStore::new()
        };

        let mut display = DisplayModeResolver::new(store, source);
        display.initialize();

        Self::new(inventory, display)
    }

    pub fn login(&mut self, credentials: &Credentials) -> DomainResult<Session> {
        self.sessions.login(credentials)
    }

    pub fn logout(&mut self) {
        self.sessions.logout();
    }

    pub fn session(&self) -> Option<&Session> {
        self.sessions.current()
    }

    pub fn inventory(&self) -> DomainResult<&InventoryStore> {
        self.sessions.require()?;
        Ok(&self.inventory)
    }

    pub fn inventory_mut(&mut self) -> DomainResult<&mut InventoryStore> {
        self.sessions.require()?;
        Ok(&mut self.inventory)
    }

    /// Figures for the dashboard cards.
    pub fn summary(&self) -> DomainResult<InventorySummary> {
        Ok(self.inventory()?.summary())
    }

    pub fn display(&self) -> &DisplayModeResolver {
        &self.display
    }
}
