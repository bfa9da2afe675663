use std::rc::Rc;

use leptos::logging;
use platform_host_web::{app_state_store, host_strategy_name, key_value_store, task_spawner};

use crate::{StorageConfig, TieredStorage};

/// Builds a [`TieredStorage`] over the backends chosen by the active host strategy.
pub(crate) fn host_tiered_storage(config: StorageConfig) -> TieredStorage {
    logging::log!("storage host strategy: {}", host_strategy_name());
    TieredStorage::new(
        Rc::new(key_value_store()),
        Rc::new(app_state_store()),
        Rc::new(task_spawner()),
        config,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_storage_keeps_supplied_config() {
        let config = StorageConfig {
            overflow_threshold_bytes: 99,
            ..StorageConfig::default()
        };
        let storage = host_tiered_storage(config.clone());
        assert_eq!(storage.config(), &config);
    }

    #[cfg(feature = "desktop-host-stub")]
    #[test]
    fn stub_host_storage_round_trips_in_memory() {
        let storage = host_tiered_storage(StorageConfig::default());
        assert!(storage.set("webtop.settings", &42_u32));
        assert_eq!(storage.get("webtop.settings", 0_u32), 42);
    }
}
