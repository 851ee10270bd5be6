use super::{Config, Logs, Map, Pool, SettingsBox, Stress};

/// Creates a new test configuration.
pub fn new_test_config() -> Config {
    Config {
        safemap: SettingsBox {
            env: super::TEST.to_string(),
            logs: Some(Logs {
                level: Some("debug".to_string()),
            }),
            map: Some(Map { shards: 16 }),
            pool: Some(Pool {
                capacity: Some(8),
                max_buffer_size: 1024,
            }),
            stress: Some(Stress {
                workers: 4,
                ops_per_worker: 1_000,
            }),
        },
    }
}
