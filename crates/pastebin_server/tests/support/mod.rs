//! Shared integration-test server bootstrap helpers.

use axum_test::TestServer;
use pastebin_server::{create_app, AppState, Config, Storage, StorageBackend};
use tempfile::TempDir;

pub(crate) fn test_config() -> Config {
    let mut config = Config::from_lookup(|_| None);
    config.port = 0;
    config.backend = StorageBackend::Memory;
    config.max_paste_size = 1024;
    config.public_base_url = "http://paste.test".to_string();
    config
}

pub(crate) fn test_server_for(config: Config, storage: Storage) -> (TestServer, AppState) {
    let state = AppState::new(config, storage);
    let app = create_app(state.clone(), false);
    let server = TestServer::new(app).expect("server");
    (server, state)
}

pub(crate) fn setup_test_server() -> (TestServer, AppState) {
    test_server_for(test_config(), Storage::in_memory())
}

pub(crate) fn setup_json_server() -> (TestServer, AppState, TempDir) {
    let temp_dir = TempDir::new().expect("temp dir");
    let mut config = test_config();
    config.backend = StorageBackend::Json;
    config.data_dir = temp_dir.path().to_string_lossy().to_string();
    let storage = Storage::json(temp_dir.path()).expect("json storage");
    let (server, state) = test_server_for(config, storage);
    (server, state, temp_dir)
}
