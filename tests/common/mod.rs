use std::fs;
use std::path::PathBuf;
use std::sync::Arc;
use tempfile::TempDir;
use toolgate::allowlist::StaticAllowlist;
use toolgate::auth::{AuthStateStore, ManualClock};
use toolgate::config::Config;
use toolgate::provider::FileDataProvider;
use toolgate::server::AppState;

pub const ALLOWED: &str = "1111111111";
pub const NOT_ALLOWED: &str = "9999999999";
pub const OTHER_ALLOWED: &str = "2222222222";
pub const NET_WORTH: &str = r#"{"netWorthResponse":{"totalNetWorthValue":{"units":"125000"}}}"#;

/// A data directory with canned responses for [`ALLOWED`], [`OTHER_ALLOWED`]
/// and [`NOT_ALLOWED`].
#[allow(dead_code)]
pub fn data_dir() -> TempDir {
    let tmp = TempDir::new().expect("failed to create tempdir");
    for identity in [ALLOWED, OTHER_ALLOWED, NOT_ALLOWED] {
        let dir = tmp.path().join(identity);
        fs::create_dir_all(&dir).expect("failed to create identity dir");
        fs::write(dir.join("fetch_net_worth.json"), NET_WORTH).expect("failed to write payload");
    }
    tmp
}

/// App state over `data` allowing only [`ALLOWED`], with a manual clock.
#[allow(dead_code)]
pub fn app_state(data: &TempDir) -> (AppState, Arc<ManualClock>) {
    app_state_allowing(data, &[ALLOWED])
}

/// App state over `data` allowing `identities`, with a manual clock.
#[allow(dead_code)]
pub fn app_state_allowing(data: &TempDir, identities: &[&str]) -> (AppState, Arc<ManualClock>) {
    let mut config = Config::default();
    config.data.dir = data.path().to_path_buf();
    let clock = Arc::new(ManualClock::starting_now());
    let store = Arc::new(AuthStateStore::with_clock(config.auth.window(), clock.clone()));
    let state = AppState::with_store(
        &config,
        store,
        Arc::new(StaticAllowlist::new(identities.iter().copied())),
        Arc::new(FileDataProvider::new(data.path())),
    );
    (state, clock)
}

#[allow(dead_code)]
pub fn temp_config_file(contents: &str) -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().expect("failed to create tempdir");
    let config_path = temp_dir.path().join("config.yaml");
    fs::write(&config_path, contents).expect("failed to write config file");
    (temp_dir, config_path)
}
