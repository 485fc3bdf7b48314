#![no_main]
use libfuzzer_sys::fuzz_target;

fuzz_target!(|data: &str| {
    // TOML parsing of the session config must never panic; parse and
    // validation errors are both acceptable outcomes.
    if let Ok(cfg) = carstate_config::load_toml(data) {
        let _ = cfg.validate();
    }
});
