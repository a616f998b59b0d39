//! Build script for the sentinel node firmware
//!
//! - Puts memory.x on the linker search path and adds the linker scripts
//! - Generates build information (`built`)
//! - Bakes the network settings from `.env` or the environment into the binary

use std::env;
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};

/// Network settings read at build time, with the value used when unset.
const NETWORK_SETTINGS: [(&str, &str); 5] = [
    ("SENTINEL_WIFI_SSID", ""),
    ("SENTINEL_WIFI_PASSWORD", ""),
    ("SENTINEL_SERVER_IP", "192.168.143.29"),
    ("SENTINEL_SERVER_PORT", "5000"),
    ("SENTINEL_DEVICE_ID", "pico_w"),
];

fn main() {
    setup_linker();
    built::write_built_file().expect("Failed to acquire build-time information");
    load_env_config();
}

fn setup_linker() {
    let out_dir = PathBuf::from(env::var("OUT_DIR").unwrap());

    File::create(out_dir.join("memory.x"))
        .unwrap()
        .write_all(include_bytes!("memory.x"))
        .unwrap();
    println!("cargo:rustc-link-search={}", out_dir.display());
    println!("cargo:rerun-if-changed=memory.x");
    println!("cargo:rerun-if-changed=build.rs");

    println!("cargo:rustc-link-arg-bins=--nmagic");
    println!("cargo:rustc-link-arg-bins=-Tlink.x");
    println!("cargo:rustc-link-arg-bins=-Tlink-rp.x");
    println!("cargo:rustc-link-arg-bins=-Tdefmt.x");
}

/// Environment variables take priority over `.env` values.
fn load_env_config() {
    println!("cargo:rerun-if-changed=.env");

    if Path::new(".env").exists() {
        match dotenvy::dotenv() {
            Ok(_) => println!("cargo:warning=Loaded .env file"),
            Err(e) => println!("cargo:warning=Failed to load .env file: {}", e),
        }
    }

    for (name, fallback) in NETWORK_SETTINGS {
        println!("cargo:rerun-if-env-changed={}", name);
        let value = env::var(name)
            .map(|v| v.trim().to_string())
            .ok()
            .filter(|v| !v.is_empty())
            .unwrap_or_else(|| fallback.to_string());
        println!("cargo:rustc-env={}={}", name, value);
    }

    match env::var("SENTINEL_WIFI_SSID") {
        Ok(ssid) if !ssid.trim().is_empty() => {
            println!("cargo:warning=SENTINEL_WIFI_SSID configured: {}", ssid.trim())
        }
        _ => println!("cargo:warning=SENTINEL_WIFI_SSID is empty - WiFi will not be joined"),
    }
}
