use std::env;
use dotenvy::from_path;

const FORWARDED: [&str; 6] = ["WIFI_SSID", "WIFI_PASSWORD", "MQTT_BROKER", "HASP_NODE", "HASP_PLATE", "HASP_UTC_OFFSET"];

fn main() {
    let _ = from_path(".env");

    println!("cargo:rerun-if-changed=.env");

    for key in FORWARDED {
        println!("cargo:rerun-if-env-changed={}", key);
        if let Ok(value) = env::var(key) {
            println!("cargo:rustc-env={}={}", key, value);
        }
    }

    embuild::espidf::sysenv::output();
}
