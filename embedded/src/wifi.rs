use std::thread;
use std::time::Duration;

use anyhow::Result;
use esp_idf_svc::wifi::{
    EspWifi,
    ClientConfiguration,
    AuthMethod,
    Configuration,
};

pub fn connect_wifi(wifi: &mut EspWifi, ssid: &str, password: &str) -> Result<()> {
    let wifi_config = Configuration::Client(ClientConfiguration {
        ssid: ssid.try_into().map_err(|_| anyhow::anyhow!("SSID too long"))?,
        password: password.try_into().map_err(|_| anyhow::anyhow!("WiFi password too long"))?,
        auth_method: AuthMethod::WPA2Personal,
        ..Default::default()
    });

    wifi.set_configuration(&wifi_config)?;

    wifi.start()?;
    wifi.connect()?;

    log::info!("Connecting to WiFi...");

    while !wifi.is_connected()? {
        thread::sleep(Duration::from_millis(300));
    }

    log::info!("Connected to WiFi network: {}", ssid);

    Ok(())
}
