mod mqtt;
mod sensor;
mod util;
mod wifi;

use std::thread;
use std::time::{Duration, Instant};

use anyhow::Result;
use esp_idf_svc::eventloop::EspSystemEventLoop;
use esp_idf_svc::hal::peripherals::Peripherals;
use esp_idf_svc::log::EspLogger;
use esp_idf_svc::nvs::EspDefaultNvsPartition;
use esp_idf_svc::sntp::EspSntp;
use esp_idf_svc::wifi::EspWifi;
use hasp_proximity::telemetry::sensor_snapshot;
use hasp_proximity::inbound::handle_inbound;
use hasp_proximity::{CommandTopics, Controller, Dispatcher, TickSchedule};

use mqtt::{setup_mqtt_client, HaspOutput};
use util::{local_time, sync_time_via_ntp};
use wifi::connect_wifi;

fn main() -> Result<()> {
    esp_idf_svc::sys::link_patches();
    EspLogger::initialize_default();

    let peripherals = Peripherals::take()?;
    let sysloop = EspSystemEventLoop::take()?;
    let nvs = EspDefaultNvsPartition::take()?;

    let Peripherals { pins, modem, i2c0, .. } = peripherals;

    let mut wifi = EspWifi::new(modem, sysloop, Some(nvs))?;
    connect_wifi(&mut wifi, env!("WIFI_SSID"), env!("WIFI_PASSWORD"))?;

    thread::sleep(Duration::from_secs(1));

    let sntp = EspSntp::new_default()?;
    sync_time_via_ntp(&sntp);

    let node = env!("HASP_NODE");
    let topics = CommandTopics::new(node);
    let (mqtt_client, inbound) = setup_mqtt_client(env!("MQTT_BROKER"), node, topics.clone())?;
    let mut output = HaspOutput::new(mqtt_client, node, env!("HASP_PLATE"));

    let sensor = sensor::apds9930(i2c0, pins.gpio19, pins.gpio20)?;

    let start = Instant::now();
    let mut controller = Controller::new(sensor, start);
    controller.initialize();
    let mut schedule = TickSchedule::new(start);

    loop {
        let now = Instant::now();

        for message in inbound.try_iter() {
            handle_inbound(message, &topics, &mut controller, &mut output);
        }

        controller.on_fast_tick(now, &mut output);

        let due = schedule.poll(now);
        if due.slow {
            controller.on_slow_tick();
        }
        if due.telemetry {
            let doc = sensor_snapshot(local_time(), now - start, &[&controller]);
            output.publish_state_subtopic("sensors", &doc.to_string());
        }

        thread::sleep(schedule.idle_time(now.elapsed()));
    }
}
