use std::sync::mpsc::{self, Receiver};
use std::thread;

use anyhow::Result;
use esp_idf_svc::mqtt::client::{
    EspMqttClient,
    EventPayload,
    MqttClientConfiguration,
    QoS,
};
use hasp_proximity::{CommandTopics, Dispatcher, Inbound, Subscriber};

/// Connects to the broker with a persistent session for `node`.
///
/// Connection events and custom commands are handed to the returned channel
/// so that they are handled on the main loop thread. The loop subscribes on
/// every `Inbound::Connected`, which also covers reconnects.
pub fn setup_mqtt_client(broker_url: &str, node: &str, topics: CommandTopics) -> Result<(EspMqttClient<'static>, Receiver<Inbound>)> {
    let conf = MqttClientConfiguration {
        client_id: Some(node),
        disable_clean_session: true,
        ..Default::default()
    };

    let url = format!("mqtt://{}", broker_url);
    let (mqtt_client, mut connection) = EspMqttClient::new(&url, &conf)?;

    let (tx, rx) = mpsc::channel();

    thread::Builder::new()
        .stack_size(6000)
        .spawn(move || {
            while let Ok(event) = connection.next() {
                let message = match event.payload() {
                    EventPayload::Connected(_) => Some(Inbound::Connected),
                    EventPayload::Received { topic: Some(topic), data, .. } => topics.classify(topic, data),
                    EventPayload::Disconnected => {
                        log::warn!("MQTT disconnected");
                        None
                    }
                    EventPayload::Error(e) => {
                        log::warn!("MQTT error: {:?}", e);
                        None
                    }
                    _ => None,
                };

                if let Some(message) = message {
                    if tx.send(message).is_err() {
                        break;
                    }
                }
            }
            log::info!("MQTT connection closed");
        })?;

    Ok((mqtt_client, rx))
}

/// Sends display commands to the plate and state messages under this node.
pub struct HaspOutput {
    client: EspMqttClient<'static>,
    command_topic: String,
    state_prefix: String,
}

impl HaspOutput {
    pub fn new(client: EspMqttClient<'static>, node: &str, plate: &str) -> Self {
        Self {
            client,
            command_topic: format!("hasp/{}/command", plate),
            state_prefix: format!("hasp/{}/state", node),
        }
    }

    fn publish(&mut self, topic: &str, payload: &str) {
        match self.client.publish(topic, QoS::AtMostOnce, false, payload.as_bytes()) {
            Ok(_) => log::debug!("Published to {}: {}", topic, payload),
            Err(e) => log::warn!("Publish to {} failed: {:?}", topic, e),
        }
    }
}

impl Dispatcher for HaspOutput {
    fn dispatch_text_line(&mut self, line: &str) {
        let topic = self.command_topic.clone();
        self.publish(&topic, line);
    }

    fn publish_state_subtopic(&mut self, subtopic: &str, payload: &str) {
        let topic = format!("{}/{}", self.state_prefix, subtopic);
        self.publish(&topic, payload);
    }
}

impl Subscriber for HaspOutput {
    fn subscribe(&mut self, filter: &str) {
        match self.client.subscribe(filter, QoS::AtMostOnce) {
            Ok(_) => log::info!("Subscribed to {}", filter),
            Err(e) => log::warn!("Subscribe to {} failed: {:?}", filter, e),
        }
    }
}
