//! Inbound custom command topics and the connection events that go with them.

use crate::controller::Controller;
use crate::sensor::ProximityLightSensor;

/// A message from the broker connection, forwarded to the loop that owns the
/// controller.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Inbound {
    /// The session was (re)established. Subscriptions must be renewed.
    Connected,
    Custom { name: String, value: String },
}

/// Something that can (re)subscribe to a topic filter. Best effort.
pub trait Subscriber {
    fn subscribe(&mut self, filter: &str);
}

/// `hasp/<node>/command/custom/<name>` topics of one node.
#[derive(Debug, Clone)]
pub struct CommandTopics {
    prefix: String,
    filter: String,
}

impl CommandTopics {
    pub fn new(node: &str) -> Self {
        Self {
            prefix: format!("hasp/{}/command/custom/", node),
            filter: format!("hasp/{}/command/custom/#", node),
        }
    }

    pub fn filter(&self) -> &str {
        &self.filter
    }

    /// Turns a received message into a custom command, if it is one of ours.
    pub fn classify(&self, topic: &str, data: &[u8]) -> Option<Inbound> {
        let name = topic.strip_prefix(self.prefix.as_str())?;
        if name.is_empty() {
            return None;
        }
        Some(Inbound::Custom {
            name: name.to_string(),
            value: String::from_utf8_lossy(data).into_owned(),
        })
    }
}

/// Applies one inbound message on the owning thread.
pub fn handle_inbound<S, B>(message: Inbound, topics: &CommandTopics, controller: &mut Controller<S>, subscriber: &mut B)
where
    S: ProximityLightSensor,
    B: Subscriber,
{
    match message {
        Inbound::Connected => {
            log::info!("Connected, subscribing to {}", topics.filter());
            subscriber.subscribe(topics.filter());
        }
        Inbound::Custom { name, value } => controller.on_config_command(&name, &value),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sensor::{ProximityGain, SensorError};
    use std::time::Instant;

    struct Idle;

    impl ProximityLightSensor for Idle {
        fn init(&mut self) -> Result<(), SensorError> {
            Ok(())
        }

        fn set_proximity_gain(&mut self, _gain: ProximityGain) -> Result<(), SensorError> {
            Ok(())
        }

        fn enable_proximity_sensor(&mut self, _interrupts: bool) -> Result<(), SensorError> {
            Ok(())
        }

        fn enable_light_sensor(&mut self, _interrupts: bool) -> Result<(), SensorError> {
            Ok(())
        }

        fn read_proximity(&mut self) -> Result<u16, SensorError> {
            Ok(0)
        }

        fn read_ambient_lux(&mut self) -> Result<f32, SensorError> {
            Ok(0.0)
        }

        fn read_raw_channels(&mut self) -> Result<(u16, u16), SensorError> {
            Ok((0, 0))
        }
    }

    #[derive(Default)]
    struct Filters(Vec<String>);

    impl Subscriber for Filters {
        fn subscribe(&mut self, filter: &str) {
            self.0.push(filter.to_string());
        }
    }

    #[test]
    fn classify_own_topics_only() {
        let topics = CommandTopics::new("plate_sensor");

        assert_eq!(
            topics.classify("hasp/plate_sensor/command/custom/brightness_low", b"25"),
            Some(Inbound::Custom {
                name: "brightness_low".into(),
                value: "25".into()
            })
        );
        assert_eq!(topics.classify("hasp/other/command/custom/brightness_low", b"25"), None);
        assert_eq!(topics.classify("hasp/plate_sensor/command/custom/", b"25"), None);
        assert_eq!(topics.filter(), "hasp/plate_sensor/command/custom/#");
    }

    #[test]
    fn every_connect_renews_the_subscription() {
        let topics = CommandTopics::new("n");
        let mut controller = Controller::new(Idle, Instant::now());
        let mut filters = Filters::default();

        handle_inbound(Inbound::Connected, &topics, &mut controller, &mut filters);
        // broker dropped and the client reconnected
        handle_inbound(Inbound::Connected, &topics, &mut controller, &mut filters);

        assert_eq!(filters.0, vec!["hasp/n/command/custom/#", "hasp/n/command/custom/#"]);
    }

    #[test]
    fn commands_after_reconnect_reach_the_controller() {
        let topics = CommandTopics::new("n");
        let mut controller = Controller::new(Idle, Instant::now());
        let mut filters = Filters::default();

        handle_inbound(Inbound::Connected, &topics, &mut controller, &mut filters);
        handle_inbound(Inbound::Connected, &topics, &mut controller, &mut filters);
        let message = topics.classify("hasp/n/command/custom/ambient_light_threshold", b"10");
        if let Some(message) = message {
            handle_inbound(message, &topics, &mut controller, &mut filters);
        }

        assert_eq!(controller.config().ambient_light_threshold, 10);
        assert_eq!(filters.0.len(), 2);
    }
}
