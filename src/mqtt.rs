use std::time::Duration;

use paho_mqtt as mqtt;
use paho_mqtt::{Message, Receiver};

use crate::commands::{self, Command};
use crate::config::MqttConfig;
use crate::controller::SharedController;

pub struct MqttClient {
    client: mqtt::Client,
    receiver: Receiver<Option<Message>>,
    topics: Topics,
    controller: SharedController,
}

struct Topics {
    base: String,
    status: String,
}

impl Topics {
    fn new(config: &MqttConfig) -> Topics {
        let base = format!("{}/{}", config.topic_prefix, config.unique_id);
        Topics {
            status: format!("{base}/status"),
            base,
        }
    }

    fn command(&self, kind: &str) -> String {
        format!("{}/{kind}", self.base)
    }

    /// Maps a full topic back to the command it carries.
    fn command_kind<'a>(&self, topic: &'a str) -> Option<&'a str> {
        topic
            .strip_prefix(self.base.as_str())
            .and_then(|rest| rest.strip_prefix('/'))
            .filter(|kind| commands::TOPICS.contains(kind))
    }
}

impl MqttClient {
    fn make_lwt_message(topic: &str) -> mqtt::Message {
        mqtt::Message::new_retained(topic, "offline", 1)
    }

    pub fn new(config: &MqttConfig, controller: SharedController) -> Result<MqttClient, String> {
        let topics = Topics::new(config);

        let client = match mqtt::Client::new(config.url.as_str()) {
            Ok(client) => client,
            Err(err) => {
                return Err(format!("{:?}", err));
            }
        };

        let conn_opts = mqtt::ConnectOptionsBuilder::new()
            .keep_alive_interval(Duration::from_secs(20))
            .clean_session(true)
            .will_message(MqttClient::make_lwt_message(&topics.status))
            .finalize();

        if let Err(err) = client.connect(conn_opts) {
            return Err(format!("Cannot connect to {}: {:?}", config.url, err));
        }

        log::info!("Connected to broker at {}", config.url);

        let receiver = client.start_consuming();
        for kind in commands::TOPICS {
            let topic = topics.command(kind);
            if let Err(err) = client.subscribe(&topic, 0) {
                return Err(format!("Failed to subscribe to topic {}: {:?}", topic, err));
            }
        }

        let mqtt_client = MqttClient {
            client,
            receiver,
            topics,
            controller,
        };

        mqtt_client.publish_status("online");
        Ok(mqtt_client)
    }

    fn publish_status(&self, status: &str) {
        if !self.client.is_connected() {
            if let Err(err) = self.client.reconnect() {
                log::warn!("Reconnection failed: {err}");
                return;
            }
        }

        let msg = mqtt::Message::new_retained(&self.topics.status, status, 1);
        log::info!("Publishing {}: {}", self.topics.status, status);
        if let Err(err) = self.client.publish(msg) {
            log::warn!("Publishing failed: {err}");
        }
    }

    pub fn run(&self) {
        loop {
            match self.receiver.recv() {
                Ok(Some(msg)) => self.handle_message(msg),
                Ok(None) => {
                    log::warn!("Lost connection to broker");
                    if let Err(err) = self.client.reconnect() {
                        log::warn!("Reconnection failed: {err}");
                        std::thread::sleep(Duration::from_secs(1));
                    } else {
                        self.publish_status("online");
                    }
                }
                Err(err) => {
                    log::error!("Error receiving messages: {err}");
                    return;
                }
            };
        }
    }

    fn handle_message(&self, msg: Message) {
        let Some(kind) = self.topics.command_kind(msg.topic()) else {
            log::info!("Unhandled topic {}", msg.topic());
            return;
        };

        let payload = msg.payload_str();
        log::info!("Received {}: {}", msg.topic(), payload);

        // Decode before locking so the render thread is not held up by it.
        let command = match Command::parse(kind, &payload) {
            Ok(command) => command,
            Err(err) => {
                log::warn!("Dropping {} message: {}", msg.topic(), err);
                return;
            }
        };

        let mut controller = self.controller.lock();
        if let Err(err) = controller.apply(command) {
            log::warn!("Rejected {} command: {}", kind, err);
        }
        log::debug!(
            "{} actions running at brightness {}",
            controller.scheduler().len(),
            controller.brightness()
        );
    }
}

impl Drop for MqttClient {
    fn drop(&mut self) {
        self.publish_status("offline");
        if let Err(err) = self.client.disconnect(None) {
            // We don't really care about errors here, but let's make rustc happy.
            log::error!("{:?}", err);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn command_kind_from_topic() {
        let topics = Topics::new(&MqttConfig {
            url: "tcp://localhost:1883".to_string(),
            topic_prefix: "lichtband".to_string(),
            unique_id: "hallway".to_string(),
        });

        assert_eq!(topics.command_kind("lichtband/hallway/flame"), Some("flame"));
        assert_eq!(topics.command_kind("lichtband/hallway/panel"), Some("panel"));
        assert_eq!(topics.command_kind("lichtband/hallway/status"), None);
        assert_eq!(topics.command_kind("lichtband/hallwayflame"), None);
        assert_eq!(topics.command_kind("lichtband/kitchen/color"), None);
        assert_eq!(topics.status, "lichtband/hallway/status");
    }
}
