use std::collections::HashMap;

/// Channels with this prefix belong to the authenticated user
pub const PRIVATE_CHANNEL_PREFIX: &str = "user.";

pub fn is_private_channel(channel: &str) -> bool {
    channel.starts_with(PRIVATE_CHANNEL_PREFIX)
}

/// Channels split by the subscribe method that must carry them
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ChannelPartition {
    pub public: Vec<String>,
    pub private: Vec<String>,
}

impl ChannelPartition {
    pub fn from_channels<'a>(channels: impl IntoIterator<Item = &'a String>) -> Self {
        let mut partition = Self::default();
        for channel in channels {
            if is_private_channel(channel) {
                partition.private.push(channel.clone());
            } else {
                partition.public.push(channel.clone());
            }
        }
        partition
    }

    pub fn is_empty(&self) -> bool {
        self.public.is_empty() && self.private.is_empty()
    }
}

/// Desired channel set plus the server acknowledgment of each channel
///
/// Each channel appears once, in the order it was first requested. The
/// registry performs no I/O; the client drives the subscribe calls and reports
/// back which channels the server confirmed.
#[derive(Debug, Default)]
pub struct SubscriptionRegistry {
    channels: Vec<String>,
    acknowledged: HashMap<String, bool>,
}

impl SubscriptionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add channels to the desired set, ignoring ones already present
    pub fn add<I, S>(&mut self, channels: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for channel in channels {
            let channel = channel.into();
            if channel.is_empty() || self.acknowledged.contains_key(&channel) {
                continue;
            }
            self.acknowledged.insert(channel.clone(), false);
            self.channels.push(channel);
        }
    }

    /// Channels the server has not confirmed yet, split by scope
    pub fn pending(&self) -> ChannelPartition {
        ChannelPartition::from_channels(
            self.channels
                .iter()
                .filter(|channel| !self.is_acknowledged(channel)),
        )
    }

    /// Mark channels as confirmed, returning the ones that are tracked here
    pub fn acknowledge<'a>(&mut self, channels: impl IntoIterator<Item = &'a str>) -> Vec<String> {
        let mut confirmed = Vec::new();
        for channel in channels {
            if let Some(flag) = self.acknowledged.get_mut(channel) {
                *flag = true;
                confirmed.push(channel.to_string());
            }
        }
        confirmed
    }

    /// Forget every acknowledgment, keeping the desired set
    pub fn reset(&mut self) {
        for flag in self.acknowledged.values_mut() {
            *flag = false;
        }
    }

    /// Drop channels from the desired set
    ///
    /// Returns the removed channels that the server had acknowledged, which
    /// are the only ones that need an unsubscribe call.
    pub fn remove<I, S>(&mut self, channels: I) -> ChannelPartition
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut removed = Vec::new();
        for channel in channels {
            let channel = channel.as_ref();
            if let Some(was_acked) = self.acknowledged.remove(channel) {
                self.channels.retain(|c| c != channel);
                if was_acked {
                    removed.push(channel.to_string());
                }
            }
        }
        ChannelPartition::from_channels(removed.iter())
    }

    pub fn channels(&self) -> &[String] {
        &self.channels
    }

    pub fn is_acknowledged(&self, channel: &str) -> bool {
        self.acknowledged.get(channel).copied().unwrap_or(false)
    }

    pub fn all_acknowledged(&self) -> bool {
        self.acknowledged.values().all(|acked| *acked)
    }

    pub fn len(&self) -> usize {
        self.channels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.channels.is_empty()
    }
}
