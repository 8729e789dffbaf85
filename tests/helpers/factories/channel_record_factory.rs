use rand::Rng;

use crate::engine::fetch::{ChannelRecord, TimeTag};

/// Builder for telemetry channel records with sensible defaults.
pub struct ChannelRecordFactory {
    event_seq: u64,
    channel_id: String,
    module: Option<String>,
    ert: TimeTag,
    sclk: TimeTag,
    dn: String,
    eu: Option<f64>,
    alarm: Option<String>,
}

impl ChannelRecordFactory {
    pub fn new() -> Self {
        Self {
            event_seq: 1,
            channel_id: "A-0001".to_string(),
            module: Some("THERMAL".to_string()),
            ert: TimeTag::new(1_000, 0),
            sclk: TimeTag::new(500, 0),
            dn: "42".to_string(),
            eu: None,
            alarm: None,
        }
    }

    pub fn with_event_seq(mut self, event_seq: u64) -> Self {
        self.event_seq = event_seq;
        self
    }

    pub fn with_channel_id(mut self, channel_id: &str) -> Self {
        self.channel_id = channel_id.to_string();
        self
    }

    pub fn with_module(mut self, module: &str) -> Self {
        self.module = Some(module.to_string());
        self
    }

    pub fn without_module(mut self) -> Self {
        self.module = None;
        self
    }

    pub fn with_ert(mut self, coarse: u64, fine: u32) -> Self {
        self.ert = TimeTag::new(coarse, fine);
        self
    }

    pub fn with_sclk(mut self, coarse: u64, fine: u32) -> Self {
        self.sclk = TimeTag::new(coarse, fine);
        self
    }

    pub fn with_dn(mut self, dn: &str) -> Self {
        self.dn = dn.to_string();
        self
    }

    pub fn with_eu(mut self, eu: f64) -> Self {
        self.eu = Some(eu);
        self
    }

    pub fn with_alarm(mut self, alarm: &str) -> Self {
        self.alarm = Some(alarm.to_string());
        self
    }

    pub fn create(self) -> ChannelRecord {
        ChannelRecord {
            event_seq: self.event_seq,
            channel_id: self.channel_id,
            module: self.module,
            ert: self.ert,
            sclk: self.sclk,
            dn: self.dn,
            eu: self.eu,
            alarm: self.alarm,
        }
    }

    /// A list of `count` records with sequential event sequences and earth
    /// receive times, starting from the configured base values.
    pub fn create_list(self, count: usize) -> Vec<ChannelRecord> {
        let mut rng = rand::thread_rng();
        (0..count as u64)
            .map(|i| ChannelRecord {
                event_seq: self.event_seq + i,
                channel_id: self.channel_id.clone(),
                module: self.module.clone(),
                ert: TimeTag::new(self.ert.coarse + i, self.ert.fine),
                sclk: TimeTag::new(self.sclk.coarse + i, self.sclk.fine),
                dn: rng.gen_range(0..1_000).to_string(),
                eu: self.eu,
                alarm: self.alarm.clone(),
            })
            .collect()
    }
}
