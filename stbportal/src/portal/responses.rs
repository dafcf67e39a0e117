use std::sync::Arc;

use serde::Serialize;

use crate::playlist::ChannelRecord;

pub const PK_PATH: &str = "/stalker_portal/c/";
pub const API_PATH: &str = "/stalker_portal/api/";
pub const STB_TYPE: &str = "MAG250";
pub const HW_VERSION: &str = "1.7-BD-00";

/// `{"js": ...}` wrapper every portal reply is sent in.
#[derive(Debug, Serialize)]
pub struct Envelope {
    pub js: PortalResponse,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
pub enum PortalResponse {
    Handshake(Handshake),
    Profile(Profile),
    Localization(Localization),
    Channels(ChannelListing),
    Link(Link),
    Error(ErrorPayload),
}

impl From<PortalResponse> for Envelope {
    fn from(js: PortalResponse) -> Self {
        Self { js }
    }
}

#[derive(Debug, Serialize)]
pub struct Metrics {
    pub mac: String,
}

#[derive(Debug, Serialize)]
pub struct Handshake {
    pub token: String,
    pub random: String,
    pub pk_path: &'static str,
    pub api_path: &'static str,
    pub locale: &'static str,
    pub mac: String,
    pub stb_type: &'static str,
    pub sn: String,
    pub device_id: String,
    pub device_id2: String,
    pub signature: String,
    pub hw_version: &'static str,
    /// `"true"` when the device is not registered.
    pub not_valid: &'static str,
    /// `"1"` when the device is registered.
    pub auth: &'static str,
    pub metrics: Metrics,
}

#[derive(Debug, Serialize)]
pub struct Profile {
    pub id: &'static str,
    pub name: &'static str,
    pub sname: &'static str,
    pub created: i64,
    pub storage_name: &'static str,
    pub last_change_date: i64,
    pub mac: String,
    pub player: &'static str,
    pub screensaver_delay: &'static str,
    pub plasma_saving: &'static str,
    pub ts_enabled: &'static str,
    pub ts_enable_url: &'static str,
    pub ts_buffer_use: &'static str,
    pub video_out: &'static str,
    pub aspect: &'static str,
    pub screensaver_type: &'static str,
    pub hdmi_event_reaction: &'static str,
    pub playback_buffer_size: &'static str,
    pub timezone: &'static str,
}

impl Profile {
    pub fn new(mac: String, now: i64) -> Self {
        Self {
            id: "1",
            name: "Profile",
            sname: "profile",
            created: now,
            storage_name: "nfo_storage",
            last_change_date: now,
            mac,
            player: "ffmpeg",
            screensaver_delay: "0",
            plasma_saving: "0",
            ts_enabled: "1",
            ts_enable_url: "1",
            ts_buffer_use: "1",
            video_out: "hdmi",
            aspect: "0",
            screensaver_type: "none",
            hdmi_event_reaction: "1",
            playback_buffer_size: "0",
            timezone: "UTC",
        }
    }
}

#[derive(Debug, Serialize)]
pub struct Language {
    pub iso_code: &'static str,
    pub name: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Localization {
    pub languages: Vec<Language>,
    pub timezones: Vec<String>,
}

impl Default for Localization {
    fn default() -> Self {
        Self {
            languages: vec![Language {
                iso_code: "en_US",
                name: "English",
            }],
            timezones: Vec::new(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct ChannelListing {
    pub data: Arc<Vec<ChannelRecord>>,
    pub total_items: usize,
    pub max_page_items: usize,
    pub selected_item: usize,
    pub cur_page: usize,
    pub all_pages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct Link {
    pub id: &'static str,
    pub cmd: String,
    pub load: u32,
    pub priority: u32,
}

#[derive(Debug, Serialize)]
pub struct ErrorPayload {
    pub error: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub action: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub supported_actions: Option<Vec<&'static str>>,
}

impl ErrorPayload {
    pub fn new(error: impl Into<String>) -> Self {
        Self {
            error: error.into(),
            action: None,
            supported_actions: None,
        }
    }
}
