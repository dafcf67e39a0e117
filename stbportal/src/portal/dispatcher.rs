use std::sync::Arc;

use crate::device::identity::display_mac;
use crate::device::{DeviceIdentity, DeviceRegistry, is_known};
use crate::playlist::{CatalogCache, PAGE_SIZE};
use crate::util::random::TokenGenerator;

use super::action::ProtocolAction;
use super::responses::{
    API_PATH, ChannelListing, Envelope, ErrorPayload, HW_VERSION, Handshake, Link, Localization,
    Metrics, PK_PATH, PortalResponse, Profile, STB_TYPE,
};

/// Everything a portal request carries that the handlers look at.
#[derive(Debug, Clone, Default)]
pub struct PortalRequest {
    pub action: Option<String>,
    pub cmd: Option<String>,
    pub identity: Option<DeviceIdentity>,
}

/**
    Portal protocol engine.

    Stateless per request: each call selects one handler from the action and
    always produces an envelope, whatever the registry or upstream playlist
    are doing.
*/
pub struct Portal {
    registry: Option<Arc<dyn DeviceRegistry>>,
    catalog: Arc<CatalogCache>,
    tokens: Arc<dyn TokenGenerator>,
}

impl Portal {
    pub fn new(
        registry: Option<Arc<dyn DeviceRegistry>>,
        catalog: Arc<CatalogCache>,
        tokens: Arc<dyn TokenGenerator>,
    ) -> Self {
        Self {
            registry,
            catalog,
            tokens,
        }
    }

    pub fn registry(&self) -> Option<&dyn DeviceRegistry> {
        self.registry.as_deref()
    }

    pub fn catalog(&self) -> &CatalogCache {
        &self.catalog
    }

    pub async fn dispatch(&self, request: PortalRequest) -> Envelope {
        let action = ProtocolAction::parse(request.action.as_deref());
        let identity = request.identity.as_ref();

        tracing::debug!(
            action = action.name(),
            mac = identity.map(|id| id.normalized.as_str()),
            "Portal request"
        );

        let js = match action {
            ProtocolAction::Handshake => self.handshake(identity).await,
            ProtocolAction::GetProfile => profile(identity),
            ProtocolAction::GetLocalization => PortalResponse::Localization(Localization::default()),
            ProtocolAction::GetAllChannels | ProtocolAction::GetOrderedList => {
                self.channels().await
            }
            ProtocolAction::CreateLink => create_link(request.cmd),
            ProtocolAction::Unknown(name) => {
                tracing::debug!(action = %name, "Unknown portal action");
                PortalResponse::Error(ErrorPayload {
                    error: "Unknown action".to_string(),
                    action: Some(name),
                    supported_actions: Some(ProtocolAction::SUPPORTED.to_vec()),
                })
            }
        };

        js.into()
    }

    async fn handshake(&self, identity: Option<&DeviceIdentity>) -> PortalResponse {
        let known = is_known(self.registry(), identity).await;
        let mac = display_mac(identity).to_string();

        PortalResponse::Handshake(Handshake {
            token: self.tokens.token(),
            random: self.tokens.random_string(),
            pk_path: PK_PATH,
            api_path: API_PATH,
            locale: "en",
            mac: mac.clone(),
            stb_type: STB_TYPE,
            sn: self.tokens.random_string(),
            device_id: self.tokens.random_string(),
            device_id2: self.tokens.random_string(),
            signature: self.tokens.random_string(),
            hw_version: HW_VERSION,
            not_valid: if known { "false" } else { "true" },
            auth: if known { "1" } else { "0" },
            metrics: Metrics { mac },
        })
    }

    async fn channels(&self) -> PortalResponse {
        match self.catalog.get().await {
            Ok(catalog) => {
                let page = catalog.page(1);
                PortalResponse::Channels(ChannelListing {
                    data: page.items,
                    total_items: page.total_items,
                    max_page_items: PAGE_SIZE,
                    selected_item: 0,
                    cur_page: page.current_page,
                    all_pages: page.all_pages,
                    error: None,
                })
            }
            Err(e) => {
                tracing::warn!(error = %e, "Serving empty channel list");
                PortalResponse::Channels(ChannelListing {
                    data: Arc::default(),
                    total_items: 0,
                    max_page_items: PAGE_SIZE,
                    selected_item: 0,
                    cur_page: 1,
                    all_pages: 0,
                    error: Some("Failed to load channels".to_string()),
                })
            }
        }
    }
}

fn profile(identity: Option<&DeviceIdentity>) -> PortalResponse {
    PortalResponse::Profile(Profile::new(
        display_mac(identity).to_string(),
        crate::util::time::unix_timestamp(),
    ))
}

fn create_link(cmd: Option<String>) -> PortalResponse {
    match cmd.filter(|cmd| !cmd.is_empty()) {
        Some(cmd) => PortalResponse::Link(Link {
            id: "1",
            cmd,
            load: 100,
            priority: 0,
        }),
        None => PortalResponse::Error(ErrorPayload::new("No channel specified")),
    }
}

#[cfg(test)]
mod tests {
    use std::collections::HashSet;
    use std::time::Duration;

    use serde_json::Value;

    use super::*;
    use crate::device::registry::testing::UnavailableRegistry;
    use crate::device::{MemoryRegistry, register_device};
    use crate::playlist::cache::testing::StaticPlaylist;
    use crate::util::random::RandomTokens;
    use crate::util::random::testing::SequentialTokens;

    const DEMO: &str = "#EXTINF:-1 tvg-logo=\"http://x/logo.png\",Demo Channel\n\
                        http://stream.example/demo.m3u8\n";

    fn portal_with(
        registry: Option<Arc<dyn DeviceRegistry>>,
        source: Arc<StaticPlaylist>,
    ) -> Portal {
        Portal::new(
            registry,
            Arc::new(CatalogCache::new(source, Duration::from_secs(300))),
            Arc::new(SequentialTokens::default()),
        )
    }

    fn portal() -> Portal {
        portal_with(None, Arc::new(StaticPlaylist::new(DEMO)))
    }

    async fn js(portal: &Portal, action: Option<&str>, mac: Option<&str>) -> Value {
        let request = PortalRequest {
            action: action.map(str::to_string),
            cmd: None,
            identity: mac.map(DeviceIdentity::new),
        };
        let envelope = portal.dispatch(request).await;
        serde_json::to_value(&envelope).unwrap()["js"].clone()
    }

    #[tokio::test]
    async fn test_handshake_shape() {
        let js = js(&portal(), Some("handshake"), Some("00:1a:79:12:34:56")).await;

        assert_eq!(js["token"], "00000000000000000000000001");
        assert_eq!(js["random"], "0000000000002");
        assert_eq!(js["pk_path"], "/stalker_portal/c/");
        assert_eq!(js["api_path"], "/stalker_portal/api/");
        assert_eq!(js["locale"], "en");
        assert_eq!(js["mac"], "00:1a:79:12:34:56");
        assert_eq!(js["metrics"]["mac"], "00:1a:79:12:34:56");
        assert_eq!(js["stb_type"], "MAG250");
        assert_eq!(js["hw_version"], "1.7-BD-00");
        for field in ["sn", "device_id", "device_id2", "signature"] {
            assert_eq!(js[field].as_str().unwrap().len(), 13, "{field}");
        }
    }

    #[tokio::test]
    async fn test_missing_action_is_handshake() {
        let js = js(&portal(), None, None).await;
        assert!(js["token"].is_string());
        assert_eq!(js["mac"], "00:1A:79:00:00:00");
    }

    #[tokio::test]
    async fn test_handshake_without_registry_is_authorized() {
        let js = js(&portal(), None, Some("AA:BB:CC:DD:EE:FF")).await;
        assert_eq!(js["auth"], "1");
        assert_eq!(js["not_valid"], "false");
    }

    #[tokio::test]
    async fn test_handshake_unregistered_device() {
        let registry: Arc<dyn DeviceRegistry> = Arc::new(MemoryRegistry::new());
        let portal = portal_with(Some(registry), Arc::new(StaticPlaylist::new(DEMO)));

        let js = js(&portal, None, Some("AA:BB:CC:DD:EE:FF")).await;
        assert_eq!(js["auth"], "0");
        assert_eq!(js["not_valid"], "true");
    }

    #[tokio::test]
    async fn test_handshake_registered_device() {
        let registry = Arc::new(MemoryRegistry::new());
        register_device(Some(registry.as_ref()), "aa:bb:cc:dd:ee:ff")
            .await
            .unwrap();
        let portal = portal_with(Some(registry), Arc::new(StaticPlaylist::new(DEMO)));

        let js = js(&portal, None, Some("AABBCCDDEEFF")).await;
        assert_eq!(js["auth"], "1");
        assert_eq!(js["not_valid"], "false");
    }

    #[tokio::test]
    async fn test_handshake_registry_down_is_authorized() {
        let portal = portal_with(
            Some(Arc::new(UnavailableRegistry)),
            Arc::new(StaticPlaylist::new(DEMO)),
        );
        let js = js(&portal, None, Some("AA:BB:CC:DD:EE:FF")).await;
        assert_eq!(js["auth"], "1");
    }

    #[tokio::test]
    async fn test_handshake_tokens_are_fresh() {
        let portal = Portal::new(
            None,
            Arc::new(CatalogCache::new(
                Arc::new(StaticPlaylist::new(DEMO)),
                Duration::from_secs(300),
            )),
            Arc::new(RandomTokens),
        );

        let mut tokens = HashSet::new();
        for _ in 0..20 {
            let js = js(&portal, None, None).await;
            let token = js["token"].as_str().unwrap().to_string();
            assert_eq!(token.len(), 26);
            tokens.insert(token);
        }
        assert_eq!(tokens.len(), 20);
    }

    #[tokio::test]
    async fn test_profile() {
        let js = js(&portal(), Some("get_profile"), Some("00:1A:79:AA:BB:CC")).await;
        assert_eq!(js["id"], "1");
        assert_eq!(js["name"], "Profile");
        assert_eq!(js["mac"], "00:1A:79:AA:BB:CC");
        assert_eq!(js["timezone"], "UTC");
        assert_eq!(js["video_out"], "hdmi");
        assert!(js["created"].as_i64().unwrap() > 0);
        assert_eq!(js["created"], js["last_change_date"]);
    }

    #[tokio::test]
    async fn test_profile_without_identity() {
        let js = js(&portal(), Some("get_profile"), None).await;
        assert_eq!(js["mac"], "00:1A:79:00:00:00");
    }

    #[tokio::test]
    async fn test_localization() {
        let js = js(&portal(), Some("get_localization"), None).await;
        assert_eq!(js["languages"][0]["iso_code"], "en_US");
        assert_eq!(js["languages"][0]["name"], "English");
        assert_eq!(js["languages"].as_array().unwrap().len(), 1);
        assert_eq!(js["timezones"], serde_json::json!([]));
    }

    #[tokio::test]
    async fn test_all_channels() {
        let js = js(&portal(), Some("get_all_channels"), None).await;
        assert_eq!(js["total_items"], 1);
        assert_eq!(js["all_pages"], 1);
        assert_eq!(js["max_page_items"], 14);
        assert_eq!(js["selected_item"], 0);
        assert_eq!(js["cur_page"], 1);
        assert!(js.get("error").is_none());

        let channel = &js["data"][0];
        assert_eq!(channel["id"], "1");
        assert_eq!(channel["name"], "Demo Channel");
        assert_eq!(channel["logo"], "http://x/logo.png");
        assert_eq!(channel["cmd"], "http://stream.example/demo.m3u8");
    }

    #[tokio::test]
    async fn test_ordered_list_is_unsliced() {
        let text: String = (1..=30)
            .map(|i| format!("#EXTINF:-1,Ch {i}\nhttp://example.com/{i}.ts\n"))
            .collect();
        let portal = portal_with(None, Arc::new(StaticPlaylist::new(&text)));

        let js = js(&portal, Some("get_ordered_list"), None).await;
        assert_eq!(js["total_items"], 30);
        assert_eq!(js["all_pages"], 3);
        assert_eq!(js["data"].as_array().unwrap().len(), 30);
    }

    #[tokio::test]
    async fn test_channels_upstream_failure() {
        let portal = portal_with(None, Arc::new(StaticPlaylist::failing()));
        let js = js(&portal, Some("get_all_channels"), None).await;
        assert_eq!(js["error"], "Failed to load channels");
        assert_eq!(js["data"], serde_json::json!([]));
        assert_eq!(js["total_items"], 0);
        assert_eq!(js["all_pages"], 0);
    }

    #[tokio::test]
    async fn test_create_link() {
        let request = PortalRequest {
            action: Some("create_link".to_string()),
            cmd: Some("http://stream.example/demo.m3u8".to_string()),
            identity: None,
        };
        let js = serde_json::to_value(portal().dispatch(request).await).unwrap()["js"].clone();
        assert_eq!(js["id"], "1");
        assert_eq!(js["cmd"], "http://stream.example/demo.m3u8");
        assert_eq!(js["load"], 100);
        assert_eq!(js["priority"], 0);
    }

    #[tokio::test]
    async fn test_create_link_without_cmd() {
        for cmd in [None, Some(String::new())] {
            let request = PortalRequest {
                action: Some("create_link".to_string()),
                cmd,
                identity: None,
            };
            let js = serde_json::to_value(portal().dispatch(request).await).unwrap()["js"].clone();
            assert_eq!(js, serde_json::json!({ "error": "No channel specified" }));
        }
    }

    #[tokio::test]
    async fn test_unknown_action() {
        let js = js(&portal(), Some("bogus"), None).await;
        assert_eq!(js["error"], "Unknown action");
        assert_eq!(js["action"], "bogus");
        let supported: Vec<&str> = js["supported_actions"]
            .as_array()
            .unwrap()
            .iter()
            .map(|v| v.as_str().unwrap())
            .collect();
        assert_eq!(supported, ProtocolAction::SUPPORTED);
    }

    #[tokio::test]
    async fn test_non_listing_actions_do_not_fetch() {
        let source = Arc::new(StaticPlaylist::new(DEMO));
        let portal = portal_with(None, source.clone());

        for action in ["handshake", "get_profile", "get_localization", "create_link", "bogus"] {
            js(&portal, Some(action), None).await;
        }
        assert_eq!(source.fetches(), 0);
    }
}
