/// Portal actions the emulator answers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ProtocolAction {
    Handshake,
    GetProfile,
    GetLocalization,
    GetAllChannels,
    GetOrderedList,
    CreateLink,
    Unknown(String),
}

impl ProtocolAction {
    /// Every action name listed back to boxes that ask for something else.
    pub const SUPPORTED: [&'static str; 6] = [
        "handshake",
        "get_profile",
        "get_localization",
        "get_all_channels",
        "get_ordered_list",
        "create_link",
    ];

    /// Parse the `action` query parameter. Missing or empty means handshake.
    pub fn parse(action: Option<&str>) -> Self {
        match action.unwrap_or_default() {
            "" | "handshake" => Self::Handshake,
            "get_profile" => Self::GetProfile,
            "get_localization" => Self::GetLocalization,
            "get_all_channels" => Self::GetAllChannels,
            "get_ordered_list" => Self::GetOrderedList,
            "create_link" => Self::CreateLink,
            other => Self::Unknown(other.to_string()),
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Handshake => "handshake",
            Self::GetProfile => "get_profile",
            Self::GetLocalization => "get_localization",
            Self::GetAllChannels => "get_all_channels",
            Self::GetOrderedList => "get_ordered_list",
            Self::CreateLink => "create_link",
            Self::Unknown(name) => name,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_is_handshake() {
        assert_eq!(ProtocolAction::parse(None), ProtocolAction::Handshake);
        assert_eq!(ProtocolAction::parse(Some("")), ProtocolAction::Handshake);
    }

    #[test]
    fn test_supported_names_round_trip() {
        for name in ProtocolAction::SUPPORTED {
            let action = ProtocolAction::parse(Some(name));
            assert!(!matches!(action, ProtocolAction::Unknown(_)), "{name}");
            assert_eq!(action.name(), name);
        }
    }

    #[test]
    fn test_unknown_keeps_name() {
        let action = ProtocolAction::parse(Some("bogus"));
        assert_eq!(action, ProtocolAction::Unknown("bogus".to_string()));
        assert_eq!(action.name(), "bogus");
    }

    #[test]
    fn test_names_are_case_sensitive() {
        assert!(matches!(
            ProtocolAction::parse(Some("Handshake")),
            ProtocolAction::Unknown(_)
        ));
    }
}
