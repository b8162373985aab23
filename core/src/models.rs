use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

pub const FLASH_MODEL_ID: &str = "gemini-3-flash-preview";
pub const PRO_MODEL_ID: &str = "gemini-3-pro-preview";
pub const DEFAULT_THINKING_BUDGET: u32 = 1024;

/// Logical model choice exposed to users, mapped to a transport model id.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ModelTier {
    #[default]
    Flash,
    Pro,
    ProThinking,
}

impl ModelTier {
    pub const ALL: [ModelTier; 3] = [ModelTier::Flash, ModelTier::Pro, ModelTier::ProThinking];

    pub fn model_id(self) -> &'static str {
        match self {
            Self::Flash => FLASH_MODEL_ID,
            Self::Pro | Self::ProThinking => PRO_MODEL_ID,
        }
    }

    /// 0 means thinking is not requested at all.
    pub fn thinking_budget(self) -> u32 {
        match self {
            Self::ProThinking => DEFAULT_THINKING_BUDGET,
            Self::Flash | Self::Pro => 0,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Flash => "flash",
            Self::Pro => "pro",
            Self::ProThinking => "pro-thinking",
        }
    }
}

impl fmt::Display for ModelTier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

impl FromStr for ModelTier {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "flash" => Ok(Self::Flash),
            "pro" => Ok(Self::Pro),
            "pro-thinking" | "pro-with-thinking" | "thinking" => Ok(Self::ProThinking),
            other => Err(format!(
                "Unknown model: {}. Available: flash, pro, pro-thinking",
                other
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tiers_map_to_transport_ids() {
        assert_eq!(ModelTier::Flash.model_id(), "gemini-3-flash-preview");
        assert_eq!(ModelTier::Pro.model_id(), "gemini-3-pro-preview");
        assert_eq!(ModelTier::ProThinking.model_id(), "gemini-3-pro-preview");
    }

    #[test]
    fn only_thinking_tier_has_budget() {
        assert_eq!(ModelTier::Flash.thinking_budget(), 0);
        assert_eq!(ModelTier::Pro.thinking_budget(), 0);
        assert_eq!(ModelTier::ProThinking.thinking_budget(), 1024);
    }

    #[test]
    fn parse_is_case_insensitive() {
        assert_eq!("FLASH".parse::<ModelTier>(), Ok(ModelTier::Flash));
        assert_eq!("Pro".parse::<ModelTier>(), Ok(ModelTier::Pro));
        assert_eq!(
            "pro-with-thinking".parse::<ModelTier>(),
            Ok(ModelTier::ProThinking)
        );
        assert!("ultra".parse::<ModelTier>().is_err());
    }

    #[test]
    fn display_round_trips_through_parse() {
        for tier in ModelTier::ALL {
            assert_eq!(tier.to_string().parse::<ModelTier>(), Ok(tier));
        }
    }
}
