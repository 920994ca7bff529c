use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::str::FromStr;

/// Audio data encoded as base64
pub type Base64EncodedAudioBytes = String;

/// Prebuilt voices offered by the speech collaborator.
#[derive(Debug, Clone, PartialEq)]
pub enum VoiceProfile {
    Puck,
    Charon,
    Kore,
    Fenrir,
    Aoede,
    Custom(String),
}

impl VoiceProfile {
    pub fn as_str(&self) -> &str {
        match self {
            VoiceProfile::Puck => "Puck",
            VoiceProfile::Charon => "Charon",
            VoiceProfile::Kore => "Kore",
            VoiceProfile::Fenrir => "Fenrir",
            VoiceProfile::Aoede => "Aoede",
            VoiceProfile::Custom(s) => s,
        }
    }
}

impl Default for VoiceProfile {
    fn default() -> Self {
        VoiceProfile::Fenrir
    }
}

impl Serialize for VoiceProfile {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(self.as_str())
    }
}

impl FromStr for VoiceProfile {
    type Err = serde_json::Error;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(match s {
            "Puck" => VoiceProfile::Puck,
            "Charon" => VoiceProfile::Charon,
            "Kore" => VoiceProfile::Kore,
            "Fenrir" => VoiceProfile::Fenrir,
            "Aoede" => VoiceProfile::Aoede,
            _ => VoiceProfile::Custom(s.to_string()),
        })
    }
}

impl<'de> Deserialize<'de> for VoiceProfile {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let s = String::deserialize(deserializer)?;
        Ok(VoiceProfile::from_str(&s).unwrap())
    }
}
