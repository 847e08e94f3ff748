use serde::{Deserialize, Serialize};

/// User preferences for a day plan. A value object: snapshotted into the
/// generated plan, never persisted on its own.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Preferences {
    pub party_type: PartyType,
    pub activity_level: ActivityLevel,
    pub transport_mode: TransportMode,
    pub budget: Budget,
    pub currency: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PartyType {
    Solo,
    Couple,
    Family,
}

impl PartyType {
    pub fn label(self) -> &'static str {
        match self {
            PartyType::Solo => "a solo traveller",
            PartyType::Couple => "a couple",
            PartyType::Family => "a family with children",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityLevel {
    Light,
    Moderate,
    Active,
    Intensive,
}

impl ActivityLevel {
    pub fn label(self) -> &'static str {
        match self {
            ActivityLevel::Light => "light, relaxed pace with plenty of breaks",
            ActivityLevel::Moderate => "moderate pace mixing sights and downtime",
            ActivityLevel::Active => "active pace covering several sights",
            ActivityLevel::Intensive => "intensive pace packing in as much as possible",
        }
    }

    /// Minutes of visit time that roughly justify one activity at this pace.
    pub fn minutes_per_activity(self) -> i64 {
        match self {
            ActivityLevel::Light => 180,
            ActivityLevel::Moderate => 150,
            ActivityLevel::Active => 120,
            ActivityLevel::Intensive => 90,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TransportMode {
    Walking,
    PublicTransport,
    Taxi,
    Mixed,
}

impl TransportMode {
    pub fn label(self) -> &'static str {
        match self {
            TransportMode::Walking => "walking only",
            TransportMode::PublicTransport => "public transport",
            TransportMode::Taxi => "taxi",
            TransportMode::Mixed => "a mix of walking, public transport and taxi",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Budget {
    Free,
    Low,
    Medium,
    High,
}

impl Budget {
    pub fn label(self) -> &'static str {
        match self {
            Budget::Free => "free activities only",
            Budget::Low => "a low budget",
            Budget::Medium => "a medium budget",
            Budget::High => "a generous budget",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preferences_round_trip_snake_case() {
        let prefs = Preferences {
            party_type: PartyType::Couple,
            activity_level: ActivityLevel::Moderate,
            transport_mode: TransportMode::PublicTransport,
            budget: Budget::Medium,
            currency: "EUR".into(),
        };
        let json = serde_json::to_value(&prefs).unwrap();
        assert_eq!(json["party_type"], "couple");
        assert_eq!(json["transport_mode"], "public_transport");
        let back: Preferences = serde_json::from_value(json).unwrap();
        assert_eq!(back, prefs);
    }

    #[test]
    fn unknown_variant_is_rejected() {
        let json = serde_json::json!({
            "party_type": "crowd",
            "activity_level": "moderate",
            "transport_mode": "mixed",
            "budget": "medium",
            "currency": "EUR",
        });
        assert!(serde_json::from_value::<Preferences>(json).is_err());
    }
}
