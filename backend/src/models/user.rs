//! Stable users: administrators, trainers, riders and stable hands.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::str::FromStr;

use super::horse::SkillLevel;

crate::define_id_type!(i64, UserId);

/// A role tag. A user may hold several at once.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Admin,
    Trainer,
    Rider,
    StableHand,
}

impl Role {
    pub fn as_str(&self) -> &'static str {
        match self {
            Role::Admin => "ADMIN",
            Role::Trainer => "TRAINER",
            Role::Rider => "RIDER",
            Role::StableHand => "STABLE_HAND",
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Role {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_uppercase().replace('-', "_").as_str() {
            "ADMIN" => Ok(Self::Admin),
            "TRAINER" => Ok(Self::Trainer),
            "RIDER" => Ok(Self::Rider),
            "STABLE_HAND" | "STABLEHAND" => Ok(Self::StableHand),
            _ => Err(format!("Unknown role: {}", s)),
        }
    }
}

/// How a rider pays for sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum PaymentMethod {
    #[default]
    PerSession,
    Subscription,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub id: UserId,
    pub name: String,
    pub email: String,
    pub roles: BTreeSet<Role>,
    /// Riding level; only meaningful for riders.
    pub level: Option<SkillLevel>,
    pub specialization: Option<String>,
    pub payment_method: PaymentMethod,
    /// Remaining prepaid hours for subscription riders.
    pub subscription_hours: f64,
}

impl User {
    pub fn has_role(&self, role: Role) -> bool {
        self.roles.contains(&role)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub roles: BTreeSet<Role>,
    pub level: Option<SkillLevel>,
    pub specialization: Option<String>,
    pub payment_method: PaymentMethod,
    pub subscription_hours: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_role_parse_variants() {
        assert_eq!("rider".parse::<Role>().unwrap(), Role::Rider);
        assert_eq!("stable-hand".parse::<Role>().unwrap(), Role::StableHand);
        assert_eq!("STABLE_HAND".parse::<Role>().unwrap(), Role::StableHand);
        assert!("owner".parse::<Role>().is_err());
    }

    #[test]
    fn test_multi_role_user() {
        let user = User {
            id: UserId::new(1),
            name: "Anna".to_string(),
            email: "anna@example.com".to_string(),
            roles: [Role::Trainer, Role::Rider].into_iter().collect(),
            level: Some(SkillLevel::Advanced),
            specialization: Some("Dressage".to_string()),
            payment_method: PaymentMethod::PerSession,
            subscription_hours: 0.0,
        };
        assert!(user.has_role(Role::Trainer));
        assert!(user.has_role(Role::Rider));
        assert!(!user.has_role(Role::Admin));

        let json = serde_json::to_value(&user).unwrap();
        assert_eq!(json["roles"], serde_json::json!(["TRAINER", "RIDER"]));
    }
}
