use std::fmt::{Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::NodeError;

/// Okta resource families the node operates on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Resource {
    User,
    Group,
    Application,
    Policy,
    AuthServer,
    IdentityProvider,
    SystemLog,
    NetworkZone,
    EventHook,
    Factor,
}

impl Resource {
    pub const ALL: [Self; 10] = [
        Self::User,
        Self::Group,
        Self::Application,
        Self::Policy,
        Self::AuthServer,
        Self::IdentityProvider,
        Self::SystemLog,
        Self::NetworkZone,
        Self::EventHook,
        Self::Factor,
    ];

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::User => "user",
            Self::Group => "group",
            Self::Application => "application",
            Self::Policy => "policy",
            Self::AuthServer => "authServer",
            Self::IdentityProvider => "identityProvider",
            Self::SystemLog => "systemLog",
            Self::NetworkZone => "networkZone",
            Self::EventHook => "eventHook",
            Self::Factor => "factor",
        }
    }
}

impl Display for Resource {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Resource {
    type Err = NodeError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let value = value.trim();
        Self::ALL
            .into_iter()
            .find(|resource| resource.as_str() == value)
            .ok_or_else(|| NodeError::UnknownResource(value.to_owned()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn host_names_round_trip() {
        for resource in Resource::ALL {
            assert_eq!(resource.as_str().parse::<Resource>(), Ok(resource));
        }
    }

    #[test]
    fn unknown_resource_is_reported() {
        assert_eq!(
            "tenant".parse::<Resource>(),
            Err(NodeError::UnknownResource(String::from("tenant")))
        );
    }
}
