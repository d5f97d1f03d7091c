use std::fmt;
use std::str::FromStr;

/// Region hosting the service endpoints.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum Region {
    #[default]
    ApNortheast1,
    UsEast1,
    EuWest1,
    ApSoutheast1,
}

impl Region {
    pub const ALL: [Region; 4] = [
        Region::ApNortheast1,
        Region::UsEast1,
        Region::EuWest1,
        Region::ApSoutheast1,
    ];

    /// Host fragment substituted for `{region}` in endpoint templates.
    pub fn name(&self) -> &'static str {
        match self {
            Region::ApNortheast1 => "ap-northeast-1",
            Region::UsEast1 => "us-east-1",
            Region::EuWest1 => "eu-west-1",
            Region::ApSoutheast1 => "ap-southeast-1",
        }
    }
}

impl fmt::Display for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for Region {
    type Err = anyhow::Error;

    /// Accepts both `ap-northeast-1` and `AP_NORTHEAST_1`.
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase().replace('_', "-");
        Region::ALL
            .into_iter()
            .find(|region| region.name() == normalized)
            .ok_or_else(|| {
                anyhow::anyhow!(
                    "Unknown region: {}. Expected one of: {}",
                    s,
                    Region::ALL.map(|r| r.name()).join(", ")
                )
            })
    }
}
