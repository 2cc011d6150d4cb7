use serde::{Deserialize, Serialize};
use strum::{AsRefStr, EnumString, IntoStaticStr};

/// Status visibility on the destination platform
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, EnumString, IntoStaticStr, AsRefStr, Serialize, Deserialize,
    clap::ValueEnum,
)]
#[strum(serialize_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum Visibility {
    /// Visible to everyone, shown on public timelines
    #[default]
    Public,
    /// Visible to everyone, kept off public timelines
    Unlisted,
    /// Followers only
    Private,
    /// Mentioned accounts only
    Direct,
}

impl Visibility {
    pub fn as_str(&self) -> &'static str {
        self.into()
    }
}

impl std::fmt::Display for Visibility {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}
