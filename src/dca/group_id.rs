/// Group identifiers for new DCA legs.
///
/// Ids are opaque and random, minted once when a group is formed. The symbol
/// lives on the legs, never inside the id, so editing a symbol never touches
/// the id. Older ids such as `DCA-BTC-123456` are still valid group keys;
/// they are compared as plain strings and never parsed.

use crate::errors::JournalError;
use crate::trade::Strategy;
use uuid::Uuid;

/// How a new leg relates to existing DCA positions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GroupLink {
    /// Add the leg to an existing open group
    Existing(String),
    /// Start a new group if the strategy is a DCA strategy
    New,
}

/// `new`, or the id of the group to join.
impl std::str::FromStr for GroupLink {
    type Err = JournalError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "" => Err(JournalError::Parse("empty group link".into())),
            "new" => Ok(Self::New),
            id => Ok(Self::Existing(id.to_string())),
        }
    }
}

pub fn new_group_id() -> String {
    Uuid::new_v4().to_string()
}

/// Group id to store on a new leg.
pub fn assign_group_id(strategy: Strategy, link: &GroupLink) -> Option<String> {
    match link {
        GroupLink::Existing(id) if !id.trim().is_empty() => Some(id.trim().to_string()),
        GroupLink::Existing(_) => None,
        GroupLink::New if strategy.is_dca() => Some(new_group_id()),
        GroupLink::New => None,
    }
}
