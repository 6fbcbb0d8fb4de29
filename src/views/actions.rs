//! Chat capabilities the dashboard exposes but the client does not have
//! yet. Each call site goes through [`ChatActions`] so a real
//! implementation can be dropped in without touching the views.

use thiserror::Error;
use tracing::debug;

use super::Section;

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CapabilityError {
    #[error("{0} is not implemented yet")]
    NotImplemented(&'static str),
}

pub trait ChatActions {
    /// Show the conversation of a room
    fn open_room(&self, room_id: &str) -> Result<(), CapabilityError>;

    /// Show the private conversation with a friend
    fn open_private_chat(&self, friend_id: &str) -> Result<(), CapabilityError>;

    /// Start the create-room flow
    fn create_room(&self) -> Result<(), CapabilityError>;

    /// Persist the dashboard section so it survives a reload
    fn remember_section(&self, section: Section) -> Result<(), CapabilityError>;
}

/// Records the request and reports it as not implemented
#[derive(Debug, Default, Clone, Copy)]
pub struct PendingChatActions;

impl ChatActions for PendingChatActions {
    fn open_room(&self, room_id: &str) -> Result<(), CapabilityError> {
        debug!(room_id = %room_id, "Room selected");
        Err(CapabilityError::NotImplemented("room view"))
    }

    fn open_private_chat(&self, friend_id: &str) -> Result<(), CapabilityError> {
        debug!(friend_id = %friend_id, "Friend selected");
        Err(CapabilityError::NotImplemented("private chat"))
    }

    fn create_room(&self) -> Result<(), CapabilityError> {
        debug!("Create room clicked");
        Err(CapabilityError::NotImplemented("room creation"))
    }

    fn remember_section(&self, section: Section) -> Result<(), CapabilityError> {
        debug!(section = %section.as_str(), "Dashboard section");
        Err(CapabilityError::NotImplemented("section persistence"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pending_actions_report_not_implemented() {
        let actions = PendingChatActions;
        assert_eq!(
            actions.open_room("room1"),
            Err(CapabilityError::NotImplemented("room view"))
        );
        assert_eq!(
            actions.create_room().unwrap_err().to_string(),
            "room creation is not implemented yet"
        );
        assert!(actions.open_private_chat("friend1").is_err());
        assert!(actions.remember_section(Section::Friends).is_err());
    }
}
