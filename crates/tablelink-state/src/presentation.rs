//! Presentation-only state: chat log, modal and reconnect overlay.
//!
//! This is the one piece of state the client derives on its own. It is
//! folded from reducer advisories and connection status changes and never
//! feeds back into the table view.

use tablelink_session::{CloseReason, ConnState};

use crate::Advisory;

/// What kind of modal is showing.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ModalKind {
    /// Informational; the game continues underneath.
    Notice,
    /// Blocking; the only way out is back to the entry point.
    PreGame,
    /// The connection dropped and a retry is under way.
    Reconnect,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    pub kind: ModalKind,
    pub lines: Vec<String>,
}

impl Modal {
    fn new(kind: ModalKind, line: impl Into<String>) -> Self {
        Self {
            kind,
            lines: vec![line.into()],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Presentation {
    chat: Vec<String>,
    modal: Option<Modal>,
}

impl Presentation {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn chat(&self) -> &[String] {
        &self.chat
    }

    pub fn modal(&self) -> Option<&Modal> {
        self.modal.as_ref()
    }

    /// Returns `true` while a blocking modal is up.
    pub fn is_blocked(&self) -> bool {
        self.modal
            .as_ref()
            .is_some_and(|m| m.kind == ModalKind::PreGame)
    }

    /// The user closed the modal.
    pub fn dismiss(&mut self) {
        self.modal = None;
    }

    /// Folds one reducer advisory in.
    pub fn apply(&mut self, advisory: &Advisory) {
        match advisory {
            Advisory::ChatLine(line) => self.chat.push(line.clone()),
            Advisory::Notice(text) => match self.modal.as_mut() {
                Some(modal) if modal.kind != ModalKind::Reconnect => {
                    modal.lines.push(text.clone());
                }
                _ => self.modal = Some(Modal::new(ModalKind::Notice, text.clone())),
            },
            Advisory::Blocking(text) => {
                self.modal = Some(Modal::new(ModalKind::PreGame, text.clone()));
            }
            Advisory::DismissModal => {
                if !self.is_blocked() {
                    self.modal = None;
                }
            }
            Advisory::RoomRenamed(_)
            | Advisory::ProtocolViolation(_)
            | Advisory::Reconciliation(_) => {}
        }
    }

    /// Folds a connection status change in.
    ///
    /// `room` names the room in the "doesn't exist anymore" text.
    pub fn apply_status(&mut self, state: &ConnState, room: &str) {
        match state {
            ConnState::Reconnecting { .. } if !self.is_blocked() => {
                self.modal = Some(Modal::new(ModalKind::Reconnect, "reconnecting..."));
            }
            ConnState::Open { .. } => {
                if self.modal.as_ref().is_some_and(|m| m.kind == ModalKind::Reconnect) {
                    self.modal = None;
                }
            }
            ConnState::Closed(reason) => {
                let text = match reason {
                    CloseReason::RetriesExhausted { .. } | CloseReason::MissingToken => {
                        "could not reconnect. connection closed".to_string()
                    }
                    CloseReason::RoomGone => format!("room \"{room}\" doesn't exist anymore"),
                    CloseReason::RoomLocked => format!("room \"{room}\" is locked."),
                    CloseReason::CheckFailed => {
                        format!("could not check room \"{room}\". connection closed")
                    }
                    // Rejections already raised their own modal.
                    CloseReason::Rejected(_) | CloseReason::Clean | CloseReason::Abandoned => {
                        if self.modal.as_ref().is_some_and(|m| m.kind == ModalKind::Reconnect) {
                            self.modal = None;
                        }
                        return;
                    }
                };
                self.modal = Some(Modal::new(ModalKind::PreGame, text));
            }
            _ => {}
        }
    }
}
