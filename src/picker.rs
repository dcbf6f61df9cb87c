// SPDX-FileCopyrightText: 2026 Bruno Meilick
// SPDX-License-Identifier: LicenseRef-Infolens-FreeUse-NoCopy-NoDerivatives
//
// All rights reserved.
//
// This file is part of Infolens and is proprietary software.
// Unauthorized copying, modification, or distribution is prohibited.

//! Color picker popup state.
//!
//! The picker is a plain value owned by its controller. [`transition`] is pure: it returns the
//! next state plus the command (if any) the caller must run against the annotation engine and
//! commit through the store.

use crate::model::{AnnotationId, FieldRef};
use crate::rich_text::HighlightColor;

/// Where the popup is anchored: a character offset inside the bound field's region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Anchor {
    pub offset: usize,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OpenPicker {
    pub anchor: Anchor,
    pub annotation: AnnotationId,
    pub field: FieldRef,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum PickerState {
    #[default]
    Closed,
    Open(OpenPicker),
}

impl PickerState {
    pub fn is_open(&self) -> bool {
        matches!(self, Self::Open(_))
    }

    pub fn bound(&self) -> Option<&OpenPicker> {
        match self {
            Self::Open(open) => Some(open),
            Self::Closed => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerEvent {
    OpenAt {
        anchor: Anchor,
        annotation: AnnotationId,
        field: FieldRef,
    },
    SelectColor(HighlightColor),
    Delete,
    ClickOutside,
}

/// Work requested by a transition, addressed to one highlight in one field.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PickerCommand {
    Recolor {
        field: FieldRef,
        annotation: AnnotationId,
        color: HighlightColor,
    },
    Remove {
        field: FieldRef,
        annotation: AnnotationId,
    },
}

pub fn transition(state: PickerState, event: PickerEvent) -> (PickerState, Option<PickerCommand>) {
    match (state, event) {
        // Opening while open rebinds; the old popup closes without a commit.
        (_, PickerEvent::OpenAt { anchor, annotation, field }) => (
            PickerState::Open(OpenPicker {
                anchor,
                annotation,
                field,
            }),
            None,
        ),
        (PickerState::Open(open), PickerEvent::SelectColor(color)) => (
            PickerState::Closed,
            Some(PickerCommand::Recolor {
                field: open.field,
                annotation: open.annotation,
                color,
            }),
        ),
        (PickerState::Open(open), PickerEvent::Delete) => (
            PickerState::Closed,
            Some(PickerCommand::Remove {
                field: open.field,
                annotation: open.annotation,
            }),
        ),
        (_, PickerEvent::ClickOutside) => (PickerState::Closed, None),
        (PickerState::Closed, PickerEvent::SelectColor(_) | PickerEvent::Delete) => (PickerState::Closed, None),
    }
}

/// Owns the single picker instance.
#[derive(Debug, Default)]
pub struct ColorPickerController {
    state: PickerState,
}

impl ColorPickerController {
    pub fn state(&self) -> &PickerState {
        &self.state
    }

    pub fn is_open(&self) -> bool {
        self.state.is_open()
    }

    pub fn dispatch(&mut self, event: PickerEvent) -> Option<PickerCommand> {
        let (next, command) = transition(std::mem::take(&mut self.state), event);
        self.state = next;
        command
    }
}

#[cfg(test)]
mod tests {
    use super::{transition, Anchor, ColorPickerController, PickerCommand, PickerEvent, PickerState};
    use crate::model::{AnnotationId, FieldRef};
    use crate::rich_text::HighlightColor;

    fn open_event(id: &str, field: FieldRef) -> PickerEvent {
        PickerEvent::OpenAt {
            anchor: Anchor { offset: 3 },
            annotation: AnnotationId::new(id).expect("id"),
            field,
        }
    }

    #[test]
    fn open_then_select_color_recolors_and_closes() {
        let mut picker = ColorPickerController::default();
        assert_eq!(picker.dispatch(open_event("h1", FieldRef::Summary)), None);
        assert!(picker.is_open());

        let red = HighlightColor::new("rgba(248, 113, 113, 0.4)").expect("color");
        let command = picker.dispatch(PickerEvent::SelectColor(red.clone()));
        assert_eq!(
            command,
            Some(PickerCommand::Recolor {
                field: FieldRef::Summary,
                annotation: AnnotationId::new("h1").expect("id"),
                color: red,
            })
        );
        assert_eq!(picker.state(), &PickerState::Closed);
    }

    #[test]
    fn open_then_delete_removes_and_closes() {
        let (state, _) = transition(PickerState::Closed, open_event("h2", FieldRef::Fact(1)));
        let (state, command) = transition(state, PickerEvent::Delete);
        assert_eq!(state, PickerState::Closed);
        assert_eq!(
            command,
            Some(PickerCommand::Remove {
                field: FieldRef::Fact(1),
                annotation: AnnotationId::new("h2").expect("id"),
            })
        );
    }

    #[test]
    fn click_outside_closes_without_command() {
        let (state, _) = transition(PickerState::Closed, open_event("h1", FieldRef::Summary));
        assert_eq!(transition(state, PickerEvent::ClickOutside), (PickerState::Closed, None));
    }

    #[test]
    fn reopening_replaces_the_binding_without_commit() {
        let mut picker = ColorPickerController::default();
        picker.dispatch(open_event("h1", FieldRef::Summary));
        let field = FieldRef::InsightPoint { insight: 0, point: 1 };
        assert_eq!(picker.dispatch(open_event("h9", field)), None);

        let bound = picker.state().bound().expect("open");
        assert_eq!(bound.annotation.as_str(), "h9");
        assert_eq!(bound.field, field);
    }

    #[test]
    fn actions_while_closed_do_nothing() {
        let mut picker = ColorPickerController::default();
        assert_eq!(picker.dispatch(PickerEvent::Delete), None);
        assert_eq!(picker.dispatch(PickerEvent::SelectColor(HighlightColor::default())), None);
        assert!(!picker.is_open());
    }
}
