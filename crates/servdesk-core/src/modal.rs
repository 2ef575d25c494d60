// ── Modal orchestration ──
//
// At most one dialog is open per screen. Modelling that as one enum makes
// "create and delete open at once" unrepresentable.

/// Which dialog, if any, is open.
#[derive(Debug, Clone, PartialEq)]
pub enum ModalState<T> {
    Idle,
    Create,
    Edit(T),
    Delete(T),
}

/// The dialog kind without its target.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, strum::Display, strum::AsRefStr)]
#[strum(serialize_all = "lowercase")]
pub enum ModalKind {
    Idle,
    Create,
    Edit,
    Delete,
}

impl<T> Default for ModalState<T> {
    fn default() -> Self {
        Self::Idle
    }
}

impl<T> ModalState<T> {
    /// Open the create dialog. Any other dialog and its target close.
    pub fn open_create(&mut self) {
        *self = Self::Create;
    }

    pub fn open_edit(&mut self, target: T) {
        *self = Self::Edit(target);
    }

    pub fn open_delete(&mut self, target: T) {
        *self = Self::Delete(target);
    }

    /// Back to idle, returning what was open.
    pub fn close(&mut self) -> Self {
        std::mem::take(self)
    }

    pub fn kind(&self) -> ModalKind {
        match self {
            Self::Idle => ModalKind::Idle,
            Self::Create => ModalKind::Create,
            Self::Edit(_) => ModalKind::Edit,
            Self::Delete(_) => ModalKind::Delete,
        }
    }

    pub fn is_open(&self) -> bool {
        !matches!(self, Self::Idle)
    }

    /// The entity being edited or deleted.
    pub fn target(&self) -> Option<&T> {
        match self {
            Self::Edit(t) | Self::Delete(t) => Some(t),
            Self::Idle | Self::Create => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn opening_one_dialog_replaces_another() {
        let mut modal = ModalState::default();
        modal.open_delete(7);
        assert_eq!(modal.target(), Some(&7));

        modal.open_create();
        assert_eq!(modal.kind(), ModalKind::Create);
        assert_eq!(modal.target(), None);

        modal.open_edit(3);
        assert_eq!(modal, ModalState::Edit(3));
    }

    #[test]
    fn close_returns_to_idle() {
        let mut modal = ModalState::Edit("svc");
        assert_eq!(modal.close(), ModalState::Edit("svc"));
        assert!(!modal.is_open());
        assert_eq!(modal.close(), ModalState::Idle);
    }
}
