/// Visibility of the upload modal.
///
/// Dismiss-on-outside is a property of the modal itself: feed every pointer
/// press to [`Modal::pointer_down`] and it closes when the press lands outside
/// its bounds.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Modal {
    open: bool,
    dismiss_on_outside: bool,
}

impl Modal {
    pub fn new(dismiss_on_outside: bool) -> Self {
        Self {
            open: false,
            dismiss_on_outside,
        }
    }

    pub fn is_open(&self) -> bool {
        self.open
    }

    /// Returns true if the modal was closed before.
    pub fn open(&mut self) -> bool {
        !std::mem::replace(&mut self.open, true)
    }

    /// Returns true if the modal was open before.
    pub fn close(&mut self) -> bool {
        std::mem::replace(&mut self.open, false)
    }

    /// Handle a pointer press. Returns true if it closed the modal.
    pub fn pointer_down(&mut self, inside: bool) -> bool {
        if self.open && self.dismiss_on_outside && !inside {
            self.close()
        } else {
            false
        }
    }
}

impl Default for Modal {
    fn default() -> Self {
        Self::new(true)
    }
}
