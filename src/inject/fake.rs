//! In-memory [`InputSimulator`] for tests.

use std::sync::Mutex;

use super::{InjectError, InputSimulator};

/// Observable state of a [`FakeInput`].
#[derive(Debug, Default, Clone)]
pub struct FakeInputState {
    pub clipboard: Option<String>,
    /// What the focused window has selected; `None` means nothing.
    pub selection: Option<String>,
    /// Every text pasted, in order.
    pub pasted: Vec<String>,
    pub copies: u32,
    pub fail_paste: bool,
    pub fail_copy: bool,
}

/// Simulated desktop: copy moves the selection onto the clipboard, paste
/// records the text.
#[derive(Debug, Default)]
pub struct FakeInput {
    state: Mutex<FakeInputState>,
    cursor: (i32, i32),
}

impl FakeInput {
    pub fn new(clipboard: Option<&str>, selection: Option<&str>) -> Self {
        Self {
            state: Mutex::new(FakeInputState {
                clipboard: clipboard.map(str::to_string),
                selection: selection.map(str::to_string),
                ..FakeInputState::default()
            }),
            cursor: (640, 480),
        }
    }

    pub fn failing_paste(mut self) -> Self {
        self.state.get_mut().unwrap().fail_paste = true;
        self
    }

    pub fn failing_copy(mut self) -> Self {
        self.state.get_mut().unwrap().fail_copy = true;
        self
    }

    pub fn state(&self) -> FakeInputState {
        self.state.lock().unwrap().clone()
    }
}

impl InputSimulator for FakeInput {
    fn copy_selection(&self) -> Result<(), InjectError> {
        let mut st = self.state.lock().unwrap();
        if st.fail_copy {
            return Err(InjectError::KeySimulation("copy refused".into()));
        }
        st.copies += 1;
        if let Some(sel) = st.selection.clone() {
            st.clipboard = Some(sel);
        }
        Ok(())
    }

    fn paste(&self, text: &str) -> Result<(), InjectError> {
        let mut st = self.state.lock().unwrap();
        if st.fail_paste {
            return Err(InjectError::KeySimulation("paste refused".into()));
        }
        st.clipboard = Some(text.to_string());
        st.pasted.push(text.to_string());
        Ok(())
    }

    fn read_clipboard(&self) -> Result<Option<String>, InjectError> {
        Ok(self.state.lock().unwrap().clipboard.clone())
    }

    fn write_clipboard(&self, text: &str) -> Result<(), InjectError> {
        self.state.lock().unwrap().clipboard = Some(text.to_string());
        Ok(())
    }

    fn clear_clipboard(&self) -> Result<(), InjectError> {
        self.state.lock().unwrap().clipboard = None;
        Ok(())
    }

    fn cursor_position(&self) -> Result<(i32, i32), InjectError> {
        Ok(self.cursor)
    }
}
