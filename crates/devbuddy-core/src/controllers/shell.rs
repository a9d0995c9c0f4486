use crate::error::AppError;

/// Panels reachable from the activity bar.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum SidebarView {
    #[default]
    Explorer,
    Search,
    Git,
    Settings,
    Help,
}

/// Sidebar routing: which panel is selected and whether it is shown.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Sidebar {
    pub view: SidebarView,
    pub open: bool,
}

impl Default for Sidebar {
    fn default() -> Self {
        Self {
            view: SidebarView::Explorer,
            open: true,
        }
    }
}

impl Sidebar {
    /// Selecting the shown panel again collapses the sidebar; any other panel
    /// is opened.
    pub fn select(&mut self, view: SidebarView) {
        if self.view == view {
            self.open = !self.open;
        } else {
            self.view = view;
            self.open = true;
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum NoticeKind {
    /// Shown inside the login form.
    AuthInline,
    /// Blocking alert.
    Alert,
}

/// User-visible outcome of a failed action.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub text: String,
}

impl Notice {
    pub fn auth(error: &AppError) -> Self {
        Self {
            kind: NoticeKind::AuthInline,
            text: error.user_message(),
        }
    }

    pub fn alert(error: &AppError) -> Self {
        Self {
            kind: NoticeKind::Alert,
            text: error.user_message(),
        }
    }
}
