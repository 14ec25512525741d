#[derive(Debug, Clone)]
pub enum Action {
    RequestLogin,
    CancelLogin,
    Logout,
    SelectTheme { theme: String },
    SearchCategories { query: String },
    SelectCategory { name: String },
    UpdateTitle { title: String },
    ToggleBroadcast,
    CopyServerAddress,
    CopyStreamKey,
    Exit,
}
