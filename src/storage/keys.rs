/// Well-known keys of the MicroCollab store.
///
/// Each key holds a JSON-serialized array, except `Auth` and `CurrentUser`
/// which hold a single object.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreKey {
    Requests,
    Offers,
    Sessions,
    Messages,
    Users,
    Auth,
    Notifications,
    CurrentUser,
}

impl StoreKey {
    pub const ALL: [StoreKey; 8] = [
        StoreKey::Requests,
        StoreKey::Offers,
        StoreKey::Sessions,
        StoreKey::Messages,
        StoreKey::Users,
        StoreKey::Auth,
        StoreKey::Notifications,
        StoreKey::CurrentUser,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            StoreKey::Requests => "requests",
            StoreKey::Offers => "offers",
            StoreKey::Sessions => "sessions",
            StoreKey::Messages => "messages",
            StoreKey::Users => "users",
            StoreKey::Auth => "auth",
            StoreKey::Notifications => "notifications",
            StoreKey::CurrentUser => "current-user",
        }
    }
}
