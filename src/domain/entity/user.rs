use super::{state_ref, EntityCtl};
use crate::base::resource_id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Profile {
    /// `None` until the profile is stored.
    pub id: Option<i32>,
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserState {
    pub email: String,
    pub name: String,
    pub profile: Option<Profile>,
}

pub type User = EntityCtl<UserState>;

resource_id!(User, "user::User");

impl User {
    state_ref!(email, String);
    state_ref!(name, String);
    state_ref!(profile, Option<Profile>);
}

/// A user not yet handed to storage.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewUser {
    pub email: String,
    pub name: String,
    pub profile: Option<NewProfile>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewProfile {
    pub bio: String,
}
