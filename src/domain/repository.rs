//! Storage ports and the payloads handed to them.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use super::{
    datatype::list::{ListParams, ListUsers},
    entity::{
        registry::{Company, CompanyState, EconomicGroup, EconomicGroupState},
        user::User,
    },
};
use crate::error::persistence::PersistenceError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserInsert {
    pub email: String,
    pub name: String,
    pub profile: Option<ProfileInsert>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileInsert {
    pub bio: String,
}

/// Columns to overwrite on a user; `None` leaves the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserChanges {
    pub email: Option<String>,
    pub name: Option<String>,
    pub profile: Option<ProfileUpsert>,
}

/// Updates the profile bio when the user has a profile, creates one otherwise.
/// Without a bio an absent profile is left absent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProfileUpsert {
    pub bio: Option<String>,
}

impl UserChanges {
    pub fn is_empty(&self) -> bool {
        self.email.is_none() && self.name.is_none() && self.profile.is_none()
    }
}

pub type EconomicGroupInsert = EconomicGroupState;

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EconomicGroupChanges {
    pub cnpj: Option<String>,
    pub name: Option<String>,
    pub is_unified_boleto: Option<String>,
    pub fee_fix: Option<Option<i32>>,
}

pub type CompanyInsert = CompanyState;

/// Nullable columns use `Some(None)` to clear the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CompanyChanges {
    pub economic_group_id: Option<i32>,
    pub trade_name: Option<String>,
    pub cnpj: Option<String>,
    pub start_validity: Option<Option<DateTime<Utc>>>,
    pub cutoff_date: Option<Option<i32>>,
    pub issuance_date: Option<Option<i32>>,
    pub end_validity: Option<Option<DateTime<Utc>>>,
    pub company_status: Option<String>,
    pub name: Option<Option<String>>,
    pub number_of_employees: Option<Option<i32>>,
    pub classification: Option<Option<String>>,
    pub economic_group_db_id: Option<Option<i32>>,
}

impl EconomicGroupChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(self, state: &mut EconomicGroupState) {
        if let Some(cnpj) = self.cnpj {
            state.cnpj = cnpj;
        }
        if let Some(name) = self.name {
            state.name = name;
        }
        if let Some(is_unified_boleto) = self.is_unified_boleto {
            state.is_unified_boleto = is_unified_boleto;
        }
        if let Some(fee_fix) = self.fee_fix {
            state.fee_fix = fee_fix;
        }
    }
}

impl CompanyChanges {
    pub fn is_empty(&self) -> bool {
        self == &Self::default()
    }

    pub fn apply(self, state: &mut CompanyState) {
        macro_rules! set {
            ($($field:ident),+) => {
                $(
                    if let Some(value) = self.$field {
                        state.$field = value;
                    }
                )+
            };
        }

        set!(
            economic_group_id,
            trade_name,
            cnpj,
            start_validity,
            cutoff_date,
            issuance_date,
            end_validity,
            company_status,
            name,
            number_of_employees,
            classification,
            economic_group_db_id
        );
    }
}

#[async_trait]
pub trait UserRepository: Send + Sync {
    /// Stores the user and its profile, returning the persisted record.
    async fn insert_user(&self, user: UserInsert) -> Result<User, PersistenceError>;

    async fn list_users(&self, query: &ListUsers) -> Result<Vec<User>, PersistenceError>;

    async fn find_user(&self, id: i32) -> Result<Option<User>, PersistenceError>;

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, PersistenceError>;

    /// Fails with [`PersistenceError::NotFound`] when no user has the id.
    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<User, PersistenceError>;

    /// Removes the user and its profile.
    ///
    /// Fails with [`PersistenceError::NotFound`] when no user has the id.
    async fn delete_user(&self, id: i32) -> Result<(), PersistenceError>;
}

#[async_trait]
pub trait EconomicGroupRepository: Send + Sync {
    async fn insert_economic_group(
        &self,
        group: EconomicGroupInsert,
    ) -> Result<EconomicGroup, PersistenceError>;

    async fn list_economic_groups(
        &self,
        params: &ListParams,
    ) -> Result<Vec<EconomicGroup>, PersistenceError>;

    async fn find_economic_group(&self, id: i32) -> Result<Option<EconomicGroup>, PersistenceError>;

    async fn find_economic_group_by_cnpj(
        &self,
        cnpj: &str,
    ) -> Result<Option<EconomicGroup>, PersistenceError>;

    async fn update_economic_group(
        &self,
        id: i32,
        changes: EconomicGroupChanges,
    ) -> Result<EconomicGroup, PersistenceError>;

    /// Companies owned by the group become unowned. Companies pointing at the
    /// group through `economic_group_id` block the removal with a foreign key
    /// violation.
    async fn delete_economic_group(&self, id: i32) -> Result<(), PersistenceError>;

    /// Companies owned by the group, ordered by id.
    async fn list_group_companies(&self, group_id: i32) -> Result<Vec<Company>, PersistenceError>;
}

#[async_trait]
pub trait CompanyRepository: Send + Sync {
    async fn insert_company(&self, company: CompanyInsert) -> Result<Company, PersistenceError>;

    async fn list_companies(&self, params: &ListParams) -> Result<Vec<Company>, PersistenceError>;

    async fn find_company(&self, id: i32) -> Result<Option<Company>, PersistenceError>;

    async fn find_company_by_cnpj(&self, cnpj: &str) -> Result<Option<Company>, PersistenceError>;

    async fn update_company(
        &self,
        id: i32,
        changes: CompanyChanges,
    ) -> Result<Company, PersistenceError>;

    async fn delete_company(&self, id: i32) -> Result<(), PersistenceError>;
}
