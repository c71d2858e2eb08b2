//! Process local storage honoring the same constraints as the Postgres schema.

use std::collections::BTreeMap;

use async_trait::async_trait;
use tokio::sync::RwLock;

use crate::{
    domain::{
        datatype::list::{ListParams, ListUsers, SortOrder, UserSortField},
        entity::{
            registry::{Company, CompanyState, EconomicGroup, EconomicGroupState},
            user::{Profile, User, UserState},
        },
        repository::{
            CompanyChanges, CompanyInsert, CompanyRepository, EconomicGroupChanges,
            EconomicGroupInsert, EconomicGroupRepository, UserChanges, UserInsert, UserRepository,
        },
    },
    error::persistence::{PersistenceError, FOREIGN_KEY_VIOLATION, UNIQUE_VIOLATION},
};

fn violation(code: &str, constraint: &str) -> PersistenceError {
    PersistenceError::Database(Some(code.into()), Some(constraint.into()))
}

#[derive(Debug, Default)]
struct Sequence(i32);

impl Sequence {
    fn next(&mut self) -> i32 {
        self.0 += 1;
        self.0
    }
}

#[derive(Debug, Clone)]
struct UserRecord {
    email: String,
    name: String,
}

#[derive(Debug, Default)]
struct Tables {
    users: BTreeMap<i32, UserRecord>,
    user_seq: Sequence,
    /// Keyed by the owning user id.
    profiles: BTreeMap<i32, Profile>,
    profile_seq: Sequence,
    groups: BTreeMap<i32, EconomicGroupState>,
    group_seq: Sequence,
    companies: BTreeMap<i32, CompanyState>,
    company_seq: Sequence,
}

impl Tables {
    fn user(&self, id: i32) -> Option<User> {
        self.users.get(&id).map(|record| {
            User::restore(
                id,
                UserState {
                    email: record.email.clone(),
                    name: record.name.clone(),
                    profile: self.profiles.get(&id).cloned(),
                },
            )
        })
    }

    fn check_user_email(&self, email: &str, owner: Option<i32>) -> Result<(), PersistenceError> {
        let taken = self
            .users
            .iter()
            .any(|(id, record)| record.email == email && Some(*id) != owner);
        if taken {
            return Err(violation(UNIQUE_VIOLATION, "user_email_key"));
        }
        Ok(())
    }

    fn check_group_cnpj(&self, cnpj: &str, owner: Option<i32>) -> Result<(), PersistenceError> {
        let taken = self
            .groups
            .iter()
            .any(|(id, group)| group.cnpj == cnpj && Some(*id) != owner);
        if taken {
            return Err(violation(UNIQUE_VIOLATION, "economic_group_cnpj_key"));
        }
        Ok(())
    }

    fn check_company(
        &self,
        company: &CompanyState,
        owner: Option<i32>,
    ) -> Result<(), PersistenceError> {
        let taken = self
            .companies
            .iter()
            .any(|(id, stored)| stored.cnpj == company.cnpj && Some(*id) != owner);
        if taken {
            return Err(violation(UNIQUE_VIOLATION, "company_cnpj_key"));
        }
        if !self.groups.contains_key(&company.economic_group_id) {
            return Err(violation(FOREIGN_KEY_VIOLATION, "company_economic_group_id_fkey"));
        }
        if let Some(group_id) = company.economic_group_db_id {
            if !self.groups.contains_key(&group_id) {
                return Err(violation(
                    FOREIGN_KEY_VIOLATION,
                    "company_economic_group_db_id_fkey",
                ));
            }
        }
        Ok(())
    }
}

fn ordered<T>(records: impl Iterator<Item = T>, params: &ListParams) -> Vec<T> {
    match params.order {
        SortOrder::Asc => params.paginate(records),
        SortOrder::Desc => params.paginate(records.collect::<Vec<_>>().into_iter().rev()),
    }
}

/// Storage kept in memory for the life of the process.
#[derive(Debug, Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserRepository for MemoryStore {
    async fn insert_user(&self, user: UserInsert) -> Result<User, PersistenceError> {
        let mut tables = self.tables.write().await;
        tables.check_user_email(&user.email, None)?;

        let id = tables.user_seq.next();
        tables.users.insert(
            id,
            UserRecord {
                email: user.email,
                name: user.name,
            },
        );
        if let Some(profile) = user.profile {
            let profile_id = tables.profile_seq.next();
            tables.profiles.insert(
                id,
                Profile {
                    id: Some(profile_id),
                    bio: profile.bio,
                },
            );
        }

        tables.user(id).ok_or(PersistenceError::NotFound)
    }

    async fn list_users(&self, query: &ListUsers) -> Result<Vec<User>, PersistenceError> {
        let tables = self.tables.read().await;
        let mut users: Vec<User> = tables.users.keys().filter_map(|id| tables.user(*id)).collect();

        match query.order_by {
            UserSortField::Id => {}
            UserSortField::Email => users.sort_by(|a, b| a.email().cmp(b.email())),
            UserSortField::Name => users.sort_by(|a, b| a.name().cmp(b.name())),
        }

        Ok(ordered(users.into_iter(), &query.params))
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, PersistenceError> {
        Ok(self.tables.read().await.user(id))
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, PersistenceError> {
        let tables = self.tables.read().await;
        let id = tables
            .users
            .iter()
            .find(|(_, record)| record.email == email)
            .map(|(id, _)| *id);
        Ok(id.and_then(|id| tables.user(id)))
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<User, PersistenceError> {
        let mut tables = self.tables.write().await;
        let mut record = tables
            .users
            .get(&id)
            .cloned()
            .ok_or(PersistenceError::NotFound)?;

        if let Some(email) = changes.email {
            tables.check_user_email(&email, Some(id))?;
            record.email = email;
        }
        if let Some(name) = changes.name {
            record.name = name;
        }
        tables.users.insert(id, record);

        if let Some(bio) = changes.profile.and_then(|profile| profile.bio) {
            match tables.profiles.get_mut(&id) {
                Some(profile) => profile.bio = bio,
                None => {
                    let profile_id = tables.profile_seq.next();
                    tables.profiles.insert(
                        id,
                        Profile {
                            id: Some(profile_id),
                            bio,
                        },
                    );
                }
            }
        }

        tables.user(id).ok_or(PersistenceError::NotFound)
    }

    async fn delete_user(&self, id: i32) -> Result<(), PersistenceError> {
        let mut tables = self.tables.write().await;
        tables.users.remove(&id).ok_or(PersistenceError::NotFound)?;
        tables.profiles.remove(&id);
        Ok(())
    }
}

#[async_trait]
impl EconomicGroupRepository for MemoryStore {
    async fn insert_economic_group(
        &self,
        group: EconomicGroupInsert,
    ) -> Result<EconomicGroup, PersistenceError> {
        let mut tables = self.tables.write().await;
        tables.check_group_cnpj(&group.cnpj, None)?;

        let id = tables.group_seq.next();
        tables.groups.insert(id, group.clone());
        Ok(EconomicGroup::restore(id, group))
    }

    async fn list_economic_groups(
        &self,
        params: &ListParams,
    ) -> Result<Vec<EconomicGroup>, PersistenceError> {
        let tables = self.tables.read().await;
        let groups = tables
            .groups
            .iter()
            .map(|(id, group)| EconomicGroup::restore(*id, group.clone()));
        Ok(ordered(groups, params))
    }

    async fn find_economic_group(&self, id: i32) -> Result<Option<EconomicGroup>, PersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .get(&id)
            .map(|group| EconomicGroup::restore(id, group.clone())))
    }

    async fn find_economic_group_by_cnpj(
        &self,
        cnpj: &str,
    ) -> Result<Option<EconomicGroup>, PersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .groups
            .iter()
            .find(|(_, group)| group.cnpj == cnpj)
            .map(|(id, group)| EconomicGroup::restore(*id, group.clone())))
    }

    async fn update_economic_group(
        &self,
        id: i32,
        changes: EconomicGroupChanges,
    ) -> Result<EconomicGroup, PersistenceError> {
        let mut tables = self.tables.write().await;
        let mut group = tables
            .groups
            .get(&id)
            .cloned()
            .ok_or(PersistenceError::NotFound)?;

        changes.apply(&mut group);
        tables.check_group_cnpj(&group.cnpj, Some(id))?;
        tables.groups.insert(id, group.clone());
        Ok(EconomicGroup::restore(id, group))
    }

    async fn delete_economic_group(&self, id: i32) -> Result<(), PersistenceError> {
        let mut tables = self.tables.write().await;
        if !tables.groups.contains_key(&id) {
            return Err(PersistenceError::NotFound);
        }
        if tables
            .companies
            .values()
            .any(|company| company.economic_group_id == id)
        {
            return Err(violation(FOREIGN_KEY_VIOLATION, "company_economic_group_id_fkey"));
        }

        tables.groups.remove(&id);
        for company in tables.companies.values_mut() {
            if company.economic_group_db_id == Some(id) {
                company.economic_group_db_id = None;
            }
        }
        Ok(())
    }

    async fn list_group_companies(&self, group_id: i32) -> Result<Vec<Company>, PersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .companies
            .iter()
            .filter(|(_, company)| company.economic_group_db_id == Some(group_id))
            .map(|(id, company)| Company::restore(*id, company.clone()))
            .collect())
    }
}

#[async_trait]
impl CompanyRepository for MemoryStore {
    async fn insert_company(&self, company: CompanyInsert) -> Result<Company, PersistenceError> {
        let mut tables = self.tables.write().await;
        tables.check_company(&company, None)?;

        let id = tables.company_seq.next();
        tables.companies.insert(id, company.clone());
        Ok(Company::restore(id, company))
    }

    async fn list_companies(&self, params: &ListParams) -> Result<Vec<Company>, PersistenceError> {
        let tables = self.tables.read().await;
        let companies = tables
            .companies
            .iter()
            .map(|(id, company)| Company::restore(*id, company.clone()));
        Ok(ordered(companies, params))
    }

    async fn find_company(&self, id: i32) -> Result<Option<Company>, PersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .companies
            .get(&id)
            .map(|company| Company::restore(id, company.clone())))
    }

    async fn find_company_by_cnpj(&self, cnpj: &str) -> Result<Option<Company>, PersistenceError> {
        let tables = self.tables.read().await;
        Ok(tables
            .companies
            .iter()
            .find(|(_, company)| company.cnpj == cnpj)
            .map(|(id, company)| Company::restore(*id, company.clone())))
    }

    async fn update_company(
        &self,
        id: i32,
        changes: CompanyChanges,
    ) -> Result<Company, PersistenceError> {
        let mut tables = self.tables.write().await;
        let mut company = tables
            .companies
            .get(&id)
            .cloned()
            .ok_or(PersistenceError::NotFound)?;

        changes.apply(&mut company);
        tables.check_company(&company, Some(id))?;
        tables.companies.insert(id, company.clone());
        Ok(Company::restore(id, company))
    }

    async fn delete_company(&self, id: i32) -> Result<(), PersistenceError> {
        let mut tables = self.tables.write().await;
        tables
            .companies
            .remove(&id)
            .map(|_| ())
            .ok_or(PersistenceError::NotFound)
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::domain::{
        entity::Entity,
        repository::{ProfileInsert, ProfileUpsert},
    };

    fn new_user(email: &str, name: &str) -> UserInsert {
        UserInsert {
            email: email.into(),
            name: name.into(),
            profile: None,
        }
    }

    fn new_group(cnpj: &str) -> EconomicGroupInsert {
        EconomicGroupState {
            cnpj: cnpj.into(),
            name: "Group".into(),
            is_unified_boleto: "N".into(),
            fee_fix: None,
        }
    }

    fn new_company(cnpj: &str, group: i32, owner: Option<i32>) -> CompanyInsert {
        CompanyState {
            economic_group_id: group,
            trade_name: "Trade".into(),
            cnpj: cnpj.into(),
            start_validity: None,
            cutoff_date: None,
            issuance_date: None,
            end_validity: None,
            company_status: "active".into(),
            name: None,
            number_of_employees: None,
            classification: None,
            economic_group_db_id: owner,
        }
    }

    #[tokio::test]
    async fn assigns_sequential_ids_and_keeps_profile() {
        let store = MemoryStore::new();
        let first = store
            .insert_user(UserInsert {
                profile: Some(ProfileInsert { bio: "bio".into() }),
                ..new_user("a@example.com", "A")
            })
            .await
            .unwrap();
        let second = store.insert_user(new_user("b@example.com", "B")).await.unwrap();

        assert_eq!(first.ident(), 1);
        assert_eq!(second.ident(), 2);
        assert_eq!(
            first.profile(),
            &Some(Profile {
                id: Some(1),
                bio: "bio".into()
            })
        );
        assert_eq!(second.profile(), &None);
    }

    #[tokio::test]
    async fn rejects_duplicated_email_with_constraint_name() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com", "A")).await.unwrap();

        let err = store
            .insert_user(new_user("a@example.com", "Other"))
            .await
            .unwrap_err();
        assert_eq!(err.unique_violation(), Some("user_email_key"));
    }

    #[tokio::test]
    async fn update_creates_missing_profile_and_delete_removes_it() {
        let store = MemoryStore::new();
        store.insert_user(new_user("a@example.com", "A")).await.unwrap();

        let updated = store
            .update_user(
                1,
                UserChanges {
                    profile: Some(ProfileUpsert {
                        bio: Some("new".into()),
                    }),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.profile().as_ref().map(|p| p.bio.as_str()), Some("new"));

        store.delete_user(1).await.unwrap();
        assert_eq!(store.find_user(1).await.unwrap(), None);
        assert!(matches!(
            store.delete_user(1).await,
            Err(PersistenceError::NotFound)
        ));
    }

    #[tokio::test]
    async fn lists_users_sorted_and_paginated() {
        let store = MemoryStore::new();
        for (email, name) in [
            ("c@example.com", "Carol"),
            ("a@example.com", "Alice"),
            ("b@example.com", "Bob"),
        ] {
            store.insert_user(new_user(email, name)).await.unwrap();
        }

        let query = ListUsers {
            params: ListParams {
                skip: 1,
                take: Some(1),
                order: SortOrder::Desc,
            },
            order_by: UserSortField::Name,
        };
        let users = store.list_users(&query).await.unwrap();
        let names: Vec<&str> = users.iter().map(|user| user.name().as_str()).collect();
        assert_eq!(names, vec!["Bob"]);
    }

    #[tokio::test]
    async fn group_removal_honors_company_references() {
        let store = MemoryStore::new();
        store.insert_economic_group(new_group("1")).await.unwrap();
        store.insert_economic_group(new_group("2")).await.unwrap();
        store.insert_company(new_company("10", 1, Some(2))).await.unwrap();

        assert_eq!(store.list_group_companies(2).await.unwrap().len(), 1);

        let err = store.delete_economic_group(1).await.unwrap_err();
        assert!(err.is_foreign_key_violation());

        store.delete_economic_group(2).await.unwrap();
        let company = store.find_company(1).await.unwrap().unwrap();
        assert_eq!(company.economic_group_db_id(), &None);
    }

    #[tokio::test]
    async fn company_requires_existing_groups() {
        let store = MemoryStore::new();
        let err = store
            .insert_company(new_company("10", 1, None))
            .await
            .unwrap_err();
        assert_eq!(err.constraint(), Some("company_economic_group_id_fkey"));
    }
}
