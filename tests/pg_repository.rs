//! Runs against the database in `DATABASE_URL`. Ignored by default, run with
//! `cargo test --test pg_repository -- --ignored`.

use pretty_assertions::assert_eq;
use serial_test::serial;

use user_registry::{
    domain::{
        datatype::list::{ListParams, ListUsers, SortOrder, UserSortField},
        entity::{registry::CompanyState, registry::EconomicGroupState, Entity},
        repository::{
            CompanyChanges, CompanyRepository, EconomicGroupRepository, ProfileInsert,
            ProfileUpsert, UserChanges, UserInsert, UserRepository,
        },
    },
    error::persistence::PersistenceError,
    infra::database::repository::{
        PgCompanyRepository, PgEconomicGroupRepository, PgUserRepository,
    },
};

use crate::setup::setup_database;

mod setup;

fn user(email: &str, name: &str, bio: Option<&str>) -> UserInsert {
    UserInsert {
        email: email.into(),
        name: name.into(),
        profile: bio.map(|bio| ProfileInsert { bio: bio.into() }),
    }
}

fn group(cnpj: &str) -> EconomicGroupState {
    EconomicGroupState {
        cnpj: cnpj.into(),
        name: "Holding".into(),
        is_unified_boleto: "S".into(),
        fee_fix: Some(3),
    }
}

fn company(cnpj: &str, group_id: i32) -> CompanyState {
    CompanyState {
        economic_group_id: group_id,
        trade_name: "Acme".into(),
        cnpj: cnpj.into(),
        start_validity: None,
        cutoff_date: Some(10),
        issuance_date: None,
        end_validity: None,
        company_status: "active".into(),
        name: Some("Acme Ltda".into()),
        number_of_employees: None,
        classification: None,
        economic_group_db_id: Some(group_id),
    }
}

#[tokio::test]
#[serial]
#[ignore = "needs a postgres database in DATABASE_URL"]
async fn user_round_trip_with_profile() {
    let pool = setup_database().await;
    let repo = PgUserRepository::new(pool);

    let created = repo
        .insert_user(user("test@example.com", "Test User", Some("Test bio")))
        .await
        .unwrap();
    assert_eq!(
        created.profile().as_ref().map(|p| p.bio.as_str()),
        Some("Test bio")
    );

    let updated = repo
        .update_user(
            created.ident(),
            UserChanges {
                profile: Some(ProfileUpsert {
                    bio: Some("After Patch".into()),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.name(), "Test User");
    assert_eq!(
        updated.profile().as_ref().map(|p| (p.id, p.bio.as_str())),
        Some((created.profile().as_ref().unwrap().id, "After Patch"))
    );

    let found = repo.find_user_by_email("test@example.com").await.unwrap();
    assert_eq!(found, Some(updated));

    repo.delete_user(created.ident()).await.unwrap();
    assert_eq!(repo.find_user(created.ident()).await.unwrap(), None);
    assert!(matches!(
        repo.delete_user(created.ident()).await,
        Err(PersistenceError::NotFound)
    ));
}

#[tokio::test]
#[serial]
#[ignore = "needs a postgres database in DATABASE_URL"]
async fn user_email_is_unique() {
    let pool = setup_database().await;
    let repo = PgUserRepository::new(pool);

    repo.insert_user(user("dup@example.com", "First", None))
        .await
        .unwrap();
    let err = repo
        .insert_user(user("dup@example.com", "Second", None))
        .await
        .unwrap_err();
    assert_eq!(err.unique_violation(), Some("user_email_key"));
}

#[tokio::test]
#[serial]
#[ignore = "needs a postgres database in DATABASE_URL"]
async fn users_are_sorted_and_paginated() {
    let pool = setup_database().await;
    let repo = PgUserRepository::new(pool);

    for (email, name) in [
        ("c@example.com", "Carol"),
        ("a@example.com", "Alice"),
        ("b@example.com", "Bob"),
    ] {
        repo.insert_user(user(email, name, None)).await.unwrap();
    }

    let users = repo
        .list_users(&ListUsers {
            params: ListParams {
                skip: 1,
                take: Some(2),
                order: SortOrder::Desc,
            },
            order_by: UserSortField::Email,
        })
        .await
        .unwrap();
    let emails: Vec<&str> = users.iter().map(|user| user.email().as_str()).collect();
    assert_eq!(emails, vec!["b@example.com", "a@example.com"]);
}

#[tokio::test]
#[serial]
#[ignore = "needs a postgres database in DATABASE_URL"]
async fn group_removal_respects_company_references() {
    let pool = setup_database().await;
    let groups = PgEconomicGroupRepository::new(pool.clone());
    let companies = PgCompanyRepository::new(pool);

    let holding = groups.insert_economic_group(group("1")).await.unwrap();
    let owner = groups.insert_economic_group(group("2")).await.unwrap();
    let stored = companies
        .insert_company(CompanyState {
            economic_group_db_id: Some(owner.ident()),
            ..company("10", holding.ident())
        })
        .await
        .unwrap();

    let owned = groups.list_group_companies(owner.ident()).await.unwrap();
    assert_eq!(owned, vec![stored.clone()]);

    let err = groups
        .delete_economic_group(holding.ident())
        .await
        .unwrap_err();
    assert!(err.is_foreign_key_violation());

    groups.delete_economic_group(owner.ident()).await.unwrap();
    let stored = companies.find_company(stored.ident()).await.unwrap().unwrap();
    assert_eq!(stored.economic_group_db_id(), &None);
}

#[tokio::test]
#[serial]
#[ignore = "needs a postgres database in DATABASE_URL"]
async fn company_update_writes_only_present_columns() {
    let pool = setup_database().await;
    let groups = PgEconomicGroupRepository::new(pool.clone());
    let companies = PgCompanyRepository::new(pool);

    let holding = groups.insert_economic_group(group("1")).await.unwrap();
    let stored = companies
        .insert_company(company("10", holding.ident()))
        .await
        .unwrap();

    let updated = companies
        .update_company(
            stored.ident(),
            CompanyChanges {
                name: Some(None),
                number_of_employees: Some(Some(25)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let state = updated.state();
    assert_eq!(state.name, None);
    assert_eq!(state.number_of_employees, Some(25));
    assert_eq!(state.cutoff_date, Some(10));
    assert_eq!(state.trade_name, "Acme");

    let err = companies
        .update_company(9999, CompanyChanges::default())
        .await
        .unwrap_err();
    assert!(matches!(err, PersistenceError::NotFound));
}
