//! Postgres implementations of the storage ports.

use async_trait::async_trait;
use futures::TryStreamExt;
use sqlx::{postgres::PgRow, Executor, PgPool, Postgres, QueryBuilder, Row};

use crate::{
    domain::{
        datatype::list::{ListParams, ListUsers, UserSortField},
        entity::{
            registry::{Company, CompanyState, EconomicGroup, EconomicGroupState},
            user::{Profile, User, UserState},
        },
        repository::{
            CompanyChanges, CompanyInsert, CompanyRepository, EconomicGroupChanges,
            EconomicGroupInsert, EconomicGroupRepository, UserChanges, UserInsert, UserRepository,
        },
    },
    error::persistence::PersistenceError,
};

const USER_SELECT: &str = concat!(
    "SELECT u.id, u.email, u.name, p.id AS profile_id, p.bio AS profile_bio ",
    "FROM registry.\"user\" u LEFT JOIN registry.user_profile p ON p.user_id = u.id",
);

const ECONOMIC_GROUP_COLUMNS: &str = "id, cnpj, name, is_unified_boleto, fee_fix";

const COMPANY_COLUMNS: &str = concat!(
    "id, economic_group_id, trade_name, cnpj, start_validity, cutoff_date, ",
    "issuance_date, end_validity, company_status, name, number_of_employees, ",
    "classification, economic_group_db_id",
);

impl TryFrom<&PgRow> for User {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> Result<Self, Self::Error> {
        let profile_id: Option<i32> = row.try_get("profile_id")?;
        let profile_bio: Option<String> = row.try_get("profile_bio")?;
        let profile = match (profile_id, profile_bio) {
            (Some(id), Some(bio)) => Some(Profile { id: Some(id), bio }),
            _ => None,
        };

        Ok(User::restore(
            row.try_get("id")?,
            UserState {
                email: row.try_get("email")?,
                name: row.try_get("name")?,
                profile,
            },
        ))
    }
}

impl TryFrom<&PgRow> for EconomicGroup {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> Result<Self, Self::Error> {
        Ok(EconomicGroup::restore(
            row.try_get("id")?,
            EconomicGroupState {
                cnpj: row.try_get("cnpj")?,
                name: row.try_get("name")?,
                is_unified_boleto: row.try_get("is_unified_boleto")?,
                fee_fix: row.try_get("fee_fix")?,
            },
        ))
    }
}

impl TryFrom<&PgRow> for Company {
    type Error = sqlx::Error;

    fn try_from(row: &PgRow) -> Result<Self, Self::Error> {
        Ok(Company::restore(
            row.try_get("id")?,
            CompanyState {
                economic_group_id: row.try_get("economic_group_id")?,
                trade_name: row.try_get("trade_name")?,
                cnpj: row.try_get("cnpj")?,
                start_validity: row.try_get("start_validity")?,
                cutoff_date: row.try_get("cutoff_date")?,
                issuance_date: row.try_get("issuance_date")?,
                end_validity: row.try_get("end_validity")?,
                company_status: row.try_get("company_status")?,
                name: row.try_get("name")?,
                number_of_employees: row.try_get("number_of_employees")?,
                classification: row.try_get("classification")?,
                economic_group_db_id: row.try_get("economic_group_db_id")?,
            },
        ))
    }
}

fn push_page(qb: &mut QueryBuilder<'_, Postgres>, params: &ListParams) {
    qb.push(" OFFSET ").push_bind(i64::from(params.skip));
    if let Some(take) = params.take {
        qb.push(" LIMIT ").push_bind(i64::from(take));
    }
}

/// Pushes `column = $n` for every field holding a value, returning whether
/// any was pushed.
macro_rules! push_changes {
    ($qb:ident, $changes:ident, $($field:ident),+) => {{
        let mut set = $qb.separated(", ");
        let mut pushed = false;
        $(
            if let Some(value) = $changes.$field {
                set.push(concat!(stringify!($field), " = "));
                set.push_bind_unseparated(value);
                pushed = true;
            }
        )+
        pushed
    }};
}

async fn fetch_user<'e, E>(executor: E, id: i32) -> Result<Option<User>, PersistenceError>
where
    E: Executor<'e, Database = Postgres>,
{
    let row = sqlx::query(&format!("{USER_SELECT} WHERE u.id = $1"))
        .bind(id)
        .fetch_optional(executor)
        .await?;

    Ok(row.as_ref().map(User::try_from).transpose()?)
}

async fn delete_by_id(pool: &PgPool, table: &str, id: i32) -> Result<(), PersistenceError> {
    let result = sqlx::query(&format!("DELETE FROM registry.{table} WHERE id = $1"))
        .bind(id)
        .execute(pool)
        .await?;

    if result.rows_affected() == 0 {
        return Err(PersistenceError::NotFound);
    }
    tracing::debug!(table, id, "row deleted");
    Ok(())
}

#[derive(Debug, Clone)]
pub struct PgUserRepository {
    pool: PgPool,
}

impl PgUserRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl UserRepository for PgUserRepository {
    async fn insert_user(&self, user: UserInsert) -> Result<User, PersistenceError> {
        let mut trx = self.pool.begin().await?;

        let id: i32 = sqlx::query_scalar(
            "INSERT INTO registry.\"user\" (email, name) VALUES ($1, $2) RETURNING id",
        )
        .bind(user.email)
        .bind(user.name)
        .fetch_one(&mut trx)
        .await?;

        if let Some(profile) = user.profile {
            sqlx::query("INSERT INTO registry.user_profile (bio, user_id) VALUES ($1, $2)")
                .bind(profile.bio)
                .bind(id)
                .execute(&mut trx)
                .await?;
        }

        let user = fetch_user(&mut trx, id)
            .await?
            .ok_or(PersistenceError::NotFound)?;
        trx.commit().await?;

        tracing::debug!(user_id = id, "user row inserted");
        Ok(user)
    }

    async fn list_users(&self, query: &ListUsers) -> Result<Vec<User>, PersistenceError> {
        let order = query.params.order.as_sql();
        let mut qb = QueryBuilder::new(USER_SELECT);
        qb.push(" ORDER BY ")
            .push(query.order_by.column())
            .push(" ")
            .push(order);
        if query.order_by != UserSortField::Id {
            qb.push(", u.id ").push(order);
        }
        push_page(&mut qb, &query.params);

        let mut rows = qb.build().fetch(&self.pool);
        let mut users = Vec::new();
        while let Some(row) = rows.try_next().await? {
            users.push(User::try_from(&row)?);
        }

        Ok(users)
    }

    async fn find_user(&self, id: i32) -> Result<Option<User>, PersistenceError> {
        fetch_user(&self.pool, id).await
    }

    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>, PersistenceError> {
        let row = sqlx::query(&format!("{USER_SELECT} WHERE u.email = $1"))
            .bind(email)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(User::try_from).transpose()?)
    }

    async fn update_user(&self, id: i32, changes: UserChanges) -> Result<User, PersistenceError> {
        let mut trx = self.pool.begin().await?;

        let mut qb = QueryBuilder::new("UPDATE registry.\"user\" SET ");
        let pushed = push_changes!(qb, changes, email, name);
        let found = if pushed {
            qb.push(" WHERE id = ").push_bind(id);
            qb.build().execute(&mut trx).await?.rows_affected() > 0
        } else {
            sqlx::query("SELECT id FROM registry.\"user\" WHERE id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut trx)
                .await?
                .is_some()
        };

        if !found {
            return Err(PersistenceError::NotFound);
        }

        if let Some(bio) = changes.profile.and_then(|profile| profile.bio) {
            sqlx::query(concat!(
                "INSERT INTO registry.user_profile (bio, user_id) VALUES ($1, $2) ",
                "ON CONFLICT (user_id) DO UPDATE SET bio = EXCLUDED.bio",
            ))
            .bind(bio)
            .bind(id)
            .execute(&mut trx)
            .await?;
        }

        let user = fetch_user(&mut trx, id)
            .await?
            .ok_or(PersistenceError::NotFound)?;
        trx.commit().await?;

        Ok(user)
    }

    async fn delete_user(&self, id: i32) -> Result<(), PersistenceError> {
        delete_by_id(&self.pool, "\"user\"", id).await
    }
}

#[derive(Debug, Clone)]
pub struct PgEconomicGroupRepository {
    pool: PgPool,
}

impl PgEconomicGroupRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl EconomicGroupRepository for PgEconomicGroupRepository {
    async fn insert_economic_group(
        &self,
        group: EconomicGroupInsert,
    ) -> Result<EconomicGroup, PersistenceError> {
        let mut qb = QueryBuilder::<Postgres>::new(
            "INSERT INTO registry.economic_group (cnpj, name, is_unified_boleto, fee_fix) ",
        );
        qb.push_values([group], |mut qb, group| {
            qb.push_bind(group.cnpj);
            qb.push_bind(group.name);
            qb.push_bind(group.is_unified_boleto);
            qb.push_bind(group.fee_fix);
        });
        qb.push(" RETURNING ").push(ECONOMIC_GROUP_COLUMNS);

        let row = qb.build().fetch_one(&self.pool).await?;
        Ok(EconomicGroup::try_from(&row)?)
    }

    async fn list_economic_groups(
        &self,
        params: &ListParams,
    ) -> Result<Vec<EconomicGroup>, PersistenceError> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(ECONOMIC_GROUP_COLUMNS)
            .push(" FROM registry.economic_group ORDER BY id ")
            .push(params.order.as_sql());
        push_page(&mut qb, params);

        let mut rows = qb.build().fetch(&self.pool);
        let mut groups = Vec::new();
        while let Some(row) = rows.try_next().await? {
            groups.push(EconomicGroup::try_from(&row)?);
        }

        Ok(groups)
    }

    async fn find_economic_group(&self, id: i32) -> Result<Option<EconomicGroup>, PersistenceError> {
        let row = sqlx::query(&format!(
            "SELECT {ECONOMIC_GROUP_COLUMNS} FROM registry.economic_group WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(EconomicGroup::try_from).transpose()?)
    }

    async fn find_economic_group_by_cnpj(
        &self,
        cnpj: &str,
    ) -> Result<Option<EconomicGroup>, PersistenceError> {
        let row = sqlx::query(&format!(
            "SELECT {ECONOMIC_GROUP_COLUMNS} FROM registry.economic_group WHERE cnpj = $1"
        ))
        .bind(cnpj)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(EconomicGroup::try_from).transpose()?)
    }

    async fn update_economic_group(
        &self,
        id: i32,
        changes: EconomicGroupChanges,
    ) -> Result<EconomicGroup, PersistenceError> {
        if changes.is_empty() {
            return self
                .find_economic_group(id)
                .await?
                .ok_or(PersistenceError::NotFound);
        }

        let mut qb = QueryBuilder::new("UPDATE registry.economic_group SET ");
        push_changes!(qb, changes, cnpj, name, is_unified_boleto, fee_fix);
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(ECONOMIC_GROUP_COLUMNS);

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PersistenceError::NotFound)?;
        Ok(EconomicGroup::try_from(&row)?)
    }

    async fn delete_economic_group(&self, id: i32) -> Result<(), PersistenceError> {
        delete_by_id(&self.pool, "economic_group", id).await
    }

    async fn list_group_companies(&self, group_id: i32) -> Result<Vec<Company>, PersistenceError> {
        let sql = format!(
            "SELECT {COMPANY_COLUMNS} FROM registry.company WHERE economic_group_db_id = $1 ORDER BY id"
        );
        let mut rows = sqlx::query(&sql).bind(group_id).fetch(&self.pool);

        let mut companies = Vec::new();
        while let Some(row) = rows.try_next().await? {
            companies.push(Company::try_from(&row)?);
        }

        Ok(companies)
    }
}

#[derive(Debug, Clone)]
pub struct PgCompanyRepository {
    pool: PgPool,
}

impl PgCompanyRepository {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl CompanyRepository for PgCompanyRepository {
    async fn insert_company(&self, company: CompanyInsert) -> Result<Company, PersistenceError> {
        let mut qb = QueryBuilder::<Postgres>::new("INSERT INTO registry.company (");
        qb.push(COMPANY_COLUMNS.trim_start_matches("id, ")).push(") ");
        qb.push_values([company], |mut qb, company| {
            qb.push_bind(company.economic_group_id);
            qb.push_bind(company.trade_name);
            qb.push_bind(company.cnpj);
            qb.push_bind(company.start_validity);
            qb.push_bind(company.cutoff_date);
            qb.push_bind(company.issuance_date);
            qb.push_bind(company.end_validity);
            qb.push_bind(company.company_status);
            qb.push_bind(company.name);
            qb.push_bind(company.number_of_employees);
            qb.push_bind(company.classification);
            qb.push_bind(company.economic_group_db_id);
        });
        qb.push(" RETURNING ").push(COMPANY_COLUMNS);

        let row = qb.build().fetch_one(&self.pool).await?;
        Ok(Company::try_from(&row)?)
    }

    async fn list_companies(&self, params: &ListParams) -> Result<Vec<Company>, PersistenceError> {
        let mut qb = QueryBuilder::new("SELECT ");
        qb.push(COMPANY_COLUMNS)
            .push(" FROM registry.company ORDER BY id ")
            .push(params.order.as_sql());
        push_page(&mut qb, params);

        let mut rows = qb.build().fetch(&self.pool);
        let mut companies = Vec::new();
        while let Some(row) = rows.try_next().await? {
            companies.push(Company::try_from(&row)?);
        }

        Ok(companies)
    }

    async fn find_company(&self, id: i32) -> Result<Option<Company>, PersistenceError> {
        let row = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM registry.company WHERE id = $1"
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Company::try_from).transpose()?)
    }

    async fn find_company_by_cnpj(&self, cnpj: &str) -> Result<Option<Company>, PersistenceError> {
        let row = sqlx::query(&format!(
            "SELECT {COMPANY_COLUMNS} FROM registry.company WHERE cnpj = $1"
        ))
        .bind(cnpj)
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(Company::try_from).transpose()?)
    }

    async fn update_company(
        &self,
        id: i32,
        changes: CompanyChanges,
    ) -> Result<Company, PersistenceError> {
        if changes.is_empty() {
            return self.find_company(id).await?.ok_or(PersistenceError::NotFound);
        }

        let mut qb = QueryBuilder::new("UPDATE registry.company SET ");
        push_changes!(
            qb,
            changes,
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
        qb.push(" WHERE id = ")
            .push_bind(id)
            .push(" RETURNING ")
            .push(COMPANY_COLUMNS);

        let row = qb
            .build()
            .fetch_optional(&self.pool)
            .await?
            .ok_or(PersistenceError::NotFound)?;
        Ok(Company::try_from(&row)?)
    }

    async fn delete_company(&self, id: i32) -> Result<(), PersistenceError> {
        delete_by_id(&self.pool, "company", id).await
    }
}
