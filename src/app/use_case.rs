use crate::{
    base::ResourceID,
    error::{
        app::ApplicationError,
        persistence::PersistenceError,
        resource::{ConflictError, ValidationError, ValidationFieldError},
    },
};

/// Storage errors on writes: a unique violation means another request stored
/// the same key after validation ran.
fn write_error<R: ResourceID>(err: PersistenceError, resource: R) -> ApplicationError<R> {
    match err.unique_violation() {
        Some(constraint) => {
            let constraint = Some(constraint.to_string());
            ConflictError::from_resource(resource, constraint).into()
        }
        None => err.into(),
    }
}

fn validated<R: ResourceID>(
    resource: &R,
    errors: Vec<ValidationFieldError>,
) -> Result<(), ApplicationError<R>>
where
    R: Clone,
{
    if errors.is_empty() {
        return Ok(());
    }

    Err(ValidationError::from_resource(resource.clone(), errors).into())
}

pub mod user {
    use crate::{
        app::{
            resource::{
                user::{CreateUser, UpdateUser, UserResponse},
                RemovedResponse,
            },
            transform::{ResourceMapper, UserMapper},
        },
        domain::{
            datatype::{email::Email, list::ListUsers, require_text},
            entity::{user::User, Entity},
            repository::UserRepository,
        },
        error::{app::ApplicationError, resource::NotFoundError},
    };

    use super::{validated, write_error};

    mod validation {
        use super::*;
        use crate::error::{
            persistence::PersistenceError,
            resource::{ValidationErrorKind, ValidationFieldError},
        };

        async fn email<R: UserRepository + ?Sized>(
            repo: &R,
            value: &str,
            owner: Option<i32>,
            errors: &mut Vec<ValidationFieldError>,
        ) -> Result<(), PersistenceError> {
            let email: Email = match value.parse() {
                Ok(email) => email,
                Err(err) => {
                    errors.push(ValidationFieldError::at(err, "/email"));
                    return Ok(());
                }
            };

            let stored = repo.find_user_by_email(email.as_str()).await?;
            if stored.filter(|user| Some(user.ident()) != owner).is_some() {
                errors.push(ValidationFieldError::new(
                    "base::email",
                    email.into(),
                    "/email".into(),
                    vec![ValidationErrorKind::AlreadyExists],
                ));
            }

            Ok(())
        }

        pub async fn create_user<R: UserRepository + ?Sized>(
            repo: &R,
            dto: &CreateUser,
        ) -> Result<(), ApplicationError<CreateUser>> {
            let mut errors = Vec::new();

            email(repo, &dto.email, None, &mut errors).await?;

            errors.extend(require_text(&dto.name, "base::name", "/name"));
            if let Some(profile) = &dto.profile {
                errors.extend(require_text(&profile.bio, "base::bio", "/profile/bio"));
            }

            validated(dto, errors)
        }

        pub async fn update_user<R: UserRepository + ?Sized>(
            repo: &R,
            stored: &User,
            merged: &User,
            dto: &UpdateUser,
        ) -> Result<(), ApplicationError<UpdateUser>> {
            let mut errors = Vec::new();

            if dto.email.is_some() && merged.email() != stored.email() {
                email(repo, merged.email(), Some(stored.ident()), &mut errors).await?;
            }

            if let Some(name) = &dto.name {
                errors.extend(require_text(name, "base::name", "/name"));
            }
            if let Some(bio) = dto.profile.as_ref().and_then(|profile| profile.bio.as_ref()) {
                errors.extend(require_text(bio, "base::bio", "/profile/bio"));
            }

            validated(dto, errors)
        }
    }

    pub async fn create_user<R: UserRepository + ?Sized>(
        repo: &R,
        dto: CreateUser,
    ) -> Result<UserResponse, ApplicationError<CreateUser>> {
        validation::create_user(repo, &dto).await?;

        let user = UserMapper::to_entity(dto.clone());
        let user = repo
            .insert_user(UserMapper::to_persistence_create(user))
            .await
            .map_err(|err| write_error(err, dto))?;

        tracing::info!(user_id = user.ident(), "user created");
        Ok(UserMapper::to_response(user))
    }

    pub async fn list_users<R: UserRepository + ?Sized>(
        repo: &R,
        query: ListUsers,
    ) -> Result<Vec<UserResponse>, ApplicationError<ListUsers>> {
        let users = repo.list_users(&query).await?;
        tracing::debug!(count = users.len(), "users listed");
        Ok(users.into_iter().map(UserMapper::to_response).collect())
    }

    pub async fn find_user<R: UserRepository + ?Sized>(
        repo: &R,
        id: i32,
    ) -> Result<UserResponse, ApplicationError<()>> {
        let user = repo
            .find_user(id)
            .await?
            .ok_or_else(|| NotFoundError::of::<User>(id))?;
        tracing::debug!(user_id = id, "user found");
        Ok(UserMapper::to_response(user))
    }

    pub async fn update_user<R: UserRepository + ?Sized>(
        repo: &R,
        id: i32,
        dto: UpdateUser,
    ) -> Result<UserResponse, ApplicationError<UpdateUser>> {
        let stored = repo
            .find_user(id)
            .await?
            .ok_or_else(|| NotFoundError::of::<User>(id))?;
        let merged = UserMapper::to_entity_update(stored.clone(), &dto);
        validation::update_user(repo, &stored, &merged, &dto).await?;

        let changes = UserMapper::to_persistence_update(dto.clone());
        if changes.is_empty() {
            return Ok(UserMapper::to_response(stored));
        }

        let user = repo
            .update_user(id, changes)
            .await
            .map_err(|err| write_error(err, dto))?;

        tracing::info!(user_id = id, "user updated");
        Ok(UserMapper::to_response(user))
    }

    pub async fn remove_user<R: UserRepository + ?Sized>(
        repo: &R,
        id: i32,
    ) -> Result<RemovedResponse, ApplicationError<()>> {
        repo.find_user(id)
            .await?
            .ok_or_else(|| NotFoundError::of::<User>(id))?;
        repo.delete_user(id).await?;

        tracing::info!(user_id = id, "user removed");
        Ok(RemovedResponse::new("User"))
    }
}

pub mod economic_group {
    use crate::{
        app::{
            resource::{
                registry::{CreateEconomicGroup, EconomicGroupResponse, UpdateEconomicGroup},
                RemovedResponse,
            },
            transform::{CompanyMapper, EconomicGroupMapper, ResourceMapper},
        },
        base::ResourceID,
        domain::{
            datatype::{list::ListParams, require_text},
            entity::{registry::EconomicGroup, Entity},
            repository::EconomicGroupRepository,
        },
        error::{
            app::ApplicationError,
            persistence::PersistenceError,
            resource::{ConflictError, NotFoundError, ValidationErrorKind, ValidationFieldError},
        },
    };

    use super::{validated, write_error};

    async fn unique_cnpj<G: EconomicGroupRepository + ?Sized>(
        groups: &G,
        cnpj: &str,
        owner: Option<i32>,
    ) -> Result<Option<ValidationFieldError>, PersistenceError> {
        let stored = groups.find_economic_group_by_cnpj(cnpj).await?;
        if stored.filter(|group| Some(group.ident()) != owner).is_none() {
            return Ok(None);
        }

        Ok(Some(ValidationFieldError::new(
            "base::cnpj",
            cnpj.into(),
            "/cnpj".into(),
            vec![ValidationErrorKind::AlreadyExists],
        )))
    }

    pub async fn create_economic_group<G: EconomicGroupRepository + ?Sized>(
        groups: &G,
        dto: CreateEconomicGroup,
    ) -> Result<EconomicGroupResponse, ApplicationError<CreateEconomicGroup>> {
        let mut errors = Vec::new();
        match require_text(&dto.cnpj, "base::cnpj", "/cnpj") {
            Some(err) => errors.push(err),
            None => errors.extend(unique_cnpj(groups, &dto.cnpj, None).await?),
        }
        errors.extend(require_text(&dto.name, "base::name", "/name"));
        errors.extend(require_text(
            &dto.is_unified_boleto,
            "base::string",
            "/isUnifiedBoleto",
        ));
        validated(&dto, errors)?;

        let group = EconomicGroupMapper::to_entity(dto.clone());
        let group = groups
            .insert_economic_group(EconomicGroupMapper::to_persistence_create(group))
            .await
            .map_err(|err| write_error(err, dto))?;

        tracing::info!(economic_group_id = group.ident(), "economic group created");
        Ok(EconomicGroupMapper::to_response(group))
    }

    pub async fn list_economic_groups<G: EconomicGroupRepository + ?Sized>(
        groups: &G,
        params: ListParams,
    ) -> Result<Vec<EconomicGroupResponse>, ApplicationError<ListParams>> {
        let stored = groups.list_economic_groups(&params).await?;
        tracing::debug!(count = stored.len(), "economic groups listed");
        Ok(stored
            .into_iter()
            .map(EconomicGroupMapper::to_response)
            .collect())
    }

    /// The group with the companies it owns.
    pub async fn find_economic_group<G: EconomicGroupRepository + ?Sized>(
        groups: &G,
        id: i32,
    ) -> Result<EconomicGroupResponse, ApplicationError<()>> {
        let group = groups
            .find_economic_group(id)
            .await?
            .ok_or_else(|| NotFoundError::of::<EconomicGroup>(id))?;
        let companies = groups.list_group_companies(id).await?;
        tracing::debug!(
            economic_group_id = id,
            companies = companies.len(),
            "economic group found"
        );

        let mut response = EconomicGroupMapper::to_response(group);
        response.companies = Some(
            companies
                .into_iter()
                .map(CompanyMapper::to_response)
                .collect(),
        );
        Ok(response)
    }

    pub async fn update_economic_group<G: EconomicGroupRepository + ?Sized>(
        groups: &G,
        id: i32,
        dto: UpdateEconomicGroup,
    ) -> Result<EconomicGroupResponse, ApplicationError<UpdateEconomicGroup>> {
        let stored = groups
            .find_economic_group(id)
            .await?
            .ok_or_else(|| NotFoundError::of::<EconomicGroup>(id))?;
        let merged = EconomicGroupMapper::to_entity_update(stored.clone(), &dto);

        let mut errors = Vec::new();
        if let Some(cnpj) = &dto.cnpj {
            match require_text(cnpj, "base::cnpj", "/cnpj") {
                Some(err) => errors.push(err),
                None if merged.cnpj() != stored.cnpj() => {
                    errors.extend(unique_cnpj(groups, cnpj, Some(id)).await?)
                }
                None => (),
            }
        }
        if let Some(name) = &dto.name {
            errors.extend(require_text(name, "base::name", "/name"));
        }
        if let Some(is_unified_boleto) = &dto.is_unified_boleto {
            errors.extend(require_text(
                is_unified_boleto,
                "base::string",
                "/isUnifiedBoleto",
            ));
        }
        validated(&dto, errors)?;

        let group = groups
            .update_economic_group(id, EconomicGroupMapper::to_persistence_update(dto.clone()))
            .await
            .map_err(|err| write_error(err, dto))?;

        tracing::info!(economic_group_id = id, "economic group updated");
        Ok(EconomicGroupMapper::to_response(group))
    }

    /// Fails with a conflict while companies still reference the group
    /// through their required `economicGroupId`.
    pub async fn remove_economic_group<G: EconomicGroupRepository + ?Sized>(
        groups: &G,
        id: i32,
    ) -> Result<RemovedResponse, ApplicationError<()>> {
        groups
            .find_economic_group(id)
            .await?
            .ok_or_else(|| NotFoundError::of::<EconomicGroup>(id))?;

        if let Err(err) = groups.delete_economic_group(id).await {
            if err.is_foreign_key_violation() {
                return Err(ConflictError {
                    resource: (),
                    resource_type: EconomicGroup::resource_id(),
                    constraint: err.constraint().map(String::from),
                }
                .into());
            }
            return Err(err.into());
        }

        tracing::info!(economic_group_id = id, "economic group removed");
        Ok(RemovedResponse::new("Economic group"))
    }
}

pub mod company {
    use crate::{
        app::{
            resource::{
                registry::{CompanyResponse, CreateCompany, UpdateCompany},
                RemovedResponse,
            },
            transform::{CompanyMapper, EconomicGroupMapper, ResourceMapper},
        },
        domain::{
            datatype::{list::ListParams, require_non_negative, require_text},
            entity::{registry::Company, Entity},
            repository::{CompanyRepository, EconomicGroupRepository},
        },
        error::{
            app::ApplicationError,
            persistence::PersistenceError,
            resource::{NotFoundError, ValidationErrorKind, ValidationFieldError},
        },
    };

    use super::{validated, write_error};

    async fn unique_cnpj<C: CompanyRepository + ?Sized>(
        companies: &C,
        cnpj: &str,
        owner: Option<i32>,
    ) -> Result<Option<ValidationFieldError>, PersistenceError> {
        let stored = companies.find_company_by_cnpj(cnpj).await?;
        if stored.filter(|company| Some(company.ident()) != owner).is_none() {
            return Ok(None);
        }

        Ok(Some(ValidationFieldError::new(
            "base::cnpj",
            cnpj.into(),
            "/cnpj".into(),
            vec![ValidationErrorKind::AlreadyExists],
        )))
    }

    async fn existing_group<G: EconomicGroupRepository + ?Sized>(
        groups: &G,
        id: i32,
        path: &str,
    ) -> Result<Option<ValidationFieldError>, PersistenceError> {
        if groups.find_economic_group(id).await?.is_some() {
            return Ok(None);
        }

        Ok(Some(ValidationFieldError::new(
            "base::i32",
            id.to_string(),
            path.into(),
            vec![ValidationErrorKind::NotFound],
        )))
    }

    pub async fn create_company<C, G>(
        companies: &C,
        groups: &G,
        dto: CreateCompany,
    ) -> Result<CompanyResponse, ApplicationError<CreateCompany>>
    where
        C: CompanyRepository + ?Sized,
        G: EconomicGroupRepository + ?Sized,
    {
        let mut errors = Vec::new();
        errors.extend(require_text(&dto.trade_name, "base::name", "/tradeName"));
        match require_text(&dto.cnpj, "base::cnpj", "/cnpj") {
            Some(err) => errors.push(err),
            None => errors.extend(unique_cnpj(companies, &dto.cnpj, None).await?),
        }
        errors.extend(require_text(
            &dto.company_status,
            "base::string",
            "/companyStatus",
        ));
        if let Some(employees) = dto.number_of_employees {
            errors.extend(require_non_negative(
                employees,
                "base::i32",
                "/numberOfEmployees",
            ));
        }
        errors.extend(existing_group(groups, dto.economic_group_id, "/economicGroupId").await?);
        if let Some(group_id) = dto.economic_group_db_id {
            errors.extend(existing_group(groups, group_id, "/economicGroupDBId").await?);
        }
        validated(&dto, errors)?;

        let company = CompanyMapper::to_entity(dto.clone());
        let company = companies
            .insert_company(CompanyMapper::to_persistence_create(company))
            .await
            .map_err(|err| write_error(err, dto))?;

        tracing::info!(company_id = company.ident(), "company created");
        Ok(CompanyMapper::to_response(company))
    }

    pub async fn list_companies<C: CompanyRepository + ?Sized>(
        companies: &C,
        params: ListParams,
    ) -> Result<Vec<CompanyResponse>, ApplicationError<ListParams>> {
        let stored = companies.list_companies(&params).await?;
        tracing::debug!(count = stored.len(), "companies listed");
        Ok(stored.into_iter().map(CompanyMapper::to_response).collect())
    }

    /// The company with the economic group owning it, if any.
    pub async fn find_company<C, G>(
        companies: &C,
        groups: &G,
        id: i32,
    ) -> Result<CompanyResponse, ApplicationError<()>>
    where
        C: CompanyRepository + ?Sized,
        G: EconomicGroupRepository + ?Sized,
    {
        let company = companies
            .find_company(id)
            .await?
            .ok_or_else(|| NotFoundError::of::<Company>(id))?;
        let group = match company.economic_group_db_id() {
            Some(group_id) => groups.find_economic_group(*group_id).await?,
            None => None,
        };

        tracing::debug!(company_id = id, "company found");
        let mut response = CompanyMapper::to_response(company);
        response.economic_group_db =
            group.map(|group| Box::new(EconomicGroupMapper::to_response(group)));
        Ok(response)
    }

    pub async fn update_company<C, G>(
        companies: &C,
        groups: &G,
        id: i32,
        dto: UpdateCompany,
    ) -> Result<CompanyResponse, ApplicationError<UpdateCompany>>
    where
        C: CompanyRepository + ?Sized,
        G: EconomicGroupRepository + ?Sized,
    {
        let stored = companies
            .find_company(id)
            .await?
            .ok_or_else(|| NotFoundError::of::<Company>(id))?;
        let merged = CompanyMapper::to_entity_update(stored.clone(), &dto);

        let mut errors = Vec::new();
        if let Some(trade_name) = &dto.trade_name {
            errors.extend(require_text(trade_name, "base::name", "/tradeName"));
        }
        if let Some(cnpj) = &dto.cnpj {
            match require_text(cnpj, "base::cnpj", "/cnpj") {
                Some(err) => errors.push(err),
                None if merged.cnpj() != stored.cnpj() => {
                    errors.extend(unique_cnpj(companies, cnpj, Some(id)).await?)
                }
                None => (),
            }
        }
        if let Some(company_status) = &dto.company_status {
            errors.extend(require_text(
                company_status,
                "base::string",
                "/companyStatus",
            ));
        }
        if let Some(Some(employees)) = dto.number_of_employees {
            errors.extend(require_non_negative(
                employees,
                "base::i32",
                "/numberOfEmployees",
            ));
        }
        if let Some(group_id) = dto.economic_group_id {
            errors.extend(existing_group(groups, group_id, "/economicGroupId").await?);
        }
        if let Some(Some(group_id)) = dto.economic_group_db_id {
            errors.extend(existing_group(groups, group_id, "/economicGroupDBId").await?);
        }
        validated(&dto, errors)?;

        let company = companies
            .update_company(id, CompanyMapper::to_persistence_update(dto.clone()))
            .await
            .map_err(|err| write_error(err, dto))?;

        tracing::info!(company_id = id, "company updated");
        Ok(CompanyMapper::to_response(company))
    }

    pub async fn remove_company<C: CompanyRepository + ?Sized>(
        companies: &C,
        id: i32,
    ) -> Result<RemovedResponse, ApplicationError<()>> {
        companies
            .find_company(id)
            .await?
            .ok_or_else(|| NotFoundError::of::<Company>(id))?;
        companies.delete_company(id).await?;

        tracing::info!(company_id = id, "company removed");
        Ok(RemovedResponse::new("Company"))
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::{
        app::resource::{
            registry::{CreateCompany, CreateEconomicGroup, UpdateCompany},
            user::{CreateProfile, CreateUser, UpdateProfile, UpdateUser},
        },
        domain::datatype::list::ListUsers,
        error::resource::ValidationErrorKind,
        infra::database::memory::MemoryStore,
    };

    fn create_user_dto(email: &str) -> CreateUser {
        CreateUser {
            email: email.into(),
            name: "Test User".into(),
            profile: Some(CreateProfile {
                bio: "Test bio".into(),
            }),
        }
    }

    fn create_group_dto(cnpj: &str) -> CreateEconomicGroup {
        CreateEconomicGroup {
            cnpj: cnpj.into(),
            name: "Group".into(),
            is_unified_boleto: "S".into(),
            fee_fix: Some(10),
        }
    }

    fn create_company_dto(cnpj: &str, group: i32) -> CreateCompany {
        CreateCompany {
            economic_group_id: group,
            trade_name: "Acme".into(),
            cnpj: cnpj.into(),
            start_validity: None,
            cutoff_date: Some(5),
            issuance_date: None,
            end_validity: None,
            company_status: "active".into(),
            name: None,
            number_of_employees: Some(3),
            classification: None,
            economic_group_db_id: Some(group),
        }
    }

    #[tokio::test]
    async fn creates_and_finds_user_with_profile() {
        let store = MemoryStore::new();
        let created = user::create_user(&store, create_user_dto("test@example.com"))
            .await
            .unwrap();
        assert_eq!(created.id, 1);
        assert_eq!(created.profile.as_ref().map(|p| p.bio.as_str()), Some("Test bio"));

        let found = user::find_user(&store, created.id).await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn rejects_invalid_and_duplicated_user_fields() {
        let store = MemoryStore::new();
        user::create_user(&store, create_user_dto("test@example.com"))
            .await
            .unwrap();

        let err = user::create_user(
            &store,
            CreateUser {
                name: "".into(),
                ..create_user_dto("test@example.com")
            },
        )
        .await
        .unwrap_err();

        match err {
            ApplicationError::Validation(err) => {
                let kinds: Vec<_> = err.fields.iter().map(|f| f.kinds.clone()).collect();
                assert_eq!(
                    kinds,
                    vec![
                        vec![ValidationErrorKind::AlreadyExists],
                        vec![ValidationErrorKind::Required],
                    ]
                );
            }
            other => panic!("expected validation error, got {other}"),
        }

        let err = user::create_user(&store, create_user_dto("not-an-email"))
            .await
            .unwrap_err();
        assert!(matches!(err, ApplicationError::Validation(_)));
    }

    #[tokio::test]
    async fn update_merges_profile_and_keeps_other_fields() {
        let store = MemoryStore::new();
        let created = user::create_user(&store, create_user_dto("test@example.com"))
            .await
            .unwrap();

        let updated = user::update_user(
            &store,
            created.id,
            UpdateUser {
                profile: Some(UpdateProfile {
                    bio: Some("After Patch".into()),
                }),
                ..Default::default()
            },
        )
        .await
        .unwrap();

        assert_eq!(updated.email, "test@example.com");
        assert_eq!(updated.name, "Test User");
        assert_eq!(
            updated.profile.map(|p| (p.id, p.bio)),
            Some((1, "After Patch".to_string()))
        );
    }

    #[tokio::test]
    async fn update_keeps_own_email() {
        let store = MemoryStore::new();
        let created = user::create_user(&store, create_user_dto("test@example.com"))
            .await
            .unwrap();

        let updated = user::update_user(
            &store,
            created.id,
            UpdateUser {
                email: Some("test@example.com".into()),
                name: Some("Renamed".into()),
                profile: None,
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.name, "Renamed");
    }

    #[tokio::test]
    async fn missing_user_is_not_found() {
        let store = MemoryStore::new();
        assert!(matches!(
            user::find_user(&store, 42).await,
            Err(ApplicationError::NotFound(_))
        ));
        assert!(matches!(
            user::update_user(&store, 42, UpdateUser::default()).await,
            Err(ApplicationError::NotFound(_))
        ));
        assert!(matches!(
            user::remove_user(&store, 42).await,
            Err(ApplicationError::NotFound(_))
        ));
    }

    #[tokio::test]
    async fn removed_user_disappears_from_list() {
        let store = MemoryStore::new();
        let first = user::create_user(&store, create_user_dto("a@example.com"))
            .await
            .unwrap();
        user::create_user(&store, create_user_dto("b@example.com"))
            .await
            .unwrap();

        let removed = user::remove_user(&store, first.id).await.unwrap();
        assert_eq!(removed.message, "User removed successfully");

        let users = user::list_users(&store, ListUsers::default()).await.unwrap();
        let emails: Vec<_> = users.into_iter().map(|u| u.email).collect();
        assert_eq!(emails, vec!["b@example.com".to_string()]);
    }

    #[tokio::test]
    async fn group_lists_owned_companies() {
        let store = MemoryStore::new();
        let group = economic_group::create_economic_group(&store, create_group_dto("111"))
            .await
            .unwrap();
        let company = company::create_company(&store, &store, create_company_dto("222", group.id))
            .await
            .unwrap();

        let found = economic_group::find_economic_group(&store, group.id)
            .await
            .unwrap();
        assert_eq!(found.companies, Some(vec![company.clone()]));

        let found = company::find_company(&store, &store, company.id).await.unwrap();
        assert_eq!(
            found.economic_group_db.map(|group| group.cnpj),
            Some("111".to_string())
        );
    }

    #[tokio::test]
    async fn company_requires_known_group() {
        let store = MemoryStore::new();
        let err = company::create_company(&store, &store, create_company_dto("222", 9))
            .await
            .unwrap_err();

        match err {
            ApplicationError::Validation(err) => {
                let paths: Vec<_> = err.fields.iter().map(|f| f.path.as_str()).collect();
                assert_eq!(paths, vec!["/economicGroupId", "/economicGroupDBId"]);
            }
            other => panic!("expected validation error, got {other}"),
        }
    }

    #[tokio::test]
    async fn referenced_group_removal_conflicts() {
        let store = MemoryStore::new();
        let group = economic_group::create_economic_group(&store, create_group_dto("111"))
            .await
            .unwrap();
        let company = company::create_company(&store, &store, create_company_dto("222", group.id))
            .await
            .unwrap();

        assert!(matches!(
            economic_group::remove_economic_group(&store, group.id).await,
            Err(ApplicationError::Conflict(_))
        ));

        company::remove_company(&store, company.id).await.unwrap();
        let removed = economic_group::remove_economic_group(&store, group.id)
            .await
            .unwrap();
        assert_eq!(removed.message, "Economic group removed successfully");
    }

    #[tokio::test]
    async fn company_update_clears_owner() {
        let store = MemoryStore::new();
        let group = economic_group::create_economic_group(&store, create_group_dto("111"))
            .await
            .unwrap();
        let company = company::create_company(&store, &store, create_company_dto("222", group.id))
            .await
            .unwrap();

        let updated = company::update_company(
            &store,
            &store,
            company.id,
            UpdateCompany {
                economic_group_db_id: Some(None),
                ..Default::default()
            },
        )
        .await
        .unwrap();
        assert_eq!(updated.economic_group_db_id, None);
        assert_eq!(updated.cutoff_date, Some(5));
    }

    #[test]
    fn unique_violation_on_write_is_a_conflict() {
        let err = PersistenceError::Database(
            Some("23505".into()),
            Some("user_email_key".into()),
        );
        match write_error(err, create_user_dto("race@example.com")) {
            ApplicationError::Conflict(conflict) => {
                assert_eq!(conflict.resource, create_user_dto("race@example.com"));
                assert_eq!(conflict.constraint, Some("user_email_key".to_string()));
            }
            other => panic!("expected a conflict, got {other:?}"),
        }

        let err = PersistenceError::Database(
            Some("23503".into()),
            Some("company_economic_group_id_fkey".into()),
        );
        assert!(matches!(
            write_error(err, create_user_dto("race@example.com")),
            ApplicationError::Persistence(PersistenceError::Database(..))
        ));
    }
}
