pub mod controller;
pub mod database;

pub mod router {
    use std::sync::Arc;

    use salvo::{logging::Logger, Router};
    use sqlx::PgPool;

    use super::{
        controller::*,
        database::{
            memory::MemoryStore,
            repository::{PgCompanyRepository, PgEconomicGroupRepository, PgUserRepository},
        },
    };

    impl Repositories {
        pub fn postgres(pool: &PgPool) -> Self {
            Self {
                users: Arc::new(PgUserRepository::new(pool.clone())),
                groups: Arc::new(PgEconomicGroupRepository::new(pool.clone())),
                companies: Arc::new(PgCompanyRepository::new(pool.clone())),
            }
        }

        pub fn memory() -> Self {
            let store = Arc::new(MemoryStore::new());
            Self {
                users: store.clone(),
                groups: store.clone(),
                companies: store,
            }
        }
    }

    fn user_routes(path: &str, repos: &Repositories) -> Router {
        Router::with_path(path)
            .get(ListUsersController::new(repos))
            .post(CreateUserController::new(repos))
            .push(
                Router::with_path("<id>")
                    .get(FindUserController::new(repos))
                    .patch(UpdateUserController::new(repos))
                    .delete(RemoveUserController::new(repos)),
            )
    }

    pub fn app(repos: &Repositories) -> Router {
        Router::new()
            .push(Router::with_path("health").get(HealthController))
            .push(user_routes("users", repos))
            .push(user_routes("user", repos))
            .push(
                Router::with_path("economic-groups")
                    .get(ListEconomicGroupsController::new(repos))
                    .post(CreateEconomicGroupController::new(repos))
                    .push(
                        Router::with_path("<id>")
                            .get(FindEconomicGroupController::new(repos))
                            .patch(UpdateEconomicGroupController::new(repos))
                            .delete(RemoveEconomicGroupController::new(repos)),
                    ),
            )
            .push(
                Router::with_path("companies")
                    .get(ListCompaniesController::new(repos))
                    .post(CreateCompanyController::new(repos))
                    .push(
                        Router::with_path("<id>")
                            .get(FindCompanyController::new(repos))
                            .patch(UpdateCompanyController::new(repos))
                            .delete(RemoveCompanyController::new(repos)),
                    ),
            )
            .hoop(Logger)
    }
}
