use std::sync::Arc;

use async_trait::async_trait;
use salvo::{http::StatusCode, writer::Json, Depot, FlowCtrl, Handler, Request, Response};
use serde::Serialize;

use crate::{
    app::{
        resource::{
            registry::{CreateCompany, CreateEconomicGroup, UpdateCompany, UpdateEconomicGroup},
            user::{CreateUser, UpdateUser},
        },
        use_case,
    },
    domain::{
        datatype::list::{ListParams, ListUsers, UserSortField},
        repository::{CompanyRepository, EconomicGroupRepository, UserRepository},
    },
    error::{
        app::ApplicationError,
        http::BadRequest,
        resource::{ValidationError, ValidationErrorKind, ValidationFieldError},
    },
};

macro_rules! map_res_err {
    ($result:ident, $response:ident) => {
        match $result {
            Err(err) => {
                $response.render(err);
                return;
            }
            Ok(ok) => ok,
        }
    };
}

/// Storage ports shared by every handler.
#[derive(Clone)]
pub struct Repositories {
    pub users: Arc<dyn UserRepository>,
    pub groups: Arc<dyn EconomicGroupRepository>,
    pub companies: Arc<dyn CompanyRepository>,
}

/// Parses the `id` route param, rejecting anything that is not an integer.
fn extract_id(req: &Request) -> Result<i32, ApplicationError<String>> {
    let raw = req.params().get("id").cloned().unwrap_or_default();
    raw.parse().map_err(|_| {
        let field = ValidationFieldError::from_resource::<i32>(
            raw.clone(),
            "/id".into(),
            vec![ValidationErrorKind::InvalidType],
        );
        ValidationError::from_resource(raw, vec![field]).into()
    })
}

fn query_value<'req>(req: &'req Request, key: &str) -> Option<&'req str> {
    req.queries().get(key).map(String::as_str)
}

fn invalid_query(req: &Request, fields: Vec<ValidationFieldError>) -> ApplicationError<String> {
    let query = req.uri().query().unwrap_or_default().to_string();
    ValidationError::from_resource(query, fields).into()
}

fn list_params(req: &Request) -> Result<ListParams, ApplicationError<String>> {
    ListParams::parse(
        query_value(req, "skip"),
        query_value(req, "take"),
        query_value(req, "order"),
    )
    .map_err(|fields| invalid_query(req, fields))
}

fn list_users_query(req: &Request) -> Result<ListUsers, ApplicationError<String>> {
    let mut errors = Vec::new();
    let params = ListParams::parse(
        query_value(req, "skip"),
        query_value(req, "take"),
        query_value(req, "order"),
    )
    .unwrap_or_else(|fields| {
        errors.extend(fields);
        ListParams::default()
    });

    let order_by = match query_value(req, "orderBy").map(str::parse::<UserSortField>) {
        Some(Ok(field)) => field,
        Some(Err(err)) => {
            errors.push(err);
            UserSortField::default()
        }
        None => UserSortField::default(),
    };

    if !errors.is_empty() {
        return Err(invalid_query(req, errors));
    }
    Ok(ListUsers { params, order_by })
}

fn render_created<T: Serialize + Send>(res: &mut Response, body: T) {
    res.render(Json(body));
    res.set_status_code(StatusCode::CREATED);
}

fn render_ok<T: Serialize + Send>(res: &mut Response, body: T) {
    res.render(Json(body));
    res.set_status_code(StatusCode::OK);
}

pub struct CreateUserController {
    users: Arc<dyn UserRepository>,
}

impl CreateUserController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
        }
    }
}

#[async_trait]
impl Handler for CreateUserController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result: Result<CreateUser, _> = req.parse_body().await.map_err(BadRequest::from);
        let dto = map_res_err!(result, res);

        let result = use_case::user::create_user(self.users.as_ref(), dto).await;
        let user = map_res_err!(result, res);

        render_created(res, user);
    }
}

pub struct ListUsersController {
    users: Arc<dyn UserRepository>,
}

impl ListUsersController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
        }
    }
}

#[async_trait]
impl Handler for ListUsersController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = list_users_query(req);
        let query = map_res_err!(result, res);

        let result = use_case::user::list_users(self.users.as_ref(), query).await;
        let users = map_res_err!(result, res);

        render_ok(res, users);
    }
}

pub struct FindUserController {
    users: Arc<dyn UserRepository>,
}

impl FindUserController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
        }
    }
}

#[async_trait]
impl Handler for FindUserController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req);
        let id = map_res_err!(result, res);

        let result = use_case::user::find_user(self.users.as_ref(), id).await;
        let user = map_res_err!(result, res);

        render_ok(res, user);
    }
}

pub struct UpdateUserController {
    users: Arc<dyn UserRepository>,
}

impl UpdateUserController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
        }
    }
}

#[async_trait]
impl Handler for UpdateUserController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req);
        let id = map_res_err!(result, res);

        let result: Result<UpdateUser, _> = req.parse_body().await.map_err(BadRequest::from);
        let dto = map_res_err!(result, res);

        let result = use_case::user::update_user(self.users.as_ref(), id, dto).await;
        let user = map_res_err!(result, res);

        render_ok(res, user);
    }
}

pub struct RemoveUserController {
    users: Arc<dyn UserRepository>,
}

impl RemoveUserController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            users: repos.users.clone(),
        }
    }
}

#[async_trait]
impl Handler for RemoveUserController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req);
        let id = map_res_err!(result, res);

        let result = use_case::user::remove_user(self.users.as_ref(), id).await;
        let removed = map_res_err!(result, res);

        render_ok(res, removed);
    }
}

pub struct CreateEconomicGroupController {
    groups: Arc<dyn EconomicGroupRepository>,
}

impl CreateEconomicGroupController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            groups: repos.groups.clone(),
        }
    }
}

#[async_trait]
impl Handler for CreateEconomicGroupController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result: Result<CreateEconomicGroup, _> =
            req.parse_body().await.map_err(BadRequest::from);
        let dto = map_res_err!(result, res);

        let result = use_case::economic_group::create_economic_group(self.groups.as_ref(), dto).await;
        let group = map_res_err!(result, res);

        render_created(res, group);
    }
}

pub struct ListEconomicGroupsController {
    groups: Arc<dyn EconomicGroupRepository>,
}

impl ListEconomicGroupsController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            groups: repos.groups.clone(),
        }
    }
}

#[async_trait]
impl Handler for ListEconomicGroupsController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = list_params(req);
        let params = map_res_err!(result, res);

        let result = use_case::economic_group::list_economic_groups(self.groups.as_ref(), params).await;
        let groups = map_res_err!(result, res);

        render_ok(res, groups);
    }
}

pub struct FindEconomicGroupController {
    groups: Arc<dyn EconomicGroupRepository>,
}

impl FindEconomicGroupController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            groups: repos.groups.clone(),
        }
    }
}

#[async_trait]
impl Handler for FindEconomicGroupController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req);
        let id = map_res_err!(result, res);

        let result = use_case::economic_group::find_economic_group(self.groups.as_ref(), id).await;
        let group = map_res_err!(result, res);

        render_ok(res, group);
    }
}

pub struct UpdateEconomicGroupController {
    groups: Arc<dyn EconomicGroupRepository>,
}

impl UpdateEconomicGroupController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            groups: repos.groups.clone(),
        }
    }
}

#[async_trait]
impl Handler for UpdateEconomicGroupController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req);
        let id = map_res_err!(result, res);

        let result: Result<UpdateEconomicGroup, _> =
            req.parse_body().await.map_err(BadRequest::from);
        let dto = map_res_err!(result, res);

        let result =
            use_case::economic_group::update_economic_group(self.groups.as_ref(), id, dto).await;
        let group = map_res_err!(result, res);

        render_ok(res, group);
    }
}

pub struct RemoveEconomicGroupController {
    groups: Arc<dyn EconomicGroupRepository>,
}

impl RemoveEconomicGroupController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            groups: repos.groups.clone(),
        }
    }
}

#[async_trait]
impl Handler for RemoveEconomicGroupController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req);
        let id = map_res_err!(result, res);

        let result = use_case::economic_group::remove_economic_group(self.groups.as_ref(), id).await;
        let removed = map_res_err!(result, res);

        render_ok(res, removed);
    }
}

pub struct CreateCompanyController {
    companies: Arc<dyn CompanyRepository>,
    groups: Arc<dyn EconomicGroupRepository>,
}

impl CreateCompanyController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            companies: repos.companies.clone(),
            groups: repos.groups.clone(),
        }
    }
}

#[async_trait]
impl Handler for CreateCompanyController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result: Result<CreateCompany, _> = req.parse_body().await.map_err(BadRequest::from);
        let dto = map_res_err!(result, res);

        let result =
            use_case::company::create_company(self.companies.as_ref(), self.groups.as_ref(), dto)
                .await;
        let company = map_res_err!(result, res);

        render_created(res, company);
    }
}

pub struct ListCompaniesController {
    companies: Arc<dyn CompanyRepository>,
}

impl ListCompaniesController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            companies: repos.companies.clone(),
        }
    }
}

#[async_trait]
impl Handler for ListCompaniesController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = list_params(req);
        let params = map_res_err!(result, res);

        let result = use_case::company::list_companies(self.companies.as_ref(), params).await;
        let companies = map_res_err!(result, res);

        render_ok(res, companies);
    }
}

pub struct FindCompanyController {
    companies: Arc<dyn CompanyRepository>,
    groups: Arc<dyn EconomicGroupRepository>,
}

impl FindCompanyController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            companies: repos.companies.clone(),
            groups: repos.groups.clone(),
        }
    }
}

#[async_trait]
impl Handler for FindCompanyController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req);
        let id = map_res_err!(result, res);

        let result =
            use_case::company::find_company(self.companies.as_ref(), self.groups.as_ref(), id)
                .await;
        let company = map_res_err!(result, res);

        render_ok(res, company);
    }
}

pub struct UpdateCompanyController {
    companies: Arc<dyn CompanyRepository>,
    groups: Arc<dyn EconomicGroupRepository>,
}

impl UpdateCompanyController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            companies: repos.companies.clone(),
            groups: repos.groups.clone(),
        }
    }
}

#[async_trait]
impl Handler for UpdateCompanyController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req);
        let id = map_res_err!(result, res);

        let result: Result<UpdateCompany, _> = req.parse_body().await.map_err(BadRequest::from);
        let dto = map_res_err!(result, res);

        let result = use_case::company::update_company(
            self.companies.as_ref(),
            self.groups.as_ref(),
            id,
            dto,
        )
        .await;
        let company = map_res_err!(result, res);

        render_ok(res, company);
    }
}

pub struct RemoveCompanyController {
    companies: Arc<dyn CompanyRepository>,
}

impl RemoveCompanyController {
    pub fn new(repos: &Repositories) -> Self {
        Self {
            companies: repos.companies.clone(),
        }
    }
}

#[async_trait]
impl Handler for RemoveCompanyController {
    async fn handle(&self, req: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        let result = extract_id(req);
        let id = map_res_err!(result, res);

        let result = use_case::company::remove_company(self.companies.as_ref(), id).await;
        let removed = map_res_err!(result, res);

        render_ok(res, removed);
    }
}

#[derive(Debug, Serialize)]
struct HealthResponse {
    status: &'static str,
}

pub struct HealthController;

#[async_trait]
impl Handler for HealthController {
    async fn handle(&self, _: &mut Request, _: &mut Depot, res: &mut Response, _: &mut FlowCtrl) {
        render_ok(res, HealthResponse { status: "ok" });
    }
}
