use std::str::FromStr;

use serde::Serialize;

use crate::{
    base::{resource_id, ResourceID},
    error::resource::{ValidationErrorKind, ValidationFieldError},
};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum SortOrder {
    #[default]
    Asc,
    Desc,
}

impl SortOrder {
    pub fn as_sql(&self) -> &'static str {
        match self {
            SortOrder::Asc => "ASC",
            SortOrder::Desc => "DESC",
        }
    }
}

resource_id!(SortOrder, "base::sort_order");

impl FromStr for SortOrder {
    type Err = ValidationFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "asc" => Ok(Self::Asc),
            "desc" => Ok(Self::Desc),
            _ => Err(ValidationFieldError::from_resource::<Self>(
                s.into(),
                "/order".into(),
                vec![ValidationErrorKind::UnknownVariant],
            )),
        }
    }
}

/// Window and direction of a list query. Records are ordered by id unless
/// the resource offers another sort field.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListParams {
    pub skip: u32,
    pub take: Option<u32>,
    pub order: SortOrder,
}

resource_id!(ListParams, "base::list_params");

impl ListParams {
    pub const MAX_TAKE: u32 = 100;

    /// Parses the `skip`, `take` and `order` query values.
    pub fn parse(
        skip: Option<&str>,
        take: Option<&str>,
        order: Option<&str>,
    ) -> Result<Self, Vec<ValidationFieldError>> {
        let mut errors = Vec::new();
        let mut params = Self::default();

        if let Some(skip) = skip {
            match skip.parse::<u32>() {
                Ok(skip) => params.skip = skip,
                Err(_) => errors.push(ValidationFieldError::from_resource::<u32>(
                    skip.into(),
                    "/skip".into(),
                    vec![ValidationErrorKind::InvalidType],
                )),
            }
        }

        if let Some(take) = take {
            match take.parse::<u32>() {
                Ok(0) => errors.push(ValidationFieldError::from_resource::<u32>(
                    take.into(),
                    "/take".into(),
                    vec![ValidationErrorKind::Minimum(1)],
                )),
                Ok(n) if n > Self::MAX_TAKE => {
                    errors.push(ValidationFieldError::from_resource::<u32>(
                        take.into(),
                        "/take".into(),
                        vec![ValidationErrorKind::Maximum(Self::MAX_TAKE as i64)],
                    ))
                }
                Ok(n) => params.take = Some(n),
                Err(_) => errors.push(ValidationFieldError::from_resource::<u32>(
                    take.into(),
                    "/take".into(),
                    vec![ValidationErrorKind::InvalidType],
                )),
            }
        }

        if let Some(order) = order {
            match order.parse() {
                Ok(order) => params.order = order,
                Err(err) => errors.push(err),
            }
        }

        if errors.is_empty() {
            Ok(params)
        } else {
            Err(errors)
        }
    }

    /// Applies the window to records already sorted in the requested order.
    pub fn paginate<T>(&self, items: impl IntoIterator<Item = T>) -> Vec<T> {
        let items = items.into_iter().skip(self.skip as usize);
        match self.take {
            Some(take) => items.take(take as usize).collect(),
            None => items.collect(),
        }
    }
}

resource_id!(u32, "base::u32");

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum UserSortField {
    #[default]
    Id,
    Email,
    Name,
}

impl UserSortField {
    pub fn column(&self) -> &'static str {
        match self {
            UserSortField::Id => "u.id",
            UserSortField::Email => "u.email",
            UserSortField::Name => "u.name",
        }
    }
}

impl ResourceID for UserSortField {
    fn resource_id() -> &'static str {
        "user::sort_field"
    }
}

impl FromStr for UserSortField {
    type Err = ValidationFieldError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "id" => Ok(Self::Id),
            "email" => Ok(Self::Email),
            "name" => Ok(Self::Name),
            _ => Err(ValidationFieldError::from_resource::<Self>(
                s.into(),
                "/orderBy".into(),
                vec![ValidationErrorKind::UnknownVariant],
            )),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListUsers {
    pub params: ListParams,
    pub order_by: UserSortField,
}

resource_id!(ListUsers, "user::ListUsers");
