use serde::{Deserialize, Deserializer};

/// Distinguishes an absent field (`None`) from an explicit `null`
/// (`Some(None)`) in update payloads.
fn nullable<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize, Deserialize)]
pub struct RemovedResponse {
    pub message: String,
}

impl RemovedResponse {
    pub fn new(resource: &str) -> Self {
        Self {
            message: format!("{resource} removed successfully"),
        }
    }
}

pub mod user {
    use serde::{Deserialize, Serialize};

    use crate::base::resource_id;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct CreateProfile {
        pub bio: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct CreateUser {
        pub email: String,
        pub name: String,
        #[serde(default)]
        pub profile: Option<CreateProfile>,
    }

    resource_id!(CreateUser, "user::CreateUser");

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct UpdateProfile {
        #[serde(default)]
        pub bio: Option<String>,
    }

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(deny_unknown_fields)]
    pub struct UpdateUser {
        #[serde(default)]
        pub email: Option<String>,
        #[serde(default)]
        pub name: Option<String>,
        #[serde(default)]
        pub profile: Option<UpdateProfile>,
    }

    resource_id!(UpdateUser, "user::UpdateUser");

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct ProfileResponse {
        pub id: i32,
        pub bio: String,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    pub struct UserResponse {
        pub id: i32,
        pub email: String,
        pub name: String,
        pub profile: Option<ProfileResponse>,
    }
}

pub mod registry {
    use chrono::{DateTime, Utc};
    use serde::{Deserialize, Serialize};

    use super::nullable;
    use crate::base::resource_id;

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", deny_unknown_fields)]
    pub struct CreateEconomicGroup {
        pub cnpj: String,
        pub name: String,
        pub is_unified_boleto: String,
        #[serde(default)]
        pub fee_fix: Option<i32>,
    }

    resource_id!(CreateEconomicGroup, "registry::CreateEconomicGroup");

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", deny_unknown_fields)]
    pub struct UpdateEconomicGroup {
        #[serde(default)]
        pub cnpj: Option<String>,
        #[serde(default)]
        pub name: Option<String>,
        #[serde(default)]
        pub is_unified_boleto: Option<String>,
        #[serde(default, deserialize_with = "nullable")]
        pub fee_fix: Option<Option<i32>>,
    }

    resource_id!(UpdateEconomicGroup, "registry::UpdateEconomicGroup");

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct EconomicGroupResponse {
        pub id: i32,
        pub cnpj: String,
        pub name: String,
        pub is_unified_boleto: String,
        pub fee_fix: Option<i32>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        pub companies: Option<Vec<CompanyResponse>>,
    }

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", deny_unknown_fields)]
    pub struct CreateCompany {
        pub economic_group_id: i32,
        pub trade_name: String,
        pub cnpj: String,
        #[serde(default)]
        pub start_validity: Option<DateTime<Utc>>,
        #[serde(default)]
        pub cutoff_date: Option<i32>,
        #[serde(default)]
        pub issuance_date: Option<i32>,
        #[serde(default)]
        pub end_validity: Option<DateTime<Utc>>,
        pub company_status: String,
        #[serde(default)]
        pub name: Option<String>,
        #[serde(default)]
        pub number_of_employees: Option<i32>,
        #[serde(default)]
        pub classification: Option<String>,
        #[serde(default, rename = "economicGroupDBId")]
        pub economic_group_db_id: Option<i32>,
    }

    resource_id!(CreateCompany, "registry::CreateCompany");

    #[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase", deny_unknown_fields)]
    pub struct UpdateCompany {
        #[serde(default)]
        pub economic_group_id: Option<i32>,
        #[serde(default)]
        pub trade_name: Option<String>,
        #[serde(default)]
        pub cnpj: Option<String>,
        #[serde(default, deserialize_with = "nullable")]
        pub start_validity: Option<Option<DateTime<Utc>>>,
        #[serde(default, deserialize_with = "nullable")]
        pub cutoff_date: Option<Option<i32>>,
        #[serde(default, deserialize_with = "nullable")]
        pub issuance_date: Option<Option<i32>>,
        #[serde(default, deserialize_with = "nullable")]
        pub end_validity: Option<Option<DateTime<Utc>>>,
        #[serde(default)]
        pub company_status: Option<String>,
        #[serde(default, deserialize_with = "nullable")]
        pub name: Option<Option<String>>,
        #[serde(default, deserialize_with = "nullable")]
        pub number_of_employees: Option<Option<i32>>,
        #[serde(default, deserialize_with = "nullable")]
        pub classification: Option<Option<String>>,
        #[serde(default, rename = "economicGroupDBId", deserialize_with = "nullable")]
        pub economic_group_db_id: Option<Option<i32>>,
    }

    resource_id!(UpdateCompany, "registry::UpdateCompany");

    #[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    pub struct CompanyResponse {
        pub id: i32,
        pub economic_group_id: i32,
        pub trade_name: String,
        pub cnpj: String,
        pub start_validity: Option<DateTime<Utc>>,
        pub cutoff_date: Option<i32>,
        pub issuance_date: Option<i32>,
        pub end_validity: Option<DateTime<Utc>>,
        pub company_status: String,
        pub name: Option<String>,
        pub number_of_employees: Option<i32>,
        pub classification: Option<String>,
        #[serde(rename = "economicGroupDBId")]
        pub economic_group_db_id: Option<i32>,
        #[serde(
            default,
            rename = "economicGroupDB",
            skip_serializing_if = "Option::is_none"
        )]
        pub economic_group_db: Option<Box<EconomicGroupResponse>>,
    }
}
