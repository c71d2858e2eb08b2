use chrono::{DateTime, Utc};

use super::{state_ref, EntityCtl};
use crate::base::resource_id;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EconomicGroupState {
    pub cnpj: String,
    pub name: String,
    pub is_unified_boleto: String,
    pub fee_fix: Option<i32>,
}

/// Grouping of companies sharing billing settings.
pub type EconomicGroup = EntityCtl<EconomicGroupState>;

resource_id!(EconomicGroup, "registry::EconomicGroup");

impl EconomicGroup {
    state_ref!(cnpj, String);
    state_ref!(name, String);
    state_ref!(is_unified_boleto, String);
    state_ref!(fee_fix, Option<i32>);
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompanyState {
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
    /// Optional ownership by an economic group, cleared when the group is removed.
    pub economic_group_db_id: Option<i32>,
}

pub type Company = EntityCtl<CompanyState>;

resource_id!(Company, "registry::Company");

impl Company {
    state_ref!(cnpj, String);
    state_ref!(trade_name, String);
    state_ref!(economic_group_id, i32);
    state_ref!(economic_group_db_id, Option<i32>);
}
