//! Field copying between request shapes, entities, storage payloads and
//! response shapes.

use crate::{
    app::resource::{
        registry::{
            CompanyResponse, CreateCompany, CreateEconomicGroup, EconomicGroupResponse,
            UpdateCompany, UpdateEconomicGroup,
        },
        user::{CreateUser, ProfileResponse, UpdateUser, UserResponse},
    },
    domain::{
        entity::{
            registry::{Company, CompanyState, EconomicGroup, EconomicGroupState},
            user::{NewProfile, NewUser, Profile, User, UserState},
            Entity,
        },
        repository::{
            CompanyChanges, CompanyInsert, EconomicGroupChanges, EconomicGroupInsert,
            ProfileInsert, ProfileUpsert, UserChanges, UserInsert,
        },
    },
};

pub trait ResourceMapper {
    type Entity;
    type NewEntity;
    type Create;
    type Update;
    type CreateRecord;
    type UpdateRecord;
    type Response;

    fn to_entity(create: Self::Create) -> Self::NewEntity;

    /// Overlays the fields present in `update` on a stored entity.
    fn to_entity_update(entity: Self::Entity, update: &Self::Update) -> Self::Entity;

    fn to_persistence_create(entity: Self::NewEntity) -> Self::CreateRecord;

    fn to_persistence_update(update: Self::Update) -> Self::UpdateRecord;

    fn to_response(entity: Self::Entity) -> Self::Response;
}

pub struct UserMapper;

impl ResourceMapper for UserMapper {
    type Entity = User;
    type NewEntity = NewUser;
    type Create = CreateUser;
    type Update = UpdateUser;
    type CreateRecord = UserInsert;
    type UpdateRecord = UserChanges;
    type Response = UserResponse;

    fn to_entity(dto: CreateUser) -> NewUser {
        NewUser {
            email: dto.email,
            name: dto.name,
            profile: dto.profile.map(|profile| NewProfile { bio: profile.bio }),
        }
    }

    fn to_entity_update(user: User, dto: &UpdateUser) -> User {
        let id = user.ident();
        let state = user.into_state();

        let profile = match (state.profile, &dto.profile) {
            (Some(profile), Some(update)) => Some(Profile {
                id: profile.id,
                bio: update.bio.clone().unwrap_or(profile.bio),
            }),
            (None, Some(update)) => update.bio.clone().map(|bio| Profile { id: None, bio }),
            (profile, None) => profile,
        };

        User::restore(
            id,
            UserState {
                email: dto.email.clone().unwrap_or(state.email),
                name: dto.name.clone().unwrap_or(state.name),
                profile,
            },
        )
    }

    fn to_persistence_create(user: NewUser) -> UserInsert {
        UserInsert {
            email: user.email,
            name: user.name,
            profile: user.profile.map(|profile| ProfileInsert { bio: profile.bio }),
        }
    }

    fn to_persistence_update(dto: UpdateUser) -> UserChanges {
        UserChanges {
            email: dto.email,
            name: dto.name,
            profile: dto.profile.map(|profile| ProfileUpsert { bio: profile.bio }),
        }
    }

    fn to_response(user: User) -> UserResponse {
        let id = user.ident();
        let state = user.into_state();
        UserResponse {
            id,
            email: state.email,
            name: state.name,
            profile: state.profile.and_then(|profile| {
                profile.id.map(|id| ProfileResponse {
                    id,
                    bio: profile.bio,
                })
            }),
        }
    }
}

pub struct EconomicGroupMapper;

impl ResourceMapper for EconomicGroupMapper {
    type Entity = EconomicGroup;
    type NewEntity = EconomicGroupState;
    type Create = CreateEconomicGroup;
    type Update = UpdateEconomicGroup;
    type CreateRecord = EconomicGroupInsert;
    type UpdateRecord = EconomicGroupChanges;
    type Response = EconomicGroupResponse;

    fn to_entity(dto: CreateEconomicGroup) -> EconomicGroupState {
        EconomicGroupState {
            cnpj: dto.cnpj,
            name: dto.name,
            is_unified_boleto: dto.is_unified_boleto,
            fee_fix: dto.fee_fix,
        }
    }

    fn to_entity_update(group: EconomicGroup, dto: &UpdateEconomicGroup) -> EconomicGroup {
        let id = group.ident();
        let mut state = group.into_state();
        Self::to_persistence_update(dto.clone()).apply(&mut state);
        EconomicGroup::restore(id, state)
    }

    fn to_persistence_create(group: EconomicGroupState) -> EconomicGroupInsert {
        group
    }

    fn to_persistence_update(dto: UpdateEconomicGroup) -> EconomicGroupChanges {
        EconomicGroupChanges {
            cnpj: dto.cnpj,
            name: dto.name,
            is_unified_boleto: dto.is_unified_boleto,
            fee_fix: dto.fee_fix,
        }
    }

    fn to_response(group: EconomicGroup) -> EconomicGroupResponse {
        let id = group.ident();
        let state = group.into_state();
        EconomicGroupResponse {
            id,
            cnpj: state.cnpj,
            name: state.name,
            is_unified_boleto: state.is_unified_boleto,
            fee_fix: state.fee_fix,
            companies: None,
        }
    }
}

pub struct CompanyMapper;

impl ResourceMapper for CompanyMapper {
    type Entity = Company;
    type NewEntity = CompanyState;
    type Create = CreateCompany;
    type Update = UpdateCompany;
    type CreateRecord = CompanyInsert;
    type UpdateRecord = CompanyChanges;
    type Response = CompanyResponse;

    fn to_entity(dto: CreateCompany) -> CompanyState {
        CompanyState {
            economic_group_id: dto.economic_group_id,
            trade_name: dto.trade_name,
            cnpj: dto.cnpj,
            start_validity: dto.start_validity,
            cutoff_date: dto.cutoff_date,
            issuance_date: dto.issuance_date,
            end_validity: dto.end_validity,
            company_status: dto.company_status,
            name: dto.name,
            number_of_employees: dto.number_of_employees,
            classification: dto.classification,
            economic_group_db_id: dto.economic_group_db_id,
        }
    }

    fn to_entity_update(company: Company, dto: &UpdateCompany) -> Company {
        let id = company.ident();
        let mut state = company.into_state();
        Self::to_persistence_update(dto.clone()).apply(&mut state);
        Company::restore(id, state)
    }

    fn to_persistence_create(company: CompanyState) -> CompanyInsert {
        company
    }

    fn to_persistence_update(dto: UpdateCompany) -> CompanyChanges {
        CompanyChanges {
            economic_group_id: dto.economic_group_id,
            trade_name: dto.trade_name,
            cnpj: dto.cnpj,
            start_validity: dto.start_validity,
            cutoff_date: dto.cutoff_date,
            issuance_date: dto.issuance_date,
            end_validity: dto.end_validity,
            company_status: dto.company_status,
            name: dto.name,
            number_of_employees: dto.number_of_employees,
            classification: dto.classification,
            economic_group_db_id: dto.economic_group_db_id,
        }
    }

    fn to_response(company: Company) -> CompanyResponse {
        let id = company.ident();
        let state = company.into_state();
        CompanyResponse {
            id,
            economic_group_id: state.economic_group_id,
            trade_name: state.trade_name,
            cnpj: state.cnpj,
            start_validity: state.start_validity,
            cutoff_date: state.cutoff_date,
            issuance_date: state.issuance_date,
            end_validity: state.end_validity,
            company_status: state.company_status,
            name: state.name,
            number_of_employees: state.number_of_employees,
            classification: state.classification,
            economic_group_db_id: state.economic_group_db_id,
            economic_group_db: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;
    use crate::app::resource::user::{CreateProfile, UpdateProfile};

    fn stored_user() -> User {
        User::restore(
            1,
            UserState {
                email: "test@example.com".into(),
                name: "Test User".into(),
                profile: Some(Profile {
                    id: Some(1),
                    bio: "Test bio".into(),
                }),
            },
        )
    }

    #[test]
    fn create_copies_profile_only_when_present() {
        let with_profile = UserMapper::to_entity(CreateUser {
            email: "a@example.com".into(),
            name: "A".into(),
            profile: Some(CreateProfile { bio: "hi".into() }),
        });
        assert_eq!(
            UserMapper::to_persistence_create(with_profile),
            UserInsert {
                email: "a@example.com".into(),
                name: "A".into(),
                profile: Some(ProfileInsert { bio: "hi".into() }),
            }
        );

        let without_profile = UserMapper::to_entity(CreateUser {
            email: "b@example.com".into(),
            name: "B".into(),
            profile: None,
        });
        assert_eq!(without_profile.profile, None);
    }

    #[test]
    fn update_overlays_present_fields() {
        let merged = UserMapper::to_entity_update(
            stored_user(),
            &UpdateUser {
                name: Some("Updated Name".into()),
                ..Default::default()
            },
        );
        assert_eq!(merged.ident(), 1);
        assert_eq!(merged.name(), "Updated Name");
        assert_eq!(merged.email(), "test@example.com");
        assert_eq!(
            merged.profile(),
            &Some(Profile {
                id: Some(1),
                bio: "Test bio".into()
            })
        );
    }

    #[test]
    fn update_merges_profile_field_wise() {
        let merged = UserMapper::to_entity_update(
            stored_user(),
            &UpdateUser {
                profile: Some(UpdateProfile {
                    bio: Some("After Patch".into()),
                }),
                ..Default::default()
            },
        );
        assert_eq!(
            merged.profile(),
            &Some(Profile {
                id: Some(1),
                bio: "After Patch".into()
            })
        );

        let untouched = UserMapper::to_entity_update(
            stored_user(),
            &UpdateUser {
                profile: Some(UpdateProfile { bio: None }),
                ..Default::default()
            },
        );
        assert_eq!(untouched.profile(), stored_user().profile());
    }

    #[test]
    fn update_builds_pending_profile_when_none_is_stored() {
        let without_profile = || {
            User::restore(
                2,
                UserState {
                    email: "plain@example.com".into(),
                    name: "Plain".into(),
                    profile: None,
                },
            )
        };

        let merged = UserMapper::to_entity_update(
            without_profile(),
            &UpdateUser {
                profile: Some(UpdateProfile {
                    bio: Some("new".into()),
                }),
                ..Default::default()
            },
        );
        assert_eq!(
            merged.profile(),
            &Some(Profile {
                id: None,
                bio: "new".into()
            })
        );
        assert_eq!(UserMapper::to_response(merged).profile, None);

        let empty = UserMapper::to_entity_update(
            without_profile(),
            &UpdateUser {
                profile: Some(UpdateProfile { bio: None }),
                ..Default::default()
            },
        );
        assert_eq!(empty.profile(), &None);
    }

    #[test]
    fn update_payload_sets_only_provided_fields() {
        let changes = UserMapper::to_persistence_update(UpdateUser {
            email: Some("new@example.com".into()),
            name: None,
            profile: Some(UpdateProfile {
                bio: Some("bio".into()),
            }),
        });
        assert_eq!(
            changes,
            UserChanges {
                email: Some("new@example.com".into()),
                name: None,
                profile: Some(ProfileUpsert {
                    bio: Some("bio".into())
                }),
            }
        );
        assert!(UserMapper::to_persistence_update(UpdateUser::default()).is_empty());
    }

    #[test]
    fn response_exposes_id_and_nested_profile() {
        assert_eq!(
            UserMapper::to_response(stored_user()),
            UserResponse {
                id: 1,
                email: "test@example.com".into(),
                name: "Test User".into(),
                profile: Some(ProfileResponse {
                    id: 1,
                    bio: "Test bio".into()
                }),
            }
        );
    }

    #[test]
    fn company_update_clears_nullable_fields() {
        let company = Company::restore(
            7,
            CompanyState {
                economic_group_id: 1,
                trade_name: "Acme".into(),
                cnpj: "12345678000199".into(),
                start_validity: None,
                cutoff_date: Some(10),
                issuance_date: None,
                end_validity: None,
                company_status: "active".into(),
                name: Some("Acme Ltda".into()),
                number_of_employees: Some(12),
                classification: None,
                economic_group_db_id: Some(1),
            },
        );

        let merged = CompanyMapper::to_entity_update(
            company,
            &UpdateCompany {
                name: Some(None),
                economic_group_db_id: Some(None),
                number_of_employees: Some(Some(15)),
                ..Default::default()
            },
        );
        let state = merged.state();
        assert_eq!(state.name, None);
        assert_eq!(state.economic_group_db_id, None);
        assert_eq!(state.number_of_employees, Some(15));
        assert_eq!(state.cutoff_date, Some(10));
        assert_eq!(state.trade_name, "Acme");
    }
}
