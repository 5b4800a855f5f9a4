use crate::domain::commands::family::{AddParentResult, FamilyCommand};
use crate::domain::commands::session::{SessionResult, SignInCommand, SwitchRoleCommand};
use crate::domain::models::{
    Family as DomainFamily, FamilyRole as DomainFamilyRole, HighscoreGroup as DomainHighscoreGroup,
    UserProfile as DomainUserProfile,
};
use shared::{
    AddParentResponse, Family as SharedFamily, FamilyListResponse, FamilyRequest,
    FamilyRole as SharedFamilyRole, HighscoreGroup as SharedHighscoreGroup,
    HighscoreGroupListResponse, SessionResponse, SignInRequest, SwitchRoleRequest,
    UserProfile as SharedUserProfile,
};

use super::format_timestamp;

/// Mapper for families, highscore groups and session payloads
pub struct FamilyMapper;

impl FamilyMapper {
    pub fn to_dto(domain: DomainFamily) -> SharedFamily {
        SharedFamily {
            id: domain.id,
            name: domain.name,
            highscore_scope: domain.highscore_scope,
            highscore_group_id: domain.highscore_group_id,
            created_at: format_timestamp(domain.created_at),
        }
    }

    pub fn to_family_list_dto(families: Vec<DomainFamily>) -> FamilyListResponse {
        FamilyListResponse {
            families: families.into_iter().map(Self::to_dto).collect(),
        }
    }

    pub fn to_command(request: FamilyRequest) -> FamilyCommand {
        FamilyCommand {
            name: request.name,
            highscore_scope: request.highscore_scope,
            highscore_group_id: request.highscore_group_id,
        }
    }

    pub fn to_add_parent_dto(result: AddParentResult) -> AddParentResponse {
        AddParentResponse {
            added: result.added,
            message: result.message,
        }
    }

    pub fn to_group_dto(domain: DomainHighscoreGroup) -> SharedHighscoreGroup {
        SharedHighscoreGroup {
            id: domain.id,
            name: domain.name,
        }
    }

    pub fn to_group_list_dto(groups: Vec<DomainHighscoreGroup>) -> HighscoreGroupListResponse {
        HighscoreGroupListResponse {
            groups: groups.into_iter().map(Self::to_group_dto).collect(),
        }
    }

    pub fn to_role_dto(domain: DomainFamilyRole) -> SharedFamilyRole {
        SharedFamilyRole {
            family_id: domain.family_id,
            role: domain.role,
            family_name: domain.family_name,
        }
    }

    pub fn to_profile_dto(domain: DomainUserProfile) -> SharedUserProfile {
        SharedUserProfile {
            uid: domain.uid,
            email: domain.email,
            display_name: domain.display_name,
            is_system_admin: domain.is_system_admin,
            family_roles: domain.family_roles.into_iter().map(Self::to_role_dto).collect(),
            active_family_role: domain.active_family_role.map(Self::to_role_dto),
        }
    }

    pub fn to_session_dto(result: SessionResult) -> SessionResponse {
        SessionResponse {
            profile: result.profile.map(Self::to_profile_dto),
            view: result.view,
        }
    }

    pub fn to_sign_in_command(request: SignInRequest) -> SignInCommand {
        SignInCommand {
            uid: request.uid,
            email: request.email,
            display_name: request.display_name,
            is_anonymous: request.is_anonymous,
        }
    }

    pub fn to_switch_role_command(uid: &str, request: SwitchRoleRequest) -> SwitchRoleCommand {
        SwitchRoleCommand {
            uid: uid.to_string(),
            family_id: request.family_id,
            role: request.role,
        }
    }
}
