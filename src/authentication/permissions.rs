use crate::{jwt::SessionData, schema::UserRole};

const ACTION_TABLE: &[(UserRole, &[ActionType])] = &[
    (
        UserRole::User,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageSubscriptions,
        ],
    ),
    (
        UserRole::Admin,
        &[
            ActionType::CreateRecipes,
            ActionType::ManageOwnRecipes,
            ActionType::ManageOwnFavorites,
            ActionType::ManageOwnCart,
            ActionType::ManageSubscriptions,
            ActionType::ManageAllRecipes,
            ActionType::ManageCatalog,
        ],
    ),
];

#[derive(Hash, PartialEq, Eq, PartialOrd, Ord)]
pub enum ActionType {
    CreateRecipes,

    ManageOwnRecipes,
    ManageOwnFavorites,
    ManageOwnCart,
    ManageSubscriptions,

    ManageAllRecipes,
    ManageCatalog,
}

impl ActionType {
    pub fn authenticate(self, session: &SessionData) -> bool {
        let role = &session.role;

        ACTION_TABLE
            .iter()
            .find_map(|(uid, actions)| {
                if role != uid {
                    return None;
                }

                Some(actions.contains(&self))
            })
            .unwrap_or(false)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::jwt::JwtSessionData;

    fn session(role: UserRole) -> SessionData {
        JwtSessionData::new(1, String::from("maija"), role).into()
    }

    #[test]
    fn regular_users_manage_only_their_own_content() {
        let session = session(UserRole::User);
        assert!(ActionType::CreateRecipes.authenticate(&session));
        assert!(ActionType::ManageOwnFavorites.authenticate(&session));
        assert!(!ActionType::ManageAllRecipes.authenticate(&session));
        assert!(!ActionType::ManageCatalog.authenticate(&session));
    }

    #[test]
    fn admins_hold_every_action() {
        let session = session(UserRole::Admin);
        assert!(ActionType::ManageAllRecipes.authenticate(&session));
        assert!(ActionType::ManageCatalog.authenticate(&session));
        assert!(ActionType::ManageOwnCart.authenticate(&session));
    }
}
