//! Client-side filtering for the user directory page

use lobby_api::UserAccount;

/// Role narrowing for the directory table
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum RoleFilter {
    #[default]
    All,
    /// Keep users holding exactly this role name
    Role(String),
}

/// Activity narrowing for the directory table
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum ActivityFilter {
    #[default]
    All,
    Active,
    Inactive,
}

/// The combined filter state of the users page.
///
/// All three criteria must match. The text query is a case-insensitive
/// substring match over username and email.
#[derive(Debug, Clone, Default)]
pub struct UserFilter {
    pub query: String,
    pub role: RoleFilter,
    pub activity: ActivityFilter,
}

impl UserFilter {
    /// Whether a single user passes the filter
    pub fn matches(&self, user: &UserAccount) -> bool {
        let q = self.query.trim().to_lowercase();
        let matches_query = q.is_empty()
            || user.username.to_lowercase().contains(&q)
            || user.email.to_lowercase().contains(&q);

        let matches_role = match &self.role {
            RoleFilter::All => true,
            RoleFilter::Role(role) => user.roles.iter().any(|r| r == role),
        };

        let matches_activity = match self.activity {
            ActivityFilter::All => true,
            ActivityFilter::Active => user.is_active,
            ActivityFilter::Inactive => !user.is_active,
        };

        matches_query && matches_role && matches_activity
    }

    /// Apply the filter, preserving the input order
    pub fn apply<'a>(&self, users: &'a [UserAccount]) -> Vec<&'a UserAccount> {
        users.iter().filter(|u| self.matches(u)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn user(name: &str, email: &str, roles: &[&str], active: bool) -> UserAccount {
        UserAccount {
            id: format!("id-{}", name),
            username: name.to_string(),
            email: email.to_string(),
            is_active: active,
            roles: roles.iter().map(|r| r.to_string()).collect(),
            created_at: None,
            last_login: None,
        }
    }

    #[test]
    fn test_role_filter_exact_membership() {
        let users = vec![
            user("root", "root@example.com", &["admin"], true),
            user("casual", "casual@example.com", &["user"], true),
        ];
        let filter = UserFilter {
            role: RoleFilter::Role("admin".to_string()),
            ..Default::default()
        };
        let hits = filter.apply(&users);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "root");
    }

    #[test]
    fn test_query_matches_username_or_email_case_insensitive() {
        let users = vec![
            user("Ada", "ada@lovelace.dev", &["user"], true),
            user("Grace", "grace@navy.mil", &["user"], true),
        ];
        let filter = UserFilter {
            query: "LOVELACE".to_string(),
            ..Default::default()
        };
        assert_eq!(filter.apply(&users).len(), 1);

        let filter = UserFilter {
            query: "gra".to_string(),
            ..Default::default()
        };
        assert_eq!(filter.apply(&users)[0].username, "Grace");
    }

    #[test]
    fn test_activity_filter() {
        let users = vec![
            user("on", "on@example.com", &[], true),
            user("off", "off@example.com", &[], false),
        ];
        let active = UserFilter {
            activity: ActivityFilter::Active,
            ..Default::default()
        };
        let inactive = UserFilter {
            activity: ActivityFilter::Inactive,
            ..Default::default()
        };
        assert_eq!(active.apply(&users)[0].username, "on");
        assert_eq!(inactive.apply(&users)[0].username, "off");
    }

    #[test]
    fn test_criteria_combine() {
        let users = vec![
            user("alpha", "alpha@example.com", &["admin"], false),
            user("alphonse", "alphonse@example.com", &["admin"], true),
            user("beta", "beta@example.com", &["user"], true),
        ];
        let filter = UserFilter {
            query: "alph".to_string(),
            role: RoleFilter::Role("admin".to_string()),
            activity: ActivityFilter::Active,
        };
        let hits = filter.apply(&users);
        assert_eq!(hits.len(), 1);
        assert_eq!(hits[0].username, "alphonse");
    }

    #[test]
    fn test_blank_filter_keeps_everyone() {
        let users = vec![
            user("a", "a@example.com", &[], true),
            user("b", "b@example.com", &["admin"], false),
        ];
        assert_eq!(UserFilter::default().apply(&users).len(), 2);
    }
}
