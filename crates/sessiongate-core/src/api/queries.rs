//! GraphQL documents sent by the client.

/// Field selected on both operations; must match `Session`'s wire names.
const SESSION_FIELDS: &str = "userId token tokenExpiration username";

/// Name of the root field holding the login result.
pub const LOGIN_FIELD: &str = "login";

/// Name of the root field holding the signup result.
pub const SIGNUP_FIELD: &str = "signup";

pub fn login_query() -> String {
    format!(
        "query LoginUser($login: LoginInput!) {{ {}(login: $login) {{ {} }} }}",
        LOGIN_FIELD, SESSION_FIELDS
    )
}

pub fn signup_mutation() -> String {
    format!(
        "mutation SignupUser($signup: SignupInput!) {{ {}(signup: $signup) {{ {} }} }}",
        SIGNUP_FIELD, SESSION_FIELDS
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_query_shape() {
        assert_eq!(
            login_query(),
            concat!(
                "query LoginUser($login: LoginInput!) ",
                "{ login(login: $login) { userId token tokenExpiration username } }"
            )
        );
    }

    #[test]
    fn test_signup_is_mutation() {
        let doc = signup_mutation();
        assert!(doc.starts_with("mutation SignupUser($signup: SignupInput!)"));
        assert!(doc.contains("signup(signup: $signup)"));
    }
}
