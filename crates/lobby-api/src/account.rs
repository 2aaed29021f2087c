//! Account endpoints: login, profile, password

use crate::client::ApiClient;
use crate::error::Result;
use crate::types::{PasswordChange, Profile, ProfilePatch, TokenResponse};

impl ApiClient {
    /// Exchange credentials for a bearer token. Works on an
    /// [`ApiClient::anonymous`] client; the token is NOT stored on the
    /// client, callers decide where the claims live.
    pub async fn login(&self, username: &str, password: &str) -> Result<TokenResponse> {
        let response = self
            .http
            .post(self.url("/token"))
            .form(&[("username", username), ("password", password)])
            .send()
            .await?;
        Ok(self.check(response).await?.json().await?)
    }

    /// The signed-in account
    pub async fn me(&self) -> Result<Profile> {
        self.get_json("/users/me", &[]).await
    }

    /// Update username/email of the signed-in account
    pub async fn update_profile(&self, patch: &ProfilePatch) -> Result<Profile> {
        self.patch_json("/users/me", patch).await
    }

    /// Change the account password
    pub async fn change_password(&self, change: &PasswordChange) -> Result<()> {
        self.post_unit("/users/me/password", change).await
    }
}
