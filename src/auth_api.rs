//! Session management: login, logout and the current user.

use crate::client::Client;
use crate::errors::ContractError;
use crate::http::common::Endpoint;
use crate::request::ApiRequest;
use reqwest::Method;
use serde::Serialize;
use serde_json::Value;

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct LoginRequest<'a> {
    email: &'a str,
    password: &'a str,
    #[serde(skip_serializing_if = "Option::is_none")]
    two_factor_code: Option<&'a str>,
}

/// Clears the session tokens when dropped, so logout also forgets them if
/// the call errors or its future is cancelled.
struct ClearTokensOnDrop<'a>(&'a Client);

impl Drop for ClearTokensOnDrop<'_> {
    fn drop(&mut self) {
        self.0.clear_tokens();
    }
}

impl Client {
    /// Logs in and stores the returned token pair.
    ///
    /// The full login response (tokens, user profile) is returned unmodified.
    ///
    /// # Errors
    ///
    /// Returns [`ContractError::Authentication`] for rejected credentials and
    /// [`ContractError::MalformedResponse`] if the response lacks `accessToken`
    /// or `refreshToken`; stored credentials are left untouched in both cases.
    ///
    /// # Example
    ///
    /// ```no_run
    /// # use contract_sdk::Client;
    /// # #[tokio::main]
    /// # async fn main() -> Result<(), contract_sdk::ContractError> {
    /// let client = Client::new("https://contracts.example.com")?;
    /// let session = client.login("legal@example.com", "s3cret", None).await?;
    /// println!("Logged in as {}", session["user"]["email"]);
    /// # Ok(())
    /// # }
    /// ```
    pub async fn login(
        &self,
        email: &str,
        password: &str,
        two_factor_code: Option<&str>,
    ) -> Result<Value, ContractError> {
        tracing::debug!("Logging in: email={}", email);

        let request = ApiRequest::for_endpoint(Method::POST, &Endpoint::Login)?.with_json(
            &LoginRequest {
                email,
                password,
                two_factor_code,
            },
        )?;
        let response = self.send_json(request).await?;

        self.store_token_pair(&response)?;
        tracing::debug!("Login succeeded");
        Ok(response)
    }

    /// Ends the session on the server and forgets the local tokens.
    ///
    /// Best effort: a failed server call is logged and otherwise ignored. The
    /// tokens are cleared in every case.
    pub async fn logout(&self) {
        let _clear = ClearTokensOnDrop(self);

        let outcome = match ApiRequest::for_endpoint(Method::POST, &Endpoint::Logout) {
            Ok(request) => self.execute(request).await,
            Err(e) => Err(e),
        };
        match outcome {
            Ok(_) => tracing::debug!("Logged out"),
            Err(e) => tracing::warn!("Logout request failed, clearing local session anyway: {}", e),
        }
    }

    /// Returns the profile of the authenticated user.
    pub async fn current_user(&self) -> Result<Value, ContractError> {
        self.send_json(ApiRequest::for_endpoint(Method::GET, &Endpoint::CurrentUser)?)
            .await
    }
}
