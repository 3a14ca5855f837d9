use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{ApiError, ApiResult};
use crate::models::{
    empty_cart, AdminCreateInput, AdminLoginInput, AdminUser, SignInInput, SignUpInput, User,
};
use crate::passwords;
use crate::store::AccountStore;
use crate::token::TokenIssuer;

pub struct Accounts {
    store: Arc<dyn AccountStore>,
    tokens: TokenIssuer,
}

impl Accounts {
    pub fn new(store: Arc<dyn AccountStore>, tokens: TokenIssuer) -> Self {
        Accounts { store, tokens }
    }

    /// Registers a shopper and returns their bearer token.
    pub async fn sign_up(&self, input: SignUpInput) -> ApiResult<String> {
        let (Some(name), Some(email), Some(password)) = (
            present(input.username),
            present(input.email),
            present(input.password),
        ) else {
            return Err(missing_fields());
        };

        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(ApiError::Conflict("Email is already in use".to_string()));
        }

        let user = User {
            id: Uuid::new_v4().to_string(),
            name,
            email,
            password: passwords::hash(password).await?,
            cart_data: empty_cart(),
            date: Utc::now(),
        };

        // The unique index still catches a signup racing this one.
        self.store.insert_user(user.clone()).await?;
        log::info!("User: {} saved successfully", user.email);

        self.tokens.issue(&user.id)
    }

    pub async fn sign_in(&self, input: SignInInput) -> ApiResult<String> {
        let (Some(email), Some(password)) = (present(input.email), present(input.password)) else {
            return Err(missing_fields());
        };

        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if !passwords::verify(password, user.password).await? {
            return Err(ApiError::Unauthorized("Invalid password".to_string()));
        }

        log::info!("Login successful");
        self.tokens.issue(&user.id)
    }

    /// Stores a new admin. Callers must have passed the admin-secret gate.
    pub async fn create_admin(&self, input: AdminCreateInput) -> ApiResult<String> {
        let (Some(username), Some(password), Some(clearance_level)) = (
            present(input.username),
            present(input.password),
            input.clearance_level,
        ) else {
            log::info!("Create Admin: Attempt failed");
            return Err(ApiError::Validation(
                "Invalid input: username, password, clearanceLevel".to_string(),
            ));
        };

        let admin = AdminUser {
            username,
            password: passwords::hash(password).await?,
            clearance_level,
        };
        let username = admin.username.clone();
        self.store.insert_admin(admin).await?;

        log::info!("Create Admin: Attempt successful");
        Ok(username)
    }

    pub async fn admin_login(&self, input: AdminLoginInput) -> ApiResult<()> {
        let (Some(username), Some(password)) =
            (present(input.username), present(input.password))
        else {
            log::info!("Admin Login: Attempt failed : invalid username, password");
            return Err(ApiError::Validation(
                "Invalid input: username, password".to_string(),
            ));
        };

        let admin = self
            .store
            .find_admin(&username)
            .await?
            .ok_or_else(|| ApiError::NotFound("User not found".to_string()))?;

        if !passwords::verify(password, admin.password).await? {
            log::info!("Admin Login: Attempt failed : INCORRECT PASSWORD");
            return Err(ApiError::Unauthorized("Incorrect password".to_string()));
        }

        log::info!("Admin Login: Attempt successful");
        Ok(())
    }
}

fn present(value: Option<String>) -> Option<String> {
    value.filter(|v| !v.is_empty())
}

fn missing_fields() -> ApiError {
    ApiError::Validation("Missing required fields".to_string())
}
