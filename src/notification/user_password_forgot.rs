use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{to_data, Template};
use crate::auth::models::User;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct PasswordForgotModel {
    pub user: User,
    pub token: String,
}

/// Carries the reset token to the account's login address.
#[derive(Clone, Copy, Debug, Default)]
pub struct UserPasswordForgot;

impl Template for UserPasswordForgot {
    type Model = PasswordForgotModel;

    fn name(&self) -> &'static str {
        "user.password.forgot"
    }

    fn subject(&self) -> &'static str {
        "Password reset request"
    }

    fn recipient(&self, model: &PasswordForgotModel) -> String {
        model.user.username.clone()
    }

    fn data(&self, model: &PasswordForgotModel) -> Result<serde_json::Value> {
        to_data(model)
    }
}
