//! Sent to the task owner when their opportunity is approved and opened.

use anyhow::Result;
use serde::{Deserialize, Serialize};

use super::{to_data, Template};
use crate::auth::models::User;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub id: i64,
    pub title: String,
    pub state: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct TaskUserModel {
    pub task: Task,
    pub user: User,
}

#[derive(Clone, Copy, Debug, Default)]
pub struct TaskUpdateOpened;

impl Template for TaskUpdateOpened {
    type Model = TaskUserModel;

    fn name(&self) -> &'static str {
        "task.update.opened"
    }

    fn subject(&self) -> &'static str {
        "Your opportunity is approved and open"
    }

    fn recipient(&self, model: &TaskUserModel) -> String {
        // Organisational address wins over the login name.
        model
            .user
            .government_uri
            .as_deref()
            .filter(|uri| !uri.is_empty())
            .unwrap_or(model.user.username.as_str())
            .to_string()
    }

    fn data(&self, model: &TaskUserModel) -> Result<serde_json::Value> {
        to_data(model)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::notification::render;
    use anyhow::Context;
    use chrono::Utc;

    fn model(government_uri: Option<&str>) -> TaskUserModel {
        let now = Utc::now();
        TaskUserModel {
            task: Task {
                id: 42,
                title: "Data analyst detail".to_string(),
                state: "open".to_string(),
            },
            user: User {
                id: 7,
                username: "alice@example.com".to_string(),
                name: Some("Alice".to_string()),
                government_uri: government_uri.map(str::to_string),
                is_admin: false,
                is_agency_admin: false,
                disabled: false,
                password_attempts: 0,
                completed_tasks: 2,
                created_at: now,
                updated_at: now,
            },
        }
    }

    #[test]
    fn recipient_prefers_government_uri() {
        let model = model(Some("alice@agency.gov"));
        assert_eq!(TaskUpdateOpened.recipient(&model), "alice@agency.gov");
    }

    #[test]
    fn recipient_falls_back_to_username() {
        assert_eq!(TaskUpdateOpened.recipient(&model(None)), "alice@example.com");
        assert_eq!(
            TaskUpdateOpened.recipient(&model(Some(""))),
            "alice@example.com"
        );
    }

    #[test]
    fn render_carries_task_and_user() -> anyhow::Result<()> {
        let message = render(&TaskUpdateOpened, &model(None))?;
        assert_eq!(message.subject, "Your opportunity is approved and open");
        assert_eq!(message.template, "task.update.opened");
        assert_eq!(message.to_email, "alice@example.com");

        let payload: serde_json::Value = serde_json::from_str(&message.payload_json)?;
        let title = payload
            .pointer("/task/title")
            .and_then(serde_json::Value::as_str)
            .context("missing task title")?;
        assert_eq!(title, "Data analyst detail");
        assert_eq!(
            payload.pointer("/user/id").and_then(serde_json::Value::as_i64),
            Some(7)
        );
        Ok(())
    }
}
