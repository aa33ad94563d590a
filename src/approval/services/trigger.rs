//! Translation of task transitions into outbound notifications.

use crate::approval::domain::{
    ApprovalAction, Identity, Notification, NotificationKind, Task, TransitionOutcome,
};
use crate::config::NotificationPolicy;
use minijinja::{Environment, context};
use thiserror::Error;

const COORDINATION_TEMPLATE: &str = "{{ sender }} asks you to review \"{{ name }}\".\n\
{% if description %}\n{{ description }}\n{% endif %}\n\
Approve: {{ accept_link }}\n\
Decline: {{ decline_link }}\n";

const APPROVED_TEMPLATE: &str =
    "Task \"{{ name }}\" has been approved by all {{ coordinator_count }} coordinators.";

const DECLINED_TEMPLATE: &str = "Task \"{{ name }}\" was declined by {{ actor }}.";

/// Error raised when a notification body fails to render.
#[derive(Debug, Error)]
#[error("failed to render {template} notification: {source}")]
pub struct NotificationRenderError {
    /// Template name.
    pub template: &'static str,
    /// Template engine error.
    #[source]
    pub source: minijinja::Error,
}

/// Stateless translator from transitions to notifications.
#[derive(Debug, Clone)]
pub struct NotificationTrigger {
    policy: NotificationPolicy,
    link_base: String,
}

impl NotificationTrigger {
    /// Creates a trigger building action links under `link_base`.
    #[must_use]
    pub fn new(policy: NotificationPolicy, link_base: impl Into<String>) -> Self {
        Self {
            policy,
            link_base: link_base.into(),
        }
    }

    /// Asks the first coordinator of a new task to act.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRenderError`] when the body fails to render.
    pub fn on_created(&self, task: &Task) -> Result<Vec<Notification>, NotificationRenderError> {
        task.turn_holder()
            .map(|recipient| self.coordination_request(task, task.initiator(), recipient))
            .into_iter()
            .collect()
    }

    /// Notifications for a committed transition performed by `actor`.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRenderError`] when a body fails to render.
    pub fn on_transition(
        &self,
        task: &Task,
        actor: &Identity,
        outcome: &TransitionOutcome,
    ) -> Result<Vec<Notification>, NotificationRenderError> {
        match outcome {
            TransitionOutcome::Advanced { turn_holder } => {
                self.on_advanced(task, actor, turn_holder)
            }
            TransitionOutcome::Approved => self.on_approved(task, actor),
            TransitionOutcome::Declined => self.on_declined(task, actor),
        }
    }

    /// Asks the new turn-holder to act, when the policy allows it.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRenderError`] when the body fails to render.
    pub fn on_advanced(
        &self,
        task: &Task,
        actor: &Identity,
        turn_holder: &Identity,
    ) -> Result<Vec<Notification>, NotificationRenderError> {
        if !self.policy.notify_on_advance {
            return Ok(Vec::new());
        }
        Ok(vec![self.coordination_request(task, actor, turn_holder)?])
    }

    /// Tells every coordinator that the task was approved.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRenderError`] when the body fails to render.
    pub fn on_approved(
        &self,
        task: &Task,
        actor: &Identity,
    ) -> Result<Vec<Notification>, NotificationRenderError> {
        let body = render(
            "approved",
            APPROVED_TEMPLATE,
            context! {
                name => task.name(),
                coordinator_count => task.coordinators().len(),
            },
        )?;
        Ok(task
            .coordinators()
            .iter()
            .map(|coordinator| info(task, actor, coordinator, body.clone()))
            .collect())
    }

    /// Tells the initiator that the task was declined, when the policy
    /// allows it.
    ///
    /// # Errors
    ///
    /// Returns [`NotificationRenderError`] when the body fails to render.
    pub fn on_declined(
        &self,
        task: &Task,
        actor: &Identity,
    ) -> Result<Vec<Notification>, NotificationRenderError> {
        if !self.policy.notify_on_decline {
            return Ok(Vec::new());
        }
        let body = render(
            "declined",
            DECLINED_TEMPLATE,
            context! {
                name => task.name(),
                actor => actor.as_str(),
            },
        )?;
        Ok(vec![info(task, actor, task.initiator(), body)])
    }

    /// Link approving `task` on behalf of `coordinator`.
    ///
    /// The coordinator is percent-encoded so it always occupies exactly one
    /// path segment.
    #[must_use]
    pub fn approve_link(&self, task: &Task, coordinator: &Identity) -> String {
        self.action_link(ApprovalAction::Approve, task, coordinator)
    }

    /// Link declining `task` on behalf of `coordinator`.
    #[must_use]
    pub fn decline_link(&self, task: &Task, coordinator: &Identity) -> String {
        self.action_link(ApprovalAction::Decline, task, coordinator)
    }

    fn action_link(&self, action: ApprovalAction, task: &Task, coordinator: &Identity) -> String {
        format!(
            "{}/{action}/{}/{}",
            self.link_base,
            urlencoding::encode(coordinator.as_str()),
            task.id()
        )
    }

    fn coordination_request(
        &self,
        task: &Task,
        sender: &Identity,
        recipient: &Identity,
    ) -> Result<Notification, NotificationRenderError> {
        let accept_link = self.approve_link(task, recipient);
        let decline_link = self.decline_link(task, recipient);
        let body = render(
            "coordination",
            COORDINATION_TEMPLATE,
            context! {
                sender => sender.as_str(),
                name => task.name(),
                description => task.description(),
                accept_link => &accept_link,
                decline_link => &decline_link,
            },
        )?;

        Ok(Notification {
            recipient: recipient.clone(),
            sender: sender.clone(),
            subject: task.description().to_owned(),
            kind: NotificationKind::Coordination {
                accept_link,
                decline_link,
            },
            body,
        })
    }
}

fn info(task: &Task, sender: &Identity, recipient: &Identity, body: String) -> Notification {
    Notification {
        recipient: recipient.clone(),
        sender: sender.clone(),
        subject: task.description().to_owned(),
        kind: NotificationKind::Info,
        body,
    }
}

fn render(
    template_name: &'static str,
    template: &str,
    context: minijinja::Value,
) -> Result<String, NotificationRenderError> {
    Environment::new()
        .render_str(template, context)
        .map_err(|source| NotificationRenderError {
            template: template_name,
            source,
        })
}
