use serde::Serialize;

use crate::models::{AppointmentStatus, PaymentMethod, Role, Session};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    ChangeStatus,
    EditToken,
    Reschedule,
    Delete,
    Close,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct Capabilities {
    pub is_admin: bool,
    pub is_receptionist: bool,
    pub is_psychologist: bool,
    /// Status changes, reschedule and delete.
    pub can_manage: bool,
    /// Editing the insurance authorization token.
    pub can_edit_token: bool,
}

impl Capabilities {
    pub fn for_role(role: Option<&Role>) -> Self {
        let is_admin = matches!(role, Some(Role::Admin));
        let is_receptionist = matches!(role, Some(Role::Receptionist));
        let is_psychologist = matches!(role, Some(Role::Psychologist));
        let staff = is_admin || is_receptionist || is_psychologist;

        Self {
            is_admin,
            is_receptionist,
            is_psychologist,
            can_manage: staff,
            can_edit_token: staff,
        }
    }

    pub fn for_session(session: Option<&Session>) -> Self {
        Self::for_role(session.map(|s| &s.role))
    }

    pub fn permits(&self, action: Action) -> bool {
        match action {
            Action::ChangeStatus | Action::Reschedule | Action::Delete => self.can_manage,
            Action::EditToken => self.can_edit_token,
            Action::Close => true,
        }
    }

    pub fn actions(&self) -> Vec<Action> {
        [
            Action::ChangeStatus,
            Action::EditToken,
            Action::Reschedule,
            Action::Delete,
            Action::Close,
        ]
        .into_iter()
        .filter(|a| self.permits(*a))
        .collect()
    }
}

/// Whether the insurance token editor is shown for this appointment.
pub fn should_show_token_input(
    payment_method: PaymentMethod,
    status: &AppointmentStatus,
    capabilities: &Capabilities,
) -> bool {
    payment_method == PaymentMethod::Insurance && status.is_open() && capabilities.can_edit_token
}

#[cfg(test)]
mod tests {
    use super::*;

    fn roles() -> Vec<Option<Role>> {
        vec![
            Some(Role::Admin),
            Some(Role::Receptionist),
            Some(Role::Psychologist),
            Some(Role::Other("patient".into())),
            Some(Role::Other(String::new())),
            None,
        ]
    }

    fn statuses() -> Vec<AppointmentStatus> {
        vec![
            AppointmentStatus::Pending,
            AppointmentStatus::Confirmed,
            AppointmentStatus::Cancelled,
            AppointmentStatus::Completed,
            AppointmentStatus::Other("no_show".into()),
        ]
    }

    fn is_staff(role: &Option<Role>) -> bool {
        matches!(
            role,
            Some(Role::Admin | Role::Receptionist | Role::Psychologist)
        )
    }

    #[test]
    fn token_input_visibility_over_every_combination() {
        for payment in [PaymentMethod::Private, PaymentMethod::Insurance] {
            for status in statuses() {
                for role in roles() {
                    let caps = Capabilities::for_role(role.as_ref());
                    let expected = payment == PaymentMethod::Insurance
                        && matches!(status, AppointmentStatus::Pending | AppointmentStatus::Confirmed)
                        && is_staff(&role);
                    assert_eq!(
                        should_show_token_input(payment, &status, &caps),
                        expected,
                        "payment={payment:?} status={status:?} role={role:?}"
                    );
                }
            }
        }
    }

    #[test]
    fn exactly_one_role_flag_for_staff() {
        let admin = Capabilities::for_role(Some(&Role::Admin));
        assert!(admin.is_admin && !admin.is_receptionist && !admin.is_psychologist);

        let reception = Capabilities::for_role(Some(&Role::Receptionist));
        assert!(!reception.is_admin && reception.is_receptionist && !reception.is_psychologist);

        let psy = Capabilities::for_role(Some(&Role::Psychologist));
        assert!(!psy.is_admin && !psy.is_receptionist && psy.is_psychologist);
    }

    #[test]
    fn staff_get_every_action() {
        for role in [Role::Admin, Role::Receptionist, Role::Psychologist] {
            let caps = Capabilities::for_role(Some(&role));
            assert!(caps.can_manage);
            assert!(caps.can_edit_token);
            assert_eq!(caps.actions().len(), 5, "role={role:?}");
        }
    }

    #[test]
    fn non_staff_may_only_close() {
        for role in roles().into_iter().filter(|r| !is_staff(r)) {
            let caps = Capabilities::for_role(role.as_ref());
            assert_eq!(caps, Capabilities::default());
            assert_eq!(caps.actions(), vec![Action::Close], "role={role:?}");
        }
    }

    #[test]
    fn session_capabilities_follow_its_role() {
        let session = Session {
            session_id: uuid::Uuid::nil(),
            user_id: uuid::Uuid::nil(),
            role: Role::Psychologist,
        };
        assert!(Capabilities::for_session(Some(&session)).is_psychologist);
        assert_eq!(Capabilities::for_session(None), Capabilities::default());
    }
}
