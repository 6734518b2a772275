//! The portal's built-in grant table.
//!
//! Applicant ⊂ Participant ⊂ Volunteer ⊂ Administrator: every role extends
//! the one before it and adds its own grants.

use crate::{AccessControl, Action, Attribute, AuthzError, Resource, Role};

/// Announcements and events visible to everyone.
pub const PUBLIC: Attribute = Attribute::from_static("Public");
/// Announcements and events restricted to accepted participants.
pub const PARTICIPANTS_ONLY: Attribute = Attribute::from_static("ParticipantsOnly");
/// Announcements and events restricted to volunteers.
pub const VOLUNTEERS_ONLY: Attribute = Attribute::from_static("VolunteersOnly");

pub const FIRST_NAME: Attribute = Attribute::from_static("firstName");
pub const LAST_NAME: Attribute = Attribute::from_static("lastName");
pub const EMAIL: Attribute = Attribute::from_static("email");

const ALL: Attribute = Attribute::WILDCARD;

/// Build and finalize the portal's permission model.
pub fn portal_policy() -> Result<AccessControl, AuthzError> {
    let applicant = Role::APPLICANT;
    let participant = Role::PARTICIPANT;
    let volunteer = Role::VOLUNTEER;
    let admin = Role::ADMINISTRATOR;

    AccessControl::builder()
        // applicant
        .grant(applicant.clone(), Resource::ANNOUNCEMENTS, Action::READ_ANY, [PUBLIC])
        .grant(applicant.clone(), Resource::EVENTS, Action::READ_ANY, [PUBLIC])
        .grant(applicant.clone(), Resource::APPLICATIONS, Action::CREATE_OWN, [ALL])
        .grant(applicant.clone(), Resource::APPLICATIONS, Action::READ_OWN, [ALL])
        .grant(applicant.clone(), Resource::APPLICATIONS, Action::UPDATE_OWN, [ALL])
        .grant(applicant.clone(), Resource::USERS, Action::READ_OWN, [ALL])
        .grant(applicant.clone(), Resource::USERS, Action::UPDATE_OWN, [FIRST_NAME, LAST_NAME])
        // participant
        .extend(participant.clone(), [applicant])
        .grant(participant.clone(), Resource::ANNOUNCEMENTS, Action::READ_ANY, [PARTICIPANTS_ONLY])
        .grant(participant.clone(), Resource::EVENTS, Action::READ_ANY, [PARTICIPANTS_ONLY])
        .grant(participant.clone(), Resource::TEAMS, Action::CREATE_OWN, [ALL])
        .grant(participant.clone(), Resource::TEAMS, Action::READ_ANY, [ALL])
        .grant(participant.clone(), Resource::TEAMS, Action::UPDATE_OWN, [ALL])
        .grant(participant.clone(), Resource::TEAMS, Action::DELETE_OWN, [ALL])
        // volunteer
        .extend(volunteer.clone(), [participant])
        .grant(volunteer.clone(), Resource::ANNOUNCEMENTS, Action::READ_ANY, [VOLUNTEERS_ONLY])
        .grant(volunteer.clone(), Resource::EVENTS, Action::READ_ANY, [VOLUNTEERS_ONLY])
        .grant(volunteer.clone(), Resource::APPLICATIONS, Action::READ_ANY, [ALL])
        .grant(volunteer.clone(), Resource::USERS, Action::READ_ANY, [FIRST_NAME, LAST_NAME, EMAIL])
        // administrator
        .extend(admin.clone(), [volunteer])
        .grant(admin.clone(), Resource::ANNOUNCEMENTS, Action::CREATE_ANY, [ALL])
        .grant(admin.clone(), Resource::ANNOUNCEMENTS, Action::READ_ANY, [ALL])
        .grant(admin.clone(), Resource::ANNOUNCEMENTS, Action::UPDATE_ANY, [ALL])
        .grant(admin.clone(), Resource::ANNOUNCEMENTS, Action::DELETE_ANY, [ALL])
        .grant(admin.clone(), Resource::EVENTS, Action::CREATE_ANY, [ALL])
        .grant(admin.clone(), Resource::EVENTS, Action::READ_ANY, [ALL])
        .grant(admin.clone(), Resource::EVENTS, Action::UPDATE_ANY, [ALL])
        .grant(admin.clone(), Resource::EVENTS, Action::DELETE_ANY, [ALL])
        .grant(admin.clone(), Resource::APPLICATIONS, Action::UPDATE_ANY, [ALL])
        .grant(admin.clone(), Resource::APPLICATIONS, Action::DELETE_ANY, [ALL])
        .grant(admin.clone(), Resource::USERS, Action::READ_ANY, [ALL])
        .grant(admin.clone(), Resource::USERS, Action::UPDATE_ANY, [ALL])
        .grant(admin.clone(), Resource::USERS, Action::DELETE_ANY, [ALL])
        .grant(admin.clone(), Resource::TEAMS, Action::UPDATE_ANY, [ALL])
        .grant(admin, Resource::TEAMS, Action::DELETE_ANY, [ALL])
        .finalize()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::AttributeSet;

    #[test]
    fn portal_policy_finalizes() {
        let ac = portal_policy().unwrap();
        let roles: Vec<&str> = ac.roles().map(Role::as_str).collect();
        assert_eq!(roles, vec!["admin", "applicant", "participant", "volunteer"]);
    }

    #[test]
    fn participant_sees_public_and_participant_announcements() {
        let ac = portal_policy().unwrap();
        let query = ac.resolve(Some(&Role::PARTICIPANT), &Resource::ANNOUNCEMENTS, Action::READ_ANY);

        assert!(query.granted);
        let expected: AttributeSet = [PUBLIC, PARTICIPANTS_ONLY].into_iter().collect();
        assert_eq!(query.attributes, expected);
        assert!(!query.covers(&VOLUNTEERS_ONLY));
    }

    #[test]
    fn administrator_may_update_any_user_field() {
        let ac = portal_policy().unwrap();
        let query = ac.resolve(Some(&Role::ADMINISTRATOR), &Resource::USERS, Action::UPDATE_ANY);

        assert!(query.covers(&Attribute::new("dietaryRestrictions")));
    }

    #[test]
    fn applicant_may_only_edit_own_name() {
        let ac = portal_policy().unwrap();
        let query = ac.resolve(Some(&Role::APPLICANT), &Resource::USERS, Action::UPDATE_OWN);

        assert!(query.covers(&FIRST_NAME));
        assert!(!query.covers(&EMAIL));
        assert!(!ac.can(Some(&Role::APPLICANT), &Resource::USERS, Action::UPDATE_ANY));
    }

    #[test]
    fn only_participants_and_above_manage_teams() {
        let ac = portal_policy().unwrap();
        assert!(!ac.can(Some(&Role::APPLICANT), &Resource::TEAMS, Action::CREATE_OWN));
        assert!(ac.can(Some(&Role::PARTICIPANT), &Resource::TEAMS, Action::CREATE_OWN));
        assert!(ac.can(Some(&Role::VOLUNTEER), &Resource::TEAMS, Action::CREATE_OWN));
        assert!(ac.can(Some(&Role::ADMINISTRATOR), &Resource::TEAMS, Action::DELETE_ANY));
    }
}
