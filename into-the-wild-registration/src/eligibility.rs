//! Eligibility gate: ordered, short-circuiting preconditions a user must
//! satisfy before the writer is allowed to run.

use crate::error::RegistrationError;
use crate::model::{RegistrationForm, TrekEvent, UserId};
use crate::store::RegistrationStore;

/// Judge a submitted booking form. Checks run in a fixed order and stop at
/// the first failure: authentication, indemnity, contact details, loaded
/// trek, and (for treks that demand it) approved-ID coverage. On success
/// the validated user and trek are handed back to the caller.
pub async fn check<'a>(
    store: &dyn RegistrationStore,
    user: Option<&'a UserId>,
    trek: Option<&'a TrekEvent>,
    form: &RegistrationForm,
) -> Result<(&'a UserId, &'a TrekEvent), RegistrationError> {
    let user = user.ok_or(RegistrationError::AuthRequired)?;

    if !form.indemnity_accepted {
        return Err(RegistrationError::IndemnityRequired);
    }

    if form.registrant_name.trim().is_empty() || form.registrant_phone.trim().is_empty() {
        return Err(RegistrationError::MissingContactDetails);
    }

    let trek = trek.ok_or(RegistrationError::TrekNotLoaded)?;

    if trek.requires_id_proof {
        // Two remote reads; a failure on either denies registration.
        let required = store
            .required_id_kinds(trek.id)
            .await
            .map_err(RegistrationError::RequirementCheckFailed)?;
        let approved = store
            .approved_id_kinds(user)
            .await
            .map_err(RegistrationError::RequirementCheckFailed)?;

        let mut missing: Vec<_> = required
            .into_iter()
            .filter(|kind| !approved.contains(kind))
            .collect();
        if !missing.is_empty() {
            missing.sort();
            return Err(RegistrationError::MissingApprovedId(missing));
        }
    }

    Ok((user, trek))
}
