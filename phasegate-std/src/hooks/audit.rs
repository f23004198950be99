//! Audit workflow transition rules.

use phasegate_core::{
    Actor, AuditStatus, AuditValue, OperationKind, Record, ValidationError, Validator,
};

/// Rejects audit decisions that skip or repeat the workflow.
///
/// Appended after every user validator of `UpdateAuditStatus`: each subject
/// must still be pending (records that report no audit status count as
/// pending), and the decision itself must not be `Pending`.
#[derive(Debug, Clone, Copy, Default)]
pub struct AuditTransitionValidator;

impl<R: Record> Validator<R, AuditValue> for AuditTransitionValidator {
    fn validate(
        &self,
        _operation: OperationKind,
        subjects: &[R],
        value: &AuditValue,
        _actor: &Actor,
    ) -> Result<(), ValidationError> {
        if value.status == AuditStatus::Pending {
            return Err(
                ValidationError::new("an audit decision cannot be pending").with_field("status"),
            );
        }
        for subject in subjects {
            match subject.audit_status() {
                None | Some(AuditStatus::Pending) => {}
                Some(status) => {
                    return Err(ValidationError::new(format!(
                        "{} {:?} was already audited ({status:?})",
                        R::DESCRIPTOR.name,
                        subject.id(),
                    ))
                    .with_field("status"));
                }
            }
        }
        Ok(())
    }
}
