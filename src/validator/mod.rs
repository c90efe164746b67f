// file: src/validator/mod.rs
// description: pluggable per-kind validator contract and the settlement adapter around it
// reference: https://docs.rs/async-trait

mod signature;

pub use signature::SignatureValidator;

use crate::models::{IntakeFile, ValidationResult};
use async_trait::async_trait;
use std::sync::Arc;
use tracing::{error, warn};

/// External format checker. The pipeline never looks at file content itself.
#[async_trait]
pub trait FileValidator: Send + Sync {
    /// Human label of the accepted type, e.g. "PDF".
    fn type_label(&self) -> &str;

    async fn validate(&self, file: &IntakeFile) -> anyhow::Result<ValidationResult>;
}

pub fn generic_error(label: &str) -> String {
    format!("Invalid {} file", label)
}

/// Runs one validation attempt to completion. Errors and panics inside the
/// validator come back as an invalid result; this never fails.
pub async fn run_validation(validator: Arc<dyn FileValidator>, file: IntakeFile) -> ValidationResult {
    let label = validator.type_label().to_string();
    let name = file.name().to_string();

    let task = tokio::spawn(async move { validator.validate(&file).await });

    match task.await {
        Ok(Ok(result)) => normalize(result, &label),
        Ok(Err(e)) => {
            warn!("Validator rejected {}: {:#}", name, e);
            ValidationResult::invalid(generic_error(&label))
        }
        Err(e) => {
            error!("Validation task for {} failed: {}", name, e);
            ValidationResult::invalid(generic_error(&label))
        }
    }
}

fn normalize(result: ValidationResult, label: &str) -> ValidationResult {
    if result.is_valid {
        ValidationResult {
            error: None,
            ..result
        }
    } else {
        ValidationResult {
            error: result.error.or_else(|| Some(generic_error(label))),
            ..result
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use anyhow::bail;
    use pretty_assertions::assert_eq;

    enum Behaviour {
        Report(ValidationResult),
        Fail,
        Panic,
    }

    struct FixedValidator(Behaviour);

    #[async_trait]
    impl FileValidator for FixedValidator {
        fn type_label(&self) -> &str {
            "PDF"
        }

        async fn validate(&self, _file: &IntakeFile) -> anyhow::Result<ValidationResult> {
            match &self.0 {
                Behaviour::Report(result) => Ok(result.clone()),
                Behaviour::Fail => bail!("parser exploded"),
                Behaviour::Panic => panic!("validator bug"),
            }
        }
    }

    async fn run(behaviour: Behaviour) -> ValidationResult {
        let validator: Arc<dyn FileValidator> = Arc::new(FixedValidator(behaviour));
        run_validation(validator, IntakeFile::new("a.pdf", b"%PDF-".to_vec())).await
    }

    #[tokio::test]
    async fn test_passes_through_reports() {
        assert_eq!(
            run(Behaviour::Report(ValidationResult::valid(3))).await,
            ValidationResult::valid(3)
        );
        assert_eq!(
            run(Behaviour::Report(ValidationResult::invalid("corrupt"))).await,
            ValidationResult::invalid("corrupt")
        );
    }

    #[tokio::test]
    async fn test_failures_become_generic_invalid() {
        assert_eq!(
            run(Behaviour::Fail).await,
            ValidationResult::invalid("Invalid PDF file")
        );
        assert_eq!(
            run(Behaviour::Panic).await,
            ValidationResult::invalid("Invalid PDF file")
        );
    }

    #[tokio::test]
    async fn test_normalizes_error_field() {
        let silent_invalid = ValidationResult {
            is_valid: false,
            page_count: 0,
            error: None,
        };
        assert_eq!(
            run(Behaviour::Report(silent_invalid)).await.error.as_deref(),
            Some("Invalid PDF file")
        );

        let noisy_valid = ValidationResult {
            is_valid: true,
            page_count: 2,
            error: Some("ignored".to_string()),
        };
        assert_eq!(
            run(Behaviour::Report(noisy_valid)).await,
            ValidationResult::valid(2)
        );
    }
}
