use crate::person::Relation;

pub type EngineResult<T> = Result<T, EngineError>;

/// Coarse classification of an [`EngineError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// A requested line, form, input, person or constant table does not exist.
    NotFound,
    /// The return was set up or queried in a structurally invalid way.
    Inconsistency,
    /// The computation reached a tax feature that is intentionally not modeled.
    UnsupportedFeature,
}

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum EngineError {
    #[error("form {form} does not have line {line}")]
    UnknownLine { form: String, line: String },

    #[error("no input with key {field} on form {form}")]
    UnknownInput { form: String, field: String },

    #[error("no form {0}")]
    UnknownForm(String),

    #[error("person {0} not found or too imprecise")]
    UnknownPerson(String),

    #[error("line {line} is not attached to a form")]
    DetachedLine { line: String },

    #[error("return has no constants of type {0}")]
    MissingConstants(&'static str),

    #[error("cannot have more than one {relation} (adding {name})")]
    DuplicatePerson { relation: Relation, name: String },

    #[error("cannot have more than one type of form {form}")]
    DuplicateForm { form: String },

    #[error("form {form} declares line {line} more than once")]
    DuplicateLine { form: String, line: String },

    #[error("line {line} is already attached as {attached}, cannot attach it to form {form}")]
    LineAlreadyAttached {
        line: String,
        attached: String,
        form: String,
    },

    #[error("form {form} has multiple copies")]
    AmbiguousForm { form: String },

    #[error("dependency cycle while evaluating {line}")]
    DependencyCycle { line: String },

    #[error("type mismatch: expected {expected}, got {actual}")]
    TypeMismatch {
        expected: &'static str,
        actual: &'static str,
    },

    #[error("invalid person pattern {pattern:?}: {message}")]
    InvalidPattern { pattern: String, message: String },

    #[error("invalid form input: {0}")]
    InvalidInput(String),

    #[error("invalid return config: {0}")]
    InvalidConfig(String),

    #[error("{0}")]
    Unsupported(String),
}

impl EngineError {
    pub fn unsupported(feature: impl Into<String>) -> Self {
        EngineError::Unsupported(feature.into())
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            EngineError::UnknownLine { .. }
            | EngineError::UnknownInput { .. }
            | EngineError::UnknownForm(_)
            | EngineError::UnknownPerson(_)
            | EngineError::DetachedLine { .. }
            | EngineError::MissingConstants(_) => ErrorKind::NotFound,
            EngineError::DuplicatePerson { .. }
            | EngineError::DuplicateForm { .. }
            | EngineError::DuplicateLine { .. }
            | EngineError::LineAlreadyAttached { .. }
            | EngineError::AmbiguousForm { .. }
            | EngineError::DependencyCycle { .. }
            | EngineError::TypeMismatch { .. }
            | EngineError::InvalidPattern { .. }
            | EngineError::InvalidInput(_)
            | EngineError::InvalidConfig(_) => ErrorKind::Inconsistency,
            EngineError::Unsupported(_) => ErrorKind::UnsupportedFeature,
        }
    }

    pub fn is_not_found(&self) -> bool {
        self.kind() == ErrorKind::NotFound
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn kinds_follow_the_three_way_taxonomy() {
        assert_eq!(
            EngineError::UnknownForm("W2".into()).kind(),
            ErrorKind::NotFound
        );
        assert_eq!(
            EngineError::AmbiguousForm { form: "W-2".into() }.kind(),
            ErrorKind::Inconsistency
        );
        assert_eq!(
            EngineError::unsupported("Dependents are not supported").kind(),
            ErrorKind::UnsupportedFeature
        );
    }

    #[test]
    fn messages_name_the_offending_entity() {
        let err = EngineError::UnknownLine {
            form: "1040".into(),
            line: "7b".into(),
        };
        assert_eq!(err.to_string(), "form 1040 does not have line 7b");

        let err = EngineError::DuplicatePerson {
            relation: Relation::Spouse,
            name: "Jilly Bob".into(),
        };
        assert_eq!(
            err.to_string(),
            "cannot have more than one spouse (adding Jilly Bob)"
        );
    }
}
