use std::error::Error;
use std::fmt::{Display, Formatter};

pub type RenateResult<T> = Result<T, RenateError>;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RenateErrorCategory {
    Configuration,
    DataModel,
    InvalidTransition,
    NullInput,
    Computation,
    IoSystem,
}

impl RenateErrorCategory {
    pub const fn exit_code(self) -> i32 {
        match self {
            Self::Configuration => 2,
            Self::DataModel => 3,
            Self::InvalidTransition => 4,
            Self::NullInput => 2,
            Self::Computation => 5,
            Self::IoSystem => 6,
        }
    }

    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Configuration => "ConfigurationError",
            Self::DataModel => "DataModelError",
            Self::InvalidTransition => "InvalidTransitionError",
            Self::NullInput => "NullInputError",
            Self::Computation => "ComputationError",
            Self::IoSystem => "IoSystemError",
        }
    }
}

impl Display for RenateErrorCategory {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        f.write_str((*self).as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RenateError {
    category: RenateErrorCategory,
    placeholder: &'static str,
    message: String,
}

impl RenateError {
    pub fn new(
        category: RenateErrorCategory,
        placeholder: &'static str,
        message: impl Into<String>,
    ) -> Self {
        Self {
            category,
            placeholder,
            message: message.into(),
        }
    }

    pub fn configuration(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RenateErrorCategory::Configuration, placeholder, message)
    }

    pub fn data_model(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RenateErrorCategory::DataModel, placeholder, message)
    }

    pub fn invalid_transition(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RenateErrorCategory::InvalidTransition, placeholder, message)
    }

    pub fn null_input(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RenateErrorCategory::NullInput, placeholder, message)
    }

    pub fn computation(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RenateErrorCategory::Computation, placeholder, message)
    }

    pub fn io_system(placeholder: &'static str, message: impl Into<String>) -> Self {
        Self::new(RenateErrorCategory::IoSystem, placeholder, message)
    }

    pub const fn category(&self) -> RenateErrorCategory {
        self.category
    }

    pub const fn placeholder(&self) -> &'static str {
        self.placeholder
    }

    pub fn message(&self) -> &str {
        &self.message
    }

    pub const fn exit_code(&self) -> i32 {
        self.category.exit_code()
    }

    pub fn is_invalid_transition(&self) -> bool {
        self.category == RenateErrorCategory::InvalidTransition
    }

    pub fn diagnostic_line(&self) -> String {
        format!("ERROR: [{}] {}", self.placeholder, self.message)
    }
}

impl Display for RenateError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        write!(f, "{} [{}] {}", self.category, self.placeholder, self.message)
    }
}

impl Error for RenateError {}
