//! Output validation and repair.
//!
//! The engine is instructed to answer in schema-conforming JSON but is not
//! hard-constrained to do so: answers arrive wrapped in prose, as partial
//! JSON, or with minor deviations. [`OutputContract::conform`] provides the
//! hard guarantee with a two-tier strategy: a fast direct parse-and-validate
//! path, and a repair call through the strict formatter only when needed.

#[cfg(test)]
mod tests;

use crate::error::{EmissaryError, Result};
use crate::format::OutputFormatter;
use crate::schema::ObjectSchema;
use jsonschema::{Draft, Validator};
use serde_json::Value;

/// A compiled output contract for one agent.
pub struct OutputContract {
    schema: Value,
    validator: Validator,
}

impl OutputContract {
    /// Compile the contract from an agent's output schema.
    ///
    /// The enforceable rendering is used throughout: nodes with
    /// unrecognized kinds are unconstrained rather than poisoning the
    /// document with `type` strings no validator accepts.
    pub fn new(schema: &ObjectSchema) -> Result<Self> {
        let schema = schema.validation_json().clone();
        let validator = jsonschema::options()
            .with_draft(Draft::Draft202012)
            .build(&schema)
            .map_err(|e| {
                EmissaryError::ConfigType(format!("output schema does not compile: {e}"))
            })?;
        Ok(Self { schema, validator })
    }

    /// Whether a decoded value satisfies the contract.
    pub fn is_valid(&self, value: &Value) -> bool {
        self.validator.is_valid(value)
    }

    /// Turn a raw textual answer into a value satisfying the contract.
    ///
    /// The happy path returns immediately when the trimmed answer decodes
    /// as JSON and validates — one guard predicate, so the two tiers can
    /// never disagree about what "conforming" means. Otherwise the raw
    /// answer goes through the formatter; its strict mode is trusted, so
    /// the repaired value is returned without a second validation.
    pub fn conform(&self, raw: &str, formatter: &dyn OutputFormatter) -> Result<Conformed> {
        let trimmed = raw.trim();

        if let Ok(value) = serde_json::from_str::<Value>(trimmed)
            && self.is_valid(&value)
        {
            return Ok(Conformed {
                value,
                repaired: false,
            });
        }

        let value = formatter.reformat(&self.schema, trimmed)?;
        Ok(Conformed {
            value,
            repaired: true,
        })
    }
}

/// A conforming output value, with provenance for logging.
#[derive(Debug, Clone, PartialEq)]
pub struct Conformed {
    /// The value satisfying the output schema.
    pub value: Value,
    /// Whether the repair tier had to run.
    pub repaired: bool,
}
