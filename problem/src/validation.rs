use crate::extensions::ExtensionValue;
use crate::extensions::Extensions;

/// Per-field validation messages collected before a use case runs.
///
/// Fields keep the order in which they were first reported.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationErrors {
    fields: Vec<(String, Vec<String>)>,
}

impl ValidationErrors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record a message against a field.
    pub fn add(&mut self, field: impl Into<String>, message: impl Into<String>) {
        let field = field.into();
        let message = message.into();

        match self.fields.iter_mut().find(|(name, _)| *name == field) {
            Some((_, messages)) => messages.push(message),
            None => self.fields.push((field, vec![message])),
        }
    }

    /// True when no field carries a non-empty message.
    pub fn is_empty(&self) -> bool {
        self.fields
            .iter()
            .all(|(_, messages)| messages.iter().all(|m| m.is_empty()))
    }

    /// `Ok(())` when nothing was reported, otherwise the collected errors.
    pub fn into_result(self) -> Result<(), Self> {
        if self.is_empty() {
            Ok(())
        } else {
            Err(self)
        }
    }

    /// One extension member per field.
    ///
    /// Empty messages are dropped; a single remaining message is emitted as a
    /// string, several as a list, and a field left with none is omitted.
    pub fn to_extensions(&self) -> Extensions {
        let mut extensions = Extensions::new();

        for (field, messages) in &self.fields {
            let mut kept: Vec<String> = messages
                .iter()
                .filter(|m| !m.is_empty())
                .cloned()
                .collect();

            match kept.len() {
                0 => {}
                1 => extensions.insert(field.clone(), ExtensionValue::Text(kept.remove(0))),
                _ => extensions.insert(field.clone(), ExtensionValue::List(kept)),
            }
        }

        extensions
    }
}
