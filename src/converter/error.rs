//! Conversion error types

use thiserror::Error;

/// Reasons a conversion request cannot be served
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ConvertError {
    /// A required input was absent or empty
    #[error("Campo obrigatório ausente: {0}")]
    MissingField(&'static str),

    /// The value could not be read as a finite number
    #[error("Valor inválido: '{0}' não é um número")]
    InvalidValue(String),

    /// The identifier does not name a registered conversion
    #[error("Tipo de conversão inválido: '{0}'")]
    UnknownConversionType(String),

    /// The converted value does not fit in a finite number
    #[error("Resultado fora do intervalo representável para o valor '{0}'")]
    ResultOutOfRange(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_messages_name_the_offending_input() {
        assert!(ConvertError::MissingField("value").to_string().contains("value"));
        assert!(ConvertError::InvalidValue("abc".to_string())
            .to_string()
            .contains("'abc'"));
        assert!(ConvertError::UnknownConversionType("99".to_string())
            .to_string()
            .contains("'99'"));
        assert!(ConvertError::ResultOutOfRange("1e306".to_string())
            .to_string()
            .contains("'1e306'"));
    }
}
